use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use itertools::Itertools;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use smallvec::smallvec;
use traffic_gating::{
    GateError, GatingConfig, GatingController, IntervalRecord, Phase, PlanSet, ProgramKind,
    ReportWriter, Result, SignalActuators, SignalProgram, TrafficSensor,
};

const LANE_COUNT: usize = 10;
const LANE_LENGTH_M: f64 = 500.0;
const STEP_S: f64 = 1.0;
const HORIZON_S: f64 = 7200.0;

/// Scripted in-process traffic model standing in for a real simulation:
/// a demand wave sweeps per-lane occupancy from free flow to congestion and
/// back, with speeds falling as occupancy rises.
struct SyntheticTraffic {
    time_s: f64,
    lanes: Vec<String>,
    counts: Vec<u32>,
    speed_mps: f64,
    speed_noise: Normal<f64>,
    rng: StdRng,
}

impl SyntheticTraffic {
    fn new(lanes: Vec<String>) -> Self {
        let counts = vec![8; lanes.len()];
        Self {
            time_s: 0.0,
            lanes,
            counts,
            speed_mps: 13.0,
            speed_noise: Normal::new(0.0, 0.8).expect("invalid noise deviation"),
            rng: StdRng::seed_from_u64(20260808),
        }
    }

    fn lane_index(&self, lane: &str) -> Result<usize> {
        self.lanes
            .iter()
            .position(|l| l == lane)
            .ok_or_else(|| GateError::UnknownLane(lane.to_string()))
    }
}

impl TrafficSensor for SyntheticTraffic {
    fn advance(&mut self) -> Result<()> {
        self.time_s += STEP_S;
        let phase = self.time_s / HORIZON_S * std::f64::consts::TAU;
        let target = 8.0 + 7.0 * (1.0 - phase.cos()) / 2.0;
        for count in &mut self.counts {
            let jitter = self.rng.gen_range(-2i32..=2);
            *count = (target as i32 + jitter).max(0) as u32;
        }
        let noise = self.speed_noise.sample(&mut self.rng);
        self.speed_mps = (17.5 - 0.55 * target + noise).clamp(2.0, 16.7);
        Ok(())
    }

    fn current_time(&self) -> Result<f64> {
        Ok(self.time_s)
    }

    fn step_length(&self) -> Result<f64> {
        Ok(STEP_S)
    }

    fn min_expected_entities(&self) -> Result<u32> {
        Ok(if self.time_s < HORIZON_S { 1 } else { 0 })
    }

    fn lane_vehicle_count(&self, lane: &str) -> Result<u32> {
        Ok(self.counts[self.lane_index(lane)?])
    }

    fn lane_vehicle_ids(&self, lane: &str) -> Result<Vec<String>> {
        let idx = self.lane_index(lane)?;
        Ok((0..self.counts[idx])
            .map(|i| format!("veh_{idx}_{i}"))
            .collect())
    }

    fn vehicle_speed(&self, _vehicle: &str) -> Result<f64> {
        Ok(self.speed_mps)
    }

    fn lane_length_m(&self, _lane: &str) -> Result<f64> {
        Ok(LANE_LENGTH_M)
    }
}

/// In-memory signal backend; remembers installs and activations.
struct StubSignals {
    ids: Vec<String>,
    installed: HashMap<String, Vec<String>>,
    active: HashMap<String, String>,
}

impl StubSignals {
    fn new(ids: &[String]) -> Self {
        Self {
            ids: ids.to_vec(),
            installed: HashMap::new(),
            active: HashMap::new(),
        }
    }
}

impl SignalActuators for StubSignals {
    fn actuator_ids(&self) -> Result<Vec<String>> {
        Ok(self.ids.clone())
    }

    fn current_program(&self, _id: &str) -> Result<SignalProgram> {
        Ok(SignalProgram {
            program_id: "base_0".to_string(),
            kind: ProgramKind::Static,
            phases: smallvec![
                Phase {
                    duration_s: 42,
                    state: "GGrr".to_string(),
                },
                Phase {
                    duration_s: 4,
                    state: "yyrr".to_string(),
                },
                Phase {
                    duration_s: 42,
                    state: "rrGG".to_string(),
                },
                Phase {
                    duration_s: 4,
                    state: "rryy".to_string(),
                },
            ],
        })
    }

    fn install_program(&mut self, id: &str, program: &SignalProgram) -> Result<()> {
        self.installed
            .entry(id.to_string())
            .or_default()
            .push(program.program_id.clone());
        Ok(())
    }

    fn set_active_program(&mut self, id: &str, program_id: &str) -> Result<()> {
        self.active.insert(id.to_string(), program_id.to_string());
        Ok(())
    }

    fn set_phase(&mut self, _id: &str, _phase: usize) -> Result<()> {
        Ok(())
    }
}

/// Writes the interval report as a timestamped CSV, one row per interval.
struct CsvReport;

const COLUMNS: [&str; 12] = [
    "Time (s)",
    "Avg Vehicles",
    "Network Length (km)",
    "Network Density (veh/lane-km)",
    "Flow (veh/lane/hr)",
    "Interval Distance (m)",
    "Avg Speed (m/s)",
    "Avg Speed (km/h)",
    "Cumulative Distance (m)",
    "Current Mode",
    "Sample Count",
    "Step Length (s)",
];

impl ReportWriter for CsvReport {
    fn persist(&mut self, records: &[IntervalRecord]) -> Result<()> {
        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_secs();
        let path = format!("density_vs_speed_{stamp}.csv");
        let mut out = BufWriter::new(File::create(&path)?);
        writeln!(out, "{}", COLUMNS.iter().join(","))?;
        for r in records {
            writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{},{},{}",
                r.time_s,
                r.avg_vehicles,
                r.network_length_km,
                r.density,
                r.flow,
                r.interval_distance_m,
                r.avg_speed_mps,
                r.avg_speed_kmh,
                r.cumulative_distance_m,
                r.mode,
                r.sample_count,
                r.step_length_s,
            )?;
        }
        println!("Metrics saved to {path}");
        Ok(())
    }
}

/// A two-phase gated intersection program: the shorter the inbound green,
/// the harder the gate.
fn gating_plans(signals: &[String], program_id: &str, inbound_green_s: u32) -> PlanSet {
    signals
        .iter()
        .map(|id| {
            (
                id.clone(),
                SignalProgram {
                    program_id: program_id.to_string(),
                    kind: ProgramKind::Static,
                    phases: smallvec![
                        Phase {
                            duration_s: inbound_green_s,
                            state: "GGrr".to_string(),
                        },
                        Phase {
                            duration_s: 4,
                            state: "yyrr".to_string(),
                        },
                        Phase {
                            duration_s: 84 - inbound_green_s,
                            state: "rrGG".to_string(),
                        },
                        Phase {
                            duration_s: 4,
                            state: "rryy".to_string(),
                        },
                    ],
                },
            )
        })
        .collect()
}

fn main() {
    let lanes: Vec<String> = (0..LANE_COUNT).map(|i| format!("pn_edge_{i}_0")).collect();
    let signals: Vec<String> = (0..4).map(|i| format!("gate_{i}")).collect();

    let sensor = SyntheticTraffic::new(lanes.clone());
    let backend = StubSignals::new(&signals);
    let soft = gating_plans(&signals, "soft_gating", 30);
    let hard = gating_plans(&signals, "hard_gating", 16);

    let mut controller = GatingController::new(
        GatingConfig::default(),
        sensor,
        backend,
        &lanes,
        soft,
        hard,
    )
    .expect("controller setup failed");

    println!(
        "Gating {LANE_COUNT} lanes through {} signals...",
        signals.len()
    );
    let result = controller.run(&mut CsvReport);

    for record in controller.intervals().iter().map(|m| m.to_record()) {
        println!(
            "t={:6.0}s  density {:6.2} veh/lane-km  speed {:6.2} km/h  flow {:8.2}  mode {}",
            record.time_s, record.density, record.avg_speed_kmh, record.flow, record.mode,
        );
    }

    let installs: usize = controller.signals().installed.values().map(Vec::len).sum();
    println!("{installs} program installs over the run; final active programs:");
    for (id, program) in controller.signals().active.iter().sorted() {
        println!("  {id}: {program}");
    }

    if let Err(err) = result {
        eprintln!("run failed: {err}");
        std::process::exit(1);
    }
}
