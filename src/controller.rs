//! The closed-loop gating controller.

use crate::actuator::{ActuatorRegistry, DispatchReport, SignalActuators};
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::{debug_interval, debug_transition};
use crate::metrics::{IntervalMetrics, MetricsSink, ReportWriter};
use crate::mode::{Mode, Thresholds};
use crate::network::Network;
use crate::plan::{ModePlans, PlanSet};
use crate::sampler::sample_network;
use crate::telemetry::TrafficSensor;
use crate::util::Cadence;
use crate::window::IntervalWindow;
use crate::{GateError, Result};
use log::{debug, error, info};

/// Configuration of the gating loop, owned by the caller.
#[derive(Clone, Copy, Debug)]
pub struct GatingConfig {
    /// Density thresholds separating the gating bands.
    pub thresholds: Thresholds,
    /// Seconds of simulation time between hysteresis evaluations.
    pub check_interval_s: f64,
    /// Seconds of simulation time between telemetry samples.
    pub sampling_interval_s: f64,
}

impl Default for GatingConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            check_interval_s: 60.0,
            sampling_interval_s: 1.0,
        }
    }
}

impl GatingConfig {
    /// Validates threshold ordering and interval sanity.
    pub fn validate(&self) -> Result<()> {
        let t = &self.thresholds;
        if !(t.normal < t.soft && t.soft < t.hard) {
            return Err(GateError::InvalidConfig(format!(
                "thresholds must be strictly increasing, got {} / {} / {}",
                t.normal, t.soft, t.hard
            )));
        }
        if !(self.check_interval_s > 0.0) {
            return Err(GateError::InvalidConfig(
                "check interval must be positive".to_string(),
            ));
        }
        if !(self.sampling_interval_s > 0.0) {
            return Err(GateError::InvalidConfig(
                "sampling interval must be positive".to_string(),
            ));
        }
        if self.sampling_interval_s > self.check_interval_s {
            return Err(GateError::InvalidConfig(
                "sampling interval exceeds check interval".to_string(),
            ));
        }
        Ok(())
    }
}

/// Drives the sampling, aggregation and plan-switching loop against a live
/// simulation.
///
/// The loop is single threaded and synchronous: each simulation step is
/// fully processed before the next one is requested, so none of the
/// controller's state needs locking.
pub struct GatingController<S, A> {
    /// The loop configuration.
    config: GatingConfig,
    /// The simulation telemetry side.
    sensor: S,
    /// The signal command side.
    signals: A,
    /// The monitored lanes.
    network: Network,
    /// The live actuators.
    registry: ActuatorRegistry,
    /// The three plan sets in play for this run.
    plans: ModePlans,
    /// The current gating mode.
    mode: Mode,
    /// The accumulator for the interval in progress.
    window: IntervalWindow,
    /// The per-interval metrics log.
    sink: MetricsSink,
    /// Total distance travelled since the start of the run, in m.
    cumulative_distance_m: f64,
    /// The simulation step length, captured at startup.
    step_length_s: f64,
    /// Debugging information from the previously closed interval.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl<S: TrafficSensor, A: SignalActuators> GatingController<S, A> {
    /// Builds the controller: validates the configuration, interns the
    /// protected network, discovers the live actuators and captures their
    /// current programs as the Normal-mode baseline.
    ///
    /// Fails before any simulation time has elapsed if the configuration is
    /// invalid, the lane list is empty, no actuators exist, or an
    /// escalation plan set is empty.
    pub fn new(
        config: GatingConfig,
        sensor: S,
        signals: A,
        lane_ids: &[String],
        soft_plans: PlanSet,
        hard_plans: PlanSet,
    ) -> Result<Self> {
        config.validate()?;
        if soft_plans.is_empty() {
            return Err(GateError::EmptyPlanSet(Mode::Soft));
        }
        if hard_plans.is_empty() {
            return Err(GateError::EmptyPlanSet(Mode::Hard));
        }
        let network = Network::discover(&sensor, lane_ids)?;
        let (registry, normal_plans) = ActuatorRegistry::discover(&signals)?;
        let step_length_s = sensor.step_length()?;
        info!(
            "gating {} lanes ({:.2} km) through {} actuators, step length {step_length_s} s",
            network.len(),
            network.total_length_km(),
            registry.len()
        );
        Ok(Self {
            config,
            sensor,
            signals,
            network,
            registry,
            plans: ModePlans {
                normal: normal_plans,
                soft: soft_plans,
                hard: hard_plans,
            },
            mode: Mode::Normal,
            window: IntervalWindow::default(),
            sink: MetricsSink::new(),
            cumulative_distance_m: 0.0,
            step_length_s,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        })
    }

    /// The current gating mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Gets a reference to the telemetry backend.
    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    /// Gets a reference to the signal backend.
    pub fn signals(&self) -> &A {
        &self.signals
    }

    /// The monitored network.
    pub fn network(&self) -> &Network {
        &self.network
    }

    /// The live actuator registry.
    pub fn registry(&self) -> &ActuatorRegistry {
        &self.registry
    }

    /// The intervals completed so far.
    pub fn intervals(&self) -> &[IntervalMetrics] {
        self.sink.intervals()
    }

    /// Runs the loop until the simulation reports no more pending work or
    /// an unrecoverable error occurs, then flushes the accumulated metrics
    /// to the writer.
    ///
    /// The flush happens on every exit path, so completed intervals are
    /// never lost to a mid-run failure. Whatever the in-progress interval
    /// had accumulated is discarded rather than reported as a partial row.
    pub fn run<W: ReportWriter + ?Sized>(&mut self, writer: &mut W) -> Result<()> {
        let outcome = self.drive();
        if let Err(err) = &outcome {
            error!("gating loop aborted: {err}");
        }
        let flushed = self.sink.flush(writer);
        outcome.and(flushed)
    }

    /// The loop proper. Clock and step failures propagate out of here;
    /// everything below them is handled locally.
    fn drive(&mut self) -> Result<()> {
        let mut sample_due = Cadence::new(self.config.sampling_interval_s);
        let mut check_due = Cadence::new(self.config.check_interval_s);
        while self.sensor.min_expected_entities()? > 0 {
            self.sensor.advance()?;
            let now = self.sensor.current_time()?;
            if sample_due.due(now) {
                let sample =
                    sample_network(&self.sensor, &self.network, self.config.sampling_interval_s);
                self.window.accumulate(&sample);
            }
            if check_due.due(now) {
                self.close_interval(now);
            }
        }
        info!(
            "simulation drained after {} intervals; final mode {}",
            self.sink.len(),
            self.mode
        );
        Ok(())
    }

    /// Finalizes the elapsed interval, evaluates the hysteresis table and
    /// records the result. The window is reset by the finalization,
    /// synchronously with the record's emission.
    fn close_interval(&mut self, now: f64) {
        let stats = self.window.finalize(
            now,
            self.network.total_length_km(),
            self.config.check_interval_s,
        );
        debug_interval(now, stats.density, stats.flow, stats.sample_count);
        let transition = self.mode.step(stats.density, &self.config.thresholds);
        if let Some(kind) = transition.apply {
            info!(
                "density {:.2} veh/lane-km at t={now}: {} -> {}",
                stats.density, self.mode, transition.next
            );
            debug_transition(now, stats.density, self.mode, transition.next);
            self.dispatch(kind);
        } else {
            debug!(
                "density {:.2} veh/lane-km at t={now}: staying {}",
                stats.density, self.mode
            );
        }
        self.mode = transition.next;
        self.cumulative_distance_m += stats.interval_distance_m;
        self.sink.append(IntervalMetrics {
            stats,
            cumulative_distance_m: self.cumulative_distance_m,
            mode: self.mode,
            step_length_s: self.step_length_s,
        });

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }
    }

    /// Applies the plan set that puts the network into the given mode.
    fn dispatch(&mut self, kind: Mode) -> DispatchReport {
        self.registry
            .apply(&mut self.signals, self.plans.for_mode(kind), kind)
    }

    /// Gets the debugging information for the previously closed interval as
    /// a JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }
}
