//! Time-windowed aggregation of samples into interval statistics.

use crate::sampler::Sample;

/// Accumulates samples over one check interval.
///
/// Reset to zero exactly once per interval, when [finalize](Self::finalize)
/// consumes it. All fields are non-negative by construction.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntervalWindow {
    /// Number of samples taken this interval.
    samples: u32,
    /// Sum of the per-sample vehicle counts.
    vehicles: u64,
    /// Sum of the per-sample distances, in m.
    distance_m: f64,
}

/// The aggregate statistics of one completed check interval.
///
/// All values carry full precision; rounding happens only when a report
/// record is produced, so cumulative sums never compound rounding error.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowStats {
    /// Simulation time at which the interval closed, in s.
    pub timestamp_s: f64,
    /// Mean number of vehicles present on the network.
    pub avg_vehicles: f64,
    /// Total monitored length, in km.
    pub network_length_km: f64,
    /// Mean density in veh/lane-km.
    pub density: f64,
    /// Mean speed in m/s.
    pub avg_speed_mps: f64,
    /// Mean speed in km/h.
    pub avg_speed_kmh: f64,
    /// Flow in veh/lane/hr.
    pub flow: f64,
    /// Distance travelled during the interval, in m.
    pub interval_distance_m: f64,
    /// Number of samples aggregated.
    pub sample_count: u32,
}

impl IntervalWindow {
    /// Adds one sampling tick's telemetry to the window.
    pub fn accumulate(&mut self, sample: &Sample) {
        self.samples += 1;
        self.vehicles += u64::from(sample.vehicles);
        self.distance_m += sample.distance_m;
    }

    /// Number of samples taken so far this interval.
    pub fn sample_count(&self) -> u32 {
        self.samples
    }

    /// Closes the interval: derives the aggregate statistics and resets the
    /// accumulator for the next interval.
    ///
    /// An interval with no samples, or a network with no length, yields
    /// zeros rather than dividing by zero; likewise the mean speed is
    /// defined as zero when no vehicles were observed.
    pub fn finalize(
        &mut self,
        now_s: f64,
        network_length_km: f64,
        check_interval_s: f64,
    ) -> WindowStats {
        let avg_vehicles = if self.samples > 0 {
            self.vehicles as f64 / f64::from(self.samples)
        } else {
            0.0
        };
        let density = if network_length_km > 0.0 {
            avg_vehicles / network_length_km
        } else {
            0.0
        };
        let avg_speed_mps = if avg_vehicles > 0.0 {
            self.distance_m / (avg_vehicles * check_interval_s)
        } else {
            0.0
        };
        let avg_speed_kmh = avg_speed_mps * 3.6;
        // q = k·v. Density is already per-lane-km, so the flow figure is
        // reported per lane per hour.
        let flow = density * avg_speed_kmh;
        let stats = WindowStats {
            timestamp_s: now_s,
            avg_vehicles,
            network_length_km,
            density,
            avg_speed_mps,
            avg_speed_kmh,
            flow,
            interval_distance_m: self.distance_m,
            sample_count: self.samples,
        };
        *self = Self::default();
        stats
    }
}
