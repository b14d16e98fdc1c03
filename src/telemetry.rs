//! The simulation-facing sensor interface.

use crate::Result;

/// Clock and telemetry access into a running traffic simulation.
///
/// Implementations wrap whatever actually advances the traffic model: an
/// RPC client talking to an external simulator, an in-process model, or a
/// scripted test double. All calls are synchronous and may block.
///
/// Per-lane and per-vehicle queries may fail individually; the sampling
/// layer logs such failures and carries on, so they never stop the control
/// loop. Failures of [advance](Self::advance),
/// [current_time](Self::current_time) or
/// [min_expected_entities](Self::min_expected_entities) are unrecoverable
/// and terminate the loop.
pub trait TrafficSensor {
    /// Advances the simulation by one step.
    fn advance(&mut self) -> Result<()>;

    /// The current simulation time in seconds.
    fn current_time(&self) -> Result<f64>;

    /// The simulation step length in seconds.
    fn step_length(&self) -> Result<f64>;

    /// The number of entities the simulation still expects to handle.
    /// The control loop runs while this is positive.
    fn min_expected_entities(&self) -> Result<u32>;

    /// The number of vehicles currently on the lane.
    fn lane_vehicle_count(&self, lane: &str) -> Result<u32>;

    /// The ids of the vehicles currently on the lane.
    fn lane_vehicle_ids(&self, lane: &str) -> Result<Vec<String>>;

    /// The instantaneous speed of a vehicle in m/s.
    fn vehicle_speed(&self, vehicle: &str) -> Result<f64>;

    /// The length of a lane in metres.
    fn lane_length_m(&self, lane: &str) -> Result<f64>;
}
