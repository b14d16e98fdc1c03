//! Per-tick sampling of the protected network.

use crate::network::{Lane, Network};
use crate::telemetry::TrafficSensor;
use crate::Result;
use log::warn;

/// The telemetry gathered in one sampling tick, summed over all monitored
/// lanes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Sample {
    /// Vehicles present on the network at this tick.
    pub vehicles: u32,
    /// Distance travelled over the tick, in m.
    pub distance_m: f64,
}

/// Reads one instantaneous sample across the whole network.
///
/// Each vehicle contributes `speed × sampling_interval_s` metres, treating
/// its speed as constant over the tick. A lane whose telemetry cannot be
/// read contributes nothing this tick; the remaining lanes are unaffected,
/// and no failure here is fatal to the loop.
pub fn sample_network<S: TrafficSensor>(
    sensor: &S,
    network: &Network,
    sampling_interval_s: f64,
) -> Sample {
    let mut total = Sample::default();
    for lane in network.iter_lanes() {
        match sample_lane(sensor, lane, sampling_interval_s) {
            Ok(sample) => {
                total.vehicles += sample.vehicles;
                total.distance_m += sample.distance_m;
            }
            Err(err) => warn!("skipping lane {} this tick: {err}", lane.external_id()),
        }
    }
    total
}

/// Samples a single lane: the vehicle count, plus the distance covered by
/// each vehicle on it. A vehicle whose speed cannot be read contributes no
/// distance but still counts.
fn sample_lane<S: TrafficSensor>(sensor: &S, lane: &Lane, dt: f64) -> Result<Sample> {
    let vehicles = sensor.lane_vehicle_count(lane.external_id())?;
    let mut distance_m = 0.0;
    for vehicle in sensor.lane_vehicle_ids(lane.external_id())? {
        match sensor.vehicle_speed(&vehicle) {
            Ok(speed) => distance_m += speed * dt,
            Err(err) => warn!("no speed for vehicle {vehicle}: {err}"),
        }
    }
    Ok(Sample {
        vehicles,
        distance_m,
    })
}
