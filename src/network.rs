//! The protected network: the fixed set of monitored lanes.

use crate::telemetry::TrafficSensor;
use crate::{GateError, LaneId, LaneSet, Result};
use log::warn;

/// A monitored road segment in the protected network.
#[derive(Clone, Debug)]
pub struct Lane {
    /// The lane's registry ID.
    pub(crate) id: LaneId,
    /// The identifier the simulation knows this lane by.
    external: String,
    /// The lane length in m. Zero when the length query failed at startup.
    length_m: f64,
}

impl Lane {
    /// The lane's registry ID.
    pub fn id(&self) -> LaneId {
        self.id
    }

    /// The identifier the simulation knows this lane by.
    pub fn external_id(&self) -> &str {
        &self.external
    }

    /// The lane length in m.
    pub fn length_m(&self) -> f64 {
        self.length_m
    }
}

/// The fixed set of monitored lanes, interned once at startup.
///
/// The total length is computed here and never changes for the lifetime of
/// the run.
pub struct Network {
    /// The monitored lanes.
    lanes: LaneSet,
    /// Sum of all lane lengths in km.
    total_length_km: f64,
}

impl Network {
    /// Interns the given lane ids, querying each lane's length once.
    ///
    /// A lane whose length cannot be read is still monitored, but
    /// contributes no length. An empty lane list is a configuration error.
    pub fn discover<S: TrafficSensor>(sensor: &S, lane_ids: &[String]) -> Result<Self> {
        if lane_ids.is_empty() {
            return Err(GateError::EmptyNetwork);
        }
        let mut lanes = LaneSet::default();
        let mut total_m = 0.0;
        for external in lane_ids {
            let length_m = match sensor.lane_length_m(external) {
                Ok(length) => length,
                Err(err) => {
                    warn!("could not read length of lane {external}: {err}");
                    0.0
                }
            };
            total_m += length_m;
            lanes.insert_with_key(|id| Lane {
                id,
                external: external.clone(),
                length_m,
            });
        }
        Ok(Self {
            lanes,
            total_length_km: total_m / 1000.0,
        })
    }

    /// The total monitored length in km.
    pub fn total_length_km(&self) -> f64 {
        self.total_length_km
    }

    /// The number of monitored lanes.
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether the network has no lanes. Never true for a discovered network.
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Returns an iterator over all the monitored lanes.
    pub fn iter_lanes(&self) -> impl Iterator<Item = &Lane> {
        self.lanes.values()
    }

    /// Gets a reference to the lane with the given ID.
    pub fn get_lane(&self, lane_id: LaneId) -> &Lane {
        &self.lanes[lane_id]
    }
}
