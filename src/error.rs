//! Error types for the gating controller.

use crate::Mode;

/// Result type alias using [GateError].
pub type Result<T> = std::result::Result<T, GateError>;

/// Errors raised by the controller and the backends it drives.
///
/// Per-lane and per-vehicle telemetry failures, and per-actuator dispatch
/// failures, are handled where they occur and never terminate the run.
/// The remaining variants are fatal: startup validation failures abort
/// before any simulation time has elapsed, and clock or step failures end
/// the loop (after the metrics flush).
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A monitored lane is unknown to the simulation.
    #[error("unknown lane {0}")]
    UnknownLane(String),

    /// A vehicle id reported by the simulation could not be queried.
    #[error("unknown vehicle {0}")]
    UnknownVehicle(String),

    /// An actuator id is unknown to the signal backend.
    #[error("unknown actuator {0}")]
    UnknownActuator(String),

    /// The controller configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The protected network contains no lanes.
    #[error("protected network contains no lanes")]
    EmptyNetwork,

    /// No signal actuators were discovered at startup.
    #[error("no signal actuators discovered")]
    NoActuators,

    /// A gating plan set has no programs in it.
    #[error("no {0} gating programs loaded")]
    EmptyPlanSet(Mode),

    /// The simulation or signal backend failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Persisting the metrics report failed.
    #[error("report error: {0}")]
    Report(#[from] std::io::Error),
}
