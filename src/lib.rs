pub use actuator::{
    Actuator, ActuatorRegistry, DispatchOutcome, DispatchReport, DispatchStatus, SignalActuators,
};
pub use controller::{GatingConfig, GatingController};
pub use error::{GateError, Result};
pub use metrics::{IntervalMetrics, IntervalRecord, MetricsSink, ReportWriter};
pub use mode::{Mode, Thresholds, Transition};
pub use network::{Lane, Network};
pub use plan::{ModePlans, Phase, PlanSet, ProgramKind, SignalProgram};
pub use sampler::{sample_network, Sample};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use telemetry::TrafficSensor;
pub use util::Cadence;
pub use window::{IntervalWindow, WindowStats};

mod actuator;
mod controller;
mod debug;
mod error;
mod metrics;
mod mode;
mod network;
mod plan;
mod sampler;
mod telemetry;
mod util;
mod window;

new_key_type! {
    /// Unique ID of a monitored [Lane].
    pub struct LaneId;
    /// Unique ID of an [Actuator] in the registry.
    pub struct ActuatorId;
}

type LaneSet = SlotMap<LaneId, Lane>;
type ActuatorSet = SlotMap<ActuatorId, Actuator>;
