//! The signal actuator registry and best-effort plan dispatch.

use crate::plan::{PlanSet, SignalProgram};
use crate::{ActuatorId, ActuatorSet, GateError, Mode, Result};
use itertools::Itertools;
use log::{info, warn};
use std::collections::HashMap;

/// Command access to the signal actuators of the simulation.
///
/// Like the sensor side, every call is synchronous and may fail; dispatch
/// treats per-actuator failures as local and keeps going.
pub trait SignalActuators {
    /// The ids of every actuator known to the simulation.
    fn actuator_ids(&self) -> Result<Vec<String>>;

    /// The program an actuator is currently running.
    fn current_program(&self, id: &str) -> Result<SignalProgram>;

    /// Installs a program on an actuator without activating it.
    fn install_program(&mut self, id: &str, program: &SignalProgram) -> Result<()>;

    /// Activates a previously installed program.
    fn set_active_program(&mut self, id: &str, program_id: &str) -> Result<()>;

    /// Forces an actuator to the given phase of its active program.
    fn set_phase(&mut self, id: &str, phase: usize) -> Result<()>;
}

/// A signal actuator discovered at startup.
#[derive(Clone, Debug)]
pub struct Actuator {
    /// The identifier the simulation knows this actuator by.
    external: String,
    /// Program id of the baseline captured at startup, when the snapshot
    /// succeeded.
    baseline_program: Option<String>,
}

impl Actuator {
    /// The identifier the simulation knows this actuator by.
    pub fn external_id(&self) -> &str {
        &self.external
    }

    /// Program id of the baseline captured at startup, if any.
    pub fn baseline_program(&self) -> Option<&str> {
        self.baseline_program.as_deref()
    }
}

/// The fixed set of live actuators, interned at startup.
pub struct ActuatorRegistry {
    /// The discovered actuators.
    actuators: ActuatorSet,
    /// Lookup from external id to registry key.
    index: HashMap<String, ActuatorId>,
}

impl ActuatorRegistry {
    /// Discovers the live actuators and snapshots each one's current
    /// program; the snapshots form the Normal-mode baseline plan set.
    ///
    /// An actuator whose snapshot fails stays in the registry but has no
    /// baseline entry, so a later return to Normal skips it. Discovering no
    /// actuators at all is fatal: there is nothing to gate with.
    pub fn discover<A: SignalActuators>(backend: &A) -> Result<(Self, PlanSet)> {
        let ids = backend.actuator_ids()?;
        if ids.is_empty() {
            return Err(GateError::NoActuators);
        }
        let mut actuators = ActuatorSet::default();
        let mut index = HashMap::new();
        let mut baseline = Vec::new();
        for external in ids {
            let program = match backend.current_program(&external) {
                Ok(program) => Some(program),
                Err(err) => {
                    warn!("could not snapshot program of actuator {external}: {err}");
                    None
                }
            };
            let key = actuators.insert(Actuator {
                external: external.clone(),
                baseline_program: program.as_ref().map(|p| p.program_id.clone()),
            });
            index.insert(external.clone(), key);
            if let Some(program) = program {
                baseline.push((external, program));
            }
        }
        Ok((Self { actuators, index }, PlanSet::new(baseline)))
    }

    /// The number of discovered actuators.
    pub fn len(&self) -> usize {
        self.actuators.len()
    }

    /// Whether the registry is empty. Never true for a discovered registry.
    pub fn is_empty(&self) -> bool {
        self.actuators.is_empty()
    }

    /// Whether the given external id belongs to a live actuator.
    pub fn contains(&self, external: &str) -> bool {
        self.index.contains_key(external)
    }

    /// Returns an iterator over all the discovered actuators.
    pub fn iter_actuators(&self) -> impl Iterator<Item = (ActuatorId, &Actuator)> {
        self.actuators.iter()
    }

    /// Applies a plan set to every actuator present in both the set and the
    /// registry. Each program is installed, activated, and forced to its
    /// first phase, so the switch takes effect immediately rather than
    /// mid-cycle.
    ///
    /// Dispatch is best effort and non-atomic: an actuator missing from the
    /// registry, or one whose backend calls fail, is reported in the
    /// outcome list and skipped, leaving it on its previous program. The
    /// caller sees the exact partial result and the run continues.
    pub fn apply<A: SignalActuators>(
        &self,
        backend: &mut A,
        plans: &PlanSet,
        label: Mode,
    ) -> DispatchReport {
        let mut outcomes = Vec::with_capacity(plans.len());
        for (external, program) in plans.iter() {
            let status = if !self.contains(external) {
                warn!("{label} plans name actuator {external}, which the simulation does not have");
                DispatchStatus::NotFound
            } else {
                match Self::install(backend, external, program) {
                    Ok(()) => {
                        info!("actuator {external} switched to program {}", program.program_id);
                        DispatchStatus::Applied
                    }
                    Err(err) => {
                        warn!("could not switch actuator {external}: {err}");
                        DispatchStatus::Failed(err.to_string())
                    }
                }
            };
            outcomes.push(DispatchOutcome {
                actuator: external.to_string(),
                status,
            });
        }
        let report = DispatchReport { outcomes };
        if report.is_complete() {
            info!("{label} plans applied to {} actuators", report.applied().count());
        } else {
            warn!(
                "{label} plan dispatch incomplete; skipped: {}",
                report.skipped().map(|o| o.actuator.as_str()).join(", ")
            );
        }
        report
    }

    /// Installs, activates, and phase-resets one program.
    fn install<A: SignalActuators>(
        backend: &mut A,
        external: &str,
        program: &SignalProgram,
    ) -> Result<()> {
        backend.install_program(external, program)?;
        backend.set_active_program(external, &program.program_id)?;
        backend.set_phase(external, 0)?;
        Ok(())
    }
}

/// The fate of one actuator during a plan dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchStatus {
    /// The program was installed, activated and reset to its first phase.
    Applied,
    /// The plan set names an actuator the simulation does not have.
    NotFound,
    /// The backend rejected one of the install calls.
    Failed(String),
}

/// Per-actuator outcome of one dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DispatchOutcome {
    /// The actuator's external id.
    pub actuator: String,
    /// What happened to it.
    pub status: DispatchStatus,
}

/// The outcome of applying one plan set across the fleet.
#[derive(Clone, Debug, Default)]
pub struct DispatchReport {
    /// One outcome per program in the plan set, in dispatch order.
    pub outcomes: Vec<DispatchOutcome>,
}

impl DispatchReport {
    /// The actuators that took the new program.
    pub fn applied(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == DispatchStatus::Applied)
    }

    /// The actuators left on their previous program.
    pub fn skipped(&self) -> impl Iterator<Item = &DispatchOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status != DispatchStatus::Applied)
    }

    /// Whether every actuator in the plan set took the new program.
    pub fn is_complete(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| o.status == DispatchStatus::Applied)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::plan::{Phase, ProgramKind};
    use smallvec::smallvec;

    /// In-memory actuator backend recording every activation.
    #[derive(Default)]
    struct FakeSignals {
        ids: Vec<String>,
        failing: Vec<String>,
        activations: Vec<(String, String)>,
    }

    impl FakeSignals {
        fn with_ids(ids: &[&str]) -> Self {
            Self {
                ids: ids.iter().map(|id| id.to_string()).collect(),
                ..Default::default()
            }
        }
    }

    impl SignalActuators for FakeSignals {
        fn actuator_ids(&self) -> Result<Vec<String>> {
            Ok(self.ids.clone())
        }

        fn current_program(&self, id: &str) -> Result<SignalProgram> {
            if id == "tl_dark" {
                return Err(GateError::UnknownActuator(id.to_string()));
            }
            Ok(program("base"))
        }

        fn install_program(&mut self, id: &str, _program: &SignalProgram) -> Result<()> {
            if self.failing.iter().any(|f| f == id) {
                return Err(GateError::Backend(format!("install refused for {id}")));
            }
            Ok(())
        }

        fn set_active_program(&mut self, id: &str, program_id: &str) -> Result<()> {
            self.activations.push((id.to_string(), program_id.to_string()));
            Ok(())
        }

        fn set_phase(&mut self, _id: &str, _phase: usize) -> Result<()> {
            Ok(())
        }
    }

    fn program(id: &str) -> SignalProgram {
        SignalProgram {
            program_id: id.to_string(),
            kind: ProgramKind::Static,
            phases: smallvec![Phase {
                duration_s: 30,
                state: "GrGr".to_string(),
            }],
        }
    }

    fn plan_set(ids: &[&str]) -> PlanSet {
        ids.iter()
            .map(|id| (id.to_string(), program("hard_1")))
            .collect()
    }

    #[test]
    fn discovery_snapshots_baselines() {
        let backend = FakeSignals::with_ids(&["tl_a", "tl_dark", "tl_b"]);
        let (registry, baseline) = ActuatorRegistry::discover(&backend).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("tl_dark"));
        // The failed snapshot keeps its actuator but has no baseline entry.
        assert_eq!(baseline.len(), 2);
        assert!(baseline.get("tl_dark").is_none());
    }

    #[test]
    fn discovery_without_actuators_is_fatal() {
        let backend = FakeSignals::default();
        assert!(matches!(
            ActuatorRegistry::discover(&backend),
            Err(GateError::NoActuators)
        ));
    }

    #[test]
    fn missing_actuator_does_not_stop_dispatch() {
        let mut backend = FakeSignals::with_ids(&["tl_a", "tl_b"]);
        let (registry, _) = ActuatorRegistry::discover(&backend).unwrap();
        let report = registry.apply(&mut backend, &plan_set(&["tl_a", "tl_ghost", "tl_b"]), Mode::Hard);
        assert_eq!(report.applied().count(), 2);
        let skipped: Vec<_> = report.skipped().map(|o| o.actuator.as_str()).collect();
        assert_eq!(skipped, ["tl_ghost"]);
        assert_eq!(backend.activations.len(), 2);
    }

    #[test]
    fn failed_install_is_reported_and_skipped() {
        let mut backend = FakeSignals::with_ids(&["tl_a", "tl_b", "tl_c"]);
        backend.failing.push("tl_b".to_string());
        let (registry, _) = ActuatorRegistry::discover(&backend).unwrap();
        let report = registry.apply(&mut backend, &plan_set(&["tl_a", "tl_b", "tl_c"]), Mode::Soft);
        assert!(!report.is_complete());
        assert_eq!(report.applied().count(), 2);
        assert!(matches!(
            report.outcomes[1].status,
            DispatchStatus::Failed(_)
        ));
        // tl_b never reached activation.
        assert!(backend.activations.iter().all(|(id, _)| id != "tl_b"));
    }
}
