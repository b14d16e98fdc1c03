//! Signal-timing programs and the plan sets that group them per mode.

use crate::Mode;
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// One timed phase of a signal program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Phase {
    /// Phase duration in s.
    pub duration_s: u32,
    /// The signal state, one character per controlled connection.
    pub state: String,
}

/// How a program advances through its phases.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ProgramKind {
    /// Fixed phase durations.
    #[default]
    Static,
    /// Durations stretched or cut by detector occupancy.
    Actuated,
}

/// A named signal-timing program for a single actuator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignalProgram {
    /// The id used to activate the program once installed.
    pub program_id: String,
    /// How the program advances through its phases.
    pub kind: ProgramKind,
    /// The phase sequence.
    pub phases: SmallVec<[Phase; 8]>,
}

/// An immutable mapping from actuator id to the program it should run.
///
/// Built once before the loop starts and shared by reference for the rest
/// of the run. Iteration is in actuator-id order, so dispatch and its logs
/// are deterministic.
#[derive(Clone, Debug, Default)]
pub struct PlanSet {
    programs: BTreeMap<String, SignalProgram>,
}

impl PlanSet {
    /// Builds a plan set from `(actuator id, program)` pairs.
    pub fn new(programs: impl IntoIterator<Item = (String, SignalProgram)>) -> Self {
        Self {
            programs: programs.into_iter().collect(),
        }
    }

    /// The program assigned to the given actuator, if any.
    pub fn get(&self, actuator: &str) -> Option<&SignalProgram> {
        self.programs.get(actuator)
    }

    /// The number of programs in the set.
    pub fn len(&self) -> usize {
        self.programs.len()
    }

    /// Whether the set holds no programs.
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty()
    }

    /// Returns an iterator over the `(actuator id, program)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SignalProgram)> {
        self.programs.iter().map(|(id, program)| (id.as_str(), program))
    }
}

impl FromIterator<(String, SignalProgram)> for PlanSet {
    fn from_iter<I: IntoIterator<Item = (String, SignalProgram)>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// The three plan sets in play for the lifetime of a run: the Normal set
/// captured from the live signals at startup, and the Soft and Hard sets
/// loaded by the caller.
#[derive(Clone, Debug, Default)]
pub struct ModePlans {
    /// Baseline programs captured at startup.
    pub normal: PlanSet,
    /// Moderately restrictive gating programs.
    pub soft: PlanSet,
    /// The most restrictive gating programs.
    pub hard: PlanSet,
}

impl ModePlans {
    /// The plan set that puts the network into the given mode.
    pub fn for_mode(&self, mode: Mode) -> &PlanSet {
        match mode {
            Mode::Normal => &self.normal,
            Mode::Soft => &self.soft,
            Mode::Hard => &self.hard,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use smallvec::smallvec;

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

    #[test]
    fn lookup_and_iteration_order() {
        let plans = PlanSet::new([
            ("tl_b".to_string(), program("p1")),
            ("tl_a".to_string(), program("p1")),
        ]);
        assert_eq!(plans.len(), 2);
        assert_eq!(plans.get("tl_a").map(|p| p.program_id.as_str()), Some("p1"));
        assert!(plans.get("tl_c").is_none());
        let order: Vec<&str> = plans.iter().map(|(id, _)| id).collect();
        assert_eq!(order, ["tl_a", "tl_b"]);
    }

    #[test]
    fn plans_resolve_by_mode() {
        let plans = ModePlans {
            normal: PlanSet::new([("tl".to_string(), program("base"))]),
            soft: PlanSet::new([("tl".to_string(), program("soft_1"))]),
            hard: PlanSet::new([("tl".to_string(), program("hard_1"))]),
        };
        for (mode, id) in [
            (Mode::Normal, "base"),
            (Mode::Soft, "soft_1"),
            (Mode::Hard, "hard_1"),
        ] {
            let program = plans.for_mode(mode).get("tl");
            assert_eq!(program.map(|p| p.program_id.as_str()), Some(id));
        }
    }
}
