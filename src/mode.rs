//! The three-band gating mode and its hysteresis transition table.

use serde::Serialize;
use std::fmt;

/// The operating mode of the protected network's signal plans.
///
/// Exactly one value exists per run, owned by the controller and changed
/// only through [Mode::step].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The signals run the programs captured from the simulation at startup.
    #[default]
    Normal,
    /// Soft gating: moderately restrictive programs meter inbound traffic.
    Soft,
    /// Hard gating: the most restrictive programs are active.
    Hard,
}

/// Density thresholds separating the three gating bands, in veh/lane-km.
///
/// Must satisfy `normal < soft < hard`; validated by the controller
/// configuration before the loop starts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    /// Below this, gating is released back to normal operation.
    pub normal: f64,
    /// At or above this, soft gating engages.
    pub soft: f64,
    /// At or above this, hard gating engages.
    pub hard: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            normal: 20.0,
            soft: 22.5,
            hard: 25.0,
        }
    }
}

/// The outcome of one interval's hysteresis evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    /// The mode in effect from this interval on.
    pub next: Mode,
    /// The plan set to dispatch; present exactly when the mode changed.
    pub apply: Option<Mode>,
}

impl Mode {
    /// Evaluates the hysteresis table against the interval's density `d`.
    ///
    /// Escalation may jump straight from `Normal` to `Hard` within a single
    /// interval. De-escalation out of `Hard` steps down one band at a time:
    /// even a density below the normal threshold only yields `Soft`, and the
    /// further drop to `Normal` is picked up on the next evaluation. A single
    /// noisy low reading therefore cannot release gating entirely.
    pub fn step(self, d: f64, t: &Thresholds) -> Transition {
        use Mode::*;
        let (next, changed) = match self {
            Normal if d >= t.hard => (Hard, true),
            Normal if d >= t.soft => (Soft, true),
            Normal => (Normal, false),
            Soft if d >= t.hard => (Hard, true),
            Soft if d < t.normal => (Normal, true),
            Soft => (Soft, false),
            Hard if d < t.soft => (Soft, true),
            Hard => (Hard, false),
        };
        Transition {
            next,
            apply: changed.then_some(next),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Mode::Normal => "normal",
            Mode::Soft => "soft",
            Mode::Hard => "hard",
        };
        write!(f, "{label}")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{Rng, SeedableRng};

    const T: Thresholds = Thresholds {
        normal: 20.0,
        soft: 22.5,
        hard: 25.0,
    };

    fn step(mode: Mode, d: f64) -> Transition {
        mode.step(d, &T)
    }

    #[test]
    fn full_table() {
        use Mode::*;
        // (current, density, expected next, expected dispatch)
        let rows = [
            (Normal, 26.0, Hard, Some(Hard)),
            (Normal, 25.0, Hard, Some(Hard)),
            (Normal, 23.0, Soft, Some(Soft)),
            (Normal, 22.5, Soft, Some(Soft)),
            (Normal, 22.0, Normal, None),
            (Normal, 0.0, Normal, None),
            (Soft, 25.0, Hard, Some(Hard)),
            (Soft, 19.9, Normal, Some(Normal)),
            (Soft, 20.0, Soft, None),
            (Soft, 24.9, Soft, None),
            (Hard, 22.4, Soft, Some(Soft)),
            (Hard, 22.5, Hard, None),
            (Hard, 30.0, Hard, None),
        ];
        for (current, d, next, apply) in rows {
            let got = step(current, d);
            assert_eq!(got.next, next, "{current:?} at d={d}");
            assert_eq!(got.apply, apply, "{current:?} at d={d}");
        }
    }

    #[test]
    fn hard_releases_one_band_at_a_time() {
        // Even a density far below the normal threshold only steps Hard down
        // to Soft; Normal is reached on the following evaluation.
        let first = step(Mode::Hard, 18.0);
        assert_eq!(first.next, Mode::Soft);
        assert_eq!(first.apply, Some(Mode::Soft));
        let second = step(first.next, 18.0);
        assert_eq!(second.next, Mode::Normal);
        assert_eq!(second.apply, Some(Mode::Normal));
    }

    #[test]
    fn hard_never_releases_directly_to_normal() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"gating hysteresis, one band down");
        for _ in 0..1000 {
            let d = rng.gen_range(0.0..40.0);
            assert_ne!(step(Mode::Hard, d).next, Mode::Normal, "d={d}");
        }
    }

    #[test]
    fn normal_escalates_straight_to_hard() {
        let got = step(Mode::Normal, 25.0);
        assert_eq!(got.next, Mode::Hard);
        assert_eq!(got.apply, Some(Mode::Hard));
    }

    #[test]
    fn unchanged_mode_dispatches_nothing() {
        let mut rng = rand::rngs::StdRng::from_seed(*b"no dispatch without a transition");
        for _ in 0..1000 {
            let d = rng.gen_range(0.0..40.0);
            for mode in [Mode::Normal, Mode::Soft, Mode::Hard] {
                let got = step(mode, d);
                assert_eq!(got.apply.is_some(), got.next != mode);
            }
        }
    }
}
