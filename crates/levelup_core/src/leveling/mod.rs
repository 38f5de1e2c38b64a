//! Leveling state machine for task-completion rewards.
//!
//! # Responsibility
//! - Compute the next `(level, xp)` pair for one task-completion toggle.
//! - Keep every level/XP boundary policy in a single place.
//!
//! # Invariants
//! - Transitions are pure calculations; nothing here touches storage.
//! - Output always satisfies `level >= 1` and `xp < level * 100`.
//! - At most one level transition happens per toggle, in either direction.
//!
//! # See also
//! - docs/architecture/leveling.md

use serde::{Deserialize, Serialize};

/// XP granted for completing one task, and taken back when it is reopened.
pub const TASK_XP_REWARD: u32 = 10;

/// XP required to advance from `level` to `level + 1`.
pub fn xp_threshold(level: u32) -> u32 {
    level.saturating_mul(100)
}

/// Direction of a task-completion toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleDirection {
    /// The task was flipped to completed.
    Gain,
    /// The task was flipped back to incomplete.
    Lose,
}

impl ToggleDirection {
    /// Stable lowercase name used in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gain => "gain",
            Self::Lose => "lose",
        }
    }
}

/// Settled `(level, xp)` pair carried by a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Current tier, never below 1.
    pub level: u32,
    /// XP accumulated inside the current tier.
    pub xp: u32,
}

impl LevelProgress {
    /// Progress of a freshly registered account.
    pub const START: Self = Self { level: 1, xp: 0 };

    pub fn new(level: u32, xp: u32) -> Self {
        Self { level, xp }
    }

    /// Applies one toggle to this pair and returns the successor state.
    ///
    /// # Contract
    /// - Total over `level >= 1, xp >= 0`; never panics.
    /// - Never returns `level < 1` or an XP deficit.
    pub fn apply(self, direction: ToggleDirection) -> Self {
        match direction {
            ToggleDirection::Gain => self.gain(),
            ToggleDirection::Lose => self.lose(),
        }
    }

    fn gain(self) -> Self {
        let candidate = self.xp.saturating_add(TASK_XP_REWARD);
        let threshold = xp_threshold(self.level);
        if candidate >= threshold {
            // Single-step advance; XP past the cap carries into the new tier.
            Self {
                level: self.level.saturating_add(1),
                xp: candidate - threshold,
            }
        } else {
            Self {
                xp: candidate,
                ..self
            }
        }
    }

    fn lose(self) -> Self {
        match self.xp.checked_sub(TASK_XP_REWARD) {
            Some(xp) => Self { xp, ..self },
            None if self.level > 1 => {
                // A de-level lands one reward below the previous tier's cap,
                // independent of how deep the deficit actually was.
                let previous = self.level - 1;
                Self {
                    level: previous,
                    xp: xp_threshold(previous) - TASK_XP_REWARD,
                }
            }
            // Level 1 floors at zero XP; there is nothing below it.
            None => Self::START,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{xp_threshold, LevelProgress, ToggleDirection};

    #[test]
    fn threshold_scales_linearly_with_level() {
        assert_eq!(xp_threshold(1), 100);
        assert_eq!(xp_threshold(4), 400);
    }

    #[test]
    fn direction_names_are_stable() {
        assert_eq!(ToggleDirection::Gain.as_str(), "gain");
        assert_eq!(ToggleDirection::Lose.as_str(), "lose");
    }

    #[test]
    fn start_progress_is_level_one_zero_xp() {
        assert_eq!(LevelProgress::START, LevelProgress::new(1, 0));
    }
}
