//! XP and Level rules
//!
//! The threshold for leaving level `n` is `n * 100` XP. A single grant moves
//! the player up at most one level; any surplus stays in `current_xp` even if
//! it would cover the next threshold as well.

use crate::events::LevelUp;

/// XP needed per level step
pub const XP_PER_LEVEL: u32 = 100;

/// XP at which `level` is left behind
pub fn threshold(level: u32) -> u32 {
    level.saturating_mul(XP_PER_LEVEL)
}

/// Result of applying one XP grant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XpGrant {
    pub level: u32,
    pub current_xp: u32,
    pub level_up: Option<LevelUp>,
}

/// Apply `amount` XP to a `(level, current_xp)` pair.
///
/// Returns `None` if the XP total would overflow.
pub fn apply_xp(level: u32, current_xp: u32, amount: u32) -> Option<XpGrant> {
    let sum = current_xp.checked_add(amount)?;
    let old_threshold = threshold(level);

    if sum >= old_threshold {
        Some(XpGrant {
            level: level + 1,
            current_xp: sum - old_threshold,
            level_up: Some(LevelUp {
                old_level: level,
                new_level: level + 1,
            }),
        })
    } else {
        Some(XpGrant {
            level,
            current_xp: sum,
            level_up: None,
        })
    }
}

/// Level progress shown on the profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelProgress {
    pub level: u32,
    pub current_xp: u32,
    /// XP needed to leave the current level
    pub threshold: u32,
}

impl LevelProgress {
    pub fn new(level: u32, current_xp: u32) -> Self {
        Self {
            level,
            current_xp,
            threshold: threshold(level),
        }
    }

    /// Calculate progress toward the next level (0.0 - 1.0)
    pub fn progress_to_next(&self) -> f32 {
        if self.threshold == 0 {
            1.0
        } else {
            (self.current_xp as f32 / self.threshold as f32).min(1.0)
        }
    }

    pub fn xp_remaining(&self) -> u32 {
        self.threshold.saturating_sub(self.current_xp)
    }
}
