//! Mission records and progress derivation.
use serde::{Deserialize, Serialize};

use crate::constants::MISSION_DURATION_MS;

/// An in-flight mission. Immutable after creation except for the cosmetic
/// `progress` field; resolution consumes it exactly once via the dedupe key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    pub id: u64,
    pub adventurer_id: u64,
    pub zone_id: u32,
    pub start_ms: u64,
    pub return_ms: u64,
    /// Locked in at assignment time, including zone synergy.
    pub success_chance: f32,
    /// Derived 0-100 display value; never drives resolution.
    #[serde(default)]
    pub progress: f32,
}

impl Mission {
    #[must_use]
    pub fn new(id: u64, adventurer_id: u64, zone_id: u32, start_ms: u64, success_chance: f32) -> Self {
        Self {
            id,
            adventurer_id,
            zone_id,
            start_ms,
            return_ms: start_ms.saturating_add(MISSION_DURATION_MS),
            success_chance,
            progress: 0.0,
        }
    }

    /// Whether the mission is eligible for resolution.
    #[must_use]
    pub const fn is_due(&self, now_ms: u64) -> bool {
        now_ms >= self.return_ms
    }

    /// Derived progress percentage, clamped to [0, 100].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn progress_at(&self, now_ms: u64) -> f32 {
        let total = self.return_ms.saturating_sub(self.start_ms);
        if total == 0 {
            return 100.0;
        }
        let elapsed = now_ms.saturating_sub(self.start_ms);
        ((elapsed as f32 / total as f32) * 100.0).clamp(0.0, 100.0)
    }

    /// Persistent key guarding against double resolution.
    #[must_use]
    pub fn dedupe_key(&self) -> String {
        format!("{}_{}", self.adventurer_id, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_time_is_fixed_duration_after_start() {
        let mission = Mission::new(1, 2, 3, 10_000, 75.0);
        assert_eq!(mission.return_ms, 10_000 + MISSION_DURATION_MS);
        assert!(!mission.is_due(10_000 + MISSION_DURATION_MS - 1));
        assert!(mission.is_due(10_000 + MISSION_DURATION_MS));
    }

    #[test]
    fn progress_clamps_and_tracks_elapsed() {
        let mission = Mission::new(1, 2, 3, 0, 50.0);
        assert!(mission.progress_at(0).abs() < f32::EPSILON);
        let halfway = mission.progress_at(MISSION_DURATION_MS / 2);
        assert!((halfway - 50.0).abs() < 0.5);
        assert!((mission.progress_at(MISSION_DURATION_MS * 4) - 100.0).abs() < f32::EPSILON);
    }

    #[test]
    fn dedupe_key_pairs_adventurer_and_mission() {
        let mission = Mission::new(9, 4, 1, 0, 50.0);
        assert_eq!(mission.dedupe_key(), "4_9");
    }
}
