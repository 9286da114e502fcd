//! Hireable adventurer pool and its 12-hour refresh window.
use serde::{Deserialize, Serialize};

use crate::adventurer::{self, Adventurer};
use crate::constants::{
    MIN_POOL_SIZE, POOL_REFRESHES_PER_WINDOW, POOL_WINDOW_MS, POPULATION_BOOMING,
    POPULATION_STABLE,
};
use crate::upgrades::UpgradeEffects;
use rand::Rng;

/// Town population bracket; drives how many hireables the pool holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationTier {
    Struggling,
    Stable,
    Booming,
}

impl PopulationTier {
    #[must_use]
    pub const fn from_population(population: u32) -> Self {
        if population >= POPULATION_BOOMING {
            Self::Booming
        } else if population >= POPULATION_STABLE {
            Self::Stable
        } else {
            Self::Struggling
        }
    }

    #[must_use]
    pub const fn pool_slots(self) -> usize {
        match self {
            Self::Struggling => 4,
            Self::Stable => 6,
            Self::Booming => 8,
        }
    }
}

/// The rotating hireable pool plus the refresh-window bookkeeping that gates
/// manual refreshes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolState {
    pub adventurers: Vec<Adventurer>,
    /// When the current 12h window expires and `refreshes_used` resets.
    pub window_end_ms: u64,
    pub refreshes_used: u8,
    /// Mission failures since the last refresh; each one shrinks the next
    /// refresh by a slot.
    pub failed_since_refresh: u32,
}

impl PoolState {
    #[must_use]
    pub fn new(now_ms: u64) -> Self {
        Self {
            adventurers: Vec::new(),
            window_end_ms: now_ms + POOL_WINDOW_MS,
            refreshes_used: 0,
            failed_since_refresh: 0,
        }
    }

    /// Roll the refresh window forward past `now_ms`. Safe to poll every
    /// tick; does nothing until the window has actually expired.
    pub fn roll_window(&mut self, now_ms: u64) -> bool {
        let mut rolled = false;
        while now_ms >= self.window_end_ms {
            self.window_end_ms += POOL_WINDOW_MS;
            self.refreshes_used = 0;
            rolled = true;
        }
        rolled
    }

    #[must_use]
    pub fn can_refresh(&self) -> bool {
        self.refreshes_used < POOL_REFRESHES_PER_WINDOW
    }

    /// Slots the next refresh will fill, after failure shrinkage.
    #[must_use]
    pub fn next_size(&self, population: u32) -> usize {
        let tier_slots = PopulationTier::from_population(population).pool_slots();
        tier_slots
            .saturating_sub(self.failed_since_refresh as usize)
            .max(MIN_POOL_SIZE)
    }

    /// Regenerate the pool. The caller checks `can_refresh` first; this only
    /// does the mechanical work.
    pub fn refresh<R: Rng + ?Sized>(
        &mut self,
        population: u32,
        effects: &UpgradeEffects,
        next_id: &mut u64,
        rng: &mut R,
    ) -> usize {
        let size = self.next_size(population);
        self.adventurers = (0..size)
            .map(|_| {
                let id = *next_id;
                *next_id += 1;
                adventurer::generate(id, population, effects, rng)
            })
            .collect();
        self.failed_since_refresh = 0;
        self.refreshes_used += 1;
        size
    }

    pub fn record_failure(&mut self) {
        self.failed_since_refresh += 1;
    }

    /// Remove a hireable by id, handing ownership to the roster.
    pub fn take(&mut self, id: u64) -> Option<Adventurer> {
        let index = self.adventurers.iter().position(|a| a.id == id)?;
        Some(self.adventurers.remove(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn tier_slots_follow_population() {
        assert_eq!(PopulationTier::from_population(599).pool_slots(), 4);
        assert_eq!(PopulationTier::from_population(600).pool_slots(), 6);
        assert_eq!(PopulationTier::from_population(1_500).pool_slots(), 8);
    }

    #[test]
    fn window_roll_is_idempotent_under_polling() {
        let mut pool = PoolState::new(0);
        pool.refreshes_used = 2;

        assert!(!pool.roll_window(POOL_WINDOW_MS - 1));
        assert_eq!(pool.refreshes_used, 2);

        assert!(pool.roll_window(POOL_WINDOW_MS));
        assert_eq!(pool.refreshes_used, 0);
        assert_eq!(pool.window_end_ms, 2 * POOL_WINDOW_MS);

        // Re-polling at the same instant must not roll again.
        assert!(!pool.roll_window(POOL_WINDOW_MS));
        assert_eq!(pool.window_end_ms, 2 * POOL_WINDOW_MS);
    }

    #[test]
    fn window_roll_catches_up_over_long_gaps() {
        let mut pool = PoolState::new(0);
        assert!(pool.roll_window(5 * POOL_WINDOW_MS + 1));
        assert!(pool.window_end_ms > 5 * POOL_WINDOW_MS + 1);
        assert!(pool.window_end_ms - (5 * POOL_WINDOW_MS + 1) <= POOL_WINDOW_MS);
    }

    #[test]
    fn refreshes_are_bounded_per_window() {
        let mut pool = PoolState::new(0);
        let mut rng = SmallRng::seed_from_u64(11);
        let mut next_id = 1_u64;
        let effects = UpgradeEffects::default();

        for _ in 0..POOL_REFRESHES_PER_WINDOW {
            assert!(pool.can_refresh());
            pool.refresh(800, &effects, &mut next_id, &mut rng);
        }
        assert!(!pool.can_refresh());
        assert_eq!(pool.refreshes_used, POOL_REFRESHES_PER_WINDOW);
    }

    #[test]
    fn failures_shrink_refresh_down_to_floor() {
        let mut pool = PoolState::new(0);
        let mut rng = SmallRng::seed_from_u64(12);
        let mut next_id = 1_u64;
        let effects = UpgradeEffects::default();

        for _ in 0..3 {
            pool.record_failure();
        }
        let size = pool.refresh(800, &effects, &mut next_id, &mut rng);
        assert_eq!(size, 3); // stable tier 6 minus 3 failures
        assert_eq!(pool.failed_since_refresh, 0);

        for _ in 0..20 {
            pool.record_failure();
        }
        let floored = pool.refresh(800, &effects, &mut next_id, &mut rng);
        assert_eq!(floored, MIN_POOL_SIZE);
    }

    #[test]
    fn refresh_assigns_fresh_ids() {
        let mut pool = PoolState::new(0);
        let mut rng = SmallRng::seed_from_u64(13);
        let mut next_id = 100_u64;
        pool.refresh(1_500, &UpgradeEffects::default(), &mut next_id, &mut rng);
        assert_eq!(pool.adventurers.len(), 8);
        assert_eq!(next_id, 108);
        let ids: Vec<u64> = pool.adventurers.iter().map(|a| a.id).collect();
        assert_eq!(ids, (100..108).collect::<Vec<u64>>());
    }

    #[test]
    fn take_moves_ownership_out_of_the_pool() {
        let mut pool = PoolState::new(0);
        let mut rng = SmallRng::seed_from_u64(14);
        let mut next_id = 1_u64;
        pool.refresh(800, &UpgradeEffects::default(), &mut next_id, &mut rng);

        let hired = pool.take(1).unwrap();
        assert_eq!(hired.id, 1);
        assert!(pool.take(1).is_none());
        assert_eq!(pool.adventurers.len(), 5);
    }
}
