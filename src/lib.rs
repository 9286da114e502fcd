//! Guildhall Simulation Engine
//!
//! Platform-agnostic core game logic for Guildhall, an incremental
//! adventurers' guild management game. This crate provides all simulation
//! mechanics without UI or platform-specific dependencies: callers supply
//! absolute wall-clock milliseconds and a snapshot store, and drive the
//! engine through [`GuildEngine::advance`] and the orchestrator actions.

pub mod adventurer;
pub mod constants;
pub mod dispatch;
pub mod engine;
pub mod journal;
pub mod mission;
pub mod names;
pub mod pool;
pub mod save;
pub mod state;
pub mod town;
pub mod upgrades;
pub mod zone;

// Re-export commonly used types
pub use adventurer::{Adventurer, AdventurerStatus, AuraTotals, BonusKind, Class, Rank, ZoneBonus};
pub use dispatch::{
    ActionError, MissionReport, assign, build_church, build_shop, collect_income,
    complete_constructions, fulfill_order, place_order, purchase_upgrade, refresh_pool,
    resolve_due_missions, restock_shop, roll_pool_window, sell_gear, tick_mission_progress,
    unassign, update_danger,
};
pub use engine::GuildEngine;
pub use journal::{GameLog, Ledger, LedgerEntry, LogEntry};
pub use mission::Mission;
pub use pool::{PoolState, PopulationTier};
pub use save::{
    AfkReward, AutosaveGovernor, ExportEnvelope, SAVE_KEY, SAVE_VERSION, SaveError, Snapshot,
    reconcile_afk,
};
pub use state::{
    GameState, GearItem, GearQuality, Inventory, MissionStats, RngBundle, SeasonalEvent, ZoneStats,
};
pub use town::{
    BuildingStatus, CustomerOrder, EconomicStatus, PlayerChurch, PlayerShop, ShopTier,
    Specialization, Town,
};
pub use upgrades::{PurchaseError, PurchasedUpgrades, UpgradeCategory, UpgradeDef, UpgradeEffects};
pub use zone::{OutcomeApplied, Zone, ZoneKind, ZoneStatus};

/// Trait for abstracting snapshot blob storage.
/// Platform-specific implementations should provide this.
pub trait SnapshotStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Read the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store cannot be read.
    fn read(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Write `blob` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails (store unavailable, quota).
    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error>;

    /// Remove the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    fn delete(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-memory [`SnapshotStore`] for tests and headless runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    blobs: std::rc::Rc<std::cell::RefCell<std::collections::HashMap<String, String>>>,
}

impl SnapshotStore for MemoryStore {
    type Error = std::convert::Infallible;

    fn read(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.blobs.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, blob: &str) -> Result<(), Self::Error> {
        self.blobs
            .borrow_mut()
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), Self::Error> {
        self.blobs.borrow_mut().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_round_trips() {
        let store = MemoryStore::default();
        assert_eq!(store.read("k").unwrap(), None);
        store.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));

        // Clones share the same backing map, like a browser storage handle.
        let handle = store.clone();
        handle.write("k", "v2").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v2"));

        store.delete("k").unwrap();
        assert_eq!(handle.read("k").unwrap(), None);
    }
}
