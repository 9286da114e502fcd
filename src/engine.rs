//! The simulation clock. One consumer loop replaces the browser's pile of
//! independent timers: callers feed absolute wall-clock time into
//! [`GuildEngine::advance`] and every due task runs in a fixed order against
//! a consistent view of the state.
use log::warn;

use crate::constants::{
    CONSTRUCTION_TICK_MS, DANGER_TICK_MS, LOG_SAVE_DECLINED, PROGRESS_TICK_MS, RESOLVE_TICK_MS,
};
use crate::dispatch::{self, MissionReport};
use crate::save::{self, AfkReward, AutosaveGovernor, SaveError};
use crate::state::GameState;
use crate::SnapshotStore;

/// Owns the game state, the snapshot store, and the tick bookkeeping.
pub struct GuildEngine<S: SnapshotStore> {
    state: GameState,
    store: S,
    autosave: AutosaveGovernor,
    last_danger_ms: u64,
    last_progress_ms: u64,
    last_resolve_ms: u64,
    last_construction_ms: u64,
}

impl<S: SnapshotStore> GuildEngine<S> {
    /// Start a fresh game.
    #[must_use]
    pub fn new(store: S, seed: u64, now_ms: u64) -> Self {
        Self::with_state(store, GameState::new(seed, now_ms), now_ms)
    }

    /// Resume from the store if a save exists, otherwise start fresh.
    ///
    /// # Errors
    ///
    /// Returns an error when a save exists but cannot be decoded; the blob
    /// is left untouched so nothing is lost to a bad load.
    pub fn load_or_new(store: S, seed: u64, now_ms: u64) -> anyhow::Result<Self> {
        let state = match save::load_from_store(&store)? {
            Some(saved) => saved,
            None => GameState::new(seed, now_ms),
        };
        Ok(Self::with_state(store, state, now_ms))
    }

    fn with_state(store: S, state: GameState, now_ms: u64) -> Self {
        Self {
            state,
            store,
            autosave: AutosaveGovernor::default(),
            last_danger_ms: now_ms,
            last_progress_ms: now_ms,
            last_resolve_ms: now_ms,
            last_construction_ms: now_ms,
        }
    }

    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    /// Replace the running state with an imported one.
    pub fn adopt(&mut self, state: GameState, now_ms: u64) {
        self.state = state;
        self.last_danger_ms = now_ms;
        self.last_progress_ms = now_ms;
        self.last_resolve_ms = now_ms;
        self.last_construction_ms = now_ms;
    }

    /// Run every task whose cadence has elapsed, in a fixed order: pool
    /// window, danger growth, construction, mission progress, mission
    /// resolution, autosave. Returns the missions resolved this call.
    pub fn advance(&mut self, now_ms: u64) -> Vec<MissionReport> {
        dispatch::roll_pool_window(&mut self.state, now_ms);

        if now_ms.saturating_sub(self.last_danger_ms) >= DANGER_TICK_MS {
            dispatch::update_danger(&mut self.state, now_ms);
            self.last_danger_ms = now_ms;
        }
        if now_ms.saturating_sub(self.last_construction_ms) >= CONSTRUCTION_TICK_MS {
            dispatch::complete_constructions(&mut self.state, now_ms);
            self.last_construction_ms = now_ms;
        }
        if now_ms.saturating_sub(self.last_progress_ms) >= PROGRESS_TICK_MS {
            dispatch::tick_mission_progress(&mut self.state, now_ms);
            self.last_progress_ms = now_ms;
        }
        let reports = if now_ms.saturating_sub(self.last_resolve_ms) >= RESOLVE_TICK_MS {
            self.last_resolve_ms = now_ms;
            dispatch::resolve_due_missions(&mut self.state, now_ms)
        } else {
            Vec::new()
        };

        self.state.last_active_ms = now_ms;
        if self.autosave.should_save(now_ms) {
            match save::save_to_store(&self.store, &self.state, now_ms) {
                Ok(()) => self.autosave.mark(now_ms),
                Err(err) => {
                    warn!("autosave declined: {err}");
                    self.state
                        .log
                        .push(now_ms, LOG_SAVE_DECLINED, format!("autosave failed: {err}"));
                }
            }
        }
        reports
    }

    /// Manual save, bypassing the autosave throttle.
    ///
    /// # Errors
    ///
    /// Surfaces store failures as a declined save; in-memory state is
    /// unaffected either way.
    pub fn save(&mut self, now_ms: u64) -> Result<(), SaveError> {
        save::save_to_store(&self.store, &self.state, now_ms).inspect_err(|err| {
            self.state
                .log
                .push(now_ms, LOG_SAVE_DECLINED, format!("save failed: {err}"));
        })
    }

    /// Re-entry point when the player returns: pays out AFK rewards when
    /// enough real time has passed.
    pub fn resume(&mut self, now_ms: u64) -> Option<AfkReward> {
        save::reconcile_afk(&mut self.state, now_ms)
    }

    /// Serialize the current state as a downloadable export file.
    ///
    /// # Errors
    ///
    /// Fails only if serialization itself fails.
    pub fn export(&self, now_ms: u64) -> Result<String, SaveError> {
        save::export(&self.state, now_ms)
    }

    /// Load an exported file, replacing the running state on success. A bad
    /// import leaves the current game untouched.
    ///
    /// # Errors
    ///
    /// Returns the decode failure from the envelope or snapshot.
    pub fn import(&mut self, blob: &str, now_ms: u64) -> Result<(), SaveError> {
        let state = save::import(blob)?;
        self.adopt(state, now_ms);
        Ok(())
    }
}
