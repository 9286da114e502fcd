//! Versioned snapshots, the migration chain, and AFK reconciliation.
//!
//! A failed load never half-applies: decoding works on a detached JSON value
//! and only hands back a state once the whole chain has succeeded. A failed
//! store write surfaces as a declined save and the game continues in memory.
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::SnapshotStore;
use crate::constants::{
    AFK_GEAR_RECOVERY_CHANCE, AFK_GEAR_RECOVERY_VALUE, AFK_MIN_ELAPSED_MS, AFK_MISSION_BONUS,
    AFK_SECONDS_PER_GOLD, AUTOSAVE_MIN_INTERVAL_MS, GEAR_VALUE_MAX, GEAR_VALUE_MIN,
    LOG_AFK_RECOVERY, LOG_AFK_REWARD,
};
use crate::names;
use crate::state::{GameState, GearItem, GearQuality};
use rand::Rng;

/// Current snapshot schema version.
pub const SAVE_VERSION: u32 = 3;
/// Blob-store key for the rolling save slot.
pub const SAVE_KEY: &str = "guildhall.save";
/// Schema version of the export envelope wrapper.
pub const EXPORT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("snapshot version {found} is newer than supported {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("snapshot is corrupt: {0}")]
    Corrupt(String),
    #[error("snapshot store failed: {0}")]
    Store(String),
}

/// The full persisted form: schema version, write time, and the aggregate.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub timestamp_ms: u64,
    pub state: GameState,
}

/// Downloadable-file wrapper around a snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExportEnvelope {
    pub export_version: u32,
    pub export_timestamp_ms: u64,
    pub snapshot: Snapshot,
}

/// Serialize the state into a current-version snapshot blob.
pub fn encode(state: &GameState, now_ms: u64) -> Result<String, SaveError> {
    let value = serde_json::to_value(state).map_err(|e| SaveError::Corrupt(e.to_string()))?;
    let snapshot = serde_json::json!({
        "version": SAVE_VERSION,
        "timestamp_ms": now_ms,
        "state": value,
    });
    serde_json::to_string(&snapshot).map_err(|e| SaveError::Corrupt(e.to_string()))
}

/// Parse a snapshot blob of any supported version, migrating forward as
/// needed, and hand back a rehydrated state.
pub fn decode(blob: &str) -> Result<GameState, SaveError> {
    let mut value: Value =
        serde_json::from_str(blob).map_err(|e| SaveError::Corrupt(e.to_string()))?;
    let found = match value
        .get("version")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
    {
        Some(version) => version,
        None => {
            warn!("snapshot has no version field, treating as v1");
            1
        }
    };
    if found > SAVE_VERSION {
        return Err(SaveError::UnsupportedVersion {
            found,
            supported: SAVE_VERSION,
        });
    }

    let mut version = found;
    while version < SAVE_VERSION {
        migrate_step(&mut value, version)?;
        version += 1;
    }
    if version != found {
        info!("migrated snapshot from v{found} to v{version}");
        value["version"] = Value::from(version);
    }

    let snapshot: Snapshot =
        serde_json::from_value(value).map_err(|e| SaveError::Corrupt(e.to_string()))?;
    Ok(snapshot.state.rehydrate())
}

/// One step of the forward migration chain. Missing fields are left for
/// serde defaults to fill; steps only rename or reshape what moved.
fn migrate_step(value: &mut Value, from: u32) -> Result<(), SaveError> {
    let state = value
        .get_mut("state")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| SaveError::Corrupt("snapshot has no state object".to_string()))?;
    match from {
        1 => {
            // v1 kept the dedupe set under "resolved".
            if let Some(resolved) = state.remove("resolved") {
                state.insert("resolved_missions".to_string(), resolved);
            }
        }
        2 => {
            // v2 pool tracked the window as the last reset instead of its end.
            if let Some(pool) = state.get_mut("pool").and_then(Value::as_object_mut)
                && let Some(stamp) = pool.remove("refresh_at_ms")
            {
                pool.insert("window_end_ms".to_string(), stamp);
            }
        }
        other => {
            return Err(SaveError::Corrupt(format!(
                "no migration path from version {other}"
            )));
        }
    }
    Ok(())
}

/// Write the rolling save slot. Store failures are surfaced, not fatal.
pub fn save_to_store<S: SnapshotStore>(
    store: &S,
    state: &GameState,
    now_ms: u64,
) -> Result<(), SaveError> {
    let blob = encode(state, now_ms)?;
    store
        .write(SAVE_KEY, &blob)
        .map_err(|e| SaveError::Store(e.to_string()))
}

/// Read and decode the rolling save slot, if one exists.
pub fn load_from_store<S: SnapshotStore>(store: &S) -> Result<Option<GameState>, SaveError> {
    let Some(blob) = store
        .read(SAVE_KEY)
        .map_err(|e| SaveError::Store(e.to_string()))?
    else {
        return Ok(None);
    };
    decode(&blob).map(Some)
}

/// Produce a downloadable export of the current state.
pub fn export(state: &GameState, now_ms: u64) -> Result<String, SaveError> {
    let snapshot = encode(state, now_ms)?;
    let snapshot: Snapshot =
        serde_json::from_str(&snapshot).map_err(|e| SaveError::Corrupt(e.to_string()))?;
    let envelope = ExportEnvelope {
        export_version: EXPORT_VERSION,
        export_timestamp_ms: now_ms,
        snapshot,
    };
    serde_json::to_string(&envelope).map_err(|e| SaveError::Corrupt(e.to_string()))
}

/// Import a previously exported file.
pub fn import(blob: &str) -> Result<GameState, SaveError> {
    let value: Value =
        serde_json::from_str(blob).map_err(|e| SaveError::Corrupt(e.to_string()))?;
    let snapshot = value
        .get("snapshot")
        .ok_or_else(|| SaveError::Corrupt("export has no snapshot".to_string()))?;
    let inner =
        serde_json::to_string(snapshot).map_err(|e| SaveError::Corrupt(e.to_string()))?;
    decode(&inner)
}

/// Throttles autosave so writes never happen more often than the minimum
/// interval. Manual saves bypass this entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutosaveGovernor {
    last_save_ms: Option<u64>,
}

impl AutosaveGovernor {
    #[must_use]
    pub fn should_save(&self, now_ms: u64) -> bool {
        self.last_save_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= AUTOSAVE_MIN_INTERVAL_MS)
    }

    pub fn mark(&mut self, now_ms: u64) {
        self.last_save_ms = Some(now_ms);
    }
}

/// What coming back from AFK paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AfkReward {
    pub elapsed_ms: u64,
    pub gold: i64,
    pub recovered_gear_id: Option<u64>,
}

/// Reconcile time spent away: baseline gold per elapsed interval, a bonus
/// for adventurers still in the field, and a chance to recover gear from a
/// previously failed adventurer at reduced value. Quick reloads below the
/// threshold pay nothing.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn reconcile_afk(state: &mut GameState, now_ms: u64) -> Option<AfkReward> {
    let elapsed_ms = now_ms.saturating_sub(state.last_active_ms);
    state.last_active_ms = now_ms;
    if elapsed_ms < AFK_MIN_ELAPSED_MS {
        return None;
    }

    let baseline = (elapsed_ms / 1_000 / AFK_SECONDS_PER_GOLD) as f32;
    let on_mission = state.on_mission_count() as f32;
    let gold = (baseline * (1.0 + AFK_MISSION_BONUS * on_mission)).floor() as i64;
    if gold > 0 {
        state.credit_gold(gold, now_ms, "afk reward");
        state.log.push(
            now_ms,
            LOG_AFK_REWARD,
            format!("{gold} gold earned while the guild ran itself"),
        );
    }

    let mut recovered_gear_id = None;
    let failed_name = state
        .roster
        .iter()
        .find(|a| a.last_mission_failed)
        .map(|a| a.name.clone());
    if let Some(failed_name) = failed_name {
        let rng = state.rng();
        let mut afk = rng.afk();
        let roll: f32 = afk.random();
        if roll < AFK_GEAR_RECOVERY_CHANCE {
            let base = afk.random_range(GEAR_VALUE_MIN..=GEAR_VALUE_MAX);
            let value = (base as f32 * AFK_GEAR_RECOVERY_VALUE).floor() as i64;
            let name = names::gear_name(&mut *afk);
            drop(afk);
            let id = state.next_gear_id;
            state.next_gear_id += 1;
            state.inventory.gear.push(GearItem {
                id,
                name: name.clone(),
                quality: GearQuality::Common,
                value,
            });
            state.log.push(
                now_ms,
                LOG_AFK_RECOVERY,
                format!("{name} recovered from {failed_name}'s last expedition"),
            );
            recovered_gear_id = Some(id);
        }
    }

    Some(AfkReward {
        elapsed_ms,
        gold,
        recovered_gear_id,
    })
}
