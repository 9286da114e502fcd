//! Snapshot persistence: round-trip fidelity, the migration chain, the
//! export envelope, and store-failure behavior.
use std::fmt;

use guildhall::constants::MISSION_DURATION_MS;
use guildhall::dispatch::{assign, build_shop, refresh_pool, resolve_due_missions};
use guildhall::state::GameState;
use guildhall::{
    GuildEngine, MemoryStore, SAVE_KEY, SaveError, ShopTier, SnapshotStore, Specialization, save,
};

/// A state with mileage on it: missions flown, a shop under construction,
/// ledgers and log entries written.
fn lived_in_state() -> GameState {
    let mut state = GameState::new(1234, 0);
    state.reputation = 500;
    state.inventory.gold = 5_000;
    refresh_pool(&mut state, 0).unwrap();
    let id = state.pool.adventurers[0].id;
    assign(&mut state, id, 1, 0).unwrap();
    resolve_due_missions(&mut state, MISSION_DURATION_MS);
    build_shop(
        &mut state,
        1,
        Specialization::Merchant,
        ShopTier::Storefront,
        MISSION_DURATION_MS,
    )
    .unwrap();
    state
}

#[test]
fn snapshot_round_trip_is_deep_equal() {
    let state = lived_in_state();
    let blob = save::encode(&state, 99_000).unwrap();
    let restored = save::decode(&blob).unwrap();
    assert_eq!(
        serde_json::to_value(&state).unwrap(),
        serde_json::to_value(&restored).unwrap()
    );
}

#[test]
fn restored_state_keeps_simulating() {
    let state = lived_in_state();
    let resolved = state.resolved_missions.len();
    let blob = save::encode(&state, 99_000).unwrap();
    let mut restored = save::decode(&blob).unwrap();

    // The dedupe set survived, and the restored RNG bundle works.
    assert_eq!(restored.resolved_missions.len(), resolved);
    let id = restored.pool.adventurers[0].id;
    assign(&mut restored, id, 2, 100_000).unwrap();
    let reports = resolve_due_missions(&mut restored, 100_000 + MISSION_DURATION_MS);
    assert_eq!(reports.len(), 1);
}

#[test]
fn v1_save_in_the_store_migrates_on_load() {
    let store = MemoryStore::default();
    let v1 = serde_json::json!({
        "version": 1,
        "timestamp_ms": 7,
        "state": {
            "seed": 77,
            "reputation": 120,
            "resolved": ["2_1", "5_3"],
            "pool": {
                "adventurers": [],
                "refresh_at_ms": 43_200_000,
                "refreshes_used": 2,
                "failed_since_refresh": 1
            }
        }
    })
    .to_string();
    store.write(SAVE_KEY, &v1).unwrap();

    let engine = GuildEngine::load_or_new(store, 0, 0).unwrap();
    let state = engine.state();
    assert_eq!(state.reputation, 120);
    assert_eq!(state.seed, 77);
    assert!(state.resolved_missions.contains("5_3"));
    assert_eq!(state.pool.window_end_ms, 43_200_000);
    assert_eq!(state.pool.refreshes_used, 2);
}

#[test]
fn unsupported_version_does_not_clobber_the_save() {
    let store = MemoryStore::default();
    let future = serde_json::json!({
        "version": save::SAVE_VERSION + 5,
        "timestamp_ms": 0,
        "state": {}
    })
    .to_string();
    store.write(SAVE_KEY, &future).unwrap();

    assert!(GuildEngine::load_or_new(store.clone(), 0, 0).is_err());
    // The blob is still there for a newer build to read.
    assert_eq!(store.read(SAVE_KEY).unwrap().unwrap(), future);
}

#[test]
fn export_import_round_trips_between_engines() {
    let mut source = GuildEngine::new(MemoryStore::default(), 8, 0);
    source.state_mut().inventory.gold = 4_321;
    source.state_mut().reputation = 77;
    let file = source.export(1_000).unwrap();

    let mut target = GuildEngine::new(MemoryStore::default(), 9, 0);
    target.import(&file, 2_000).unwrap();
    assert_eq!(target.state().inventory.gold, 4_321);
    assert_eq!(target.state().reputation, 77);
    assert_eq!(target.state().seed, 8);
}

#[derive(Debug)]
struct BrokenStoreError;

impl fmt::Display for BrokenStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "quota exceeded")
    }
}

impl std::error::Error for BrokenStoreError {}

/// Store that accepts nothing, standing in for a full or unavailable
/// browser storage backend.
struct BrokenStore;

impl SnapshotStore for BrokenStore {
    type Error = BrokenStoreError;

    fn read(&self, _key: &str) -> Result<Option<String>, Self::Error> {
        Ok(None)
    }

    fn write(&self, _key: &str, _blob: &str) -> Result<(), Self::Error> {
        Err(BrokenStoreError)
    }

    fn delete(&self, _key: &str) -> Result<(), Self::Error> {
        Err(BrokenStoreError)
    }
}

#[test]
fn store_failure_declines_the_save_and_play_continues() {
    let mut engine = GuildEngine::new(BrokenStore, 3, 0);
    let err = engine.save(0).unwrap_err();
    assert!(matches!(err, SaveError::Store(_)));

    // The decline is visible in the game log and the game keeps running.
    assert_eq!(engine.state().log.latest().unwrap().key, "log.save.declined");
    refresh_pool(engine.state_mut(), 0).unwrap();
    let id = engine.state().pool.adventurers[0].id;
    engine.state_mut().reputation = 100;
    assign(engine.state_mut(), id, 1, 0).unwrap();
    let reports = engine.advance(MISSION_DURATION_MS);
    assert_eq!(reports.len(), 1);
}
