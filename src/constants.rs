//! Centralized balance and tuning constants for Guildhall game logic.
//!
//! These values define the deterministic math for the core simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Logging keys -------------------------------------------------------------
pub(crate) const LOG_MISSION_DISPATCHED: &str = "log.mission.dispatched";
pub(crate) const LOG_MISSION_RECALLED: &str = "log.mission.recalled";
pub(crate) const LOG_MISSION_SUCCESS: &str = "log.mission.success";
pub(crate) const LOG_MISSION_FAILURE: &str = "log.mission.failure";
pub(crate) const LOG_MISSION_LOST_ZONE: &str = "log.mission.lost-zone";
pub(crate) const LOG_MISSION_DEATH_GOLD: &str = "log.mission.death-gold";
pub(crate) const LOG_ZONE_CLEARED: &str = "log.zone.cleared";
pub(crate) const LOG_POOL_REFRESHED: &str = "log.pool.refreshed";
pub(crate) const LOG_POOL_WINDOW_RESET: &str = "log.pool.window-reset";
pub(crate) const LOG_HIRE_DECLINED: &str = "log.hire.declined";
pub(crate) const LOG_SHOP_STARTED: &str = "log.town.shop-started";
pub(crate) const LOG_SHOP_OPERATIONAL: &str = "log.town.shop-operational";
pub(crate) const LOG_CHURCH_STARTED: &str = "log.town.church-started";
pub(crate) const LOG_CHURCH_OPERATIONAL: &str = "log.town.church-operational";
pub(crate) const LOG_INCOME_COLLECTED: &str = "log.town.income-collected";
pub(crate) const LOG_ORDER_PLACED: &str = "log.town.order-placed";
pub(crate) const LOG_ORDER_FULFILLED: &str = "log.town.order-fulfilled";
pub(crate) const LOG_UPGRADE_PURCHASED: &str = "log.upgrade.purchased";
pub(crate) const LOG_GEAR_SOLD: &str = "log.gear.sold";
pub(crate) const LOG_SAVE_DECLINED: &str = "log.save.declined";
pub(crate) const LOG_AFK_REWARD: &str = "log.afk.reward";
pub(crate) const LOG_AFK_RECOVERY: &str = "log.afk.recovery";

// Mission tuning ------------------------------------------------------------
pub const MISSION_DURATION_MS: u64 = 30_000;
pub(crate) const SUCCESS_FLOOR: f32 = 5.0;
pub(crate) const SUCCESS_CEILING: f32 = 95.0;
pub(crate) const DANGER_SUCCESS_PENALTY: f32 = 25.0;
pub(crate) const EXPERIENCE_BONUS_PER_MISSION: f32 = 0.5;
pub(crate) const EXPERIENCE_BONUS_CAP: f32 = 10.0;
pub(crate) const GEAR_VALUE_MIN: i64 = 20;
pub(crate) const GEAR_VALUE_MAX: i64 = 120;
pub(crate) const SUCCESS_REPUTATION_SCALE: f32 = 10.0;

// Tick cadences -------------------------------------------------------------
pub const DANGER_TICK_MS: u64 = 60_000;
pub const PROGRESS_TICK_MS: u64 = 1_000;
pub const RESOLVE_TICK_MS: u64 = 1_000;
pub const CONSTRUCTION_TICK_MS: u64 = 1_000;

// Zone tuning ---------------------------------------------------------------
pub(crate) const ZONE_DANGEROUS_RATIO: f32 = 0.8;
pub(crate) const ZONE_SAFE_RATIO: f32 = 0.2;
pub(crate) const ZONE_MATCH_EFFECTIVENESS: f32 = 1.25;
pub(crate) const ZONE_BASE_EFFECTIVENESS: f32 = 1.0;
pub(crate) const ZONE_SUCCESS_DAMAGE_FACTOR: f32 = 2.0;
pub(crate) const ZONE_FAILURE_DAMAGE_FACTOR: f32 = 1.0;

// Pool tuning ---------------------------------------------------------------
pub const POOL_WINDOW_MS: u64 = 12 * 60 * 60 * 1_000;
pub const POOL_REFRESHES_PER_WINDOW: u8 = 2;
pub(crate) const MIN_POOL_SIZE: usize = 1;
pub(crate) const POPULATION_BOOMING: u32 = 1_200;
pub(crate) const POPULATION_STABLE: u32 = 600;
pub(crate) const RANK_UPGRADE_CHANCE: f32 = 0.30;
pub(crate) const REASSIGN_REPUTATION_REQUIREMENT: i64 = 10;

// Town economy --------------------------------------------------------------
pub(crate) const RELATIONSHIP_HOSTILE_FLOOR: i64 = -20;
pub(crate) const INCOME_CAP_MINUTES: f64 = 1_440.0;
pub(crate) const SPECIALIZATION_MATCH_BONUS: f64 = 0.30;
pub(crate) const CHURCH_RELATIONSHIP_PER_HOUR: i64 = 1;
pub(crate) const CHURCH_COST: i64 = 500;
pub(crate) const CHURCH_BUILD_MS: u64 = 120_000;
pub(crate) const ORDER_QUEUE_CAP: usize = 12;
pub(crate) const ORDER_OFFER_MIN: i64 = 15;
pub(crate) const ORDER_OFFER_MAX: i64 = 60;

// Persistence ---------------------------------------------------------------
pub const AUTOSAVE_MIN_INTERVAL_MS: u64 = 30_000;
pub(crate) const AFK_MIN_ELAPSED_MS: u64 = 30_000;
pub(crate) const AFK_SECONDS_PER_GOLD: u64 = 10;
pub(crate) const AFK_MISSION_BONUS: f32 = 0.20;
pub(crate) const AFK_GEAR_RECOVERY_CHANCE: f32 = 0.30;
pub(crate) const AFK_GEAR_RECOVERY_VALUE: f32 = 0.70;

// History bounds ------------------------------------------------------------
pub(crate) const GAME_LOG_CAP: usize = 200;
pub(crate) const LEDGER_CAP: usize = 500;
