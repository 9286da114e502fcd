//! The mission/pool orchestrator: every state transition the view layer can
//! trigger, plus the polling checks the engine runs each tick.
//!
//! Every mutating step reads a consistent copy of the pieces it needs, then
//! applies the result as a whole-value replace. Mission resolution is
//! additionally guarded by the persistent dedupe set so a mission resolves
//! exactly once no matter how often the due-check reruns.
use log::debug;
use thiserror::Error;

use crate::adventurer::{Adventurer, AuraTotals, aura_totals};
use crate::constants::{
    CHURCH_COST, LOG_CHURCH_OPERATIONAL, LOG_CHURCH_STARTED, LOG_GEAR_SOLD, LOG_HIRE_DECLINED,
    LOG_INCOME_COLLECTED, LOG_MISSION_DEATH_GOLD, LOG_MISSION_DISPATCHED, LOG_MISSION_FAILURE,
    LOG_MISSION_RECALLED, LOG_MISSION_SUCCESS, LOG_ORDER_FULFILLED, LOG_ORDER_PLACED,
    LOG_POOL_REFRESHED, LOG_POOL_WINDOW_RESET, LOG_SHOP_OPERATIONAL, LOG_SHOP_STARTED,
    LOG_UPGRADE_PURCHASED, LOG_ZONE_CLEARED, ORDER_QUEUE_CAP, REASSIGN_REPUTATION_REQUIREMENT,
    RELATIONSHIP_HOSTILE_FLOOR, SUCCESS_REPUTATION_SCALE,
};
use crate::mission::Mission;
use crate::state::{GameState, GearItem, GearQuality};
use crate::town::{
    self, BuildingStatus, PlayerChurch, PlayerShop, ShopTier, Specialization,
};
use crate::upgrades::{self, PurchaseError, UpgradeCategory};
use crate::zone;
use crate::{constants, names};
use rand::Rng;

/// A declined action. No state was mutated; the reason is also written to
/// the game log where the player can see it.
#[derive(Debug, Error, PartialEq)]
pub enum ActionError {
    #[error("no adventurer with id {0}")]
    UnknownAdventurer(u64),
    #[error("no zone with id {0}")]
    UnknownZone(u32),
    #[error("no town with id {0}")]
    UnknownTown(u32),
    #[error("no order with id {0}")]
    UnknownOrder(u64),
    #[error("no gear with id {0}")]
    UnknownGear(u64),
    #[error("adventurer {0} is already on a mission")]
    AdventurerBusy(u64),
    #[error("requires {required} reputation, have {available}")]
    InsufficientReputation { required: i64, available: i64 },
    #[error("requires {required} gold, have {available}")]
    InsufficientGold { required: i64, available: i64 },
    #[error("no trade relationship with town {0}")]
    NoTradeRelationship(u32),
    #[error("town {town_id} is hostile (relationship {relationship})")]
    HostileTown { town_id: u32, relationship: i64 },
    #[error("town {town_id} already has a {building}")]
    AlreadyBuilt {
        town_id: u32,
        building: &'static str,
    },
    #[error("town {0} has no operational shop")]
    ShopNotOperational(u32),
    #[error("pool refresh limit reached for this window")]
    RefreshExhausted,
    #[error("order queue is full")]
    OrderQueueFull,
    #[error("need {required} {material} in stock, have {available}")]
    InsufficientStock {
        material: String,
        required: u32,
        available: u32,
    },
    #[error(transparent)]
    Upgrade(#[from] PurchaseError),
}

/// Where `assign` found the adventurer.
enum Slot {
    Pool,
    Roster(usize),
}

/// Synergy totals from the *other* on-mission adventurers in a zone.
fn zone_auras(roster: &[Adventurer], zone_id: u32, exclude_id: u64) -> AuraTotals {
    aura_totals(roster.iter().filter(|a| {
        a.id != exclude_id && !a.is_available() && a.zone_id == Some(zone_id)
    }))
}

/// Hire from the pool or reassign a roster member, sending them on a mission
/// into the zone. Reputation is the currency; the mission locks in its
/// success chance at dispatch time.
pub fn assign(
    state: &mut GameState,
    adventurer_id: u64,
    zone_id: u32,
    now_ms: u64,
) -> Result<(), ActionError> {
    let zone_index = state
        .zones
        .iter()
        .position(|z| z.id == zone_id)
        .ok_or(ActionError::UnknownZone(zone_id))?;

    let (slot, cost) = if state.pool.adventurers.iter().any(|a| a.id == adventurer_id) {
        let hireable = state
            .pool
            .adventurers
            .iter()
            .find(|a| a.id == adventurer_id)
            .ok_or(ActionError::UnknownAdventurer(adventurer_id))?;
        (Slot::Pool, hireable.reputation_cost)
    } else {
        let index = state
            .roster
            .iter()
            .position(|a| a.id == adventurer_id)
            .ok_or(ActionError::UnknownAdventurer(adventurer_id))?;
        if !state.roster[index].is_available() {
            return Err(ActionError::AdventurerBusy(adventurer_id));
        }
        let requirement =
            (REASSIGN_REPUTATION_REQUIREMENT - state.effects.hire_discount).max(0);
        (Slot::Roster(index), requirement)
    };

    if state.reputation < cost {
        state.log.push(
            now_ms,
            LOG_HIRE_DECLINED,
            format!("needs {cost} reputation, guild has {}", state.reputation),
        );
        debug!("assign declined: reputation {} < {cost}", state.reputation);
        return Err(ActionError::InsufficientReputation {
            required: cost,
            available: state.reputation,
        });
    }

    let auras = zone_auras(&state.roster, zone_id, adventurer_id);

    // All gates passed; mutate.
    state.adjust_reputation(-cost, now_ms, "adventurer dispatch");
    let mut adventurer = match slot {
        Slot::Pool => state
            .pool
            .take(adventurer_id)
            .ok_or(ActionError::UnknownAdventurer(adventurer_id))?,
        Slot::Roster(index) => state.roster.remove(index),
    };

    let success_chance = zone::mission_success_chance(
        &adventurer,
        &state.zones[zone_index],
        &auras,
        &state.effects,
    );
    let mission_id = state.next_mission_id;
    state.next_mission_id += 1;
    let mission = Mission::new(mission_id, adventurer.id, zone_id, now_ms, success_chance);

    state.log.push(
        now_ms,
        LOG_MISSION_DISPATCHED,
        format!(
            "{} set out for {} ({success_chance:.0}% odds)",
            adventurer.name, state.zones[zone_index].name
        ),
    );
    adventurer.begin_mission(mission);
    state.roster.push(adventurer);
    state.mission_stats.sent += 1;

    state.zones[zone_index] = state.zones[zone_index].revealed();
    if state.effects.scouting {
        state.zones = state.zones.iter().map(zone::Zone::revealed).collect();
    }
    Ok(())
}

/// Recall an adventurer, discarding the in-flight mission unresolved. No
/// rewards, no penalty, no dedupe entry (the mission never resolves).
pub fn unassign(state: &mut GameState, adventurer_id: u64, now_ms: u64) -> Result<(), ActionError> {
    let adventurer = state
        .roster
        .iter_mut()
        .find(|a| a.id == adventurer_id)
        .ok_or(ActionError::UnknownAdventurer(adventurer_id))?;
    if adventurer.is_available() {
        return Ok(());
    }
    adventurer.recall();
    let name = adventurer.name.clone();
    state
        .log
        .push(now_ms, LOG_MISSION_RECALLED, format!("{name} was recalled"));
    Ok(())
}

/// What one resolved mission produced.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionReport {
    pub adventurer_id: u64,
    pub mission_id: u64,
    pub zone_id: u32,
    pub success: bool,
    pub damage_pct: f32,
    pub zone_cleared: bool,
    pub gear_id: Option<u64>,
}

/// Resolve every mission whose return time has passed. Exactly-once per
/// mission: the dedupe key is committed to the persistent set before any
/// reward or penalty is applied.
pub fn resolve_due_missions(state: &mut GameState, now_ms: u64) -> Vec<MissionReport> {
    let due: Vec<u64> = state
        .roster
        .iter()
        .filter(|a| a.mission.as_ref().is_some_and(|m| m.is_due(now_ms)))
        .map(|a| a.id)
        .collect();

    let mut reports = Vec::with_capacity(due.len());
    for adventurer_id in due {
        if let Some(report) = resolve_one(state, adventurer_id, now_ms) {
            reports.push(report);
        }
    }
    reports
}

fn resolve_one(state: &mut GameState, adventurer_id: u64, now_ms: u64) -> Option<MissionReport> {
    let index = state.roster.iter().position(|a| a.id == adventurer_id)?;
    let mission = state.roster[index].mission.clone()?;

    let key = mission.dedupe_key();
    if !state.resolved_missions.insert(key) {
        debug!("mission {} already resolved, skipping", mission.id);
        return None;
    }

    let zone_index = state.zones.iter().position(|z| z.id == mission.zone_id);
    let Some(zone_index) = zone_index else {
        // The zone reference went stale; resolve as a quiet no-op reset.
        state.roster[index].recall();
        state.log.push(
            now_ms,
            constants::LOG_MISSION_LOST_ZONE,
            format!("{} returned from a vanished zone", state.roster[index].name),
        );
        return None;
    };

    let rng = state.rng();
    let roll: f32 = rng.mission().random_range(0.0..100.0);
    let success = roll < mission.success_chance;

    let auras = zone_auras(&state.roster, mission.zone_id, adventurer_id);
    let (next_zone, outcome) =
        zone::apply_outcome(&state.zones[zone_index], &state.roster[index], success, auras.damage);
    state.zones[zone_index] = next_zone;

    if outcome.cleared {
        let bonus = state.zones[zone_index].reputation_bonus;
        let zone_name = state.zones[zone_index].name.clone();
        state.adjust_reputation(bonus, now_ms, "zone cleared");
        state.zone_stats.clears += 1;
        state.log.push(
            now_ms,
            LOG_ZONE_CLEARED,
            format!("{zone_name} was cleared (+{bonus} reputation)"),
        );
    }

    let name = state.roster[index].name.clone();
    let mut gear_id = None;
    if success {
        state.mission_stats.succeeded += 1;
        state.roster[index].missions_completed += 1;

        let item = roll_gear_drop(state, &auras);
        gear_id = Some(item.id);
        let rep_gain =
            (SUCCESS_REPUTATION_SCALE * (1.0 + auras.reputation)).floor() as i64;
        state.adjust_reputation(rep_gain, now_ms, "mission success");
        let gold_bonus = (item.value as f32 * auras.gold).floor() as i64;
        if gold_bonus > 0 {
            state.credit_gold(gold_bonus, now_ms, "mission gold bonus");
        }
        state.log.push(
            now_ms,
            LOG_MISSION_SUCCESS,
            format!(
                "{name} returned with {} ({:.0}% zone damage)",
                item.name, outcome.damage_pct
            ),
        );
        state.inventory.gear.push(item);
    } else {
        state.mission_stats.deaths += 1;
        state.zone_stats.deaths += 1;
        state.pool.record_failure();
        if state.effects.death_gold > 0 {
            let payout = state.effects.death_gold;
            state.credit_gold(payout, now_ms, "death gold");
            state.log.push(
                now_ms,
                LOG_MISSION_DEATH_GOLD,
                format!("{payout} gold recovered from {name}'s effects"),
            );
        }
        state.log.push(
            now_ms,
            LOG_MISSION_FAILURE,
            format!("{name}'s mission failed ({:.0}% zone damage)", outcome.damage_pct),
        );
    }
    state.roster[index].finish_mission(!success);

    Some(MissionReport {
        adventurer_id,
        mission_id: mission.id,
        zone_id: mission.zone_id,
        success,
        damage_pct: outcome.damage_pct,
        zone_cleared: outcome.cleared,
        gear_id,
    })
}

fn roll_gear_drop(state: &mut GameState, auras: &AuraTotals) -> GearItem {
    let rng = state.rng();
    let mut loot = rng.loot();
    let quality = match loot.random_range(0..10_u32) {
        0..=5 => GearQuality::Common,
        6..=8 => GearQuality::Uncommon,
        _ => GearQuality::Rare,
    };
    let base = loot.random_range(constants::GEAR_VALUE_MIN..=constants::GEAR_VALUE_MAX);
    let value = (base as f32
        * quality.value_multiplier()
        * (1.0 + auras.loot + state.effects.loot_bonus))
        .floor() as i64;
    let name = names::gear_name(&mut *loot);
    drop(loot);

    let id = state.next_gear_id;
    state.next_gear_id += 1;
    GearItem {
        id,
        name,
        quality,
        value,
    }
}

/// Cosmetic progress derivation. Resolution keys off `return_ms`, never off
/// this value reaching 100.
pub fn tick_mission_progress(state: &mut GameState, now_ms: u64) {
    for adventurer in &mut state.roster {
        if let Some(mission) = adventurer.mission.as_mut() {
            mission.progress = mission.progress_at(now_ms);
        }
    }
}

/// Grow danger in every zone for the elapsed time. Scouting keeps every zone
/// revealed as a side effect of the survey.
pub fn update_danger(state: &mut GameState, now_ms: u64) {
    let scouting = state.effects.scouting;
    state.zones = state
        .zones
        .iter()
        .map(|z| {
            let next = zone::grown(z, now_ms);
            if scouting { next.revealed() } else { next }
        })
        .collect();
}

/// Idempotent 12-hour window rollover.
pub fn roll_pool_window(state: &mut GameState, now_ms: u64) {
    if state.pool.roll_window(now_ms) {
        state
            .log
            .push(now_ms, LOG_POOL_WINDOW_RESET, "hiring pool window reset");
    }
}

/// Manual pool refresh, at most twice per window.
pub fn refresh_pool(state: &mut GameState, now_ms: u64) -> Result<usize, ActionError> {
    if !state.pool.can_refresh() {
        return Err(ActionError::RefreshExhausted);
    }
    let rng = state.rng();
    let mut recruit = rng.recruit();
    let mut pool = state.pool.clone();
    let size = pool.refresh(
        state.population,
        &state.effects,
        &mut state.next_adventurer_id,
        &mut *recruit,
    );
    drop(recruit);
    state.pool = pool;
    state.log.push(
        now_ms,
        LOG_POOL_REFRESHED,
        format!("{size} new adventurers are looking for work"),
    );
    Ok(size)
}

fn town_index(state: &GameState, town_id: u32) -> Result<usize, ActionError> {
    state
        .towns
        .iter()
        .position(|t| t.id == town_id)
        .ok_or(ActionError::UnknownTown(town_id))
}

fn check_building_gates(
    state: &GameState,
    town_index: usize,
    building: &'static str,
) -> Result<(), ActionError> {
    let town = &state.towns[town_index];
    if !town.trade_established {
        return Err(ActionError::NoTradeRelationship(town.id));
    }
    if town.relationship_value < RELATIONSHIP_HOSTILE_FLOOR {
        return Err(ActionError::HostileTown {
            town_id: town.id,
            relationship: town.relationship_value,
        });
    }
    let occupied = match building {
        "church" => town.church.is_some(),
        _ => town.shop.is_some(),
    };
    if occupied {
        return Err(ActionError::AlreadyBuilt {
            town_id: town.id,
            building,
        });
    }
    Ok(())
}

/// Start shop construction in a town. Gold is spent up front; the shop goes
/// operational when `complete_constructions` sees its completion time pass.
pub fn build_shop(
    state: &mut GameState,
    town_id: u32,
    specialization: Specialization,
    tier: ShopTier,
    now_ms: u64,
) -> Result<(), ActionError> {
    let index = town_index(state, town_id)?;
    check_building_gates(state, index, "shop")?;
    let cost = tier.cost();
    if !state.try_spend_gold(cost, now_ms, "shop construction") {
        return Err(ActionError::InsufficientGold {
            required: cost,
            available: state.inventory.gold,
        });
    }
    state.towns[index].shop = Some(PlayerShop {
        tier,
        specialization,
        status: BuildingStatus::Building,
        completion_ms: now_ms + tier.build_time_ms(),
        last_income_collection_ms: 0,
    });
    let town_name = state.towns[index].name.clone();
    state.log.push(
        now_ms,
        LOG_SHOP_STARTED,
        format!("construction started on a {} shop in {town_name}", specialization.as_str()),
    );
    Ok(())
}

pub fn build_church(state: &mut GameState, town_id: u32, now_ms: u64) -> Result<(), ActionError> {
    let index = town_index(state, town_id)?;
    check_building_gates(state, index, "church")?;
    if !state.try_spend_gold(CHURCH_COST, now_ms, "church construction") {
        return Err(ActionError::InsufficientGold {
            required: CHURCH_COST,
            available: state.inventory.gold,
        });
    }
    state.towns[index].church = Some(PlayerChurch::started(now_ms));
    let town_name = state.towns[index].name.clone();
    state.log.push(
        now_ms,
        LOG_CHURCH_STARTED,
        format!("church construction started in {town_name}"),
    );
    Ok(())
}

/// Polling transition for buildings whose completion time has passed, plus
/// the church relationship drip and auto-collected shop income.
pub fn complete_constructions(state: &mut GameState, now_ms: u64) {
    let mut log_events: Vec<(&'static str, String)> = Vec::new();
    let mut relationship_gains: Vec<(usize, i64)> = Vec::new();

    for (index, town) in state.towns.iter_mut().enumerate() {
        if let Some(shop) = town.shop.as_mut()
            && shop.status == BuildingStatus::Building
            && now_ms >= shop.completion_ms
        {
            shop.status = BuildingStatus::Operational;
            shop.last_income_collection_ms = now_ms;
            log_events.push((
                LOG_SHOP_OPERATIONAL,
                format!("the shop in {} is open for business", town.name),
            ));
        }
        if let Some(church) = town.church.as_mut() {
            if church.status == BuildingStatus::Building && now_ms >= church.completion_ms {
                church.status = BuildingStatus::Operational;
                church.last_blessing_ms = now_ms;
                log_events.push((
                    LOG_CHURCH_OPERATIONAL,
                    format!("the church in {} holds its first service", town.name),
                ));
            }
            let (gained, stamp) = town::church_blessing(church, now_ms);
            if gained > 0 {
                church.last_blessing_ms = stamp;
                relationship_gains.push((index, gained));
            }
        }
    }
    for (index, gained) in relationship_gains {
        state.towns[index].relationship_value += gained;
    }
    for (key, detail) in log_events {
        state.log.push(now_ms, key, detail);
    }

    if state.effects.auto_collect {
        let ids: Vec<u32> = state.towns.iter().map(|t| t.id).collect();
        for town_id in ids {
            let _ = collect_income(state, town_id, now_ms);
        }
    }
}

/// Collect accrued shop income, resetting the collection clock.
pub fn collect_income(state: &mut GameState, town_id: u32, now_ms: u64) -> Result<i64, ActionError> {
    let index = town_index(state, town_id)?;
    let town = &state.towns[index];
    let Some(shop) = town.shop.as_ref() else {
        return Err(ActionError::ShopNotOperational(town_id));
    };
    if shop.status != BuildingStatus::Operational {
        return Err(ActionError::ShopNotOperational(town_id));
    }
    let income = town::pending_income(shop, town, &state.effects, now_ms);
    if income == 0 {
        // Leave the clock alone so sub-gold accrual is not thrown away.
        return Ok(0);
    }
    let town_name = town.name.clone();
    if let Some(shop) = state.towns[index].shop.as_mut() {
        shop.last_income_collection_ms = now_ms;
    }
    state.credit_gold(income, now_ms, "shop income");
    state.log.push(
        now_ms,
        LOG_INCOME_COLLECTED,
        format!("{income} gold collected from the shop in {town_name}"),
    );
    Ok(income)
}

/// Buy a permanent upgrade; the caller learns the incremental cost.
pub fn purchase_upgrade(
    state: &mut GameState,
    category: UpgradeCategory,
    id: &str,
    now_ms: u64,
) -> Result<i64, ActionError> {
    let available = u64::try_from(state.inventory.gold).unwrap_or(0);
    let mut purchased = state.purchased.clone();
    let cost = i64::try_from(upgrades::purchase(&mut purchased, category, id, available)?)
        .unwrap_or(i64::MAX);
    if !state.try_spend_gold(cost, now_ms, "upgrade") {
        return Err(ActionError::InsufficientGold {
            required: cost,
            available: state.inventory.gold,
        });
    }
    state.purchased = purchased;
    state.effects = upgrades::aggregate_effects(&state.purchased);
    state.log.push(
        now_ms,
        LOG_UPGRADE_PURCHASED,
        format!("purchased {id} for {cost} gold"),
    );
    Ok(cost)
}

/// Sell a gear item from the inventory for its listed value.
pub fn sell_gear(state: &mut GameState, gear_id: u64, now_ms: u64) -> Result<i64, ActionError> {
    let index = state
        .inventory
        .gear
        .iter()
        .position(|g| g.id == gear_id)
        .ok_or(ActionError::UnknownGear(gear_id))?;
    let item = state.inventory.gear.remove(index);
    state.credit_gold(item.value, now_ms, "gear sale");
    state.log.push(
        now_ms,
        LOG_GEAR_SOLD,
        format!("sold {} for {} gold", item.name, item.value),
    );
    Ok(item.value)
}

/// Move materials from the guild stores onto shop shelves.
pub fn restock_shop(
    state: &mut GameState,
    town_id: u32,
    material: &str,
    quantity: u32,
    _now_ms: u64,
) -> Result<(), ActionError> {
    let index = town_index(state, town_id)?;
    let operational = state.towns[index]
        .shop
        .as_ref()
        .is_some_and(|s| s.status == BuildingStatus::Operational);
    if !operational {
        return Err(ActionError::ShopNotOperational(town_id));
    }
    let held = state
        .inventory
        .materials
        .get(material)
        .copied()
        .unwrap_or(0);
    if held < quantity {
        return Err(ActionError::InsufficientStock {
            material: material.to_string(),
            required: quantity,
            available: held,
        });
    }
    if held == quantity {
        state.inventory.materials.remove(material);
    } else {
        state
            .inventory
            .materials
            .insert(material.to_string(), held - quantity);
    }
    *state.shop_stock.entry(material.to_string()).or_insert(0) += quantity;
    Ok(())
}

/// Synthesize a customer order for a town with an operational shop.
pub fn place_order(state: &mut GameState, town_id: u32, now_ms: u64) -> Result<u64, ActionError> {
    let index = town_index(state, town_id)?;
    let operational = state.towns[index]
        .shop
        .as_ref()
        .is_some_and(|s| s.status == BuildingStatus::Operational);
    if !operational {
        return Err(ActionError::ShopNotOperational(town_id));
    }
    if state.orders.len() >= ORDER_QUEUE_CAP {
        return Err(ActionError::OrderQueueFull);
    }
    let rng = state.rng();
    let mut market = rng.market();
    let order = town::customer_order(state.next_order_id, town_id, &mut *market);
    drop(market);
    state.next_order_id += 1;
    state.log.push(
        now_ms,
        LOG_ORDER_PLACED,
        format!(
            "{} wants {} {} for {} gold",
            order.customer, order.quantity, order.material, order.offered_gold
        ),
    );
    let id = order.id;
    state.orders.push(order);
    Ok(id)
}

/// Fulfill a customer order from shop stock, crediting the offered gold.
pub fn fulfill_order(state: &mut GameState, order_id: u64, now_ms: u64) -> Result<i64, ActionError> {
    let index = state
        .orders
        .iter()
        .position(|o| o.id == order_id)
        .ok_or(ActionError::UnknownOrder(order_id))?;
    let (material, quantity) = {
        let order = &state.orders[index];
        (order.material.clone(), order.quantity)
    };
    let stocked = state.shop_stock.get(&material).copied().unwrap_or(0);
    if stocked < quantity {
        return Err(ActionError::InsufficientStock {
            material,
            required: quantity,
            available: stocked,
        });
    }
    if stocked == quantity {
        state.shop_stock.remove(&material);
    } else {
        state.shop_stock.insert(material.clone(), stocked - quantity);
    }
    let order = state.orders.remove(index);
    state.credit_gold(order.offered_gold, now_ms, "customer order");
    state.log.push(
        now_ms,
        LOG_ORDER_FULFILLED,
        format!(
            "delivered {} {} to {} for {} gold",
            order.quantity, order.material, order.customer, order.offered_gold
        ),
    );
    Ok(order.offered_gold)
}
