//! Zone definitions, danger growth/decay, and the mission-success formula.
//!
//! Zone math is pure: callers get back a new zone value and apply it as a
//! whole-value replace. The orchestrator owns when these run.
use serde::{Deserialize, Serialize};

use crate::adventurer::{Adventurer, AuraTotals, Class};
use crate::constants::{
    DANGER_SUCCESS_PENALTY, EXPERIENCE_BONUS_CAP, EXPERIENCE_BONUS_PER_MISSION, SUCCESS_CEILING,
    SUCCESS_FLOOR, ZONE_BASE_EFFECTIVENESS, ZONE_DANGEROUS_RATIO, ZONE_FAILURE_DAMAGE_FACTOR,
    ZONE_MATCH_EFFECTIVENESS, ZONE_SAFE_RATIO, ZONE_SUCCESS_DAMAGE_FACTOR,
};
use crate::upgrades::UpgradeEffects;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Forest,
    Cave,
    Ruins,
    Swamp,
    Mountain,
    Crypt,
}

impl ZoneKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Forest => "forest",
            Self::Cave => "cave",
            Self::Ruins => "ruins",
            Self::Swamp => "swamp",
            Self::Mountain => "mountain",
            Self::Crypt => "crypt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ZoneStatus {
    #[default]
    Safe,
    Dangerous,
}

/// A mission destination. Danger and health grow between visits and shrink
/// when missions resolve against the zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub id: u32,
    pub kind: ZoneKind,
    pub name: String,
    pub danger_level: f32,
    pub max_danger: f32,
    /// Danger gained per real-time minute between growth ticks.
    pub growth_rate: f32,
    pub last_growth_ms: u64,
    #[serde(default)]
    pub is_revealed: bool,
    #[serde(default)]
    pub status: ZoneStatus,
    pub current_health: f32,
    pub max_health: f32,
    pub reputation_bonus: i64,
    #[serde(default)]
    pub total_clears: u32,
    #[serde(default)]
    pub total_deaths: u32,
    /// Set once health crosses to zero; re-arms after regrowth.
    #[serde(default)]
    pub cleared: bool,
}

impl Zone {
    /// Idempotent reveal.
    #[must_use]
    pub fn revealed(&self) -> Self {
        let mut zone = self.clone();
        zone.is_revealed = true;
        zone
    }

    #[must_use]
    fn with_recomputed_status(mut self) -> Self {
        if self.danger_level >= self.max_danger * ZONE_DANGEROUS_RATIO {
            self.status = ZoneStatus::Dangerous;
        } else if self.danger_level <= self.max_danger * ZONE_SAFE_RATIO {
            self.status = ZoneStatus::Safe;
        }
        self
    }
}

/// Apply danger growth for the elapsed wall-clock time. Calling twice with no
/// elapsed time is a no-op beyond the first call.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn grown(zone: &Zone, now_ms: u64) -> Zone {
    let mut next = zone.clone();
    let elapsed_minutes = now_ms.saturating_sub(zone.last_growth_ms) as f32 / 60_000.0;
    if elapsed_minutes > 0.0 {
        let gain = zone.growth_rate * elapsed_minutes;
        next.danger_level = (zone.danger_level + gain).clamp(0.0, zone.max_danger);
        next.current_health = (zone.current_health + gain).clamp(0.0, zone.max_health);
        if next.cleared && next.current_health > 0.0 {
            next.cleared = false;
        }
    }
    next.last_growth_ms = now_ms;
    next.with_recomputed_status()
}

/// Class-versus-terrain effectiveness multiplier for zone damage.
#[must_use]
pub const fn effectiveness(class: Class, kind: ZoneKind) -> f32 {
    let matched = matches!(
        (class, kind),
        (Class::Miner, ZoneKind::Cave | ZoneKind::Mountain)
            | (Class::Ranger, ZoneKind::Forest)
            | (Class::Mage, ZoneKind::Crypt)
            | (Class::Rogue, ZoneKind::Swamp)
            | (Class::Warrior, ZoneKind::Ruins)
    );
    if matched {
        ZONE_MATCH_EFFECTIVENESS
    } else {
        ZONE_BASE_EFFECTIVENESS
    }
}

/// Mission success percentage for an adventurer entering a zone, given the
/// summed auras of the *other* on-mission adventurers already there.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn mission_success_chance(
    adventurer: &Adventurer,
    zone: &Zone,
    auras: &AuraTotals,
    effects: &UpgradeEffects,
) -> f32 {
    let danger_penalty = if zone.max_danger > 0.0 {
        (zone.danger_level / zone.max_danger) * DANGER_SUCCESS_PENALTY
    } else {
        0.0
    };
    let experience_bonus = (adventurer.missions_completed as f32 * EXPERIENCE_BONUS_PER_MISSION)
        .min(EXPERIENCE_BONUS_CAP);
    let synergy = auras.success * 100.0;
    (adventurer.success_rate - danger_penalty + experience_bonus + synergy + effects.success_bonus)
        .clamp(SUCCESS_FLOOR, SUCCESS_CEILING)
}

/// What a resolved mission did to the zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutcomeApplied {
    pub damage: f32,
    /// Damage as a percentage of the zone's max health.
    pub damage_pct: f32,
    /// True only on the tick where health crossed from >0 to <=0.
    pub cleared: bool,
}

/// Apply a mission outcome. Success hits twice as hard as failure, scaled by
/// class effectiveness and the additive damage-aura multiplier from
/// co-located adventurers.
#[must_use]
pub fn apply_outcome(
    zone: &Zone,
    adventurer: &Adventurer,
    success: bool,
    damage_aura: f32,
) -> (Zone, OutcomeApplied) {
    let factor = if success {
        ZONE_SUCCESS_DAMAGE_FACTOR
    } else {
        ZONE_FAILURE_DAMAGE_FACTOR
    };
    let damage = adventurer.rank.clearing_power()
        * effectiveness(adventurer.class, zone.kind)
        * factor
        * (1.0 + damage_aura.max(0.0));

    let mut next = zone.clone();
    let health_before = zone.current_health;
    next.current_health = (zone.current_health - damage).max(0.0);
    next.danger_level = (zone.danger_level - damage).max(0.0);

    let cleared = health_before > 0.0 && next.current_health <= 0.0 && !zone.cleared;
    if cleared {
        next.cleared = true;
        next.total_clears = zone.total_clears.saturating_add(1);
    }
    if !success {
        next.total_deaths = zone.total_deaths.saturating_add(1);
    }

    let damage_pct = if zone.max_health > 0.0 {
        (damage / zone.max_health * 100.0).min(100.0)
    } else {
        0.0
    };
    (
        next.with_recomputed_status(),
        OutcomeApplied {
            damage,
            damage_pct,
            cleared,
        },
    )
}
