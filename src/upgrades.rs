//! Permanent guild upgrades and the aggregated effects record.
//!
//! Effects are a fixed-field struct: numeric fields sum across purchases,
//! boolean fields OR. Zero-cost catalog entries count as purchased from the
//! start so their effects are always live.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeCategory {
    Guild,
    Missions,
    Economy,
    Exploration,
}

impl UpgradeCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guild => "guild",
            Self::Missions => "missions",
            Self::Economy => "economy",
            Self::Exploration => "exploration",
        }
    }
}

/// Aggregated modifiers from every owned upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeEffects {
    /// Additive percentage points on mission success.
    pub success_bonus: f32,
    /// Additive probability of rolling a higher rank at recruit time.
    pub wealthy_chance: f32,
    /// Reputation-point discount on reassigning an already-hired adventurer.
    pub hire_discount: i64,
    /// Fractional bonus on shop income.
    pub income_bonus: f32,
    /// Fractional bonus on gear drop value.
    pub loot_bonus: f32,
    /// Flat gold consolation paid when a mission fails.
    pub death_gold: i64,
    /// Reveals every zone without needing a first visit.
    pub scouting: bool,
    /// Shop income is collected on tick instead of by hand.
    pub auto_collect: bool,
}

impl UpgradeEffects {
    fn absorb(&mut self, other: &Self) {
        self.success_bonus += other.success_bonus;
        self.wealthy_chance += other.wealthy_chance;
        self.hire_discount += other.hire_discount;
        self.income_bonus += other.income_bonus;
        self.loot_bonus += other.loot_bonus;
        self.death_gold += other.death_gold;
        self.scouting |= other.scouting;
        self.auto_collect |= other.auto_collect;
    }
}

pub struct UpgradeDef {
    pub id: &'static str,
    pub category: UpgradeCategory,
    pub name: &'static str,
    pub cost: u64,
    pub effect: UpgradeEffects,
}

const NO_EFFECT: UpgradeEffects = UpgradeEffects {
    success_bonus: 0.0,
    wealthy_chance: 0.0,
    hire_discount: 0,
    income_bonus: 0.0,
    loot_bonus: 0.0,
    death_gold: 0,
    scouting: false,
    auto_collect: false,
};

pub const CATALOG: &[UpgradeDef] = &[
    UpgradeDef {
        id: "founding_charter",
        category: UpgradeCategory::Guild,
        name: "Founding Charter",
        cost: 0,
        effect: UpgradeEffects {
            success_bonus: 2.0,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "keen_recruiter",
        category: UpgradeCategory::Guild,
        name: "Keen Recruiter",
        cost: 150,
        effect: UpgradeEffects {
            wealthy_chance: 0.10,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "open_doors",
        category: UpgradeCategory::Guild,
        name: "Open Doors",
        cost: 100,
        effect: UpgradeEffects {
            hire_discount: 5,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "field_manuals",
        category: UpgradeCategory::Missions,
        name: "Field Manuals",
        cost: 200,
        effect: UpgradeEffects {
            success_bonus: 5.0,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "hazard_pay",
        category: UpgradeCategory::Missions,
        name: "Hazard Pay",
        cost: 175,
        effect: UpgradeEffects {
            death_gold: 25,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "trap_sense",
        category: UpgradeCategory::Missions,
        name: "Trap Sense",
        cost: 250,
        effect: UpgradeEffects {
            loot_bonus: 0.15,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "ledger_clerks",
        category: UpgradeCategory::Economy,
        name: "Ledger Clerks",
        cost: 300,
        effect: UpgradeEffects {
            income_bonus: 0.25,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "courier_network",
        category: UpgradeCategory::Economy,
        name: "Courier Network",
        cost: 400,
        effect: UpgradeEffects {
            auto_collect: true,
            ..NO_EFFECT
        },
    },
    UpgradeDef {
        id: "cartographers_guild",
        category: UpgradeCategory::Exploration,
        name: "Cartographers' Guild",
        cost: 350,
        effect: UpgradeEffects {
            scouting: true,
            ..NO_EFFECT
        },
    },
];

/// Owned upgrade ids, grouped by category. BTreeMap keeps snapshot output
/// stable across runs.
pub type PurchasedUpgrades = BTreeMap<UpgradeCategory, Vec<String>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PurchaseError {
    #[error("no upgrade '{id}' in category '{category}'")]
    Unknown { category: &'static str, id: String },
    #[error("upgrade '{0}' already purchased")]
    AlreadyPurchased(String),
    #[error("upgrade costs {cost} gold but only {available} available")]
    InsufficientGold { cost: u64, available: u64 },
}

#[must_use]
pub fn find(category: UpgradeCategory, id: &str) -> Option<&'static UpgradeDef> {
    CATALOG
        .iter()
        .find(|def| def.category == category && def.id == id)
}

#[must_use]
pub fn is_purchased(purchased: &PurchasedUpgrades, def: &UpgradeDef) -> bool {
    def.cost == 0
        || purchased
            .get(&def.category)
            .is_some_and(|ids| ids.iter().any(|owned| owned == def.id))
}

/// Fold every owned (or free) upgrade into one effects record.
#[must_use]
pub fn aggregate_effects(purchased: &PurchasedUpgrades) -> UpgradeEffects {
    let mut totals = UpgradeEffects::default();
    for def in CATALOG {
        if is_purchased(purchased, def) {
            totals.absorb(&def.effect);
        }
    }
    totals
}

/// Record a purchase and return its cost. The caller deducts gold and
/// re-aggregates effects; nothing here touches the wallet.
pub fn purchase(
    purchased: &mut PurchasedUpgrades,
    category: UpgradeCategory,
    id: &str,
    gold_available: u64,
) -> Result<u64, PurchaseError> {
    let def = find(category, id).ok_or_else(|| PurchaseError::Unknown {
        category: category.as_str(),
        id: id.to_string(),
    })?;
    if is_purchased(purchased, def) {
        return Err(PurchaseError::AlreadyPurchased(def.id.to_string()));
    }
    if def.cost > gold_available {
        return Err(PurchaseError::InsufficientGold {
            cost: def.cost,
            available: gold_available,
        });
    }
    purchased
        .entry(category)
        .or_default()
        .push(def.id.to_string());
    Ok(def.cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_entries_are_live_without_purchase() {
        let effects = aggregate_effects(&PurchasedUpgrades::new());
        assert!((effects.success_bonus - 2.0).abs() < f32::EPSILON);
        assert!(!effects.scouting);
    }

    #[test]
    fn numeric_fields_sum_and_booleans_or() {
        let mut purchased = PurchasedUpgrades::new();
        purchase(&mut purchased, UpgradeCategory::Missions, "field_manuals", 1_000).unwrap();
        purchase(&mut purchased, UpgradeCategory::Missions, "hazard_pay", 1_000).unwrap();
        purchase(&mut purchased, UpgradeCategory::Exploration, "cartographers_guild", 1_000)
            .unwrap();

        let effects = aggregate_effects(&purchased);
        // 2.0 from the free charter plus 5.0 from the manuals.
        assert!((effects.success_bonus - 7.0).abs() < f32::EPSILON);
        assert_eq!(effects.death_gold, 25);
        assert!(effects.scouting);
        assert!(!effects.auto_collect);
    }

    #[test]
    fn double_purchase_declines() {
        let mut purchased = PurchasedUpgrades::new();
        purchase(&mut purchased, UpgradeCategory::Guild, "keen_recruiter", 500).unwrap();
        let err = purchase(&mut purchased, UpgradeCategory::Guild, "keen_recruiter", 500)
            .unwrap_err();
        assert_eq!(err, PurchaseError::AlreadyPurchased("keen_recruiter".to_string()));
    }

    #[test]
    fn insufficient_gold_declines_without_mutation() {
        let mut purchased = PurchasedUpgrades::new();
        let err =
            purchase(&mut purchased, UpgradeCategory::Economy, "courier_network", 399).unwrap_err();
        assert_eq!(
            err,
            PurchaseError::InsufficientGold {
                cost: 400,
                available: 399
            }
        );
        assert!(purchased.is_empty());
    }

    #[test]
    fn unknown_upgrade_declines() {
        let mut purchased = PurchasedUpgrades::new();
        let err = purchase(&mut purchased, UpgradeCategory::Guild, "nope", 9_999).unwrap_err();
        assert!(matches!(err, PurchaseError::Unknown { .. }));
    }

    #[test]
    fn free_entries_cannot_be_rebought() {
        let mut purchased = PurchasedUpgrades::new();
        let err =
            purchase(&mut purchased, UpgradeCategory::Guild, "founding_charter", 0).unwrap_err();
        assert!(matches!(err, PurchaseError::AlreadyPurchased(_)));
    }
}
