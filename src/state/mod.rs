use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{ActionId, PurchaseId, Skill, level_for_xp, skill_index};

mod inventory;

pub use inventory::{DEFAULT_CAPACITY, Inventory, InventoryError};

/// Per-skill accumulated XP, indexed by the canonical skill order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SkillXp {
    xp: [f64; Skill::ALL.len()],
}

impl SkillXp {
    pub const fn zero() -> Self {
        Self {
            xp: [0.0; Skill::ALL.len()],
        }
    }

    pub fn get(&self, skill: Skill) -> f64 {
        self.xp[skill_index(skill)]
    }

    pub fn set(&mut self, skill: Skill, xp: f64) {
        self.xp[skill_index(skill)] = xp;
    }

    pub fn add(&mut self, skill: Skill, xp: f64) {
        self.xp[skill_index(skill)] += xp;
    }

    pub fn level(&self, skill: Skill) -> u8 {
        level_for_xp(self.get(skill))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Skill, f64)> + '_ {
        Skill::ALL.into_iter().zip(self.xp.iter().copied())
    }
}

/// One world snapshot: everything the solver reads and the simulator
/// advances. Cheap to clone; planning always works on copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldState {
    pub skill_xp: SkillXp,
    pub inventory: Inventory,
    pub credits: f64,
    pub active_action: Option<ActionId>,
    pub purchase_counts: BTreeMap<PurchaseId, u32>,
}

impl Default for WorldState {
    fn default() -> Self {
        Self::new()
    }
}

impl WorldState {
    pub fn new() -> Self {
        Self {
            skill_xp: SkillXp::zero(),
            inventory: Inventory::default(),
            credits: 0.0,
            active_action: None,
            purchase_counts: BTreeMap::new(),
        }
    }

    pub fn level(&self, skill: Skill) -> u8 {
        self.skill_xp.level(skill)
    }

    pub fn xp(&self, skill: Skill) -> f64 {
        self.skill_xp.get(skill)
    }

    /// Stealth grows linearly with the thieving level.
    pub fn stealth(&self) -> f64 {
        40.0 + self.level(Skill::Thieving) as f64
    }

    pub fn owned(&self, purchase: &PurchaseId) -> u32 {
        self.purchase_counts.get(purchase).copied().unwrap_or(0)
    }
}
