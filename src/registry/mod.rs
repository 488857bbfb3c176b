use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::types::{ActionId, ItemId, MAX_LEVEL, PurchaseId, Skill, ToolKind};

mod standard;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: ItemId,
    pub name: String,
    pub sells_for: f64,
    pub is_consumable: bool,
}

impl ItemDef {
    pub fn new(id: &str, name: &str, sells_for: f64) -> Self {
        Self {
            id: ItemId::new(id),
            name: name.to_string(),
            sells_for,
            is_consumable: false,
        }
    }

    pub fn consumable(mut self) -> Self {
        self.is_consumable = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThievingSpec {
    /// Target's perception; together with the player's stealth it fixes
    /// the success chance of each attempt.
    pub perception: f64,
    pub max_gold: f64,
    pub stun_ticks: f64,
}

impl ThievingSpec {
    pub fn success_chance(&self, stealth: f64) -> f64 {
        (stealth / (stealth + self.perception)).clamp(0.05, 0.95)
    }

    /// Success-weighted mean of the uniform 1..=max_gold payout.
    pub fn expected_gold_per_action(&self, stealth: f64) -> f64 {
        self.success_chance(stealth) * (1.0 + self.max_gold) / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Byproduct {
    pub item: ItemId,
    pub chance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: ActionId,
    pub name: String,
    pub skill: Skill,
    pub unlock_level: u8,
    /// Mean duration in ticks, before tool modifiers.
    pub base_ticks: f64,
    pub xp: f64,
    pub outputs: Vec<(ItemId, u32)>,
    pub inputs: Vec<(ItemId, u32)>,
    pub thieving: Option<ThievingSpec>,
    pub byproduct: Option<Byproduct>,
}

impl ActionDef {
    pub fn new(
        id: &str,
        name: &str,
        skill: Skill,
        unlock_level: u8,
        base_ticks: f64,
        xp: f64,
    ) -> Self {
        Self {
            id: ActionId::new(id),
            name: name.to_string(),
            skill,
            unlock_level,
            base_ticks,
            xp,
            outputs: Vec::new(),
            inputs: Vec::new(),
            thieving: None,
            byproduct: None,
        }
    }

    pub fn with_output(mut self, item: &str, qty: u32) -> Self {
        self.outputs.push((ItemId::new(item), qty));
        self
    }

    pub fn with_input(mut self, item: &str, qty: u32) -> Self {
        self.inputs.push((ItemId::new(item), qty));
        self
    }

    pub fn with_thieving(mut self, perception: f64, max_gold: f64, stun_ticks: f64) -> Self {
        self.thieving = Some(ThievingSpec {
            perception,
            max_gold,
            stun_ticks,
        });
        self
    }

    pub fn with_byproduct(mut self, item: &str, chance: f64) -> Self {
        self.byproduct = Some(Byproduct {
            item: ItemId::new(item),
            chance,
        });
        self
    }

    pub fn consumes_inputs(&self) -> bool {
        !self.inputs.is_empty()
    }

    pub fn output_count(&self, item: &ItemId) -> u32 {
        self.outputs
            .iter()
            .find(|(id, _)| id == item)
            .map(|(_, qty)| *qty)
            .unwrap_or(0)
    }

    pub fn produces(&self, item: &ItemId) -> bool {
        self.output_count(item) > 0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseDef {
    pub id: PurchaseId,
    pub name: String,
    pub base_cost: f64,
    /// Multiplier on action duration for affected skills; below 1.0 is faster.
    pub duration_multiplier: f64,
    pub tool: Option<ToolKind>,
    pub requirements: Vec<(Skill, u8)>,
    pub affects: Vec<Skill>,
}

impl PurchaseDef {
    pub fn new(id: &str, name: &str, base_cost: f64, duration_multiplier: f64) -> Self {
        Self {
            id: PurchaseId::new(id),
            name: name.to_string(),
            base_cost,
            duration_multiplier,
            tool: None,
            requirements: Vec::new(),
            affects: Vec::new(),
        }
    }

    pub fn as_tool(mut self, tool: ToolKind) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn with_requirement(mut self, skill: Skill, level: u8) -> Self {
        self.requirements.push((skill, level));
        self
    }

    pub fn affecting(mut self, skill: Skill) -> Self {
        self.affects.push(skill);
        self
    }

    /// Cost doubles for every copy already owned.
    pub fn cost(&self, purchase_counts: &BTreeMap<PurchaseId, u32>) -> f64 {
        let owned = purchase_counts.get(&self.id).copied().unwrap_or(0);
        self.base_cost * 2f64.powi(owned as i32)
    }

    pub fn requirements_met(&self, level_of: impl Fn(Skill) -> u8) -> bool {
        self.requirements
            .iter()
            .all(|(skill, level)| level_of(*skill) >= *level)
    }

    pub fn affects_skill(&self, skill: Skill) -> bool {
        self.affects.contains(&skill)
    }
}

/// Read-only game-data registry: items, actions and shop purchases.
///
/// Lookup tables are keyed by id; iteration helpers always walk skills in
/// canonical order and definitions in registration order, so every consumer
/// sees a deterministic sequence.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    items: HashMap<ItemId, ItemDef>,
    actions: HashMap<ActionId, ActionDef>,
    purchases: HashMap<PurchaseId, PurchaseDef>,
    skill_actions: HashMap<Skill, Vec<ActionId>>,
    purchase_order: Vec<PurchaseId>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_item(&mut self, item: ItemDef) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn add_action(&mut self, action: ActionDef) {
        self.skill_actions
            .entry(action.skill)
            .or_default()
            .push(action.id.clone());
        self.actions.insert(action.id.clone(), action);
    }

    pub fn add_purchase(&mut self, purchase: PurchaseDef) {
        self.purchase_order.push(purchase.id.clone());
        self.purchases.insert(purchase.id.clone(), purchase);
    }

    pub fn item(&self, id: &ItemId) -> Option<&ItemDef> {
        self.items.get(id)
    }

    pub fn action(&self, id: &ActionId) -> Option<&ActionDef> {
        self.actions.get(id)
    }

    pub fn purchase(&self, id: &PurchaseId) -> Option<&PurchaseDef> {
        self.purchases.get(id)
    }

    pub fn sells_for(&self, id: &ItemId) -> f64 {
        self.items.get(id).map(|item| item.sells_for).unwrap_or(0.0)
    }

    pub fn actions_for_skill(&self, skill: Skill) -> &[ActionId] {
        self.skill_actions
            .get(&skill)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All actions, skills in canonical order, registration order within one.
    pub fn all_actions(&self) -> impl Iterator<Item = &ActionDef> + '_ {
        Skill::ALL.into_iter().flat_map(move |skill| {
            self.actions_for_skill(skill)
                .iter()
                .filter_map(move |id| self.actions.get(id))
        })
    }

    /// Actions whose outputs contain the item, in deterministic order.
    pub fn producers_of(&self, item: &ItemId) -> Vec<&ActionDef> {
        self.all_actions()
            .filter(|action| action.produces(item))
            .collect()
    }

    pub fn purchases_iter(&self) -> impl Iterator<Item = &PurchaseDef> + '_ {
        self.purchase_order
            .iter()
            .filter_map(move |id| self.purchases.get(id))
    }

    /// Purchases not yet owned, paired with each skill they would speed up.
    pub fn available_skill_upgrades(
        &self,
        purchase_counts: &BTreeMap<PurchaseId, u32>,
    ) -> Vec<(&PurchaseDef, Skill)> {
        let mut upgrades = Vec::new();
        for purchase in self.purchases_iter() {
            if purchase_counts.get(&purchase.id).copied().unwrap_or(0) > 0 {
                continue;
            }
            for skill in &purchase.affects {
                upgrades.push((purchase, *skill));
            }
        }
        upgrades
    }

    /// Combined duration multiplier for a skill from all owned purchases.
    pub fn duration_modifier(
        &self,
        skill: Skill,
        purchase_counts: &BTreeMap<PurchaseId, u32>,
    ) -> f64 {
        let mut modifier = 1.0;
        for (id, count) in purchase_counts {
            if *count == 0 {
                continue;
            }
            if let Some(purchase) = self.purchases.get(id) {
                if purchase.affects_skill(skill) {
                    modifier *= purchase.duration_multiplier.powi(*count as i32);
                }
            }
        }
        modifier
    }

    /// Tool tier = owned upgrade purchases of the kind, capped at the 3-bit max.
    pub fn tool_tier(&self, kind: ToolKind, purchase_counts: &BTreeMap<PurchaseId, u32>) -> u8 {
        let mut tier: u32 = 0;
        for (id, count) in purchase_counts {
            if let Some(purchase) = self.purchases.get(id) {
                if purchase.tool == Some(kind) {
                    tier += count;
                }
            }
        }
        tier.min(ToolKind::MAX_TIER as u32) as u8
    }

    pub fn skill_is_consuming(&self, skill: Skill) -> bool {
        self.actions_for_skill(skill)
            .iter()
            .filter_map(|id| self.actions.get(id))
            .any(|action| action.consumes_inputs())
    }

    pub fn boundaries(&self) -> Boundaries {
        let mut per_skill: HashMap<Skill, Vec<u8>> = HashMap::new();
        for action in self.all_actions() {
            per_skill
                .entry(action.skill)
                .or_default()
                .push(action.unlock_level);
        }
        for levels in per_skill.values_mut() {
            levels.sort_unstable();
            levels.dedup();
        }
        Boundaries { per_skill }
    }
}

/// Per-skill unlock boundary tables, precomputed once from the registry.
#[derive(Debug, Clone)]
pub struct Boundaries {
    per_skill: HashMap<Skill, Vec<u8>>,
}

impl Boundaries {
    pub fn levels(&self, skill: Skill) -> &[u8] {
        self.per_skill
            .get(&skill)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First boundary strictly above `level`; the domain maximum when none.
    pub fn next_boundary(&self, skill: Skill, level: u8) -> u8 {
        self.levels(skill)
            .iter()
            .copied()
            .find(|boundary| *boundary > level)
            .unwrap_or(MAX_LEVEL)
    }
}
