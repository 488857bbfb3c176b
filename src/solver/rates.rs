use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::registry::Registry;
use crate::state::WorldState;
use crate::types::{ActionId, Skill, ToolKind};

/// Packed fingerprint of every rate-affecting capability: all skill levels
/// (7-bit fields, canonical skill order, low bits first) followed by every
/// tool tier (3-bit fields). Goal-independent by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapabilityKey(u64);

impl CapabilityKey {
    pub fn of(state: &WorldState, registry: &Registry) -> Self {
        let mut key: u64 = 0;
        let mut shift = 0;
        for skill in Skill::ALL {
            key |= (state.level(skill) as u64 & 0x7f) << shift;
            shift += 7;
        }
        for tool in ToolKind::ALL {
            let tier = registry.tool_tier(tool, &state.purchase_counts);
            key |= (tier as u64 & 0b111) << shift;
            shift += 3;
        }
        Self(key)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Capability-level projection of one action: how fast it runs and what it
/// yields per tick, independent of inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRateSummary {
    pub action: ActionId,
    pub skill: Skill,
    pub unlock_level: u8,
    pub unlocked: bool,
    /// Mean ticks per completion, after tool modifiers and expected stuns.
    pub expected_ticks: f64,
    pub gold_per_tick: f64,
    pub xp_per_tick: f64,
    pub consumes_inputs: bool,
}

/// Compute summaries for every registered action. Pure in the snapshot's
/// capability fields; two states with equal capability keys get equal output.
pub fn compute_rate_summaries(state: &WorldState, registry: &Registry) -> Vec<ActionRateSummary> {
    let mut summaries = Vec::new();
    for action in registry.all_actions() {
        let unlocked = state.level(action.skill) >= action.unlock_level;
        let modifier = registry.duration_modifier(action.skill, &state.purchase_counts);
        let base = action.base_ticks * modifier;

        let (expected_ticks, gold_per_tick, xp_per_tick) = match &action.thieving {
            Some(spec) => {
                let stealth = state.stealth();
                let success = spec.success_chance(stealth);
                let effective = base + (1.0 - success) * spec.stun_ticks;
                (
                    effective,
                    spec.expected_gold_per_action(stealth) / effective,
                    success * action.xp / effective,
                )
            }
            None => {
                let gold: f64 = action
                    .outputs
                    .iter()
                    .map(|(item, qty)| *qty as f64 * registry.sells_for(item))
                    .sum();
                (base, gold / base, action.xp / base)
            }
        };

        summaries.push(ActionRateSummary {
            action: action.id.clone(),
            skill: action.skill,
            unlock_level: action.unlock_level,
            unlocked,
            expected_ticks,
            gold_per_tick,
            xp_per_tick,
            consumes_inputs: action.consumes_inputs(),
        });
    }
    summaries
}

/// Run-scoped cache of rate summaries keyed by capability key. One solver
/// run owns exactly one cache; it must be cleared (or dropped) at the run
/// boundary and never shared across runs.
#[derive(Debug)]
pub struct RateCache {
    run_id: Uuid,
    entries: HashMap<CapabilityKey, Rc<Vec<ActionRateSummary>>>,
    hits: u64,
    misses: u64,
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

impl RateCache {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn get_or_compute(
        &mut self,
        state: &WorldState,
        registry: &Registry,
    ) -> Rc<Vec<ActionRateSummary>> {
        let key = CapabilityKey::of(state, registry);
        if let Some(entry) = self.entries.get(&key) {
            self.hits += 1;
            return Rc::clone(entry);
        }
        self.misses += 1;
        log::trace!("rate cache miss for key {:#x}", key.raw());
        let summaries = Rc::new(compute_rate_summaries(state, registry));
        self.entries.insert(key, Rc::clone(&summaries));
        summaries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::types::{ItemId, PurchaseId, xp_for_level};

    #[test]
    fn test_key_packs_levels_and_tools() {
        let registry = Registry::standard();
        let mut state = WorldState::new();
        let base = CapabilityKey::of(&state, &registry);
        // All skills level 1, no tools.
        let mut expected: u64 = 0;
        for i in 0..Skill::ALL.len() {
            expected |= 1 << (7 * i);
        }
        assert_eq!(base.raw(), expected);

        state.skill_xp.set(Skill::Fishing, xp_for_level(3));
        let key = CapabilityKey::of(&state, &registry);
        assert_eq!(key.raw(), expected + (2 << 7));

        state.purchase_counts =
            BTreeMap::from([(PurchaseId::new("idle:iron_axe"), 1u32)]);
        let key = CapabilityKey::of(&state, &registry);
        let axe_shift = 7 * Skill::ALL.len();
        assert_eq!(key.raw(), expected + (2 << 7) + (1 << axe_shift));
    }

    #[test]
    fn test_equal_keys_give_identical_summaries() {
        let registry = Registry::standard();
        let mut a = WorldState::new();
        let mut b = WorldState::new();
        // Different inventory and credits, same capabilities.
        a.credits = 100.0;
        b.inventory.add(&ItemId::new("idle:coal"), 30).unwrap();
        assert_eq!(
            CapabilityKey::of(&a, &registry),
            CapabilityKey::of(&b, &registry)
        );
        assert_eq!(
            compute_rate_summaries(&a, &registry),
            compute_rate_summaries(&b, &registry)
        );
    }

    #[test]
    fn test_cache_hits_and_misses() {
        let registry = Registry::standard();
        let mut cache = RateCache::new();
        let state = WorldState::new();
        let first = cache.get_or_compute(&state, &registry);
        assert_eq!((cache.hits(), cache.misses()), (0, 1));
        let second = cache.get_or_compute(&state, &registry);
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
        assert!(Rc::ptr_eq(&first, &second));

        let mut leveled = state.clone();
        leveled.skill_xp.set(Skill::Mining, xp_for_level(50));
        cache.get_or_compute(&leveled, &registry);
        assert_eq!((cache.hits(), cache.misses()), (1, 2));

        cache.clear();
        assert_eq!((cache.hits(), cache.misses()), (0, 0));
    }

    #[test]
    fn test_thieving_rates_account_for_stun() {
        let registry = Registry::standard();
        let state = WorldState::new();
        let summaries = compute_rate_summaries(&state, &registry);
        let pickpocket = summaries
            .iter()
            .find(|s| s.action == ActionId::new("idle:pickpocket_man"))
            .unwrap();
        // Failure stuns push the mean attempt beyond the base 30 ticks.
        assert!(pickpocket.expected_ticks > 30.0);
        assert!(pickpocket.gold_per_tick > 0.0);
        assert!(!pickpocket.consumes_inputs);
    }
}
