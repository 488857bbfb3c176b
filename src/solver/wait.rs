use serde::{Deserialize, Serialize};

use crate::registry::Registry;
use crate::sim::{RateEstimate, Simulator};
use crate::state::WorldState;
use crate::types::{ActionId, ItemId, Skill};

use super::sell::SellPolicyKind;

/// Predicate on a future state that a committed macro runs toward.
/// Estimation is expected-value only: 0 when already satisfied, infinite
/// when the current activity cannot make progress toward it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WaitCondition {
    #[serde(rename = "skill_xp_reached")]
    SkillXpReached { skill: Skill, target_xp: f64 },
    #[serde(rename = "inventory_delta")]
    InventoryDelta {
        item: ItemId,
        delta: u32,
        start_count: u32,
    },
    #[serde(rename = "inventory_at_least")]
    InventoryAtLeast { item: ItemId, min_total: u32 },
    #[serde(rename = "inputs_depleted")]
    InputsDepleted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<ActionId>,
    },
    #[serde(rename = "effective_credits_at_least")]
    EffectiveCreditsAtLeast { target: f64, policy: SellPolicyKind },
    #[serde(rename = "any_of")]
    AnyOf { children: Vec<WaitCondition> },
}

impl WaitCondition {
    pub fn any_of(children: Vec<WaitCondition>) -> Self {
        Self::AnyOf { children }
    }

    pub fn short_description(&self) -> String {
        match self {
            Self::SkillXpReached { skill, target_xp } => {
                format!("{skill} xp >= {target_xp}")
            }
            Self::InventoryDelta {
                item,
                delta,
                start_count,
            } => format!("{item} +{delta} (from {start_count})"),
            Self::InventoryAtLeast { item, min_total } => format!("{item} >= {min_total}"),
            Self::InputsDepleted { action } => match action {
                Some(action) => format!("inputs depleted for {action}"),
                None => "inputs depleted".to_string(),
            },
            Self::EffectiveCreditsAtLeast { target, policy } => {
                format!("effective credits >= {target} ({policy})")
            }
            Self::AnyOf { children } => children
                .iter()
                .map(WaitCondition::short_description)
                .collect::<Vec<_>>()
                .join(" | "),
        }
    }

    pub fn is_satisfied(
        &self,
        state: &WorldState,
        registry: &Registry,
        sim: &dyn Simulator,
    ) -> bool {
        match self {
            Self::SkillXpReached { skill, target_xp } => state.xp(*skill) >= *target_xp,
            Self::InventoryDelta {
                item,
                delta,
                start_count,
            } => state.inventory.count(item).saturating_sub(*start_count) >= *delta,
            Self::InventoryAtLeast { item, min_total } => {
                state.inventory.count(item) >= *min_total
            }
            Self::InputsDepleted { action } => {
                let action_id = action.clone().or_else(|| state.active_action.clone());
                let Some(action) = action_id.as_ref().and_then(|id| registry.action(id)) else {
                    return false;
                };
                if action.inputs.is_empty() {
                    return false;
                }
                action
                    .inputs
                    .iter()
                    .any(|(item, qty)| state.inventory.count(item) < *qty)
            }
            Self::EffectiveCreditsAtLeast { target, policy } => {
                sim.effective_credits(state, *policy) as f64 >= *target
            }
            Self::AnyOf { children } => children
                .iter()
                .any(|child| child.is_satisfied(state, registry, sim)),
        }
    }

    /// Expected ticks until satisfaction under the given rates.
    pub fn estimate_ticks(
        &self,
        state: &WorldState,
        registry: &Registry,
        sim: &dyn Simulator,
        rates: &RateEstimate,
    ) -> f64 {
        if self.is_satisfied(state, registry, sim) {
            return 0.0;
        }
        match self {
            Self::SkillXpReached { skill, target_xp } => {
                ticks_toward(*target_xp - state.xp(*skill), rates.xp_rate(*skill))
            }
            Self::InventoryDelta {
                item,
                delta,
                start_count,
            } => {
                let produced = state.inventory.count(item).saturating_sub(*start_count);
                ticks_toward((*delta - produced) as f64, rates.item_rate(item))
            }
            Self::InventoryAtLeast { item, min_total } => {
                let remaining = min_total - state.inventory.count(item);
                ticks_toward(remaining as f64, rates.item_rate(item))
            }
            Self::InputsDepleted { action } => {
                let action_id = action.clone().or_else(|| state.active_action.clone());
                let Some(action) = action_id.as_ref().and_then(|id| registry.action(id)) else {
                    return f64::INFINITY;
                };
                let mut soonest = f64::INFINITY;
                for (item, _) in &action.inputs {
                    let consumption = -rates.item_rate(item);
                    if consumption > 0.0 {
                        let ticks = state.inventory.count(item) as f64 / consumption;
                        soonest = soonest.min(ticks);
                    }
                }
                soonest
            }
            Self::EffectiveCreditsAtLeast { target, policy } => {
                let current = sim.effective_credits(state, *policy) as f64;
                ticks_toward(target - current, rates.gold_per_tick)
            }
            Self::AnyOf { children } => children
                .iter()
                .map(|child| child.estimate_ticks(state, registry, sim, rates))
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// The child condition that would trigger first (minimum estimate,
    /// first match on ties). Non-composite conditions trigger themselves.
    pub fn triggering_condition(
        &self,
        state: &WorldState,
        registry: &Registry,
        sim: &dyn Simulator,
        rates: &RateEstimate,
    ) -> Option<&WaitCondition> {
        match self {
            Self::AnyOf { children } => {
                let mut best: Option<(&WaitCondition, f64)> = None;
                for child in children {
                    let ticks = child.estimate_ticks(state, registry, sim, rates);
                    if ticks.is_finite() {
                        let replace = match best {
                            None => true,
                            Some((_, best_ticks)) => ticks < best_ticks,
                        };
                        if replace {
                            best = Some((child, ticks));
                        }
                    }
                }
                best.map(|(child, _)| child)
            }
            other => {
                let ticks = other.estimate_ticks(state, registry, sim, rates);
                ticks.is_finite().then_some(other)
            }
        }
    }
}

fn ticks_toward(remaining: f64, rate: f64) -> f64 {
    if remaining <= 0.0 {
        return 0.0;
    }
    if rate <= 0.0 {
        return f64::INFINITY;
    }
    remaining / rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::StandardSim;
    use crate::types::ActionId;

    fn fixture() -> (Registry, WorldState) {
        let mut state = WorldState::new();
        state.active_action = Some(ActionId::new("idle:cut_normal_logs"));
        (Registry::standard(), state)
    }

    #[test]
    fn test_estimate_zero_when_satisfied() {
        let (registry, mut state) = fixture();
        state.skill_xp.set(Skill::Woodcutting, 500.0);
        let sim = StandardSim::new(&registry);
        let rates = sim.estimate_rates(&state);
        let wait = WaitCondition::SkillXpReached {
            skill: Skill::Woodcutting,
            target_xp: 100.0,
        };
        assert_eq!(wait.estimate_ticks(&state, &registry, &sim, &rates), 0.0);
    }

    #[test]
    fn test_estimate_xp_ticks() {
        let (registry, state) = fixture();
        let sim = StandardSim::new(&registry);
        let rates = sim.estimate_rates(&state);
        let wait = WaitCondition::SkillXpReached {
            skill: Skill::Woodcutting,
            target_xp: 100.0,
        };
        // 10 xp per 30 ticks -> 300 ticks for 100 xp.
        assert_eq!(wait.estimate_ticks(&state, &registry, &sim, &rates), 300.0);
    }

    #[test]
    fn test_estimate_infinite_without_progress() {
        let (registry, state) = fixture();
        let sim = StandardSim::new(&registry);
        let rates = sim.estimate_rates(&state);
        // Woodcutting never yields mining xp.
        let wait = WaitCondition::SkillXpReached {
            skill: Skill::Mining,
            target_xp: 100.0,
        };
        assert!(
            wait.estimate_ticks(&state, &registry, &sim, &rates)
                .is_infinite()
        );
    }

    #[test]
    fn test_inputs_depleted_late_binds_to_active_action() {
        let (registry, mut state) = fixture();
        state.active_action = Some(ActionId::new("idle:cook_shrimp"));
        state
            .inventory
            .add(&ItemId::new("idle:raw_shrimp"), 6)
            .unwrap();
        let sim = StandardSim::new(&registry);
        let rates = sim.estimate_rates(&state);
        let wait = WaitCondition::InputsDepleted { action: None };
        assert!(!wait.is_satisfied(&state, &registry, &sim));
        // 6 shrimp at 1 per 30 ticks.
        assert_eq!(wait.estimate_ticks(&state, &registry, &sim, &rates), 180.0);

        state.inventory.remove_all(&ItemId::new("idle:raw_shrimp"));
        assert!(wait.is_satisfied(&state, &registry, &sim));
    }

    #[test]
    fn test_any_of_reports_soonest_child() {
        let (registry, state) = fixture();
        let sim = StandardSim::new(&registry);
        let rates = sim.estimate_rates(&state);
        let near = WaitCondition::SkillXpReached {
            skill: Skill::Woodcutting,
            target_xp: 50.0,
        };
        let far = WaitCondition::SkillXpReached {
            skill: Skill::Woodcutting,
            target_xp: 1_000.0,
        };
        let wait = WaitCondition::any_of(vec![far.clone(), near.clone()]);
        assert_eq!(wait.estimate_ticks(&state, &registry, &sim, &rates), 150.0);
        let triggering = wait
            .triggering_condition(&state, &registry, &sim, &rates)
            .unwrap();
        assert_eq!(triggering, &near);
    }

    #[test]
    fn test_round_trip_with_optional_field_omitted() {
        let wait = WaitCondition::InputsDepleted { action: None };
        let value = serde_json::to_value(&wait).unwrap();
        assert_eq!(value["type"], "inputs_depleted");
        assert!(value.get("action").is_none());
        let back: WaitCondition = serde_json::from_value(value).unwrap();
        assert_eq!(back, wait);
    }
}
