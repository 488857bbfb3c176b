use rand::Rng;
use rand::rngs::StdRng;

use crate::registry::{ActionDef, Registry, ThievingSpec};
use crate::solver::sell::SellPolicyKind;
use crate::solver::wait::WaitCondition;
use crate::state::WorldState;
use crate::types::ActionId;

use super::{
    AdvanceOutcome, ConsumeOutcome, ExecBoundary, Interaction, RateEstimate, SimError, Simulator,
};

/// Hard cap on a single `consume_until` run; hitting it means the wait
/// condition is unreachable under the current activity.
const MAX_RUN_TICKS: u64 = 10_000_000;

/// Reference simulator over a registry. The deterministic side applies
/// expected values; the stochastic side rolls thieving attempts and
/// byproduct drops per completed action.
pub struct StandardSim<'a> {
    registry: &'a Registry,
}

impl<'a> StandardSim<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    fn action_unlocked(&self, state: &WorldState, action: &ActionDef) -> bool {
        state.level(action.skill) >= action.unlock_level
    }

    fn base_effective_ticks(&self, state: &WorldState, action: &ActionDef) -> f64 {
        action.base_ticks
            * self
                .registry
                .duration_modifier(action.skill, &state.purchase_counts)
    }

    fn success_chance(state: &WorldState, spec: &ThievingSpec) -> f64 {
        spec.success_chance(state.stealth())
    }

    /// Mean ticks per attempt including the expected stun after failures.
    fn expected_ticks(&self, state: &WorldState, action: &ActionDef) -> f64 {
        let base = self.base_effective_ticks(state, action);
        match &action.thieving {
            Some(spec) => {
                let success = Self::success_chance(state, spec);
                base + (1.0 - success) * spec.stun_ticks
            }
            None => base,
        }
    }

    fn apply(&self, state: &WorldState, interaction: &Interaction) -> Result<WorldState, SimError> {
        let mut next = state.clone();
        match interaction {
            Interaction::SwitchActivity(action_id) => {
                let action = self
                    .registry
                    .action(action_id)
                    .ok_or_else(|| SimError::UnknownAction(action_id.clone()))?;
                if !self.action_unlocked(&next, action) {
                    return Err(SimError::ActionLocked {
                        action: action_id.clone(),
                        skill: action.skill,
                        required: action.unlock_level,
                    });
                }
                next.active_action = Some(action_id.clone());
            }
            Interaction::BuyShopItem(purchase_id) => {
                let purchase = self
                    .registry
                    .purchase(purchase_id)
                    .ok_or_else(|| SimError::UnknownPurchase(purchase_id.clone()))?;
                if !purchase.requirements_met(|skill| next.level(skill)) {
                    return Err(SimError::RequirementsNotMet(purchase_id.clone()));
                }
                let cost = purchase.cost(&next.purchase_counts);
                if next.credits < cost {
                    return Err(SimError::InsufficientCredits {
                        purchase: purchase_id.clone(),
                        cost,
                        credits: next.credits,
                    });
                }
                next.credits -= cost;
                *next.purchase_counts.entry(purchase_id.clone()).or_insert(0) += 1;
            }
            Interaction::SellItems(items) => {
                for item in items {
                    let count = next.inventory.remove_all(item);
                    next.credits += count as f64 * self.registry.sells_for(item);
                }
            }
        }
        Ok(next)
    }

    /// Run one stochastic attempt of the active action. Returns the elapsed
    /// ticks, or an exec boundary when the attempt cannot run.
    fn step_once(
        &self,
        state: &mut WorldState,
        action: &ActionDef,
        rng: &mut StdRng,
    ) -> Result<u64, ExecBoundary> {
        let base = self.base_effective_ticks(state, action);
        if let Some(spec) = &action.thieving {
            let success = Self::success_chance(state, spec);
            if rng.gen_bool(success) {
                state.credits += rng.gen_range(1..=spec.max_gold.max(1.0) as u64) as f64;
                state.skill_xp.add(action.skill, action.xp);
                return Ok(base.round() as u64);
            }
            return Ok((base + spec.stun_ticks).round() as u64);
        }

        for (item, qty) in &action.inputs {
            if state.inventory.count(item) < *qty {
                return Err(ExecBoundary::NoProgressPossible);
            }
        }
        // Reject before consuming anything so a full inventory never eats inputs.
        for (item, _) in &action.outputs {
            if !state.inventory.contains(item) && state.inventory.is_full() {
                return Err(ExecBoundary::InventoryFull);
            }
        }
        for (item, qty) in &action.inputs {
            let _ = state.inventory.remove(item, *qty);
        }
        for (item, qty) in &action.outputs {
            let _ = state.inventory.add(item, *qty);
        }
        if let Some(byproduct) = &action.byproduct {
            if rng.gen_bool(byproduct.chance) {
                // Windfall drop; lost when there is no slot for it.
                let _ = state.inventory.add(&byproduct.item, 1);
            }
        }
        state.skill_xp.add(action.skill, action.xp);
        Ok(base.round() as u64)
    }

    fn rates_for(&self, state: &WorldState, action: &ActionDef) -> RateEstimate {
        let mut estimate = RateEstimate::empty();
        if !self.action_unlocked(state, action) {
            return estimate;
        }
        let ticks = self.expected_ticks(state, action);
        if ticks <= 0.0 {
            return estimate;
        }
        if let Some(spec) = &action.thieving {
            let success = Self::success_chance(state, spec);
            estimate
                .xp_per_tick
                .insert(action.skill, success * action.xp / ticks);
            estimate.gold_per_tick = success * (1.0 + spec.max_gold) / 2.0 / ticks;
            return estimate;
        }
        estimate.xp_per_tick.insert(action.skill, action.xp / ticks);
        let mut gold = 0.0;
        for (item, qty) in &action.outputs {
            let rate = *qty as f64 / ticks;
            *estimate.items_per_tick.entry(item.clone()).or_insert(0.0) += rate;
            gold += rate * self.registry.sells_for(item);
        }
        for (item, qty) in &action.inputs {
            *estimate.items_per_tick.entry(item.clone()).or_insert(0.0) -= *qty as f64 / ticks;
        }
        estimate.gold_per_tick = gold;
        estimate
    }
}

impl Simulator for StandardSim<'_> {
    fn apply_interaction_deterministic(
        &self,
        state: &WorldState,
        interaction: &Interaction,
    ) -> Result<WorldState, SimError> {
        self.apply(state, interaction)
    }

    fn apply_interaction(
        &self,
        state: &WorldState,
        interaction: &Interaction,
        _rng: &mut StdRng,
    ) -> Result<WorldState, SimError> {
        // No interaction carries randomness in this ruleset.
        self.apply(state, interaction)
    }

    fn advance_deterministic(&self, state: &WorldState, ticks: u64) -> AdvanceOutcome {
        let mut next = state.clone();
        let Some(action_id) = next.active_action.clone() else {
            return AdvanceOutcome {
                state: next,
                deaths: 0,
            };
        };
        let Some(action) = self.registry.action(&action_id) else {
            return AdvanceOutcome {
                state: next,
                deaths: 0,
            };
        };
        if !self.action_unlocked(&next, action) {
            return AdvanceOutcome {
                state: next,
                deaths: 0,
            };
        }

        let per_action = self.expected_ticks(&next, action);
        if per_action <= 0.0 {
            return AdvanceOutcome {
                state: next,
                deaths: 0,
            };
        }
        let mut completions = (ticks as f64 / per_action).floor() as u64;
        for (item, qty) in &action.inputs {
            completions = completions.min((next.inventory.count(item) / qty) as u64);
        }

        if let Some(spec) = &action.thieving {
            let success = Self::success_chance(&next, spec);
            next.credits += completions as f64 * success * (1.0 + spec.max_gold) / 2.0;
            next.skill_xp
                .add(action.skill, completions as f64 * success * action.xp);
        } else {
            for (item, qty) in &action.inputs {
                let _ = next.inventory.remove(item, qty * completions as u32);
            }
            for (item, qty) in &action.outputs {
                // Overflow past the slot cap is dropped; the planner's
                // feasibility margin keeps this path out of real plans.
                let _ = next.inventory.add(item, qty * completions as u32);
            }
            next.skill_xp
                .add(action.skill, completions as f64 * action.xp);
        }

        AdvanceOutcome {
            state: next,
            deaths: 0,
        }
    }

    fn consume_until(
        &self,
        state: &WorldState,
        wait_for: &WaitCondition,
        rng: &mut StdRng,
    ) -> ConsumeOutcome {
        let mut next = state.clone();
        let mut ticks_elapsed: u64 = 0;
        let boundary = loop {
            if wait_for.is_satisfied(&next, self.registry, self) {
                break ExecBoundary::WaitConditionSatisfied;
            }
            let Some(action_id) = next.active_action.clone() else {
                break ExecBoundary::NoProgressPossible;
            };
            let Some(action) = self.registry.action(&action_id) else {
                break ExecBoundary::NoProgressPossible;
            };
            if !self.action_unlocked(&next, action) {
                break ExecBoundary::NoProgressPossible;
            }
            match self.step_once(&mut next, action, rng) {
                Ok(ticks) => ticks_elapsed += ticks,
                Err(boundary) => break boundary,
            }
            if ticks_elapsed >= MAX_RUN_TICKS {
                break ExecBoundary::NoProgressPossible;
            }
        };
        ConsumeOutcome {
            state: next,
            ticks_elapsed,
            deaths: 0,
            boundary,
        }
    }

    fn effective_credits(&self, state: &WorldState, policy: SellPolicyKind) -> i64 {
        let mut total = state.credits;
        for item in policy.liquidatable(state, self.registry) {
            total += state.inventory.count(&item) as f64 * self.registry.sells_for(&item);
        }
        total.floor() as i64
    }

    fn estimate_rates(&self, state: &WorldState) -> RateEstimate {
        match &state.active_action {
            Some(action_id) => self.estimate_rates_for_action(state, action_id),
            None => RateEstimate::empty(),
        }
    }

    fn estimate_rates_for_action(&self, state: &WorldState, action: &ActionId) -> RateEstimate {
        match self.registry.action(action) {
            Some(action) => self.rates_for(state, action),
            None => RateEstimate::empty(),
        }
    }
}
