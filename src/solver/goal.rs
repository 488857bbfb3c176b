use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::registry::Registry;
use crate::state::WorldState;
use crate::types::{Skill, xp_for_level};

use super::sell::SellPolicyKind;

/// What the solver is driving toward: any number of skill XP targets and
/// optionally a credits target, all of which must hold together.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Goal {
    pub skill_targets: BTreeMap<Skill, f64>,
    pub credits_target: Option<f64>,
}

impl Goal {
    pub fn skill_xp(skill: Skill, target_xp: f64) -> Self {
        let mut goal = Self::default();
        goal.skill_targets.insert(skill, target_xp);
        goal
    }

    pub fn skill_level(skill: Skill, level: u8) -> Self {
        Self::skill_xp(skill, xp_for_level(level))
    }

    pub fn credits(target: f64) -> Self {
        Self {
            skill_targets: BTreeMap::new(),
            credits_target: Some(target),
        }
    }

    pub fn and_skill_xp(mut self, skill: Skill, target_xp: f64) -> Self {
        self.skill_targets.insert(skill, target_xp);
        self
    }

    pub fn and_credits(mut self, target: f64) -> Self {
        self.credits_target = Some(target);
        self
    }

    pub fn is_satisfied(&self, state: &WorldState) -> bool {
        self.skill_targets
            .iter()
            .all(|(skill, target)| state.xp(*skill) >= *target)
            && self
                .credits_target
                .map(|target| state.credits >= target)
                .unwrap_or(true)
    }

    /// Skill subgoals still short of their target, in canonical skill order.
    pub fn unsatisfied_skills(&self, state: &WorldState) -> Vec<(Skill, f64)> {
        self.skill_targets
            .iter()
            .filter(|(skill, target)| state.xp(**skill) < **target)
            .map(|(skill, target)| (*skill, *target))
            .collect()
    }

    pub fn is_relevant_skill(&self, skill: Skill) -> bool {
        self.skill_targets.contains_key(&skill)
    }

    /// Selling only matters when gold itself is part of the goal.
    pub fn is_sell_relevant(&self) -> bool {
        self.credits_target.is_some()
    }

    pub fn involves_consuming_skill(&self, registry: &Registry) -> bool {
        self.skill_targets
            .keys()
            .any(|skill| registry.skill_is_consuming(*skill))
    }

    /// Default liquidation policy under this goal: reserve inputs whenever
    /// a consuming skill is targeted, so recovery sells never eat stock
    /// that other prerequisite macros are still building up.
    pub fn default_sell_policy(&self, registry: &Registry) -> SellPolicyKind {
        if self.involves_consuming_skill(registry) {
            SellPolicyKind::ReserveConsumingInputs
        } else {
            SellPolicyKind::SellAll
        }
    }

    /// Scalar ranking of an activity under this goal. XP counts only while
    /// its skill subgoal is unsatisfied; gold counts only while the credits
    /// subgoal is.
    pub fn activity_rate(
        &self,
        state: &WorldState,
        skill: Skill,
        gold_per_tick: f64,
        xp_per_tick: f64,
    ) -> f64 {
        let mut rate = 0.0;
        if let Some(target) = self.skill_targets.get(&skill) {
            if state.xp(skill) < *target {
                rate += xp_per_tick;
            }
        }
        if let Some(target) = self.credits_target {
            if state.credits < target {
                rate += gold_per_tick;
            }
        }
        rate
    }
}
