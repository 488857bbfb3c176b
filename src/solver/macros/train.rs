use crate::sim::Interaction;
use crate::types::{ActionId, Skill};

use super::super::stop::StopRule;
use super::super::wait::WaitCondition;
use super::{MacroCandidate, MacroKind, MacroPlanContext, MacroPlanOutcome, PlannedMacro, Provenance};

/// Plan a non-consuming training commitment: pick the best action, switch,
/// estimate the composite stop, then project deterministically.
pub(super) fn plan(
    ctx: &MacroPlanContext<'_>,
    skill: Skill,
    primary: &StopRule,
    watched: &[StopRule],
    pinned: Option<&ActionId>,
    provenance: Provenance,
) -> MacroPlanOutcome {
    let chosen = match pinned {
        Some(action) => Some(action.clone()),
        None => best_action(ctx, skill),
    };
    let Some(action_id) = chosen else {
        return MacroPlanOutcome::CannotPlan {
            reason: format!("no unlocked action for {skill}"),
        };
    };

    let switched = if ctx.state.active_action.as_ref() == Some(&action_id) {
        ctx.state.clone()
    } else {
        match ctx
            .sim
            .apply_interaction_deterministic(ctx.state, &Interaction::SwitchActivity(action_id.clone()))
        {
            Ok(state) => state,
            Err(error) => {
                return MacroPlanOutcome::CannotPlan {
                    reason: error.to_string(),
                };
            }
        }
    };

    let policy = ctx.sell_policy();
    let mut children = vec![primary.to_wait_condition(&switched, ctx.boundaries, policy)];
    children.extend(
        watched
            .iter()
            .map(|stop| stop.to_wait_condition(&switched, ctx.boundaries, policy)),
    );
    let wait = WaitCondition::any_of(children);

    let rates = ctx.sim.estimate_rates_for_action(&switched, &action_id);
    let estimate = wait.estimate_ticks(&switched, ctx.registry, ctx.sim, &rates);
    if estimate == 0.0 {
        return MacroPlanOutcome::AlreadySatisfied {
            reason: format!("{} already holds", wait.short_description()),
        };
    }
    if !estimate.is_finite() {
        return MacroPlanOutcome::CannotPlan {
            reason: format!(
                "{} cannot make progress toward {}",
                action_id,
                wait.short_description()
            ),
        };
    }

    let triggering = wait
        .triggering_condition(&switched, ctx.registry, ctx.sim, &rates)
        .map(WaitCondition::short_description);
    let ticks = estimate.ceil() as u64;
    let advanced = ctx.sim.advance_deterministic(&switched, ticks);
    log::debug!("planned train {skill} on {action_id} for {ticks} ticks");

    MacroPlanOutcome::Planned(Box::new(PlannedMacro {
        state: advanced.state,
        ticks,
        wait_for: wait,
        deaths: advanced.deaths,
        triggering_condition: triggering,
        committed: MacroCandidate {
            kind: MacroKind::TrainSkillUntil {
                skill,
                primary: primary.clone(),
                watched: watched.to_vec(),
                action: Some(action_id),
            },
            provenance,
        },
    }))
}

/// Best unlocked action of the skill: goal ranking for goal-relevant
/// skills, raw XP rate for prerequisite training. Ties go to the smaller id.
fn best_action(ctx: &MacroPlanContext<'_>, skill: Skill) -> Option<ActionId> {
    let goal_ranked = ctx.goal.is_relevant_skill(skill);
    let mut best: Option<(&ActionId, f64)> = None;
    for rate in ctx.rates {
        if rate.skill != skill || !rate.unlocked {
            continue;
        }
        let score = if goal_ranked {
            ctx.goal
                .activity_rate(ctx.state, skill, rate.gold_per_tick, rate.xp_per_tick)
        } else {
            rate.xp_per_tick
        };
        let better = match best {
            None => true,
            Some((current_id, current_score)) => {
                score > current_score || (score == current_score && rate.action < *current_id)
            }
        };
        if better {
            best = Some((&rate.action, score));
        }
    }
    best.map(|(action, _)| action.clone())
}

#[cfg(test)]
mod tests {
    use super::super::super::goal::Goal;
    use super::super::super::options::SolverOptions;
    use super::super::super::rates::compute_rate_summaries;
    use super::*;
    use crate::registry::Registry;
    use crate::sim::StandardSim;
    use crate::state::WorldState;
    use crate::types::xp_for_level;

    fn plan_with(state: &WorldState, goal: &Goal, candidate: &MacroCandidate) -> MacroPlanOutcome {
        let registry = Registry::standard();
        let boundaries = registry.boundaries();
        let rates = compute_rate_summaries(state, &registry);
        let sim = StandardSim::new(&registry);
        let options = SolverOptions::default();
        let ctx = MacroPlanContext {
            state,
            goal,
            registry: &registry,
            boundaries: &boundaries,
            rates: &rates,
            sim: &sim,
            options: &options,
        };
        candidate.plan(&ctx)
    }

    #[test]
    fn test_plan_pins_best_action_and_projects() {
        let state = WorldState::new();
        let goal = Goal::skill_xp(Skill::Woodcutting, 1_000.0);
        let candidate = MacroCandidate::train_skill(
            Skill::Woodcutting,
            StopRule::AtNextBoundary {
                skill: Skill::Woodcutting,
            },
            vec![StopRule::AtGoal {
                skill: Skill::Woodcutting,
                target_xp: 1_000.0,
            }],
            Provenance::TopLevel,
        );
        let MacroPlanOutcome::Planned(planned) = plan_with(&state, &goal, &candidate) else {
            panic!("expected planned outcome");
        };
        // Goal (1000 xp) lies below the L15 boundary, so it triggers first.
        assert_eq!(planned.ticks, 3_000);
        assert_eq!(planned.deaths, 0);
        assert!(planned.state.xp(Skill::Woodcutting) >= 1_000.0);
        assert!(
            planned
                .triggering_condition
                .as_deref()
                .unwrap()
                .contains("1000")
        );
        match &planned.committed.kind {
            MacroKind::TrainSkillUntil { action, .. } => {
                assert_eq!(action.as_ref().unwrap(), &ActionId::new("idle:cut_normal_logs"));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_plan_already_satisfied() {
        let mut state = WorldState::new();
        state.skill_xp.set(Skill::Woodcutting, xp_for_level(60));
        let goal = Goal::skill_xp(Skill::Woodcutting, 10.0);
        let candidate = MacroCandidate::train_skill(
            Skill::Woodcutting,
            StopRule::AtGoal {
                skill: Skill::Woodcutting,
                target_xp: 10.0,
            },
            vec![],
            Provenance::TopLevel,
        );
        assert!(matches!(
            plan_with(&state, &goal, &candidate),
            MacroPlanOutcome::AlreadySatisfied { .. }
        ));
    }

    #[test]
    fn test_plan_cannot_plan_without_progress() {
        let state = WorldState::new();
        let goal = Goal::skill_xp(Skill::Woodcutting, 1_000.0);
        // Woodcutting actions give no mining xp, so this stop is unreachable.
        let candidate = MacroCandidate::train_skill(
            Skill::Woodcutting,
            StopRule::AtGoal {
                skill: Skill::Mining,
                target_xp: 1_000.0,
            },
            vec![],
            Provenance::TopLevel,
        );
        assert!(matches!(
            plan_with(&state, &goal, &candidate),
            MacroPlanOutcome::CannotPlan { .. }
        ));
    }

    #[test]
    fn test_prereq_training_ranks_by_raw_xp() {
        // Mining is not part of the goal; the planner should still find its
        // best xp action for prerequisite training.
        let state = WorldState::new();
        let goal = Goal::skill_xp(Skill::Smithing, 1_000.0);
        let candidate = MacroCandidate::train_skill(
            Skill::Mining,
            StopRule::AtLevel {
                skill: Skill::Mining,
                level: 15,
            },
            vec![],
            Provenance::SkillPrereq,
        );
        let MacroPlanOutcome::Planned(planned) = plan_with(&state, &goal, &candidate) else {
            panic!("expected planned outcome");
        };
        match &planned.committed.kind {
            MacroKind::TrainSkillUntil { action, .. } => {
                // Both rocks tie on xp/tick; the smaller id wins.
                assert_eq!(action.as_ref().unwrap(), &ActionId::new("idle:mine_copper"));
            }
            other => panic!("unexpected kind {other:?}"),
        }
    }
}
