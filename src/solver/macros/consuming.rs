use std::collections::BTreeMap;

use crate::sim::Interaction;
use crate::types::{ActionId, ItemId, Skill};

use super::super::chain::ChainBuilder;
use super::super::producer::{ProducerPlan, ProducerResolver};
use super::super::sell::SellPolicyKind;
use super::super::stop::StopRule;
use super::super::wait::WaitCondition;
use super::{
    MacroCandidate, MacroKind, MacroPlanContext, MacroPlanOutcome, PlannedMacro, Provenance,
    quantize_stock_target,
};

/// Plan coupled produce/consume training. Prerequisites surface one at a
/// time (producer unlock first, then input buffers); once everything is in
/// place the projection runs at the sustainable rate.
pub(super) fn plan(
    ctx: &MacroPlanContext<'_>,
    skill: Skill,
    primary: &StopRule,
    watched: &[StopRule],
    pinned: Option<&ActionId>,
    pinned_policy: Option<SellPolicyKind>,
    provenance: Provenance,
) -> MacroPlanOutcome {
    let chosen = match pinned {
        Some(action) => Some(action.clone()),
        None => best_consume_action(ctx, skill),
    };
    let Some(consume_id) = chosen else {
        return MacroPlanOutcome::CannotPlan {
            reason: format!("no unlocked consuming action for {skill}"),
        };
    };
    let Some(consume) = ctx.registry.action(&consume_id) else {
        return MacroPlanOutcome::CannotPlan {
            reason: format!("unknown action {consume_id}"),
        };
    };

    // Resolve a producer per input; a missing producer either schedules
    // unlock training or kills the plan.
    let mut resolver = ProducerResolver::new(ctx.registry, ctx.rates, ctx.options);
    let mut producers: Vec<(ItemId, u32, ProducerPlan)> = Vec::new();
    for (input, qty) in &consume.inputs {
        match resolver.resolve(input) {
            Some(plan) => producers.push((input.clone(), *qty, plan)),
            None => {
                if let Some((producer_skill, level)) = lowest_locked_producer(ctx, input) {
                    return MacroPlanOutcome::NeedsPrerequisite {
                        prerequisite: Box::new(MacroCandidate::train_skill(
                            producer_skill,
                            StopRule::AtLevel {
                                skill: producer_skill,
                                level,
                            },
                            vec![],
                            Provenance::SkillPrereq,
                        )),
                    };
                }
                return MacroPlanOutcome::CannotPlan {
                    reason: format!("no producer for input {input}"),
                };
            }
        }
    }

    // Input buffers gate the start. The bound is absolute and never
    // escalates across re-expansions.
    let buffer_target = quantize_stock_target(ctx.options.min_buffer_to_start);
    for (input, _) in &consume.inputs {
        if ctx.state.inventory.count(input) < ctx.options.min_buffer_to_start {
            return MacroPlanOutcome::NeedsPrerequisite {
                prerequisite: Box::new(MacroCandidate::ensure_stock(
                    input.clone(),
                    buffer_target,
                    Provenance::InputPrereq,
                )),
            };
        }
    }

    let Some(consume_rate) = ctx.rates.iter().find(|rate| rate.action == consume_id) else {
        return MacroPlanOutcome::CannotPlan {
            reason: format!("no rate summary for {consume_id}"),
        };
    };
    let consume_ticks = consume_rate.expected_ticks;
    let upstream_ticks: f64 = producers
        .iter()
        .map(|(_, qty, plan)| *qty as f64 * plan.ticks_per_unit)
        .sum();
    let sustainable_xp_per_tick = consume.xp / (consume_ticks + upstream_ticks);
    let consume_xp_per_tick = consume.xp / consume_ticks;
    let slow_down = sustainable_xp_per_tick / consume_xp_per_tick;

    let switched = if ctx.state.active_action.as_ref() == Some(&consume_id) {
        ctx.state.clone()
    } else {
        match ctx
            .sim
            .apply_interaction_deterministic(ctx.state, &Interaction::SwitchActivity(consume_id.clone()))
        {
            Ok(state) => state,
            Err(error) => {
                return MacroPlanOutcome::CannotPlan {
                    reason: error.to_string(),
                };
            }
        }
    };

    let policy = pinned_policy.unwrap_or_else(|| ctx.sell_policy());
    let mut children = vec![primary.to_wait_condition(&switched, ctx.boundaries, policy)];
    children.extend(
        watched
            .iter()
            .map(|stop| stop.to_wait_condition(&switched, ctx.boundaries, policy)),
    );
    let wait = WaitCondition::any_of(children);

    let rates = ctx.sim.estimate_rates_for_action(&switched, &consume_id);
    let raw_estimate = wait.estimate_ticks(&switched, ctx.registry, ctx.sim, &rates);
    if raw_estimate == 0.0 {
        return MacroPlanOutcome::AlreadySatisfied {
            reason: format!("{} already holds", wait.short_description()),
        };
    }
    if !raw_estimate.is_finite() || slow_down <= 0.0 {
        return MacroPlanOutcome::CannotPlan {
            reason: format!(
                "{} cannot make progress toward {}",
                consume_id,
                wait.short_description()
            ),
        };
    }
    let triggering = wait
        .triggering_condition(&switched, ctx.registry, ctx.sim, &rates)
        .map(WaitCondition::short_description);

    // The raw estimate assumes pure consuming; production time stretches it.
    let total_ticks = (raw_estimate / slow_down).ceil() as u64;
    let consuming_time = total_ticks as f64 * slow_down;
    let producing_time = total_ticks as f64 - consuming_time;

    // Project XP across the consuming and producing skills in proportion
    // to the time each runs.
    let mut future = switched.clone();
    future
        .skill_xp
        .add(skill, consuming_time * consume_xp_per_tick);
    if upstream_ticks > 0.0 {
        for (_, qty, plan) in &producers {
            let share = (*qty as f64 * plan.ticks_per_unit) / upstream_ticks;
            future.skill_xp.add(
                plan.producer.skill,
                producing_time * share * plan.producer.xp_per_tick,
            );
        }
    }

    // Enrichment for the executor: pinned producers, buffer, policy and the
    // full per-input chains for multi-tier recipes.
    let producer_by_input: BTreeMap<ItemId, ActionId> = producers
        .iter()
        .map(|(input, _, plan)| (input.clone(), plan.producer.action.clone()))
        .collect();
    let mut input_chains = BTreeMap::new();
    let mut chain_builder = ChainBuilder::new(ctx.registry, ctx.rates, ctx.options);
    for (input, _, _) in &producers {
        if let Ok(chain) = chain_builder.build(input, buffer_target) {
            input_chains.insert(input.clone(), chain);
        }
    }

    log::debug!(
        "planned consuming train {skill} on {consume_id}: sustainable {sustainable_xp_per_tick:.4} xp/tick over {total_ticks} ticks"
    );

    MacroPlanOutcome::Planned(Box::new(PlannedMacro {
        state: future,
        ticks: total_ticks,
        wait_for: wait,
        deaths: 0,
        triggering_condition: triggering,
        committed: MacroCandidate {
            kind: MacroKind::TrainConsumingSkillUntil {
                skill,
                primary: primary.clone(),
                watched: watched.to_vec(),
                consume_action: Some(consume_id),
                producer_by_input,
                buffer_target: Some(buffer_target),
                sell_policy: Some(policy),
                input_chains,
                max_recovery_attempts: ctx.options.max_recovery_attempts,
            },
            provenance,
        },
    }))
}

/// Best unlocked consumer by raw XP rate; producers may still be missing,
/// which the planner surfaces as prerequisites afterwards.
fn best_consume_action(ctx: &MacroPlanContext<'_>, skill: Skill) -> Option<ActionId> {
    let mut best: Option<(&ActionId, f64)> = None;
    for rate in ctx.rates {
        if rate.skill != skill || !rate.unlocked || !rate.consumes_inputs {
            continue;
        }
        let better = match best {
            None => true,
            Some((current_id, current_score)) => {
                rate.xp_per_tick > current_score
                    || (rate.xp_per_tick == current_score && rate.action < *current_id)
            }
        };
        if better {
            best = Some((&rate.action, rate.xp_per_tick));
        }
    }
    best.map(|(action, _)| action.clone())
}

/// Cheapest unlock among the item's still-locked producers.
pub(super) fn lowest_locked_producer(ctx: &MacroPlanContext<'_>, item: &ItemId) -> Option<(Skill, u8)> {
    let mut lowest: Option<(u8, Skill, &ActionId)> = None;
    for action in ctx.registry.producers_of(item) {
        if ctx.state.level(action.skill) >= action.unlock_level {
            continue;
        }
        let better = match lowest {
            None => true,
            Some((level, _, id)) => (action.unlock_level, &action.id) < (level, id),
        };
        if better {
            lowest = Some((action.unlock_level, action.skill, &action.id));
        }
    }
    lowest.map(|(level, skill, _)| (skill, level))
}
