use std::collections::BTreeMap;

use smallvec::SmallVec;

use crate::sim::{ExecBoundary, Interaction};
use crate::state::WorldState;
use crate::types::{ActionId, ItemId, Skill};

use super::macros::{MacroCandidate, MacroExecuteContext, MacroExecuteResult, MacroKind};
use super::sell::SellPolicyKind;
use super::stop::StopRule;
use super::wait::WaitCondition;

/// Bound on produce/consume phase alternations; beyond it the macro has
/// stopped making progress.
const MAX_PHASES: u32 = 10_000;

pub(crate) fn execute(
    candidate: &MacroCandidate,
    ctx: &mut MacroExecuteContext<'_>,
) -> MacroExecuteResult {
    match &candidate.kind {
        MacroKind::TrainSkillUntil {
            skill,
            primary,
            watched,
            action,
        } => execute_train(ctx, *skill, primary, watched, action.as_ref()),
        MacroKind::TrainConsumingSkillUntil {
            primary,
            watched,
            consume_action,
            producer_by_input,
            buffer_target,
            sell_policy,
            max_recovery_attempts,
            ..
        } => execute_consuming(
            ctx,
            primary,
            watched,
            consume_action.as_ref(),
            producer_by_input,
            *buffer_target,
            *sell_policy,
            *max_recovery_attempts,
        ),
        MacroKind::AcquireItem { item, quantity } => execute_acquire(ctx, item, *quantity),
        MacroKind::EnsureStock { item, min_total } => execute_stock(ctx, item, *min_total),
        MacroKind::ProduceItem {
            item,
            min_total,
            action,
            ..
        } => execute_produce(ctx, item, *min_total, action),
    }
}

struct Drive {
    state: WorldState,
    ticks: u64,
    deaths: u32,
}

impl Drive {
    fn new(state: WorldState) -> Self {
        Self {
            state,
            ticks: 0,
            deaths: 0,
        }
    }

    fn finish(self, boundary: Option<ExecBoundary>) -> MacroExecuteResult {
        MacroExecuteResult {
            state: self.state,
            ticks_elapsed: self.ticks,
            deaths: self.deaths,
            boundary,
        }
    }
}

fn switch_to(
    ctx: &mut MacroExecuteContext<'_>,
    drive: &mut Drive,
    action: &ActionId,
) -> Result<(), ExecBoundary> {
    if drive.state.active_action.as_ref() == Some(action) {
        return Ok(());
    }
    match ctx.sim.apply_interaction(
        &drive.state,
        &Interaction::SwitchActivity(action.clone()),
        ctx.rng,
    ) {
        Ok(next) => {
            drive.state = next;
            Ok(())
        }
        Err(error) => {
            log::debug!("executor cannot switch to {action}: {error}");
            Err(ExecBoundary::NoProgressPossible)
        }
    }
}

/// Drive one action toward a wait condition, selling per policy when the
/// inventory fills. Recovery is bounded; protected items are never sold.
/// Returns `None` on satisfaction, otherwise the surfaced boundary —
/// `InventoryPressure` once the recovery allowance is spent, so the outer
/// loop can tell "replan" apart from an ordinary recoverable full event.
fn run_with_recovery(
    ctx: &mut MacroExecuteContext<'_>,
    drive: &mut Drive,
    action: &ActionId,
    wait: &WaitCondition,
    policy: SellPolicyKind,
    protect: &[ItemId],
    max_recovery: u32,
) -> Option<ExecBoundary> {
    let mut recovery = 0u32;
    loop {
        if let Err(boundary) = switch_to(ctx, drive, action) {
            return Some(boundary);
        }
        let outcome = ctx.sim.consume_until(&drive.state, wait, ctx.rng);
        drive.state = outcome.state;
        drive.ticks += outcome.ticks_elapsed;
        drive.deaths += outcome.deaths;
        match outcome.boundary {
            ExecBoundary::WaitConditionSatisfied => return None,
            ExecBoundary::InventoryFull => {
                let mut sellable = policy.liquidatable(&drive.state, ctx.registry);
                sellable.retain(|item| !protect.contains(item));
                if sellable.is_empty() {
                    return Some(ExecBoundary::NoProgressPossible);
                }
                recovery += 1;
                if recovery > max_recovery {
                    return Some(ExecBoundary::InventoryPressure);
                }
                match ctx
                    .sim
                    .apply_interaction(&drive.state, &Interaction::SellItems(sellable), ctx.rng)
                {
                    Ok(next) => drive.state = next,
                    Err(_) => return Some(ExecBoundary::NoProgressPossible),
                }
            }
            other => return Some(other),
        }
    }
}

fn composite_wait(
    ctx: &MacroExecuteContext<'_>,
    state: &WorldState,
    primary: &StopRule,
    watched: &[StopRule],
    policy: SellPolicyKind,
) -> WaitCondition {
    let mut children = vec![primary.to_wait_condition(state, ctx.boundaries, policy)];
    children.extend(
        watched
            .iter()
            .map(|stop| stop.to_wait_condition(state, ctx.boundaries, policy)),
    );
    WaitCondition::any_of(children)
}

fn execute_train(
    ctx: &mut MacroExecuteContext<'_>,
    skill: Skill,
    primary: &StopRule,
    watched: &[StopRule],
    pinned: Option<&ActionId>,
) -> MacroExecuteResult {
    let mut drive = Drive::new(ctx.state.clone());
    let action = match pinned {
        Some(action) => Some(action.clone()),
        None => best_xp_action(ctx, &drive.state, skill),
    };
    let Some(action) = action else {
        return drive.finish(Some(ExecBoundary::NoProgressPossible));
    };
    if let Err(boundary) = switch_to(ctx, &mut drive, &action) {
        return drive.finish(Some(boundary));
    }

    // The wait condition is rebuilt from the live state so that boundary
    // targets reflect any level-ups since planning.
    let policy = ctx.sell_policy;
    let mut children = vec![primary.to_wait_condition(&drive.state, ctx.boundaries, policy)];
    children.extend(
        watched
            .iter()
            .map(|stop| stop.to_wait_condition(&drive.state, ctx.boundaries, policy)),
    );
    if ctx.watch.is_some() {
        // Yield at intermediate unlock boundaries so the outer loop can
        // re-plan against the new action set.
        children.push(
            StopRule::AtNextBoundary { skill }.to_wait_condition(
                &drive.state,
                ctx.boundaries,
                policy,
            ),
        );
    }
    let wait = WaitCondition::any_of(children);

    // Inventory pressure surrenders to a replan rather than selling:
    // training macros hold no sell authority.
    let boundary = run_with_recovery(ctx, &mut drive, &action, &wait, policy, &[], 0);
    drive.finish(boundary)
}

#[allow(clippy::too_many_arguments)]
fn execute_consuming(
    ctx: &mut MacroExecuteContext<'_>,
    primary: &StopRule,
    watched: &[StopRule],
    consume_action: Option<&ActionId>,
    producer_by_input: &BTreeMap<ItemId, ActionId>,
    buffer_target: Option<u32>,
    sell_policy: Option<SellPolicyKind>,
    max_recovery: u32,
) -> MacroExecuteResult {
    let mut drive = Drive::new(ctx.state.clone());
    // Planner enrichment is mandatory here; the consume action stays pinned
    // even across mid-macro level-ups.
    let Some(consume_id) = consume_action.cloned() else {
        return drive.finish(Some(ExecBoundary::NoProgressPossible));
    };
    let Some(consume) = ctx.registry.action(&consume_id).cloned() else {
        return drive.finish(Some(ExecBoundary::NoProgressPossible));
    };
    let policy = sell_policy.unwrap_or(ctx.sell_policy);
    let buffer = buffer_target.unwrap_or(ctx.options.min_buffer_to_start);
    let protect: SmallVec<[ItemId; 2]> =
        consume.inputs.iter().map(|(item, _)| item.clone()).collect();

    let mut recovery = 0u32;
    let mut phases = 0u32;
    let boundary = loop {
        phases += 1;
        if phases > MAX_PHASES {
            break Some(ExecBoundary::NoProgressPossible);
        }
        let wait = composite_wait(ctx, &drive.state, primary, watched, policy);
        if wait.is_satisfied(&drive.state, ctx.registry, ctx.sim) {
            break None;
        }

        // Below one action's worth of any input: top the buffer back up.
        let needy = consume
            .inputs
            .iter()
            .find(|(item, qty)| drive.state.inventory.count(item) < *qty);
        let (phase_action, phase_wait) = match needy {
            Some((input, _)) => {
                let Some(producer) = producer_by_input.get(input) else {
                    break Some(ExecBoundary::NoProgressPossible);
                };
                (
                    producer.clone(),
                    WaitCondition::any_of(vec![
                        wait.clone(),
                        WaitCondition::InventoryAtLeast {
                            item: input.clone(),
                            min_total: buffer,
                        },
                    ]),
                )
            }
            None => (
                consume_id.clone(),
                WaitCondition::any_of(vec![
                    wait.clone(),
                    WaitCondition::InputsDepleted {
                        action: Some(consume_id.clone()),
                    },
                ]),
            ),
        };

        if let Err(boundary) = switch_to(ctx, &mut drive, &phase_action) {
            break Some(boundary);
        }
        let outcome = ctx.sim.consume_until(&drive.state, &phase_wait, ctx.rng);
        drive.state = outcome.state;
        drive.ticks += outcome.ticks_elapsed;
        drive.deaths += outcome.deaths;
        match outcome.boundary {
            ExecBoundary::WaitConditionSatisfied => {}
            ExecBoundary::InventoryFull => {
                let mut sellable = policy.liquidatable(&drive.state, ctx.registry);
                sellable.retain(|item| !protect.contains(item));
                if sellable.is_empty() {
                    break Some(ExecBoundary::NoProgressPossible);
                }
                recovery += 1;
                if recovery > max_recovery {
                    break Some(ExecBoundary::InventoryPressure);
                }
                match ctx.sim.apply_interaction(
                    &drive.state,
                    &Interaction::SellItems(sellable),
                    ctx.rng,
                ) {
                    Ok(next) => drive.state = next,
                    Err(_) => break Some(ExecBoundary::NoProgressPossible),
                }
            }
            other => break Some(other),
        }
    };
    drive.finish(boundary)
}

fn execute_acquire(
    ctx: &mut MacroExecuteContext<'_>,
    item: &ItemId,
    quantity: u32,
) -> MacroExecuteResult {
    let mut drive = Drive::new(ctx.state.clone());
    let wait = WaitCondition::InventoryDelta {
        item: item.clone(),
        delta: quantity,
        start_count: drive.state.inventory.count(item),
    };
    let Some(action) = best_producer_action(ctx, &drive.state, item) else {
        return drive.finish(Some(ExecBoundary::NoProgressPossible));
    };
    let policy = ctx.sell_policy;
    let protect = [item.clone()];
    let max_recovery = ctx.options.max_recovery_attempts;
    let boundary = run_with_recovery(ctx, &mut drive, &action, &wait, policy, &protect, max_recovery);
    drive.finish(boundary)
}

fn execute_produce(
    ctx: &mut MacroExecuteContext<'_>,
    item: &ItemId,
    min_total: u32,
    action: &ActionId,
) -> MacroExecuteResult {
    let mut drive = Drive::new(ctx.state.clone());
    let wait = WaitCondition::InventoryAtLeast {
        item: item.clone(),
        min_total,
    };
    let policy = ctx.sell_policy;
    let protect = [item.clone()];
    let max_recovery = ctx.options.max_recovery_attempts;
    let action = action.clone();
    let boundary = run_with_recovery(ctx, &mut drive, &action, &wait, policy, &protect, max_recovery);
    drive.finish(boundary)
}

fn execute_stock(
    ctx: &mut MacroExecuteContext<'_>,
    item: &ItemId,
    min_total: u32,
) -> MacroExecuteResult {
    let mut drive = Drive::new(ctx.state.clone());
    let wait = WaitCondition::InventoryAtLeast {
        item: item.clone(),
        min_total,
    };
    let Some(action) = best_producer_action(ctx, &drive.state, item) else {
        return drive.finish(Some(ExecBoundary::NoProgressPossible));
    };
    let policy = ctx.sell_policy;
    let protect = [item.clone()];
    let max_recovery = ctx.options.max_recovery_attempts;
    let boundary = run_with_recovery(ctx, &mut drive, &action, &wait, policy, &protect, max_recovery);
    drive.finish(boundary)
}

/// Best unlocked action of the skill by live XP rate.
fn best_xp_action(
    ctx: &MacroExecuteContext<'_>,
    state: &WorldState,
    skill: Skill,
) -> Option<ActionId> {
    let mut best: Option<(ActionId, f64)> = None;
    for action_id in ctx.registry.actions_for_skill(skill) {
        let rate = ctx
            .sim
            .estimate_rates_for_action(state, action_id)
            .xp_rate(skill);
        if rate <= 0.0 {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_rate)) => {
                rate > *current_rate || (rate == *current_rate && action_id < current)
            }
        };
        if better {
            best = Some((action_id.clone(), rate));
        }
    }
    best.map(|(action, _)| action)
}

/// Best unlocked producer of the item by live output rate.
fn best_producer_action(
    ctx: &MacroExecuteContext<'_>,
    state: &WorldState,
    item: &ItemId,
) -> Option<ActionId> {
    let mut best: Option<(ActionId, f64)> = None;
    for action in ctx.registry.producers_of(item) {
        if state.level(action.skill) < action.unlock_level {
            continue;
        }
        let rate = ctx
            .sim
            .estimate_rates_for_action(state, &action.id)
            .item_rate(item);
        if rate <= 0.0 {
            continue;
        }
        let better = match &best {
            None => true,
            Some((current, current_rate)) => {
                rate > *current_rate || (rate == *current_rate && action.id < *current)
            }
        };
        if better {
            best = Some((action.id.clone(), rate));
        }
    }
    best.map(|(action, _)| action)
}
