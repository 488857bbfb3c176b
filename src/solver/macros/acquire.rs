use crate::sim::Interaction;
use crate::types::ItemId;

use super::super::producer::ProducerResolver;
use super::super::stop::StopRule;
use super::super::wait::WaitCondition;
use super::{MacroCandidate, MacroKind, MacroPlanContext, MacroPlanOutcome, PlannedMacro, Provenance};

/// Plan gaining `quantity` more of an item (delta semantics). Consuming
/// producers surface their own inputs as acquire prerequisites, one at a
/// time in recipe order.
pub(super) fn plan(
    ctx: &MacroPlanContext<'_>,
    item: &ItemId,
    quantity: u32,
    provenance: Provenance,
) -> MacroPlanOutcome {
    if quantity == 0 {
        return MacroPlanOutcome::AlreadySatisfied {
            reason: format!("nothing to acquire for {item}"),
        };
    }

    let mut resolver = ProducerResolver::new(ctx.registry, ctx.rates, ctx.options);
    let Some(plan) = resolver.resolve(item) else {
        if let Some((skill, level)) = super::consuming::lowest_locked_producer(ctx, item) {
            return MacroPlanOutcome::NeedsPrerequisite {
                prerequisite: Box::new(MacroCandidate::train_skill(
                    skill,
                    StopRule::AtLevel { skill, level },
                    vec![],
                    Provenance::SkillPrereq,
                )),
            };
        }
        return MacroPlanOutcome::CannotPlan {
            reason: format!("no producer for {item}"),
        };
    };
    let Some(action) = ctx.registry.action(&plan.producer.action) else {
        return MacroPlanOutcome::CannotPlan {
            reason: format!("unknown action {}", plan.producer.action),
        };
    };

    let outputs_per_action = action.output_count(item);
    let actions_needed = quantity.div_ceil(outputs_per_action);
    for (input, qty_per_action) in &action.inputs {
        let needed = actions_needed.saturating_mul(*qty_per_action);
        if ctx.state.inventory.count(input) < needed {
            return MacroPlanOutcome::NeedsPrerequisite {
                prerequisite: Box::new(MacroCandidate::acquire_item(
                    input.clone(),
                    needed,
                    Provenance::InputPrereq,
                )),
            };
        }
    }

    let switched = if ctx.state.active_action.as_ref() == Some(&action.id) {
        ctx.state.clone()
    } else {
        match ctx
            .sim
            .apply_interaction_deterministic(ctx.state, &Interaction::SwitchActivity(action.id.clone()))
        {
            Ok(state) => state,
            Err(error) => {
                return MacroPlanOutcome::CannotPlan {
                    reason: error.to_string(),
                };
            }
        }
    };

    let start_count = ctx.state.inventory.count(item);
    let wait = WaitCondition::InventoryDelta {
        item: item.clone(),
        delta: quantity,
        start_count,
    };
    let ticks = (actions_needed as f64 * plan.producer.expected_ticks).ceil() as u64;
    let advanced = ctx.sim.advance_deterministic(&switched, ticks);

    MacroPlanOutcome::Planned(Box::new(PlannedMacro {
        state: advanced.state,
        ticks,
        wait_for: wait.clone(),
        deaths: advanced.deaths,
        triggering_condition: Some(wait.short_description()),
        committed: MacroCandidate {
            kind: MacroKind::AcquireItem {
                item: item.clone(),
                quantity,
            },
            provenance,
        },
    }))
}
