use crate::sim::Interaction;
use crate::types::{ActionId, ItemId};

use super::super::wait::WaitCondition;
use super::{MacroCandidate, MacroKind, MacroPlanContext, MacroPlanOutcome, PlannedMacro, Provenance};

/// The declarative chain leaf: switch to the named action and advance the
/// recorded ticks. This is the sole macro whose planning moves simulated
/// time forward.
pub(super) fn plan(
    ctx: &MacroPlanContext<'_>,
    item: &ItemId,
    min_total: u32,
    action_id: &ActionId,
    estimated_ticks: u64,
    provenance: Provenance,
) -> MacroPlanOutcome {
    let current = ctx.state.inventory.count(item);
    if current >= min_total {
        return MacroPlanOutcome::AlreadySatisfied {
            reason: format!("{item} already at {current} of {min_total}"),
        };
    }

    let switched = if ctx.state.active_action.as_ref() == Some(action_id) {
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

    let wait = WaitCondition::InventoryAtLeast {
        item: item.clone(),
        min_total,
    };
    let advanced = ctx.sim.advance_deterministic(&switched, estimated_ticks);

    MacroPlanOutcome::Planned(Box::new(PlannedMacro {
        state: advanced.state,
        ticks: estimated_ticks,
        wait_for: wait.clone(),
        deaths: advanced.deaths,
        triggering_condition: Some(wait.short_description()),
        committed: MacroCandidate {
            kind: MacroKind::ProduceItem {
                item: item.clone(),
                min_total,
                action: action_id.clone(),
                estimated_ticks,
            },
            provenance,
        },
    }))
}
