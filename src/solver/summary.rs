use std::collections::BTreeMap;

use crate::registry::Registry;
use crate::state::WorldState;
use crate::types::ItemId;

use super::rates::ActionRateSummary;

/// Per-state view of one action: the cached rate summary plus what the
/// current inventory is missing to run it. Never cached; recomputed on
/// every enumeration call.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSummary {
    pub rate: ActionRateSummary,
    pub can_start_now: bool,
    pub missing_inputs: BTreeMap<ItemId, u32>,
}

pub fn compute_action_summaries(
    state: &WorldState,
    registry: &Registry,
    rates: &[ActionRateSummary],
) -> Vec<ActionSummary> {
    rates
        .iter()
        .map(|rate| {
            let mut missing_inputs = BTreeMap::new();
            if let Some(action) = registry.action(&rate.action) {
                for (item, qty) in &action.inputs {
                    let shortfall = qty.saturating_sub(state.inventory.count(item));
                    if shortfall > 0 {
                        missing_inputs.insert(item.clone(), shortfall);
                    }
                }
            }
            ActionSummary {
                rate: rate.clone(),
                can_start_now: missing_inputs.is_empty(),
                missing_inputs,
            }
        })
        .collect()
}
