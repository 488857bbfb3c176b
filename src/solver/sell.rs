use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::registry::Registry;
use crate::state::WorldState;
use crate::types::ItemId;

/// Which inventory stacks a liquidation pass may sell.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SellPolicyKind {
    SellAll,
    ReserveConsumingInputs,
}

impl SellPolicyKind {
    /// Items the policy allows selling right now, in inventory order.
    /// Worthless stacks are never offered.
    pub fn liquidatable(&self, state: &WorldState, registry: &Registry) -> Vec<ItemId> {
        state
            .inventory
            .iter()
            .filter(|(item, _)| registry.sells_for(item) > 0.0)
            .filter(|(item, _)| match self {
                SellPolicyKind::SellAll => true,
                SellPolicyKind::ReserveConsumingInputs => !is_consuming_input(item, registry),
            })
            .map(|(item, _)| item.clone())
            .collect()
    }
}

/// Whether any unlockable consuming action feeds on this item.
fn is_consuming_input(item: &ItemId, registry: &Registry) -> bool {
    registry
        .all_actions()
        .any(|action| action.inputs.iter().any(|(input, _)| input == item))
}
