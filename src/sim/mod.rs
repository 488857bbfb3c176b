use std::collections::BTreeMap;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::solver::sell::SellPolicyKind;
use crate::solver::wait::WaitCondition;
use crate::state::{InventoryError, WorldState};
use crate::types::{ActionId, ItemId, PurchaseId, Skill};

mod standard;

pub use standard::StandardSim;

/// Player-visible world mutations. Everything else happens through time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Interaction {
    SwitchActivity(ActionId),
    BuyShopItem(PurchaseId),
    SellItems(Vec<ItemId>),
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("unknown action {0}")]
    UnknownAction(ActionId),
    #[error("unknown purchase {0}")]
    UnknownPurchase(PurchaseId),
    #[error("action {action} locked: {skill} level {required} required")]
    ActionLocked {
        action: ActionId,
        skill: Skill,
        required: u8,
    },
    #[error("requirements not met for purchase {0}")]
    RequirementsNotMet(PurchaseId),
    #[error("cannot afford {purchase}: costs {cost}, have {credits}")]
    InsufficientCredits {
        purchase: PurchaseId,
        cost: f64,
        credits: f64,
    },
    #[error(transparent)]
    Inventory(#[from] InventoryError),
}

#[derive(Debug, Clone)]
pub struct AdvanceOutcome {
    pub state: WorldState,
    pub deaths: u32,
}

/// Why a bounded simulation run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecBoundary {
    WaitConditionSatisfied,
    InventoryFull,
    InventoryPressure,
    NoProgressPossible,
}

#[derive(Debug, Clone)]
pub struct ConsumeOutcome {
    pub state: WorldState,
    pub ticks_elapsed: u64,
    pub deaths: u32,
    pub boundary: ExecBoundary,
}

/// Expected per-tick yield of an action, used by wait-condition estimation.
/// Input consumption shows up as a negative item rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateEstimate {
    pub xp_per_tick: BTreeMap<Skill, f64>,
    pub gold_per_tick: f64,
    pub items_per_tick: BTreeMap<ItemId, f64>,
}

impl RateEstimate {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn xp_rate(&self, skill: Skill) -> f64 {
        self.xp_per_tick.get(&skill).copied().unwrap_or(0.0)
    }

    pub fn item_rate(&self, item: &ItemId) -> f64 {
        self.items_per_tick.get(item).copied().unwrap_or(0.0)
    }
}

/// The game-rule simulator the solver plans over and executes against.
///
/// The deterministic methods back the planning phase and must never roll
/// randomness; the rng-taking methods back execution. Both operate on
/// snapshots and return new states.
pub trait Simulator {
    fn apply_interaction_deterministic(
        &self,
        state: &WorldState,
        interaction: &Interaction,
    ) -> Result<WorldState, SimError>;

    fn apply_interaction(
        &self,
        state: &WorldState,
        interaction: &Interaction,
        rng: &mut StdRng,
    ) -> Result<WorldState, SimError>;

    fn advance_deterministic(&self, state: &WorldState, ticks: u64) -> AdvanceOutcome;

    fn consume_until(
        &self,
        state: &WorldState,
        wait_for: &WaitCondition,
        rng: &mut StdRng,
    ) -> ConsumeOutcome;

    /// Upper bound on spendable credits after liquidating per the policy.
    fn effective_credits(&self, state: &WorldState, policy: SellPolicyKind) -> i64;

    fn estimate_rates(&self, state: &WorldState) -> RateEstimate;

    fn estimate_rates_for_action(&self, state: &WorldState, action: &ActionId) -> RateEstimate;
}
