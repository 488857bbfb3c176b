use std::collections::BTreeMap;

use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::registry::{Boundaries, Registry};
use crate::sim::{ExecBoundary, Simulator};
use crate::state::WorldState;
use crate::types::{ActionId, ItemId, Skill};

use super::chain::PlannedChain;
use super::codec::{CodecError, from_tagged_value};
use super::enumerate::WatchSet;
use super::goal::Goal;
use super::options::SolverOptions;
use super::rates::ActionRateSummary;
use super::sell::SellPolicyKind;
use super::stop::StopRule;
use super::wait::WaitCondition;

mod acquire;
mod consuming;
mod produce;
mod stock;
mod train;

/// Why a macro was created. Diagnostics only; never affects planning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumString, Display,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    TopLevel,
    SkillPrereq,
    InputPrereq,
    BatchInput,
    Chain,
}

fn default_max_recovery_attempts() -> u32 {
    3
}

/// The closed set of macro shapes. Enrichment fields are filled in by the
/// planner and are semantically immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MacroKind {
    /// Commit to a non-consuming skill until the primary stop (or any
    /// watched stop) would trigger.
    #[serde(rename = "train_skill_until")]
    TrainSkillUntil {
        skill: Skill,
        primary: StopRule,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        watched: Vec<StopRule>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        action: Option<ActionId>,
    },
    /// Coupled produce/consume training of a consuming skill.
    #[serde(rename = "train_consuming_skill_until")]
    TrainConsumingSkillUntil {
        skill: Skill,
        primary: StopRule,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        watched: Vec<StopRule>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        consume_action: Option<ActionId>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        producer_by_input: BTreeMap<ItemId, ActionId>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        buffer_target: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sell_policy: Option<SellPolicyKind>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        input_chains: BTreeMap<ItemId, PlannedChain>,
        #[serde(default = "default_max_recovery_attempts")]
        max_recovery_attempts: u32,
    },
    /// Gain `quantity` more of the item on top of the current count.
    #[serde(rename = "acquire_item")]
    AcquireItem { item: ItemId, quantity: u32 },
    /// Reach an absolute stock level; idempotent when already there.
    #[serde(rename = "ensure_stock")]
    EnsureStock { item: ItemId, min_total: u32 },
    /// Declarative chain leaf: the only macro whose planning advances
    /// simulated time.
    #[serde(rename = "produce_item")]
    ProduceItem {
        item: ItemId,
        min_total: u32,
        action: ActionId,
        estimated_ticks: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroCandidate {
    #[serde(flatten)]
    pub kind: MacroKind,
    pub provenance: Provenance,
}

impl MacroCandidate {
    pub const KNOWN_TYPES: [&'static str; 5] = [
        "train_skill_until",
        "train_consuming_skill_until",
        "acquire_item",
        "ensure_stock",
        "produce_item",
    ];

    pub fn train_skill(
        skill: Skill,
        primary: StopRule,
        watched: Vec<StopRule>,
        provenance: Provenance,
    ) -> Self {
        Self {
            kind: MacroKind::TrainSkillUntil {
                skill,
                primary,
                watched,
                action: None,
            },
            provenance,
        }
    }

    pub fn train_consuming_skill(
        skill: Skill,
        primary: StopRule,
        watched: Vec<StopRule>,
        provenance: Provenance,
    ) -> Self {
        Self {
            kind: MacroKind::TrainConsumingSkillUntil {
                skill,
                primary,
                watched,
                consume_action: None,
                producer_by_input: BTreeMap::new(),
                buffer_target: None,
                sell_policy: None,
                input_chains: BTreeMap::new(),
                max_recovery_attempts: default_max_recovery_attempts(),
            },
            provenance,
        }
    }

    pub fn acquire_item(item: ItemId, quantity: u32, provenance: Provenance) -> Self {
        Self {
            kind: MacroKind::AcquireItem { item, quantity },
            provenance,
        }
    }

    pub fn ensure_stock(item: ItemId, min_total: u32, provenance: Provenance) -> Self {
        Self {
            kind: MacroKind::EnsureStock { item, min_total },
            provenance,
        }
    }

    pub fn produce_item(
        item: ItemId,
        min_total: u32,
        action: ActionId,
        estimated_ticks: u64,
        provenance: Provenance,
    ) -> Self {
        Self {
            kind: MacroKind::ProduceItem {
                item,
                min_total,
                action,
                estimated_ticks,
            },
            provenance,
        }
    }

    /// Canonical string of the macro's discriminants; two macros with equal
    /// keys are planning-equivalent.
    pub fn dedupe_key(&self) -> String {
        match &self.kind {
            MacroKind::TrainSkillUntil { skill, primary, .. } => {
                format!("train:{skill}:{}", primary.key())
            }
            MacroKind::TrainConsumingSkillUntil { skill, primary, .. } => {
                format!("train_consuming:{skill}:{}", primary.key())
            }
            MacroKind::AcquireItem { item, quantity } => format!("acquire:{item}:{quantity}"),
            MacroKind::EnsureStock { item, min_total } => format!("ensure:{item}:{min_total}"),
            MacroKind::ProduceItem {
                item,
                min_total,
                action,
                ..
            } => format!("produce:{item}:{min_total}:{action}"),
        }
    }

    /// The skill this macro trains, when it trains one.
    pub fn target_skill(&self) -> Option<Skill> {
        match &self.kind {
            MacroKind::TrainSkillUntil { skill, .. }
            | MacroKind::TrainConsumingSkillUntil { skill, .. } => Some(*skill),
            _ => None,
        }
    }

    /// Append extra watched stops (composite-stop augmentation).
    pub fn push_watched_stops(&mut self, stops: impl IntoIterator<Item = StopRule>) {
        match &mut self.kind {
            MacroKind::TrainSkillUntil { watched, .. }
            | MacroKind::TrainConsumingSkillUntil { watched, .. } => watched.extend(stops),
            _ => {}
        }
    }

    pub fn to_json(&self) -> Result<Value, CodecError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        from_tagged_value(value, &Self::KNOWN_TYPES)
    }

    pub fn plan(&self, ctx: &MacroPlanContext<'_>) -> MacroPlanOutcome {
        match &self.kind {
            MacroKind::TrainSkillUntil {
                skill,
                primary,
                watched,
                action,
            } => train::plan(
                ctx,
                *skill,
                primary,
                watched,
                action.as_ref(),
                self.provenance,
            ),
            MacroKind::TrainConsumingSkillUntil {
                skill,
                primary,
                watched,
                consume_action,
                sell_policy,
                ..
            } => consuming::plan(
                ctx,
                *skill,
                primary,
                watched,
                consume_action.as_ref(),
                *sell_policy,
                self.provenance,
            ),
            MacroKind::AcquireItem { item, quantity } => {
                acquire::plan(ctx, item, *quantity, self.provenance)
            }
            MacroKind::EnsureStock { item, min_total } => {
                stock::plan(ctx, item, *min_total, self.provenance)
            }
            MacroKind::ProduceItem {
                item,
                min_total,
                action,
                estimated_ticks,
            } => produce::plan(ctx, item, *min_total, action, *estimated_ticks, self.provenance),
        }
    }

    pub fn execute(&self, ctx: &mut MacroExecuteContext<'_>) -> MacroExecuteResult {
        super::executor::execute(self, ctx)
    }
}

/// Quantize a raw stocking need into its discrete bucket: 20 at the floor,
/// power-of-two buckets up to 640, multiples of 640 beyond. Always at or
/// above the raw need.
pub fn quantize_stock_target(needed: u32) -> u32 {
    const BUCKETS: [u32; 6] = [20, 40, 80, 160, 320, 640];
    for bucket in BUCKETS {
        if needed <= bucket {
            return bucket;
        }
    }
    needed.div_ceil(640) * 640
}

/// Execution boundary classes a plan can anticipate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    InventoryPressure,
}

/// A committed projection: where the world ends up if the macro runs to its
/// wait condition under expected values.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedMacro {
    pub state: WorldState,
    pub ticks: u64,
    pub wait_for: WaitCondition,
    pub deaths: u32,
    pub triggering_condition: Option<String>,
    /// The enriched, execution-ready macro.
    pub committed: MacroCandidate,
}

/// Exactly one of these per plan call; ordinary domain failures are values,
/// never panics.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroPlanOutcome {
    Planned(Box<PlannedMacro>),
    AlreadySatisfied {
        reason: String,
    },
    CannotPlan {
        reason: String,
    },
    /// Plannable only after another macro resolves. Dependencies are
    /// declared, not recursed into; the outer search orders them.
    NeedsPrerequisite {
        prerequisite: Box<MacroCandidate>,
    },
    NeedsBoundary {
        kind: BoundaryKind,
        blocked_item: Option<ItemId>,
    },
}

/// Everything a plan call may read. No ambient state; cycles across plan
/// contexts are expressed through `NeedsPrerequisite` instead of recursion.
pub struct MacroPlanContext<'a> {
    pub state: &'a WorldState,
    pub goal: &'a Goal,
    pub registry: &'a Registry,
    pub boundaries: &'a Boundaries,
    pub rates: &'a [ActionRateSummary],
    pub sim: &'a dyn Simulator,
    pub options: &'a SolverOptions,
}

impl MacroPlanContext<'_> {
    /// The sell policy in force: an explicit override, else the goal's
    /// default (reserve inputs whenever a consuming skill is targeted).
    pub fn sell_policy(&self) -> SellPolicyKind {
        self.options
            .sell_policy
            .unwrap_or_else(|| self.goal.default_sell_policy(self.registry))
    }
}

pub struct MacroExecuteContext<'a> {
    pub state: &'a WorldState,
    pub registry: &'a Registry,
    pub boundaries: &'a Boundaries,
    pub sim: &'a dyn Simulator,
    pub rng: &'a mut StdRng,
    pub options: &'a SolverOptions,
    pub sell_policy: SellPolicyKind,
    pub watch: Option<&'a WatchSet>,
}

/// Outcome of driving one macro under stochastic simulation. `boundary` is
/// `None` on normal completion.
#[derive(Debug, Clone)]
pub struct MacroExecuteResult {
    pub state: WorldState,
    pub ticks_elapsed: u64,
    pub deaths: u32,
    pub boundary: Option<ExecBoundary>,
}

/// Stable first-occurrence dedupe by key. Idempotent.
pub fn dedupe_macros(macros: Vec<MacroCandidate>) -> Vec<MacroCandidate> {
    let mut seen = std::collections::HashSet::new();
    macros
        .into_iter()
        .filter(|candidate| seen.insert(candidate.dedupe_key()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantize_buckets() {
        assert_eq!(quantize_stock_target(1), 20);
        assert_eq!(quantize_stock_target(20), 20);
        assert_eq!(quantize_stock_target(21), 40);
        assert_eq!(quantize_stock_target(100), 160);
        assert_eq!(quantize_stock_target(640), 640);
        assert_eq!(quantize_stock_target(641), 1280);
        assert_eq!(quantize_stock_target(1300), 1920);
    }

    #[test]
    fn test_quantize_never_below_need() {
        for needed in [1u32, 19, 20, 33, 64, 127, 639, 640, 641, 5000] {
            assert!(quantize_stock_target(needed) >= needed);
        }
    }

    #[test]
    fn test_dedupe_is_stable_and_idempotent() {
        let a = MacroCandidate::ensure_stock(ItemId::new("idle:tin_ore"), 20, Provenance::TopLevel);
        let b = MacroCandidate::ensure_stock(ItemId::new("idle:tin_ore"), 20, Provenance::BatchInput);
        let c = MacroCandidate::acquire_item(ItemId::new("idle:tin_ore"), 20, Provenance::TopLevel);
        let macros = vec![a.clone(), b, c.clone()];
        let deduped = dedupe_macros(macros);
        assert_eq!(deduped, vec![a, c]);
        assert_eq!(dedupe_macros(deduped.clone()), deduped);
    }

    #[test]
    fn test_every_macro_kind_round_trips() {
        let chain = PlannedChain {
            item: ItemId::new("idle:copper_ore"),
            quantity: 20,
            action: ActionId::new("idle:mine_copper"),
            actions_needed: 20,
            ticks_needed: 1_000.0,
            children: Vec::new(),
        };
        let macros = vec![
            MacroCandidate::train_skill(
                Skill::Woodcutting,
                StopRule::AtNextBoundary {
                    skill: Skill::Woodcutting,
                },
                vec![StopRule::AtGoal {
                    skill: Skill::Woodcutting,
                    target_xp: 1_000.0,
                }],
                Provenance::TopLevel,
            ),
            MacroCandidate {
                kind: MacroKind::TrainConsumingSkillUntil {
                    skill: Skill::Smithing,
                    primary: StopRule::AtLevel {
                        skill: Skill::Smithing,
                        level: 10,
                    },
                    watched: vec![],
                    consume_action: Some(ActionId::new("idle:smelt_bronze")),
                    producer_by_input: BTreeMap::from([(
                        ItemId::new("idle:copper_ore"),
                        ActionId::new("idle:mine_copper"),
                    )]),
                    buffer_target: Some(20),
                    sell_policy: Some(SellPolicyKind::ReserveConsumingInputs),
                    input_chains: BTreeMap::from([(ItemId::new("idle:copper_ore"), chain)]),
                    max_recovery_attempts: 3,
                },
                provenance: Provenance::TopLevel,
            },
            MacroCandidate::acquire_item(ItemId::new("idle:coal"), 40, Provenance::InputPrereq),
            MacroCandidate::ensure_stock(ItemId::new("idle:tin_ore"), 20, Provenance::BatchInput),
            MacroCandidate::produce_item(
                ItemId::new("idle:copper_ore"),
                640,
                ActionId::new("idle:mine_copper"),
                32_000,
                Provenance::Chain,
            ),
        ];
        for candidate in macros {
            let value = candidate.to_json().unwrap();
            assert!(value.get("type").is_some());
            assert!(value.get("provenance").is_some());
            let back = MacroCandidate::from_json(&value).unwrap();
            assert_eq!(back, candidate);
        }
    }

    #[test]
    fn test_unknown_macro_type_errors() {
        let value = serde_json::json!({ "type": "warp_to_goal", "provenance": "top_level" });
        let error = MacroCandidate::from_json(&value).unwrap_err();
        assert!(error.to_string().contains("Unknown type"));
    }

    #[test]
    fn test_dedupe_key_ignores_enrichment() {
        let mut enriched = MacroCandidate::train_consuming_skill(
            Skill::Smithing,
            StopRule::AtNextBoundary {
                skill: Skill::Smithing,
            },
            vec![],
            Provenance::TopLevel,
        );
        let bare = enriched.clone();
        if let MacroKind::TrainConsumingSkillUntil {
            consume_action,
            buffer_target,
            ..
        } = &mut enriched.kind
        {
            *consume_action = Some(ActionId::new("idle:smelt_bronze"));
            *buffer_target = Some(20);
        }
        assert_eq!(enriched.dedupe_key(), bare.dedupe_key());
    }
}
