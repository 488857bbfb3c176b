use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::registry::Boundaries;
use crate::state::WorldState;
use crate::types::{PurchaseId, Skill, xp_for_level};

use super::codec::{CodecError, from_tagged_value};
use super::sell::SellPolicyKind;
use super::wait::WaitCondition;

/// Serialisable stop predicates macros are planned against. Each converts
/// into a concrete wait condition in the context of a state and the
/// precomputed boundary tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StopRule {
    #[serde(rename = "at_next_boundary")]
    AtNextBoundary { skill: Skill },
    #[serde(rename = "at_goal")]
    AtGoal { skill: Skill, target_xp: f64 },
    #[serde(rename = "at_level")]
    AtLevel { skill: Skill, level: u8 },
    #[serde(rename = "upgrade_affordable")]
    UpgradeAffordable {
        purchase: PurchaseId,
        cost: f64,
        name: String,
    },
    #[serde(rename = "inputs_depleted")]
    InputsDepleted,
}

impl StopRule {
    pub const KNOWN_TYPES: [&'static str; 5] = [
        "at_next_boundary",
        "at_goal",
        "at_level",
        "upgrade_affordable",
        "inputs_depleted",
    ];

    pub fn to_wait_condition(
        &self,
        state: &WorldState,
        boundaries: &Boundaries,
        policy: SellPolicyKind,
    ) -> WaitCondition {
        match self {
            Self::AtNextBoundary { skill } => {
                let next = boundaries.next_boundary(*skill, state.level(*skill));
                WaitCondition::SkillXpReached {
                    skill: *skill,
                    target_xp: xp_for_level(next),
                }
            }
            Self::AtGoal { skill, target_xp } => WaitCondition::SkillXpReached {
                skill: *skill,
                target_xp: *target_xp,
            },
            Self::AtLevel { skill, level } => WaitCondition::SkillXpReached {
                skill: *skill,
                target_xp: xp_for_level(*level),
            },
            Self::UpgradeAffordable { cost, .. } => WaitCondition::EffectiveCreditsAtLeast {
                target: *cost,
                policy,
            },
            // Late-bound to whatever action is active when the condition
            // is evaluated, so mid-macro action changes stay consistent.
            Self::InputsDepleted => WaitCondition::InputsDepleted {
                action: state.active_action.clone(),
            },
        }
    }

    /// Discriminant string for macro dedupe keys.
    pub fn key(&self) -> String {
        match self {
            Self::AtNextBoundary { skill } => format!("boundary:{skill}"),
            Self::AtGoal { skill, target_xp } => format!("goal:{skill}:{target_xp}"),
            Self::AtLevel { skill, level } => format!("level:{skill}:{level}"),
            Self::UpgradeAffordable { purchase, .. } => format!("upgrade:{purchase}"),
            Self::InputsDepleted => "depleted".to_string(),
        }
    }

    pub fn to_json(&self) -> Result<Value, CodecError> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json(value: &Value) -> Result<Self, CodecError> {
        from_tagged_value(value, &Self::KNOWN_TYPES)
    }
}
