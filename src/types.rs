use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub const MAX_LEVEL: u8 = 99;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Skill {
    Woodcutting,
    Fishing,
    Cooking,
    Mining,
    Smithing,
    Thieving,
}

impl Skill {
    pub const ALL: [Skill; 6] = [
        Skill::Woodcutting,
        Skill::Fishing,
        Skill::Cooking,
        Skill::Mining,
        Skill::Smithing,
        Skill::Thieving,
    ];
}

pub(crate) const fn skill_index(skill: Skill) -> usize {
    match skill {
        Skill::Woodcutting => 0,
        Skill::Fishing => 1,
        Skill::Cooking => 2,
        Skill::Mining => 3,
        Skill::Smithing => 4,
        Skill::Thieving => 5,
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolKind {
    Axe,
    FishingRod,
    Pickaxe,
}

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [ToolKind::Axe, ToolKind::FishingRod, ToolKind::Pickaxe];

    /// Tool tiers are packed into a 3-bit field of the capability key.
    pub const MAX_TIER: u8 = 7;
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ItemId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ActionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PurchaseId(String);

impl PurchaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PurchaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PurchaseId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Cumulative XP required to reach each level, indexed by level (1..=99).
/// Index 0 is unused padding so that `XP_TABLE[level]` reads naturally.
static XP_TABLE: Lazy<[f64; MAX_LEVEL as usize + 1]> = Lazy::new(|| {
    let mut table = [0.0; MAX_LEVEL as usize + 1];
    let mut points: f64 = 0.0;
    for level in 1..=MAX_LEVEL as usize {
        table[level] = (points / 4.0).floor();
        points += (level as f64 + 300.0 * 2f64.powf(level as f64 / 7.0)).floor();
    }
    table
});

/// Cumulative XP required to reach `level`. Level 1 is 0 XP.
pub fn xp_for_level(level: u8) -> f64 {
    let level = level.clamp(1, MAX_LEVEL);
    XP_TABLE[level as usize]
}

/// The level a total XP amount corresponds to.
pub fn level_for_xp(xp: f64) -> u8 {
    let mut level = 1;
    while level < MAX_LEVEL && XP_TABLE[level as usize + 1] <= xp {
        level += 1;
    }
    level
}
