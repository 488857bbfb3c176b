#![warn(clippy::all)]
#![deny(rust_2018_idioms)]

pub mod registry;
pub mod sim;
pub mod solver;
pub mod state;
pub mod types;

pub use registry::{Boundaries, Registry};
pub use sim::{ExecBoundary, Interaction, Simulator, StandardSim};
pub use solver::{
    Candidates, Goal, MacroCandidate, MacroPlanOutcome, RateCache, Solver, SolverOptions,
};
pub use state::{Inventory, WorldState};
pub use types::{ActionId, ItemId, PurchaseId, Skill, ToolKind};
