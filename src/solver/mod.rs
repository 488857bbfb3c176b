use rand::rngs::StdRng;

use crate::registry::{Boundaries, Registry};
use crate::sim::Simulator;
use crate::state::WorldState;

pub mod chain;
pub mod codec;
pub mod enumerate;
mod executor;
pub mod goal;
pub mod macros;
pub mod options;
pub mod producer;
pub mod rates;
pub mod sell;
pub mod stop;
pub mod summary;
pub mod wait;

pub use chain::{ChainBuilder, ChainError, PlannedChain};
pub use codec::CodecError;
pub use enumerate::{Candidates, EnumerationStats, WatchSet};
pub use goal::Goal;
pub use macros::{
    BoundaryKind, MacroCandidate, MacroExecuteContext, MacroExecuteResult, MacroKind,
    MacroPlanContext, MacroPlanOutcome, PlannedMacro, Provenance, dedupe_macros,
    quantize_stock_target,
};
pub use options::SolverOptions;
pub use producer::{ProducerPlan, ProducerResolver};
pub use rates::{ActionRateSummary, CapabilityKey, RateCache};
pub use sell::SellPolicyKind;
pub use stop::StopRule;
pub use summary::{ActionSummary, compute_action_summaries};
pub use wait::WaitCondition;

/// One solver run: owns the rate cache, carries the boundary tables, and
/// hands out enumeration, planning and execution calls against a fixed
/// registry and simulator. Dropping the solver ends the run; nothing
/// survives it.
pub struct Solver<'a> {
    registry: &'a Registry,
    sim: &'a dyn Simulator,
    boundaries: Boundaries,
    cache: RateCache,
    options: SolverOptions,
}

impl<'a> Solver<'a> {
    pub fn new(registry: &'a Registry, sim: &'a dyn Simulator, options: SolverOptions) -> Self {
        Self {
            registry,
            sim,
            boundaries: registry.boundaries(),
            cache: RateCache::new(),
            options,
        }
    }

    pub fn boundaries(&self) -> &Boundaries {
        &self.boundaries
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn cache(&self) -> &RateCache {
        &self.cache
    }

    /// Reset the rate cache at a run boundary without rebuilding the solver.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// The frontier for one search node: branch actions, watch events,
    /// macro candidates and the sell policy in force.
    pub fn enumerate_candidates(&mut self, state: &WorldState, goal: &Goal) -> Candidates {
        enumerate::enumerate(
            state,
            goal,
            self.registry,
            &self.boundaries,
            &mut self.cache,
            self.sim,
            &self.options,
        )
    }

    /// Deterministic expected-value projection of one macro.
    pub fn plan(
        &mut self,
        candidate: &MacroCandidate,
        state: &WorldState,
        goal: &Goal,
    ) -> MacroPlanOutcome {
        let rates = self.cache.get_or_compute(state, self.registry);
        let ctx = MacroPlanContext {
            state,
            goal,
            registry: self.registry,
            boundaries: &self.boundaries,
            rates: rates.as_slice(),
            sim: self.sim,
            options: &self.options,
        };
        candidate.plan(&ctx)
    }

    /// Stochastic drive of a planned macro. The goal fixes the recovery
    /// sell policy the same way planning does, so executing under a
    /// consuming-skill goal never liquidates the inputs being stocked.
    pub fn execute(
        &self,
        candidate: &MacroCandidate,
        state: &WorldState,
        goal: &Goal,
        rng: &mut StdRng,
        watch: Option<&WatchSet>,
    ) -> MacroExecuteResult {
        let sell_policy = self
            .options
            .sell_policy
            .unwrap_or_else(|| goal.default_sell_policy(self.registry));
        let mut ctx = MacroExecuteContext {
            state,
            registry: self.registry,
            boundaries: &self.boundaries,
            sim: self.sim,
            rng,
            options: &self.options,
            sell_policy,
            watch,
        };
        candidate.execute(&mut ctx)
    }
}
