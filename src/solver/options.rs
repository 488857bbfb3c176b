use serde::{Deserialize, Serialize};

use super::sell::SellPolicyKind;

/// Tunables for enumeration, planning and execution. The defaults are the
/// contract; overriding them changes behavior bit-for-bit and nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// Top-K branch candidates returned per enumeration.
    pub activity_count: usize,
    /// Top-M upgrade purchases in the buy list.
    pub upgrade_count: usize,
    /// Top-L locked actions in the watch set.
    pub locked_watch_count: usize,
    /// Inventory fraction above which sell candidates are emitted.
    pub inventory_threshold: f64,
    /// Consumer recipe variants kept per unlock tier before the top-N cut.
    pub max_recipe_variants_per_tier: usize,
    /// Top-N consumers selected by the consuming pruner.
    pub consumer_count: usize,
    /// Input buffer required before a consuming macro may start.
    pub min_buffer_to_start: u32,
    /// Largest batch one ensure-stock expansion may plan.
    pub max_chunk_size: u32,
    /// Chain builder recursion guard.
    pub max_chain_depth: usize,
    /// Producer resolver recursion guard.
    pub producer_resolver_max_depth: usize,
    /// Producer candidates evaluated per item.
    pub producer_resolver_top_k: usize,
    /// Rate bonus for sticking with the current action.
    pub stickiness_threshold: f64,
    /// Inventory fraction above which the logistics penalty applies.
    pub inventory_pressure_threshold: f64,
    /// Logistics penalty slope per distinct output.
    pub penalty_per_output: f64,
    /// Executor sell-recovery bound before surrendering to a replan.
    pub max_recovery_attempts: u32,
    /// Sell policy override; derived from the goal when absent.
    pub sell_policy: Option<SellPolicyKind>,
    /// Attach diagnostic stats to enumeration results.
    pub collect_stats: bool,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            activity_count: 8,
            upgrade_count: 8,
            locked_watch_count: 3,
            inventory_threshold: 0.8,
            max_recipe_variants_per_tier: 3,
            consumer_count: 2,
            min_buffer_to_start: 20,
            max_chunk_size: 640,
            max_chain_depth: 10,
            producer_resolver_max_depth: 5,
            producer_resolver_top_k: 3,
            stickiness_threshold: 0.10,
            inventory_pressure_threshold: 0.6,
            penalty_per_output: 0.01,
            max_recovery_attempts: 3,
            sell_policy: None,
            collect_stats: false,
        }
    }
}
