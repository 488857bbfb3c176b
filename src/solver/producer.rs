use std::collections::{BTreeSet, HashMap, HashSet};

use itertools::Itertools;

use crate::registry::Registry;
use crate::types::{ActionId, ItemId};

use super::options::SolverOptions;
use super::rates::ActionRateSummary;

/// Best way to make one unit of an item, upstream chain included.
#[derive(Debug, Clone, PartialEq)]
pub struct ProducerPlan {
    /// Primary producer's capability summary.
    pub producer: ActionRateSummary,
    /// Mean ticks to net one unit, counting all upstream production.
    pub ticks_per_unit: f64,
    /// Every action anywhere in the chain; used for stickiness checks.
    pub chain_actions: BTreeSet<ActionId>,
}

/// Per-selection-pass producer resolution with memoisation. The memo is
/// only valid while the rate snapshot is fixed, so a resolver is built
/// inside one enumeration or planning pass and dropped at its return.
pub struct ProducerResolver<'a> {
    registry: &'a Registry,
    rates_by_action: HashMap<&'a ActionId, &'a ActionRateSummary>,
    top_k: usize,
    max_depth: usize,
    memo: HashMap<ItemId, Option<ProducerPlan>>,
    visiting: HashSet<ItemId>,
}

impl<'a> ProducerResolver<'a> {
    pub fn new(
        registry: &'a Registry,
        rates: &'a [ActionRateSummary],
        options: &SolverOptions,
    ) -> Self {
        Self {
            registry,
            rates_by_action: rates.iter().map(|rate| (&rate.action, rate)).collect(),
            top_k: options.producer_resolver_top_k,
            max_depth: options.producer_resolver_max_depth,
            memo: HashMap::new(),
            visiting: HashSet::new(),
        }
    }

    /// Best feasible producer plan for the item, or `None` when nothing
    /// unlocked can make it (directly or upstream).
    pub fn resolve(&mut self, item: &ItemId) -> Option<ProducerPlan> {
        self.resolve_at(item, 0)
    }

    fn resolve_at(&mut self, item: &ItemId, depth: usize) -> Option<ProducerPlan> {
        if let Some(cached) = self.memo.get(item) {
            return cached.clone();
        }
        // Depth and cycle bail-outs are path-dependent, so they stay
        // out of the memo.
        if depth >= self.max_depth {
            return None;
        }
        if self.visiting.contains(item) {
            return None;
        }

        self.visiting.insert(item.clone());
        let plan = self.resolve_candidates(item, depth);
        self.visiting.remove(item);
        self.memo.insert(item.clone(), plan.clone());
        plan
    }

    fn resolve_candidates(&mut self, item: &ItemId, depth: usize) -> Option<ProducerPlan> {
        let candidates: Vec<_> = self
            .registry
            .producers_of(item)
            .into_iter()
            .filter(|action| {
                self.rates_by_action
                    .get(&action.id)
                    .map(|rate| rate.unlocked)
                    .unwrap_or(false)
            })
            .sorted_by(|a, b| {
                let rate_a = self.direct_output_rate(&a.id, a.output_count(item));
                let rate_b = self.direct_output_rate(&b.id, b.output_count(item));
                rate_b
                    .partial_cmp(&rate_a)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.id.cmp(&b.id))
            })
            .take(self.top_k)
            .collect();

        let mut best: Option<ProducerPlan> = None;
        for action in candidates {
            let Some(&summary) = self.rates_by_action.get(&action.id) else {
                continue;
            };
            let outputs_per_action = action.output_count(item) as f64;
            let mut ticks_per_unit = summary.expected_ticks / outputs_per_action;
            let mut chain_actions = BTreeSet::from([action.id.clone()]);
            let mut feasible = true;
            for (input, qty) in &action.inputs {
                match self.resolve_at(input, depth + 1) {
                    Some(upstream) => {
                        ticks_per_unit +=
                            *qty as f64 * upstream.ticks_per_unit / outputs_per_action;
                        chain_actions.extend(upstream.chain_actions);
                    }
                    None => {
                        feasible = false;
                        break;
                    }
                }
            }
            if !feasible {
                continue;
            }
            let candidate = ProducerPlan {
                producer: summary.clone(),
                ticks_per_unit,
                chain_actions,
            };
            best = match best {
                None => Some(candidate),
                Some(current) => Some(pick_better(current, candidate)),
            };
        }
        best
    }

    /// Capability summary backing this pass, if the action is known.
    pub fn summary(&self, action: &ActionId) -> Option<&ActionRateSummary> {
        self.rates_by_action.get(action).copied()
    }

    fn direct_output_rate(&self, action: &ActionId, output_qty: u32) -> f64 {
        self.rates_by_action
            .get(action)
            .map(|rate| output_qty as f64 / rate.expected_ticks)
            .unwrap_or(0.0)
    }
}

/// Minimum ticks-per-unit wins; ties go to the simpler chain.
fn pick_better(current: ProducerPlan, candidate: ProducerPlan) -> ProducerPlan {
    if candidate.ticks_per_unit < current.ticks_per_unit {
        return candidate;
    }
    if candidate.ticks_per_unit == current.ticks_per_unit
        && candidate.chain_actions.len() < current.chain_actions.len()
    {
        return candidate;
    }
    current
}
