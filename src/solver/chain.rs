use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::registry::{ActionDef, Registry};
use crate::types::{ActionId, ItemId, Skill};

use super::options::SolverOptions;
use super::producer::ProducerResolver;
use super::rates::ActionRateSummary;

/// Immutable production tree for a target item and quantity. One node per
/// producer action; children cover the producer's inputs, in recipe order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedChain {
    pub item: ItemId,
    pub quantity: u32,
    pub action: ActionId,
    pub actions_needed: u64,
    pub ticks_needed: f64,
    pub children: Vec<PlannedChain>,
}

impl PlannedChain {
    pub fn total_ticks(&self) -> f64 {
        self.ticks_needed
            + self
                .children
                .iter()
                .map(PlannedChain::total_ticks)
                .sum::<f64>()
    }

    pub fn all_actions(&self) -> BTreeSet<ActionId> {
        let mut actions = BTreeSet::from([self.action.clone()]);
        for child in &self.children {
            actions.extend(child.all_actions());
        }
        actions
    }

    /// Every distinct item touched anywhere in the tree.
    pub fn all_items(&self) -> BTreeSet<ItemId> {
        let mut items = BTreeSet::from([self.item.clone()]);
        for child in &self.children {
            items.extend(child.all_items());
        }
        items
    }

    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(PlannedChain::depth)
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ChainError {
    #[error("no producer for {0}")]
    NoProducer(ItemId),
    #[error("producing {item} needs {skill} level {level}")]
    NeedsUnlock {
        item: ItemId,
        skill: Skill,
        level: u8,
    },
    #[error("production cycle at {item} via {action}")]
    Cycle { item: ItemId, action: ActionId },
    #[error("chain depth limit reached at {0}")]
    DepthLimit(ItemId),
}

/// Recursive chain discovery over one fixed rate snapshot. Like the
/// resolver it feeds on, a builder lives for a single pass.
pub struct ChainBuilder<'a> {
    registry: &'a Registry,
    resolver: ProducerResolver<'a>,
    max_depth: usize,
}

impl<'a> ChainBuilder<'a> {
    pub fn new(
        registry: &'a Registry,
        rates: &'a [ActionRateSummary],
        options: &SolverOptions,
    ) -> Self {
        Self {
            registry,
            resolver: ProducerResolver::new(registry, rates, options),
            max_depth: options.max_chain_depth,
        }
    }

    pub fn build(&mut self, item: &ItemId, quantity: u32) -> Result<PlannedChain, ChainError> {
        let mut path = HashSet::new();
        self.build_at(item, quantity, &mut path, 0)
    }

    fn build_at(
        &mut self,
        item: &ItemId,
        quantity: u32,
        path: &mut HashSet<(ItemId, ActionId)>,
        depth: usize,
    ) -> Result<PlannedChain, ChainError> {
        if depth >= self.max_depth {
            return Err(ChainError::DepthLimit(item.clone()));
        }

        let action = self.pick_producer(item)?;
        let key = (item.clone(), action.id.clone());
        if path.contains(&key) {
            return Err(ChainError::Cycle {
                item: item.clone(),
                action: action.id.clone(),
            });
        }

        let outputs_per_action = action.output_count(item);
        let actions_needed = (quantity.div_ceil(outputs_per_action)) as u64;
        let ticks_needed = actions_needed as f64
            * self
                .resolver
                .summary(&action.id)
                .map(|summary| summary.expected_ticks)
                .unwrap_or(action.base_ticks);

        path.insert(key.clone());
        let mut children = Vec::with_capacity(action.inputs.len());
        for (input, qty_per_action) in action.inputs.clone() {
            let child_quantity = (actions_needed as u32).saturating_mul(qty_per_action);
            // Child failures propagate unchanged.
            children.push(self.build_at(&input, child_quantity, path, depth + 1)?);
        }
        path.remove(&key);

        Ok(PlannedChain {
            item: item.clone(),
            quantity,
            action: action.id.clone(),
            actions_needed,
            ticks_needed,
            children,
        })
    }

    /// Best producer for the item: the resolver's pick when it has one,
    /// otherwise the best direct unlocked producer (so that the real
    /// upstream blocker surfaces from recursion), otherwise needs-unlock
    /// or no-producer.
    fn pick_producer(&mut self, item: &ItemId) -> Result<&'a ActionDef, ChainError> {
        if let Some(plan) = self.resolver.resolve(item) {
            if let Some(action) = self.registry.action(&plan.producer.action) {
                return Ok(action);
            }
        }

        let producers = self.registry.producers_of(item);

        let mut best_unlocked: Option<(&'a ActionDef, f64)> = None;
        for action in producers.iter().copied() {
            let Some(summary) = self.resolver.summary(&action.id) else {
                continue;
            };
            if !summary.unlocked {
                continue;
            }
            let rate = action.output_count(item) as f64 / summary.expected_ticks;
            match best_unlocked {
                Some((_, best_rate)) if best_rate >= rate => {}
                _ => best_unlocked = Some((action, rate)),
            }
        }
        if let Some((action, _)) = best_unlocked {
            return Ok(action);
        }

        // Only locked producers remain: report the cheapest unlock.
        let mut lowest: Option<&'a ActionDef> = None;
        for action in producers {
            let better = match lowest {
                None => true,
                Some(current) => {
                    (action.unlock_level, &action.id) < (current.unlock_level, &current.id)
                }
            };
            if better {
                lowest = Some(action);
            }
        }
        match lowest {
            Some(action) => Err(ChainError::NeedsUnlock {
                item: item.clone(),
                skill: action.skill,
                level: action.unlock_level,
            }),
            None => Err(ChainError::NoProducer(item.clone())),
        }
    }
}
