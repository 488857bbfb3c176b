use std::collections::BTreeSet;

use crate::types::ItemId;

use super::super::chain::{ChainBuilder, ChainError, PlannedChain};
use super::super::stop::StopRule;
use super::{
    BoundaryKind, MacroCandidate, MacroPlanContext, MacroPlanOutcome, Provenance,
    quantize_stock_target,
};

/// Free slots kept in reserve when judging a chunk feasible.
const SAFETY_MARGIN: usize = 2;

/// Batch size above which a byproduct-dropping action is assumed to
/// actually drop one.
const BYPRODUCT_QTY_THRESHOLD: u32 = 20;

/// Plan toward an absolute stock level. Ensure-stock never advances time
/// itself: each expansion either reports satisfaction, delegates to a
/// prerequisite (child stock or produce leaf), or asks for an inventory
/// boundary intervention.
pub(super) fn plan(
    ctx: &MacroPlanContext<'_>,
    item: &ItemId,
    min_total: u32,
    _provenance: Provenance,
) -> MacroPlanOutcome {
    let current = ctx.state.inventory.count(item);
    if current >= min_total {
        return MacroPlanOutcome::AlreadySatisfied {
            reason: format!("{item} already at {current} of {min_total}"),
        };
    }

    let delta = min_total - current;
    let chunk_cap = delta.min(ctx.options.max_chunk_size);
    let mut builder = ChainBuilder::new(ctx.registry, ctx.rates, ctx.options);

    // Chain-level blockers surface before any feasibility math.
    if let Err(error) = builder.build(item, chunk_cap) {
        return match error {
            ChainError::NeedsUnlock { skill, level, .. } => MacroPlanOutcome::NeedsPrerequisite {
                prerequisite: Box::new(MacroCandidate::train_skill(
                    skill,
                    StopRule::AtLevel { skill, level },
                    vec![],
                    Provenance::SkillPrereq,
                )),
            },
            other => MacroPlanOutcome::CannotPlan {
                reason: other.to_string(),
            },
        };
    }

    if !chunk_fits(&mut builder, ctx, item, 1) {
        return MacroPlanOutcome::NeedsBoundary {
            kind: BoundaryKind::InventoryPressure,
            blocked_item: Some(item.clone()),
        };
    }

    // Binary search the largest feasible chunk; byproduct slots only grow
    // with quantity, so feasibility is monotone.
    let chunk = if chunk_fits(&mut builder, ctx, item, chunk_cap) {
        chunk_cap
    } else {
        let (mut lo, mut hi) = (1u32, chunk_cap);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if chunk_fits(&mut builder, ctx, item, mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        lo
    };

    let chain = match builder.build(item, chunk) {
        Ok(chain) => chain,
        Err(error) => {
            return MacroPlanOutcome::CannotPlan {
                reason: error.to_string(),
            };
        }
    };

    // Children first: any input below its chain quantity becomes a single
    // quantized stock prerequisite.
    for child in &chain.children {
        if ctx.state.inventory.count(&child.item) < child.quantity {
            return MacroPlanOutcome::NeedsPrerequisite {
                prerequisite: Box::new(MacroCandidate::ensure_stock(
                    child.item.clone(),
                    quantize_stock_target(child.quantity),
                    Provenance::BatchInput,
                )),
            };
        }
    }

    log::debug!("ensure-stock {item}: chunk {chunk} via {}", chain.action);
    MacroPlanOutcome::NeedsPrerequisite {
        prerequisite: Box::new(MacroCandidate::produce_item(
            item.clone(),
            current + chunk,
            chain.action.clone(),
            chain.ticks_needed.ceil() as u64,
            Provenance::Chain,
        )),
    }
}

fn chunk_fits(
    builder: &mut ChainBuilder<'_>,
    ctx: &MacroPlanContext<'_>,
    item: &ItemId,
    chunk: u32,
) -> bool {
    match builder.build(item, chunk) {
        Ok(chain) => {
            estimated_new_slots(&chain, ctx) + SAFETY_MARGIN <= ctx.state.inventory.free_slots()
        }
        Err(_) => false,
    }
}

/// Conservative count of inventory slots the chain would newly occupy:
/// one per distinct item not yet held, plus byproduct allowances for
/// larger batches of byproduct-dropping actions.
fn estimated_new_slots(chain: &PlannedChain, ctx: &MacroPlanContext<'_>) -> usize {
    let mut new_items = BTreeSet::new();
    collect_new_items(chain, ctx, &mut new_items);
    new_items.len()
}

fn collect_new_items<'c>(
    chain: &'c PlannedChain,
    ctx: &'c MacroPlanContext<'c>,
    new_items: &mut BTreeSet<&'c ItemId>,
) {
    if !ctx.state.inventory.contains(&chain.item) {
        new_items.insert(&chain.item);
    }
    if chain.quantity > BYPRODUCT_QTY_THRESHOLD {
        if let Some(action) = ctx.registry.action(&chain.action) {
            if let Some(byproduct) = &action.byproduct {
                if !ctx.state.inventory.contains(&byproduct.item) {
                    new_items.insert(&byproduct.item);
                }
            }
        }
    }
    for child in &chain.children {
        collect_new_items(child, ctx, new_items);
    }
}
