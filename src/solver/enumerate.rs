use std::collections::{BTreeMap, BTreeSet, HashMap};

use itertools::Itertools;
use smallvec::SmallVec;
use uuid::Uuid;

use crate::registry::{Boundaries, Registry};
use crate::sim::{Interaction, Simulator};
use crate::state::WorldState;
use crate::types::{ActionId, ItemId, PurchaseId, Skill, xp_for_level};

use super::goal::Goal;
use super::macros::{MacroCandidate, Provenance, dedupe_macros};
use super::options::SolverOptions;
use super::producer::ProducerResolver;
use super::rates::{ActionRateSummary, RateCache};
use super::sell::SellPolicyKind;
use super::stop::StopRule;
use super::summary::{ActionSummary, compute_action_summaries};

/// Future moments that justify replanning without being branch actions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WatchSet {
    pub upgrade_purchases: Vec<PurchaseId>,
    pub locked_activities: Vec<ActionId>,
    pub consuming_activities: Vec<ActionId>,
    pub inventory_full: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumerationStats {
    pub run_id: Uuid,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub activities_considered: usize,
    pub consumers_considered: usize,
    pub macros_before_dedupe: usize,
    pub macros_after_dedupe: usize,
}

/// Everything one enumeration call hands the outer search.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidates {
    /// Actions worth switching to, ranking order then id.
    pub branch_actions: Vec<ActionId>,
    /// Competitive purchases, cheapest payback first.
    pub purchases: Vec<PurchaseId>,
    pub sell_policy: SellPolicyKind,
    /// Pruning flag for sell interactions, not a policy statement.
    pub should_emit_sell: bool,
    pub watch: WatchSet,
    pub macros: Vec<MacroCandidate>,
    pub stats: Option<EnumerationStats>,
}

impl Candidates {
    pub fn is_relevant_interaction(&self, interaction: &Interaction) -> bool {
        match interaction {
            Interaction::SwitchActivity(action) => self.branch_actions.contains(action),
            Interaction::BuyShopItem(purchase) => self.purchases.contains(purchase),
            Interaction::SellItems(_) => self.should_emit_sell,
        }
    }
}

pub(crate) fn enumerate(
    state: &WorldState,
    goal: &Goal,
    registry: &Registry,
    boundaries: &Boundaries,
    cache: &mut RateCache,
    sim: &dyn Simulator,
    options: &SolverOptions,
) -> Candidates {
    let rates = cache.get_or_compute(state, registry);
    let cache_hits = cache.hits();
    let cache_misses = cache.misses();
    let run_id = cache.run_id();
    let summaries = compute_action_summaries(state, registry, &rates);

    let sell_policy = options
        .sell_policy
        .unwrap_or_else(|| goal.default_sell_policy(registry));

    // Consuming goal skills go through the strict pruner.
    let unsatisfied = goal.unsatisfied_skills(state);
    let mut pruners: HashMap<Skill, PrunerOutput> = HashMap::new();
    let mut consumers_considered = 0;
    for (skill, _) in &unsatisfied {
        if registry.skill_is_consuming(*skill) {
            let output = prune_consumers(state, registry, &rates, &summaries, options, *skill);
            consumers_considered += output.considered;
            pruners.insert(*skill, output);
        }
    }

    // Goal macros: one train-until per unsatisfied subgoal.
    let mut macros = Vec::new();
    for (skill, target_xp) in &unsatisfied {
        let primary = StopRule::AtNextBoundary { skill: *skill };
        let watched = vec![StopRule::AtGoal {
            skill: *skill,
            target_xp: *target_xp,
        }];
        let candidate = if registry.skill_is_consuming(*skill) {
            MacroCandidate::train_consuming_skill(*skill, primary, watched, Provenance::TopLevel)
        } else {
            MacroCandidate::train_skill(*skill, primary, watched, Provenance::TopLevel)
        };
        macros.push(candidate);
    }

    // Branch ranking over unlocked activities.
    let mut branch_actions: Vec<ActionId> = summaries
        .iter()
        .filter(|summary| summary.rate.unlocked)
        .filter(|summary| match pruners.get(&summary.rate.skill) {
            Some(pruner) => pruner.allowed.contains(&summary.rate.action),
            None => true,
        })
        .filter_map(|summary| {
            let score = goal.activity_rate(
                state,
                summary.rate.skill,
                summary.rate.gold_per_tick,
                summary.rate.xp_per_tick,
            );
            (score > 0.0).then_some((summary.rate.action.clone(), score))
        })
        .sorted_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        })
        .filter(|(action, _)| state.active_action.as_ref() != Some(action))
        .take(options.activity_count)
        .map(|(action, _)| action)
        .collect();
    let activities_considered = summaries.len();

    // Escape hatches: producers for consuming goal skills are always in
    // the branch set, plus producers for any selected consumer's missing
    // inputs.
    for (_, pruner) in pruners.iter().sorted_by_key(|(skill, _)| **skill) {
        for producer in pruner.escape_producers.iter().take(2) {
            if !branch_actions.contains(producer) {
                branch_actions.push(producer.clone());
            }
        }
        for consumer in &pruner.selected {
            if consumer.can_start_now {
                continue;
            }
            for input in &consumer.missing_inputs {
                if let Some(producer) = consumer.producer_by_input.get(input) {
                    if !branch_actions.contains(producer) {
                        branch_actions.push(producer.clone());
                    }
                }
            }
        }
    }

    // Locked-activity watch: soonest-unlockable first.
    let mut locked_watch: SmallVec<[(f64, ActionId); 8]> = SmallVec::new();
    for (skill, _) in &unsatisfied {
        let best_xp_rate = summaries
            .iter()
            .filter(|summary| summary.rate.skill == *skill && summary.rate.unlocked)
            .map(|summary| summary.rate.xp_per_tick)
            .fold(0.0, f64::max);
        if best_xp_rate <= 0.0 {
            continue;
        }
        for summary in &summaries {
            if summary.rate.skill != *skill || summary.rate.unlocked {
                continue;
            }
            let xp_to_unlock = xp_for_level(summary.rate.unlock_level) - state.xp(*skill);
            let delta_ticks = xp_to_unlock.max(0.0) / best_xp_rate;
            locked_watch.push((delta_ticks, summary.rate.action.clone()));
        }
    }
    locked_watch.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    });
    let locked_activities: Vec<ActionId> = locked_watch
        .into_iter()
        .take(options.locked_watch_count)
        .map(|(_, action)| action)
        .collect();

    // Upgrade split: every positive-gain purchase is watched for timing;
    // only purchases beating the best current rate are competitive buys.
    let best_current_rate = summaries
        .iter()
        .filter(|summary| summary.rate.unlocked)
        .map(|summary| {
            goal.activity_rate(
                state,
                summary.rate.skill,
                summary.rate.gold_per_tick,
                summary.rate.xp_per_tick,
            )
        })
        .fold(0.0, f64::max);

    let mut watch_upgrades: SmallVec<[(f64, PurchaseId); 8]> = SmallVec::new();
    let mut buy_upgrades: SmallVec<[(f64, PurchaseId); 8]> = SmallVec::new();
    let mut upgrade_stops: Vec<(PurchaseId, f64, String, Vec<Skill>)> = Vec::new();
    for purchase in registry.purchases_iter() {
        if state.owned(&purchase.id) > 0 {
            continue;
        }
        if !purchase.requirements_met(|skill| state.level(skill)) {
            continue;
        }
        let baseline_rate = summaries
            .iter()
            .filter(|summary| {
                summary.rate.unlocked && purchase.affects_skill(summary.rate.skill)
            })
            .map(|summary| {
                goal.activity_rate(
                    state,
                    summary.rate.skill,
                    summary.rate.gold_per_tick,
                    summary.rate.xp_per_tick,
                )
            })
            .fold(0.0, f64::max);
        let new_rate = baseline_rate / purchase.duration_multiplier;
        let gain = new_rate - baseline_rate;
        if gain <= 0.0 {
            continue;
        }
        let cost = purchase.cost(&state.purchase_counts);
        let payback_ticks = cost / gain;
        watch_upgrades.push((payback_ticks, purchase.id.clone()));
        upgrade_stops.push((
            purchase.id.clone(),
            cost,
            purchase.name.clone(),
            purchase.affects.clone(),
        ));
        if new_rate >= best_current_rate {
            buy_upgrades.push((payback_ticks, purchase.id.clone()));
        }
    }
    let by_payback = |a: &(f64, PurchaseId), b: &(f64, PurchaseId)| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.1.cmp(&b.1))
    };
    watch_upgrades.sort_by(by_payback);
    buy_upgrades.sort_by(by_payback);
    let upgrade_purchases: Vec<PurchaseId> =
        watch_upgrades.into_iter().map(|(_, id)| id).collect();
    let purchases: Vec<PurchaseId> = buy_upgrades
        .into_iter()
        .take(options.upgrade_count)
        .map(|(_, id)| id)
        .collect();

    // Watched-upgrade stops ride along on macros training affected skills.
    for candidate in &mut macros {
        let Some(skill) = candidate.target_skill() else {
            continue;
        };
        let stops: Vec<StopRule> = upgrade_stops
            .iter()
            .filter(|(_, _, _, affects)| affects.contains(&skill))
            .map(|(purchase, cost, name, _)| StopRule::UpgradeAffordable {
                purchase: purchase.clone(),
                cost: *cost,
                name: name.clone(),
            })
            .collect();
        candidate.push_watched_stops(stops);
    }

    let macros_before_dedupe = macros.len();
    let macros = dedupe_macros(macros);

    let should_emit_sell =
        goal.is_sell_relevant() && state.inventory.fraction_used() > options.inventory_threshold;

    let consuming_activities: Vec<ActionId> = pruners
        .iter()
        .sorted_by_key(|(skill, _)| **skill)
        .flat_map(|(_, pruner)| {
            pruner
                .selected
                .iter()
                .filter(|consumer| !consumer.can_start_now)
                .map(|consumer| consumer.action.clone())
        })
        .collect();

    let stats = options.collect_stats.then(|| EnumerationStats {
        run_id,
        cache_hits,
        cache_misses,
        activities_considered,
        consumers_considered,
        macros_before_dedupe,
        macros_after_dedupe: macros.len(),
    });

    Candidates {
        branch_actions,
        purchases,
        sell_policy,
        should_emit_sell,
        watch: WatchSet {
            upgrade_purchases,
            locked_activities,
            consuming_activities,
            inventory_full: state.inventory.is_full(),
        },
        macros,
        stats,
    }
}

struct ConsumerBundle {
    action: ActionId,
    unlock_level: u8,
    duration: f64,
    effective_rate: f64,
    can_start_now: bool,
    missing_inputs: Vec<ItemId>,
    chain_actions: BTreeSet<ActionId>,
    producer_by_input: BTreeMap<ItemId, ActionId>,
}

struct PrunerOutput {
    selected: Vec<ConsumerBundle>,
    /// Selected consumers plus every action in their chains.
    allowed: BTreeSet<ActionId>,
    /// Producer actions of the best bundles, best-first.
    escape_producers: Vec<ActionId>,
    considered: usize,
}

/// Strict consumer pruning for a consuming goal skill: near-tied recipes
/// explode the branching factor, so only the top bundles survive, with a
/// stickiness bonus for the current activity and a logistics penalty under
/// inventory pressure.
fn prune_consumers(
    state: &WorldState,
    registry: &Registry,
    rates: &[ActionRateSummary],
    summaries: &[ActionSummary],
    options: &SolverOptions,
    skill: Skill,
) -> PrunerOutput {
    let mut resolver = ProducerResolver::new(registry, rates, options);
    let mut bundles: Vec<ConsumerBundle> = Vec::new();
    let mut considered = 0;

    for summary in summaries {
        let rate = &summary.rate;
        if rate.skill != skill || !rate.unlocked || !rate.consumes_inputs {
            continue;
        }
        considered += 1;
        let Some(action) = registry.action(&rate.action) else {
            continue;
        };

        // A bundle is infeasible when any input has no producer chain.
        let mut producer_by_input = BTreeMap::new();
        let mut chain_actions = BTreeSet::from([rate.action.clone()]);
        let mut upstream_ticks = 0.0;
        let mut feasible = true;
        for (input, qty) in &action.inputs {
            match resolver.resolve(input) {
                Some(plan) => {
                    upstream_ticks += *qty as f64 * plan.ticks_per_unit;
                    producer_by_input.insert(input.clone(), plan.producer.action.clone());
                    chain_actions.extend(plan.chain_actions);
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

        let sustainable = action.xp / (rate.expected_ticks + upstream_ticks);
        let mut effective_rate = sustainable;
        let sticky = match &state.active_action {
            Some(active) => chain_actions.contains(active),
            None => false,
        };
        if sticky {
            effective_rate *= 1.0 + options.stickiness_threshold;
        }
        let pressure = state.inventory.fraction_used();
        if pressure > options.inventory_pressure_threshold {
            let penalty =
                1.0 - action.outputs.len() as f64 * options.penalty_per_output * pressure;
            effective_rate *= penalty.max(0.0);
        }

        bundles.push(ConsumerBundle {
            action: rate.action.clone(),
            unlock_level: rate.unlock_level,
            duration: rate.expected_ticks,
            effective_rate,
            can_start_now: summary.can_start_now,
            missing_inputs: summary.missing_inputs.keys().cloned().collect(),
            chain_actions,
            producer_by_input,
        });
    }

    bundles.sort_by(|a, b| {
        b.effective_rate
            .partial_cmp(&a.effective_rate)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.can_start_now.cmp(&a.can_start_now))
            .then_with(|| a.chain_actions.len().cmp(&b.chain_actions.len()))
            .then_with(|| {
                b.duration
                    .partial_cmp(&a.duration)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| a.action.cmp(&b.action))
    });

    // Cap recipe variants per unlock tier before the final cut.
    let mut per_tier: HashMap<u8, usize> = HashMap::new();
    let mut selected: Vec<ConsumerBundle> = Vec::new();
    for bundle in bundles {
        let tier = bundle.unlock_level / 10;
        let count = per_tier.entry(tier).or_insert(0);
        if *count >= options.max_recipe_variants_per_tier {
            continue;
        }
        *count += 1;
        selected.push(bundle);
        if selected.len() >= options.consumer_count {
            break;
        }
    }

    let mut allowed = BTreeSet::new();
    let mut escape_producers = Vec::new();
    for bundle in &selected {
        allowed.insert(bundle.action.clone());
        allowed.extend(bundle.chain_actions.iter().cloned());
        for (_, producer) in &bundle.producer_by_input {
            if !escape_producers.contains(producer) {
                escape_producers.push(producer.clone());
            }
        }
    }

    PrunerOutput {
        selected,
        allowed,
        escape_producers,
        considered,
    }
}

#[cfg(test)]
mod tests {
    use super::super::rates::compute_rate_summaries;
    use super::*;
    use crate::sim::StandardSim;
    use crate::types::xp_for_level;

    fn enumerate_for(state: &WorldState, goal: &Goal, options: &SolverOptions) -> Candidates {
        let registry = Registry::standard();
        let boundaries = registry.boundaries();
        let sim = StandardSim::new(&registry);
        let mut cache = RateCache::new();
        enumerate(state, goal, &registry, &boundaries, &mut cache, &sim, options)
    }

    #[test]
    fn test_pure_woodcutting_goal_has_single_branch() {
        let state = WorldState::new();
        let goal = Goal::skill_xp(Skill::Woodcutting, 1_000.0);
        let candidates = enumerate_for(&state, &goal, &SolverOptions::default());
        assert_eq!(
            candidates.branch_actions,
            vec![ActionId::new("idle:cut_normal_logs")]
        );
        assert_eq!(candidates.macros.len(), 1);
        assert!(!candidates.should_emit_sell);
        // The iron axe speeds woodcutting and beats the bare-handed rate.
        assert!(
            candidates
                .watch
                .upgrade_purchases
                .contains(&PurchaseId::new("idle:iron_axe"))
        );
        assert!(candidates.purchases.contains(&PurchaseId::new("idle:iron_axe")));
    }

    #[test]
    fn test_off_goal_upgrades_watch_but_not_buy() {
        // Pure thieving goal: fishing and woodcutting earn nothing under
        // the ranking, so tool upgrades on them have zero gain and no
        // purchase reaches either list.
        let mut state = WorldState::new();
        state.active_action = Some(ActionId::new("idle:pickpocket_man"));
        let goal = Goal::skill_xp(Skill::Thieving, 5_000.0);
        let candidates = enumerate_for(&state, &goal, &SolverOptions::default());
        assert!(candidates.purchases.is_empty());
        assert!(
            !candidates
                .branch_actions
                .contains(&ActionId::new("idle:fish_shrimp"))
        );
    }

    #[test]
    fn test_credits_goal_watch_is_superset_of_buy() {
        // Under a credits goal every activity earns gold, so tool
        // upgrades on gold-producing skills have gain > 0.
        let state = WorldState::new();
        let goal = Goal::credits(100_000.0);
        let candidates = enumerate_for(&state, &goal, &SolverOptions::default());
        assert!(!candidates.watch.upgrade_purchases.is_empty());
        // Watch is always a superset of buy.
        for purchase in &candidates.purchases {
            assert!(candidates.watch.upgrade_purchases.contains(purchase));
        }
    }

    #[test]
    fn test_consuming_goal_selects_pruned_consumers_and_producers() {
        let mut state = WorldState::new();
        state.skill_xp.set(Skill::Mining, xp_for_level(10));
        let goal = Goal::skill_level(Skill::Smithing, 10);
        let candidates = enumerate_for(&state, &goal, &SolverOptions::default());
        // The smelter is the ranked branch; its ore producers ride along
        // as escape hatches.
        assert!(
            candidates
                .branch_actions
                .contains(&ActionId::new("idle:smelt_bronze"))
        );
        assert!(
            candidates
                .branch_actions
                .contains(&ActionId::new("idle:mine_copper"))
        );
        assert!(
            candidates
                .branch_actions
                .contains(&ActionId::new("idle:mine_tin"))
        );
        // With an empty inventory the smelter cannot start: it is watched.
        assert_eq!(
            candidates.watch.consuming_activities,
            vec![ActionId::new("idle:smelt_bronze")]
        );
        // One consuming train macro for the goal skill.
        assert_eq!(candidates.macros.len(), 1);
    }

    #[test]
    fn test_locked_watch_lists_soonest_unlocks() {
        let state = WorldState::new();
        let goal = Goal::skill_xp(Skill::Woodcutting, xp_for_level(50));
        let candidates = enumerate_for(&state, &goal, &SolverOptions::default());
        // Oak (15) unlocks before willow (30) before maple (45).
        assert_eq!(
            candidates.watch.locked_activities,
            vec![
                ActionId::new("idle:cut_oak_logs"),
                ActionId::new("idle:cut_willow_logs"),
                ActionId::new("idle:cut_maple_logs"),
            ]
        );
    }

    #[test]
    fn test_macros_carry_upgrade_stops() {
        let state = WorldState::new();
        let goal = Goal::skill_xp(Skill::Woodcutting, 1_000.0);
        let candidates = enumerate_for(&state, &goal, &SolverOptions::default());
        let candidate = &candidates.macros[0];
        let super::super::macros::MacroKind::TrainSkillUntil { watched, .. } = &candidate.kind
        else {
            panic!("expected train macro");
        };
        assert!(watched.iter().any(|stop| matches!(
            stop,
            StopRule::UpgradeAffordable { purchase, .. }
                if *purchase == PurchaseId::new("idle:iron_axe")
        )));
    }

    #[test]
    fn test_relevant_interactions_match_lists() {
        let state = WorldState::new();
        let goal = Goal::skill_xp(Skill::Woodcutting, 1_000.0);
        let candidates = enumerate_for(&state, &goal, &SolverOptions::default());
        assert!(candidates.is_relevant_interaction(&Interaction::SwitchActivity(ActionId::new(
            "idle:cut_normal_logs"
        ))));
        assert!(!candidates.is_relevant_interaction(&Interaction::SwitchActivity(ActionId::new(
            "idle:fish_shrimp"
        ))));
        assert!(candidates.is_relevant_interaction(&Interaction::BuyShopItem(PurchaseId::new(
            "idle:iron_axe"
        ))));
        // Sell is irrelevant under a pure skill goal.
        assert!(!candidates.is_relevant_interaction(&Interaction::SellItems(vec![])));
    }

    #[test]
    fn test_enumeration_is_deterministic() {
        let mut state = WorldState::new();
        state.skill_xp.set(Skill::Mining, xp_for_level(12));
        state
            .inventory
            .add(&ItemId::new("idle:copper_ore"), 30)
            .unwrap();
        let goal = Goal::skill_level(Skill::Smithing, 20).and_credits(10_000.0);
        let options = SolverOptions {
            collect_stats: true,
            ..SolverOptions::default()
        };
        let first = enumerate_for(&state, &goal, &options);
        let second = enumerate_for(&state, &goal, &options);
        assert_eq!(first.branch_actions, second.branch_actions);
        assert_eq!(first.purchases, second.purchases);
        assert_eq!(first.watch, second.watch);
        assert_eq!(first.macros, second.macros);
        assert!(first.stats.is_some());
    }

    #[test]
    fn test_stickiness_bonus_applies_to_active_chain() {
        let mut state = WorldState::new();
        state.skill_xp.set(Skill::Smithing, xp_for_level(10));
        let registry = Registry::standard();
        let rates = compute_rate_summaries(&state, &registry);
        let summaries = compute_action_summaries(&state, &registry, &rates);
        let options = SolverOptions::default();

        let idle = prune_consumers(&state, &registry, &rates, &summaries, &options, Skill::Smithing);
        state.active_action = Some(ActionId::new("idle:smelt_bronze"));
        let active =
            prune_consumers(&state, &registry, &rates, &summaries, &options, Skill::Smithing);

        let rate_of = |output: &PrunerOutput, action: &str| {
            output
                .selected
                .iter()
                .find(|bundle| bundle.action == ActionId::new(action))
                .map(|bundle| bundle.effective_rate)
                .unwrap()
        };
        let boosted = rate_of(&active, "idle:smelt_bronze");
        let base = rate_of(&idle, "idle:smelt_bronze");
        assert!((boosted - base * 1.10).abs() < 1e-12);
    }

    #[test]
    fn test_stickiness_keeps_near_tied_current_recipe() {
        // Two near-tied consumers with disjoint chains: B rates 5% above A,
        // but A is active and the 10% bonus keeps it on top.
        use crate::registry::{ActionDef, ItemDef};
        let mut registry = Registry::new();
        registry.add_item(ItemDef::new("t:ore_a", "Ore A", 1.0));
        registry.add_item(ItemDef::new("t:ore_b", "Ore B", 1.0));
        registry.add_item(ItemDef::new("t:widget_a", "Widget A", 5.0));
        registry.add_item(ItemDef::new("t:widget_b", "Widget B", 5.0));
        registry.add_action(
            ActionDef::new("t:mine_a", "Mine A", Skill::Mining, 1, 50.0, 5.0)
                .with_output("t:ore_a", 1),
        );
        registry.add_action(
            ActionDef::new("t:mine_b", "Mine B", Skill::Mining, 1, 50.0, 5.0)
                .with_output("t:ore_b", 1),
        );
        registry.add_action(
            ActionDef::new("t:craft_a", "Craft A", Skill::Smithing, 1, 40.0, 10.0)
                .with_input("t:ore_a", 1)
                .with_output("t:widget_a", 1),
        );
        registry.add_action(
            ActionDef::new("t:craft_b", "Craft B", Skill::Smithing, 1, 40.0, 10.5)
                .with_input("t:ore_b", 1)
                .with_output("t:widget_b", 1),
        );

        let mut state = WorldState::new();
        let options = SolverOptions::default();
        let rates = compute_rate_summaries(&state, &registry);
        let summaries = compute_action_summaries(&state, &registry, &rates);
        let idle = prune_consumers(&state, &registry, &rates, &summaries, &options, Skill::Smithing);
        assert_eq!(idle.selected[0].action, ActionId::new("t:craft_b"));

        state.active_action = Some(ActionId::new("t:craft_a"));
        let sticky =
            prune_consumers(&state, &registry, &rates, &summaries, &options, Skill::Smithing);
        assert_eq!(sticky.selected[0].action, ActionId::new("t:craft_a"));
    }
}
