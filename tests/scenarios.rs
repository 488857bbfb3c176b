use rand::SeedableRng;
use rand::rngs::StdRng;

use idleplan_rs::solver::{
    MacroKind, MacroPlanOutcome, Provenance, SellPolicyKind, StopRule,
};
use idleplan_rs::types::xp_for_level;
use idleplan_rs::{
    ActionId, Goal, ItemId, MacroCandidate, PurchaseId, Registry, Skill, Solver, SolverOptions,
    StandardSim, WorldState,
};

#[test]
fn scenario_pure_woodcutting_goal() {
    let registry = Registry::standard();
    let sim = StandardSim::new(&registry);
    let mut solver = Solver::new(&registry, &sim, SolverOptions::default());
    let state = WorldState::new();
    let goal = Goal::skill_xp(Skill::Woodcutting, 1_000.0);

    let candidates = solver.enumerate_candidates(&state, &goal);
    assert_eq!(
        candidates.branch_actions,
        vec![ActionId::new("idle:cut_normal_logs")]
    );
    assert_eq!(candidates.macros.len(), 1);
    let macro_candidate = &candidates.macros[0];
    match &macro_candidate.kind {
        MacroKind::TrainSkillUntil {
            skill,
            primary,
            watched,
            ..
        } => {
            assert_eq!(*skill, Skill::Woodcutting);
            assert_eq!(
                primary,
                &StopRule::AtNextBoundary {
                    skill: Skill::Woodcutting
                }
            );
            assert!(watched.contains(&StopRule::AtGoal {
                skill: Skill::Woodcutting,
                target_xp: 1_000.0,
            }));
        }
        other => panic!("unexpected macro {other:?}"),
    }
    // Axes with positive gain sit in the watch list, and the competitive
    // iron axe also rides along as a watched stop on the macro.
    assert!(
        candidates
            .watch
            .upgrade_purchases
            .contains(&PurchaseId::new("idle:iron_axe"))
    );

    // Planning the enumerated macro yields at its earliest stop: logs sell
    // for 1 apiece, so the 50-gold axe becomes affordable after 1500 ticks,
    // well before the 1000 xp goal at 3000.
    let outcome = solver.plan(macro_candidate, &state, &goal);
    let MacroPlanOutcome::Planned(planned) = outcome else {
        panic!("expected planned outcome, got {outcome:?}");
    };
    assert_eq!(planned.ticks, 1_500);
    assert!(
        planned
            .triggering_condition
            .as_deref()
            .unwrap()
            .contains("credits")
    );
    assert_eq!(planned.deaths, 0);

    // Without the upgrade watch the same commitment runs to the goal.
    let bare = MacroCandidate::train_skill(
        Skill::Woodcutting,
        StopRule::AtNextBoundary {
            skill: Skill::Woodcutting,
        },
        vec![StopRule::AtGoal {
            skill: Skill::Woodcutting,
            target_xp: 1_000.0,
        }],
        Provenance::TopLevel,
    );
    let MacroPlanOutcome::Planned(planned) = solver.plan(&bare, &state, &goal) else {
        panic!("expected planned outcome");
    };
    assert_eq!(planned.ticks, 3_000);
    assert!(planned.state.xp(Skill::Woodcutting) >= 1_000.0);

    // The committed macro executes to the same goal stochastically.
    let mut rng = StdRng::seed_from_u64(11);
    let result = solver.execute(&planned.committed, &state, &goal, &mut rng, None);
    assert!(result.boundary.is_none());
    assert!(result.state.xp(Skill::Woodcutting) >= 1_000.0);
}

#[test]
fn scenario_ensure_stock_chunks_toward_target() {
    let registry = Registry::standard();
    let sim = StandardSim::new(&registry);
    let mut solver = Solver::new(&registry, &sim, SolverOptions::default());

    // 15 free slots: five stacks of junk occupy the rest.
    let mut state = WorldState::new();
    for i in 0..5 {
        state
            .inventory
            .add(&ItemId::new(format!("junk:{i}")), 1)
            .unwrap();
    }
    let goal = Goal::credits(1_000_000.0);
    let stock = MacroCandidate::ensure_stock(
        ItemId::new("idle:copper_ore"),
        1_500,
        Provenance::TopLevel,
    );

    let mut batches = Vec::new();
    loop {
        match solver.plan(&stock, &state, &goal) {
            MacroPlanOutcome::NeedsPrerequisite { prerequisite } => {
                let MacroKind::ProduceItem { min_total, .. } = &prerequisite.kind else {
                    panic!("expected produce leaf, got {prerequisite:?}");
                };
                batches.push(*min_total);
                let MacroPlanOutcome::Planned(planned) =
                    solver.plan(&prerequisite, &state, &goal)
                else {
                    panic!("produce leaf must plan");
                };
                state = planned.state;
            }
            MacroPlanOutcome::AlreadySatisfied { .. } => break,
            other => panic!("unexpected outcome {other:?}"),
        }
        assert!(batches.len() <= 10, "expansion did not converge");
    }
    assert_eq!(batches, vec![640, 1_280, 1_500]);
    assert!(state.inventory.count(&ItemId::new("idle:copper_ore")) >= 1_500);
}

#[test]
fn scenario_smithing_blocked_on_tin() {
    let registry = Registry::standard();
    let sim = StandardSim::new(&registry);
    let mut solver = Solver::new(&registry, &sim, SolverOptions::default());

    let mut state = WorldState::new();
    state.skill_xp.set(Skill::Mining, xp_for_level(10));
    state
        .inventory
        .add(&ItemId::new("idle:copper_ore"), 50)
        .unwrap();
    let goal = Goal::skill_level(Skill::Smithing, 10);

    let candidates = solver.enumerate_candidates(&state, &goal);
    let train = candidates
        .macros
        .iter()
        .find(|candidate| {
            matches!(candidate.kind, MacroKind::TrainConsumingSkillUntil { .. })
        })
        .expect("consuming train macro for the goal skill");

    let MacroPlanOutcome::NeedsPrerequisite { prerequisite } = solver.plan(train, &state, &goal)
    else {
        panic!("expected prerequisite");
    };
    // The tin buffer is the blocker, at exactly the 20-unit floor no
    // matter how many bars the goal implies.
    assert_eq!(
        prerequisite.kind,
        MacroKind::EnsureStock {
            item: ItemId::new("idle:tin_ore"),
            min_total: 20,
        }
    );
}

#[test]
fn scenario_inventory_pressure() {
    let registry = Registry::standard();
    let sim = StandardSim::new(&registry);
    let mut solver = Solver::new(&registry, &sim, SolverOptions::default());

    let mut state = WorldState::new();
    for i in 0..state.inventory.capacity() {
        state
            .inventory
            .add(&ItemId::new(format!("junk:{i}")), 1)
            .unwrap();
    }

    let goal = Goal::credits(10_000.0);
    let stock =
        MacroCandidate::ensure_stock(ItemId::new("idle:copper_ore"), 100, Provenance::TopLevel);
    let outcome = solver.plan(&stock, &state, &goal);
    let MacroPlanOutcome::NeedsBoundary { blocked_item, .. } = outcome else {
        panic!("expected inventory boundary, got {outcome:?}");
    };
    assert_eq!(blocked_item, Some(ItemId::new("idle:copper_ore")));

    // Sell emission needs both pressure and a sell-relevant goal.
    let credits_candidates = solver.enumerate_candidates(&state, &goal);
    assert!(credits_candidates.should_emit_sell);
    assert!(credits_candidates.watch.inventory_full);
    let skill_goal = Goal::skill_xp(Skill::Woodcutting, 5_000.0);
    let skill_candidates = solver.enumerate_candidates(&state, &skill_goal);
    assert!(!skill_candidates.should_emit_sell);
}

#[test]
fn scenario_upgrade_watch_without_competitiveness() {
    let registry = Registry::standard();
    let sim = StandardSim::new(&registry);
    let mut solver = Solver::new(&registry, &sim, SolverOptions::default());

    // Thieving both earns gold and is the goal skill, so pickpocketing
    // dominates the ranking; the fishing rod still improves fishing.
    let mut state = WorldState::new();
    state.active_action = Some(ActionId::new("idle:pickpocket_man"));
    let goal = Goal::skill_xp(Skill::Thieving, 20_000.0).and_credits(50_000.0);

    let candidates = solver.enumerate_candidates(&state, &goal);
    let rod = PurchaseId::new("idle:oak_fishing_rod");
    assert!(candidates.watch.upgrade_purchases.contains(&rod));
    assert!(!candidates.purchases.contains(&rod));
    assert!(!candidates.is_relevant_interaction(
        &idleplan_rs::Interaction::BuyShopItem(rod.clone())
    ));
    // Watch is a superset of buy.
    for purchase in &candidates.purchases {
        assert!(candidates.watch.upgrade_purchases.contains(purchase));
    }
}

#[test]
fn scenario_consuming_plan_then_execute() {
    let registry = Registry::standard();
    let sim = StandardSim::new(&registry);
    let mut solver = Solver::new(&registry, &sim, SolverOptions::default());

    let mut state = WorldState::new();
    state
        .inventory
        .add(&ItemId::new("idle:copper_ore"), 25)
        .unwrap();
    state
        .inventory
        .add(&ItemId::new("idle:tin_ore"), 25)
        .unwrap();
    let goal = Goal::skill_level(Skill::Smithing, 5);

    let candidates = solver.enumerate_candidates(&state, &goal);
    let train = candidates
        .macros
        .iter()
        .find(|candidate| {
            matches!(candidate.kind, MacroKind::TrainConsumingSkillUntil { .. })
        })
        .expect("consuming train macro");

    let MacroPlanOutcome::Planned(planned) = solver.plan(train, &state, &goal) else {
        panic!("expected planned outcome");
    };
    let MacroKind::TrainConsumingSkillUntil {
        consume_action,
        producer_by_input,
        sell_policy,
        ..
    } = &planned.committed.kind
    else {
        panic!("committed macro must stay consuming");
    };
    assert_eq!(
        consume_action.as_ref(),
        Some(&ActionId::new("idle:smelt_bronze"))
    );
    assert_eq!(producer_by_input.len(), 2);
    assert_eq!(*sell_policy, Some(SellPolicyKind::ReserveConsumingInputs));

    let mut rng = StdRng::seed_from_u64(23);
    let result = solver.execute(&planned.committed, &state, &goal, &mut rng, None);
    assert!(result.boundary.is_none());
    assert!(result.state.xp(Skill::Smithing) >= xp_for_level(5));
}

#[test]
fn enumerated_macros_round_trip_through_json() {
    let registry = Registry::standard();
    let sim = StandardSim::new(&registry);
    let mut solver = Solver::new(&registry, &sim, SolverOptions::default());

    let mut state = WorldState::new();
    state.skill_xp.set(Skill::Mining, xp_for_level(12));
    let goal = Goal::skill_level(Skill::Smithing, 20)
        .and_skill_xp(Skill::Woodcutting, 8_000.0)
        .and_credits(25_000.0);

    let candidates = solver.enumerate_candidates(&state, &goal);
    assert!(!candidates.macros.is_empty());
    for candidate in &candidates.macros {
        let value = candidate.to_json().unwrap();
        let back = MacroCandidate::from_json(&value).unwrap();
        assert_eq!(&back, candidate);
    }
}
