//! End-to-end progression flows over the public engine API.
//!
//! These drive the game the way a player session would: buy, wait,
//! reset, save, come back later. Everything runs on the in-memory
//! store; nothing here touches a browser.

use the_particle::save;
use the_particle::tuning::TierSpec;
use the_particle::{
    ActionError, GameState, KeyValueStore, MemoryStore, ParticleGame, Tuning,
};

fn fresh(tuning: Tuning) -> ParticleGame<MemoryStore> {
    ParticleGame::new(MemoryStore::new(), tuning, 0.0)
}

/// A two-tier universe with flat reset requirements, so a whole
/// Linac/Shift ladder fits in a few hundred simulated seconds.
fn small_universe() -> Tuning {
    let mut t = Tuning::default();
    t.tiers = vec![
        TierSpec { name: "Alpha", base_cost: 10.0, cost_growth: 1.5 },
        TierSpec { name: "Beta", base_cost: 50.0, cost_growth: 2.0 },
    ];
    t.linac_req_step = 0.0;
    t.shift_req_base = 2;
    t.shift_req_step = 1;
    t
}

#[test]
fn early_game_buy_and_grow() {
    let mut game = fresh(Tuning::default());

    // Opening move: the starting grant buys exactly one tier-0 unit.
    let outcome = game.buy(0, 1).unwrap();
    assert_eq!(outcome.count, 1);
    assert!(outcome.balance.abs() < 1e-9);

    // 1.1/s: fifteen seconds covers the next unit's 15-particle price.
    for _ in 0..15 {
        game.tick(1.0);
    }
    let outcome = game.buy(0, 1).unwrap();
    assert_eq!(outcome.count, 1);
    assert!((outcome.paid - 15.0).abs() < 1e-9);

    let gen = &game.state().generators[0];
    assert_eq!(gen.purchased, 2);
    assert!((gen.production_multiplier - 1.21).abs() < 1e-9);
    assert!(game.state().total_particles > game.state().particles);
}

#[test]
fn reset_ladder_to_the_first_shift() {
    let mut game = fresh(small_universe());

    let mut ticks = 0;
    while game.state().shift_count == 0 {
        game.tick(1.0);
        ticks += 1;
        assert!(ticks < 50_000, "ladder should complete in bounded time");

        // Beta is the reset fodder; everything left goes into Alpha.
        let _ = game.buy(1, 1);
        let _ = game.buy_max(0);

        let top_owned = game.state().generators[1].owned;
        if top_owned >= game.linac_requirement() {
            let outcome = game.attempt_linac().unwrap();
            assert!((outcome.balance - 10.0).abs() < 1e-9);
            assert_eq!(outcome.shift_count, 0);
        }
        if game.state().linac_count >= game.shift_requirement() {
            game.attempt_shift().unwrap();
        }
    }

    assert_eq!(game.state().shift_count, 1);
    assert_eq!(game.state().linac_count, 0);
    assert_eq!(game.state().stats.total_linacs, 2);
    assert_eq!(game.state().stats.total_shifts, 1);
    // No linacs since the shift: back to an unmultiplied universe,
    // but the next shift now asks for more.
    assert!((game.global_multiplier() - 1.0).abs() < 1e-9);
    assert_eq!(game.shift_requirement(), 3);
}

#[test]
fn autobuyer_unlocks_then_takes_over() {
    let mut tuning = Tuning::default();
    tuning.auto_unlock_base_exp = 2.0; // tier 0 automates at ~100 particles
    let mut game = fresh(tuning);
    game.buy(0, 1).unwrap();

    let mut ticks = 0;
    while !game.state().generators[0].auto_unlocked {
        game.tick(1.0);
        ticks += 1;
        assert!(ticks < 10_000, "unlock threshold should be reached");
    }
    assert!(game.state().log.iter().any(|e| e.is_important));

    assert_eq!(game.toggle_autobuyer(0), Ok(true));
    let purchased_before = game.state().generators[0].purchased;
    for _ in 0..10 {
        game.tick(1.0);
    }
    assert!(
        game.state().generators[0].purchased > purchased_before,
        "enabled autobuyer should spend the banked particles"
    );
}

#[test]
fn save_then_load_restores_the_exact_state() {
    let mut game = fresh(Tuning::default());
    game.buy(0, 1).unwrap();
    for _ in 0..30 {
        game.tick(1.0);
    }
    let _ = game.buy_max(0);

    game.save().unwrap();
    let snapshot = game.state().clone();

    for _ in 0..10 {
        game.tick(1.0);
    }
    assert_ne!(*game.state(), snapshot);

    // Reloading at the instant the save was taken restores it exactly.
    assert!(game.load(snapshot.last_tick).unwrap());
    assert_eq!(*game.state(), snapshot);
}

#[test]
fn export_token_moves_a_game_between_stores() {
    let mut source = fresh(Tuning::default());
    source.buy(0, 1).unwrap();
    for _ in 0..60 {
        source.tick(1.0);
    }
    let token = source.export_token().unwrap();

    let now = source.state().last_tick;
    let mut target = fresh(Tuning::default());
    target.import_token(&token, now).unwrap();
    assert_eq!(target.state().particles, source.state().particles);
    assert_eq!(target.state().generators[0].purchased, 1);

    // The import was committed: reloading from the target's own
    // storage brings the same numbers back.
    assert!(target.load(now).unwrap());
    assert_eq!(target.state().particles, source.state().particles);

    assert!(target.import_token("{}", now).is_err());
    assert!(target.import_token("not json at all", now).is_err());
}

#[test]
fn offline_gap_is_replayed_on_boot() {
    let tuning = Tuning::default();
    let mut resting = GameState::new(&tuning, 0.0);
    resting.generators[0].owned = 50.0;
    resting.last_tick = 1_000.0;

    let mut store = MemoryStore::new();
    store
        .set(save::STORAGE_KEY, &save::encode(&resting).unwrap())
        .unwrap();

    // Two hours later.
    let game = ParticleGame::new(store, tuning, 7_201_000.0);
    let report = game.offline_report().expect("gap should be replayed");
    assert!((report.simulated_seconds - 7_200.0).abs() < 1e-6);
    assert!(report.gained > 300_000.0); // 50/s for 7200s
    assert!((game.state().last_tick - 7_201_000.0).abs() < 1e-9);
    assert!(!game.state().log.is_empty());
}

#[test]
fn crunch_cycle_and_the_point_it_pays() {
    let mut tuning = Tuning::default();
    tuning.crunch_threshold = 500.0;
    tuning.crunch_delay_seconds = 1.0;
    let mut game = fresh(tuning);
    game.buy(0, 1).unwrap();

    let mut ticks = 0;
    while !game.state().is_crunching() {
        game.tick(1.0);
        let _ = game.buy_max(0);
        ticks += 1;
        assert!(ticks < 10_000, "production should outgrow the ceiling");
    }

    assert_eq!(game.state().infinity.crunches, 1);
    assert!((game.state().infinity.points - 1.0).abs() < 1e-9);
    assert!(game.state().infinity.best_crunch_ms.is_some());
    assert_eq!(game.state().stats.total_linacs, 0);
    assert_eq!(game.buy(0, 1), Err(ActionError::CrunchInProgress));

    game.tick(1.0);
    assert!(!game.state().is_crunching());
    assert!((game.state().particles - 10.0).abs() < 1e-9);

    // Spend the point: the permanent factor applies immediately.
    assert_eq!(game.buy_meta_upgrade(0), Ok(0.0));
    assert!((game.global_multiplier() - 2.0).abs() < 1e-9);
}

#[test]
fn hard_reset_erases_the_save() {
    let mut game = fresh(Tuning::default());
    game.buy(0, 1).unwrap();
    game.save().unwrap();

    game.hard_reset(0.0);
    assert_eq!(game.load(0.0).unwrap(), false);
    assert!((game.state().particles - 10.0).abs() < 1e-9);
    assert_eq!(game.state().generators[0].purchased, 0);
}
