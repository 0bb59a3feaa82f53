//! Deterministic sessions and hand-placed cards for integration tests.

use rust_decimal::Decimal;
use std::collections::HashSet;

use cardboard::catalog::Catalog;
use cardboard::config::AppConfig;
use cardboard::engine::Session;
use cardboard::random::{ScriptedRandom, SeededRandom};
use cardboard::state::GameState;
use cardboard::types::{CardInstance, Condition, GameDate, InstanceId};

/// Defaults with a fixed seed.
pub fn seeded_config(seed: u64) -> AppConfig {
    let mut cfg = AppConfig::default();
    cfg.session.seed = Some(seed);
    cfg
}

/// No random market events, so prices only move when a test says so.
pub fn quiet_config(seed: u64) -> AppConfig {
    let mut cfg = seeded_config(seed);
    cfg.market.event_chance = 0.0;
    cfg
}

/// Empty session (no traders, no starter cards) driven by a scripted
/// random source.
pub fn scripted_session(cfg: &AppConfig, cash: Decimal, draws: &[f64], fallback: f64) -> Session {
    let state = GameState::new(cash, cfg.session.days_per_year);
    Session::with_rng(
        cfg,
        Catalog::builtin(),
        state,
        Box::new(ScriptedRandom::with_fallback(draws, fallback)),
    )
}

/// Seeded session with the full default setup.
pub fn seeded_session(cfg: &AppConfig) -> Session {
    let catalog = Catalog::builtin();
    let mut rng = SeededRandom::from_optional_seed(cfg.session.seed);
    let state = cardboard::engine::new_game(cfg, &catalog, &mut rng).unwrap();
    Session::with_rng(cfg, catalog, state, Box::new(rng))
}

/// Put a specific card straight into the player's collection.
pub fn give_card(state: &mut GameState, card_id: &str, condition: Condition, roll: Decimal) -> InstanceId {
    let inst = CardInstance::new(card_id, condition, GameDate::new(1, 1), roll);
    let id = inst.id;
    state.player.collection.insert(inst);
    id
}

/// Every instance id in the game: player, traders and cards out for
/// grading. Panics on a duplicate.
pub fn all_instance_ids(state: &GameState) -> HashSet<InstanceId> {
    let mut ids = HashSet::new();
    let held = state
        .player
        .collection
        .instances()
        .chain(state.traders.iter().flat_map(|t| t.inventory.instances()))
        .chain(state.grading.in_flight());
    for inst in held {
        assert!(ids.insert(inst.id), "instance {} held twice", inst.id);
    }
    ids
}
