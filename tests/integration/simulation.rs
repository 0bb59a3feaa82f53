//! Long unattended runs.
//!
//! Drives seeded sessions through the autoplay loop and checks the
//! invariants that must hold on every day: no card is ever duplicated or
//! lost, nobody's cash goes negative, and a seed fully determines a run.

use rust_decimal::Decimal;

use cardboard::engine::Session;
use cardboard::state::SessionStats;
use cardboard::storage;
use cardboard::types::{Condition, GameDate, Money};

use crate::fixtures::{all_instance_ids, seeded_config, seeded_session};

/// Everything about a run that does not depend on instance UUIDs.
#[derive(Debug, PartialEq)]
struct Fingerprint {
    date: GameDate,
    cash: Money,
    stats: SessionStats,
    cards: Vec<(String, Condition, Decimal, Option<u8>)>,
    trader_cash: Vec<Money>,
    trades: usize,
    events: Vec<String>,
}

fn fingerprint(session: &Session) -> Fingerprint {
    let state = &session.state;
    let mut cards: Vec<_> = state
        .player
        .collection
        .instances()
        .map(|i| (i.card_id.clone(), i.condition, i.base_roll, i.grade))
        .collect();
    cards.sort_by(|a, b| a.0.cmp(&b.0).then(a.2.cmp(&b.2)));
    Fingerprint {
        date: state.today(),
        cash: state.player.cash,
        stats: state.stats.clone(),
        cards,
        trader_cash: state.traders.iter().map(|t| t.cash).collect(),
        trades: state.trade_log.len(),
        events: state.market.history.iter().map(|e| e.event_id.clone()).collect(),
    }
}

fn run_days(session: &mut Session, days: u32) {
    let mut total = all_instance_ids(&session.state).len();
    let mut acquired = session.state.stats.cards_acquired;

    for _ in 0..days {
        session.autoplay_day(true, true).unwrap();

        let now = all_instance_ids(&session.state).len();
        let gained = (session.state.stats.cards_acquired - acquired) as usize;
        assert_eq!(now, total + gained, "cards appeared or vanished on {}", session.state.today());
        total = now;
        acquired = session.state.stats.cards_acquired;

        assert!(session.state.player.cash >= Decimal::ZERO);
        for trader in &session.state.traders {
            assert!(trader.cash >= Decimal::ZERO, "{} is in debt", trader.name);
            assert!(trader.reputation <= 100);
        }
    }
}

#[test]
fn test_sixty_day_autoplay_keeps_invariants() {
    let cfg = seeded_config(42);
    let mut session = seeded_session(&cfg);

    run_days(&mut session, 60);

    let stats = &session.state.stats;
    assert_eq!(session.state.today(), GameDate::new(1, 61));
    assert_eq!(stats.days_played, 60);
    assert!(stats.packs_opened >= 1);
    assert!(stats.cash_spent > Decimal::ZERO);
    assert_eq!(stats.trades_completed as usize, session.state.trade_log.len());
}

#[test]
fn test_same_seed_same_run() {
    let cfg = seeded_config(2024);
    let mut a = seeded_session(&cfg);
    let mut b = seeded_session(&cfg);
    for _ in 0..25 {
        a.autoplay_day(true, true).unwrap();
        b.autoplay_day(true, true).unwrap();
    }
    assert_eq!(fingerprint(&a), fingerprint(&b));

    let mut c = seeded_session(&seeded_config(2025));
    for _ in 0..25 {
        c.autoplay_day(true, true).unwrap();
    }
    assert_ne!(fingerprint(&a).trader_cash, fingerprint(&c).trader_cash);
}

#[test]
fn test_save_mid_run_and_continue() {
    let cfg = seeded_config(7);
    let mut session = seeded_session(&cfg);
    run_days(&mut session, 15);

    let mut path = std::env::temp_dir();
    path.push(format!("cardboard_sim_{}.json", uuid::Uuid::new_v4()));
    let path = path.to_string_lossy().to_string();

    storage::save_state(&session.state, Some(&path)).unwrap();
    let loaded = storage::load_state(Some(&path)).unwrap().unwrap();
    storage::delete_state(Some(&path)).unwrap();

    assert_eq!(loaded.today(), session.state.today());
    assert_eq!(loaded.player.cash, session.state.player.cash);
    assert_eq!(loaded.player.collection, session.state.player.collection);
    assert_eq!(loaded.traders, session.state.traders);
    assert_eq!(loaded.stats, session.state.stats);
    assert_eq!(loaded.trade_log.len(), session.state.trade_log.len());

    let value_before = session.collection_value();
    let mut resumed = Session::resume(&cfg, loaded);
    assert_eq!(resumed.collection_value(), value_before);

    run_days(&mut resumed, 15);
    assert_eq!(resumed.state.today(), GameDate::new(1, 31));
    assert_eq!(resumed.state.stats.days_played, 30);
}
