//! Gameplay scenarios run through the `Session` API.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cardboard::engine::Session;
use cardboard::grading::ServiceTier;
use cardboard::market::rotation::RotationPhase;
use cardboard::market::{MarketModifier, ModifierKey, ModifierSource};
use cardboard::trading::negotiation::{BundleDecision, BundleOffer};
use cardboard::trading::offers::{self, CounterResponse};
use cardboard::trading::personality::Personality;
use cardboard::trading::Trader;
use cardboard::types::{CardInstance, Condition, GameDate, GameError, Rarity};

use crate::fixtures::{give_card, quiet_config, scripted_session};

fn event(name: &str) -> ModifierSource {
    ModifierSource::Event(name.into())
}

// ---------------------------------------------------------------------------
// Grading
// ---------------------------------------------------------------------------

#[test]
fn test_expensive_card_needs_a_higher_tier() {
    let cfg = quiet_config(1);
    let mut session = scripted_session(&cfg, dec!(1000), &[], 0.5);
    // Mint Gaiarus at roll 0.6 is $120; a 5x card spike puts it at $600.
    let id = give_card(&mut session.state, "ML-006", Condition::Mint, dec!(0.6));
    session.state.market.install(MarketModifier::new(
        ModifierKey::Card("ML-006".into()),
        dec!(5),
        60,
        event("hype"),
    ));
    assert_eq!(session.collection_value(), dec!(600.00));

    match session.submit_for_grading(ServiceTier::Standard, &[id]) {
        Err(GameError::ValueExceedsServiceLimit { violations, .. }) => {
            assert_eq!(violations.len(), 1);
            assert_eq!(violations[0].instance, id);
            assert_eq!(violations[0].value, dec!(600.00));
            assert_eq!(violations[0].limit, dec!(500.00));
        }
        other => panic!("expected a service limit error, got {other:?}"),
    }
    assert_eq!(session.state.player.cash, dec!(1000));
    assert!(session.state.player.collection.contains(id));

    let submission = session.submit_for_grading(ServiceTier::Express, &[id]).unwrap();
    assert_eq!(submission.completion_date, GameDate::new(1, 8));
    assert_eq!(session.state.player.cash, dec!(970));
    assert!(!session.state.player.collection.contains(id));
    assert_eq!(session.state.grading.pending_count(), 1);

    for _ in 0..6 {
        let report = session.advance_day().unwrap();
        assert!(report.graded.is_empty());
    }
    let report = session.advance_day().unwrap();
    assert_eq!(report.date, GameDate::new(1, 8));
    assert_eq!(report.graded.len(), 1);
    assert_eq!(session.state.grading.pending_count(), 0);
    assert_eq!(session.state.grading.completed.len(), 1);

    let graded = session.state.player.collection.get(id).unwrap();
    let grade = graded.grade.unwrap();
    assert!((1..=10).contains(&grade));
    assert_eq!(session.state.stats.cards_graded, 1);
}

#[test]
fn test_grading_with_no_cash_changes_nothing() {
    let cfg = quiet_config(1);
    let mut session = scripted_session(&cfg, dec!(20), &[], 0.5);
    let a = give_card(&mut session.state, "GS001", Condition::Mint, dec!(0));
    let b = give_card(&mut session.state, "GS002", Condition::Good, dec!(0.5));

    let err = session.submit_for_grading(ServiceTier::Standard, &[a, b]).unwrap_err();
    assert!(matches!(err, GameError::InsufficientFunds { .. }));
    assert_eq!(session.state.player.cash, dec!(20));
    assert_eq!(session.state.player.collection.count_all(), 2);
    assert_eq!(session.state.grading.pending_count(), 0);
}

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

#[test]
fn test_price_spike_wears_off_after_its_duration() {
    let cfg = quiet_config(1);
    let mut session = scripted_session(&cfg, dec!(10), &[], 0.5);
    give_card(&mut session.state, "GS021", Condition::Mint, dec!(0));
    assert_eq!(session.collection_value(), dec!(2.00));

    session.state.market.install(MarketModifier::new(
        ModifierKey::Rarity(Rarity::Rare),
        dec!(1.5),
        3,
        event("price_spike"),
    ));
    assert_eq!(session.collection_value(), dec!(3.00));

    session.advance_day().unwrap();
    session.advance_day().unwrap();
    assert_eq!(session.collection_value(), dec!(3.00));

    let report = session.advance_day().unwrap();
    assert_eq!(report.expired_modifiers.len(), 1);
    assert_eq!(session.collection_value(), dec!(2.00));
}

#[test]
fn test_rotation_schedule_on_a_short_year() {
    let mut cfg = quiet_config(1);
    cfg.session.days_per_year = 10;
    let mut session = scripted_session(&cfg, dec!(10), &[], 0.5);

    // Years 1-3: mythic_legends is not near rotation yet.
    for _ in 0..29 {
        let report = session.advance_day().unwrap();
        assert!(report.rotation.is_empty(), "unexpected rotation on {}", report.date);
    }
    assert_eq!(session.state.today(), GameDate::new(3, 10));

    let report = session.advance_day().unwrap();
    assert_eq!(report.date, GameDate::new(4, 1));
    assert!(report.new_year);
    assert_eq!(report.rotation.len(), 1);
    assert_eq!(report.rotation[0].set_id, "mythic_legends");
    assert_eq!(report.rotation[0].phase, RotationPhase::PreRotation);
    assert_eq!(report.rotation[0].factor, dec!(1.3));
    assert_eq!(report.rotation[0].duration, 10);

    // The hype modifier holds for the rest of the year without reinstalls.
    for _ in 0..9 {
        let report = session.advance_day().unwrap();
        assert!(report.rotation.is_empty());
    }
    let hype = session.state.market.rotation_modifier("mythic_legends").unwrap();
    assert_eq!(hype.factor, dec!(1.3));

    let report = session.advance_day().unwrap();
    assert_eq!(report.date, GameDate::new(5, 1));
    assert_eq!(report.rotation.len(), 1);
    assert_eq!(report.rotation[0].phase, RotationPhase::Rotated);
    let drop = session.state.market.rotation_modifier("mythic_legends").unwrap();
    assert_eq!(drop.factor, dec!(0.7));
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[test]
fn test_buy_and_open_packs_until_broke() {
    let cfg = quiet_config(1);
    let mut session = scripted_session(&cfg, dec!(10), &[], 0.5);

    assert_eq!(session.buy_pack("genesis").unwrap(), dec!(4.99));
    assert_eq!(session.state.player.cash, dec!(5.01));
    assert_eq!(session.state.sealed_count("genesis"), 1);

    let reveal = session.open_pack("genesis").unwrap();
    assert_eq!(reveal.cards.len(), 11);
    assert_eq!(session.state.sealed_count("genesis"), 0);
    assert!(session.state.player.collection.is_empty());

    let ids = reveal.commit(&mut session.state);
    assert_eq!(ids.len(), 11);
    assert_eq!(session.state.player.collection.count_all(), 11);
    assert_eq!(session.state.stats.packs_opened, 1);
    assert_eq!(session.state.stats.cards_acquired, 11);

    assert!(matches!(
        session.open_pack("genesis"),
        Err(GameError::NoSealedPack(_))
    ));

    session.buy_pack("genesis").unwrap();
    assert_eq!(session.state.player.cash, dec!(0.02));
    match session.buy_pack("genesis") {
        Err(GameError::InsufficientFunds { needed, available }) => {
            assert_eq!(needed, dec!(4.99));
            assert_eq!(available, dec!(0.02));
        }
        other => panic!("expected insufficient funds, got {other:?}"),
    }
    assert_eq!(session.state.player.cash, dec!(0.02));
    assert_eq!(session.state.sealed_count("genesis"), 1);
    assert!(matches!(session.buy_pack("no_such_set"), Err(GameError::UnknownSet(_))));
}

// ---------------------------------------------------------------------------
// Trading
// ---------------------------------------------------------------------------

/// Player holds a Mint Sproutling ($0.50); trader 0 holds a Mint Gaiarus
/// ($120).
fn bundle_table(
    personality: Personality,
    reputation: u32,
    genesis_fan: bool,
) -> (Session, BundleOffer) {
    let cfg = quiet_config(1);
    let mut session = scripted_session(&cfg, dec!(500), &[], 0.0);
    let mut trader = Trader::new(0, "Jordan Lee", personality, dec!(300));
    trader.reputation = reputation;
    if genesis_fan {
        trader.interests.sets.insert("genesis".into());
    }
    session.state.traders.push(trader);

    let mine = give_card(&mut session.state, "GS001", Condition::Mint, dec!(0));
    let gaiarus = CardInstance::new("ML-006", Condition::Mint, GameDate::new(1, 1), dec!(0.6));
    let wanted = gaiarus.id;
    session.state.traders[0].inventory.insert(gaiarus);

    // $0.50 card plus $95.50 is 80% of the trader's side.
    let offer = BundleOffer {
        player_cards: vec![mine],
        player_cash: dec!(95.50),
        trader_cards: vec![wanted],
        trader_cash: Decimal::ZERO,
    };
    (session, offer)
}

#[test]
fn test_friendly_collector_accepts_eighty_percent() {
    let (mut session, offer) = bundle_table(Personality::Collector, 80, true);
    let mut negotiation = session.negotiate(0).unwrap();
    let turn = session.propose(&mut negotiation, &offer).unwrap();

    assert_eq!(turn.valuation.player_value, dec!(96.00));
    assert_eq!(turn.valuation.trader_value, dec!(120.00));
    assert_eq!(turn.decision, BundleDecision::Accept);
    assert!(negotiation.is_closed());

    assert_eq!(session.state.player.cash, dec!(404.50));
    assert_eq!(session.state.traders[0].cash, dec!(395.50));
    assert!(session.state.player.collection.contains(offer.trader_cards[0]));
    assert!(session.state.traders[0].inventory.contains(offer.player_cards[0]));
    assert_eq!(session.state.trade_log.len(), 1);
    assert_eq!(session.state.stats.trades_completed, 1);

    assert!(matches!(
        session.propose(&mut negotiation, &offer),
        Err(GameError::NegotiationClosed(_))
    ));
}

#[test]
fn test_wary_casual_counters_and_player_takes_it() {
    let (mut session, offer) = bundle_table(Personality::Casual, 20, false);
    let mut negotiation = session.negotiate(0).unwrap();
    let turn = session.propose(&mut negotiation, &offer).unwrap();

    assert_eq!(
        turn.decision,
        BundleDecision::Counter {
            additional_cash: dec!(19.20)
        }
    );
    assert!(turn.trade.is_none());
    assert_eq!(negotiation.pending_counter(), Some(dec!(19.20)));
    assert_eq!(session.state.player.cash, dec!(500));

    let record = session.accept_counter(&mut negotiation).unwrap();
    assert_eq!(record.cash_given, dec!(114.70));
    assert_eq!(session.state.player.cash, dec!(385.30));
    assert!(session.state.player.collection.contains(offer.trader_cards[0]));
}

#[test]
fn test_ai_offer_counter_and_sale() {
    let cfg = quiet_config(1);
    let mut session = scripted_session(&cfg, dec!(10), &[], 0.0);
    let mut trader = Trader::new(0, "Casey Park", Personality::Collector, dec!(1000));
    trader.interests.sets.insert("genesis".into());
    session.state.traders.push(trader);
    let id = give_card(&mut session.state, "GS021", Condition::Mint, dec!(0));

    let offers = session.solicit_offers().unwrap();
    assert_eq!(offers.len(), 1);
    let offer = offers[0].clone();
    assert_eq!(offer.instance, id);
    assert_eq!(offer.market_value, dec!(2.00));
    // Mint (+0.12 for a Collector) and a wanted set (+0.30).
    assert_eq!(offer.perceived, dec!(2.84));
    assert_eq!(offer.amount, dec!(2.56));

    let trader = session.state.trader(0).unwrap();
    assert_eq!(
        offers::evaluate_counter(trader, &offer, offer.perceived * dec!(2)),
        CounterResponse::Reject
    );
    let CounterResponse::Accept { price } = offers::evaluate_counter(trader, &offer, offer.perceived)
    else {
        panic!("a counter at perceived value should be accepted");
    };

    let record = offers::complete_sale(&mut session.state, &session.catalog, 0, id, price).unwrap();
    assert_eq!(record.cash_received, price);
    assert_eq!(session.state.player.cash, dec!(10) + price);
    assert_eq!(session.state.trader(0).unwrap().cash, dec!(1000) - price);
    assert!(session.state.player.collection.is_empty());
    assert!(session.state.trader(0).unwrap().inventory.contains(id));
    assert_eq!(session.state.stats.trades_completed, 1);
}
