//! Inventories shared across threads.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::thread;

use cardboard::engine::store::SupplyKind;
use cardboard::inventory::shared::SharedCollections;
use cardboard::inventory::{Exchange, Side};
use cardboard::state::GameState;
use cardboard::trading::negotiation::{BundleDecision, BundleOffer};
use cardboard::types::{CardInstance, Condition, GameDate, OwnerId};

use crate::fixtures::{all_instance_ids, seeded_config, seeded_session};

fn total_cash(state: &GameState) -> Decimal {
    state.player.cash + state.traders.iter().map(|t| t.cash).sum::<Decimal>()
}

#[test]
fn test_parallel_transfers_conserve_cards() {
    let cfg = seeded_config(11);
    let mut session = seeded_session(&cfg);
    let before = all_instance_ids(&session.state);
    let trader_count = session.state.traders.len();
    assert!(trader_count >= 4);

    let shared = SharedCollections::from_state(&session.state);

    // Each thread owns one trader's starting cards and walks them through
    // the player to the next trader, so every pair of owners is locked from
    // both directions at once.
    let batches: Vec<Vec<_>> = (0..4u32)
        .map(|t| {
            shared
                .snapshot(OwnerId::Trader(t))
                .unwrap()
                .instances()
                .map(|i| i.id)
                .collect()
        })
        .collect();

    let mut handles = Vec::new();
    for (t, ids) in (0..4u32).zip(batches) {
        let shared = shared.clone();
        let from = OwnerId::Trader(t);
        let to = OwnerId::Trader((t + 1) % 4);
        handles.push(thread::spawn(move || {
            for id in &ids {
                shared.transfer(from, OwnerId::Player, *id).unwrap();
                shared.transfer(OwnerId::Player, to, *id).unwrap();
            }
            ids.len()
        }));
    }
    let moved: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
    assert!(moved > 0);

    shared.write_back(&mut session.state).unwrap();
    let after = all_instance_ids(&session.state);
    assert_eq!(before, after);
    assert_eq!(session.state.player.collection.count_all(), cfg.session.starter_cards.len());
}

#[test]
fn test_transfer_of_missing_card_fails_cleanly() {
    let cfg = seeded_config(12);
    let session = seeded_session(&cfg);
    let shared = SharedCollections::from_state(&session.state);
    let id = session.state.traders[0].inventory.instances().next().unwrap().id;

    // The card is with trader 0, not trader 1.
    assert!(shared.transfer(OwnerId::Trader(1), OwnerId::Player, id).is_err());
    assert!(shared.transfer(OwnerId::Player, OwnerId::Trader(99), id).is_err());
    assert_eq!(
        shared.count_all(OwnerId::Trader(0)).unwrap(),
        session.state.traders[0].inventory.count_all()
    );
}

#[test]
fn test_session_trades_while_traders_deal_in_another_thread() {
    let cfg = seeded_config(13);
    let mut session = seeded_session(&cfg);
    session.state.player.cash = dec!(1000);
    let (a, b) = (session.state.traders[2].id, session.state.traders[3].id);
    session.state.traders[2].cash = dec!(50);
    session.state.traders[3].cash = dec!(50);

    let churned = CardInstance::new("GS002", Condition::Mint, GameDate::new(1, 1), dec!(0));
    let churned_id = churned.id;
    session.state.traders[2].inventory.insert(churned);
    // Worth $0.50; the player offers double.
    let wanted = CardInstance::new("GS001", Condition::Mint, GameDate::new(1, 1), dec!(0));
    let wanted_id = wanted.id;
    let seller = session.state.traders[0].id;
    session.state.traders[0].inventory.insert(wanted);
    let seller_cash = session.state.traders[0].cash;

    let cards_before = all_instance_ids(&session.state);
    let cash_before = total_cash(&session.state);

    let shared = session.share();
    let dealer = {
        let shared = shared.clone();
        thread::spawn(move || {
            for round in 0..200 {
                let (from, to) = if round % 2 == 0 { (a, b) } else { (b, a) };
                shared
                    .exchange(&Exchange::new(
                        Side::new(OwnerId::Trader(from), vec![churned_id], dec!(0)),
                        Side::new(OwnerId::Trader(to), Vec::new(), dec!(1)),
                    ))
                    .unwrap();
            }
        })
    };

    let mut negotiation = session.negotiate(seller).unwrap();
    let offer = BundleOffer {
        player_cards: Vec::new(),
        player_cash: dec!(1.00),
        trader_cards: vec![wanted_id],
        trader_cash: Decimal::ZERO,
    };
    let turn = session.propose(&mut negotiation, &offer).unwrap();
    assert_eq!(turn.decision, BundleDecision::Accept);
    assert!(turn.trade.is_some());
    assert_eq!(shared.cash(OwnerId::Player).unwrap(), dec!(999));
    assert!(shared.snapshot(OwnerId::Player).unwrap().contains(wanted_id));
    session.buy_supplies(SupplyKind::Sleeve, 10, dec!(2)).unwrap();

    dealer.join().unwrap();
    session.unshare().unwrap();

    // Two hundred swaps bring the card and the dollars back where they began.
    assert!(session.state.traders[2].inventory.contains(churned_id));
    assert_eq!(session.state.traders[2].cash, dec!(50));
    assert_eq!(session.state.traders[3].cash, dec!(50));
    assert_eq!(all_instance_ids(&session.state), cards_before);
    assert_eq!(total_cash(&session.state), cash_before - dec!(2));
    assert_eq!(session.state.trader(seller).unwrap().cash, seller_cash + dec!(1));
    assert_eq!(session.state.player.cash, dec!(997));
}
