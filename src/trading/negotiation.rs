//! Player-initiated bundle trades.
//!
//! A bundle moves cards and cash in both directions. `evaluate_bundle` is
//! the pure decision; `Negotiation` wraps it in a per-trader session that
//! counts rounds, remembers the last counter and settles accepted deals.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info};
use uuid::Uuid;

use super::messages::{self, Outcome};
use super::{TradeKind, TradeRecord, Trader};
use crate::catalog::Catalog;
use crate::inventory::shared::SharedCollections;
use crate::inventory::{self, Exchange, Side};
use crate::random::RandomSource;
use crate::state::GameState;
use crate::types::{CardDefinition, CardId, GameError, InstanceId, Money, OwnerId, TraderId};
use crate::valuation;

/// Reputation at or above which a trader is more lenient.
pub const FRIENDLY_REPUTATION: u32 = 75;
/// Reputation at or below which a trader is stricter.
pub const HOSTILE_REPUTATION: u32 = 25;

/// Largest value gap (as a fraction of the trader's side) that still gets
/// a counter-offer instead of a flat rejection.
const COUNTER_WINDOW: Decimal = dec!(0.3);
/// Share of the value gap a counter-offer asks for.
const COUNTER_SHARE: Decimal = dec!(0.8);

// ---------------------------------------------------------------------------
// Offer and decision types
// ---------------------------------------------------------------------------

/// Cards and cash on each side of a proposed trade.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleOffer {
    /// Player instances handed to the trader.
    pub player_cards: Vec<InstanceId>,
    pub player_cash: Money,
    /// Trader instances the player asks for.
    pub trader_cards: Vec<InstanceId>,
    pub trader_cash: Money,
}

impl BundleOffer {
    /// Negative cash amounts are treated as zero.
    fn sanitized(&self) -> BundleOffer {
        BundleOffer {
            player_cards: self.player_cards.clone(),
            player_cash: self.player_cash.max(Decimal::ZERO),
            trader_cards: self.trader_cards.clone(),
            trader_cash: self.trader_cash.max(Decimal::ZERO),
        }
    }

    fn is_empty(&self) -> bool {
        self.player_cards.is_empty()
            && self.trader_cards.is_empty()
            && self.player_cash.is_zero()
            && self.trader_cash.is_zero()
    }
}

/// Both sides of a bundle priced at market value.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleValuation {
    /// Player cash plus the market value of the player's cards.
    pub player_value: Money,
    /// Trader cash plus the market value of the trader's cards.
    pub trader_value: Money,
    /// `(trader_value - player_value) / trader_value`; zero when the
    /// trader gives nothing.
    pub diff_percent: Decimal,
    pub threshold: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BundleDecision {
    Accept,
    /// The trader wants this much more cash from the player.
    Counter { additional_cash: Money },
    Reject,
    /// The personality's round cap was reached.
    RoundsExhausted,
}

impl BundleDecision {
    fn outcome(&self) -> Outcome {
        match self {
            BundleDecision::Accept => Outcome::Accept,
            BundleDecision::Counter { additional_cash } => Outcome::Counter(*additional_cash),
            BundleDecision::Reject | BundleDecision::RoundsExhausted => Outcome::Reject,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Fraction of its side's value the trader insists on receiving, after
/// reputation and special-interest adjustments.
pub fn acceptance_threshold(trader: &Trader, offered: &[&CardDefinition]) -> Decimal {
    let mut threshold = trader.params().counter_threshold;

    if trader.reputation >= FRIENDLY_REPUTATION {
        threshold -= dec!(0.05);
    } else if trader.reputation <= HOSTILE_REPUTATION {
        threshold += dec!(0.05);
    }

    for card in offered {
        if trader.interests.wants_card(card) {
            threshold -= dec!(0.10);
        }
        if trader.interests.wants_set(card) {
            threshold -= dec!(0.05);
        }
    }
    threshold
}

/// Accept, counter or reject a priced bundle.
pub fn evaluate_bundle(valuation: &BundleValuation) -> BundleDecision {
    if valuation.trader_value <= Decimal::ZERO {
        return BundleDecision::Accept;
    }
    if valuation.diff_percent <= Decimal::ONE - valuation.threshold {
        return BundleDecision::Accept;
    }
    if valuation.diff_percent <= COUNTER_WINDOW {
        let gap = valuation.trader_value - valuation.player_value;
        return BundleDecision::Counter {
            additional_cash: (gap * COUNTER_SHARE).round_dp(2),
        };
    }
    BundleDecision::Reject
}

/// Check that the offer can be executed as-is and price both sides.
///
/// Nothing is mutated. Errors, in order: unknown trader, empty offer,
/// repeated instance, instance missing from its owner, player short of
/// cash, trader short of cash.
pub fn value_bundle(
    state: &GameState,
    catalog: &Catalog,
    trader_id: TraderId,
    offer: &BundleOffer,
) -> Result<BundleValuation, GameError> {
    let trader = state.trader(trader_id)?;
    if offer.is_empty() {
        return Err(GameError::EmptySelection("trade offer".into()));
    }
    let mut seen = HashSet::new();
    for id in offer.player_cards.iter().chain(offer.trader_cards.iter()) {
        if !seen.insert(*id) {
            return Err(GameError::DuplicateInstance(*id));
        }
    }

    let mut player_value = offer.player_cash;
    let mut offered_defs = Vec::with_capacity(offer.player_cards.len());
    for id in &offer.player_cards {
        let instance = state.player.collection.get(*id).ok_or(GameError::InstanceNotFound {
            owner: OwnerId::Player,
            instance: *id,
        })?;
        let card = catalog.require_card(&instance.card_id)?;
        player_value += valuation::market_value(card, instance, &state.market.modifiers);
        offered_defs.push(card);
    }

    let mut trader_value = offer.trader_cash;
    for id in &offer.trader_cards {
        let instance = trader.inventory.get(*id).ok_or(GameError::InstanceNotFound {
            owner: OwnerId::Trader(trader_id),
            instance: *id,
        })?;
        let card = catalog.require_card(&instance.card_id)?;
        trader_value += valuation::market_value(card, instance, &state.market.modifiers);
    }

    if offer.player_cash > state.player.cash {
        return Err(GameError::InsufficientFunds {
            needed: offer.player_cash,
            available: state.player.cash,
        });
    }
    if offer.trader_cash > trader.cash {
        return Err(GameError::CounterpartyCannotAfford {
            trader: trader.name.clone(),
            needed: offer.trader_cash,
            available: trader.cash,
        });
    }

    let diff_percent = if trader_value > Decimal::ZERO {
        (trader_value - player_value) / trader_value
    } else {
        Decimal::ZERO
    };

    Ok(BundleValuation {
        player_value,
        trader_value,
        diff_percent,
        threshold: acceptance_threshold(trader, &offered_defs),
    })
}

// ---------------------------------------------------------------------------
// Settlement
// ---------------------------------------------------------------------------

/// Execute a bundle: cards and cash move both ways, then the trader's
/// reputation reacts to the balance of the deal.
pub fn settle(
    state: &mut GameState,
    catalog: &Catalog,
    trader_id: TraderId,
    offer: &BundleOffer,
) -> Result<TradeRecord, GameError> {
    settle_on(state, catalog, None, trader_id, offer)
}

/// `settle`, with the cards and cash moving through `shared` when the
/// accounts are shared with other threads.
pub fn settle_on(
    state: &mut GameState,
    catalog: &Catalog,
    shared: Option<&SharedCollections>,
    trader_id: TraderId,
    offer: &BundleOffer,
) -> Result<TradeRecord, GameError> {
    let offer = offer.sanitized();
    let priced = value_bundle(state, catalog, trader_id, &offer)?;

    let cards_given = card_ids(state, OwnerId::Player, &offer.player_cards)?;
    let cards_received = card_ids(state, OwnerId::Trader(trader_id), &offer.trader_cards)?;

    let exchange = Exchange::new(
        Side::new(OwnerId::Player, offer.player_cards.clone(), offer.player_cash),
        Side::new(OwnerId::Trader(trader_id), offer.trader_cards.clone(), offer.trader_cash),
    );
    inventory::shared::execute(state, shared, &exchange)?;
    state.stats.cash_spent += offer.player_cash;
    state.stats.cash_earned += offer.trader_cash;

    let today = state.today();
    let trader = state.trader_mut(trader_id)?;

    let value_given = priced.player_value;
    let value_received = priced.trader_value;
    if let Some(delta) = reputation_shift(value_given, value_received) {
        trader.adjust_reputation(delta);
    }

    let record = TradeRecord {
        id: Uuid::new_v4(),
        date: today,
        trader: trader_id,
        trader_name: trader.name.clone(),
        kind: TradeKind::Bundle,
        cards_given,
        cards_received,
        cash_given: offer.player_cash,
        cash_received: offer.trader_cash,
        value_given,
        value_received,
    };
    trader.history.push(record.clone());
    let reputation = trader.reputation;

    state.trade_log.push(record.clone());
    state.stats.trades_completed += 1;

    info!(
        trader = %record.trader_name,
        given = record.cards_given.len(),
        received = record.cards_received.len(),
        value_given = format!("${:.2}", value_given),
        value_received = format!("${:.2}", value_received),
        reputation,
        "Trade completed"
    );
    Ok(record)
}

/// +5 when the player gave over 120% of what they got, -5 under 80%.
fn reputation_shift(value_given: Money, value_received: Money) -> Option<i32> {
    if value_received <= Decimal::ZERO {
        return if value_given > Decimal::ZERO { Some(5) } else { None };
    }
    let ratio = value_given / value_received;
    if ratio > dec!(1.2) {
        Some(5)
    } else if ratio < dec!(0.8) {
        Some(-5)
    } else {
        None
    }
}

fn card_ids(state: &GameState, owner: OwnerId, ids: &[InstanceId]) -> Result<Vec<CardId>, GameError> {
    let inventory = inventory::InventoryStore::inventory(state, owner)?;
    ids.iter()
        .map(|id| {
            inventory
                .get(*id)
                .map(|i| i.card_id.clone())
                .ok_or(GameError::InstanceNotFound { owner, instance: *id })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// What the trader said to one proposal.
#[derive(Debug, Clone)]
pub struct NegotiationTurn {
    pub round: u32,
    pub decision: BundleDecision,
    pub valuation: BundleValuation,
    pub message: String,
    /// Set when the proposal was accepted and settled.
    pub trade: Option<TradeRecord>,
}

/// The trader's last counter: the proposal as made, the extra cash asked
/// for, and the prices it was based on.
#[derive(Debug, Clone)]
struct PendingCounter {
    offer: BundleOffer,
    extra: Money,
    valuation: BundleValuation,
}

/// A negotiation with one trader. Abandoning it is simply dropping it.
#[derive(Debug, Clone)]
pub struct Negotiation {
    trader: TraderId,
    round: u32,
    enforce_round_cap: bool,
    pending_counter: Option<PendingCounter>,
    closed: bool,
}

impl Negotiation {
    pub fn open(trader: TraderId, enforce_round_cap: bool) -> Self {
        Self {
            trader,
            round: 0,
            enforce_round_cap,
            pending_counter: None,
            closed: false,
        }
    }

    pub fn trader(&self) -> TraderId {
        self.trader
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The counter-offer currently on the table, if any.
    pub fn pending_counter(&self) -> Option<Money> {
        self.pending_counter.as_ref().map(|p| p.extra)
    }

    /// Put an offer to the trader. An accepted offer settles at once and
    /// closes the session.
    pub fn propose(
        &mut self,
        state: &mut GameState,
        catalog: &Catalog,
        offer: &BundleOffer,
        rng: &mut dyn RandomSource,
    ) -> Result<NegotiationTurn, GameError> {
        self.propose_on(state, catalog, None, offer, rng)
    }

    /// `propose`, settling through `shared` when the accounts are shared.
    pub fn propose_on(
        &mut self,
        state: &mut GameState,
        catalog: &Catalog,
        shared: Option<&SharedCollections>,
        offer: &BundleOffer,
        rng: &mut dyn RandomSource,
    ) -> Result<NegotiationTurn, GameError> {
        if self.closed {
            return Err(GameError::NegotiationClosed(self.describe(state)));
        }
        let offer = offer.sanitized();
        let valuation = value_bundle(state, catalog, self.trader, &offer)?;
        let trader = state.trader(self.trader)?;
        let personality = trader.personality;
        let max_rounds = trader.params().max_rounds;

        self.round += 1;
        self.pending_counter = None;

        let decision = if self.enforce_round_cap && self.round > max_rounds {
            self.closed = true;
            BundleDecision::RoundsExhausted
        } else {
            evaluate_bundle(&valuation)
        };
        let message = messages::line_for(personality, decision.outcome(), rng);

        debug!(
            trader = %trader.name,
            round = self.round,
            player_value = %valuation.player_value,
            trader_value = %valuation.trader_value,
            threshold = %valuation.threshold,
            decision = ?decision,
            "Bundle evaluated"
        );

        let trade = match &decision {
            BundleDecision::Accept => {
                self.closed = true;
                Some(settle_on(state, catalog, shared, self.trader, &offer)?)
            }
            BundleDecision::Counter { additional_cash } => {
                self.pending_counter = Some(PendingCounter {
                    offer,
                    extra: *additional_cash,
                    valuation: valuation.clone(),
                });
                None
            }
            BundleDecision::Reject | BundleDecision::RoundsExhausted => None,
        };

        Ok(NegotiationTurn {
            round: self.round,
            decision,
            valuation,
            message,
            trade,
        })
    }

    /// Take the trader's last counter: the countered offer plus the extra
    /// cash it asked for.
    ///
    /// The bundle is priced again first. If either side's value moved since
    /// the counter was made, the trader withdraws it and nothing settles.
    pub fn accept_counter(
        &mut self,
        state: &mut GameState,
        catalog: &Catalog,
    ) -> Result<TradeRecord, GameError> {
        self.accept_counter_on(state, catalog, None)
    }

    /// `accept_counter`, settling through `shared` when the accounts are
    /// shared.
    pub fn accept_counter_on(
        &mut self,
        state: &mut GameState,
        catalog: &Catalog,
        shared: Option<&SharedCollections>,
    ) -> Result<TradeRecord, GameError> {
        if self.closed {
            return Err(GameError::NegotiationClosed(self.describe(state)));
        }
        let Some(pending) = self.pending_counter.clone() else {
            return Err(GameError::NegotiationClosed(format!(
                "{} (no counter-offer on the table)",
                self.describe(state)
            )));
        };

        let current = value_bundle(state, catalog, self.trader, &pending.offer)?;
        if current.player_value != pending.valuation.player_value
            || current.trader_value != pending.valuation.trader_value
        {
            self.pending_counter = None;
            info!(
                trader = %self.describe(state),
                was = format!("${:.2}", pending.valuation.trader_value),
                now = format!("${:.2}", current.trader_value),
                "Counter-offer withdrawn after a price change"
            );
            return Err(GameError::CounterWithdrawn(self.describe(state)));
        }

        let mut offer = pending.offer;
        offer.player_cash += pending.extra;
        let record = settle_on(state, catalog, shared, self.trader, &offer)?;
        self.pending_counter = None;
        self.closed = true;
        Ok(record)
    }

    fn describe(&self, state: &GameState) -> String {
        match state.trader(self.trader) {
            Ok(t) => t.name.clone(),
            Err(_) => OwnerId::Trader(self.trader).to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
