//! Trader-side valuation and AI-initiated single-card offers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};
use uuid::Uuid;

use super::messages::{self, Outcome};
use super::personality::Personality;
use super::{TradeKind, TradeRecord, Trader};
use crate::catalog::Catalog;
use crate::inventory::shared::SharedCollections;
use crate::inventory::{self, Exchange, Side};
use crate::random::RandomSource;
use crate::state::GameState;
use crate::types::{CardDefinition, CardId, CardInstance, GameError, InstanceId, Money, OwnerId, TraderId};
use crate::valuation;

/// A trader holding this many copies stops buying more, unless it is a
/// Collector.
pub const COPY_LIMIT: usize = 3;

/// Share of its cash a trader will commit to a single card.
const CASH_SHARE: Decimal = dec!(0.8);

// ---------------------------------------------------------------------------
// Perceived value
// ---------------------------------------------------------------------------

/// What `trader` thinks a card is worth, given its market value.
pub fn perceived_value(
    trader: &Trader,
    card: &CardDefinition,
    instance: &CardInstance,
    market_value: Money,
) -> Money {
    let interests = trader.personality.interests();
    let mut adjustment = Decimal::ZERO;

    if card.rarity.is_high() {
        adjustment += interests.high_rarity;
    }
    adjustment += trader.personality.condition_adjustment(instance.condition);
    if trader.interests.wants_card(card) {
        adjustment += dec!(0.5);
    }
    if trader.interests.wants_set(card) {
        adjustment += dec!(0.3);
    }
    if let Some(grade) = instance.grade {
        adjustment += dec!(0.1) * Decimal::from(grade);
    }
    if instance.protection.sleeved {
        adjustment += dec!(0.05);
    }
    if instance.protection.toploadered {
        adjustment += dec!(0.10);
    }

    (market_value * (Decimal::ONE + adjustment)).round_dp(2)
}

/// Probability that `trader` wants to buy the card, or `None` when it is
/// ruled out (too many copies, or too expensive).
pub fn interest_chance(
    trader: &Trader,
    card: &CardDefinition,
    instance: &CardInstance,
    market_value: Money,
) -> Option<f64> {
    if trader.inventory.count_of(&card.id) >= COPY_LIMIT
        && trader.personality != Personality::Collector
    {
        return None;
    }
    if perceived_value(trader, card, instance, market_value) > trader.cash * CASH_SHARE {
        return None;
    }

    let mut chance = 0.3 + trader.personality.rarity_interest(card.rarity);
    if trader.interests.wants_card(card) {
        chance += 0.5;
    }
    if trader.interests.wants_set(card) {
        chance += 0.3;
    }
    Some(chance.min(0.9))
}

pub fn is_interested_in(
    trader: &Trader,
    card: &CardDefinition,
    instance: &CardInstance,
    market_value: Money,
    rng: &mut dyn RandomSource,
) -> bool {
    match interest_chance(trader, card, instance, market_value) {
        Some(p) => rng.chance(p),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// AI offers
// ---------------------------------------------------------------------------

/// A trader's cash offer for one of the player's cards.
#[derive(Debug, Clone, PartialEq)]
pub struct AiOffer {
    pub trader: TraderId,
    pub instance: InstanceId,
    pub card_id: CardId,
    pub amount: Money,
    pub perceived: Money,
    pub market_value: Money,
    pub message: String,
}

/// Trader reply to a player's counter-price.
#[derive(Debug, Clone, PartialEq)]
pub enum CounterResponse {
    Accept { price: Money },
    /// The trader raises its offer to `price`.
    Reoffer { price: Money },
    Reject,
}

pub fn generate_offer(
    trader: &Trader,
    card: &CardDefinition,
    instance: &CardInstance,
    market_value: Money,
    rng: &mut dyn RandomSource,
) -> Option<AiOffer> {
    if !is_interested_in(trader, card, instance, market_value, rng) {
        return None;
    }
    let perceived = perceived_value(trader, card, instance, market_value);
    let amount = (perceived * trader.params().initial_offer).round_dp(2);
    Some(AiOffer {
        trader: trader.id,
        instance: instance.id,
        card_id: card.id.clone(),
        amount,
        perceived,
        market_value,
        message: messages::line_for(trader.personality, Outcome::Offer(amount), rng),
    })
}

/// Judge the player's counter-price to `offer`.
pub fn evaluate_counter(trader: &Trader, offer: &AiOffer, counter: Money) -> CounterResponse {
    let perceived = offer.perceived;
    let threshold = trader.params().counter_threshold;

    if counter <= perceived * (dec!(2) - threshold) {
        return CounterResponse::Accept { price: counter };
    }
    if perceived <= Decimal::ZERO {
        return CounterResponse::Reject;
    }
    let diff = (counter - offer.amount) / perceived;
    if diff < dec!(0.3) {
        let price = (offer.amount * (Decimal::ONE + diff / dec!(2))).round_dp(2);
        return CounterResponse::Reoffer { price };
    }
    CounterResponse::Reject
}

/// Let every trader look at one random card of the player's and offer on
/// it if interested.
pub fn solicit_offers(
    state: &GameState,
    catalog: &Catalog,
    rng: &mut dyn RandomSource,
) -> Vec<AiOffer> {
    let owned: Vec<&CardInstance> = state.player.collection.instances().collect();
    if owned.is_empty() {
        return Vec::new();
    }

    let mut offers = Vec::new();
    for trader in &state.traders {
        let instance = owned[rng.pick_index(owned.len())];
        let Some(card) = catalog.card(&instance.card_id) else { continue };
        let value = valuation::market_value(card, instance, &state.market.modifiers);
        if let Some(offer) = generate_offer(trader, card, instance, value, rng) {
            debug!(trader = %trader.name, card = %card.id, amount = %offer.amount, "Offer made");
            offers.push(offer);
        }
    }
    offers
}

/// Sell a player card to a trader for `price`.
///
/// Card and cash move together; the trader's reputation rises when the
/// price is more than 20% under market value and falls when more than 20%
/// over.
pub fn complete_sale(
    state: &mut GameState,
    catalog: &Catalog,
    trader_id: TraderId,
    instance_id: InstanceId,
    price: Money,
) -> Result<TradeRecord, GameError> {
    complete_sale_on(state, catalog, None, trader_id, instance_id, price)
}

/// `complete_sale`, moving the card and cash through `shared` when the
/// accounts are shared with other threads.
pub fn complete_sale_on(
    state: &mut GameState,
    catalog: &Catalog,
    shared: Option<&SharedCollections>,
    trader_id: TraderId,
    instance_id: InstanceId,
    price: Money,
) -> Result<TradeRecord, GameError> {
    let instance = state
        .player
        .collection
        .get(instance_id)
        .ok_or(GameError::InstanceNotFound {
            owner: OwnerId::Player,
            instance: instance_id,
        })?;
    let card = catalog.require_card(&instance.card_id)?;
    let fair = valuation::market_value(card, instance, &state.market.modifiers);
    let card_id = card.id.clone();

    let trader = state.trader(trader_id)?;
    if trader.cash < price {
        return Err(GameError::CounterpartyCannotAfford {
            trader: trader.name.clone(),
            needed: price,
            available: trader.cash,
        });
    }

    let exchange = Exchange::new(
        Side::new(OwnerId::Player, vec![instance_id], Decimal::ZERO),
        Side::new(OwnerId::Trader(trader_id), Vec::new(), price),
    );
    inventory::shared::execute(state, shared, &exchange)?;
    state.stats.cash_earned += price;

    let today = state.today();
    let trader = state.trader_mut(trader_id)?;
    if fair > Decimal::ZERO {
        let price_diff = (fair - price) / fair;
        if price_diff > dec!(0.2) {
            trader.adjust_reputation(5);
        } else if price_diff < dec!(-0.2) {
            trader.adjust_reputation(-5);
        }
    }

    let record = TradeRecord {
        id: Uuid::new_v4(),
        date: today,
        trader: trader_id,
        trader_name: trader.name.clone(),
        kind: TradeKind::Sale,
        cards_given: vec![card_id.clone()],
        cards_received: Vec::new(),
        cash_given: Decimal::ZERO,
        cash_received: price,
        value_given: fair,
        value_received: price,
    };
    trader.history.push(record.clone());
    let reputation = trader.reputation;
    let trader_name = trader.name.clone();

    state.trade_log.push(record.clone());
    state.stats.trades_completed += 1;

    info!(
        trader = %trader_name,
        card = %card_id,
        price = format!("${:.2}", price),
        market = format!("${:.2}", fair),
        reputation,
        "Card sold"
    );
    Ok(record)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use crate::types::{Condition, GameDate, Protection, Rarity};

    fn trader(personality: Personality, cash: Money) -> Trader {
        Trader::new(1, "Jordan Chen", personality, cash)
    }

    fn ultra() -> CardDefinition {
        CardDefinition::new("GS026", "Solar Phoenix", Rarity::UltraRare, "genesis")
    }

    fn inst(condition: Condition) -> CardInstance {
        CardInstance::new("GS026", condition, GameDate::new(1, 1), dec!(0))
    }

    #[test]
    fn test_perceived_value_stacks_adjustments() {
        let mut t = trader(Personality::Investor, dec!(1000));
        t.interests.sets.insert("genesis".into());
        let mut i = inst(Condition::Mint);
        i.grade = Some(9);
        i.protection = Protection::full();
        // 1 + 0.8 (rarity) + 0.14 (mint) + 0.3 (set) + 0.9 (grade) + 0.15 (protection)
        assert_eq!(perceived_value(&t, &ultra(), &i, dec!(10)), dec!(32.90));
    }

    #[test]
    fn test_interest_gate_copy_limit() {
        let mut t = trader(Personality::Investor, dec!(1000));
        for _ in 0..3 {
            t.inventory.insert(inst(Condition::Good));
        }
        assert!(interest_chance(&t, &ultra(), &inst(Condition::Good), dec!(10)).is_none());

        t.personality = Personality::Collector;
        assert!(interest_chance(&t, &ultra(), &inst(Condition::Good), dec!(10)).is_some());
    }

    #[test]
    fn test_interest_gate_budget() {
        let t = trader(Personality::Casual, dec!(100));
        // Casual perceives an Ultra Rare at 1.3 × value.
        assert!(interest_chance(&t, &ultra(), &inst(Condition::Good), dec!(61)).is_some());
        assert!(interest_chance(&t, &ultra(), &inst(Condition::Good), dec!(62)).is_none());
    }

    #[test]
    fn test_interest_chance_is_capped() {
        let mut t = trader(Personality::Collector, dec!(1000));
        t.interests.cards.insert("GS026".into());
        t.interests.sets.insert("genesis".into());
        assert_eq!(interest_chance(&t, &ultra(), &inst(Condition::Good), dec!(10)), Some(0.9));

        let plain = trader(Personality::Competitive, dec!(1000));
        let chance = interest_chance(&plain, &ultra(), &inst(Condition::Good), dec!(10)).unwrap();
        assert!((chance - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_offer_uses_initial_fraction() {
        let t = trader(Personality::Investor, dec!(1000));
        let mut rng = ScriptedRandom::constant(0.0);
        let offer = generate_offer(&t, &ultra(), &inst(Condition::Good), dec!(10), &mut rng).unwrap();
        // perceived 18.00, investor opens at 80%
        assert_eq!(offer.perceived, dec!(18.00));
        assert_eq!(offer.amount, dec!(14.40));
        assert!(offer.message.contains("$14.40"));
    }

    #[test]
    fn test_counter_responses() {
        let t = trader(Personality::Investor, dec!(1000));
        let offer = AiOffer {
            trader: 1,
            instance: Uuid::nil(),
            card_id: "GS026".into(),
            amount: dec!(80),
            perceived: dec!(100),
            market_value: dec!(50),
            message: String::new(),
        };
        // Acceptable up to 100 × (2 − 0.9) = 110.
        assert_eq!(evaluate_counter(&t, &offer, dec!(110)), CounterResponse::Accept { price: dec!(110) });
        // diff = (120 − 80) / 100 = 0.4 → too far.
        assert_eq!(evaluate_counter(&t, &offer, dec!(120)), CounterResponse::Reject);

        let low = AiOffer { amount: dec!(90), ..offer };
        // diff = (115 − 90) / 100 = 0.25 → 90 × 1.125
        assert_eq!(
            evaluate_counter(&t, &low, dec!(115)),
            CounterResponse::Reoffer { price: dec!(101.25) }
        );
    }

    fn sale_state(trader_cash: Money) -> (Catalog, GameState, InstanceId) {
        let catalog = Catalog::builtin();
        let mut state = GameState::new(dec!(20), 365);
        state.traders.push(trader(Personality::Casual, trader_cash));
        let card = inst(Condition::Mint);
        let id = card.id;
        state.player.collection.insert(card);
        (catalog, state, id)
    }

    #[test]
    fn test_sale_moves_card_and_cash() {
        let (catalog, mut state, id) = sale_state(dec!(50));
        let record = complete_sale(&mut state, &catalog, 1, id, dec!(4.50)).unwrap();
        assert_eq!(record.value_given, dec!(5.00));
        assert_eq!(state.player.cash, dec!(24.50));
        assert_eq!(state.stats.cash_earned, dec!(4.50));
        let t = state.trader(1).unwrap();
        assert_eq!(t.cash, dec!(45.50));
        assert!(t.inventory.contains(id));
        assert_eq!(t.history.len(), 1);
    }

    #[test]
    fn test_shared_sale_and_unaffordable_sale() {
        let (catalog, mut state, id) = sale_state(dec!(4));
        let shared = SharedCollections::from_state(&state);

        let err = complete_sale_on(&mut state, &catalog, Some(&shared), 1, id, dec!(4.50)).unwrap_err();
        assert!(matches!(err, GameError::CounterpartyCannotAfford { .. }));
        assert_eq!(shared.cash(OwnerId::Trader(1)).unwrap(), dec!(4));
        assert!(shared.snapshot(OwnerId::Player).unwrap().contains(id));

        complete_sale_on(&mut state, &catalog, Some(&shared), 1, id, dec!(4)).unwrap();
        assert_eq!(shared.cash(OwnerId::Player).unwrap(), dec!(24));
        assert_eq!(shared.cash(OwnerId::Trader(1)).unwrap(), dec!(0));
        assert!(shared.snapshot(OwnerId::Trader(1)).unwrap().contains(id));
        assert_eq!(state.player.cash, dec!(24));
        assert!(state.player.collection.is_empty());
    }
}
