//! AI traders and the trade protocol.
//!
//! - `personality`: fixed trader archetypes and their parameters
//! - `offers`: perceived value, interest gate and AI-initiated card offers
//! - `negotiation`: player-initiated bundle offers and multi-round sessions
//! - `messages`: dialogue lines, kept apart from every decision

pub mod messages;
pub mod negotiation;
pub mod offers;
pub mod personality;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::inventory::Inventory;
use crate::random::RandomSource;
use crate::types::{
    CardDefinition, CardId, CardInstance, Condition, GameDate, Money, Protection, SetId, TraderId,
};
use crate::valuation;

use self::personality::{NegotiationParams, Personality};

pub const MAX_REPUTATION: u32 = 100;
pub const STARTING_REPUTATION: u32 = 50;

const TRADER_NAMES: &[&str] = &[
    "Alex Morgan",
    "Jordan Chen",
    "Taylor Kim",
    "Casey Smith",
    "Morgan Riley",
    "Jamie Wong",
    "Quinn Johnson",
    "Avery Davis",
    "Riley Thompson",
    "Cameron Lee",
    "Jordan Taylor",
    "Casey Morgan",
];

// ---------------------------------------------------------------------------
// Trader
// ---------------------------------------------------------------------------

/// Specific cards and sets a trader pays extra for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpecialInterests {
    pub cards: BTreeSet<CardId>,
    pub sets: BTreeSet<SetId>,
}

impl SpecialInterests {
    pub fn wants_card(&self, card: &CardDefinition) -> bool {
        self.cards.contains(&card.id)
    }

    pub fn wants_set(&self, card: &CardDefinition) -> bool {
        self.sets.contains(&card.set)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TradeKind {
    /// Player-initiated bundle of cards and cash.
    Bundle,
    /// Trader bought a single card for cash.
    Sale,
}

/// One completed trade, seen from the player's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,
    pub date: GameDate,
    pub trader: TraderId,
    pub trader_name: String,
    pub kind: TradeKind,
    pub cards_given: Vec<CardId>,
    pub cards_received: Vec<CardId>,
    /// Cash paid by the player.
    pub cash_given: Money,
    /// Cash paid by the trader.
    pub cash_received: Money,
    /// Market value of everything the player handed over.
    pub value_given: Money,
    /// Market value of everything the player got.
    pub value_received: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trader {
    pub id: TraderId,
    pub name: String,
    pub personality: Personality,
    pub cash: Money,
    /// 0-100.
    pub reputation: u32,
    pub inventory: Inventory,
    pub interests: SpecialInterests,
    #[serde(default)]
    pub history: Vec<TradeRecord>,
}

impl Trader {
    pub fn new(id: TraderId, name: &str, personality: Personality, cash: Money) -> Self {
        Self {
            id,
            name: name.to_string(),
            personality,
            cash,
            reputation: STARTING_REPUTATION,
            inventory: Inventory::new(),
            interests: SpecialInterests::default(),
            history: Vec::new(),
        }
    }

    pub fn params(&self) -> NegotiationParams {
        self.personality.negotiation()
    }

    /// Shift reputation by `delta`, clamped to 0..=100.
    pub fn adjust_reputation(&mut self, delta: i32) {
        let next = (self.reputation as i64 + delta as i64).clamp(0, MAX_REPUTATION as i64);
        self.reputation = next as u32;
    }
}

// ---------------------------------------------------------------------------
// Roster generation
// ---------------------------------------------------------------------------

/// Roster shape.
#[derive(Debug, Clone)]
pub struct RosterConfig {
    pub trader_count: usize,
    pub inventory_size: usize,
    pub min_cash: Money,
    pub max_cash: Money,
    /// Probability that a stocked card arrives already graded (6-10).
    pub graded_chance: f64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            trader_count: 8,
            inventory_size: 20,
            min_cash: dec!(100),
            max_cash: dec!(1000),
            graded_chance: 0.2,
        }
    }
}

/// Build the session's trader roster: one trader per personality, then
/// random personalities until `trader_count` is reached.
pub fn generate_roster(
    catalog: &Catalog,
    config: &RosterConfig,
    today: GameDate,
    rng: &mut dyn RandomSource,
) -> Vec<Trader> {
    let mut traders = Vec::with_capacity(config.trader_count);
    for i in 0..config.trader_count {
        let personality = match Personality::ALL.get(i) {
            Some(p) => *p,
            None => Personality::ALL[rng.pick_index(Personality::ALL.len())],
        };
        let name = match TRADER_NAMES.get(i) {
            Some(n) => n.to_string(),
            None => format!("Trader {}", i + 1),
        };
        let cash = random_cash(config, rng);
        let mut trader = Trader::new(i as TraderId, &name, personality, cash);
        trader.interests = generate_interests(catalog, rng);
        stock_inventory(&mut trader, catalog, config, today, rng);

        info!(
            trader = %trader.name,
            personality = %personality,
            cash = format!("${:.2}", trader.cash),
            cards = trader.inventory.count_all(),
            "Trader joined the market"
        );
        traders.push(trader);
    }
    traders
}

fn random_cash(config: &RosterConfig, rng: &mut dyn RandomSource) -> Money {
    let span = config.max_cash - config.min_cash;
    let frac = Decimal::from_f64_retain(rng.next_f64()).unwrap_or(Decimal::ZERO);
    (config.min_cash + span * frac).round_dp(2)
}

/// 1-5 card interests and 1-2 set interests, duplicates collapsed.
pub fn generate_interests(catalog: &Catalog, rng: &mut dyn RandomSource) -> SpecialInterests {
    let mut interests = SpecialInterests::default();
    let card_count = rng.range_inclusive(1, 5);
    for _ in 0..card_count {
        if let Some(card) = catalog.random_card(rng) {
            interests.cards.insert(card.id.clone());
        }
    }
    let set_count = rng.range_inclusive(1, 2);
    for _ in 0..set_count {
        if let Some(set) = catalog.random_set(rng) {
            interests.sets.insert(set.id.clone());
        }
    }
    interests
}

fn stock_inventory(
    trader: &mut Trader,
    catalog: &Catalog,
    config: &RosterConfig,
    today: GameDate,
    rng: &mut dyn RandomSource,
) {
    let profile = trader.personality.stock_profile();
    for _ in 0..config.inventory_size {
        let Some(card) = catalog.random_card(rng) else { return };
        let condition = weighted_condition(&profile.condition_weights, rng);
        let mut instance = CardInstance::new(&card.id, condition, today, valuation::roll_base(rng));
        instance.protection = Protection {
            sleeved: rng.chance(profile.sleeve_chance),
            toploadered: rng.chance(profile.toploader_chance),
        };
        if rng.chance(config.graded_chance) {
            instance.grade = Some(rng.range_inclusive(6, 10) as u8);
        }
        trader.inventory.insert(instance);
    }
}

fn weighted_condition(weights: &[f64; 6], rng: &mut dyn RandomSource) -> Condition {
    let r = rng.next_f64();
    let mut cumulative = 0.0;
    for (condition, weight) in Condition::ALL.iter().zip(weights.iter()) {
        cumulative += weight;
        if r < cumulative {
            return *condition;
        }
    }
    Condition::Mint
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
