//! Application state.
//!
//! One explicit struct holding everything a session mutates. Engines are
//! stateless and take `&mut GameState`; the catalog is read-only and passed
//! alongside.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::catalog::Catalog;
use crate::grading::GradingLedger;
use crate::inventory::{Exchange, Holding, Inventory, InventoryStore};
use crate::market::MarketState;
use crate::trading::{TradeRecord, Trader};
use crate::types::{CardInstance, GameClock, GameDate, GameError, Money, OwnerId, SetId, TraderId};
use crate::valuation;

/// Protection stock on hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplies {
    pub sleeves: u32,
    pub toploaders: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub cash: Money,
    pub collection: Inventory,
    /// Unopened packs per set.
    #[serde(default)]
    pub sealed_packs: BTreeMap<SetId, u32>,
    #[serde(default)]
    pub supplies: Supplies,
}

/// Running counters for the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub packs_opened: u32,
    pub cards_acquired: u32,
    pub market_events: u32,
    pub days_played: u32,
    pub cash_spent: Money,
    pub cash_earned: Money,
    pub trades_completed: u32,
    pub cards_graded: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub clock: GameClock,
    pub player: PlayerState,
    pub grading: GradingLedger,
    pub market: MarketState,
    pub traders: Vec<Trader>,
    /// Every completed trade, oldest first.
    #[serde(default)]
    pub trade_log: Vec<TradeRecord>,
    #[serde(default)]
    pub stats: SessionStats,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | cash=${:.2} | cards={} ({} unique) | grading={} | modifiers={} | traders={} | trades={}",
            self.clock.date,
            self.player.cash,
            self.player.collection.count_all(),
            self.player.collection.count_unique(),
            self.grading.pending_count(),
            self.market.modifiers.len(),
            self.traders.len(),
            self.trade_log.len(),
        )
    }
}

impl GameState {
    /// Fresh state on day 1 of year 1 with an empty collection and no
    /// traders.
    pub fn new(starting_cash: Money, days_per_year: u32) -> Self {
        Self {
            clock: GameClock::new(days_per_year),
            player: PlayerState {
                cash: starting_cash,
                collection: Inventory::new(),
                sealed_packs: BTreeMap::new(),
                supplies: Supplies::default(),
            },
            grading: GradingLedger::default(),
            market: MarketState::new(),
            traders: Vec::new(),
            trade_log: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    pub fn today(&self) -> GameDate {
        self.clock.date
    }

    pub fn trader(&self, id: TraderId) -> Result<&Trader, GameError> {
        self.traders
            .iter()
            .find(|t| t.id == id)
            .ok_or(GameError::UnknownTrader(id))
    }

    pub fn trader_mut(&mut self, id: TraderId) -> Result<&mut Trader, GameError> {
        self.traders
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(GameError::UnknownTrader(id))
    }

    /// Debit the player, or fail without touching anything.
    pub fn spend(&mut self, amount: Money) -> Result<(), GameError> {
        if amount <= Decimal::ZERO {
            return Ok(());
        }
        if self.player.cash < amount {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: self.player.cash,
            });
        }
        self.player.cash -= amount;
        self.stats.cash_spent += amount;
        Ok(())
    }

    pub fn earn(&mut self, amount: Money) {
        if amount <= Decimal::ZERO {
            return;
        }
        self.player.cash += amount;
        self.stats.cash_earned += amount;
    }

    /// Market value of the whole collection today. Cards out for grading
    /// are not counted.
    pub fn collection_value(&self, catalog: &Catalog) -> Money {
        self.player
            .collection
            .market_value(catalog, &self.market.modifiers)
    }

    /// The `n` most valuable instances in the collection with their market
    /// value, highest first.
    pub fn top_valued(&self, catalog: &Catalog, n: usize) -> Vec<(&CardInstance, Money)> {
        let mut valued: Vec<_> = self
            .player
            .collection
            .instances()
            .filter_map(|inst| {
                catalog
                    .card(&inst.card_id)
                    .map(|card| (inst, valuation::market_value(card, inst, &self.market.modifiers)))
            })
            .collect();
        valued.sort_by(|a, b| b.1.cmp(&a.1));
        valued.truncate(n);
        valued
    }

    /// Collection instances that are sleeved, toploadered or both.
    pub fn protected_count(&self) -> usize {
        self.player
            .collection
            .instances()
            .filter(|inst| inst.protection.is_protected())
            .count()
    }

    /// `(owned, total)`: distinct cards of `set_id` in the collection and
    /// the number of cards the set prints.
    pub fn set_completion(&self, catalog: &Catalog, set_id: &str) -> Result<(usize, usize), GameError> {
        catalog.require_set(set_id)?;
        let cards = catalog.cards_in_set(set_id);
        let owned = cards
            .iter()
            .filter(|card| self.player.collection.count_of(&card.id) > 0)
            .count();
        Ok((owned, cards.len()))
    }

    pub fn sealed_count(&self, set_id: &str) -> u32 {
        self.player.sealed_packs.get(set_id).copied().unwrap_or(0)
    }

    /// Apply `exchange` between two owners of this state. Nothing changes
    /// unless every card and every cash amount is covered.
    pub fn exchange(&mut self, exchange: &Exchange) -> Result<(), GameError> {
        let (first, second) = exchange.owners();
        let (a, b) = self.holdings(first, second)?;
        exchange.apply(a, b)
    }

    fn holdings(
        &mut self,
        first: OwnerId,
        second: OwnerId,
    ) -> Result<(Holding<'_>, Holding<'_>), GameError> {
        if first == second {
            return Err(GameError::SelfExchange(first));
        }
        let GameState {
            player, traders, ..
        } = self;
        let mut player = Some(player);
        let mut traders: BTreeMap<TraderId, &mut Trader> =
            traders.iter_mut().map(|t| (t.id, t)).collect();
        let a = take_holding(first, &mut player, &mut traders)?;
        let b = take_holding(second, &mut player, &mut traders)?;
        Ok((a, b))
    }
}

fn take_holding<'a>(
    owner: OwnerId,
    player: &mut Option<&'a mut PlayerState>,
    traders: &mut BTreeMap<TraderId, &'a mut Trader>,
) -> Result<Holding<'a>, GameError> {
    match owner {
        OwnerId::Player => player
            .take()
            .map(|p| Holding {
                inventory: &mut p.collection,
                cash: &mut p.cash,
            })
            .ok_or(GameError::SelfExchange(owner)),
        OwnerId::Trader(id) => traders
            .remove(&id)
            .map(|t| Holding {
                inventory: &mut t.inventory,
                cash: &mut t.cash,
            })
            .ok_or(GameError::UnknownTrader(id)),
    }
}

impl InventoryStore for GameState {
    fn inventory(&self, owner: OwnerId) -> Result<&Inventory, GameError> {
        match owner {
            OwnerId::Player => Ok(&self.player.collection),
            OwnerId::Trader(id) => Ok(&self.trader(id)?.inventory),
        }
    }

    fn inventory_mut(&mut self, owner: OwnerId) -> Result<&mut Inventory, GameError> {
        match owner {
            OwnerId::Player => Ok(&mut self.player.collection),
            OwnerId::Trader(id) => Ok(&mut self.trader_mut(id)?.inventory),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
