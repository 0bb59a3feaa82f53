//! Collection / inventory store.
//!
//! Each owner (the player or a trader) has one `Inventory` mapping card id
//! to the physical instances held. Every instance lives in exactly one
//! inventory; `transfer` moves it without ever leaving it in neither or
//! both.

pub mod shared;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::catalog::Catalog;
use crate::market::MarketModifier;
use crate::random::RandomSource;
use crate::types::{
    CardDefinition, CardId, CardInstance, Condition, GameDate, GameError, InstanceId, Money,
    OwnerId,
};
use crate::valuation;

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    cards: BTreeMap<CardId, Vec<CardInstance>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, instance: CardInstance) {
        self.cards
            .entry(instance.card_id.clone())
            .or_default()
            .push(instance);
    }

    pub fn remove(&mut self, id: InstanceId) -> Option<CardInstance> {
        let card_id = self.get(id)?.card_id.clone();
        let list = self.cards.get_mut(&card_id)?;
        let pos = list.iter().position(|i| i.id == id)?;
        let instance = list.remove(pos);
        if list.is_empty() {
            self.cards.remove(&card_id);
        }
        Some(instance)
    }

    pub fn get(&self, id: InstanceId) -> Option<&CardInstance> {
        self.instances().find(|i| i.id == id)
    }

    pub fn get_mut(&mut self, id: InstanceId) -> Option<&mut CardInstance> {
        self.cards.values_mut().flatten().find(|i| i.id == id)
    }

    pub fn contains(&self, id: InstanceId) -> bool {
        self.get(id).is_some()
    }

    pub fn instances(&self) -> impl Iterator<Item = &CardInstance> {
        self.cards.values().flatten()
    }

    pub fn instances_of(&self, card_id: &str) -> &[CardInstance] {
        self.cards.get(card_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn card_ids(&self) -> impl Iterator<Item = &CardId> {
        self.cards.keys()
    }

    /// Total physical cards held.
    pub fn count_all(&self) -> usize {
        self.cards.values().map(Vec::len).sum()
    }

    /// Distinct card definitions held.
    pub fn count_unique(&self) -> usize {
        self.cards.len()
    }

    pub fn count_of(&self, card_id: &str) -> usize {
        self.instances_of(card_id).len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Summed market value of every instance under `modifiers`. Cards the
    /// catalog does not know are worth nothing.
    pub fn market_value(&self, catalog: &Catalog, modifiers: &[MarketModifier]) -> Money {
        self.instances()
            .filter_map(|inst| {
                catalog
                    .card(&inst.card_id)
                    .map(|card| valuation::market_value(card, inst, modifiers))
            })
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Owner-level operations
// ---------------------------------------------------------------------------

/// Anything that can hand out the inventory of an owner.
pub trait InventoryStore {
    fn inventory(&self, owner: OwnerId) -> Result<&Inventory, GameError>;
    fn inventory_mut(&mut self, owner: OwnerId) -> Result<&mut Inventory, GameError>;
}

/// Condition a freshly acquired card arrives in.
pub fn acquisition_condition(rng: &mut dyn RandomSource) -> Condition {
    let r = rng.next_f64();
    if r < 0.20 {
        Condition::Mint
    } else if r < 0.70 {
        Condition::NearMint
    } else if r < 0.90 {
        Condition::Excellent
    } else if r < 0.98 {
        Condition::Good
    } else {
        Condition::Poor
    }
}

/// A fresh instance of `card`: condition first, then the base-value roll.
pub fn mint(card: &CardDefinition, acquired: GameDate, rng: &mut dyn RandomSource) -> CardInstance {
    let condition = acquisition_condition(rng);
    CardInstance::new(&card.id, condition, acquired, valuation::roll_base(rng))
}

/// Mint a new instance of `card` and give it to `owner`.
pub fn add(
    store: &mut dyn InventoryStore,
    owner: OwnerId,
    card: &CardDefinition,
    acquired: GameDate,
    rng: &mut dyn RandomSource,
) -> Result<CardInstance, GameError> {
    let inventory = store.inventory_mut(owner)?;
    let instance = mint(card, acquired, rng);
    inventory.insert(instance.clone());
    debug!(owner = %owner, card = %card.id, condition = %instance.condition, "Card added");
    Ok(instance)
}

pub fn remove(
    store: &mut dyn InventoryStore,
    owner: OwnerId,
    instance: InstanceId,
) -> Result<CardInstance, GameError> {
    store
        .inventory_mut(owner)?
        .remove(instance)
        .ok_or(GameError::InstanceNotFound { owner, instance })
}

/// Move one instance from `from` to `to`.
pub fn transfer(
    store: &mut dyn InventoryStore,
    from: OwnerId,
    to: OwnerId,
    instance: InstanceId,
) -> Result<(), GameError> {
    // Both sides must exist and hold the card before anything moves.
    store.inventory(to)?;
    if !store.inventory(from)?.contains(instance) {
        return Err(GameError::InstanceNotFound {
            owner: from,
            instance,
        });
    }
    if from == to {
        return Ok(());
    }
    let card = remove(store, from, instance)?;
    store.inventory_mut(to)?.insert(card);
    debug!(from = %from, to = %to, instance = %instance, "Card transferred");
    Ok(())
}

pub fn count_all(store: &dyn InventoryStore, owner: OwnerId) -> Result<usize, GameError> {
    Ok(store.inventory(owner)?.count_all())
}

pub fn count_unique(store: &dyn InventoryStore, owner: OwnerId) -> Result<usize, GameError> {
    Ok(store.inventory(owner)?.count_unique())
}

// ---------------------------------------------------------------------------
// Exchanges
// ---------------------------------------------------------------------------

/// What one owner hands over in an exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Side {
    pub owner: OwnerId,
    pub cards: Vec<InstanceId>,
    pub cash: Money,
}

impl Side {
    pub fn new(owner: OwnerId, cards: Vec<InstanceId>, cash: Money) -> Self {
        Self { owner, cards, cash }
    }

    fn check(&self, holding: &Holding<'_>) -> Result<(), GameError> {
        for &instance in &self.cards {
            if !holding.inventory.contains(instance) {
                return Err(GameError::InstanceNotFound {
                    owner: self.owner,
                    instance,
                });
            }
        }
        if self.cash > *holding.cash {
            return Err(short_of_cash(self.owner, self.cash, *holding.cash));
        }
        Ok(())
    }
}

/// One owner's cards and cash, borrowed for the length of an exchange.
pub struct Holding<'a> {
    pub inventory: &'a mut Inventory,
    pub cash: &'a mut Money,
}

/// Cards and cash moving both ways between two owners as one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub first: Side,
    pub second: Side,
}

impl Exchange {
    pub fn new(first: Side, second: Side) -> Self {
        Self { first, second }
    }

    pub fn owners(&self) -> (OwnerId, OwnerId) {
        (self.first.owner, self.second.owner)
    }

    /// Check both sides, then move everything. `first` must be the holding
    /// of `self.first.owner`. On error neither holding has changed.
    pub fn apply(&self, first: Holding<'_>, second: Holding<'_>) -> Result<(), GameError> {
        if self.first.owner == self.second.owner {
            return Err(GameError::SelfExchange(self.first.owner));
        }
        let mut seen = HashSet::new();
        for &instance in self.first.cards.iter().chain(&self.second.cards) {
            if !seen.insert(instance) {
                return Err(GameError::DuplicateInstance(instance));
            }
        }
        self.first.check(&first)?;
        self.second.check(&second)?;

        move_cards(&mut *first.inventory, &mut *second.inventory, &self.first.cards);
        move_cards(&mut *second.inventory, &mut *first.inventory, &self.second.cards);
        *first.cash += self.second.cash - self.first.cash;
        *second.cash += self.first.cash - self.second.cash;

        debug!(
            first = %self.first.owner,
            second = %self.second.owner,
            cards_out = self.first.cards.len(),
            cards_in = self.second.cards.len(),
            cash_out = format!("${:.2}", self.first.cash),
            cash_in = format!("${:.2}", self.second.cash),
            "Exchange applied"
        );
        Ok(())
    }
}

fn move_cards(from: &mut Inventory, to: &mut Inventory, ids: &[InstanceId]) {
    for &id in ids {
        if let Some(card) = from.remove(id) {
            to.insert(card);
        }
    }
}

/// The error for `owner` being unable to cover `needed`.
pub fn short_of_cash(owner: OwnerId, needed: Money, available: Money) -> GameError {
    match owner {
        OwnerId::Player => GameError::InsufficientFunds { needed, available },
        OwnerId::Trader(_) => GameError::CounterpartyCannotAfford {
            trader: owner.to_string(),
            needed,
            available,
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
