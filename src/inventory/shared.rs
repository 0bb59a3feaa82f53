//! Accounts shared across threads.
//!
//! Each owner's inventory and cash sit together behind one mutex. Anything
//! touching two owners locks both in `OwnerId` order, so two exchanges in
//! opposite directions can never deadlock and no instance or dollar is
//! ever seen in two places.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::{Exchange, Holding, Inventory, Side};
use crate::state::GameState;
use crate::types::{CardInstance, GameError, InstanceId, Money, OwnerId};

/// One owner's cards and cash.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Account {
    pub inventory: Inventory,
    pub cash: Money,
}

impl Account {
    pub fn new(inventory: Inventory, cash: Money) -> Self {
        Self { inventory, cash }
    }

    fn holding(&mut self) -> Holding<'_> {
        Holding {
            inventory: &mut self.inventory,
            cash: &mut self.cash,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SharedCollections {
    owners: BTreeMap<OwnerId, Arc<Mutex<Account>>>,
}

impl SharedCollections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an owner's account. Replaces any previous account for that
    /// owner.
    pub fn register(&mut self, owner: OwnerId, account: Account) {
        self.owners.insert(owner, Arc::new(Mutex::new(account)));
    }

    /// Shared copies of the player's and every trader's cards and cash.
    pub fn from_state(state: &GameState) -> Self {
        let mut shared = Self::new();
        shared.register(
            OwnerId::Player,
            Account::new(state.player.collection.clone(), state.player.cash),
        );
        for trader in &state.traders {
            shared.register(
                OwnerId::Trader(trader.id),
                Account::new(trader.inventory.clone(), trader.cash),
            );
        }
        shared
    }

    /// Copy every account back into `state`.
    pub fn write_back(&self, state: &mut GameState) -> Result<(), GameError> {
        let mut owners = vec![OwnerId::Player];
        owners.extend(state.traders.iter().map(|t| OwnerId::Trader(t.id)));
        self.mirror(state, &owners)
    }

    /// Copy the accounts of `owners` into `state`.
    pub fn mirror(&self, state: &mut GameState, owners: &[OwnerId]) -> Result<(), GameError> {
        for &owner in owners {
            let account = self.account(owner)?;
            match owner {
                OwnerId::Player => {
                    state.player.collection = account.inventory;
                    state.player.cash = account.cash;
                }
                OwnerId::Trader(id) => {
                    let trader = state.trader_mut(id)?;
                    trader.inventory = account.inventory;
                    trader.cash = account.cash;
                }
            }
        }
        Ok(())
    }

    fn handle(&self, owner: OwnerId) -> Result<&Arc<Mutex<Account>>, GameError> {
        self.owners.get(&owner).ok_or(match owner {
            OwnerId::Trader(id) => GameError::UnknownTrader(id),
            OwnerId::Player => GameError::UnknownOwner(owner),
        })
    }

    fn lock(&self, owner: OwnerId) -> Result<MutexGuard<'_, Account>, GameError> {
        self.handle(owner)?
            .lock()
            .map_err(|_| GameError::StateLock(owner))
    }

    /// Run `f` on an owner's account while holding its lock.
    pub fn with_account<T>(
        &self,
        owner: OwnerId,
        f: impl FnOnce(&mut Account) -> T,
    ) -> Result<T, GameError> {
        let mut guard = self.lock(owner)?;
        Ok(f(&mut *guard))
    }

    pub fn insert(&self, owner: OwnerId, instance: CardInstance) -> Result<(), GameError> {
        self.lock(owner)?.inventory.insert(instance);
        Ok(())
    }

    pub fn remove(&self, owner: OwnerId, instance: InstanceId) -> Result<CardInstance, GameError> {
        self.lock(owner)?
            .inventory
            .remove(instance)
            .ok_or(GameError::InstanceNotFound { owner, instance })
    }

    pub fn count_all(&self, owner: OwnerId) -> Result<usize, GameError> {
        Ok(self.lock(owner)?.inventory.count_all())
    }

    pub fn count_unique(&self, owner: OwnerId) -> Result<usize, GameError> {
        Ok(self.lock(owner)?.inventory.count_unique())
    }

    pub fn cash(&self, owner: OwnerId) -> Result<Money, GameError> {
        Ok(self.lock(owner)?.cash)
    }

    /// Copy of an owner's inventory at this instant.
    pub fn snapshot(&self, owner: OwnerId) -> Result<Inventory, GameError> {
        Ok(self.lock(owner)?.inventory.clone())
    }

    /// Copy of an owner's whole account at this instant.
    pub fn account(&self, owner: OwnerId) -> Result<Account, GameError> {
        Ok(self.lock(owner)?.clone())
    }

    /// Atomically move `instance` from `from` to `to`.
    pub fn transfer(
        &self,
        from: OwnerId,
        to: OwnerId,
        instance: InstanceId,
    ) -> Result<(), GameError> {
        if from == to {
            return if self.lock(from)?.inventory.contains(instance) {
                Ok(())
            } else {
                Err(GameError::InstanceNotFound {
                    owner: from,
                    instance,
                })
            };
        }
        self.exchange(&Exchange::new(
            Side::new(from, vec![instance], Decimal::ZERO),
            Side::new(to, Vec::new(), Decimal::ZERO),
        ))
    }

    /// Apply `exchange` with both accounts locked. Other threads see the
    /// two owners either before or after, never in between.
    pub fn exchange(&self, exchange: &Exchange) -> Result<(), GameError> {
        let (a, b) = exchange.owners();
        if a == b {
            return Err(GameError::SelfExchange(a));
        }

        // Canonical order: lower OwnerId first.
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let mut low_guard = self.lock(low)?;
        let mut high_guard = self.lock(high)?;
        let (first, second) = if a < b {
            (low_guard.holding(), high_guard.holding())
        } else {
            (high_guard.holding(), low_guard.holding())
        };
        exchange.apply(first, second)?;
        debug!(first = %a, second = %b, "Shared exchange committed");
        Ok(())
    }
}

/// Run `exchange` on the shared accounts when there are any, otherwise
/// directly on `state`. Either way `state` shows the result for both
/// owners afterwards.
pub fn execute(
    state: &mut GameState,
    shared: Option<&SharedCollections>,
    exchange: &Exchange,
) -> Result<(), GameError> {
    match shared {
        None => state.exchange(exchange),
        Some(shared) => {
            shared.exchange(exchange)?;
            let (a, b) = exchange.owners();
            shared.mirror(state, &[a, b])
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
