//! Store: sealed packs, pack opening and protection supplies.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::inventory;
use crate::random::RandomSource;
use crate::state::GameState;
use crate::types::{CardInstance, GameError, InstanceId, Money, OwnerId, SetId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupplyKind {
    Sleeve,
    Toploader,
}

impl fmt::Display for SupplyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupplyKind::Sleeve => write!(f, "sleeves"),
            SupplyKind::Toploader => write!(f, "toploaders"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pack reveal
// ---------------------------------------------------------------------------

/// Cards pulled from an opened pack, not yet in the collection.
///
/// Opening is a two-step sequence: the reveal can be shown to the player
/// first, and the cards only become owned on `commit`.
#[derive(Debug, Clone)]
#[must_use = "cards from an opened pack are lost unless committed"]
pub struct PackReveal {
    pub set_id: SetId,
    pub cards: Vec<CardInstance>,
}

impl PackReveal {
    /// Move the revealed cards into the player's collection.
    pub fn commit(self, state: &mut GameState) -> Vec<InstanceId> {
        let ids: Vec<InstanceId> = self.cards.iter().map(|c| c.id).collect();
        state.stats.cards_acquired += self.cards.len() as u32;
        for card in self.cards {
            state.player.collection.insert(card);
        }
        debug!(set = %self.set_id, cards = ids.len(), "Pack contents added to collection");
        ids
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct Store;

impl Store {
    /// Buy one sealed pack of `set_id`.
    pub fn buy_pack(state: &mut GameState, catalog: &Catalog, set_id: &str) -> Result<Money, GameError> {
        let set = catalog.require_set(set_id)?;
        state.spend(set.pack_price)?;
        *state.player.sealed_packs.entry(set.id.clone()).or_insert(0) += 1;

        info!(
            set = %set.id,
            price = format!("${:.2}", set.pack_price),
            sealed = state.sealed_count(&set.id),
            cash = format!("${:.2}", state.player.cash),
            "Pack purchased"
        );
        Ok(set.pack_price)
    }

    /// Open one sealed pack of `set_id` and roll its contents.
    pub fn open_pack(
        state: &mut GameState,
        catalog: &Catalog,
        set_id: &str,
        rng: &mut dyn RandomSource,
    ) -> Result<PackReveal, GameError> {
        if state.sealed_count(set_id) == 0 {
            return Err(GameError::NoSealedPack(set_id.to_string()));
        }
        let today = state.today();
        let drawn = catalog.draw_pack(set_id, rng)?;
        let cards: Vec<CardInstance> = drawn
            .into_iter()
            .map(|card| inventory::mint(card, today, rng))
            .collect();

        if let Some(count) = state.player.sealed_packs.get_mut(set_id) {
            *count -= 1;
        }
        state.stats.packs_opened += 1;

        info!(
            set = set_id,
            cards = cards.len(),
            best = ?cards
                .iter()
                .filter_map(|c| catalog.card(&c.card_id))
                .map(|c| c.rarity)
                .max(),
            "Pack opened"
        );
        Ok(PackReveal {
            set_id: set_id.to_string(),
            cards,
        })
    }

    /// Buy `amount` units of a supply for `price` in total.
    pub fn buy_supplies(
        state: &mut GameState,
        kind: SupplyKind,
        amount: u32,
        price: Money,
    ) -> Result<(), GameError> {
        state.spend(price)?;
        let supplies = &mut state.player.supplies;
        match kind {
            SupplyKind::Sleeve => supplies.sleeves += amount,
            SupplyKind::Toploader => supplies.toploaders += amount,
        }
        info!(kind = %kind, amount, price = format!("${:.2}", price), "Supplies purchased");
        Ok(())
    }

    /// Put one unit of protection on a collection card.
    pub fn protect(state: &mut GameState, instance: InstanceId, kind: SupplyKind) -> Result<(), GameError> {
        let stock = match kind {
            SupplyKind::Sleeve => state.player.supplies.sleeves,
            SupplyKind::Toploader => state.player.supplies.toploaders,
        };
        let card = state.player.collection.get_mut(instance).ok_or(GameError::InstanceNotFound {
            owner: OwnerId::Player,
            instance,
        })?;
        let flag = match kind {
            SupplyKind::Sleeve => &mut card.protection.sleeved,
            SupplyKind::Toploader => &mut card.protection.toploadered,
        };
        if *flag {
            return Err(GameError::AlreadyProtected(instance));
        }
        if stock == 0 {
            return Err(GameError::NoSupplies(kind.to_string()));
        }
        *flag = true;

        match kind {
            SupplyKind::Sleeve => state.player.supplies.sleeves -= 1,
            SupplyKind::Toploader => state.player.supplies.toploaders -= 1,
        }
        debug!(instance = %instance, kind = %kind, "Card protected");
        Ok(())
    }

    /// Take protection off a card and return the unit to stock.
    pub fn unprotect(state: &mut GameState, instance: InstanceId, kind: SupplyKind) -> Result<(), GameError> {
        let card = state.player.collection.get_mut(instance).ok_or(GameError::InstanceNotFound {
            owner: OwnerId::Player,
            instance,
        })?;
        let flag = match kind {
            SupplyKind::Sleeve => &mut card.protection.sleeved,
            SupplyKind::Toploader => &mut card.protection.toploadered,
        };
        if !*flag {
            return Ok(());
        }
        *flag = false;
        match kind {
            SupplyKind::Sleeve => state.player.supplies.sleeves += 1,
            SupplyKind::Toploader => state.player.supplies.toploaders += 1,
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
