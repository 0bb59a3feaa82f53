//! Secondary-market state and the daily market engine.
//!
//! The market is a list of time-bounded price modifiers plus the events
//! that installed them. Valuation reads the modifiers; the day cycle
//! decays them, fires new events and applies set rotation.

pub mod events;
pub mod rotation;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::random::RandomSource;
use crate::types::{CardDefinition, CardId, GameClock, GameDate, Mechanic, Rarity, SetId};

use self::events::EventRecord;
use self::rotation::{RotationChange, RotationConfig};

// ---------------------------------------------------------------------------
// Modifiers
// ---------------------------------------------------------------------------

/// What a modifier applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    Rarity(Rarity),
    Set(SetId),
    Card(CardId),
    Mechanic(Mechanic),
}

impl ModifierKey {
    pub fn matches(&self, card: &CardDefinition) -> bool {
        match self {
            ModifierKey::Rarity(r) => card.rarity == *r,
            ModifierKey::Set(s) => card.set == *s,
            ModifierKey::Card(c) => card.id == *c,
            ModifierKey::Mechanic(m) => card.mechanic == Some(*m),
        }
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModifierKey::Rarity(r) => write!(f, "rarity:{r}"),
            ModifierKey::Set(s) => write!(f, "set:{s}"),
            ModifierKey::Card(c) => write!(f, "card:{c}"),
            ModifierKey::Mechanic(m) => write!(f, "mechanic:{m}"),
        }
    }
}

/// Who installed a modifier. A new modifier replaces an existing one only
/// when both key and source match; different sources compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierSource {
    Event(String),
    Rotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketModifier {
    pub key: ModifierKey,
    pub factor: Decimal,
    pub remaining_days: u32,
    pub source: ModifierSource,
}

impl MarketModifier {
    pub fn new(key: ModifierKey, factor: Decimal, days: u32, source: ModifierSource) -> Self {
        Self {
            key,
            factor,
            remaining_days: days,
            source,
        }
    }
}

/// Live effect of a fired event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    pub event_id: String,
    pub name: String,
    pub description: String,
    pub key: ModifierKey,
    pub factor: Decimal,
    pub remaining_days: u32,
    pub started: GameDate,
}

// ---------------------------------------------------------------------------
// Market state
// ---------------------------------------------------------------------------

/// What one decay step removed.
#[derive(Debug, Clone, Default)]
pub struct Expired {
    pub modifiers: Vec<MarketModifier>,
    pub events: Vec<ActiveEvent>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketState {
    pub modifiers: Vec<MarketModifier>,
    pub active_events: Vec<ActiveEvent>,
    /// Append-only log of every event that fired.
    pub history: Vec<EventRecord>,
}

impl MarketState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a modifier. Zero-duration modifiers are never installed.
    pub fn install(&mut self, modifier: MarketModifier) -> bool {
        if modifier.remaining_days == 0 {
            debug!(key = %modifier.key, "Skipping zero-duration modifier");
            return false;
        }
        self.modifiers
            .retain(|m| !(m.key == modifier.key && m.source == modifier.source));
        self.modifiers.push(modifier);
        true
    }

    /// Count every modifier and active event down by one day and drop the
    /// ones that reach zero.
    pub fn decay(&mut self) -> Expired {
        let mut expired = Expired::default();

        for m in &mut self.modifiers {
            m.remaining_days = m.remaining_days.saturating_sub(1);
        }
        let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.modifiers)
            .into_iter()
            .partition(|m| m.remaining_days == 0);
        self.modifiers = kept;
        expired.modifiers = gone;

        for e in &mut self.active_events {
            e.remaining_days = e.remaining_days.saturating_sub(1);
        }
        let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.active_events)
            .into_iter()
            .partition(|e| e.remaining_days == 0);
        self.active_events = kept;
        expired.events = gone;

        expired
    }

    /// Product of every modifier matching `card`.
    pub fn factor_for(&self, card: &CardDefinition) -> Decimal {
        market_factor(card, &self.modifiers)
    }

    pub fn has_fired(&self, event_id: &str) -> bool {
        self.history.iter().any(|h| h.event_id == event_id)
    }

    pub fn rotation_modifier(&self, set_id: &str) -> Option<&MarketModifier> {
        self.modifiers.iter().find(|m| {
            m.source == ModifierSource::Rotation && m.key == ModifierKey::Set(set_id.to_string())
        })
    }
}

/// Product of every modifier in `modifiers` whose key matches `card`.
pub fn market_factor(card: &CardDefinition, modifiers: &[MarketModifier]) -> Decimal {
    modifiers
        .iter()
        .filter(|m| m.key.matches(card))
        .fold(Decimal::ONE, |acc, m| acc * m.factor)
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Market engine configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    /// Probability that an event fires on a given day.
    pub event_chance: f64,
    pub rotation: RotationConfig,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            event_chance: 0.15,
            rotation: RotationConfig::default(),
        }
    }
}

/// Stateless driver of the market's daily steps.
pub struct MarketEngine {
    config: MarketConfig,
}

impl MarketEngine {
    pub fn new(config: MarketConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    /// Step 1 of the daily tick: expire modifiers and events.
    pub fn decay(&self, market: &mut MarketState) -> Expired {
        let expired = market.decay();
        for e in &expired.events {
            info!(event = %e.event_id, name = %e.name, "Market event ended");
        }
        if !expired.modifiers.is_empty() {
            debug!(count = expired.modifiers.len(), "Modifiers expired");
        }
        expired
    }

    /// Step 2: with the configured daily chance, fire one eligible event.
    pub fn maybe_fire_event(
        &self,
        market: &mut MarketState,
        catalog: &Catalog,
        date: GameDate,
        rng: &mut dyn RandomSource,
    ) -> Option<EventRecord> {
        if !rng.chance(self.config.event_chance) {
            return None;
        }
        let eligible = events::eligible_events(catalog.events(), market, date);
        let chosen = events::select_weighted(&eligible, rng.next_f64())?;
        events::fire(chosen, market, catalog, date, rng)
    }

    /// Step 3: apply set-rotation effects for the current date.
    pub fn apply_rotation(
        &self,
        market: &mut MarketState,
        catalog: &Catalog,
        clock: &GameClock,
    ) -> Vec<RotationChange> {
        rotation::apply(market, catalog, clock, &self.config.rotation)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
