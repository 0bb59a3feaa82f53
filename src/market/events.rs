//! Market event definitions, eligibility and weighted selection.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{ActiveEvent, MarketModifier, MarketState, ModifierKey, ModifierSource};
use crate::catalog::Catalog;
use crate::random::RandomSource;
use crate::types::GameDate;

/// Earliest date an event may fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerCondition {
    /// The event is eligible from this year onwards.
    pub year: u32,
    /// Only on this exact day of an eligible year.
    #[serde(default)]
    pub day: Option<u32>,
    /// Only from this day of an eligible year onwards.
    #[serde(default)]
    pub min_day: Option<u32>,
}

impl TriggerCondition {
    pub fn from_year(year: u32) -> Self {
        Self {
            year,
            day: None,
            min_day: None,
        }
    }

    pub fn on_day(mut self, day: u32) -> Self {
        self.day = Some(day);
        self
    }

    pub fn from_day(mut self, day: u32) -> Self {
        self.min_day = Some(day);
        self
    }

    pub fn is_met(&self, date: GameDate) -> bool {
        if date.year < self.year {
            return false;
        }
        if let Some(day) = self.day {
            if date.day != day {
                return false;
            }
        }
        if let Some(min) = self.min_day {
            if date.day < min {
                return false;
            }
        }
        true
    }
}

/// Which key a fired event's modifier lands on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EffectTarget {
    Fixed(ModifierKey),
    /// One of these keys, picked when the event fires.
    OneOf(Vec<ModifierKey>),
    /// A random card from the catalog.
    AnyCard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEffect {
    pub target: EffectTarget,
    pub factor: Decimal,
    pub duration: u32,
}

fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default = "default_weight")]
    pub weight: u32,
    #[serde(default)]
    pub one_time: bool,
    #[serde(default)]
    pub trigger: Option<TriggerCondition>,
    pub effect: EventEffect,
}

impl EventDefinition {
    pub fn new(id: &str, name: &str, description: &str, effect: EventEffect) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            weight: default_weight(),
            one_time: false,
            trigger: None,
            effect,
        }
    }

    pub fn weight(mut self, weight: u32) -> Self {
        self.weight = weight;
        self
    }

    pub fn once(mut self) -> Self {
        self.one_time = true;
        self
    }

    pub fn trigger(mut self, trigger: TriggerCondition) -> Self {
        self.trigger = Some(trigger);
        self
    }
}

/// Historical record of a fired event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub event_id: String,
    pub name: String,
    pub key: ModifierKey,
    pub factor: Decimal,
    pub duration: u32,
    pub fired_on: GameDate,
}

/// Events that may fire on `date`: one-time events that have not fired yet
/// and whose trigger (if any) is met.
pub fn eligible_events<'a>(
    pool: &'a [EventDefinition],
    market: &MarketState,
    date: GameDate,
) -> Vec<&'a EventDefinition> {
    pool.iter()
        .filter(|e| !(e.one_time && market.has_fired(&e.id)))
        .filter(|e| e.trigger.map_or(true, |t| t.is_met(date)))
        .collect()
}

fn weight_of(e: &EventDefinition) -> f64 {
    e.weight.max(1) as f64
}

/// Cumulative-weight selection over a single uniform draw in `[0, 1)`.
/// A zero weight is treated as the default weight of 1.
pub fn select_weighted<'a>(
    eligible: &[&'a EventDefinition],
    draw: f64,
) -> Option<&'a EventDefinition> {
    let total: f64 = eligible.iter().map(|e| weight_of(e)).sum::<f64>();
    if total <= 0.0 {
        return None;
    }
    let mut remaining = draw * total;
    for e in eligible {
        remaining -= weight_of(e);
        if remaining <= 0.0 {
            return Some(*e);
        }
    }
    eligible.last().copied()
}

/// Fire `event`: record it, start its active effect and install its
/// modifier. Returns `None` when the target cannot be resolved (an
/// `AnyCard` event on an empty catalog).
pub fn fire(
    event: &EventDefinition,
    market: &mut MarketState,
    catalog: &Catalog,
    date: GameDate,
    rng: &mut dyn RandomSource,
) -> Option<EventRecord> {
    let key = match &event.effect.target {
        EffectTarget::Fixed(k) => k.clone(),
        EffectTarget::OneOf(keys) => {
            if keys.is_empty() {
                return None;
            }
            keys[rng.pick_index(keys.len())].clone()
        }
        EffectTarget::AnyCard => ModifierKey::Card(catalog.random_card(rng)?.id.clone()),
    };
    let factor = event.effect.factor;
    let duration = event.effect.duration;

    let record = EventRecord {
        event_id: event.id.clone(),
        name: event.name.clone(),
        key: key.clone(),
        factor,
        duration,
        fired_on: date,
    };
    market.history.push(record.clone());

    if duration > 0 {
        market.active_events.push(ActiveEvent {
            event_id: event.id.clone(),
            name: event.name.clone(),
            description: event.description.clone(),
            key: key.clone(),
            factor,
            remaining_days: duration,
            started: date,
        });
    }
    market.install(MarketModifier::new(
        key.clone(),
        factor,
        duration,
        ModifierSource::Event(event.id.clone()),
    ));

    info!(
        event = %event.id,
        name = %event.name,
        target = %key,
        factor = %factor,
        days = duration,
        date = %date,
        "Market event fired"
    );
    Some(record)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
