//! Read-only card catalog.
//!
//! Holds every card definition, the set metadata (pack price, pack layout,
//! rotation window) and the pool of market events that can fire. New sets
//! are registered additively; the catalog is otherwise never mutated.

pub mod builtin;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::market::events::EventDefinition;
use crate::random::RandomSource;
use crate::types::{CardDefinition, CardId, GameError, Rarity, SetId};

// ---------------------------------------------------------------------------
// Pack layouts
// ---------------------------------------------------------------------------

/// One slot (or group of slots) in a booster pack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PackSlot {
    /// Always `count` cards of `rarity`.
    Fixed { rarity: Rarity, count: u32 },
    /// One card whose rarity is picked by weight.
    Weighted { choices: Vec<(Rarity, u32)> },
    /// One card of `rarity` with the given probability.
    Chance { rarity: Rarity, probability: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackLayout {
    pub slots: Vec<PackSlot>,
}

impl PackLayout {
    pub fn new(slots: Vec<PackSlot>) -> Self {
        Self { slots }
    }

    /// Build a layout from expected counts per rarity. The whole part of
    /// each count is guaranteed, the fractional part is a chance slot.
    pub fn from_distribution(distribution: &[(Rarity, f64)]) -> Self {
        let mut slots = Vec::new();
        for &(rarity, expected) in distribution {
            let whole = expected.floor();
            let fraction = expected - whole;
            if whole >= 1.0 {
                slots.push(PackSlot::Fixed {
                    rarity,
                    count: whole as u32,
                });
            }
            if fraction > 0.0 {
                slots.push(PackSlot::Chance {
                    rarity,
                    probability: fraction,
                });
            }
        }
        Self { slots }
    }

    /// Roll the rarity of every card in one pack, in slot order.
    pub fn roll(&self, rng: &mut dyn RandomSource) -> Vec<Rarity> {
        let mut rarities = Vec::new();
        for slot in &self.slots {
            match slot {
                PackSlot::Fixed { rarity, count } => {
                    rarities.extend(std::iter::repeat(*rarity).take(*count as usize));
                }
                PackSlot::Weighted { choices } => {
                    if let Some(r) = pick_weighted(choices, rng) {
                        rarities.push(r);
                    }
                }
                PackSlot::Chance {
                    rarity,
                    probability,
                } => {
                    if rng.chance(*probability) {
                        rarities.push(*rarity);
                    }
                }
            }
        }
        rarities
    }

    /// Number of cards a pack always contains.
    pub fn guaranteed_cards(&self) -> u32 {
        self.slots
            .iter()
            .map(|s| match s {
                PackSlot::Fixed { count, .. } => *count,
                PackSlot::Weighted { .. } => 1,
                PackSlot::Chance { .. } => 0,
            })
            .sum()
    }
}

fn pick_weighted(choices: &[(Rarity, u32)], rng: &mut dyn RandomSource) -> Option<Rarity> {
    let total: u32 = choices.iter().map(|(_, w)| *w).sum();
    if total == 0 {
        return None;
    }
    let mut remaining = rng.next_f64() * total as f64;
    for (rarity, weight) in choices {
        remaining -= *weight as f64;
        if remaining < 0.0 {
            return Some(*rarity);
        }
    }
    choices.last().map(|(r, _)| *r)
}

// ---------------------------------------------------------------------------
// Sets
// ---------------------------------------------------------------------------

/// Years during which a set is in standard play: `[start_year, end_year)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationWindow {
    pub start_year: u32,
    pub end_year: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDefinition {
    pub id: SetId,
    pub name: String,
    pub release_year: u32,
    pub pack_price: Decimal,
    pub layout: PackLayout,
    /// `None` for sets that never rotate out.
    #[serde(default)]
    pub rotation: Option<RotationWindow>,
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    cards: BTreeMap<CardId, CardDefinition>,
    sets: BTreeMap<SetId, SetDefinition>,
    events: Vec<EventDefinition>,
}

impl Catalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the base set and Mythic Legends registered.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        builtin::register_all(&mut catalog);
        catalog
    }

    /// Register a set with its cards and market events.
    ///
    /// Keyed by set id: registering the same set again changes nothing and
    /// returns `false`. Cards whose id is already known are skipped.
    pub fn register_set(
        &mut self,
        set: SetDefinition,
        cards: Vec<CardDefinition>,
        events: Vec<EventDefinition>,
    ) -> bool {
        if self.sets.contains_key(&set.id) {
            debug!(set = %set.id, "Set already registered");
            return false;
        }

        let mut added = 0usize;
        for card in cards {
            if !self.cards.contains_key(&card.id) {
                self.cards.insert(card.id.clone(), card);
                added += 1;
            }
        }
        for event in events {
            if !self.events.iter().any(|e| e.id == event.id) {
                self.events.push(event);
            }
        }

        info!(
            set = %set.id,
            name = %set.name,
            cards = added,
            pack_price = format!("${:.2}", set.pack_price),
            "Set registered"
        );
        self.sets.insert(set.id.clone(), set);
        true
    }

    pub fn card(&self, id: &str) -> Option<&CardDefinition> {
        self.cards.get(id)
    }

    pub fn require_card(&self, id: &str) -> Result<&CardDefinition, GameError> {
        self.cards
            .get(id)
            .ok_or_else(|| GameError::UnknownCard(id.to_string()))
    }

    pub fn set(&self, id: &str) -> Option<&SetDefinition> {
        self.sets.get(id)
    }

    pub fn require_set(&self, id: &str) -> Result<&SetDefinition, GameError> {
        self.sets
            .get(id)
            .ok_or_else(|| GameError::UnknownSet(id.to_string()))
    }

    pub fn sets(&self) -> impl Iterator<Item = &SetDefinition> {
        self.sets.values()
    }

    pub fn cards(&self) -> impl Iterator<Item = &CardDefinition> {
        self.cards.values()
    }

    pub fn card_count(&self) -> usize {
        self.cards.len()
    }

    pub fn events(&self) -> &[EventDefinition] {
        &self.events
    }

    pub fn cards_in_set(&self, set_id: &str) -> Vec<&CardDefinition> {
        self.cards.values().filter(|c| c.set == set_id).collect()
    }

    pub fn cards_of_rarity(&self, set_id: &str, rarity: Rarity) -> Vec<&CardDefinition> {
        self.cards
            .values()
            .filter(|c| c.set == set_id && c.rarity == rarity)
            .collect()
    }

    /// Cards that evolve directly from `card_id`.
    pub fn evolutions_of(&self, card_id: &str) -> Vec<&CardDefinition> {
        self.cards
            .values()
            .filter(|c| c.evolves_from.as_deref() == Some(card_id))
            .collect()
    }

    /// The line a card belongs to: its ancestors from the base form, the
    /// card itself, then whatever evolves directly from it.
    ///
    /// Empty for unknown cards and for cards with no evolution at all.
    /// Ancestors that are missing from the catalog end the walk.
    pub fn evolution_chain(&self, card_id: &str) -> Vec<&CardDefinition> {
        let Some(card) = self.card(card_id) else {
            return Vec::new();
        };

        let mut chain = vec![card];
        let mut current = card;
        while let Some(previous) = current.evolves_from.as_deref().and_then(|id| self.card(id)) {
            if chain.iter().any(|c| c.id == previous.id) {
                break;
            }
            chain.insert(0, previous);
            current = previous;
        }
        for next in self.evolutions_of(card_id) {
            if !chain.iter().any(|c| c.id == next.id) {
                chain.push(next);
            }
        }

        if chain.len() == 1 {
            Vec::new()
        } else {
            chain
        }
    }

    /// Uniformly random card from the whole catalog.
    pub fn random_card(&self, rng: &mut dyn RandomSource) -> Option<&CardDefinition> {
        if self.cards.is_empty() {
            return None;
        }
        let idx = rng.pick_index(self.cards.len());
        self.cards.values().nth(idx)
    }

    /// Uniformly random set id.
    pub fn random_set(&self, rng: &mut dyn RandomSource) -> Option<&SetDefinition> {
        if self.sets.is_empty() {
            return None;
        }
        let idx = rng.pick_index(self.sets.len());
        self.sets.values().nth(idx)
    }

    /// Roll the contents of one pack of `set_id`.
    ///
    /// A slot that rolls a rarity the set has no cards for yields a Common.
    pub fn draw_pack(
        &self,
        set_id: &str,
        rng: &mut dyn RandomSource,
    ) -> Result<Vec<&CardDefinition>, GameError> {
        let set = self.require_set(set_id)?;
        let mut drawn = Vec::new();
        for rarity in set.layout.roll(rng) {
            let mut pool = self.cards_of_rarity(set_id, rarity);
            if pool.is_empty() {
                pool = self.cards_of_rarity(set_id, Rarity::Common);
            }
            if pool.is_empty() {
                continue;
            }
            drawn.push(pool[rng.pick_index(pool.len())]);
        }
        Ok(drawn)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;
    use rust_decimal_macros::dec;

    fn tiny_set(id: &str) -> SetDefinition {
        SetDefinition {
            id: id.to_string(),
            name: "Tiny".into(),
            release_year: 1,
            pack_price: dec!(1.00),
            layout: PackLayout::new(vec![
                PackSlot::Fixed {
                    rarity: Rarity::Common,
                    count: 2,
                },
                PackSlot::Weighted {
                    choices: vec![(Rarity::Rare, 80), (Rarity::UltraRare, 20)],
                },
            ]),
            rotation: None,
        }
    }

    fn tiny_cards(set: &str) -> Vec<CardDefinition> {
        vec![
            CardDefinition::new("T1", "Pebble", Rarity::Common, set),
            CardDefinition::new("T2", "Stone", Rarity::Common, set),
            CardDefinition::new("T3", "Boulder", Rarity::Rare, set),
        ]
    }

    #[test]
    fn test_register_set_is_idempotent() {
        let mut catalog = Catalog::new();
        assert!(catalog.register_set(tiny_set("tiny"), tiny_cards("tiny"), vec![]));
        assert_eq!(catalog.card_count(), 3);

        let mut renamed = tiny_set("tiny");
        renamed.name = "Changed".into();
        assert!(!catalog.register_set(renamed, vec![], vec![]));
        assert_eq!(catalog.set("tiny").unwrap().name, "Tiny");
        assert_eq!(catalog.card_count(), 3);
    }

    #[test]
    fn test_unknown_lookups() {
        let catalog = Catalog::new();
        assert!(matches!(catalog.require_card("X"), Err(GameError::UnknownCard(_))));
        assert!(matches!(catalog.require_set("x"), Err(GameError::UnknownSet(_))));
    }

    #[test]
    fn test_distribution_layout() {
        let layout = PackLayout::from_distribution(&[
            (Rarity::Common, 6.0),
            (Rarity::UltraRare, 0.8),
        ]);
        assert_eq!(layout.slots.len(), 2);
        assert_eq!(layout.guaranteed_cards(), 6);

        let mut hit = ScriptedRandom::constant(0.5);
        assert_eq!(layout.roll(&mut hit).len(), 7);
        let mut miss = ScriptedRandom::constant(0.9);
        assert_eq!(layout.roll(&mut miss).len(), 6);
    }

    #[test]
    fn test_weighted_slot_selection() {
        let choices = vec![(Rarity::Rare, 80), (Rarity::UltraRare, 15), (Rarity::SecretRare, 5)];
        let mut rng = ScriptedRandom::new(&[0.1, 0.85, 0.97]);
        assert_eq!(pick_weighted(&choices, &mut rng), Some(Rarity::Rare));
        assert_eq!(pick_weighted(&choices, &mut rng), Some(Rarity::UltraRare));
        assert_eq!(pick_weighted(&choices, &mut rng), Some(Rarity::SecretRare));
    }

    #[test]
    fn test_draw_pack_falls_back_to_common() {
        let mut catalog = Catalog::new();
        catalog.register_set(tiny_set("tiny"), tiny_cards("tiny"), vec![]);
        // The weighted slot lands on Ultra Rare, which the set does not print.
        let mut rng = ScriptedRandom::new(&[0.9, 0.0, 0.0, 0.0]);
        let pack = catalog.draw_pack("tiny", &mut rng).unwrap();
        assert_eq!(pack.len(), 3);
        assert!(pack.iter().all(|c| c.rarity == Rarity::Common));
    }

    #[test]
    fn test_evolution_chain_walks_both_ways() {
        let catalog = Catalog::builtin();
        let ids = |cards: Vec<&CardDefinition>| cards.iter().map(|c| c.id.clone()).collect::<Vec<_>>();

        assert_eq!(ids(catalog.evolution_chain("ML-002")), ["ML-003", "ML-002", "ML-001"]);
        assert_eq!(ids(catalog.evolution_chain("ML-001")), ["ML-003", "ML-002", "ML-001"]);
        // Only the next stage is listed after the card itself.
        assert_eq!(ids(catalog.evolution_chain("ML-016")), ["ML-016", "ML-017"]);
        assert_eq!(ids(catalog.evolution_chain("ML-018")), ["ML-016", "ML-017", "ML-018"]);

        assert!(catalog.evolution_chain("ML-006").is_empty());
        assert!(catalog.evolution_chain("NOPE").is_empty());
    }

    #[test]
    fn test_evolutions_of() {
        let catalog = Catalog::builtin();
        let next: Vec<_> = catalog.evolutions_of("ML-003").iter().map(|c| c.name.clone()).collect();
        assert_eq!(next, ["Inferdrake"]);
        assert!(catalog.evolutions_of("ML-001").is_empty());
        assert!(catalog.evolutions_of("GS001").is_empty());
    }

    #[test]
    fn test_evolution_chain_stops_on_a_loop() {
        let mut catalog = Catalog::new();
        let cards = vec![
            CardDefinition::new("L1", "Ouro", Rarity::Common, "loop").with_evolution(Some("L2"), Some("L2")),
            CardDefinition::new("L2", "Boros", Rarity::Rare, "loop").with_evolution(Some("L1"), Some("L1")),
        ];
        catalog.register_set(tiny_set("loop"), cards, vec![]);
        let chain: Vec<_> = catalog.evolution_chain("L1").iter().map(|c| c.id.clone()).collect();
        assert_eq!(chain, ["L2", "L1"]);
    }

    #[test]
    fn test_draw_pack_unknown_set() {
        let catalog = Catalog::new();
        let mut rng = ScriptedRandom::constant(0.0);
        assert!(catalog.draw_pack("nope", &mut rng).is_err());
    }
}
