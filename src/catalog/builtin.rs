//! Built-in content: the base "genesis" set and the "mythic_legends"
//! expansion, with their market events.

use rust_decimal_macros::dec;

use super::{Catalog, PackLayout, PackSlot, RotationWindow, SetDefinition};
use crate::market::events::{EffectTarget, EventDefinition, EventEffect, TriggerCondition};
use crate::market::ModifierKey;
use crate::types::{CardDefinition, Mechanic, Rarity};

pub const GENESIS: &str = "genesis";
pub const MYTHIC_LEGENDS: &str = "mythic_legends";

/// Register every built-in set.
pub fn register_all(catalog: &mut Catalog) {
    catalog.register_set(genesis_set(), genesis_cards(), genesis_events());
    catalog.register_set(mythic_legends_set(), mythic_legends_cards(), mythic_legends_events());
}

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

pub fn genesis_set() -> SetDefinition {
    SetDefinition {
        id: GENESIS.into(),
        name: "Genesis".into(),
        release_year: 1,
        pack_price: dec!(4.99),
        layout: PackLayout::new(vec![
            PackSlot::Fixed {
                rarity: Rarity::Common,
                count: 7,
            },
            PackSlot::Fixed {
                rarity: Rarity::Uncommon,
                count: 3,
            },
            PackSlot::Weighted {
                choices: vec![
                    (Rarity::Rare, 80),
                    (Rarity::UltraRare, 15),
                    (Rarity::SecretRare, 5),
                ],
            },
        ]),
        rotation: None,
    }
}

pub fn genesis_cards() -> Vec<CardDefinition> {
    let g = |id: &str, name: &str, rarity: Rarity| CardDefinition::new(id, name, rarity, GENESIS);
    vec![
        g("GS001", "Sproutling", Rarity::Common),
        g("GS002", "Pebblepup", Rarity::Common),
        g("GS003", "Driftfin", Rarity::Common),
        g("GS004", "Cinderkit", Rarity::Common),
        g("GS005", "Mossmouse", Rarity::Common),
        g("GS006", "Puddlehop", Rarity::Common),
        g("GS007", "Zapling", Rarity::Common),
        g("GS008", "Dustbun", Rarity::Common),
        g("GS009", "Twigwhisk", Rarity::Common),
        g("GS010", "Coalcub", Rarity::Common),
        g("GS011", "Bramblebud", Rarity::Common),
        g("GS012", "Gustling", Rarity::Common),
        g("GS013", "Thornback", Rarity::Uncommon),
        g("GS014", "Tidecaller", Rarity::Uncommon),
        g("GS015", "Ashwing", Rarity::Uncommon),
        g("GS016", "Quartzhide", Rarity::Uncommon),
        g("GS017", "Sparkmane", Rarity::Uncommon),
        g("GS018", "Shadefox", Rarity::Uncommon),
        g("GS019", "Frostpaw", Rarity::Uncommon),
        g("GS020", "Ironshell", Rarity::Uncommon),
        g("GS021", "Blazehorn", Rarity::Rare),
        g("GS022", "Stormcrest", Rarity::Rare),
        g("GS023", "Verdant Titan", Rarity::Rare),
        g("GS024", "Abyssal Eel", Rarity::Rare),
        g("GS025", "Lunar Stag", Rarity::Rare),
        g("GS026", "Solar Phoenix", Rarity::UltraRare),
        g("GS027", "Crystal Wyrm", Rarity::UltraRare),
        g("GS028", "Void Leviathan", Rarity::UltraRare),
        g("GS029", "Genesis Prime", Rarity::SecretRare),
        g("GS030", "Worldtree Guardian", Rarity::SecretRare),
    ]
}

pub fn genesis_events() -> Vec<EventDefinition> {
    let rarity = |r: Rarity| ModifierKey::Rarity(r);
    vec![
        EventDefinition::new(
            "price_spike",
            "Price Spike",
            "A sudden increase in demand has caused prices to rise!",
            EventEffect {
                target: EffectTarget::OneOf(vec![
                    rarity(Rarity::Rare),
                    rarity(Rarity::UltraRare),
                    rarity(Rarity::SecretRare),
                ]),
                factor: dec!(1.5),
                duration: 3,
            },
        )
        .weight(5),
        EventDefinition::new(
            "market_crash",
            "Market Crash",
            "Oversupply has caused prices to plummet!",
            EventEffect {
                target: EffectTarget::OneOf(vec![rarity(Rarity::Common), rarity(Rarity::Uncommon)]),
                factor: dec!(0.7),
                duration: 3,
            },
        )
        .weight(5),
        EventDefinition::new(
            "rarity_demand",
            "Rarity Demand",
            "Collectors are seeking specific rarities!",
            EventEffect {
                target: EffectTarget::OneOf(vec![
                    rarity(Rarity::Common),
                    rarity(Rarity::Uncommon),
                    rarity(Rarity::Rare),
                    rarity(Rarity::UltraRare),
                    rarity(Rarity::SecretRare),
                ]),
                factor: dec!(1.3),
                duration: 5,
            },
        )
        .weight(5),
        EventDefinition::new(
            "set_popularity",
            "Set Popularity",
            "The Genesis set has become very popular!",
            EventEffect {
                target: EffectTarget::Fixed(ModifierKey::Set(GENESIS.into())),
                factor: dec!(1.2),
                duration: 7,
            },
        )
        .weight(5),
        EventDefinition::new(
            "card_spotlight",
            "Card Spotlight",
            "A specific card is getting a lot of attention!",
            EventEffect {
                target: EffectTarget::AnyCard,
                factor: dec!(2.0),
                duration: 4,
            },
        )
        .weight(5),
    ]
}

// ---------------------------------------------------------------------------
// Mythic Legends
// ---------------------------------------------------------------------------

pub fn mythic_legends_set() -> SetDefinition {
    SetDefinition {
        id: MYTHIC_LEGENDS.into(),
        name: "Mythic Legends".into(),
        release_year: 2,
        pack_price: dec!(12.99),
        layout: PackLayout::from_distribution(&[
            (Rarity::Common, 6.0),
            (Rarity::Uncommon, 2.0),
            (Rarity::Rare, 1.0),
            (Rarity::UltraRare, 0.8),
            (Rarity::SecretRare, 0.2),
            (Rarity::MythicRare, 0.1),
        ]),
        rotation: Some(RotationWindow {
            start_year: 2,
            end_year: 5,
        }),
    }
}

pub fn mythic_legends_cards() -> Vec<CardDefinition> {
    use Mechanic::{AncientPower, Legendary, MythicEvolution};
    use Rarity::{Common, MythicRare, Rare, UltraRare, Uncommon};

    let m = |id: &str, name: &str, rarity: Rarity| {
        CardDefinition::new(id, name, rarity, MYTHIC_LEGENDS)
    };
    vec![
        m("ML-001", "Drakonyx", UltraRare)
            .with_mechanic(AncientPower)
            .with_evolution(Some("ML-002"), None),
        m("ML-002", "Inferdrake", Rare)
            .with_mechanic(AncientPower)
            .with_evolution(Some("ML-003"), Some("ML-001")),
        m("ML-003", "Emberspark", Uncommon).with_evolution(None, Some("ML-002")),
        m("ML-004", "Poseidra", UltraRare).with_mechanic(Legendary),
        m("ML-005", "Krakenus", Rare).with_mechanic(AncientPower),
        m("ML-006", "Gaiarus", MythicRare).with_mechanic(Legendary),
        m("ML-007", "Terraquake", Rare),
        m("ML-008", "Zephyrix", UltraRare).with_mechanic(AncientPower),
        m("ML-009", "Stormwing", Rare),
        m("ML-010", "Chronos", MythicRare).with_mechanic(Legendary),
        m("ML-011", "Temporalis", UltraRare).with_mechanic(AncientPower),
        m("ML-012", "Lumina", Rare).with_evolution(None, Some("ML-013")),
        m("ML-013", "Solarus", UltraRare)
            .with_mechanic(MythicEvolution)
            .with_evolution(Some("ML-012"), None),
        m("ML-014", "Umbra", Rare).with_evolution(None, Some("ML-015")),
        m("ML-015", "Eclipsis", UltraRare)
            .with_mechanic(MythicEvolution)
            .with_evolution(Some("ML-014"), None),
        m("ML-016", "Frostbite", Uncommon).with_evolution(None, Some("ML-017")),
        m("ML-017", "Glacius", Rare).with_evolution(Some("ML-016"), Some("ML-018")),
        m("ML-018", "Borealis", UltraRare)
            .with_mechanic(MythicEvolution)
            .with_evolution(Some("ML-017"), None),
        m("ML-019", "Florafae", Common).with_evolution(None, Some("ML-020")),
        m("ML-020", "Sylvanus", Uncommon).with_evolution(Some("ML-019"), Some("ML-021")),
        m("ML-021", "Gaia's Heart", MythicRare)
            .with_mechanic(MythicEvolution)
            .with_evolution(Some("ML-020"), None),
        m("ML-022", "Sparklet", Common).with_evolution(None, Some("ML-023")),
        m("ML-023", "Voltaic", Uncommon).with_evolution(Some("ML-022"), Some("ML-024")),
        m("ML-024", "Thundergod", UltraRare)
            .with_mechanic(MythicEvolution)
            .with_evolution(Some("ML-023"), None),
        m("ML-025", "Psyshock", Uncommon).with_evolution(None, Some("ML-026")),
        m("ML-026", "Mentalis", Rare)
            .with_mechanic(AncientPower)
            .with_evolution(Some("ML-025"), None),
        m("ML-027", "Metallion", Uncommon),
        m("ML-028", "Forgemaster", Rare).with_mechanic(AncientPower),
        m("ML-029", "Toxica", Common).with_evolution(None, Some("ML-030")),
        m("ML-030", "Venomous", Uncommon).with_evolution(Some("ML-029"), None),
        m("ML-031", "Rockslide", Common).with_evolution(None, Some("ML-032")),
        m("ML-032", "Bouldergeist", Uncommon).with_evolution(Some("ML-031"), None),
        m("ML-033", "Spectralis", Uncommon).with_evolution(None, Some("ML-034")),
        m("ML-034", "Phantomus", Rare).with_evolution(Some("ML-033"), None),
        m("ML-035", "Buglet", Common).with_evolution(None, Some("ML-036")),
        m("ML-036", "Swarmind", Uncommon).with_evolution(Some("ML-035"), Some("ML-037")),
        m("ML-037", "Hivequeen", Rare).with_evolution(Some("ML-036"), None),
        m("ML-038", "Draconis", MythicRare).with_mechanic(Legendary),
        m("ML-039", "Celestia", MythicRare).with_mechanic(Legendary),
        m("ML-040", "Abyssus", MythicRare).with_mechanic(Legendary),
    ]
}

pub fn mythic_legends_events() -> Vec<EventDefinition> {
    let set = || EffectTarget::Fixed(ModifierKey::Set(MYTHIC_LEGENDS.into()));
    let mechanic = |m: Mechanic| EffectTarget::Fixed(ModifierKey::Mechanic(m));
    vec![
        EventDefinition::new(
            "mythic_legends_release",
            "Mythic Legends Release",
            "The new Mythic Legends set has been released! Cards from this set are in high demand.",
            EventEffect {
                target: set(),
                factor: dec!(1.5),
                duration: 10,
            },
        )
        .weight(10)
        .once()
        .trigger(TriggerCondition::from_year(2).on_day(1)),
        EventDefinition::new(
            "mythic_rare_demand",
            "Mythic Rare Demand",
            "Collectors are seeking Mythic Rare cards! Their value has increased significantly.",
            EventEffect {
                target: EffectTarget::Fixed(ModifierKey::Rarity(Rarity::MythicRare)),
                factor: dec!(2.0),
                duration: 5,
            },
        )
        .weight(5),
        EventDefinition::new(
            "legendary_spotlight",
            "Legendary Spotlight",
            "Cards with the Legendary mechanic are featured in a popular tournament!",
            EventEffect {
                target: mechanic(Mechanic::Legendary),
                factor: dec!(1.7),
                duration: 7,
            },
        )
        .weight(5),
        EventDefinition::new(
            "mythic_evolution_discovery",
            "Mythic Evolution Discovery",
            "A new way to use Mythic Evolution cards has been discovered!",
            EventEffect {
                target: mechanic(Mechanic::MythicEvolution),
                factor: dec!(1.8),
                duration: 6,
            },
        )
        .weight(5),
        EventDefinition::new(
            "ancient_power_tournament",
            "Ancient Power Tournament",
            "A tournament featuring Ancient Power cards has begun!",
            EventEffect {
                target: mechanic(Mechanic::AncientPower),
                factor: dec!(1.6),
                duration: 8,
            },
        )
        .weight(5),
        EventDefinition::new(
            "mythic_legends_reprint",
            "Mythic Legends Reprint",
            "Mythic Legends cards are being reprinted! Their value has temporarily decreased.",
            EventEffect {
                target: set(),
                factor: dec!(0.7),
                duration: 12,
            },
        )
        .weight(3)
        .trigger(TriggerCondition::from_year(3).from_day(180)),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::ScriptedRandom;

    #[test]
    fn test_builtin_catalog_contents() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.sets().count(), 2);
        assert_eq!(catalog.cards_in_set(GENESIS).len(), 30);
        assert_eq!(catalog.cards_in_set(MYTHIC_LEGENDS).len(), 40);
        assert_eq!(catalog.events().len(), 11);
        assert_eq!(catalog.require_set(MYTHIC_LEGENDS).unwrap().pack_price, dec!(12.99));
    }

    #[test]
    fn test_evolution_links_resolve() {
        let catalog = Catalog::builtin();
        for card in catalog.cards() {
            for link in [&card.evolves_from, &card.evolves_to].into_iter().flatten() {
                assert!(catalog.card(link).is_some(), "{} links to missing {link}", card.id);
            }
        }
        let drakonyx = catalog.card("ML-001").unwrap();
        assert_eq!(drakonyx.evolves_from.as_deref(), Some("ML-002"));
    }

    #[test]
    fn test_genesis_pack_has_eleven_cards() {
        let catalog = Catalog::builtin();
        let mut rng = ScriptedRandom::constant(0.3);
        let pack = catalog.draw_pack(GENESIS, &mut rng).unwrap();
        assert_eq!(pack.len(), 11);
        assert_eq!(pack.iter().filter(|c| c.rarity == Rarity::Common).count(), 7);
        assert_eq!(pack.iter().filter(|c| c.rarity == Rarity::Uncommon).count(), 3);
        assert_eq!(pack[10].rarity, Rarity::Rare);
    }

    #[test]
    fn test_mythic_pack_minimum_size() {
        let catalog = Catalog::builtin();
        // Every chance slot misses.
        let mut rng = ScriptedRandom::constant(0.99);
        let pack = catalog.draw_pack(MYTHIC_LEGENDS, &mut rng).unwrap();
        assert_eq!(pack.len(), 9);
    }

    #[test]
    fn test_registering_builtins_twice_is_noop() {
        let mut catalog = Catalog::builtin();
        register_all(&mut catalog);
        assert_eq!(catalog.card_count(), 70);
        assert_eq!(catalog.events().len(), 11);
    }
}
