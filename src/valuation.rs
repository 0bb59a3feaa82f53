//! Card valuation.
//!
//! `market_value` turns a card definition, an owned instance and the live
//! market modifiers into a dollar price:
//!
//! ```text
//! base   = band_low + base_roll × (band_high − band_low)
//! value  = base × (condition + protection)
//!        × grade multiplier      (graded instances only)
//!        × mechanic multiplier   (cards with a mechanic only)
//!        × market factor
//! ```
//!
//! The base roll is stored on the instance when it is acquired, so a card's
//! value only moves when its state or the market does.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::market::{market_factor, MarketModifier};
use crate::random::RandomSource;
use crate::types::{CardDefinition, CardInstance, Condition, Mechanic, Money, Protection, Rarity};

// ---------------------------------------------------------------------------
// Lookup tables
// ---------------------------------------------------------------------------

/// Base-value band `(low, high)` for a rarity. Unknown rarity gets a flat
/// minimum.
pub fn base_band(rarity: Rarity) -> (Money, Money) {
    match rarity {
        Rarity::Unknown => (dec!(0.10), dec!(0.10)),
        Rarity::Common => (dec!(0.50), dec!(1.00)),
        Rarity::Uncommon => (dec!(1.00), dec!(2.00)),
        Rarity::Rare => (dec!(2.00), dec!(5.00)),
        Rarity::UltraRare => (dec!(5.00), dec!(15.00)),
        Rarity::SecretRare => (dec!(15.00), dec!(50.00)),
        Rarity::MythicRare => (dec!(50.00), dec!(100.00)),
    }
}

/// Base value at position `roll` (0..=1) inside the rarity's band.
pub fn base_value(rarity: Rarity, roll: Decimal) -> Money {
    let (low, high) = base_band(rarity);
    let roll = roll.clamp(Decimal::ZERO, Decimal::ONE);
    low + (high - low) * roll
}

pub fn condition_multiplier(condition: Condition) -> Decimal {
    match condition {
        Condition::Mint => dec!(1.0),
        Condition::NearMint => dec!(0.9),
        Condition::Excellent => dec!(0.8),
        Condition::Good => dec!(0.6),
        Condition::Fair => dec!(0.4),
        Condition::Poor => dec!(0.2),
        Condition::Unknown => dec!(0.5),
    }
}

/// Additive protection bonus.
pub fn protection_bonus(protection: Protection) -> Decimal {
    let mut bonus = Decimal::ZERO;
    if protection.sleeved {
        bonus += dec!(0.10);
    }
    if protection.toploadered {
        bonus += dec!(0.15);
    }
    bonus
}

/// Value multiplier for a professional grade. Out-of-range grades clamp
/// to 1..=10.
pub fn grade_multiplier(grade: u8) -> Decimal {
    match grade.clamp(1, 10) {
        1 => dec!(0.8),
        2 => dec!(1.0),
        3 => dec!(1.1),
        4 => dec!(1.2),
        5 => dec!(1.3),
        6 => dec!(1.5),
        7 => dec!(1.7),
        8 => dec!(2.0),
        9 => dec!(2.5),
        _ => dec!(3.0),
    }
}

pub fn mechanic_multiplier(mechanic: Mechanic) -> Decimal {
    match mechanic {
        Mechanic::Legendary => dec!(1.5),
        Mechanic::MythicEvolution => dec!(1.4),
        Mechanic::AncientPower => dec!(1.3),
        Mechanic::Other => dec!(1.0),
    }
}

// ---------------------------------------------------------------------------
// Valuation
// ---------------------------------------------------------------------------

/// Value of `instance` before market modifiers.
pub fn intrinsic_value(card: &CardDefinition, instance: &CardInstance) -> Money {
    let base = base_value(card.rarity, instance.base_roll);
    let mut value =
        base * (condition_multiplier(instance.condition) + protection_bonus(instance.protection));

    if let Some(grade) = instance.grade {
        value *= grade_multiplier(grade);
    }
    if let Some(mechanic) = card.mechanic {
        value *= mechanic_multiplier(mechanic);
    }
    value
}

/// Market value of `instance` under the given modifiers.
pub fn market_value(
    card: &CardDefinition,
    instance: &CardInstance,
    modifiers: &[MarketModifier],
) -> Money {
    (intrinsic_value(card, instance) * market_factor(card, modifiers)).round_dp(2)
}

/// Draw the once-per-instance position inside the rarity band.
pub fn roll_base(rng: &mut dyn RandomSource) -> Decimal {
    Decimal::from_f64_retain(rng.next_f64())
        .unwrap_or(dec!(0.5))
        .round_dp(4)
        .clamp(Decimal::ZERO, Decimal::ONE)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
