//! Trader personalities.
//!
//! A closed set of archetypes, each with a fixed parameter record: what the
//! trader cares about and how hard it bargains.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Condition, Rarity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Personality {
    Collector,
    Investor,
    Casual,
    Competitive,
}

/// How much a personality values each aspect of a card (0..1).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterestWeights {
    pub complete_set: Decimal,
    pub high_rarity: Decimal,
    pub condition: Decimal,
    pub value: Decimal,
    pub personal: Decimal,
    pub power: Decimal,
}

/// Bargaining parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegotiationParams {
    /// Opening offer as a fraction of perceived value.
    pub initial_offer: Decimal,
    /// Fraction of value the trader insists on keeping.
    pub counter_threshold: Decimal,
    pub max_rounds: u32,
}

/// Condition and protection habits of a trader's own stock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockProfile {
    /// Weights over `Condition::ALL` (Mint first).
    pub condition_weights: [f64; 6],
    pub sleeve_chance: f64,
    pub toploader_chance: f64,
}

impl Personality {
    pub const ALL: [Personality; 4] = [
        Personality::Collector,
        Personality::Investor,
        Personality::Casual,
        Personality::Competitive,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Personality::Collector => "Collector",
            Personality::Investor => "Investor",
            Personality::Casual => "Casual",
            Personality::Competitive => "Competitive",
        }
    }

    pub fn interests(&self) -> InterestWeights {
        let zero = Decimal::ZERO;
        match self {
            Personality::Collector => InterestWeights {
                complete_set: dec!(0.8),
                high_rarity: dec!(0.7),
                condition: dec!(0.6),
                value: dec!(0.3),
                personal: zero,
                power: zero,
            },
            Personality::Investor => InterestWeights {
                complete_set: dec!(0.4),
                high_rarity: dec!(0.8),
                condition: dec!(0.7),
                value: dec!(0.9),
                personal: zero,
                power: zero,
            },
            Personality::Casual => InterestWeights {
                complete_set: dec!(0.4),
                high_rarity: dec!(0.3),
                condition: zero,
                value: dec!(0.5),
                personal: dec!(0.9),
                power: zero,
            },
            Personality::Competitive => InterestWeights {
                complete_set: zero,
                high_rarity: dec!(0.8),
                condition: dec!(0.6),
                value: dec!(0.7),
                personal: zero,
                power: dec!(0.9),
            },
        }
    }

    pub fn negotiation(&self) -> NegotiationParams {
        match self {
            Personality::Collector => NegotiationParams {
                initial_offer: dec!(0.9),
                counter_threshold: dec!(0.85),
                max_rounds: 3,
            },
            Personality::Investor => NegotiationParams {
                initial_offer: dec!(0.8),
                counter_threshold: dec!(0.9),
                max_rounds: 5,
            },
            Personality::Casual => NegotiationParams {
                initial_offer: dec!(1.0),
                counter_threshold: dec!(0.95),
                max_rounds: 2,
            },
            Personality::Competitive => NegotiationParams {
                initial_offer: dec!(0.85),
                counter_threshold: dec!(0.9),
                max_rounds: 4,
            },
        }
    }

    pub fn stock_profile(&self) -> StockProfile {
        match self {
            Personality::Collector => StockProfile {
                condition_weights: [0.4, 0.3, 0.2, 0.1, 0.0, 0.0],
                sleeve_chance: 0.9,
                toploader_chance: 0.5,
            },
            Personality::Investor => StockProfile {
                condition_weights: [0.5, 0.3, 0.1, 0.1, 0.0, 0.0],
                sleeve_chance: 0.95,
                toploader_chance: 0.7,
            },
            Personality::Casual => StockProfile {
                condition_weights: [0.2, 0.2, 0.2, 0.2, 0.1, 0.1],
                sleeve_chance: 0.5,
                toploader_chance: 0.1,
            },
            Personality::Competitive => StockProfile {
                condition_weights: [0.3, 0.3, 0.2, 0.1, 0.1, 0.0],
                sleeve_chance: 0.8,
                toploader_chance: 0.3,
            },
        }
    }

    /// Interest-chance bonus for a card of `rarity`.
    pub fn rarity_interest(&self, rarity: Rarity) -> f64 {
        let hoarder = matches!(self, Personality::Collector | Personality::Investor);
        match rarity {
            Rarity::Unknown => 0.0,
            Rarity::Common => {
                if *self == Personality::Casual {
                    0.3
                } else {
                    0.0
                }
            }
            Rarity::Uncommon => {
                if *self == Personality::Casual {
                    0.2
                } else {
                    0.1
                }
            }
            Rarity::Rare => 0.2,
            Rarity::UltraRare => {
                if hoarder {
                    0.4
                } else {
                    0.2
                }
            }
            Rarity::SecretRare | Rarity::MythicRare => {
                if hoarder {
                    0.6
                } else {
                    0.3
                }
            }
        }
    }

    /// Perceived-value adjustment from a card's condition.
    pub fn condition_adjustment(&self, condition: Condition) -> Decimal {
        let weight = self.interests().condition;
        match condition {
            Condition::Mint => weight * dec!(0.2),
            Condition::NearMint => weight * dec!(0.1),
            Condition::Fair | Condition::Poor => -weight * dec!(0.1),
            _ => Decimal::ZERO,
        }
    }
}

impl fmt::Display for Personality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
