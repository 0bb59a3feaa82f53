//! Shared types for the CARDBOARD economy core.
//!
//! These types form the data model used across all engines. They are
//! kept free of engine logic so that valuation, grading, market and
//! trading modules can depend on them without circular references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Monetary amount in dollars.
pub type Money = Decimal;

/// Catalog identifier of a card definition (e.g. `"ML-006"`).
pub type CardId = String;

/// Catalog identifier of a set (e.g. `"genesis"`).
pub type SetId = String;

/// Unique identifier of a single physical card.
pub type InstanceId = Uuid;

/// Roster identifier of an AI trader.
pub type TraderId = u32;

// ---------------------------------------------------------------------------
// Rarity
// ---------------------------------------------------------------------------

/// Card rarity tier.
///
/// Declaration order is the value ladder; `Unknown` sorts below everything
/// and receives the minimum base value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    Unknown,
    Common,
    Uncommon,
    /// Also sold as "Holo Rare".
    Rare,
    /// Also sold as "Alternate Art".
    UltraRare,
    /// Also sold as "Chase".
    SecretRare,
    MythicRare,
}

impl Rarity {
    /// The rarity ladder from lowest to highest (excludes `Unknown`).
    pub const LADDER: &'static [Rarity] = &[
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::UltraRare,
        Rarity::SecretRare,
        Rarity::MythicRare,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Rarity::Unknown => "Unknown",
            Rarity::Common => "Common",
            Rarity::Uncommon => "Uncommon",
            Rarity::Rare => "Rare",
            Rarity::UltraRare => "Ultra Rare",
            Rarity::SecretRare => "Secret Rare",
            Rarity::MythicRare => "Mythic Rare",
        }
    }

    /// Parse a rarity label, accepting the alternate print names.
    /// Unrecognised labels map to `Unknown`.
    pub fn from_label(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "common" => Rarity::Common,
            "uncommon" => Rarity::Uncommon,
            "rare" | "holo rare" | "holo" => Rarity::Rare,
            "ultra rare" | "alternate art" | "alt art" => Rarity::UltraRare,
            "secret rare" | "chase" => Rarity::SecretRare,
            "mythic rare" | "mythic" => Rarity::MythicRare,
            _ => Rarity::Unknown,
        }
    }

    /// Ultra Rare and above count as "high rarity" for trader interest.
    pub fn is_high(&self) -> bool {
        matches!(self, Rarity::UltraRare | Rarity::SecretRare | Rarity::MythicRare)
    }
}

impl From<String> for Rarity {
    fn from(s: String) -> Self {
        Rarity::from_label(&s)
    }
}

impl From<Rarity> for String {
    fn from(r: Rarity) -> Self {
        r.label().to_string()
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Condition
// ---------------------------------------------------------------------------

/// Physical condition of a card, ordered `Poor < ... < Mint`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    Unknown,
    Poor,
    Fair,
    Good,
    Excellent,
    NearMint,
    Mint,
}

impl Condition {
    /// Best to worst.
    pub const ALL: &'static [Condition] = &[
        Condition::Mint,
        Condition::NearMint,
        Condition::Excellent,
        Condition::Good,
        Condition::Fair,
        Condition::Poor,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Condition::Unknown => "Unknown",
            Condition::Poor => "Poor",
            Condition::Fair => "Fair",
            Condition::Good => "Good",
            Condition::Excellent => "Excellent",
            Condition::NearMint => "Near Mint",
            Condition::Mint => "Mint",
        }
    }

    pub fn from_label(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "mint" => Condition::Mint,
            "near mint" | "nm" => Condition::NearMint,
            "excellent" => Condition::Excellent,
            "good" => Condition::Good,
            "fair" => Condition::Fair,
            "poor" => Condition::Poor,
            _ => Condition::Unknown,
        }
    }
}

impl From<String> for Condition {
    fn from(s: String) -> Self {
        Condition::from_label(&s)
    }
}

impl From<Condition> for String {
    fn from(c: Condition) -> Self {
        c.label().to_string()
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Special mechanics
// ---------------------------------------------------------------------------

/// Special mechanic printed on some cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mechanic {
    Legendary,
    AncientPower,
    MythicEvolution,
    Other,
}

impl Mechanic {
    pub fn label(&self) -> &'static str {
        match self {
            Mechanic::Legendary => "Legendary",
            Mechanic::AncientPower => "Ancient Power",
            Mechanic::MythicEvolution => "Mythic Evolution",
            Mechanic::Other => "Other",
        }
    }

    pub fn from_label(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "legendary" => Mechanic::Legendary,
            "ancient power" => Mechanic::AncientPower,
            "mythic evolution" => Mechanic::MythicEvolution,
            _ => Mechanic::Other,
        }
    }
}

impl From<String> for Mechanic {
    fn from(s: String) -> Self {
        Mechanic::from_label(&s)
    }
}

impl From<Mechanic> for String {
    fn from(m: Mechanic) -> Self {
        m.label().to_string()
    }
}

impl fmt::Display for Mechanic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

/// In-game date. Both fields are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameDate {
    pub year: u32,
    pub day: u32,
}

impl GameDate {
    pub fn new(year: u32, day: u32) -> Self {
        Self { year, day }
    }

    /// The date `days` after this one, rolling over year boundaries.
    pub fn plus_days(&self, days: u32, days_per_year: u32) -> Self {
        let per_year = days_per_year.max(1);
        let zero_based = (self.day.saturating_sub(1)) + days;
        Self {
            year: self.year + zero_based / per_year,
            day: zero_based % per_year + 1,
        }
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Year {}, Day {}", self.year, self.day)
    }
}

/// The single tick source of the simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameClock {
    pub date: GameDate,
    pub days_per_year: u32,
}

impl GameClock {
    pub fn new(days_per_year: u32) -> Self {
        Self {
            date: GameDate::new(1, 1),
            days_per_year: days_per_year.max(1),
        }
    }

    /// Move to the next day. Returns `true` when a new year started.
    pub fn advance(&mut self) -> bool {
        self.date = self.date.plus_days(1, self.days_per_year);
        self.date.day == 1
    }

    /// Days left in the current year, counting today.
    pub fn days_remaining_in_year(&self) -> u32 {
        self.days_per_year.saturating_sub(self.date.day) + 1
    }
}

// ---------------------------------------------------------------------------
// Cards
// ---------------------------------------------------------------------------

/// Immutable catalog entry for a card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDefinition {
    pub id: CardId,
    pub name: String,
    pub rarity: Rarity,
    pub set: SetId,
    #[serde(default)]
    pub mechanic: Option<Mechanic>,
    #[serde(default)]
    pub evolves_from: Option<CardId>,
    #[serde(default)]
    pub evolves_to: Option<CardId>,
}

impl CardDefinition {
    pub fn new(id: &str, name: &str, rarity: Rarity, set: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            rarity,
            set: set.to_string(),
            mechanic: None,
            evolves_from: None,
            evolves_to: None,
        }
    }

    pub fn with_mechanic(mut self, mechanic: Mechanic) -> Self {
        self.mechanic = Some(mechanic);
        self
    }

    pub fn with_evolution(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.evolves_from = from.map(str::to_string);
        self.evolves_to = to.map(str::to_string);
        self
    }
}

impl fmt::Display for CardDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] ({})", self.name, self.id, self.rarity)
    }
}

/// Protection applied to a card instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Protection {
    pub sleeved: bool,
    pub toploadered: bool,
}

impl Protection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn full() -> Self {
        Self { sleeved: true, toploadered: true }
    }

    pub fn is_protected(&self) -> bool {
        self.sleeved || self.toploadered
    }
}

/// A single physical card owned by exactly one holder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardInstance {
    pub id: InstanceId,
    pub card_id: CardId,
    pub condition: Condition,
    #[serde(default)]
    pub protection: Protection,
    /// Professional grade 1-10, absent until graded.
    #[serde(default)]
    pub grade: Option<u8>,
    pub acquired: GameDate,
    /// Position inside the rarity's base-value band, rolled once at
    /// acquisition. `0` is the bottom of the band, `1` the top.
    pub base_roll: Decimal,
}

impl CardInstance {
    pub fn new(card_id: &str, condition: Condition, acquired: GameDate, base_roll: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            card_id: card_id.to_string(),
            condition,
            protection: Protection::none(),
            grade: None,
            acquired,
            base_roll: base_roll.clamp(Decimal::ZERO, Decimal::ONE),
        }
    }

    pub fn is_graded(&self) -> bool {
        self.grade.is_some()
    }
}

impl fmt::Display for CardInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.card_id, self.condition)?;
        if let Some(g) = self.grade {
            write!(f, " PSA {g}")?;
        }
        if self.protection.toploadered {
            write!(f, " [toploader]")
        } else if self.protection.sleeved {
            write!(f, " [sleeved]")
        } else {
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Ownership
// ---------------------------------------------------------------------------

/// Holder of an inventory. Ordered so that multi-owner locks can be taken
/// in a canonical sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OwnerId {
    Player,
    Trader(TraderId),
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerId::Player => write!(f, "player"),
            OwnerId::Trader(id) => write!(f, "trader#{id}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// One card refused by a grading service because of its value cap.
#[derive(Debug, Clone, PartialEq)]
pub struct LimitViolation {
    pub instance: InstanceId,
    pub card_name: String,
    pub value: Money,
    pub limit: Money,
}

impl fmt::Display for LimitViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}) valued ${:.2} exceeds ${:.2}",
            self.card_name, self.instance, self.value, self.limit
        )
    }
}

fn join_violations(v: &[LimitViolation]) -> String {
    v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join("; ")
}

/// Domain-specific error types. Every variant is recoverable; a failed
/// operation leaves the game state unchanged.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("Insufficient funds: need ${needed:.2}, have ${available:.2}")]
    InsufficientFunds { needed: Money, available: Money },

    #[error("{service} service cannot accept: {}", join_violations(.violations))]
    ValueExceedsServiceLimit {
        service: String,
        violations: Vec<LimitViolation>,
    },

    #[error("Nothing selected for {0}")]
    EmptySelection(String),

    #[error("Card instance {instance} not found in {owner}'s inventory")]
    InstanceNotFound { owner: OwnerId, instance: InstanceId },

    #[error("Card instance {0} selected more than once")]
    DuplicateInstance(InstanceId),

    #[error("{trader} cannot afford this trade: needs ${needed:.2}, has ${available:.2}")]
    CounterpartyCannotAfford {
        trader: String,
        needed: Money,
        available: Money,
    },

    #[error("Unknown card: {0}")]
    UnknownCard(CardId),

    #[error("Unknown set: {0}")]
    UnknownSet(SetId),

    #[error("Unknown trader: {0}")]
    UnknownTrader(TraderId),

    #[error("No sealed {0} pack to open")]
    NoSealedPack(SetId),

    #[error("No {0} left in stock")]
    NoSupplies(String),

    #[error("Card instance {0} already has that protection")]
    AlreadyProtected(InstanceId),

    #[error("Negotiation with {0} is closed")]
    NegotiationClosed(String),

    #[error("{0} withdrew the counter-offer: prices have moved since it was made")]
    CounterWithdrawn(String),

    #[error("Unknown owner: {0}")]
    UnknownOwner(OwnerId),

    #[error("An exchange needs two different owners, got {0} on both sides")]
    SelfExchange(OwnerId),

    #[error("Inventory lock poisoned for {0}")]
    StateLock(OwnerId),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
