//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section has defaults, so a partial (or missing) file still yields a
//! playable session.

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::market::rotation::RotationConfig;
use crate::market::MarketConfig;
use crate::trading::RosterConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub market: MarketSection,
    pub rotation: RotationConfig,
    pub trading: TradingConfig,
    pub autoplay: AutoplayConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub starting_cash: Decimal,
    pub days_per_year: u32,
    /// Fixed seed for a reproducible session; random when absent.
    pub seed: Option<u64>,
    pub trader_count: usize,
    pub trader_inventory_size: usize,
    pub starting_sleeves: u32,
    pub starting_toploaders: u32,
    /// Card ids handed to the player on a fresh start.
    pub starter_cards: Vec<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            starting_cash: dec!(50.00),
            days_per_year: 365,
            seed: None,
            trader_count: 8,
            trader_inventory_size: 20,
            starting_sleeves: 100,
            starting_toploaders: 50,
            starter_cards: vec!["GS001".into(), "GS004".into(), "GS010".into()],
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MarketSection {
    /// Probability that a market event fires on any given day.
    pub event_chance: f64,
}

impl Default for MarketSection {
    fn default() -> Self {
        Self { event_chance: 0.15 }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TradingConfig {
    /// Reject offers once a personality's round cap is used up.
    pub enforce_round_cap: bool,
    /// Chance a stocked trader card arrives pre-graded.
    pub graded_chance: f64,
    pub min_trader_cash: Decimal,
    pub max_trader_cash: Decimal,
}

impl Default for TradingConfig {
    fn default() -> Self {
        Self {
            enforce_round_cap: true,
            graded_chance: 0.2,
            min_trader_cash: dec!(100),
            max_trader_cash: dec!(1000),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AutoplayConfig {
    /// Wall-clock seconds between simulated days.
    pub tick_interval_secs: u64,
    /// Stop after this many days; `0` runs until interrupted.
    pub max_days: u32,
    pub save_path: String,
    /// Buy and open a pack whenever cash allows.
    pub buy_packs: bool,
    /// Accept every AI offer at or above market value.
    pub accept_fair_offers: bool,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 1,
            max_days: 30,
            save_path: "cardboard_state.json".into(),
            buy_packs: true,
            accept_fair_offers: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults. A file
    /// that exists but does not parse is still an error.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            info!(path, "No config file found, using defaults");
            Ok(Self::default())
        }
    }

    pub fn market_config(&self) -> MarketConfig {
        MarketConfig {
            event_chance: self.market.event_chance.clamp(0.0, 1.0),
            rotation: self.rotation.clone(),
        }
    }

    pub fn roster_config(&self) -> RosterConfig {
        RosterConfig {
            trader_count: self.session.trader_count,
            inventory_size: self.session.trader_inventory_size,
            min_cash: self.trading.min_trader_cash,
            max_cash: self.trading.max_trader_cash.max(self.trading.min_trader_cash),
            graded_chance: self.trading.graded_chance,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
