//! Persistence layer.
//!
//! Saves and loads the game state to/from a JSON file. The state is wrapped
//! in an envelope carrying the save time and a format version. Derived
//! values (card prices, collection value) are never written; they are
//! recomputed from the catalog after loading.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::state::GameState;

/// Default state file path.
const DEFAULT_STATE_FILE: &str = "cardboard_state.json";

/// Current save format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SaveFile {
    version: u32,
    saved_at: DateTime<Utc>,
    state: GameState,
}

/// Save game state to a JSON file.
pub fn save_state(state: &GameState, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    let file = SaveFile {
        version: FORMAT_VERSION,
        saved_at: Utc::now(),
        state: state.clone(),
    };
    let json = serde_json::to_string_pretty(&file).context("Failed to serialise game state")?;

    std::fs::write(path, &json).context(format!("Failed to write state to {path}"))?;

    debug!(path, date = %state.today(), cash = %state.player.cash, "State saved");
    Ok(())
}

/// Load game state from a JSON file.
/// Returns None if the file doesn't exist (fresh start).
pub fn load_state(path: Option<&str>) -> Result<Option<GameState>> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved state found, starting fresh");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path).context(format!("Failed to read state from {path}"))?;

    let file: SaveFile =
        serde_json::from_str(&json).context(format!("Failed to parse state from {path}"))?;
    if file.version > FORMAT_VERSION {
        bail!(
            "State file {path} has format version {}, this build reads up to {FORMAT_VERSION}",
            file.version
        );
    }

    let state = file.state;
    info!(
        path,
        saved_at = %file.saved_at,
        date = %state.today(),
        cash = %state.player.cash,
        cards = state.player.collection.count_all(),
        traders = state.traders.len(),
        "State loaded from disk"
    );

    Ok(Some(state))
}

/// Delete the state file (for testing or reset).
pub fn delete_state(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_STATE_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path).context(format!("Failed to delete state file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::grading::{GradingEngine, ServiceTier};
    use crate::market::{MarketModifier, ModifierKey, ModifierSource};
    use crate::trading::personality::Personality;
    use crate::trading::Trader;
    use crate::types::{CardInstance, Condition, GameDate, Rarity};
    use rust_decimal_macros::dec;

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("cardboard_test_state_{}.json", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_save_and_load() {
        let path = temp_path();
        let state = GameState::new(dec!(100), 365);
        save_state(&state, Some(&path)).unwrap();

        let loaded = load_state(Some(&path)).unwrap();
        assert!(loaded.is_some());
        let loaded = loaded.unwrap();
        assert_eq!(loaded.player.cash, dec!(100));
        assert_eq!(loaded.today(), GameDate::new(1, 1));

        delete_state(Some(&path)).unwrap();
    }

    #[test]
    fn test_load_nonexistent() {
        let path = "/tmp/cardboard_nonexistent_state_12345.json";
        let loaded = load_state(Some(path)).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_save_preserves_graph() {
        let path = temp_path();
        let catalog = Catalog::builtin();
        let mut state = GameState::new(dec!(500), 365);
        state.clock.date = GameDate::new(2, 40);

        let mut kept = CardInstance::new("GS021", Condition::NearMint, GameDate::new(1, 3), dec!(0.25));
        kept.grade = Some(9);
        kept.protection.sleeved = true;
        let kept_id = kept.id;
        state.player.collection.insert(kept);

        let graded = CardInstance::new("GS001", Condition::Mint, GameDate::new(1, 3), dec!(0.5));
        let graded_id = graded.id;
        state.player.collection.insert(graded);
        GradingEngine::submit(&mut state, &catalog, ServiceTier::Standard, &[graded_id]).unwrap();

        state.market.install(MarketModifier::new(
            ModifierKey::Rarity(Rarity::Rare),
            dec!(1.5),
            3,
            ModifierSource::Event("price_spike".into()),
        ));
        let mut trader = Trader::new(2, "Taylor Kim", Personality::Investor, dec!(321.45));
        trader.reputation = 70;
        trader.interests.sets.insert("genesis".into());
        state.traders.push(trader);
        state.player.sealed_packs.insert("genesis".into(), 2);
        state.stats.packs_opened = 4;

        save_state(&state, Some(&path)).unwrap();
        let loaded = load_state(Some(&path)).unwrap().unwrap();

        assert_eq!(loaded.today(), GameDate::new(2, 40));
        assert_eq!(loaded.player.cash, dec!(485));
        assert_eq!(loaded.player.collection, state.player.collection);
        assert_eq!(loaded.player.collection.get(kept_id).unwrap().grade, Some(9));
        assert_eq!(loaded.grading.submitted, state.grading.submitted);
        assert_eq!(loaded.grading.submitted[0].instances[0].id, graded_id);
        assert_eq!(loaded.market.modifiers, state.market.modifiers);
        assert_eq!(loaded.traders, state.traders);
        assert_eq!(loaded.sealed_count("genesis"), 2);
        assert_eq!(loaded.stats, state.stats);
        assert_eq!(loaded.collection_value(&catalog), state.collection_value(&catalog));

        delete_state(Some(&path)).unwrap();
    }

    #[test]
    fn test_newer_format_is_refused() {
        let path = temp_path();
        let file = SaveFile {
            version: FORMAT_VERSION + 1,
            saved_at: Utc::now(),
            state: GameState::new(dec!(1), 365),
        };
        std::fs::write(&path, serde_json::to_string(&file).unwrap()).unwrap();
        assert!(load_state(Some(&path)).is_err());
        delete_state(Some(&path)).unwrap();
    }

    #[test]
    fn test_delete_state() {
        let path = temp_path();
        save_state(&GameState::new(dec!(50), 365), Some(&path)).unwrap();
        assert!(Path::new(&path).exists());

        delete_state(Some(&path)).unwrap();
        assert!(!Path::new(&path).exists());
    }

    #[test]
    fn test_delete_nonexistent_ok() {
        let result = delete_state(Some("/tmp/cardboard_does_not_exist_xyz.json"));
        assert!(result.is_ok());
    }
}
