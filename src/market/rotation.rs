//! Set rotation: pre-rotation hype, post-rotation drop, linear recovery,
//! then a long-lived collectible premium.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{MarketModifier, MarketState, ModifierKey, ModifierSource};
use crate::catalog::{Catalog, RotationWindow};
use crate::types::{GameClock, SetId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationConfig {
    /// Years before `end_year` during which the hype boost applies.
    pub pre_rotation_years: u32,
    pub pre_rotation_factor: Decimal,
    /// Factor during the rotation year itself.
    pub post_rotation_drop: Decimal,
    /// Years over which the drop recovers to `collectible_factor`.
    pub recovery_years: u32,
    pub collectible_factor: Decimal,
    pub collectible_duration_days: u32,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            pre_rotation_years: 1,
            pre_rotation_factor: dec!(1.3),
            post_rotation_drop: dec!(0.7),
            recovery_years: 2,
            collectible_factor: dec!(1.5),
            collectible_duration_days: 365,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotationPhase {
    PreRotation,
    Rotated,
    /// `years_after` years past the rotation year.
    Recovering { years_after: u32 },
    Collectible,
}

/// A rotation modifier installed today.
#[derive(Debug, Clone, PartialEq)]
pub struct RotationChange {
    pub set_id: SetId,
    pub phase: RotationPhase,
    pub factor: Decimal,
    pub duration: u32,
}

/// Rotation phase of a set in `year`, with the factor it implies.
pub fn phase_for(
    window: &RotationWindow,
    year: u32,
    config: &RotationConfig,
) -> Option<(RotationPhase, Decimal)> {
    if year < window.end_year {
        let years_until = window.end_year - year;
        if years_until <= config.pre_rotation_years {
            return Some((RotationPhase::PreRotation, config.pre_rotation_factor));
        }
        return None;
    }
    if year == window.end_year {
        return Some((RotationPhase::Rotated, config.post_rotation_drop));
    }

    let years_after = year - window.end_year;
    if years_after <= config.recovery_years {
        let progress = Decimal::from(years_after) / Decimal::from(config.recovery_years.max(1));
        let factor = config.post_rotation_drop
            + (config.collectible_factor - config.post_rotation_drop) * progress;
        return Some((RotationPhase::Recovering { years_after }, factor));
    }
    if years_after == config.recovery_years + 1 {
        return Some((RotationPhase::Collectible, config.collectible_factor));
    }
    None
}

/// Install today's rotation modifiers. Phase modifiers last until the end
/// of the current year, so the post-rotation drop covers the whole
/// rotation year; the collectible premium is installed once, on the first
/// day of its year.
pub fn apply(
    market: &mut MarketState,
    catalog: &Catalog,
    clock: &GameClock,
    config: &RotationConfig,
) -> Vec<RotationChange> {
    let year = clock.date.year;
    let mut changes = Vec::new();

    for set in catalog.sets() {
        let Some(window) = set.rotation else { continue };
        let Some((phase, factor)) = phase_for(&window, year, config) else { continue };

        let duration = match phase {
            RotationPhase::Collectible => {
                if clock.date.day != 1 {
                    continue;
                }
                config.collectible_duration_days
            }
            _ => clock.days_remaining_in_year(),
        };

        // Already running at this factor: leave it alone.
        if let Some(existing) = market.rotation_modifier(&set.id) {
            if existing.factor == factor && phase != RotationPhase::Collectible {
                continue;
            }
        }

        market.install(MarketModifier::new(
            ModifierKey::Set(set.id.clone()),
            factor,
            duration,
            ModifierSource::Rotation,
        ));
        info!(
            set = %set.id,
            phase = ?phase,
            factor = %factor,
            days = duration,
            "Rotation modifier applied"
        );
        changes.push(RotationChange {
            set_id: set.id.clone(),
            phase,
            factor,
            duration,
        });
    }
    changes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
