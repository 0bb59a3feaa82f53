//! Day cycle: the single tick that moves the simulation forward.
//!
//! Order per call: clock → modifier/event decay → event roll → grading
//! resolution → set rotation → stats.

use tracing::info;

use crate::catalog::Catalog;
use crate::grading::{GradingEngine, GradingSubmission};
use crate::market::events::EventRecord;
use crate::market::rotation::RotationChange;
use crate::market::{ActiveEvent, MarketEngine, MarketModifier};
use crate::random::RandomSource;
use crate::state::GameState;
use crate::types::GameDate;

/// Everything that happened during one day advance.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub date: GameDate,
    pub new_year: bool,
    pub expired_modifiers: Vec<MarketModifier>,
    pub ended_events: Vec<ActiveEvent>,
    pub fired_event: Option<EventRecord>,
    pub graded: Vec<GradingSubmission>,
    pub rotation: Vec<RotationChange>,
}

pub struct DayCycle;

impl DayCycle {
    /// Advance the clock by one day and run every daily step.
    pub fn advance(
        state: &mut GameState,
        catalog: &Catalog,
        market: &MarketEngine,
        rng: &mut dyn RandomSource,
    ) -> DayReport {
        let new_year = state.clock.advance();
        let today = state.today();
        if new_year {
            info!(year = today.year, "New year");
        }

        let expired = market.decay(&mut state.market);

        let fired_event = market.maybe_fire_event(&mut state.market, catalog, today, rng);
        if fired_event.is_some() {
            state.stats.market_events += 1;
        }

        let graded = GradingEngine::resolve_due(state, rng);

        let rotation = market.apply_rotation(&mut state.market, catalog, &state.clock);

        state.stats.days_played += 1;

        let report = DayReport {
            date: today,
            new_year,
            expired_modifiers: expired.modifiers,
            ended_events: expired.events,
            fired_event,
            graded,
            rotation,
        };

        info!(
            date = %report.date,
            event = report.fired_event.as_ref().map(|e| e.name.as_str()).unwrap_or("-"),
            expired = report.expired_modifiers.len(),
            graded = report.graded.len(),
            rotation = report.rotation.len(),
            cash = format!("${:.2}", state.player.cash),
            "Day advanced"
        );
        report
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
