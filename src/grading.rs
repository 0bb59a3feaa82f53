//! Professional grading.
//!
//! Cards are submitted to a service tier, leave the collection while in
//! flight, and come back with a 1-10 grade once the tier's turnaround has
//! elapsed. A submission goes `Pending -> Completed` and is never deleted.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::random::RandomSource;
use crate::state::GameState;
use crate::types::{
    CardInstance, Condition, GameDate, GameError, InstanceId, LimitViolation, Money, OwnerId,
};
use crate::valuation;

// ---------------------------------------------------------------------------
// Service tiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceTier {
    Standard,
    Express,
    Premium,
    Ultra,
}

impl ServiceTier {
    pub const ALL: [ServiceTier; 4] = [
        ServiceTier::Standard,
        ServiceTier::Express,
        ServiceTier::Premium,
        ServiceTier::Ultra,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ServiceTier::Standard => "Standard",
            ServiceTier::Express => "Express",
            ServiceTier::Premium => "Premium",
            ServiceTier::Ultra => "Ultra",
        }
    }

    /// Price per card.
    pub fn cost(&self) -> Money {
        match self {
            ServiceTier::Standard => dec!(15.00),
            ServiceTier::Express => dec!(30.00),
            ServiceTier::Premium => dec!(75.00),
            ServiceTier::Ultra => dec!(150.00),
        }
    }

    pub fn turnaround_days(&self) -> u32 {
        match self {
            ServiceTier::Standard => 15,
            ServiceTier::Express => 7,
            ServiceTier::Premium => 3,
            ServiceTier::Ultra => 1,
        }
    }

    /// Highest card value the service will accept; `None` is unlimited.
    pub fn max_value(&self) -> Option<Money> {
        match self {
            ServiceTier::Standard => Some(dec!(500.00)),
            ServiceTier::Express => Some(dec!(1000.00)),
            ServiceTier::Premium => Some(dec!(5000.00)),
            ServiceTier::Ultra => None,
        }
    }
}

impl fmt::Display for ServiceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubmissionStatus {
    Pending,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingSubmission {
    pub id: Uuid,
    pub service: ServiceTier,
    /// The cards in flight. They are in no inventory until returned.
    pub instances: Vec<CardInstance>,
    pub submitted_on: GameDate,
    pub completion_date: GameDate,
    pub cost: Money,
    pub status: SubmissionStatus,
    #[serde(default)]
    pub completed_on: Option<GameDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GradingLedger {
    /// Pending submissions.
    pub submitted: Vec<GradingSubmission>,
    pub completed: Vec<GradingSubmission>,
}

impl GradingLedger {
    pub fn pending_count(&self) -> usize {
        self.submitted.len()
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &CardInstance> {
        self.submitted.iter().flat_map(|s| s.instances.iter())
    }
}

// ---------------------------------------------------------------------------
// Grade rolls
// ---------------------------------------------------------------------------

/// Outcome of grading one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GradeRoll {
    /// Grade after condition and protection, before the random nudge.
    pub pre_nudge: u8,
    pub grade: u8,
}

/// Inclusive grade range for a condition.
pub fn grade_range(condition: Condition) -> (u8, u8) {
    match condition {
        Condition::Mint => (8, 10),
        Condition::NearMint => (6, 8),
        Condition::Excellent => (4, 6),
        Condition::Good => (2, 4),
        Condition::Fair => (1, 2),
        Condition::Poor => (1, 1),
        Condition::Unknown => (1, 5),
    }
}

/// Grade a card: condition range, +1 per protection type (max 10), then a
/// single draw that bumps the grade up or down 10% of the time each.
pub fn roll_grade(instance: &CardInstance, rng: &mut dyn RandomSource) -> GradeRoll {
    let mut grade = match instance.condition {
        Condition::Poor => 1,
        c => {
            let (low, high) = grade_range(c);
            rng.range_inclusive(low as u32, high as u32) as u8
        }
    };

    if instance.protection.sleeved {
        grade = (grade + 1).min(10);
    }
    if instance.protection.toploadered {
        grade = (grade + 1).min(10);
    }
    let pre_nudge = grade;

    let r = rng.next_f64();
    if r > 0.9 && grade < 10 {
        grade += 1;
    } else if r < 0.1 && grade > 1 {
        grade -= 1;
    }

    GradeRoll { pre_nudge, grade }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Stateless grading service operating on the game state.
pub struct GradingEngine;

impl GradingEngine {
    /// Submit player cards to `service`.
    ///
    /// Validation happens in full before anything changes: empty or
    /// duplicate selections, cards not in the collection, cash below
    /// `cost × count`, and every card whose value exceeds the tier cap.
    pub fn submit(
        state: &mut GameState,
        catalog: &Catalog,
        service: ServiceTier,
        instance_ids: &[InstanceId],
    ) -> Result<GradingSubmission, GameError> {
        if instance_ids.is_empty() {
            return Err(GameError::EmptySelection("grading submission".into()));
        }
        let mut seen = HashSet::new();
        for id in instance_ids {
            if !seen.insert(*id) {
                return Err(GameError::DuplicateInstance(*id));
            }
        }

        let mut violations = Vec::new();
        for id in instance_ids {
            let instance = state.player.collection.get(*id).ok_or(GameError::InstanceNotFound {
                owner: OwnerId::Player,
                instance: *id,
            })?;
            let card = catalog.require_card(&instance.card_id)?;
            let value = valuation::market_value(card, instance, &state.market.modifiers);
            if let Some(limit) = service.max_value() {
                if value > limit {
                    violations.push(LimitViolation {
                        instance: *id,
                        card_name: card.name.clone(),
                        value,
                        limit,
                    });
                }
            }
        }

        let cost = service.cost() * Decimal::from(instance_ids.len());
        if state.player.cash < cost {
            return Err(GameError::InsufficientFunds {
                needed: cost,
                available: state.player.cash,
            });
        }
        if !violations.is_empty() {
            warn!(service = %service, rejected = violations.len(), "Cards exceed service cap");
            return Err(GameError::ValueExceedsServiceLimit {
                service: service.name().to_string(),
                violations,
            });
        }

        // Validated: mutate.
        state.spend(cost)?;
        let mut instances = Vec::with_capacity(instance_ids.len());
        for id in instance_ids {
            if let Some(inst) = state.player.collection.remove(*id) {
                instances.push(inst);
            }
        }

        let today = state.today();
        let submission = GradingSubmission {
            id: Uuid::new_v4(),
            service,
            instances,
            submitted_on: today,
            completion_date: today.plus_days(service.turnaround_days(), state.clock.days_per_year),
            cost,
            status: SubmissionStatus::Pending,
            completed_on: None,
        };
        info!(
            submission = %submission.id,
            service = %service,
            cards = submission.instances.len(),
            cost = format!("${:.2}", cost),
            due = %submission.completion_date,
            "Cards submitted for grading"
        );
        state.grading.submitted.push(submission.clone());
        Ok(submission)
    }

    /// Grade and return every pending submission due on or before today.
    /// Already-completed submissions are never touched again.
    pub fn resolve_due(state: &mut GameState, rng: &mut dyn RandomSource) -> Vec<GradingSubmission> {
        let today = state.today();
        let (due, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut state.grading.submitted)
            .into_iter()
            .partition(|s| s.completion_date <= today);
        state.grading.submitted = pending;

        let mut resolved = Vec::with_capacity(due.len());
        for mut submission in due {
            for instance in &mut submission.instances {
                let roll = roll_grade(instance, rng);
                instance.grade = Some(roll.grade);
                state.player.collection.insert(instance.clone());
            }
            submission.status = SubmissionStatus::Completed;
            submission.completed_on = Some(today);
            state.stats.cards_graded += submission.instances.len() as u32;

            info!(
                submission = %submission.id,
                service = %submission.service,
                grades = ?submission.instances.iter().filter_map(|i| i.grade).collect::<Vec<_>>(),
                "Graded cards returned"
            );
            state.grading.completed.push(submission.clone());
            resolved.push(submission);
        }
        resolved
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
