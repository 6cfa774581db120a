use serde::{Deserialize, Serialize};
use tracing::debug;

use super::aggregate::{aggregate, check_max_points};
use super::breakdown::{round2, HelpRequestsBreakdown, RatingBreakdown};
use super::components::{
    calculate_helper, calculate_requester, calculate_stakeholder_ratings, calculate_task_ratings,
    calculate_tickets,
};
use super::config::RatingRules;
use super::error::RatingError;
use super::signals::{UserId, UserSignals};

/// Engine output for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRatingResult {
    pub user_id: UserId,
    pub breakdown: RatingBreakdown,
    /// Signed, rounded to two decimals for display.
    pub total_points: f64,
    pub max_points: f64,
    pub final_percentage: f64,
}

/// Stateless scorer bound to one rules snapshot and one `max_points` value.
#[derive(Debug, Clone)]
pub struct RatingEngine {
    rules: RatingRules,
    max_points: f64,
}

impl RatingEngine {
    pub fn new(rules: RatingRules, max_points: f64) -> Result<Self, RatingError> {
        check_max_points(max_points)?;
        Ok(Self { rules, max_points })
    }

    pub fn rate(&self, user_id: UserId, signals: &UserSignals) -> FinalRatingResult {
        if !signals.has_activity() {
            debug!(%user_id, "no qualifying activity in period");
        }

        let rules = &self.rules;
        let breakdown = RatingBreakdown {
            task_ratings: calculate_task_ratings(&signals.task_ratings, &rules.task_ratings),
            stakeholder_ratings: calculate_stakeholder_ratings(
                &signals.stakeholder_ratings,
                &rules.stakeholder_ratings,
            ),
            help_requests: HelpRequestsBreakdown {
                helper: calculate_helper(signals.help_given, &rules.help_requests_helper),
                requester: calculate_requester(
                    &signals.help_requested,
                    &rules.help_requests_requester,
                ),
            },
            tickets_resolved: calculate_tickets(
                signals.tickets_resolved,
                &rules.tickets_resolved,
            ),
        };

        let totals = aggregate(&breakdown, self.max_points);

        FinalRatingResult {
            user_id,
            breakdown,
            total_points: round2(totals.total_points),
            max_points: self.max_points,
            final_percentage: totals.final_percentage,
        }
    }
}
