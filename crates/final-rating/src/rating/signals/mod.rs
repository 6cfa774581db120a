//! Raw signal records and the port the engine uses to obtain them.
//!
//! The engine never performs I/O itself: a [`SignalSource`] is asked once per
//! period for every candidate user and the calculators work on those
//! pre-fetched slices.

mod export;
mod ledger;

pub use ledger::{SignalEntry, SignalEvent, SignalLedger};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::config::PenaltyCategory;
use super::period::RatingPeriod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Rating a user received on one task. Weights and percentages are 0-100;
/// `None` is read as 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRatingRecord {
    pub task_id: u64,
    pub task_name: String,
    pub rating: f64,
    #[serde(default)]
    pub task_weight: Option<f64>,
    #[serde(default)]
    pub user_percentage: Option<f64>,
}

/// Stakeholder rating for a project the user worked on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderRatingRecord {
    pub project_id: u64,
    pub project_name: String,
    pub rating: f64,
    #[serde(default)]
    pub task_weight: Option<f64>,
    #[serde(default)]
    pub user_project_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterCategoryCount {
    pub category: PenaltyCategory,
    pub count: u32,
}

/// Everything the calculators need for one user in one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSignals {
    #[serde(default)]
    pub task_ratings: Vec<TaskRatingRecord>,
    #[serde(default)]
    pub stakeholder_ratings: Vec<StakeholderRatingRecord>,
    #[serde(default)]
    pub help_given: u32,
    #[serde(default)]
    pub help_requested: Vec<RequesterCategoryCount>,
    #[serde(default)]
    pub tickets_resolved: u32,
}

impl UserSignals {
    pub fn has_activity(&self) -> bool {
        !self.task_ratings.is_empty()
            || !self.stakeholder_ratings.is_empty()
            || self.help_given > 0
            || self.help_requested.iter().any(|entry| entry.count > 0)
            || self.tickets_resolved > 0
    }
}

/// Supplier of raw records. Implementations should batch per period rather
/// than per user-per-component.
pub trait SignalSource: Send + Sync {
    /// Users with any recorded activity inside the period, ascending.
    fn active_users(&self, period: &RatingPeriod) -> Result<Vec<UserId>, SignalError>;

    /// Records for every requested user. Users without data may be omitted.
    fn fetch(
        &self,
        period: &RatingPeriod,
        users: &[UserId],
    ) -> Result<BTreeMap<UserId, UserSignals>, SignalError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("signal source unavailable: {0}")]
    Unavailable(String),
    #[error("failed to read signal export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid signal export: {0}")]
    Csv(#[from] csv::Error),
    #[error("invalid signal row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },
}
