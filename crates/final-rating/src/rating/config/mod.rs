mod defaults;
mod validation;

pub use validation::{
    validate, ConfigWarning, FieldViolation, InvalidConfig, RatingRulesDraft, ValidatedRules,
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Store-assigned identifier of a [`FinalRatingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfigId(pub u64);

impl fmt::Display for ConfigId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How multiple records within one component are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    #[default]
    Sum,
    Average,
}

impl AggregationMode {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Average => "average",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sum" => Some(Self::Sum),
            "average" => Some(Self::Average),
            _ => None,
        }
    }
}

/// Requester penalty category. The closed set of categories is whatever the
/// active penalty table defines.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PenaltyCategory(pub String);

impl PenaltyCategory {
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(raw.as_ref().trim().to_ascii_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PenaltyCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRatingsConfig {
    pub enabled: bool,
    pub include_task_weight: bool,
    pub include_user_percentage: bool,
    pub aggregation: AggregationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderRatingsConfig {
    pub enabled: bool,
    pub include_project_percentage: bool,
    pub include_task_weight: bool,
    pub aggregation: AggregationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelperConfig {
    pub enabled: bool,
    pub points_per_help: f64,
    pub max_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequesterConfig {
    pub enabled: bool,
    pub penalties: BTreeMap<PenaltyCategory, f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketsConfig {
    pub enabled: bool,
    pub points_per_ticket: f64,
    pub max_points: f64,
}

/// The five component sub-configs. Build through [`validate`] or
/// [`RatingRules::default_structure`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRules {
    pub task_ratings: TaskRatingsConfig,
    pub stakeholder_ratings: StakeholderRatingsConfig,
    pub help_requests_helper: HelperConfig,
    pub help_requests_requester: RequesterConfig,
    pub tickets_resolved: TicketsConfig,
}

impl RatingRules {
    pub fn all_disabled(&self) -> bool {
        !self.task_ratings.enabled
            && !self.stakeholder_ratings.enabled
            && !self.help_requests_helper.enabled
            && !self.help_requests_requester.enabled
            && !self.tickets_resolved.enabled
    }
}

/// Named, versioned configuration as held by a [`ConfigStore`](super::store::ConfigStore).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalRatingConfig {
    pub id: ConfigId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: u32,
    pub is_active: bool,
    pub rules: RatingRules,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable copy of a configuration taken when a calculation starts. Later
/// edits to the stored config never reach a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigSnapshot {
    pub id: ConfigId,
    pub name: String,
    pub version: u32,
    #[serde(skip)]
    pub rules: RatingRules,
}

impl From<&FinalRatingConfig> for ConfigSnapshot {
    fn from(config: &FinalRatingConfig) -> Self {
        Self {
            id: config.id,
            name: config.name.clone(),
            version: config.version,
            rules: config.rules.clone(),
        }
    }
}
