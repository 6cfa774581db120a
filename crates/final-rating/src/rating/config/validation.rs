use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{
    AggregationMode, HelperConfig, PenaltyCategory, RatingRules, RequesterConfig,
    StakeholderRatingsConfig, TaskRatingsConfig, TicketsConfig,
};

/// Raw, unvalidated configuration payload as received from an admin client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingRulesDraft {
    #[serde(default)]
    pub task_ratings: Option<TaskRatingsDraft>,
    #[serde(default)]
    pub stakeholder_ratings: Option<StakeholderRatingsDraft>,
    #[serde(default)]
    pub help_requests_helper: Option<HelperDraft>,
    #[serde(default)]
    pub help_requests_requester: Option<RequesterDraft>,
    #[serde(default)]
    pub tickets_resolved: Option<TicketsDraft>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskRatingsDraft {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub include_task_weight: Option<bool>,
    #[serde(default)]
    pub include_user_percentage: Option<bool>,
    #[serde(default)]
    pub aggregation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StakeholderRatingsDraft {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub include_project_percentage: Option<bool>,
    #[serde(default)]
    pub include_task_weight: Option<bool>,
    #[serde(default)]
    pub aggregation: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HelperDraft {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub points_per_help: Option<f64>,
    #[serde(default)]
    pub max_points: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequesterDraft {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub penalties: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketsDraft {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub points_per_ticket: Option<f64>,
    #[serde(default)]
    pub max_points: Option<f64>,
}

/// One rule a draft breaks, addressed by its dotted field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

/// Accepted but suspicious value, e.g. a positive requester penalty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
}

/// Validation failure carrying every violated field so callers can fix the
/// whole payload in one round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid final rating config: {}", summarize(.violations))]
pub struct InvalidConfig {
    pub violations: Vec<FieldViolation>,
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| format!("{} {}", violation.field, violation.message))
        .collect::<Vec<_>>()
        .join("; ")
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRules {
    pub rules: RatingRules,
    pub warnings: Vec<ConfigWarning>,
}

#[derive(Default)]
struct Findings {
    violations: Vec<FieldViolation>,
    warnings: Vec<ConfigWarning>,
}

impl Findings {
    fn violation(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.violations.push(FieldViolation {
            field: field.into(),
            message: message.into(),
        });
    }

    fn warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigWarning {
            field: field.into(),
            message: message.into(),
        });
    }

    fn aggregation(
        &mut self,
        field: &str,
        raw: Option<&str>,
        enabled: bool,
    ) -> AggregationMode {
        match raw {
            Some(value) => AggregationMode::parse(value).unwrap_or_else(|| {
                self.violation(
                    field,
                    format!("must be one of sum, average (got '{value}')"),
                );
                AggregationMode::Sum
            }),
            None if enabled => {
                self.violation(field, "is required when the component is enabled");
                AggregationMode::Sum
            }
            None => AggregationMode::Sum,
        }
    }

    fn non_negative(&mut self, field: &str, raw: Option<f64>, enabled: bool) -> f64 {
        match raw {
            Some(value) if !value.is_finite() => {
                self.violation(field, "must be a finite number");
                0.0
            }
            Some(value) if value < 0.0 => {
                self.violation(field, format!("must be >= 0 (got {value})"));
                0.0
            }
            Some(value) => value,
            None if enabled => {
                self.violation(field, "is required when the component is enabled");
                0.0
            }
            None => 0.0,
        }
    }
}

/// Validate a raw configuration payload. Pure; warnings are returned rather
/// than logged so the caller decides how to surface them.
pub fn validate(draft: &RatingRulesDraft) -> Result<ValidatedRules, InvalidConfig> {
    let mut findings = Findings::default();

    let task_ratings = match &draft.task_ratings {
        Some(task) => {
            let enabled = task.enabled.unwrap_or(false);
            TaskRatingsConfig {
                enabled,
                include_task_weight: task.include_task_weight.unwrap_or(false),
                include_user_percentage: task.include_user_percentage.unwrap_or(false),
                aggregation: findings.aggregation(
                    "task_ratings.aggregation",
                    task.aggregation.as_deref(),
                    enabled,
                ),
            }
        }
        None => {
            findings.violation("task_ratings", "is missing");
            TaskRatingsConfig {
                enabled: false,
                include_task_weight: false,
                include_user_percentage: false,
                aggregation: AggregationMode::Sum,
            }
        }
    };

    let stakeholder_ratings = match &draft.stakeholder_ratings {
        Some(stakeholder) => {
            let enabled = stakeholder.enabled.unwrap_or(false);
            StakeholderRatingsConfig {
                enabled,
                include_project_percentage: stakeholder
                    .include_project_percentage
                    .unwrap_or(false),
                include_task_weight: stakeholder.include_task_weight.unwrap_or(false),
                aggregation: findings.aggregation(
                    "stakeholder_ratings.aggregation",
                    stakeholder.aggregation.as_deref(),
                    enabled,
                ),
            }
        }
        None => {
            findings.violation("stakeholder_ratings", "is missing");
            StakeholderRatingsConfig {
                enabled: false,
                include_project_percentage: false,
                include_task_weight: false,
                aggregation: AggregationMode::Sum,
            }
        }
    };

    let help_requests_helper = match &draft.help_requests_helper {
        Some(helper) => {
            let enabled = helper.enabled.unwrap_or(false);
            HelperConfig {
                enabled,
                points_per_help: findings.non_negative(
                    "help_requests_helper.points_per_help",
                    helper.points_per_help,
                    enabled,
                ),
                max_points: findings.non_negative(
                    "help_requests_helper.max_points",
                    helper.max_points,
                    enabled,
                ),
            }
        }
        None => {
            findings.violation("help_requests_helper", "is missing");
            HelperConfig {
                enabled: false,
                points_per_help: 0.0,
                max_points: 0.0,
            }
        }
    };

    let help_requests_requester = match &draft.help_requests_requester {
        Some(requester) => validate_requester(requester, &mut findings),
        None => {
            findings.violation("help_requests_requester", "is missing");
            RequesterConfig {
                enabled: false,
                penalties: BTreeMap::new(),
            }
        }
    };

    let tickets_resolved = match &draft.tickets_resolved {
        Some(tickets) => {
            let enabled = tickets.enabled.unwrap_or(false);
            TicketsConfig {
                enabled,
                points_per_ticket: findings.non_negative(
                    "tickets_resolved.points_per_ticket",
                    tickets.points_per_ticket,
                    enabled,
                ),
                max_points: findings.non_negative(
                    "tickets_resolved.max_points",
                    tickets.max_points,
                    enabled,
                ),
            }
        }
        None => {
            findings.violation("tickets_resolved", "is missing");
            TicketsConfig {
                enabled: false,
                points_per_ticket: 0.0,
                max_points: 0.0,
            }
        }
    };

    if !findings.violations.is_empty() {
        return Err(InvalidConfig {
            violations: findings.violations,
        });
    }

    Ok(ValidatedRules {
        rules: RatingRules {
            task_ratings,
            stakeholder_ratings,
            help_requests_helper,
            help_requests_requester,
            tickets_resolved,
        },
        warnings: findings.warnings,
    })
}

fn validate_requester(requester: &RequesterDraft, findings: &mut Findings) -> RequesterConfig {
    let enabled = requester.enabled.unwrap_or(false);
    let mut penalties = BTreeMap::new();

    match &requester.penalties {
        Some(raw) => {
            for (name, value) in raw {
                let field = format!("help_requests_requester.penalties.{name}");
                let category = PenaltyCategory::new(name);
                if category.as_str().is_empty() {
                    findings.violation(field, "category name must not be empty");
                    continue;
                }
                if !value.is_finite() {
                    findings.violation(field, "must be a finite number");
                    continue;
                }
                if penalties.contains_key(&category) {
                    findings.violation(field, format!("duplicates category '{category}'"));
                    continue;
                }
                if *value > 0.0 {
                    findings.warning(
                        field,
                        format!("positive penalty {value} rewards help requests"),
                    );
                }
                penalties.insert(category, *value);
            }
        }
        None if enabled => {
            findings.violation(
                "help_requests_requester.penalties",
                "is required when the component is enabled",
            );
        }
        None => {}
    }

    if enabled && penalties.is_empty() && requester.penalties.is_some() {
        findings.warning(
            "help_requests_requester.penalties",
            "no categories configured; component always contributes 0",
        );
    }

    RequesterConfig { enabled, penalties }
}

impl From<&RatingRules> for RatingRulesDraft {
    fn from(rules: &RatingRules) -> Self {
        Self {
            task_ratings: Some(TaskRatingsDraft {
                enabled: Some(rules.task_ratings.enabled),
                include_task_weight: Some(rules.task_ratings.include_task_weight),
                include_user_percentage: Some(rules.task_ratings.include_user_percentage),
                aggregation: Some(rules.task_ratings.aggregation.label().to_string()),
            }),
            stakeholder_ratings: Some(StakeholderRatingsDraft {
                enabled: Some(rules.stakeholder_ratings.enabled),
                include_project_percentage: Some(
                    rules.stakeholder_ratings.include_project_percentage,
                ),
                include_task_weight: Some(rules.stakeholder_ratings.include_task_weight),
                aggregation: Some(rules.stakeholder_ratings.aggregation.label().to_string()),
            }),
            help_requests_helper: Some(HelperDraft {
                enabled: Some(rules.help_requests_helper.enabled),
                points_per_help: Some(rules.help_requests_helper.points_per_help),
                max_points: Some(rules.help_requests_helper.max_points),
            }),
            help_requests_requester: Some(RequesterDraft {
                enabled: Some(rules.help_requests_requester.enabled),
                penalties: Some(
                    rules
                        .help_requests_requester
                        .penalties
                        .iter()
                        .map(|(category, value)| (category.0.clone(), *value))
                        .collect(),
                ),
            }),
            tickets_resolved: Some(TicketsDraft {
                enabled: Some(rules.tickets_resolved.enabled),
                points_per_ticket: Some(rules.tickets_resolved.points_per_ticket),
                max_points: Some(rules.tickets_resolved.max_points),
            }),
        }
    }
}
