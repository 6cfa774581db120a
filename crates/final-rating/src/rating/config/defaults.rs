use std::collections::BTreeMap;

use super::{
    AggregationMode, HelperConfig, PenaltyCategory, RatingRules, RequesterConfig,
    StakeholderRatingsConfig, TaskRatingsConfig, TicketsConfig,
};

pub const DEFAULT_PENALTIES: [(&str, f64); 4] = [
    ("basic_skill_gap", -5.0),
    ("fixing_own_mistakes", -3.0),
    ("clarification", -1.0),
    ("other", -2.0),
];

impl RatingRules {
    /// Template handed to admin clients when they start a new configuration.
    pub fn default_structure() -> Self {
        let penalties: BTreeMap<PenaltyCategory, f64> = DEFAULT_PENALTIES
            .iter()
            .map(|(name, points)| (PenaltyCategory::new(name), *points))
            .collect();

        Self {
            task_ratings: TaskRatingsConfig {
                enabled: true,
                include_task_weight: true,
                include_user_percentage: true,
                aggregation: AggregationMode::Sum,
            },
            stakeholder_ratings: StakeholderRatingsConfig {
                enabled: true,
                include_project_percentage: true,
                include_task_weight: false,
                aggregation: AggregationMode::Average,
            },
            help_requests_helper: HelperConfig {
                enabled: true,
                points_per_help: 2.0,
                max_points: 20.0,
            },
            help_requests_requester: RequesterConfig {
                enabled: true,
                penalties,
            },
            tickets_resolved: TicketsConfig {
                enabled: true,
                points_per_ticket: 1.0,
                max_points: 30.0,
            },
        }
    }
}
