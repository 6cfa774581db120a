use super::{percent_factor, rated_component};
use crate::rating::breakdown::{DetailLine, RatedBreakdown, TraceFactor};
use crate::rating::config::StakeholderRatingsConfig;
use crate::rating::signals::StakeholderRatingRecord;

/// Same shape as the task calculator, keyed by project.
pub fn calculate_stakeholder_ratings(
    records: &[StakeholderRatingRecord],
    config: &StakeholderRatingsConfig,
) -> RatedBreakdown {
    if !config.enabled {
        return RatedBreakdown::disabled(config.aggregation);
    }

    let details = records
        .iter()
        .map(|record| {
            let mut factors = vec![TraceFactor::new("stakeholder_rating", record.rating)];
            if config.include_task_weight {
                factors.push(TraceFactor::new("weight", percent_factor(record.task_weight)));
            }
            if config.include_project_percentage {
                factors.push(TraceFactor::new(
                    "project_pct",
                    percent_factor(record.user_project_percentage),
                ));
            }
            DetailLine::product(Some(record.project_id), record.project_name.clone(), factors)
        })
        .collect();

    rated_component(config.aggregation, details)
}
