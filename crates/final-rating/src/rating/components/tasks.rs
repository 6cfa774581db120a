use super::{percent_factor, rated_component};
use crate::rating::breakdown::{DetailLine, RatedBreakdown, TraceFactor};
use crate::rating::config::TaskRatingsConfig;
use crate::rating::signals::TaskRatingRecord;

/// `rating × weight_factor × percentage_factor` per task, then sum or average.
pub fn calculate_task_ratings(
    records: &[TaskRatingRecord],
    config: &TaskRatingsConfig,
) -> RatedBreakdown {
    if !config.enabled {
        return RatedBreakdown::disabled(config.aggregation);
    }

    let details = records
        .iter()
        .map(|record| {
            let mut factors = vec![TraceFactor::new("task_rating", record.rating)];
            if config.include_task_weight {
                factors.push(TraceFactor::new("weight", percent_factor(record.task_weight)));
            }
            if config.include_user_percentage {
                factors.push(TraceFactor::new(
                    "user_pct",
                    percent_factor(record.user_percentage),
                ));
            }
            DetailLine::product(Some(record.task_id), record.task_name.clone(), factors)
        })
        .collect();

    rated_component(config.aggregation, details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::config::AggregationMode;

    fn task(task_id: u64, rating: f64, weight: Option<f64>, pct: Option<f64>) -> TaskRatingRecord {
        TaskRatingRecord {
            task_id,
            task_name: format!("task-{task_id}"),
            rating,
            task_weight: weight,
            user_percentage: pct,
        }
    }

    fn config(weight: bool, pct: bool, aggregation: AggregationMode) -> TaskRatingsConfig {
        TaskRatingsConfig {
            enabled: true,
            include_task_weight: weight,
            include_user_percentage: pct,
            aggregation,
        }
    }

    #[test]
    fn weighted_average_of_two_tasks() {
        let records = [task(1, 80.0, Some(50.0), None), task(2, 100.0, Some(100.0), None)];
        let breakdown =
            calculate_task_ratings(&records, &config(true, false, AggregationMode::Average));

        let contributions: Vec<f64> = breakdown.details.iter().map(|d| d.contribution).collect();
        assert_eq!(contributions, vec![40.0, 100.0]);
        assert_eq!(breakdown.value, 70.0);
        assert_eq!(breakdown.count, 2);
        assert_eq!(breakdown.calculation, "average(40 + 100) / 2 = 70");
    }

    #[test]
    fn null_weight_and_percentage_default_to_full() {
        let records = [task(1, 60.0, None, None)];
        let breakdown = calculate_task_ratings(&records, &config(true, true, AggregationMode::Sum));

        assert_eq!(breakdown.value, 60.0);
        assert_eq!(
            breakdown.details[0].calculation,
            "task_rating(60) × weight(1) × user_pct(1) = 60"
        );
    }

    #[test]
    fn excluded_factors_are_ignored() {
        let records = [task(1, 90.0, Some(10.0), Some(10.0))];
        let breakdown =
            calculate_task_ratings(&records, &config(false, false, AggregationMode::Sum));

        assert_eq!(breakdown.value, 90.0);
        assert_eq!(breakdown.details[0].factors.len(), 1);
    }

    #[test]
    fn average_without_tasks_is_zero() {
        let breakdown = calculate_task_ratings(&[], &config(true, true, AggregationMode::Average));
        assert_eq!(breakdown.value, 0.0);
        assert!(breakdown.enabled);
        assert!(breakdown.details.is_empty());
    }

    #[test]
    fn disabled_component_skips_records() {
        let mut disabled = config(true, true, AggregationMode::Sum);
        disabled.enabled = false;
        let breakdown = calculate_task_ratings(&[task(1, 100.0, None, None)], &disabled);

        assert!(!breakdown.enabled);
        assert_eq!(breakdown.value, 0.0);
        assert!(breakdown.details.is_empty());
    }
}
