//! One pure calculator per signal type. Each turns pre-fetched records plus its
//! config fragment into a component value and explainable line items.

mod helper;
mod requester;
mod stakeholders;
mod tasks;
mod tickets;

pub use helper::calculate_helper;
pub use requester::calculate_requester;
pub use stakeholders::calculate_stakeholder_ratings;
pub use tasks::calculate_task_ratings;
pub use tickets::calculate_tickets;

use super::breakdown::{render_aggregate, CappedBreakdown, DetailLine, RatedBreakdown, TraceFactor};
use super::config::AggregationMode;

/// Optional 0-100 record field as a multiplier; missing values count as 100.
pub(crate) fn percent_factor(raw: Option<f64>) -> f64 {
    raw.unwrap_or(100.0) / 100.0
}

/// `sum` totals the contributions; `average` divides by the record count and
/// yields 0 for an empty slice.
pub(crate) fn aggregate(mode: AggregationMode, contributions: &[f64]) -> f64 {
    let total: f64 = contributions.iter().sum();
    match mode {
        AggregationMode::Sum => total,
        AggregationMode::Average if contributions.is_empty() => 0.0,
        AggregationMode::Average => total / contributions.len() as f64,
    }
}

pub(crate) fn rated_component(mode: AggregationMode, details: Vec<DetailLine>) -> RatedBreakdown {
    let contributions: Vec<f64> = details.iter().map(|line| line.contribution).collect();
    let value = aggregate(mode, &contributions);

    RatedBreakdown {
        enabled: true,
        aggregation: mode,
        value,
        count: details.len(),
        calculation: render_aggregate(mode, &contributions, value),
        details,
    }
}

pub(crate) fn capped_component(
    label: &str,
    count_label: &str,
    count: u32,
    rate_label: &str,
    rate: f64,
    max_points: f64,
) -> CappedBreakdown {
    let line = DetailLine::capped(
        label,
        vec![
            TraceFactor::new(count_label, f64::from(count)),
            TraceFactor::new(rate_label, rate),
        ],
        max_points,
    );
    let raw_value = f64::from(count) * rate;

    CappedBreakdown {
        enabled: true,
        value: line.contribution,
        count,
        raw_value,
        max_points,
        capped: raw_value > max_points,
        details: vec![line],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_of_nothing_is_zero() {
        assert_eq!(aggregate(AggregationMode::Average, &[]), 0.0);
        assert_eq!(aggregate(AggregationMode::Sum, &[]), 0.0);
    }

    #[test]
    fn missing_percentages_read_as_full() {
        assert_eq!(percent_factor(None), 1.0);
        assert_eq!(percent_factor(Some(25.0)), 0.25);
    }
}
