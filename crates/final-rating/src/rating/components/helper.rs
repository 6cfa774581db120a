use super::capped_component;
use crate::rating::breakdown::CappedBreakdown;
use crate::rating::config::HelperConfig;

pub fn calculate_helper(help_given: u32, config: &HelperConfig) -> CappedBreakdown {
    if !config.enabled {
        return CappedBreakdown::disabled();
    }

    capped_component(
        "help_given",
        "help_count",
        help_given,
        "points_per_help",
        config.points_per_help,
        config.max_points,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> HelperConfig {
        HelperConfig {
            enabled: true,
            points_per_help: 5.0,
            max_points: 20.0,
        }
    }

    #[test]
    fn caps_at_max_points() {
        let breakdown = calculate_helper(6, &config());

        assert_eq!(breakdown.raw_value, 30.0);
        assert_eq!(breakdown.value, 20.0);
        assert!(breakdown.capped);
        assert_eq!(breakdown.details.len(), 1);
        assert_eq!(
            breakdown.details[0].calculation,
            "help_count(6) × points_per_help(5) = 30 | cap(20) = 20"
        );
    }

    #[test]
    fn reaching_the_cap_exactly_is_not_capped() {
        let breakdown = calculate_helper(4, &config());
        assert_eq!(breakdown.value, 20.0);
        assert!(!breakdown.capped);
    }

    #[test]
    fn below_cap_keeps_raw_value() {
        let breakdown = calculate_helper(3, &config());
        assert_eq!(breakdown.value, 15.0);
        assert!(!breakdown.capped);
    }

    #[test]
    fn disabled_reports_zero() {
        let mut disabled = config();
        disabled.enabled = false;
        let breakdown = calculate_helper(6, &disabled);
        assert!(!breakdown.enabled);
        assert_eq!(breakdown.value, 0.0);
        assert!(breakdown.details.is_empty());
    }
}
