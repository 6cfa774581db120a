use std::collections::BTreeMap;

use tracing::debug;

use crate::rating::breakdown::{DetailLine, RequesterBreakdown, TraceFactor};
use crate::rating::config::{PenaltyCategory, RequesterConfig};
use crate::rating::signals::RequesterCategoryCount;

/// Sum of `count × penalty` over configured categories. Uncapped: any floor is
/// applied to the final percentage, not here.
pub fn calculate_requester(
    requests: &[RequesterCategoryCount],
    config: &RequesterConfig,
) -> RequesterBreakdown {
    if !config.enabled {
        return RequesterBreakdown::disabled();
    }

    let mut counts: BTreeMap<&PenaltyCategory, u32> = BTreeMap::new();
    for entry in requests {
        let total = counts.entry(&entry.category).or_default();
        *total = total.saturating_add(entry.count);
    }

    let mut details = Vec::new();
    let mut ignored_categories = Vec::new();
    let mut count: u32 = 0;

    for (category, requested) in counts {
        if requested == 0 {
            continue;
        }

        match config.penalties.get(category) {
            Some(penalty) => {
                count = count.saturating_add(requested);
                details.push(DetailLine::product(
                    None,
                    category.as_str(),
                    vec![
                        TraceFactor::new("requests", f64::from(requested)),
                        TraceFactor::new("penalty", *penalty),
                    ],
                ));
            }
            None => {
                debug!(%category, requested, "help request category has no configured penalty");
                ignored_categories.push(category.clone());
            }
        }
    }

    RequesterBreakdown {
        enabled: true,
        value: details.iter().map(|line| line.contribution).sum(),
        count,
        details,
        ignored_categories,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(category: &str, count: u32) -> RequesterCategoryCount {
        RequesterCategoryCount {
            category: PenaltyCategory::new(category),
            count,
        }
    }

    fn config() -> RequesterConfig {
        RequesterConfig {
            enabled: true,
            penalties: [("clarification", -2.0), ("other", -5.0), ("basic_skill_gap", -4.0)]
                .into_iter()
                .map(|(name, points)| (PenaltyCategory::new(name), points))
                .collect(),
        }
    }

    #[test]
    fn sums_penalties_per_category() {
        let breakdown = calculate_requester(
            &[
                request("clarification", 3),
                request("other", 1),
                request("basic_skill_gap", 0),
            ],
            &config(),
        );

        assert_eq!(breakdown.value, -11.0);
        assert_eq!(breakdown.count, 4);
        assert_eq!(breakdown.details.len(), 2);
        assert_eq!(
            breakdown.details[0].calculation,
            "requests(3) × penalty(-2) = -6"
        );
    }

    #[test]
    fn merges_repeated_categories() {
        let breakdown = calculate_requester(
            &[request("other", 1), request("other", 2)],
            &config(),
        );
        assert_eq!(breakdown.value, -15.0);
        assert_eq!(breakdown.details.len(), 1);
    }

    #[test]
    fn huge_repeated_counts_saturate() {
        let breakdown = calculate_requester(
            &[
                request("other", u32::MAX - 1),
                request("other", 5),
                request("clarification", u32::MAX),
            ],
            &config(),
        );

        assert_eq!(breakdown.count, u32::MAX);
        assert_eq!(
            breakdown.details[1].factors[0].value,
            f64::from(u32::MAX)
        );
        assert!(breakdown.value.is_finite());
    }

    #[test]
    fn unknown_categories_are_listed_not_scored() {
        let breakdown = calculate_requester(&[request("lunch_order", 4)], &config());
        assert_eq!(breakdown.value, 0.0);
        assert_eq!(breakdown.ignored_categories, vec![PenaltyCategory::new("lunch_order")]);
    }
}
