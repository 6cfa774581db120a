//! Re-derives a result from its trace strings alone.
//!
//! Only the `calculation` text of each line item, the component aggregation
//! modes and `max_points` are read; numeric fields of the breakdown are used
//! solely as the values being checked.

use serde::Serialize;

use super::breakdown::{round2, CAP_MARKER, FACTOR_SEPARATOR};
use super::components::aggregate;
use super::engine::FinalRatingResult;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TraceError {
    #[error("malformed trace '{trace}': {reason}")]
    Malformed { trace: String, reason: String },
    #[error("'{subject}' does not reproduce: reported {reported}, replayed {replayed}")]
    Mismatch {
        subject: String,
        reported: f64,
        replayed: f64,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTrace {
    pub factors: Vec<(String, f64)>,
    pub raw: f64,
    pub cap: Option<(f64, f64)>,
}

/// Values recomputed from traces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Replay {
    pub component_values: [f64; 5],
    pub total_points: f64,
    pub final_percentage: f64,
}

fn tolerance(value: f64) -> f64 {
    0.01_f64.max(value.abs() * 1e-4)
}

fn malformed(trace: &str, reason: impl Into<String>) -> TraceError {
    TraceError::Malformed {
        trace: trace.to_string(),
        reason: reason.into(),
    }
}

fn number(trace: &str, raw: &str) -> Result<f64, TraceError> {
    raw.trim()
        .parse()
        .map_err(|_| malformed(trace, format!("'{raw}' is not a number")))
}

pub fn parse_trace(trace: &str) -> Result<ParsedTrace, TraceError> {
    let (body, cap_part) = match trace.split_once(CAP_MARKER) {
        Some((body, cap)) => (body, Some(cap)),
        None => (trace, None),
    };

    let (product, raw) = body
        .rsplit_once(" = ")
        .ok_or_else(|| malformed(trace, "missing ' = '"))?;
    let raw = number(trace, raw)?;

    let mut factors = Vec::new();
    for term in product.split(FACTOR_SEPARATOR) {
        let (label, rest) = term
            .split_once('(')
            .ok_or_else(|| malformed(trace, format!("term '{term}' has no '('")))?;
        let value = rest
            .strip_suffix(')')
            .ok_or_else(|| malformed(trace, format!("term '{term}' has no closing ')'")))?;
        factors.push((label.trim().to_string(), number(trace, value)?));
    }

    let cap = match cap_part {
        Some(part) => {
            let (limit, capped) = part
                .split_once(") = ")
                .ok_or_else(|| malformed(trace, "cap clause is incomplete"))?;
            Some((number(trace, limit)?, number(trace, capped)?))
        }
        None => None,
    };

    Ok(ParsedTrace { factors, raw, cap })
}

/// Recompute one line item and check it against the numbers its trace states.
pub fn replay_line(trace: &str) -> Result<f64, TraceError> {
    let parsed = parse_trace(trace)?;
    let product: f64 = parsed.factors.iter().map(|(_, value)| value).product();

    if (product - parsed.raw).abs() > tolerance(parsed.raw) {
        return Err(TraceError::Mismatch {
            subject: trace.to_string(),
            reported: parsed.raw,
            replayed: product,
        });
    }

    match parsed.cap {
        Some((limit, stated)) => {
            let capped = product.min(limit);
            if (capped - stated).abs() > tolerance(stated) {
                return Err(TraceError::Mismatch {
                    subject: trace.to_string(),
                    reported: stated,
                    replayed: capped,
                });
            }
            Ok(capped)
        }
        None => Ok(product),
    }
}

fn replay_lines<'a>(traces: impl Iterator<Item = &'a str>) -> Result<Vec<f64>, TraceError> {
    traces.map(replay_line).collect()
}

/// Rebuild every component value, the total and the final percentage.
pub fn replay(result: &FinalRatingResult) -> Result<Replay, TraceError> {
    let breakdown = &result.breakdown;
    let traces = |details: &'_ [super::breakdown::DetailLine]| {
        replay_lines(details.iter().map(|line| line.calculation.as_str()))
    };

    let tasks = &breakdown.task_ratings;
    let task_value = if tasks.enabled {
        aggregate(tasks.aggregation, &traces(&tasks.details)?)
    } else {
        0.0
    };

    let stakeholders = &breakdown.stakeholder_ratings;
    let stakeholder_value = if stakeholders.enabled {
        aggregate(stakeholders.aggregation, &traces(&stakeholders.details)?)
    } else {
        0.0
    };

    let helper_value: f64 = traces(&breakdown.help_requests.helper.details)?.iter().sum();
    let requester_value: f64 = traces(&breakdown.help_requests.requester.details)?
        .iter()
        .sum();
    let tickets_value: f64 = traces(&breakdown.tickets_resolved.details)?.iter().sum();

    let component_values = [
        task_value,
        stakeholder_value,
        helper_value,
        requester_value,
        tickets_value,
    ];
    let total_points: f64 = component_values.iter().sum();
    let final_percentage = round2((total_points / result.max_points * 100.0).clamp(0.0, 100.0));

    Ok(Replay {
        component_values,
        total_points,
        final_percentage,
    })
}

/// [`replay`] plus a comparison with the reported totals.
pub fn verify(result: &FinalRatingResult) -> Result<Replay, TraceError> {
    let replayed = replay(result)?;

    if (replayed.total_points - result.total_points).abs() > tolerance(result.total_points) {
        return Err(TraceError::Mismatch {
            subject: format!("user {} total_points", result.user_id),
            reported: result.total_points,
            replayed: replayed.total_points,
        });
    }

    let unrounded = (replayed.total_points / result.max_points * 100.0).clamp(0.0, 100.0);
    if (unrounded - result.final_percentage).abs() > 0.01 {
        return Err(TraceError::Mismatch {
            subject: format!("user {} final_percentage", result.user_id),
            reported: result.final_percentage,
            replayed: replayed.final_percentage,
        });
    }

    Ok(replayed)
}
