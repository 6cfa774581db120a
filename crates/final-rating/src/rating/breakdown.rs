//! Breakdown types and trace rendering.
//!
//! Every trace is rendered from the literal inputs of its own line item, never
//! from the configuration, so a stored breakdown stays reproducible after the
//! configuration changes. Grammar (parsed back by [`super::audit`]):
//!
//! ```text
//! trace   := product " = " number [ " | cap(" number ") = " number ]
//! product := label "(" number ")" { " × " label "(" number ")" }
//! ```

use serde::{Deserialize, Serialize};

use super::config::{AggregationMode, PenaltyCategory};

pub const FACTOR_SEPARATOR: &str = " × ";
pub const CAP_MARKER: &str = " | cap(";

/// One named number that enters a line item's product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceFactor {
    pub label: String,
    pub value: f64,
}

impl TraceFactor {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Explainable line item inside a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetailLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<u64>,
    pub label: String,
    pub factors: Vec<TraceFactor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cap: Option<f64>,
    pub contribution: f64,
    pub calculation: String,
}

impl DetailLine {
    /// Line whose contribution is the plain product of its factors.
    pub fn product(reference_id: Option<u64>, label: impl Into<String>, factors: Vec<TraceFactor>) -> Self {
        let contribution = factors.iter().map(|factor| factor.value).product::<f64>();
        let calculation = render_trace(&factors, contribution, None);
        Self {
            reference_id,
            label: label.into(),
            factors,
            cap: None,
            contribution,
            calculation,
        }
    }

    /// Line whose product is clamped to `cap`.
    pub fn capped(label: impl Into<String>, factors: Vec<TraceFactor>, cap: f64) -> Self {
        let raw = factors.iter().map(|factor| factor.value).product::<f64>();
        let contribution = raw.min(cap);
        let calculation = render_trace(&factors, raw, Some((cap, contribution)));
        Self {
            reference_id: None,
            label: label.into(),
            factors,
            cap: Some(cap),
            contribution,
            calculation,
        }
    }
}

/// Render `label(v) × label(v) = raw[ | cap(c) = final]` with literal numbers.
pub fn render_trace(factors: &[TraceFactor], raw: f64, cap: Option<(f64, f64)>) -> String {
    let product = factors
        .iter()
        .map(|factor| format!("{}({})", factor.label, format_number(factor.value)))
        .collect::<Vec<_>>()
        .join(FACTOR_SEPARATOR);

    let mut trace = format!("{product} = {}", format_number(raw));
    if let Some((cap, capped)) = cap {
        trace.push_str(&format!(
            "{CAP_MARKER}{}) = {}",
            format_number(cap),
            format_number(capped)
        ));
    }
    trace
}

/// Summary line for a multi-record component, e.g. `average(40 + 100) / 2 = 70`.
pub fn render_aggregate(mode: AggregationMode, contributions: &[f64], value: f64) -> String {
    if contributions.is_empty() {
        return format!("{}(no records) = 0", mode.label());
    }

    let terms = contributions
        .iter()
        .map(|value| format_number(*value))
        .collect::<Vec<_>>()
        .join(" + ");

    match mode {
        AggregationMode::Sum => format!("sum({terms}) = {}", format_number(value)),
        AggregationMode::Average => format!(
            "average({terms}) / {} = {}",
            contributions.len(),
            format_number(value)
        ),
    }
}

const MAX_CLEAN_DECIMALS: i32 = 12;
const FLOAT_NOISE: f64 = 1e-9;

/// Shortest decimal that stays within float noise of `value`: `85`, `0.9`,
/// `0.12345`. Values with no short form print at full round-trip precision,
/// so a trace always replays to the number it reports.
pub fn format_number(value: f64) -> String {
    let tolerance = FLOAT_NOISE * value.abs().max(1.0);
    for decimals in 0..=MAX_CLEAN_DECIMALS {
        let scale = 10f64.powi(decimals);
        let rounded = (value * scale).round() / scale;
        if (rounded - value).abs() <= tolerance {
            // normalises -0
            return format!("{}", rounded + 0.0);
        }
    }
    format!("{}", value + 0.0)
}

/// Round to two decimals for reporting.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0 + 0.0
}

/// Task or stakeholder rating component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatedBreakdown {
    pub enabled: bool,
    pub aggregation: AggregationMode,
    pub value: f64,
    pub count: usize,
    pub details: Vec<DetailLine>,
    pub calculation: String,
}

impl RatedBreakdown {
    pub fn disabled(aggregation: AggregationMode) -> Self {
        Self {
            enabled: false,
            aggregation,
            value: 0.0,
            count: 0,
            details: Vec::new(),
            calculation: "disabled = 0".to_string(),
        }
    }
}

/// Helper or tickets component: a single count times a rate, capped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CappedBreakdown {
    pub enabled: bool,
    pub value: f64,
    pub count: u32,
    pub raw_value: f64,
    pub max_points: f64,
    pub capped: bool,
    pub details: Vec<DetailLine>,
}

impl CappedBreakdown {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            value: 0.0,
            count: 0,
            raw_value: 0.0,
            max_points: 0.0,
            capped: false,
            details: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequesterBreakdown {
    pub enabled: bool,
    pub value: f64,
    pub count: u32,
    pub details: Vec<DetailLine>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignored_categories: Vec<PenaltyCategory>,
}

impl RequesterBreakdown {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            value: 0.0,
            count: 0,
            details: Vec::new(),
            ignored_categories: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HelpRequestsBreakdown {
    pub helper: CappedBreakdown,
    pub requester: RequesterBreakdown,
}

/// Per-component explanation of one user's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingBreakdown {
    pub task_ratings: RatedBreakdown,
    pub stakeholder_ratings: RatedBreakdown,
    pub help_requests: HelpRequestsBreakdown,
    pub tickets_resolved: CappedBreakdown,
}

impl RatingBreakdown {
    /// Component values in a fixed order; disabled components report 0.
    pub fn component_values(&self) -> [f64; 5] {
        [
            self.task_ratings.value,
            self.stakeholder_ratings.value,
            self.help_requests.helper.value,
            self.help_requests.requester.value,
            self.tickets_resolved.value,
        ]
    }
}
