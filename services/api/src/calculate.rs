use crate::infra::parse_date;
use chrono::NaiveDate;
use clap::Args;
use final_rating::config::AppConfig;
use final_rating::error::AppError;
use final_rating::rating::{
    default_template, CalculationRequest, CalculationResponse, CancellationFlag, ConfigDraft,
    FinalRatingResult, InMemoryConfigStore, RatedBreakdown, RatingRulesDraft, RatingService,
    SignalLedger, SignalSource, UserId,
};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct CalculateArgs {
    /// Unified signal export (user_id,date,kind,ref_id,name,rating,weight,percentage,category)
    #[arg(long)]
    pub(crate) signals_csv: PathBuf,
    /// First day of the rating period (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) period_start: NaiveDate,
    /// Last day of the rating period (YYYY-MM-DD)
    #[arg(long, value_parser = parse_date)]
    pub(crate) period_end: NaiveDate,
    /// Point total worth 100%. Falls back to RATING_DEFAULT_MAX_POINTS.
    #[arg(long)]
    pub(crate) max_points: Option<f64>,
    /// Configuration JSON in the shape printed by `config default`
    #[arg(long)]
    pub(crate) config_json: Option<PathBuf>,
    /// Rate only these users (repeatable). Defaults to everyone active in the period.
    #[arg(long = "user")]
    pub(crate) users: Vec<u64>,
    /// Print the full JSON response instead of the text report
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_calculate(args: CalculateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let max_points = args
        .max_points
        .or(config.rating.default_max_points)
        .ok_or_else(|| {
            AppError::Usage(
                "--max-points is required when RATING_DEFAULT_MAX_POINTS is unset".to_string(),
            )
        })?;

    let draft = match &args.config_json {
        Some(path) => {
            let raw = std::fs::read_to_string(path)?;
            serde_json::from_str::<ConfigDraft>(&raw).map_err(|err| {
                AppError::Usage(format!("{} is not a valid config: {err}", path.display()))
            })?
        }
        None => template_draft(),
    };

    let ledger = SignalLedger::from_csv_path(&args.signals_csv)?;
    let request = CalculationRequest {
        period_start: args.period_start,
        period_end: args.period_end,
        max_points,
        config_id: None,
        config_version: None,
        user_ids: (!args.users.is_empty()).then(|| args.users.iter().copied().map(UserId).collect()),
    };

    let response = calculate_once(ledger, draft, request, config.rating.batch_concurrency)?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&response)
            .map_err(|err| AppError::Io(err.into()))?;
        println!("{rendered}");
    } else {
        print!("{}", render_response(&response));
    }
    Ok(())
}

pub(crate) fn template_draft() -> ConfigDraft {
    let template = default_template();
    ConfigDraft {
        name: template.name,
        description: template.description,
        rules: RatingRulesDraft::from(&template.rules),
    }
}

/// Store `draft` as the only active configuration and rate one period.
pub(crate) fn calculate_once<D>(
    signals: D,
    draft: ConfigDraft,
    request: CalculationRequest,
    concurrency: usize,
) -> Result<CalculationResponse, AppError>
where
    D: SignalSource + 'static,
{
    let service = RatingService::new(Arc::new(InMemoryConfigStore::new()), Arc::new(signals))
        .with_concurrency(concurrency);

    let saved = service.create_config(draft)?;
    for warning in &saved.warnings {
        eprintln!("warning: {} {}", warning.field, warning.message);
    }
    service.activate_config(saved.config.id)?;

    Ok(service.calculate(request, &CancellationFlag::new())?)
}

pub(crate) fn render_response(response: &CalculationResponse) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Final ratings {} to {} | config \"{}\" v{} | 100% = {} points",
        response.period.start(),
        response.period.end(),
        response.config.name,
        response.config.version,
        response.max_points_for_100_percent
    );

    for (rank, result) in response.users.iter().enumerate() {
        render_result(&mut out, rank + 1, result);
    }
    out
}

fn render_result(out: &mut String, rank: usize, result: &FinalRatingResult) {
    let breakdown = &result.breakdown;
    let _ = writeln!(
        out,
        "\n#{rank} user {}: {}% ({} points)",
        result.user_id, result.final_percentage, result.total_points
    );

    render_rated(out, "task_ratings", &breakdown.task_ratings);
    render_rated(out, "stakeholder_ratings", &breakdown.stakeholder_ratings);

    let helper = &breakdown.help_requests.helper;
    if helper.enabled {
        let marker = if helper.capped { " (capped)" } else { "" };
        let _ = writeln!(out, "  help_requests.helper: {}{marker}", helper.value);
        for line in &helper.details {
            let _ = writeln!(out, "    - {}", line.calculation);
        }
    }

    let requester = &breakdown.help_requests.requester;
    if requester.enabled {
        let _ = writeln!(out, "  help_requests.requester: {}", requester.value);
        for line in &requester.details {
            let _ = writeln!(out, "    - {}: {}", line.label, line.calculation);
        }
        if !requester.ignored_categories.is_empty() {
            let ignored: Vec<&str> = requester
                .ignored_categories
                .iter()
                .map(|category| category.as_str())
                .collect();
            let _ = writeln!(out, "    ignored categories: {}", ignored.join(", "));
        }
    }

    let tickets = &breakdown.tickets_resolved;
    if tickets.enabled {
        let marker = if tickets.capped { " (capped)" } else { "" };
        let _ = writeln!(out, "  tickets_resolved: {}{marker}", tickets.value);
        for line in &tickets.details {
            let _ = writeln!(out, "    - {}", line.calculation);
        }
    }
}

fn render_rated(out: &mut String, name: &str, component: &RatedBreakdown) {
    if !component.enabled {
        return;
    }
    let _ = writeln!(out, "  {name}: {}", component.calculation);
    for line in &component.details {
        let _ = writeln!(out, "    - {}: {}", line.label, line.calculation);
    }
}
