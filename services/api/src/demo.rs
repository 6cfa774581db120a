use crate::calculate::{calculate_once, render_response, template_draft};
use chrono::{Datelike, Duration, Local, NaiveDate};
use clap::Args;
use final_rating::error::AppError;
use final_rating::rating::{
    verify, CalculationRequest, PenaltyCategory, SignalEvent, SignalLedger,
    StakeholderRatingRecord, TaskRatingRecord, UserId,
};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Last day of the demo period (defaults to today); the period spans 90 days.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) period_end: Option<NaiveDate>,
    /// Point total worth 100%
    #[arg(long, default_value_t = 150.0)]
    pub(crate) max_points: f64,
    /// Number of synthetic team members
    #[arg(long, default_value_t = 6)]
    pub(crate) team_size: u64,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let period_end = args.period_end.unwrap_or_else(|| Local::now().date_naive());
    let period_start = period_end - Duration::days(89);

    let ledger = synthetic_ledger(period_start, args.team_size);
    let request = CalculationRequest {
        period_start,
        period_end,
        max_points: args.max_points,
        config_id: None,
        config_version: None,
        user_ids: None,
    };

    println!("Final rating demo ({} synthetic events)", ledger.len());
    let response = calculate_once(ledger, template_draft(), request, 4)?;
    print!("{}", render_response(&response));

    println!("\nAudit replay");
    for result in &response.users {
        match verify(result) {
            Ok(replayed) => println!(
                "- user {}: {}% reproduced from traces",
                result.user_id, replayed.final_percentage
            ),
            Err(err) => println!("- user {}: {err}", result.user_id),
        }
    }
    Ok(())
}

/// Deterministic activity for `team_size` users spread over the first weeks
/// of the period. Higher ids are more active.
pub(crate) fn synthetic_ledger(start: NaiveDate, team_size: u64) -> SignalLedger {
    let categories = ["clarification", "basic_skill_gap", "fixing_own_mistakes", "other"];
    let mut ledger = SignalLedger::default();

    for member in 1..=team_size {
        let user = UserId(member);
        for task in 0..3 {
            let day = start + Duration::days((member * 3 + task) as i64);
            let rating = 60.0 + ((member * 7 + task * 11) % 40) as f64;
            ledger.record(
                user,
                day,
                SignalEvent::TaskRated(TaskRatingRecord {
                    task_id: member * 100 + task,
                    task_name: format!("Sprint {} deliverable", day.iso_week().week()),
                    rating,
                    task_weight: Some(50.0 + (task * 25) as f64),
                    user_percentage: Some(100.0 - (member % 3) as f64 * 25.0),
                }),
            );
        }

        ledger.record(
            user,
            start + Duration::days(30),
            SignalEvent::StakeholderRated(StakeholderRatingRecord {
                project_id: 10 + member % 2,
                project_name: format!("Project {}", 10 + member % 2),
                rating: 70.0 + (member % 4) as f64 * 7.5,
                task_weight: None,
                user_project_percentage: Some(60.0),
            }),
        );

        for help in 0..member {
            ledger.record(user, start + Duration::days(40 + help as i64), SignalEvent::HelpGiven);
        }
        for ticket in 0..member * 4 {
            ledger.record(
                user,
                start + Duration::days(50 + (ticket % 30) as i64),
                SignalEvent::TicketResolved,
            );
        }

        let requests = (team_size + 1 - member) % 4;
        for request in 0..requests {
            let category = categories[(member + request) as usize % categories.len()];
            ledger.record(
                user,
                start + Duration::days(60 + request as i64),
                SignalEvent::HelpRequested(PenaltyCategory::new(category)),
            );
        }
    }

    ledger
}
