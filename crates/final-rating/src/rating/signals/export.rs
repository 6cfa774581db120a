use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use std::io::Read;

use super::ledger::{SignalEntry, SignalEvent};
use super::{SignalError, StakeholderRatingRecord, TaskRatingRecord, UserId};
use crate::rating::config::PenaltyCategory;

/// Parse a unified signal export:
/// `user_id,date,kind,ref_id,name,rating,weight,percentage,category`.
pub(crate) fn parse_entries<R: Read>(reader: R) -> Result<Vec<SignalEntry>, SignalError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut entries = Vec::new();

    for (index, record) in csv_reader.deserialize::<SignalRow>().enumerate() {
        let row = record?;
        // header occupies line 1
        entries.push(row.into_entry(index + 2)?);
    }

    Ok(entries)
}

#[derive(Debug, Deserialize)]
struct SignalRow {
    user_id: u64,
    date: String,
    kind: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    ref_id: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    name: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    rating: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    weight: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    percentage: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    category: Option<String>,
}

impl SignalRow {
    fn into_entry(self, row: usize) -> Result<SignalEntry, SignalError> {
        let occurred_on = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|err| {
            SignalError::InvalidRow {
                row,
                reason: format!("date '{}' is not YYYY-MM-DD ({err})", self.date),
            }
        })?;

        let event = match self.kind.trim().to_ascii_lowercase().as_str() {
            "task_rating" => SignalEvent::TaskRated(TaskRatingRecord {
                task_id: reference_id(self.ref_id.as_deref(), row)?,
                task_name: self.name.unwrap_or_default(),
                rating: required_percent("rating", self.rating.as_deref(), row)?,
                task_weight: percent("weight", self.weight.as_deref(), row)?,
                user_percentage: percent("percentage", self.percentage.as_deref(), row)?,
            }),
            "stakeholder_rating" => SignalEvent::StakeholderRated(StakeholderRatingRecord {
                project_id: reference_id(self.ref_id.as_deref(), row)?,
                project_name: self.name.unwrap_or_default(),
                rating: required_percent("rating", self.rating.as_deref(), row)?,
                task_weight: percent("weight", self.weight.as_deref(), row)?,
                user_project_percentage: percent("percentage", self.percentage.as_deref(), row)?,
            }),
            "help_given" => SignalEvent::HelpGiven,
            "help_requested" => {
                let category = self.category.ok_or_else(|| SignalError::InvalidRow {
                    row,
                    reason: "help_requested rows need a category".to_string(),
                })?;
                SignalEvent::HelpRequested(PenaltyCategory::new(category))
            }
            "ticket_resolved" => SignalEvent::TicketResolved,
            other => {
                return Err(SignalError::InvalidRow {
                    row,
                    reason: format!("unknown signal kind '{other}'"),
                })
            }
        };

        Ok(SignalEntry {
            user_id: UserId(self.user_id),
            occurred_on,
            event,
        })
    }
}

fn reference_id(raw: Option<&str>, row: usize) -> Result<u64, SignalError> {
    let raw = raw.ok_or_else(|| SignalError::InvalidRow {
        row,
        reason: "ref_id is required for rating rows".to_string(),
    })?;
    raw.trim().parse().map_err(|_| SignalError::InvalidRow {
        row,
        reason: format!("ref_id '{raw}' is not a positive integer"),
    })
}

fn required_percent(field: &str, raw: Option<&str>, row: usize) -> Result<f64, SignalError> {
    percent(field, raw, row)?.ok_or_else(|| SignalError::InvalidRow {
        row,
        reason: format!("{field} is required"),
    })
}

fn percent(field: &str, raw: Option<&str>, row: usize) -> Result<Option<f64>, SignalError> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    let value: f64 = raw.trim().parse().map_err(|_| SignalError::InvalidRow {
        row,
        reason: format!("{field} '{raw}' is not a number"),
    })?;

    if !(0.0..=100.0).contains(&value) {
        return Err(SignalError::InvalidRow {
            row,
            reason: format!("{field} {value} is outside 0-100"),
        });
    }

    Ok(Some(value))
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
