use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

use super::export::parse_entries;
use super::{
    RequesterCategoryCount, SignalError, SignalSource, StakeholderRatingRecord, TaskRatingRecord,
    UserId, UserSignals,
};
use crate::rating::config::PenaltyCategory;
use crate::rating::period::RatingPeriod;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum SignalEvent {
    TaskRated(TaskRatingRecord),
    StakeholderRated(StakeholderRatingRecord),
    HelpGiven,
    HelpRequested(PenaltyCategory),
    TicketResolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEntry {
    pub user_id: UserId,
    pub occurred_on: NaiveDate,
    pub event: SignalEvent,
}

/// Dated activity log that answers period queries in a single pass.
#[derive(Debug, Clone, Default)]
pub struct SignalLedger {
    entries: Vec<SignalEntry>,
}

impl SignalLedger {
    pub fn new(entries: Vec<SignalEntry>) -> Self {
        Self { entries }
    }

    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self, SignalError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SignalError> {
        Ok(Self::new(parse_entries(reader)?))
    }

    pub fn record(&mut self, user_id: UserId, occurred_on: NaiveDate, event: SignalEvent) {
        self.entries.push(SignalEntry {
            user_id,
            occurred_on,
            event,
        });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn in_period<'a>(
        &'a self,
        period: &'a RatingPeriod,
    ) -> impl Iterator<Item = &'a SignalEntry> + 'a {
        self.entries
            .iter()
            .filter(move |entry| period.contains(entry.occurred_on))
    }
}

impl SignalSource for SignalLedger {
    fn active_users(&self, period: &RatingPeriod) -> Result<Vec<UserId>, SignalError> {
        let users: BTreeSet<UserId> = self.in_period(period).map(|entry| entry.user_id).collect();
        Ok(users.into_iter().collect())
    }

    fn fetch(
        &self,
        period: &RatingPeriod,
        users: &[UserId],
    ) -> Result<BTreeMap<UserId, UserSignals>, SignalError> {
        let wanted: BTreeSet<UserId> = users.iter().copied().collect();
        let mut signals: BTreeMap<UserId, UserSignals> = BTreeMap::new();
        let mut requested: BTreeMap<UserId, BTreeMap<PenaltyCategory, u32>> = BTreeMap::new();

        for entry in self.in_period(period) {
            if !wanted.contains(&entry.user_id) {
                continue;
            }

            let user = signals.entry(entry.user_id).or_default();
            match &entry.event {
                SignalEvent::TaskRated(record) => user.task_ratings.push(record.clone()),
                SignalEvent::StakeholderRated(record) => {
                    user.stakeholder_ratings.push(record.clone())
                }
                SignalEvent::HelpGiven => user.help_given += 1,
                SignalEvent::HelpRequested(category) => {
                    *requested
                        .entry(entry.user_id)
                        .or_default()
                        .entry(category.clone())
                        .or_default() += 1;
                }
                SignalEvent::TicketResolved => user.tickets_resolved += 1,
            }
        }

        for (user_id, counts) in requested {
            if let Some(user) = signals.get_mut(&user_id) {
                user.help_requested = counts
                    .into_iter()
                    .map(|(category, count)| RequesterCategoryCount { category, count })
                    .collect();
            }
        }

        Ok(signals)
    }
}
