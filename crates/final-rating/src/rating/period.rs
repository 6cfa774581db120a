use chrono::NaiveDate;
use serde::Serialize;

use super::error::RatingError;

/// Inclusive date window a calculation covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RatingPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl RatingPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, RatingError> {
        if end < start {
            return Err(RatingError::InvalidRequest(format!(
                "period_end {end} is before period_start {start}"
            )));
        }

        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
