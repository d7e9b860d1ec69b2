//! Calendar arithmetic and validity intervals
//!
//! Contracts and contract items carry whole-day validity intervals with an
//! inclusive end date: an item whose `valid_till` equals today is still
//! active today. All billing math works on [`chrono::NaiveDate`]; there are
//! no timezones at this layer.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid interval: start {start} must not be after end {end}")]
    InvalidInterval { start: NaiveDate, end: NaiveDate },

    #[error("Date arithmetic overflow for {0}")]
    DateOverflow(NaiveDate),
}

/// Returns the number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if NaiveDate::from_ymd_opt(year, 2, 29).is_some() {
                29
            } else {
                28
            }
        }
        _ => unreachable!("invalid month {month}"),
    }
}

/// Returns the first day of the month containing `date`
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .expect("first of month always exists")
}

/// Returns the last day of the month containing `date`
pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let last = days_in_month(date.year(), date.month());
    NaiveDate::from_ymd_opt(date.year(), date.month(), last)
        .expect("last of month always exists")
}

/// Adds (or, for negative `months`, subtracts) calendar months
///
/// The day of month is clamped to the length of the target month, so
/// 2024-01-31 plus one month is 2024-02-29.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let zero_based = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day always valid")
}

/// Returns the signed number of whole calendar months between the first
/// days of the months containing `start` and `end`
///
/// Days of month are ignored; callers that need day-level precision split
/// the partial months off first. The result is negative when `end` lies in
/// an earlier month than `start`.
pub fn months_between(start: NaiveDate, end: NaiveDate) -> i64 {
    (end.year() as i64 - start.year() as i64) * 12 + end.month() as i64 - start.month() as i64
}

/// A whole-day validity interval with inclusive bounds
///
/// `till = None` means open-ended. A date equal to `till` is still inside
/// the interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub from: NaiveDate,
    pub till: Option<NaiveDate>,
}

impl DateInterval {
    pub fn new(from: NaiveDate, till: Option<NaiveDate>) -> Result<Self, TemporalError> {
        if let Some(till) = till {
            if from > till {
                return Err(TemporalError::InvalidInterval {
                    start: from,
                    end: till,
                });
            }
        }
        Ok(Self { from, till })
    }

    /// An open-ended interval starting at `from`
    pub fn open(from: NaiveDate) -> Self {
        Self { from, till: None }
    }

    /// Returns true if `date` falls inside the interval, end inclusive
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && self.till.map_or(true, |t| date <= t)
    }

    /// Returns true if the interval has no end date
    pub fn is_open(&self) -> bool {
        self.till.is_none()
    }

    /// Closes the interval at `till`, which must not precede `from`
    pub fn close_at(&mut self, till: NaiveDate) -> Result<(), TemporalError> {
        if till < self.from {
            return Err(TemporalError::InvalidInterval {
                start: self.from,
                end: till,
            });
        }
        self.till = Some(till);
        Ok(())
    }
}

/// Term rules attached to a contract or to a single item
///
/// All three fields are whole months. `automatic_extension_months == 0`
/// means the term simply runs out after the minimum duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPolicy {
    pub minimum_duration_months: u32,
    pub notice_period_months: u32,
    pub automatic_extension_months: u32,
}

impl TermPolicy {
    pub fn new(
        minimum_duration_months: u32,
        notice_period_months: u32,
        automatic_extension_months: u32,
    ) -> Self {
        Self {
            minimum_duration_months,
            notice_period_months,
            automatic_extension_months,
        }
    }

    /// The earliest end date still reachable as of `today`
    ///
    /// Starting from the minimum duration after `valid_from`, extension
    /// periods are applied as long as the notice window for the candidate
    /// end has already passed. The candidate is then pulled back one day
    /// and snapped to the end of its month, so ends always land on a month
    /// boundary.
    pub fn next_possible_end(&self, valid_from: NaiveDate, today: NaiveDate) -> NaiveDate {
        let mut end = add_months(valid_from, self.minimum_duration_months as i32);
        if self.automatic_extension_months > 0 {
            let lead = self.notice_period_months as i32 - 1;
            while add_months(end, -lead) <= today {
                end = add_months(end, self.automatic_extension_months as i32);
            }
        }
        end_of_month(end - Duration::days(1))
    }

    /// The last day a cancelation can arrive and still hit
    /// [`TermPolicy::next_possible_end`]
    pub fn next_cancelation_date(&self, valid_from: NaiveDate, today: NaiveDate) -> NaiveDate {
        let end = self.next_possible_end(valid_from, today);
        end_of_month(add_months(end, -(self.notice_period_months as i32)))
    }
}

impl Default for TermPolicy {
    /// One month minimum, three months notice, no automatic extension
    fn default() -> Self {
        Self {
            minimum_duration_months: 1,
            notice_period_months: 3,
            automatic_extension_months: 0,
        }
    }
}
