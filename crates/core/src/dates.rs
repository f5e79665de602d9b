//! Visible date window arithmetic.
//!
//! Converts calendar navigation state (anchor month, months shown) into the
//! concrete `[start, end)` interval to request from the aggregation endpoint.
//!
//! All values are `NaiveDate`s in the viewer's local calendar. Month stepping
//! is done on an integer month index so year rollover never goes through a
//! string or a UTC timestamp.

use std::fmt;

use chrono::{Datelike, Local, NaiveDate};

use crate::Error;

/// Wire format for dates: zero-padded `YYYY-MM-DD`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A fetch window always covers at least this many months.
pub const MIN_WINDOW_MONTHS: u32 = 2;

/// Longest span the aggregation endpoint accepts.
pub const MAX_RANGE_DAYS: i64 = 180;

/// Half-open `[start, end)` interval of local calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Build a range, rejecting `end < start` and spans over [`MAX_RANGE_DAYS`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if end < start {
            return Err(Error::InvalidArgument(format!(
                "end date {} is before start date {}",
                format_date(end),
                format_date(start)
            )));
        }
        let days = (end - start).num_days();
        if days > MAX_RANGE_DAYS {
            return Err(Error::InvalidArgument(format!(
                "date range of {days} days exceeds {MAX_RANGE_DAYS}"
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

    /// Number of days in the range.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Iterate every date in the range.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", format_date(self.start), format_date(self.end))
    }
}

/// Format a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` string.
pub fn parse_date(value: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| Error::InvalidArgument(format!("invalid date {value:?}: {e}")))
}

/// Today in the viewer's local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// First day of the month containing `date`.
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Step `months` forward (or back, when negative) from the month containing `date`.
///
/// Returns the first day of the resulting month.
pub fn add_months(date: NaiveDate, months: i32) -> Result<NaiveDate, Error> {
    let index = date.year() * 12 + date.month0() as i32 + months;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidArgument(format!("month offset {months} from {date} is out of range")))
}

/// Fetch window for a calendar anchored at `anchor` showing `visible_months`.
///
/// Starts on the first of the anchor's month and covers
/// `max(visible_months, 2)` whole months. Windows longer than
/// [`MAX_RANGE_DAYS`] are rejected, which caps `visible_months` at 5.
pub fn visible_range(anchor: NaiveDate, visible_months: u32) -> Result<DateRange, Error> {
    let months = visible_months.max(MIN_WINDOW_MONTHS);
    let months = i32::try_from(months)
        .map_err(|_| Error::InvalidArgument(format!("month count {visible_months} is out of range")))?;
    let start = first_of_month(anchor);
    let end = add_months(start, months)?;
    DateRange::new(start, end).map_err(|_| {
        Error::InvalidArgument(format!(
            "{months} months from {} exceeds the {MAX_RANGE_DAYS}-day window limit",
            format_date(start)
        ))
    })
}

/// Same as [`visible_range`] for a navigation state given as year and month (1-12).
pub fn visible_range_for_month(year: i32, month: u32, visible_months: u32) -> Result<DateRange, Error> {
    let anchor = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| Error::InvalidArgument(format!("invalid anchor month {year}-{month:02}")))?;
    visible_range(anchor, visible_months)
}

/// Same as [`visible_range`] for an anchor given as a `YYYY-MM-DD` string.
pub fn visible_range_from_str(anchor: &str, visible_months: u32) -> Result<DateRange, Error> {
    visible_range(parse_date(anchor)?, visible_months)
}
