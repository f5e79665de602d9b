//! Availability data model shared by the fetch, cache and paint stages.
//!
//! The aggregation endpoint answers with a map of `YYYY-MM-DD` to a day
//! record. A date that is missing from the map means the same thing as
//! `{"available": false}`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::dates::format_date;

/// Availability and nightly price for one calendar date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    /// Whether the night can be booked. Entries sent as `{}` decode as `false`.
    #[serde(default)]
    pub available: bool,

    /// Nightly price exactly as the endpoint sent it.
    ///
    /// Kept as a JSON number so `120` renders as `120` and `99.5` as `99.5`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Number>,
}

impl DayRecord {
    /// A record for a night that cannot be booked.
    pub fn unavailable() -> Self {
        Self { available: false, price: None }
    }

    /// A bookable night with the given price.
    pub fn priced(price: impl Into<Number>) -> Self {
        Self { available: true, price: Some(price.into()) }
    }

    /// Price text to display, only for bookable nights.
    pub fn display_price(&self) -> Option<String> {
        if !self.available {
            return None;
        }
        self.price.as_ref().map(Number::to_string)
    }
}

/// Day records keyed by `YYYY-MM-DD` in the viewer's local calendar.
pub type DayRecords = BTreeMap<String, DayRecord>;

/// Look up the record for a local calendar date.
///
/// Absent dates are reported as unavailable.
pub fn record_for(records: &DayRecords, date: NaiveDate) -> DayRecord {
    records.get(&format_date(date)).cloned().unwrap_or_else(DayRecord::unavailable)
}

/// Success body of `GET /calendar-data`.
///
/// Only `dates` drives painting; the envelope fields are informational and
/// optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarData {
    #[serde(default)]
    pub start_date: Option<String>,

    #[serde(default)]
    pub end_date: Option<String>,

    #[serde(default)]
    pub property_id: Option<serde_json::Value>,

    #[serde(default, rename = "room_type_id")]
    pub room_type_id: Option<serde_json::Value>,

    #[serde(default, rename = "currency_code")]
    pub currency_code: Option<String>,

    #[serde(default)]
    pub dates: DayRecords,
}

/// Error body of `GET /calendar-data`.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
