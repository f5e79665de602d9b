//! Calendar widget contract.
//!
//! The calendar widget owns day-cell creation and month navigation. This
//! module describes what the pipeline needs from it: the visible anchor month,
//! a way to jump, and access to the day cells once the widget has built its
//! day container.
//!
//! Painting produces one of two mutually exclusive presentation classes per
//! cell. Priced cells carry a day-number part and a day-price part.

pub mod grid;

use chrono::{Datelike, NaiveDate};

pub use grid::{GridCalendar, GridFactory};

/// Presentation class applied by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellClass {
    Unavailable,
    HasPrice,
}

impl CellClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            CellClass::Unavailable => "unavailable",
            CellClass::HasPrice => "has-price",
        }
    }
}

/// Child element of a day cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellPart {
    DayNumber(String),
    DayPrice(String),
}

impl CellPart {
    pub fn class_name(&self) -> &'static str {
        match self {
            CellPart::DayNumber(_) => "day-number",
            CellPart::DayPrice(_) => "day-price",
        }
    }

    pub fn text(&self) -> &str {
        match self {
            CellPart::DayNumber(text) | CellPart::DayPrice(text) => text,
        }
    }
}

/// One date in the rendered calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCell {
    date: NaiveDate,
    day_number: String,
    class: Option<CellClass>,
    parts: Vec<CellPart>,
}

impl DayCell {
    /// A fresh, unpainted cell showing only its day number.
    pub fn new(date: NaiveDate) -> Self {
        let day_number = date.day().to_string();
        Self { date, parts: vec![CellPart::DayNumber(day_number.clone())], day_number, class: None }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn day_number(&self) -> &str {
        &self.day_number
    }

    pub fn class(&self) -> Option<CellClass> {
        self.class
    }

    pub fn parts(&self) -> &[CellPart] {
        &self.parts
    }

    /// Price text, if the cell is painted as priced.
    pub fn price(&self) -> Option<&str> {
        self.parts.iter().find_map(|part| match part {
            CellPart::DayPrice(price) => Some(price.as_str()),
            CellPart::DayNumber(_) => None,
        })
    }

    /// Concatenated text of all parts.
    pub fn text(&self) -> String {
        self.parts.iter().map(CellPart::text).collect::<Vec<_>>().join(" ")
    }

    /// Paint as not bookable: day number only.
    pub fn mark_unavailable(&mut self) {
        self.class = Some(CellClass::Unavailable);
        self.parts = vec![CellPart::DayNumber(self.day_number.clone())];
    }

    /// Paint as bookable with `price`.
    pub fn mark_priced(&mut self, price: String) {
        self.class = Some(CellClass::HasPrice);
        self.parts = vec![CellPart::DayNumber(self.day_number.clone()), CellPart::DayPrice(price)];
    }
}

/// A live calendar widget instance.
pub trait CalendarView: Send {
    /// First day of the first visible month.
    fn anchor(&self) -> NaiveDate;

    /// Navigate so the month containing `anchor` is the first visible month.
    fn jump_to(&mut self, anchor: NaiveDate);

    /// Number of months rendered side by side.
    fn months_shown(&self) -> u32;

    /// The day cells, or `None` while the day container does not exist yet.
    fn day_cells_mut(&mut self) -> Option<&mut [DayCell]>;

    /// Tear the widget down before it is replaced.
    fn destroy(&mut self) {}
}

/// Builds widget instances; the widget cannot change its month count in place.
pub trait CalendarFactory: Send + Sync {
    type View: CalendarView;

    /// Construct a widget showing `months` months.
    fn create(&self, months: u32) -> Self::View;
}
