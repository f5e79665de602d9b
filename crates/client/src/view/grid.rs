//! In-memory month grid implementing [`CalendarView`].
//!
//! Used by the CLI to render painted months to a terminal and by tests as a
//! stand-in for a browser calendar.

use std::fmt::Write;

use availcal_core::dates::{add_months, first_of_month, today};
use chrono::{Datelike, NaiveDate};

use super::{CalendarFactory, CalendarView, CellClass, DayCell};

/// Width of one rendered day column.
const COLUMN_WIDTH: usize = 8;

/// Calendar that lays out every day of `months` consecutive months.
#[derive(Debug, Clone)]
pub struct GridCalendar {
    anchor: NaiveDate,
    months: u32,
    cells: Vec<DayCell>,
    destroyed: bool,
}

impl GridCalendar {
    /// Grid showing `months` months starting at the month of `anchor`.
    pub fn new(months: u32, anchor: NaiveDate) -> Self {
        let mut grid = Self { anchor: first_of_month(anchor), months: months.max(1), cells: Vec::new(), destroyed: false };
        grid.rebuild();
        grid
    }

    /// Move the visible window by `delta` months.
    pub fn step(&mut self, delta: i32) {
        if let Ok(anchor) = add_months(self.anchor, delta) {
            self.jump_to(anchor);
        }
    }

    pub fn cells(&self) -> &[DayCell] {
        &self.cells
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn rebuild(&mut self) {
        self.cells.clear();
        let Ok(end) = add_months(self.anchor, self.months as i32) else {
            return;
        };
        self.cells.extend(self.anchor.iter_days().take_while(|d| *d < end).map(DayCell::new));
    }

    /// Render the visible months as plain text, one month after another.
    ///
    /// Priced days show their price, unavailable days are struck with `x`,
    /// unpainted days show the number alone.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for offset in 0..self.months as i32 {
            let Ok(month_start) = add_months(self.anchor, offset) else { continue };
            let _ = writeln!(out, "{}", month_start.format("%B %Y"));
            for name in ["Mo", "Tu", "We", "Th", "Fr", "Sa", "Su"] {
                let _ = write!(out, "{name:<COLUMN_WIDTH$}");
            }
            out.push('\n');

            let lead = month_start.weekday().num_days_from_monday() as usize;
            out.push_str(&" ".repeat(lead * COLUMN_WIDTH));

            let month_cells = self
                .cells
                .iter()
                .filter(|c| c.date().year() == month_start.year() && c.date().month() == month_start.month());
            for cell in month_cells {
                let label = match (cell.class(), cell.price()) {
                    (Some(CellClass::HasPrice), Some(price)) => format!("{}:{}", cell.day_number(), price),
                    (Some(CellClass::Unavailable), _) => format!("{}x", cell.day_number()),
                    _ => cell.day_number().to_string(),
                };
                let _ = write!(out, "{label:<COLUMN_WIDTH$}");
                if cell.date().weekday().num_days_from_monday() == 6 {
                    out.push('\n');
                }
            }
            out.push_str("\n\n");
        }
        out
    }
}

impl CalendarView for GridCalendar {
    fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    fn jump_to(&mut self, anchor: NaiveDate) {
        self.anchor = first_of_month(anchor);
        self.rebuild();
    }

    fn months_shown(&self) -> u32 {
        self.months
    }

    fn day_cells_mut(&mut self) -> Option<&mut [DayCell]> {
        if self.destroyed {
            return None;
        }
        Some(&mut self.cells)
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.cells.clear();
    }
}

/// Factory producing [`GridCalendar`]s opened on the current local month.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridFactory;

impl CalendarFactory for GridFactory {
    type View = GridCalendar;

    fn create(&self, months: u32) -> GridCalendar {
        GridCalendar::new(months, today())
    }
}
