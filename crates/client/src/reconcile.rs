//! Painting fetched day records onto widget day cells.
//!
//! Right after construction the widget may not have built its day container
//! yet. [`DayReconciler::reconcile`] polls for it a bounded number of times and
//! gives up with [`Error::RenderNotReady`] if it never appears. The abandoned
//! paint is not retried; the next refresh paints again.

use std::time::Duration;

use availcal_core::model::record_for;
use availcal_core::{DayRecords, Error, WidgetConfig};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::view::{CalendarView, DayCell};

/// Default number of day container lookups after the first one.
pub const DEFAULT_READY_RETRIES: u32 = 10;

/// Default delay between day container lookups.
pub const DEFAULT_READY_INTERVAL: Duration = Duration::from_millis(100);

/// Counts from one successful paint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaintSummary {
    pub cells: usize,
    pub priced: usize,
}

/// How a reconcile attempt ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Painted(PaintSummary),
    /// A newer request took over while waiting for the container.
    Cancelled,
}

/// Paint one cell from the records.
///
/// Missing or unavailable dates show the day number only. Available dates show
/// the day number and price; an available date without a price gets an empty
/// price part.
pub fn paint_cell(cell: &mut DayCell, records: &DayRecords) {
    let record = record_for(records, cell.date());
    if !record.available {
        cell.mark_unavailable();
        return;
    }
    cell.mark_priced(record.display_price().unwrap_or_default());
}

/// Paint every cell, returning what was painted.
pub fn paint_cells(cells: &mut [DayCell], records: &DayRecords) -> PaintSummary {
    let mut summary = PaintSummary { cells: cells.len(), priced: 0 };
    for cell in cells.iter_mut() {
        paint_cell(cell, records);
        if cell.price().is_some() {
            summary.priced += 1;
        }
    }
    summary
}

/// Applies day records to a live widget, waiting for its day container.
#[derive(Debug, Clone)]
pub struct DayReconciler {
    retries: u32,
    interval: Duration,
}

impl Default for DayReconciler {
    fn default() -> Self {
        Self::new(DEFAULT_READY_RETRIES, DEFAULT_READY_INTERVAL)
    }
}

impl DayReconciler {
    pub fn new(retries: u32, interval: Duration) -> Self {
        Self { retries, interval }
    }

    pub fn from_config(config: &WidgetConfig) -> Self {
        Self::new(config.ready_retries, config.ready_retry_interval())
    }

    /// Paint `records` onto the widget in `view`.
    ///
    /// One lookup is made right away, then up to `retries` more, each after
    /// `interval`. The view lock is only held while checking for and painting
    /// the cells, never across the retry delay. `token` is checked before every
    /// lookup.
    pub async fn reconcile<V: CalendarView>(
        &self, view: &Mutex<V>, records: &DayRecords, token: &CancellationToken,
    ) -> Result<ReconcileOutcome, Error> {
        let mut retry = 0;
        loop {
            if token.is_cancelled() {
                return Ok(ReconcileOutcome::Cancelled);
            }

            {
                let mut view = view.lock().await;
                if let Some(cells) = view.day_cells_mut() {
                    let summary = paint_cells(cells, records);
                    tracing::debug!(retry, cells = summary.cells, priced = summary.priced, "painted day cells");
                    return Ok(ReconcileOutcome::Painted(summary));
                }
            }

            if retry == self.retries {
                break;
            }
            retry += 1;
            tracing::debug!(retry, retries = self.retries, "day container not ready");
            tokio::time::sleep(self.interval).await;
        }

        Err(Error::RenderNotReady { attempts: self.retries })
    }
}
