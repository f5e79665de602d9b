//! Container-width driven layout selection.
//!
//! Narrow containers show one month, wide ones two. The widget cannot change
//! its month count in place, so a change of layout mode is reported to the
//! caller, which rebuilds the widget.

use std::sync::atomic::{AtomicU32, Ordering};

use availcal_core::WidgetConfig;

/// Default width below which a single month is shown.
pub const DEFAULT_BREAKPOINT: f64 = 640.0;

/// Months to show for a container `width` wide.
pub fn months_for_width(width: f64, breakpoint: f64) -> u32 {
    if width < breakpoint { 1 } else { 2 }
}

/// A change of months shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutChange {
    pub from: u32,
    pub to: u32,
}

/// Tracks the current layout mode for one widget instance.
#[derive(Debug)]
pub struct ResponsiveController {
    breakpoint: f64,
    months: AtomicU32,
}

impl ResponsiveController {
    /// Controller for a container currently `initial_width` wide.
    pub fn new(breakpoint: f64, initial_width: f64) -> Self {
        Self { breakpoint, months: AtomicU32::new(months_for_width(initial_width, breakpoint)) }
    }

    pub fn from_config(config: &WidgetConfig, initial_width: f64) -> Self {
        Self::new(config.narrow_breakpoint, initial_width)
    }

    /// Months shown in the current layout.
    pub fn months(&self) -> u32 {
        self.months.load(Ordering::SeqCst)
    }

    /// Record a new container width; returns the change when the mode flips.
    pub fn observe(&self, width: f64) -> Option<LayoutChange> {
        let to = months_for_width(width, self.breakpoint);
        let from = self.months.swap(to, Ordering::SeqCst);
        if from == to {
            return None;
        }
        tracing::debug!(width, from, to, "layout mode changed");
        Some(LayoutChange { from, to })
    }
}
