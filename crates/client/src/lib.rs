//! Client code for availcal.
//!
//! This crate provides the fetch, cache, paint and layout pipeline that sits
//! between the availability aggregation endpoint and a calendar widget.

pub mod debounce;
pub mod fetch;
pub mod reconcile;
pub mod responsive;
pub mod view;
pub mod widget;

pub use debounce::Debouncer;
pub use fetch::{AvailabilitySource, FetchCoordinator, FetchOutcome, HttpSource, HttpSourceConfig, RequestTicket};
pub use reconcile::{DayReconciler, PaintSummary, ReconcileOutcome};
pub use responsive::{LayoutChange, ResponsiveController, months_for_width};
pub use view::{CalendarFactory, CalendarView, CellClass, CellPart, DayCell, GridCalendar, GridFactory};
pub use widget::{CalendarWidget, Container, RefreshOutcome};
