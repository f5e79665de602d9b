//! Per-instance calendar widget context.
//!
//! A [`CalendarWidget`] owns everything one calendar on a page needs: the ids
//! read from its container, a fetch coordinator with its own cache and request
//! sequence, the live widget view, layout tracking and the debounce timers.
//! Several widgets on one page share nothing.
//!
//! Event flow: resize or navigation → debounced → (rebuild on layout change)
//! → compute window → fetch through the cache → paint if still the latest
//! request.

use std::collections::HashMap;
use std::sync::Arc;

use availcal_core::dates::visible_range;
use availcal_core::{Error, WidgetConfig};
use chrono::NaiveDate;
use tokio::sync::Mutex;

use crate::debounce::Debouncer;
use crate::fetch::{AvailabilitySource, FetchCoordinator, FetchOutcome};
use crate::reconcile::{DayReconciler, PaintSummary, ReconcileOutcome};
use crate::responsive::{LayoutChange, ResponsiveController};
use crate::view::{CalendarFactory, CalendarView};

/// Dataset key holding the property id.
pub const PROPERTY_ID_KEY: &str = "propertyId";

/// Dataset key holding the room type id.
pub const ROOM_TYPE_ID_KEY: &str = "roomTypeId";

/// The host element the widget is mounted into.
#[derive(Debug, Clone, Default)]
pub struct Container {
    dataset: HashMap<String, String>,
    width: f64,
}

impl Container {
    pub fn new(width: f64) -> Self {
        Self { dataset: HashMap::new(), width }
    }

    /// Set a `data-*` attribute.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.dataset.insert(key.into(), value.into());
        self
    }

    pub fn data(&self, key: &str) -> Option<&str> {
        self.dataset.get(key).map(String::as_str)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    fn require(&self, key: &str) -> Result<String, Error> {
        match self.data(key).map(str::trim) {
            Some(value) if !value.is_empty() => Ok(value.to_string()),
            _ => Err(Error::InvalidArgument(format!("container is missing data-{key}"))),
        }
    }
}

/// How a refresh ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Day cells were painted with this request's data.
    Painted(PaintSummary),
    /// A newer request took over; nothing was applied.
    Superseded,
    /// The day container never became ready; the paint was dropped.
    Abandoned,
}

/// One calendar widget instance and all of its state.
pub struct CalendarWidget<S, F: CalendarFactory> {
    property_id: String,
    room_type_id: String,
    coordinator: FetchCoordinator<S>,
    reconciler: DayReconciler,
    responsive: ResponsiveController,
    factory: F,
    view: Mutex<F::View>,
    resize_debounce: Debouncer,
    navigate_debounce: Debouncer,
}

impl<S, F> CalendarWidget<S, F>
where
    S: AvailabilitySource + 'static,
    F: CalendarFactory + 'static,
{
    /// Build a widget inside `container`.
    ///
    /// The month count follows the container width. Nothing is fetched until
    /// [`refresh`](Self::refresh) or an event handler runs.
    pub fn mount(config: &WidgetConfig, container: &Container, source: S, factory: F) -> Result<Arc<Self>, Error> {
        let property_id = container.require(PROPERTY_ID_KEY)?;
        let room_type_id = container.require(ROOM_TYPE_ID_KEY)?;

        let responsive = ResponsiveController::from_config(config, container.width());
        let view = factory.create(responsive.months());

        tracing::debug!(
            property_id = %property_id,
            room_type_id = %room_type_id,
            months = responsive.months(),
            "calendar widget mounted"
        );

        Ok(Arc::new(Self {
            property_id,
            room_type_id,
            coordinator: FetchCoordinator::from_config(source, config),
            reconciler: DayReconciler::from_config(config),
            responsive,
            factory,
            view: Mutex::new(view),
            resize_debounce: Debouncer::new(config.debounce()),
            navigate_debounce: Debouncer::new(config.debounce()),
        }))
    }

    pub fn property_id(&self) -> &str {
        &self.property_id
    }

    pub fn room_type_id(&self) -> &str {
        &self.room_type_id
    }

    /// Months shown in the current layout.
    pub fn months_shown(&self) -> u32 {
        self.responsive.months()
    }

    pub fn coordinator(&self) -> &FetchCoordinator<S> {
        &self.coordinator
    }

    /// First visible month of the live view.
    pub async fn anchor(&self) -> NaiveDate {
        self.view.lock().await.anchor()
    }

    /// Inspect the live view.
    pub async fn with_view<R>(&self, f: impl FnOnce(&F::View) -> R) -> R {
        let view = self.view.lock().await;
        f(&view)
    }

    /// Move the live view to the month containing `anchor` without fetching.
    pub async fn jump_to(&self, anchor: NaiveDate) {
        self.view.lock().await.jump_to(anchor);
    }

    /// Fetch and paint the window currently shown.
    ///
    /// Cancels any in-flight refresh of this widget first. Never fails:
    /// fetch errors paint as unavailable, a superseded request changes
    /// nothing and a missing day container is logged and dropped.
    pub async fn refresh(&self) -> RefreshOutcome {
        let ticket = self.coordinator.begin().await;

        let (anchor, months) = {
            let view = self.view.lock().await;
            (view.anchor(), view.months_shown())
        };

        let range = match visible_range(anchor, months) {
            Ok(range) => range,
            Err(e) => {
                tracing::warn!(code = e.code(), "cannot compute window for {}: {}", anchor, e);
                return RefreshOutcome::Abandoned;
            }
        };

        let outcome = self
            .coordinator
            .fetch_range(&self.property_id, &self.room_type_id, range, Some(ticket.token()))
            .await;

        let FetchOutcome::Data(records) = outcome else {
            return RefreshOutcome::Superseded;
        };

        if !self.coordinator.is_latest(&ticket) {
            tracing::debug!(seq = ticket.seq(), "dropping stale response for {}", range);
            return RefreshOutcome::Superseded;
        }

        match self.reconciler.reconcile(&self.view, &records, ticket.token()).await {
            Ok(ReconcileOutcome::Painted(summary)) => RefreshOutcome::Painted(summary),
            Ok(ReconcileOutcome::Cancelled) => RefreshOutcome::Superseded,
            Err(e) => {
                tracing::warn!(code = e.code(), "abandoning paint for {}: {}", range, e);
                RefreshOutcome::Abandoned
            }
        }
    }

    /// Destroy the live view and build a new one showing `months` months.
    ///
    /// The visible anchor month is read before the teardown and jumped to
    /// after construction.
    pub async fn reinitialize(&self, months: u32) -> NaiveDate {
        let mut view = self.view.lock().await;
        let anchor = view.anchor();
        view.destroy();

        let mut fresh = self.factory.create(months);
        fresh.jump_to(anchor);
        *view = fresh;

        tracing::debug!(months, anchor = %anchor, "calendar widget reinitialized");
        anchor
    }

    /// Apply a container width now; rebuilds the view if the layout mode flips.
    pub async fn apply_width(&self, width: f64) -> Option<LayoutChange> {
        let change = self.responsive.observe(width)?;
        self.reinitialize(change.to).await;
        Some(change)
    }

    /// Container resize event. Debounced; rebuilds and repaints on mode change.
    pub fn on_resize(self: &Arc<Self>, width: f64) {
        let widget = Arc::clone(self);
        self.resize_debounce.schedule(async move {
            if widget.apply_width(width).await.is_some() {
                widget.refresh().await;
            }
        });
    }

    /// Month or year navigation event. Debounced repaint of the new window.
    pub fn on_navigate(self: &Arc<Self>) {
        let widget = Arc::clone(self);
        self.navigate_debounce.schedule(async move {
            widget.refresh().await;
        });
    }

    /// Jump to `anchor` and schedule a debounced repaint.
    pub async fn navigate(self: &Arc<Self>, anchor: NaiveDate) {
        self.jump_to(anchor).await;
        self.on_navigate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{CellClass, DayCell, GridCalendar};
    use availcal_core::dates::format_date;
    use availcal_core::{CacheKey, DayRecord, DayRecords};
    use chrono::Datelike;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// Prices every day of the window with its month number, after a per-month delay.
    #[derive(Default)]
    struct MonthPricedSource {
        delays: HashMap<NaiveDate, Duration>,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AvailabilitySource for MonthPricedSource {
        async fn fetch_dates(&self, key: &CacheKey) -> Result<DayRecords, Error> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delays.get(&key.range.start()) {
                tokio::time::sleep(*delay).await;
            }
            let price = key.range.start().month() * 100;
            Ok(key.range.days().map(|d| (format_date(d), DayRecord::priced(price))).collect())
        }
    }

    /// Grid factory whose views open on a fixed month.
    struct FixedFactory {
        anchor: NaiveDate,
        created: AtomicUsize,
    }

    impl FixedFactory {
        fn new(anchor: NaiveDate) -> Self {
            Self { anchor, created: AtomicUsize::new(0) }
        }
    }

    impl CalendarFactory for FixedFactory {
        type View = GridCalendar;

        fn create(&self, months: u32) -> GridCalendar {
            self.created.fetch_add(1, Ordering::SeqCst);
            GridCalendar::new(months, self.anchor)
        }
    }

    /// Grid whose day container can be hidden from the reconciler.
    struct GatedView {
        grid: GridCalendar,
        ready: Arc<AtomicBool>,
    }

    impl CalendarView for GatedView {
        fn anchor(&self) -> NaiveDate {
            self.grid.anchor()
        }

        fn jump_to(&mut self, anchor: NaiveDate) {
            self.grid.jump_to(anchor);
        }

        fn months_shown(&self) -> u32 {
            self.grid.months_shown()
        }

        fn day_cells_mut(&mut self) -> Option<&mut [DayCell]> {
            if self.ready.load(Ordering::SeqCst) { self.grid.day_cells_mut() } else { None }
        }
    }

    struct GatedFactory {
        ready: Arc<AtomicBool>,
    }

    impl CalendarFactory for GatedFactory {
        type View = GatedView;

        fn create(&self, months: u32) -> GatedView {
            GatedView { grid: GridCalendar::new(months, date(2025, 5, 1)), ready: Arc::clone(&self.ready) }
        }
    }

    fn container(width: f64) -> Container {
        Container::new(width).with_data(PROPERTY_ID_KEY, "123").with_data(ROOM_TYPE_ID_KEY, "456")
    }

    fn prices_of(grid: &GridCalendar, month: u32) -> Vec<Option<String>> {
        grid.cells()
            .iter()
            .filter(|c| c.date().month() == month)
            .map(|c| c.price().map(str::to_string))
            .collect()
    }

    #[test]
    fn test_mount_requires_ids() {
        let config = WidgetConfig::default();
        let missing_room = Container::new(800.0).with_data(PROPERTY_ID_KEY, "123");
        let result =
            CalendarWidget::mount(&config, &missing_room, MonthPricedSource::default(), FixedFactory::new(date(2025, 5, 1)));
        assert!(matches!(result, Err(Error::InvalidArgument(msg)) if msg.contains("roomTypeId")));

        let blank_property = Container::new(800.0).with_data(PROPERTY_ID_KEY, " ").with_data(ROOM_TYPE_ID_KEY, "456");
        let result = CalendarWidget::mount(
            &config,
            &blank_property,
            MonthPricedSource::default(),
            FixedFactory::new(date(2025, 5, 1)),
        );
        assert!(matches!(result, Err(Error::InvalidArgument(msg)) if msg.contains("propertyId")));
    }

    #[tokio::test]
    async fn test_mount_picks_layout_from_width() {
        let config = WidgetConfig::default();
        let narrow =
            CalendarWidget::mount(&config, &container(400.0), MonthPricedSource::default(), FixedFactory::new(date(2025, 5, 1)))
                .unwrap();
        let wide =
            CalendarWidget::mount(&config, &container(800.0), MonthPricedSource::default(), FixedFactory::new(date(2025, 5, 1)))
                .unwrap();

        assert_eq!(narrow.months_shown(), 1);
        assert_eq!(wide.months_shown(), 2);
        assert_eq!(wide.with_view(|v| v.months_shown()).await, 2);
        assert_eq!(wide.property_id(), "123");
        assert_eq!(wide.room_type_id(), "456");
    }

    #[tokio::test]
    async fn test_refresh_paints_visible_window() {
        let config = WidgetConfig::default();
        let widget =
            CalendarWidget::mount(&config, &container(800.0), MonthPricedSource::default(), FixedFactory::new(date(2025, 5, 1)))
                .unwrap();

        let outcome = widget.refresh().await;
        assert_eq!(outcome, RefreshOutcome::Painted(PaintSummary { cells: 61, priced: 61 }));

        let may = widget.with_view(|g| prices_of(g, 5)).await;
        assert!(may.iter().all(|p| p.as_deref() == Some("500")));

        widget.refresh().await;
        assert_eq!(widget.coordinator().source().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_latest_request_wins_on_screen() {
        let source = MonthPricedSource {
            delays: HashMap::from([(date(2025, 5, 1), Duration::from_millis(500)), (date(2025, 6, 1), Duration::from_millis(50))]),
            ..Default::default()
        };
        let config = WidgetConfig::default();
        let widget = CalendarWidget::mount(&config, &container(800.0), source, FixedFactory::new(date(2025, 5, 1))).unwrap();

        let first = {
            let widget = Arc::clone(&widget);
            tokio::spawn(async move { widget.refresh().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        widget.jump_to(date(2025, 6, 1)).await;
        let second = widget.refresh().await;

        assert_eq!(first.await.unwrap(), RefreshOutcome::Superseded);
        assert!(matches!(second, RefreshOutcome::Painted(_)));

        tokio::time::sleep(Duration::from_secs(1)).await;
        let june = widget.with_view(|g| prices_of(g, 6)).await;
        assert!(!june.is_empty());
        assert!(june.iter().all(|p| p.as_deref() == Some("600")));
        assert_eq!(widget.coordinator().cached_entries().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_reinitializes_and_keeps_anchor() {
        let config = WidgetConfig::default();
        let factory = FixedFactory::new(date(2025, 1, 1));
        let widget = CalendarWidget::mount(&config, &container(800.0), MonthPricedSource::default(), factory).unwrap();
        widget.jump_to(date(2025, 8, 1)).await;
        assert_eq!(widget.months_shown(), 2);

        widget.on_resize(700.0);
        widget.on_resize(500.0);
        widget.on_resize(400.0);
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(widget.months_shown(), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(widget.months_shown(), 1);
        assert_eq!(widget.anchor().await, date(2025, 8, 1));
        assert_eq!(widget.with_view(|v| v.months_shown()).await, 1);
        assert_eq!(widget.factory.created.load(Ordering::SeqCst), 2);

        let august = widget.with_view(|g| prices_of(g, 8)).await;
        assert!(august.iter().all(|p| p.as_deref() == Some("800")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_resize_within_mode_does_not_rebuild() {
        let config = WidgetConfig::default();
        let widget =
            CalendarWidget::mount(&config, &container(800.0), MonthPricedSource::default(), FixedFactory::new(date(2025, 5, 1)))
                .unwrap();

        widget.on_resize(1200.0);
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(widget.factory.created.load(Ordering::SeqCst), 1);
        assert_eq!(widget.coordinator().source().calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_is_debounced() {
        let config = WidgetConfig::default();
        let widget =
            CalendarWidget::mount(&config, &container(800.0), MonthPricedSource::default(), FixedFactory::new(date(2025, 5, 1)))
                .unwrap();

        widget.navigate(date(2025, 6, 1)).await;
        widget.navigate(date(2025, 7, 1)).await;
        widget.navigate(date(2025, 8, 1)).await;
        tokio::time::sleep(Duration::from_millis(400)).await;

        assert_eq!(widget.coordinator().source().calls.load(Ordering::SeqCst), 1);
        let august = widget.with_view(|g| prices_of(g, 8)).await;
        assert!(august.iter().all(|p| p.as_deref() == Some("800")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_not_ready_is_abandoned_then_next_navigation_paints() {
        let ready = Arc::new(AtomicBool::new(false));
        let config = WidgetConfig::default();
        let factory = GatedFactory { ready: Arc::clone(&ready) };
        let widget = CalendarWidget::mount(&config, &container(800.0), MonthPricedSource::default(), factory).unwrap();

        let start = tokio::time::Instant::now();
        assert_eq!(widget.refresh().await, RefreshOutcome::Abandoned);
        assert_eq!(start.elapsed(), Duration::from_millis(1000));

        ready.store(true, Ordering::SeqCst);
        widget.navigate(date(2025, 6, 1)).await;
        tokio::time::sleep(Duration::from_millis(400)).await;

        let classes = widget
            .with_view(|v| v.grid.cells().iter().map(DayCell::class).collect::<Vec<_>>())
            .await;
        assert!(!classes.is_empty());
        assert!(classes.iter().all(|c| *c == Some(CellClass::HasPrice)));
    }

    #[tokio::test]
    async fn test_independent_instances() {
        let config = WidgetConfig::default();
        let a =
            CalendarWidget::mount(&config, &container(800.0), MonthPricedSource::default(), FixedFactory::new(date(2025, 5, 1)))
                .unwrap();
        let b =
            CalendarWidget::mount(&config, &container(400.0), MonthPricedSource::default(), FixedFactory::new(date(2025, 9, 1)))
                .unwrap();

        let ticket_a = a.coordinator().begin().await;
        b.refresh().await;

        assert!(a.coordinator().is_latest(&ticket_a));
        assert_eq!(a.coordinator().cached_entries().await, 0);
        assert_eq!(b.coordinator().cached_entries().await, 1);
    }
}
