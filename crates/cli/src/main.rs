//! availcal command line entry point.
//!
//! Mounts a calendar widget over the in-memory month grid, fetches one window
//! from the aggregation endpoint and prints the painted months.
//! Logging goes to stderr so the calendar on stdout stays clean.

use anyhow::{Context, Result};
use availcal_client::widget::{PROPERTY_ID_KEY, ROOM_TYPE_ID_KEY};
use availcal_client::{CalendarWidget, Container, GridFactory, HttpSource, HttpSourceConfig, RefreshOutcome};
use availcal_core::WidgetConfig;
use availcal_core::dates::parse_date;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Print nightly availability and prices as a text calendar.
#[derive(Debug, Parser)]
#[command(name = "availcal", version, about)]
struct Args {
    /// Property to show.
    #[arg(long, env = "AVAILCAL_PROPERTY_ID")]
    property_id: String,

    /// Room type within the property.
    #[arg(long, env = "AVAILCAL_ROOM_TYPE_ID")]
    room_type_id: String,

    /// First month to show, as YYYY-MM (default: current month).
    #[arg(long)]
    month: Option<String>,

    /// Container width; below the narrow breakpoint a single month is shown.
    #[arg(long, default_value_t = 800.0)]
    width: f64,

    /// Override the configured endpoint base URL.
    #[arg(long)]
    api_base_url: Option<String>,

    /// Emit JSON log lines.
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(debug_mode: bool, json: bool) {
    let default_level = if debug_mode { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = WidgetConfig::load().context("loading configuration")?;
    if let Some(base_url) = args.api_base_url {
        config.api_base_url = base_url;
        config.validate().context("validating --api-base-url")?;
    }

    init_tracing(config.debug_mode, args.json_logs);
    tracing::debug!(?config, "configuration loaded");

    let source = HttpSource::new(HttpSourceConfig::from(&config))?;
    let container = Container::new(args.width)
        .with_data(PROPERTY_ID_KEY, args.property_id)
        .with_data(ROOM_TYPE_ID_KEY, args.room_type_id);

    let widget = CalendarWidget::mount(&config, &container, source, GridFactory)?;

    if let Some(month) = args.month.as_deref() {
        let anchor = parse_date(&format!("{month}-01")).with_context(|| format!("invalid --month {month:?}"))?;
        widget.jump_to(anchor).await;
    }

    match widget.refresh().await {
        RefreshOutcome::Painted(summary) => {
            tracing::info!(cells = summary.cells, priced = summary.priced, "calendar painted");
        }
        other => tracing::warn!(?other, "calendar was not painted"),
    }

    print!("{}", widget.with_view(|grid| grid.render_text()).await);

    Ok(())
}
