//! Client for the availability aggregation endpoint.
//!
//! ### Endpoint
//! - `GET {api_base_url}/calendar-data?propertyId=&roomTypeId=&startDate=&endDate=`
//! - 200: `{"dates": {"YYYY-MM-DD": {"available": bool, "price": number}}}`
//! - otherwise: `{"error": string}`
//!
//! ### Fetch pipeline
//! - [`AvailabilitySource`] is the seam between the coordinator and the
//!   network; [`HttpSource`] is the reqwest implementation.
//! - [`FetchCoordinator`] puts the request cache, cancellation and
//!   latest-wins sequencing in front of a source.

pub mod coordinator;
pub mod response;

use std::time::{Duration, Instant};

use availcal_core::{CacheKey, DayRecords, Error, WidgetConfig};
use reqwest::{Client, header};
use url::Url;

pub use coordinator::{FetchCoordinator, FetchOutcome, RequestTicket};
pub use response::decode;

/// Path appended to the configured base URL.
const CALENDAR_DATA_PATH: &str = "calendar-data";

/// Something that can produce day records for a cache key.
#[async_trait::async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Fetch the day records for `key`'s property, room type and window.
    async fn fetch_dates(&self, key: &CacheKey) -> Result<DayRecords, Error>;
}

/// Configuration for the HTTP source.
#[derive(Debug, Clone)]
pub struct HttpSourceConfig {
    /// Base URL of the aggregation endpoint (default: http://localhost:3000)
    pub base_url: String,

    /// Request timeout (default: 6s)
    pub timeout: Duration,

    /// User agent string (default: "availcal/0.1")
    pub user_agent: String,
}

impl Default for HttpSourceConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout: Duration::from_millis(6_000),
            user_agent: "availcal/0.1".to_string(),
        }
    }
}

impl From<&WidgetConfig> for HttpSourceConfig {
    fn from(config: &WidgetConfig) -> Self {
        Self { base_url: config.api_base_url.clone(), timeout: config.request_timeout(), ..Default::default() }
    }
}

/// reqwest-backed [`AvailabilitySource`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    http: Client,
    endpoint: Url,
}

impl HttpSource {
    /// Create a new source with the given configuration.
    pub fn new(config: HttpSourceConfig) -> Result<Self, Error> {
        let base = config.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/{CALENDAR_DATA_PATH}"))
            .map_err(|e| Error::InvalidArgument(format!("invalid api base url {:?}: {}", config.base_url, e)))?;

        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .build()
            .map_err(|e| Error::NetworkFailure(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http, endpoint })
    }

    /// Full request URL for `key`.
    pub fn request_url(&self, key: &CacheKey) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("propertyId", &key.property_id)
            .append_pair("roomTypeId", &key.room_type_id)
            .append_pair("startDate", &key.start_param())
            .append_pair("endDate", &key.end_param());
        url
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait::async_trait]
impl AvailabilitySource for HttpSource {
    async fn fetch_dates(&self, key: &CacheKey) -> Result<DayRecords, Error> {
        let start = Instant::now();
        let url = self.request_url(key);

        let response = self
            .http
            .get(url.as_str())
            .header(header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::NetworkFailure(format!("request timed out: {}", e))
                } else {
                    Error::NetworkFailure(format!("network error: {}", e))
                }
            })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::NetworkFailure(format!("failed to read response: {}", e)))?;

        tracing::debug!(
            "fetched {} -> {} in {}ms ({} bytes)",
            key,
            status.as_u16(),
            start.elapsed().as_millis(),
            bytes.len()
        );

        decode(status.as_u16(), &bytes)
    }
}
