//! Batched METAR retrieval from the Aviation Weather Center data API.
//!
//! One GET per refresh for every configured station:
//! `<base_url>/metar?ids=KBOS,KJFK&format=json`.

use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::StatusCode;
use std::collections::HashMap;
use std::time::Duration;

use super::observation::Observation;

// ── Constants ───────────────────────────────────────────────────────

/// Aviation Weather Center data API.
pub const DEFAULT_BASE_URL: &str = "https://aviationweather.gov/api/data";

/// Per-request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

const METAR_PATH: &str = "metar";

const CLIENT_USER_AGENT: &str = concat!("metar-strip/", env!("CARGO_PKG_VERSION"));

// ── Errors ──────────────────────────────────────────────────────────

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from METAR retrieval.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request could not be built (no stations, bad base URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport, HTTP status, timeout or decoding failure.
    #[error("failed to fetch METARs: {source}")]
    FetchFailed {
        #[source]
        source: BoxError,
    },
}

impl FetchError {
    pub fn failed(source: impl Into<BoxError>) -> Self {
        FetchError::FetchFailed {
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FetchError>;

// ── Source trait ────────────────────────────────────────────────────

/// Anything that can turn station identifiers into observations.
///
/// The pipeline only talks to this trait, so tests can swap in a scripted
/// source. Implementations must not return partial results on failure;
/// stations missing from a successful response are simply absent.
#[async_trait]
pub trait WeatherSource: Send + Sync + 'static {
    async fn fetch(
        &self,
        station_ids: &[String],
        timeout: Duration,
    ) -> Result<HashMap<String, Observation>>;
}

// ── Client ──────────────────────────────────────────────────────────

/// HTTP client for the METAR endpoint.
#[derive(Debug, Clone)]
pub struct MetarClient {
    client: reqwest::Client,
    base_url: String,
}

impl Default for MetarClient {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl MetarClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Full URL of the METAR endpoint, without query.
    pub fn endpoint(&self) -> Result<reqwest::Url> {
        let base = self.base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(FetchError::InvalidRequest("empty base URL".to_string()));
        }
        reqwest::Url::parse(&format!("{}/{}", base, METAR_PATH))
            .map_err(|e| FetchError::InvalidRequest(format!("invalid base URL {}: {}", base, e)))
    }

    /// Fetch the latest METAR for each station, keyed by station id.
    ///
    /// Later duplicates in the response replace earlier ones.
    pub async fn get_metars(
        &self,
        station_ids: &[String],
        timeout: Duration,
    ) -> Result<HashMap<String, Observation>> {
        if station_ids.is_empty() {
            return Err(FetchError::InvalidRequest(
                "no station identifiers specified".to_string(),
            ));
        }

        let url = self.endpoint()?;
        log::debug!(
            "[Metar] GET {} for {} stations (timeout {:?})",
            url,
            station_ids.len(),
            timeout
        );

        let response = self
            .client
            .get(url)
            .query(&[("ids", station_ids.join(",")), ("format", "json".to_string())])
            .header(ACCEPT, "application/json")
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .timeout(timeout)
            .send()
            .await
            .map_err(FetchError::failed)?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(FetchError::failed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message.trim()
            )));
        }

        let body = response.bytes().await.map_err(FetchError::failed)?;
        if status == StatusCode::NO_CONTENT || body.iter().all(u8::is_ascii_whitespace) {
            return Ok(HashMap::new());
        }

        let observations: Vec<Observation> =
            serde_json::from_slice(&body).map_err(FetchError::failed)?;

        Ok(index_by_station(observations))
    }
}

#[async_trait]
impl WeatherSource for MetarClient {
    async fn fetch(
        &self,
        station_ids: &[String],
        timeout: Duration,
    ) -> Result<HashMap<String, Observation>> {
        self.get_metars(station_ids, timeout).await
    }
}

/// Index observations by station, last write wins.
pub fn index_by_station(
    observations: impl IntoIterator<Item = Observation>,
) -> HashMap<String, Observation> {
    let mut out = HashMap::new();
    for obs in observations {
        out.insert(obs.station_id.clone(), obs);
    }
    out
}
