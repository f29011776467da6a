pub mod error;
pub mod types;

pub use error::{NominatimError, Result};
pub use types::{Place, SearchRequest};

use std::time::Duration;

use types::{RawPlace, RawReverse};

pub const DEFAULT_BASE_URL: &str = "https://nominatim.openstreetmap.org";

/// Nominatim's usage policy requires an identifying agent on every request.
pub const DEFAULT_USER_AGENT: &str = "DeedGeocoder/1.0";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Street-level detail for `/reverse`.
pub const DEFAULT_REVERSE_ZOOM: u8 = 18;

pub struct NominatimClient {
    client: reqwest::Client,
    base_url: String,
    reverse_zoom: u8,
}

impl NominatimClient {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            reverse_zoom: DEFAULT_REVERSE_ZOOM,
        })
    }

    /// Point the client at a different Nominatim instance (self-hosted or a test server).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn with_reverse_zoom(mut self, zoom: u8) -> Self {
        self.reverse_zoom = zoom;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Forward geocode a free-text query. Malformed entries and entries with
    /// unparsable coordinates are dropped; the rest of the response is kept.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<Place>> {
        let url = format!("{}/search", self.base_url);
        let mut params: Vec<(&str, String)> = vec![
            ("q", request.query.clone()),
            ("format", "json".to_string()),
            ("limit", request.limit.to_string()),
        ];
        if let Some(ref codes) = request.country_codes {
            params.push(("countrycodes", codes.clone()));
        }

        let resp = self.client.get(&url).query(&params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NominatimError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let raw: Vec<serde_json::Value> = serde_json::from_str(&body)?;
        let total = raw.len();

        let places: Vec<Place> = raw
            .into_iter()
            .filter_map(|entry| match serde_json::from_value::<RawPlace>(entry) {
                Ok(r) => {
                    let shown = r.display_name.clone();
                    let parsed = r.parse();
                    if parsed.is_none() {
                        tracing::debug!(display_name = %shown, "Skipping result with unparsable coordinates");
                    }
                    parsed
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed result");
                    None
                }
            })
            .collect();

        tracing::debug!(query = %request.query, total, kept = places.len(), "Nominatim search");
        Ok(places)
    }

    /// Reverse geocode a coordinate to a display address. `Ok(None)` when
    /// Nominatim has nothing at that point.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let params = [
            ("format", "json".to_string()),
            ("lat", lat.to_string()),
            ("lon", lon.to_string()),
            ("zoom", self.reverse_zoom.to_string()),
        ];

        let resp = self.client.get(&url).query(&params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(NominatimError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = resp.text().await?;
        let raw: RawReverse = serde_json::from_str(&body)?;
        if let Some(err) = raw.error {
            tracing::debug!(lat, lon, error = %err, "Nominatim reverse returned no place");
            return Ok(None);
        }
        Ok(raw.display_name.filter(|d| !d.trim().is_empty()))
    }
}
