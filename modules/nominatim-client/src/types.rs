use serde::{Deserialize, Serialize};
use serde_json::Value;

// --- Requests ---

/// A forward geocoding request against `/search`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: u32,
    /// Comma-separated ISO 3166-1 alpha-2 codes, e.g. `"us"`.
    pub country_codes: Option<String>,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, limit: u32) -> Self {
        Self {
            query: query.into(),
            limit,
            country_codes: None,
        }
    }

    pub fn country_codes(mut self, codes: impl Into<String>) -> Self {
        self.country_codes = Some(codes.into());
        self
    }
}

// --- Responses ---

/// One `/search` hit as Nominatim serializes it. Coordinates usually arrive as
/// strings; some instances send plain numbers.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct RawPlace {
    #[serde(default)]
    pub lat: Option<Value>,
    #[serde(default)]
    pub lon: Option<Value>,
    #[serde(default)]
    pub display_name: String,
}

/// `/reverse` response body. On lookup failure Nominatim answers 200 with
/// `{"error": "Unable to geocode"}` instead of a place.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RawReverse {
    pub display_name: Option<String>,
    pub error: Option<String>,
}

/// A parsed geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub lat: f64,
    pub lon: f64,
    pub display_name: String,
}

impl RawPlace {
    pub(crate) fn parse(self) -> Option<Place> {
        let lat = coordinate(self.lat.as_ref())?;
        let lon = coordinate(self.lon.as_ref())?;
        Some(Place {
            lat,
            lon,
            display_name: self.display_name,
        })
    }
}

fn coordinate(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}
