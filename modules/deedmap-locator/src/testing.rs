// Test mocks for the locator.
//
// MockGeocoder answers Geocoder calls from a query→places map and records
// every call, so tests can assert on both results and traffic.
// Unregistered queries return no places, the way a geocoder does for
// an unknown street.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;

use nominatim_client::{Place, SearchRequest};

use crate::traits::Geocoder;

// ---------------------------------------------------------------------------
// Test constants
// ---------------------------------------------------------------------------

/// Newark, NJ: a same-named street far outside Massachusetts.
pub const NEWARK: (f64, f64) = (40.7357, -74.1724);

/// A place as the geocoder would return it.
pub fn place(lat: f64, lon: f64, display_name: &str) -> Place {
    Place {
        lat,
        lon,
        display_name: display_name.to_string(),
    }
}

// ---------------------------------------------------------------------------
// MockGeocoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum GeocoderCall {
    Search { query: String, limit: u32 },
    Reverse { lat: f64, lon: f64 },
}

/// Builder pattern: `.on_search()`, `.fail_on()`, `.panic_on()`, `.on_reverse()`.
pub struct MockGeocoder {
    searches: HashMap<String, Vec<Place>>,
    failures: HashSet<String>,
    panics: HashSet<String>,
    offline: bool,
    reverse_address: Option<String>,
    reverse_fails: bool,
    calls: Mutex<Vec<GeocoderCall>>,
}

impl Default for MockGeocoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self {
            searches: HashMap::new(),
            failures: HashSet::new(),
            panics: HashSet::new(),
            offline: false,
            reverse_address: None,
            reverse_fails: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every search and reverse call fails, like an unreachable service.
    pub fn offline() -> Self {
        Self {
            offline: true,
            reverse_fails: true,
            ..Self::new()
        }
    }

    pub fn on_search(mut self, query: &str, places: Vec<Place>) -> Self {
        self.searches.insert(query.to_string(), places);
        self
    }

    pub fn fail_on(mut self, query: &str) -> Self {
        self.failures.insert(query.to_string());
        self
    }

    pub fn panic_on(mut self, query: &str) -> Self {
        self.panics.insert(query.to_string());
        self
    }

    pub fn on_reverse(mut self, address: &str) -> Self {
        self.reverse_address = Some(address.to_string());
        self
    }

    pub fn reverse_fails(mut self) -> Self {
        self.reverse_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<GeocoderCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Queries searched, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                GeocoderCall::Search { query, .. } => Some(query),
                GeocoderCall::Reverse { .. } => None,
            })
            .collect()
    }

    pub fn search_count(&self) -> usize {
        self.queries().len()
    }

    pub fn reverse_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, GeocoderCall::Reverse { .. }))
            .count()
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Place>> {
        self.calls.lock().unwrap().push(GeocoderCall::Search {
            query: request.query.clone(),
            limit: request.limit,
        });

        if self.panics.contains(&request.query) {
            panic!("MockGeocoder: panic registered for {}", request.query);
        }
        if self.offline || self.failures.contains(&request.query) {
            bail!("MockGeocoder: search failed for {}", request.query);
        }

        let mut places = self.searches.get(&request.query).cloned().unwrap_or_default();
        places.truncate(request.limit as usize);
        Ok(places)
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        self.calls
            .lock()
            .unwrap()
            .push(GeocoderCall::Reverse { lat, lon });

        if self.reverse_fails {
            bail!("MockGeocoder: reverse failed for {lat},{lon}");
        }
        Ok(self.reverse_address.clone())
    }
}
