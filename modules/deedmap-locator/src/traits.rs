// Geocoder: the one network boundary of the locator.
//
// Tests drive the engine with MockGeocoder; production wraps NominatimClient,
// optionally behind the Throttled decorator from rate_limit.rs.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use nominatim_client::{NominatimClient, Place, SearchRequest};

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Forward geocode one query; at most `request.limit` places.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Place>>;

    /// Reverse geocode a point to a display address; `None` when nothing is there.
    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>>;
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Place>> {
        Ok(NominatimClient::search(self, request).await?)
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        Ok(NominatimClient::reverse(self, lat, lon).await?)
    }
}

#[async_trait]
impl<G: Geocoder + ?Sized> Geocoder for Arc<G> {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<Place>> {
        (**self).search(request).await
    }

    async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        (**self).reverse(lat, lon).await
    }
}
