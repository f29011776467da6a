use serde::{Deserialize, Serialize};

/// Miles per degree of latitude.
pub const MILES_PER_DEGREE_LAT: f64 = 69.0;

/// Miles per degree of longitude around 42°N (eastern Massachusetts).
pub const MILES_PER_DEGREE_LON: f64 = 55.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn distance_miles(&self, other: &GeoPoint) -> f64 {
        approx_distance_miles(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Equirectangular distance in miles with fixed per-degree scale factors.
///
/// Not great-circle distance: only meaningful at Massachusetts latitudes and
/// over town-sized spans, which is all the clustering needs.
pub fn approx_distance_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat_diff = (lat2 - lat1).abs() * MILES_PER_DEGREE_LAT;
    let lon_diff = (lon2 - lon1).abs() * MILES_PER_DEGREE_LON;
    (lat_diff * lat_diff + lon_diff * lon_diff).sqrt()
}

/// Unweighted mean of the given points. `(0.0, 0.0)` for an empty input.
pub fn centroid<I>(points: I) -> GeoPoint
where
    I: IntoIterator<Item = GeoPoint>,
{
    let (mut lat_sum, mut lon_sum, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat_sum += p.lat;
        lon_sum += p.lon;
        n += 1;
    }
    if n == 0 {
        return GeoPoint::new(0.0, 0.0);
    }
    GeoPoint::new(lat_sum / n as f64, lon_sum / n as f64)
}

/// Finite and within WGS84 bounds.
pub fn is_valid_coordinate(lat: f64, lon: f64) -> bool {
    lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
}
