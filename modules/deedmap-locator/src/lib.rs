pub mod aggregate;
pub mod cache;
pub mod cluster;
pub mod geocode;
pub mod manual;
pub mod orchestrator;
pub mod rate_limit;
pub mod stats;
pub mod summarize;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod town;
pub mod traits;
pub mod validate;
pub mod validator;

pub use cache::DeedCache;
pub use manual::{GeocodedAddress, ManualAddress, ManualGeocoder};
pub use orchestrator::DeedOrchestrator;
pub use rate_limit::{RateLimiter, Throttled};
pub use stats::{BatchStats, DeedOutcome};
pub use traits::Geocoder;
pub use validator::{DeedStage, StreetClusteringValidator};
