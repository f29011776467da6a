pub mod config;
pub mod error;
pub mod geo;
pub mod types;

pub use config::{
    CacheConfig, ClusteringConfig, FileConfig, GeocoderConfig, ManualGeocodeConfig,
    PipelineConfig,
};
pub use error::{DeedMapError, Result};
pub use geo::*;
pub use types::*;
