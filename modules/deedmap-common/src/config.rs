use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{DeedMapError, Result};

/// TOML-backed configuration. Every section is optional and falls back to
/// the documented defaults; a handful of values can be overridden from the
/// environment (see [`FileConfig::apply_env`]).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub geocoder: GeocoderConfig,
    pub clustering: ClusteringConfig,
    pub cache: CacheConfig,
    pub pipeline: PipelineConfig,
    pub manual: ManualGeocodeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeocoderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub timeout_secs: u64,
    pub reverse_zoom: u8,
    /// Results requested per query variant.
    pub max_results: u32,
    /// Streets geocoded concurrently within one deed.
    pub street_concurrency: usize,
    /// Minimum spacing between requests; 0 disables throttling.
    pub min_interval_ms: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            user_agent: "DeedGeocoder/1.0".to_string(),
            timeout_secs: 10,
            reverse_zoom: 18,
            max_results: 5,
            street_concurrency: 1,
            min_interval_ms: 0,
        }
    }
}

/// Heuristics of the clustering engine. These defaults have no derivation
/// beyond field use; change them only with validation data in hand.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusteringConfig {
    pub radius_miles: f64,
    pub coverage_weight: f64,
    pub tightness_weight: f64,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            radius_miles: 3.0,
            coverage_weight: 0.7,
            tightness_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub enabled: bool,
    pub dir: PathBuf,
    pub expiry_days: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: PathBuf::from("cache"),
            expiry_days: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    pub state: String,
    /// Deeds processed concurrently. Output order is always input order.
    pub deed_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            state: "Massachusetts".to_string(),
            deed_concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManualGeocodeConfig {
    pub min_interval_ms: u64,
    pub country_codes: String,
}

impl Default for ManualGeocodeConfig {
    fn default() -> Self {
        Self {
            min_interval_ms: 1000,
            country_codes: "us".to_string(),
        }
    }
}

impl FileConfig {
    /// Load from an optional TOML path, apply `.env` and environment
    /// overrides, then validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => load_config(p)?,
            None => FileConfig::default(),
        };
        dotenvy::dotenv().ok();
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Environment overrides for deployment-specific values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_env_from(|name| env::var(name).ok())
    }

    /// Overrides read through `lookup`. Values that do not parse are errors,
    /// not silently ignored.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup("NOMINATIM_BASE_URL") {
            self.geocoder.base_url = url;
        }
        if let Some(agent) = lookup("GEOCODER_USER_AGENT") {
            self.geocoder.user_agent = agent;
        }
        if let Some(dir) = lookup("DEEDMAP_CACHE_DIR") {
            self.cache.dir = PathBuf::from(dir);
        }
        if let Some(enabled) = lookup("DEEDMAP_CACHE_ENABLED") {
            self.cache.enabled = parse_flag("DEEDMAP_CACHE_ENABLED", &enabled)?;
        }
        if let Some(days) = lookup("DEEDMAP_CACHE_EXPIRY_DAYS") {
            self.cache.expiry_days = days.trim().parse().map_err(|e| {
                DeedMapError::Config(format!(
                    "DEEDMAP_CACHE_EXPIRY_DAYS must be a whole number of days, got {days:?}: {e}"
                ))
            })?;
        }
        if let Some(state) = lookup("DEEDMAP_STATE") {
            self.pipeline.state = state;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        let c = &self.clustering;
        if !(c.radius_miles.is_finite() && c.radius_miles > 0.0) {
            return Err(DeedMapError::Config(format!(
                "clustering.radius_miles must be positive, got {}",
                c.radius_miles
            )));
        }
        if c.coverage_weight < 0.0 || c.tightness_weight < 0.0 {
            return Err(DeedMapError::Config(
                "clustering weights must be non-negative".to_string(),
            ));
        }
        if self.geocoder.timeout_secs == 0 {
            return Err(DeedMapError::Config(
                "geocoder.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.geocoder.user_agent.trim().is_empty() {
            return Err(DeedMapError::Config(
                "geocoder.user_agent is required by the Nominatim usage policy".to_string(),
            ));
        }
        if self.geocoder.street_concurrency == 0 || self.pipeline.deed_concurrency == 0 {
            return Err(DeedMapError::Config(
                "concurrency settings must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  geocoder: {} (agent {:?}, timeout {}s, max_results {})",
            self.geocoder.base_url,
            self.geocoder.user_agent,
            self.geocoder.timeout_secs,
            self.geocoder.max_results
        );
        tracing::info!(
            "  clustering: radius {} mi, weights {}/{}",
            self.clustering.radius_miles,
            self.clustering.coverage_weight,
            self.clustering.tightness_weight
        );
        if self.cache.enabled {
            tracing::info!(
                "  cache: {} (expiry {} days)",
                self.cache.dir.display(),
                self.cache.expiry_days
            );
        } else {
            tracing::info!("  cache: <disabled>");
        }
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(DeedMapError::Config(format!(
            "{name} must be true, false, 1 or 0, got {value:?}"
        ))),
    }
}

/// Load and parse a TOML config file.
pub fn load_config(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        DeedMapError::Config(format!("Failed to read config file {}: {e}", path.display()))
    })?;
    toml::from_str(&content).map_err(|e| {
        DeedMapError::Config(format!("Failed to parse config file {}: {e}", path.display()))
    })
}
