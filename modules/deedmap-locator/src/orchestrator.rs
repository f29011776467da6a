//! Per-deed driver and batch runner.
//!
//! A deed never fails the batch: errors and panics while processing one deed
//! are recorded on that deed as `step4_completed = false` plus `step4_error`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::Path;

use anyhow::Context;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use serde_json::{json, Map, Value};
use tracing::{info, info_span, warn, Instrument};

use deedmap_common::{DeedRecord, LocationHint, PipelineConfig};

use crate::cache::DeedCache;
use crate::stats::{BatchStats, DeedOutcome};
use crate::validator::{DeedStage, StreetClusteringValidator};

pub struct DeedOrchestrator {
    validator: StreetClusteringValidator,
    cache: Option<DeedCache>,
    state: String,
    deed_concurrency: usize,
}

impl DeedOrchestrator {
    pub fn new(
        validator: StreetClusteringValidator,
        cache: Option<DeedCache>,
        pipeline: &PipelineConfig,
    ) -> Self {
        Self {
            validator,
            cache,
            state: pipeline.state.clone(),
            deed_concurrency: pipeline.deed_concurrency.max(1),
        }
    }

    /// Attach `geolocation` and `step4_completed` to one deed.
    pub async fn process_deed(&self, deed: DeedRecord) -> DeedRecord {
        self.process_deed_with_outcome(deed).await.0
    }

    pub async fn process_deed_with_outcome(&self, deed: DeedRecord) -> (DeedRecord, DeedOutcome) {
        let span = info_span!("deed", deed_id = %deed.deed_id);
        let fallback = deed.clone();

        let result = AssertUnwindSafe(self.locate(deed))
            .catch_unwind()
            .instrument(span.clone())
            .await;

        match result {
            Ok(done) => done,
            Err(panic) => {
                let message = format!("panic while geolocating: {}", panic_message(&*panic));
                span.in_scope(|| warn!(error = %message, "Deed failed"));
                mark_failed(fallback, message)
            }
        }
    }

    async fn locate(&self, mut deed: DeedRecord) -> (DeedRecord, DeedOutcome) {
        info!(stage = %DeedStage::Pending, "Processing deed");

        if let Some(cached) = self.cached(&deed.deed_id) {
            info!(stage = %DeedStage::Done, "Loaded from cache");
            let confidence = cached.geolocation.as_ref().map(|g| g.confidence);
            return (cached, DeedOutcome::Cached { confidence });
        }

        let streets = deed.normalized_streets();
        if streets.is_empty() {
            warn!("No streets found");
            deed.geolocation = None;
            deed.step4_completed = Some(true);
            deed.step4_error = None;
            info!(stage = %DeedStage::Done, "No streets to geolocate");
            return (deed, DeedOutcome::NoStreets);
        }

        let town = deed.town_hint();
        if town.is_none() {
            warn!(county = %deed.county, "No town information found, using county");
        }
        let hint = LocationHint::new(town, deed.county.clone(), self.state.clone());

        let result = self.validator.validate_and_cluster(&streets, &hint).await;
        let outcome = if result.validated_streets.is_empty() {
            DeedOutcome::Unresolved
        } else {
            DeedOutcome::Geolocated {
                confidence: result.confidence,
            }
        };
        let cacheable = result.geocoding_stats.total_candidates > 0;

        deed.geolocation = Some(result);
        deed.step4_completed = Some(true);
        deed.step4_error = None;

        // Zero candidates looks the same as a geocoder outage; never cache it.
        if cacheable {
            if let Some(cache) = self.cache_for(&deed.deed_id) {
                cache.save(&deed.deed_id, &deed);
            }
        }

        info!(stage = %DeedStage::Done, outcome = ?outcome, "Deed processed");
        (deed, outcome)
    }

    fn cache_for(&self, deed_id: &str) -> Option<&DeedCache> {
        if deed_id.is_empty() {
            return None;
        }
        self.cache.as_ref()
    }

    fn cached(&self, deed_id: &str) -> Option<DeedRecord> {
        self.cache_for(deed_id)?.load(deed_id)
    }

    /// One entry of the batch object. Only `geolocation`, `step4_completed`
    /// and `step4_error` are written back; every other key keeps its value
    /// and position. Records that do not deserialize are returned as given,
    /// marked failed.
    pub async fn process_value(&self, key: &str, value: Value) -> (Value, DeedOutcome) {
        let Value::Object(fields) = value else {
            let error = "deed record is not a JSON object".to_string();
            warn!(deed_id = key, error = %error, "Deed failed");
            let marked = json!({
                "deed_id": key,
                "step4_completed": false,
                "step4_error": error.clone(),
            });
            return (marked, DeedOutcome::Failed { error });
        };

        let mut deed: DeedRecord = match serde_json::from_value(Value::Object(fields.clone())) {
            Ok(deed) => deed,
            Err(e) => {
                let error = format!("invalid deed record: {e}");
                warn!(deed_id = key, error = %error, "Deed failed");
                let mut fields = fields;
                fields.insert("step4_completed".to_string(), Value::Bool(false));
                fields.insert("step4_error".to_string(), Value::String(error.clone()));
                return (Value::Object(fields), DeedOutcome::Failed { error });
            }
        };
        if deed.deed_id.is_empty() {
            deed.deed_id = key.to_string();
        }

        let (deed, outcome) = self.process_deed_with_outcome(deed).await;
        let mut fields = fields;
        match merge_step_fields(&mut fields, &deed) {
            Ok(()) => (Value::Object(fields), outcome),
            Err(e) => {
                let error = format!("failed to serialize geolocation: {e}");
                warn!(deed_id = key, error = %error, "Deed failed");
                fields.insert("step4_completed".to_string(), Value::Bool(false));
                fields.insert("step4_error".to_string(), Value::String(error.clone()));
                (Value::Object(fields), DeedOutcome::Failed { error })
            }
        }
    }

    /// Typed list form. Output order is input order.
    pub async fn process_deeds(&self, deeds: Vec<DeedRecord>) -> (Vec<DeedRecord>, BatchStats) {
        let total = deeds.len();
        let results: Vec<(DeedRecord, DeedOutcome)> = stream::iter(deeds.into_iter().enumerate())
            .map(|(idx, deed)| {
                info!(deed_id = %deed.deed_id, "Processing deed {}/{}", idx + 1, total);
                self.process_deed_with_outcome(deed)
            })
            .buffered(self.deed_concurrency)
            .collect()
            .await;

        let mut stats = BatchStats::default();
        let deeds = results
            .into_iter()
            .map(|(deed, outcome)| {
                stats.record(&outcome);
                deed
            })
            .collect();
        (deeds, stats)
    }

    /// The `{deed_id: record}` object form. Key order is preserved.
    pub async fn process_batch(&self, deeds: Map<String, Value>) -> (Map<String, Value>, BatchStats) {
        let total = deeds.len();
        let results: Vec<(String, Value, DeedOutcome)> = stream::iter(deeds.into_iter().enumerate())
            .map(|(idx, (key, value))| async move {
                info!(deed_id = %key, "Processing deed {}/{}", idx + 1, total);
                let (value, outcome) = self.process_value(&key, value).await;
                (key, value, outcome)
            })
            .buffered(self.deed_concurrency)
            .collect()
            .await;

        let mut stats = BatchStats::default();
        let mut out = Map::new();
        for (key, value, outcome) in results {
            stats.record(&outcome);
            out.insert(key, value);
        }
        (out, stats)
    }

    /// Read a deed object from `input`, geolocate every deed, write the
    /// result to `output`.
    pub async fn run_file(&self, input: &Path, output: &Path) -> anyhow::Result<BatchStats> {
        info!(input = %input.display(), output = %output.display(), "Starting geolocation");

        let content = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read deeds from {}", input.display()))?;
        let deeds: Map<String, Value> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse deeds in {}", input.display()))?;
        info!(deeds = deeds.len(), "Loaded deed records");

        let (processed, stats) = self.process_batch(deeds).await;

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let body = serde_json::to_string_pretty(&Value::Object(processed))?;
        std::fs::write(output, body)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        info!(
            deeds = stats.deeds_total,
            geolocated = stats.geolocated,
            failed = stats.failed,
            output = %output.display(),
            "Geolocation complete"
        );
        Ok(stats)
    }
}

/// A failed deed keeps whatever `geolocation` it came in with.
fn merge_step_fields(fields: &mut Map<String, Value>, deed: &DeedRecord) -> serde_json::Result<()> {
    if deed.step4_completed != Some(false) {
        fields.insert("geolocation".to_string(), serde_json::to_value(&deed.geolocation)?);
    }
    if let Some(done) = deed.step4_completed {
        fields.insert("step4_completed".to_string(), Value::Bool(done));
    }
    match &deed.step4_error {
        Some(error) => {
            fields.insert("step4_error".to_string(), Value::String(error.clone()));
        }
        None => {
            fields.shift_remove("step4_error");
        }
    }
    Ok(())
}

fn mark_failed(mut deed: DeedRecord, error: String) -> (DeedRecord, DeedOutcome) {
    deed.step4_completed = Some(false);
    deed.step4_error = Some(error.clone());
    (deed, DeedOutcome::Failed { error })
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
