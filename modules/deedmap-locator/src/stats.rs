/// How one deed left the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum DeedOutcome {
    /// Served from the cache; confidence of the cached geolocation, if any.
    Cached { confidence: Option<f64> },
    /// No usable streets; `geolocation` is null.
    NoStreets,
    /// At least one street validated.
    Geolocated { confidence: f64 },
    /// Streets present but none validated.
    Unresolved,
    Failed { error: String },
}

/// Stats from a batch run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchStats {
    pub deeds_total: u32,
    pub cache_hits: u32,
    pub no_streets: u32,
    pub geolocated: u32,
    pub unresolved: u32,
    pub failed: u32,
    confidence_sum: f64,
    confidence_count: u32,
}

impl BatchStats {
    pub fn record(&mut self, outcome: &DeedOutcome) {
        self.deeds_total += 1;
        match outcome {
            DeedOutcome::Cached { confidence } => {
                self.cache_hits += 1;
                if let Some(c) = confidence {
                    self.add_confidence(*c);
                }
            }
            DeedOutcome::NoStreets => self.no_streets += 1,
            DeedOutcome::Geolocated { confidence } => {
                self.geolocated += 1;
                self.add_confidence(*confidence);
            }
            DeedOutcome::Unresolved => self.unresolved += 1,
            DeedOutcome::Failed { .. } => self.failed += 1,
        }
    }

    fn add_confidence(&mut self, confidence: f64) {
        self.confidence_sum += confidence;
        self.confidence_count += 1;
    }

    /// Mean over geolocated and cached deeds; `None` when there are none.
    pub fn mean_confidence(&self) -> Option<f64> {
        (self.confidence_count > 0).then(|| self.confidence_sum / self.confidence_count as f64)
    }
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Geolocation Run Complete ===")?;
        writeln!(f, "Deeds:           {}", self.deeds_total)?;
        writeln!(f, "Cache hits:      {}", self.cache_hits)?;
        writeln!(f, "No streets:      {}", self.no_streets)?;
        writeln!(f, "Geolocated:      {}", self.geolocated)?;
        writeln!(f, "Unresolved:      {}", self.unresolved)?;
        writeln!(f, "Failed:          {}", self.failed)?;
        match self.mean_confidence() {
            Some(mean) => writeln!(f, "Mean confidence: {mean:.2}")?,
            None => writeln!(f, "Mean confidence: n/a")?,
        }
        Ok(())
    }
}
