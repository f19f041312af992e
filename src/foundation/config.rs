use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::foundation::error::{FlitterError, FlitterResult};

/// Squared distance (in local pixels) under which a repeated bitmap hit-test reuses the previous
/// result. Down/up pairs usually land within two pixels of each other.
pub const HIT_PROXIMITY_SQ: f64 = 4.0;

/// Default arc-length error tolerance (in path units) for guide-path subdivision.
pub const GUIDE_TOLERANCE: f64 = 4.0;

/// Default cap on leaves produced when subdividing one guide-path segment.
pub const GUIDE_MAX_SUBDIVISIONS: u32 = 16;

/// Runtime tuning knobs.
///
/// Every field has a default, so partial JSON documents are accepted.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Ticker frame rate used by [`crate::Stage`].
    pub fps: f64,
    /// Squared-distance threshold for the bitmap hit cache.
    pub hit_proximity_sq: f64,
    /// Arc-length tolerance for guide-path subdivision.
    pub guide_tolerance: f64,
    /// Maximum leaves per guide-path segment.
    pub guide_max_subdivisions: u32,
    /// Release node-owned renderer caches when a node is detached.
    pub release_on_detach: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            fps: 24.0,
            hit_proximity_sq: HIT_PROXIMITY_SQ,
            guide_tolerance: GUIDE_TOLERANCE,
            guide_max_subdivisions: GUIDE_MAX_SUBDIVISIONS,
            release_on_detach: true,
        }
    }
}

impl RuntimeConfig {
    /// Parse a config from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FlitterResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| FlitterError::serde(format!("parse runtime config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FlitterResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FlitterError::validation(format!("open runtime config '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Apply `FLITTER_*` environment overrides.
    ///
    /// Unparseable values are ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        fn read(name: &str) -> Option<f64> {
            let raw = std::env::var(name).ok()?;
            match raw.trim().parse::<f64>() {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(var = name, value = %raw, "ignoring unparseable override");
                    None
                }
            }
        }

        if let Some(v) = read("FLITTER_FPS") {
            self.fps = v;
        }
        if let Some(v) = read("FLITTER_HIT_PROXIMITY_SQ") {
            self.hit_proximity_sq = v;
        }
        if let Some(v) = read("FLITTER_GUIDE_TOLERANCE") {
            self.guide_tolerance = v;
        }
        self
    }

    /// Validate value ranges.
    pub fn validate(&self) -> FlitterResult<()> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            return Err(FlitterError::validation("fps must be > 0"));
        }
        if !(self.hit_proximity_sq.is_finite() && self.hit_proximity_sq >= 0.0) {
            return Err(FlitterError::validation("hit_proximity_sq must be >= 0"));
        }
        if !(self.guide_tolerance.is_finite() && self.guide_tolerance > 0.0) {
            return Err(FlitterError::validation("guide_tolerance must be > 0"));
        }
        if self.guide_max_subdivisions == 0 {
            return Err(FlitterError::validation(
                "guide_max_subdivisions must be > 0",
            ));
        }
        Ok(())
    }

    /// Duration of one ticker interval in milliseconds.
    pub fn frame_interval_ms(&self) -> f64 {
        1000.0 / self.fps
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
