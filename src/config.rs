use crate::foundation::core::{IntSize, Rgba8Premul};
use crate::foundation::error::{TileStoreError, TileStoreResult};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Environment variable overriding [`TileStoreConfig::tile_count`].
pub const TILE_COUNT_ENV: &str = "TILESTORE_TILE_COUNT";

/// Tuning for the Regular-job pressure heuristic.
///
/// The scheduler is "under pressure" when, within one tick window, more Regular jobs arrived
/// than were drained and at least `min_arrivals` arrived. Under pressure the next pass drains the
/// whole Regular batch instead of at most `regular_batch_size` jobs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PressurePolicy {
    /// Set to `false` to never enter pressure mode.
    pub enabled: bool,
    /// Minimum arrivals in one window before pressure can trigger.
    pub min_arrivals: usize,
    /// Regular jobs painted per pass when not under pressure.
    pub regular_batch_size: usize,
}

impl Default for PressurePolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            min_arrivals: 8,
            regular_batch_size: 16,
        }
    }
}

/// Read-only configuration of the tile store.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct TileStoreConfig {
    /// Number of double-buffered tiles in the pool. `0` disables tiling (direct rendering).
    pub tile_count: usize,
    /// Fixed tile dimensions in pixels.
    pub tile_size: IntSize,
    /// Extra tiles beyond viewport coverage kept as scroll slack.
    pub min_visible_tile_margin: u32,
    /// Byte budget for all pool pixmaps; exceeding it counts as an allocation failure.
    pub max_pool_bytes: usize,
    /// Fill used for never-painted tile pixels.
    pub background: Rgba8Premul,
    /// Regular-job pressure tuning.
    pub pressure: PressurePolicy,
    /// Queued jobs with no render pass for this long trigger one fallback pass.
    pub fallback_timeout_ms: u64,
    /// Length of the scheduling tick used by the pressure heuristic.
    pub tick_interval_ms: u64,
}

impl Default for TileStoreConfig {
    fn default() -> Self {
        Self {
            tile_count: 0,
            tile_size: IntSize::new(512, 512),
            min_visible_tile_margin: 1,
            max_pool_bytes: 512 * 1024 * 1024,
            background: Rgba8Premul::WHITE,
            pressure: PressurePolicy::default(),
            fallback_timeout_ms: 100,
            tick_interval_ms: 16,
        }
    }
}

impl TileStoreConfig {
    /// Parse a config from a JSON reader. Missing fields take their defaults.
    pub fn from_reader<R: std::io::Read>(r: R) -> TileStoreResult<Self> {
        let cfg: Self = serde_json::from_reader(r)
            .map_err(|e| TileStoreError::config(format!("parse config JSON: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a config from a JSON string.
    pub fn from_json_str(s: &str) -> TileStoreResult<Self> {
        Self::from_reader(s.as_bytes())
    }

    /// Parse a config from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> TileStoreResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TileStoreError::config(format!("open config JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Apply `TILESTORE_TILE_COUNT` if it is set to a valid integer.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(n) = std::env::var(TILE_COUNT_ENV)
            .ok()
            .and_then(|v| v.trim().parse::<usize>().ok())
        {
            tracing::debug!(tile_count = n, "tile count overridden from environment");
            self.tile_count = n;
        }
        self
    }

    /// Check invariants that the rest of the crate relies on.
    pub fn validate(&self) -> TileStoreResult<()> {
        if self.tile_size.is_empty() {
            return Err(TileStoreError::config("tile_size must be non-empty"));
        }
        if self.pressure.regular_batch_size == 0 {
            return Err(TileStoreError::config(
                "pressure.regular_batch_size must be > 0",
            ));
        }
        if self.tick_interval_ms == 0 {
            return Err(TileStoreError::config("tick_interval_ms must be > 0"));
        }
        Ok(())
    }

    /// Return `true` when tiling is configured at all.
    pub fn tiling_enabled(&self) -> bool {
        self.tile_count > 0
    }

    /// Fallback timer timeout.
    pub fn fallback_timeout(&self) -> Duration {
        Duration::from_millis(self.fallback_timeout_ms)
    }

    /// Pressure window length.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
