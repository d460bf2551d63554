//! Strategy generation configuration from TOML (`[generation]` section)

use resolver_application::GenerationParams;
use serde::{Deserialize, Serialize};

/// Default time budget for one external backend call.
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 60;

/// Raw generation configuration from TOML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileGenerationConfig {
    /// Highest complexity for which FAST_TRACK is offered
    pub fast_track_max_complexity: f64,
    /// Cap on the ranked output
    pub max_strategies: usize,
    /// Add a HYBRID strategy when at least two archetypes succeed
    pub enable_hybrid: bool,
    /// Shell command drafting strategy text (prompt on stdin, JSON on stdout)
    pub backend_command: Option<String>,
    pub backend_timeout_secs: u64,
}

impl Default for FileGenerationConfig {
    fn default() -> Self {
        let params = GenerationParams::default();
        Self {
            fast_track_max_complexity: params.fast_track_max_complexity,
            max_strategies: params.max_strategies,
            enable_hybrid: params.enable_hybrid,
            backend_command: None,
            backend_timeout_secs: DEFAULT_BACKEND_TIMEOUT_SECS,
        }
    }
}

impl FileGenerationConfig {
    pub fn to_params(&self) -> GenerationParams {
        GenerationParams {
            fast_track_max_complexity: self.fast_track_max_complexity.clamp(0.0, 10.0),
            max_strategies: self.max_strategies.max(1),
            enable_hybrid: self.enable_hybrid,
        }
    }
}
