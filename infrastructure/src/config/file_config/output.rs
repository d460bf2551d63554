//! `[output]` section: how command results are rendered.

use resolver_domain::OutputFormat;
use serde::{Deserialize, Serialize};

pub use resolver_domain::OutputFormat as FileOutputFormat;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOutputConfig {
    /// Format used when no `--output` flag is given
    pub format: Option<OutputFormat>,
    /// Colorize text reports
    pub color: bool,
}

impl Default for FileOutputConfig {
    fn default() -> Self {
        Self {
            format: None,
            color: true,
        }
    }
}

impl FileOutputConfig {
    /// The command-line choice wins over the file; text is the fallback.
    pub fn resolve_format(&self, requested: Option<OutputFormat>) -> OutputFormat {
        requested.or(self.format).unwrap_or_default()
    }
}
