//! Configuration file loading for conflict-resolver
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `RESOLVER_*` environment variables (`RESOLVER_COORDINATION__MAX_CONCURRENCY=8`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./resolver.toml` or `./.resolver.toml`
//! 4. Global: `$XDG_CONFIG_HOME/conflict-resolver/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileComplianceConfig, FileConfig, FileCoordinationConfig, FileGenerationConfig,
    FileLoggingConfig, FileOutputConfig, FileOutputFormat, FileValidationConfig,
};
pub use loader::ConfigLoader;
