//! Configuration types deserialized from `featc.toml`.

use featc_common::ByteSize;
use serde::Deserialize;

/// The top-level project configuration parsed from `featc.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Core project metadata.
    pub project: ProjectMeta,
    /// Source and output locations.
    #[serde(default)]
    pub build: BuildConfig,
    /// Transformation settings.
    pub compiler: CompilerConfig,
    /// Cache placement and budget.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Log level.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Core project metadata required in every `featc.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// The project name.
    pub name: String,
    /// The project version string.
    #[serde(default)]
    pub version: String,
}

/// Where feature files are read from and generated code is written to.
#[derive(Debug, Deserialize)]
pub struct BuildConfig {
    /// Directory scanned recursively for `.feature` files.
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    /// Directory generated code is written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    /// Optional rules file passed to the transformer and fingerprinted.
    #[serde(default)]
    pub rules: Option<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            output_dir: default_output_dir(),
            rules: None,
        }
    }
}

fn default_source_dir() -> String {
    "features".to_string()
}

fn default_output_dir() -> String {
    "generated".to_string()
}

/// Settings for the external transformation step.
#[derive(Debug, Deserialize)]
pub struct CompilerConfig {
    /// Target identifier (e.g. "python", "typescript").
    pub target: String,
    /// Tool version mixed into every fingerprint.
    #[serde(default = "default_tool_version")]
    pub tool_version: String,
    /// Model or engine identifier recorded in cache metadata.
    #[serde(default = "default_model")]
    pub model: String,
    /// Transformer program followed by its arguments.
    #[serde(default)]
    pub command: Vec<String>,
    /// Extension for generated files. Defaults to the target name.
    #[serde(default)]
    pub extension: Option<String>,
}

impl CompilerConfig {
    /// Returns the file extension for generated output.
    pub fn output_extension(&self) -> &str {
        self.extension.as_deref().unwrap_or(&self.target)
    }
}

fn default_tool_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_model() -> String {
    "default".to_string()
}

/// Cache placement and size budget.
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    /// Whether the build consults the cache at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cache root, relative to the project directory.
    #[serde(default = "default_cache_dir")]
    pub dir: String,
    /// Maximum cache size as a size string (e.g. "100MB").
    #[serde(default = "default_max_size")]
    pub max_size: String,
}

impl CacheConfig {
    /// Parses `max_size` into a [`ByteSize`].
    ///
    /// Always succeeds on a validated configuration.
    pub fn max_size_bytes(&self) -> Result<ByteSize, featc_common::ParseByteSizeError> {
        self.max_size.parse()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: default_cache_dir(),
            max_size: default_max_size(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> String {
    ".featc-cache".to_string()
}

fn default_max_size() -> String {
    "100MB".to_string()
}

/// Logging settings.
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// A level (`error`, `warn`, `info`, `debug`, `trace`) or a full filter
    /// directive string such as `featc_cache=debug,info`.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
