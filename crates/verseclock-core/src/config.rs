use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_DIR_NAME: &str = "verseclock";
const CONFIG_FILE_NAME: &str = "config.toml";
const CONFIG_PATH_ENV: &str = "VERSECLOCK_CONFIG";
const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_OUTPUT_DIRECTORY: &str = "data";
pub const DEFAULT_FILE_PREFIX: &str = "bible_verses_hour";

/// Result returned by [`load_config`], capturing the source and any non-fatal issues.
#[derive(Debug, Clone)]
pub struct ConfigLoadResult {
    pub config: FileConfig,
    pub warnings: Vec<String>,
    pub source: ConfigSource,
}

/// Indicates where the configuration was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// No persisted configuration was found or usable; defaults were synthesized.
    Default,
    /// Configuration was read from `config.toml`.
    File,
}

/// Errors that can occur when persisting configuration.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Ser(toml::ser::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {err}"),
            ConfigError::Ser(err) => write!(f, "TOML serialization error: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(value: toml::ser::Error) -> Self {
        Self::Ser(value)
    }
}

/// Disk-backed configuration schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default = "FileConfig::schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub service: ServiceSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            service: ServiceSettings::default(),
            output: OutputSettings::default(),
        }
    }
}

impl FileConfig {
    const fn schema_version() -> u32 {
        CURRENT_SCHEMA_VERSION
    }
}

/// Text-generation service connection and sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSettings {
    #[serde(default = "ServiceSettings::default_endpoint")]
    pub endpoint: String,
    #[serde(default = "ServiceSettings::default_model")]
    pub model: String,
    /// Name of the environment variable holding the API key.
    #[serde(default = "ServiceSettings::default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "ServiceSettings::default_generation_temperature")]
    pub generation_temperature: f32,
    #[serde(default = "ServiceSettings::default_generation_top_p")]
    pub generation_top_p: f32,
    #[serde(default)]
    pub selection_temperature: f32,
    #[serde(default = "ServiceSettings::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: Self::default_endpoint(),
            model: Self::default_model(),
            api_key_env: Self::default_api_key_env(),
            generation_temperature: Self::default_generation_temperature(),
            generation_top_p: Self::default_generation_top_p(),
            selection_temperature: 0.0,
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

impl ServiceSettings {
    fn default_endpoint() -> String {
        DEFAULT_ENDPOINT.to_string()
    }

    fn default_model() -> String {
        DEFAULT_MODEL.to_string()
    }

    fn default_api_key_env() -> String {
        DEFAULT_API_KEY_ENV.to_string()
    }

    const fn default_generation_temperature() -> f32 {
        0.9
    }

    const fn default_generation_top_p() -> f32 {
        1.0
    }

    const fn default_request_timeout_secs() -> u64 {
        60
    }

    /// Read the API key from the configured environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        env::var(&self.api_key_env)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Where the hourly schedule files are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "OutputSettings::default_directory")]
    pub directory: String,
    #[serde(default = "OutputSettings::default_file_prefix")]
    pub file_prefix: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
            file_prefix: Self::default_file_prefix(),
        }
    }
}

impl OutputSettings {
    fn default_directory() -> String {
        DEFAULT_OUTPUT_DIRECTORY.to_string()
    }

    fn default_file_prefix() -> String {
        DEFAULT_FILE_PREFIX.to_string()
    }

    /// Output directory with `~` and environment variables expanded.
    pub fn resolved_directory(&self) -> PathBuf {
        match shellexpand::full(&self.directory) {
            Ok(expanded) => PathBuf::from(expanded.as_ref()),
            Err(_) => PathBuf::from(shellexpand::tilde(&self.directory).as_ref()),
        }
    }
}

/// Per-run overrides coming from CLI flags. Never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuntimeOverrides {
    pub output_directory: Option<String>,
    pub file_prefix: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
}

impl RuntimeOverrides {
    pub fn is_empty(&self) -> bool {
        self.output_directory.is_none()
            && self.file_prefix.is_none()
            && self.model.is_none()
            && self.endpoint.is_none()
    }
}

/// Path to the configuration directory.
pub fn config_directory() -> PathBuf {
    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Path to `config.toml`, honouring `VERSECLOCK_CONFIG`.
pub fn config_path() -> PathBuf {
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_directory().join(CONFIG_FILE_NAME),
    }
}

/// Load the configuration from the default location.
pub fn load_config() -> ConfigLoadResult {
    load_config_from(&config_path())
}

/// Load the configuration from `path`, falling back to defaults on any problem.
pub fn load_config_from(path: &Path) -> ConfigLoadResult {
    let mut warnings = Vec::new();

    if path.exists() {
        match fs::read_to_string(path) {
            Ok(raw) => match toml::from_str::<FileConfig>(&raw) {
                Ok(cfg) => {
                    let (cfg, mut sanitize_warnings) = sanitize_config(cfg);
                    warnings.append(&mut sanitize_warnings);
                    return ConfigLoadResult {
                        config: cfg,
                        warnings,
                        source: ConfigSource::File,
                    };
                }
                Err(err) => {
                    warnings.push(format!(
                        "Failed to parse {} as TOML: {}. Falling back to defaults.",
                        path.display(),
                        err
                    ));
                }
            },
            Err(err) => {
                warnings.push(format!(
                    "Failed to read {}: {}. Falling back to defaults.",
                    path.display(),
                    err
                ));
            }
        }
    }

    ConfigLoadResult {
        config: FileConfig::default(),
        warnings,
        source: ConfigSource::Default,
    }
}

/// Persist the configuration to the default location.
pub fn save_config(config: &FileConfig) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(config, &path)?;
    Ok(path)
}

pub fn save_config_to(config: &FileConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let serialized = toml::to_string_pretty(config)?;
    fs::write(path, serialized)?;
    Ok(())
}

fn sanitize_config(mut config: FileConfig) -> (FileConfig, Vec<String>) {
    let mut warnings = Vec::new();

    if config.schema_version != CURRENT_SCHEMA_VERSION {
        warnings.push(format!(
            "Unknown config schema version {}. Resetting to {}.",
            config.schema_version, CURRENT_SCHEMA_VERSION
        ));
        return (FileConfig::default(), warnings);
    }

    let defaults = ServiceSettings::default();
    let service = &mut config.service;

    if service.endpoint.trim().is_empty() {
        warnings.push(format!(
            "Service endpoint is empty. Using {}.",
            defaults.endpoint
        ));
        service.endpoint = defaults.endpoint.clone();
    }
    if service.model.trim().is_empty() {
        warnings.push(format!("Service model is empty. Using {}.", defaults.model));
        service.model = defaults.model.clone();
    }
    if service.api_key_env.trim().is_empty() {
        warnings.push(format!(
            "API key variable name is empty. Using {}.",
            defaults.api_key_env
        ));
        service.api_key_env = defaults.api_key_env.clone();
    }
    if !valid_temperature(service.generation_temperature) {
        warnings.push(format!(
            "Generation temperature {} is outside 0..=2. Using {}.",
            service.generation_temperature, defaults.generation_temperature
        ));
        service.generation_temperature = defaults.generation_temperature;
    }
    if !valid_temperature(service.selection_temperature) {
        warnings.push(format!(
            "Selection temperature {} is outside 0..=2. Using {}.",
            service.selection_temperature, defaults.selection_temperature
        ));
        service.selection_temperature = defaults.selection_temperature;
    }
    if !(service.generation_top_p.is_finite()
        && service.generation_top_p > 0.0
        && service.generation_top_p <= 1.0)
    {
        warnings.push(format!(
            "Generation top_p {} is outside (0, 1]. Using {}.",
            service.generation_top_p, defaults.generation_top_p
        ));
        service.generation_top_p = defaults.generation_top_p;
    }
    if service.request_timeout_secs == 0 {
        warnings.push(format!(
            "Request timeout must be positive. Using {}s.",
            defaults.request_timeout_secs
        ));
        service.request_timeout_secs = defaults.request_timeout_secs;
    }

    let output = &mut config.output;
    if output.directory.trim().is_empty() {
        warnings.push(format!(
            "Output directory is empty. Using '{}'.",
            DEFAULT_OUTPUT_DIRECTORY
        ));
        output.directory = DEFAULT_OUTPUT_DIRECTORY.to_string();
    }
    if output.file_prefix.trim().is_empty() {
        warnings.push(format!(
            "Output file prefix is empty. Using '{}'.",
            DEFAULT_FILE_PREFIX
        ));
        output.file_prefix = DEFAULT_FILE_PREFIX.to_string();
    }

    (config, warnings)
}

fn valid_temperature(value: f32) -> bool {
    value.is_finite() && (0.0..=2.0).contains(&value)
}

/// Apply CLI overrides on top of the file configuration.
pub fn apply_runtime_overrides(
    config: &mut FileConfig,
    overrides: &RuntimeOverrides,
    warnings: &mut Vec<String>,
) {
    if let Some(directory) = overrides.output_directory.as_ref() {
        if directory.trim().is_empty() {
            warnings.push("Ignoring empty --out-dir override.".to_string());
        } else {
            config.output.directory = directory.clone();
        }
    }
    if let Some(prefix) = overrides.file_prefix.as_ref() {
        if prefix.trim().is_empty() {
            warnings.push("Ignoring empty --file-prefix override.".to_string());
        } else {
            config.output.file_prefix = prefix.clone();
        }
    }
    if let Some(model) = overrides.model.as_ref() {
        if model.trim().is_empty() {
            warnings.push("Ignoring empty --model override.".to_string());
        } else {
            config.service.model = model.trim().to_string();
        }
    }
    if let Some(endpoint) = overrides.endpoint.as_ref() {
        if endpoint.trim().is_empty() {
            warnings.push("Ignoring empty --endpoint override.".to_string());
        } else {
            config.service.endpoint = endpoint.trim().to_string();
        }
    }
}
