// crates/datacore-config/src/config.rs
// ============================================================================
// Module: Companion Configuration
// Description: Configuration loading and validation for the companion core.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: datacore-store-sqlite, serde, toml, url
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing sections take defaults; present values are validated and any
//! violation fails the load. No environment variables are consulted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use datacore_store_sqlite::DEFAULT_BUSY_TIMEOUT_MS;
use datacore_store_sqlite::SqliteCacheConfig;
use datacore_store_sqlite::SqliteStoreMode;
use datacore_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "datacore-companion.toml";
/// Cache database filename inside the group container.
pub const CACHE_FILE_NAME: &str = "datacore-cache.sqlite";
/// Default group container identifier.
pub const DEFAULT_GROUP_CONTAINER_ID: &str = "group.datacore.companion";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum base address length.
pub(crate) const MAX_BASE_ADDRESS_LENGTH: usize = 2048;
/// Minimum transport timeout in milliseconds.
pub(crate) const MIN_TIMEOUT_MS: u64 = 100;
/// Maximum transport timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 120_000;
/// Minimum background refresh interval in seconds.
pub(crate) const MIN_REFRESH_INTERVAL_SECS: u64 = 60;
/// Maximum background refresh interval in seconds.
pub(crate) const MAX_REFRESH_INTERVAL_SECS: u64 = 86_400;
/// Maximum user agent length.
pub(crate) const MAX_USER_AGENT_LENGTH: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Companion configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanionConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Shared container configuration.
    #[serde(default)]
    pub container: ContainerConfig,
    /// Cache database pragmas.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Transport timeouts and identity.
    #[serde(default)]
    pub transport: TransportConfig,
    /// Background refresh configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Event log configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CompanionConfig {
    /// Loads configuration from disk.
    ///
    /// When `path` is `None` the default filename in the working directory
    /// is used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_NAME), Path::to_path_buf);
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        if content.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.container.validate()?;
        self.cache.validate()?;
        self.transport.validate()?;
        self.scheduler.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Returns the `SQLite` cache config for the container database.
    #[must_use]
    pub fn sqlite_cache_config(&self) -> SqliteCacheConfig {
        SqliteCacheConfig {
            path: self.container.cache_path(),
            busy_timeout_ms: self.cache.busy_timeout_ms,
            journal_mode: self.cache.journal_mode,
            sync_mode: self.cache.sync_mode,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base address of the Datacore server; empty or absent means unset.
    #[serde(default)]
    pub base_address: Option<String>,
}

impl ServerConfig {
    /// Returns the configured address, treating blank values as unset.
    #[must_use]
    pub fn address(&self) -> Option<&str> {
        self.base_address.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match self.address() {
            Some(address) => validate_base_address(address),
            None => Ok(()),
        }
    }
}

/// Shared container configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Group container identifier shared with complication renderers.
    #[serde(default = "default_group_container_id")]
    pub group_container_id: String,
    /// Directory that holds group containers.
    #[serde(default = "default_container_root")]
    pub root: PathBuf,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            group_container_id: default_group_container_id(),
            root: default_container_root(),
        }
    }
}

impl ContainerConfig {
    /// Returns the container directory.
    #[must_use]
    pub fn container_dir(&self) -> PathBuf {
        self.root.join(&self.group_container_id)
    }

    /// Returns the cache database path inside the container.
    #[must_use]
    pub fn cache_path(&self) -> PathBuf {
        self.container_dir().join(CACHE_FILE_NAME)
    }

    /// Validates container configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_group_container_id(&self.group_container_id)?;
        validate_path_string("container.root", &self.root.to_string_lossy())?;
        let total = self.cache_path().to_string_lossy().len();
        if total > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("container cache path exceeds max length".to_string()));
        }
        Ok(())
    }
}

/// Cache database pragmas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Busy timeout in milliseconds.
    #[serde(default = "default_cache_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` synchronous mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            busy_timeout_ms: default_cache_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl CacheConfig {
    /// Validates cache configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout("cache.busy_timeout_ms", self.busy_timeout_ms)
    }
}

/// Transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Per-read idle timeout for direct requests in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Whole-request timeout for direct requests in milliseconds.
    #[serde(default = "default_resource_timeout_ms")]
    pub resource_timeout_ms: u64,
    /// Reply timeout for relay messages in milliseconds.
    #[serde(default = "default_relay_reply_timeout_ms")]
    pub relay_reply_timeout_ms: u64,
    /// User agent sent on direct requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            resource_timeout_ms: default_resource_timeout_ms(),
            relay_reply_timeout_ms: default_relay_reply_timeout_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl TransportConfig {
    /// Returns the request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the resource timeout.
    #[must_use]
    pub const fn resource_timeout(&self) -> Duration {
        Duration::from_millis(self.resource_timeout_ms)
    }

    /// Returns the relay reply timeout.
    #[must_use]
    pub const fn relay_reply_timeout(&self) -> Duration {
        Duration::from_millis(self.relay_reply_timeout_ms)
    }

    /// Validates transport configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_timeout("transport.request_timeout_ms", self.request_timeout_ms)?;
        validate_timeout("transport.resource_timeout_ms", self.resource_timeout_ms)?;
        validate_timeout("transport.relay_reply_timeout_ms", self.relay_reply_timeout_ms)?;
        if self.resource_timeout_ms < self.request_timeout_ms {
            return Err(ConfigError::Invalid(
                "transport.resource_timeout_ms must be >= request_timeout_ms".to_string(),
            ));
        }
        let agent = self.user_agent.trim();
        if agent.is_empty() {
            return Err(ConfigError::Invalid("transport.user_agent must be non-empty".to_string()));
        }
        if agent.len() > MAX_USER_AGENT_LENGTH {
            return Err(ConfigError::Invalid("transport.user_agent exceeds max length".to_string()));
        }
        if !agent.chars().all(|ch| ch.is_ascii_graphic() || ch == ' ') {
            return Err(ConfigError::Invalid(
                "transport.user_agent must be printable ascii".to_string(),
            ));
        }
        Ok(())
    }
}

/// Background refresh configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Delay before the next background refresh in seconds.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl SchedulerConfig {
    /// Returns the refresh interval.
    #[must_use]
    pub const fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Validates scheduler configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_REFRESH_INTERVAL_SECS..=MAX_REFRESH_INTERVAL_SECS)
            .contains(&self.refresh_interval_secs)
        {
            return Err(ConfigError::Invalid(format!(
                "scheduler.refresh_interval_secs must be between {MIN_REFRESH_INTERVAL_SECS} and \
                 {MAX_REFRESH_INTERVAL_SECS}"
            )));
        }
        Ok(())
    }
}

/// Event sink selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// JSON lines appended to a file.
    File,
    /// Events are discarded.
    #[serde(rename = "none")]
    Disabled,
}

/// Event log configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Sink selection.
    #[serde(default)]
    pub sink: LogSinkKind,
    /// Log file path when `sink = "file"`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl LoggingConfig {
    /// Validates logging configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        match (self.sink, &self.path) {
            (LogSinkKind::File, Some(path)) => {
                validate_path_string("logging.path", &path.to_string_lossy())
            }
            (LogSinkKind::File, None) => {
                Err(ConfigError::Invalid("file logging requires logging.path".to_string()))
            }
            (LogSinkKind::Stderr | LogSinkKind::Disabled, Some(_)) => Err(ConfigError::Invalid(
                "logging.path is only valid with sink = \"file\"".to_string(),
            )),
            (LogSinkKind::Stderr | LogSinkKind::Disabled, None) => Ok(()),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Validates a server base address.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] unless the address is an absolute
/// `http`/`https` URL with a host and no embedded credentials.
pub fn validate_base_address(address: &str) -> Result<(), ConfigError> {
    if address.len() > MAX_BASE_ADDRESS_LENGTH {
        return Err(ConfigError::Invalid("server.base_address exceeds max length".to_string()));
    }
    let url = Url::parse(address)
        .map_err(|err| ConfigError::Invalid(format!("server.base_address is not a url: {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Invalid(
            "server.base_address must use http or https".to_string(),
        ));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::Invalid("server.base_address must include a host".to_string()));
    }
    if !url.username().is_empty() || url.password().is_some() {
        return Err(ConfigError::Invalid(
            "server.base_address must not embed credentials".to_string(),
        ));
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err(ConfigError::Invalid(
            "server.base_address must not carry a query or fragment".to_string(),
        ));
    }
    Ok(())
}

/// Validates a group container identifier.
fn validate_group_container_id(value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "container.group_container_id must be non-empty".to_string(),
        ));
    }
    if value.trim() != value {
        return Err(ConfigError::Invalid(
            "container.group_container_id must be trimmed".to_string(),
        ));
    }
    if value.len() > MAX_PATH_COMPONENT_LENGTH {
        return Err(ConfigError::Invalid(
            "container.group_container_id exceeds max length".to_string(),
        ));
    }
    if value == "." || value == ".." || value.contains(['/', '\\']) {
        return Err(ConfigError::Invalid(
            "container.group_container_id must be a single path component".to_string(),
        ));
    }
    Ok(())
}

/// Validates a timeout against the allowed window.
fn validate_timeout(field: &str, value: u64) -> Result<(), ConfigError> {
    if !(MIN_TIMEOUT_MS..=MAX_TIMEOUT_MS).contains(&value) {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {MIN_TIMEOUT_MS} and {MAX_TIMEOUT_MS}"
        )));
    }
    Ok(())
}

/// Validates the resolved config path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

// ============================================================================
// SECTION: Defaults
// ============================================================================

/// Default group container identifier.
fn default_group_container_id() -> String {
    DEFAULT_GROUP_CONTAINER_ID.to_string()
}

/// Default container root directory.
fn default_container_root() -> PathBuf {
    PathBuf::from(".")
}

/// Default cache busy timeout.
const fn default_cache_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Default per-read request timeout.
const fn default_request_timeout_ms() -> u64 {
    10_000
}

/// Default whole-request timeout.
const fn default_resource_timeout_ms() -> u64 {
    20_000
}

/// Default relay reply timeout.
const fn default_relay_reply_timeout_ms() -> u64 {
    30_000
}

/// Default user agent.
fn default_user_agent() -> String {
    format!("datacore-companion/{}", env!("CARGO_PKG_VERSION"))
}

/// Default background refresh interval (30 minutes).
const fn default_refresh_interval_secs() -> u64 {
    1_800
}
