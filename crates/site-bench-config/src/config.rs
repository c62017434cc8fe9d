// crates/site-bench-config/src/config.rs
// ============================================================================
// Module: Site Bench Configuration
// Description: Configuration loading and validation for the benchmark harness.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: site-bench-core, site-bench-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown keys are rejected. A missing default config file yields the
//! built-in defaults; an explicitly named file that is missing is an error.
//! [`SiteBenchConfig`] resolves named profiles for raw benchmark requests.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Deserialize;
use site_bench_core::BenchAuditSink;
use site_bench_core::BenchmarkProfile;
use site_bench_core::ComponentId;
use site_bench_core::ComponentSet;
use site_bench_core::DEFAULT_SELF_COMPONENT;
use site_bench_core::FileAuditSink;
use site_bench_core::Intensity;
use site_bench_core::MAX_REQUEST_COMPONENTS;
use site_bench_core::NoopAuditSink;
use site_bench_core::OrchestratorConfig;
use site_bench_core::ProfileId;
use site_bench_core::ProfileResolver;
use site_bench_core::StderrAuditSink;
use site_bench_core::TestKind;
use site_bench_core::WorkloadBase;
use site_bench_store_sqlite::SqliteStoreConfig;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "site-bench.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SITE_BENCH_CONFIG";
/// Maximum configuration file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of configured profiles.
pub const MAX_PROFILES: usize = 64;
/// Maximum length of a profile identifier.
const MAX_PROFILE_ID_LENGTH: usize = 64;
/// Maximum length of a profile display name.
const MAX_PROFILE_NAME_LENGTH: usize = 256;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Site Bench configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteBenchConfig {
    /// Harness identity and defaults.
    #[serde(default)]
    pub harness: HarnessConfig,
    /// `SQLite` store settings.
    #[serde(default)]
    pub store: SqliteStoreConfig,
    /// Audit sink selection.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Base iteration overrides for the workload generators.
    #[serde(default)]
    pub workloads: WorkloadBase,
    /// Named benchmark profiles.
    #[serde(default)]
    pub profiles: Vec<ProfileConfig>,
    /// Path the config was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

/// Harness identity and run defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    /// Harness's own component identifier.
    #[serde(default = "default_self_component")]
    pub self_component: String,
    /// Intensity used for a selected test with no explicit intensity.
    #[serde(default = "default_intensity")]
    pub default_intensity: i64,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            self_component: default_self_component(),
            default_intensity: default_intensity(),
        }
    }
}

/// Default harness component identifier.
fn default_self_component() -> String {
    DEFAULT_SELF_COMPONENT.to_string()
}

/// Default run intensity.
fn default_intensity() -> i64 {
    i64::from(Intensity::DEFAULT.percent())
}

/// Audit sink kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSinkKind {
    /// JSON lines on stderr.
    #[default]
    Stderr,
    /// Append-only JSON lines file.
    File,
    /// Audit events are dropped.
    #[serde(rename = "none")]
    Disabled,
}

/// Audit sink configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Sink kind.
    #[serde(default)]
    pub sink: AuditSinkKind,
    /// File path for the `file` sink.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Named benchmark profile as written in config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProfileConfig {
    /// Profile identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Test kind labels.
    pub tests: Vec<String>,
    /// Components the profile requests active.
    #[serde(default)]
    pub components: Vec<String>,
}

impl ProfileConfig {
    /// Converts the config entry into a typed profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a label or component id is invalid.
    pub fn to_profile(&self) -> Result<BenchmarkProfile, ConfigError> {
        let field = format!("profiles.{}", self.id);
        let mut tests = Vec::with_capacity(self.tests.len());
        for label in &self.tests {
            let kind = TestKind::from_label(label).ok_or_else(|| {
                ConfigError::Invalid(format!("{field}.tests has unknown test kind: {label}"))
            })?;
            if !tests.contains(&kind) {
                tests.push(kind);
            }
        }
        let components = self
            .components
            .iter()
            .map(|raw| {
                ComponentId::parse(raw)
                    .map_err(|err| ConfigError::Invalid(format!("{field}.components: {err}")))
            })
            .collect::<Result<ComponentSet, _>>()?;
        Ok(BenchmarkProfile {
            id: ProfileId::new(self.id.clone()),
            name: self.name.clone(),
            tests,
            components,
        })
    }
}

// ============================================================================
// SECTION: Loading
// ============================================================================

impl SiteBenchConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        let mut config = Self::from_toml_str(content)?;
        config.source_path = Some(resolved);
        Ok(config)
    }

    /// Loads configuration, falling back to defaults when no path was given
    /// and the default config file does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an existing or explicitly named config
    /// fails to load or validate.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        if path.is_none()
            && env::var_os(CONFIG_ENV_VAR).is_none()
            && !Path::new(DEFAULT_CONFIG_NAME).exists()
        {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when any section is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_harness()?;
        validate_path_buf("store.path", &self.store.path)?;
        if self.store.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "store.busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        match (&self.audit.sink, &self.audit.path) {
            (AuditSinkKind::File, None) => {
                return Err(ConfigError::Invalid("audit.path is required for file sink".to_string()));
            }
            (_, Some(path)) => validate_path_buf("audit.path", path)?,
            (_, None) => {}
        }
        for (name, value) in self.workloads.entries() {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "workloads.{name} must be greater than zero"
                )));
            }
        }
        self.validate_profiles()
    }

    /// Validates the harness section.
    fn validate_harness(&self) -> Result<(), ConfigError> {
        ComponentId::parse(&self.harness.self_component)
            .map_err(|err| ConfigError::Invalid(format!("harness.self_component: {err}")))?;
        let range = i64::from(Intensity::MIN.percent())..=i64::from(Intensity::MAX.percent());
        if !range.contains(&self.harness.default_intensity) {
            return Err(ConfigError::Invalid(
                "harness.default_intensity must be between 0 and 100".to_string(),
            ));
        }
        Ok(())
    }

    /// Validates the profile list.
    fn validate_profiles(&self) -> Result<(), ConfigError> {
        if self.profiles.len() > MAX_PROFILES {
            return Err(ConfigError::Invalid(format!(
                "profiles exceeds max entries ({MAX_PROFILES})"
            )));
        }
        let mut seen = Vec::with_capacity(self.profiles.len());
        for profile in &self.profiles {
            let id = profile.id.trim();
            if id.is_empty() || id.len() > MAX_PROFILE_ID_LENGTH || id != profile.id {
                return Err(ConfigError::Invalid(format!(
                    "profiles.id must be 1 to {MAX_PROFILE_ID_LENGTH} characters without \
                     surrounding whitespace: {:?}",
                    profile.id
                )));
            }
            if seen.contains(&id) {
                return Err(ConfigError::Invalid(format!("duplicate profile id: {id}")));
            }
            seen.push(id);
            if profile.name.trim().is_empty() || profile.name.len() > MAX_PROFILE_NAME_LENGTH {
                return Err(ConfigError::Invalid(format!("profiles.{id}.name is invalid")));
            }
            if profile.tests.is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "profiles.{id}.tests must select at least one test"
                )));
            }
            if profile.components.len() > MAX_REQUEST_COMPONENTS {
                return Err(ConfigError::Invalid(format!(
                    "profiles.{id}.components exceeds max entries ({MAX_REQUEST_COMPONENTS})"
                )));
            }
            profile.to_profile()?;
        }
        Ok(())
    }

    /// Builds the orchestrator configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the harness component is invalid.
    pub fn orchestrator_config(&self) -> Result<OrchestratorConfig, ConfigError> {
        let self_component = ComponentId::parse(&self.harness.self_component)
            .map_err(|err| ConfigError::Invalid(format!("harness.self_component: {err}")))?;
        Ok(OrchestratorConfig {
            self_component,
            workloads: self.workloads,
            default_intensity: Intensity::clamped(self.harness.default_intensity),
        })
    }

    /// Builds the configured audit sink.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the audit file cannot be opened.
    pub fn build_audit_sink(&self) -> Result<Arc<dyn BenchAuditSink>, ConfigError> {
        let sink: Arc<dyn BenchAuditSink> = match self.audit.sink {
            AuditSinkKind::Stderr => Arc::new(StderrAuditSink),
            AuditSinkKind::Disabled => Arc::new(NoopAuditSink),
            AuditSinkKind::File => {
                let path = self.audit.path.as_ref().ok_or_else(|| {
                    ConfigError::Invalid("audit.path is required for file sink".to_string())
                })?;
                Arc::new(FileAuditSink::new(path).map_err(|err| ConfigError::Io(err.to_string()))?)
            }
        };
        Ok(sink)
    }

    /// Returns every configured profile as a typed profile.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a profile is invalid.
    pub fn typed_profiles(&self) -> Result<Vec<BenchmarkProfile>, ConfigError> {
        self.profiles.iter().map(ProfileConfig::to_profile).collect()
    }
}

impl ProfileResolver for SiteBenchConfig {
    fn profile(&self, id: &ProfileId) -> Option<BenchmarkProfile> {
        self.profiles
            .iter()
            .find(|profile| profile.id == id.as_str())
            .and_then(|profile| profile.to_profile().ok())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
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
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
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

/// Validates a configured path against length constraints.
fn validate_path_buf(field: &str, path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}
