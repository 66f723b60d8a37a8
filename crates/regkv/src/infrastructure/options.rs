//! TOML options file for the settings store.
//!
//! Selects the backing hive, the default subcontainer, and how diagnostics are
//! reported.  Read from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\regkv\options.toml`
//! - Linux:    `$XDG_CONFIG_HOME/regkv/options.toml` or `~/.config/regkv/options.toml`
//! - macOS:    `~/Library/Application Support/regkv/options.toml`
//!
//! ```toml
//! [store]
//! backend = "auto"
//! location = "Software"
//! default_subcontainer = "Settings"
//!
//! [logging]
//! level = "info"
//! trace = "tracing"
//! ```
//!
//! Every field has a default, so a missing file, a missing section, and a
//! missing key all behave the same way.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regkv_core::{
    ConsoleSink, NullSink, TraceSink, TracingSink, DEFAULT_SUBCONTAINER, PLATFORM_LOCATION,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::file::FileHive;
use super::memory::MemoryHive;
use crate::application::hive::Hive;
use crate::application::settings_store::SettingsStore;

const OPTIONS_FILE_NAME: &str = "options.toml";
const HIVE_FILE_NAME: &str = "hive.json";

/// Error type for options file operations.
#[derive(Debug, Error)]
pub enum OptionsError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing options at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse options TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The options could not be serialized to TOML.
    #[error("failed to serialize options: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The selected backend does not exist on this platform.
    #[error("backend '{0}' is not available on this platform")]
    UnsupportedBackend(BackendKind),
}

// ── Options schema types ──────────────────────────────────────────────────────

/// Which hive backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The registry on Windows, a JSON file elsewhere.
    #[default]
    Auto,
    Registry,
    File,
    Memory,
}

impl BackendKind {
    /// Resolves `Auto` for the current platform.
    pub fn resolve(self) -> BackendKind {
        match self {
            BackendKind::Auto if cfg!(target_os = "windows") => BackendKind::Registry,
            BackendKind::Auto => BackendKind::File,
            other => other,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BackendKind::Auto => "auto",
            BackendKind::Registry => "registry",
            BackendKind::File => "file",
            BackendKind::Memory => "memory",
        })
    }
}

/// Where diagnostics lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStyle {
    #[default]
    Tracing,
    Console,
    Off,
}

/// Top-level options stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoreOptions {
    #[serde(default)]
    pub store: StoreSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Backend and layout settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoreSection {
    #[serde(default)]
    pub backend: BackendKind,
    /// Top-level container holding application roots.
    #[serde(default = "default_location")]
    pub location: String,
    /// Subcontainer used when a call names none.
    #[serde(default = "default_subcontainer")]
    pub default_subcontainer: String,
    /// JSON file for the `file` backend.  Defaults to `hive.json` next to the
    /// options file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hive_file: Option<PathBuf>,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSection {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub trace: TraceStyle,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_location() -> String {
    PLATFORM_LOCATION.to_string()
}
fn default_subcontainer() -> String {
    DEFAULT_SUBCONTAINER.to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            location: default_location(),
            default_subcontainer: default_subcontainer(),
            hive_file: None,
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            trace: TraceStyle::default(),
        }
    }
}

// ── Options repository ────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the options file.
///
/// # Errors
///
/// Returns [`OptionsError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn options_dir() -> Result<PathBuf, OptionsError> {
    platform_config_dir().ok_or(OptionsError::NoPlatformConfigDir)
}

/// Resolves the full path to the options file.
///
/// # Errors
///
/// Returns [`OptionsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn options_file_path() -> Result<PathBuf, OptionsError> {
    Ok(options_dir()?.join(OPTIONS_FILE_NAME))
}

/// Default location of the `file` backend's JSON document.
///
/// # Errors
///
/// Returns [`OptionsError::NoPlatformConfigDir`] if the base directory cannot
/// be determined.
pub fn default_hive_file() -> Result<PathBuf, OptionsError> {
    Ok(options_dir()?.join(HIVE_FILE_NAME))
}

/// Loads options from the platform options file.
///
/// # Errors
///
/// As [`load_options_from`], plus [`OptionsError::NoPlatformConfigDir`].
pub fn load_options() -> Result<StoreOptions, OptionsError> {
    load_options_from(&options_file_path()?)
}

/// Loads options from `path`, returning defaults if the file does not exist.
///
/// # Errors
///
/// Returns [`OptionsError::Io`] for file-system errors other than "not found",
/// and [`OptionsError::Parse`] if the TOML is malformed.
pub fn load_options_from(path: &Path) -> Result<StoreOptions, OptionsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreOptions::default()),
        Err(e) => Err(OptionsError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Persists `options` to `path`, creating the directory if needed.
///
/// # Errors
///
/// Returns [`OptionsError::Io`] for file-system failures or
/// [`OptionsError::Serialize`] if serialization fails.
pub fn save_options_to(path: &Path, options: &StoreOptions) -> Result<(), OptionsError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| OptionsError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(options)?;
    std::fs::write(path, content).map_err(|source| OptionsError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Resolves the platform config base directory, including the `regkv` subdirectory.
fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        // %APPDATA% e.g. C:\Users\<user>\AppData\Roaming
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("regkv"))
    }

    #[cfg(target_os = "linux")]
    {
        // XDG_CONFIG_HOME or ~/.config
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("regkv"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("regkv")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Builds the hive selected by `options`.
///
/// # Errors
///
/// - [`OptionsError::UnsupportedBackend`] for `registry` off Windows.
/// - [`OptionsError::NoPlatformConfigDir`] for `file` without `hive_file`
///   when the config directory is unknown.
pub fn build_hive(options: &StoreSection) -> Result<Box<dyn Hive>, OptionsError> {
    let backend = options.backend.resolve();
    debug!(%backend, location = %options.location, "building hive");
    match backend {
        BackendKind::Registry => registry_hive(&options.location),
        BackendKind::File => {
            let path = match &options.hive_file {
                Some(path) => path.clone(),
                None => default_hive_file()?,
            };
            Ok(Box::new(FileHive::new(path).with_location(&options.location)))
        }
        BackendKind::Memory => Ok(Box::new(MemoryHive::with_location(&options.location))),
        BackendKind::Auto => Err(OptionsError::UnsupportedBackend(BackendKind::Auto)),
    }
}

#[cfg(target_os = "windows")]
fn registry_hive(location: &str) -> Result<Box<dyn Hive>, OptionsError> {
    Ok(Box::new(super::windows::RegistryHive::with_location(location)))
}

#[cfg(not(target_os = "windows"))]
fn registry_hive(_location: &str) -> Result<Box<dyn Hive>, OptionsError> {
    Err(OptionsError::UnsupportedBackend(BackendKind::Registry))
}

/// Builds the diagnostics sink selected by `logging`.
pub fn build_sink(logging: &LoggingSection) -> Arc<dyn TraceSink> {
    match logging.trace {
        TraceStyle::Tracing => Arc::new(TracingSink),
        TraceStyle::Console => Arc::new(ConsoleSink),
        TraceStyle::Off => Arc::new(NullSink),
    }
}

/// Builds an unbound store from `options`.
///
/// # Errors
///
/// As [`build_hive`].
pub fn build_store(options: &StoreOptions) -> Result<SettingsStore, OptionsError> {
    let hive = build_hive(&options.store)?;
    Ok(SettingsStore::new(hive)
        .with_sink(build_sink(&options.logging))
        .with_default_subcontainer(options.store.default_subcontainer.clone()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
