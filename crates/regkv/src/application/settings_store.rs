//! SettingsStore: fault-tolerant typed access to an application's settings.
//!
//! The store binds to one application root (`<location>\<application>`) and
//! reads, writes, and deletes named values in subcontainers below it.
//!
//! # Two surfaces
//!
//! - The `try_*` methods return `Result<_, StoreError>` and tell the caller
//!   exactly what went wrong.
//! - The plain methods (`set_value`, `get_value`, ...) are a fail-closed
//!   mapping over them: they never panic and never propagate, returning
//!   `false` or the caller's default instead.  Only [`SettingsStore::initialize`]
//!   hands its error back.
//!
//! Every operation writes one `Start` line to the [`TraceSink`] and exactly one
//! closing `End` or `Failed` line.
//!
//! # Handles
//!
//! Only the root handle is held between calls.  Subcontainer handles are
//! opened inside each operation and dropped before it returns, so the store
//! never serves a value from a stale handle.

use std::fmt::{self, Display};
use std::sync::Arc;

use regkv_core::domain::names::{self, NameError};
use regkv_core::{
    convert, ConversionError, ConvertMode, FromSettingsString, KindMismatch, LineType,
    NativeValue, ToSettingsValue, TraceSink, TracingSink, ValueKind, DEFAULT_SUBCONTAINER,
};
use thiserror::Error;

use super::hive::{BackendError, Hive, NativeKey};

/// Error type for settings store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The operation ran before a successful `initialize`, or after `delete_all`.
    #[error("settings store is not bound to an application")]
    Unbound,

    #[error("cannot open settings root for '{application}': {source}")]
    Initialize {
        application: String,
        #[source]
        source: BackendError,
    },

    #[error("invalid name: {0}")]
    InvalidName(#[from] NameError),

    #[error("cannot store '{name}': {source}")]
    KindMismatch {
        name: String,
        #[source]
        source: KindMismatch,
    },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),
}

/// The open application root.
struct RootBinding {
    application: String,
    path: String,
    key: Box<dyn NativeKey>,
}

/// Typed settings access bound to one application root.
pub struct SettingsStore {
    hive: Box<dyn Hive>,
    sink: Arc<dyn TraceSink>,
    default_subcontainer: String,
    binding: Option<RootBinding>,
}

impl fmt::Debug for SettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SettingsStore")
            .field("hive", &self.hive.describe())
            .field("default_subcontainer", &self.default_subcontainer)
            .field("root_path", &self.root_path())
            .finish()
    }
}

impl SettingsStore {
    /// Creates an unbound store that reports through [`TracingSink`].
    pub fn new(hive: Box<dyn Hive>) -> Self {
        Self {
            hive,
            sink: Arc::new(TracingSink),
            default_subcontainer: DEFAULT_SUBCONTAINER.to_string(),
            binding: None,
        }
    }

    /// Replaces the diagnostics sink.
    pub fn with_sink(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the subcontainer used by the methods without an `_in` suffix.
    pub fn with_default_subcontainer(mut self, name: impl Into<String>) -> Self {
        self.default_subcontainer = name.into();
        self
    }

    /// Creates a store and binds it to `application`.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] from [`SettingsStore::initialize`].
    pub fn open(hive: Box<dyn Hive>, application: &str) -> Result<Self, StoreError> {
        let mut store = Self::new(hive);
        store.initialize(application)?;
        Ok(store)
    }

    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Name of the bound application, if any.
    pub fn application(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.application.as_str())
    }

    /// Fully-qualified path of the bound root container, if any.
    pub fn root_path(&self) -> Option<&str> {
        self.binding.as_ref().map(|b| b.path.as_str())
    }

    pub fn default_subcontainer(&self) -> &str {
        &self.default_subcontainer
    }

    // ── Binding ──────────────────────────────────────────────────────────────

    /// Binds the store to `<location>\<application>`, creating the container
    /// if it does not exist.  Re-initializing replaces the previous binding.
    ///
    /// # Errors
    ///
    /// - [`StoreError::InvalidName`] if `application` is not a valid key name.
    /// - [`StoreError::Initialize`] if the native store refuses to open or
    ///   create the root.  The previous binding, if any, stays in place.
    pub fn initialize(&mut self, application: &str) -> Result<(), StoreError> {
        self.sink.write_line(
            &format!("Initializing settings for '{application}'"),
            LineType::Start,
        );

        match self.bind(application) {
            Ok(binding) => {
                self.sink.write_line(
                    &format!("Bound to '{}'", binding.path),
                    LineType::End,
                );
                self.binding = Some(binding);
                Ok(())
            }
            Err(e) => {
                self.sink.write_line(
                    &format!("Initializing settings for '{application}' failed: {e}"),
                    LineType::Failed,
                );
                Err(e)
            }
        }
    }

    fn bind(&self, application: &str) -> Result<RootBinding, StoreError> {
        names::validate_key_name(application)?;
        let to_init_error = |source| StoreError::Initialize {
            application: application.to_string(),
            source,
        };

        let location = self.hive.open_location().map_err(to_init_error)?;
        let key = location.create_subkey(application).map_err(to_init_error)?;
        Ok(RootBinding {
            application: application.to_string(),
            path: key.path(),
            key,
        })
    }

    // ── Explicit-result surface ──────────────────────────────────────────────

    /// Writes `value` as `kind` under `subcontainer`, creating the
    /// subcontainer if needed.  `None` writes the type's absent value.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unbound`], [`StoreError::InvalidName`],
    /// [`StoreError::KindMismatch`] when the value does not fit `kind`, or
    /// [`StoreError::Backend`].
    pub fn try_set_value_in<T: ToSettingsValue + ?Sized>(
        &self,
        name: &str,
        value: Option<&T>,
        kind: ValueKind,
        subcontainer: &str,
    ) -> Result<(), StoreError> {
        self.run(
            &format!("Saving value '{name}' as {kind} in '{subcontainer}'"),
            |root| {
                names::validate_value_name(name)?;
                names::validate_key_name(subcontainer)?;

                let settings_value =
                    value.map_or_else(T::absent_value, |v| v.to_settings_value());
                let native = settings_value
                    .into_native(kind)
                    .map_err(|source| StoreError::KindMismatch {
                        name: name.to_string(),
                        source,
                    })?;

                let container = root.key.create_subkey(subcontainer)?;
                container.set_value(name, &native)?;
                Ok(())
            },
        )
    }

    /// Reads the raw string form of value `name`; `Ok(None)` if the value or
    /// its subcontainer does not exist.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unbound`], [`StoreError::InvalidName`], or
    /// [`StoreError::Backend`].
    pub fn try_get_value_in(
        &self,
        name: &str,
        subcontainer: &str,
    ) -> Result<Option<String>, StoreError> {
        self.run(
            &format!("Reading value '{name}' from '{subcontainer}'"),
            |root| read_raw(root, name, subcontainer),
        )
    }

    /// Reads value `name` and converts it to `T` strictly.
    ///
    /// `Ok(None)` if the value is absent or empty.
    ///
    /// # Errors
    ///
    /// As [`SettingsStore::try_get_value_in`], plus
    /// [`StoreError::Conversion`] when the stored text is not a valid `T`.
    pub fn try_get_typed_value_in<T: FromSettingsString>(
        &self,
        name: &str,
        subcontainer: &str,
    ) -> Result<Option<T>, StoreError> {
        self.run(
            &format!("Reading value '{name}' from '{subcontainer}'"),
            |root| {
                let raw = read_raw(root, name, subcontainer)?;
                self.sink
                    .write_line(&format!("Converting to {}", T::TYPE_NAME), LineType::Default);
                Ok(convert::<T>(raw.as_deref(), ConvertMode::Strict)?)
            },
        )
    }

    /// Deletes value `name`; returns whether it existed.
    ///
    /// A missing subcontainer counts as nothing to delete.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unbound`], [`StoreError::InvalidName`], or
    /// [`StoreError::Backend`].
    pub fn try_delete_value_in(&self, name: &str, subcontainer: &str) -> Result<bool, StoreError> {
        self.run(
            &format!("Deleting value '{name}' from '{subcontainer}'"),
            |root| {
                names::validate_value_name(name)?;
                names::validate_key_name(subcontainer)?;
                match root.key.open_subkey(subcontainer)? {
                    Some(container) => Ok(container.delete_value(name)?),
                    None => Ok(false),
                }
            },
        )
    }

    /// Removes the application root and everything below it, then drops the
    /// binding.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unbound`] or [`StoreError::Backend`], including
    /// [`BackendError::NotFound`] when the root was already removed through
    /// another handle.  On error the binding is kept.
    pub fn try_delete_all(&mut self) -> Result<(), StoreError> {
        self.run("Deleting all settings", |root| {
            let location = self.hive.open_location()?;
            if location.delete_subkey_tree(&root.application)? {
                Ok(())
            } else {
                Err(StoreError::Backend(BackendError::NotFound {
                    path: root.path.clone(),
                }))
            }
        })?;
        self.binding = None;
        Ok(())
    }

    /// Lists the values of `subcontainer`; empty if it does not exist.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unbound`], [`StoreError::InvalidName`], or
    /// [`StoreError::Backend`].
    pub fn try_list_values_in(
        &self,
        subcontainer: &str,
    ) -> Result<Vec<(String, NativeValue)>, StoreError> {
        self.run(&format!("Listing values in '{subcontainer}'"), |root| {
            names::validate_key_name(subcontainer)?;
            let Some(container) = root.key.open_subkey(subcontainer)? else {
                return Ok(Vec::new());
            };

            let mut entries = Vec::new();
            for name in container.value_names()? {
                if let Some(value) = container.get_value(&name)? {
                    entries.push((name, value));
                }
            }
            Ok(entries)
        })
    }

    /// Lists the subcontainers of the application root.
    ///
    /// # Errors
    ///
    /// [`StoreError::Unbound`] or [`StoreError::Backend`].
    pub fn try_list_subcontainers(&self) -> Result<Vec<String>, StoreError> {
        self.run("Listing subcontainers", |root| Ok(root.key.subkey_names()?))
    }

    // ── Fail-closed surface ──────────────────────────────────────────────────

    /// Writes `value` to the default subcontainer.  Returns `false` on any
    /// failure.
    pub fn set_value<T: ToSettingsValue + ?Sized>(
        &self,
        name: &str,
        value: Option<&T>,
        kind: ValueKind,
    ) -> bool {
        self.set_value_in(name, value, kind, &self.default_subcontainer)
    }

    /// Writes `value` to `subcontainer`.  Returns `false` on any failure.
    pub fn set_value_in<T: ToSettingsValue + ?Sized>(
        &self,
        name: &str,
        value: Option<&T>,
        kind: ValueKind,
        subcontainer: &str,
    ) -> bool {
        self.try_set_value_in(name, value, kind, subcontainer).is_ok()
    }

    /// Reads value `name` from the default subcontainer.
    pub fn get_value(&self, name: &str, default: Option<&dyn Display>) -> Option<String> {
        self.get_value_in(name, default, &self.default_subcontainer)
    }

    /// Reads value `name` from `subcontainer`, falling back to the
    /// stringified `default` when it is missing or cannot be read.
    pub fn get_value_in(
        &self,
        name: &str,
        default: Option<&dyn Display>,
        subcontainer: &str,
    ) -> Option<String> {
        match self.try_get_value_in(name, subcontainer) {
            Ok(Some(raw)) => Some(raw),
            Ok(None) | Err(_) => default.map(|d| d.to_string()),
        }
    }

    /// Reads value `name` from the default subcontainer as a `T`.
    pub fn get_typed_value<T: FromSettingsString>(&self, name: &str, default: Option<T>) -> Option<T> {
        self.get_typed_value_in(name, default, &self.default_subcontainer)
    }

    /// Reads value `name` from `subcontainer` as a `T`, falling back to
    /// `default` when it is missing, unparsable, or cannot be read.
    pub fn get_typed_value_in<T: FromSettingsString>(
        &self,
        name: &str,
        default: Option<T>,
        subcontainer: &str,
    ) -> Option<T> {
        match self.try_get_typed_value_in::<T>(name, subcontainer) {
            Ok(Some(value)) => Some(value),
            Ok(None) | Err(_) => default,
        }
    }

    /// Deletes value `name` from the default subcontainer.
    pub fn delete_value(&self, name: &str) -> bool {
        self.delete_value_in(name, &self.default_subcontainer)
    }

    /// Deletes value `name` from `subcontainer`.  A missing value is a
    /// successful no-op; returns `false` only on failure.
    pub fn delete_value_in(&self, name: &str, subcontainer: &str) -> bool {
        self.try_delete_value_in(name, subcontainer).is_ok()
    }

    /// Removes the whole application root.  Returns `false` on failure.
    pub fn delete_all(&mut self) -> bool {
        self.try_delete_all().is_ok()
    }

    // ── Internals ────────────────────────────────────────────────────────────

    /// Runs `op` against the binding, bracketed by a `Start` line and one
    /// closing `End` or `Failed` line.
    fn run<R>(
        &self,
        action: &str,
        op: impl FnOnce(&RootBinding) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        self.sink.write_line(action, LineType::Start);

        let result = match &self.binding {
            Some(root) => op(root),
            None => Err(StoreError::Unbound),
        };

        match &result {
            Ok(_) => self
                .sink
                .write_line(&format!("{action}: done"), LineType::End),
            Err(e) => self
                .sink
                .write_line(&format!("{action}: failed: {e}"), LineType::Failed),
        }
        result
    }
}

fn read_raw(
    root: &RootBinding,
    name: &str,
    subcontainer: &str,
) -> Result<Option<String>, StoreError> {
    names::validate_value_name(name)?;
    names::validate_key_name(subcontainer)?;
    let Some(container) = root.key.open_subkey(subcontainer)? else {
        return Ok(None);
    };
    Ok(container.get_value(name)?.map(|value| value.render()))
}
