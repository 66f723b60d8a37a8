//! Ports to the native hierarchical store.
//!
//! A [`Hive`] opens the fixed platform location (`Software`); from there the
//! store walks [`NativeKey`] handles.  A handle is an owned resource: the
//! adapter releases it when the `Box<dyn NativeKey>` is dropped, so a handle
//! acquired inside an operation is released on every exit path.
//!
//! The production adapters live in `crate::infrastructure`; tests use the
//! `mockall`-generated `MockHive` / `MockNativeKey`.

use regkv_core::NativeValue;
use thiserror::Error;

/// Error reported by a hive adapter.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The addressed container does not exist.
    #[error("container '{path}' was not found")]
    NotFound { path: String },

    /// The caller lacks the rights for the operation.
    #[error("access to '{path}' was denied")]
    PermissionDenied { path: String },

    /// The container behind a live handle was deleted.
    #[error("container '{path}' has been deleted")]
    KeyDeleted { path: String },

    /// A stored value or the backing data is unreadable.
    #[error("'{path}' is corrupt: {reason}")]
    Corrupt { path: String, reason: String },

    /// Any other OS or file-system failure.
    #[error("I/O error accessing '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The adapter cannot run on this platform.
    #[error("platform not supported: {0}")]
    Unsupported(String),
}

/// An open handle to one container.
#[cfg_attr(test, mockall::automock)]
pub trait NativeKey {
    /// Fully-qualified path of the container.
    fn path(&self) -> String;

    /// Opens the child container `name`, creating it if absent.
    fn create_subkey(&self, name: &str) -> Result<Box<dyn NativeKey>, BackendError>;

    /// Opens the child container `name`; `None` if it does not exist.
    fn open_subkey(&self, name: &str) -> Result<Option<Box<dyn NativeKey>>, BackendError>;

    /// Reads value `name`; `None` if it does not exist.
    fn get_value(&self, name: &str) -> Result<Option<NativeValue>, BackendError>;

    /// Writes value `name`, replacing any previous value and kind.
    fn set_value(&self, name: &str, value: &NativeValue) -> Result<(), BackendError>;

    /// Deletes value `name`; returns whether it existed.
    fn delete_value(&self, name: &str) -> Result<bool, BackendError>;

    /// Deletes the child container `name` with its whole subtree; returns
    /// whether it existed.
    fn delete_subkey_tree(&self, name: &str) -> Result<bool, BackendError>;

    /// Names of the values in this container.
    fn value_names(&self) -> Result<Vec<String>, BackendError>;

    /// Names of the child containers.
    fn subkey_names(&self) -> Result<Vec<String>, BackendError>;
}

/// A native hierarchical store.
#[cfg_attr(test, mockall::automock)]
pub trait Hive {
    /// Opens the fixed platform location that holds application roots.
    fn open_location(&self) -> Result<Box<dyn NativeKey>, BackendError>;

    /// Short description for diagnostics, e.g. `memory` or a file path.
    fn describe(&self) -> String;
}
