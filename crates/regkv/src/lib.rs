//! regkv library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! ```
//! use regkv::application::settings_store::SettingsStore;
//! use regkv::infrastructure::memory::MemoryHive;
//!
//! let store = SettingsStore::open(Box::new(MemoryHive::new()), "App").unwrap();
//! assert!(store.set_value("Timeout", Some("30"), Default::default()));
//! assert_eq!(store.get_typed_value::<i32>("Timeout", Some(0)), Some(30));
//! ```

pub mod application;
pub mod infrastructure;

pub use application::hive::{BackendError, Hive, NativeKey};
pub use application::settings_store::{SettingsStore, StoreError};
pub use regkv_core::{
    ConvertMode, FromSettingsString, LineType, NativeValue, SettingsValue, ToSettingsValue,
    TraceSink, ValueKind, DEFAULT_SUBCONTAINER,
};
