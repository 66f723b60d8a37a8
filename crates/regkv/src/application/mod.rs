//! Application layer of the settings store.
//!
//! - **`hive`** – the ports the store talks to the native hierarchical store
//!   through.  Infrastructure adapters implement them; tests mock them.
//!
//! - **`settings_store`** – [`settings_store::SettingsStore`], the binding to
//!   an application root plus every get/set/delete operation, with both an
//!   explicit-result surface and a fail-closed surface.
//!
//! **Dependency rule**: this layer depends on `regkv_core` only.  It MUST NOT
//! import `crate::infrastructure`.

pub mod hive;
pub mod settings_store;
