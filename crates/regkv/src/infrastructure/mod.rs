//! Infrastructure layer: the hive adapters and the options file.
//!
//! - **`memory`** / **`file`** – in-process hives built on the shared
//!   container tree in `tree`.  They run everywhere and back the tests.
//! - **`windows`** – the real registry under `HKEY_CURRENT_USER` (Windows only).
//! - **`options`** – the TOML options file that picks one of the above.
//!
//! **Dependency rule**: this layer may depend on `application` and `regkv_core`,
//! but MUST NOT be imported by the `application` layer.

pub mod file;
pub mod memory;
pub mod options;
mod tree;
#[cfg(target_os = "windows")]
pub mod windows;
