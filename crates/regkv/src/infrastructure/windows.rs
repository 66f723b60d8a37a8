//! Windows registry hive.
//!
//! Application roots live under `HKEY_CURRENT_USER\Software`, which any user
//! can write without elevation.  Access goes through the `winreg` crate; each
//! [`WinKey`] owns one `HKEY` and closes it on drop.
//!
//! Win32 error codes are mapped onto [`BackendError`]:
//!
//! | Code                       | Variant            |
//! |----------------------------|--------------------|
//! | `ERROR_FILE_NOT_FOUND` (2) | `NotFound`         |
//! | `ERROR_ACCESS_DENIED` (5)  | `PermissionDenied` |
//! | `ERROR_KEY_DELETED` (1018) | `KeyDeleted`       |
//! | anything else              | `Io`               |

use std::io;

use regkv_core::domain::names::SEPARATOR;
use regkv_core::{NativeValue, PLATFORM_LOCATION};
use winreg::enums::{
    RegType, HKEY_CURRENT_USER, KEY_READ, KEY_WRITE, REG_BINARY, REG_DWORD, REG_EXPAND_SZ,
    REG_MULTI_SZ, REG_QWORD, REG_SZ,
};
use winreg::types::{FromRegValue, ToRegValue};
use winreg::{RegKey, RegValue};

use crate::application::hive::{BackendError, Hive, NativeKey};

const ERROR_FILE_NOT_FOUND: i32 = 2;
const ERROR_ACCESS_DENIED: i32 = 5;
const ERROR_KEY_DELETED: i32 = 1018;

const HKCU_NAME: &str = "HKEY_CURRENT_USER";

fn map_error(path: &str, error: io::Error) -> BackendError {
    let path = path.to_string();
    match error.raw_os_error() {
        Some(ERROR_FILE_NOT_FOUND) => BackendError::NotFound { path },
        Some(ERROR_ACCESS_DENIED) => BackendError::PermissionDenied { path },
        Some(ERROR_KEY_DELETED) => BackendError::KeyDeleted { path },
        _ => BackendError::Io {
            path,
            source: error,
        },
    }
}

fn is_not_found(error: &io::Error) -> bool {
    error.raw_os_error() == Some(ERROR_FILE_NOT_FOUND)
}

/// The registry of the current user.
#[derive(Debug, Clone)]
pub struct RegistryHive {
    location: String,
}

impl RegistryHive {
    /// Uses `HKEY_CURRENT_USER\Software`.
    pub fn new() -> Self {
        Self::with_location(PLATFORM_LOCATION)
    }

    /// Uses `HKEY_CURRENT_USER\<location>`.
    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

impl Default for RegistryHive {
    fn default() -> Self {
        Self::new()
    }
}

impl Hive for RegistryHive {
    fn open_location(&self) -> Result<Box<dyn NativeKey>, BackendError> {
        let path = format!("{HKCU_NAME}{SEPARATOR}{}", self.location);
        let (key, _) = RegKey::predef(HKEY_CURRENT_USER)
            .create_subkey(&self.location)
            .map_err(|e| map_error(&path, e))?;
        Ok(Box::new(WinKey { key, path }))
    }

    fn describe(&self) -> String {
        format!("registry:{HKCU_NAME}{SEPARATOR}{}", self.location)
    }
}

/// An open registry key.
pub struct WinKey {
    key: RegKey,
    path: String,
}

impl WinKey {
    fn child_path(&self, name: &str) -> String {
        format!("{}{SEPARATOR}{name}", self.path)
    }

    fn corrupt(&self, name: &str, error: io::Error) -> BackendError {
        BackendError::Corrupt {
            path: self.path.clone(),
            reason: format!("value '{name}': {error}"),
        }
    }

    fn decode(&self, name: &str, raw: RegValue) -> Result<NativeValue, BackendError> {
        let value = match raw.vtype {
            REG_SZ => NativeValue::String(
                String::from_reg_value(&raw).map_err(|e| self.corrupt(name, e))?,
            ),
            REG_EXPAND_SZ => NativeValue::ExpandString(
                String::from_reg_value(&raw).map_err(|e| self.corrupt(name, e))?,
            ),
            REG_MULTI_SZ => NativeValue::MultiString(
                Vec::<String>::from_reg_value(&raw).map_err(|e| self.corrupt(name, e))?,
            ),
            REG_DWORD => {
                NativeValue::DWord(u32::from_reg_value(&raw).map_err(|e| self.corrupt(name, e))?)
            }
            REG_QWORD => {
                NativeValue::QWord(u64::from_reg_value(&raw).map_err(|e| self.corrupt(name, e))?)
            }
            // REG_BINARY and the kinds this store never writes surface as bytes.
            _ => NativeValue::Binary(raw.bytes),
        };
        Ok(value)
    }

    fn encode(value: &NativeValue) -> RegValue {
        match value {
            NativeValue::String(s) => s.to_reg_value(),
            NativeValue::ExpandString(s) => with_type(s.to_reg_value(), REG_EXPAND_SZ),
            NativeValue::DWord(v) => v.to_reg_value(),
            NativeValue::QWord(v) => v.to_reg_value(),
            NativeValue::Binary(bytes) => RegValue {
                bytes: bytes.clone(),
                vtype: REG_BINARY,
            },
            NativeValue::MultiString(lines) => lines.to_reg_value(),
        }
    }
}

fn with_type(mut value: RegValue, vtype: RegType) -> RegValue {
    value.vtype = vtype;
    value
}

impl NativeKey for WinKey {
    fn path(&self) -> String {
        self.path.clone()
    }

    fn create_subkey(&self, name: &str) -> Result<Box<dyn NativeKey>, BackendError> {
        let path = self.child_path(name);
        let (key, _) = self
            .key
            .create_subkey(name)
            .map_err(|e| map_error(&path, e))?;
        Ok(Box::new(WinKey { key, path }))
    }

    fn open_subkey(&self, name: &str) -> Result<Option<Box<dyn NativeKey>>, BackendError> {
        let path = self.child_path(name);
        match self.key.open_subkey_with_flags(name, KEY_READ | KEY_WRITE) {
            Ok(key) => Ok(Some(Box::new(WinKey { key, path }))),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_error(&path, e)),
        }
    }

    fn get_value(&self, name: &str) -> Result<Option<NativeValue>, BackendError> {
        match self.key.get_raw_value(name) {
            Ok(raw) => self.decode(name, raw).map(Some),
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(map_error(&self.path, e)),
        }
    }

    fn set_value(&self, name: &str, value: &NativeValue) -> Result<(), BackendError> {
        self.key
            .set_raw_value(name, &Self::encode(value))
            .map_err(|e| map_error(&self.path, e))
    }

    fn delete_value(&self, name: &str) -> Result<bool, BackendError> {
        match self.key.delete_value(name) {
            Ok(()) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(map_error(&self.path, e)),
        }
    }

    fn delete_subkey_tree(&self, name: &str) -> Result<bool, BackendError> {
        match self.key.delete_subkey_all(name) {
            Ok(()) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(map_error(&self.child_path(name), e)),
        }
    }

    fn value_names(&self) -> Result<Vec<String>, BackendError> {
        self.key
            .enum_values()
            .map(|entry| entry.map(|(name, _)| name))
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| map_error(&self.path, e))
    }

    fn subkey_names(&self) -> Result<Vec<String>, BackendError> {
        self.key
            .enum_keys()
            .collect::<io::Result<Vec<_>>>()
            .map_err(|e| map_error(&self.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// A throwaway application root, removed again on drop.
    struct ScratchRoot {
        location: Box<dyn NativeKey>,
        name: String,
    }

    impl ScratchRoot {
        fn new() -> Self {
            let location = RegistryHive::new().open_location().expect("HKCU\\Software opens");
            Self {
                location,
                name: format!("regkv-test-{}", Uuid::new_v4()),
            }
        }
    }

    impl Drop for ScratchRoot {
        fn drop(&mut self) {
            let _ = self.location.delete_subkey_tree(&self.name);
        }
    }

    #[test]
    fn test_every_kind_survives_the_registry() {
        // Arrange
        let scratch = ScratchRoot::new();
        let root = scratch.location.create_subkey(&scratch.name).unwrap();
        let values = [
            ("s", NativeValue::String("plain".to_string())),
            ("e", NativeValue::ExpandString("%TEMP%".to_string())),
            ("d", NativeValue::DWord(u32::MAX)),
            ("q", NativeValue::QWord(1 << 40)),
            ("b", NativeValue::Binary(vec![0xde, 0xad])),
            ("m", NativeValue::MultiString(vec!["a".to_string(), "b".to_string()])),
        ];

        // Act
        for (name, value) in &values {
            root.set_value(name, value).unwrap();
        }

        // Assert
        for (name, value) in &values {
            assert_eq!(root.get_value(name).unwrap().as_ref(), Some(value), "value {name}");
        }
    }

    #[test]
    fn test_missing_entries_are_none_or_false() {
        let scratch = ScratchRoot::new();
        let root = scratch.location.create_subkey(&scratch.name).unwrap();

        assert!(root.open_subkey("Missing").unwrap().is_none());
        assert_eq!(root.get_value("Missing").unwrap(), None);
        assert!(!root.delete_value("Missing").unwrap());
        assert!(!root.delete_subkey_tree("Missing").unwrap());
    }

    #[test]
    fn test_path_is_fully_qualified() {
        let scratch = ScratchRoot::new();

        let root = scratch.location.create_subkey(&scratch.name).unwrap();

        assert_eq!(
            root.path(),
            format!(r"HKEY_CURRENT_USER\Software\{}", scratch.name)
        );
    }

    #[test]
    fn test_access_denied_maps_to_permission_denied() {
        let error = map_error("x", io::Error::from_raw_os_error(ERROR_ACCESS_DENIED));
        assert!(matches!(error, BackendError::PermissionDenied { .. }));
    }
}
