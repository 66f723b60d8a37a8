//! Integration tests for `SettingsStore` over the JSON-file hive.
//!
//! Each test works in its own directory under the system temp dir, named with
//! a fresh UUID, and removes it afterwards.

use std::path::PathBuf;

use regkv::infrastructure::file::FileHive;
use regkv::{SettingsStore, StoreError, ValueKind};
use uuid::Uuid;

struct TempHive {
    dir: PathBuf,
}

impl TempHive {
    fn new() -> Self {
        Self {
            dir: std::env::temp_dir().join(format!("regkv_hive_test_{}", Uuid::new_v4())),
        }
    }

    fn path(&self) -> PathBuf {
        self.dir.join("hive.json")
    }

    fn store(&self, application: &str) -> SettingsStore {
        SettingsStore::open(Box::new(FileHive::new(self.path())), application)
            .expect("file hive binds")
    }
}

impl Drop for TempHive {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

#[test]
fn test_values_persist_across_store_instances() {
    // Arrange
    let temp = TempHive::new();
    {
        let writer = temp.store("App");
        assert!(writer.set_value("Timeout", Some(&30), ValueKind::DWord));
        assert!(writer.set_value_in("Theme", Some("dark"), ValueKind::String, "Ui"));
    }

    // Act
    let reader = temp.store("App");

    // Assert
    assert_eq!(reader.get_typed_value::<i32>("Timeout", Some(0)), Some(30));
    assert_eq!(reader.get_value_in("Theme", None, "Ui"), Some("dark".to_string()));
}

#[test]
fn test_second_store_sees_writes_without_reopening() {
    let temp = TempHive::new();
    let first = temp.store("App");
    let second = temp.store("App");

    assert!(first.set_value("Key", Some("one"), ValueKind::String));
    assert_eq!(second.get_value("Key", None), Some("one".to_string()));

    assert!(second.delete_value("Key"));
    assert_eq!(first.get_value("Key", Some(&"gone")), Some("gone".to_string()));
}

#[test]
fn test_delete_all_through_one_store_is_seen_by_another() {
    // Arrange
    let temp = TempHive::new();
    let mut first = temp.store("App");
    let second = temp.store("App");
    assert!(first.set_value("Key", Some("v"), ValueKind::String));

    // Act
    assert!(first.delete_all());

    // Assert
    assert!(matches!(
        second.try_get_value_in("Key", "Settings"),
        Err(StoreError::Backend(regkv::BackendError::KeyDeleted { .. }))
    ));
    assert_eq!(second.get_value("Key", Some(&"default")), Some("default".to_string()));
}

#[test]
fn test_corrupt_file_fails_closed() {
    // Arrange
    let temp = TempHive::new();
    let store = temp.store("App");
    assert!(store.set_value("Key", Some("v"), ValueKind::String));
    std::fs::write(temp.path(), "definitely not json").unwrap();

    // Act / Assert
    assert_eq!(store.get_value("Key", Some(&"fallback")), Some("fallback".to_string()));
    assert!(!store.set_value("Key", Some("w"), ValueKind::String));
    assert!(matches!(
        store.try_get_value_in("Key", "Settings"),
        Err(StoreError::Backend(regkv::BackendError::Corrupt { .. }))
    ));
}

#[test]
fn test_initialize_on_corrupt_file_returns_error() {
    let temp = TempHive::new();
    std::fs::create_dir_all(&temp.dir).unwrap();
    std::fs::write(temp.path(), "[1, 2").unwrap();

    let result = SettingsStore::open(Box::new(FileHive::new(temp.path())), "App");

    assert!(matches!(result, Err(StoreError::Initialize { .. })));
}

#[test]
fn test_kinds_survive_the_json_document() {
    let temp = TempHive::new();
    {
        let writer = temp.store("App");
        assert!(writer.set_value("Blob", Some(&vec![1u8, 255]), ValueKind::Binary));
        assert!(writer.set_value("Lines", Some(&vec!["x", "y"]), ValueKind::MultiString));
        assert!(writer.set_value("Wide", Some(&-2i64), ValueKind::QWord));
    }

    let reader = temp.store("App");

    assert_eq!(reader.get_value("Blob", None), Some("01ff".to_string()));
    assert_eq!(reader.get_value("Lines", None), Some("x\ny".to_string()));
    assert_eq!(reader.get_typed_value::<i64>("Wide", None), Some(-2));
}
