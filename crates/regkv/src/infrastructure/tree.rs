//! Container tree shared by the in-process hives.
//!
//! The tree mirrors the native store: nested containers, each holding named
//! values, with names compared case-insensitively but displayed as first
//! written.  It lives either in memory or in a JSON file.
//!
//! A [`TreeKey`] is a path into the tree, not a pointer.  Every operation
//! walks from the root again, so a key whose container was deleted through
//! another handle fails with [`BackendError::KeyDeleted`], just as a native
//! handle does.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use regkv_core::domain::names::{self, SEPARATOR};
use regkv_core::NativeValue;
use serde::{Deserialize, Serialize};

use crate::application::hive::{BackendError, NativeKey};

/// An entry keyed by its folded name, remembering the display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Slot<T> {
    name: String,
    item: T,
}

/// One container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct Node {
    #[serde(default)]
    values: BTreeMap<String, Slot<NativeValue>>,
    #[serde(default)]
    children: BTreeMap<String, Slot<Node>>,
}

impl Node {
    fn walk(&self, segments: &[String]) -> Option<&Node> {
        segments.iter().try_fold(self, |node, segment| {
            node.children.get(&names::fold(segment)).map(|slot| &slot.item)
        })
    }

    fn walk_mut(&mut self, segments: &[String]) -> Option<&mut Node> {
        segments.iter().try_fold(self, |node, segment| {
            node.children
                .get_mut(&names::fold(segment))
                .map(|slot| &mut slot.item)
        })
    }

    fn child_name(&self, name: &str) -> Option<String> {
        self.children
            .get(&names::fold(name))
            .map(|slot| slot.name.clone())
    }

    /// Returns the display name of child `name`, creating it if absent.
    fn ensure_child(&mut self, name: &str) -> String {
        self.children
            .entry(names::fold(name))
            .or_insert_with(|| Slot {
                name: name.to_string(),
                item: Node::default(),
            })
            .name
            .clone()
    }
}

enum Storage {
    Memory(Mutex<Node>),
    File { path: PathBuf, lock: Mutex<()> },
}

/// A whole hive: the root node and where it is kept.
pub(crate) struct Tree {
    storage: Storage,
}

impl Tree {
    pub(crate) fn in_memory() -> Self {
        Self {
            storage: Storage::Memory(Mutex::new(Node::default())),
        }
    }

    pub(crate) fn in_file(path: PathBuf) -> Self {
        Self {
            storage: Storage::File {
                path,
                lock: Mutex::new(()),
            },
        }
    }

    /// Runs `f` against the current root node.
    fn read<R>(&self, f: impl FnOnce(&Node) -> Result<R, BackendError>) -> Result<R, BackendError> {
        match &self.storage {
            Storage::Memory(node) => f(&*node.lock().unwrap_or_else(PoisonError::into_inner)),
            Storage::File { path, lock } => {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                f(&load(path)?)
            }
        }
    }

    /// Runs `f` against the root node and persists the result.
    fn write<R>(
        &self,
        f: impl FnOnce(&mut Node) -> Result<R, BackendError>,
    ) -> Result<R, BackendError> {
        match &self.storage {
            Storage::Memory(node) => {
                f(&mut *node.lock().unwrap_or_else(PoisonError::into_inner))
            }
            Storage::File { path, lock } => {
                let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
                let mut root = load(path)?;
                let result = f(&mut root)?;
                save(path, &root)?;
                Ok(result)
            }
        }
    }
}

fn io_error(path: &Path, source: std::io::Error) -> BackendError {
    BackendError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// Loads the tree from `path`; a missing file is an empty hive.
fn load(path: &Path) -> Result<Node, BackendError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Node::default()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(BackendError::PermissionDenied {
                path: path.display().to_string(),
            })
        }
        Err(e) => return Err(io_error(path, e)),
    };

    serde_json::from_str(&text).map_err(|e| BackendError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Writes the tree to a sibling temp file, then renames it over `path`.
fn save(path: &Path, root: &Node) -> Result<(), BackendError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
    }

    let json = serde_json::to_string_pretty(root).map_err(|e| BackendError::Corrupt {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, json).map_err(|e| io_error(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| io_error(path, e))
}

/// Opens (creating if absent) the top-level container `location`.
pub(crate) fn open_location(
    tree: &Arc<Tree>,
    location: &str,
) -> Result<Box<dyn NativeKey>, BackendError> {
    let root = TreeKey {
        tree: Arc::clone(tree),
        segments: Vec::new(),
    };
    root.create_subkey(location)
}

/// A path into a [`Tree`].
pub(crate) struct TreeKey {
    tree: Arc<Tree>,
    segments: Vec<String>,
}

impl TreeKey {
    fn child(&self, display_name: String) -> Box<dyn NativeKey> {
        let mut segments = self.segments.clone();
        segments.push(display_name);
        Box::new(TreeKey {
            tree: Arc::clone(&self.tree),
            segments,
        })
    }

    fn deleted(&self) -> BackendError {
        BackendError::KeyDeleted { path: self.path() }
    }

    fn with_node<R>(&self, f: impl FnOnce(&Node) -> R) -> Result<R, BackendError> {
        self.tree.read(|root| root.walk(&self.segments).map(f).ok_or_else(|| self.deleted()))
    }

    fn with_node_mut<R>(&self, f: impl FnOnce(&mut Node) -> R) -> Result<R, BackendError> {
        self.tree.write(|root| {
            root.walk_mut(&self.segments)
                .map(f)
                .ok_or_else(|| self.deleted())
        })
    }
}

impl NativeKey for TreeKey {
    fn path(&self) -> String {
        self.segments.join(&*SEPARATOR.to_string())
    }

    fn create_subkey(&self, name: &str) -> Result<Box<dyn NativeKey>, BackendError> {
        // Skip the write when the child exists so file hives are not rewritten
        // by every read-or-create.
        if let Some(existing) = self.with_node(|node| node.child_name(name))? {
            return Ok(self.child(existing));
        }
        let display = self.with_node_mut(|node| node.ensure_child(name))?;
        Ok(self.child(display))
    }

    fn open_subkey(&self, name: &str) -> Result<Option<Box<dyn NativeKey>>, BackendError> {
        Ok(self
            .with_node(|node| node.child_name(name))?
            .map(|display| self.child(display)))
    }

    fn get_value(&self, name: &str) -> Result<Option<NativeValue>, BackendError> {
        self.with_node(|node| {
            node.values
                .get(&names::fold(name))
                .map(|slot| slot.item.clone())
        })
    }

    fn set_value(&self, name: &str, value: &NativeValue) -> Result<(), BackendError> {
        self.with_node_mut(|node| {
            node.values
                .entry(names::fold(name))
                .and_modify(|slot| slot.item = value.clone())
                .or_insert_with(|| Slot {
                    name: name.to_string(),
                    item: value.clone(),
                });
        })
    }

    fn delete_value(&self, name: &str) -> Result<bool, BackendError> {
        if !self.with_node(|node| node.values.contains_key(&names::fold(name)))? {
            return Ok(false);
        }
        self.with_node_mut(|node| node.values.remove(&names::fold(name)).is_some())
    }

    fn delete_subkey_tree(&self, name: &str) -> Result<bool, BackendError> {
        if self.with_node(|node| node.child_name(name))?.is_none() {
            return Ok(false);
        }
        self.with_node_mut(|node| node.children.remove(&names::fold(name)).is_some())
    }

    fn value_names(&self) -> Result<Vec<String>, BackendError> {
        self.with_node(|node| node.values.values().map(|slot| slot.name.clone()).collect())
    }

    fn subkey_names(&self) -> Result<Vec<String>, BackendError> {
        self.with_node(|node| node.children.values().map(|slot| slot.name.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_location() -> Box<dyn NativeKey> {
        open_location(&Arc::new(Tree::in_memory()), "Software").expect("memory location opens")
    }

    #[test]
    fn test_child_keeps_first_display_name() {
        let location = memory_location();

        location.create_subkey("MyApp").unwrap();
        let again = location.create_subkey("MYAPP").unwrap();

        assert_eq!(again.path(), r"Software\MyApp");
        assert_eq!(location.subkey_names().unwrap(), vec!["MyApp".to_string()]);
    }

    #[test]
    fn test_value_names_are_case_insensitive() {
        let location = memory_location();

        location
            .set_value("Timeout", &NativeValue::DWord(30))
            .unwrap();
        location
            .set_value("TIMEOUT", &NativeValue::DWord(45))
            .unwrap();

        assert_eq!(
            location.get_value("timeout").unwrap(),
            Some(NativeValue::DWord(45))
        );
        assert_eq!(location.value_names().unwrap(), vec!["Timeout".to_string()]);
    }

    #[test]
    fn test_handle_to_deleted_container_reports_key_deleted() {
        // Arrange
        let location = memory_location();
        let app = location.create_subkey("App").unwrap();
        let settings = app.create_subkey("Settings").unwrap();

        // Act
        assert!(location.delete_subkey_tree("App").unwrap());
        let result = settings.get_value("Timeout");

        // Assert
        assert!(matches!(result, Err(BackendError::KeyDeleted { path }) if path == r"Software\App\Settings"));
    }

    #[test]
    fn test_delete_missing_entries_reports_false() {
        let location = memory_location();

        assert!(!location.delete_value("Nope").unwrap());
        assert!(!location.delete_subkey_tree("Nope").unwrap());
        assert!(location.open_subkey("Nope").unwrap().is_none());
    }

    #[test]
    fn test_node_json_layout_round_trips() {
        let mut root = Node::default();
        let name = root.ensure_child("Software");
        root.walk_mut(&[name])
            .unwrap()
            .values
            .insert(
                "greeting".to_string(),
                Slot {
                    name: "Greeting".to_string(),
                    item: NativeValue::String("hi".to_string()),
                },
            );

        let json = serde_json::to_string(&root).unwrap();
        let back: Node = serde_json::from_str(&json).unwrap();

        assert_eq!(back, root);
        assert!(json.contains(r#""kind":"string""#));
    }
}
