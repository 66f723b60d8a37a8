//! In-memory hive.
//!
//! Holds the container tree in process memory.  Cloning a [`MemoryHive`]
//! yields another handle to the same tree, so a test can keep one clone to
//! inspect what a store wrote through the other.

use std::sync::Arc;

use regkv_core::PLATFORM_LOCATION;

use super::tree::{self, Tree};
use crate::application::hive::{BackendError, Hive, NativeKey};

/// A hive that lives only as long as the process.
#[derive(Clone)]
pub struct MemoryHive {
    tree: Arc<Tree>,
    location: String,
}

impl MemoryHive {
    /// Creates an empty hive with the `Software` location.
    pub fn new() -> Self {
        Self::with_location(PLATFORM_LOCATION)
    }

    /// Creates an empty hive whose top-level location is `location`.
    pub fn with_location(location: impl Into<String>) -> Self {
        Self {
            tree: Arc::new(Tree::in_memory()),
            location: location.into(),
        }
    }
}

impl Default for MemoryHive {
    fn default() -> Self {
        Self::new()
    }
}

impl Hive for MemoryHive {
    fn open_location(&self) -> Result<Box<dyn NativeKey>, BackendError> {
        tree::open_location(&self.tree, &self.location)
    }

    fn describe(&self) -> String {
        format!("memory:{}", self.location)
    }
}
