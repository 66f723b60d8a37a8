//! JSON-file hive.
//!
//! Persists the container tree as a JSON document, for platforms without a
//! native registry and for settings that must survive the process.
//!
//! Every operation reloads the file, so two stores (or two processes) over the
//! same path see each other's writes.  Every mutation rewrites the whole file
//! through a temp file and a rename, so a crash leaves either the old or the
//! new document, never half of one.  A missing file is an empty hive; a file
//! that is not a valid document makes every operation fail with
//! [`BackendError::Corrupt`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use regkv_core::PLATFORM_LOCATION;

use super::tree::{self, Tree};
use crate::application::hive::{BackendError, Hive, NativeKey};

/// A hive stored in a JSON file.
#[derive(Clone)]
pub struct FileHive {
    path: PathBuf,
    tree: Arc<Tree>,
    location: String,
}

impl FileHive {
    /// Opens the hive at `path`.  The file is created on the first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            tree: Arc::new(Tree::in_file(path.clone())),
            path,
            location: PLATFORM_LOCATION.to_string(),
        }
    }

    /// Uses `location` instead of `Software` as the top-level container.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Hive for FileHive {
    fn open_location(&self) -> Result<Box<dyn NativeKey>, BackendError> {
        tree::open_location(&self.tree, &self.location)
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
