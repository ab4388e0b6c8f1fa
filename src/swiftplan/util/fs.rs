use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::trace;

use crate::util::errors::PlanResult;

/// The narrow filesystem surface plan construction needs: reading source
/// files and artifact manifests, probing for umbrella headers, and writing
/// small synthesized files (module maps, link-file lists, output file
/// maps, resource accessors).
pub trait FileSystem {
    fn read_to_string(&self, path: &Path) -> PlanResult<String>;

    fn exists(&self, path: &Path) -> bool;

    /// Write `contents` to `path`, creating parent directories. Writing
    /// bytes identical to an existing file must be a no-op that leaves the
    /// file's timestamps untouched.
    fn write(&self, path: &Path, contents: &str) -> PlanResult<()>;
}

/// The local disk.
#[derive(Debug, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn read_to_string(&self, path: &Path) -> PlanResult<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read `{}`", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn write(&self, path: &Path, contents: &str) -> PlanResult<()> {
        if let Ok(existing) = fs::read_to_string(path) {
            if existing == contents {
                trace!("unchanged: {}", path.display());
                return Ok(());
            }
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create `{}`", parent.display()))?;
        }
        fs::write(path, contents).with_context(|| format!("failed to write `{}`", path.display()))
    }
}

/// An in-memory filesystem for tests and dry runs.
#[derive(Debug, Default)]
pub struct InMemoryFileSystem {
    files: Mutex<BTreeMap<PathBuf, String>>,
}

impl InMemoryFileSystem {
    pub fn new() -> InMemoryFileSystem {
        InMemoryFileSystem::default()
    }

    pub fn add_file(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files
            .lock()
            .unwrap()
            .insert(path.into(), contents.into());
    }

    /// The current contents of `path`, if it has been written or seeded.
    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.lock().unwrap().get(path).cloned()
    }

    /// All paths written so far, in sorted order.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

impl FileSystem for InMemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> PlanResult<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::format_err!("failed to read `{}`: no such file", path.display()))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.lock().unwrap().contains_key(path)
    }

    fn write(&self, path: &Path, contents: &str) -> PlanResult<()> {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }
}
