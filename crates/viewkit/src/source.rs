//! Content sources.
//!
//! A content source hands out the raw text of layout and view files by their
//! slash-separated path. The [`ContentSource`] trait defines the interface,
//! with built-in implementations for a filesystem directory and an in-memory
//! map.
//!
//! Missing files must be reported with [`io::ErrorKind::NotFound`]: the
//! resolver treats that kind (and only that kind) as "no layout at this level".

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Reads template source text by path.
///
/// Implementations are read-only: they are never asked to write, list or
/// watch anything.
pub trait ContentSource: Send + Sync {
    /// Reads the full content of the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error of kind [`io::ErrorKind::NotFound`] if the file does
    /// not exist, or any other [`io::Error`] if it exists but cannot be read.
    fn read(&self, path: &str) -> io::Result<String>;
}

impl<S: ContentSource + ?Sized> ContentSource for &S {
    fn read(&self, path: &str) -> io::Result<String> {
        (**self).read(path)
    }
}

impl<S: ContentSource + ?Sized> ContentSource for Box<S> {
    fn read(&self, path: &str) -> io::Result<String> {
        (**self).read(path)
    }
}

impl<S: ContentSource + ?Sized> ContentSource for Arc<S> {
    fn read(&self, path: &str) -> io::Result<String> {
        (**self).read(path)
    }
}

/// Reads files relative to a root directory on the filesystem.
///
/// Paths must stay inside the root: absolute paths and `..` components are
/// rejected with [`io::ErrorKind::InvalidInput`].
#[derive(Debug, Clone)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    /// Creates a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> io::Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("path {path:?} escapes the source root"),
            ));
        }
        Ok(self.root.join(relative))
    }
}

impl ContentSource for DirSource {
    fn read(&self, path: &str) -> io::Result<String> {
        let full = self.resolve(path)?;
        std::fs::read_to_string(full)
    }
}

/// Serves files from an in-memory map of path to content.
///
/// Useful for tests and for applications that bundle their templates into the
/// binary (for example with `include_str!`).
#[derive(Debug, Default)]
pub struct MemorySource {
    files: RwLock<HashMap<String, String>>,
}

impl MemorySource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source from a map of paths to contents.
    pub fn from_map(files: HashMap<String, String>) -> Self {
        Self {
            files: RwLock::new(files),
        }
    }

    /// Adds or replaces a file.
    pub fn add(&self, path: impl Into<String>, content: impl Into<String>) {
        let mut files = self
            .files
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        files.insert(path.into(), content.into());
    }

    /// Adds or replaces a file, returning the source for chaining.
    #[must_use]
    pub fn with(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.add(path, content);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemorySource {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl ContentSource for MemorySource {
    fn read(&self, path: &str) -> io::Result<String> {
        let files = self
            .files
            .read()
            .map_err(|_| io::Error::other("memory source lock poisoned"))?;
        files.get(path).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{path:?} not found"))
        })
    }
}
