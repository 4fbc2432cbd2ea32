//! Error types for view construction.
//!
//! [`Error`] covers everything that can go wrong while a view is being
//! assembled: reading layouts and the view from a content source, parsing them
//! into the template namespace, and loading settings. Render-time failures are
//! not part of this enum; they are surfaced as [`tera::Error`] unchanged.

use std::io;

use thiserror::Error;

/// The error type returned while resolving layouts and constructing views.
#[derive(Error, Debug)]
pub enum Error {
    /// The view path was empty once leading and trailing slashes were removed.
    #[error("view path is empty")]
    EmptyViewPath,

    /// A layout file exists but could not be read.
    ///
    /// A layout that does not exist is not an error and never produces this
    /// variant.
    #[error("read layout {path:?}: {source}")]
    ReadLayout {
        /// Path of the layout inside the content source.
        path: String,
        /// The underlying read failure.
        #[source]
        source: io::Error,
    },

    /// The view file could not be read, for any reason including absence.
    #[error("read view {path:?}: {source}")]
    ReadView {
        /// Path of the view inside the content source.
        path: String,
        /// The underlying read failure.
        #[source]
        source: io::Error,
    },

    /// A layout or the view failed to parse.
    #[error("parse {path:?}: {source}")]
    Parse {
        /// Path of the file that failed to parse.
        path: String,
        /// The engine's parse error.
        #[source]
        source: tera::Error,
    },

    /// Settings are invalid or could not be loaded.
    #[error("improperly configured: {0}")]
    ImproperlyConfigured(String),
}

impl Error {
    /// Returns the content-source path this error refers to, if any.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::ReadLayout { path, .. } | Self::ReadView { path, .. } | Self::Parse { path, .. } => {
                Some(path)
            }
            Self::EmptyViewPath | Self::ImproperlyConfigured(_) => None,
        }
    }
}

/// A convenience type alias for results of view construction.
pub type Result<T> = std::result::Result<T, Error>;
