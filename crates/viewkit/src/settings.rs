//! Settings for layout resolution.
//!
//! Settings can be built programmatically, loaded from a TOML file, and
//! adjusted through environment variables.
//!
//! ## Loading Order
//!
//! 1. Start with [`Settings::default`].
//! 2. Load from a TOML file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! | Env Var | Setting |
//! |---|---|
//! | `VIEWKIT_LAYOUT_NAME` | `layout_name` |
//! | `VIEWKIT_AUTOESCAPE` | `autoescape` |
//!
//! ## Examples
//!
//! ```
//! use viewkit::Settings;
//!
//! let settings = Settings::from_toml_str(r#"layout_name = "_base.html""#).unwrap();
//! assert_eq!(settings.layout_name, "_base.html");
//! assert!(settings.autoescape);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default base name of the per-directory layout file.
pub const DEFAULT_LAYOUT_NAME: &str = "_layout.html";

/// Configuration for a [`Resolver`](crate::Resolver).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base name of the layout file looked up in every ancestor directory.
    pub layout_name: String,
    /// Whether a freshly created template namespace escapes HTML output,
    /// for templates of any file suffix.
    ///
    /// Only applies to namespaces the resolver creates itself; a namespace
    /// supplied by the caller keeps its own escaping configuration.
    pub autoescape: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            layout_name: DEFAULT_LAYOUT_NAME.to_string(),
            autoescape: true,
        }
    }
}

impl Settings {
    /// Parses settings from a TOML string. Missing keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperlyConfigured`] if the TOML is malformed or the
    /// resulting settings are invalid.
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let settings: Self = toml::from_str(toml_str)
            .map_err(|e| Error::ImproperlyConfigured(format!("invalid settings TOML: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperlyConfigured`] if the file cannot be read or
    /// parsed.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::ImproperlyConfigured(format!("failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Applies `VIEWKIT_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperlyConfigured`] if an override has an invalid
    /// value.
    pub fn apply_env(self) -> Result<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(name) = lookup("VIEWKIT_LAYOUT_NAME") {
            self.layout_name = name;
        }
        if let Some(raw) = lookup("VIEWKIT_AUTOESCAPE") {
            self.autoescape = parse_bool(&raw).ok_or_else(|| {
                Error::ImproperlyConfigured(format!("VIEWKIT_AUTOESCAPE: invalid boolean {raw:?}"))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Checks that the settings describe a usable layout file name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperlyConfigured`] if the layout name is empty or
    /// contains a `/`.
    pub fn validate(&self) -> Result<()> {
        if self.layout_name.trim().is_empty() {
            return Err(Error::ImproperlyConfigured(
                "layout_name must not be empty".to_string(),
            ));
        }
        if self.layout_name.contains('/') {
            return Err(Error::ImproperlyConfigured(format!(
                "layout_name {:?} must be a file name, not a path",
                self.layout_name
            )));
        }
        Ok(())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
