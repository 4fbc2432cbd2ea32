//! Layout resolution.
//!
//! The [`Resolver`] turns a view path such as `views/info/about.html` into a
//! single template namespace. It walks the view's ancestor directories from the
//! top down, merging the layout file found at each level, and parses the view
//! itself last.
//!
//! ## How Layouts Compose
//!
//! 1. Candidate layouts are `views/_layout.html`, then `views/info/_layout.html`.
//! 2. A level without a layout is skipped; any other read failure aborts.
//! 3. Each merged file is registered under its own path. If an earlier layout
//!    was merged and the file defines blocks, it implicitly extends that
//!    layout, unless it already starts with an `{% extends %}` tag of its own.
//!    A file without blocks stands alone, so its own output replaces the
//!    layouts' output.
//! 4. The view is merged last, so its blocks override every layout's blocks.
//!
//! ## Example
//!
//! ```text
//! {# views/_layout.html #}
//! <html><body>{% block content %}{% endblock %}</body></html>
//!
//! {# views/info/about.html #}
//! {% block content %}About {{ value }}{% endblock %}
//! ```
//!
//! Rendering `views/info/about.html` with `"us"` produces:
//! ```text
//! <html><body>About us</body></html>
//! ```

use std::borrow::Cow;
use std::fmt;
use std::io::{self, Write};

use tera::{Context, Tera};

use crate::error::{Error, Result};
use crate::settings::{Settings, DEFAULT_LAYOUT_NAME};
use crate::source::ContentSource;
use crate::view::View;

/// A merged template namespace together with the name of its entry template.
///
/// Produced by the [`Resolver`]; immutable once constructed.
pub struct Template {
    tera: Tera,
    name: String,
}

impl Template {
    /// Returns the name of the entry template, which is the normalized view path.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the underlying namespace.
    pub const fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Returns the names of all templates in the namespace.
    pub fn template_names(&self) -> impl Iterator<Item = &str> {
        self.tera.get_template_names()
    }

    /// Executes the entry template with `context`, streaming to `writer`.
    pub fn render_to(&self, context: &Context, writer: impl Write) -> tera::Result<()> {
        self.tera.render_to(&self.name, context, writer)
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("name", &self.name)
            .field("templates", &self.template_names().collect::<Vec<_>>())
            .finish()
    }
}

/// Discovers per-directory layouts and merges them with a view.
#[derive(Debug, Clone)]
pub struct Resolver {
    layout_name: String,
    autoescape: bool,
}

impl Default for Resolver {
    fn default() -> Self {
        Self {
            layout_name: DEFAULT_LAYOUT_NAME.to_string(),
            autoescape: true,
        }
    }
}

impl Resolver {
    /// Creates a resolver with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver from validated settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ImproperlyConfigured`] if the settings are invalid.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            layout_name: settings.layout_name.clone(),
            autoescape: settings.autoescape,
        })
    }

    /// Sets the layout file base name.
    #[must_use]
    pub fn with_layout_name(mut self, name: impl Into<String>) -> Self {
        self.layout_name = name.into();
        self
    }

    /// Sets whether namespaces created by this resolver escape HTML output.
    #[must_use]
    pub fn with_autoescape(mut self, enabled: bool) -> Self {
        self.autoescape = enabled;
        self
    }

    /// Returns the layout file base name.
    pub fn layout_name(&self) -> &str {
        &self.layout_name
    }

    /// Creates an empty namespace configured by this resolver.
    ///
    /// With autoescape on, every template is escaped whatever its file suffix.
    pub fn root(&self) -> Tera {
        let mut tera = Tera::default();
        if self.autoescape {
            tera.autoescape_on(vec![""]);
        } else {
            tera.autoescape_on(Vec::new());
        }
        tera
    }

    /// Returns the candidate layout paths for `view_path`, outermost first.
    ///
    /// Nothing is read. A view at the top of the source has no candidates.
    pub fn layout_paths(&self, view_path: &str) -> Vec<String> {
        let segments = segments(view_path);
        let dirs = segments.len().saturating_sub(1);
        (0..dirs)
            .map(|i| format!("{}/{}", segments[..=i].join("/"), self.layout_name))
            .collect()
    }

    /// Resolves `view_path` into a fresh namespace.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn load(&self, source: &dyn ContentSource, view_path: &str) -> Result<Template> {
        self.resolve(self.root(), source, view_path)
    }

    /// Merges the layouts of `view_path` and then the view itself into `root`.
    ///
    /// Templates already registered in `root` stay available (for
    /// `{% include %}`, macros or explicit `{% extends %}`), and keep the
    /// filters and functions registered on it.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyViewPath`] if the path has no segments.
    /// - [`Error::ReadLayout`] if a layout exists but cannot be read.
    /// - [`Error::ReadView`] if the view cannot be read.
    /// - [`Error::Parse`] if a layout or the view fails to parse.
    pub fn resolve(
        &self,
        mut root: Tera,
        source: &dyn ContentSource,
        view_path: &str,
    ) -> Result<Template> {
        let name = segments(view_path).join("/");
        if name.is_empty() {
            return Err(Error::EmptyViewPath);
        }

        let mut parent: Option<String> = None;
        for path in self.layout_paths(&name) {
            if path == name {
                continue;
            }
            let content = match source.read(&path) {
                Ok(content) => content,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    tracing::trace!(layout = %path, "no layout at this level");
                    continue;
                }
                Err(e) => return Err(Error::ReadLayout { path, source: e }),
            };
            merge(&mut root, &path, &content, parent.as_deref())?;
            tracing::debug!(layout = %path, "merged layout");
            parent = Some(path);
        }

        let content = source.read(&name).map_err(|e| Error::ReadView {
            path: name.clone(),
            source: e,
        })?;
        merge(&mut root, &name, &content, parent.as_deref())?;
        tracing::debug!(view = %name, layout = ?parent, "parsed view");

        Ok(Template { tera: root, name })
    }

    /// Resolves `view_path` into `root` and wraps the result in a typed view.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn view<T>(
        &self,
        root: Tera,
        source: &dyn ContentSource,
        view_path: &str,
    ) -> Result<View<T>> {
        self.resolve(root, source, view_path).map(View::from_template)
    }
}

/// Returns the candidate layout paths for `view_path` using the default
/// layout name.
pub fn layout_paths(view_path: &str) -> Vec<String> {
    Resolver::default().layout_paths(view_path)
}

/// Resolves `view_path` into a fresh namespace with the default resolver.
///
/// # Errors
///
/// See [`Resolver::resolve`].
pub fn load(source: &dyn ContentSource, view_path: &str) -> Result<Template> {
    Resolver::default().load(source, view_path)
}

/// Resolves `view_path` into `root` with the default resolver.
///
/// # Errors
///
/// See [`Resolver::resolve`].
pub fn load_with_root(root: Tera, source: &dyn ContentSource, view_path: &str) -> Result<Template> {
    Resolver::default().resolve(root, source, view_path)
}

/// Checks whether a template source starts with `{% extends %}`.
///
/// Returns the parent template name if it does.
pub fn find_extends(source: &str) -> Option<&str> {
    let trimmed = source.trim_start();
    let rest = trimmed
        .strip_prefix("{%-")
        .or_else(|| trimmed.strip_prefix("{%"))?;
    let end = rest.find("%}")?;
    let tag = rest[..end].trim_end_matches('-').trim();
    let name = tag.strip_prefix("extends")?.trim_start();
    let quote = name.chars().next().filter(|c| matches!(c, '"' | '\'' | '`'))?;
    let name = &name[1..];
    name.find(quote).map(|close| &name[..close])
}

/// Splits a view path into its non-empty segments.
fn segments(view_path: &str) -> Vec<&str> {
    view_path
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect()
}

/// Checks whether a template source contains a `{% block %}` tag.
pub fn defines_blocks(source: &str) -> bool {
    source.match_indices("{%").any(|(i, _)| {
        let rest = source[i + 2..].trim_start_matches('-').trim_start();
        rest.strip_prefix("block")
            .is_some_and(|after| after.starts_with(char::is_whitespace))
    })
}

/// Builds an `{% extends %}` tag for `parent`, quoted with a delimiter the
/// name does not contain.
fn extends_tag(parent: &str) -> Option<String> {
    ['`', '"', '\'']
        .into_iter()
        .find(|q| !parent.contains(*q))
        .map(|q| format!("{{% extends {q}{parent}{q} %}}"))
}

/// Parses `content` into `tera` under `path`.
///
/// When `parent` is given and `content` defines blocks without extending
/// anything itself, `content` extends `parent`.
fn merge(tera: &mut Tera, path: &str, content: &str, parent: Option<&str>) -> Result<()> {
    let parse_error = |source| Error::Parse {
        path: path.to_string(),
        source,
    };
    let content = match parent {
        Some(parent) if find_extends(content).is_none() && defines_blocks(content) => {
            let tag = extends_tag(parent).ok_or_else(|| {
                parse_error(tera::Error::msg(format!(
                    "layout path {parent:?} cannot be quoted in an extends tag"
                )))
            })?;
            Cow::Owned(format!("{tag}{content}"))
        }
        _ => Cow::Borrowed(content),
    };
    tera.add_raw_template(path, &content).map_err(parse_error)
}
