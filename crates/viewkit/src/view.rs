//! Typed views.
//!
//! A [`View<T>`] is a merged [`Template`] bound to the type of value it renders.
//! The binding only exists at compile time: every render entry point accepts
//! exactly `&T`, so a view built for one data shape cannot be fed another.
//!
//! # Examples
//!
//! ```
//! use viewkit::{MemorySource, View};
//!
//! let source = MemorySource::new()
//!     .with("views/_layout.html", "<h1>{% block title %}{% endblock %}</h1>")
//!     .with("views/index.html", "{% block title %}{{ value }}{% endblock %}");
//!
//! let index: View<String> = View::new(&source, "views/index.html").unwrap();
//! let (html, result) = index.bytes(&"Home".to_string());
//! result.unwrap();
//! assert_eq!(html, b"<h1>Home</h1>");
//! ```

use std::error::Error as StdError;
use std::fmt;
use std::io::Write;
use std::marker::PhantomData;

use http::header::{HeaderValue, CONTENT_TYPE};
use serde::Serialize;
use tera::{Context, Tera};

use crate::error::Result;
use crate::resolver::{Resolver, Template};
use crate::source::ContentSource;

/// Name under which the rendered value is exposed to templates.
pub const VALUE_VAR: &str = "value";

/// Content type set by [`View::render`].
pub const HTML_CONTENT_TYPE: &str = "text/html";

/// A merged template bound to the value type `T` it renders.
///
/// Views are immutable after construction and can be rendered concurrently
/// from many threads.
pub struct View<T> {
    template: Template,
    value: PhantomData<fn(&T)>,
}

impl<T> View<T> {
    /// Loads `view_path` and its layouts into a fresh namespace.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn new(source: &dyn ContentSource, view_path: &str) -> Result<Self> {
        Resolver::default().load(source, view_path).map(Self::from_template)
    }

    /// Loads `view_path` and its layouts into `root`.
    ///
    /// # Errors
    ///
    /// See [`Resolver::resolve`].
    pub fn with_root(root: Tera, source: &dyn ContentSource, view_path: &str) -> Result<Self> {
        Resolver::default().view(root, source, view_path)
    }

    /// Wraps an already resolved template.
    pub const fn from_template(template: Template) -> Self {
        Self {
            template,
            value: PhantomData,
        }
    }

    /// Returns the wrapped template.
    pub const fn template(&self) -> &Template {
        &self.template
    }
}

impl<T: Serialize> View<T> {
    /// Executes the view with `value`, streaming output to `writer`.
    ///
    /// The engine's error is returned unchanged. Output produced before the
    /// failure may already have been written.
    pub fn execute(&self, writer: impl Write, value: &T) -> tera::Result<()> {
        let context = context_for(value)?;
        self.template.render_to(&context, writer)
    }

    /// Renders the view as a web page into the response body.
    ///
    /// Sets the `content-type` header to `text/html` before rendering. The
    /// status code is never changed: on failure the response keeps whatever
    /// status it already had, and the body may hold a partial page.
    pub fn render<B: Write>(&self, response: &mut http::Response<B>, value: &T) -> tera::Result<()> {
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static(HTML_CONTENT_TYPE));
        self.execute(response.body_mut(), value)
    }

    /// Renders the view into memory.
    ///
    /// Bytes written before a failure are returned alongside the error.
    pub fn bytes(&self, value: &T) -> (Vec<u8>, tera::Result<()>) {
        let mut buf = Vec::new();
        let result = self.execute(&mut buf, value);
        (buf, result)
    }
}

impl<T> fmt::Debug for View<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("template", &self.template.name())
            .field("value", &std::any::type_name::<T>())
            .finish()
    }
}

/// Returns the view, or terminates the process if loading failed.
///
/// Meant for start-up, where a view that cannot be loaded leaves nothing to
/// serve. The error and its causes are logged and printed to stderr, then the
/// process exits with status 1.
pub fn must<T>(result: Result<View<T>>) -> View<T> {
    match result {
        Ok(view) => view,
        Err(err) => {
            let report = error_chain(&err);
            tracing::error!(error = %report, "failed to load view");
            eprintln!("error: {report}");
            std::process::exit(1)
        }
    }
}

/// Builds the render context: the whole value as `value`, plus its fields at
/// the top level when it serializes to a map.
fn context_for<T: Serialize>(value: &T) -> tera::Result<Context> {
    let mut context = Context::new();
    context.try_insert(VALUE_VAR, value)?;
    if let Ok(fields) = Context::from_serialize(value) {
        context.extend(fields);
    }
    Ok(context)
}

fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !out.contains(&cause_msg) {
            out.push_str(": ");
            out.push_str(&cause_msg);
        }
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use std::io;

    use http::StatusCode;
    use serde::Serialize;

    use super::*;
    use crate::source::MemorySource;

    #[derive(Serialize)]
    struct Page {
        title: String,
        items: Vec<&'static str>,
    }

    fn pages() -> MemorySource {
        MemorySource::new()
            .with(
                "views/_layout.html",
                "<title>{% block title %}{% endblock %}</title>{% block body %}{% endblock %}",
            )
            .with(
                "views/list.html",
                "{% block title %}{{ title }}{% endblock %}\
                 {% block body %}{% for i in items %}[{{ i }}]{% endfor %}{% endblock %}",
            )
            .with("views/plain.html", "{% block title %}{{ value }}{% endblock %}")
            .with("views/broken.html", "{% block body %}{{ missing.field }}{% endblock %}")
    }

    #[test]
    fn test_struct_fields_are_top_level() {
        let view: View<Page> = View::new(&pages(), "views/list.html").unwrap();
        let page = Page {
            title: "Todo".to_string(),
            items: vec!["a", "b"],
        };

        let (html, result) = view.bytes(&page);
        result.unwrap();
        assert_eq!(String::from_utf8(html).unwrap(), "<title>Todo</title>[a][b]");
    }

    #[test]
    fn test_scalar_value_is_exposed_as_value() {
        let view: View<String> = View::new(&pages(), "views/plain.html").unwrap();

        let (html, result) = view.bytes(&"the index page".to_string());
        result.unwrap();
        assert_eq!(html, b"<title>the index page</title>");
    }

    #[test]
    fn test_output_is_escaped() {
        let view: View<String> = View::new(&pages(), "views/plain.html").unwrap();

        let (html, _) = view.bytes(&"<script>".to_string());
        assert_eq!(html, b"<title>&lt;script&gt;</title>");
    }

    #[test]
    fn test_renders_are_independent() {
        let view: View<String> = View::new(&pages(), "views/plain.html").unwrap();

        let (first, _) = view.bytes(&"one".to_string());
        let (second, _) = view.bytes(&"two".to_string());
        assert_eq!(first, b"<title>one</title>");
        assert_eq!(second, b"<title>two</title>");
    }

    #[test]
    fn test_execute_to_writer() {
        let view: View<String> = View::new(&pages(), "views/plain.html").unwrap();
        let mut out = io::Cursor::new(Vec::new());

        view.execute(&mut out, &"cursor".to_string()).unwrap();
        assert_eq!(out.into_inner(), b"<title>cursor</title>");
    }

    #[test]
    fn test_execution_error_is_returned() {
        let view: View<String> = View::new(&pages(), "views/broken.html").unwrap();

        let (_, result) = view.bytes(&"x".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_render_sets_content_type_and_keeps_status() {
        let view: View<String> = View::new(&pages(), "views/plain.html").unwrap();
        let mut response = http::Response::new(Vec::new());
        *response.status_mut() = StatusCode::CREATED;
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        view.render(&mut response, &"page".to_string()).unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let types: Vec<_> = response
            .headers()
            .get_all(CONTENT_TYPE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(types, vec!["text/html"]);
        assert_eq!(response.body(), b"<title>page</title>");
    }

    #[test]
    fn test_render_failure_keeps_default_status() {
        let view: View<String> = View::new(&pages(), "views/broken.html").unwrap();
        let mut response = http::Response::new(Vec::new());

        assert!(view.render(&mut response, &"x".to_string()).is_err());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[CONTENT_TYPE].to_str().unwrap(), "text/html");
    }

    #[test]
    fn test_with_root_uses_root_templates() {
        let mut root = Tera::default();
        root.add_raw_template("macros.html", "{% macro shout(s) %}{{ s | upper }}{% endmacro %}")
            .unwrap();
        let source = MemorySource::new().with(
            "loud.html",
            "{% import \"macros.html\" as m %}{{ m::shout(s=value) }}",
        );

        let view: View<String> = View::with_root(root, &source, "loud.html").unwrap();
        let (html, result) = view.bytes(&"hey".to_string());
        result.unwrap();
        assert_eq!(html, b"HEY");
    }

    #[test]
    fn test_view_is_send_and_sync() {
        fn assert_send_sync<V: Send + Sync>() {}
        assert_send_sync::<View<String>>();
        assert_send_sync::<View<std::rc::Rc<String>>>();
    }

    #[test]
    fn test_must_returns_loaded_view() {
        let view: View<String> = must(View::new(&pages(), "views/plain.html"));
        assert_eq!(view.template().name(), "views/plain.html");
    }

    #[test]
    fn test_error_chain_includes_causes() {
        let err = crate::Error::ReadView {
            path: "index.html".to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        let report = error_chain(&err);
        assert!(report.contains("\"index.html\""));
        assert!(report.contains("no such file"));
    }
}
