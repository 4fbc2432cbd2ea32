//! Page views and routes of the demo site.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use viewkit::{must, ContentSource, Resolver, View};

/// The views served by the site, loaded once at start-up.
#[derive(Debug)]
pub struct Pages {
    index: View<String>,
    about: View<String>,
}

impl Pages {
    /// Loads every page, terminating the process if one cannot be loaded.
    pub fn load(resolver: &Resolver, source: &dyn ContentSource) -> Self {
        Self {
            index: must(resolver.view(resolver.root(), source, "views/index.html")),
            about: must(resolver.view(resolver.root(), source, "views/info/about.html")),
        }
    }
}

/// Builds the router serving `/` and `/info/about`.
pub fn router(pages: Arc<Pages>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/info/about", get(about))
        .with_state(pages)
}

async fn index(State(pages): State<Arc<Pages>>) -> Response {
    page(&pages.index, "the index page")
}

async fn about(State(pages): State<Arc<Pages>>) -> Response {
    page(&pages.about, "made by viewkit")
}

/// Renders `view` into a fresh response. Failures are logged; the status code
/// stays whatever the response already had.
fn page(view: &View<String>, value: &str) -> Response {
    let mut response = axum::http::Response::new(Vec::new());
    if let Err(e) = view.render(&mut response, &value.to_string()) {
        tracing::warn!(view = view.template().name(), error = %e, "render failed");
    }
    response.map(Body::from)
}
