//! # viewkit demo site
//!
//! Serves two pages built from layered views:
//!
//! - `/` renders `views/index.html` inside `views/_layout.html`
//! - `/info/about` renders `views/info/about.html`; there is no
//!   `views/info/_layout.html`, so only the top layout applies
//!
//! ## Running
//!
//! ```bash
//! cargo run --package viewkit-site -- --addr 127.0.0.1:8080
//! ```

mod pages;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Arg, ArgMatches, Command};
use viewkit::{DirSource, Resolver, Settings};

use pages::Pages;

fn cli() -> Command {
    Command::new("viewkit-site")
        .about("Demo site for layered viewkit views")
        .arg(
            Arg::new("addr")
                .long("addr")
                .default_value("127.0.0.1:8080")
                .help("Address to listen on"),
        )
        .arg(
            Arg::new("views")
                .long("views")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Directory containing views/ (defaults to the demo crate)"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_parser(clap::value_parser!(PathBuf))
                .help("TOML file with viewkit settings"),
        )
}

fn settings(matches: &ArgMatches) -> viewkit::Result<Settings> {
    let settings = match matches.get_one::<PathBuf>("config") {
        Some(path) => Settings::from_toml_file(path)?,
        None => Settings::default(),
    };
    settings.apply_env()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let matches = cli().get_matches();
    let settings = match settings(&matches) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::error!(error = %e, "invalid settings");
            std::process::exit(2);
        }
    };
    let resolver = match Resolver::from_settings(&settings) {
        Ok(resolver) => resolver,
        Err(e) => {
            tracing::error!(error = %e, "invalid settings");
            std::process::exit(2);
        }
    };

    let root = matches
        .get_one::<PathBuf>("views")
        .cloned()
        .unwrap_or_else(|| PathBuf::from(env!("CARGO_MANIFEST_DIR")));
    tracing::info!(root = %root.display(), layout = resolver.layout_name(), "loading views");
    let pages = Pages::load(&resolver, &DirSource::new(root));

    let addr = matches
        .get_one::<String>("addr")
        .map_or("127.0.0.1:8080", String::as_str);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(%addr, error = %e, "failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("ready on http://{addr}/");
    if let Err(e) = axum::serve(listener, pages::router(Arc::new(pages))).await {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
