//! # viewkit
//!
//! Layered views on top of [Tera](https://keats.github.io/tera/). A view file
//! such as `views/info/about.html` is merged with the optional `_layout.html`
//! found in each of its ancestor directories, outermost first, and the result
//! is wrapped in a [`View<T>`] that only renders values of type `T`.
//!
//! ```
//! use viewkit::{must, MemorySource, View};
//!
//! let source = MemorySource::new()
//!     .with("views/_layout.html", "<body>{% block content %}{% endblock %}</body>")
//!     .with("views/info/about.html", "{% block content %}made by {{ value }}{% endblock %}");
//!
//! let about: View<String> = must(View::new(&source, "views/info/about.html"));
//!
//! let mut response = viewkit::http::Response::new(Vec::new());
//! about.render(&mut response, &"us".to_string()).unwrap();
//! assert_eq!(response.headers()["content-type"].to_str().unwrap(), "text/html");
//! assert_eq!(response.body(), b"<body>made by us</body>");
//! ```

pub mod error;
pub mod resolver;
pub mod settings;
pub mod source;
pub mod view;

pub use error::{Error, Result};
pub use resolver::{layout_paths, load, load_with_root, Resolver, Template};
pub use settings::{Settings, DEFAULT_LAYOUT_NAME};
pub use source::{ContentSource, DirSource, MemorySource};
pub use view::{must, View};

pub use http;
pub use tera;
