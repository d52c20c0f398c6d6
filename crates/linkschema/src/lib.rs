//! # Linkschema Architecture
//!
//! Linkschema turns object graphs into hyperlinked JSON. Any `serde::Serialize`
//! value is dumped through a [`Schema`] whose fields read attributes, build
//! URLs from named endpoints, and pull values from the application config.
//! The load direction converts incoming values back and validates uploads.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Schema (schema.rs)                                         │
//! │  - Ordered named fields, dump / load / jsonify              │
//! │  - Collects per-field validation errors                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Fields (fields/) and Validators (validate/)                │
//! │  - UrlFor, Hyperlinks, AppConfig, File, HyperlinkRelated    │
//! │  - FileSize, FileType                                       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Collaborators                                              │
//! │  - resolve.rs: dotted path lookup on serde_json::Value      │
//! │  - routing/: URL rules, building and matching               │
//! │  - config.rs: Settings + ConfigStore                        │
//! │  - upload.rs: FileStorage and load-side Input               │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Context Passing
//!
//! There is no global "current application". Everything a field needs at
//! dump or load time lives in an [`App`], which callers pass explicitly.
//!
//! ## Example
//!
//! ```
//! use linkschema::fields::{Hyperlinks, LinkTree, Raw, UrlFor};
//! use linkschema::{App, Linkschema};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Author {
//!     id: u32,
//!     name: String,
//! }
//!
//! let mut app = App::new()
//!     .route("/author/<int:id>", "author")?
//!     .route("/authors/", "authors")?;
//! let ls = Linkschema::with_app(&mut app);
//!
//! let schema = ls
//!     .schema()
//!     .field("name", Raw::new())
//!     .field(
//!         "_links",
//!         Hyperlinks::new(LinkTree::map([
//!             ("self", UrlFor::new("author").value("id", "<id>")),
//!             ("collection", UrlFor::new("authors")),
//!         ])),
//!     );
//!
//! let author = Author { id: 123, name: "Fred Douglass".into() };
//! let response = schema.jsonify(&author, None, &app)?;
//! assert_eq!(
//!     response.body,
//!     r#"{"name":"Fred Douglass","_links":{"self":"/author/123","collection":"/authors/"}}"#
//! );
//! # Ok::<(), linkschema::Error>(())
//! ```

pub mod app;
pub mod config;
pub mod error;
pub mod fields;
pub mod resolve;
pub mod routing;
pub mod schema;
pub mod upload;
pub mod validate;

pub use app::{App, Linkschema, EXTENSION_NAME};
pub use config::{ConfigStore, Settings};
pub use error::{Error, Result, SchemaErrors, ValidationError};
pub use schema::{JsonResponse, Loaded, Schema};
pub use upload::{FileStorage, Input};
