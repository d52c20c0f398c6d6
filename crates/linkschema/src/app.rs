//! # Application Context
//!
//! [`App`] bundles what the fields need at dump and load time: the config
//! store and the URL map. It is always passed explicitly; nothing here is
//! global or thread-local.
//!
//! [`Linkschema`] is the extension object. It can be created before the
//! application exists and attached later:
//!
//! ```
//! use linkschema::{App, Linkschema, EXTENSION_NAME};
//!
//! let ls = Linkschema::new();
//! let mut app = App::new();
//! ls.init_app(&mut app);
//! assert!(app.has_extension(EXTENSION_NAME));
//! ```

use std::collections::BTreeSet;

use serde_json::Value;

use crate::config::{ConfigStore, Settings};
use crate::error::Result;
use crate::routing::{MapAdapter, Params, Router, UrlMap};
use crate::schema::Schema;

/// Name under which [`Linkschema`] registers itself.
pub const EXTENSION_NAME: &str = "linkschema";

#[derive(Debug, Clone)]
pub struct App {
    pub config: ConfigStore,
    url_map: UrlMap,
    extensions: BTreeSet<String>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// An application with default settings and no routes.
    pub fn new() -> Self {
        Self::with_settings(&Settings::default())
    }

    pub fn with_settings(settings: &Settings) -> Self {
        Self {
            config: ConfigStore::from_settings(settings),
            url_map: UrlMap::new(),
            extensions: BTreeSet::new(),
        }
    }

    /// Add a route, builder style.
    pub fn route(mut self, pattern: &str, endpoint: impl Into<String>) -> Result<Self> {
        self.add_url_rule(pattern, endpoint)?;
        Ok(self)
    }

    pub fn add_url_rule(&mut self, pattern: &str, endpoint: impl Into<String>) -> Result<()> {
        Ok(self.url_map.add(pattern, endpoint)?)
    }

    pub fn url_map(&self) -> &UrlMap {
        &self.url_map
    }

    /// The URL map bound to the server settings currently in the config store.
    pub fn router(&self) -> MapAdapter<'_> {
        self.url_map.bind(self.config.server_info())
    }

    /// Build a URL for `endpoint`. Accepts the same special parameters as
    /// [`Router::build_url`].
    pub fn url_for<K, V, I>(&self, endpoint: &str, params: I) -> Result<String>
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let params: Params = params
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Ok(self.router().build_url(endpoint, &params)?)
    }

    pub fn register_extension(&mut self, name: impl Into<String>) -> bool {
        self.extensions.insert(name.into())
    }

    pub fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }

    pub fn extensions(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(String::as_str)
    }
}

/// The extension object. Stateless apart from registration, so a single
/// instance can be attached to any number of applications.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linkschema;

impl Linkschema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create and immediately attach to `app`.
    pub fn with_app(app: &mut App) -> Self {
        let ls = Self::new();
        ls.init_app(app);
        ls
    }

    pub fn init_app(&self, app: &mut App) {
        if app.register_extension(EXTENSION_NAME) {
            tracing::debug!(extension = EXTENSION_NAME, "extension registered");
        }
    }

    /// A fresh, empty schema.
    pub fn schema(&self) -> Schema {
        Schema::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SERVER_NAME;
    use crate::error::Error;
    use crate::routing::BuildError;
    use serde_json::json;

    fn app() -> App {
        App::new()
            .route("/author/<int:id>", "author")
            .unwrap()
            .route("/authors/", "authors")
            .unwrap()
    }

    #[test]
    fn test_url_for_builds_relative_urls() {
        let app = app();
        assert_eq!(app.url_for("author", [("id", json!(1))]).unwrap(), "/author/1");
        assert_eq!(
            app.url_for("authors", [("page", json!(2))]).unwrap(),
            "/authors/?page=2"
        );
    }

    #[test]
    fn test_router_follows_config_changes() {
        let mut app = app();
        app.config.set(SERVER_NAME, "example.org:8080");
        let url = app
            .url_for("author", [("id", json!(1)), ("_external", json!(true))])
            .unwrap();
        assert_eq!(url, "http://example.org:8080/author/1");
    }

    #[test]
    fn test_settings_seed_the_store() {
        let settings = Settings {
            preferred_url_scheme: "https".to_string(),
            ..Settings::default()
        };
        let app = App::with_settings(&settings).route("/authors/", "authors").unwrap();
        let url = app.url_for("authors", [("_external", true)]).unwrap();
        assert_eq!(url, "https://localhost/authors/");
    }

    #[test]
    fn test_unknown_endpoint_is_a_build_error() {
        let err = app().url_for("nope", Vec::<(String, Value)>::new()).unwrap_err();
        assert!(matches!(err, Error::Build(BuildError::UnknownEndpoint(_))));
    }

    #[test]
    fn test_invalid_rule_is_rejected() {
        let err = App::new().route("no-slash", "x").unwrap_err();
        assert!(matches!(err, Error::Rule(_)));
    }

    #[test]
    fn test_init_app_registers_extension() {
        let mut app = App::new();
        assert!(!app.has_extension(EXTENSION_NAME));
        let ls = Linkschema::with_app(&mut app);
        assert!(app.has_extension(EXTENSION_NAME));

        let mut other = App::new();
        ls.init_app(&mut other);
        ls.init_app(&mut other);
        assert_eq!(other.extensions().collect::<Vec<_>>(), vec![EXTENSION_NAME]);
    }

    #[test]
    fn test_schema_factory_returns_empty_schema() {
        assert_eq!(Linkschema::new().schema().field_names().count(), 0);
    }
}
