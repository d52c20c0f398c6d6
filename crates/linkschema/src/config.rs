//! # Configuration
//!
//! Two layers live here:
//!
//! - [`Settings`]: the typed, file/env-loadable settings of an application,
//!   managed by [`confique`]. Loaded once at startup.
//! - [`ConfigStore`]: the free-form key/value store of the running
//!   application. It is seeded from [`Settings`] under upper-case keys and is
//!   what [`AppConfig`](crate::fields::AppConfig) fields read and write.
//!
//! The store is always handed to fields explicitly (through
//! [`App`](crate::App)); there is no process-wide "current application".
//!
//! ## Storage Hierarchy
//!
//! Settings are resolved in priority order:
//! 1. **Environment variables**: `LINKSCHEMA_SERVER_NAME`, `LINKSCHEMA_PREFERRED_URL_SCHEME`, etc.
//! 2. **Settings file**: a TOML file passed to [`Settings::load`].
//! 3. **Compiled defaults**: `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Store key | Default |
//! |-----|-----------|---------|
//! | `server_name` | `SERVER_NAME` | `localhost` |
//! | `preferred_url_scheme` | `PREFERRED_URL_SCHEME` | `http` |
//! | `application_root` | `APPLICATION_ROOT` | `/` |
//! | `jsonify_mimetype` | `JSONIFY_MIMETYPE` | `application/json` |
//! | `jsonify_prettyprint` | `JSONIFY_PRETTYPRINT_REGULAR` | `false` |

use std::path::Path;

use confique::Config;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Result;
use crate::routing::ServerInfo;

pub const SERVER_NAME: &str = "SERVER_NAME";
pub const PREFERRED_URL_SCHEME: &str = "PREFERRED_URL_SCHEME";
pub const APPLICATION_ROOT: &str = "APPLICATION_ROOT";
pub const JSONIFY_MIMETYPE: &str = "JSONIFY_MIMETYPE";
pub const JSONIFY_PRETTYPRINT_REGULAR: &str = "JSONIFY_PRETTYPRINT_REGULAR";

/// Application settings, optionally stored in a TOML file.
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Host (and optional port) used for absolute URLs.
    #[config(default = "localhost", env = "LINKSCHEMA_SERVER_NAME")]
    pub server_name: String,

    /// Scheme used for absolute URLs unless `_scheme` overrides it.
    #[config(default = "http", env = "LINKSCHEMA_PREFERRED_URL_SCHEME")]
    pub preferred_url_scheme: String,

    /// Path prefix the application is mounted under.
    #[config(default = "/", env = "LINKSCHEMA_APPLICATION_ROOT")]
    pub application_root: String,

    #[config(default = "application/json")]
    pub jsonify_mimetype: String,

    /// Indent JSON responses.
    #[config(default = false)]
    pub jsonify_prettyprint: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_name: "localhost".to_string(),
            preferred_url_scheme: "http".to_string(),
            application_root: "/".to_string(),
            jsonify_mimetype: "application/json".to_string(),
            jsonify_prettyprint: false,
        }
    }
}

impl Settings {
    /// Load settings from the environment, then `file` (if given and present),
    /// then compiled defaults.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut builder = Settings::builder().env();
        if let Some(path) = file {
            builder = builder.file(path);
        }
        Ok(builder.load()?)
    }
}

/// Key/value configuration of a running application.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigStore {
    entries: Map<String, Value>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let mut store = Self::new();
        store.set(SERVER_NAME, settings.server_name.clone());
        store.set(PREFERRED_URL_SCHEME, settings.preferred_url_scheme.clone());
        store.set(APPLICATION_ROOT, settings.application_root.clone());
        store.set(JSONIFY_MIMETYPE, settings.jsonify_mimetype.clone());
        store.set(JSONIFY_PRETTYPRINT_REGULAR, settings.jsonify_prettyprint);
        store
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Set a key, returning the previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        tracing::debug!(key = %key, "config value set");
        self.entries.insert(key, value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn update<K, V, I>(&mut self, entries: I)
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.set(key, value);
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Server information for binding a URL map.
    pub fn server_info(&self) -> ServerInfo {
        let defaults = ServerInfo::default();
        ServerInfo {
            server_name: self
                .get_str(SERVER_NAME)
                .map(str::to_string)
                .unwrap_or(defaults.server_name),
            scheme: self
                .get_str(PREFERRED_URL_SCHEME)
                .map(str::to_string)
                .unwrap_or(defaults.scheme),
            script_name: self
                .get_str(APPLICATION_ROOT)
                .map(str::to_string)
                .unwrap_or(defaults.script_name),
        }
    }
}
