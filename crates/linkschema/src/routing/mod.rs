//! # URL Routing
//!
//! The link fields never format URLs themselves. They hand an endpoint name
//! and a flat parameter mapping to a [`Router`], which owns the URL patterns.
//!
//! ## Patterns
//!
//! Rules use angle-bracket variables with an optional converter:
//!
//! | Pattern | Matches | Builds from |
//! |---------|---------|-------------|
//! | `/books/<id>` | any segment without `/` | string, number, bool |
//! | `/author/<int:id>` | digits | integer or numeric string |
//! | `/price/<float:p>` | `1.5` | number |
//! | `/files/<path:p>` | rest of path, `/` included | string |
//! | `/pads/<uuid:id>` | hyphenated UUID | UUID string |
//!
//! ## Special Parameters
//!
//! These keys are consumed by the router and never reach the query string:
//!
//! - `_external`: build an absolute URL (scheme + server name).
//! - `_scheme`: override the scheme; only valid together with `_external`.
//! - `_anchor`: URL fragment.
//! - `_method`: accepted and ignored.
//!
//! Any other parameter the chosen rule doesn't consume is appended to the
//! query string. `null` parameters are dropped.

mod map;
mod rule;

pub use map::{MapAdapter, ServerInfo, UrlMap};
pub use rule::{Converter, Rule, RuleError};

use serde_json::{Map, Value};
use thiserror::Error;

/// Flat parameter mapping passed to [`Router::build_url`].
pub type Params = Map<String, Value>;

/// URL construction and matching, as seen by the link fields.
pub trait Router {
    /// Build the URL for `endpoint` from `params`.
    fn build_url(&self, endpoint: &str, params: &Params) -> Result<String, BuildError>;

    /// Find the endpoint and arguments for a URL path.
    fn match_path(&self, path: &str) -> Result<RouteMatch, MatchError>;
}

/// A successful [`Router::match_path`].
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch {
    pub endpoint: String,
    pub params: Params,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("Could not build url for endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("Could not build url for endpoint '{endpoint}'. Did you forget to specify values {missing:?}?")]
    MissingArguments {
        endpoint: String,
        missing: Vec<String>,
    },

    #[error("Could not build url for endpoint '{endpoint}': invalid value for '{argument}' ({reason})")]
    InvalidValue {
        endpoint: String,
        argument: String,
        reason: String,
    },

    #[error("When specifying '_scheme', '_external' must be true")]
    SchemeWithoutExternal,

    #[error("Invalid server for absolute URL: {0}")]
    InvalidServer(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("No rule matches '{0}'")]
    NotFound(String),
}
