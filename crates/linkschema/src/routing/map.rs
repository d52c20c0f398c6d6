use serde_json::Value;
use url::form_urlencoded;
use url::{Position, Url};

use super::{BuildError, MatchError, Params, RouteMatch, Router, Rule, RuleError};

/// Parameters the router consumes itself.
const SPECIAL_PARAMS: &[&str] = &["_external", "_scheme", "_anchor", "_method"];

/// Ordered collection of URL rules.
///
/// Rules are tried in the order they were added, both when building and
/// when matching.
#[derive(Debug, Clone, Default)]
pub struct UrlMap {
    rules: Vec<Rule>,
}

impl UrlMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, pattern: &str, endpoint: impl Into<String>) -> Result<(), RuleError> {
        let rule = Rule::new(pattern, endpoint)?;
        tracing::trace!(pattern = rule.pattern(), endpoint = rule.endpoint(), "added url rule");
        self.rules.push(rule);
        Ok(())
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn has_endpoint(&self, endpoint: &str) -> bool {
        self.rules.iter().any(|rule| rule.endpoint() == endpoint)
    }

    /// Bind the map to a server so it can build absolute URLs.
    pub fn bind(&self, server: ServerInfo) -> MapAdapter<'_> {
        MapAdapter { map: self, server }
    }
}

/// Where the application is served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub server_name: String,
    pub scheme: String,
    /// Path prefix the application is mounted under (`/` for the root).
    pub script_name: String,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            server_name: "localhost".to_string(),
            scheme: "http".to_string(),
            script_name: "/".to_string(),
        }
    }
}

impl ServerInfo {
    fn script_root(&self) -> &str {
        self.script_name.trim_end_matches('/')
    }
}

/// A [`UrlMap`] bound to a [`ServerInfo`].
#[derive(Debug, Clone)]
pub struct MapAdapter<'a> {
    map: &'a UrlMap,
    server: ServerInfo,
}

impl MapAdapter<'_> {
    pub fn server(&self) -> &ServerInfo {
        &self.server
    }

    fn base_url(&self, scheme: &str) -> Result<Url, BuildError> {
        let base = format!("{}://{}", scheme, self.server.server_name);
        Url::parse(&base).map_err(|e| BuildError::InvalidServer(format!("{}: {}", base, e)))
    }
}

impl Router for MapAdapter<'_> {
    fn build_url(&self, endpoint: &str, params: &Params) -> Result<String, BuildError> {
        let external = params.get("_external").is_some_and(is_truthy);
        let scheme = match params.get("_scheme").and_then(Value::as_str) {
            Some(scheme) if !external => {
                tracing::debug!(endpoint, scheme, "_scheme given without _external");
                return Err(BuildError::SchemeWithoutExternal);
            }
            Some(scheme) => scheme,
            None => self.server.scheme.as_str(),
        };
        let anchor = params.get("_anchor").and_then(|value| match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        });

        let candidates: Vec<&Rule> = self
            .map
            .rules
            .iter()
            .filter(|rule| rule.endpoint() == endpoint)
            .collect();
        let Some(first) = candidates.first() else {
            return Err(BuildError::UnknownEndpoint(endpoint.to_string()));
        };
        let Some(rule) = candidates
            .iter()
            .find(|rule| rule.missing_arguments(params).is_empty())
        else {
            return Err(BuildError::MissingArguments {
                endpoint: endpoint.to_string(),
                missing: first.missing_arguments(params),
            });
        };

        let path = rule
            .build_path(params)
            .map_err(|(argument, reason)| BuildError::InvalidValue {
                endpoint: endpoint.to_string(),
                argument,
                reason,
            })?;

        let mut relative = format!("{}{}", self.server.script_root(), path);
        let query = query_string(params, rule.arguments());
        if !query.is_empty() {
            relative.push('?');
            relative.push_str(&query);
        }
        if let Some(anchor) = anchor {
            relative.push('#');
            relative.push_str(&urlencoding::encode(&anchor));
        }

        // Never reparsed, so encoded dot segments survive.
        let built = if external {
            let base = self.base_url(scheme)?;
            format!("{}{}", &base[..Position::BeforePath], relative)
        } else {
            relative
        };
        tracing::debug!(endpoint, url = %built, external, "built url");
        Ok(built)
    }

    fn match_path(&self, path: &str) -> Result<RouteMatch, MatchError> {
        let script_root = self.server.script_root();
        let local = path
            .strip_prefix(script_root)
            .filter(|rest| rest.starts_with('/'))
            .unwrap_or(path);
        let local = local.split(['?', '#']).next().unwrap_or(local);

        for rule in &self.map.rules {
            if let Some(params) = rule.match_path(local) {
                tracing::trace!(path, endpoint = rule.endpoint(), "matched url");
                return Ok(RouteMatch {
                    endpoint: rule.endpoint().to_string(),
                    params,
                });
            }
        }
        Err(MatchError::NotFound(path.to_string()))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn query_string(params: &Params, consumed: &[String]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        if SPECIAL_PARAMS.contains(&key.as_str()) || consumed.contains(key) {
            continue;
        }
        match value {
            Value::Null => {}
            Value::Array(items) => {
                for item in items.iter().filter(|item| !item.is_null()) {
                    serializer.append_pair(key, &query_value(item));
                }
            }
            other => {
                serializer.append_pair(key, &query_value(other));
            }
        }
    }
    serializer.finish()
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
