//! URL fields.
//!
//! A [`UrlFor`] names an endpoint and a parameter template. Template values
//! written as `"<dotted.path>"` are pulled from the object being dumped;
//! anything else is passed to the router as-is.
//!
//! ```
//! use linkschema::fields::UrlFor;
//!
//! let url = UrlFor::new("author_get").value("id", "<id>");
//! let https_url = UrlFor::new("author_get")
//!     .value("id", "<id>")
//!     .value("_scheme", "https")
//!     .value("_external", true);
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::{Field, FieldOptions};
use crate::app::App;
use crate::error::{Error, Result};
use crate::resolve::{resolve, Resolved};
use crate::routing::{Params, Router};
use crate::upload::Input;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*<\s*(\S+?)\s*>\s*$").unwrap());

/// The dotted path inside a `<...>` placeholder, if `template` is one.
///
/// ```
/// use linkschema::fields::placeholder;
///
/// assert_eq!(placeholder(" < author.id > "), Some("author.id"));
/// assert_eq!(placeholder("author.id"), None);
/// ```
pub fn placeholder(template: &str) -> Option<&str> {
    PLACEHOLDER
        .captures(template)
        .and_then(|captures| captures.get(1))
        .map(|path| path.as_str())
}

/// One value of a [`ParamTemplate`].
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateValue {
    Literal(Value),
    /// Dotted path resolved against the dumped object.
    Attribute(String),
}

impl From<Value> for TemplateValue {
    fn from(value: Value) -> Self {
        match value.as_str().and_then(placeholder) {
            Some(path) => TemplateValue::Attribute(path.to_string()),
            None => TemplateValue::Literal(value),
        }
    }
}

/// Ordered parameter template of a link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParamTemplate {
    entries: Vec<(String, TemplateValue)>,
}

impl ParamTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name`, replacing an earlier entry in place.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = TemplateValue::from(value.into());
        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&TemplateValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TemplateValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Fill the template from `obj`.
    ///
    /// Returns `Ok(None)` as soon as a placeholder resolves to null, and fails
    /// if a placeholder path doesn't exist on `obj`.
    pub fn resolve(&self, obj: &Value) -> Result<Option<Params>> {
        let mut params = Params::new();
        for (name, value) in &self.entries {
            let resolved = match value {
                TemplateValue::Literal(literal) => literal.clone(),
                TemplateValue::Attribute(path) => match resolve(obj, path) {
                    Resolved::Found(found) => found.clone(),
                    Resolved::Null => {
                        tracing::trace!(path = %path, "link target is null");
                        return Ok(None);
                    }
                    Resolved::Missing => {
                        tracing::debug!(path = %path, "placeholder does not resolve");
                        return Err(Error::UnresolvedAttribute {
                            path: path.clone(),
                            object: obj.to_string(),
                        });
                    }
                },
            };
            params.insert(name.clone(), resolved);
        }
        Ok(Some(params))
    }
}

impl<K, V> FromIterator<(K, V)> for ParamTemplate
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut template = ParamTemplate::new();
        for (name, value) in iter {
            template.insert(name, value);
        }
        template
    }
}

/// Outputs the URL of an endpoint, filled from the dumped object.
#[derive(Debug, Default)]
pub struct UrlFor {
    endpoint: String,
    values: ParamTemplate,
    force_external: bool,
    options: FieldOptions,
}

impl UrlFor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Add one template entry; `"<path>"` strings are placeholders.
    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name, value);
        self
    }

    pub fn values(mut self, values: ParamTemplate) -> Self {
        self.values = values;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn template(&self) -> &ParamTemplate {
        &self.values
    }

    pub fn is_absolute(&self) -> bool {
        self.force_external
    }

    /// Build the URL for `obj`, or `None` when a placeholder is null.
    pub fn build(&self, obj: &Value, router: &dyn Router) -> Result<Option<String>> {
        let Some(mut params) = self.values.resolve(obj)? else {
            return Ok(None);
        };
        if self.force_external {
            params.insert("_external".to_string(), Value::Bool(true));
        }
        Ok(Some(router.build_url(&self.endpoint, &params)?))
    }

    pub(crate) fn render(&self, obj: &Value, router: &dyn Router) -> Result<Value> {
        Ok(self.build(obj, router)?.map_or(Value::Null, Value::String))
    }
}

impl Field for UrlFor {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn reads_attribute(&self) -> bool {
        false
    }

    fn format(&self, _value: Option<&Value>, _name: &str, obj: &Value, app: &App) -> Result<Value> {
        self.render(obj, &app.router())
    }

    fn convert(&self, input: Input, _app: &mut App) -> Result<Option<Input>> {
        Ok(Some(input))
    }
}

/// Outputs the absolute URL of an endpoint.
///
/// Always builds with `_external = true`, overriding the template.
#[derive(Debug)]
pub struct AbsoluteUrlFor(UrlFor);

impl AbsoluteUrlFor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        let mut inner = UrlFor::new(endpoint);
        inner.force_external = true;
        Self(inner)
    }

    pub fn value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self(self.0.value(name, value))
    }

    pub fn values(self, values: ParamTemplate) -> Self {
        Self(self.0.values(values))
    }

    pub fn build(&self, obj: &Value, router: &dyn Router) -> Result<Option<String>> {
        self.0.build(obj, router)
    }

    pub fn into_inner(self) -> UrlFor {
        self.0
    }
}

impl Field for AbsoluteUrlFor {
    fn options(&self) -> &FieldOptions {
        self.0.options()
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        self.0.options_mut()
    }

    fn reads_attribute(&self) -> bool {
        false
    }

    fn format(&self, value: Option<&Value>, name: &str, obj: &Value, app: &App) -> Result<Value> {
        self.0.format(value, name, obj, app)
    }

    fn convert(&self, input: Input, app: &mut App) -> Result<Option<Input>> {
        self.0.convert(input, app)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::BuildError;
    use serde_json::json;

    fn app() -> App {
        App::new()
            .route("/author/<int:id>", "author")
            .unwrap()
            .route("/authors/", "authors")
            .unwrap()
    }

    fn author() -> Value {
        json!({"id": 123, "name": "Fred Douglass"})
    }

    #[test]
    fn test_placeholder_ignores_whitespace() {
        for template in ["<id>", " <id>", "<id> ", "< id>", "<id  >", "< id >", "  <  id  >  "] {
            assert_eq!(placeholder(template), Some("id"), "{:?}", template);
        }
    }

    #[test]
    fn test_non_placeholders_are_literals() {
        assert_eq!(placeholder("id"), None);
        assert_eq!(placeholder("<id"), None);
        assert_eq!(placeholder("x <id>"), None);
        assert_eq!(
            TemplateValue::from(json!(5)),
            TemplateValue::Literal(json!(5))
        );
        assert_eq!(
            TemplateValue::from(json!("<author.id>")),
            TemplateValue::Attribute("author.id".into())
        );
    }

    #[test]
    fn test_empty_placeholder_is_literal() {
        assert_eq!(placeholder("<>"), None);
        assert_eq!(placeholder("< >"), None);
        assert_eq!(TemplateValue::from(json!("<>")), TemplateValue::Literal(json!("<>")));

        let app = app();
        let field = UrlFor::new("authors").value("q", "<>");
        let result = field.serialize("url", &author(), &app).unwrap();
        assert_eq!(result, Some(json!("/authors/?q=%3C%3E")));
    }

    #[test]
    fn test_url_field_pulls_placeholder_from_object() {
        let app = app();
        let field = UrlFor::new("author").value("id", "<id>");
        let result = field.serialize("url", &author(), &app).unwrap();
        assert_eq!(result, Some(json!("/author/123")));

        let zero = json!({"id": 0});
        assert_eq!(
            field.serialize("url", &zero, &app).unwrap(),
            Some(json!("/author/0"))
        );
    }

    #[test]
    fn test_literal_params_match_router_output() {
        let app = app();
        let field = UrlFor::new("author").value("id", 7).value("page", 2);
        let expected = app
            .url_for("author", [("id", json!(7)), ("page", json!(2))])
            .unwrap();
        assert_eq!(field.build(&author(), &app.router()).unwrap(), Some(expected));
    }

    #[test]
    fn test_invalid_attribute_fails() {
        let app = app();
        let field = UrlFor::new("author").value("id", "<not-an-attr>");
        let err = field.serialize("url", &author(), &app).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("'not-an-attr' is not a valid attribute of {}", author())
        );
    }

    #[test]
    fn test_nested_attribute_resolves() {
        let app = app();
        let book = json!({"id": 42, "author": author()});
        let field = UrlFor::new("author").value("id", "<author.id>");
        assert_eq!(
            field.serialize("url", &book, &app).unwrap(),
            Some(json!("/author/123"))
        );
    }

    #[test]
    fn test_null_attribute_yields_null_link() {
        let app = app();
        let book = json!({"id": 42, "author": null});
        for path in ["<author>", "<author.id>"] {
            let field = UrlFor::new("author").value("id", path);
            assert_eq!(field.serialize("url", &book, &app).unwrap(), Some(Value::Null));
        }
    }

    #[test]
    fn test_deserialization_is_a_noop() {
        let mut app = app();
        let field = UrlFor::new("author").value("id", "<not-an-attr>").allow_none(true);
        let loaded = field.deserialize(Input::Json(json!("foo")), &mut app).unwrap();
        assert_eq!(loaded.unwrap().as_json(), Some(&json!("foo")));
        let loaded = field.deserialize(Input::Json(Value::Null), &mut app).unwrap();
        assert!(loaded.unwrap().is_null());
    }

    #[test]
    fn test_unknown_endpoint_propagates_build_error() {
        let app = app();
        let err = UrlFor::new("badendpoint")
            .serialize("url", &author(), &app)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Build(BuildError::UnknownEndpoint(ref endpoint)) if endpoint == "badendpoint"
        ));
    }

    #[test]
    fn test_absolute_url_forces_external() {
        let app = app();
        let field = AbsoluteUrlFor::new("authors");
        assert_eq!(
            field.serialize("abs_url", &author(), &app).unwrap(),
            Some(json!("http://localhost/authors/"))
        );

        let overridden = AbsoluteUrlFor::new("author")
            .value("id", "<id>")
            .value("_external", false);
        assert_eq!(
            overridden.build(&author(), &app.router()).unwrap(),
            Some("http://localhost/author/123".to_string())
        );
    }

    #[test]
    fn test_absolute_url_deserialization_is_a_noop() {
        let mut app = app();
        let field = AbsoluteUrlFor::new("authors").allow_none(true);
        let loaded = field.deserialize(Input::Json(json!("foo")), &mut app).unwrap();
        assert_eq!(loaded.unwrap().as_json(), Some(&json!("foo")));
    }

    #[test]
    fn test_template_insert_replaces_in_place() {
        let template: ParamTemplate = [("id", json!("<id>")), ("page", json!(1))]
            .into_iter()
            .collect();
        let mut template = template;
        template.insert("id", 5);
        let names: Vec<_> = template.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["id", "page"]);
        assert_eq!(template.get("id"), Some(&TemplateValue::Literal(json!(5))));
    }
}
