use serde_json::Value;

use super::{expect_json, Field, FieldOptions};
use crate::app::App;
use crate::error::{Error, Result, ValidationError};
use crate::resolve::resolve;
use crate::routing::{Params, Router};
use crate::upload::Input;

/// A reference to another object, represented by the URL of that object
/// instead of its key.
///
/// On dump the related object's key (`primary_key`, default `id`) is bound
/// to the endpoint's `url_key` argument. On load the URL is matched back to
/// the endpoint and the key is returned.
#[derive(Debug)]
pub struct HyperlinkRelated {
    endpoint: String,
    url_key: String,
    primary_key: String,
    external: bool,
    options: FieldOptions,
}

impl HyperlinkRelated {
    const INVALID: &'static str = "Not a valid URL.";

    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            url_key: "id".to_string(),
            primary_key: "id".to_string(),
            external: false,
            options: FieldOptions::default(),
        }
    }

    /// URL argument that carries the key.
    pub fn url_key(mut self, key: impl Into<String>) -> Self {
        self.url_key = key.into();
        self
    }

    /// Attribute of the related object holding its key.
    pub fn primary_key(mut self, path: impl Into<String>) -> Self {
        self.primary_key = path.into();
        self
    }

    /// Produce and accept absolute URLs.
    pub fn external(mut self, external: bool) -> Self {
        self.external = external;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn related_key(&self, related: &Value) -> Result<Value> {
        if !related.is_object() {
            return Ok(related.clone());
        }
        match resolve(related, &self.primary_key).value() {
            Some(key) => Ok(key.clone()),
            None => Err(Error::UnresolvedAttribute {
                path: self.primary_key.clone(),
                object: related.to_string(),
            }),
        }
    }

    fn key_from_url(&self, url: &str, router: &dyn Router) -> std::result::Result<Value, ValidationError> {
        let path = if self.external {
            ::url::Url::parse(url)
                .map_err(|_| ValidationError::new(Self::INVALID))?
                .path()
                .to_string()
        } else {
            url.to_string()
        };

        let matched = router
            .match_path(&path)
            .map_err(|err| ValidationError::new(err.to_string()))?;
        if matched.endpoint != self.endpoint {
            return Err(ValidationError::new(format!(
                "Parsed endpoint \"{}\" from URL \"{}\"; expected \"{}\"",
                matched.endpoint, path, self.endpoint
            )));
        }
        match matched.params.get(&self.url_key) {
            Some(key) => Ok(key.clone()),
            None => Err(ValidationError::new(format!(
                "URL pattern \"{}\" not found in {}",
                self.url_key,
                Value::Object(matched.params.clone())
            ))),
        }
    }
}

impl Field for HyperlinkRelated {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn format(&self, value: Option<&Value>, _name: &str, _obj: &Value, app: &App) -> Result<Value> {
        let Some(related) = value else {
            return Ok(Value::Null);
        };
        let mut params = Params::new();
        params.insert(self.url_key.clone(), self.related_key(related)?);
        params.insert("_external".to_string(), Value::Bool(self.external));
        let url = app.router().build_url(&self.endpoint, &params)?;
        Ok(Value::String(url))
    }

    fn convert(&self, input: Input, app: &mut App) -> Result<Option<Input>> {
        let url = match expect_json(input, Self::INVALID)? {
            Value::String(url) => url,
            _ => return Err(ValidationError::new(Self::INVALID).into()),
        };
        let key = self.key_from_url(&url, &app.router())?;
        tracing::debug!(endpoint = %self.endpoint, url = %url, "resolved related key");
        Ok(Some(Input::Json(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn app() -> App {
        App::new()
            .route("/author/<int:id>", "author")
            .unwrap()
            .route("/books/<id>", "book")
            .unwrap()
            .route("/authors/", "authors")
            .unwrap()
    }

    fn book() -> Value {
        json!({"id": 42, "title": "Narrative", "author": {"id": 123, "name": "Fred Douglass"}})
    }

    #[test]
    fn test_dumps_related_object_as_url() {
        let field = HyperlinkRelated::new("author");
        let result = field.serialize("author", &book(), &app()).unwrap();
        assert_eq!(result, Some(json!("/author/123")));
    }

    #[test]
    fn test_dumps_external_url() {
        let field = HyperlinkRelated::new("author").external(true);
        let result = field.serialize("author", &book(), &app()).unwrap();
        assert_eq!(result, Some(json!("http://localhost/author/123")));
    }

    #[test]
    fn test_scalar_related_value_is_the_key() {
        let field = HyperlinkRelated::new("author").attribute("author_id");
        let obj = json!({"author_id": 9});
        let result = field.serialize("author", &obj, &app()).unwrap();
        assert_eq!(result, Some(json!("/author/9")));
    }

    #[test]
    fn test_null_relation_dumps_null() {
        let field = HyperlinkRelated::new("author");
        let obj = json!({"author": null});
        assert_eq!(field.serialize("author", &obj, &app()).unwrap(), Some(Value::Null));
    }

    #[test]
    fn test_loads_key_from_url() {
        let mut app = app();
        let field = HyperlinkRelated::new("author");
        let loaded = field
            .deserialize(Input::Json(json!("/author/123")), &mut app)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.as_json(), Some(&json!(123)));
    }

    #[test]
    fn test_loads_key_from_external_url() {
        let mut app = app();
        let field = HyperlinkRelated::new("author").external(true);
        let loaded = field
            .deserialize(Input::Json(json!("http://localhost/author/123")), &mut app)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.as_json(), Some(&json!(123)));
    }

    #[test]
    fn test_rejects_foreign_endpoint() {
        let mut app = app();
        let field = HyperlinkRelated::new("author");
        let err = field
            .deserialize(Input::Json(json!("/books/42")), &mut app)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parsed endpoint \"book\" from URL \"/books/42\"; expected \"author\""
        );
    }

    #[test]
    fn test_rejects_url_without_key() {
        let mut app = app();
        let field = HyperlinkRelated::new("authors");
        let err = field
            .deserialize(Input::Json(json!("/authors/")), &mut app)
            .unwrap_err();
        assert_eq!(err.to_string(), "URL pattern \"id\" not found in {}");
    }

    #[test]
    fn test_rejects_unknown_url() {
        let mut app = app();
        let err = HyperlinkRelated::new("author")
            .deserialize(Input::Json(json!("/nowhere")), &mut app)
            .unwrap_err();
        assert!(matches!(err, Error::Invalid(_)));
    }
}
