//! # Schemas
//!
//! A [`Schema`] is an ordered list of named [`Field`]s. It dumps any
//! `serde::Serialize` value into JSON and loads incoming values back,
//! collecting per-field validation failures.
//!
//! ```
//! use linkschema::fields::{Hyperlinks, LinkTree, Raw, Text, UrlFor};
//! use linkschema::{App, Schema};
//! use serde_json::json;
//!
//! let app = App::new()
//!     .route("/author/<int:id>", "author")?
//!     .route("/authors/", "authors")?;
//!
//! let schema = Schema::new()
//!     .field("id", Raw::new())
//!     .field("name", Text::new())
//!     .field(
//!         "_links",
//!         Hyperlinks::new(LinkTree::map([
//!             ("self", UrlFor::new("author").value("id", "<id>")),
//!             ("collection", UrlFor::new("authors")),
//!         ])),
//!     );
//!
//! let author = json!({"id": 123, "name": "Fred Douglass"});
//! assert_eq!(
//!     schema.dump(&author, &app)?,
//!     json!({
//!         "id": 123,
//!         "name": "Fred Douglass",
//!         "_links": {"self": "/author/123", "collection": "/authors/"},
//!     })
//! );
//! # Ok::<(), linkschema::Error>(())
//! ```
//!
//! ## Dump
//!
//! Fields are emitted in declaration order. A field whose attribute is
//! missing from the object is left out; `load_only` fields, fields outside
//! `only` and fields in `exclude` are skipped.
//!
//! ## Load
//!
//! Unknown keys and keys of `dump_only` fields are rejected with
//! "Unknown field.". Validation failures are gathered into
//! [`SchemaErrors`] and returned together as [`Error::Schema`]; any other
//! error aborts the load immediately.

use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::app::App;
use crate::config::{JSONIFY_MIMETYPE, JSONIFY_PRETTYPRINT_REGULAR};
use crate::error::{Error, Result, SchemaErrors};
use crate::fields::Field;
use crate::upload::{FileStorage, Input};

const UNKNOWN_FIELD: &str = "Unknown field.";
const INVALID_INPUT: &str = "Invalid input type.";
const SCHEMA_KEY: &str = "_schema";

#[derive(Debug, Default)]
pub struct Schema {
    fields: Vec<(String, Box<dyn Field>)>,
    only: Option<BTreeSet<String>>,
    exclude: BTreeSet<String>,
    many: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field. Adding a name twice replaces the earlier field in place.
    pub fn field(mut self, name: impl Into<String>, mut field: impl Field + 'static) -> Self {
        let name = name.into();
        field.bind(&name);
        let boxed: Box<dyn Field> = Box::new(field);
        match self.fields.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = boxed,
            None => self.fields.push((name, boxed)),
        }
        self
    }

    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Treat dumped values as collections by default.
    pub fn many(mut self, many: bool) -> Self {
        self.many = many;
        self
    }

    pub fn is_many(&self) -> bool {
        self.many
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&dyn Field> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, field)| field.as_ref())
    }

    fn selected(&self, name: &str) -> bool {
        self.only.as_ref().map_or(true, |only| only.contains(name)) && !self.exclude.contains(name)
    }

    fn dumped_fields(&self) -> impl Iterator<Item = (&str, &dyn Field)> {
        self.fields
            .iter()
            .filter(move |(name, field)| self.selected(name) && !field.options().load_only)
            .map(|(name, field)| (name.as_str(), field.as_ref()))
    }

    fn loadable_field(&self, name: &str) -> Option<&dyn Field> {
        self.get(name)
            .filter(|field| self.selected(name) && !field.options().dump_only)
    }

    /// Dump `obj`, honoring the schema's `many` setting.
    pub fn dump<T: Serialize + ?Sized>(&self, obj: &T, app: &App) -> Result<Value> {
        self.dump_with(obj, self.many, app)
    }

    /// Dump a collection regardless of the `many` setting.
    pub fn dump_many<T: Serialize + ?Sized>(&self, objs: &T, app: &App) -> Result<Value> {
        self.dump_with(objs, true, app)
    }

    pub fn dump_with<T: Serialize + ?Sized>(&self, obj: &T, many: bool, app: &App) -> Result<Value> {
        let value = serde_json::to_value(obj)?;
        if many {
            self.dump_list(&value, app)
        } else {
            self.dump_one(&value, app)
        }
    }

    /// Dump an already converted value, honoring the `many` setting.
    pub fn dump_value(&self, value: &Value, app: &App) -> Result<Value> {
        if self.many {
            self.dump_list(value, app)
        } else {
            self.dump_one(value, app)
        }
    }

    fn dump_list(&self, value: &Value, app: &App) -> Result<Value> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.dump_one(item, app))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => self.dump_one(other, app),
        }
    }

    /// Dump a single object.
    pub fn dump_one(&self, obj: &Value, app: &App) -> Result<Value> {
        let mut output = Map::new();
        for (name, field) in self.dumped_fields() {
            if let Some(value) = field.serialize(name, obj, app)? {
                output.insert(name.to_string(), value);
            }
        }
        Ok(Value::Object(output))
    }

    /// Load named inputs. Fields that write elsewhere (such as a writable
    /// [`AppConfig`](crate::fields::AppConfig)) contribute nothing to the result.
    pub fn load<K, I>(&self, entries: I, app: &mut App) -> Result<Loaded>
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Input)>,
    {
        let mut errors = SchemaErrors::new();
        let mut loaded = Vec::new();

        for (name, input) in entries {
            let name: String = name.into();
            let Some(field) = self.loadable_field(&name) else {
                errors.add(name, UNKNOWN_FIELD);
                continue;
            };
            match field.deserialize(input, app) {
                Ok(Some(value)) => loaded.push((name, value)),
                Ok(None) => {}
                Err(Error::Invalid(err)) => errors.add(name, err.message()),
                Err(other) => return Err(other),
            }
        }

        if !errors.is_empty() {
            tracing::debug!(fields = errors.messages().len(), "schema load rejected");
            return Err(errors.into());
        }
        Ok(Loaded { entries: loaded })
    }

    /// Load a JSON object.
    pub fn load_json(&self, data: &Value, app: &mut App) -> Result<Loaded> {
        let Value::Object(map) = data else {
            let mut errors = SchemaErrors::new();
            errors.add(SCHEMA_KEY, INVALID_INPUT);
            return Err(errors.into());
        };
        self.load(
            map.iter().map(|(key, value)| (key.clone(), Input::Json(value.clone()))),
            app,
        )
    }

    /// Dump `obj` into a JSON response. `many` overrides the schema setting.
    pub fn jsonify<T: Serialize + ?Sized>(
        &self,
        obj: &T,
        many: Option<bool>,
        app: &App,
    ) -> Result<JsonResponse> {
        let data = self.dump_with(obj, many.unwrap_or(self.many), app)?;
        let body = if app.config.get_bool(JSONIFY_PRETTYPRINT_REGULAR).unwrap_or(false) {
            serde_json::to_string_pretty(&data)?
        } else {
            serde_json::to_string(&data)?
        };
        Ok(JsonResponse {
            status: 200,
            mimetype: app
                .config
                .get_str(JSONIFY_MIMETYPE)
                .unwrap_or("application/json")
                .to_string(),
            body,
        })
    }
}

/// Result of a successful [`Schema::load`], in input order.
#[derive(Debug, Default)]
pub struct Loaded {
    entries: Vec<(String, Input)>,
}

impl Loaded {
    pub fn get(&self, name: &str) -> Option<&Input> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, input)| input)
    }

    pub fn json(&self, name: &str) -> Option<&Value> {
        self.get(name).and_then(Input::as_json)
    }

    pub fn file(&self, name: &str) -> Option<&FileStorage> {
        self.get(name).and_then(Input::as_file)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Input)> {
        self.entries.iter().map(|(name, input)| (name.as_str(), input))
    }

    /// JSON view of the loaded data; uploads are represented by their description.
    pub fn into_json(self) -> Value {
        let map = self
            .entries
            .into_iter()
            .map(|(name, input)| {
                let value = match input {
                    Input::Json(value) => value,
                    Input::File(file) => Value::String(file.to_string()),
                };
                (name, value)
            })
            .collect();
        Value::Object(map)
    }
}

impl IntoIterator for Loaded {
    type Item = (String, Input);
    type IntoIter = std::vec::IntoIter<(String, Input)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// A serialized response body with its status and media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonResponse {
    pub status: u16,
    pub mimetype: String,
    pub body: String,
}

impl JsonResponse {
    /// Parse the body back into JSON.
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
