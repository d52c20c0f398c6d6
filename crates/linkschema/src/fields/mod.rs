//! # Schema Fields
//!
//! Every field of a [`Schema`](crate::Schema) implements [`Field`]. A field
//! has two directions:
//!
//! - **Dump**: [`Field::serialize`] produces the output value for one key of
//!   the serialized object, or `None` to leave the key out.
//! - **Load**: [`Field::deserialize`] converts one incoming value, then runs
//!   the field's validators.
//!
//! ## Field Set
//!
//! | Field | Dump | Load |
//! |-------|------|------|
//! | [`Raw`] | attribute as-is | as-is |
//! | [`Text`], [`Integer`], [`Boolean`], [`Date`] | coerced scalar | checked scalar |
//! | [`Nested`] | nested schema dump | nested schema load |
//! | [`UrlFor`], [`AbsoluteUrlFor`] | URL built from an endpoint | no-op |
//! | [`Hyperlinks`] | tree of URLs | no-op |
//! | [`AppConfig`] | value from the config store | optional write-back |
//! | [`File`] | not dumped | uploaded file + validators |
//! | [`HyperlinkRelated`] | URL of a related object | key parsed from a URL |
//!
//! These are plain named exports; there is no runtime registry to attach them to.

mod basic;
mod config;
mod file;
mod hyperlinks;
mod related;
mod url;

pub use self::basic::{Boolean, Date, Integer, Nested, Raw, Text};
pub use self::config::AppConfig;
pub use self::file::File;
pub use self::hyperlinks::{Hyperlinks, LinkTree};
pub use self::related::HyperlinkRelated;
pub use self::url::{placeholder, AbsoluteUrlFor, ParamTemplate, TemplateValue, UrlFor};

use std::fmt;

use serde_json::Value;

use crate::app::App;
use crate::error::{Result, ValidationError};
use crate::resolve::resolve;
use crate::upload::Input;
use crate::validate::Validator;

/// Options shared by every field.
#[derive(Debug, Default)]
pub struct FieldOptions {
    /// Accept `null` on load.
    pub allow_none: bool,
    /// Never loaded; incoming values for this field are rejected.
    pub dump_only: bool,
    /// Never dumped.
    pub load_only: bool,
    /// Dotted path to read instead of the field name.
    pub attribute: Option<String>,
    pub validators: Vec<Box<dyn Validator>>,
}

pub trait Field: fmt::Debug + Send + Sync {
    fn options(&self) -> &FieldOptions;

    fn options_mut(&mut self) -> &mut FieldOptions;

    /// Whether dumping starts by looking up the attribute named after the field.
    fn reads_attribute(&self) -> bool {
        true
    }

    /// Called when the field is added to a schema under `name`.
    fn bind(&mut self, _name: &str) {}

    /// Produce the output value.
    ///
    /// `value` is the non-null attribute value, or `None` for fields that
    /// don't read an attribute.
    fn format(&self, value: Option<&Value>, name: &str, obj: &Value, app: &App) -> Result<Value>;

    /// Convert a non-null incoming value. `Ok(None)` leaves it out of the result.
    fn convert(&self, input: Input, app: &mut App) -> Result<Option<Input>>;

    fn serialize(&self, name: &str, obj: &Value, app: &App) -> Result<Option<Value>> {
        if !self.reads_attribute() {
            return self.format(None, name, obj, app).map(Some);
        }
        let attribute = self.options().attribute.as_deref().unwrap_or(name);
        match resolve(obj, attribute).value() {
            None => Ok(None),
            Some(Value::Null) => Ok(Some(Value::Null)),
            Some(value) => self.format(Some(value), name, obj, app).map(Some),
        }
    }

    fn deserialize(&self, input: Input, app: &mut App) -> Result<Option<Input>> {
        if input.is_null() {
            if self.options().allow_none {
                return Ok(Some(input));
            }
            return Err(ValidationError::new("Field may not be null.").into());
        }

        let mut loaded = self.convert(input, app)?;
        if let Some(value) = loaded.as_mut() {
            for validator in &self.options().validators {
                validator.validate(value)?;
            }
        }
        Ok(loaded)
    }

    fn allow_none(mut self, allow: bool) -> Self
    where
        Self: Sized,
    {
        self.options_mut().allow_none = allow;
        self
    }

    fn dump_only(mut self, dump_only: bool) -> Self
    where
        Self: Sized,
    {
        self.options_mut().dump_only = dump_only;
        self
    }

    fn load_only(mut self, load_only: bool) -> Self
    where
        Self: Sized,
    {
        self.options_mut().load_only = load_only;
        self
    }

    fn attribute(mut self, path: impl Into<String>) -> Self
    where
        Self: Sized,
    {
        self.options_mut().attribute = Some(path.into());
        self
    }

    fn validator(mut self, validator: impl Validator + 'static) -> Self
    where
        Self: Sized,
    {
        self.options_mut().validators.push(Box::new(validator));
        self
    }
}

/// Take the JSON out of `input`, or reject it with `message`.
pub(crate) fn expect_json(input: Input, message: &str) -> Result<Value> {
    match input {
        Input::Json(value) => Ok(value),
        Input::File(_) => Err(ValidationError::new(message).into()),
    }
}
