use chrono::NaiveDate;
use serde_json::Value;

use super::{expect_json, Field, FieldOptions};
use crate::app::App;
use crate::error::{Error, Result, ValidationError};
use crate::schema::Schema;
use crate::upload::Input;

const DATE_FORMAT: &str = "%Y-%m-%d";

fn invalid(message: &str) -> Error {
    ValidationError::new(message).into()
}

/// Passes values through untouched in both directions.
#[derive(Debug, Default)]
pub struct Raw {
    options: FieldOptions,
}

impl Raw {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for Raw {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn format(&self, value: Option<&Value>, _name: &str, _obj: &Value, _app: &App) -> Result<Value> {
        Ok(value.cloned().unwrap_or(Value::Null))
    }

    fn convert(&self, input: Input, _app: &mut App) -> Result<Option<Input>> {
        Ok(Some(input))
    }
}

/// A string. Numbers and booleans are stringified on dump.
#[derive(Debug, Default)]
pub struct Text {
    options: FieldOptions,
}

impl Text {
    const INVALID: &'static str = "Not a valid string.";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for Text {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn format(&self, value: Option<&Value>, _name: &str, _obj: &Value, _app: &App) -> Result<Value> {
        match value {
            None => Ok(Value::Null),
            Some(Value::String(s)) => Ok(Value::String(s.clone())),
            Some(Value::Number(n)) => Ok(Value::String(n.to_string())),
            Some(Value::Bool(b)) => Ok(Value::String(b.to_string())),
            Some(_) => Err(invalid(Self::INVALID)),
        }
    }

    fn convert(&self, input: Input, _app: &mut App) -> Result<Option<Input>> {
        match expect_json(input, Self::INVALID)? {
            Value::String(s) => Ok(Some(Input::Json(Value::String(s)))),
            _ => Err(invalid(Self::INVALID)),
        }
    }
}

/// A whole number. Numeric strings and floats are truncated to integers.
#[derive(Debug, Default)]
pub struct Integer {
    options: FieldOptions,
}

impl Integer {
    const INVALID: &'static str = "Not a valid integer.";

    pub fn new() -> Self {
        Self::default()
    }

    fn coerce(value: &Value) -> Result<Value> {
        match value {
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(Value::Number(n.clone())),
            Value::Number(n) => n
                .as_f64()
                .map(f64::trunc)
                .filter(|f| (i64::MIN as f64..i64::MAX as f64).contains(f))
                .map(|f| Value::from(f as i64))
                .ok_or_else(|| invalid(Self::INVALID)),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| invalid(Self::INVALID)),
            _ => Err(invalid(Self::INVALID)),
        }
    }
}

impl Field for Integer {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn format(&self, value: Option<&Value>, _name: &str, _obj: &Value, _app: &App) -> Result<Value> {
        value.map_or(Ok(Value::Null), Self::coerce)
    }

    fn convert(&self, input: Input, _app: &mut App) -> Result<Option<Input>> {
        let value = expect_json(input, Self::INVALID)?;
        Ok(Some(Input::Json(Self::coerce(&value)?)))
    }
}

/// A boolean, accepting the usual truthy/falsy spellings.
#[derive(Debug, Default)]
pub struct Boolean {
    options: FieldOptions,
}

impl Boolean {
    const INVALID: &'static str = "Not a valid boolean.";

    pub fn new() -> Self {
        Self::default()
    }

    fn coerce(value: &Value) -> Result<Value> {
        let parsed = match value {
            Value::Bool(b) => Some(*b),
            Value::Number(n) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            Value::String(s) => match s.to_lowercase().as_str() {
                "true" | "t" | "1" | "yes" | "y" | "on" => Some(true),
                "false" | "f" | "0" | "no" | "n" | "off" => Some(false),
                _ => None,
            },
            _ => None,
        };
        parsed.map(Value::Bool).ok_or_else(|| invalid(Self::INVALID))
    }
}

impl Field for Boolean {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn format(&self, value: Option<&Value>, _name: &str, _obj: &Value, _app: &App) -> Result<Value> {
        value.map_or(Ok(Value::Null), Self::coerce)
    }

    fn convert(&self, input: Input, _app: &mut App) -> Result<Option<Input>> {
        let value = expect_json(input, Self::INVALID)?;
        Ok(Some(Input::Json(Self::coerce(&value)?)))
    }
}

/// An ISO 8601 calendar date (`YYYY-MM-DD`).
#[derive(Debug, Default)]
pub struct Date {
    options: FieldOptions,
}

impl Date {
    const INVALID: &'static str = "Not a valid date.";

    pub fn new() -> Self {
        Self::default()
    }

    fn coerce(value: &Value) -> Result<Value> {
        let text = value.as_str().ok_or_else(|| invalid(Self::INVALID))?;
        let date = NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
            .map_err(|_| invalid(Self::INVALID))?;
        Ok(Value::String(date.format(DATE_FORMAT).to_string()))
    }
}

impl Field for Date {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn format(&self, value: Option<&Value>, _name: &str, _obj: &Value, _app: &App) -> Result<Value> {
        value.map_or(Ok(Value::Null), Self::coerce)
    }

    fn convert(&self, input: Input, _app: &mut App) -> Result<Option<Input>> {
        let value = expect_json(input, Self::INVALID)?;
        Ok(Some(Input::Json(Self::coerce(&value)?)))
    }
}

/// Dumps and loads an object (or list of objects) through another schema.
#[derive(Debug)]
pub struct Nested {
    schema: Schema,
    options: FieldOptions,
}

impl Nested {
    const INVALID: &'static str = "Invalid input type.";

    pub fn new(schema: Schema) -> Self {
        Self {
            schema,
            options: FieldOptions::default(),
        }
    }

    /// Restrict the nested output to these fields.
    pub fn only<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema = self.schema.only(fields);
        self
    }

    /// Leave these fields out of the nested output.
    pub fn exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema = self.schema.exclude(fields);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl Field for Nested {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn format(&self, value: Option<&Value>, _name: &str, _obj: &Value, app: &App) -> Result<Value> {
        match value {
            None => Ok(Value::Null),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| self.schema.dump_one(item, app))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            Some(value @ Value::Object(_)) => self.schema.dump_one(value, app),
            Some(_) => Err(invalid(Self::INVALID)),
        }
    }

    fn convert(&self, input: Input, app: &mut App) -> Result<Option<Input>> {
        let value = expect_json(input, Self::INVALID)?;
        if !value.is_object() {
            return Err(invalid(Self::INVALID));
        }
        match self.schema.load_json(&value, app) {
            Ok(loaded) => Ok(Some(Input::Json(loaded.into_json()))),
            Err(Error::Schema(errors)) => Err(invalid(&errors.to_string())),
            Err(other) => Err(other),
        }
    }
}
