use serde_json::Value;

use super::{Field, FieldOptions, Text};
use crate::app::App;
use crate::error::{Error, Result};
use crate::upload::Input;

/// Reads its value from the application's config store.
///
/// The key defaults to the field name upper-cased when the field is added to
/// a schema, so a field called `acme_foo` reads `ACME_FOO`. Read-only unless
/// built with `dump_only(false)`; then a load writes the incoming value back
/// into the store instead of returning it.
///
/// ```
/// use linkschema::fields::{AppConfig, Boolean, Field};
///
/// let foo = AppConfig::new();
/// let flag = AppConfig::new().inner(Boolean::new()).config_name("ACME_FLAG");
/// let writable = AppConfig::new().dump_only(false);
/// ```
#[derive(Debug)]
pub struct AppConfig {
    inner: Box<dyn Field>,
    config_name: Option<String>,
    options: FieldOptions,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self {
            inner: Box::new(Text::new()),
            config_name: None,
            options: FieldOptions {
                dump_only: true,
                ..FieldOptions::default()
            },
        }
    }

    /// Field used to format the stored value (default: [`Text`]).
    pub fn inner(mut self, field: impl Field + 'static) -> Self {
        self.inner = Box::new(field);
        self
    }

    pub fn config_name(mut self, name: impl Into<String>) -> Self {
        self.config_name = Some(name.into());
        self
    }

    /// The config key, once known.
    pub fn key(&self) -> Option<&str> {
        self.config_name.as_deref()
    }

    fn require_key(&self) -> Result<&str> {
        self.key()
            .ok_or_else(|| Error::ConfigKey("<unbound field>".to_string()))
    }
}

impl Field for AppConfig {
    fn options(&self) -> &FieldOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut FieldOptions {
        &mut self.options
    }

    fn reads_attribute(&self) -> bool {
        false
    }

    fn bind(&mut self, name: &str) {
        if self.config_name.is_none() {
            self.config_name = Some(name.to_uppercase());
        }
        self.inner.bind(name);
    }

    fn format(&self, _value: Option<&Value>, name: &str, obj: &Value, app: &App) -> Result<Value> {
        let key = self.require_key()?;
        match app.config.get(key) {
            None => Err(Error::ConfigKey(key.to_string())),
            Some(Value::Null) => Ok(Value::Null),
            Some(value) => self.inner.format(Some(value), name, obj, app),
        }
    }

    fn convert(&self, input: Input, app: &mut App) -> Result<Option<Input>> {
        let key = self.require_key()?.to_string();
        let value = match self.inner.deserialize(input, app)? {
            Some(Input::Json(value)) => value,
            Some(Input::File(file)) => Value::String(file.to_string()),
            None => return Ok(None),
        };
        tracing::debug!(key = %key, "config value loaded from input");
        app.config.set(key, value);
        Ok(None)
    }
}
