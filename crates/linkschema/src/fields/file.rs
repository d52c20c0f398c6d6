use serde_json::Value;

use super::{Field, FieldOptions};
use crate::app::App;
use crate::error::{Result, ValidationError};
use crate::upload::Input;

/// An uploaded file. Only meaningful on load; attach
/// [`FileSize`](crate::validate::FileSize) and
/// [`FileType`](crate::validate::FileType) as validators.
#[derive(Debug, Default)]
pub struct File {
    options: FieldOptions,
}

impl File {
    const INVALID: &'static str = "Not a valid file.";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Field for File {
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
        match input {
            Input::File(file) => Ok(Some(Input::File(file))),
            Input::Json(_) => Err(ValidationError::new(Self::INVALID).into()),
        }
    }
}
