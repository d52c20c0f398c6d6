use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use crate::routing::{BuildError, RuleError};

#[derive(Error, Debug)]
pub enum Error {
    #[error("'{path}' is not a valid attribute of {object}")]
    UnresolvedAttribute { path: String, object: String },

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("Invalid size value: '{0}'")]
    SizeFormat(String),

    #[error("Invalid float value while parsing size: '{0}'")]
    SizeNumber(String),

    #[error("A FileStorage object is required, not '{0}'")]
    WrongType(&'static str),

    #[error("Config key not found: {0}")]
    ConfigKey(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Schema(#[from] SchemaErrors),

    #[error("Settings error: {0}")]
    Settings(#[from] confique::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A single rejected value.
///
/// This is the only failure callers are expected to recover from: schemas
/// collect it per field instead of aborting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Field-level validation failures gathered during a schema load.
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaErrors {
    messages: BTreeMap<String, Vec<String>>,
}

impl SchemaErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.messages
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.messages.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.messages.get(field).map(Vec::as_slice)
    }

    pub fn messages(&self) -> &BTreeMap<String, Vec<String>> {
        &self.messages
    }
}

impl fmt::Display for SchemaErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Validation failed:")?;
        for (field, messages) in &self.messages {
            write!(f, " {}: {};", field, messages.join(" "))?;
        }
        Ok(())
    }
}
