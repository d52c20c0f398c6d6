use std::collections::BTreeSet;
use std::path::Path;

use super::{interpolate, require_file, Validator};
use crate::error::{Error, Result, ValidationError};
use crate::upload::Input;

const DEFAULT_MESSAGE: &str = "Not an allowed file type. Allowed file types: [{extensions}]";

/// Succeeds if an uploaded file's extension is in an allow-list.
///
/// Extensions include the leading dot and are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileType {
    allowed: BTreeSet<String>,
    error: Option<String>,
}

impl FileType {
    pub fn new<I, S>(accept: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            allowed: accept
                .into_iter()
                .map(|ext| ext.as_ref().to_lowercase())
                .collect(),
            error: None,
        }
    }

    /// Custom message template; may use `{input}` and `{extensions}`.
    pub fn error(mut self, template: impl Into<String>) -> Self {
        self.error = Some(template.into());
        self
    }

    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    fn format_error(&self, input: &str) -> ValidationError {
        let extensions = self.allowed.iter().cloned().collect::<Vec<_>>().join(", ");
        let template = self.error.as_deref().unwrap_or(DEFAULT_MESSAGE);
        ValidationError::new(interpolate(
            template,
            &[("input", input), ("extensions", &extensions)],
        ))
    }
}

impl Validator for FileType {
    fn validate(&self, input: &mut Input) -> Result<()> {
        let file = require_file(input)?;
        let extension = file
            .filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()));

        match extension {
            Some(ext) if self.allowed.contains(&ext) => Ok(()),
            _ => Err(Error::Invalid(self.format_error(&file.to_string()))),
        }
    }
}
