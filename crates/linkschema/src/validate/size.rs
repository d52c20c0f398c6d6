use once_cell::sync::Lazy;
use regex::Regex;

use super::{interpolate, require_file, Validator};
use crate::error::{Error, Result, ValidationError};
use crate::upload::Input;

static SIZE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^([e+\-.\d]+)\s*([kmgtpezy])?(i)?(b)$").unwrap());

const UNITS: &str = "kmgtpezy";

const MESSAGE_GTE: &str = "greater than or equal to";
const MESSAGE_GT: &str = "greater than";
const MESSAGE_LTE: &str = "less than or equal to";
const MESSAGE_LT: &str = "less than";

/// Parse a human size such as `"2 MiB"` or `"1.5kb"` into bytes.
///
/// The unit letter picks the power (`k` = 1 through `y` = 8), an `i` switches
/// the base from 1000 to 1024, and the case of the final `b` selects bytes
/// (`B`) or bits (`b`, divided by 8).
///
/// ```
/// use linkschema::validate::parse_size;
///
/// assert_eq!(parse_size("1 KB").unwrap(), 1000.0);
/// assert_eq!(parse_size("1 KiB").unwrap(), 1024.0);
/// assert_eq!(parse_size("8 kb").unwrap(), 1000.0);
/// assert!(parse_size("wrong_format").is_err());
/// ```
pub fn parse_size(size: &str) -> Result<f64> {
    let size = size.trim();
    let captures = SIZE_PATTERN
        .captures(size)
        .ok_or_else(|| Error::SizeFormat(size.to_string()))?;

    let number = &captures[1];
    let value: f64 = number
        .parse()
        .map_err(|_| Error::SizeNumber(number.to_string()))?;

    let rank = captures
        .get(2)
        .and_then(|unit| {
            let unit = unit.as_str().to_ascii_lowercase();
            UNITS.find(unit.as_str())
        })
        .map_or(0, |index| index as i32 + 1);
    let base: f64 = if captures.get(3).is_some() { 1024.0 } else { 1000.0 };
    let divisor = if &captures[4] == "b" { 8.0 } else { 1.0 };

    Ok(value * base.powi(rank) / divisor)
}

#[derive(Debug, Clone, PartialEq)]
struct Bound {
    spec: String,
    bytes: f64,
}

impl Bound {
    fn parse(spec: &str) -> Result<Self> {
        Ok(Self {
            spec: spec.to_string(),
            bytes: parse_size(spec)?,
        })
    }
}

/// Succeeds if an uploaded file's size lies within the configured range.
///
/// Bounds are parsed when they are set, so a malformed size fails before
/// anything is validated. Both bounds are inclusive unless configured
/// otherwise.
///
/// ```
/// use linkschema::validate::{FileSize, Validator};
/// use linkschema::{FileStorage, Input};
///
/// let validator = FileSize::new().min("1 KiB").unwrap().max("2 KiB").unwrap();
/// let mut input = Input::File(FileStorage::from_bytes(vec![0u8; 1024]));
/// assert!(validator.validate(&mut input).is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FileSize {
    min: Option<Bound>,
    max: Option<Bound>,
    min_inclusive: bool,
    max_inclusive: bool,
    error: Option<String>,
}

impl Default for FileSize {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSize {
    pub fn new() -> Self {
        Self {
            min: None,
            max: None,
            min_inclusive: true,
            max_inclusive: true,
            error: None,
        }
    }

    pub fn min(mut self, size: &str) -> Result<Self> {
        self.min = Some(Bound::parse(size)?);
        Ok(self)
    }

    pub fn max(mut self, size: &str) -> Result<Self> {
        self.max = Some(Bound::parse(size)?);
        Ok(self)
    }

    pub fn min_inclusive(mut self, inclusive: bool) -> Self {
        self.min_inclusive = inclusive;
        self
    }

    pub fn max_inclusive(mut self, inclusive: bool) -> Self {
        self.max_inclusive = inclusive;
        self
    }

    /// Custom message template; may use `{input}`, `{min}` and `{max}`.
    pub fn error(mut self, template: impl Into<String>) -> Self {
        self.error = Some(template.into());
        self
    }

    pub fn min_bytes(&self) -> Option<f64> {
        self.min.as_ref().map(|bound| bound.bytes)
    }

    pub fn max_bytes(&self) -> Option<f64> {
        self.max.as_ref().map(|bound| bound.bytes)
    }

    fn min_op(&self) -> &'static str {
        if self.min_inclusive {
            MESSAGE_GTE
        } else {
            MESSAGE_GT
        }
    }

    fn max_op(&self) -> &'static str {
        if self.max_inclusive {
            MESSAGE_LTE
        } else {
            MESSAGE_LT
        }
    }

    fn message_all(&self) -> String {
        format!(
            "Must be {} {{min}} and {} {{max}}.",
            self.min_op(),
            self.max_op()
        )
    }

    fn too_small_message(&self) -> String {
        if self.max.is_some() {
            self.message_all()
        } else {
            format!("Must be {} {{min}}.", self.min_op())
        }
    }

    fn too_large_message(&self) -> String {
        if self.min.is_some() {
            self.message_all()
        } else {
            format!("Must be {} {{max}}.", self.max_op())
        }
    }

    fn format_error(&self, input: &str, message: &str) -> ValidationError {
        let template = self.error.as_deref().unwrap_or(message);
        let min = self.min.as_ref().map_or("", |bound| bound.spec.as_str());
        let max = self.max.as_ref().map_or("", |bound| bound.spec.as_str());
        ValidationError::new(interpolate(
            template,
            &[("input", input), ("min", min), ("max", max)],
        ))
    }

    fn check(&self, size: f64) -> std::result::Result<(), String> {
        if let Some(min) = &self.min {
            let too_small = if self.min_inclusive {
                size < min.bytes
            } else {
                size <= min.bytes
            };
            if too_small {
                return Err(self.too_small_message());
            }
        }
        if let Some(max) = &self.max {
            let too_large = if self.max_inclusive {
                size > max.bytes
            } else {
                size >= max.bytes
            };
            if too_large {
                return Err(self.too_large_message());
            }
        }
        Ok(())
    }
}

impl Validator for FileSize {
    fn validate(&self, input: &mut Input) -> Result<()> {
        let file = require_file(input)?;
        let size = file.size()?;
        tracing::debug!(size, min = ?self.min_bytes(), max = ?self.max_bytes(), "checking file size");

        self.check(size as f64).map_err(|message| {
            Error::Invalid(self.format_error(&file.to_string(), &message))
        })
    }
}
