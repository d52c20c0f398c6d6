//! Validators for uploaded files.
//!
//! Validators run after a field has converted its input. They check the
//! input type first and fail with [`Error::WrongType`](crate::Error::WrongType)
//! on caller misuse, then report legitimate rejections as
//! [`ValidationError`](crate::ValidationError)s carrying an interpolated
//! message.

mod file_type;
mod size;

pub use file_type::FileType;
pub use size::{parse_size, FileSize};

use std::fmt;

use crate::error::{Error, Result};
use crate::upload::{FileStorage, Input};

pub trait Validator: fmt::Debug + Send + Sync {
    fn validate(&self, input: &mut Input) -> Result<()>;
}

/// Borrow the file out of `input`, or fail with a type error naming what was received.
pub(crate) fn require_file(input: &mut Input) -> Result<&mut FileStorage> {
    match input {
        Input::File(file) => Ok(file),
        other => Err(Error::WrongType(other.type_name())),
    }
}

/// Replace `{name}` placeholders in `template`.
pub(crate) fn interpolate(template: &str, vars: &[(&str, &str)]) -> String {
    vars.iter().fold(template.to_string(), |message, (name, value)| {
        message.replace(&format!("{{{}}}", name), value)
    })
}
