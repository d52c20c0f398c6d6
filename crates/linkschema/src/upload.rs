//! Uploaded files and load-side input values.
//!
//! A schema load receives either JSON or an uploaded file for each field.
//! [`FileStorage`] wraps the uploaded bytes behind one of three stream kinds,
//! and [`FileStorage::size`] measures them with the cheapest technique the
//! kind allows, never leaving the read position displaced.

use std::fmt;
use std::io::{self, Cursor, Read, Seek, SeekFrom};

use serde_json::Value;
use tempfile::SpooledTempFile;

/// Backing stream of an uploaded file.
pub enum FileStream {
    /// Fully buffered in memory.
    Memory(Cursor<Vec<u8>>),
    /// Spooled to disk past a size threshold.
    Spooled(SpooledTempFile),
    /// Any readable stream; measuring it buffers the content.
    Reader(Box<dyn Read + Send>),
}

impl fmt::Debug for FileStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileStream::Memory(cursor) => f
                .debug_tuple("Memory")
                .field(&cursor.get_ref().len())
                .finish(),
            FileStream::Spooled(file) => f
                .debug_tuple("Spooled")
                .field(&file.is_rolled())
                .finish(),
            FileStream::Reader(_) => f.write_str("Reader"),
        }
    }
}

/// An uploaded file.
#[derive(Debug)]
pub struct FileStorage {
    /// Form field the file was submitted under.
    pub name: Option<String>,
    /// Client-side file name.
    pub filename: Option<String>,
    pub content_type: Option<String>,
    stream: FileStream,
}

impl FileStorage {
    pub fn new(stream: FileStream) -> Self {
        Self {
            name: None,
            filename: None,
            content_type: None,
            stream,
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(FileStream::Memory(Cursor::new(bytes.into())))
    }

    pub fn from_spooled(file: SpooledTempFile) -> Self {
        Self::new(FileStream::Spooled(file))
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::new(FileStream::Reader(Box::new(reader)))
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn stream(&self) -> &FileStream {
        &self.stream
    }

    /// Size of the whole file in bytes.
    ///
    /// The current read position is preserved. A plain reader can't seek, so
    /// it is read to the end once and replaced by an in-memory buffer. If
    /// that read fails, the bytes already read stay readable ahead of the
    /// unread remainder.
    pub fn size(&mut self) -> io::Result<u64> {
        let buffered = match &mut self.stream {
            FileStream::Memory(cursor) => return Ok(cursor.get_ref().len() as u64),
            FileStream::Spooled(file) => {
                let position = file.stream_position()?;
                let end = file.seek(SeekFrom::End(0))?;
                file.seek(SeekFrom::Start(position))?;
                return Ok(end);
            }
            FileStream::Reader(reader) => {
                let mut buf = Vec::new();
                if let Err(e) = reader.read_to_end(&mut buf) {
                    // Put what was consumed back in front of the rest.
                    let rest = std::mem::replace(reader, Box::new(io::empty()));
                    *reader = Box::new(Cursor::new(buf).chain(rest));
                    return Err(e);
                }
                buf
            }
        };
        let size = buffered.len() as u64;
        tracing::debug!(size, "buffered upload stream to measure it");
        self.stream = FileStream::Memory(Cursor::new(buffered));
        Ok(size)
    }
}

impl Read for FileStorage {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match &mut self.stream {
            FileStream::Memory(cursor) => cursor.read(buf),
            FileStream::Spooled(file) => file.read(buf),
            FileStream::Reader(reader) => reader.read(buf),
        }
    }
}

impl fmt::Display for FileStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<FileStorage: '{}' ('{}')>",
            self.filename.as_deref().unwrap_or(""),
            self.content_type.as_deref().unwrap_or("")
        )
    }
}

/// A value handed to a field on load.
#[derive(Debug)]
pub enum Input {
    Json(Value),
    File(FileStorage),
}

impl Input {
    /// Name of the kind of value held, used in type errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            Input::File(_) => "FileStorage",
            Input::Json(value) => json_type_name(value),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Input::Json(Value::Null))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Input::Json(value) => Some(value),
            Input::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&FileStorage> {
        match self {
            Input::File(file) => Some(file),
            Input::Json(_) => None,
        }
    }

    pub fn into_file(self) -> Option<FileStorage> {
        match self {
            Input::File(file) => Some(file),
            Input::Json(_) => None,
        }
    }
}

impl From<Value> for Input {
    fn from(value: Value) -> Self {
        Input::Json(value)
    }
}

impl From<FileStorage> for Input {
    fn from(file: FileStorage) -> Self {
        Input::File(file)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "float",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_memory_size_is_buffer_length() {
        let mut file = FileStorage::from_bytes(vec![b' '; 1024]);
        assert_eq!(file.size().unwrap(), 1024);
    }

    #[test]
    fn test_spooled_size_restores_position() {
        let mut spooled = tempfile::spooled_tempfile(16);
        spooled.write_all(&[7u8; 64]).unwrap();
        spooled.seek(SeekFrom::Start(10)).unwrap();

        let mut file = FileStorage::from_spooled(spooled);
        assert_eq!(file.size().unwrap(), 64);

        let mut rest = Vec::new();
        file.read_to_end(&mut rest).unwrap();
        assert_eq!(rest.len(), 54);
    }

    struct FailsOnce(bool);

    impl Read for FailsOnce {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            if self.0 {
                return Ok(0);
            }
            self.0 = true;
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    #[test]
    fn test_failed_measure_keeps_bytes_already_read() {
        let reader = Cursor::new(b"abc".to_vec())
            .chain(FailsOnce(false))
            .chain(Cursor::new(b"def".to_vec()));
        let mut file = FileStorage::from_reader(reader);

        // 1. The first measurement hits the error
        let err = file.size().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);

        // 2. Nothing read before the error is lost
        assert_eq!(file.size().unwrap(), 6);
        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        assert_eq!(content, b"abcdef");
    }

    #[test]
    fn test_reader_size_keeps_content_readable() {
        let mut file = FileStorage::from_reader(io::repeat(1).take(300));
        assert_eq!(file.size().unwrap(), 300);
        assert!(matches!(file.stream(), FileStream::Memory(_)));

        let mut content = Vec::new();
        file.read_to_end(&mut content).unwrap();
        assert_eq!(content.len(), 300);
        assert_eq!(file.size().unwrap(), 300);
    }

    #[test]
    fn test_display_shows_filename_and_type() {
        let file = FileStorage::from_bytes(b"x".to_vec())
            .with_filename("test.png")
            .with_content_type("image/png");
        assert_eq!(file.to_string(), "<FileStorage: 'test.png' ('image/png')>");
    }

    #[test]
    fn test_input_type_names() {
        assert_eq!(Input::from(json!(1)).type_name(), "integer");
        assert_eq!(Input::from(json!(1.5)).type_name(), "float");
        assert_eq!(Input::from(json!("s")).type_name(), "string");
        assert_eq!(Input::from(Value::Null).type_name(), "null");
        assert_eq!(
            Input::from(FileStorage::from_bytes(Vec::new())).type_name(),
            "FileStorage"
        );
    }
}
