use crate::models::FileDescriptor;
use std::path::Path;
use thiserror::Error;

/// Maximum document size: 50 MB
pub const MAX_FILE_SIZE: usize = 50 * 1024 * 1024;

/// Extensions accepted for transcription (compared case-insensitively)
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Stateless gate applied to every file before anything is stored.
#[derive(Debug, Clone)]
pub struct Validator {
    max_file_size: usize,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE)
    }
}

impl Validator {
    pub fn new(max_file_size: usize) -> Self {
        Self { max_file_size }
    }

    pub fn validate(&self, descriptor: &FileDescriptor) -> Result<(), ValidationError> {
        validate_filename(&descriptor.name)?;
        validate_extension(&descriptor.name)?;
        validate_file_size(descriptor.size(), self.max_file_size)?;
        Ok(())
    }
}

pub fn validate_filename(filename: &str) -> Result<(), ValidationError> {
    if filename.trim().is_empty() {
        return Err(ValidationError::new(
            "INVALID_FILENAME",
            "Filename cannot be empty",
        ));
    }

    if filename.starts_with('.') {
        return Err(ValidationError::new(
            "INVALID_FILENAME",
            "Hidden files (starting with '.') are not allowed",
        ));
    }

    Ok(())
}

pub fn validate_extension(filename: &str) -> Result<(), ValidationError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        Some(ext) => Err(ValidationError::new(
            "UNSUPPORTED_EXTENSION",
            format!(
                "File extension '.{}' is not supported. Allowed: {}",
                ext,
                ALLOWED_EXTENSIONS.join(", ")
            ),
        )),
        None => Err(ValidationError::new(
            "UNSUPPORTED_EXTENSION",
            format!(
                "File has no extension. Allowed: {}",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        )),
    }
}

pub fn validate_file_size(size: usize, max_size: usize) -> Result<(), ValidationError> {
    if size == 0 {
        return Err(ValidationError::new("EMPTY_FILE", "File appears to be empty"));
    }

    if size > max_size {
        return Err(ValidationError::new(
            "FILE_TOO_LARGE",
            format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        ));
    }
    Ok(())
}

/// Reduces a client supplied filename to its last path component and
/// replaces characters that are reserved in object keys.
pub fn sanitize_filename(filename: &str) -> String {
    let normalized = filename.replace('\\', "/");
    let name = Path::new(&normalized)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path components stripped from filename: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || c == ':'
                || c == '*'
                || c == '?'
                || c == '"'
                || c == '<'
                || c == '>'
                || c == '|'
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    // Limit length safely for UTF-8
    if sanitized.len() > 255 {
        let mut end = 255;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    }
}

/// MIME type declared for a document, derived from its extension.
pub fn content_type_for(filename: &str) -> mime::Mime {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("pdf") => mime::APPLICATION_PDF,
        Some("txt") => mime::TEXT_PLAIN_UTF_8,
        _ => mime::APPLICATION_OCTET_STREAM,
    }
}
