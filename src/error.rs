//! Error types for the logging pipeline.
//!
//! Failures inside the pipeline never propagate to the application: writers
//! route them through their error handler (a stderr diagnostic by default).
//! The one deliberate exception is [`TreelogError::PathResolution`], which a
//! rotating writer re-surfaces on every `write` because it cannot make
//! progress until the path is valid.

use std::fmt;
use std::io;

/// Failure kinds raised by formatters, writers and interceptors.
#[derive(Debug)]
pub enum TreelogError {
    /// A formatter failed while serializing a record. The record is dropped
    /// for that writer only.
    Formatter(String),
    /// I/O failure on append, flush or reopen. The writer stays usable.
    Write(io::Error),
    /// A deferred base path failed to resolve. Persistent: every subsequent
    /// write surfaces it again.
    PathResolution(String),
    /// Rename, compression or deletion failed during rotation. The writer
    /// reopens and continues; the offending file may remain on disk.
    Rotation(String),
    /// An interceptor failed. The record is dropped.
    Interceptor(String),
}

impl fmt::Display for TreelogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreelogError::Formatter(details) => {
                write!(f, "formatter failed: {}", details)
            }
            TreelogError::Write(err) => write!(f, "write failed: {}", err),
            TreelogError::PathResolution(details) => {
                write!(f, "log path could not be resolved: {}", details)
            }
            TreelogError::Rotation(details) => {
                write!(f, "rotation failed: {}", details)
            }
            TreelogError::Interceptor(details) => {
                write!(f, "interceptor failed: {}", details)
            }
        }
    }
}

impl std::error::Error for TreelogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TreelogError::Write(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TreelogError {
    fn from(err: io::Error) -> Self {
        TreelogError::Write(err)
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TreelogError>;
