//! Error taxonomy for the style pipeline.
//!
//! Every variant that concerns a file carries its path so the message can be
//! printed on its own.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Failures while locating or reading the `exports.locals` literal.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The located literal is not valid JSON; the upstream transform changed shape.
    #[error("malformed exports.locals literal: {reason}")]
    MalformedLiteral { reason: String },

    /// The literal parsed, but is not an object of class names.
    #[error("exports.locals literal is not an object")]
    NotAnObject,

    /// The module text could not be parsed by the syntax locator.
    #[error("module text could not be parsed: {reason}")]
    Unparseable { reason: String },
}

#[derive(Debug, Error)]
pub enum DecorateError {
    #[error(transparent)]
    Export(#[from] ExportError),

    /// The mapping already holds the synthetic key entry.
    #[error("export mapping already contains the reserved entry '{0}'")]
    ReservedKey(String),
}

/// Per-file typings failures. Never fatal for a batch.
#[derive(Debug, Error)]
pub enum TypingsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid style file path: {0}")]
    InvalidPath(PathBuf),
}

impl TypingsError {
    /// Path of the style file or declaration the failure concerns.
    pub fn path(&self) -> &PathBuf {
        match self {
            TypingsError::Read { path, .. } => path,
            TypingsError::Write { path, .. } => path,
            TypingsError::InvalidPath(path) => path,
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to watch {path}: {source}")]
pub struct WatchError {
    pub path: PathBuf,
    #[source]
    pub source: notify::Error,
}

/// Error reported by the external bundler itself (not a compile failure).
#[derive(Debug, Error)]
#[error("bundler error: {message}")]
pub struct BundlerError {
    pub message: String,
}

impl BundlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Bundler(#[from] BundlerError),

    #[error("compilation failed with {} error(s)", .errors.len())]
    CompileFailed { errors: Vec<String> },

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error("failed to start typings watcher: {0}")]
    WatcherThread(#[source] io::Error),

    #[error("failed to decorate {path}: {source}")]
    Decorate {
        path: PathBuf,
        #[source]
        source: DecorateError,
    },

    #[error("invalid build configuration: {0}")]
    Config(String),
}
