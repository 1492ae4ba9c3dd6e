//! Error types for Tracery operations.
//!
//! This module provides the main error type [`TraceryError`] which wraps
//! the error conditions that can occur while reading a workflow, extracting
//! its step graph and laying it out.

use std::io;

use thiserror::Error;

use crate::graph::GraphError;

/// The main error type for Tracery operations.
///
/// # Diagnostic Variants
///
/// The `Parse` variant keeps the offending input next to the JSON error so
/// callers can render the failing line and column.
#[derive(Debug, Error)]
pub enum TraceryError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Parse {
        err: serde_json::Error,
        src: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
}

impl TraceryError {
    /// Create a new `Parse` error with the associated source text.
    pub fn new_parse_error(err: serde_json::Error, src: impl Into<String>) -> Self {
        Self::Parse {
            err,
            src: src.into(),
        }
    }
}
