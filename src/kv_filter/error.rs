// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Error types for the KV filter

use thiserror::Error;

/// Errors raised while compiling rules or detecting in a document
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DlpError {
    /// The input document is not valid JSON
    #[error("Failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),

    /// The rule configuration could not be deserialized
    #[error("Invalid rule configuration: {0}")]
    Config(String),

    /// A key or value regex in a detect rule failed to compile
    #[error("Detect rule #{rule}: failed to compile pattern '{pattern}': {source}")]
    InvalidRegex {
        rule: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A detect rule references a mask rule that does not exist
    #[error("Detect rule #{rule}: unknown mask rule '{mask_ref}'")]
    UnknownMaskRef { rule: usize, mask_ref: String },

    /// Two mask rules share a name
    #[error("Mask rule '{0}' is defined more than once")]
    DuplicateMaskRule(String),

    /// The document nests deeper than the configured limit
    #[error("Document nesting exceeds {limit} levels at '{path}'")]
    DepthLimitExceeded { limit: usize, path: String },
}

/// Result alias for KV filter operations
pub type DlpResult<T> = Result<T, DlpError>;

impl From<serde_yml::Error> for DlpError {
    fn from(err: serde_yml::Error) -> Self {
        DlpError::Config(err.to_string())
    }
}
