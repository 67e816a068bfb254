// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Configuration types for the KV filter

use serde::{Deserialize, Serialize};

use super::error::{DlpError, DlpResult};

/// How key and value matches combine for a rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum MatchMode {
    #[default]
    Or, // key matched || value matched ("" or "or")
    And, // key matched && value matched
    Unrecognized(String),
}

impl MatchMode {
    pub fn as_str(&self) -> &str {
        match self {
            MatchMode::Or => "or",
            MatchMode::And => "and",
            MatchMode::Unrecognized(mode) => mode,
        }
    }

    /// Combine the key and value outcomes. Unrecognized modes never match.
    pub fn combine(&self, key_match: bool, val_match: bool) -> bool {
        match self {
            MatchMode::Or => key_match || val_match,
            MatchMode::And => key_match && val_match,
            MatchMode::Unrecognized(_) => false,
        }
    }
}

impl From<String> for MatchMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "" | "or" => MatchMode::Or,
            "and" => MatchMode::And,
            _ => MatchMode::Unrecognized(mode),
        }
    }
}

impl From<MatchMode> for String {
    fn from(mode: MatchMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Treat two fields of one object as a key/value pair.
///
/// ```json
/// { "name": "password", "content": "hunter2" }
/// ```
/// With `key_field = "name"` and `value_field = "content"`, the value
/// `"hunter2"` is matched under the key `"password"`. The key field must hold
/// a string; the value field may hold anything except an object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRelation {
    pub key_field: String,
    pub value_field: String,
}

impl FieldRelation {
    pub fn new(key_field: impl Into<String>, value_field: impl Into<String>) -> Self {
        Self {
            key_field: key_field.into(),
            value_field: value_field.into(),
        }
    }
}

/// Detection rule definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectRule {
    pub name: Option<String>,
    /// Key equals one of these, ignoring case
    pub key_equals: Vec<String>,
    /// One of these contains the key
    pub key_contains: Vec<String>,
    /// Key matches one of these patterns
    pub key_regex: Vec<String>,
    /// Value equals one of these, ignoring case
    pub val_equals: Vec<String>,
    /// One of these contains the value
    pub val_contains: Vec<String>,
    /// Value matches one of these patterns
    pub val_regex: Vec<String>,
    pub match_mode: MatchMode,
    /// Only match pairs derived through this relation
    pub field_relation: Option<FieldRelation>,
    /// Name of the mask rule applied to matched values
    pub mask_ref: Option<String>,
}

/// Masking types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MaskType {
    #[default]
    Cover, // Replace characters positionally with a cover char
    Hash,     // Replace with hash (e.g., [HASH:abc123])
    Tokenize, // Replace with token (e.g., [TOKEN:xyz789])
}

/// Parameters of the cover mask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverParam {
    /// Cover character; only the first char is used, `*` when empty
    pub char: String,
    /// Characters kept at the head
    pub offset: i64,
    /// Characters kept at the tail
    pub padding: i64,
    /// Maximum cover characters emitted, 0 for unbounded
    pub length: i64,
    /// Reserved for tail-anchored covering
    pub reverse: bool,
}

impl Default for CoverParam {
    fn default() -> Self {
        Self {
            char: "*".to_string(),
            offset: 0,
            padding: 0,
            length: 0,
            reverse: false,
        }
    }
}

/// Named mask definition referenced by `DetectRule::mask_ref`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRule {
    pub name: String,
    #[serde(default)]
    pub mask_type: MaskType,
    #[serde(default)]
    pub cover: CoverParam,
}

/// Deepest scalar `serde_json` parses: its reader rejects the 128th nested
/// container, so a scalar sits at most 127 containers down.
pub const PARSER_DEPTH_LIMIT: usize = 127;

fn default_max_depth() -> usize {
    PARSER_DEPTH_LIMIT
}

fn default_log_detections() -> bool {
    true
}

/// Configuration for the KV filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvRules {
    #[serde(default)]
    pub detect_rules: Vec<DetectRule>,
    #[serde(default)]
    pub mask_rules: Vec<MaskRule>,

    // Behavior configuration
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_log_detections")]
    pub log_detections: bool,
}

impl Default for KvRules {
    fn default() -> Self {
        Self {
            detect_rules: Vec::new(),
            mask_rules: Vec::new(),
            max_depth: default_max_depth(),
            log_detections: default_log_detections(),
        }
    }
}

impl KvRules {
    /// Parse configuration from JSON text
    pub fn from_json_str(text: &str) -> DlpResult<Self> {
        serde_json::from_str(text).map_err(|e| DlpError::Config(e.to_string()))
    }

    /// Parse configuration from YAML text
    pub fn from_yaml_str(text: &str) -> DlpResult<Self> {
        Ok(serde_yml::from_str(text)?)
    }
}
