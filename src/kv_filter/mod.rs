// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// KV Filter - sensitive key/value detection and masking for JSON
//
// - Recursive document walk with field-relation pairs
// - Per-rule RegexSet matching, compiled once
// - Code-point cover masking

pub mod config;
pub mod detector;
pub mod error;
pub mod masking;
pub mod path;
pub mod processor;
#[cfg(feature = "python")]
pub mod python;
pub mod rules;

pub use config::{
    CoverParam, DetectRule, FieldRelation, KvRules, MaskRule, MaskType, MatchMode,
    PARSER_DEPTH_LIMIT,
};
pub use detector::{Detection, KvDetector, KvPair};
pub use error::{DlpError, DlpResult};
pub use masking::{CoverMasker, MaskSet};
pub use path::{JsonPath, PathSegment};
pub use processor::{KvFilter, Redaction};
pub use rules::preset_rules;
