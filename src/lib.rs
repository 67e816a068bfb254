// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Key/value DLP for JSON documents
// Optional Python bindings built with PyO3

//! Detect and mask sensitive key/value pairs in JSON documents.
//!
//! # Examples
//!
//! ```
//! use kv_dlp::kv_filter::{CoverMasker, CoverParam, KvDetector, KvRules};
//!
//! let rules = KvRules::from_json_str(r#"{"detect_rules": [{"key_equals": ["password"]}]}"#)?;
//! let detector = KvDetector::new(&rules)?;
//!
//! let detections = detector.detect(br#"{"user": {"password": "hunter22"}}"#)?;
//! assert_eq!(detections[0].pair.path.to_string(), "user->password");
//!
//! let cover = CoverMasker::new(&CoverParam { offset: 1, padding: 1, ..Default::default() });
//! assert_eq!(cover.mask("hunter22"), "h******2");
//! # Ok::<(), kv_dlp::kv_filter::DlpError>(())
//! ```

// Allow non-local definitions for PyO3 macros
#![cfg_attr(feature = "python", allow(non_local_definitions))]

#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod kv_filter;

pub use kv_filter::{DlpError, DlpResult, KvDetector, KvFilter, KvRules};

/// Python module: kv_dlp
///
/// ```python
/// from kv_dlp import KvFilterRust
/// ```
#[cfg(feature = "python")]
#[pymodule]
fn kv_dlp(m: &Bound<'_, pyo3::types::PyModule>) -> PyResult<()> {
    m.add_class::<kv_filter::python::KvFilterRust>()?;

    // Module metadata
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add(
        "__doc__",
        "Key/value sensitive data detection and masking for JSON documents",
    )?;

    Ok(())
}
