// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// PyO3 bindings for the KV filter

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use super::error::DlpError;
use super::processor::KvFilter;

impl From<DlpError> for PyErr {
    fn from(err: DlpError) -> Self {
        PyValueError::new_err(err.to_string())
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> PyResult<String> {
    serde_json::to_string(value)
        .map_err(|e| PyValueError::new_err(format!("Failed to encode result: {}", e)))
}

/// KV filter exposed to Python
///
/// # Example (Python)
/// ```python
/// import json
/// from kv_dlp import KvFilterRust
///
/// rules = {
///     "detect_rules": [{"key_equals": ["password"], "mask_ref": "cover"}],
///     "mask_rules": [{"name": "cover", "cover": {"offset": 1, "padding": 1}}],
/// }
/// kv = KvFilterRust(json.dumps(rules))
///
/// json.loads(kv.redact('{"password": "1234567890"}'))
/// # [{"key": "password", "path": ["password"], "masked": "1********0", ...}]
/// ```
#[pyclass]
pub struct KvFilterRust {
    filter: KvFilter,
}

#[pymethods]
impl KvFilterRust {
    /// Create a filter from a JSON rule configuration
    #[new]
    pub fn new(config_json: &str) -> PyResult<Self> {
        Ok(Self {
            filter: KvFilter::from_json_str(config_json)?,
        })
    }

    /// Create a filter from a YAML rule configuration
    #[staticmethod]
    pub fn from_yaml(config_yaml: &str) -> PyResult<Self> {
        Ok(Self {
            filter: KvFilter::from_yaml_str(config_yaml)?,
        })
    }

    /// Detect sensitive pairs in a JSON document; returns a JSON array
    pub fn detect(&self, document: &str) -> PyResult<String> {
        to_json(&self.filter.detect(document.as_bytes())?)
    }

    /// Detect and mask; returns a JSON array of redactions
    pub fn redact(&self, document: &str) -> PyResult<String> {
        to_json(&self.filter.redact(document.as_bytes())?)
    }

    /// Apply the mask rule named `mask_rule` to `value`
    pub fn mask(&self, mask_rule: &str, value: &str) -> PyResult<String> {
        self.filter
            .masks()
            .get(mask_rule)
            .map(|mask| mask.apply(value))
            .ok_or_else(|| PyValueError::new_err(format!("Unknown mask rule '{}'", mask_rule)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &str = r#"{
        "detect_rules": [{"key_equals": ["password"], "mask_ref": "cover"}],
        "mask_rules": [{"name": "cover", "cover": {"offset": 1, "padding": 1}}]
    }"#;

    #[test]
    fn test_redact_returns_json() {
        let kv = KvFilterRust::new(RULES).unwrap();
        let out: serde_json::Value =
            serde_json::from_str(&kv.redact(r#"{"password": "1234567890"}"#).unwrap()).unwrap();

        assert_eq!(out[0]["masked"], "1********0");
        assert_eq!(out[0]["path"], serde_json::json!(["password"]));
    }

    #[test]
    fn test_detect_and_mask() {
        let kv = KvFilterRust::from_yaml(
            "detect_rules:\n  - key_equals: [token]\nmask_rules:\n  - name: all\n",
        )
        .unwrap();

        let out: serde_json::Value =
            serde_json::from_str(&kv.detect(r#"{"token": "abc", "n": 1}"#).unwrap()).unwrap();
        assert_eq!(out.as_array().map(Vec::len), Some(1));
        assert_eq!(out[0]["key"], "token");

        assert_eq!(kv.mask("all", "abc").unwrap(), "***");
        assert!(kv.mask("missing", "abc").is_err());
    }

    #[test]
    fn test_invalid_config() {
        assert!(KvFilterRust::new(r#"{"detect_rules": 5}"#).is_err());
        assert!(KvFilterRust::new(r#"{"detect_rules": [{"key_regex": ["(x"]}]}"#).is_err());
    }
}
