// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Detection plus masking over whole documents

use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::config::KvRules;
use super::detector::{scalar_string, Detection, KvDetector};
use super::error::DlpResult;
use super::masking::MaskSet;
use super::path::JsonPath;

/// Replacement text for a matched value.
///
/// The caller writes `masked` back at `path`; the document itself is never
/// modified here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Redaction {
    pub key: String,
    pub path: JsonPath,
    pub original: Value,
    pub masked: String,
    pub rule_index: usize,
}

/// Detector and mask rules compiled from one rule set
#[derive(Debug, Clone)]
pub struct KvFilter {
    detector: KvDetector,
    masks: MaskSet,
}

impl KvFilter {
    pub fn new(config: &KvRules) -> DlpResult<Self> {
        Ok(Self {
            detector: KvDetector::new(config)?,
            masks: MaskSet::new(&config.mask_rules),
        })
    }

    pub fn from_json_str(config: &str) -> DlpResult<Self> {
        Self::new(&KvRules::from_json_str(config)?)
    }

    pub fn from_yaml_str(config: &str) -> DlpResult<Self> {
        Self::new(&KvRules::from_yaml_str(config)?)
    }

    pub fn detector(&self) -> &KvDetector {
        &self.detector
    }

    pub fn masks(&self) -> &MaskSet {
        &self.masks
    }

    pub fn detect(&self, input: &[u8]) -> DlpResult<Vec<Detection>> {
        self.detector.detect(input)
    }

    /// Detect in `input` and mask every detection whose rule names a mask.
    ///
    /// A value matched by several masking rules yields one redaction per
    /// rule, in rule order.
    pub fn redact(&self, input: &[u8]) -> DlpResult<Vec<Redaction>> {
        let document: Value = serde_json::from_slice(input)?;
        self.redact_value(&document)
    }

    pub fn redact_value(&self, document: &Value) -> DlpResult<Vec<Redaction>> {
        let detections = self.detector.detect_value(document)?;
        let redactions = self.mask_detections(detections);
        debug!("Produced {} redaction(s)", redactions.len());
        Ok(redactions)
    }

    /// Apply mask rules to detections; unmasked detections are skipped
    pub fn mask_detections(&self, detections: Vec<Detection>) -> Vec<Redaction> {
        let rules = &self.detector.rules().rules;
        detections
            .into_iter()
            .filter_map(|detection| {
                let mask_ref = rules.get(detection.rule_index)?.mask_ref.as_deref()?;
                let mask = self.masks.get(mask_ref)?;
                let masked = mask.apply(&scalar_string(&detection.pair.value));
                Some(Redaction {
                    key: detection.pair.key,
                    path: detection.pair.path,
                    original: detection.pair.value,
                    masked,
                    rule_index: detection.rule_index,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv_filter::rules::preset_rules;

    #[test]
    fn test_redact_with_cover() {
        let filter = KvFilter::from_json_str(
            r#"{
                "detect_rules": [
                    {"key_equals": ["password"], "mask_ref": "cover"},
                    {"key_equals": ["username"]}
                ],
                "mask_rules": [
                    {"name": "cover", "cover": {"offset": 1, "padding": 1}}
                ]
            }"#,
        )
        .unwrap();

        let redactions = filter
            .redact(br#"{"username": "test", "password": "1234567890"}"#)
            .unwrap();

        assert_eq!(redactions.len(), 1);
        assert_eq!(redactions[0].key, "password");
        assert_eq!(redactions[0].masked, "1********0");
        assert_eq!(redactions[0].original, Value::from("1234567890"));
        assert_eq!(redactions[0].path.to_string(), "password");

        // detection still reports the unmasked rule
        assert_eq!(filter.detect(br#"{"username": "test"}"#).unwrap().len(), 1);
    }

    #[test]
    fn test_redact_number_uses_string_form() {
        let filter = KvFilter::from_yaml_str(
            r##"
detect_rules:
  - key_equals: [phone]
    mask_ref: tail
mask_rules:
  - name: tail
    cover: {char: "#", padding: 4}
"##,
        )
        .unwrap();

        let redactions = filter.redact(br#"{"phone": 91919191}"#).unwrap();
        assert_eq!(redactions[0].masked, "####9191");
        assert_eq!(redactions[0].original, Value::from(91919191));
    }

    #[test]
    fn test_preset_rules() {
        let filter = KvFilter::new(&preset_rules()).unwrap();
        let redactions = filter
            .redact(br#"{"user": {"Password": "hunter22", "mobile": "+85291919191", "name": "bob"}}"#)
            .unwrap();

        let masked: Vec<_> = redactions.iter().map(|r| r.masked.as_str()).collect();
        assert_eq!(masked, vec!["hu****22", "+8********91"]);
    }
}
