// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Core KV detection logic

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;

use super::config::{FieldRelation, KvRules, PARSER_DEPTH_LIMIT};
use super::error::{DlpError, DlpResult};
use super::path::JsonPath;
use super::rules::{compile_rules, CompiledRules};

/// A scalar found in a document, with the key it is judged under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvPair {
    /// Field name, or the key field's value for a derived pair
    pub key: String,
    /// Scalar or null
    pub value: Value,
    pub path: JsonPath,
    /// Set only on pairs derived through a field relation
    pub field_relation: Option<FieldRelation>,
}

impl KvPair {
    /// String form of the value used by every matching strategy
    pub fn value_string(&self) -> Cow<'_, str> {
        scalar_string(&self.value)
    }
}

/// `null`, decimal numbers, `true`/`false`, or the string itself
pub fn scalar_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::Null => Cow::Borrowed("null"),
        Value::Bool(true) => Cow::Borrowed("true"),
        Value::Bool(false) => Cow::Borrowed("false"),
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        // Containers never reach a KvPair
        other => Cow::Owned(other.to_string()),
    }
}

/// A pair matched by a rule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detection {
    #[serde(flatten)]
    pub pair: KvPair,
    /// Index of the matching rule in `KvRules::detect_rules`
    pub rule_index: usize,
}

/// Detects sensitive key/value pairs in JSON documents
///
/// Compile once, then call [`KvDetector::detect`] per document. The detector
/// holds no per-document state and may be shared across threads.
#[derive(Debug, Clone)]
pub struct KvDetector {
    rules: CompiledRules,
    max_depth: usize,
    log_detections: bool,
}

impl KvDetector {
    /// Compile `config` into a detector
    ///
    /// `max_depth` may not exceed [`PARSER_DEPTH_LIMIT`], so documents parsed
    /// by [`KvDetector::detect`] and trees passed to
    /// [`KvDetector::detect_value`] share one limit.
    pub fn new(config: &KvRules) -> DlpResult<Self> {
        if config.max_depth > PARSER_DEPTH_LIMIT {
            return Err(DlpError::Config(format!(
                "max_depth {} exceeds the parser limit of {}",
                config.max_depth, PARSER_DEPTH_LIMIT
            )));
        }

        Ok(Self {
            rules: compile_rules(config)?,
            max_depth: config.max_depth,
            log_detections: config.log_detections,
        })
    }

    pub fn rules(&self) -> &CompiledRules {
        &self.rules
    }

    /// Parse `input` as JSON and detect in it
    pub fn detect(&self, input: &[u8]) -> DlpResult<Vec<Detection>> {
        let document: Value = serde_json::from_slice(input)?;
        self.detect_value(&document)
    }

    /// Detect in an already parsed document
    pub fn detect_value(&self, document: &Value) -> DlpResult<Vec<Detection>> {
        let pairs = self.extract_pairs(document)?;
        let mut detections = Vec::new();

        for pair in pairs {
            let value = pair.value_string();
            let key_lower = pair.key.to_lowercase();
            let val_lower = value.to_lowercase();

            for (idx, rule) in self.rules.rules.iter().enumerate() {
                if !rule.accepts_relation(pair.field_relation.as_ref()) {
                    continue;
                }
                if rule.matches(&pair.key, &key_lower, &value, &val_lower) {
                    trace!("Rule {} matched '{}' at {}", rule.label(idx), pair.key, pair.path);
                    detections.push(Detection {
                        pair: pair.clone(),
                        rule_index: idx,
                    });
                }
            }
        }

        if self.log_detections {
            debug!("Detected {} sensitive pair(s)", detections.len());
        }

        Ok(detections)
    }

    /// Every candidate pair in `document`, in traversal order
    pub fn extract_pairs(&self, document: &Value) -> DlpResult<Vec<KvPair>> {
        let mut pairs = Vec::new();
        self.visit(document, JsonPath::new(), "", None, 0, &mut pairs)?;
        Ok(pairs)
    }

    fn visit(
        &self,
        value: &Value,
        path: JsonPath,
        key: &str,
        relation: Option<&FieldRelation>,
        depth: usize,
        out: &mut Vec<KvPair>,
    ) -> DlpResult<()> {
        if depth > self.max_depth {
            return Err(DlpError::DepthLimitExceeded {
                limit: self.max_depth,
                path: path.to_string(),
            });
        }

        match value {
            Value::Object(fields) => {
                for (name, child) in fields {
                    self.visit(child, path.append(name.as_str()), name, None, depth + 1, out)?;
                }
                self.visit_relations(fields, &path, depth, out)?;
            }
            Value::Array(items) => {
                for (idx, item) in items.iter().enumerate() {
                    self.visit(item, path.append(idx), key, relation, depth + 1, out)?;
                }
            }
            scalar => out.push(KvPair {
                key: key.to_string(),
                value: scalar.clone(),
                path,
                field_relation: relation.cloned(),
            }),
        }

        Ok(())
    }

    /// Emit pairs derived from key/value fields declared by relations
    fn visit_relations(
        &self,
        fields: &Map<String, Value>,
        path: &JsonPath,
        depth: usize,
        out: &mut Vec<KvPair>,
    ) -> DlpResult<()> {
        if self.rules.relations.is_empty() {
            return Ok(());
        }

        for (name, field) in fields {
            let Some(relations) = self.rules.relations.get(name) else {
                continue;
            };
            // key must be a string
            let Value::String(derived_key) = field else {
                continue;
            };

            for relation in relations {
                match fields.get(&relation.value_field) {
                    Some(value) if !value.is_object() => {
                        self.visit(
                            value,
                            path.append(relation.value_field.as_str()),
                            derived_key,
                            Some(relation),
                            depth + 1,
                            out,
                        )?;
                    }
                    _ => {}
                }
            }
        }

        Ok(())
    }
}
