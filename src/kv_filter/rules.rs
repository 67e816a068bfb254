// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Rule compilation for KV detection
// Regexes are compiled once per rule set into a RegexSet per side

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{RegexBuilder, RegexSet, RegexSetBuilder};
use std::collections::{HashMap, HashSet};

use super::config::{CoverParam, DetectRule, FieldRelation, KvRules, MaskRule, MaskType, MatchMode};
use super::error::{DlpError, DlpResult};

/// Compiled regex size limit, per rule side
const REGEX_SIZE_LIMIT: usize = 10 * (1 << 20);

/// Keyword and pattern matchers for one side (key or value) of a rule
#[derive(Debug, Clone)]
pub struct SideMatcher {
    /// Lower-cased equals keywords
    equals: HashSet<String>,
    contains: Vec<String>,
    regex_set: RegexSet,
}

impl SideMatcher {
    fn compile(
        rule_idx: usize,
        equals: &[String],
        contains: &[String],
        patterns: &[String],
    ) -> DlpResult<Self> {
        // Compile individually first so a failure names the offending pattern
        for pattern in patterns {
            RegexBuilder::new(pattern)
                .size_limit(REGEX_SIZE_LIMIT)
                .build()
                .map_err(|source| DlpError::InvalidRegex {
                    rule: rule_idx,
                    pattern: pattern.clone(),
                    source,
                })?;
        }

        let regex_set = if patterns.is_empty() {
            RegexSet::empty()
        } else {
            RegexSetBuilder::new(patterns)
                .size_limit(REGEX_SIZE_LIMIT)
                .build()
                .map_err(|source| DlpError::InvalidRegex {
                    rule: rule_idx,
                    pattern: patterns.join(" | "),
                    source,
                })?
        };

        Ok(Self {
            equals: equals.iter().map(|kw| kw.to_lowercase()).collect(),
            // an empty keyword would contain every candidate
            contains: contains.iter().filter(|kw| !kw.is_empty()).cloned().collect(),
            regex_set,
        })
    }

    /// `text` is the candidate, `lowered` its lower-case form.
    ///
    /// Contains holds when a configured keyword contains the candidate, so a
    /// short candidate matches a longer keyword, and also when the candidate
    /// contains the keyword.
    pub fn is_match(&self, text: &str, lowered: &str) -> bool {
        self.equals.contains(lowered)
            || self
                .contains
                .iter()
                .any(|kw| kw.contains(text) || text.contains(kw.as_str()))
            || self.regex_set.is_match(text)
    }
}

/// A detect rule ready for matching
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub name: Option<String>,
    pub key: SideMatcher,
    pub val: SideMatcher,
    pub match_mode: MatchMode,
    pub field_relation: Option<FieldRelation>,
    pub mask_ref: Option<String>,
}

impl CompiledRule {
    /// Whether a rule gated on `relation` may judge a pair carrying `relation`
    pub fn accepts_relation(&self, relation: Option<&FieldRelation>) -> bool {
        self.field_relation.as_ref() == relation
    }

    pub fn matches(&self, key: &str, key_lower: &str, val: &str, val_lower: &str) -> bool {
        let key_match = self.key.is_match(key, key_lower);
        let val_match = self.val.is_match(val, val_lower);
        self.match_mode.combine(key_match, val_match)
    }

    /// Label used in logs
    pub fn label(&self, idx: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{}", idx),
        }
    }
}

/// Key-field name to the relations declared under it, in declaration order
#[derive(Debug, Clone, Default)]
pub struct FieldRelationIndex {
    by_key_field: HashMap<String, Vec<FieldRelation>>,
}

impl FieldRelationIndex {
    pub fn build<'a, I>(relations: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldRelation>,
    {
        let mut by_key_field: HashMap<String, Vec<FieldRelation>> = HashMap::new();
        for relation in relations {
            let entry = by_key_field.entry(relation.key_field.clone()).or_default();
            if !entry.iter().any(|r| r.value_field == relation.value_field) {
                entry.push(relation.clone());
            }
        }
        Self { by_key_field }
    }

    /// Relations whose key field is `field`
    pub fn get(&self, field: &str) -> Option<&[FieldRelation]> {
        self.by_key_field.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.by_key_field.is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_key_field.values().map(Vec::len).sum()
    }
}

/// All compiled rules of a rule set
#[derive(Debug, Clone)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
    pub relations: FieldRelationIndex,
}

/// Compile detect rules
///
/// Fails on the first malformed regex, on a repeated mask rule name, or on a
/// `mask_ref` that names no rule in `mask_rules`.
pub fn compile_rules(config: &KvRules) -> DlpResult<CompiledRules> {
    debug!(
        "Compiling {} detect rule(s), {} mask rule(s)",
        config.detect_rules.len(),
        config.mask_rules.len()
    );

    let mut mask_names = HashSet::new();
    for mask in &config.mask_rules {
        if !mask_names.insert(mask.name.as_str()) {
            return Err(DlpError::DuplicateMaskRule(mask.name.clone()));
        }
    }

    let mut rules = Vec::with_capacity(config.detect_rules.len());
    for (idx, rule) in config.detect_rules.iter().enumerate() {
        rules.push(compile_rule(idx, rule, &config.mask_rules)?);
    }

    let relations = FieldRelationIndex::build(
        config
            .detect_rules
            .iter()
            .filter_map(|rule| rule.field_relation.as_ref()),
    );

    debug!(
        "Compiled {} rule(s), {} field relation(s)",
        rules.len(),
        relations.len()
    );

    Ok(CompiledRules { rules, relations })
}

fn compile_rule(idx: usize, rule: &DetectRule, mask_rules: &[MaskRule]) -> DlpResult<CompiledRule> {
    if let MatchMode::Unrecognized(mode) = &rule.match_mode {
        warn!(
            "Detect rule #{} has unrecognized match mode '{}' and will never match",
            idx, mode
        );
    }

    if let Some(mask_ref) = &rule.mask_ref {
        if !mask_rules.iter().any(|m| &m.name == mask_ref) {
            return Err(DlpError::UnknownMaskRef {
                rule: idx,
                mask_ref: mask_ref.clone(),
            });
        }
    }

    Ok(CompiledRule {
        name: rule.name.clone(),
        key: SideMatcher::compile(idx, &rule.key_equals, &rule.key_contains, &rule.key_regex)?,
        val: SideMatcher::compile(idx, &rule.val_equals, &rule.val_contains, &rule.val_regex)?,
        match_mode: rule.match_mode.clone(),
        field_relation: rule.field_relation.clone(),
        mask_ref: rule.mask_ref.clone(),
    })
}

/// Name of the cover mask used by the presets
pub const PRESET_MASK: &str = "preset_cover";

fn keys(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

// Built-in rules for common secrets
static PRESET_RULES: Lazy<KvRules> = Lazy::new(|| KvRules {
    detect_rules: vec![
        DetectRule {
            name: Some("credential_keys".to_string()),
            key_equals: keys(&[
                "password",
                "passwd",
                "pwd",
                "secret",
                "client_secret",
                "token",
                "access_token",
                "refresh_token",
                "api_key",
                "apikey",
                "access_key",
                "secret_key",
                "private_key",
                "authorization",
            ]),
            mask_ref: Some(PRESET_MASK.to_string()),
            ..Default::default()
        },
        DetectRule {
            name: Some("phone_numbers".to_string()),
            key_regex: vec![r"(?i)(phone|mobile|tel)".to_string()],
            val_regex: vec![r"^\+?[0-9][0-9\- ]{6,18}[0-9]$".to_string()],
            match_mode: MatchMode::And,
            mask_ref: Some(PRESET_MASK.to_string()),
            ..Default::default()
        },
        DetectRule {
            name: Some("cloud_access_keys".to_string()),
            val_regex: vec![
                r"^AKIA[0-9A-Z]{16}$".to_string(),
                r"^LTAI[a-zA-Z0-9]{12,20}$".to_string(),
            ],
            mask_ref: Some(PRESET_MASK.to_string()),
            ..Default::default()
        },
    ],
    mask_rules: vec![MaskRule {
        name: PRESET_MASK.to_string(),
        mask_type: MaskType::Cover,
        cover: CoverParam {
            offset: 2,
            padding: 2,
            ..Default::default()
        },
    }],
    ..Default::default()
});

/// Built-in rule set for passwords, tokens, access keys and phone numbers
pub fn preset_rules() -> KvRules {
    PRESET_RULES.clone()
}
