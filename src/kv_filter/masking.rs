// Copyright 2025
// SPDX-License-Identifier: Apache-2.0
//
// Masking for detected values

use sha2::{Digest, Sha256};
use std::collections::HashMap;
use uuid::Uuid;

use super::config::{CoverParam, MaskRule, MaskType};

const DEFAULT_COVER_CHAR: char = '*';

/// Positional cover mask over code points
///
/// Keeps `offset` characters at the head and `padding` at the tail, and
/// replaces the window between them with the cover character. A non-zero
/// `length` caps the number of cover characters; window characters beyond
/// the cap are dropped, so the output is shorter than the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverMasker {
    pub cover_char: char,
    pub offset: usize,
    pub padding: usize,
    pub length: usize,
    pub reverse: bool,
}

impl Default for CoverMasker {
    fn default() -> Self {
        Self {
            cover_char: DEFAULT_COVER_CHAR,
            offset: 0,
            padding: 0,
            length: 0,
            reverse: false,
        }
    }
}

/// Negative values clamp to zero
fn clamp(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

impl CoverMasker {
    pub fn new(param: &CoverParam) -> Self {
        Self {
            cover_char: param.char.chars().next().unwrap_or(DEFAULT_COVER_CHAR),
            offset: clamp(param.offset),
            padding: clamp(param.padding),
            length: clamp(param.length),
            reverse: param.reverse,
        }
    }

    /// Resolve offset and padding against an input of `in_len` code points.
    ///
    /// Returns the half-open coverage window `[start, end)`.
    fn window(&self, in_len: usize) -> (usize, usize) {
        let mut offset = self.offset;
        let mut padding = self.padding;

        if in_len <= offset && in_len <= padding {
            // collapse to the middle
            offset = (in_len - 1) / 2;
            padding = (in_len - 1) / 2;
        } else if in_len <= offset {
            // last char stays covered
            offset = in_len - 1;
        } else if in_len <= padding {
            // first char stays covered
            padding = in_len - 1;
        }

        // Overlapping head and tail cover everything
        if offset + padding > in_len {
            return (0, in_len);
        }

        (offset, in_len - padding)
    }

    /// Mask `input`. Total: never fails, empty input yields empty output.
    pub fn mask(&self, input: &str) -> String {
        let in_len = input.chars().count();
        if in_len == 0 {
            return String::new();
        }

        let (start, end) = self.window(in_len);
        let mut out = String::with_capacity(input.len());
        let mut covered = 0usize;

        for (idx, ch) in input.chars().enumerate() {
            if idx < start || idx >= end {
                out.push(ch);
            } else if self.length == 0 || covered < self.length {
                out.push(self.cover_char);
                covered += 1;
            }
            // else: beyond the length cap, the char is dropped
        }

        out
    }
}

/// Hash masking using SHA256
pub fn hash_mask(value: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let result = hasher.finalize();
    format!("[HASH:{}]", &format!("{:x}", result)[..8])
}

/// Tokenize using UUID v4
pub fn tokenize_mask() -> String {
    let token = Uuid::new_v4();
    format!("[TOKEN:{}]", &token.simple().to_string()[..8])
}

/// A mask rule ready to apply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompiledMask {
    Cover(CoverMasker),
    Hash,
    Tokenize,
}

impl CompiledMask {
    pub fn new(rule: &MaskRule) -> Self {
        match rule.mask_type {
            MaskType::Cover => CompiledMask::Cover(CoverMasker::new(&rule.cover)),
            MaskType::Hash => CompiledMask::Hash,
            MaskType::Tokenize => CompiledMask::Tokenize,
        }
    }

    pub fn apply(&self, value: &str) -> String {
        match self {
            CompiledMask::Cover(cover) => cover.mask(value),
            CompiledMask::Hash => hash_mask(value),
            CompiledMask::Tokenize => tokenize_mask(),
        }
    }
}

/// Mask rules by name
#[derive(Debug, Clone, Default)]
pub struct MaskSet {
    masks: HashMap<String, CompiledMask>,
}

impl MaskSet {
    /// Names are unique once the rule set has compiled
    pub fn new(rules: &[MaskRule]) -> Self {
        Self {
            masks: rules
                .iter()
                .map(|rule| (rule.name.clone(), CompiledMask::new(rule)))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&CompiledMask> {
        self.masks.get(name)
    }

    pub fn len(&self) -> usize {
        self.masks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GLASS: &str = "I can eat glass, it does not hurt me";
    const GLASS_CJK: &str = "我能吞下玻璃而不伤身体";

    fn cover(offset: i64, padding: i64, length: i64) -> CoverMasker {
        CoverMasker::new(&CoverParam {
            offset,
            padding,
            length,
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(cover(0, 0, 3).mask(""), "");
        assert_eq!(cover(5, 5, 0).mask(""), "");
    }

    #[test]
    fn test_cover_all() {
        assert_eq!(cover(0, 0, 0).mask("secret"), "******");
        assert_eq!(cover(0, 0, 0).mask(GLASS_CJK), "*".repeat(11));
    }

    #[test]
    fn test_length_only() {
        assert_eq!(cover(0, 0, 3).mask(GLASS), "***");
    }

    #[test]
    fn test_offset_padding_length() {
        assert_eq!(cover(3, 3, 3).mask(GLASS), "I c*** me");
        assert_eq!(cover(3, 3, 3).mask(GLASS_CJK), "我能吞***伤身体");
    }

    #[test]
    fn test_length_larger_than_window() {
        assert_eq!(cover(3, 3, 20).mask(GLASS_CJK), "我能吞*****伤身体");
    }

    #[test]
    fn test_offset_beyond_content() {
        assert_eq!(cover(20, 0, 0).mask(GLASS_CJK), "我能吞下玻璃而不伤身*");
    }

    #[test]
    fn test_padding_beyond_content() {
        assert_eq!(cover(0, 20, 0).mask(GLASS_CJK), "*能吞下玻璃而不伤身体");
    }

    #[test]
    fn test_offset_and_padding_beyond_content() {
        assert_eq!(cover(20, 20, 0).mask(GLASS_CJK), "我能吞下玻*而不伤身体");
        assert_eq!(cover(20, 20, 0).mask("我能吞下玻璃而不伤身体啊"), "我能吞下玻**不伤身体啊");
        assert_eq!(cover(20, 20, 0).mask("I"), "*");
    }

    #[test]
    fn test_overlapping_offset_and_padding() {
        assert_eq!(cover(4, 3, 0).mask("abcdef"), "******");
        assert_eq!(cover(4, 3, 2).mask("abcdef"), "**");
        // touching windows leave nothing to cover
        assert_eq!(cover(3, 3, 0).mask("abcdef"), "abcdef");
        assert_eq!(cover(2, 2, 0).mask("abcdef"), "ab**ef");
    }

    #[test]
    fn test_negative_values_clamp() {
        let masker = cover(-3, -1, -10);
        assert_eq!(masker, cover(0, 0, 0));
        assert_eq!(masker.mask("abc"), "***");
    }

    #[test]
    fn test_cover_char() {
        let masker = CoverMasker::new(&CoverParam {
            char: "#!".to_string(),
            offset: 1,
            ..Default::default()
        });
        assert_eq!(masker.mask("abcd"), "a###");

        let empty = CoverMasker::new(&CoverParam {
            char: String::new(),
            ..Default::default()
        });
        assert_eq!(empty.cover_char, '*');
    }

    #[test]
    fn test_hash_mask() {
        let result = hash_mask("sensitive");
        assert!(result.starts_with("[HASH:"));
        assert!(result.ends_with(']'));
        assert_eq!(result.len(), 15); // [HASH:xxxxxxxx]
        assert_eq!(result, hash_mask("sensitive"));
    }

    #[test]
    fn test_tokenize_mask() {
        let result = tokenize_mask();
        assert!(result.starts_with("[TOKEN:"));
        assert!(result.ends_with(']'));
    }

    #[test]
    fn test_mask_set_lookup() {
        let set = MaskSet::new(&[
            MaskRule {
                name: "cover".to_string(),
                mask_type: MaskType::Cover,
                cover: CoverParam {
                    length: 2,
                    ..Default::default()
                },
            },
            MaskRule {
                name: "hash".to_string(),
                mask_type: MaskType::Hash,
                cover: CoverParam::default(),
            },
        ]);

        assert_eq!(set.len(), 2);
        assert_eq!(set.get("cover").unwrap().apply("secret"), "**");
        assert_eq!(set.get("hash"), Some(&CompiledMask::Hash));
        assert!(set.get("missing").is_none());
    }
}
