//! Heading pattern classification.
//!
//! Maps a paragraph's text to a `(level, ContentType)` pair using two ordered
//! pattern tables. Chapter patterns are tried before subtitle patterns and
//! the first match wins.

use crate::types::ContentType;
use regex::Regex;
use std::sync::LazyLock;

/// Chapter heading patterns, in match order.
const CHAPTER_PATTERNS: &[&str] = &[
    r"^[一二三四五六七八九十]+[、．.]\s*",
    r"^第[一二三四五六七八九十壹貳參肆伍陸柒捌玖拾]+[章節部分]\s*",
    r"^第[一二三四五六七八九十]+[、．.]\s*",
    r"^前言\s*",
    r"^結論\s*",
    r"^總結\s*",
    r"^概述\s*",
    r"^摘要\s*",
    r"^序言\s*",
    r"^引言\s*",
];

/// Subtitle patterns, in match order.
const SUBTITLE_PATTERNS: &[&str] = &[
    r"^[一二三四五六七八九十]+[）)]\s*",
    r"^\([一二三四五六七八九十]+\)\s*",
    r"^[1-9]\d*[）)]\s*",
    r"^\([1-9]\d*\)\s*",
    r"^[a-z][）)]\s*",
    r"^\([a-z]\)\s*",
    r"^[•·○]\s*",
];

static CHAPTER_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(CHAPTER_PATTERNS));

static SUBTITLE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| compile(SUBTITLE_PATTERNS));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns.iter().map(|p| Regex::new(p).unwrap()).collect()
}

/// Stateless classifier for paragraph headings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    /// Create a new classifier.
    pub fn new() -> Self {
        Self
    }

    /// Classify a trimmed paragraph text.
    pub fn classify(&self, text: &str) -> (u8, ContentType) {
        if CHAPTER_REGEXES.iter().any(|re| re.is_match(text)) {
            return (0, ContentType::Chapter);
        }

        if SUBTITLE_REGEXES.iter().any(|re| re.is_match(text)) {
            return (1, ContentType::Subtitle);
        }

        (2, ContentType::Content)
    }
}
