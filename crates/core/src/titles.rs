//! Slide title cleanup.
//!
//! Headings carry enumeration markers ("一、", "第二章", "(3)", "•") that
//! read badly as slide titles. Two pipelines strip them: one for chapter
//! markers and one for subtitle markers. Each pipeline runs until nothing
//! more can be stripped, so cleaning an already cleaned title is a no-op.

use regex::Regex;
use std::sync::LazyLock;

static CHAPTER_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^[一二三四五六七八九十]+[、．.]\s*",
        r"^第[一二三四五六七八九十壹貳參肆伍陸柒捌玖拾]+(?:部分|章|節|部)\s*",
        r"^第[一二三四五六七八九十]+[、．.]\s*",
        r"^[1-9]\d*[、．.]\s*",
        r"^第[1-9]\d*(?:部分|章|節|部)\s*",
        r"^第[1-9]\d*[、．.]\s*",
        r"^[A-Z][、．.]\s*",
        r"^第[A-Z](?:部分|章|節|部)\s*",
        r"^[●◆■▲]\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static SUBTITLE_MARKERS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^[一二三四五六七八九十]+[）)]\s*",
        r"^\([一二三四五六七八九十]+\)\s*",
        r"^[1-9]\d*[）)]\s*",
        r"^\([1-9]\d*\)\s*",
        r"^[a-z][）)]\s*",
        r"^\([a-z]\)\s*",
        r"^[•·○]\s*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

/// Strip chapter enumeration markers from a heading.
pub fn clean_chapter_title(text: &str) -> String {
    strip_markers(text, &CHAPTER_MARKERS)
}

/// Strip subtitle enumeration markers from a heading.
pub fn clean_subtitle_title(text: &str) -> String {
    strip_markers(text, &SUBTITLE_MARKERS)
}

/// Title for a content slide: chapter markers first, then subtitle markers.
pub fn clean_content_title(text: &str) -> String {
    clean_subtitle_title(&clean_chapter_title(text))
}

fn strip_markers(text: &str, markers: &[Regex]) -> String {
    let original = text.trim();
    let mut cleaned = original;

    'outer: loop {
        for re in markers {
            if let Some(m) = re.find(cleaned) {
                if m.end() > 0 {
                    cleaned = cleaned[m.end()..].trim_start();
                    continue 'outer;
                }
            }
        }
        break;
    }

    let cleaned = cleaned.trim_end();
    if cleaned.is_empty() {
        // A bare marker such as "一、" keeps its text rather than going blank.
        original.to_string()
    } else {
        cleaned.to_string()
    }
}
