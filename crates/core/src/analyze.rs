//! Document structure analysis.
//!
//! Turns the paragraph stream of a document into classified content blocks:
//! the first non-empty paragraph becomes the header, the rest go through the
//! [`PatternClassifier`], and a final repair pass makes sure there is at
//! least one chapter to anchor pagination on.

use crate::classify::PatternClassifier;
use crate::error::{Error, Result};
use crate::types::{ContentBlock, ContentType, Paragraph};

/// A source of paragraph records, e.g. a parsed DOCX container.
pub trait DocumentSource {
    /// Read all body paragraphs in document order.
    fn paragraphs(&mut self) -> Result<Vec<Paragraph>>;
}

impl DocumentSource for Vec<Paragraph> {
    fn paragraphs(&mut self) -> Result<Vec<Paragraph>> {
        Ok(std::mem::take(self))
    }
}

/// Estimate how wide `text` renders on a slide.
///
/// ASCII characters count one unit, everything else (CJK in particular)
/// counts two.
pub fn estimate_display_length(text: &str) -> usize {
    text.chars().map(|c| if c.is_ascii() { 1 } else { 2 }).sum()
}

/// Classifies document paragraphs into content blocks.
#[derive(Debug, Clone, Default)]
pub struct DocumentAnalyzer {
    classifier: PatternClassifier,
}

impl DocumentAnalyzer {
    /// Create an analyzer with the built-in heading patterns.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read paragraphs from `source` and analyze them.
    pub fn analyze_source<S: DocumentSource + ?Sized>(
        &self,
        source: &mut S,
    ) -> Result<Vec<ContentBlock>> {
        let paragraphs = source.paragraphs()?;
        self.analyze(&paragraphs)
    }

    /// Analyze paragraphs into blocks.
    ///
    /// Fails with [`Error::DocumentParseError`] when no paragraph has any
    /// non-whitespace text.
    pub fn analyze(&self, paragraphs: &[Paragraph]) -> Result<Vec<ContentBlock>> {
        let mut blocks: Vec<ContentBlock> = Vec::new();

        for paragraph in paragraphs {
            let text = paragraph.text.trim();
            if text.is_empty() {
                continue;
            }

            let (level, content_type) = if blocks.is_empty() {
                (0, ContentType::Header)
            } else {
                self.classifier.classify(text)
            };

            let block = ContentBlock {
                text: text.to_string(),
                level,
                content_type,
                formatting: paragraph.formatting(),
                estimated_length: estimate_display_length(text),
            };

            log::debug!(
                "Block level:{}, type:{:?}, text:{}",
                block.level,
                block.content_type,
                block.text.chars().take(50).collect::<String>()
            );

            blocks.push(block);
        }

        if blocks.is_empty() {
            return Err(Error::DocumentParseError(
                "document contains no paragraphs with text".to_string(),
            ));
        }

        promote_fallback_chapter(&mut blocks);

        Ok(blocks)
    }
}

/// Promote the first short or bold block to a chapter when none exists.
///
/// The header is skipped: it stays the header no matter what. Returns the
/// index of the promoted block.
pub fn promote_fallback_chapter(blocks: &mut [ContentBlock]) -> Option<usize> {
    if blocks.iter().any(|b| b.content_type == ContentType::Chapter) {
        return None;
    }

    let index = blocks.iter().position(|b| {
        b.content_type != ContentType::Header && (b.level <= 1 || b.formatting.bold)
    })?;

    let block = &mut blocks[index];
    log::debug!("No chapter headings found, promoting '{}' to chapter", block.text);
    block.level = 0;
    block.content_type = ContentType::Chapter;

    Some(index)
}
