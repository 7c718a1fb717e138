//! Domain types shared by the analyzer, the pager and the backends.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Font size assumed when a paragraph carries no explicit run size.
pub const DEFAULT_FONT_SIZE_PT: f32 = 12.0;

/// Semantic role of a block within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// The document title. Only ever the first non-empty paragraph.
    Header,
    /// Top-level section heading.
    Chapter,
    /// Sub-heading within a chapter.
    Subtitle,
    /// Body text.
    Content,
}

impl ContentType {
    /// Structural level conventionally paired with this type.
    pub fn level(self) -> u8 {
        match self {
            ContentType::Header | ContentType::Chapter => 0,
            ContentType::Subtitle => 1,
            ContentType::Content => 2,
        }
    }
}

/// Horizontal paragraph alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Map a WordprocessingML `w:jc` value.
    pub fn from_ooxml(value: &str) -> Option<Self> {
        match value {
            "left" | "start" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" | "end" => Some(Self::Right),
            "both" | "distribute" => Some(Self::Justify),
            _ => None,
        }
    }
}

/// Run-level character properties as stored in the source document.
///
/// `None` means the property is inherited from a style rather than set on
/// the run itself.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunFormatting {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub font_size_pt: Option<f32>,
}

/// One paragraph record from a document source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Full paragraph text, untrimmed.
    pub text: String,

    /// Runs in document order.
    pub runs: Vec<RunFormatting>,

    /// Paragraph alignment, if set explicitly.
    pub alignment: Option<Alignment>,
}

impl Paragraph {
    /// Create a paragraph with no runs.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
            alignment: None,
        }
    }

    /// Add a run.
    pub fn with_run(mut self, run: RunFormatting) -> Self {
        self.runs.push(run);
        self
    }

    /// Set the paragraph alignment.
    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = Some(alignment);
        self
    }

    /// Formatting of the first run, with defaults filled in.
    pub fn formatting(&self) -> Formatting {
        let mut formatting = Formatting {
            alignment: self.alignment.unwrap_or_default(),
            ..Formatting::default()
        };

        if let Some(run) = self.runs.first() {
            formatting.bold = run.bold == Some(true);
            formatting.italic = run.italic == Some(true);
            if let Some(size) = run.font_size_pt {
                formatting.font_size_pt = size;
            }
        }

        formatting
    }
}

/// Fixed-shape formatting record attached to every block.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Formatting {
    pub bold: bool,
    pub italic: bool,
    pub font_size_pt: f32,
    pub alignment: Alignment,
}

impl Default for Formatting {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            font_size_pt: DEFAULT_FONT_SIZE_PT,
            alignment: Alignment::Left,
        }
    }
}

/// One semantic unit of source text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Trimmed, non-empty text.
    pub text: String,

    /// 0 = header/chapter, 1 = subtitle, 2 = body.
    pub level: u8,

    pub content_type: ContentType,

    pub formatting: Formatting,

    /// CJK-aware display width, see [`crate::analyze::estimate_display_length`].
    pub estimated_length: usize,
}

impl ContentBlock {
    /// Create a block of the given type with default formatting.
    pub fn new(text: impl Into<String>, content_type: ContentType) -> Self {
        let text = text.into();
        let estimated_length = crate::analyze::estimate_display_length(&text);
        Self {
            text,
            level: content_type.level(),
            content_type,
            formatting: Formatting::default(),
            estimated_length,
        }
    }
}

/// Which kind of layout a slide wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlideKind {
    Title,
    Content,
}

/// A slide produced by the pager: a title plus ordered body lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideSpec {
    pub kind: SlideKind,
    pub title: String,
    pub body: Vec<String>,
}

impl SlideSpec {
    /// Create a slide with an empty body.
    pub fn new(kind: SlideKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            body: Vec::new(),
        }
    }
}

/// Outcome of a single conversion call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionResult {
    pub success: bool,

    /// Where the deck was saved, if it was saved.
    pub output_path: Option<PathBuf>,

    /// Preview images in slide order. Empty when previews were not requested
    /// or failed.
    pub preview_images: Vec<PathBuf>,

    /// Human-readable failure description. Empty on success.
    pub error_message: String,

    pub slide_count: usize,
}

impl ConversionResult {
    /// A successful conversion.
    pub fn succeeded(
        output_path: Option<PathBuf>,
        preview_images: Vec<PathBuf>,
        slide_count: usize,
    ) -> Self {
        Self {
            success: true,
            output_path,
            preview_images,
            error_message: String::new(),
            slide_count,
        }
    }

    /// A failed conversion. Carries no artifacts.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            output_path: None,
            preview_images: Vec::new(),
            error_message: message.into(),
            slide_count: 0,
        }
    }
}
