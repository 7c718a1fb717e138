//! Slide template abstraction.
//!
//! A template supplies slide layouts and a mutable slide collection. The
//! pager only ever clears that collection and appends to it; container
//! formats live in backend crates.

use crate::error::{Error, Result};
use crate::types::{SlideKind, SlideSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Placeholder index of the body text frame filled with slide content.
pub const BODY_PLACEHOLDER_IDX: u32 = 1;

/// Kind of a layout placeholder, following the OOXML `ph/@type` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaceholderKind {
    Title,
    CenteredTitle,
    Subtitle,
    Body,
    Object,
    Date,
    Footer,
    SlideNumber,
    Other,
}

impl PlaceholderKind {
    /// Map an OOXML `type` attribute. A missing attribute means `obj`.
    pub fn from_ooxml(value: Option<&str>) -> Self {
        match value {
            None | Some("obj") => Self::Object,
            Some("title") => Self::Title,
            Some("ctrTitle") => Self::CenteredTitle,
            Some("subTitle") => Self::Subtitle,
            Some("body") => Self::Body,
            Some("dt") => Self::Date,
            Some("ftr") => Self::Footer,
            Some("sldNum") => Self::SlideNumber,
            Some(_) => Self::Other,
        }
    }

    /// The OOXML `type` attribute value. `None` for the implicit `obj` and
    /// for kinds this crate does not model.
    pub fn as_ooxml(self) -> Option<&'static str> {
        match self {
            Self::Object | Self::Other => None,
            Self::Title => Some("title"),
            Self::CenteredTitle => Some("ctrTitle"),
            Self::Subtitle => Some("subTitle"),
            Self::Body => Some("body"),
            Self::Date => Some("dt"),
            Self::Footer => Some("ftr"),
            Self::SlideNumber => Some("sldNum"),
        }
    }

    /// Whether this placeholder holds the slide title.
    pub fn is_title(self) -> bool {
        matches!(self, Self::Title | Self::CenteredTitle)
    }

    /// Date, footer and slide number placeholders are not copied onto slides.
    pub fn is_furniture(self) -> bool {
        matches!(self, Self::Date | Self::Footer | Self::SlideNumber)
    }
}

/// A placeholder declared by a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub idx: u32,
}

impl Placeholder {
    pub fn new(kind: PlaceholderKind, idx: u32) -> Self {
        Self { kind, idx }
    }
}

/// A named slide layout with its placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideLayout {
    pub name: String,
    pub placeholders: Vec<Placeholder>,
}

impl SlideLayout {
    pub fn new(name: impl Into<String>, placeholders: Vec<Placeholder>) -> Self {
        Self {
            name: name.into(),
            placeholders,
        }
    }

    /// The title placeholder, if any.
    pub fn title_placeholder(&self) -> Option<&Placeholder> {
        self.placeholders.iter().find(|p| p.kind.is_title())
    }

    /// The placeholder receiving body lines.
    pub fn body_placeholder(&self) -> Option<&Placeholder> {
        self.placeholders
            .iter()
            .find(|p| p.idx == BODY_PLACEHOLDER_IDX && !p.kind.is_title())
    }
}

/// A presentation used as a layout source and slide sink.
pub trait SlideTemplate {
    /// Layouts in template order.
    fn layouts(&self) -> &[SlideLayout];

    /// Remove every existing slide.
    fn clear_slides(&mut self);

    /// Append a slide built on `layouts()[layout]`.
    fn add_slide(&mut self, layout: usize, slide: &SlideSpec) -> Result<()>;

    /// Number of slides currently in the presentation.
    fn slide_count(&self) -> usize;

    /// Persist the presentation.
    fn save(&self, path: &Path) -> Result<()>;
}

/// Pick the layout index for a slide kind.
///
/// Title slides take the first layout. Content slides take the first layout
/// whose name mentions "content", then the second layout, then the first.
pub fn select_layout(layouts: &[SlideLayout], kind: SlideKind) -> Result<usize> {
    if layouts.is_empty() {
        return Err(Error::TemplateError("template has no slide layouts".to_string()));
    }

    let index = match kind {
        SlideKind::Title => 0,
        SlideKind::Content => layouts
            .iter()
            .position(|l| l.name.to_lowercase().contains("content"))
            .unwrap_or(if layouts.len() > 1 { 1 } else { 0 }),
    };

    Ok(index)
}

/// A slide held by [`MemoryTemplate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySlide {
    pub layout: usize,
    pub title: Option<String>,
    pub body: Vec<String>,
}

/// An in-memory template, saved as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryTemplate {
    pub layouts: Vec<SlideLayout>,
    pub slides: Vec<MemorySlide>,
}

impl MemoryTemplate {
    /// Create a template with the given layouts and no slides.
    pub fn new(layouts: Vec<SlideLayout>) -> Self {
        Self {
            layouts,
            slides: Vec::new(),
        }
    }

    /// The two layouts of a default Office theme: "Title Slide" and
    /// "Title and Content".
    pub fn standard() -> Self {
        Self::new(vec![
            SlideLayout::new(
                "Title Slide",
                vec![
                    Placeholder::new(PlaceholderKind::CenteredTitle, 0),
                    Placeholder::new(PlaceholderKind::Subtitle, 1),
                ],
            ),
            SlideLayout::new(
                "Title and Content",
                vec![
                    Placeholder::new(PlaceholderKind::Title, 0),
                    Placeholder::new(PlaceholderKind::Object, 1),
                ],
            ),
        ])
    }
}

impl SlideTemplate for MemoryTemplate {
    fn layouts(&self) -> &[SlideLayout] {
        &self.layouts
    }

    fn clear_slides(&mut self) {
        self.slides.clear();
    }

    fn add_slide(&mut self, layout: usize, slide: &SlideSpec) -> Result<()> {
        let layout_def = self
            .layouts
            .get(layout)
            .ok_or_else(|| Error::TemplateError(format!("layout {} does not exist", layout)))?;

        let title = layout_def
            .title_placeholder()
            .map(|_| slide.title.clone());
        let body = if layout_def.body_placeholder().is_some() {
            slide.body.clone()
        } else {
            Vec::new()
        };

        self.slides.push(MemorySlide { layout, title, body });
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.slides.len()
    }

    fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::SerializationError(format!("Failed to serialize deck: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
