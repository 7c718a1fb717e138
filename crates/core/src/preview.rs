//! Slide previews.
//!
//! Previews are SVG outlines: the slide title on top and the body lines
//! below it, wrapped by display width. They show what went where, not what
//! the final deck looks like.

use crate::analyze::estimate_display_length;
use crate::error::{Error, Result};
use crate::types::{SlideKind, SlideSpec};
use quick_xml::escape::escape;
use std::path::PathBuf;

/// Renders slide specs into preview images.
pub trait PreviewRenderer {
    /// Render every slide, returning image paths in slide order.
    fn render(&self, slides: &[SlideSpec]) -> Result<Vec<PathBuf>>;
}

const WIDTH: u32 = 960;
const HEIGHT: u32 = 540;
const MARGIN: u32 = 48;
const TITLE_SIZE: u32 = 36;
const BODY_SIZE: u32 = 22;
/// Display width at which body lines wrap.
const WRAP_WIDTH: usize = 64;

/// Writes one `slide_NNN.svg` per slide into a directory.
#[derive(Debug, Clone)]
pub struct SvgPreviewRenderer {
    output_dir: PathBuf,
}

impl SvgPreviewRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Build the SVG document for one slide.
    pub fn render_svg(&self, slide: &SlideSpec, number: usize) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = WIDTH,
            h = HEIGHT
        );
        svg.push_str(r##"<rect width="100%" height="100%" fill="#ffffff" stroke="#c8c8c8"/>"##);

        let title = sanitize(&slide.title);
        let (title_x, title_y, anchor) = match slide.kind {
            SlideKind::Title => (WIDTH / 2, HEIGHT / 2 - TITLE_SIZE, "middle"),
            SlideKind::Content => (MARGIN, MARGIN + TITLE_SIZE, "start"),
        };
        svg.push_str(&format!(
            r##"<text x="{}" y="{}" font-size="{}" font-weight="bold" text-anchor="{}" fill="#1f3864">{}</text>"##,
            title_x,
            title_y,
            TITLE_SIZE,
            anchor,
            escape(&title)
        ));

        let mut y = title_y + TITLE_SIZE;
        'lines: for line in &slide.body {
            for (i, row) in wrap(&sanitize(line), WRAP_WIDTH).iter().enumerate() {
                y += BODY_SIZE + 8;
                if y > HEIGHT - MARGIN {
                    break 'lines;
                }
                let prefix = if i == 0 && slide.kind == SlideKind::Content {
                    "• "
                } else {
                    ""
                };
                svg.push_str(&format!(
                    r##"<text x="{}" y="{}" font-size="{}" text-anchor="{}" fill="#333333">{}{}</text>"##,
                    title_x,
                    y,
                    BODY_SIZE,
                    anchor,
                    prefix,
                    escape(row)
                ));
            }
        }

        svg.push_str(&format!(
            r##"<text x="{}" y="{}" font-size="14" text-anchor="end" fill="#888888">{}</text></svg>"##,
            WIDTH - 16,
            HEIGHT - 16,
            number
        ));

        svg
    }
}

impl PreviewRenderer for SvgPreviewRenderer {
    fn render(&self, slides: &[SlideSpec]) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.output_dir).map_err(|e| {
            Error::RenderError(format!(
                "Failed to create preview directory {}: {}",
                self.output_dir.display(),
                e
            ))
        })?;

        let mut images = Vec::with_capacity(slides.len());
        for (idx, slide) in slides.iter().enumerate() {
            let path = self.output_dir.join(format!("slide_{:03}.svg", idx + 1));
            std::fs::write(&path, self.render_svg(slide, idx + 1)).map_err(|e| {
                Error::RenderError(format!("Failed to write {}: {}", path.display(), e))
            })?;
            images.push(path);
        }

        log::debug!(
            "Rendered {} previews into {}",
            images.len(),
            self.output_dir.display()
        );

        Ok(images)
    }
}

/// Drop control characters other than tab and newline, then trim.
fn sanitize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Split text into rows no wider than `width` display units.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut rows = Vec::new();
    for source_line in text.lines() {
        let mut row = String::new();
        let mut row_width = 0;
        for c in source_line.chars() {
            let w = estimate_display_length(c.encode_utf8(&mut [0; 4]));
            if row_width + w > width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(c);
            row_width += w;
        }
        rows.push(row);
    }
    if rows.is_empty() {
        rows.push(String::new());
    }
    rows
}
