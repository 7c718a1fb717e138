//! Conversion orchestration: document → blocks → slides → deck → previews.

use crate::analyze::{DocumentAnalyzer, DocumentSource};
use crate::error::Result;
use crate::paginate::{MapperConfig, SlideMapper};
use crate::preview::PreviewRenderer;
use crate::template::SlideTemplate;
use crate::types::{ConversionResult, SlideSpec};
use std::path::{Path, PathBuf};

/// Runs one document through analysis, pagination, saving and previews.
///
/// Every failure ends up in the returned [`ConversionResult`]; nothing is
/// raised to the caller.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    analyzer: DocumentAnalyzer,
    mapper: SlideMapper,
}

impl Converter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom pagination budgets.
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.mapper = self.mapper.with_config(config);
        self
    }

    /// Convert `document` into slides on `template`.
    ///
    /// The deck is saved to `output` when given. Preview failures only log a
    /// warning and leave the preview list empty.
    pub fn convert<D, T>(
        &self,
        document: &mut D,
        template: &mut T,
        output: Option<&Path>,
        renderer: Option<&dyn PreviewRenderer>,
    ) -> ConversionResult
    where
        D: DocumentSource + ?Sized,
        T: SlideTemplate + ?Sized,
    {
        let slides = match self.build(document, template, output) {
            Ok(slides) => slides,
            Err(e) => {
                log::error!("Conversion failed: {}", e);
                return ConversionResult::failed(e.to_string());
            }
        };

        let previews = match renderer {
            Some(renderer) => render_previews(renderer, &slides),
            None => Vec::new(),
        };

        ConversionResult::succeeded(output.map(Path::to_path_buf), previews, template.slide_count())
    }

    /// Analyze, paginate and save. Returns the slides that were written.
    pub fn build<D, T>(
        &self,
        document: &mut D,
        template: &mut T,
        output: Option<&Path>,
    ) -> Result<Vec<SlideSpec>>
    where
        D: DocumentSource + ?Sized,
        T: SlideTemplate + ?Sized,
    {
        log::info!("Analyzing document structure");
        let blocks = self.analyzer.analyze_source(document)?;

        log::info!("Building slides from {} blocks", blocks.len());
        let slides = self.mapper.create_slides(&blocks, template)?;

        if let Some(path) = output {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            log::info!("Saving presentation to {}", path.display());
            template.save(path)?;
        }

        Ok(slides)
    }
}

fn render_previews(renderer: &dyn PreviewRenderer, slides: &[SlideSpec]) -> Vec<PathBuf> {
    match renderer.render(slides) {
        Ok(images) => images,
        Err(e) => {
            log::warn!("Preview generation failed, continuing without previews: {}", e);
            Vec::new()
        }
    }
}

/// Default preview directory for a deck: `<dir>/<stem>_preview`.
pub fn preview_dir_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("presentation");
    let name = format!("{}_preview", stem);
    match output.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}
