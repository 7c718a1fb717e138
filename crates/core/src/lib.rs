//! Core of the Word to PowerPoint converter: heading classification,
//! document analysis, slide pagination and conversion orchestration.

pub mod analyze;
pub mod classify;
pub mod convert;
pub mod error;
pub mod paginate;
pub mod preview;
pub mod template;
pub mod titles;
pub mod types;

pub use analyze::{estimate_display_length, DocumentAnalyzer, DocumentSource};
pub use classify::PatternClassifier;
pub use convert::{preview_dir_for, Converter};
pub use error::{Error, Result};
pub use paginate::{BreakPolicy, MapperConfig, Pager, SlideMapper};
pub use preview::{PreviewRenderer, SvgPreviewRenderer};
pub use template::{
    select_layout, MemoryTemplate, Placeholder, PlaceholderKind, SlideLayout, SlideTemplate,
};
pub use titles::{clean_chapter_title, clean_content_title, clean_subtitle_title};
pub use types::{
    Alignment, ContentBlock, ContentType, ConversionResult, Formatting, Paragraph, RunFormatting,
    SlideKind, SlideSpec,
};
