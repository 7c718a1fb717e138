//! PPTX (Office Open XML) template backend.
//!
//! Loads a .pptx template, exposes the layouts of its first slide master,
//! replaces its slides and writes the result back as a .pptx package.

pub mod package;
pub mod slide;
pub mod template;

pub use template::PptxTemplate;
