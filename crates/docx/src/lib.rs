//! DOCX (Office Open XML) reader backend for Word to PowerPoint conversion.
//!
//! Reads the body paragraphs of a .docx file, which is a ZIP archive
//! containing WordprocessingML documents.

pub mod parser;

pub use parser::{DocxParser, DocxSource};
