//! DOCX file parser implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use unicode_normalization::UnicodeNormalization;
use w2p_core::{Alignment, DocumentSource, Error, Paragraph, Result, RunFormatting};
use zip::ZipArchive;

/// Fallback location of the main document part.
const DEFAULT_DOCUMENT_PATH: &str = "word/document.xml";

/// Parser for DOCX (Office Open XML) files.
pub struct DocxParser;

impl DocxParser {
    /// Create a new DOCX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse the body paragraphs of a DOCX file from a reader.
    ///
    /// Paragraphs inside tables and text boxes are not returned.
    pub fn parse<R: Read + Seek>(&self, reader: R) -> Result<Vec<Paragraph>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::DocumentParseError(format!("Failed to open ZIP: {}", e)))?;

        let document_path = self.get_document_path(&mut archive)?;
        log::debug!("Main document part: {}", document_path);

        let content = self.read_file_from_archive(&mut archive, &document_path)?;
        self.parse_document_xml(&content)
    }

    /// Find the main document part through the package relationships.
    fn get_document_path<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<String> {
        let rels_content = match self.read_file_from_archive(archive, "_rels/.rels") {
            Ok(content) => content,
            Err(_) => return Ok(DEFAULT_DOCUMENT_PATH.to_string()),
        };

        let mut reader = Reader::from_str(&rels_content);
        reader.trim_text(true);

        loop {
            match reader.read_event() {
                Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                    if local_name(e.name().as_ref()) == b"Relationship" =>
                {
                    let mut rel_type = String::new();
                    let mut target = String::new();

                    for attr in e.attributes().flatten() {
                        match attr.key.as_ref() {
                            b"Type" => rel_type = String::from_utf8_lossy(&attr.value).to_string(),
                            b"Target" => target = String::from_utf8_lossy(&attr.value).to_string(),
                            _ => {}
                        }
                    }

                    if rel_type.ends_with("/officeDocument") && !target.is_empty() {
                        return Ok(target.trim_start_matches('/').to_string());
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::DocumentParseError(format!(
                        "Error parsing package relationships: {}",
                        e
                    )));
                }
                _ => {}
            }
        }

        Ok(DEFAULT_DOCUMENT_PATH.to_string())
    }

    /// Extract paragraphs from a `word/document.xml` body.
    pub fn parse_document_xml(&self, xml_content: &str) -> Result<Vec<Paragraph>> {
        let mut paragraphs = Vec::new();
        let mut reader = Reader::from_str(xml_content);
        reader.trim_text(false);

        let mut state = BodyState::default();

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"tbl" => state.table_depth += 1,
                        b"txbxContent" => state.textbox_depth += 1,
                        b"rPrChange" | b"pPrChange" => state.revision_depth += 1,
                        _ if state.skipping() => {}
                        b"p" => state.paragraph = Some(Paragraph::default()),
                        b"pPr" => state.in_paragraph_props = true,
                        b"r" if !state.in_paragraph_props => {
                            if let Some(ref mut paragraph) = state.paragraph {
                                paragraph.runs.push(RunFormatting::default());
                                state.in_run = true;
                            }
                        }
                        b"rPr" if state.in_run => state.in_run_props = true,
                        b"t" if state.in_run => state.in_text = true,
                        other => state.apply_element(other, e),
                    }
                }
                Ok(Event::Empty(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        _ if state.skipping() => {}
                        b"p" => paragraphs.push(Paragraph::default()),
                        other => state.apply_element(other, e),
                    }
                }
                Ok(Event::Text(ref e)) => {
                    if state.in_text && !state.skipping() {
                        let text = e.unescape().map_err(|err| {
                            Error::DocumentParseError(format!("Invalid text content: {}", err))
                        })?;
                        state.push_text(&text);
                    }
                }
                Ok(Event::End(ref e)) => {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"tbl" => state.table_depth = state.table_depth.saturating_sub(1),
                        b"txbxContent" => {
                            state.textbox_depth = state.textbox_depth.saturating_sub(1)
                        }
                        b"rPrChange" | b"pPrChange" => {
                            state.revision_depth = state.revision_depth.saturating_sub(1)
                        }
                        _ if state.skipping() => {}
                        b"p" => {
                            if let Some(mut paragraph) = state.paragraph.take() {
                                paragraph.text = paragraph.text.nfc().collect();
                                paragraphs.push(paragraph);
                            }
                            state.in_run = false;
                            state.in_run_props = false;
                            state.in_paragraph_props = false;
                        }
                        b"pPr" => state.in_paragraph_props = false,
                        b"r" => {
                            state.in_run = false;
                            state.in_run_props = false;
                        }
                        b"rPr" => state.in_run_props = false,
                        b"t" => state.in_text = false,
                        _ => {}
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => {
                    return Err(Error::DocumentParseError(format!(
                        "XML error at position {}: {}",
                        reader.buffer_position(),
                        e
                    )));
                }
                _ => {}
            }
        }

        log::debug!("Read {} paragraphs", paragraphs.len());

        Ok(paragraphs)
    }

    /// Read a file from the ZIP archive.
    fn read_file_from_archive<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        path: &str,
    ) -> Result<String> {
        let mut file = archive.by_name(path).map_err(|e| {
            Error::DocumentParseError(format!("File not found in archive '{}': {}", path, e))
        })?;

        let mut content = String::new();
        file.read_to_string(&mut content)
            .map_err(|e| Error::DocumentParseError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }
}

impl Default for DocxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// A DOCX file used as a paragraph source. Can be read once.
pub struct DocxSource<R> {
    reader: Option<R>,
}

impl<R: Read + Seek> DocxSource<R> {
    /// Wrap a reader positioned anywhere in a DOCX file.
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
        }
    }
}

impl DocxSource<BufReader<File>> {
    /// Open a DOCX file on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::DocumentParseError(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: Read + Seek> DocumentSource for DocxSource<R> {
    fn paragraphs(&mut self) -> Result<Vec<Paragraph>> {
        let reader = self
            .reader
            .take()
            .ok_or_else(|| Error::DocumentParseError("document was already read".to_string()))?;
        DocxParser::new().parse(reader)
    }
}

/// Where the body walker currently is.
#[derive(Debug, Default)]
struct BodyState {
    paragraph: Option<Paragraph>,
    table_depth: usize,
    textbox_depth: usize,
    /// Depth inside tracked property changes, which hold the old properties.
    revision_depth: usize,
    in_paragraph_props: bool,
    in_run: bool,
    in_run_props: bool,
    in_text: bool,
}

impl BodyState {
    /// Tables and text boxes are not part of the paragraph flow, and
    /// tracked property changes describe formatting that no longer applies.
    fn skipping(&self) -> bool {
        self.table_depth > 0 || self.textbox_depth > 0 || self.revision_depth > 0
    }

    fn push_text(&mut self, text: &str) {
        if let Some(ref mut paragraph) = self.paragraph {
            paragraph.text.push_str(text);
        }
    }

    /// Handle a property or inline element that may be empty or not.
    fn apply_element(&mut self, name: &[u8], e: &BytesStart) {
        let Some(ref mut paragraph) = self.paragraph else {
            return;
        };

        if self.in_run_props {
            let Some(run) = paragraph.runs.last_mut() else {
                return;
            };
            match name {
                b"b" => run.bold = Some(toggle_value(e)),
                b"i" => run.italic = Some(toggle_value(e)),
                b"sz" => {
                    if let Some(half_points) = attr_value(e, b"val").and_then(|v| v.parse::<f32>().ok()) {
                        run.font_size_pt = Some(half_points / 2.0);
                    }
                }
                _ => {}
            }
        } else if self.in_paragraph_props {
            if name == b"jc" {
                paragraph.alignment = attr_value(e, b"val").and_then(|v| Alignment::from_ooxml(&v));
            }
        } else if self.in_run {
            match name {
                b"tab" => paragraph.text.push('\t'),
                b"br" | b"cr" => paragraph.text.push('\n'),
                b"noBreakHyphen" => paragraph.text.push('-'),
                _ => {}
            }
        }
    }
}

/// Read an OOXML on/off property: a missing `val` means on.
fn toggle_value(e: &BytesStart) -> bool {
    match attr_value(e, b"val") {
        None => true,
        Some(v) => matches!(v.as_str(), "true" | "1" | "on"),
    }
}

/// Value of the attribute with the given local name.
fn attr_value(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| local_name(attr.key.as_ref()) == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}
