//! Slide part XML: generation for new slides and text extraction for
//! existing ones.

use crate::package::local_name;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;
use w2p_core::{Error, Placeholder, PlaceholderKind, Result, SlideLayout, SlideSpec};

const SLIDE_HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

const SLIDE_FOOTER: &str =
    "</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>";

/// Build the XML of a slide on `layout` carrying `slide`'s text.
///
/// Every text placeholder of the layout is instantiated so the slide
/// inherits its geometry. The title goes into the title placeholder and the
/// body lines, one paragraph each, into placeholder idx 1. Date, footer,
/// slide number and non-text placeholders are left to the layout.
pub fn slide_xml(layout: &SlideLayout, slide: &SlideSpec) -> String {
    let mut xml = String::from(SLIDE_HEADER);
    let body_idx = layout.body_placeholder().map(|p| p.idx);
    let mut shape_id = 2;

    for placeholder in &layout.placeholders {
        if placeholder.kind.is_furniture() || placeholder.kind == PlaceholderKind::Other {
            continue;
        }

        let paragraphs: Vec<&str> = if placeholder.kind.is_title() {
            vec![slide.title.as_str()]
        } else if Some(placeholder.idx) == body_idx && !slide.body.is_empty() {
            slide.body.iter().map(String::as_str).collect()
        } else {
            Vec::new()
        };

        xml.push_str(&shape_xml(placeholder, shape_id, &paragraphs));
        shape_id += 1;
    }

    if layout.title_placeholder().is_none() {
        log::debug!(
            "Layout '{}' has no title placeholder, dropping title '{}'",
            layout.name,
            slide.title
        );
    }

    xml.push_str(SLIDE_FOOTER);
    xml
}

fn shape_xml(placeholder: &Placeholder, shape_id: u32, paragraphs: &[&str]) -> String {
    let mut ph = String::from("<p:ph");
    if let Some(kind) = placeholder.kind.as_ooxml() {
        ph.push_str(&format!(r#" type="{}""#, kind));
    }
    if placeholder.idx != 0 {
        ph.push_str(&format!(r#" idx="{}""#, placeholder.idx));
    }
    ph.push_str("/>");

    let mut body = String::new();
    for paragraph in paragraphs {
        body.push_str(&paragraph_xml(paragraph));
    }
    if body.is_empty() {
        body.push_str("<a:p/>");
    }

    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name} {id}"/><p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr>{ph}</p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{body}</p:txBody></p:sp>"#,
        id = shape_id,
        name = shape_name(placeholder.kind),
        ph = ph,
        body = body
    )
}

/// One `a:p`; embedded newlines become `a:br` line breaks.
fn paragraph_xml(text: &str) -> String {
    let text = xml_safe(text);
    let mut xml = String::from("<a:p>");
    for (i, line) in text.split('\n').enumerate() {
        if i > 0 {
            xml.push_str("<a:br/>");
        }
        if !line.is_empty() {
            xml.push_str(&format!("<a:r><a:t>{}</a:t></a:r>", escape(line)));
        }
    }
    xml.push_str("</a:p>");
    xml
}

/// Drop characters XML 1.0 cannot carry.
fn xml_safe(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n'))
        .collect()
}

fn shape_name(kind: PlaceholderKind) -> &'static str {
    match kind {
        PlaceholderKind::Title | PlaceholderKind::CenteredTitle => "Title",
        PlaceholderKind::Subtitle => "Subtitle",
        PlaceholderKind::Body => "Text Placeholder",
        _ => "Content Placeholder",
    }
}

/// Text of a shape on a slide, with its offset in EMU.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SlideShape {
    pub text: String,
    pub x: f64,
    pub y: f64,
}

/// Extract shapes with text from slide XML, top-to-bottom then
/// left-to-right. Paragraphs of a shape are joined with newlines.
pub fn extract_shapes(xml_content: &str) -> Result<Vec<SlideShape>> {
    let mut shapes = Vec::new();
    let mut reader = Reader::from_str(xml_content);
    reader.trim_text(true);

    let mut current_shape: Option<SlideShape> = None;
    let mut in_text_body = false;
    let mut in_paragraph = false;
    let mut current_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" => current_shape = Some(SlideShape::default()),
                    b"off" => set_offset(&mut current_shape, e),
                    b"txBody" => in_text_body = true,
                    b"p" if in_text_body => {
                        in_paragraph = true;
                        if !current_text.is_empty() {
                            current_text.push('\n');
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"off" => set_offset(&mut current_shape, e),
                    b"br" if in_paragraph => current_text.push('\n'),
                    b"p" if in_text_body && !current_text.is_empty() => current_text.push('\n'),
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                if in_paragraph {
                    let text = e
                        .unescape()
                        .map_err(|e| Error::TemplateError(format!("Bad slide text: {}", e)))?;
                    current_text.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sp" => {
                        if let Some(mut shape) = current_shape.take() {
                            shape.text = current_text.trim().to_string();
                            if !shape.text.is_empty() {
                                shapes.push(shape);
                            }
                        }
                        current_text.clear();
                        in_text_body = false;
                        in_paragraph = false;
                    }
                    b"txBody" => in_text_body = false,
                    b"p" => in_paragraph = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::TemplateError(format!("Error parsing slide: {}", e)));
            }
            _ => {}
        }
    }

    shapes.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(std::cmp::Ordering::Equal))
    });

    Ok(shapes)
}

fn set_offset(shape: &mut Option<SlideShape>, e: &quick_xml::events::BytesStart) {
    let Some(shape) = shape else {
        return;
    };
    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"x" => shape.x = value.parse().unwrap_or(shape.x),
            b"y" => shape.y = value.parse().unwrap_or(shape.y),
            _ => {}
        }
    }
}

/// Extract a part number from a name like "rId2" or "slide3.xml".
pub fn extract_part_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".rels").trim_end_matches(".xml");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
