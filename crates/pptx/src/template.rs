//! PPTX templates.
//!
//! A template is loaded fully into memory. Layouts are discovered through
//! the first slide master; slides can be cleared and appended, and `save`
//! writes a new package with the presentation part, its relationships and
//! the content types rewritten to match.

use crate::package::{
    local_name, next_relationship_number, parse_relationships, rels_path_for, relative_target,
    resolve_target, write_parts, write_relationships, ContentTypes, Package, Relationship,
    CONTENT_TYPES_PATH, PACKAGE_RELS_PATH, REL_NOTES_SLIDE, REL_OFFICE_DOCUMENT,
    REL_SLIDE_LAYOUT, REL_SLIDE_MASTER, SLIDE_CONTENT_TYPE, SLIDE_LAYOUT_RELATIONSHIP_TYPE,
    SLIDE_RELATIONSHIP_TYPE,
};
use crate::slide::{extract_part_number, extract_shapes, slide_xml};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, Write};
use std::path::Path;
use w2p_core::{
    Error, Placeholder, PlaceholderKind, Result, SlideLayout, SlideSpec, SlideTemplate,
};

/// First `sldId/@id` PowerPoint assigns.
const FIRST_SLIDE_ID: u32 = 256;

/// Children of `p:presentation` that come after `p:sldIdLst`.
const AFTER_SLIDE_LIST: &[&[u8]] = &[
    b"sldSz",
    b"notesSz",
    b"smartTags",
    b"embeddedFontLst",
    b"custShowLst",
    b"photoAlbum",
    b"custDataLst",
    b"kinsoku",
    b"defaultTextStyle",
    b"modifyVerifier",
    b"extLst",
];

#[derive(Debug, Clone)]
struct ExistingSlide {
    id: u32,
    path: String,
}

#[derive(Debug, Clone)]
struct NewSlide {
    layout: usize,
    xml: String,
}

/// A PowerPoint template used as layout source and slide sink.
#[derive(Debug, Clone)]
pub struct PptxTemplate {
    package: Package,
    presentation_path: String,
    layouts: Vec<SlideLayout>,
    layout_paths: Vec<String>,
    existing: Vec<ExistingSlide>,
    removed: BTreeSet<String>,
    added: Vec<NewSlide>,
}

impl PptxTemplate {
    /// Load a template from a `.pptx` file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::TemplateError(format!("Failed to open template {}: {}", path.display(), e))
        })?;
        log::debug!("Loading template {}", path.display());
        Self::from_reader(BufReader::new(file))
    }

    /// Load a template from any seekable reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let package = Package::read(reader)?;

        let presentation_path = parse_relationships(&package.read_str(PACKAGE_RELS_PATH)?)?
            .into_iter()
            .find(|r| r.is(REL_OFFICE_DOCUMENT))
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| "ppt/presentation.xml".to_string());

        let presentation = read_presentation(&package.read_str(&presentation_path)?)?;
        let presentation_rels = package.relationships_of(&presentation_path)?;

        let master_rel = presentation
            .master_rel_ids
            .first()
            .and_then(|id| presentation_rels.iter().find(|r| &r.id == id))
            .or_else(|| presentation_rels.iter().find(|r| r.is(REL_SLIDE_MASTER)))
            .ok_or_else(|| Error::TemplateError("template has no slide master".to_string()))?;
        let master_path = resolve_target(&presentation_path, &master_rel.target);

        let layout_paths = layout_paths(&package, &master_path)?;
        let mut layouts = Vec::with_capacity(layout_paths.len());
        for path in &layout_paths {
            layouts.push(read_layout(&package.read_str(path)?)?);
        }

        let mut existing = Vec::new();
        for (id, rel_id) in presentation.slide_ids {
            match presentation_rels.iter().find(|r| r.id == rel_id) {
                Some(rel) => existing.push(ExistingSlide {
                    id,
                    path: resolve_target(&presentation_path, &rel.target),
                }),
                None => log::warn!("Slide id {} points at unknown relationship {}", id, rel_id),
            }
        }

        log::debug!(
            "Template has {} layouts and {} slides",
            layouts.len(),
            existing.len()
        );

        Ok(Self {
            package,
            presentation_path,
            layouts,
            layout_paths,
            existing,
            removed: BTreeSet::new(),
            added: Vec::new(),
        })
    }

    /// Text of every slide currently in the presentation, one entry per
    /// shape, in slide order.
    pub fn slide_texts(&self) -> Result<Vec<Vec<String>>> {
        let mut texts = Vec::with_capacity(self.slide_count());

        for slide in &self.existing {
            let shapes = extract_shapes(&self.package.read_str(&slide.path)?)?;
            texts.push(shapes.into_iter().map(|s| s.text).collect());
        }
        for slide in &self.added {
            let shapes = extract_shapes(&slide.xml)?;
            texts.push(shapes.into_iter().map(|s| s.text).collect());
        }

        Ok(texts)
    }

    /// Serialize the presentation into a ZIP archive.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let slides_dir = format!("{}/", resolve_target(&self.presentation_path, "slides"));
        let presentation_rels_path = rels_path_for(&self.presentation_path);

        let mut next_number = self
            .package
            .parts()
            .iter()
            .filter(|p| !self.removed.contains(&p.name))
            .filter(|p| p.name.starts_with(&slides_dir) && p.name.ends_with(".xml"))
            .filter_map(|p| extract_part_number(&p.name))
            .max()
            .unwrap_or(0)
            + 1;

        let mut relationships: Vec<Relationship> = self
            .package
            .relationships_of(&self.presentation_path)?
            .into_iter()
            .filter(|r| {
                r.external
                    || !self
                        .removed
                        .contains(&resolve_target(&self.presentation_path, &r.target))
            })
            .collect();
        let mut next_rel = next_relationship_number(&relationships);

        let mut content_types = ContentTypes::parse(&self.package.read_str(CONTENT_TYPES_PATH)?)?;
        for part in &self.removed {
            content_types.remove_part(part);
        }

        let mut slide_ids: Vec<(u32, String)> = Vec::new();
        for slide in &self.existing {
            let rel = relationships
                .iter()
                .find(|r| resolve_target(&self.presentation_path, &r.target) == slide.path)
                .ok_or_else(|| {
                    Error::TemplateError(format!("No relationship for slide {}", slide.path))
                })?;
            slide_ids.push((slide.id, rel.id.clone()));
        }
        let mut next_id = slide_ids
            .iter()
            .map(|(id, _)| *id + 1)
            .max()
            .unwrap_or(FIRST_SLIDE_ID)
            .max(FIRST_SLIDE_ID);

        let mut generated: Vec<(String, Vec<u8>)> = Vec::new();
        for slide in &self.added {
            let path = format!("{}slide{}.xml", slides_dir, next_number);
            let rel_id = format!("rId{}", next_rel);

            let layout_rel = Relationship {
                id: "rId1".to_string(),
                rel_type: SLIDE_LAYOUT_RELATIONSHIP_TYPE.to_string(),
                target: relative_target(&path, &self.layout_paths[slide.layout]),
                external: false,
            };

            relationships.push(Relationship {
                id: rel_id.clone(),
                rel_type: SLIDE_RELATIONSHIP_TYPE.to_string(),
                target: relative_target(&self.presentation_path, &path),
                external: false,
            });
            content_types.add_part(&path, SLIDE_CONTENT_TYPE);
            slide_ids.push((next_id, rel_id));

            generated.push((rels_path_for(&path), write_relationships(&[layout_rel]).into_bytes()));
            generated.push((path, slide.xml.clone().into_bytes()));

            next_number += 1;
            next_rel += 1;
            next_id += 1;
        }

        let presentation = rewrite_slide_list(
            &self.package.read_str(&self.presentation_path)?,
            &slide_ids,
        )?
        .into_bytes();
        let presentation_rels = write_relationships(&relationships).into_bytes();
        let content_types = content_types.to_xml().into_bytes();

        let generated_names: BTreeSet<&str> = generated.iter().map(|(n, _)| n.as_str()).collect();
        let mut entries: Vec<(&str, &[u8])> = Vec::with_capacity(self.package.parts().len());
        for part in self.package.parts() {
            if self.removed.contains(&part.name) || generated_names.contains(part.name.as_str()) {
                continue;
            }
            let data: &[u8] = if part.name == CONTENT_TYPES_PATH {
                &content_types
            } else if part.name == self.presentation_path {
                &presentation
            } else if part.name == presentation_rels_path {
                &presentation_rels
            } else {
                &part.data
            };
            entries.push((part.name.as_str(), data));
        }
        entries.extend(generated.iter().map(|(n, d)| (n.as_str(), d.as_slice())));

        write_parts(writer, entries)
    }

    /// Serialize the presentation into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }
}

impl SlideTemplate for PptxTemplate {
    fn layouts(&self) -> &[SlideLayout] {
        &self.layouts
    }

    fn clear_slides(&mut self) {
        for slide in self.existing.drain(..) {
            match self.package.relationships_of(&slide.path) {
                Ok(rels) => {
                    for rel in rels.iter().filter(|r| r.is(REL_NOTES_SLIDE) && !r.external) {
                        let notes = resolve_target(&slide.path, &rel.target);
                        self.removed.insert(rels_path_for(&notes));
                        self.removed.insert(notes);
                    }
                }
                Err(e) => log::warn!("Could not read relationships of {}: {}", slide.path, e),
            }
            self.removed.insert(rels_path_for(&slide.path));
            self.removed.insert(slide.path);
        }
        self.added.clear();
    }

    fn add_slide(&mut self, layout: usize, slide: &SlideSpec) -> Result<()> {
        let layout_def = self
            .layouts
            .get(layout)
            .ok_or_else(|| Error::TemplateError(format!("layout {} does not exist", layout)))?;

        let xml = slide_xml(layout_def, slide);
        self.added.push(NewSlide { layout, xml });
        Ok(())
    }

    fn slide_count(&self) -> usize {
        self.existing.len() + self.added.len()
    }

    fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(file)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PresentationInfo {
    master_rel_ids: Vec<String>,
    /// `(sldId/@id, sldId/@r:id)` in presentation order.
    slide_ids: Vec<(u32, String)>,
}

fn read_presentation(xml: &str) -> Result<PresentationInfo> {
    let mut info = PresentationInfo::default();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"sldMasterId" => {
                        if let Some(rel_id) = relationship_attr(e) {
                            info.master_rel_ids.push(rel_id);
                        }
                    }
                    b"sldId" => {
                        let id = plain_attr(e, b"id").and_then(|v| v.parse::<u32>().ok());
                        if let (Some(id), Some(rel_id)) = (id, relationship_attr(e)) {
                            info.slide_ids.push((id, rel_id));
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::TemplateError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(info)
}

/// Layout parts of a master, in `sldLayoutIdLst` order.
fn layout_paths(package: &Package, master_path: &str) -> Result<Vec<String>> {
    let master_rels = package.relationships_of(master_path)?;
    let master_xml = package.read_str(master_path)?;

    let mut rel_ids = Vec::new();
    let mut reader = Reader::from_str(&master_xml);
    reader.trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldLayoutId" =>
            {
                if let Some(rel_id) = relationship_attr(e) {
                    rel_ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::TemplateError(format!(
                    "Error parsing slide master: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    let targets: Vec<&Relationship> = if rel_ids.is_empty() {
        master_rels.iter().filter(|r| r.is(REL_SLIDE_LAYOUT)).collect()
    } else {
        rel_ids
            .iter()
            .filter_map(|id| master_rels.iter().find(|r| &r.id == id))
            .collect()
    };

    Ok(targets
        .into_iter()
        .map(|r| resolve_target(master_path, &r.target))
        .collect())
}

fn read_layout(xml: &str) -> Result<SlideLayout> {
    let mut name = None;
    let mut placeholders = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e)) => {
                let qname = e.name();
                match local_name(qname.as_ref()) {
                    b"cSld" if name.is_none() => {
                        name = Some(plain_attr(e, b"name").unwrap_or_default());
                    }
                    b"ph" => {
                        let kind = PlaceholderKind::from_ooxml(plain_attr(e, b"type").as_deref());
                        let idx = plain_attr(e, b"idx")
                            .and_then(|v| v.parse::<u32>().ok())
                            .unwrap_or(0);
                        placeholders.push(Placeholder::new(kind, idx));
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::TemplateError(format!("Error parsing slide layout: {}", e)));
            }
            _ => {}
        }
    }

    Ok(SlideLayout::new(name.unwrap_or_default(), placeholders))
}

/// Replace the slide list of `presentation.xml` with `slide_ids`.
///
/// The list is inserted at its schema position when the presentation has
/// none, and dropped entirely when there are no slides.
fn rewrite_slide_list(xml: &str, slide_ids: &[(u32, String)]) -> Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut writer = Writer::new(Vec::new());
    let mut prefix = String::from("p");
    let mut depth = 0usize;
    let mut skipping = false;
    let mut written = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::TemplateError(format!("Error parsing presentation: {}", e)))?;

        match event {
            Event::Eof => break,
            Event::Start(ref e) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if depth == 0 {
                    prefix = element_prefix(name.as_ref());
                }
                depth += 1;
                if skipping {
                    continue;
                }
                if depth == 2 && local == b"sldIdLst" {
                    write_slide_list(&mut writer, &prefix, slide_ids)?;
                    written = true;
                    skipping = true;
                    continue;
                }
                if depth == 2 && !written && AFTER_SLIDE_LIST.contains(&local) {
                    write_slide_list(&mut writer, &prefix, slide_ids)?;
                    written = true;
                }
                write_event(&mut writer, Event::Start(e.clone()))?;
            }
            Event::Empty(ref e) => {
                if skipping {
                    continue;
                }
                let name = e.name();
                let local = local_name(name.as_ref());
                if depth == 1 && local == b"sldIdLst" {
                    write_slide_list(&mut writer, &prefix, slide_ids)?;
                    written = true;
                    continue;
                }
                if depth == 1 && !written && AFTER_SLIDE_LIST.contains(&local) {
                    write_slide_list(&mut writer, &prefix, slide_ids)?;
                    written = true;
                }
                write_event(&mut writer, Event::Empty(e.clone()))?;
            }
            Event::End(ref e) => {
                depth = depth.saturating_sub(1);
                if skipping {
                    if depth == 1 {
                        skipping = false;
                    }
                    continue;
                }
                if depth == 0 && !written {
                    write_slide_list(&mut writer, &prefix, slide_ids)?;
                    written = true;
                }
                write_event(&mut writer, Event::End(e.clone()))?;
            }
            other => {
                if !skipping {
                    write_event(&mut writer, other)?;
                }
            }
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::TemplateError(format!("Presentation is not UTF-8: {}", e)))
}

fn write_slide_list(
    writer: &mut Writer<Vec<u8>>,
    prefix: &str,
    slide_ids: &[(u32, String)],
) -> Result<()> {
    if slide_ids.is_empty() {
        return Ok(());
    }

    let list = qualified(prefix, "sldIdLst");
    let item = qualified(prefix, "sldId");
    write_event(writer, Event::Start(BytesStart::new(list.as_str())))?;
    for (id, rel_id) in slide_ids {
        let id = id.to_string();
        let element = BytesStart::new(item.as_str())
            .with_attributes([("id", id.as_str()), ("r:id", rel_id.as_str())]);
        write_event(writer, Event::Empty(element))?;
    }
    write_event(writer, Event::End(BytesEnd::new(list.as_str())))
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::TemplateError(format!("Failed to write presentation: {}", e)))
}

fn element_prefix(name: &[u8]) -> String {
    match name.iter().position(|&b| b == b':') {
        Some(pos) => String::from_utf8_lossy(&name[..pos]).to_string(),
        None => String::new(),
    }
}

fn qualified(prefix: &str, local: &str) -> String {
    if prefix.is_empty() {
        local.to_string()
    } else {
        format!("{}:{}", prefix, local)
    }
}

/// An unprefixed attribute value.
fn plain_attr(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == key)
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

/// The `r:id` attribute, whatever the relationships namespace is bound to.
fn relationship_attr(e: &BytesStart) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| {
            let key = a.key.as_ref();
            key.contains(&b':') && local_name(key) == b"id"
        })
        .map(|a| String::from_utf8_lossy(&a.value).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use w2p_core::{Converter, SlideKind};

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/slideLayouts/slideLayout2.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/slides/slide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/><Override PartName="/ppt/notesSlides/notesSlide1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.notesSlide+xml"/></Types>"#;

    const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="ppt/presentation.xml"/></Relationships>"#;

    const PRESENTATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst><p:sldSz cx="12192000" cy="6858000"/><p:notesSz cx="6858000" cy="9144000"/></p:presentation>"#;

    const PRESENTATION_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster" Target="slideMasters/slideMaster1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide" Target="slides/slide1.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/theme" Target="theme/theme1.xml"/></Relationships>"#;

    const MASTER: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldMaster xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree/></p:cSld><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId2"/><p:sldLayoutId id="2147483650" r:id="rId1"/></p:sldLayoutIdLst></p:sldMaster>"#;

    const MASTER_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout2.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/></Relationships>"#;

    const TITLE_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="title"><p:cSld name="Title Slide"><p:spTree><p:sp><p:nvSpPr><p:nvPr><p:ph type="ctrTitle"/></p:nvPr></p:nvSpPr></p:sp><p:sp><p:nvSpPr><p:nvPr><p:ph type="subTitle" idx="1"/></p:nvPr></p:nvSpPr></p:sp><p:sp><p:nvSpPr><p:nvPr><p:ph type="dt" sz="half" idx="10"/></p:nvPr></p:nvSpPr></p:sp></p:spTree></p:cSld></p:sldLayout>"#;

    const CONTENT_LAYOUT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sldLayout xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" type="obj"><p:cSld name="Title and Content"><p:spTree><p:sp><p:nvSpPr><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr></p:sp><p:sp><p:nvSpPr><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr></p:sp><p:sp><p:nvSpPr><p:nvPr><p:ph type="ftr" sz="quarter" idx="11"/></p:nvPr></p:nvSpPr></p:sp></p:spTree></p:cSld></p:sldLayout>"#;

    const SAMPLE_SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><p:cSld><p:spTree><p:sp><p:spPr><a:xfrm><a:off x="100" y="2000"/></a:xfrm></p:spPr><p:txBody><a:p><a:r><a:t>Sample body</a:t></a:r></a:p></p:txBody></p:sp><p:sp><p:spPr><a:xfrm><a:off x="100" y="100"/></a:xfrm></p:spPr><p:txBody><a:p><a:r><a:t>Sample Title</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;

    const SAMPLE_SLIDE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide" Target="../notesSlides/notesSlide1.xml"/></Relationships>"#;

    fn fixture(presentation: &str) -> Vec<u8> {
        let parts: Vec<(&str, &[u8])> = vec![
            ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
            ("_rels/.rels", PACKAGE_RELS.as_bytes()),
            ("ppt/presentation.xml", presentation.as_bytes()),
            ("ppt/_rels/presentation.xml.rels", PRESENTATION_RELS.as_bytes()),
            ("ppt/slideMasters/slideMaster1.xml", MASTER.as_bytes()),
            ("ppt/slideMasters/_rels/slideMaster1.xml.rels", MASTER_RELS.as_bytes()),
            ("ppt/slideLayouts/slideLayout1.xml", TITLE_LAYOUT.as_bytes()),
            ("ppt/slideLayouts/slideLayout2.xml", CONTENT_LAYOUT.as_bytes()),
            ("ppt/slides/slide1.xml", SAMPLE_SLIDE.as_bytes()),
            ("ppt/slides/_rels/slide1.xml.rels", SAMPLE_SLIDE_RELS.as_bytes()),
            ("ppt/notesSlides/notesSlide1.xml", "<p:notes/>".as_bytes()),
            ("ppt/theme/theme1.xml", "<a:theme/>".as_bytes()),
        ];
        write_parts(Cursor::new(Vec::new()), parts)
            .unwrap()
            .into_inner()
    }

    fn load(presentation: &str) -> PptxTemplate {
        PptxTemplate::from_reader(Cursor::new(fixture(presentation))).unwrap()
    }

    fn reopen(template: &PptxTemplate) -> (PptxTemplate, Package) {
        let bytes = template.to_bytes().unwrap();
        (
            PptxTemplate::from_reader(Cursor::new(bytes.clone())).unwrap(),
            Package::read(Cursor::new(bytes)).unwrap(),
        )
    }

    fn content_slide(title: &str, body: &[&str]) -> SlideSpec {
        let mut slide = SlideSpec::new(SlideKind::Content, title);
        slide.body = body.iter().map(|s| s.to_string()).collect();
        slide
    }

    #[test]
    fn test_loads_layouts_in_master_order() {
        let template = load(PRESENTATION);

        let names: Vec<_> = template.layouts().iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["Title Slide", "Title and Content"]);

        let title = &template.layouts()[0];
        assert_eq!(
            title.placeholders,
            vec![
                Placeholder::new(PlaceholderKind::CenteredTitle, 0),
                Placeholder::new(PlaceholderKind::Subtitle, 1),
                Placeholder::new(PlaceholderKind::Date, 10),
            ]
        );
        assert_eq!(
            template.layouts()[1].body_placeholder(),
            Some(&Placeholder::new(PlaceholderKind::Object, 1))
        );
        assert_eq!(template.slide_count(), 1);
    }

    #[test]
    fn test_existing_slide_texts() {
        let template = load(PRESENTATION);
        assert_eq!(
            template.slide_texts().unwrap(),
            vec![vec!["Sample Title".to_string(), "Sample body".to_string()]]
        );
    }

    #[test]
    fn test_clear_and_add_slides() {
        let mut template = load(PRESENTATION);
        template.clear_slides();
        assert_eq!(template.slide_count(), 0);

        template
            .add_slide(0, &SlideSpec::new(SlideKind::Title, "報告"))
            .unwrap();
        template
            .add_slide(1, &content_slide("前言", &["a & b", "second"]))
            .unwrap();
        assert_eq!(
            template.added.iter().map(|s| s.layout).collect::<Vec<_>>(),
            vec![0, 1]
        );

        let (reloaded, package) = reopen(&template);
        assert_eq!(reloaded.slide_count(), 2);
        assert_eq!(reloaded.layouts(), template.layouts());
        assert_eq!(
            reloaded.slide_texts().unwrap(),
            vec![
                vec!["報告".to_string()],
                vec!["前言".to_string(), "a & b\nsecond".to_string()],
            ]
        );

        assert!(!package.contains("ppt/notesSlides/notesSlide1.xml"));
        assert!(package.contains("ppt/slides/slide2.xml"));
        assert!(package.contains("ppt/theme/theme1.xml"));

        let presentation = package.read_str("ppt/presentation.xml").unwrap();
        assert!(presentation.contains(r#"<p:sldId id="256" r:id="rId4"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId5"/>"#));
        assert!(!presentation.contains(r#"r:id="rId2""#));
        assert!(presentation.contains("<p:sldSz"));

        let rels = package.relationships_of("ppt/presentation.xml").unwrap();
        let ids: Vec<_> = rels.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["rId1", "rId3", "rId4", "rId5"]);

        let slide_rels = package.relationships_of("ppt/slides/slide2.xml").unwrap();
        assert_eq!(slide_rels[0].target, "../slideLayouts/slideLayout2.xml");

        let content_types = package.read_str(CONTENT_TYPES_PATH).unwrap();
        assert!(!content_types.contains("notesSlide1.xml"));
        assert!(content_types.contains(r#"PartName="/ppt/slides/slide2.xml""#));
    }

    #[test]
    fn test_append_keeps_existing_slides() {
        let mut template = load(PRESENTATION);
        template.add_slide(1, &content_slide("New", &["x"])).unwrap();
        assert_eq!(template.slide_count(), 2);

        let (reloaded, package) = reopen(&template);
        assert_eq!(reloaded.slide_count(), 2);
        assert!(package.contains("ppt/notesSlides/notesSlide1.xml"));
        assert!(package.contains("ppt/slides/slide2.xml"));

        let presentation = package.read_str("ppt/presentation.xml").unwrap();
        assert!(presentation.contains(r#"<p:sldId id="256" r:id="rId2"/>"#));
        assert!(presentation.contains(r#"<p:sldId id="257" r:id="rId4"/>"#));
    }

    #[test]
    fn test_slide_list_inserted_when_missing() {
        let presentation =
            PRESENTATION.replace(r#"<p:sldIdLst><p:sldId id="256" r:id="rId2"/></p:sldIdLst>"#, "");
        let mut template = load(&presentation);
        assert_eq!(template.slide_count(), 0);

        template.clear_slides();
        template
            .add_slide(0, &SlideSpec::new(SlideKind::Title, "Only"))
            .unwrap();

        let (_, package) = reopen(&template);
        let xml = package.read_str("ppt/presentation.xml").unwrap();
        let list = xml.find("<p:sldIdLst>").unwrap();
        assert!(xml.find("</p:sldMasterIdLst>").unwrap() < list);
        assert!(list < xml.find("<p:sldSz").unwrap());
    }

    #[test]
    fn test_clear_without_new_slides_drops_list() {
        let mut template = load(PRESENTATION);
        template.clear_slides();

        let (reloaded, package) = reopen(&template);
        assert_eq!(reloaded.slide_count(), 0);
        let xml = package.read_str("ppt/presentation.xml").unwrap();
        assert!(!xml.contains("sldIdLst"));
        assert!(!package.contains("ppt/slides/slide1.xml"));
    }

    #[test]
    fn test_unknown_layout_is_rejected() {
        let mut template = load(PRESENTATION);
        let err = template
            .add_slide(7, &SlideSpec::new(SlideKind::Title, "x"))
            .unwrap_err();
        assert!(matches!(err, Error::TemplateError(_)));
    }

    #[test]
    fn test_not_a_presentation() {
        let err = PptxTemplate::from_reader(Cursor::new(b"plain text".to_vec())).unwrap_err();
        assert!(matches!(err, Error::TemplateError(_)));

        let err = PptxTemplate::open("/nonexistent/template.pptx").unwrap_err();
        assert!(err.to_string().starts_with("Template error"));
    }

    #[test]
    fn test_convert_into_pptx() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("deck.pptx");

        let mut paragraphs: Vec<w2p_core::Paragraph> = ["年度報告", "一、前言", "內容一", "內容二"]
            .iter()
            .map(|t| w2p_core::Paragraph::new(*t))
            .collect();
        let mut template = load(PRESENTATION);

        let result = Converter::new().convert(&mut paragraphs, &mut template, Some(&output), None);
        assert!(result.success, "{}", result.error_message);
        assert_eq!(result.slide_count, 2);

        let saved = PptxTemplate::open(&output).unwrap();
        assert_eq!(
            saved.slide_texts().unwrap(),
            vec![
                vec!["年度報告".to_string()],
                vec!["前言".to_string(), "內容一\n內容二".to_string()],
            ]
        );
    }
}
