//! Slide pagination.
//!
//! Packs classified blocks onto slides. Headers open title slides, chapters
//! open content slides, subtitles always start a continuation slide, and
//! body text flows onto the open slide until the item or length budget is
//! exhausted, at which point a continuation slide titled
//! `"<chapter> (續)"` takes over.

use crate::error::{Error, Result};
use crate::template::{select_layout, SlideTemplate};
use crate::titles::{clean_chapter_title, clean_content_title};
use crate::types::{ContentBlock, ContentType, SlideKind, SlideSpec};
use serde::{Deserialize, Serialize};

/// Suffix appended to the chapter title on continuation slides.
pub const CONTINUATION_SUFFIX: &str = " (續)";

/// Pagination budgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Maximum number of body items on one slide.
    pub max_content_items: usize,

    /// Maximum summed display length of the body items on one slide.
    pub max_content_length: usize,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            max_content_items: 4,
            max_content_length: 220,
        }
    }
}

impl MapperConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the item budget (at least one item per slide).
    pub fn with_max_content_items(mut self, items: usize) -> Self {
        self.max_content_items = items.max(1);
        self
    }

    /// Set the display length budget.
    pub fn with_max_content_length(mut self, length: usize) -> Self {
        self.max_content_length = length;
        self
    }
}

/// Decides when body text overflows the open slide.
#[derive(Debug, Clone, Copy)]
pub struct BreakPolicy {
    config: MapperConfig,
}

impl BreakPolicy {
    pub fn new(config: MapperConfig) -> Self {
        Self { config }
    }

    /// Whether `incoming` must go on a new slide.
    ///
    /// An empty slide always accepts the block, so a block longer than the
    /// whole budget ends up alone on its slide.
    pub fn should_break(
        &self,
        accumulated_items: usize,
        accumulated_length: usize,
        incoming: &ContentBlock,
    ) -> bool {
        if accumulated_items == 0 {
            return false;
        }

        if accumulated_items >= self.config.max_content_items {
            return true;
        }

        accumulated_length + incoming.estimated_length > self.config.max_content_length
    }
}

/// Pager state: either nothing is open or one slide is accumulating.
#[derive(Debug)]
enum State {
    Idle,
    Open { slide: SlideSpec, length: usize },
}

/// Single-pass pagination state machine.
///
/// One pager serves one conversion; feed it blocks in order with
/// [`Pager::push`] and collect the slides with [`Pager::finish`].
#[derive(Debug)]
pub struct Pager {
    policy: BreakPolicy,
    state: State,
    chapter_title: String,
    slides: Vec<SlideSpec>,
}

impl Pager {
    pub fn new(config: MapperConfig) -> Self {
        Self {
            policy: BreakPolicy::new(config),
            state: State::Idle,
            chapter_title: String::new(),
            slides: Vec::new(),
        }
    }

    /// Feed the next block.
    pub fn push(&mut self, block: &ContentBlock) {
        match block.content_type {
            ContentType::Header => self.on_header(block),
            ContentType::Chapter => self.on_chapter(block),
            ContentType::Subtitle => self.on_subtitle(block),
            ContentType::Content => self.on_content(block),
        }
    }

    /// Flush the open slide, even an empty one, and return all slides.
    pub fn finish(mut self) -> Vec<SlideSpec> {
        self.flush();
        self.slides
    }

    fn on_header(&mut self, block: &ContentBlock) {
        self.flush();
        let title = clean_chapter_title(&block.text);
        self.open(SlideKind::Title, title.clone());
        self.chapter_title = title;
    }

    fn on_chapter(&mut self, block: &ContentBlock) {
        self.flush();
        self.open(SlideKind::Content, clean_content_title(&block.text));
        self.chapter_title = block.text.clone();
    }

    fn on_subtitle(&mut self, block: &ContentBlock) {
        // Subtitles always start a new page, whatever the budgets say.
        self.flush();
        self.open_continuation();
        self.append(block);
    }

    fn on_content(&mut self, block: &ContentBlock) {
        let overflow = match &self.state {
            State::Idle => None,
            State::Open { slide, length } => {
                Some(self.policy.should_break(slide.body.len(), *length, block))
            }
        };

        match overflow {
            // Body text before any heading titles its own slide.
            None => self.open(SlideKind::Content, clean_content_title(&block.text)),
            Some(true) => {
                self.flush();
                self.open_continuation();
            }
            Some(false) => {}
        }

        self.append(block);
    }

    fn open(&mut self, kind: SlideKind, title: String) {
        self.state = State::Open {
            slide: SlideSpec::new(kind, title),
            length: 0,
        };
    }

    fn open_continuation(&mut self) {
        let title = format!("{}{}", self.chapter_title, CONTINUATION_SUFFIX);
        self.open(SlideKind::Content, clean_content_title(&title));
    }

    fn append(&mut self, block: &ContentBlock) {
        if let State::Open { slide, length } = &mut self.state {
            slide.body.push(block.text.clone());
            *length += block.estimated_length;
        }
    }

    fn flush(&mut self) {
        if let State::Open { slide, .. } = std::mem::replace(&mut self.state, State::Idle) {
            self.slides.push(slide);
        }
    }
}

/// Maps content blocks onto template slides.
#[derive(Debug, Clone, Default)]
pub struct SlideMapper {
    config: MapperConfig,
}

impl SlideMapper {
    /// Create a mapper with the default budgets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom budgets.
    pub fn with_config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    /// Paginate blocks into slide specs.
    pub fn paginate(&self, blocks: &[ContentBlock]) -> Vec<SlideSpec> {
        let mut pager = Pager::new(self.config);
        for block in blocks {
            pager.push(block);
        }
        pager.finish()
    }

    /// Paginate blocks and write them into `template`.
    ///
    /// The template's existing slides are removed first; only its layouts
    /// are kept. A template without layouts is rejected before anything is
    /// cleared.
    pub fn create_slides<T: SlideTemplate + ?Sized>(
        &self,
        blocks: &[ContentBlock],
        template: &mut T,
    ) -> Result<Vec<SlideSpec>> {
        if template.layouts().is_empty() {
            return Err(Error::TemplateError(
                "template has no slide layouts".to_string(),
            ));
        }

        let title_layout = select_layout(template.layouts(), SlideKind::Title)?;
        let content_layout = select_layout(template.layouts(), SlideKind::Content)?;

        let slides = self.paginate(blocks);

        template.clear_slides();

        for slide in &slides {
            let layout = match slide.kind {
                SlideKind::Title => title_layout,
                SlideKind::Content => content_layout,
            };
            log::debug!(
                "Adding {:?} slide '{}' with {} lines on layout {}",
                slide.kind,
                slide.title,
                slide.body.len(),
                layout
            );
            if !slide.body.is_empty() && template.layouts()[layout].body_placeholder().is_none() {
                log::warn!(
                    "Layout '{}' has no body placeholder, dropping {} lines of '{}'",
                    template.layouts()[layout].name,
                    slide.body.len(),
                    slide.title
                );
            }
            template.add_slide(layout, slide)?;
        }

        log::info!("Created {} slides", template.slide_count());

        Ok(slides)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyze::DocumentAnalyzer;
    use crate::template::MemoryTemplate;
    use crate::types::Paragraph;

    fn block(text: &str, content_type: ContentType) -> ContentBlock {
        ContentBlock::new(text, content_type)
    }

    fn sized(len: usize) -> ContentBlock {
        let mut b = ContentBlock::new("x".repeat(len), ContentType::Content);
        b.estimated_length = len;
        b
    }

    fn titles(slides: &[SlideSpec]) -> Vec<&str> {
        slides.iter().map(|s| s.title.as_str()).collect()
    }

    #[test]
    fn test_break_policy_item_budget() {
        let policy = BreakPolicy::new(MapperConfig::default());
        let incoming = sized(1);
        assert!(!policy.should_break(3, 3, &incoming));
        assert!(policy.should_break(4, 4, &incoming));
        assert!(policy.should_break(9, 9, &incoming));
    }

    #[test]
    fn test_break_policy_length_budget() {
        let policy = BreakPolicy::new(MapperConfig::default());
        assert!(!policy.should_break(1, 200, &sized(20)));
        assert!(policy.should_break(1, 200, &sized(21)));
    }

    #[test]
    fn test_break_policy_empty_slide_accepts_anything() {
        let policy = BreakPolicy::new(MapperConfig::default());
        assert!(!policy.should_break(0, 0, &sized(10_000)));
    }

    #[test]
    fn test_config_builders() {
        let config = MapperConfig::new()
            .with_max_content_items(0)
            .with_max_content_length(100);
        assert_eq!(config.max_content_items, 1);
        assert_eq!(config.max_content_length, 100);

        let parsed: MapperConfig = serde_json::from_str(r#"{"max_content_items": 6}"#).unwrap();
        assert_eq!(parsed.max_content_items, 6);
        assert_eq!(parsed.max_content_length, 220);
    }

    #[test]
    fn test_report_scenario() {
        let blocks = DocumentAnalyzer::new()
            .analyze(&[
                Paragraph::new("報告標題"),
                Paragraph::new("一、前言"),
                Paragraph::new("這是前言內容"),
            ])
            .unwrap();
        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(
            slides,
            vec![
                SlideSpec::new(SlideKind::Title, "報告標題"),
                SlideSpec {
                    kind: SlideKind::Content,
                    title: "前言".to_string(),
                    body: vec!["這是前言內容".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_item_overflow_opens_continuation() {
        let mut blocks = vec![block("一、概述", ContentType::Chapter)];
        blocks.extend((0..5).map(|_| sized(10)));

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(slides.len(), 2);
        assert_eq!(titles(&slides), vec!["概述", "概述 (續)"]);
        assert_eq!(slides[0].body.len(), 4);
        assert_eq!(slides[1].body.len(), 1);
    }

    #[test]
    fn test_oversized_block_sits_alone() {
        let blocks = vec![block("一、概述", ContentType::Chapter), sized(300)];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].body.len(), 1);
    }

    #[test]
    fn test_oversized_block_after_content_moves_on() {
        let blocks = vec![
            block("一、概述", ContentType::Chapter),
            sized(10),
            sized(300),
            sized(10),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        let lengths: Vec<_> = slides.iter().map(|s| s.body.len()).collect();
        assert_eq!(lengths, vec![1, 1, 1]);
        assert_eq!(slides[1].body[0].len(), 300);
    }

    #[test]
    fn test_subtitle_always_breaks() {
        let blocks = vec![
            block("一、概述", ContentType::Chapter),
            block("short", ContentType::Content),
            block("(一) 細節", ContentType::Subtitle),
            block("more", ContentType::Content),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(slides.len(), 2);
        assert_eq!(slides[0].body, vec!["short"]);
        assert_eq!(titles(&slides), vec!["概述", "概述 (續)"]);
        assert_eq!(slides[1].body, vec!["(一) 細節", "more"]);
    }

    #[test]
    fn test_subtitle_breaks_even_on_empty_slide() {
        let blocks = vec![
            block("一、概述", ContentType::Chapter),
            block("(一) 細節", ContentType::Subtitle),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(slides.len(), 2);
        assert!(slides[0].body.is_empty());
        assert_eq!(slides[1].body, vec!["(一) 細節"]);
    }

    #[test]
    fn test_header_slide_collects_following_content() {
        let blocks = vec![
            block("一、年度報告", ContentType::Header),
            block("作者：某人", ContentType::Content),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].kind, SlideKind::Title);
        assert_eq!(slides[0].title, "年度報告");
        assert_eq!(slides[0].body, vec!["作者：某人"]);
    }

    #[test]
    fn test_continuation_after_header_uses_cleaned_header() {
        let blocks = vec![
            block("一、年度報告", ContentType::Header),
            block("(1) 重點", ContentType::Subtitle),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(titles(&slides), vec!["年度報告", "年度報告 (續)"]);
        assert_eq!(slides[1].kind, SlideKind::Content);
    }

    #[test]
    fn test_content_before_any_heading_titles_itself() {
        let blocks = vec![
            block("(1) 開場白", ContentType::Content),
            block("second", ContentType::Content),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, "開場白");
        assert_eq!(slides[0].body, vec!["(1) 開場白", "second"]);
    }

    #[test]
    fn test_empty_open_slide_is_still_emitted() {
        let blocks = vec![
            block("Title", ContentType::Header),
            block("一、A", ContentType::Chapter),
            block("二、B", ContentType::Chapter),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(titles(&slides), vec!["Title", "A", "B"]);
        assert!(slides.iter().all(|s| s.body.is_empty()));
    }

    #[test]
    fn test_no_blocks_no_slides() {
        assert!(SlideMapper::new().paginate(&[]).is_empty());
    }

    #[test]
    fn test_body_lines_are_verbatim() {
        let blocks = vec![
            block("一、A", ContentType::Chapter),
            block("1. keep the marker", ContentType::Content),
        ];

        let slides = SlideMapper::new().paginate(&blocks);

        assert_eq!(slides[0].body, vec!["1. keep the marker"]);
    }

    #[test]
    fn test_create_slides_clears_template_first() {
        let mut template = MemoryTemplate::standard();
        template
            .add_slide(1, &SlideSpec::new(SlideKind::Content, "sample"))
            .unwrap();

        let blocks = vec![
            block("報告", ContentType::Header),
            block("一、前言", ContentType::Chapter),
            block("內容", ContentType::Content),
        ];
        let slides = SlideMapper::new()
            .create_slides(&blocks, &mut template)
            .unwrap();

        assert_eq!(slides.len(), 2);
        assert_eq!(template.slide_count(), 2);
        assert_eq!(template.slides[0].layout, 0);
        assert_eq!(template.slides[0].title.as_deref(), Some("報告"));
        assert_eq!(template.slides[1].layout, 1);
        assert_eq!(template.slides[1].title.as_deref(), Some("前言"));
        assert_eq!(template.slides[1].body, vec!["內容"]);
    }

    #[test]
    fn test_create_slides_without_layouts_fails() {
        let mut template = MemoryTemplate::new(Vec::new());
        let blocks = vec![block("報告", ContentType::Header)];

        let err = SlideMapper::new()
            .create_slides(&blocks, &mut template)
            .unwrap_err();

        assert!(matches!(err, Error::TemplateError(_)));
        assert_eq!(template.slide_count(), 0);
    }

    mod proptests {
        use crate::paginate::{MapperConfig, SlideMapper};
        use crate::types::{ContentBlock, ContentType, SlideKind};
        use proptest::prelude::*;

        fn sized_block(content_type: ContentType, len: usize) -> ContentBlock {
            let mut block = ContentBlock::new("x".repeat(len), content_type);
            block.estimated_length = len;
            block
        }

        fn block_strategy() -> impl Strategy<Value = ContentBlock> {
            prop_oneof![
                1 => Just(ContentBlock::new("一、章", ContentType::Chapter)),
                1 => (1usize..300).prop_map(|len| sized_block(ContentType::Subtitle, len)),
                8 => (1usize..300).prop_map(|len| sized_block(ContentType::Content, len)),
            ]
        }

        fn document_strategy() -> impl Strategy<Value = Vec<ContentBlock>> {
            prop::collection::vec(block_strategy(), 0..40).prop_map(|mut blocks| {
                blocks.insert(0, ContentBlock::new("Title", ContentType::Header));
                blocks
            })
        }

        fn config_strategy() -> impl Strategy<Value = MapperConfig> {
            (1usize..8, 10usize..400).prop_map(|(items, length)| {
                MapperConfig::new()
                    .with_max_content_items(items)
                    .with_max_content_length(length)
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(200))]

            #[test]
            fn prop_slides_respect_budgets(
                blocks in document_strategy(),
                config in config_strategy(),
            ) {
                let slides = SlideMapper::new().with_config(config).paginate(&blocks);

                let mut lengths = blocks
                    .iter()
                    .filter(|b| matches!(b.content_type, ContentType::Content | ContentType::Subtitle))
                    .map(|b| b.estimated_length);

                for slide in &slides {
                    prop_assert!(slide.body.len() <= config.max_content_items, "{:?}", slide);

                    let length: usize = lengths.by_ref().take(slide.body.len()).sum();
                    // Only a single block longer than the whole budget may exceed it.
                    prop_assert!(
                        slide.body.len() == 1 || length <= config.max_content_length,
                        "{} > {} on {:?}",
                        length,
                        config.max_content_length,
                        slide
                    );
                }
                prop_assert_eq!(lengths.next(), None);
            }

            #[test]
            fn prop_body_lines_keep_document_order(
                blocks in document_strategy(),
                config in config_strategy(),
            ) {
                let slides = SlideMapper::new().with_config(config).paginate(&blocks);

                let body: Vec<&str> = slides
                    .iter()
                    .flat_map(|s| s.body.iter().map(String::as_str))
                    .collect();
                let expected: Vec<&str> = blocks
                    .iter()
                    .filter(|b| matches!(b.content_type, ContentType::Content | ContentType::Subtitle))
                    .map(|b| b.text.as_str())
                    .collect();
                prop_assert_eq!(body, expected);
            }

            #[test]
            fn prop_only_the_header_opens_a_title_slide(blocks in document_strategy()) {
                let slides = SlideMapper::new().paginate(&blocks);

                prop_assert_eq!(slides[0].kind, SlideKind::Title);
                prop_assert!(slides[1..].iter().all(|s| s.kind == SlideKind::Content));
            }
        }
    }
}
