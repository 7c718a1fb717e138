//! CLI tool for converting Word documents into PowerPoint presentations.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use w2p_core::{
    preview_dir_for, ConversionResult, Converter, DocumentAnalyzer, MapperConfig, PreviewRenderer,
    SlideKind, SlideMapper, SlideTemplate, SvgPreviewRenderer,
};
use w2p_docx::DocxSource;
use w2p_pptx::PptxTemplate;

/// Convert Word documents into slides on a PowerPoint template.
#[derive(Parser, Debug)]
#[command(name = "word2pptx")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input Word document(s) (.docx)
    #[arg(required_unless_present = "inspect")]
    input: Vec<PathBuf>,

    /// PowerPoint template (.pptx) providing the slide layouts
    #[arg(short, long, required_unless_present = "print")]
    template: Option<PathBuf>,

    /// Output directory (default: same as input file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Maximum number of body items per content slide
    #[arg(long = "max-items", default_value = "4")]
    max_items: usize,

    /// Maximum display length of a content slide body
    #[arg(long = "max-length", default_value = "220")]
    max_length: usize,

    /// Write SVG previews next to each presentation
    #[arg(long)]
    preview: bool,

    /// Print the slide plan to stdout instead of writing a presentation
    #[arg(short, long)]
    print: bool,

    /// Print one JSON conversion result per input
    #[arg(long)]
    json: bool,

    /// List the template's layouts and slides before converting
    #[arg(long)]
    inspect: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    if args.inspect {
        inspect_template(template_path(&args)?)?;
    }

    let config = MapperConfig::new()
        .with_max_content_items(args.max_items)
        .with_max_content_length(args.max_length);
    let converter = Converter::new().with_config(config);

    let mut failures = 0;
    for input_path in &args.input {
        if args.verbose {
            eprintln!("Processing: {}", input_path.display());
        }

        if args.print {
            match print_plan(input_path, config) {
                Ok(plan) => print!("{}", plan),
                Err(e) => {
                    eprintln!("Error processing {}: {:#}", input_path.display(), e);
                    failures += 1;
                }
            }
            continue;
        }

        let result = convert_file(input_path, &args, &converter)
            .unwrap_or_else(|e| ConversionResult::failed(format!("{:#}", e)));
        if args.json {
            println!(
                "{}",
                serde_json::to_string(&result).context("Failed to serialize result")?
            );
        }

        if result.success {
            if let Some(output_path) = &result.output_path {
                if !args.json {
                    println!(
                        "{} -> {} ({} slides)",
                        input_path.display(),
                        output_path.display(),
                        result.slide_count
                    );
                }
            }
            if args.verbose {
                for image in &result.preview_images {
                    eprintln!("  Preview: {}", image.display());
                }
            }
        } else {
            eprintln!(
                "Error processing {}: {}",
                input_path.display(),
                result.error_message
            );
            failures += 1;
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} inputs failed", failures, args.input.len());
    }

    Ok(())
}

/// Convert a single document against a freshly loaded template.
fn convert_file(
    input_path: &Path,
    args: &Args,
    converter: &Converter,
) -> Result<ConversionResult> {
    let template_file = template_path(args)?;
    let output_path = get_output_path(input_path, args.output.as_deref())?;

    // The template is consumed by each conversion, so it is reloaded per input.
    let mut template = match PptxTemplate::open(template_file) {
        Ok(template) => template,
        Err(e) => return Ok(ConversionResult::failed(e.to_string())),
    };
    let mut document = match DocxSource::open(input_path) {
        Ok(document) => document,
        Err(e) => return Ok(ConversionResult::failed(e.to_string())),
    };

    let renderer = args
        .preview
        .then(|| SvgPreviewRenderer::new(preview_dir_for(&output_path)));

    Ok(converter.convert(
        &mut document,
        &mut template,
        Some(&output_path),
        renderer.as_ref().map(|r| r as &dyn PreviewRenderer),
    ))
}

/// The template argument, which every mode except `--print` needs.
fn template_path(args: &Args) -> Result<&Path> {
    args.template
        .as_deref()
        .context("A template (--template) is required")
}

/// Render the slide plan of a document as text.
fn print_plan(input_path: &Path, config: MapperConfig) -> Result<String> {
    let mut document = DocxSource::open(input_path)?;
    let blocks = DocumentAnalyzer::new()
        .analyze_source(&mut document)
        .with_context(|| format!("Failed to analyze {}", input_path.display()))?;
    let slides = SlideMapper::new().with_config(config).paginate(&blocks);

    let mut output = format!("# {}\n", input_path.display());
    for (idx, slide) in slides.iter().enumerate() {
        let kind = match slide.kind {
            SlideKind::Title => "Title",
            SlideKind::Content => "Content",
        };
        output.push_str(&format!("[{}] {}: {}\n", idx + 1, kind, slide.title));
        for line in &slide.body {
            output.push_str(&format!("    - {}\n", line.replace('\n', " / ")));
        }
    }

    Ok(output)
}

/// Print the layouts and existing slides of a template.
fn inspect_template(path: &Path) -> Result<()> {
    let template = PptxTemplate::open(path)?;

    println!("Template: {}", path.display());
    for (idx, layout) in template.layouts().iter().enumerate() {
        let placeholders: Vec<String> = layout
            .placeholders
            .iter()
            .map(|p| format!("{}#{}", p.kind.as_ooxml().unwrap_or("obj"), p.idx))
            .collect();
        println!("  layout {}: {} [{}]", idx, layout.name, placeholders.join(", "));
    }

    for (idx, texts) in template.slide_texts()?.iter().enumerate() {
        println!("  slide {}: {}", idx + 1, texts.join(" | ").replace('\n', " / "));
    }

    Ok(())
}

/// Determine the output path for a converted file.
///
/// Existing files are never overwritten: `report.pptx` becomes
/// `report_1.pptx`, `report_2.pptx` and so on.
fn get_output_path(input_path: &Path, output_dir: Option<&Path>) -> Result<PathBuf> {
    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");

    let dir = match output_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            dir.to_path_buf()
        }
        None => input_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default(),
    };

    let mut output_path = dir.join(format!("{}.pptx", stem));
    let mut counter = 1;
    while output_path.exists() {
        output_path = dir.join(format!("{}_{}.pptx", stem, counter));
        counter += 1;
    }

    Ok(output_path)
}
