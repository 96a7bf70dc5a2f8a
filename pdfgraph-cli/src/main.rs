use anyhow::{bail, Context, Result};
use clap::Parser;
use pdfgraph::page::DEFAULT_PROC_SETS;
use pdfgraph::{
    Document, Font, FontEncoding, FontResource, Page, SolidColorImage, StreamContent, WriterConfig,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_TEXT: &str = "Look at the pretty, orange square!";
const ORANGE: [u8; 3] = [0xFF, 0x7F, 0x00];

#[derive(Parser)]
#[command(
    name = "pdf-create",
    about = "Creates a simple PDF and writes it to the given file",
    version
)]
struct Cli {
    /// Output file path
    output: PathBuf,

    /// Write a fixed file identifier so repeated runs produce identical bytes
    #[arg(long)]
    static_id: bool,

    /// Store streams without the Flate filter
    #[arg(long)]
    no_compress: bool,

    /// Text shown above the square
    #[arg(long, default_value = DEFAULT_TEXT)]
    text: String,

    /// Width and height of the generated image in pixels
    #[arg(long, default_value_t = 100, value_parser = clap::value_parser!(u32).range(1..=4096))]
    image_size: u32,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pdfgraph=info,pdf_create=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("pdf-create: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let config = WriterConfig::default()
        .with_static_id(cli.static_id)
        .with_compression(!cli.no_compress);

    create_pdf(&cli.output, &cli.text, cli.image_size, config)
        .with_context(|| format!("failed to create {}", cli.output.display()))?;

    tracing::info!(output = %cli.output.display(), "PDF created");
    Ok(())
}

/// One Letter page with a line of Helvetica text and an orange square image
/// whose pixels are generated while the file is written.
fn create_pdf(output: &Path, text: &str, image_size: u32, config: WriterConfig) -> Result<()> {
    let contents = page_contents(text)?;
    let mut doc = Document::new();

    let font = FontResource::new(Font::Helvetica, "F1")
        .with_encoding(Some(FontEncoding::WinAnsiEncoding))
        .build(&mut doc)?;

    let square = SolidColorImage::rgb(image_size, image_size, ORANGE);
    let image = square
        .spec()
        .build(&mut doc, StreamContent::provider(square))?;

    let contents = doc.new_stream(contents)?;

    let page = Page::letter()
        .with_contents(contents)
        .with_proc_sets(DEFAULT_PROC_SETS.iter().copied())
        .with_font("F1", font)
        .with_xobject("Im1", image)
        .build(&mut doc)?;
    doc.add_page(&page, true)?;

    doc.save(output, config)?;
    Ok(())
}

/// Content stream for the page. `text` is shown with the WinAnsi-encoded F1
/// font, so it must be representable in Windows-1252.
fn page_contents(text: &str) -> Result<Vec<u8>> {
    let Some(codes) = FontEncoding::WinAnsiEncoding.encode(text) else {
        bail!("text {text:?} cannot be shown with WinAnsiEncoding");
    };

    let mut contents = b"BT /F1 24 Tf 72 720 Td (".to_vec();
    for code in codes {
        match code {
            b'(' | b')' | b'\\' => contents.extend_from_slice(&[b'\\', code]),
            0x20..=0x7E => contents.push(code),
            _ => contents.extend_from_slice(format!("\\{code:03o}").as_bytes()),
        }
    }
    contents.extend_from_slice(b") Tj ET\nq 144 0 0 144 234 324 cm /Im1 Do Q\n");
    Ok(contents)
}
