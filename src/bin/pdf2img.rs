//! CLI binary for pdf2img.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ConversionConfig`, writes the returned image buffers to disk, and renders
//! progress with [indicatif].

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdf2img::{
    convert, inspect, ConversionConfig, ConversionProgressCallback, ImageFormat, PageRange,
    ProgressCallback,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI definition ───────────────────────────────────────────────────────────

/// Convert PDF documents to per-page raster images via Poppler.
#[derive(Parser, Debug)]
#[command(name = "pdf2img", version, about)]
struct Cli {
    /// PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Directory to write page images into (created if missing).
    #[arg(short, long, default_value = "out")]
    output: PathBuf,

    /// Output format: png, jpeg, or tiff.
    #[arg(long, default_value = "png")]
    format: String,

    /// Rendering resolution in DPI.
    #[arg(short = 'r', long, default_value_t = 200)]
    dpi: u32,

    /// First page to convert (1-based).
    #[arg(short = 'f', long)]
    first_page: Option<u32>,

    /// Last page to convert (1-based).
    #[arg(short = 'l', long)]
    last_page: Option<u32>,

    /// Number of concurrent rasterizer processes.
    #[arg(short = 'j', long, default_value_t = 1)]
    jobs: usize,

    /// Use the crop box instead of the media box.
    #[arg(long)]
    cropbox: bool,

    /// Hide PDF annotations.
    #[arg(long)]
    hide_annotations: bool,

    /// Transparent background (PNG/TIFF only).
    #[arg(long)]
    transparent: bool,

    /// Render in grayscale.
    #[arg(long)]
    gray: bool,

    /// Scale output to this width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Scale output to this height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// PDF user password.
    #[arg(long)]
    upw: Option<String>,

    /// PDF owner password.
    #[arg(long)]
    opw: Option<String>,

    /// Directory containing the Poppler binaries (prepended to the workers' PATH).
    #[arg(long, env = "POPPLER_PATH")]
    poppler_path: Option<PathBuf>,

    /// Print document metadata and exit without converting.
    #[arg(long)]
    info: bool,

    /// With --info: print metadata as JSON.
    #[arg(long, requires = "info")]
    json: bool,
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: one bar tick per finished worker, with a per-range log
/// line. Workers complete out of order; the bar only counts.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  [{bar:40.green/238}] {pos}/{len} workers")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgress {
    fn on_conversion_start(&self, total_pages: u32, workers: usize) {
        self.bar.set_length(workers as u64);
        self.bar.set_prefix("Converting");
        self.bar.println(format!(
            "{}",
            bold(&format!("Rendering {total_pages} pages across {workers} workers…"))
        ));
    }

    fn on_worker_complete(&self, range: PageRange) {
        self.bar.println(format!(
            "  {} pages {}-{}",
            green("✓"),
            range.first,
            range.last
        ));
        self.bar.inc(1);
    }

    fn on_conversion_complete(&self, image_count: usize) {
        self.bar
            .finish_with_message(format!("{image_count} images"));
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Format is validated here, before anything is spawned or resolved.
    let format: ImageFormat = cli.format.parse()?;

    let mut builder = ConversionConfig::builder()
        .dpi(cli.dpi)
        .format(format)
        .concurrency(cli.jobs)
        .use_cropbox(cli.cropbox)
        .hide_annotations(cli.hide_annotations)
        .transparent(cli.transparent)
        .grayscale(cli.gray);

    if let Some(p) = cli.first_page {
        builder = builder.first_page(p);
    }
    if let Some(p) = cli.last_page {
        builder = builder.last_page(p);
    }
    if let Some(w) = cli.width {
        builder = builder.width(w);
    }
    if let Some(h) = cli.height {
        builder = builder.height(h);
    }
    if let Some(ref pw) = cli.upw {
        builder = builder.user_password(pw.clone());
    }
    if let Some(ref pw) = cli.opw {
        builder = builder.owner_password(pw.clone());
    }
    if let Some(ref dir) = cli.poppler_path {
        builder = builder.poppler_path(dir.clone());
    }

    if cli.info {
        let config = builder.build()?;
        let info = inspect(&cli.input, &config).await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&info)?);
        } else {
            for (field, value) in &info.fields {
                println!("{field}: {value}");
            }
        }
        return Ok(());
    }

    let progress = CliProgress::new();
    let config = builder
        .progress_callback(Arc::clone(&progress) as ProgressCallback)
        .build()?;

    let images = convert(&cli.input, &config).await?;

    tokio::fs::create_dir_all(&cli.output)
        .await
        .with_context(|| format!("creating output directory {}", cli.output.display()))?;

    let stem = PathBuf::from(&cli.input)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    let first = config.first_page.unwrap_or(1);
    let last_page = first as usize + images.len().saturating_sub(1);
    let width = (last_page.max(1).ilog10() + 1) as usize;

    for (offset, image) in images.iter().enumerate() {
        let page = first as usize + offset;
        let path = cli.output.join(format!(
            "{stem}-{page:0width$}.{ext}",
            ext = format.extension()
        ));
        tokio::fs::write(&path, image)
            .await
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!(
        "{} {} {}",
        green("✓"),
        bold(&format!("{} images written to", images.len())),
        dim(&cli.output.display().to_string()),
    );

    Ok(())
}
