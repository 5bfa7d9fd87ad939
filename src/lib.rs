//! # pdf2img
//!
//! Convert PDF documents to per-page raster images using the Poppler
//! command-line tools (`pdftoppm`, `pdftocairo`, `pdfinfo`).
//!
//! ## Why this crate?
//!
//! Poppler's rasterizers are battle-tested, fast, and already installed on
//! most Linux and macOS machines — but they speak files and byte streams,
//! not APIs. This crate turns them into a library: it discovers the page
//! count, splits the page window across N concurrent worker processes,
//! supervises each one (draining stdout and stderr concurrently so a large
//! render can never deadlock on a full pipe), and reassembles the output —
//! whether streamed through stdout or written to a shared directory — into
//! one correctly ordered list of image byte buffers.
//!
//! The crate never decodes pixels. Buffers are located and sliced on the
//! image format's own framing (JPEG's `FF D9` trailer, PNG's `IEND` chunk),
//! so what you get is exactly what Poppler emitted, page by page.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input      resolve local file or download from URL
//!  ├─ 2. Metadata   page count via pdfinfo
//!  ├─ 3. Partition  split page window into per-worker ranges
//!  ├─ 4. Workers    concurrent pdftoppm / pdftocairo processes
//!  ├─ 5. Collect    fan-in, stderr policy, directory scan
//!  └─ 6. Demux      split stdout streams into per-page buffers
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2img::{convert, ConversionConfig, ImageFormat};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder()
//!         .dpi(150)
//!         .format(ImageFormat::Png)
//!         .concurrency(4)
//!         .build()?;
//!     let images = convert("document.pdf", &config).await?;
//!     for (i, image) in images.iter().enumerate() {
//!         std::fs::write(format!("page-{:03}.png", i + 1), image)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Requirements
//!
//! The Poppler utilities must be installed and discoverable:
//!
//! | Platform | Install |
//! |----------|---------|
//! | Debian/Ubuntu | `apt install poppler-utils` |
//! | macOS | `brew install poppler` |
//! | Windows | unpack a poppler build and set `poppler_path` |
//!
//! When the binaries are not on `PATH`, point
//! [`ConversionConfigBuilder::poppler_path`](config::ConversionConfigBuilder::poppler_path)
//! at their directory — it is prepended to the child processes' search path
//! only, never to the parent's.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2img` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2img = { version = "0.4", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder, ImageFormat};
pub use convert::{convert, convert_from_bytes, convert_sync, inspect, ImageBuffer};
pub use error::Pdf2ImgError;
pub use pipeline::metadata::DocumentInfo;
pub use pipeline::partition::{partition, PageRange};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
