//! Eager (full-document) conversion entry points.
//!
//! ## Orchestration shape
//!
//! One conversion is a fan-out/fan-in over page ranges:
//!
//! 1. resolve the input to a local path,
//! 2. pre-flight validation (page window),
//! 3. page count via pdfinfo — the gate for everything else,
//! 4. partition the window into per-worker ranges,
//! 5. spawn one rasterizer process per range, all owned by this function's
//!    scope: the gather step cannot return until every child has exited, so
//!    no process outlives its conversion,
//! 6. aggregate in range order (never completion order) into the final list.
//!
//! ## Cancellation
//!
//! Deliberately unsupported in-flight: there is no cancellation token, and a
//! caller-level timeout must kill and await the child processes itself or
//! the gather step blocks until the rasterizer finishes. This is a known
//! design gap, recorded rather than papered over.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImgError;
use crate::pipeline::metadata::DocumentInfo;
use crate::pipeline::{collect, command, input, metadata, partition, worker};
use futures::stream::{self, StreamExt};
use std::io::Write;
use std::path::PathBuf;
use tempfile::TempDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// One fully-framed raster image, trailer included. Never decoded here.
pub type ImageBuffer = Vec<u8>;

/// Convert a PDF file or URL to a list of per-page raster images.
///
/// This is the primary entry point for the library. Images are returned in
/// page order; re-running with identical input and options yields identical
/// buffers (Poppler renders deterministically).
///
/// # Arguments
/// * `input`  — Local file path or HTTP/HTTPS URL to a PDF
/// * `config` — Conversion configuration
///
/// # Errors
/// Any worker failing fatally fails the whole conversion — there are no
/// partial results. See [`Pdf2ImgError`] for the taxonomy.
pub async fn convert(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<Vec<ImageBuffer>, Pdf2ImgError> {
    let input_str = input_str.as_ref();
    info!("Starting conversion: {}", input_str);

    // ── Step 1: Pre-flight validation ────────────────────────────────────
    // Cheap local checks come before any file or process is touched.
    if let (Some(first), Some(last)) = (config.first_page, config.last_page) {
        if first > last {
            return Err(Pdf2ImgError::InvalidPageRange { first, last });
        }
    }

    // ── Step 2: Resolve input ────────────────────────────────────────────
    let resolved = input::resolve_input(input_str, config.download_timeout_secs).await?;
    let pdf_path = resolved.path().to_path_buf();

    // ── Step 3: Page count ───────────────────────────────────────────────
    let doc_info = metadata::query_document_info(&pdf_path, config).await?;
    info!("PDF has {} pages", doc_info.pages);

    // ── Step 4: Default and clamp the page window ────────────────────────
    let first = config.first_page.unwrap_or(1).max(1);
    let last = config.last_page.unwrap_or(doc_info.pages).min(doc_info.pages);
    if first > last {
        return Err(Pdf2ImgError::InvalidPageRange { first, last });
    }

    // ── Step 5: Partition ────────────────────────────────────────────────
    let ranges = partition::partition(first, last, config.concurrency.max(1));
    debug!(
        "Window {}-{} split into {} ranges",
        first,
        last,
        ranges.len()
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(last - first + 1, ranges.len());
    }

    // ── Step 6: Choose the output sink ───────────────────────────────────
    // Directory mode applies when the format's tool cannot stream, or when
    // the caller wants the page files kept. A temp directory fills in when
    // directory mode is forced without a caller-supplied one.
    let needs_directory = !config.format.streams_to_stdout() || config.output_dir.is_some();
    let mut auto_dir: Option<TempDir> = None;
    let output_dir: Option<PathBuf> = match config.output_dir {
        Some(ref dir) => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| Pdf2ImgError::OutputRead {
                    path: dir.clone(),
                    source: e,
                })?;
            Some(dir.clone())
        }
        None if needs_directory => {
            let tmp = TempDir::new()
                .map_err(|e| Pdf2ImgError::Internal(format!("temp output dir: {e}")))?;
            let path = tmp.path().to_path_buf();
            auto_dir = Some(tmp);
            Some(path)
        }
        None => None,
    };

    // ── Step 7: Build invocations ────────────────────────────────────────
    let run_id = Uuid::new_v4().simple().to_string();
    let invocations: Vec<command::WorkerInvocation> = ranges
        .iter()
        .enumerate()
        .map(|(index, &range)| {
            command::build_invocation(
                &pdf_path,
                range,
                index,
                &run_id,
                config,
                output_dir.as_deref(),
            )
        })
        .collect();

    // ── Step 8: Fan out workers, gather everything ───────────────────────
    // The collect() below is the structured-concurrency join: every spawned
    // worker future resolves before this function can return, error or not,
    // so the first failure never leaves siblings unawaited.
    let outcomes: Vec<Result<worker::WorkerResult, Pdf2ImgError>> =
        stream::iter(invocations.iter().map(|invocation| async move {
            if let Some(ref cb) = config.progress_callback {
                cb.on_worker_start(invocation.range);
            }
            let result = worker::run(invocation).await;
            if result.is_ok() {
                if let Some(ref cb) = config.progress_callback {
                    cb.on_worker_complete(invocation.range);
                }
            }
            result
        }))
        .buffer_unordered(invocations.len())
        .collect()
        .await;

    let mut results = Vec::with_capacity(outcomes.len());
    for outcome in outcomes {
        results.push(outcome?);
    }

    // ── Step 9: Aggregate in range order ─────────────────────────────────
    let images = collect::aggregate(&invocations, results, config.format).await?;

    // An auto-created temp directory is removed now that its files are read;
    // a caller-supplied directory is left alone. Removal failure only warns —
    // the conversion itself succeeded.
    if let Some(tmp) = auto_dir {
        if let Err(e) = tmp.close() {
            warn!("Failed to remove temporary output directory: {e}");
        }
    }

    info!("Conversion complete: {} images", images.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(images.len());
    }

    Ok(images)
}

/// Convert PDF bytes in memory to per-page raster images.
///
/// Avoids the need for the caller to create a temporary file: `bytes` is
/// staged through a managed [`tempfile`] which is cleaned up automatically on
/// return or panic. This is the recommended API when PDF data comes from a
/// database, network stream, or in-memory buffer.
///
/// # Example
/// ```rust,no_run
/// use pdf2img::{convert_from_bytes, ConversionConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes: Vec<u8> = std::fs::read("document.pdf")?;
/// let images = convert_from_bytes(&bytes, &ConversionConfig::default()).await?;
/// println!("{} pages rendered", images.len());
/// # Ok(())
/// # }
/// ```
pub async fn convert_from_bytes(
    bytes: &[u8],
    config: &ConversionConfig,
) -> Result<Vec<ImageBuffer>, Pdf2ImgError> {
    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| Pdf2ImgError::Internal(format!("tempfile write: {e}")))?;
    let path = tmp.path().to_string_lossy().to_string();
    // `tmp` is dropped (and the file deleted) when `convert` returns
    convert(&path, config).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<Vec<ImageBuffer>, Pdf2ImgError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| Pdf2ImgError::Internal(format!("Failed to create tokio runtime: {e}")))?
        .block_on(convert(input_str, config))
}

/// Query document metadata (page count included) without converting.
///
/// Honours the password and poppler-path fields of `config`; all rendering
/// options are ignored.
pub async fn inspect(
    input_str: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<DocumentInfo, Pdf2ImgError> {
    let resolved =
        input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    metadata::query_document_info(resolved.path(), config).await
}
