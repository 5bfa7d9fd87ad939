//! End-to-end integration tests for pdf2img.
//!
//! These tests spawn the real Poppler tools, so they are gated behind the
//! `E2E_ENABLED` environment variable and skip themselves when Poppler is
//! not installed.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture
//!
//! The PDF fixture is generated in-process: a minimal but well-formed
//! document with a correct xref table, N blank pages. No files to download,
//! nothing to keep in the repository.

use pdf2img::{convert, convert_from_bytes, inspect, ConversionConfig, ImageFormat};
use std::io::Write;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED is set *and* Poppler is installed.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        if !poppler_available() {
            println!("SKIP — Poppler not found (apt install poppler-utils)");
            return;
        }
    }};
}

fn poppler_available() -> bool {
    std::process::Command::new("pdftoppm")
        .arg("-v")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .is_ok()
}

/// Build a minimal well-formed PDF with `pages` blank A6 pages.
///
/// Offsets in the xref table are exact, so Poppler parses the document
/// without reconstruction (and without stderr noise).
fn build_pdf(pages: usize) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::new();

    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages
    ));
    for _ in 0..pages {
        objects.push("<< /Type /Page /Parent 2 0 R /MediaBox [0 0 298 420] >>".to_string());
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n{}\nendobj\n", i + 1, body).unwrap();
    }

    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n", objects.len() + 1).unwrap();
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in &offsets {
        write!(out, "{offset:010} 00000 n \n").unwrap();
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    )
    .unwrap();

    out
}

fn write_fixture(pages: usize) -> tempfile::NamedTempFile {
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(&build_pdf(pages)).unwrap();
    f.flush().unwrap();
    f
}

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

// ── Inspect ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn inspect_reports_page_count() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(13);

    let info = inspect(pdf.path().to_str().unwrap(), &ConversionConfig::default())
        .await
        .expect("inspect() should succeed");

    assert_eq!(info.pages, 13);
    assert!(info.fields.contains_key("Pages"));
}

// ── Full-document conversion ─────────────────────────────────────────────────

#[tokio::test]
async fn thirteen_pages_default_options_yield_thirteen_pngs() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(13);

    let images = convert(pdf.path().to_str().unwrap(), &ConversionConfig::default())
        .await
        .expect("conversion should succeed");

    assert_eq!(images.len(), 13);
    for image in &images {
        assert!(image.starts_with(PNG_MAGIC), "demuxed buffer is not a PNG");
        // Every buffer ends with the IEND chunk signature and its CRC.
        let tail = &image[image.len() - 8..image.len() - 4];
        assert_eq!(tail, b"IEND");
    }
}

#[tokio::test]
async fn page_window_three_to_five_yields_three_images() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(13);
    let config = ConversionConfig::builder()
        .first_page(3)
        .last_page(5)
        .build()
        .unwrap();

    let images = convert(pdf.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(images.len(), 3);
}

#[tokio::test]
async fn single_page_window_yields_one_image() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(5);
    let config = ConversionConfig::builder()
        .first_page(4)
        .last_page(4)
        .build()
        .unwrap();

    let images = convert(pdf.path().to_str().unwrap(), &config)
        .await
        .unwrap();
    assert_eq!(images.len(), 1);
}

#[tokio::test]
async fn concurrency_does_not_change_output() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(13);
    let path = pdf.path().to_str().unwrap();

    let serial = convert(path, &ConversionConfig::default()).await.unwrap();
    let config = ConversionConfig::builder().concurrency(4).build().unwrap();
    let parallel = convert(path, &config).await.unwrap();

    // Order and content are a function of page order, not scheduling.
    assert_eq!(serial.len(), parallel.len());
    for (a, b) in serial.iter().zip(&parallel) {
        assert_eq!(a, b, "per-image bytes must be identical across runs");
    }
}

#[tokio::test]
async fn repeated_runs_are_idempotent() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(4);
    let path = pdf.path().to_str().unwrap();
    let config = ConversionConfig::default();

    let first = convert(path, &config).await.unwrap();
    let second = convert(path, &config).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn jpeg_stream_demuxes_on_trailer() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(6);
    let config = ConversionConfig::builder()
        .format(ImageFormat::Jpeg)
        .concurrency(2)
        .build()
        .unwrap();

    let images = convert(pdf.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(images.len(), 6);
    for image in &images {
        assert_eq!(&image[..2], &[0xFF, 0xD8], "missing JPEG SOI");
        assert_eq!(&image[image.len() - 2..], &[0xFF, 0xD9], "missing JPEG EOI");
    }
}

#[tokio::test]
async fn tiff_uses_directory_mode_transparently() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(3);
    let config = ConversionConfig::builder()
        .format(ImageFormat::Tiff)
        .build()
        .unwrap();

    let images = convert(pdf.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(images.len(), 3);
    for image in &images {
        // TIFF magic: little- or big-endian byte-order mark.
        assert!(image.starts_with(b"II*\0") || image.starts_with(b"MM\0*"));
    }
}

#[tokio::test]
async fn persistent_output_dir_keeps_page_files() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(4);
    let out = tempfile::tempdir().unwrap();
    let config = ConversionConfig::builder()
        .output_dir(out.path())
        .concurrency(2)
        .build()
        .unwrap();

    let images = convert(pdf.path().to_str().unwrap(), &config)
        .await
        .unwrap();

    assert_eq!(images.len(), 4);
    let on_disk: Vec<_> = std::fs::read_dir(out.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".png"))
        .collect();
    assert_eq!(on_disk.len(), 4, "page files must remain on disk");
}

#[tokio::test]
async fn bytes_input_round_trips() {
    e2e_skip_unless_ready!();
    let bytes = build_pdf(2);

    let images = convert_from_bytes(&bytes, &ConversionConfig::default())
        .await
        .unwrap();
    assert_eq!(images.len(), 2);
}

// ── Failure paths ────────────────────────────────────────────────────────────

#[tokio::test]
async fn garbage_document_fails_before_any_worker() {
    e2e_skip_unless_ready!();
    let mut f = tempfile::NamedTempFile::new().unwrap();
    f.write_all(b"%PDF-1.4\nthis is not really a pdf body").unwrap();

    let err = convert(f.path().to_str().unwrap(), &ConversionConfig::default())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        pdf2img::Pdf2ImgError::PageCountUnavailable { .. }
    ));
}

#[tokio::test]
async fn window_past_end_of_document_is_invalid() {
    e2e_skip_unless_ready!();
    let pdf = write_fixture(3);
    let config = ConversionConfig::builder().first_page(7).build().unwrap();

    let err = convert(pdf.path().to_str().unwrap(), &config)
        .await
        .unwrap_err();
    assert!(matches!(err, pdf2img::Pdf2ImgError::InvalidPageRange { .. }));
}
