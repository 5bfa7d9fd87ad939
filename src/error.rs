//! Error types for the pdf2img library.
//!
//! The taxonomy mirrors the two very different things that can go wrong when
//! conversion is delegated to external tools:
//!
//! * **Environment problems** — the Poppler binaries are missing, not
//!   executable, or not on the search path. These surface as
//!   [`Pdf2ImgError::ToolNotLaunchable`] with the underlying OS error as
//!   cause, and are never retried: re-running cannot install a binary.
//!
//! * **Document problems** — the PDF is corrupt, encrypted with the wrong
//!   password, or a page fails to render. These surface through
//!   [`Pdf2ImgError::PageCountUnavailable`] (before any worker is spawned)
//!   or [`Pdf2ImgError::Conversion`] (a worker's tool wrote a fatal message
//!   to stderr).
//!
//! Keeping the two apart matters operationally: the first is fixed by a
//! deployment change, the second by fixing (or re-obtaining) the document.
//! A [`Pdf2ImgError::Conversion`] carries the offending page range and the
//! raw stderr text so the failure can be diagnosed without re-running.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the pdf2img library.
///
/// There are no partial successes: any worker failing fatally fails the whole
/// conversion, so a single error type covers the complete surface.
#[derive(Debug, Error)]
pub enum Pdf2ImgError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Pre-flight validation errors ──────────────────────────────────────
    /// The requested output format is not one pdf2img can produce.
    ///
    /// Raised when parsing a format string, i.e. before any process is
    /// spawned.
    #[error("Unsupported output format '{requested}' (expected png, jpeg, or tiff)")]
    UnsupportedFormat { requested: String },

    /// The requested first page is greater than the last page.
    ///
    /// Detected after defaulting the open ends of the page window, and always
    /// before a rasterizer worker is launched.
    #[error("Invalid page range: first page {first} is greater than last page {last}")]
    InvalidPageRange { first: u32, last: u32 },

    // ── External tool errors ──────────────────────────────────────────────
    /// A Poppler binary could not be started at all.
    ///
    /// This is an environment/deployment problem (binary missing, not
    /// executable, permission denied) — deliberately distinct from any error
    /// the tool itself reports about the document.
    #[error("Failed to launch '{tool}': {source}\nIs Poppler installed and on PATH (or set poppler_path)?")]
    ToolNotLaunchable {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// pdfinfo produced no page count for the document.
    ///
    /// Covers corrupt documents, encrypted documents without the correct
    /// password, and unreadable files. pdfinfo does not distinguish these
    /// cases, so neither does this error.
    #[error("Unable to get page count for '{path}'\nThe file may be corrupt, encrypted, or not a PDF.")]
    PageCountUnavailable { path: PathBuf },

    /// A rasterizer worker reported a fatal condition on stderr.
    ///
    /// Any non-empty stderr that is not a recoverable "Syntax Error" warning
    /// aborts the whole conversion; no partial image list is returned.
    #[error("Conversion failed for pages {first_page}-{last_page}: {stderr}")]
    Conversion {
        first_page: u32,
        last_page: u32,
        stderr: String,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// A rendered page file could not be read back from the output directory.
    #[error("Failed to read rendered page file '{path}': {source}")]
    OutputRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversion_display_includes_range_and_stderr() {
        let e = Pdf2ImgError::Conversion {
            first_page: 3,
            last_page: 5,
            stderr: "Couldn't read xref table".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("3-5"), "got: {msg}");
        assert!(msg.contains("xref"), "got: {msg}");
    }

    #[test]
    fn tool_not_launchable_keeps_os_cause() {
        let e = Pdf2ImgError::ToolNotLaunchable {
            tool: "pdftoppm".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(e.to_string().contains("pdftoppm"));
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn unsupported_format_display() {
        let e = Pdf2ImgError::UnsupportedFormat {
            requested: "bmp".into(),
        };
        assert!(e.to_string().contains("bmp"));
    }

    #[test]
    fn invalid_page_range_display() {
        let e = Pdf2ImgError::InvalidPageRange { first: 9, last: 2 };
        let msg = e.to_string();
        assert!(msg.contains('9') && msg.contains('2'), "got: {msg}");
    }
}
