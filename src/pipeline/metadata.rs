//! Document metadata: page-count discovery via pdfinfo.
//!
//! ## Why an external query at all?
//!
//! The rasterizer needs a concrete last page to partition work, but only the
//! document itself knows how many pages it has. pdfinfo answers in one cheap
//! invocation, and doubles as the earliest validity check: a document pdfinfo
//! cannot report a page count for (corrupt, encrypted without the right
//! password, not a PDF) will not rasterise either, so the whole conversion is
//! short-circuited before a single worker is spawned.
//!
//! pdfinfo's output is line-oriented `Field: value` text. Only the first
//! colon on a line separates field from value — values such as timestamps
//! contain colons of their own.

use crate::config::ConversionConfig;
use crate::error::Pdf2ImgError;
use crate::pipeline::command::{child_search_path, platform_tool_name};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// The field pdfinfo reports the page count under.
const PAGES_FIELD: &str = "Pages";

/// Parsed pdfinfo output.
///
/// Ephemeral: produced per conversion, consumed immediately, never cached —
/// the document on disk can change between calls.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    /// Total page count of the document.
    pub pages: u32,
    /// All fields pdfinfo reported, verbatim (including `Pages`).
    pub fields: BTreeMap<String, String>,
}

/// Query pdfinfo for the document's metadata and page count.
///
/// # Errors
/// - [`Pdf2ImgError::ToolNotLaunchable`] when pdfinfo cannot be started.
/// - [`Pdf2ImgError::PageCountUnavailable`] when the output has no parseable
///   `Pages` field. pdfinfo does not say *why* (corrupt vs. encrypted vs.
///   unreadable), so neither does this function.
pub(crate) async fn query_document_info(
    pdf_path: &Path,
    config: &ConversionConfig,
) -> Result<DocumentInfo, Pdf2ImgError> {
    run_info_tool(&platform_tool_name("pdfinfo"), pdf_path, config).await
}

/// Implementation with an explicit tool name, so the launch-failure path is
/// testable without uninstalling Poppler.
async fn run_info_tool(
    tool: &str,
    pdf_path: &Path,
    config: &ConversionConfig,
) -> Result<DocumentInfo, Pdf2ImgError> {
    let mut cmd = Command::new(tool);

    if let Some(ref pw) = config.user_password {
        cmd.arg("-upw").arg(pw);
    }
    if let Some(ref pw) = config.owner_password {
        cmd.arg("-opw").arg(pw);
    }
    if let Some(first) = config.first_page {
        cmd.arg("-f").arg(first.to_string());
    }
    if let Some(last) = config.last_page {
        cmd.arg("-l").arg(last.to_string());
    }
    cmd.arg(pdf_path);

    if let Some(ref dir) = config.poppler_path {
        cmd.env("PATH", child_search_path(dir));
    }

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // `output()` drains stdout and stderr concurrently, so pdfinfo's writes
    // can never wedge on a full pipe.
    let output = cmd
        .output()
        .await
        .map_err(|e| Pdf2ImgError::ToolNotLaunchable {
            tool: tool.to_string(),
            source: e,
        })?;

    let text = String::from_utf8_lossy(&output.stdout);
    let fields = parse_info_output(&text);
    debug!(
        path = %pdf_path.display(),
        fields = fields.len(),
        "pdfinfo returned"
    );

    let pages = fields
        .get(PAGES_FIELD)
        .and_then(|v| v.parse::<u32>().ok())
        .ok_or_else(|| Pdf2ImgError::PageCountUnavailable {
            path: pdf_path.to_path_buf(),
        })?;

    Ok(DocumentInfo { pages, fields })
}

/// Parse pdfinfo's `Field: value` lines into a map.
///
/// Splits on the first colon only; both sides are trimmed. Lines without a
/// colon are skipped.
fn parse_info_output(text: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for line in text.lines() {
        if let Some((field, value)) = line.split_once(':') {
            let field = field.trim();
            if !field.is_empty() {
                fields.insert(field.to_string(), value.trim().to_string());
            }
        }
    }
    fields
}
