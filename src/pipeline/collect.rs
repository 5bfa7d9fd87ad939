//! Result aggregation: fan worker outputs back into one ordered image list.
//!
//! ## Failure policy
//!
//! Poppler reports problems on stderr, not through exit codes, and the only
//! stderr traffic known to be survivable is the `Syntax Error` warning it
//! emits for malformed-but-recoverable page content. That exact, literal
//! substring is whitelisted; *any* other non-empty stderr fails the whole
//! conversion — even when every other worker succeeded, no partial image
//! list is returned.
//!
//! This is admittedly strict: a localised Poppler build or a future
//! deprecation notice on stderr would abort conversions that actually
//! produced good output. The behaviour is kept for compatibility with the
//! tool's established contract rather than loosened speculatively.
//!
//! ## Ordering
//!
//! Workers finish in arbitrary order. All results are gathered first, sorted
//! by range index, and only then flattened — the final list's order is a
//! function of the partition, never of scheduling.

use crate::config::ImageFormat;
use crate::error::Pdf2ImgError;
use crate::pipeline::command::{OutputTarget, WorkerInvocation};
use crate::pipeline::demux::{self, Framing};
use crate::pipeline::worker::WorkerResult;
use std::path::Path;
use tracing::{debug, warn};

/// The one stderr message Poppler emits for recoverable page damage.
/// Case-sensitive, matched as a literal substring.
const RECOVERABLE_STDERR_MARKER: &str = "Syntax Error";

/// Merge all worker results into the final ordered image list.
///
/// `invocations` is indexed by range index (partition order); `results` may
/// arrive in any completion order.
pub(crate) async fn aggregate(
    invocations: &[WorkerInvocation],
    mut results: Vec<WorkerResult>,
    format: ImageFormat,
) -> Result<Vec<Vec<u8>>, Pdf2ImgError> {
    results.sort_by_key(|r| r.range_index);

    let mut images = Vec::new();
    for result in results {
        check_stderr(&result)?;

        let invocation = &invocations[result.range_index];
        let mut worker_images = match invocation.target {
            OutputTarget::Stdout => {
                let framing = Framing::for_format(format).ok_or_else(|| {
                    Pdf2ImgError::Internal(format!(
                        "format {format} cannot be captured from stdout"
                    ))
                })?;
                demux::split(&result.stdout, framing)
            }
            OutputTarget::Directory {
                ref dir,
                ref prefix,
            } => scan_directory(dir, prefix, format).await?,
        };

        debug!(
            range_index = result.range_index,
            count = worker_images.len(),
            "collected worker images"
        );
        images.append(&mut worker_images);
    }

    Ok(images)
}

/// Apply the stderr failure policy to one worker result.
fn check_stderr(result: &WorkerResult) -> Result<(), Pdf2ImgError> {
    if result.stderr.is_empty() {
        return Ok(());
    }
    if result.stderr.contains(RECOVERABLE_STDERR_MARKER) {
        warn!(
            first = result.range.first,
            last = result.range.last,
            stderr = %result.stderr.trim_end(),
            "rasterizer reported a recoverable syntax error; continuing"
        );
        return Ok(());
    }
    Err(Pdf2ImgError::Conversion {
        first_page: result.range.first,
        last_page: result.range.last,
        stderr: result.stderr.clone(),
    })
}

/// Read one worker's page files back from the shared output directory.
///
/// Matches `{prefix}-*.{ext}` and sorts lexicographically, which equals page
/// order because Poppler zero-pads the page number it appends. The trailing
/// `-` in the match keeps sibling workers' files apart even when one prefix
/// is a string prefix of another.
async fn scan_directory(
    dir: &Path,
    prefix: &str,
    format: ImageFormat,
) -> Result<Vec<Vec<u8>>, Pdf2ImgError> {
    let file_prefix = format!("{prefix}-");
    let suffix = format!(".{}", format.extension());

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| Pdf2ImgError::OutputRead {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| Pdf2ImgError::OutputRead {
            path: dir.to_path_buf(),
            source: e,
        })?
    {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name.starts_with(&file_prefix) && name.ends_with(&suffix) {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Pdf2ImgError::OutputRead {
                path: path.clone(),
                source: e,
            })?;
        images.push(bytes);
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::partition::PageRange;
    use std::ffi::OsString;

    fn result(range_index: usize, stdout: Vec<u8>, stderr: &str) -> WorkerResult {
        WorkerResult {
            range_index,
            range: PageRange {
                first: (range_index as u32) * 3 + 1,
                last: (range_index as u32) * 3 + 3,
            },
            stdout,
            stderr: stderr.to_string(),
        }
    }

    fn stdout_invocation(range_index: usize) -> WorkerInvocation {
        WorkerInvocation {
            range_index,
            range: PageRange { first: 1, last: 3 },
            program: "pdftoppm".into(),
            args: Vec::<OsString>::new(),
            child_path: None,
            target: OutputTarget::Stdout,
        }
    }

    fn fake_jpeg(tag: u8) -> Vec<u8> {
        vec![0xFF, 0xD8, tag, 0xFF, 0xD9]
    }

    #[test]
    fn empty_stderr_passes() {
        assert!(check_stderr(&result(0, vec![], "")).is_ok());
    }

    #[test]
    fn syntax_error_is_recoverable() {
        let r = result(0, vec![], "Syntax Error (1234): Dictionary key must be a name object");
        assert!(check_stderr(&r).is_ok());
    }

    #[test]
    fn other_stderr_is_fatal_with_range_context() {
        let r = result(1, vec![], "Command Line Error: Wrong page range given");
        let err = check_stderr(&r).unwrap_err();
        match err {
            Pdf2ImgError::Conversion {
                first_page,
                last_page,
                stderr,
            } => {
                assert_eq!((first_page, last_page), (4, 6));
                assert!(stderr.contains("Wrong page range"));
            }
            other => panic!("expected Conversion, got {other}"),
        }
    }

    #[tokio::test]
    async fn stream_results_merge_in_range_order_not_completion_order() {
        let invocations = vec![stdout_invocation(0), stdout_invocation(1)];
        // Delivered out of order, as concurrent completion would.
        let results = vec![
            result(1, fake_jpeg(0xB1), ""),
            result(0, fake_jpeg(0xA1), ""),
        ];

        let images = aggregate(&invocations, results, ImageFormat::Jpeg)
            .await
            .unwrap();
        assert_eq!(images, vec![fake_jpeg(0xA1), fake_jpeg(0xB1)]);
    }

    #[tokio::test]
    async fn one_fatal_worker_fails_the_whole_operation() {
        let invocations = vec![stdout_invocation(0), stdout_invocation(1)];
        let results = vec![
            result(0, fake_jpeg(0xA1), ""),
            result(1, vec![], "I/O Error: Couldn't open file"),
        ];

        let err = aggregate(&invocations, results, ImageFormat::Jpeg)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::Conversion { .. }));
    }

    #[tokio::test]
    async fn directory_scan_filters_by_prefix_and_extension_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let write = |name: &str, bytes: &[u8]| {
            std::fs::write(dir.path().join(name), bytes).unwrap();
        };
        // Out of creation order on purpose; lexicographic sort must win.
        write("run-00-02.png", b"page2");
        write("run-00-01.png", b"page1");
        write("run-00-10.png", b"page10"); // zero-padded names sort correctly
        write("run-01-01.png", b"other worker");
        write("run-00-01.txt", b"not an image");

        let images = scan_directory(dir.path(), "run-00", ImageFormat::Png)
            .await
            .unwrap();
        assert_eq!(
            images,
            vec![b"page1".to_vec(), b"page2".to_vec(), b"page10".to_vec()]
        );
    }

    #[tokio::test]
    async fn directory_scan_missing_dir_is_output_read_error() {
        let err = scan_directory(Path::new("/no/such/dir"), "run-00", ImageFormat::Png)
            .await
            .unwrap_err();
        assert!(matches!(err, Pdf2ImgError::OutputRead { .. }));
    }
}
