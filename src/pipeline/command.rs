//! Worker invocation building: the exact argument vector and environment for
//! one external rasterizer process.
//!
//! ## Why build argv eagerly?
//!
//! Every conditional flag lives here, in one place, mapped 1:1 from a config
//! field — the supervisor and aggregator never inspect options. That keeps
//! the Poppler command-line surface (which is stringly-typed and
//! order-sensitive) testable without spawning anything.
//!
//! Flag order follows the Poppler manual convention:
//!
//! ```text
//! <tool> -r <dpi> <pdf> [-cropbox] [-hide-annotations] [-transp]
//!        [-f <first>] [-l <last>] -<format> [<output-prefix>]
//!        [-upw <pw>] [-opw <pw>] [-gray] [-scale-to-x <w> -scale-to-y <h|-1>]
//! ```
//!
//! Numeric option values are passed through verbatim; Poppler does its own
//! range checking and reports problems on stderr.

use crate::config::{ConversionConfig, ToolPersonality};
use crate::pipeline::partition::PageRange;
use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

impl ToolPersonality {
    /// Base binary name, without any platform suffix.
    pub(crate) fn binary_name(self) -> &'static str {
        match self {
            ToolPersonality::Pdftoppm => "pdftoppm",
            ToolPersonality::Pdftocairo => "pdftocairo",
        }
    }
}

/// Where one worker's rendered pages end up.
///
/// An explicit sink rather than a mode flag: the aggregator matches on this
/// to decide between demuxing captured stdout and scanning the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputTarget {
    /// Pages are concatenated on the worker's stdout and captured in memory.
    Stdout,
    /// Pages are written as `{prefix}-<page>.{ext}` files into `dir`.
    Directory { dir: PathBuf, prefix: String },
}

/// Everything needed to launch and collect one rasterizer worker.
#[derive(Debug, Clone)]
pub(crate) struct WorkerInvocation {
    /// Position of this worker's range in partition order.
    pub range_index: usize,
    /// The page sub-range this worker renders.
    pub range: PageRange,
    /// Program name (resolved for the platform, looked up via `PATH`).
    pub program: String,
    /// Full argument vector, in Poppler's expected order.
    pub args: Vec<OsString>,
    /// Replacement `PATH` value for the child when a custom Poppler
    /// directory is configured; `None` inherits the parent environment.
    pub child_path: Option<OsString>,
    /// Where this worker's output lands.
    pub target: OutputTarget,
}

/// Append `.exe` on Windows when not already present; identity elsewhere.
pub(crate) fn platform_tool_name(base: &str) -> String {
    if cfg!(windows) && !base.ends_with(".exe") {
        format!("{base}.exe")
    } else {
        base.to_string()
    }
}

/// `PATH` value for a child process with `poppler_dir` prepended.
///
/// The parent's own environment is never touched; the modified search path
/// exists only in the spawned process.
pub(crate) fn child_search_path(poppler_dir: &Path) -> OsString {
    let mut dirs = vec![poppler_dir.to_path_buf()];
    if let Some(existing) = env::var_os("PATH") {
        dirs.extend(env::split_paths(&existing));
    }
    env::join_paths(dirs)
        .unwrap_or_else(|_| poppler_dir.as_os_str().to_os_string())
}

/// Distinct per-worker output file prefix.
///
/// The run id keeps concurrent conversions into the same persistent directory
/// apart; the zero-padded range index keeps sibling workers apart. Poppler
/// appends `-<page>` to this prefix, so no two workers can ever produce the
/// same filename.
pub(crate) fn output_prefix(run_id: &str, range_index: usize) -> String {
    format!("{run_id}-{range_index:02}")
}

/// Build the invocation for one page range.
///
/// `output_dir` is `Some` when directory mode applies — either because the
/// format's tool cannot stream, or because the caller asked for a persistent
/// output directory.
pub(crate) fn build_invocation(
    pdf_path: &Path,
    range: PageRange,
    range_index: usize,
    run_id: &str,
    config: &ConversionConfig,
    output_dir: Option<&Path>,
) -> WorkerInvocation {
    let format = config.format;
    let mut args: Vec<OsString> = Vec::new();

    args.push("-r".into());
    args.push(config.dpi.to_string().into());
    args.push(pdf_path.as_os_str().to_os_string());

    if config.use_cropbox {
        args.push("-cropbox".into());
    }
    if config.hide_annotations {
        args.push("-hide-annotations".into());
    }
    if config.transparent && format.supports_alpha() {
        args.push("-transp".into());
    }

    args.push("-f".into());
    args.push(range.first.to_string().into());
    args.push("-l".into());
    args.push(range.last.to_string().into());

    args.push(format.poppler_flag().into());

    let target = match output_dir {
        Some(dir) => {
            let prefix = output_prefix(run_id, range_index);
            args.push(dir.join(&prefix).into_os_string());
            OutputTarget::Directory {
                dir: dir.to_path_buf(),
                prefix,
            }
        }
        None => OutputTarget::Stdout,
    };

    if let Some(ref pw) = config.user_password {
        args.push("-upw".into());
        args.push(pw.into());
    }
    if let Some(ref pw) = config.owner_password {
        args.push("-opw".into());
        args.push(pw.into());
    }
    if config.grayscale {
        args.push("-gray".into());
    }

    // Three distinct scaling shapes; both-unset omits scaling entirely.
    match (config.width, config.height) {
        (Some(w), Some(h)) => {
            args.push("-scale-to-x".into());
            args.push(w.to_string().into());
            args.push("-scale-to-y".into());
            args.push(h.to_string().into());
        }
        (Some(w), None) => {
            args.push("-scale-to-x".into());
            args.push(w.to_string().into());
            args.push("-scale-to-y".into());
            args.push("-1".into());
        }
        (None, Some(h)) => {
            args.push("-scale-to-x".into());
            args.push("-1".into());
            args.push("-scale-to-y".into());
            args.push(h.to_string().into());
        }
        (None, None) => {}
    }

    WorkerInvocation {
        range_index,
        range,
        program: platform_tool_name(format.personality().binary_name()),
        args,
        child_path: config
            .poppler_path
            .as_deref()
            .map(child_search_path),
        target,
    }
}
