//! Configuration types for PDF-to-image conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across tasks, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new field.
//! The builder pattern lets callers set only what they care about and rely on
//! well-documented defaults for the rest.

use crate::error::Pdf2ImgError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Configuration for a PDF-to-image conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2img::{ConversionConfig, ImageFormat};
///
/// let config = ConversionConfig::builder()
///     .dpi(150)
///     .format(ImageFormat::Jpeg)
///     .concurrency(4)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Rendering resolution in DPI, passed to the rasterizer via `-r`. Default: 200.
    ///
    /// 200 DPI keeps text legible for downstream OCR while producing files of
    /// manageable size. The value is forwarded to Poppler verbatim; pdf2img
    /// does not range-check it.
    pub dpi: u32,

    /// Output image format. Default: [`ImageFormat::Png`].
    pub format: ImageFormat,

    /// First page to convert, 1-based inclusive. `None` means page 1.
    pub first_page: Option<u32>,

    /// Last page to convert, 1-based inclusive. `None` means the last page of
    /// the document.
    pub last_page: Option<u32>,

    /// Number of concurrent rasterizer processes. Default: 1.
    ///
    /// The page window is split into contiguous chunks, one per worker.
    /// Rasterisation is CPU-bound inside Poppler, so a value near the machine
    /// core count is a reasonable ceiling. Never more workers than pages are
    /// spawned regardless of this setting.
    pub concurrency: usize,

    /// Use the crop box instead of the media box (`-cropbox`). Default: false.
    pub use_cropbox: bool,

    /// Hide PDF annotations (`-hide-annotations`). Default: false.
    pub hide_annotations: bool,

    /// Render with a transparent background instead of white (`-transp`).
    /// Default: false.
    ///
    /// Only honoured for formats with an alpha channel (PNG, TIFF); silently
    /// ignored for JPEG, matching Poppler's own behaviour.
    pub transparent: bool,

    /// Render in grayscale (`-gray`). Default: false.
    pub grayscale: bool,

    /// Scale output to this width in pixels (`-scale-to-x`).
    ///
    /// When only one of `width`/`height` is set, the other dimension scales
    /// proportionally (Poppler receives `-1` for it).
    pub width: Option<u32>,

    /// Scale output to this height in pixels (`-scale-to-y`).
    pub height: Option<u32>,

    /// PDF user password (`-upw`) for encrypted documents.
    pub user_password: Option<String>,

    /// PDF owner password (`-opw`) for encrypted documents.
    pub owner_password: Option<String>,

    /// Persistent output directory.
    ///
    /// When set, workers write their page files here and the files are left
    /// on disk after conversion (in addition to the returned byte buffers).
    /// When unset, stream-capable formats are captured from stdout and
    /// directory-only formats use an automatically cleaned-up temp directory.
    pub output_dir: Option<PathBuf>,

    /// Directory containing the Poppler binaries.
    ///
    /// Prepended to the child process's `PATH` — the parent environment is
    /// never modified. When unset, tools are resolved from the inherited
    /// `PATH` as usual.
    pub poppler_path: Option<PathBuf>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Optional progress callback, invoked as workers start and finish.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            format: ImageFormat::Png,
            first_page: None,
            last_page: None,
            concurrency: 1,
            use_cropbox: false,
            hide_annotations: false,
            transparent: false,
            grayscale: false,
            width: None,
            height: None,
            user_password: None,
            owner_password: None,
            output_dir: None,
            poppler_path: None,
            download_timeout_secs: 120,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("dpi", &self.dpi)
            .field("format", &self.format)
            .field("first_page", &self.first_page)
            .field("last_page", &self.last_page)
            .field("concurrency", &self.concurrency)
            .field("use_cropbox", &self.use_cropbox)
            .field("hide_annotations", &self.hide_annotations)
            .field("transparent", &self.transparent)
            .field("grayscale", &self.grayscale)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("user_password", &self.user_password.as_ref().map(|_| "<redacted>"))
            .field("owner_password", &self.owner_password.as_ref().map(|_| "<redacted>"))
            .field("output_dir", &self.output_dir)
            .field("poppler_path", &self.poppler_path)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn callback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn format(mut self, format: ImageFormat) -> Self {
        self.config.format = format;
        self
    }

    pub fn first_page(mut self, page: u32) -> Self {
        self.config.first_page = Some(page);
        self
    }

    pub fn last_page(mut self, page: u32) -> Self {
        self.config.last_page = Some(page);
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn use_cropbox(mut self, v: bool) -> Self {
        self.config.use_cropbox = v;
        self
    }

    pub fn hide_annotations(mut self, v: bool) -> Self {
        self.config.hide_annotations = v;
        self
    }

    pub fn transparent(mut self, v: bool) -> Self {
        self.config.transparent = v;
        self
    }

    pub fn grayscale(mut self, v: bool) -> Self {
        self.config.grayscale = v;
        self
    }

    pub fn width(mut self, px: u32) -> Self {
        self.config.width = Some(px);
        self
    }

    pub fn height(mut self, px: u32) -> Self {
        self.config.height = Some(px);
        self
    }

    pub fn user_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.user_password = Some(pwd.into());
        self
    }

    pub fn owner_password(mut self, pwd: impl Into<String>) -> Self {
        self.config.owner_password = Some(pwd.into());
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = Some(dir.into());
        self
    }

    pub fn poppler_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.poppler_path = Some(dir.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2ImgError> {
        let c = &self.config;
        if let (Some(first), Some(last)) = (c.first_page, c.last_page) {
            if first > last {
                return Err(Pdf2ImgError::InvalidPageRange { first, last });
            }
        }
        Ok(self.config)
    }
}

// ── Output formats ───────────────────────────────────────────────────────

/// Which Poppler tool renders a given format.
///
/// `pdftoppm` can stream PNG and JPEG to stdout; `pdftocairo` renders TIFF
/// (with faithful transparency) but only into files, so it always runs in
/// directory mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ToolPersonality {
    Pdftoppm,
    Pdftocairo,
}

/// Output image format.
///
/// A closed set: each variant maps to one row of behaviour below (extension,
/// Poppler flag, tool personality, alpha eligibility). Adding a format means
/// adding one arm to each of these methods — never touching the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// PNG, rendered by pdftoppm. Alpha-capable, streamable.
    #[default]
    Png,
    /// JPEG, rendered by pdftoppm. No alpha channel, streamable.
    Jpeg,
    /// TIFF, rendered by pdftocairo. Alpha-capable, directory-mode only.
    Tiff,
}

impl ImageFormat {
    /// File extension used for page files in directory mode.
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Tiff => "tif",
        }
    }

    /// Whether the format can carry an alpha channel.
    ///
    /// `-transp` is only passed to the rasterizer for these formats.
    pub fn supports_alpha(self) -> bool {
        match self {
            ImageFormat::Png | ImageFormat::Tiff => true,
            ImageFormat::Jpeg => false,
        }
    }

    /// The format-selection flag understood by both Poppler tools.
    pub(crate) fn poppler_flag(self) -> &'static str {
        match self {
            ImageFormat::Png => "-png",
            ImageFormat::Jpeg => "-jpeg",
            ImageFormat::Tiff => "-tiff",
        }
    }

    /// Which tool renders this format. Determined by the format alone.
    pub(crate) fn personality(self) -> ToolPersonality {
        match self {
            ImageFormat::Png | ImageFormat::Jpeg => ToolPersonality::Pdftoppm,
            ImageFormat::Tiff => ToolPersonality::Pdftocairo,
        }
    }

    /// True when pages can be captured from the rasterizer's stdout instead
    /// of a shared output directory.
    pub(crate) fn streams_to_stdout(self) -> bool {
        self.personality() == ToolPersonality::Pdftoppm
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
            ImageFormat::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

impl FromStr for ImageFormat {
    type Err = Pdf2ImgError;

    /// Parse a format name, accepting the common alias spellings.
    ///
    /// Anything outside the closed set is rejected here — before any process
    /// is spawned.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpeg" | "jpg" => Ok(ImageFormat::Jpeg),
            "tiff" | "tif" => Ok(ImageFormat::Tiff),
            _ => Err(Pdf2ImgError::UnsupportedFormat {
                requested: s.to_string(),
            }),
        }
    }
}
