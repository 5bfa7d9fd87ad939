//! Stream demultiplexing: split one concatenated stdout buffer into
//! individual image byte buffers.
//!
//! ## Why split at all?
//!
//! When pdftoppm streams to stdout it writes each rendered page back-to-back
//! with no length prefix and no separator — the only structure available is
//! the image format's own end-of-image framing. This module locates those
//! frame boundaries and slices the buffer, without ever decoding pixel data.
//!
//! Two framing styles cover the streamable formats:
//!
//! * **JPEG** — every image ends with the two-byte End Of Image marker
//!   `FF D9`; an image spans from the end of the previous marker through the
//!   marker itself.
//! * **PNG** — every image ends with an `IEND` chunk: the 4-byte type
//!   signature followed by a 4-byte CRC. An image therefore ends 8 bytes
//!   after the position where `IEND` starts.
//!
//! Bytes after the last complete marker are dropped rather than emitted as a
//! truncated image. An empty or marker-free buffer yields an empty list —
//! whether that is an error is the caller's judgement, not this layer's.

use crate::config::ImageFormat;

/// JPEG End Of Image marker.
const JPEG_EOI: [u8; 2] = [0xFF, 0xD9];

/// PNG end-of-data chunk type signature.
const PNG_IEND: &[u8; 4] = b"IEND";

/// Bytes from the start of the `IEND` signature to the end of the image:
/// 4 signature bytes plus the 4-byte chunk CRC.
const PNG_IEND_SPAN: usize = PNG_IEND.len() + 4;

/// How page images are delimited within a concatenated stdout stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Framing {
    /// Image ends exactly at the end of a fixed trailer marker.
    TrailerMarker(&'static [u8]),
    /// Image ends a fixed number of bytes after a chunk signature starts
    /// (signature plus its trailing CRC field).
    ChunkTerminator { signature: &'static [u8], span: usize },
}

impl Framing {
    /// The framing for a format, or `None` for directory-only formats that
    /// never stream through stdout.
    pub(crate) fn for_format(format: ImageFormat) -> Option<Framing> {
        match format {
            ImageFormat::Jpeg => Some(Framing::TrailerMarker(&JPEG_EOI)),
            ImageFormat::Png => Some(Framing::ChunkTerminator {
                signature: PNG_IEND,
                span: PNG_IEND_SPAN,
            }),
            ImageFormat::Tiff => None,
        }
    }
}

/// Split a concatenated rasterizer output buffer into per-image buffers.
///
/// Output order equals marker order, which equals page order since the
/// rasterizer emits pages sequentially. Zero matches yields an empty vec.
pub(crate) fn split(buffer: &[u8], framing: Framing) -> Vec<Vec<u8>> {
    let mut images = Vec::new();
    let mut start = 0;

    loop {
        let (needle, span) = match framing {
            Framing::TrailerMarker(marker) => (marker, marker.len()),
            Framing::ChunkTerminator { signature, span } => (signature, span),
        };

        let Some(hit) = find(buffer, needle, start) else {
            break;
        };
        // Clamp for a truncated final image whose CRC was cut off mid-write.
        let end = (hit + span).min(buffer.len());
        images.push(buffer[start..end].to_vec());
        start = end;
    }

    images
}

/// First occurrence of `needle` in `haystack` at or after `from`.
fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}
