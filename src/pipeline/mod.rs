//! Pipeline stages for PDF-to-image conversion.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. a different rasterizer backend) without
//! touching other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ metadata ──▶ partition ──▶ command ──▶ worker ──▶ collect ──▶ demux
//! (URL/path)  (pdfinfo)   (ranges)      (argv)     (spawn)    (fan-in)   (split)
//! ```
//!
//! 1. [`input`]     — canonicalise the user-supplied path or URL to a local file
//! 2. [`metadata`]  — page-count discovery via pdfinfo; gates everything else
//! 3. [`partition`] — split the page window into per-worker ranges
//! 4. [`command`]   — build the exact argv and output target per range
//! 5. [`worker`]    — spawn and supervise one rasterizer process; the only
//!    stage that launches anything
//! 6. [`collect`]   — fan-in, stderr failure policy, directory scan
//! 7. [`demux`]     — split captured stdout on image-format trailers

pub mod collect;
pub mod command;
pub mod demux;
pub mod input;
pub mod metadata;
pub mod partition;
pub mod worker;
