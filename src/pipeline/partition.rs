//! Page-range partitioning: split a page window into per-worker chunks.
//!
//! This is a deterministic, order-preserving work split, not a dynamic load
//! balancer — it assumes every page costs roughly the same to rasterise.
//! Poppler is invoked once per chunk with `-f`/`-l`, so chunks must be
//! contiguous, non-overlapping, and cover the window exactly.

/// A contiguous, 1-based inclusive range of pages handled by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// First page of the range, 1-based inclusive.
    pub first: u32,
    /// Last page of the range, 1-based inclusive.
    pub last: u32,
}

impl PageRange {
    /// Number of pages in the range.
    pub fn len(&self) -> u32 {
        self.last - self.first + 1
    }

    /// Always false: a `PageRange` covers at least one page by construction.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Split `[first, last]` into at most `concurrency` contiguous chunks.
///
/// Effective concurrency is `min(concurrency, total pages)` — never more
/// workers than pages. The first `total % effective` chunks receive one extra
/// page so chunk sizes differ by at most one.
///
/// Callers guarantee `1 <= first <= last` and `concurrency >= 1`.
pub fn partition(first: u32, last: u32, concurrency: usize) -> Vec<PageRange> {
    debug_assert!(first >= 1 && first <= last);
    debug_assert!(concurrency >= 1);

    let total = (last - first + 1) as usize;
    let effective = concurrency.min(total);
    let base = total / effective;
    let extra = total % effective;

    let mut ranges = Vec::with_capacity(effective);
    let mut next = first;
    for chunk in 0..effective {
        let len = (base + usize::from(chunk < extra)) as u32;
        ranges.push(PageRange {
            first: next,
            last: next + len - 1,
        });
        next += len;
    }
    ranges
}
