//! Stack growth for the recursive passes
//!
//! Parsing, analysis and evaluation recurse once per nesting level and each
//! level can span many frames. Recursion points run through [`guard`], which
//! switches to a freshly allocated segment when the current stack runs low.

/// Remaining stack below which a new segment is allocated.
const RED_ZONE: usize = 1024 * 1024;

/// Size of each new segment.
const GROW_SIZE: usize = 8 * 1024 * 1024;

#[inline]
pub(crate) fn guard<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, GROW_SIZE, f)
}
