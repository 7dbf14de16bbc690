//! Structured error types for the layout engine.
//!
//! Every layout error is a deterministic function of the input document.
//! Variants carry the block index (and the page reached at the time of
//! failure, where that is meaningful) so the caller can fix the source data.
//! A failing render produces no pages.

use thiserror::Error;

/// The unified error type returned by all public API functions.
#[derive(Debug, Error)]
pub enum RenderError {
    /// JSON input failed to parse as a valid document.
    #[error("failed to parse document: {0}")]
    Parse(#[from] serde_json::Error),

    /// A style name was referenced but never registered.
    #[error("unknown style `{name}`")]
    UnknownStyle { name: String },

    /// A style's parent chain loops back on itself.
    #[error("style inheritance cycle through `{name}`")]
    StyleCycle { name: String },

    /// A font could not be parsed or registered.
    #[error("font error: {0}")]
    Font(String),

    /// Table geometry cannot be resolved (bad spans, fixed column widths
    /// exceeding the available width, mismatched column counts).
    #[error("layout failed at block {block}: {reason}")]
    Layout { block: usize, reason: String },

    /// A table taller than one page's content area was not marked splittable.
    #[error("table at block {block} does not fit one page and is not splittable (page {page})")]
    UnsplittableTable { block: usize, page: usize },

    /// A single table row is taller than one page's content area.
    #[error("row {row} of table at block {block} is taller than the page content area")]
    UnsplittableRow { block: usize, row: usize },

    /// A block is taller than one page's content area even on an empty page.
    #[error("block {block} is larger than the page content area (page {page})")]
    ContentOverflow { block: usize, page: usize },
}
