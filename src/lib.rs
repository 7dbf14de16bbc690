//! # quire
//!
//! A page-native layout engine for structured business documents. quire
//! takes a flat sequence of content blocks (paragraphs, tables, spacers,
//! page breaks), a sheet of named inheritable styles, and a page geometry,
//! and deterministically flows the blocks onto discrete pages.
//!
//! The output is not a PDF: it is a list of [`Page`]s, each holding
//! positioned draw operations (text runs at baselines, filled and stroked
//! rectangles) that any output backend can consume.
//!
//! ```
//! use quire::model::{Block, Document};
//! use quire::style::Style;
//!
//! let mut doc = Document::default();
//! doc.styles.insert("body", Style::default());
//! doc.blocks.push(Block::paragraph("Hello, pages.", "body"));
//!
//! let pages = quire::render(&doc).unwrap();
//! assert_eq!(pages.len(), 1);
//! ```
//!
//! Layout is pure: rendering the same document twice yields identical
//! pages, and a failed render yields no pages at all.

pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod style;
pub mod table;
pub mod text;

pub use error::RenderError;
pub use font::FontContext;
pub use layout::{DrawOp, Page, Stroke};
pub use model::{Block, Document};

/// Render a document into pages using the built-in fonts.
pub fn render(document: &Document) -> Result<Vec<Page>, RenderError> {
    let fonts = FontContext::new();
    layout::paginate(document, &fonts)
}

/// Render with a caller-provided font context (registered custom faces).
pub fn render_with_fonts(
    document: &Document,
    fonts: &FontContext,
) -> Result<Vec<Page>, RenderError> {
    layout::paginate(document, fonts)
}

/// Parse a JSON document and render it.
pub fn render_json(json: &str) -> Result<Vec<Page>, RenderError> {
    let document: Document = serde_json::from_str(json)?;
    render(&document)
}
