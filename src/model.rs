//! # Document Model
//!
//! The input representation for the layout engine. A document is a flat,
//! ordered sequence of typed content blocks plus one page geometry and one
//! style sheet. This is designed to be easily produced by an authoring
//! layer, a report generator, or direct JSON construction.
//!
//! There is no document tree here on purpose: business documents are linear.
//! Blocks flow top to bottom onto pages; the only structure inside a block
//! is a table's row/cell grid.

use crate::style::{Style, StyleSheet};
use serde::{Deserialize, Serialize};

/// A complete document ready for layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Page size and margins, fixed for the life of the document.
    #[serde(default)]
    pub page: PageGeometry,

    /// Named styles referenced by blocks. Populated once, read-only during
    /// layout.
    #[serde(default)]
    pub styles: StyleSheet,

    /// The ordered block sequence. Consumed exactly once by the scheduler.
    #[serde(default)]
    pub blocks: Vec<Block>,
}

/// Page size and margins in points (1/72 inch). The content area is the
/// page rectangle minus margins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGeometry {
    pub width: f64,
    pub height: f64,
    #[serde(default = "PageGeometry::default_margin")]
    pub margin: Edges,
}

impl PageGeometry {
    /// A4 with ~0.75 inch margins.
    pub fn a4() -> Self {
        Self {
            width: 595.28,
            height: 841.89,
            margin: Self::default_margin(),
        }
    }

    /// US Letter with ~0.75 inch margins.
    pub fn letter() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
            margin: Self::default_margin(),
        }
    }

    fn default_margin() -> Edges {
        Edges::uniform(54.0)
    }

    pub fn content_width(&self) -> f64 {
        self.width - self.margin.horizontal()
    }

    pub fn content_height(&self) -> f64 {
        self.height - self.margin.vertical()
    }
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::a4()
    }
}

/// Edge values (top, right, bottom, left) used for margins and padding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn symmetric(vertical: f64, horizontal: f64) -> Self {
        Self {
            top: vertical,
            right: horizontal,
            bottom: vertical,
            left: horizontal,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rgb` or `#rrggbb`. Malformed components read as zero.
    pub fn hex(hex: &str) -> Self {
        let hex = hex.trim_start_matches('#');
        let (r, g, b) = match hex.len() {
            3 => {
                let r = u8::from_str_radix(&hex[0..1].repeat(2), 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[1..2].repeat(2), 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[2..3].repeat(2), 16).unwrap_or(0);
                (r, g, b)
            }
            6 => {
                let r = u8::from_str_radix(&hex[0..2], 16).unwrap_or(0);
                let g = u8::from_str_radix(&hex[2..4], 16).unwrap_or(0);
                let b = u8::from_str_radix(&hex[4..6], 16).unwrap_or(0);
                (r, g, b)
            }
            _ => (0, 0, 0),
        };
        Self {
            r: r as f64 / 255.0,
            g: g as f64 / 255.0,
            b: b as f64 / 255.0,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Color::BLACK
    }
}

/// A run of text with uniform inline emphasis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Run {
    pub text: String,
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
}

impl Run {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: false,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: true,
            italic: false,
        }
    }

    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            italic: true,
        }
    }
}

/// Rich text: an ordered sequence of emphasis runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RichText {
    pub runs: Vec<Run>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::plain(text)],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.iter().all(|r| r.text.is_empty())
    }
}

impl From<&str> for RichText {
    fn from(text: &str) -> Self {
        RichText::plain(text)
    }
}

/// One unit of document content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Block {
    /// Flowing rich text rendered with a named style.
    Paragraph { text: RichText, style: String },

    /// Tabular content with its own layout rules.
    Table(Table),

    /// Fixed vertical gap. Draws nothing.
    Spacer { height: f64 },

    /// Unconditional page break.
    PageBreak,
}

impl Block {
    pub fn paragraph(text: impl Into<RichText>, style: impl Into<String>) -> Self {
        Block::Paragraph {
            text: text.into(),
            style: style.into(),
        }
    }

    pub fn spacer(height: f64) -> Self {
        Block::Spacer { height }
    }
}

/// A block of tabular content.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    /// Cell grid, row-major. Every row must cover the same number of
    /// logical columns once spans are expanded.
    pub rows: Vec<Vec<Cell>>,

    /// Column width definitions. If empty, columns distribute evenly.
    /// If given, the length must equal the logical column count.
    #[serde(default)]
    pub columns: Vec<ColumnWidth>,

    /// Table-wide default style name. `None` uses the built-in defaults.
    #[serde(default)]
    pub style: Option<String>,

    /// Per-region style overrides, applied in declaration order (later
    /// rules win on overlap). Row/col ranges are inclusive and address the
    /// authored grid, so they stay valid across page splits.
    #[serde(default)]
    pub style_rules: Vec<CellStyleRule>,

    /// Number of leading rows repeated at the top of each part when the
    /// table splits across pages.
    #[serde(default)]
    pub header_rows: usize,

    /// Whether this table may be divided row-wise across page boundaries.
    #[serde(default)]
    pub splittable: bool,

    /// Backgrounds cycled over successive data rows. Empty means no banding.
    /// Explicit style rules and inline cell styles override the band color.
    #[serde(default)]
    pub banding: Vec<Color>,

    /// Uniform cell padding.
    #[serde(default = "Table::default_padding")]
    pub padding: Edges,

    /// When set, every cell is outlined.
    #[serde(default)]
    pub grid: Option<GridLines>,

    /// Authored row index of this part's first data row. Set on the
    /// continuation parts produced by a page split so banding phase and
    /// style rules keep addressing the authored grid; `None` for an
    /// authored table.
    #[serde(skip)]
    pub continued_at: Option<usize>,
}

impl Table {
    /// Default cell padding: 6pt sides, 3pt top/bottom.
    fn default_padding() -> Edges {
        Edges::symmetric(3.0, 6.0)
    }

    /// A plain table over `rows` with evenly distributed columns.
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self {
            rows,
            columns: Vec::new(),
            style: None,
            style_rules: Vec::new(),
            header_rows: 0,
            splittable: false,
            banding: Vec::new(),
            padding: Self::default_padding(),
            grid: None,
            continued_at: None,
        }
    }

    /// Map a local row index of this (possibly continued) part back to the
    /// authored grid. Header rows keep their own indices.
    pub fn authored_row(&self, local: usize) -> usize {
        if local < self.header_rows {
            local
        } else {
            self.continued_at.unwrap_or(self.header_rows) + (local - self.header_rows)
        }
    }
}

/// A cell in a table row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub content: RichText,
    #[serde(default = "default_span")]
    pub row_span: usize,
    #[serde(default = "default_span")]
    pub col_span: usize,
    /// Inline style override. Highest precedence; a flat patch, not a
    /// registered style name (its `parent` field is ignored).
    #[serde(default)]
    pub style: Option<Style>,
}

impl Cell {
    pub fn text(text: impl Into<RichText>) -> Self {
        Self {
            content: text.into(),
            row_span: 1,
            col_span: 1,
            style: None,
        }
    }
}

fn default_span() -> usize {
    1
}

/// Column width definition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ColumnWidth {
    /// Fixed width in points.
    Fixed(f64),
    /// Share the width remaining after fixed columns, split evenly among
    /// the auto columns.
    Auto,
}

/// A style override for a rectangular cell region.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellStyleRule {
    /// Inclusive (first, last) row range over the authored grid.
    pub rows: (usize, usize),
    /// Inclusive (first, last) column range.
    pub cols: (usize, usize),
    /// Flat patch applied on top of the table default (and banding).
    pub style: Style,
}

impl CellStyleRule {
    pub fn covers(&self, row: usize, col: usize) -> bool {
        self.rows.0 <= row && row <= self.rows.1 && self.cols.0 <= col && col <= self.cols.1
    }
}

/// Cell outline parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridLines {
    pub width: f64,
    #[serde(default)]
    pub color: Color,
}
