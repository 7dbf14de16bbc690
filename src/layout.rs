//! # Page Flow Scheduler
//!
//! Consumes the ordered block sequence and places blocks onto discrete
//! pages. Every placement decision is made with the page boundary as a
//! hard constraint: before placing, ask "does this fit?"; if not, either
//! split (splittable tables) or move whole to a fresh page; if a block
//! cannot fit even on an empty page, the render fails.
//!
//! The output is the interchange shape consumed by output backends: one
//! [`Page`] per page, each a list of positioned [`DrawOp`]s in top-left
//! page coordinates, text positioned at its baseline.

use log::{debug, trace};
use serde::Serialize;

use crate::error::RenderError;
use crate::font::FontContext;
use crate::model::{Block, Color, Document, PageGeometry, RichText, Table};
use crate::style::{ResolvedStyle, StyleSheet, VerticalAlignment};
use crate::table::{self, TableLayout};
use crate::text::{self, FlowedParagraph};

const EPS: f64 = 1e-6;

/// A fully laid-out page ready for an output backend.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub width: f64,
    pub height: f64,
    pub ops: Vec<DrawOp>,
}

/// A positioned draw primitive. Coordinates are in points from the page's
/// top-left corner; backends map them into their native space.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum DrawOp {
    /// A filled and/or stroked rectangle (backgrounds, cell outlines).
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        fill: Option<Color>,
        stroke: Option<Stroke>,
    },
    /// A run of uniformly styled text. `y` is the baseline.
    Text {
        x: f64,
        y: f64,
        text: String,
        font_family: String,
        font_size: f64,
        bold: bool,
        italic: bool,
        color: Color,
    },
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    pub width: f64,
    pub color: Color,
}

/// Tracks where we are on the current page during layout.
#[derive(Debug, Clone)]
struct PageCursor {
    geo: PageGeometry,
    /// Offset from the content-area top.
    y: f64,
    ops: Vec<DrawOp>,
}

impl PageCursor {
    fn new(geo: PageGeometry) -> Self {
        Self {
            geo,
            y: 0.0,
            ops: Vec::new(),
        }
    }

    fn remaining(&self) -> f64 {
        (self.geo.content_height() - self.y).max(0.0)
    }

    fn at_top(&self) -> bool {
        self.y == 0.0
    }

    /// Advance the cursor, clamping at the content-area bottom (trailing
    /// space is allowed to spill off the page without forcing a break).
    fn advance_clamped(&mut self, dy: f64) {
        self.y = (self.y + dy).min(self.geo.content_height());
    }

    fn finalize(&self) -> Page {
        Page {
            width: self.geo.width,
            height: self.geo.height,
            ops: self.ops.clone(),
        }
    }

    fn next_page(&self) -> Self {
        PageCursor::new(self.geo)
    }
}

/// Lay a document out into pages. Pure: the same document yields the same
/// pages, and a failing call yields no pages at all.
pub fn paginate(document: &Document, fonts: &FontContext) -> Result<Vec<Page>, RenderError> {
    // Resolve every referenced style up front so registry misconfiguration
    // aborts before any layout starts.
    validate_styles(document)?;

    let mut scheduler = Scheduler {
        styles: &document.styles,
        fonts,
        geo: document.page,
        pages: Vec::new(),
        cursor: PageCursor::new(document.page),
    };

    for (block_index, block) in document.blocks.iter().enumerate() {
        match block {
            Block::PageBreak => {
                trace!("block {block_index}: page break");
                scheduler.break_page();
            }
            Block::Spacer { height } => {
                trace!("block {block_index}: spacer {height}pt");
                scheduler.place_spacer(*height, block_index)?;
            }
            Block::Paragraph { text, style } => {
                trace!("block {block_index}: paragraph `{style}`");
                scheduler.place_paragraph(text, style, block_index)?;
            }
            Block::Table(table) => {
                trace!("block {block_index}: table ({} rows)", table.rows.len());
                scheduler.place_table(table, block_index)?;
            }
        }
    }

    let mut pages = scheduler.pages;
    pages.push(scheduler.cursor.finalize());
    debug!("rendered {} page(s)", pages.len());
    Ok(pages)
}

fn validate_styles(document: &Document) -> Result<(), RenderError> {
    for block in &document.blocks {
        match block {
            Block::Paragraph { style, .. } => {
                document.styles.resolve(style)?;
            }
            Block::Table(table) => {
                document.styles.resolve_or_root(table.style.as_deref())?;
            }
            Block::Spacer { .. } | Block::PageBreak => {}
        }
    }
    Ok(())
}

struct Scheduler<'a> {
    styles: &'a StyleSheet,
    fonts: &'a FontContext,
    geo: PageGeometry,
    pages: Vec<Page>,
    cursor: PageCursor,
}

impl Scheduler<'_> {
    fn break_page(&mut self) {
        let page = self.cursor.finalize();
        debug!(
            "page {} finalized with {} op(s)",
            self.pages.len() + 1,
            page.ops.len()
        );
        self.pages.push(page);
        self.cursor = self.cursor.next_page();
    }

    /// 1-based number of the page currently being filled.
    fn page_number(&self) -> usize {
        self.pages.len() + 1
    }

    fn place_spacer(&mut self, height: f64, block: usize) -> Result<(), RenderError> {
        if height <= self.cursor.remaining() + EPS {
            self.cursor.y += height;
            return Ok(());
        }
        if height <= self.geo.content_height() + EPS {
            self.break_page();
            self.cursor.y += height;
            return Ok(());
        }
        Err(RenderError::ContentOverflow {
            block,
            page: self.page_number(),
        })
    }

    fn place_paragraph(
        &mut self,
        text: &RichText,
        style_name: &str,
        block: usize,
    ) -> Result<(), RenderError> {
        let style = self.styles.resolve(style_name)?;
        let paragraph = text::flow(text, &style, self.geo.content_width(), self.fonts);

        // Space-before is dropped at the top of a page.
        let mut space_before = if self.cursor.at_top() {
            0.0
        } else {
            style.space_before
        };
        if space_before + paragraph.height > self.cursor.remaining() + EPS {
            if paragraph.height > self.geo.content_height() + EPS {
                return Err(RenderError::ContentOverflow {
                    block,
                    page: self.page_number(),
                });
            }
            self.break_page();
            space_before = 0.0;
        }

        self.cursor.y += space_before;
        self.emit_paragraph(&paragraph, &style);
        self.cursor.y += paragraph.height;
        self.cursor.advance_clamped(style.space_after);
        Ok(())
    }

    fn place_table(&mut self, table: &Table, block: usize) -> Result<(), RenderError> {
        let content_w = self.geo.content_width();
        let content_h = self.geo.content_height();
        let base = self.styles.resolve_or_root(table.style.as_deref())?;

        let mut current = table.clone();
        let mut first_part = true;
        loop {
            let layout = table::layout(&current, content_w, self.styles, self.fonts, block)?;
            for (i, h) in layout.row_heights.iter().enumerate() {
                if *h > content_h + EPS {
                    return Err(RenderError::UnsplittableRow {
                        block,
                        row: current.authored_row(i),
                    });
                }
            }

            let space_before = if self.cursor.at_top() || !first_part {
                0.0
            } else {
                base.space_before
            };
            let avail = self.cursor.remaining() - space_before;

            if layout.height <= avail + EPS {
                self.cursor.y += space_before;
                self.emit_table(&current, &layout);
                self.cursor.y += layout.height;
                self.cursor.advance_clamped(base.space_after);
                return Ok(());
            }

            if current.splittable {
                if let Some((head, tail)) = table::split_rows(&current, &layout, avail + EPS) {
                    let head_layout =
                        table::layout(&head, content_w, self.styles, self.fonts, block)?;
                    self.cursor.y += space_before;
                    self.emit_table(&head, &head_layout);
                    debug!(
                        "table at block {block} split after {} row(s) on page {}",
                        head.rows.len(),
                        self.page_number()
                    );
                    self.break_page();
                    current = tail;
                    first_part = false;
                    continue;
                }
                // Not even one data row fits in the remaining space.
                if self.cursor.at_top() {
                    return Err(RenderError::ContentOverflow {
                        block,
                        page: self.page_number(),
                    });
                }
                self.break_page();
                first_part = false;
                continue;
            }

            if layout.height <= content_h + EPS {
                // Whole table fits an empty page; retry there.
                self.break_page();
                first_part = false;
                continue;
            }
            return Err(RenderError::UnsplittableTable {
                block,
                page: self.page_number(),
            });
        }
    }

    fn emit_paragraph(&mut self, paragraph: &FlowedParagraph, style: &ResolvedStyle) {
        let left = self.geo.margin.left;
        let top = self.geo.margin.top + self.cursor.y;

        if let Some(background) = style.background {
            self.cursor.ops.push(DrawOp::Rect {
                x: left,
                y: top,
                width: self.geo.content_width(),
                height: paragraph.height,
                fill: Some(background),
                stroke: None,
            });
        }

        let ascent = self
            .fonts
            .ascent(&style.font_family, style.bold, style.italic, style.font_size);
        for (i, line) in paragraph.lines.iter().enumerate() {
            let baseline = top + i as f64 * paragraph.line_height + ascent;
            for run in &line.runs {
                self.cursor.ops.push(DrawOp::Text {
                    x: left + run.x,
                    y: baseline,
                    text: run.text.clone(),
                    font_family: style.font_family.clone(),
                    font_size: style.font_size,
                    bold: run.bold,
                    italic: run.italic,
                    color: style.color,
                });
            }
        }
    }

    fn emit_table(&mut self, table: &Table, layout: &TableLayout) {
        let left = self.geo.margin.left;
        let top = self.geo.margin.top + self.cursor.y;

        let mut row_tops = Vec::with_capacity(layout.row_heights.len());
        let mut y = top;
        for h in &layout.row_heights {
            row_tops.push(y);
            y += h;
        }

        // Backgrounds first, then outlines, then text, so banding never
        // paints over grid lines or glyphs.
        for cell in &layout.cells {
            if let Some(background) = cell.style.background {
                self.cursor.ops.push(DrawOp::Rect {
                    x: left + cell.x,
                    y: row_tops[cell.row],
                    width: cell.width,
                    height: layout.covered_height(cell.row, cell.row_span),
                    fill: Some(background),
                    stroke: None,
                });
            }
        }

        if let Some(grid) = table.grid {
            for cell in &layout.cells {
                self.cursor.ops.push(DrawOp::Rect {
                    x: left + cell.x,
                    y: row_tops[cell.row],
                    width: cell.width,
                    height: layout.covered_height(cell.row, cell.row_span),
                    fill: None,
                    stroke: Some(Stroke {
                        width: grid.width,
                        color: grid.color,
                    }),
                });
            }
        }

        for cell in &layout.cells {
            let style = &cell.style;
            let text_left = left + cell.x + cell.padding.left;
            // Middle/bottom alignment shifts the text block within the
            // covered cell height.
            let inner_height =
                layout.covered_height(cell.row, cell.row_span) - cell.padding.vertical();
            let slack = (inner_height - cell.paragraph.height).max(0.0);
            let offset = match style.valign {
                VerticalAlignment::Top => 0.0,
                VerticalAlignment::Middle => slack / 2.0,
                VerticalAlignment::Bottom => slack,
            };
            let text_top = row_tops[cell.row] + cell.padding.top + offset;
            let ascent = self
                .fonts
                .ascent(&style.font_family, style.bold, style.italic, style.font_size);
            for (i, line) in cell.paragraph.lines.iter().enumerate() {
                let baseline = text_top + i as f64 * cell.paragraph.line_height + ascent;
                for run in &line.runs {
                    self.cursor.ops.push(DrawOp::Text {
                        x: text_left + run.x,
                        y: baseline,
                        text: run.text.clone(),
                        font_family: style.font_family.clone(),
                        font_size: style.font_size,
                        bold: run.bold,
                        italic: run.italic,
                        color: style.color,
                    });
                }
            }
        }
    }
}
