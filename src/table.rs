//! # Table Layout Engine
//!
//! Resolves column widths, flows every cell's rich text at its covered
//! width, computes row heights (span-aware), and applies the cell style
//! cascade: table default, then row banding, then region rules in order,
//! then the cell's inline override.
//!
//! Splitting for pagination happens on the model: [`split_rows`] divides a
//! `Table` value row-wise into a part that fits and a continuation part
//! that re-emits the header rows. Because parts are re-laid-out with the
//! same column widths, a split never changes any row's height.

use crate::error::RenderError;
use crate::font::FontContext;
use crate::model::{Cell, ColumnWidth, Edges, Table};
use crate::style::{ResolvedStyle, StyleSheet};
use crate::text::{self, FlowedParagraph};

/// An anchored cell with resolved geometry and style.
#[derive(Debug, Clone)]
pub struct CellLayout {
    /// Grid position of the cell's top-left corner (local to this part).
    pub row: usize,
    pub col: usize,
    pub row_span: usize,
    pub col_span: usize,
    /// X offset from the table's left edge.
    pub x: f64,
    /// Covered width: the sum of the spanned columns.
    pub width: f64,
    /// The style cascade's padding override, or the table default.
    pub padding: Edges,
    pub paragraph: FlowedParagraph,
    pub style: ResolvedStyle,
}

/// A fully measured table.
#[derive(Debug, Clone)]
pub struct TableLayout {
    pub col_widths: Vec<f64>,
    pub row_heights: Vec<f64>,
    pub cells: Vec<CellLayout>,
    pub height: f64,
}

impl TableLayout {
    /// Height covered by rows `first..first + span`.
    pub fn covered_height(&self, first: usize, span: usize) -> f64 {
        self.row_heights[first..first + span].iter().sum()
    }
}

/// Measure `table` against the available content width.
pub fn layout(
    table: &Table,
    avail_width: f64,
    styles: &StyleSheet,
    fonts: &FontContext,
    block: usize,
) -> Result<TableLayout, RenderError> {
    let (col_count, anchors) = expand_grid(&table.rows, block)?;
    let col_widths = resolve_columns(&table.columns, col_count, avail_width, block)?;

    let mut x_offsets = Vec::with_capacity(col_count);
    let mut x = 0.0;
    for w in &col_widths {
        x_offsets.push(x);
        x += w;
    }

    let base = styles.resolve_or_root(table.style.as_deref())?;

    let mut cells = Vec::with_capacity(anchors.len());
    for anchor in &anchors {
        let width: f64 = col_widths[anchor.col..anchor.col + anchor.col_span].iter().sum();
        let style = effective_style(table, &base, anchor.row, anchor.col, anchor.cell);
        let padding = style.padding.unwrap_or(table.padding);
        let inner_width = (width - padding.horizontal()).max(0.0);
        let paragraph = text::flow(&anchor.cell.content, &style, inner_width, fonts);
        cells.push(CellLayout {
            row: anchor.row,
            col: anchor.col,
            row_span: anchor.row_span,
            col_span: anchor.col_span,
            x: x_offsets[anchor.col],
            width,
            padding,
            paragraph,
            style,
        });
    }

    // Single-row cells set the base row heights.
    let mut row_heights = vec![0.0f64; table.rows.len()];
    for cell in cells.iter().filter(|c| c.row_span == 1) {
        let need = cell.paragraph.height + cell.padding.vertical();
        if need > row_heights[cell.row] {
            row_heights[cell.row] = need;
        }
    }
    // A spanning cell that needs more than its covered rows extends the
    // last covered row.
    for cell in cells.iter().filter(|c| c.row_span > 1) {
        let need = cell.paragraph.height + cell.padding.vertical();
        let covered: f64 = row_heights[cell.row..cell.row + cell.row_span].iter().sum();
        if need > covered {
            row_heights[cell.row + cell.row_span - 1] += need - covered;
        }
    }

    let height = row_heights.iter().sum();
    Ok(TableLayout {
        col_widths,
        row_heights,
        cells,
        height,
    })
}

/// Table default, then banding, then region rules in order, then the
/// inline override. Rules address the authored grid, so continuation
/// parts translate their local row indices first.
fn effective_style(
    table: &Table,
    base: &ResolvedStyle,
    row: usize,
    col: usize,
    cell: &Cell,
) -> ResolvedStyle {
    let authored_row = table.authored_row(row);
    let mut style = base.clone();
    if row >= table.header_rows && !table.banding.is_empty() {
        let data_ordinal = authored_row - table.header_rows;
        style.background = Some(table.banding[data_ordinal % table.banding.len()]);
    }
    for rule in &table.style_rules {
        if rule.covers(authored_row, col) {
            style = style.patched(&rule.style);
        }
    }
    if let Some(inline) = &cell.style {
        style = style.patched(inline);
    }
    style
}

struct Anchor<'a> {
    row: usize,
    col: usize,
    row_span: usize,
    col_span: usize,
    cell: &'a Cell,
}

/// Expand row/col spans into an occupancy grid, validating that every row
/// covers exactly the same number of logical columns.
fn expand_grid(rows: &[Vec<Cell>], block: usize) -> Result<(usize, Vec<Anchor<'_>>), RenderError> {
    if rows.is_empty() {
        return Err(RenderError::Layout {
            block,
            reason: "table has no rows".to_string(),
        });
    }

    // The first row carries no incoming spans, so it defines the count.
    let col_count: usize = rows[0].iter().map(|c| c.col_span.max(1)).sum();
    if col_count == 0 {
        return Err(RenderError::Layout {
            block,
            reason: "table row has no cells".to_string(),
        });
    }

    // pending[c] = how many further rows column c stays covered by a span.
    let mut pending = vec![0usize; col_count];
    let mut anchors = Vec::new();

    for (r, row) in rows.iter().enumerate() {
        let mut col = 0;
        for cell in row {
            while col < col_count && pending[col] > 0 {
                col += 1;
            }
            let col_span = cell.col_span.max(1);
            let row_span = cell.row_span.max(1);
            if col + col_span > col_count {
                return Err(RenderError::Layout {
                    block,
                    reason: format!(
                        "row {r} spans past column {col_count} (cell at logical column {col})"
                    ),
                });
            }
            for c in col..col + col_span {
                if pending[c] > 0 {
                    return Err(RenderError::Layout {
                        block,
                        reason: format!("overlapping spans at row {r}, column {c}"),
                    });
                }
                if row_span > 1 {
                    pending[c] = row_span;
                }
            }
            anchors.push(Anchor {
                row: r,
                col,
                row_span,
                col_span,
                cell,
            });
            col += col_span;
        }
        while col < col_count && pending[col] > 0 {
            col += 1;
        }
        if col != col_count {
            return Err(RenderError::Layout {
                block,
                reason: format!("row {r} covers {col} of {col_count} logical columns"),
            });
        }
        for p in pending.iter_mut() {
            if *p > 0 {
                *p -= 1;
            }
        }
    }

    if pending.iter().any(|&p| p > 0) {
        return Err(RenderError::Layout {
            block,
            reason: "a row span extends past the last row".to_string(),
        });
    }

    Ok((col_count, anchors))
}

/// Honor fixed widths as given; auto columns share the remainder equally,
/// with the last auto column absorbing the floating-point remainder so the
/// total is exact.
fn resolve_columns(
    columns: &[ColumnWidth],
    col_count: usize,
    avail_width: f64,
    block: usize,
) -> Result<Vec<f64>, RenderError> {
    if columns.is_empty() {
        let share = avail_width / col_count as f64;
        let mut widths = vec![share; col_count];
        widths[col_count - 1] = avail_width - share * (col_count - 1) as f64;
        return Ok(widths);
    }
    if columns.len() != col_count {
        return Err(RenderError::Layout {
            block,
            reason: format!(
                "table declares {} column widths but has {col_count} logical columns",
                columns.len()
            ),
        });
    }

    let fixed_sum: f64 = columns
        .iter()
        .map(|c| match c {
            ColumnWidth::Fixed(w) => *w,
            ColumnWidth::Auto => 0.0,
        })
        .sum();
    if fixed_sum > avail_width + 1e-6 {
        return Err(RenderError::Layout {
            block,
            reason: format!(
                "fixed column widths sum to {fixed_sum:.2}pt, exceeding the available {avail_width:.2}pt"
            ),
        });
    }

    let auto_count = columns
        .iter()
        .filter(|c| matches!(c, ColumnWidth::Auto))
        .count();
    let share = if auto_count > 0 {
        (avail_width - fixed_sum) / auto_count as f64
    } else {
        0.0
    };

    let mut widths = Vec::with_capacity(col_count);
    let mut auto_seen = 0;
    let mut assigned = 0.0;
    for column in columns {
        let w = match column {
            ColumnWidth::Fixed(w) => *w,
            ColumnWidth::Auto => {
                auto_seen += 1;
                if auto_seen == auto_count {
                    // Last auto column absorbs the rounding remainder.
                    avail_width - assigned - remaining_fixed_after(columns, auto_seen)
                } else {
                    share
                }
            }
        };
        assigned += w;
        widths.push(w);
    }
    Ok(widths)
}

/// Sum of fixed widths declared after the `nth_auto`-th auto column.
fn remaining_fixed_after(columns: &[ColumnWidth], nth_auto: usize) -> f64 {
    let mut autos = 0;
    let mut sum = 0.0;
    for column in columns {
        match column {
            ColumnWidth::Auto => autos += 1,
            ColumnWidth::Fixed(w) if autos >= nth_auto => sum += w,
            ColumnWidth::Fixed(_) => {}
        }
    }
    sum
}

/// Divide `table` row-wise so the first part is at most `avail` tall; the
/// continuation re-emits the header rows and keeps addressing the authored
/// grid for banding and style rules. The split point never cuts a row
/// span. Returns `None` when not even one data row fits under the header.
pub fn split_rows(table: &Table, layout: &TableLayout, avail: f64) -> Option<(Table, Table)> {
    let header = table.header_rows.min(table.rows.len());
    let header_height: f64 = layout.row_heights[..header].iter().sum();
    if header_height > avail {
        return None;
    }

    // Rows whose spans would be cut if the table were split before them.
    let mut span_start = vec![usize::MAX; table.rows.len() + 1];
    for cell in &layout.cells {
        for covered in cell.row + 1..cell.row + cell.row_span {
            span_start[covered] = span_start[covered].min(cell.row);
        }
    }

    let mut height = header_height;
    let mut end = header;
    for r in header..table.rows.len() {
        if height + layout.row_heights[r] > avail + 1e-6 {
            break;
        }
        height += layout.row_heights[r];
        end = r + 1;
    }
    // Snap back out of any row span crossing the cut.
    while end > header && end < table.rows.len() && span_start[end] != usize::MAX {
        end = span_start[end];
    }
    if end <= header || end >= table.rows.len() {
        return None;
    }

    let mut first = table.clone();
    first.rows = table.rows[..end].to_vec();

    let mut rest = table.clone();
    rest.rows = table.rows[..header]
        .iter()
        .chain(table.rows[end..].iter())
        .cloned()
        .collect();
    rest.continued_at = Some(table.authored_row(end));

    Some((first, rest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, CellStyleRule, Color, ColumnWidth, Table};
    use crate::style::Style;

    fn fonts() -> FontContext {
        FontContext::new()
    }

    fn row(texts: &[&str]) -> Vec<Cell> {
        texts.iter().map(|t| Cell::text(*t)).collect()
    }

    #[test]
    fn auto_columns_share_the_width_exactly() {
        let table = Table::new(vec![row(&["a", "b", "c"])]);
        let tl = layout(&table, 500.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        assert_eq!(tl.col_widths.len(), 3);
        let sum: f64 = tl.col_widths.iter().sum();
        assert_eq!(sum, 500.0);
    }

    #[test]
    fn fixed_and_auto_columns_sum_to_the_available_width() {
        let mut table = Table::new(vec![row(&["a", "b", "c"])]);
        table.columns = vec![
            ColumnWidth::Fixed(120.0),
            ColumnWidth::Auto,
            ColumnWidth::Auto,
        ];
        let tl = layout(&table, 500.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        assert_eq!(tl.col_widths[0], 120.0);
        let sum: f64 = tl.col_widths.iter().sum();
        assert!((sum - 500.0).abs() < 1e-9);
    }

    #[test]
    fn fixed_widths_exceeding_the_available_width_fail() {
        let mut table = Table::new(vec![row(&["a", "b", "c"])]);
        table.columns = vec![
            ColumnWidth::Fixed(200.0),
            ColumnWidth::Fixed(200.0),
            ColumnWidth::Fixed(200.0),
        ];
        let err = layout(&table, 500.0, &StyleSheet::new(), &fonts(), 7).unwrap_err();
        assert!(matches!(err, RenderError::Layout { block: 7, .. }));
    }

    #[test]
    fn ragged_rows_fail() {
        let table = Table::new(vec![row(&["a", "b"]), row(&["only one"])]);
        let err = layout(&table, 500.0, &StyleSheet::new(), &fonts(), 0).unwrap_err();
        assert!(matches!(err, RenderError::Layout { .. }));
    }

    #[test]
    fn empty_rows_fail() {
        let table = Table::new(vec![vec![]]);
        let err = layout(&table, 500.0, &StyleSheet::new(), &fonts(), 3).unwrap_err();
        assert!(matches!(err, RenderError::Layout { block: 3, .. }));
    }

    #[test]
    fn col_span_counts_as_multiple_logical_columns() {
        let mut wide = Cell::text("span");
        wide.col_span = 2;
        let table = Table::new(vec![vec![wide, Cell::text("x")], row(&["a", "b", "c"])]);
        let tl = layout(&table, 300.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        assert_eq!(tl.col_widths.len(), 3);
        // The spanning cell covers two columns' width.
        let spanning = tl.cells.iter().find(|c| c.col_span == 2).unwrap();
        assert!((spanning.width - 200.0).abs() < 1e-9);
    }

    #[test]
    fn row_height_is_the_tallest_cell_plus_padding() {
        // Narrow columns force the long cell to wrap onto several lines.
        let table = Table::new(vec![row(&["short", "rather longer content that wraps"])]);
        let tl = layout(&table, 120.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        let tall = &tl.cells[1].paragraph;
        assert!(tall.lines.len() > 1);
        assert_eq!(tl.row_heights[0], tall.height + table.padding.vertical());
    }

    #[test]
    fn row_span_extends_the_last_covered_row_when_needed() {
        let mut spanning = Cell::text(
            "a very long passage that needs far more vertical room than two short rows provide \
             once it wraps inside a narrow column",
        );
        spanning.row_span = 2;
        let table = Table::new(vec![
            vec![spanning, Cell::text("r0")],
            vec![Cell::text("r1")],
        ]);
        let tl = layout(&table, 160.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        let span_cell = tl.cells.iter().find(|c| c.row_span == 2).unwrap();
        let need = span_cell.paragraph.height + table.padding.vertical();
        let covered: f64 = tl.row_heights.iter().sum();
        assert!(covered >= need - 1e-9, "covered {covered} < needed {need}");
    }

    #[test]
    fn region_rule_padding_overrides_the_table_default() {
        let mut table = Table::new(vec![row(&["a"]), row(&["b"])]);
        table.style_rules = vec![CellStyleRule {
            rows: (0, 0),
            cols: (0, 0),
            style: Style {
                padding: Some(Edges::symmetric(10.0, 6.0)),
                ..Default::default()
            },
        }];
        let tl = layout(&table, 300.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        // 12pt line plus 10pt top and bottom, against the default 3pt.
        assert_eq!(tl.row_heights[0], 32.0);
        assert_eq!(tl.row_heights[1], 18.0);
        assert_eq!(tl.cells[0].padding.left, 6.0);
    }

    #[test]
    fn banding_applies_to_data_rows_and_rules_override_it() {
        let band = Color::hex("#eeeeee");
        let highlight = Color::hex("#ffcc00");
        let mut table = Table::new(vec![
            row(&["h"]),
            row(&["d0"]),
            row(&["d1"]),
            row(&["d2"]),
            row(&["d3"]),
        ]);
        table.header_rows = 1;
        table.banding = vec![Color::WHITE, band];
        table.style_rules = vec![CellStyleRule {
            rows: (2, 2),
            cols: (0, 0),
            style: Style {
                background: Some(highlight),
                ..Default::default()
            },
        }];
        let tl = layout(&table, 300.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        let bg = |r: usize| tl.cells.iter().find(|c| c.row == r).unwrap().style.background;
        assert_eq!(bg(0), None, "header row is not banded");
        assert_eq!(bg(1), Some(Color::WHITE));
        assert_eq!(bg(2), Some(highlight), "explicit rule wins over banding");
        assert_eq!(bg(3), Some(Color::WHITE), "cycle wraps around");
        assert_eq!(bg(4), Some(band));
    }

    #[test]
    fn split_partitions_rows_and_repeats_the_header() {
        let mut rows = vec![row(&["head"])];
        for i in 0..10 {
            rows.push(row(&[&format!("row {i}")]));
        }
        let mut table = Table::new(rows);
        table.header_rows = 1;
        table.splittable = true;
        let tl = layout(&table, 300.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        let row_h = tl.row_heights[0];
        // Room for the header plus four data rows.
        let (first, rest) = split_rows(&table, &tl, row_h * 5.0 + 0.5).unwrap();
        assert_eq!(first.rows.len(), 5);
        assert_eq!(rest.rows.len(), 1 + 6);
        assert_eq!(rest.continued_at, Some(5));
        // Banding phase continues: the first data row of the continuation
        // maps back to authored row 5.
        assert_eq!(rest.authored_row(1), 5);
        // No row duplicated or dropped.
        let first_texts: Vec<_> = first.rows[1..]
            .iter()
            .map(|r| r[0].content.runs[0].text.clone())
            .collect();
        let rest_texts: Vec<_> = rest.rows[1..]
            .iter()
            .map(|r| r[0].content.runs[0].text.clone())
            .collect();
        assert_eq!(first_texts.len() + rest_texts.len(), 10);
        assert_eq!(first_texts.last().unwrap(), "row 3");
        assert_eq!(rest_texts.first().unwrap(), "row 4");
    }

    #[test]
    fn split_never_cuts_a_row_span() {
        let mut spanning = Cell::text("tall");
        spanning.row_span = 3;
        let mut table = Table::new(vec![
            vec![Cell::text("r0"), Cell::text("x")],
            vec![spanning, Cell::text("r1")],
            vec![Cell::text("r2")],
            vec![Cell::text("r3")],
            vec![Cell::text("r4"), Cell::text("y")],
        ]);
        table.splittable = true;
        let tl = layout(&table, 300.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        let row_h = tl.row_heights[0];
        // Budget for three rows; a naive cut would land inside the span
        // (rows 1..4), so the split snaps back to the span's first row.
        let (first, rest) = split_rows(&table, &tl, row_h * 3.0 + 0.5).unwrap();
        assert_eq!(first.rows.len(), 1);
        assert_eq!(rest.rows.len(), 4);
    }

    #[test]
    fn split_returns_none_when_nothing_fits_under_the_header() {
        let mut table = Table::new(vec![row(&["head"]), row(&["data"])]);
        table.header_rows = 1;
        table.splittable = true;
        let tl = layout(&table, 300.0, &StyleSheet::new(), &fonts(), 0).unwrap();
        assert!(split_rows(&table, &tl, tl.row_heights[0] * 1.5).is_none());
    }
}
