//! # Paragraph Flow Engine
//!
//! Greedy line-breaking of rich text into positioned lines. Break
//! opportunities come from UAX#14 (`unicode-linebreak`); the fragments
//! between opportunities are the "words" the greedy algorithm fills lines
//! with. A word that spans emphasis runs keeps one measured fragment per
//! run, so mixed-style words wrap exactly like uniform ones.

use crate::font::FontContext;
use crate::model::RichText;
use crate::style::{Alignment, ResolvedStyle};
use unicode_linebreak::linebreaks;

const WIDTH_EPS: f64 = 1e-6;

/// A styled fragment positioned on a line. `x` is relative to the column's
/// left edge, alignment and justification already applied.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRun {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub x: f64,
    pub width: f64,
}

/// One laid-out line.
#[derive(Debug, Clone)]
pub struct Line {
    pub runs: Vec<LineRun>,
    /// Width before justification, trailing whitespace excluded.
    pub natural_width: f64,
    /// Width actually occupied; equals the column width on justified lines.
    pub rendered_width: f64,
}

/// A paragraph flowed into a column of known width.
#[derive(Debug, Clone)]
pub struct FlowedParagraph {
    pub lines: Vec<Line>,
    /// Baseline-to-baseline distance.
    pub line_height: f64,
    /// Total height: `lines.len() * line_height`.
    pub height: f64,
}

/// A word plus its trailing whitespace, the unit of greedy filling.
struct Token {
    frags: Vec<Frag>,
    trimmed_width: f64,
    ws_width: f64,
    mandatory_after: bool,
}

struct Frag {
    text: String,
    bold: bool,
    italic: bool,
    width: f64,
}

/// Flow rich text into lines within `max_width`.
pub fn flow(
    text: &RichText,
    style: &ResolvedStyle,
    max_width: f64,
    fonts: &FontContext,
) -> FlowedParagraph {
    let line_height = style.line_height();
    let empty = |count: usize| FlowedParagraph {
        lines: vec![
            Line {
                runs: vec![],
                natural_width: 0.0,
                rendered_width: 0.0,
            };
            count
        ],
        line_height,
        height: count as f64 * line_height,
    };

    // Concatenate runs, remembering which byte spans carry which emphasis.
    let mut full = String::new();
    let mut spans: Vec<(std::ops::Range<usize>, bool, bool)> = Vec::new();
    for run in &text.runs {
        if run.text.is_empty() {
            continue;
        }
        let start = full.len();
        full.push_str(&run.text);
        spans.push((
            start..full.len(),
            run.bold || style.bold,
            run.italic || style.italic,
        ));
    }
    if full.is_empty() {
        // A zero-width, single-line-height block preserves vertical spacing.
        return empty(1);
    }

    let tokens = tokenize(&full, &spans, style, fonts);

    // Greedy fill: accumulate tokens while the trimmed width fits; a token
    // wider than the column goes alone on its own line.
    let mut grouped: Vec<(Vec<Token>, bool)> = Vec::new();
    let mut current: Vec<Token> = Vec::new();
    let mut current_width = 0.0; // includes trailing whitespace so far
    for token in tokens {
        if !current.is_empty() && current_width + token.trimmed_width > max_width + WIDTH_EPS {
            grouped.push((std::mem::take(&mut current), false));
            current_width = 0.0;
        }
        current_width += token.trimmed_width + token.ws_width;
        let flush = token.mandatory_after;
        current.push(token);
        if flush {
            grouped.push((std::mem::take(&mut current), true));
            current_width = 0.0;
        }
    }
    if !current.is_empty() {
        grouped.push((current, false));
    }
    if grouped.is_empty() {
        return empty(1);
    }

    let last_index = grouped.len() - 1;
    let lines: Vec<Line> = grouped
        .iter()
        .enumerate()
        .map(|(i, (tokens, hard_break))| {
            build_line(
                tokens,
                style.alignment,
                max_width,
                i == last_index || *hard_break,
            )
        })
        .collect();

    let height = lines.len() as f64 * line_height;
    FlowedParagraph {
        lines,
        line_height,
        height,
    }
}

/// Cut the concatenated text at UAX#14 break opportunities and measure each
/// segment, splitting it across run boundaries where emphasis changes.
fn tokenize(
    full: &str,
    spans: &[(std::ops::Range<usize>, bool, bool)],
    style: &ResolvedStyle,
    fonts: &FontContext,
) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (end, opportunity) in linebreaks(full) {
        let segment = &full[start..end];
        let trimmed = segment.trim_end_matches(char::is_whitespace);
        let trimmed_end = start + trimmed.len();

        let mut frags = Vec::new();
        let mut trimmed_width = 0.0;
        for (span, bold, italic) in spans {
            let lo = span.start.max(start);
            let hi = span.end.min(trimmed_end);
            if lo >= hi {
                continue;
            }
            let text = &full[lo..hi];
            let width = fonts.measure(text, &style.font_family, *bold, *italic, style.font_size);
            trimmed_width += width;
            frags.push(Frag {
                text: text.to_string(),
                bold: *bold,
                italic: *italic,
                width,
            });
        }

        let ws_width: f64 = full[trimmed_end..end]
            .chars()
            .map(|ch| match ch {
                '\n' | '\r' | '\u{2028}' | '\u{2029}' => 0.0,
                '\t' => fonts.char_width(' ', &style.font_family, style.bold, style.italic, style.font_size),
                ch => fonts.char_width(ch, &style.font_family, style.bold, style.italic, style.font_size),
            })
            .sum();

        // The break opportunity at end-of-text is always mandatory; the
        // final flush handles it, so only interior hard breaks count.
        let mandatory_after = end < full.len()
            && matches!(opportunity, unicode_linebreak::BreakOpportunity::Mandatory);

        tokens.push(Token {
            frags,
            trimmed_width,
            ws_width,
            mandatory_after,
        });
        start = end;
    }
    tokens
}

fn build_line(tokens: &[Token], alignment: Alignment, max_width: f64, is_last: bool) -> Line {
    let trimmed_total: f64 = tokens.iter().map(|t| t.trimmed_width).sum();
    let interior_ws: f64 = tokens
        .iter()
        .take(tokens.len().saturating_sub(1))
        .map(|t| t.ws_width)
        .sum();
    let natural_width = trimmed_total + interior_ws;

    // Gaps eligible for justification: boundaries whose separator is
    // actual whitespace.
    let gaps = tokens
        .iter()
        .take(tokens.len().saturating_sub(1))
        .filter(|t| t.ws_width > 0.0)
        .count();
    let extra_per_gap = if alignment == Alignment::Justify
        && !is_last
        && gaps > 0
        && natural_width < max_width
    {
        (max_width - natural_width) / gaps as f64
    } else {
        0.0
    };

    let x0 = match alignment {
        Alignment::Left | Alignment::Justify => 0.0,
        Alignment::Center => ((max_width - natural_width) / 2.0).max(0.0),
        Alignment::Right => (max_width - natural_width).max(0.0),
    };

    let mut runs = Vec::new();
    let mut x = x0;
    for (i, token) in tokens.iter().enumerate() {
        for frag in &token.frags {
            runs.push(LineRun {
                text: frag.text.clone(),
                bold: frag.bold,
                italic: frag.italic,
                x,
                width: frag.width,
            });
            x += frag.width;
        }
        if i + 1 < tokens.len() {
            x += token.ws_width;
            if token.ws_width > 0.0 {
                x += extra_per_gap;
            }
        }
    }

    Line {
        runs,
        natural_width,
        rendered_width: natural_width + extra_per_gap * gaps as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Run;

    fn style(alignment: Alignment) -> ResolvedStyle {
        ResolvedStyle {
            alignment,
            ..ResolvedStyle::root()
        }
    }

    fn texts(line: &Line) -> String {
        line.runs.iter().map(|r| r.text.as_str()).collect()
    }

    #[test]
    fn greedy_break_fills_lines_left_to_right() {
        let fonts = FontContext::new();
        // At 10pt Helvetica: "aa" = 11.12, "cc" = 10.0, space = 2.78.
        let para = flow(&"aa bb cc".into(), &style(Alignment::Left), 26.0, &fonts);
        assert_eq!(para.lines.len(), 2);
        assert_eq!(texts(&para.lines[0]), "aabb");
        assert_eq!(texts(&para.lines[1]), "cc");
    }

    #[test]
    fn overwide_word_gets_its_own_line() {
        let fonts = FontContext::new();
        // "mmmm" is 33.32pt at 10pt, far wider than the 6pt column.
        let para = flow(&"a mmmm a".into(), &style(Alignment::Left), 6.0, &fonts);
        assert_eq!(para.lines.len(), 3);
        assert_eq!(texts(&para.lines[1]), "mmmm");
        assert!(para.lines[1].natural_width > 6.0);
    }

    #[test]
    fn empty_text_is_one_empty_line() {
        let fonts = FontContext::new();
        let para = flow(&RichText::default(), &style(Alignment::Left), 100.0, &fonts);
        assert_eq!(para.lines.len(), 1);
        assert!(para.lines[0].runs.is_empty());
        assert_eq!(para.height, para.line_height);
    }

    #[test]
    fn hard_break_starts_a_new_line() {
        let fonts = FontContext::new();
        let para = flow(&"one\ntwo".into(), &style(Alignment::Left), 500.0, &fonts);
        assert_eq!(para.lines.len(), 2);
        assert_eq!(texts(&para.lines[0]), "one");
        assert_eq!(texts(&para.lines[1]), "two");
    }

    #[test]
    fn justify_stretches_every_line_but_the_last() {
        let fonts = FontContext::new();
        let body = "the quick brown fox jumps over the lazy dog and keeps on running";
        let para = flow(&body.into(), &style(Alignment::Justify), 120.0, &fonts);
        assert!(para.lines.len() > 2, "test needs a multi-line paragraph");
        for line in &para.lines[..para.lines.len() - 1] {
            assert!(
                (line.rendered_width - 120.0).abs() < 1e-6,
                "justified line should span the column: {} != 120",
                line.rendered_width
            );
        }
        let last = para.lines.last().unwrap();
        assert_eq!(last.rendered_width, last.natural_width);
    }

    #[test]
    fn centered_line_is_offset_by_half_the_slack() {
        let fonts = FontContext::new();
        let para = flow(&"hi".into(), &style(Alignment::Center), 100.0, &fonts);
        let line = &para.lines[0];
        let expected = (100.0 - line.natural_width) / 2.0;
        assert!((line.runs[0].x - expected).abs() < 1e-9);
    }

    #[test]
    fn mixed_emphasis_word_stays_one_word() {
        let fonts = FontContext::new();
        let text = RichText {
            runs: vec![Run::plain("fo"), Run::bold("od")],
        };
        let para = flow(&text, &style(Alignment::Left), 500.0, &fonts);
        assert_eq!(para.lines.len(), 1);
        let runs = &para.lines[0].runs;
        assert_eq!(runs.len(), 2);
        assert!(!runs[0].bold && runs[1].bold);
        // The bold fragment starts exactly where the plain one ends.
        assert!((runs[1].x - (runs[0].x + runs[0].width)).abs() < 1e-9);
    }

    #[test]
    fn paragraph_style_bold_applies_to_all_runs() {
        let fonts = FontContext::new();
        let bold_style = ResolvedStyle {
            bold: true,
            ..ResolvedStyle::root()
        };
        let para = flow(&"x".into(), &bold_style, 100.0, &fonts);
        assert!(para.lines[0].runs[0].bold);
    }
}
