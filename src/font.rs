//! # Font Metrics
//!
//! Text measurement for the flow engines. The Helvetica family ships built
//! in as AFM advance-width tables (standard fonts need no font file), and
//! custom TrueType/OpenType faces can be registered and are measured
//! through ttf-parser. Which bytes end up in the output file is the
//! backend's concern; this module only answers "how wide is this text".

use crate::error::RenderError;
use std::collections::HashMap;

/// Per-mille advance widths for Helvetica, ASCII 32..=126. Oblique shares
/// the upright widths.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, // 'A'..'P'
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'Q'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, // 'a'..'p'
    556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // 'q'..'z'
    334, 260, 334, 584, // '{'..'~'
];

/// Per-mille advance widths for Helvetica-Bold, ASCII 32..=126.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    333, 333, 584, 584, 584, 611, 975, // ':'..'@'
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, // 'A'..'P'
    778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // 'Q'..'Z'
    333, 278, 333, 584, 556, 333, // '['..'`'
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, // 'a'..'p'
    611, 389, 556, 333, 611, 556, 778, 556, 556, 500, // 'q'..'z'
    389, 280, 389, 584, // '{'..'~'
];

/// Fallback per-mille advance for characters outside the AFM table.
const DEFAULT_WIDTH: u16 = 556;
const DEFAULT_BOLD_WIDTH: u16 = 611;

/// Helvetica ascender, per mille of the font size.
const ASCENDER: f64 = 0.718;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
struct FontKey {
    family: String,
    bold: bool,
    italic: bool,
}

impl FontKey {
    fn new(family: &str, bold: bool, italic: bool) -> Self {
        Self {
            family: family.to_ascii_lowercase(),
            bold,
            italic,
        }
    }
}

/// Metrics parsed from a registered TrueType/OpenType face.
#[derive(Debug, Clone)]
struct FaceMetrics {
    units_per_em: u16,
    advances: HashMap<char, u16>,
    default_advance: u16,
    ascender: i16,
}

impl FaceMetrics {
    fn parse(data: &[u8]) -> Result<Self, RenderError> {
        let face = ttf_parser::Face::parse(data, 0)
            .map_err(|e| RenderError::Font(format!("failed to parse font: {e}")))?;
        let units_per_em = face.units_per_em();
        let ascender = face.ascender();

        // Sample the Basic Multilingual Plane's text range for advances.
        let mut advances = HashMap::new();
        let mut default_advance = 0u16;
        for code in 32u32..=0x2FFF {
            if let Some(ch) = char::from_u32(code) {
                if let Some(glyph_id) = face.glyph_index(ch) {
                    let advance = face.glyph_hor_advance(glyph_id).unwrap_or(0);
                    advances.insert(ch, advance);
                    if ch == ' ' {
                        default_advance = advance;
                    }
                }
            }
        }
        if default_advance == 0 {
            default_advance = units_per_em / 2;
        }

        Ok(Self {
            units_per_em,
            advances,
            default_advance,
            ascender,
        })
    }

    fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let w = self
            .advances
            .get(&ch)
            .copied()
            .unwrap_or(self.default_advance);
        w as f64 / self.units_per_em as f64 * font_size
    }

    fn ascent(&self, font_size: f64) -> f64 {
        self.ascender as f64 / self.units_per_em as f64 * font_size
    }
}

/// Read-only once populated, like the style sheet: register fonts before
/// rendering, measure during.
#[derive(Debug, Default)]
pub struct FontContext {
    custom: HashMap<FontKey, FaceMetrics>,
}

impl FontContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a TrueType/OpenType face for a family/emphasis combination.
    pub fn register(
        &mut self,
        family: &str,
        bold: bool,
        italic: bool,
        data: &[u8],
    ) -> Result<(), RenderError> {
        let metrics = FaceMetrics::parse(data)?;
        self.custom
            .insert(FontKey::new(family, bold, italic), metrics);
        Ok(())
    }

    fn lookup(&self, family: &str, bold: bool, italic: bool) -> Option<&FaceMetrics> {
        self.custom
            .get(&FontKey::new(family, bold, italic))
            // Fall back to the upright face of the same family.
            .or_else(|| self.custom.get(&FontKey::new(family, false, false)))
    }

    /// Advance width of one character in points.
    pub fn char_width(&self, ch: char, family: &str, bold: bool, italic: bool, size: f64) -> f64 {
        if let Some(metrics) = self.lookup(family, bold, italic) {
            return metrics.char_width(ch, size);
        }
        let per_mille = match (ch as u32, bold) {
            (32..=126, false) => HELVETICA_WIDTHS[ch as usize - 32],
            (32..=126, true) => HELVETICA_BOLD_WIDTHS[ch as usize - 32],
            (_, false) => DEFAULT_WIDTH,
            (_, true) => DEFAULT_BOLD_WIDTH,
        };
        let _ = italic; // oblique shares the upright widths
        per_mille as f64 / 1000.0 * size
    }

    /// Width of a string in points.
    pub fn measure(&self, text: &str, family: &str, bold: bool, italic: bool, size: f64) -> f64 {
        text.chars()
            .map(|ch| self.char_width(ch, family, bold, italic, size))
            .sum()
    }

    /// Distance from the line top to the text baseline, in points.
    pub fn ascent(&self, family: &str, bold: bool, italic: bool, size: f64) -> f64 {
        if let Some(metrics) = self.lookup(family, bold, italic) {
            return metrics.ascent(size);
        }
        ASCENDER * size
    }
}
