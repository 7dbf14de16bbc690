//! # Style System
//!
//! Named, inheritable visual styles. A [`Style`] is a patch record: every
//! field is optional, and unset fields inherit from the parent named by
//! `parent`. Resolution walks the ancestor chain and terminates at built-in
//! root defaults, so a [`ResolvedStyle`] always has every field concrete.
//!
//! The same patch mechanics drive table styling: region rules and inline
//! cell overrides are `Style` values layered onto an already-resolved base.

use crate::error::RenderError;
use crate::model::{Color, Edges};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Horizontal alignment of paragraph lines within their column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Alignment {
    #[default]
    Left,
    Center,
    Right,
    Justify,
}

/// Vertical alignment of cell content within its row. Ignored outside
/// table cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalAlignment {
    #[default]
    Top,
    Middle,
    Bottom,
}

/// A named style record. All fields optional; unset fields inherit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Style {
    /// Name of the parent style to inherit from.
    pub parent: Option<String>,
    pub font_family: Option<String>,
    /// Font size in quarter-points (40 = 10pt).
    pub font_size_qp: Option<u32>,
    pub color: Option<Color>,
    pub background: Option<Color>,
    pub alignment: Option<Alignment>,
    pub valign: Option<VerticalAlignment>,
    /// Cell padding override; the owning table supplies the default.
    pub padding: Option<Edges>,
    /// Vertical gap requested before the block, in points.
    pub space_before: Option<f64>,
    /// Vertical gap requested after the block, in points.
    pub space_after: Option<f64>,
    /// Line height as a multiple of the font size.
    pub leading: Option<f64>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
}

impl Style {
    /// Layer `patch` over `self`: fields set in the patch win.
    pub fn patched(&self, patch: &Style) -> Style {
        Style {
            parent: patch.parent.clone().or_else(|| self.parent.clone()),
            font_family: patch.font_family.clone().or_else(|| self.font_family.clone()),
            font_size_qp: patch.font_size_qp.or(self.font_size_qp),
            color: patch.color.or(self.color),
            background: patch.background.or(self.background),
            alignment: patch.alignment.or(self.alignment),
            valign: patch.valign.or(self.valign),
            padding: patch.padding.or(self.padding),
            space_before: patch.space_before.or(self.space_before),
            space_after: patch.space_after.or(self.space_after),
            leading: patch.leading.or(self.leading),
            bold: patch.bold.or(self.bold),
            italic: patch.italic.or(self.italic),
        }
    }
}

/// A fully concrete style, produced by [`StyleSheet::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub font_family: String,
    /// Font size in points.
    pub font_size: f64,
    pub color: Color,
    pub background: Option<Color>,
    pub alignment: Alignment,
    pub valign: VerticalAlignment,
    /// Cell padding override; `None` defers to the owning table.
    pub padding: Option<Edges>,
    pub space_before: f64,
    pub space_after: f64,
    pub leading: f64,
    pub bold: bool,
    pub italic: bool,
}

impl ResolvedStyle {
    /// The built-in root defaults every inheritance chain bottoms out on.
    pub fn root() -> Self {
        Self {
            font_family: "Helvetica".to_string(),
            font_size: 10.0,
            color: Color::BLACK,
            background: None,
            alignment: Alignment::Left,
            valign: VerticalAlignment::Top,
            padding: None,
            space_before: 0.0,
            space_after: 0.0,
            leading: 1.2,
            bold: false,
            italic: false,
        }
    }

    /// Baseline-to-baseline distance in points.
    pub fn line_height(&self) -> f64 {
        self.font_size * self.leading
    }

    /// Apply a flat patch on top of this resolved style. The patch's
    /// `parent` field is ignored; region and inline overrides are flat.
    pub fn patched(&self, patch: &Style) -> ResolvedStyle {
        ResolvedStyle {
            font_family: patch
                .font_family
                .clone()
                .unwrap_or_else(|| self.font_family.clone()),
            font_size: patch
                .font_size_qp
                .map(|qp| qp as f64 / 4.0)
                .unwrap_or(self.font_size),
            color: patch.color.unwrap_or(self.color),
            background: patch.background.or(self.background),
            alignment: patch.alignment.unwrap_or(self.alignment),
            valign: patch.valign.unwrap_or(self.valign),
            padding: patch.padding.or(self.padding),
            space_before: patch.space_before.unwrap_or(self.space_before),
            space_after: patch.space_after.unwrap_or(self.space_after),
            leading: patch.leading.unwrap_or(self.leading),
            bold: patch.bold.unwrap_or(self.bold),
            italic: patch.italic.unwrap_or(self.italic),
        }
    }
}

/// A registry of named styles. Populated once before rendering, pure
/// read-only lookup afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StyleSheet {
    styles: HashMap<String, Style>,
}

impl StyleSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, style: Style) {
        self.styles.insert(name.into(), style);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.styles.contains_key(name)
    }

    /// Merge `name` with its ancestor chain, child fields overriding parent
    /// fields, terminating at [`ResolvedStyle::root`].
    pub fn resolve(&self, name: &str) -> Result<ResolvedStyle, RenderError> {
        // Walk child -> parent, keeping the path for cycle detection.
        let mut path: Vec<&str> = Vec::new();
        let mut chain: Vec<&Style> = Vec::new();
        let mut current = name;
        loop {
            if path.contains(&current) {
                return Err(RenderError::StyleCycle {
                    name: current.to_string(),
                });
            }
            let style = self
                .styles
                .get(current)
                .ok_or_else(|| RenderError::UnknownStyle {
                    name: current.to_string(),
                })?;
            path.push(current);
            chain.push(style);
            match &style.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }

        // Fold root-first so children override ancestors.
        let mut resolved = ResolvedStyle::root();
        for style in chain.iter().rev() {
            resolved = resolved.patched(style);
        }
        Ok(resolved)
    }

    /// Resolve an optional style name, falling back to the root defaults.
    pub fn resolve_or_root(&self, name: Option<&str>) -> Result<ResolvedStyle, RenderError> {
        match name {
            Some(name) => self.resolve(name),
            None => Ok(ResolvedStyle::root()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sheet() -> StyleSheet {
        let mut sheet = StyleSheet::new();
        sheet.insert(
            "body",
            Style {
                font_size_qp: Some(40),
                space_after: Some(6.0),
                ..Default::default()
            },
        );
        sheet.insert(
            "heading",
            Style {
                parent: Some("body".to_string()),
                font_size_qp: Some(48),
                bold: Some(true),
                ..Default::default()
            },
        );
        sheet
    }

    #[test]
    fn child_overrides_parent_and_inherits_the_rest() {
        let resolved = sheet().resolve("heading").unwrap();
        assert_eq!(resolved.font_size, 12.0);
        assert!(resolved.bold);
        // inherited from "body"
        assert_eq!(resolved.space_after, 6.0);
        // inherited from the root defaults
        assert_eq!(resolved.font_family, "Helvetica");
        assert_eq!(resolved.alignment, Alignment::Left);
    }

    #[test]
    fn unknown_style_is_an_error() {
        let err = sheet().resolve("missing").unwrap_err();
        assert!(matches!(err, RenderError::UnknownStyle { name } if name == "missing"));
    }

    #[test]
    fn unknown_parent_is_an_error() {
        let mut sheet = StyleSheet::new();
        sheet.insert(
            "orphan",
            Style {
                parent: Some("gone".to_string()),
                ..Default::default()
            },
        );
        let err = sheet.resolve("orphan").unwrap_err();
        assert!(matches!(err, RenderError::UnknownStyle { name } if name == "gone"));
    }

    #[test]
    fn parent_cycle_is_an_error() {
        let mut sheet = StyleSheet::new();
        sheet.insert(
            "a",
            Style {
                parent: Some("b".to_string()),
                ..Default::default()
            },
        );
        sheet.insert(
            "b",
            Style {
                parent: Some("a".to_string()),
                ..Default::default()
            },
        );
        let err = sheet.resolve("a").unwrap_err();
        assert!(matches!(err, RenderError::StyleCycle { .. }));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let mut sheet = StyleSheet::new();
        sheet.insert(
            "selfish",
            Style {
                parent: Some("selfish".to_string()),
                ..Default::default()
            },
        );
        let err = sheet.resolve("selfish").unwrap_err();
        assert!(matches!(err, RenderError::StyleCycle { name } if name == "selfish"));
    }

    #[test]
    fn quarter_points_convert_to_points() {
        let mut sheet = StyleSheet::new();
        sheet.insert(
            "fine",
            Style {
                font_size_qp: Some(37),
                ..Default::default()
            },
        );
        assert_eq!(sheet.resolve("fine").unwrap().font_size, 9.25);
    }
}
