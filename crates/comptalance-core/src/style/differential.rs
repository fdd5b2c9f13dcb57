//! Differential formats
//!
//! A conditional format does not replace a cell's style; it overlays the
//! handful of facets it names. Every field here is therefore optional, and
//! `None` means "leave the cell's own value alone".

use super::{BorderStyle, Color, FillStyle, NumberFormat, Underline};

/// Formatting applied on top of a cell's style when a rule matches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DifferentialStyle {
    pub font: Option<DifferentialFont>,
    pub fill: Option<FillStyle>,
    pub border: Option<BorderStyle>,
    pub number_format: Option<NumberFormat>,
}

impl DifferentialStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.font.as_ref().map_or(true, DifferentialFont::is_empty)
            && self.fill.is_none()
            && self.border.is_none()
            && self.number_format.is_none()
    }

    pub fn font_color(mut self, color: Color) -> Self {
        self.font.get_or_insert_with(DifferentialFont::default).color = Some(color);
        self
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.font.get_or_insert_with(DifferentialFont::default).bold = Some(bold);
        self
    }

    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = Some(FillStyle::solid(color));
        self
    }
}

/// The font properties a differential format may override
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct DifferentialFont {
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub strikethrough: Option<bool>,
    pub underline: Option<Underline>,
    pub color: Option<Color>,
}

impl DifferentialFont {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
