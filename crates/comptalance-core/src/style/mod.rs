//! Cell formatting
//!
//! A [`Style`] bundles the six formatting facets a balance sheet cell can
//! carry: font, fill, border, alignment, number format and protection.
//! Worksheets intern styles in a [`StylePool`] and cells refer to them by
//! index.

mod alignment;
mod border;
mod color;
mod differential;
mod fill;
mod font;
mod number_format;
mod pool;

pub use alignment::{Alignment, HorizontalAlignment, ReadingOrder, VerticalAlignment};
pub use border::{BorderEdge, BorderLineStyle, BorderStyle, DiagonalDirection};
pub use color::Color;
pub use differential::{DifferentialFont, DifferentialStyle};
pub use fill::{FillStyle, PatternType};
pub use font::{FontStyle, FontVerticalAlign, Underline};
pub use number_format::{NumberFormat, FIRST_CUSTOM_FORMAT_ID};
pub use pool::StylePool;

/// Complete formatting of one cell
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Style {
    pub font: FontStyle,
    pub fill: FillStyle,
    pub border: BorderStyle,
    pub alignment: Alignment,
    pub number_format: NumberFormat,
    pub protection: Protection,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bold(mut self, bold: bool) -> Self {
        self.font.bold = bold;
        self
    }

    pub fn italic(mut self, italic: bool) -> Self {
        self.font.italic = italic;
        self
    }

    pub fn font_size(mut self, size: f64) -> Self {
        self.font.size = size;
        self
    }

    pub fn font_name<S: Into<String>>(mut self, name: S) -> Self {
        self.font.name = name.into();
        self
    }

    pub fn font_color(mut self, color: Color) -> Self {
        self.font.color = color;
        self
    }

    /// Solid background
    pub fn fill_color(mut self, color: Color) -> Self {
        self.fill = FillStyle::solid(color);
        self
    }

    pub fn border(mut self, border: BorderStyle) -> Self {
        self.border = border;
        self
    }

    pub fn horizontal_alignment(mut self, align: HorizontalAlignment) -> Self {
        self.alignment.horizontal = align;
        self
    }

    pub fn wrap_text(mut self, wrap: bool) -> Self {
        self.alignment.wrap_text = wrap;
        self
    }

    /// Custom number format code such as `#,##0.00 €`
    pub fn number_format<S: Into<String>>(mut self, code: S) -> Self {
        self.number_format = NumberFormat::Custom(code.into());
        self
    }

    pub fn protection(mut self, protection: Protection) -> Self {
        self.protection = protection;
        self
    }

    pub fn is_default(&self) -> bool {
        *self == Style::default()
    }
}

/// Cell protection flags, only enforced once the sheet is protected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Protection {
    pub locked: bool,
    pub hidden: bool,
}

impl Protection {
    pub fn unlocked() -> Self {
        Self {
            locked: false,
            hidden: false,
        }
    }
}

impl Default for Protection {
    fn default() -> Self {
        Self {
            locked: true,
            hidden: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_protection_is_locked() {
        let style = Style::default();
        assert!(style.protection.locked);
        assert!(!style.protection.hidden);
        assert!(style.is_default());
    }

    #[test]
    fn test_builder() {
        let style = Style::new()
            .bold(true)
            .font_size(14.0)
            .fill_color(Color::rgb(0xDD, 0xEB, 0xF7))
            .number_format("#,##0.00");

        assert!(style.font.bold);
        assert_eq!(style.font.size, 14.0);
        assert_eq!(style.fill, FillStyle::solid(Color::rgb(0xDD, 0xEB, 0xF7)));
        assert_eq!(style.number_format.format_code(), "#,##0.00");
        assert!(!style.is_default());
    }
}
