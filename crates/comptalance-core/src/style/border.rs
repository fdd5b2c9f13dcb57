//! Cell borders

use super::Color;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BorderStyle {
    pub left: Option<BorderEdge>,
    pub right: Option<BorderEdge>,
    pub top: Option<BorderEdge>,
    pub bottom: Option<BorderEdge>,
    pub diagonal: Option<BorderEdge>,
    pub diagonal_direction: DiagonalDirection,
}

impl BorderStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Same edge on all four sides
    pub fn outline(style: BorderLineStyle, color: Color) -> Self {
        let edge = Some(BorderEdge::new(style, color));
        Self {
            left: edge,
            right: edge,
            top: edge,
            bottom: edge,
            ..Self::default()
        }
    }

    pub fn with_bottom(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.bottom = Some(BorderEdge::new(style, color));
        self
    }

    pub fn with_top(mut self, style: BorderLineStyle, color: Color) -> Self {
        self.top = Some(BorderEdge::new(style, color));
        self
    }

    pub fn is_empty(&self) -> bool {
        [
            &self.left,
            &self.right,
            &self.top,
            &self.bottom,
            &self.diagonal,
        ]
        .iter()
        .all(|edge| edge.is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BorderEdge {
    pub style: BorderLineStyle,
    pub color: Color,
}

impl BorderEdge {
    pub fn new(style: BorderLineStyle, color: Color) -> Self {
        Self { style, color }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BorderLineStyle {
    #[default]
    None,
    Thin,
    Medium,
    Thick,
    Dashed,
    Dotted,
    Double,
    Hair,
    MediumDashed,
    DashDot,
    MediumDashDot,
    DashDotDot,
    MediumDashDotDot,
    SlantDashDot,
}

impl BorderLineStyle {
    const NAMES: [(BorderLineStyle, &'static str); 14] = [
        (BorderLineStyle::None, "none"),
        (BorderLineStyle::Thin, "thin"),
        (BorderLineStyle::Medium, "medium"),
        (BorderLineStyle::Thick, "thick"),
        (BorderLineStyle::Dashed, "dashed"),
        (BorderLineStyle::Dotted, "dotted"),
        (BorderLineStyle::Double, "double"),
        (BorderLineStyle::Hair, "hair"),
        (BorderLineStyle::MediumDashed, "mediumDashed"),
        (BorderLineStyle::DashDot, "dashDot"),
        (BorderLineStyle::MediumDashDot, "mediumDashDot"),
        (BorderLineStyle::DashDotDot, "dashDotDot"),
        (BorderLineStyle::MediumDashDotDot, "mediumDashDotDot"),
        (BorderLineStyle::SlantDashDot, "slantDashDot"),
    ];

    pub fn as_str(&self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(s, _)| s == self)
            .map_or("none", |(_, name)| name)
    }

    /// Unknown names read as `None`
    pub fn parse(s: &str) -> Self {
        Self::NAMES
            .iter()
            .find(|(_, name)| *name == s)
            .map_or(BorderLineStyle::None, |(style, _)| *style)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DiagonalDirection {
    #[default]
    None,
    Up,
    Down,
    Both,
}

impl DiagonalDirection {
    pub fn from_flags(up: bool, down: bool) -> Self {
        match (up, down) {
            (true, true) => DiagonalDirection::Both,
            (true, false) => DiagonalDirection::Up,
            (false, true) => DiagonalDirection::Down,
            (false, false) => DiagonalDirection::None,
        }
    }

    pub fn is_up(&self) -> bool {
        matches!(self, DiagonalDirection::Up | DiagonalDirection::Both)
    }

    pub fn is_down(&self) -> bool {
        matches!(self, DiagonalDirection::Down | DiagonalDirection::Both)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_style_names() {
        assert_eq!(BorderLineStyle::parse("mediumDashDot"), BorderLineStyle::MediumDashDot);
        assert_eq!(BorderLineStyle::parse("bogus"), BorderLineStyle::None);
        assert_eq!(BorderLineStyle::Double.as_str(), "double");
    }

    #[test]
    fn test_outline() {
        let border = BorderStyle::outline(BorderLineStyle::Thin, Color::BLACK);
        assert!(border.left.is_some() && border.bottom.is_some());
        assert!(border.diagonal.is_none());
        assert!(!border.is_empty());
        assert!(BorderStyle::new().is_empty());
    }
}
