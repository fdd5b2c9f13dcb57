//! Color references as they appear in cell formatting

use std::hash::{Hash, Hasher};

/// A color as stored in the file.
///
/// Theme and indexed colors are kept symbolic so a copied cell resolves
/// against the same palette the source did.
#[derive(Debug, Clone, Copy, Default)]
pub enum Color {
    /// Application default (usually black text, no fill)
    #[default]
    Auto,
    Argb { a: u8, r: u8, g: u8, b: u8 },
    /// Theme palette slot with a lightness tint in `-1.0..=1.0`
    Theme { index: u8, tint: f64 },
    /// Legacy 64-entry palette
    Indexed(u8),
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);

    /// Opaque RGB color
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color::Argb { a: 0xFF, r, g, b }
    }

    pub const fn theme(index: u8) -> Self {
        Color::Theme { index, tint: 0.0 }
    }

    /// Parse `RRGGBB` or `AARRGGBB`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim_start_matches('#');
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            6 => Some(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Some(Color::Argb {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => None,
        }
    }

    /// `AARRGGBB` for explicit colors, `None` for symbolic ones
    pub fn to_argb_hex(&self) -> Option<String> {
        match self {
            Color::Argb { a, r, g, b } => Some(format!("{:02X}{:02X}{:02X}{:02X}", a, r, g, b)),
            _ => None,
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Color::Auto)
    }
}

impl PartialEq for Color {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Color::Auto, Color::Auto) => true,
            (
                Color::Argb { a, r, g, b },
                Color::Argb {
                    a: a2,
                    r: r2,
                    g: g2,
                    b: b2,
                },
            ) => (a, r, g, b) == (a2, r2, g2, b2),
            (Color::Theme { index, tint }, Color::Theme { index: i2, tint: t2 }) => {
                index == i2 && tint.to_bits() == t2.to_bits()
            }
            (Color::Indexed(i), Color::Indexed(i2)) => i == i2,
            _ => false,
        }
    }
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Color::Auto => {}
            Color::Argb { a, r, g, b } => (a, r, g, b).hash(state),
            Color::Theme { index, tint } => {
                index.hash(state);
                tint.to_bits().hash(state);
            }
            Color::Indexed(i) => i.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("FF0000"), Some(Color::RED));
        assert_eq!(
            Color::from_hex("#80102030"),
            Some(Color::Argb {
                a: 0x80,
                r: 0x10,
                g: 0x20,
                b: 0x30
            })
        );
        assert_eq!(Color::from_hex("F00"), None);
        assert_eq!(Color::from_hex("GG0000"), None);
    }

    #[test]
    fn test_argb_hex() {
        assert_eq!(Color::rgb(1, 2, 3).to_argb_hex().as_deref(), Some("FF010203"));
        assert_eq!(Color::theme(4).to_argb_hex(), None);
    }

    #[test]
    fn test_theme_tint_equality() {
        let a = Color::Theme {
            index: 4,
            tint: 0.399975585192419,
        };
        let b = Color::Theme {
            index: 4,
            tint: 0.399975585192419,
        };
        assert_eq!(a, b);
        assert_ne!(a, Color::theme(4));
    }
}
