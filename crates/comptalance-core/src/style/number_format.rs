//! Number formats
//!
//! Ids below 164 are reserved for formats every spreadsheet application
//! knows without a `<numFmt>` definition; anything else is carried as its
//! format code.

use std::borrow::Cow;

/// First id available to workbook-defined formats
pub const FIRST_CUSTOM_FORMAT_ID: u32 = 164;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    #[default]
    General,
    /// Built-in id, written back under the same id
    BuiltIn(u32),
    Custom(String),
}

impl NumberFormat {
    /// Format code as a spreadsheet would show it
    pub fn format_code(&self) -> Cow<'_, str> {
        match self {
            NumberFormat::General => Cow::Borrowed("General"),
            NumberFormat::BuiltIn(id) => Cow::Borrowed(builtin_format_code(*id).unwrap_or("General")),
            NumberFormat::Custom(code) => Cow::Borrowed(code.as_str()),
        }
    }

    /// Id to emit in `xf/@numFmtId`, or `None` when the writer must allocate one
    pub fn builtin_id(&self) -> Option<u32> {
        match self {
            NumberFormat::General => Some(0),
            NumberFormat::BuiltIn(id) => Some(*id),
            NumberFormat::Custom(_) => None,
        }
    }

    /// Resolve a `numFmtId` that had no `<numFmt>` definition in the file
    pub fn from_builtin_id(id: u32) -> Self {
        if id == 0 {
            NumberFormat::General
        } else {
            NumberFormat::BuiltIn(id)
        }
    }

    /// Whether values under this format display as dates or times
    pub fn is_date_format(&self) -> bool {
        match self {
            NumberFormat::General => false,
            NumberFormat::BuiltIn(id) => matches!(id, 14..=22 | 27..=36 | 45..=47 | 50..=58),
            NumberFormat::Custom(code) => code_looks_like_date(code),
        }
    }
}

fn code_looks_like_date(code: &str) -> bool {
    let mut in_quotes = false;
    let mut in_brackets = false;
    let mut prev_escape = false;
    for c in code.chars() {
        if prev_escape {
            prev_escape = false;
            continue;
        }
        match c {
            '\\' => prev_escape = true,
            '"' => in_quotes = !in_quotes,
            '[' if !in_quotes => in_brackets = true,
            ']' if !in_quotes => in_brackets = false,
            'd' | 'D' | 'm' | 'M' | 'y' | 'Y' | 'h' | 'H' | 's' | 'S'
                if !in_quotes && !in_brackets =>
            {
                return true
            }
            _ => {}
        }
    }
    false
}

/// Codes of the standard built-in formats
pub fn builtin_format_code(id: u32) -> Option<&'static str> {
    Some(match id {
        0 => "General",
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        37 => "#,##0 ;(#,##0)",
        38 => "#,##0 ;[Red](#,##0)",
        39 => "#,##0.00;(#,##0.00)",
        40 => "#,##0.00;[Red](#,##0.00)",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        48 => "##0.0E+0",
        49 => "@",
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_codes() {
        assert_eq!(NumberFormat::General.format_code(), "General");
        assert_eq!(NumberFormat::BuiltIn(4).format_code(), "#,##0.00");
        assert_eq!(NumberFormat::Custom("0.0 €".into()).format_code(), "0.0 €");
        assert_eq!(NumberFormat::from_builtin_id(0), NumberFormat::General);
        assert_eq!(NumberFormat::Custom("0".into()).builtin_id(), None);
    }

    #[test]
    fn test_date_detection() {
        assert!(NumberFormat::BuiltIn(14).is_date_format());
        assert!(!NumberFormat::BuiltIn(4).is_date_format());
        assert!(NumberFormat::Custom("dd/mm/yyyy".into()).is_date_format());
        assert!(!NumberFormat::Custom("#,##0.00\" days\"".into()).is_date_format());
        assert!(!NumberFormat::Custom("[Red]0.00".into()).is_date_format());
    }
}
