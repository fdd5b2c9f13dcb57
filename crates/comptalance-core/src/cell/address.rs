//! A1-style cell addresses and rectangular ranges

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A cell position, 0-based internally and 1-based in A1 notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based, A=0)
    pub col: u16,
}

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse an A1-style reference. `$` markers are accepted and dropped.
    ///
    /// ```
    /// use comptalance_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$C$12").unwrap();
    /// assert_eq!((addr.row, addr.col), (11, 2));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let cleaned: String = s.trim().chars().filter(|c| *c != '$').collect();
        if cleaned.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let split = cleaned
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(|| Error::InvalidAddress(format!("no row number in '{}'", s)))?;
        let (letters, digits) = cleaned.split_at(split);
        if letters.is_empty() {
            return Err(Error::InvalidAddress(format!("no column letters in '{}'", s)));
        }

        let col = Self::letters_to_column(letters)?;
        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;
        if row == 0 {
            return Err(Error::InvalidAddress(format!("row number must be >= 1 in '{}'", s)));
        }
        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row - 1, MAX_ROWS - 1));
        }

        Ok(Self::new(row - 1, col))
    }

    /// 0 -> "A", 25 -> "Z", 26 -> "AA"
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::new();
        let mut n = col as u32 + 1;
        while n > 0 {
            n -= 1;
            letters.push(b'A' + (n % 26) as u8);
            n /= 26;
        }
        letters.reverse();
        String::from_utf8_lossy(&letters).into_owned()
    }

    /// "A" -> 0, "AA" -> 26. Case-insensitive.
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!("invalid column letter '{}'", c)));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > MAX_COLS as u32 {
                return Err(Error::ColumnOutOfBounds(col - 1, MAX_COLS - 1));
            }
        }

        Ok((col - 1) as u16)
    }

    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A normalized rectangular range: `start` is top-left, `end` bottom-right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        Self {
            start: CellAddress::new(a.row.min(b.row), a.col.min(b.col)),
            end: CellAddress::new(a.row.max(b.row), a.col.max(b.col)),
        }
    }

    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Parse "A1:B10", a single "A1", whole columns "C:D" or whole rows "3:5".
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().split_once(':') {
            Some((a, b)) => {
                let (a, b) = (a.trim_start_matches('$'), b.trim_start_matches('$'));
                if is_letters(a) && is_letters(b) {
                    let first = CellAddress::letters_to_column(a)?;
                    let last = CellAddress::letters_to_column(b)?;
                    return Ok(Self::from_indices(0, first, MAX_ROWS - 1, last));
                }
                if is_digits(a) && is_digits(b) {
                    return Ok(Self::from_indices(row_index(a)?, 0, row_index(b)?, MAX_COLS - 1));
                }
                Ok(Self::new(CellAddress::parse(a)?, CellAddress::parse(b)?))
            }
            None => {
                let addr = CellAddress::parse(s)?;
                Ok(Self::new(addr, addr))
            }
        }
    }

    /// Space-separated list as found in `sqref` attributes
    pub fn parse_list(s: &str) -> Result<Vec<Self>> {
        s.split_whitespace().map(Self::parse).collect()
    }

    /// Inverse of [`CellRange::parse_list`]
    pub fn format_list(ranges: &[CellRange]) -> String {
        ranges
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn contains(&self, addr: &CellAddress) -> bool {
        (self.start.row..=self.end.row).contains(&addr.row)
            && (self.start.col..=self.end.col).contains(&addr.col)
    }

    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.start == self.end
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single_cell() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}:{}", self.start, self.end)
        }
    }
}

fn is_letters(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphabetic())
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// 1-based row number to a 0-based index
fn row_index(digits: &str) -> Result<u32> {
    match digits.parse::<u32>() {
        Ok(row @ 1..=MAX_ROWS) => Ok(row - 1),
        _ => Err(Error::InvalidAddress(format!("invalid row number '{}'", digits))),
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(CellAddress::parse("A1").unwrap(), CellAddress::new(0, 0));
        assert_eq!(CellAddress::parse("b2").unwrap(), CellAddress::new(1, 1));
        assert_eq!(CellAddress::parse("$AA$10").unwrap(), CellAddress::new(9, 26));
        assert_eq!(CellAddress::parse("XFD1048576").unwrap(), CellAddress::new(1_048_575, 16_383));
    }

    #[test]
    fn test_parse_address_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("12").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("XFE1").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
    }

    #[test]
    fn test_column_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::letters_to_column("ZZ").unwrap(), 701);
    }

    #[test]
    fn test_range_normalizes() {
        let range = CellRange::parse("C5:A1").unwrap();
        assert_eq!(range.start, CellAddress::new(0, 0));
        assert_eq!(range.end, CellAddress::new(4, 2));
        assert_eq!(range.to_string(), "A1:C5");
        assert_eq!(range.row_count(), 5);
        assert_eq!(range.col_count(), 3);
    }

    #[test]
    fn test_whole_column_and_row_ranges() {
        let cols = CellRange::parse("$C:D").unwrap();
        assert_eq!(cols.start, CellAddress::new(0, 2));
        assert_eq!(cols.end, CellAddress::new(MAX_ROWS - 1, 3));

        let rows = CellRange::parse("3:5").unwrap();
        assert_eq!(rows.start, CellAddress::new(2, 0));
        assert_eq!(rows.end, CellAddress::new(4, MAX_COLS - 1));

        assert!(CellRange::parse("0:2").is_err());
        assert!(CellRange::parse("A:3").is_err());
    }

    #[test]
    fn test_range_lists() {
        let ranges = CellRange::parse_list("A1:B2  D4 F1:F9").unwrap();
        assert_eq!(ranges.len(), 3);
        assert_eq!(CellRange::format_list(&ranges), "A1:B2 D4 F1:F9");
        assert!(CellRange::parse_list("").unwrap().is_empty());
        assert!(CellRange::parse_list("A1 ?").is_err());
    }

    #[test]
    fn test_range_overlap_and_contains() {
        let a = CellRange::parse("A1:B2").unwrap();
        let b = CellRange::parse("B2:C3").unwrap();
        let c = CellRange::parse("D1:E2").unwrap();

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(a.contains(&CellAddress::new(1, 1)));
        assert!(!a.contains(&CellAddress::new(2, 0)));
    }

    #[test]
    fn test_single_cell_display() {
        assert_eq!(CellRange::parse("D4").unwrap().to_string(), "D4");
    }
}
