//! Shared formulas
//!
//! `<f t="shared" ref="B1:B3" si="0">A1*2</f>` stores the text once, on the
//! anchor cell. The other cells of the block carry only `<f t="shared"
//! si="0"/>`; their formula is the anchor's with every relative reference
//! moved by the cell's offset from the anchor (`A2*2` in B2).

use std::collections::HashMap;

use comptalance_core::{CellAddress, MAX_COLS, MAX_ROWS};

#[derive(Debug)]
struct Anchor {
    text: String,
    row: u32,
    col: u16,
}

/// Anchors of the shared formula groups seen so far in one worksheet
#[derive(Debug, Default)]
pub(super) struct SharedFormulas {
    anchors: HashMap<u32, Anchor>,
}

impl SharedFormulas {
    pub(super) fn insert_anchor(&mut self, si: u32, text: &str, row: u32, col: u16) {
        self.anchors.insert(
            si,
            Anchor {
                text: text.to_string(),
                row,
                col,
            },
        );
    }

    /// Formula text for a follower of group `si` at (`row`, `col`)
    pub(super) fn follower(&self, si: u32, row: u32, col: u16) -> Option<String> {
        let anchor = self.anchors.get(&si)?;
        Some(shift_formula(
            &anchor.text,
            i64::from(row) - i64::from(anchor.row),
            i64::from(col) - i64::from(anchor.col),
        ))
    }
}

/// Move the relative references of `formula` by `rows` and `cols`.
///
/// `$`-anchored parts stay put. Text in string literals, quoted sheet names
/// and brackets is copied untouched, as are function and sheet names. A
/// reference pushed off the grid becomes `#REF!`.
pub(crate) fn shift_formula(formula: &str, rows: i64, cols: i64) -> String {
    if rows == 0 && cols == 0 {
        return formula.to_string();
    }
    Shifter {
        chars: formula.chars().collect(),
        pos: 0,
        out: String::with_capacity(formula.len() + 4),
        rows,
        cols,
    }
    .run()
}

struct Shifter {
    chars: Vec<char>,
    pos: usize,
    out: String,
    rows: i64,
    cols: i64,
}

/// What a bare word in a formula turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reference {
    Cell {
        col: u16,
        col_abs: bool,
        row: u32,
        row_abs: bool,
    },
    /// One side of `A:C`
    Column { col: u16, abs: bool },
    /// One side of `3:5`
    Row { row: u32, abs: bool },
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '$' | '_' | '.' | '\\')
}

impl Shifter {
    fn peek_char(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += 1;
        Some(c)
    }

    fn run(mut self) -> String {
        while let Some(c) = self.peek_char() {
            match c {
                '"' | '\'' => self.copy_quoted(c),
                '[' => self.copy_bracketed(),
                c if is_word_char(c) => self.scan_word(),
                _ => {
                    self.out.push(c);
                    self.pos += 1;
                }
            }
        }
        self.out
    }

    /// `"..."` or `'...'`, where a doubled quote stands for itself
    fn copy_quoted(&mut self, quote: char) {
        self.advance();
        self.out.push(quote);
        while let Some(c) = self.advance() {
            self.out.push(c);
            if c == quote {
                if self.peek_char() == Some(quote) {
                    self.advance();
                    self.out.push(quote);
                } else {
                    return;
                }
            }
        }
    }

    /// `[...]`, nesting allowed (structured references)
    fn copy_bracketed(&mut self) {
        let mut depth = 0usize;
        while let Some(c) = self.advance() {
            self.out.push(c);
            match c {
                '[' => depth += 1,
                ']' => {
                    depth -= 1;
                    if depth == 0 {
                        return;
                    }
                }
                _ => {}
            }
        }
    }

    fn read_word(&mut self) -> String {
        let start = self.pos;
        while self.peek_char().is_some_and(is_word_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn scan_word(&mut self) {
        let word = self.read_word();

        // function calls, sheet prefixes and table names
        if matches!(self.peek_char(), Some('(' | '!' | '[')) {
            self.out.push_str(&word);
            return;
        }

        match parse_reference(&word) {
            Some(cell @ Reference::Cell { .. }) => {
                let shifted = self.shift(cell);
                self.out.push_str(&shifted);
            }
            Some(first @ (Reference::Column { .. } | Reference::Row { .. })) => {
                self.scan_line_range(word, first)
            }
            None => self.out.push_str(&word),
        }
    }

    /// `A:C` or `3:5`; a lone column or row word is not a reference
    fn scan_line_range(&mut self, word: String, first: Reference) {
        let checkpoint = self.pos;
        if self.peek_char() == Some(':') {
            self.advance();
            let second_word = self.read_word();
            let second = parse_reference(&second_word);
            let same_kind = matches!(
                (first, second),
                (Reference::Column { .. }, Some(Reference::Column { .. }))
                    | (Reference::Row { .. }, Some(Reference::Row { .. }))
            );
            if let (true, Some(second)) = (same_kind, second) {
                let start = self.shift(first);
                let end = self.shift(second);
                self.out.push_str(&start);
                self.out.push(':');
                self.out.push_str(&end);
                return;
            }
        }
        self.pos = checkpoint;
        self.out.push_str(&word);
    }

    fn shift(&self, reference: Reference) -> String {
        let dollar = |abs: bool| if abs { "$" } else { "" };
        match reference {
            Reference::Cell {
                col,
                col_abs,
                row,
                row_abs,
            } => {
                let col = if col_abs { Some(col) } else { shift_col(col, self.cols) };
                let row = if row_abs { Some(row) } else { shift_row(row, self.rows) };
                match (col, row) {
                    (Some(col), Some(row)) => format!(
                        "{}{}{}{}",
                        dollar(col_abs),
                        CellAddress::column_to_letters(col),
                        dollar(row_abs),
                        row + 1
                    ),
                    _ => "#REF!".to_string(),
                }
            }
            Reference::Column { col, abs } => {
                match if abs { Some(col) } else { shift_col(col, self.cols) } {
                    Some(col) => format!("{}{}", dollar(abs), CellAddress::column_to_letters(col)),
                    None => "#REF!".to_string(),
                }
            }
            Reference::Row { row, abs } => {
                match if abs { Some(row) } else { shift_row(row, self.rows) } {
                    Some(row) => format!("{}{}", dollar(abs), row + 1),
                    None => "#REF!".to_string(),
                }
            }
        }
    }
}

fn shift_col(col: u16, by: i64) -> Option<u16> {
    let shifted = i64::from(col) + by;
    (0..i64::from(MAX_COLS))
        .contains(&shifted)
        .then_some(shifted as u16)
}

fn shift_row(row: u32, by: i64) -> Option<u32> {
    let shifted = i64::from(row) + by;
    (0..i64::from(MAX_ROWS))
        .contains(&shifted)
        .then_some(shifted as u32)
}

/// `$?LETTERS$?DIGITS`, `$?LETTERS` or `$?DIGITS`, 0-based
fn parse_reference(word: &str) -> Option<Reference> {
    let (col_abs, rest) = match word.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, word),
    };
    let letters_end = rest
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(rest.len());
    let (letters, rest) = rest.split_at(letters_end);

    if letters.is_empty() {
        // row-only: `$?DIGITS`, where the `$` was taken as col_abs above
        let row = parse_row(rest)?;
        return Some(Reference::Row { row, abs: col_abs });
    }
    if letters.len() > 3 {
        return None;
    }
    let col = CellAddress::letters_to_column(letters).ok()?;
    if rest.is_empty() {
        return Some(Reference::Column { col, abs: col_abs });
    }

    let (row_abs, digits) = match rest.strip_prefix('$') {
        Some(digits) => (true, digits),
        None => (false, rest),
    };
    Some(Reference::Cell {
        col,
        col_abs,
        row: parse_row(digits)?,
        row_abs,
    })
}

fn parse_row(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: u32 = digits.parse().ok()?;
    (1..=MAX_ROWS).contains(&row).then(|| row - 1)
}
