//! The workbook: an ordered set of uniquely named worksheets

use crate::error::{Error, Result};
use crate::named_range::{NamedRange, NamedRangeCollection};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

const INVALID_NAME_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

#[derive(Debug, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    /// Sheet shown when the file is opened
    active_sheet: usize,
    defined_names: NamedRangeCollection,
}

impl Workbook {
    /// A workbook with a single empty "Sheet1"
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new("Sheet1")],
            active_sheet: 0,
            defined_names: NamedRangeCollection::new(),
        }
    }

    /// A workbook with no sheets at all
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    pub fn worksheet_by_name_mut(&mut self, name: &str) -> Option<&mut Worksheet> {
        self.worksheets.iter_mut().find(|ws| ws.name() == name)
    }

    /// Position of the sheet named exactly `name`
    pub fn sheet_index(&self, name: &str) -> Option<usize> {
        self.worksheets.iter().position(|ws| ws.name() == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(Worksheet::name).collect()
    }

    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Append an empty sheet, returning its index
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    /// Append a sheet built elsewhere (the reader assembles sheets this way)
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    pub fn remove_worksheet(&mut self, index: usize) -> Result<Worksheet> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }

        let removed = self.worksheets.remove(index);
        self.defined_names.sheet_removed(index);

        if index < self.active_sheet {
            self.active_sheet -= 1;
        }
        if self.active_sheet >= self.worksheets.len() {
            self.active_sheet = self.worksheets.len().saturating_sub(1);
        }

        Ok(removed)
    }

    /// Remove the sheet named exactly `name`, if there is one
    pub fn remove_worksheet_by_name(&mut self, name: &str) -> Option<Worksheet> {
        let index = self.sheet_index(name)?;
        self.remove_worksheet(index).ok()
    }

    pub fn active_sheet(&self) -> usize {
        self.active_sheet
    }

    pub fn set_active_sheet(&mut self, index: usize) -> Result<()> {
        if index >= self.worksheets.len() {
            return Err(Error::SheetOutOfBounds(index, self.worksheets.len()));
        }
        self.active_sheet = index;
        Ok(())
    }

    pub fn defined_names(&self) -> &NamedRangeCollection {
        &self.defined_names
    }

    pub fn defined_names_mut(&mut self) -> &mut NamedRangeCollection {
        &mut self.defined_names
    }

    pub fn define_name(&mut self, name: NamedRange) -> Result<()> {
        if let crate::named_range::NameScope::Sheet(i) = name.scope {
            if i >= self.worksheets.len() {
                return Err(Error::SheetOutOfBounds(i, self.worksheets.len()));
            }
        }
        self.defined_names.define(name)
    }

    /// The sheet a spreadsheet application would open on
    pub fn active_worksheet(&self) -> Option<&Worksheet> {
        self.worksheets
            .get(self.active_sheet)
            .or_else(|| self.worksheets.first())
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "'{}' is longer than {} characters",
                name, MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_NAME_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "'{}' contains '{}'",
                name, c
            )));
        }

        let lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_workbook() {
        let wb = Workbook::new();
        assert_eq!(wb.sheet_count(), 1);
        assert_eq!(wb.sheet_names(), vec!["Sheet1"]);
        assert!(Workbook::empty().is_empty());
    }

    #[test]
    fn test_add_and_lookup() {
        let mut wb = Workbook::empty();
        assert_eq!(wb.add_worksheet_with_name("Intro").unwrap(), 0);
        assert_eq!(wb.add_worksheet_with_name("BAL N").unwrap(), 1);

        assert_eq!(wb.sheet_index("BAL N"), Some(1));
        assert!(wb.worksheet_by_name("bal n").is_none());
        assert_eq!(wb.worksheet_by_name("Intro").unwrap().name(), "Intro");
    }

    #[test]
    fn test_duplicate_name_is_case_insensitive() {
        let mut wb = Workbook::empty();
        wb.add_worksheet_with_name("BAL N").unwrap();
        assert!(matches!(
            wb.add_worksheet_with_name("bal n"),
            Err(Error::DuplicateSheetName(_))
        ));
    }

    #[test]
    fn test_invalid_sheet_names() {
        let mut wb = Workbook::empty();
        assert!(wb.add_worksheet_with_name("").is_err());
        assert!(wb.add_worksheet_with_name("a/b").is_err());
        assert!(wb.add_worksheet_with_name("[x]").is_err());
        assert!(wb.add_worksheet_with_name(&"x".repeat(32)).is_err());
        assert!(wb.add_worksheet_with_name(&"é".repeat(31)).is_ok());
    }

    #[test]
    fn test_remove_keeps_active_in_range() {
        let mut wb = Workbook::empty();
        for name in ["A", "B", "C"] {
            wb.add_worksheet_with_name(name).unwrap();
        }
        wb.set_active_sheet(2).unwrap();

        wb.remove_worksheet(0).unwrap();
        assert_eq!(wb.active_sheet(), 1);
        assert_eq!(wb.active_worksheet().unwrap().name(), "C");

        wb.remove_worksheet_by_name("C").unwrap();
        assert_eq!(wb.active_sheet(), 0);
        assert_eq!(wb.active_worksheet().unwrap().name(), "B");

        assert!(wb.remove_worksheet_by_name("missing").is_none());
        assert!(wb.remove_worksheet(5).is_err());
    }

    #[test]
    fn test_removing_a_sheet_drops_its_local_names() {
        use crate::named_range::NameScope;

        let mut wb = Workbook::empty();
        for name in ["Intro", "BAL N", "Calc"] {
            wb.add_worksheet_with_name(name).unwrap();
        }
        wb.define_name(NamedRange::new("_xlnm.Print_Area", "'BAL N'!$A$1:$F$40").local_to(1))
            .unwrap();
        wb.define_name(NamedRange::new("Taux", "Calc!$B$2").local_to(2))
            .unwrap();
        wb.define_name(NamedRange::new("Total", "Calc!$B$9")).unwrap();
        assert!(wb.define_name(NamedRange::new("X", "A1").local_to(3)).is_err());

        wb.remove_worksheet(1).unwrap();

        let names = wb.defined_names();
        assert_eq!(names.len(), 2);
        assert!(names.get("_xlnm.Print_Area", NameScope::Sheet(1)).is_none());
        assert_eq!(names.resolve("Taux", 1).unwrap().scope, NameScope::Sheet(1));
        assert!(names.get("Total", NameScope::Workbook).is_some());
    }
}
