//! Worksheet: cells, dimensions, merged ranges, rules and layout of one sheet

use std::collections::{BTreeMap, BTreeSet};

use crate::cell::{CellAddress, CellData, CellRange, CellStorage, CellValue};
use crate::conditional_format::ConditionalFormatRule;
use crate::error::{Error, Result};
use crate::layout::SheetLayout;
use crate::style::{Style, StylePool};
use crate::validation::DataValidation;
use crate::{MAX_COLS, MAX_ROWS};

/// Tab visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SheetState {
    #[default]
    Visible,
    /// Unhidable from the application's menu
    Hidden,
    /// Only reachable programmatically
    VeryHidden,
}

impl SheetState {
    pub fn xlsx_state(&self) -> Option<&'static str> {
        match self {
            SheetState::Visible => None,
            SheetState::Hidden => Some("hidden"),
            SheetState::VeryHidden => Some("veryHidden"),
        }
    }

    pub fn from_xlsx(s: &str) -> Self {
        match s {
            "hidden" => SheetState::Hidden,
            "veryHidden" => SheetState::VeryHidden,
            _ => SheetState::Visible,
        }
    }
}

#[derive(Debug)]
pub struct Worksheet {
    name: String,
    cells: CellStorage,
    layout: SheetLayout,
    state: SheetState,
    conditional_formats: Vec<ConditionalFormatRule>,
    data_validations: Vec<DataValidation>,
}

impl Worksheet {
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            cells: CellStorage::new(),
            layout: SheetLayout::default(),
            state: SheetState::Visible,
            conditional_formats: Vec::new(),
            data_validations: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn layout(&self) -> &SheetLayout {
        &self.layout
    }

    pub fn layout_mut(&mut self) -> &mut SheetLayout {
        &mut self.layout
    }

    pub fn state(&self) -> SheetState {
        self.state
    }

    pub fn set_state(&mut self, state: SheetState) {
        self.state = state;
    }

    pub fn is_visible(&self) -> bool {
        self.state == SheetState::Visible
    }

    // === Cells ===

    pub fn cell(&self, address: &str) -> Result<Option<&CellData>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cells.get(addr.row, addr.col))
    }

    pub fn cell_at(&self, row: u32, col: u16) -> Option<&CellData> {
        self.cells.get(row, col)
    }

    /// Value at an A1 address, `Empty` when nothing is stored there
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        let addr = CellAddress::parse(address)?;
        Ok(self.get_value_at(addr.row, addr.col))
    }

    pub fn get_value_at(&self, row: u32, col: u16) -> CellValue {
        self.cells
            .get(row, col)
            .map(|c| c.value.clone())
            .unwrap_or_default()
    }

    pub fn cell_style(&self, address: &str) -> Result<Option<&Style>> {
        let addr = CellAddress::parse(address)?;
        Ok(self.cell_style_at(addr.row, addr.col))
    }

    /// Style of a stored cell (the default style for unformatted ones)
    pub fn cell_style_at(&self, row: u32, col: u16) -> Option<&Style> {
        self.cells
            .get(row, col)
            .and_then(|c| self.cells.style_pool().get(c.style_index))
    }

    pub fn style_by_index(&self, style_index: u32) -> Option<&Style> {
        self.cells.style_pool().get(style_index)
    }

    pub fn style_pool(&self) -> &StylePool {
        self.cells.style_pool()
    }

    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_value_at(addr.row, addr.col, value)
    }

    pub fn set_cell_value_at<V: Into<CellValue>>(
        &mut self,
        row: u32,
        col: u16,
        value: V,
    ) -> Result<()> {
        validate_position(row, col)?;
        self.cells.set_value(row, col, value.into());
        Ok(())
    }

    pub fn set_cell_formula(&mut self, address: &str, formula: &str) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        validate_position(addr.row, addr.col)?;
        self.cells
            .set_value(addr.row, addr.col, CellValue::formula(formula));
        Ok(())
    }

    pub fn set_cell_style(&mut self, address: &str, style: &Style) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.set_cell_style_at(addr.row, addr.col, style)
    }

    /// Intern `style` in this sheet's pool and point the cell at it
    pub fn set_cell_style_at(&mut self, row: u32, col: u16, style: &Style) -> Result<()> {
        validate_position(row, col)?;
        let style_index = self.cells.style_pool_mut().get_or_insert(style.clone());
        self.cells.set_style(row, col, style_index);
        Ok(())
    }

    pub fn clear_cell_at(&mut self, row: u32, col: u16) {
        self.cells.remove(row, col);
    }

    /// Bounds of every cell holding a value or a non-default style
    pub fn used_range(&self) -> Option<CellRange> {
        self.cells
            .used_bounds()
            .map(|(min_row, min_col, max_row, max_col)| {
                CellRange::from_indices(min_row, min_col, max_row, max_col)
            })
    }

    pub fn cell_count(&self) -> usize {
        self.cells.cell_count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.cells.iter()
    }

    // === Dimensions ===

    pub fn default_row_height(&self) -> f64 {
        self.cells.default_row_height()
    }

    pub fn set_default_row_height(&mut self, height: f64) {
        self.cells.set_default_row_height(height);
    }

    pub fn default_column_width(&self) -> f64 {
        self.cells.default_column_width()
    }

    pub fn set_default_column_width(&mut self, width: f64) {
        self.cells.set_default_column_width(width);
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.cells.row_height(row)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.cells.set_row_height(row, height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.cells.is_row_hidden(row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        self.cells.set_row_hidden(row, hidden);
    }

    pub fn column_width(&self, col: u16) -> f64 {
        self.cells.column_width(col)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.cells.set_column_width(col, width);
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.cells.is_column_hidden(col)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        self.cells.set_column_hidden(col, hidden);
    }

    /// Rows with an explicit height
    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        self.cells.custom_row_heights()
    }

    pub fn hidden_rows(&self) -> &BTreeSet<u32> {
        self.cells.hidden_rows()
    }

    /// Columns with an explicit width
    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        self.cells.custom_column_widths()
    }

    pub fn hidden_columns(&self) -> &BTreeSet<u16> {
        self.cells.hidden_columns()
    }

    // === Merged cells ===

    pub fn merged_regions(&self) -> &[CellRange] {
        self.cells.merged_regions()
    }

    /// Fails with `MergedCellConflict` when `range` overlaps an existing merge
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if self
            .cells
            .merged_regions()
            .iter()
            .any(|existing| range.overlaps(existing))
        {
            return Err(Error::MergedCellConflict(range.to_string()));
        }
        self.cells.add_merged_region(*range);
        Ok(())
    }

    // === Rules ===

    pub fn conditional_formats(&self) -> &[ConditionalFormatRule] {
        &self.conditional_formats
    }

    pub fn add_conditional_format(&mut self, rule: ConditionalFormatRule) {
        self.conditional_formats.push(rule);
    }

    pub fn data_validations(&self) -> &[DataValidation] {
        &self.data_validations
    }

    pub fn add_data_validation(&mut self, validation: DataValidation) {
        self.data_validations.push(validation);
    }

    /// The validation governing a cell, if any
    pub fn validation_at(&self, row: u32, col: u16) -> Option<&DataValidation> {
        self.data_validations.iter().find(|v| v.applies_to(row, col))
    }
}

fn validate_position(row: u32, col: u16) -> Result<()> {
    if row >= MAX_ROWS {
        return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
    }
    if col >= MAX_COLS {
        return Err(Error::ColumnOutOfBounds(col as u32, MAX_COLS - 1));
    }
    Ok(())
}
