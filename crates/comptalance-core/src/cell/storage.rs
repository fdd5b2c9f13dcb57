//! Sparse cell storage
//!
//! Only non-empty cells are kept, in a row-major `BTreeMap` so iteration
//! is ordered the way the container format wants rows written.

use std::collections::{BTreeMap, BTreeSet};

use super::CellValue;
use crate::style::StylePool;
use crate::CellRange;

/// Value plus style reference for a single cell
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CellData {
    pub value: CellValue,
    /// Index into the owning sheet's style pool (0 = default style)
    pub style_index: u32,
}

impl CellData {
    pub fn new(value: CellValue) -> Self {
        Self {
            value,
            style_index: 0,
        }
    }

    pub fn with_style(value: CellValue, style_index: u32) -> Self {
        Self { value, style_index }
    }

    /// No value and default style
    pub fn is_empty(&self) -> bool {
        self.value.is_empty() && self.style_index == 0
    }
}

/// Cell grid plus row/column dimensions and merged regions of one sheet
#[derive(Debug)]
pub struct CellStorage {
    rows: BTreeMap<u32, BTreeMap<u16, CellData>>,
    style_pool: StylePool,
    default_row_height: f64,
    default_column_width: f64,
    row_heights: BTreeMap<u32, f64>,
    hidden_rows: BTreeSet<u32>,
    column_widths: BTreeMap<u16, f64>,
    hidden_columns: BTreeSet<u16>,
    merged_regions: Vec<CellRange>,
}

impl CellStorage {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            style_pool: StylePool::new(),
            default_row_height: 15.0,
            default_column_width: 8.43,
            row_heights: BTreeMap::new(),
            hidden_rows: BTreeSet::new(),
            column_widths: BTreeMap::new(),
            hidden_columns: BTreeSet::new(),
            merged_regions: Vec::new(),
        }
    }

    pub fn get(&self, row: u32, col: u16) -> Option<&CellData> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    pub fn get_mut(&mut self, row: u32, col: u16) -> Option<&mut CellData> {
        self.rows.get_mut(&row).and_then(|r| r.get_mut(&col))
    }

    /// Store a cell; storing an empty cell removes it.
    pub fn set(&mut self, row: u32, col: u16, data: CellData) {
        if data.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, data);
        }
    }

    /// Replace the value, keeping the style
    pub fn set_value(&mut self, row: u32, col: u16, value: CellValue) {
        let style_index = self.get(row, col).map_or(0, |c| c.style_index);
        self.set(row, col, CellData::with_style(value, style_index));
    }

    /// Replace the style, keeping the value
    pub fn set_style(&mut self, row: u32, col: u16, style_index: u32) {
        let now_empty = match self.get_mut(row, col) {
            Some(cell) => {
                cell.style_index = style_index;
                cell.is_empty()
            }
            None => {
                self.set(row, col, CellData::with_style(CellValue::Empty, style_index));
                return;
            }
        };
        if now_empty {
            self.remove(row, col);
        }
    }

    pub fn remove(&mut self, row: u32, col: u16) -> Option<CellData> {
        let row_map = self.rows.get_mut(&row)?;
        let removed = row_map.remove(&col);
        if row_map.is_empty() {
            self.rows.remove(&row);
        }
        removed
    }

    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// (min_row, min_col, max_row, max_col) over stored cells
    pub fn used_bounds(&self) -> Option<(u32, u16, u32, u16)> {
        let min_row = *self.rows.keys().next()?;
        let max_row = *self.rows.keys().next_back()?;

        let mut min_col = u16::MAX;
        let mut max_col = 0u16;
        for cols in self.rows.values() {
            if let (Some(&first), Some(&last)) = (cols.keys().next(), cols.keys().next_back()) {
                min_col = min_col.min(first);
                max_col = max_col.max(last);
            }
        }

        Some((min_row, min_col, max_row, max_col))
    }

    /// Cells in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u16, &CellData)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, data)| (row, col, data)))
    }

    pub fn default_row_height(&self) -> f64 {
        self.default_row_height
    }

    pub fn set_default_row_height(&mut self, height: f64) {
        self.default_row_height = height;
    }

    pub fn default_column_width(&self) -> f64 {
        self.default_column_width
    }

    pub fn set_default_column_width(&mut self, width: f64) {
        self.default_column_width = width;
    }

    pub fn row_height(&self, row: u32) -> f64 {
        self.row_heights
            .get(&row)
            .copied()
            .unwrap_or(self.default_row_height)
    }

    pub fn set_row_height(&mut self, row: u32, height: f64) {
        self.row_heights.insert(row, height);
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.hidden_rows.contains(&row)
    }

    pub fn set_row_hidden(&mut self, row: u32, hidden: bool) {
        if hidden {
            self.hidden_rows.insert(row);
        } else {
            self.hidden_rows.remove(&row);
        }
    }

    pub fn column_width(&self, col: u16) -> f64 {
        self.column_widths
            .get(&col)
            .copied()
            .unwrap_or(self.default_column_width)
    }

    pub fn set_column_width(&mut self, col: u16, width: f64) {
        self.column_widths.insert(col, width);
    }

    pub fn is_column_hidden(&self, col: u16) -> bool {
        self.hidden_columns.contains(&col)
    }

    pub fn set_column_hidden(&mut self, col: u16, hidden: bool) {
        if hidden {
            self.hidden_columns.insert(col);
        } else {
            self.hidden_columns.remove(&col);
        }
    }

    pub fn custom_row_heights(&self) -> &BTreeMap<u32, f64> {
        &self.row_heights
    }

    pub fn hidden_rows(&self) -> &BTreeSet<u32> {
        &self.hidden_rows
    }

    pub fn custom_column_widths(&self) -> &BTreeMap<u16, f64> {
        &self.column_widths
    }

    pub fn hidden_columns(&self) -> &BTreeSet<u16> {
        &self.hidden_columns
    }

    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    pub fn add_merged_region(&mut self, range: CellRange) {
        self.merged_regions.push(range);
    }

    pub fn style_pool(&self) -> &StylePool {
        &self.style_pool
    }

    pub fn style_pool_mut(&mut self) -> &mut StylePool {
        &mut self.style_pool
    }
}

impl Default for CellStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clearing_a_cell_drops_it() {
        let mut storage = CellStorage::new();

        storage.set(3, 2, CellData::new(CellValue::string("512000")));
        assert_eq!(storage.cell_count(), 1);

        storage.set(3, 2, CellData::default());
        assert!(storage.get(3, 2).is_none());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_value_and_style_are_independent() {
        let mut storage = CellStorage::new();

        storage.set_style(4, 1, 2);
        assert_eq!(storage.get(4, 1).unwrap().value, CellValue::Empty);

        storage.set_value(4, 1, CellValue::Number(-310.25));
        let cell = storage.get(4, 1).unwrap();
        assert_eq!(cell.style_index, 2);
        assert_eq!(cell.value, CellValue::Number(-310.25));

        storage.set_style(4, 1, 0);
        storage.set_value(4, 1, CellValue::Empty);
        assert!(storage.get(4, 1).is_none());
    }

    #[test]
    fn test_used_bounds_span_all_rows() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.used_bounds(), None);

        // a balance with a title in B2, accounts below and a total far right
        storage.set(1, 1, CellData::new(CellValue::string("Balance")));
        storage.set(8, 0, CellData::new(CellValue::string("401000")));
        storage.set(3, 6, CellData::new(CellValue::Number(0.0)));

        assert_eq!(storage.used_bounds(), Some((1, 0, 8, 6)));
    }

    #[test]
    fn test_row_and_column_sizes() {
        let mut storage = CellStorage::new();
        assert_eq!(storage.row_height(7), 15.0);
        assert_eq!(storage.column_width(7), 8.43);

        storage.set_default_column_width(11.0);
        storage.set_column_width(1, 42.0);
        storage.set_row_height(0, 24.75);
        storage.set_column_hidden(9, true);
        storage.set_row_hidden(2, true);

        assert_eq!(storage.column_width(7), 11.0);
        assert_eq!(storage.column_width(1), 42.0);
        assert_eq!(storage.row_height(0), 24.75);
        assert_eq!(storage.hidden_columns().iter().copied().collect::<Vec<_>>(), vec![9]);

        storage.set_row_hidden(2, false);
        assert!(!storage.is_row_hidden(2));
        assert!(storage.hidden_rows().is_empty());
    }

    #[test]
    fn test_cells_iterate_by_row_then_column() {
        let mut storage = CellStorage::new();
        for (row, col) in [(2, 0), (0, 3), (0, 1), (2, 2)] {
            storage.set(row, col, CellData::new(CellValue::Boolean(true)));
        }

        let order: Vec<(u32, u16)> = storage.iter().map(|(row, col, _)| (row, col)).collect();
        assert_eq!(order, vec![(0, 1), (0, 3), (2, 0), (2, 2)]);
    }
}
