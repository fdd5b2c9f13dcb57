//! Style-preserving sheet copy and the balance merge
//!
//! [`copy_sheet`] rebuilds one worksheet inside another workbook: values,
//! per-cell styles, column and row sizing, merged ranges and the page/view
//! layout records. [`merge_balances`] uses it to place the active sheet of
//! the balance N and N-1 workbooks into a template under fixed names.
//!
//! A style that cannot be transferred for one cell is logged and skipped;
//! it never aborts the copy.

use std::path::Path;

use comptalance_core::{CellAddress, SheetView, Style, Workbook, Worksheet};
use comptalance_xlsx::{XlsxReader, XlsxWriter};
use thiserror::Error;

use crate::error::{ComptaError, Result};

/// Sheet that receives the current-year balance
pub const BALANCE_N_SHEET: &str = "BAL N";

/// Sheet that receives the prior-year balance
pub const BALANCE_N1_SHEET: &str = "BAL N-1";

/// One formatting attribute that could not be carried over.
///
/// Only ever logged: a sheet copy counts these and moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot copy {attribute}: {reason}")]
pub struct AttributeCopyFailure {
    pub attribute: &'static str,
    pub reason: String,
}

impl AttributeCopyFailure {
    pub fn new<S: Into<String>>(attribute: &'static str, reason: S) -> Self {
        Self {
            attribute,
            reason: reason.into(),
        }
    }
}

/// How a source cell's style becomes the destination cell's style
pub trait StyleTransfer {
    fn transfer(
        &self,
        at: CellAddress,
        style: &Style,
    ) -> std::result::Result<Style, AttributeCopyFailure>;
}

/// Deep-copies every style record. The default strategy.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClonedStyles;

impl StyleTransfer for ClonedStyles {
    fn transfer(
        &self,
        _at: CellAddress,
        style: &Style,
    ) -> std::result::Result<Style, AttributeCopyFailure> {
        Ok(style.clone())
    }
}

/// What [`merge_balances`] did to the template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Sheets written into the template, in order
    pub placed: Vec<String>,
    /// Stale sheets deleted before copying
    pub removed: Vec<String>,
    /// Style or merge attributes that were logged and skipped
    pub skipped_attributes: usize,
}

impl MergeReport {
    pub fn is_placed(&self, name: &str) -> bool {
        self.placed.iter().any(|placed| placed == name)
    }
}

/// Copy `source` into `destination` as a sheet called `name`.
///
/// A sheet with that name (compared case-insensitively, like a spreadsheet
/// application does) is deleted first, and the copy is appended after the
/// remaining sheets.
///
/// ```rust
/// use comptalance::prelude::*;
///
/// let mut source = Worksheet::new("Balance");
/// source.set_cell_value("A1", "Compte").unwrap();
///
/// let mut template = Workbook::new();
/// let copied = copy_sheet(&source, &mut template, "BAL N").unwrap();
/// assert_eq!(copied.get_value("A1").unwrap(), CellValue::string("Compte"));
/// ```
pub fn copy_sheet<'a>(
    source: &Worksheet,
    destination: &'a mut Workbook,
    name: &str,
) -> Result<&'a Worksheet> {
    copy_sheet_with(source, destination, name, &ClonedStyles)
}

/// [`copy_sheet`] with an explicit style duplication strategy
pub fn copy_sheet_with<'a>(
    source: &Worksheet,
    destination: &'a mut Workbook,
    name: &str,
    transfer: &dyn StyleTransfer,
) -> Result<&'a Worksheet> {
    let outcome = copy_into(source, destination, name, transfer)?;
    destination
        .worksheet(outcome.index)
        .ok_or_else(|| ComptaError::merge(format!("sheet '{name}' is missing after the copy")))
}

struct CopyOutcome {
    index: usize,
    skipped: usize,
}

fn copy_into(
    source: &Worksheet,
    destination: &mut Workbook,
    name: &str,
    transfer: &dyn StyleTransfer,
) -> Result<CopyOutcome> {
    if let Some(stale) = remove_sheet_named(destination, name) {
        log::debug!("replacing existing sheet '{stale}'");
    }

    let mut sheet = Worksheet::new(name);
    copy_dimensions(source, &mut sheet);
    let mut skipped = copy_cells(source, &mut sheet, transfer)?;
    skipped += copy_merged_ranges(source, &mut sheet);
    copy_layout(source, &mut sheet);

    let index = destination
        .add_existing_worksheet(sheet)
        .map_err(|e| ComptaError::merge(format!("cannot create sheet '{name}': {e}")))?;

    Ok(CopyOutcome { index, skipped })
}

/// Delete the sheet whose name matches `name` ignoring case
fn remove_sheet_named(workbook: &mut Workbook, name: &str) -> Option<String> {
    let wanted = name.to_lowercase();
    let index = workbook
        .sheet_names()
        .iter()
        .position(|existing| existing.to_lowercase() == wanted)?;
    workbook
        .remove_worksheet(index)
        .ok()
        .map(|removed| removed.name().to_string())
}

fn copy_dimensions(source: &Worksheet, sheet: &mut Worksheet) {
    sheet.set_default_row_height(source.default_row_height());
    sheet.set_default_column_width(source.default_column_width());

    for (&col, &width) in source.custom_column_widths() {
        sheet.set_column_width(col, width);
    }
    for &col in source.hidden_columns() {
        sheet.set_column_hidden(col, true);
    }
    for (&row, &height) in source.custom_row_heights() {
        sheet.set_row_height(row, height);
    }
    for &row in source.hidden_rows() {
        sheet.set_row_hidden(row, true);
    }
}

/// Returns the number of styles that were skipped
fn copy_cells(
    source: &Worksheet,
    sheet: &mut Worksheet,
    transfer: &dyn StyleTransfer,
) -> Result<usize> {
    let mut skipped = 0;

    for (row, col, data) in source.iter_cells() {
        let at = CellAddress::new(row, col);
        sheet
            .set_cell_value_at(row, col, data.value.clone())
            .map_err(|e| ComptaError::merge(format!("cannot copy {at}: {e}")))?;

        if data.style_index == 0 {
            continue;
        }

        let style = match source.style_by_index(data.style_index) {
            Some(style) => transfer.transfer(at, style),
            None => Err(AttributeCopyFailure::new(
                "style",
                format!("style index {} is not in the pool", data.style_index),
            )),
        };
        match style {
            Ok(style) => sheet
                .set_cell_style_at(row, col, &style)
                .map_err(|e| ComptaError::merge(format!("cannot style {at}: {e}")))?,
            Err(failure) => {
                log::debug!("{}!{at}: {failure}", sheet.name());
                skipped += 1;
            }
        }
    }

    Ok(skipped)
}

fn copy_merged_ranges(source: &Worksheet, sheet: &mut Worksheet) -> usize {
    let mut skipped = 0;
    for range in source.merged_regions() {
        if let Err(e) = sheet.merge_cells(range) {
            log::debug!("{}: cannot merge {range}: {e}", sheet.name());
            skipped += 1;
        }
    }
    skipped
}

/// Each record is copied on its own; a missing one leaves the rest alone.
fn copy_layout(source: &Worksheet, sheet: &mut Worksheet) {
    let from = source.layout();
    let to = sheet.layout_mut();

    if let Some(setup) = &from.page_setup {
        to.page_setup = Some(setup.clone());
    }
    if let Some(margins) = from.page_margins {
        to.page_margins = Some(margins);
    }
    if let Some(header_footer) = &from.header_footer {
        to.header_footer = Some(header_footer.clone());
    }
    if let Some(options) = from.print_options {
        to.print_options = Some(options);
    }
    // the copy is never the selected tab of its new workbook
    if let Some(view) = from.sheet_view {
        to.sheet_view = Some(SheetView {
            tab_selected: false,
            ..view
        });
    }

    log::trace!("layout records copied: {:?}", to.present_records());
}

/// Place the active sheet of each balance into `template`.
///
/// Stale [`BALANCE_N_SHEET`] and [`BALANCE_N1_SHEET`] sheets are removed
/// first, whether or not the matching balance is given. The merge is not
/// transactional: when the second copy fails the first one stays.
pub fn merge_balances(
    template: &mut Workbook,
    balance_n: Option<&Workbook>,
    balance_n1: Option<&Workbook>,
) -> Result<MergeReport> {
    let mut report = MergeReport::default();

    for name in [BALANCE_N_SHEET, BALANCE_N1_SHEET] {
        if let Some(stale) = remove_sheet_named(template, name) {
            log::info!("removed stale sheet '{stale}' from the template");
            report.removed.push(stale);
        }
    }

    for (name, balance) in [(BALANCE_N_SHEET, balance_n), (BALANCE_N1_SHEET, balance_n1)] {
        let Some(balance) = balance else {
            log::debug!("no workbook for '{name}'");
            continue;
        };
        let source = balance
            .active_worksheet()
            .ok_or_else(|| ComptaError::merge(format!("the workbook for '{name}' has no sheets")))?;

        let outcome = copy_into(source, template, name, &ClonedStyles)?;
        log::info!(
            "copied sheet '{}' into '{name}' ({} cells, {} attributes skipped)",
            source.name(),
            source.cell_count(),
            outcome.skipped
        );
        report.placed.push(name.to_string());
        report.skipped_attributes += outcome.skipped;
    }

    Ok(report)
}

/// Write the whole workbook as `.xlsx` bytes
pub fn serialize(workbook: &Workbook) -> Result<Vec<u8>> {
    XlsxWriter::write_bytes(workbook).map_err(|e| ComptaError::Serialize(e.to_string()))
}

/// Parse `.xlsx` bytes
pub fn load_workbook(bytes: &[u8]) -> Result<Workbook> {
    XlsxReader::read_bytes(bytes).map_err(|e| ComptaError::Load(e.to_string()))
}

/// Parse an `.xlsx` file. An unreadable file is a load failure too.
pub fn load_workbook_file<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .map_err(|e| ComptaError::Load(format!("{}: {e}", path.display())))?;
    load_workbook(&bytes).map_err(|e| match e {
        ComptaError::Load(msg) => ComptaError::Load(format!("{}: {msg}", path.display())),
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptalance_core::{
        BorderLineStyle, BorderStyle, CellRange, CellValue, Color, NumberFormat, PageMargins,
        PrintOptions,
    };
    use pretty_assertions::assert_eq;

    fn balance_sheet() -> Worksheet {
        let mut sheet = Worksheet::new("Balance 2024");
        sheet.set_cell_value("A1", "Compte").unwrap();
        sheet.set_cell_value("B1", "Solde").unwrap();
        sheet.set_cell_value("A2", "401000").unwrap();
        sheet.set_cell_value("B2", -1520.5).unwrap();
        sheet.set_cell_formula("B3", "SUM(B2:B2)").unwrap();

        let header = Style::new()
            .bold(true)
            .fill_color(Color::rgb(0xDD, 0xEB, 0xF7))
            .border(BorderStyle::outline(BorderLineStyle::Thin, Color::BLACK));
        sheet.set_cell_style("A1", &header).unwrap();
        sheet.set_cell_style("B1", &header).unwrap();
        sheet
            .set_cell_style("B2", &Style::new().number_format("#,##0.00 €"))
            .unwrap();

        sheet.set_column_width(0, 14.5);
        sheet.set_column_hidden(3, true);
        sheet.set_row_height(0, 22.0);
        sheet.set_row_hidden(5, true);
        sheet.merge_cells(&CellRange::parse("A4:B4").unwrap()).unwrap();
        sheet.layout_mut().page_margins = Some(PageMargins::default());
        sheet
    }

    struct RefuseBold;

    impl StyleTransfer for RefuseBold {
        fn transfer(
            &self,
            _at: CellAddress,
            style: &Style,
        ) -> std::result::Result<Style, AttributeCopyFailure> {
            if style.font.bold {
                Err(AttributeCopyFailure::new("font", "bold refused"))
            } else {
                Ok(style.clone())
            }
        }
    }

    #[test]
    fn test_copy_sheet_values_and_styles() {
        let source = balance_sheet();
        let mut workbook = Workbook::new();

        let copied = copy_sheet(&source, &mut workbook, "BAL N").unwrap();

        assert_eq!(copied.name(), "BAL N");
        assert_eq!(copied.cell_count(), source.cell_count());
        for (row, col, data) in source.iter_cells() {
            assert_eq!(copied.get_value_at(row, col), data.value);
            assert_eq!(copied.cell_style_at(row, col), source.cell_style_at(row, col));
        }
        assert_eq!(workbook.sheet_names(), vec!["Sheet1", "BAL N"]);
    }

    #[test]
    fn test_copy_sheet_dimensions_and_merges() {
        let source = balance_sheet();
        let mut workbook = Workbook::new();

        let copied = copy_sheet(&source, &mut workbook, "BAL N").unwrap();

        assert_eq!(copied.column_width(0), 14.5);
        assert!(copied.is_column_hidden(3));
        assert_eq!(copied.row_height(0), 22.0);
        assert!(copied.is_row_hidden(5));
        assert_eq!(copied.merged_regions(), source.merged_regions());
    }

    #[test]
    fn test_copied_styles_are_independent() {
        let source = balance_sheet();
        let mut workbook = Workbook::new();
        copy_sheet(&source, &mut workbook, "BAL N").unwrap();

        let copied = workbook.worksheet_by_name_mut("BAL N").unwrap();
        copied
            .set_cell_style("A1", &Style::new().italic(true))
            .unwrap();

        assert!(copied.cell_style("B1").unwrap().unwrap().font.bold);
        assert!(source.cell_style("A1").unwrap().unwrap().font.bold);
    }

    #[test]
    fn test_layout_records_copied_independently() {
        let mut source = balance_sheet();
        source.layout_mut().print_options = Some(PrintOptions {
            grid_lines: true,
            ..PrintOptions::default()
        });
        source.layout_mut().sheet_view = Some(SheetView {
            tab_selected: true,
            zoom_scale: 90,
            ..SheetView::default()
        });

        let mut workbook = Workbook::new();
        let copied = copy_sheet(&source, &mut workbook, "BAL N").unwrap();
        let layout = copied.layout();

        assert_eq!(layout.page_margins, Some(PageMargins::default()));
        assert!(layout.print_options.unwrap().grid_lines);
        assert_eq!(layout.page_setup, None);
        assert_eq!(layout.header_footer, None);
        let view = layout.sheet_view.unwrap();
        assert_eq!(view.zoom_scale, 90);
        assert!(!view.tab_selected);
    }

    #[test]
    fn test_copy_replaces_sheet_ignoring_case() {
        let mut workbook = Workbook::new();
        let index = workbook.add_worksheet_with_name("bal n").unwrap();
        workbook
            .worksheet_mut(index)
            .unwrap()
            .set_cell_value("Z99", "stale")
            .unwrap();

        copy_sheet(&balance_sheet(), &mut workbook, "BAL N").unwrap();

        assert_eq!(workbook.sheet_names(), vec!["Sheet1", "BAL N"]);
        let copied = workbook.worksheet_by_name("BAL N").unwrap();
        assert_eq!(copied.get_value("Z99").unwrap(), CellValue::Empty);
    }

    #[test]
    fn test_failed_style_is_skipped() {
        let source = balance_sheet();
        let mut workbook = Workbook::new();

        let copied = copy_sheet_with(&source, &mut workbook, "BAL N", &RefuseBold).unwrap();

        assert_eq!(copied.get_value("A1").unwrap(), CellValue::string("Compte"));
        assert!(copied.cell_style("A1").unwrap().unwrap().is_default());
        assert!(copied.cell_style("B1").unwrap().unwrap().is_default());
        assert_eq!(
            copied.cell_style("B2").unwrap().unwrap().number_format,
            NumberFormat::Custom("#,##0.00 €".into())
        );
    }

    #[test]
    fn test_invalid_destination_name() {
        let mut workbook = Workbook::new();
        let err = copy_sheet(&balance_sheet(), &mut workbook, "BAL/N").unwrap_err();
        assert!(matches!(err, ComptaError::Merge(_)));
        assert_eq!(workbook.sheet_count(), 1);
    }

    #[test]
    fn test_merge_report() {
        let mut balance = Workbook::empty();
        balance.add_existing_worksheet(balance_sheet()).unwrap();

        let mut template = Workbook::new();
        template.add_worksheet_with_name(BALANCE_N1_SHEET).unwrap();

        let report = merge_balances(&mut template, Some(&balance), None).unwrap();

        assert_eq!(
            report,
            MergeReport {
                placed: vec![BALANCE_N_SHEET.to_string()],
                removed: vec![BALANCE_N1_SHEET.to_string()],
                skipped_attributes: 0,
            }
        );
        assert!(report.is_placed(BALANCE_N_SHEET));
        assert_eq!(template.sheet_names(), vec!["Sheet1", BALANCE_N_SHEET]);
    }

    #[test]
    fn test_merge_uses_active_sheet() {
        let mut balance = Workbook::new();
        let index = balance.add_worksheet_with_name("Balance").unwrap();
        balance
            .worksheet_mut(index)
            .unwrap()
            .set_cell_value("A1", "actif")
            .unwrap();
        balance.set_active_sheet(index).unwrap();

        let mut template = Workbook::new();
        merge_balances(&mut template, None, Some(&balance)).unwrap();

        let sheet = template.worksheet_by_name(BALANCE_N1_SHEET).unwrap();
        assert_eq!(sheet.get_value("A1").unwrap(), CellValue::string("actif"));
    }

    #[test]
    fn test_merge_rejects_empty_balance() {
        let mut template = Workbook::new();
        let err = merge_balances(&mut template, Some(&Workbook::empty()), None).unwrap_err();
        assert!(matches!(err, ComptaError::Merge(_)));
    }

    #[test]
    fn test_load_workbook_garbage() {
        let err = load_workbook(b"not a workbook").unwrap_err();
        assert!(matches!(err, ComptaError::Load(_)));

        let err = load_workbook_file("/nonexistent/modele.xlsx").unwrap_err();
        assert!(matches!(err, ComptaError::Load(msg) if msg.contains("modele.xlsx")));
    }

    #[test]
    fn test_serialize_empty_workbook() {
        let err = serialize(&Workbook::empty()).unwrap_err();
        assert!(matches!(err, ComptaError::Serialize(_)));
    }
}
