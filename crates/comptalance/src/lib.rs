//! # comptalance
//!
//! Merge a year's accounting balances into a workbook template without
//! losing their formatting.
//!
//! A user picks a template from the [`TemplateRegistry`], supplies the
//! balance N and balance N-1 workbooks, and gets back the template with two
//! extra sheets, `BAL N` and `BAL N-1`, holding copies of the balances'
//! active sheets: values, styles, column and row sizing, merged ranges and
//! page layout included.
//!
//! ## Features
//!
//! - Style-preserving sheet copy ([`copy_sheet`])
//! - Balance merge with stale sheet replacement ([`merge_balances`])
//! - Explicit session state with load/integrate/download ([`MergeSession`])
//! - JSON template registry ([`TemplateRegistry`])
//!
//! ## Example
//!
//! ```rust
//! use comptalance::prelude::*;
//!
//! let mut template = Workbook::new();
//!
//! let mut balance = Workbook::new();
//! let sheet = balance.worksheet_mut(0).unwrap();
//! sheet.set_cell_value("A1", "401000").unwrap();
//! sheet.set_cell_value("B1", -1520.5).unwrap();
//! sheet.set_cell_style("B1", &Style::new().number_format("#,##0.00")).unwrap();
//!
//! let report = merge_balances(&mut template, Some(&balance), None).unwrap();
//! assert!(report.is_placed(BALANCE_N_SHEET));
//!
//! let bytes = serialize(&template).unwrap();
//! let reloaded = load_workbook(&bytes).unwrap();
//! assert_eq!(reloaded.sheet_names(), vec!["Sheet1", "BAL N"]);
//! ```

pub mod config;
pub mod download;
pub mod error;
pub mod merge;
pub mod prelude;
pub mod registry;
pub mod session;

pub use config::Settings;
pub use download::{download_file_name, Download, XLSX_MIME};
pub use error::{ComptaError, Result};
pub use merge::{
    copy_sheet, copy_sheet_with, load_workbook, load_workbook_file, merge_balances, serialize,
    AttributeCopyFailure, ClonedStyles, MergeReport, StyleTransfer, BALANCE_N1_SHEET,
    BALANCE_N_SHEET,
};
pub use registry::{TemplateDescriptor, TemplateImage, TemplateRegistry};
pub use session::{MergeSession, SessionStatus, Slot};

// Re-export core types
pub use comptalance_core::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, CellAddress, CellData, CellError,
    CellRange, CellValue, CfRuleType, Color, ComparisonOperator, ConditionalFormatRule,
    DataValidation, DifferentialStyle, FillStyle, FontStyle, HeaderFooter, HorizontalAlignment,
    NameScope, NamedRange, NumberFormat, PageMargins, PageOrientation, PageSetup, PrintOptions,
    Protection, SheetLayout, SheetState, SheetView, Style, StylePool, ValidationType,
    VerticalAlignment, Workbook, Worksheet, MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use comptalance_xlsx::{XlsxError, XlsxReader, XlsxWriter};
