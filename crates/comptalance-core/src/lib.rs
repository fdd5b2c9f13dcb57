//! # comptalance-core
//!
//! In-memory spreadsheet model used by comptalance.
//!
//! - [`Workbook`] / [`Worksheet`] - the document and its named sheets
//! - [`CellValue`], [`CellAddress`], [`CellRange`] - cell contents and addressing
//! - [`Style`] - per-cell formatting (font, fill, border, alignment, number format, protection)
//! - [`SheetLayout`] - page setup, margins, header/footer, print options and view settings
//! - [`NamedRange`], [`ConditionalFormatRule`], [`DataValidation`] - names and
//!   per-range rules a template carries
//!
//! ## Example
//!
//! ```rust
//! use comptalance_core::{CellValue, Style, Workbook};
//!
//! let mut workbook = Workbook::new();
//! let index = workbook.add_worksheet_with_name("BAL N").unwrap();
//! let sheet = workbook.worksheet_mut(index).unwrap();
//!
//! sheet.set_cell_value("A1", "Compte").unwrap();
//! sheet.set_cell_value_at(1, 0, CellValue::Number(401.0)).unwrap();
//! sheet.set_cell_style("A1", &Style::new().bold(true)).unwrap();
//! ```

pub mod cell;
pub mod conditional_format;
pub mod error;
pub mod layout;
pub mod named_range;
pub mod style;
pub mod validation;
pub mod workbook;
pub mod worksheet;

pub use cell::{CellAddress, CellData, CellError, CellRange, CellValue};
pub use conditional_format::{
    CfColorValue, CfRuleType, CfValue, CfValueType, ConditionalFormatRule, TextOperator,
};
pub use error::{Error, Result};
pub use layout::{
    HeaderFooter, PageMargins, PageOrientation, PageSetup, PrintOptions, SheetLayout, SheetView,
};
pub use named_range::{NameScope, NamedRange, NamedRangeCollection};
pub use validation::{ComparisonOperator, DataValidation, ValidationErrorStyle, ValidationType};
pub use workbook::Workbook;
pub use worksheet::{SheetState, Worksheet};

pub use style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, DifferentialFont,
    DifferentialStyle, FillStyle, FontStyle, HorizontalAlignment, NumberFormat, Protection, Style,
    StylePool, VerticalAlignment,
};

/// Maximum number of rows in a worksheet
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
