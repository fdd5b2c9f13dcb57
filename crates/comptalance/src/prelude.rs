//! Prelude module - common imports for comptalance users
//!
//! ```rust
//! use comptalance::prelude::*;
//! ```

pub use crate::{
    // Style types
    Alignment,
    BorderEdge,
    BorderLineStyle,
    BorderStyle,
    // Cell types
    CellAddress,
    CellError,
    CellRange,
    CellValue,
    Color,
    // Error types
    ComptaError,
    FillStyle,
    FontStyle,
    HorizontalAlignment,
    NumberFormat,
    Protection,
    Style,
    VerticalAlignment,

    // Layout types
    HeaderFooter,
    PageMargins,
    PageOrientation,
    PageSetup,
    PrintOptions,
    SheetLayout,
    SheetView,

    // Names, visibility and rules
    CfRuleType,
    ComparisonOperator,
    ConditionalFormatRule,
    DataValidation,
    DifferentialStyle,
    NameScope,
    NamedRange,
    SheetState,
    ValidationType,

    // Main types
    Workbook,
    Worksheet,

    // Merge
    copy_sheet,
    load_workbook,
    merge_balances,
    serialize,
    MergeReport,
    MergeSession,
    Slot,
    BALANCE_N1_SHEET,
    BALANCE_N_SHEET,

    // Registry
    Settings,
    TemplateRegistry,

    // I/O types
    XlsxReader,
    XlsxWriter,
};
