//! # comptalance-xlsx
//!
//! Reader and writer for the zipped-XML spreadsheet container (`.xlsx`).
//!
//! Only the parts the balance merge and a template round trip need are
//! modelled: cell values (shared formulas expanded, ISO dates turned into
//! serials), per-cell styles, row and column dimensions, merged ranges, the
//! page/view layout records, sheet visibility, defined names, conditional
//! formats and data validations. Anything else in a source file is skipped.
//!
//! ```no_run
//! use comptalance_xlsx::{XlsxReader, XlsxWriter};
//!
//! let workbook = XlsxReader::read_file("modele.xlsx")?;
//! let bytes = XlsxWriter::write_bytes(&workbook)?;
//! # Ok::<(), comptalance_xlsx::XlsxError>(())
//! ```

pub mod error;
pub mod reader;
pub mod writer;

mod styles;
mod xml;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
