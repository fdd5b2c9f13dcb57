//! XLSX reader

mod layout;
mod rules;
mod shared_formula;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::{read_styles_xml, StyleSheet};
use crate::xml::{attr_bool, attr_parse, attr_str, decode_excel_escapes};
use comptalance_core::style::{NumberFormat, Style};
use comptalance_core::{
    CellAddress, CellError, CellRange, CellValue, NameScope, NamedRange, PageSetup, SheetState,
    Workbook, Worksheet, MAX_COLS,
};

use self::layout::{
    apply_pane, parse_header_footer_attrs, parse_header_footer_text, parse_page_margins,
    parse_page_setup, parse_print_options, parse_sheet_view,
};
use self::rules::{parse_conditional_formatting, parse_data_validations};
use self::shared_formula::SharedFormulas;

/// Sheet entry of `workbook.xml`
struct SheetEntry {
    name: String,
    r_id: String,
    state: SheetState,
}

/// `<definedName>` before its sheet index is resolved
struct DefinedNameEntry {
    name: NamedRange,
    /// `localSheetId`, a position in `<sheets>`
    local_sheet: Option<usize>,
}

/// What `workbook.xml` says besides the relationships
#[derive(Default)]
struct WorkbookPart {
    sheets: Vec<SheetEntry>,
    active_tab: Option<usize>,
    defined_names: Vec<DefinedNameEntry>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(BufReader::new(file))
    }

    /// Read a workbook held in memory, e.g. an uploaded file
    pub fn read_bytes(bytes: &[u8]) -> XlsxResult<Workbook> {
        Self::read(Cursor::new(bytes))
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        let shared_strings = Self::read_shared_strings(&mut archive)?;
        let styles = Self::read_styles(&mut archive)?;
        let part = Self::read_workbook_xml(&mut archive)?;
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();
        // position in <sheets> -> index in the workbook, None when skipped
        let mut sheet_indices = Vec::with_capacity(part.sheets.len());

        for entry in &part.sheets {
            let Some(path) = sheet_paths.get(&entry.r_id) else {
                log::warn!(
                    "sheet '{}' has no worksheet relationship ({}), skipped",
                    entry.name,
                    entry.r_id
                );
                sheet_indices.push(None);
                continue;
            };
            let mut worksheet = Worksheet::new(entry.name.as_str());
            worksheet.set_state(entry.state);
            Self::read_worksheet(&mut archive, path, &mut worksheet, &shared_strings, &styles)?;
            sheet_indices.push(Some(workbook.add_existing_worksheet(worksheet)?));
        }

        for entry in part.defined_names {
            let mut name = entry.name;
            if let Some(position) = entry.local_sheet {
                let Some(index) = sheet_indices.get(position).copied().flatten() else {
                    log::warn!(
                        "defined name '{}' is local to missing sheet {}, skipped",
                        name.name,
                        position
                    );
                    continue;
                };
                name.scope = NameScope::Sheet(index);
            }
            let label = name.name.clone();
            if let Err(err) = workbook.define_name(name) {
                log::warn!("skipping defined name '{}': {}", label, err);
            }
        }

        if let Some(tab) = part.active_tab {
            if workbook.set_active_sheet(tab).is_err() {
                log::warn!(
                    "activeTab {} is out of range for {} sheets, using the first sheet",
                    tab,
                    workbook.sheet_count()
                );
            }
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // leading and trailing spaces in labels are significant
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut current = String::new();
        let mut in_si = false;
        let mut in_t = false;
        let mut in_phonetic = false;

        loop {
            buf.clear();
            match xml_reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Event::Empty(e) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Event::End(e) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current).into_owned());
                        current.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Event::Text(e) if in_t => current.push_str(&e.unescape()?),
                Event::CData(e) if in_t => {
                    current.push_str(&String::from_utf8_lossy(&e.into_inner()))
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(strings)
    }

    /// Cell styles and conditional format overlays
    fn read_styles<R: Read + Seek>(archive: &mut zip::ZipArchive<R>) -> XlsxResult<StyleSheet> {
        match archive.by_name("xl/styles.xml") {
            Ok(file) => read_styles_xml(file),
            Err(_) => Ok(StyleSheet {
                cell_styles: vec![Style::default()],
                dxfs: Vec::new(),
            }),
        }
    }

    /// Sheets with their rIds and visibility, the active tab, and defined names
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<WorkbookPart> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut part = WorkbookPart::default();
        let mut defined_name: Option<DefinedNameEntry> = None;

        loop {
            buf.clear();
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => match e.name().as_ref() {
                    b"sheet" => {
                        if let (Some(name), Some(r_id)) =
                            (attr_str(&e, b"name"), attr_str(&e, b"r:id"))
                        {
                            let state = attr_str(&e, b"state")
                                .map(|s| SheetState::from_xlsx(&s))
                                .unwrap_or_default();
                            part.sheets.push(SheetEntry { name, r_id, state });
                        }
                    }
                    // only the first view counts
                    b"workbookView" if part.active_tab.is_none() => {
                        part.active_tab = attr_parse::<usize>(&e, b"activeTab");
                    }
                    b"definedName" => {
                        if let Some(name) = attr_str(&e, b"name") {
                            let mut named = NamedRange::new(name, "");
                            named.comment = attr_str(&e, b"comment");
                            named.hidden = attr_bool(&e, b"hidden").unwrap_or(false);
                            defined_name = Some(DefinedNameEntry {
                                name: named,
                                local_sheet: attr_parse(&e, b"localSheetId"),
                            });
                        }
                    }
                    _ => {}
                },
                Event::Text(t) => {
                    if let Some(entry) = defined_name.as_mut() {
                        entry.name.refers_to.push_str(&t.unescape()?);
                    }
                }
                Event::End(e) if e.name().as_ref() == b"definedName" => {
                    part.defined_names.extend(defined_name.take());
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(part)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            buf.clear();
            match xml_reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                    let id = attr_str(&e, b"Id");
                    let target = attr_str(&e, b"Target");
                    let rel_type = attr_str(&e, b"Type");

                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to the xl/ folder unless absolute
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(rels)
    }

    /// Read one worksheet part into `worksheet`
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        styles: &StyleSheet,
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let mut xml_reader = Reader::from_reader(BufReader::new(file));
        // inline strings keep their surrounding whitespace
        xml_reader.trim_text(false);

        let mut buf = Vec::new();
        let mut cell = PendingCell::default();
        let mut in_cell = false;
        let mut text_target = TextTarget::None;
        let mut in_inline_str = false;
        let mut in_phonetic = false;
        let mut shared_formulas = SharedFormulas::default();

        // cells and rows may omit their `r` attribute
        let mut next_row: u32 = 0;
        let mut next_col: u16 = 0;
        let mut fit_to_page = false;

        loop {
            buf.clear();
            let (e, empty) = match xml_reader.read_event_into(&mut buf)? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::Text(t) => {
                    if text_target != TextTarget::None {
                        let text = t.unescape()?;
                        cell.push_text(text_target, &text);
                    }
                    continue;
                }
                Event::CData(t) => {
                    if text_target != TextTarget::None {
                        cell.push_text(text_target, &String::from_utf8_lossy(&t.into_inner()));
                    }
                    continue;
                }
                Event::End(e) => {
                    match e.name().as_ref() {
                        b"c" => {
                            in_cell = false;
                            next_col = cell.col.saturating_add(1);
                            resolve_shared_formula(&mut cell, &mut shared_formulas);
                            process_cell(worksheet, &cell, shared_strings, &styles.cell_styles)?;
                        }
                        b"row" => next_row = next_row.saturating_add(1),
                        b"v" | b"f" => text_target = TextTarget::None,
                        b"t" if in_inline_str => text_target = TextTarget::None,
                        b"is" => in_inline_str = false,
                        b"rPh" => in_phonetic = false,
                        _ => {}
                    }
                    continue;
                }
                Event::Eof => break,
                _ => continue,
            };

            match e.name().as_ref() {
                b"pageSetUpPr" => fit_to_page = attr_bool(&e, b"fitToPage").unwrap_or(false),
                b"sheetView" => {
                    let layout = worksheet.layout_mut();
                    if layout.sheet_view.is_none() {
                        layout.sheet_view = Some(parse_sheet_view(&e));
                    }
                }
                b"pane" => {
                    if let Some(view) = worksheet.layout_mut().sheet_view.as_mut() {
                        apply_pane(&e, view);
                    }
                }
                b"sheetFormatPr" => {
                    if let Some(height) = attr_parse(&e, b"defaultRowHeight") {
                        worksheet.set_default_row_height(height);
                    }
                    if let Some(width) = attr_parse(&e, b"defaultColWidth") {
                        worksheet.set_default_column_width(width);
                    }
                }
                b"col" => read_col(&e, worksheet),
                b"row" => {
                    if let Some(r) = attr_parse::<u32>(&e, b"r") {
                        next_row = r.saturating_sub(1);
                    }
                    next_col = 0;
                    if let Some(height) = attr_parse::<f64>(&e, b"ht") {
                        worksheet.set_row_height(next_row, height);
                    }
                    if attr_bool(&e, b"hidden").unwrap_or(false) {
                        worksheet.set_row_hidden(next_row, true);
                    }
                    if empty {
                        next_row = next_row.saturating_add(1);
                    }
                }
                b"c" => {
                    let (row, col) = match attr_str(&e, b"r") {
                        Some(r) => {
                            let addr = CellAddress::parse(&r).map_err(|err| {
                                XlsxError::Parse(format!("Invalid cell reference '{}': {}", r, err))
                            })?;
                            (addr.row, addr.col)
                        }
                        None => (next_row, next_col),
                    };
                    cell = PendingCell {
                        row,
                        col,
                        cell_type: attr_str(&e, b"t"),
                        style: attr_parse(&e, b"s").unwrap_or(0),
                        ..PendingCell::default()
                    };
                    if empty {
                        next_col = col.saturating_add(1);
                        process_cell(worksheet, &cell, shared_strings, &styles.cell_styles)?;
                    } else {
                        in_cell = true;
                    }
                }
                b"v" if in_cell && !empty => {
                    cell.value = Some(String::new());
                    text_target = TextTarget::Value;
                }
                b"f" if in_cell => {
                    cell.formula = Some(String::new());
                    if attr_str(&e, b"t").as_deref() == Some("shared") {
                        cell.shared_index = attr_parse(&e, b"si");
                    }
                    if !empty {
                        text_target = TextTarget::Formula;
                    }
                }
                b"is" if in_cell && !empty => {
                    in_inline_str = true;
                    cell.value = Some(String::new());
                }
                b"rPh" if in_inline_str && !empty => in_phonetic = true,
                b"t" if in_inline_str && !in_phonetic && !empty => {
                    text_target = TextTarget::Value
                }
                b"mergeCell" => {
                    if let Some(reference) = attr_str(&e, b"ref") {
                        read_merge(&reference, worksheet);
                    }
                }
                b"conditionalFormatting" if !empty => {
                    parse_conditional_formatting(&mut xml_reader, &e, &styles.dxfs, worksheet)?;
                }
                b"dataValidations" if !empty => {
                    parse_data_validations(&mut xml_reader, worksheet)?;
                }
                b"printOptions" => {
                    worksheet.layout_mut().print_options = Some(parse_print_options(&e));
                }
                b"pageMargins" => {
                    worksheet.layout_mut().page_margins = Some(parse_page_margins(&e));
                }
                b"pageSetup" => {
                    worksheet.layout_mut().page_setup = Some(parse_page_setup(&e));
                }
                b"headerFooter" => {
                    let mut header_footer = parse_header_footer_attrs(&e);
                    if !empty {
                        parse_header_footer_text(&mut xml_reader, &mut header_footer)?;
                    }
                    worksheet.layout_mut().header_footer = Some(header_footer);
                }
                _ => {}
            }
        }

        if fit_to_page {
            worksheet
                .layout_mut()
                .page_setup
                .get_or_insert_with(PageSetup::default)
                .fit_to_page = true;
        }

        Ok(())
    }
}

/// `<col min="2" max="4" width="12.5" customWidth="1" hidden="1"/>`, 1-based inclusive
fn read_col(e: &BytesStart<'_>, worksheet: &mut Worksheet) {
    let (Some(min), Some(max)) = (attr_parse::<u32>(e, b"min"), attr_parse::<u32>(e, b"max"))
    else {
        return;
    };
    let width = attr_parse::<f64>(e, b"width");
    let hidden = attr_bool(e, b"hidden").unwrap_or(false);
    if width.is_none() && !hidden {
        return;
    }

    let first = min.max(1) - 1;
    let last = max.clamp(1, u32::from(MAX_COLS)) - 1;
    for col in first..=last {
        let col = col as u16;
        if let Some(width) = width {
            worksheet.set_column_width(col, width);
        }
        if hidden {
            worksheet.set_column_hidden(col, true);
        }
    }
}

fn read_merge(reference: &str, worksheet: &mut Worksheet) {
    let range = match CellRange::parse(reference) {
        Ok(range) => range,
        Err(err) => {
            log::warn!("skipping merge range '{}': {}", reference, err);
            return;
        }
    };
    if let Err(err) = worksheet.merge_cells(&range) {
        log::warn!(
            "skipping merge range '{}' on sheet '{}': {}",
            reference,
            worksheet.name(),
            err
        );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
}

/// A `<c>` element being read
#[derive(Debug, Default)]
struct PendingCell {
    row: u32,
    col: u16,
    cell_type: Option<String>,
    style: u32,
    value: Option<String>,
    formula: Option<String>,
    /// `si` of a `t="shared"` formula
    shared_index: Option<u32>,
}

impl PendingCell {
    fn push_text(&mut self, target: TextTarget, text: &str) {
        let slot = match target {
            TextTarget::Value => &mut self.value,
            TextTarget::Formula => &mut self.formula,
            TextTarget::None => return,
        };
        slot.get_or_insert_with(String::new).push_str(text);
    }
}

/// Interpret a `<v>` payload according to the cell's `t` attribute
fn parse_value(cell_type: Option<&str>, raw: &str, shared_strings: &[String]) -> XlsxResult<CellValue> {
    let value = match cell_type {
        Some("s") => {
            let idx: usize = raw.trim().parse().map_err(|_| {
                XlsxError::Parse(format!("Invalid shared string index: {}", raw))
            })?;
            let s = shared_strings.get(idx).ok_or_else(|| {
                XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
            })?;
            CellValue::string(s)
        }
        Some("b") => CellValue::Boolean(raw.trim() == "1" || raw.trim().eq_ignore_ascii_case("true")),
        Some("e") => CellError::parse(raw)
            .map(CellValue::Error)
            .unwrap_or_else(|| CellValue::string(raw)),
        Some("inlineStr") | Some("str") => CellValue::string(decode_excel_escapes(raw)),
        None | Some("n") => match raw.trim().parse::<f64>() {
            Ok(n) => CellValue::Number(n),
            Err(_) => CellValue::string(raw),
        },
        Some("d") => match parse_iso_datetime(raw) {
            Some((serial, _)) => CellValue::Number(serial),
            None => CellValue::string(raw),
        },
        Some(_) => CellValue::string(raw),
    };
    Ok(value)
}

/// The anchor of a shared group records its text; followers get it shifted
fn resolve_shared_formula(cell: &mut PendingCell, shared: &mut SharedFormulas) {
    let Some(si) = cell.shared_index else {
        return;
    };
    match cell.formula.as_deref().filter(|f| !f.trim().is_empty()) {
        Some(text) => shared.insert_anchor(si, text, cell.row, cell.col),
        None => {
            cell.formula = shared.follower(si, cell.row, cell.col);
            if cell.formula.is_none() {
                log::debug!(
                    "shared formula {} has no anchor before {}, keeping the cached value",
                    si,
                    CellAddress::new(cell.row, cell.col)
                );
            }
        }
    }
}

/// Serial day number of an ISO 8601 `t="d"` value, with the built-in format
/// that displays it: 14 for a date, 22 for a date and time, 21 for a time.
///
/// Serials count from 1899-12-30, which matches the application for every
/// date after February 1900.
fn parse_iso_datetime(raw: &str) -> Option<(f64, NumberFormat)> {
    let raw = raw.trim();
    let raw = raw.strip_suffix('Z').unwrap_or(raw);
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let day_fraction =
        |t: NaiveTime| f64::from(t.num_seconds_from_midnight()) / 86_400.0
            + f64::from(t.nanosecond()) / 86_400e9;

    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        let days = (dt.date() - epoch).num_days() as f64;
        return Some((days + day_fraction(dt.time()), NumberFormat::BuiltIn(22)));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(((date - epoch).num_days() as f64, NumberFormat::BuiltIn(14)));
    }
    if let Ok(time) = NaiveTime::parse_from_str(raw, "%H:%M:%S%.f") {
        return Some((day_fraction(time), NumberFormat::BuiltIn(21)));
    }
    None
}

/// Store a finished cell, value first, then its style
fn process_cell(
    worksheet: &mut Worksheet,
    cell: &PendingCell,
    shared_strings: &[String],
    styles: &[Style],
) -> XlsxResult<()> {
    let cell_type = cell.cell_type.as_deref();

    // a follower whose anchor never appeared keeps its cached value
    let formula = cell.formula.as_deref().filter(|f| !f.trim().is_empty());

    let value = match (formula, cell.value.as_deref()) {
        (Some(text), cached) => {
            let cached = match cached {
                Some(raw) if !raw.is_empty() => Some(Box::new(parse_value(
                    cell_type,
                    raw,
                    shared_strings,
                )?)),
                _ => None,
            };
            let mut value = CellValue::formula(decode_excel_escapes(text));
            if let CellValue::Formula { cached_value, .. } = &mut value {
                *cached_value = cached;
            }
            value
        }
        (None, Some(raw)) if !raw.is_empty() || cell_type == Some("inlineStr") => {
            parse_value(cell_type, raw, shared_strings)?
        }
        _ => CellValue::Empty,
    };

    if !value.is_empty() {
        worksheet.set_cell_value_at(cell.row, cell.col, value)?;
    }

    let mut style = Cow::Borrowed(
        styles
            .get(cell.style as usize)
            .ok_or_else(|| XlsxError::Parse(format!("Style index {} out of bounds", cell.style)))?,
    );
    // an ISO date shown with a number format would read as a bare serial
    if cell_type == Some("d") && !style.number_format.is_date_format() {
        if let Some((_, format)) = cell.value.as_deref().and_then(parse_iso_datetime) {
            style.to_mut().number_format = format;
        }
    }
    if *style != Style::default() {
        worksheet.set_cell_style_at(cell.row, cell.col, &style)?;
    }

    Ok(())
}
