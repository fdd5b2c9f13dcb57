//! XLSX writer

mod layout;
mod rules;

use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::{BufWriter, Cursor, Seek, Write};
use std::path::Path;

use crate::error::{XlsxError, XlsxResult};
use crate::styles::XlsxStyleTable;
use crate::xml::{encode_excel_escapes, escape};
use comptalance_core::{
    CellAddress, CellData, CellError, CellValue, NameScope, Workbook, Worksheet,
};

use self::layout::{
    write_header_footer, write_page_margins, write_page_setup, write_print_options,
    write_sheet_pr, write_sheet_views,
};
use self::rules::{write_conditional_formats, write_data_validations};

/// Column width a sheet gets when `sheetFormatPr` does not say otherwise
const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, BufWriter::new(file))
    }

    /// Write a workbook into memory, ready to be offered as a download
    pub fn write_bytes(workbook: &Workbook) -> XlsxResult<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        Self::write(workbook, &mut cursor)?;
        Ok(cursor.into_inner())
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        if workbook.is_empty() {
            return Err(XlsxError::InvalidFormat(
                "a workbook needs at least one sheet".into(),
            ));
        }

        let style_table = XlsxStyleTable::build(workbook);
        let mut shared_strings = SharedStringTable::default();

        // sheets first: they fill the shared string table
        let active = workbook.active_sheet().min(workbook.sheet_count() - 1);
        let sheet_parts: Vec<String> = workbook
            .worksheets()
            .enumerate()
            .map(|(i, sheet)| {
                worksheet_xml(sheet, i, i == active, &style_table, &mut shared_strings)
            })
            .collect();

        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options)?;
        zip.write_all(content_types_xml(workbook.sheet_count(), !shared_strings.is_empty()).as_bytes())?;

        zip.start_file("_rels/.rels", options)?;
        zip.write_all(ROOT_RELS.as_bytes())?;

        zip.start_file("xl/workbook.xml", options)?;
        zip.write_all(workbook_xml(workbook, active).as_bytes())?;

        zip.start_file("xl/_rels/workbook.xml.rels", options)?;
        zip.write_all(
            workbook_rels_xml(workbook.sheet_count(), !shared_strings.is_empty()).as_bytes(),
        )?;

        zip.start_file("xl/styles.xml", options)?;
        zip.write_all(style_table.to_styles_xml().as_bytes())?;

        if !shared_strings.is_empty() {
            zip.start_file("xl/sharedStrings.xml", options)?;
            zip.write_all(shared_strings.to_xml().as_bytes())?;
        }

        for (i, part) in sheet_parts.iter().enumerate() {
            zip.start_file(format!("xl/worksheets/sheet{}.xml", i + 1), options)?;
            zip.write_all(part.as_bytes())?;
        }

        zip.finish()?;
        Ok(())
    }
}

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
    <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#;

fn content_types_xml(sheet_count: usize, has_shared_strings: bool) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
    <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
    <Default Extension="xml" ContentType="application/xml"/>
    <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
    <Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    );
    if has_shared_strings {
        content.push_str(
            r#"
    <Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#,
        );
    }
    for i in 0..sheet_count {
        content.push_str(&format!(
            r#"
    <Override PartName="/xl/worksheets/sheet{}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
            i + 1
        ));
    }
    content.push_str("\n</Types>");
    content
}

fn workbook_xml(workbook: &Workbook, active: usize) -> String {
    let mut content = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
    <bookViews>
        <workbookView activeTab="{}"/>
    </bookViews>
    <sheets>"#,
        active
    );
    for (i, sheet) in workbook.worksheets().enumerate() {
        let state = sheet
            .state()
            .xlsx_state()
            .map_or(String::new(), |state| format!(" state=\"{}\"", state));
        content.push_str(&format!(
            r#"
        <sheet name="{}" sheetId="{}"{} r:id="rId{}"/>"#,
            escape(sheet.name()),
            i + 1,
            state,
            i + 1
        ));
    }
    content.push_str("\n    </sheets>");
    write_defined_names(&mut content, workbook);
    content.push_str("\n</workbook>");
    content
}

fn write_defined_names(content: &mut String, workbook: &Workbook) {
    let names = workbook.defined_names();
    if names.is_empty() {
        return;
    }
    content.push_str("\n    <definedNames>");
    for name in names.iter() {
        content.push_str(&format!("\n        <definedName name=\"{}\"", escape(&name.name)));
        if let NameScope::Sheet(index) = name.scope {
            content.push_str(&format!(" localSheetId=\"{}\"", index));
        }
        if name.hidden {
            content.push_str(" hidden=\"1\"");
        }
        if let Some(comment) = &name.comment {
            content.push_str(&format!(" comment=\"{}\"", escape(comment)));
        }
        content.push_str(&format!(
            ">{}</definedName>",
            escape(&name.refers_to)
        ));
    }
    content.push_str("\n    </definedNames>");
}

/// Worksheets take rId1..rIdN, styles and shared strings follow
fn workbook_rels_xml(sheet_count: usize, has_shared_strings: bool) -> String {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 0..sheet_count {
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{}.xml"/>"#,
            i + 1,
            i + 1
        ));
    }
    content.push_str(&format!(
        r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
        sheet_count + 1
    ));
    if has_shared_strings {
        content.push_str(&format!(
            r#"
    <Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
            sheet_count + 2
        ));
    }
    content.push_str("\n</Relationships>");
    content
}

/// Deduplicated `sst` built while the sheets are written
#[derive(Debug, Default)]
struct SharedStringTable {
    strings: Vec<String>,
    index: HashMap<String, usize>,
    /// Total references, duplicates included
    count: usize,
}

impl SharedStringTable {
    fn index_of(&mut self, s: &str) -> usize {
        self.count += 1;
        if let Some(&idx) = self.index.get(s) {
            return idx;
        }
        let idx = self.strings.len();
        self.strings.push(s.to_string());
        self.index.insert(s.to_string(), idx);
        idx
    }

    fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    fn to_xml(&self) -> String {
        let mut content = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{}" uniqueCount="{}">"#,
            self.count,
            self.strings.len()
        );
        for s in &self.strings {
            let preserve = s.starts_with(char::is_whitespace) || s.ends_with(char::is_whitespace);
            content.push_str(&format!(
                "\n    <si><t{}>{}</t></si>",
                if preserve { " xml:space=\"preserve\"" } else { "" },
                escape(&encode_excel_escapes(s))
            ));
        }
        content.push_str("\n</sst>");
        content
    }
}

fn worksheet_xml(
    sheet: &Worksheet,
    index: usize,
    active: bool,
    style_table: &XlsxStyleTable,
    shared_strings: &mut SharedStringTable,
) -> String {
    let layout = sheet.layout();
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );

    write_sheet_pr(&mut content, layout.page_setup.as_ref());
    if let Some(range) = sheet.used_range() {
        content.push_str(&format!("\n    <dimension ref=\"{}\"/>", range));
    }
    write_sheet_views(&mut content, layout.sheet_view.as_ref(), active);

    content.push_str(&format!(
        "\n    <sheetFormatPr defaultRowHeight=\"{}\"",
        sheet.default_row_height()
    ));
    if sheet.default_column_width() != DEFAULT_COLUMN_WIDTH {
        content.push_str(&format!(
            " defaultColWidth=\"{}\"",
            sheet.default_column_width()
        ));
    }
    content.push_str("/>");

    write_cols(&mut content, sheet);
    write_sheet_data(&mut content, sheet, index, style_table, shared_strings);

    let merged_regions = sheet.merged_regions();
    if !merged_regions.is_empty() {
        content.push_str(&format!(
            "\n    <mergeCells count=\"{}\">",
            merged_regions.len()
        ));
        for range in merged_regions {
            content.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", range));
        }
        content.push_str("\n    </mergeCells>");
    }

    write_conditional_formats(&mut content, sheet, style_table);
    write_data_validations(&mut content, sheet);

    if let Some(options) = &layout.print_options {
        write_print_options(&mut content, options);
    }
    if let Some(margins) = &layout.page_margins {
        write_page_margins(&mut content, margins);
    }
    if let Some(setup) = &layout.page_setup {
        write_page_setup(&mut content, setup);
    }
    if let Some(hf) = &layout.header_footer {
        write_header_footer(&mut content, hf);
    }

    content.push_str("\n</worksheet>");
    content
}

/// Runs of adjacent columns with identical width and visibility become one `<col>`
fn write_cols(content: &mut String, sheet: &Worksheet) {
    let columns: BTreeSet<u16> = sheet
        .custom_column_widths()
        .keys()
        .chain(sheet.hidden_columns())
        .copied()
        .collect();
    if columns.is_empty() {
        return;
    }

    let attrs = |col: u16| {
        (
            sheet.custom_column_widths().get(&col).copied(),
            sheet.is_column_hidden(col),
        )
    };

    let mut runs: Vec<(u16, u16, Option<f64>, bool)> = Vec::new();
    for col in columns {
        let (width, hidden) = attrs(col);
        match runs.last_mut() {
            Some((_, last, w, h)) if *last + 1 == col && *w == width && *h == hidden => {
                *last = col
            }
            _ => runs.push((col, col, width, hidden)),
        }
    }

    content.push_str("\n    <cols>");
    for (first, last, width, hidden) in runs {
        content.push_str(&format!("\n        <col min=\"{}\" max=\"{}\"", first + 1, last + 1));
        if let Some(width) = width {
            content.push_str(&format!(" width=\"{}\" customWidth=\"1\"", width));
        }
        if hidden {
            content.push_str(" hidden=\"1\"");
        }
        content.push_str("/>");
    }
    content.push_str("\n    </cols>");
}

fn write_sheet_data(
    content: &mut String,
    sheet: &Worksheet,
    index: usize,
    style_table: &XlsxStyleTable,
    shared_strings: &mut SharedStringTable,
) {
    // rows with cells, plus rows that only carry a height or are hidden
    let rows: BTreeSet<u32> = sheet
        .iter_cells()
        .map(|(row, _, _)| row)
        .chain(sheet.custom_row_heights().keys().copied())
        .chain(sheet.hidden_rows().iter().copied())
        .collect();

    if rows.is_empty() {
        content.push_str("\n    <sheetData/>");
        return;
    }

    content.push_str("\n    <sheetData>");
    let mut cells = sheet.iter_cells().peekable();
    for row in rows {
        content.push_str(&format!("\n        <row r=\"{}\"", row + 1));
        if let Some(height) = sheet.custom_row_heights().get(&row) {
            content.push_str(&format!(" ht=\"{}\" customHeight=\"1\"", height));
        }
        if sheet.is_row_hidden(row) {
            content.push_str(" hidden=\"1\"");
        }

        if cells.peek().map_or(true, |(r, _, _)| *r != row) {
            content.push_str("/>");
            continue;
        }

        content.push('>');
        while let Some((_, col, cell)) = cells.next_if(|(r, _, _)| *r == row) {
            let xf_id = style_table.xf_id_for(index, cell.style_index);
            write_cell(content, CellAddress::new(row, col), cell, xf_id, shared_strings);
        }
        content.push_str("\n        </row>");
    }
    content.push_str("\n    </sheetData>");
}

fn write_cell(
    content: &mut String,
    addr: CellAddress,
    cell: &CellData,
    xf_id: u32,
    shared_strings: &mut SharedStringTable,
) {
    let style_attr = if xf_id != 0 {
        format!(" s=\"{}\"", xf_id)
    } else {
        String::new()
    };
    let open = format!("\n            <c r=\"{}\"{}", addr.to_a1_string(), style_attr);

    match &cell.value {
        CellValue::Empty => {
            // style-only cells keep borders and fills
            if xf_id != 0 {
                content.push_str(&open);
                content.push_str("/>");
            }
        }
        CellValue::Formula { text, cached_value } => {
            let formula = text.strip_prefix('=').unwrap_or(text);
            let (type_attr, cached) = match cached_value.as_deref() {
                Some(CellValue::Number(n)) if n.is_finite() => ("", Some(n.to_string())),
                Some(CellValue::String(s)) => {
                    (" t=\"str\"", Some(escape(&encode_excel_escapes(s.as_str())).into_owned()))
                }
                Some(CellValue::Boolean(b)) => (" t=\"b\"", Some(bool_value(*b).to_string())),
                Some(CellValue::Error(e)) => (" t=\"e\"", Some(escape(e.as_str()).into_owned())),
                _ => ("", None),
            };
            content.push_str(&format!(
                "{}{}><f>{}</f>",
                open,
                type_attr,
                escape(&encode_excel_escapes(formula))
            ));
            if let Some(cached) = cached {
                content.push_str(&format!("<v>{}</v>", cached));
            }
            content.push_str("</c>");
        }
        value => {
            let (type_attr, raw) = scalar_value(value, shared_strings);
            content.push_str(&format!("{}{}><v>{}</v></c>", open, type_attr, raw));
        }
    }
}

/// `t` attribute and `<v>` payload of a non-formula value
fn scalar_value(value: &CellValue, shared_strings: &mut SharedStringTable) -> (&'static str, String) {
    match value {
        CellValue::Number(n) if n.is_finite() => ("", n.to_string()),
        // NaN and infinities have no cell representation
        CellValue::Number(_) => (" t=\"e\"", CellError::Num.as_str().to_string()),
        CellValue::String(s) => (" t=\"s\"", shared_strings.index_of(s.as_str()).to_string()),
        CellValue::Boolean(b) => (" t=\"b\"", bool_value(*b).to_string()),
        CellValue::Error(e) => (" t=\"e\"", escape(e.as_str()).into_owned()),
        CellValue::Empty | CellValue::Formula { .. } => ("", String::new()),
    }
}

fn bool_value(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}
