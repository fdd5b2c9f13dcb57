//! Layout elements of a worksheet part, in the order the schema wants them

use comptalance_core::{
    CellAddress, HeaderFooter, PageMargins, PageOrientation, PageSetup, PrintOptions, SheetView,
};

use crate::xml::{encode_excel_escapes, escape};

pub(crate) fn write_sheet_pr(content: &mut String, page_setup: Option<&PageSetup>) {
    if page_setup.is_some_and(|setup| setup.fit_to_page) {
        content.push_str("\n    <sheetPr><pageSetUpPr fitToPage=\"1\"/></sheetPr>");
    }
}

/// `<sheetViews>` block. `active` decides `tabSelected`; the stored flag is
/// ignored so that at most one sheet of the written workbook is selected.
pub(crate) fn write_sheet_views(content: &mut String, view: Option<&SheetView>, active: bool) {
    if view.is_none() && !active {
        return;
    }
    let view = view.copied().unwrap_or_default();

    content.push_str("\n    <sheetViews>\n        <sheetView");
    if !view.show_grid_lines {
        content.push_str(" showGridLines=\"0\"");
    }
    if !view.show_row_col_headers {
        content.push_str(" showRowColHeaders=\"0\"");
    }
    if view.right_to_left {
        content.push_str(" rightToLeft=\"1\"");
    }
    if active {
        content.push_str(" tabSelected=\"1\"");
    }
    if view.zoom_scale != 100 {
        content.push_str(&format!(" zoomScale=\"{}\"", view.zoom_scale));
    }
    content.push_str(" workbookViewId=\"0\"");

    if !view.has_frozen_pane() {
        content.push_str("/>\n    </sheetViews>");
        return;
    }

    let active_pane = match (view.frozen_rows > 0, view.frozen_cols > 0) {
        (true, true) => "bottomRight",
        (true, false) => "bottomLeft",
        _ => "topRight",
    };
    content.push_str(">\n            <pane");
    if view.frozen_cols > 0 {
        content.push_str(&format!(" xSplit=\"{}\"", view.frozen_cols));
    }
    if view.frozen_rows > 0 {
        content.push_str(&format!(" ySplit=\"{}\"", view.frozen_rows));
    }
    let top_left = CellAddress::new(view.frozen_rows, view.frozen_cols);
    content.push_str(&format!(
        " topLeftCell=\"{}\" activePane=\"{}\" state=\"frozen\"/>",
        top_left.to_a1_string(),
        active_pane
    ));
    content.push_str(&format!(
        "\n            <selection pane=\"{}\"/>\n        </sheetView>\n    </sheetViews>",
        active_pane
    ));
}

pub(crate) fn write_print_options(content: &mut String, options: &PrintOptions) {
    content.push_str("\n    <printOptions");
    if options.horizontal_centered {
        content.push_str(" horizontalCentered=\"1\"");
    }
    if options.vertical_centered {
        content.push_str(" verticalCentered=\"1\"");
    }
    if options.headings {
        content.push_str(" headings=\"1\"");
    }
    if options.grid_lines {
        content.push_str(" gridLines=\"1\"");
    }
    content.push_str("/>");
}

pub(crate) fn write_page_margins(content: &mut String, margins: &PageMargins) {
    content.push_str(&format!(
        "\n    <pageMargins left=\"{}\" right=\"{}\" top=\"{}\" bottom=\"{}\" header=\"{}\" footer=\"{}\"/>",
        margins.left, margins.right, margins.top, margins.bottom, margins.header, margins.footer
    ));
}

pub(crate) fn write_page_setup(content: &mut String, setup: &PageSetup) {
    content.push_str("\n    <pageSetup");
    if let Some(paper_size) = setup.paper_size {
        content.push_str(&format!(" paperSize=\"{}\"", paper_size));
    }
    if let Some(scale) = setup.scale {
        content.push_str(&format!(" scale=\"{}\"", scale));
    }
    if let Some(first) = setup.first_page_number {
        content.push_str(&format!(" firstPageNumber=\"{}\"", first));
    }
    if let Some(width) = setup.fit_to_width {
        content.push_str(&format!(" fitToWidth=\"{}\"", width));
    }
    if let Some(height) = setup.fit_to_height {
        content.push_str(&format!(" fitToHeight=\"{}\"", height));
    }
    if setup.orientation != PageOrientation::Default {
        content.push_str(&format!(" orientation=\"{}\"", setup.orientation.as_str()));
    }
    if setup.black_and_white {
        content.push_str(" blackAndWhite=\"1\"");
    }
    if setup.draft {
        content.push_str(" draft=\"1\"");
    }
    if setup.first_page_number.is_some() {
        content.push_str(" useFirstPageNumber=\"1\"");
    }
    content.push_str("/>");
}

pub(crate) fn write_header_footer(content: &mut String, hf: &HeaderFooter) {
    content.push_str("\n    <headerFooter");
    if hf.different_odd_even {
        content.push_str(" differentOddEven=\"1\"");
    }
    if hf.different_first {
        content.push_str(" differentFirst=\"1\"");
    }

    let parts = [
        ("oddHeader", &hf.odd_header),
        ("oddFooter", &hf.odd_footer),
        ("evenHeader", &hf.even_header),
        ("evenFooter", &hf.even_footer),
        ("firstHeader", &hf.first_header),
        ("firstFooter", &hf.first_footer),
    ];
    if parts.iter().all(|(_, text)| text.is_none()) {
        content.push_str("/>");
        return;
    }

    content.push('>');
    for (tag, text) in parts {
        if let Some(text) = text {
            content.push_str(&format!(
                "\n        <{tag}>{}</{tag}>",
                escape(&encode_excel_escapes(text))
            ));
        }
    }
    content.push_str("\n    </headerFooter>");
}
