//! End-to-end tests for formatting and layout of merged balances
//! (build -> save -> load -> merge -> save -> load -> verify)

use comptalance::prelude::*;
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn round_trip(workbook: &Workbook) -> Workbook {
    let mut buf = Vec::new();
    XlsxWriter::write(workbook, Cursor::new(&mut buf)).unwrap();
    XlsxReader::read(Cursor::new(&buf)).unwrap()
}

fn header_style() -> Style {
    let mut style = Style::new()
        .bold(true)
        .font_name("Arial")
        .font_size(10.0)
        .font_color(Color::WHITE)
        .fill_color(Color::Theme {
            index: 4,
            tint: -0.249977111117893,
        })
        .border(BorderStyle::outline(BorderLineStyle::Thin, Color::BLACK))
        .horizontal_alignment(HorizontalAlignment::Center)
        .wrap_text(true);
    style.alignment.vertical = VerticalAlignment::Center;
    style
}

fn amount_style() -> Style {
    Style::new()
        .number_format("#,##0.00 ;[Red]-#,##0.00 ")
        .protection(Protection::unlocked())
}

/// A balance as an accountant's export would look
fn balance_workbook() -> Workbook {
    let mut workbook = Workbook::empty();
    let index = workbook.add_worksheet_with_name("Balance générale").unwrap();
    let sheet = workbook.worksheet_mut(index).unwrap();

    sheet.set_cell_value("A1", "Balance générale au 31/12/2024").unwrap();
    sheet
        .merge_cells(&CellRange::parse("A1:D1").unwrap())
        .unwrap();
    for (col, title) in ["Compte", "Libellé", "Débit", "Crédit"].iter().enumerate() {
        sheet.set_cell_value_at(1, col as u16, *title).unwrap();
        sheet.set_cell_style_at(1, col as u16, &header_style()).unwrap();
    }
    let lines = [
        ("401000", "Fournisseurs", 0.0, 12500.4),
        ("411000", "Clients", 20310.0, 0.0),
        ("512000", "Banque", 8421.17, 0.0),
    ];
    for (i, (account, label, debit, credit)) in lines.iter().enumerate() {
        let row = 2 + i as u32;
        sheet.set_cell_value_at(row, 0, *account).unwrap();
        sheet.set_cell_value_at(row, 1, *label).unwrap();
        sheet.set_cell_value_at(row, 2, *debit).unwrap();
        sheet.set_cell_value_at(row, 3, *credit).unwrap();
        sheet.set_cell_style_at(row, 2, &amount_style()).unwrap();
        sheet.set_cell_style_at(row, 3, &amount_style()).unwrap();
    }
    sheet.set_cell_formula("C6", "SUM(C3:C5)").unwrap();
    sheet.set_cell_formula("D6", "SUM(D3:D5)").unwrap();
    // styled but empty: keeps its border after the copy
    sheet
        .set_cell_style(
            "B6",
            &Style::new().border(BorderStyle::new().with_top(BorderLineStyle::Double, Color::BLACK)),
        )
        .unwrap();

    sheet.set_default_column_width(10.0);
    sheet.set_column_width(0, 12.0);
    sheet.set_column_width(1, 38.5);
    sheet.set_column_hidden(4, true);
    sheet.set_row_height(0, 28.5);
    sheet.set_row_hidden(6, true);

    let layout = sheet.layout_mut();
    layout.page_setup = Some(PageSetup {
        paper_size: Some(9),
        orientation: PageOrientation::Landscape,
        fit_to_page: true,
        fit_to_width: Some(1),
        fit_to_height: Some(0),
        ..PageSetup::default()
    });
    layout.page_margins = Some(PageMargins {
        left: 0.4,
        right: 0.4,
        top: 0.6,
        bottom: 0.6,
        header: 0.3,
        footer: 0.3,
    });
    layout.header_footer = Some(HeaderFooter {
        odd_header: Some("&C&\"Arial,Gras\"Balance générale".into()),
        odd_footer: Some("&LCabinet & associés&RPage &P / &N".into()),
        ..HeaderFooter::default()
    });
    layout.print_options = Some(PrintOptions {
        horizontal_centered: true,
        grid_lines: true,
        ..PrintOptions::default()
    });
    layout.sheet_view = Some(SheetView {
        show_grid_lines: false,
        zoom_scale: 85,
        frozen_rows: 2,
        frozen_cols: 1,
        ..SheetView::default()
    });

    workbook
}

fn merged_template() -> (Workbook, Workbook) {
    let balance = round_trip(&balance_workbook());
    let mut template = Workbook::empty();
    template.add_worksheet_with_name("Bilan").unwrap();
    template.add_worksheet_with_name("Compte de résultat").unwrap();

    merge_balances(&mut template, Some(&balance), Some(&balance)).unwrap();
    (round_trip(&template), balance)
}

#[test]
fn test_styles_survive_merge_and_save() {
    let (merged, _) = merged_template();
    let sheet = merged.worksheet_by_name(BALANCE_N_SHEET).unwrap();

    assert_eq!(sheet.cell_style("B2").unwrap(), Some(&header_style()));
    assert_eq!(sheet.cell_style("D5").unwrap(), Some(&amount_style()));
    assert_eq!(
        sheet.cell_style("B6").unwrap().unwrap().border.top,
        Some(BorderEdge::new(BorderLineStyle::Double, Color::BLACK))
    );
    assert!(sheet.cell_style("A3").unwrap().unwrap().is_default());
}

#[test]
fn test_values_survive_merge_and_save() {
    let (merged, balance) = merged_template();
    let source = balance.worksheet(0).unwrap();

    for name in [BALANCE_N_SHEET, BALANCE_N1_SHEET] {
        let sheet = merged.worksheet_by_name(name).unwrap();
        assert_eq!(sheet.cell_count(), source.cell_count(), "{name}");
        for (row, col, data) in source.iter_cells() {
            assert_eq!(sheet.get_value_at(row, col), data.value, "{name} {row}:{col}");
        }
    }
    let sheet = merged.worksheet_by_name(BALANCE_N_SHEET).unwrap();
    assert_eq!(sheet.get_value("D6").unwrap(), CellValue::formula("SUM(D3:D5)"));
    assert_eq!(sheet.get_value("C5").unwrap(), CellValue::Number(8421.17));
}

#[test]
fn test_dimensions_and_merges_survive() {
    let (merged, _) = merged_template();
    let sheet = merged.worksheet_by_name(BALANCE_N1_SHEET).unwrap();

    assert_eq!(sheet.default_column_width(), 10.0);
    assert_eq!(sheet.column_width(0), 12.0);
    assert_eq!(sheet.column_width(1), 38.5);
    assert_eq!(sheet.column_width(2), 10.0);
    assert!(sheet.is_column_hidden(4));
    assert!(!sheet.is_column_hidden(3));
    assert_eq!(sheet.row_height(0), 28.5);
    assert!(sheet.is_row_hidden(6));
    assert_eq!(
        sheet.merged_regions(),
        &[CellRange::parse("A1:D1").unwrap()]
    );
}

#[test]
fn test_layout_survives() {
    let (merged, balance) = merged_template();
    let expected = balance.worksheet(0).unwrap().layout();
    let layout = merged.worksheet_by_name(BALANCE_N_SHEET).unwrap().layout();

    assert_eq!(layout.page_setup, expected.page_setup);
    assert_eq!(layout.page_margins, expected.page_margins);
    assert_eq!(layout.header_footer, expected.header_footer);
    assert_eq!(layout.print_options, expected.print_options);

    let view = layout.sheet_view.unwrap();
    assert!(!view.show_grid_lines);
    assert_eq!(view.zoom_scale, 85);
    assert_eq!((view.frozen_rows, view.frozen_cols), (2, 1));
    assert!(!view.tab_selected);
}

#[test]
fn test_template_sheets_and_active_tab_kept() {
    let (merged, _) = merged_template();

    assert_eq!(
        merged.sheet_names(),
        vec!["Bilan", "Compte de résultat", BALANCE_N_SHEET, BALANCE_N1_SHEET]
    );
    assert_eq!(merged.active_sheet(), 0);
    assert!(merged.worksheet_by_name("Bilan").unwrap().is_empty());
}

#[test]
fn test_sheet_without_layout_gets_none() {
    let mut plain = Workbook::new();
    plain
        .worksheet_mut(0)
        .unwrap()
        .set_cell_value("A1", 1.0)
        .unwrap();
    let mut template = Workbook::new();
    template.add_worksheet_with_name("Annexe").unwrap();
    template.set_active_sheet(1).unwrap();

    merge_balances(&mut template, Some(&plain), None).unwrap();
    let merged = round_trip(&template);

    let layout = merged.worksheet_by_name(BALANCE_N_SHEET).unwrap().layout();
    assert_eq!(layout.sheet_view, None);
    assert_eq!(layout.header_footer, None);
    assert_eq!(layout.page_setup, None);
}
