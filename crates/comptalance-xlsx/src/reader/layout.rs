//! Worksheet layout records: margins, page setup, print options,
//! header/footer and sheet view.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::XlsxResult;
use crate::xml::{attr_bool, attr_parse, attr_str, decode_excel_escapes};
use comptalance_core::{
    HeaderFooter, PageMargins, PageOrientation, PageSetup, PrintOptions, SheetView,
};

/// `<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>`
///
/// Missing attributes keep the "normal" preset value.
pub(crate) fn parse_page_margins(e: &BytesStart<'_>) -> PageMargins {
    let mut margins = PageMargins::default();

    for attr in e.attributes().flatten() {
        let Some(value) = std::str::from_utf8(&attr.value)
            .ok()
            .and_then(|s| s.trim().parse::<f64>().ok())
        else {
            continue;
        };

        match attr.key.as_ref() {
            b"left" => margins.left = value,
            b"right" => margins.right = value,
            b"top" => margins.top = value,
            b"bottom" => margins.bottom = value,
            b"header" => margins.header = value,
            b"footer" => margins.footer = value,
            _ => {}
        }
    }

    margins
}

/// `<pageSetup paperSize="9" orientation="landscape" scale="85" fitToWidth="1" fitToHeight="0"/>`
///
/// `fit_to_page` lives on `sheetPr/pageSetUpPr` and is applied by the caller.
pub(crate) fn parse_page_setup(e: &BytesStart<'_>) -> PageSetup {
    let use_first_page_number = attr_bool(e, b"useFirstPageNumber").unwrap_or(false);

    PageSetup {
        paper_size: attr_parse(e, b"paperSize"),
        orientation: attr_str(e, b"orientation")
            .map(|s| PageOrientation::parse(&s))
            .unwrap_or_default(),
        fit_to_page: false,
        scale: attr_parse(e, b"scale"),
        fit_to_width: attr_parse(e, b"fitToWidth"),
        fit_to_height: attr_parse(e, b"fitToHeight"),
        first_page_number: if use_first_page_number {
            attr_parse(e, b"firstPageNumber")
        } else {
            None
        },
        black_and_white: attr_bool(e, b"blackAndWhite").unwrap_or(false),
        draft: attr_bool(e, b"draft").unwrap_or(false),
    }
}

pub(crate) fn parse_print_options(e: &BytesStart<'_>) -> PrintOptions {
    PrintOptions {
        grid_lines: attr_bool(e, b"gridLines").unwrap_or(false),
        headings: attr_bool(e, b"headings").unwrap_or(false),
        horizontal_centered: attr_bool(e, b"horizontalCentered").unwrap_or(false),
        vertical_centered: attr_bool(e, b"verticalCentered").unwrap_or(false),
    }
}

pub(crate) fn parse_sheet_view(e: &BytesStart<'_>) -> SheetView {
    let defaults = SheetView::default();
    SheetView {
        show_grid_lines: attr_bool(e, b"showGridLines").unwrap_or(defaults.show_grid_lines),
        show_row_col_headers: attr_bool(e, b"showRowColHeaders")
            .unwrap_or(defaults.show_row_col_headers),
        zoom_scale: attr_parse(e, b"zoomScale").unwrap_or(defaults.zoom_scale),
        right_to_left: attr_bool(e, b"rightToLeft").unwrap_or(false),
        tab_selected: attr_bool(e, b"tabSelected").unwrap_or(false),
        frozen_rows: 0,
        frozen_cols: 0,
    }
}

/// `<pane xSplit="1" ySplit="2" topLeftCell="B3" state="frozen"/>`
///
/// Only frozen panes are kept; a plain split pane is a view preference
/// the sheet model does not carry.
pub(crate) fn apply_pane(e: &BytesStart<'_>, view: &mut SheetView) {
    let frozen = matches!(
        attr_str(e, b"state").as_deref(),
        Some("frozen") | Some("frozenSplit")
    );
    if !frozen {
        return;
    }
    // split positions are written as decimals by some producers ("2.0")
    let rows = attr_parse::<f64>(e, b"ySplit").unwrap_or(0.0).max(0.0);
    let cols = attr_parse::<f64>(e, b"xSplit").unwrap_or(0.0).max(0.0);
    view.frozen_rows = rows as u32;
    view.frozen_cols = cols.min(f64::from(u16::MAX)) as u16;
}

/// Flags of the `<headerFooter>` start tag. The text children are read by
/// [`parse_header_footer_text`].
pub(crate) fn parse_header_footer_attrs(e: &BytesStart<'_>) -> HeaderFooter {
    HeaderFooter {
        different_odd_even: attr_bool(e, b"differentOddEven").unwrap_or(false),
        different_first: attr_bool(e, b"differentFirst").unwrap_or(false),
        ..HeaderFooter::default()
    }
}

/// Consume events up to `</headerFooter>`, filling the six text slots.
pub(crate) fn parse_header_footer_text<R: BufRead>(
    xml: &mut Reader<R>,
    header_footer: &mut HeaderFooter,
) -> XlsxResult<()> {
    let mut buf = Vec::new();
    let mut current: Option<Vec<u8>> = None;

    loop {
        buf.clear();
        match xml.read_event_into(&mut buf)? {
            Event::Start(e) => current = Some(e.local_name().as_ref().to_vec()),
            Event::Text(e) => {
                let Some(name) = current.as_deref() else {
                    continue;
                };
                let text = e.unescape()?;
                if let Some(slot) = text_slot(header_footer, name) {
                    slot.get_or_insert_with(String::new)
                        .push_str(&decode_excel_escapes(&text));
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                if name.as_ref() == b"headerFooter" {
                    break;
                }
                if current.as_deref() == Some(name.as_ref()) {
                    current = None;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(())
}

fn text_slot<'a>(hf: &'a mut HeaderFooter, element: &[u8]) -> Option<&'a mut Option<String>> {
    match element {
        b"oddHeader" => Some(&mut hf.odd_header),
        b"oddFooter" => Some(&mut hf.odd_footer),
        b"evenHeader" => Some(&mut hf.even_header),
        b"evenFooter" => Some(&mut hf.even_footer),
        b"firstHeader" => Some(&mut hf.first_header),
        b"firstFooter" => Some(&mut hf.first_footer),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn element(xml: &str) -> BytesStart<'static> {
        let mut reader = Reader::from_str(xml);
        loop {
            match reader.read_event().unwrap() {
                Event::Empty(e) | Event::Start(e) => return e.into_owned(),
                Event::Eof => panic!("no element in {xml}"),
                _ => {}
            }
        }
    }

    #[test]
    fn test_parse_page_margins() {
        let e = element(
            r#"<pageMargins left="0.25" right="0.25" top="0.5" bottom="0.5" header="0.1" footer="0.2"/>"#,
        );
        assert_eq!(
            parse_page_margins(&e),
            PageMargins {
                left: 0.25,
                right: 0.25,
                top: 0.5,
                bottom: 0.5,
                header: 0.1,
                footer: 0.2,
            }
        );
    }

    #[test]
    fn test_partial_page_margins_keep_preset() {
        let e = element(r#"<pageMargins left="1"/>"#);
        let margins = parse_page_margins(&e);
        assert_eq!(margins.left, 1.0);
        assert_eq!(margins.top, 0.75);
    }

    #[test]
    fn test_parse_page_setup() {
        let e = element(
            r#"<pageSetup paperSize="9" orientation="landscape" scale="85" fitToHeight="0" useFirstPageNumber="1" firstPageNumber="3" blackAndWhite="1" r:id="rId1"/>"#,
        );
        let setup = parse_page_setup(&e);
        assert_eq!(setup.paper_size, Some(9));
        assert_eq!(setup.orientation, PageOrientation::Landscape);
        assert_eq!(setup.scale, Some(85));
        assert_eq!(setup.fit_to_width, None);
        assert_eq!(setup.fit_to_height, Some(0));
        assert_eq!(setup.first_page_number, Some(3));
        assert!(setup.black_and_white);
        assert!(!setup.draft);
    }

    #[test]
    fn test_first_page_number_needs_flag() {
        let e = element(r#"<pageSetup firstPageNumber="5"/>"#);
        assert_eq!(parse_page_setup(&e).first_page_number, None);
    }

    #[test]
    fn test_parse_print_options() {
        let e = element(r#"<printOptions horizontalCentered="1" gridLines="true"/>"#);
        assert_eq!(
            parse_print_options(&e),
            PrintOptions {
                grid_lines: true,
                headings: false,
                horizontal_centered: true,
                vertical_centered: false,
            }
        );
    }

    #[test]
    fn test_sheet_view_with_frozen_pane() {
        let mut view = parse_sheet_view(&element(
            r#"<sheetView showGridLines="0" zoomScale="85" tabSelected="1" workbookViewId="0">"#,
        ));
        apply_pane(
            &element(r#"<pane xSplit="1" ySplit="3" topLeftCell="B4" activePane="bottomRight" state="frozen"/>"#),
            &mut view,
        );

        assert!(!view.show_grid_lines);
        assert!(view.show_row_col_headers);
        assert_eq!(view.zoom_scale, 85);
        assert!(view.tab_selected);
        assert_eq!(view.frozen_rows, 3);
        assert_eq!(view.frozen_cols, 1);
    }

    #[test]
    fn test_split_pane_is_not_frozen() {
        let mut view = SheetView::default();
        apply_pane(&element(r#"<pane xSplit="2400" ySplit="1200"/>"#), &mut view);
        assert!(!view.has_frozen_pane());
    }

    #[test]
    fn test_parse_header_footer() {
        let xml = r#"<headerFooter differentFirst="1"><oddHeader>&amp;C&amp;"Arial,Gras"Bilan</oddHeader><oddFooter>&amp;CPage &amp;P / &amp;N</oddFooter><firstHeader>Couverture</firstHeader></headerFooter><after/>"#;
        let mut reader = Reader::from_str(xml);
        let start = match reader.read_event().unwrap() {
            Event::Start(e) => e.into_owned(),
            other => panic!("unexpected {other:?}"),
        };

        let mut hf = parse_header_footer_attrs(&start);
        parse_header_footer_text(&mut reader, &mut hf).unwrap();

        assert!(hf.different_first);
        assert!(!hf.different_odd_even);
        assert_eq!(hf.odd_header.as_deref(), Some("&C&\"Arial,Gras\"Bilan"));
        assert_eq!(hf.odd_footer.as_deref(), Some("&CPage &P / &N"));
        assert_eq!(hf.first_header.as_deref(), Some("Couverture"));
        assert_eq!(hf.even_header, None);

        // the reader is left just after </headerFooter>
        match reader.read_event().unwrap() {
            Event::Empty(e) => assert_eq!(e.name().as_ref(), b"after"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
