//! `xl/styles.xml`: the workbook-wide formatting tables
//!
//! On disk every cell points at one `cellXfs` entry, which in turn points
//! at shared font, fill, border and number format records. In memory each
//! worksheet owns a pool of complete [`Style`] values. Reading flattens the
//! indirection; writing rebuilds it, deduplicating across all sheets.
//!
//! Conditional formats reference the separate `dxfs` table by position.

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::XlsxResult;
use crate::xml::{attr_bool, attr_parse, attr_str, bool_attr, escape};
use comptalance_core::style::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, DiagonalDirection,
    DifferentialFont, DifferentialStyle, FillStyle, FontStyle, FontVerticalAlign,
    HorizontalAlignment, NumberFormat, PatternType, Protection, ReadingOrder, Style, Underline,
    VerticalAlignment, FIRST_CUSTOM_FORMAT_ID,
};
use comptalance_core::Workbook;

// === Writing ===

/// Workbook-wide `cellXfs` table plus the per-sheet index translation
#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Position is the `xf` id; 0 is the default style
    styles: Vec<Style>,
    /// Per sheet: local pool index -> global xf id
    sheet_maps: Vec<HashMap<u32, u32>>,
    /// Position is the `dxfId`
    dxfs: Vec<DifferentialStyle>,
}

struct XfIds {
    num_fmt: u32,
    font: u32,
    fill: u32,
    border: u32,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut styles = vec![Style::default()];
        let mut by_style: HashMap<Style, u32> = HashMap::new();
        by_style.insert(Style::default(), 0);

        let sheet_maps = workbook
            .worksheets()
            .map(|sheet| {
                let mut map = HashMap::new();
                for (local, style) in sheet.style_pool().iter() {
                    let xf = *by_style.entry(style.clone()).or_insert_with(|| {
                        styles.push(style.clone());
                        (styles.len() - 1) as u32
                    });
                    map.insert(local, xf);
                }
                map
            })
            .collect();

        let mut dxfs: Vec<DifferentialStyle> = Vec::new();
        let formats = workbook
            .worksheets()
            .flat_map(|sheet| sheet.conditional_formats())
            .filter_map(|rule| rule.format.as_ref());
        for format in formats {
            if !dxfs.contains(format) {
                dxfs.push(format.clone());
            }
        }

        Self {
            styles,
            sheet_maps,
            dxfs,
        }
    }

    pub(crate) fn xf_id_for(&self, sheet_index: usize, local_style_index: u32) -> u32 {
        self.sheet_maps
            .get(sheet_index)
            .and_then(|m| m.get(&local_style_index).copied())
            .unwrap_or(0)
    }

    pub(crate) fn dxf_id_for(&self, format: &DifferentialStyle) -> Option<u32> {
        self.dxfs.iter().position(|d| d == format).map(|i| i as u32)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut fonts = Interner::new(FontStyle::default());
        let mut fills = Interner::new(FillStyle::None);
        fills.insert(FillStyle::pattern(
            PatternType::Gray125,
            Color::Auto,
            Color::Auto,
        ));
        let mut borders = Interner::new(BorderStyle::default());
        let mut num_fmts: Vec<(u32, String)> = Vec::new();

        let ids: Vec<XfIds> = self
            .styles
            .iter()
            .map(|style| XfIds {
                num_fmt: num_fmt_id(&style.number_format, &mut num_fmts),
                font: fonts.insert(style.font.clone()),
                fill: fills.insert(style.fill.clone()),
                border: borders.insert(style.border.clone()),
            })
            .collect();
        let dxf_num_fmts: Vec<Option<u32>> = self
            .dxfs
            .iter()
            .map(|dxf| {
                dxf.number_format
                    .as_ref()
                    .map(|format| num_fmt_id(format, &mut num_fmts))
            })
            .collect();

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        if !num_fmts.is_empty() {
            xml.push_str(&format!("\n  <numFmts count=\"{}\">", num_fmts.len()));
            for (id, code) in &num_fmts {
                xml.push_str(&format!(
                    "\n    <numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                    id,
                    escape(code)
                ));
            }
            xml.push_str("\n  </numFmts>");
        }

        xml.push_str(&format!("\n  <fonts count=\"{}\">", fonts.items.len()));
        for font in &fonts.items {
            xml.push_str("\n    ");
            xml.push_str(&write_font(font));
        }
        xml.push_str("\n  </fonts>");

        xml.push_str(&format!("\n  <fills count=\"{}\">", fills.items.len()));
        for fill in &fills.items {
            xml.push_str("\n    ");
            xml.push_str(&write_fill(fill));
        }
        xml.push_str("\n  </fills>");

        xml.push_str(&format!("\n  <borders count=\"{}\">", borders.items.len()));
        for border in &borders.items {
            xml.push_str("\n    ");
            xml.push_str(&write_border(border));
        }
        xml.push_str("\n  </borders>");

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.styles.len()));
        for (style, ids) in self.styles.iter().zip(&ids) {
            xml.push_str("\n    ");
            xml.push_str(&write_xf(style, ids));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>"#,
        );

        if self.dxfs.is_empty() {
            xml.push_str("\n  <dxfs count=\"0\"/>");
        } else {
            xml.push_str(&format!("\n  <dxfs count=\"{}\">", self.dxfs.len()));
            for (dxf, num_fmt) in self.dxfs.iter().zip(&dxf_num_fmts) {
                xml.push_str("\n    ");
                xml.push_str(&write_dxf(dxf, *num_fmt));
            }
            xml.push_str("\n  </dxfs>");
        }
        xml.push_str("\n</styleSheet>");
        xml
    }
}

/// Insertion-ordered dedup of one record kind
struct Interner<T> {
    items: Vec<T>,
    ids: HashMap<T, u32>,
}

impl<T: Clone + Eq + std::hash::Hash> Interner<T> {
    fn new(first: T) -> Self {
        let mut interner = Self {
            items: Vec::new(),
            ids: HashMap::new(),
        };
        interner.insert(first);
        interner
    }

    fn insert(&mut self, item: T) -> u32 {
        if let Some(&id) = self.ids.get(&item) {
            return id;
        }
        let id = self.items.len() as u32;
        self.items.push(item.clone());
        self.ids.insert(item, id);
        id
    }
}

fn num_fmt_id(format: &NumberFormat, custom: &mut Vec<(u32, String)>) -> u32 {
    if let Some(id) = format.builtin_id() {
        return id;
    }
    let code = format.format_code();
    if let Some((id, _)) = custom.iter().find(|(_, c)| *c == code) {
        return *id;
    }
    let id = FIRST_CUSTOM_FORMAT_ID + custom.len() as u32;
    custom.push((id, code.into_owned()));
    id
}

/// Color attributes without the element name, e.g. ` theme="4" tint="0.4"`
pub(crate) fn color_attrs(color: &Color) -> String {
    match color {
        Color::Auto => " auto=\"1\"".to_string(),
        Color::Argb { a, r, g, b } => format!(" rgb=\"{:02X}{:02X}{:02X}{:02X}\"", a, r, g, b),
        Color::Theme { index, tint } if *tint == 0.0 => format!(" theme=\"{}\"", index),
        Color::Theme { index, tint } => format!(" theme=\"{}\" tint=\"{}\"", index, tint),
        Color::Indexed(i) => format!(" indexed=\"{}\"", i),
    }
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    if let Some(val) = font.underline.as_xml_value() {
        s.push_str(&format!("<u val=\"{}\"/>", val));
    }
    match font.vertical_align {
        FontVerticalAlign::Baseline => {}
        FontVerticalAlign::Superscript => s.push_str("<vertAlign val=\"superscript\"/>"),
        FontVerticalAlign::Subscript => s.push_str("<vertAlign val=\"subscript\"/>"),
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if !font.color.is_auto() {
        s.push_str(&format!("<color{}/>", color_attrs(&font.color)));
    }
    s.push_str(&format!("<name val=\"{}\"/>", escape(&font.name)));
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Solid { color } => format!(
            "<fill><patternFill patternType=\"solid\"><fgColor{}/><bgColor indexed=\"64\"/></patternFill></fill>",
            color_attrs(color)
        ),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => {
            let mut s = format!("<fill><patternFill patternType=\"{}\"", pattern.as_str());
            if foreground.is_auto() && background.is_auto() {
                s.push_str("/></fill>");
                return s;
            }
            s.push('>');
            if !foreground.is_auto() {
                s.push_str(&format!("<fgColor{}/>", color_attrs(foreground)));
            }
            if !background.is_auto() {
                s.push_str(&format!("<bgColor{}/>", color_attrs(background)));
            }
            s.push_str("</patternFill></fill>");
            s
        }
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    match edge {
        Some(edge) if edge.style != BorderLineStyle::None => format!(
            "<{tag} style=\"{}\"><color{}/></{tag}>",
            edge.style.as_str(),
            color_attrs(&edge.color)
        ),
        _ => format!("<{tag}/>"),
    }
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border");
    if border.diagonal_direction.is_up() {
        s.push_str(" diagonalUp=\"1\"");
    }
    if border.diagonal_direction.is_down() {
        s.push_str(" diagonalDown=\"1\"");
    }
    s.push('>');
    s.push_str(&write_border_edge("left", &border.left));
    s.push_str(&write_border_edge("right", &border.right));
    s.push_str(&write_border_edge("top", &border.top));
    s.push_str(&write_border_edge("bottom", &border.bottom));
    s.push_str(&write_border_edge("diagonal", &border.diagonal));
    s.push_str("</border>");
    s
}

/// Child order inside `<dxf>`: font, numFmt, fill, border
fn write_dxf(dxf: &DifferentialStyle, num_fmt: Option<u32>) -> String {
    let mut s = String::from("<dxf>");
    if let Some(font) = &dxf.font {
        s.push_str(&write_dxf_font(font));
    }
    if let (Some(format), Some(id)) = (&dxf.number_format, num_fmt) {
        s.push_str(&format!(
            "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
            id,
            escape(&format.format_code())
        ));
    }
    match &dxf.fill {
        // a dxf paints solid fills with bgColor
        Some(FillStyle::Solid { color }) => s.push_str(&format!(
            "<fill><patternFill><bgColor{}/></patternFill></fill>",
            color_attrs(color)
        )),
        Some(fill) => s.push_str(&write_fill(fill)),
        None => {}
    }
    if let Some(border) = &dxf.border {
        s.push_str(&write_border(border));
    }
    s.push_str("</dxf>");
    s
}

fn write_dxf_font(font: &DifferentialFont) -> String {
    let flag = |tag: &str, value: Option<bool>| match value {
        Some(true) => format!("<{tag}/>"),
        Some(false) => format!("<{tag} val=\"0\"/>"),
        None => String::new(),
    };
    let mut s = String::from("<font>");
    s.push_str(&flag("b", font.bold));
    s.push_str(&flag("i", font.italic));
    s.push_str(&flag("strike", font.strikethrough));
    if let Some(underline) = font.underline {
        s.push_str(&format!(
            "<u val=\"{}\"/>",
            underline.as_xml_value().unwrap_or("none")
        ));
    }
    if let Some(color) = &font.color {
        s.push_str(&format!("<color{}/>", color_attrs(color)));
    }
    s.push_str("</font>");
    s
}

fn write_alignment(al: &Alignment) -> Option<String> {
    if al.is_default() {
        return None;
    }
    let default = Alignment::default();
    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.as_str()));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.as_str()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    if al.reading_order != ReadingOrder::Context {
        s.push_str(&format!(" readingOrder=\"{}\"", al.reading_order.as_u8()));
    }
    s.push_str("/>");
    Some(s)
}

fn write_protection(p: &Protection) -> Option<String> {
    if *p == Protection::default() {
        return None;
    }
    Some(format!(
        "<protection locked=\"{}\" hidden=\"{}\"/>",
        bool_attr(p.locked),
        bool_attr(p.hidden)
    ))
}

fn write_xf(style: &Style, ids: &XfIds) -> String {
    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"",
        ids.num_fmt, ids.font, ids.fill, ids.border
    );
    if ids.num_fmt != 0 {
        s.push_str(" applyNumberFormat=\"1\"");
    }
    if ids.font != 0 {
        s.push_str(" applyFont=\"1\"");
    }
    if ids.fill != 0 {
        s.push_str(" applyFill=\"1\"");
    }
    if ids.border != 0 {
        s.push_str(" applyBorder=\"1\"");
    }

    let alignment = write_alignment(&style.alignment);
    let protection = write_protection(&style.protection);
    if alignment.is_some() {
        s.push_str(" applyAlignment=\"1\"");
    }
    if protection.is_some() {
        s.push_str(" applyProtection=\"1\"");
    }
    if alignment.is_none() && protection.is_none() {
        s.push_str("/>");
        return s;
    }

    s.push('>');
    s.push_str(alignment.as_deref().unwrap_or_default());
    s.push_str(protection.as_deref().unwrap_or_default());
    s.push_str("</xf>");
    s
}

// === Reading ===

/// Section of the stylesheet the parser is inside. Fonts, fills and
/// borders also appear under `dxfs`, where they belong to one `<dxf>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Section {
    #[default]
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
    Dxfs,
}

/// Everything `styles.xml` contributes to the model
#[derive(Debug, Default)]
pub(crate) struct StyleSheet {
    /// One resolved style per `cellXfs` entry, never empty
    pub(crate) cell_styles: Vec<Style>,
    /// Conditional format overlays, indexed by `dxfId`
    pub(crate) dxfs: Vec<DifferentialStyle>,
}

#[derive(Debug, Default)]
struct RawXf {
    num_fmt: u32,
    font: usize,
    fill: usize,
    border: usize,
    alignment: Alignment,
    protection: Protection,
}

#[derive(Debug, Default)]
struct PendingFill {
    pattern: Option<String>,
    fg: Color,
    bg: Color,
}

#[derive(Debug, Default)]
struct StyleParser {
    section: Section,

    num_fmts: HashMap<u32, String>,
    fonts: Vec<FontStyle>,
    fills: Vec<FillStyle>,
    borders: Vec<BorderStyle>,
    xfs: Vec<RawXf>,
    dxfs: Vec<DifferentialStyle>,

    font: Option<FontStyle>,
    fill: Option<PendingFill>,
    border: Option<BorderStyle>,
    edge: Option<&'static str>,
    xf: Option<RawXf>,
    dxf: Option<DifferentialStyle>,
}

impl StyleParser {
    fn open(&mut self, e: &BytesStart<'_>) {
        let name = e.name();
        match (self.section, name.as_ref()) {
            (Section::Dxfs, b"numFmt") => {
                if let Some(dxf) = self.dxf.as_mut() {
                    let id = attr_parse::<u32>(e, b"numFmtId").unwrap_or(0);
                    dxf.number_format = Some(match attr_str(e, b"formatCode") {
                        Some(code) if id >= FIRST_CUSTOM_FORMAT_ID => NumberFormat::Custom(code),
                        _ => NumberFormat::from_builtin_id(id),
                    });
                }
            }
            (_, b"numFmt") => {
                if let (Some(id), Some(code)) = (
                    attr_parse::<u32>(e, b"numFmtId"),
                    attr_str(e, b"formatCode"),
                ) {
                    self.num_fmts.insert(id, code);
                }
            }
            (_, b"fonts") => self.section = Section::Fonts,
            (_, b"fills") => self.section = Section::Fills,
            (_, b"borders") => self.section = Section::Borders,
            (_, b"cellXfs") => self.section = Section::CellXfs,
            (_, b"dxfs") => self.section = Section::Dxfs,
            (_, b"cellStyleXfs") => self.section = Section::Other,

            (Section::Fonts, b"font") => {
                self.font = Some(FontStyle {
                    name: String::new(),
                    ..FontStyle::default()
                })
            }
            (Section::Fonts, tag) => {
                if let Some(font) = self.font.as_mut() {
                    apply_font_property(font, tag, e);
                }
            }

            (Section::Dxfs, b"dxf") => self.dxf = Some(DifferentialStyle::default()),
            (Section::Dxfs, b"font") => {
                if let Some(dxf) = self.dxf.as_mut() {
                    dxf.font = Some(DifferentialFont::default());
                }
            }

            (Section::Fills | Section::Dxfs, b"fill") => self.fill = Some(PendingFill::default()),
            (Section::Fills | Section::Dxfs, b"patternFill") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.pattern = attr_str(e, b"patternType");
                }
            }
            (Section::Fills | Section::Dxfs, b"fgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.fg = parse_color(e);
                }
            }
            (Section::Fills | Section::Dxfs, b"bgColor") => {
                if let Some(fill) = self.fill.as_mut() {
                    fill.bg = parse_color(e);
                }
            }

            (Section::Borders | Section::Dxfs, b"border") => {
                self.border = Some(BorderStyle {
                    diagonal_direction: DiagonalDirection::from_flags(
                        attr_bool(e, b"diagonalUp").unwrap_or(false),
                        attr_bool(e, b"diagonalDown").unwrap_or(false),
                    ),
                    ..BorderStyle::default()
                })
            }
            (
                Section::Borders | Section::Dxfs,
                tag @ (b"left" | b"right" | b"top" | b"bottom" | b"diagonal"),
            ) => {
                let name = edge_name(tag);
                if let Some(border) = self.border.as_mut() {
                    let style = attr_str(e, b"style")
                        .map(|s| BorderLineStyle::parse(&s))
                        .unwrap_or_default();
                    if style != BorderLineStyle::None {
                        *edge_mut(border, name) = Some(BorderEdge::new(style, Color::Auto));
                    }
                }
                self.edge = Some(name);
            }
            (Section::Borders | Section::Dxfs, b"color") if self.edge.is_some() => {
                if let (Some(border), Some(name)) = (self.border.as_mut(), self.edge) {
                    if let Some(edge) = edge_mut(border, name).as_mut() {
                        edge.color = parse_color(e);
                    }
                }
            }
            (Section::Dxfs, tag) => {
                if let Some(font) = self.dxf.as_mut().and_then(|d| d.font.as_mut()) {
                    apply_dxf_font_property(font, tag, e);
                }
            }

            (Section::CellXfs, b"xf") => {
                self.xf = Some(RawXf {
                    num_fmt: attr_parse(e, b"numFmtId").unwrap_or(0),
                    font: attr_parse(e, b"fontId").unwrap_or(0),
                    fill: attr_parse(e, b"fillId").unwrap_or(0),
                    border: attr_parse(e, b"borderId").unwrap_or(0),
                    ..RawXf::default()
                })
            }
            (Section::CellXfs, b"alignment") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.alignment = parse_alignment(e);
                }
            }
            (Section::CellXfs, b"protection") => {
                if let Some(xf) = self.xf.as_mut() {
                    xf.protection.locked = attr_bool(e, b"locked").unwrap_or(true);
                    xf.protection.hidden = attr_bool(e, b"hidden").unwrap_or(false);
                }
            }
            _ => {}
        }
    }

    fn close(&mut self, tag: &[u8]) {
        let in_dxf = self.section == Section::Dxfs;
        match tag {
            b"fonts" | b"fills" | b"borders" | b"cellXfs" | b"cellStyleXfs" | b"dxfs" => {
                self.section = Section::Other
            }
            b"font" => self.fonts.extend(self.font.take()),
            b"fill" => {
                let fill = self.fill.take();
                match (in_dxf, self.dxf.as_mut()) {
                    (true, Some(dxf)) => dxf.fill = fill.map(finish_dxf_fill),
                    (true, None) => {}
                    (false, _) => self.fills.extend(fill.map(finish_fill)),
                }
            }
            b"border" => {
                let border = self.border.take();
                match (in_dxf, self.dxf.as_mut()) {
                    (true, Some(dxf)) => dxf.border = border,
                    (true, None) => {}
                    (false, _) => self.borders.extend(border),
                }
            }
            b"left" | b"right" | b"top" | b"bottom" | b"diagonal" => self.edge = None,
            b"xf" => self.xfs.extend(self.xf.take()),
            b"dxf" => self.dxfs.extend(self.dxf.take()),
            _ => {}
        }
    }

    fn finish(self) -> StyleSheet {
        let StyleParser {
            num_fmts,
            fonts,
            fills,
            borders,
            xfs,
            dxfs,
            ..
        } = self;

        let mut cell_styles = xfs
            .into_iter()
            .map(|raw| Style {
                font: fonts.get(raw.font).cloned().unwrap_or_default(),
                fill: fills.get(raw.fill).cloned().unwrap_or_default(),
                border: borders.get(raw.border).cloned().unwrap_or_default(),
                number_format: match num_fmts.get(&raw.num_fmt) {
                    Some(code) => NumberFormat::Custom(code.clone()),
                    None if raw.num_fmt >= FIRST_CUSTOM_FORMAT_ID => NumberFormat::General,
                    None => NumberFormat::from_builtin_id(raw.num_fmt),
                },
                alignment: raw.alignment,
                protection: raw.protection,
            })
            .collect::<Vec<_>>();

        if cell_styles.is_empty() {
            cell_styles.push(Style::default());
        }
        StyleSheet { cell_styles, dxfs }
    }
}

/// Read `styles.xml` into resolved cell styles and differential formats
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<StyleSheet> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut parser = StyleParser::default();

    loop {
        buf.clear();
        match xml_reader.read_event_into(&mut buf)? {
            Event::Start(e) => parser.open(&e),
            // self-closing elements never see an End event
            Event::Empty(e) => {
                parser.open(&e);
                parser.close(e.name().as_ref());
            }
            Event::End(e) => parser.close(e.name().as_ref()),
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(parser.finish())
}

fn apply_font_property(font: &mut FontStyle, tag: &[u8], e: &BytesStart<'_>) {
    // <b/> means on; <b val="0"/> means off
    let flag = || attr_bool(e, b"val").unwrap_or(true);
    match tag {
        b"b" => font.bold = flag(),
        b"i" => font.italic = flag(),
        b"strike" => font.strikethrough = flag(),
        b"u" => {
            font.underline = attr_str(e, b"val")
                .map(|v| Underline::from_xml_value(&v))
                .unwrap_or(Underline::Single)
        }
        b"vertAlign" => {
            font.vertical_align = match attr_str(e, b"val").as_deref() {
                Some("superscript") => FontVerticalAlign::Superscript,
                Some("subscript") => FontVerticalAlign::Subscript,
                _ => FontVerticalAlign::Baseline,
            }
        }
        b"sz" => {
            if let Some(size) = attr_parse(e, b"val") {
                font.size = size;
            }
        }
        b"name" | b"rFont" => {
            if let Some(name) = attr_str(e, b"val") {
                font.name = name;
            }
        }
        b"color" => font.color = parse_color(e),
        _ => {}
    }
}

fn apply_dxf_font_property(font: &mut DifferentialFont, tag: &[u8], e: &BytesStart<'_>) {
    let flag = || Some(attr_bool(e, b"val").unwrap_or(true));
    match tag {
        b"b" => font.bold = flag(),
        b"i" => font.italic = flag(),
        b"strike" => font.strikethrough = flag(),
        b"u" => {
            font.underline = Some(
                attr_str(e, b"val")
                    .map(|v| Underline::from_xml_value(&v))
                    .unwrap_or(Underline::Single),
            )
        }
        b"color" => font.color = Some(parse_color(e)),
        _ => {}
    }
}

fn finish_fill(fill: PendingFill) -> FillStyle {
    match fill.pattern.as_deref() {
        None | Some("none") => FillStyle::None,
        Some("solid") => FillStyle::solid(fill.fg),
        Some(other) => match PatternType::parse(other) {
            Some(pattern) => FillStyle::pattern(pattern, fill.fg, fill.bg),
            None => FillStyle::None,
        },
    }
}

/// A dxf usually omits `patternType` and carries the solid color in `bgColor`
fn finish_dxf_fill(fill: PendingFill) -> FillStyle {
    match fill.pattern.as_deref() {
        None | Some("solid") => {
            let color = if fill.bg.is_auto() { fill.fg } else { fill.bg };
            if color.is_auto() {
                FillStyle::None
            } else {
                FillStyle::solid(color)
            }
        }
        _ => finish_fill(fill),
    }
}

fn parse_alignment(e: &BytesStart<'_>) -> Alignment {
    Alignment {
        horizontal: attr_str(e, b"horizontal")
            .map(|v| HorizontalAlignment::parse(&v))
            .unwrap_or_default(),
        vertical: attr_str(e, b"vertical")
            .map(|v| VerticalAlignment::parse(&v))
            .unwrap_or_default(),
        wrap_text: attr_bool(e, b"wrapText").unwrap_or(false),
        shrink_to_fit: attr_bool(e, b"shrinkToFit").unwrap_or(false),
        indent: attr_parse(e, b"indent").unwrap_or(0),
        rotation: attr_parse(e, b"textRotation").unwrap_or(0),
        reading_order: attr_parse(e, b"readingOrder")
            .map(ReadingOrder::from_u8)
            .unwrap_or_default(),
    }
}

/// `rgb` wins over `theme`, which wins over `indexed`
pub(crate) fn parse_color(e: &BytesStart<'_>) -> Color {
    if let Some(color) = attr_str(e, b"rgb").and_then(|rgb| Color::from_hex(&rgb)) {
        return color;
    }
    if let Some(index) = attr_parse::<u8>(e, b"theme") {
        return Color::Theme {
            index,
            tint: attr_parse(e, b"tint").unwrap_or(0.0),
        };
    }
    if let Some(index) = attr_parse::<u8>(e, b"indexed") {
        return Color::Indexed(index);
    }
    Color::Auto
}

fn edge_name(tag: &[u8]) -> &'static str {
    match tag {
        b"left" => "left",
        b"right" => "right",
        b"top" => "top",
        b"bottom" => "bottom",
        _ => "diagonal",
    }
}

fn edge_mut<'a>(border: &'a mut BorderStyle, name: &str) -> &'a mut Option<BorderEdge> {
    match name {
        "left" => &mut border.left,
        "right" => &mut border.right,
        "top" => &mut border.top,
        "bottom" => &mut border.bottom,
        _ => &mut border.diagonal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const STYLES: &str = r##"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <numFmts count="1"><numFmt numFmtId="165" formatCode="#,##0.00\ &quot;€&quot;"/></numFmts>
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>
    <font><b/><i val="0"/><u/><sz val="12"/><color rgb="FF1F4E79"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><patternFill patternType="solid"><fgColor theme="4" tint="0.79998168889431442"/><bgColor indexed="64"/></patternFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border diagonalUp="1"><left style="thin"><color indexed="64"/></left><right/><top/><bottom style="double"><color auto="1"/></bottom><diagonal style="hair"/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="1" fillId="2" borderId="1"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="165" fontId="1" fillId="2" borderId="1" xfId="0" applyNumberFormat="1">
      <alignment horizontal="center" vertical="top" wrapText="1" indent="2"/>
      <protection locked="0"/>
    </xf>
    <xf numFmtId="14" fontId="0" fillId="0" borderId="0" xfId="0"/>
  </cellXfs>
  <dxfs count="1"><dxf><font><b/><color rgb="FFFF0000"/></font></dxf></dxfs>
</styleSheet>"##;

    #[test]
    fn test_read_styles() {
        let sheet = read_styles_xml(STYLES.as_bytes()).unwrap();
        let styles = &sheet.cell_styles;
        assert_eq!(styles.len(), 3);

        assert_eq!(styles[0].font.name, "Calibri");
        assert_eq!(styles[0].font.color, Color::theme(1));
        assert_eq!(styles[0].fill, FillStyle::None);

        let rich = &styles[1];
        assert!(rich.font.bold);
        assert!(!rich.font.italic);
        assert_eq!(rich.font.underline, Underline::Single);
        assert_eq!(rich.font.name, "Arial");
        assert_eq!(rich.font.color, Color::rgb(0x1F, 0x4E, 0x79));
        assert_eq!(
            rich.fill,
            FillStyle::solid(Color::Theme {
                index: 4,
                tint: 0.79998168889431442
            })
        );
        assert_eq!(
            rich.border.left,
            Some(BorderEdge::new(BorderLineStyle::Thin, Color::Indexed(64)))
        );
        assert_eq!(
            rich.border.bottom,
            Some(BorderEdge::new(BorderLineStyle::Double, Color::Auto))
        );
        assert_eq!(
            rich.border.diagonal,
            Some(BorderEdge::new(BorderLineStyle::Hair, Color::Auto))
        );
        assert_eq!(rich.border.diagonal_direction, DiagonalDirection::Up);
        assert_eq!(rich.number_format, NumberFormat::Custom("#,##0.00\\ \"€\"".into()));
        assert_eq!(rich.alignment.horizontal, HorizontalAlignment::Center);
        assert_eq!(rich.alignment.vertical, VerticalAlignment::Top);
        assert!(rich.alignment.wrap_text);
        assert_eq!(rich.alignment.indent, 2);
        assert!(!rich.protection.locked);

        assert_eq!(styles[2].number_format, NumberFormat::BuiltIn(14));

        // dxf fonts and fills stay out of the cell tables
        assert_eq!(
            sheet.dxfs,
            vec![DifferentialStyle::new().bold(true).font_color(Color::RED)]
        );
    }

    #[test]
    fn test_dxf_solid_fill_reads_bg_color() {
        let xml = r#"<styleSheet><dxfs count="2">
  <dxf><fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf>
  <dxf><numFmt numFmtId="170" formatCode="0.0%"/><border><bottom style="thin"><color auto="1"/></bottom></border></dxf>
</dxfs></styleSheet>"#;
        let sheet = read_styles_xml(xml.as_bytes()).unwrap();

        assert_eq!(sheet.cell_styles, vec![Style::default()]);
        assert_eq!(
            sheet.dxfs[0].fill,
            Some(FillStyle::solid(Color::rgb(0xFF, 0xC7, 0xCE)))
        );
        assert_eq!(
            sheet.dxfs[1].number_format,
            Some(NumberFormat::Custom("0.0%".into()))
        );
        assert_eq!(
            sheet.dxfs[1].border.as_ref().and_then(|b| b.bottom),
            Some(BorderEdge::new(BorderLineStyle::Thin, Color::Auto))
        );
    }

    #[test]
    fn test_dxfs_survive_write_and_read() {
        use comptalance_core::{ComparisonOperator, ConditionalFormatRule};

        let negative = DifferentialStyle {
            number_format: Some(NumberFormat::Custom("#,##0.00;[Red]-#,##0.00".into())),
            ..DifferentialStyle::new()
                .font_color(Color::rgb(0x9C, 0x00, 0x06))
                .fill_color(Color::rgb(0xFF, 0xC7, 0xCE))
        };
        let mut workbook = Workbook::empty();
        for name in ["A", "B"] {
            let index = workbook.add_worksheet_with_name(name).unwrap();
            let sheet = workbook.worksheet_mut(index).unwrap();
            sheet.set_cell_style("A1", &Style::new().number_format("0.000")).unwrap();
            sheet.add_conditional_format(
                ConditionalFormatRule::cell_is(ComparisonOperator::LessThan, "0")
                    .with_format(negative.clone()),
            );
        }

        let table = XlsxStyleTable::build(&workbook);
        assert_eq!(table.dxf_id_for(&negative), Some(0));
        assert_eq!(table.dxf_id_for(&DifferentialStyle::new().bold(true)), None);

        let xml = table.to_styles_xml();
        // cell format takes the first custom id, the dxf one the next
        assert!(xml.contains(&format!(
            "numFmtId=\"{}\" formatCode=\"0.000\"",
            FIRST_CUSTOM_FORMAT_ID
        )));
        let sheet = read_styles_xml(xml.as_bytes()).unwrap();
        assert_eq!(sheet.dxfs, vec![negative]);
    }

    #[test]
    fn test_styles_survive_write_and_read() {
        let mut workbook = Workbook::empty();
        let index = workbook.add_worksheet_with_name("S").unwrap();
        let sheet = workbook.worksheet_mut(index).unwrap();

        let heading = Style::new()
            .bold(true)
            .font_color(Color::Theme {
                index: 0,
                tint: -0.499984740745262,
            })
            .fill_color(Color::rgb(0x2F, 0x54, 0x96))
            .border(BorderStyle::outline(BorderLineStyle::Medium, Color::BLACK))
            .horizontal_alignment(HorizontalAlignment::Center)
            .number_format("#,##0.00 ;[Red]-#,##0.00 ");
        let hatched = Style {
            fill: FillStyle::pattern(PatternType::LightGrid, Color::Indexed(10), Color::WHITE),
            protection: Protection::unlocked(),
            ..Style::default()
        };
        sheet.set_cell_style("A1", &heading).unwrap();
        sheet.set_cell_style("B2", &hatched).unwrap();

        let table = XlsxStyleTable::build(&workbook);
        let styles = read_styles_xml(table.to_styles_xml().as_bytes())
            .unwrap()
            .cell_styles;

        assert_eq!(styles.len(), 3);
        assert_eq!(styles[0], Style::default());
        assert_eq!(styles[table.xf_id_for(0, 1) as usize], heading);
        assert_eq!(styles[table.xf_id_for(0, 2) as usize], hatched);
    }

    #[test]
    fn test_styles_shared_across_sheets() {
        let mut workbook = Workbook::empty();
        let style = Style::new().italic(true);
        for name in ["A", "B"] {
            let index = workbook.add_worksheet_with_name(name).unwrap();
            let sheet = workbook.worksheet_mut(index).unwrap();
            sheet.set_cell_style("C3", &Style::new().bold(true)).unwrap();
            sheet.set_cell_style("A1", &style).unwrap();
        }

        let table = XlsxStyleTable::build(&workbook);
        // sheet A interned bold first, sheet B as well; both map to the same xf ids
        assert_eq!(table.xf_id_for(0, 1), table.xf_id_for(1, 1));
        assert_eq!(table.xf_id_for(0, 2), table.xf_id_for(1, 2));
        assert_eq!(table.xf_id_for(0, 99), 0);
    }
}
