//! Page and view layout of a worksheet
//!
//! Every record is optional: a file that never set page margins has no
//! [`PageMargins`], not a default one. Keeping absence explicit lets a sheet
//! copy carry over exactly what the source had and skip the rest.

/// Layout metadata attached to a worksheet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SheetLayout {
    pub page_setup: Option<PageSetup>,
    pub page_margins: Option<PageMargins>,
    pub header_footer: Option<HeaderFooter>,
    pub print_options: Option<PrintOptions>,
    pub sheet_view: Option<SheetView>,
}

impl SheetLayout {
    pub fn is_empty(&self) -> bool {
        self.page_setup.is_none()
            && self.page_margins.is_none()
            && self.header_footer.is_none()
            && self.print_options.is_none()
            && self.sheet_view.is_none()
    }

    /// Names of the records that are present, in file order
    pub fn present_records(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.sheet_view.is_some() {
            names.push("sheet_view");
        }
        if self.print_options.is_some() {
            names.push("print_options");
        }
        if self.page_margins.is_some() {
            names.push("page_margins");
        }
        if self.page_setup.is_some() {
            names.push("page_setup");
        }
        if self.header_footer.is_some() {
            names.push("header_footer");
        }
        names
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PageOrientation {
    #[default]
    Default,
    Portrait,
    Landscape,
}

impl PageOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageOrientation::Default => "default",
            PageOrientation::Portrait => "portrait",
            PageOrientation::Landscape => "landscape",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "portrait" => PageOrientation::Portrait,
            "landscape" => PageOrientation::Landscape,
            _ => PageOrientation::Default,
        }
    }
}

/// Printer settings
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSetup {
    /// Paper size code (1 = Letter, 9 = A4)
    pub paper_size: Option<u32>,
    pub orientation: PageOrientation,
    /// Scale to `fit_to_width` x `fit_to_height` pages instead of `scale`
    pub fit_to_page: bool,
    /// Print scaling in percent
    pub scale: Option<u32>,
    /// Pages wide when fitting to page (0 = automatic)
    pub fit_to_width: Option<u32>,
    pub fit_to_height: Option<u32>,
    pub first_page_number: Option<u32>,
    pub black_and_white: bool,
    pub draft: bool,
}

/// Page margins in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMargins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
    pub header: f64,
    pub footer: f64,
}

impl Default for PageMargins {
    /// The "normal" preset spreadsheet applications start with
    fn default() -> Self {
        Self {
            left: 0.7,
            right: 0.7,
            top: 0.75,
            bottom: 0.75,
            header: 0.3,
            footer: 0.3,
        }
    }
}

/// Printed header and footer text, in the `&L..&C..&R` code syntax
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderFooter {
    pub odd_header: Option<String>,
    pub odd_footer: Option<String>,
    pub even_header: Option<String>,
    pub even_footer: Option<String>,
    pub first_header: Option<String>,
    pub first_footer: Option<String>,
    pub different_odd_even: bool,
    pub different_first: bool,
}

impl HeaderFooter {
    pub fn is_empty(&self) -> bool {
        *self == HeaderFooter::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PrintOptions {
    pub grid_lines: bool,
    pub headings: bool,
    pub horizontal_centered: bool,
    pub vertical_centered: bool,
}

/// On-screen view settings of the sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SheetView {
    pub show_grid_lines: bool,
    pub show_row_col_headers: bool,
    /// Zoom in percent
    pub zoom_scale: u32,
    pub right_to_left: bool,
    pub tab_selected: bool,
    /// Frozen rows and columns above/left of the pane split
    pub frozen_rows: u32,
    pub frozen_cols: u16,
}

impl SheetView {
    pub fn has_frozen_pane(&self) -> bool {
        self.frozen_rows > 0 || self.frozen_cols > 0
    }
}

impl Default for SheetView {
    fn default() -> Self {
        Self {
            show_grid_lines: true,
            show_row_col_headers: true,
            zoom_scale: 100,
            right_to_left: false,
            tab_selected: false,
            frozen_rows: 0,
            frozen_cols: 0,
        }
    }
}
