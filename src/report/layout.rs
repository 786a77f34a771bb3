//! Page layout model and flow writer
//!
//! [`PageWriter`] lays content out top-down on A4 pages in millimetres, with
//! a text cursor, automatic page breaks and a running header on every page.
//! The result is a [`Layout`]: positioned elements per page, the raster
//! images they reference, and marks recording where each section and test
//! case block landed. The PDF backend only translates a finished layout.

use std::ops::Range;

/// A4 page width (mm)
pub const PAGE_WIDTH: f64 = 210.0;
/// A4 page height (mm)
pub const PAGE_HEIGHT: f64 = 297.0;
/// Left, top and right margin (mm)
pub const MARGIN: f64 = 15.0;
/// Content crossing this line moves to the next page (20 mm bottom margin)
pub const BREAK_Y: f64 = PAGE_HEIGHT - 20.0;
/// Cursor position after the running header
pub const CONTENT_TOP: f64 = 30.0;
/// Running header printed at the top of every page
pub const RUNNING_HEADER: &str = "QA GOVERNANCE SYSTEM - EXECUTION REPORT";

const HEADER_RULE_Y: f64 = 18.0;
const CELL_PADDING: f64 = 1.0;
const LINE_WIDTH: f64 = 0.2;
const PT_TO_MM: f64 = 25.4 / 72.0;
/// Advance width of every Courier glyph, in em
const COURIER_ADVANCE: f64 = 0.6;

/// An RGB colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);

    /// Parse `#rrggbb`
    pub const fn from_hex(hex: u32) -> Self {
        Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }
}

/// Style of the fixed-width font family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Italic,
}

/// Decoded 8-bit RGB pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// Row-major, three bytes per pixel
    pub rgb: Vec<u8>,
}

/// A positioned drawing element; coordinates in mm from the top-left corner
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// `y` is the text baseline
    Text {
        x: f64,
        y: f64,
        size: f64,
        style: FontStyle,
        color: Rgb,
        text: String,
    },
    Rect {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        fill: Rgb,
    },
    Line {
        from: (f64, f64),
        to: (f64, f64),
        color: Rgb,
        width: f64,
    },
    /// `image` indexes [`Layout::images`]
    Image {
        x: f64,
        y: f64,
        w: f64,
        h: f64,
        image: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub elements: Vec<Element>,
}

impl Page {
    /// Text of every text element, in drawing order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(|e| match e {
            Element::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    /// Left edge of the first text element equal to `text`
    pub fn text_x(&self, text: &str) -> Option<f64> {
        self.elements.iter().find_map(|e| match e {
            Element::Text { x, text: t, .. } if t == text => Some(*x),
            _ => None,
        })
    }
}

/// Report sections in their fixed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Section {
    Cover,
    Summary,
    Criteria,
    Details,
}

/// What a [`Mark`] spans
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkKind {
    Section(Section),
    /// One execution-detail block, by display ID
    TestCase(String),
}

/// A page index and vertical position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub page: usize,
    pub y: f64,
}

/// Where a section or block started and ended
#[derive(Debug, Clone, PartialEq)]
pub struct Mark {
    pub kind: MarkKind,
    pub start: Position,
    pub end: Position,
}

/// A finished page layout
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub pages: Vec<Page>,
    pub images: Vec<RasterImage>,
    pub marks: Vec<Mark>,
}

impl Layout {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Sections in the order they were emitted
    pub fn sections(&self) -> Vec<Section> {
        self.marks
            .iter()
            .filter_map(|m| match m.kind {
                MarkKind::Section(s) => Some(s),
                MarkKind::TestCase(_) => None,
            })
            .collect()
    }

    /// Execution-detail block marks in emission order
    pub fn blocks(&self) -> impl Iterator<Item = (&str, &Mark)> {
        self.marks.iter().filter_map(|m| match &m.kind {
            MarkKind::TestCase(id) => Some((id.as_str(), m)),
            MarkKind::Section(_) => None,
        })
    }

    pub fn block(&self, display_id: &str) -> Option<&Mark> {
        self.blocks().find(|(id, _)| *id == display_id).map(|(_, m)| m)
    }

    /// Whether any text element equals `text`
    pub fn contains_text(&self, text: &str) -> bool {
        self.pages.iter().flat_map(Page::texts).any(|t| t == text)
    }
}

/// Cell border
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Border {
    #[default]
    None,
    All,
    Bottom,
}

/// Horizontal text alignment in a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
}

/// A single-line text box
///
/// A width of `0` extends the cell to the right margin.
#[derive(Debug, Clone, Copy)]
pub struct Cell<'a> {
    w: f64,
    h: f64,
    text: &'a str,
    border: Border,
    align: Align,
    fill: bool,
    newline: bool,
}

impl<'a> Cell<'a> {
    pub fn new(w: f64, h: f64, text: &'a str) -> Self {
        Self {
            w,
            h,
            text,
            border: Border::None,
            align: Align::Left,
            fill: false,
            newline: false,
        }
    }

    pub fn border(mut self, border: Border) -> Self {
        self.border = border;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }

    /// Paint the background with the current fill colour
    pub fn filled(mut self) -> Self {
        self.fill = true;
        self
    }

    /// Move the cursor to the start of the next line afterwards
    pub fn newline(mut self) -> Self {
        self.newline = true;
        self
    }
}

/// Flowing layout writer
pub struct PageWriter {
    layout: Layout,
    x: f64,
    y: f64,
    size: f64,
    style: FontStyle,
    text_color: Rgb,
    fill_color: Rgb,
}

impl Default for PageWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl PageWriter {
    /// A writer with no pages yet
    pub fn new() -> Self {
        Self {
            layout: Layout::default(),
            x: MARGIN,
            y: MARGIN,
            size: 10.0,
            style: FontStyle::Regular,
            text_color: Rgb::BLACK,
            fill_color: Rgb::WHITE,
        }
    }

    pub fn finish(self) -> Layout {
        self.layout
    }

    pub fn page_count(&self) -> usize {
        self.layout.pages.len()
    }

    pub fn y(&self) -> f64 {
        self.y
    }

    pub fn set_y(&mut self, y: f64) {
        self.x = MARGIN;
        self.y = y;
    }

    pub fn set_x(&mut self, x: f64) {
        self.x = x;
    }

    pub fn set_font(&mut self, style: FontStyle, size: f64) {
        self.style = style;
        self.size = size;
    }

    pub fn set_text_color(&mut self, color: Rgb) {
        self.text_color = color;
    }

    pub fn set_fill_color(&mut self, color: Rgb) {
        self.fill_color = color;
    }

    /// Start a new page and print the running header on it
    pub fn add_page(&mut self) {
        self.layout.pages.push(Page::default());
        self.x = MARGIN;
        self.y = MARGIN;

        let (style, size, color) = (self.style, self.size, self.text_color);
        self.set_font(FontStyle::Bold, 10.0);
        self.set_text_color(Rgb(100, 100, 100));
        self.cell(Cell::new(0.0, 10.0, RUNNING_HEADER).newline());
        self.line((MARGIN, HEADER_RULE_Y), (PAGE_WIDTH - MARGIN, HEADER_RULE_Y));
        self.ln(5.0);
        self.set_font(style, size);
        self.set_text_color(color);
    }

    /// Line break: back to the left margin, `h` mm down
    pub fn ln(&mut self, h: f64) {
        self.x = MARGIN;
        self.y += h;
    }

    /// Draw a single-line cell at the cursor
    pub fn cell(&mut self, cell: Cell<'_>) {
        if self.y + cell.h > BREAK_Y && self.y > CONTENT_TOP {
            let x = self.x;
            self.add_page();
            self.x = x;
        }

        let w = if cell.w > 0.0 {
            cell.w
        } else {
            PAGE_WIDTH - MARGIN - self.x
        };
        let (x, y, h) = (self.x, self.y, cell.h);

        if cell.fill {
            self.push(Element::Rect {
                x,
                y,
                w,
                h,
                fill: self.fill_color,
            });
        }

        match cell.border {
            Border::None => {}
            Border::Bottom => self.line((x, y + h), (x + w, y + h)),
            Border::All => {
                self.line((x, y), (x + w, y));
                self.line((x + w, y), (x + w, y + h));
                self.line((x + w, y + h), (x, y + h));
                self.line((x, y + h), (x, y));
            }
        }

        if !cell.text.is_empty() {
            let text_w = self.text_width(cell.text);
            let dx = match cell.align {
                Align::Left => CELL_PADDING,
                Align::Center => (w - text_w) / 2.0,
            };
            self.push(Element::Text {
                x: x + dx,
                y: y + 0.5 * h + 0.3 * self.size * PT_TO_MM,
                size: self.size,
                style: self.style,
                color: self.text_color,
                text: cell.text.to_string(),
            });
        }

        if cell.newline {
            self.ln(h);
        } else {
            self.x += w;
        }
    }

    /// Draw wrapped text as a stack of `h`-high lines, then return to the margin
    pub fn multi_cell(&mut self, w: f64, h: f64, text: &str, align: Align) {
        let w = if w > 0.0 { w } else { PAGE_WIDTH - MARGIN - self.x };
        let max_chars = self.fit_chars(w);

        for line in wrap(text, max_chars) {
            let mut cell = Cell::new(w, h, &line).newline();
            cell.align = align;
            self.cell(cell);
        }
    }

    /// Draw a filled rectangle without moving the cursor
    pub fn rect(&mut self, x: f64, y: f64, w: f64, h: f64, fill: Rgb) {
        self.push(Element::Rect { x, y, w, h, fill });
    }

    /// Register a raster image for later placement
    pub fn add_image(&mut self, image: RasterImage) -> usize {
        self.layout.images.push(image);
        self.layout.images.len() - 1
    }

    /// Place a registered image at `x` with width `w`, below the cursor
    ///
    /// The height follows the aspect ratio, scaled down to fit one page.
    pub fn image(&mut self, image: usize, x: f64, w: f64) {
        let Some(raster) = self.layout.images.get(image) else {
            return;
        };
        let aspect = raster.height.max(1) as f64 / raster.width.max(1) as f64;

        let mut w = w;
        let mut h = w * aspect;
        let max_h = BREAK_Y - CONTENT_TOP;
        if h > max_h {
            h = max_h;
            w = h / aspect;
        }

        if self.y + h > BREAK_Y {
            self.add_page();
        }
        let y = self.y;
        self.push(Element::Image { x, y, w, h, image });
        self.y += h;
    }

    /// Record the cursor as the start of a marked span
    pub fn begin_mark(&mut self, kind: MarkKind) -> usize {
        let here = self.position();
        self.layout.marks.push(Mark {
            kind,
            start: here,
            end: here,
        });
        self.layout.marks.len() - 1
    }

    /// Record the cursor as the end of a marked span
    pub fn end_mark(&mut self, mark: usize) {
        let here = self.position();
        if let Some(m) = self.layout.marks.get_mut(mark) {
            m.end = here;
        }
    }

    fn position(&self) -> Position {
        Position {
            page: self.layout.pages.len().saturating_sub(1),
            y: self.y,
        }
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64)) {
        self.push(Element::Line {
            from,
            to,
            color: Rgb::BLACK,
            width: LINE_WIDTH,
        });
    }

    fn push(&mut self, element: Element) {
        if self.layout.pages.is_empty() {
            self.layout.pages.push(Page::default());
        }
        if let Some(page) = self.layout.pages.last_mut() {
            page.elements.push(element);
        }
    }

    /// Characters of the current font that fit in a cell `w` mm wide
    pub fn fit_chars(&self, w: f64) -> usize {
        ((w - 2.0 * CELL_PADDING) / self.char_width()).floor().max(1.0) as usize
    }

    fn char_width(&self) -> f64 {
        COURIER_ADVANCE * self.size * PT_TO_MM
    }

    fn text_width(&self, text: &str) -> f64 {
        text.chars().count() as f64 * self.char_width()
    }
}

/// Greedy word wrap to `max_chars` columns; explicit newlines are kept and
/// words longer than a line are split
pub fn wrap(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for paragraph in text.replace('\r', "").replace('\t', "    ").split('\n') {
        let mut line = String::new();
        let mut len = 0usize;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let chars: Vec<char> = word.chars().collect();
            let word_len = chars.len();

            if len > 0 && len + 1 + word_len <= max_chars {
                line.push(' ');
                line.push_str(word);
                len += 1 + word_len;
                continue;
            }
            if len > 0 {
                lines.push(std::mem::take(&mut line));
                len = 0;
            }
            for chunk in chunk_ranges(word_len, max_chars) {
                if chunk.end - chunk.start == max_chars && chunk.end < word_len {
                    lines.push(chars[chunk].iter().collect());
                } else {
                    line = chars[chunk.clone()].iter().collect();
                    len = chunk.end - chunk.start;
                }
            }
        }
        lines.push(line);
    }
    lines
}

fn chunk_ranges(len: usize, size: usize) -> impl Iterator<Item = Range<usize>> {
    (0..len)
        .step_by(size)
        .map(move |start| start..(start + size).min(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image(w: u32, h: u32) -> RasterImage {
        RasterImage {
            width: w,
            height: h,
            rgb: vec![0; (w * h * 3) as usize],
        }
    }

    #[test]
    fn test_every_page_has_running_header() {
        let mut writer = PageWriter::new();
        writer.add_page();
        assert_eq!(writer.y(), CONTENT_TOP);
        writer.add_page();
        let layout = writer.finish();

        assert_eq!(layout.page_count(), 2);
        for page in &layout.pages {
            assert_eq!(page.texts().next(), Some(RUNNING_HEADER));
        }
    }

    #[test]
    fn test_cell_breaks_page_at_bottom_margin() {
        let mut writer = PageWriter::new();
        writer.add_page();
        writer.set_y(270.0);
        writer.cell(Cell::new(0.0, 10.0, "overflow").newline());

        assert_eq!(writer.page_count(), 2);
        assert_eq!(writer.y(), CONTENT_TOP + 10.0);
        let layout = writer.finish();
        assert!(layout.pages[1].texts().any(|t| t == "overflow"));
    }

    #[test]
    fn test_cell_cursor_movement() {
        let mut writer = PageWriter::new();
        writer.add_page();
        writer.cell(Cell::new(90.0, 8.0, "Status").border(Border::All));
        writer.cell(Cell::new(90.0, 8.0, "Count").border(Border::All).newline());
        assert_eq!(writer.y(), CONTENT_TOP + 8.0);

        let layout = writer.finish();
        let xs: Vec<f64> = layout.pages[0]
            .elements
            .iter()
            .filter_map(|e| match e {
                Element::Text { x, text, .. } if text != RUNNING_HEADER => Some(*x),
                _ => None,
            })
            .collect();
        assert_eq!(xs, vec![MARGIN + CELL_PADDING, MARGIN + 90.0 + CELL_PADDING]);
    }

    #[test]
    fn test_multi_cell_wraps_and_advances() {
        let mut writer = PageWriter::new();
        writer.add_page();
        writer.set_font(FontStyle::Regular, 9.0);
        let text = "word ".repeat(60);
        writer.multi_cell(0.0, 5.0, &text, Align::Left);

        let lines = writer.y() - CONTENT_TOP;
        assert!(lines >= 10.0, "expected several wrapped lines, got {lines}");
        assert_eq!((lines / 5.0).fract(), 0.0);
    }

    #[test]
    fn test_image_scaled_to_page() {
        let mut writer = PageWriter::new();
        writer.add_page();
        let tall = writer.add_image(image(10, 100));
        writer.image(tall, 40.0, 140.0);

        let layout = writer.finish();
        let placed = layout.pages.iter().flat_map(|p| &p.elements).find_map(|e| match e {
            Element::Image { w, h, .. } => Some((*w, *h)),
            _ => None,
        });
        let (w, h) = placed.unwrap();
        assert!((h - (BREAK_Y - CONTENT_TOP)).abs() < 1e-9);
        assert!((w - h / 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_image_moves_to_next_page_when_too_tall() {
        let mut writer = PageWriter::new();
        writer.add_page();
        writer.set_y(200.0);
        let wide = writer.add_image(image(140, 100));
        writer.image(wide, 40.0, 140.0);
        assert_eq!(writer.page_count(), 2);
        assert_eq!(writer.y(), CONTENT_TOP + 100.0);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("", 10), vec![""]);
        assert_eq!(wrap("one two three", 7), vec!["one two", "three"]);
        assert_eq!(wrap("a\nb", 10), vec!["a", "b"]);
        assert_eq!(wrap("abcdefghij", 4), vec!["abcd", "efgh", "ij"]);
        assert_eq!(wrap("x abcdefgh", 4), vec!["x", "abcd", "efgh"]);
    }

    #[test]
    fn test_hex_colour() {
        assert_eq!(Rgb::from_hex(0x4b4c6a), Rgb(0x4b, 0x4c, 0x6a));
    }
}
