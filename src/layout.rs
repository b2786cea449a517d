//! Flows a [`Page`] into a display list measured in CSS pixels.
//!
//! The geometry mirrors the on-screen page: 794 px wide (A4 at 96 dpi), 32 px padding, full-width
//! sections followed by a 7:5 two-column row, and a centred footer.  Text is wrapped greedily at
//! spaces and between CJK characters using a [`TextMeasure`], so the layout can be computed without
//! fonts in tests.

use genpdf::style::Color;
use log::debug;

use crate::richtext::{color_to_rgb, Span, LINK_COLOR, MUTED_COLOR};
use crate::view::{
    Block, Column, ContactLine, Header, HorizontalAlignment, List, Page, RichParagraph, Section,
    TextSize,
};

pub type Rgb = (u8, u8, u8);

const TEXT_COLOR: Rgb = (34, 34, 34);
const ACCENT_COLOR: Rgb = (36, 92, 160);
const RULE_COLOR: Rgb = (221, 221, 221);
const CHIP_COLOR: Rgb = (232, 238, 246);

const LARGE_SIZE: f32 = 24.0;
const TITLE_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 13.0;
const SMALL_SIZE: f32 = 11.0;
const FOOTER_SIZE: f32 = 10.0;
const LINE_HEIGHT: f32 = 1.45;

const SECTION_GAP: f32 = 14.0;
const LIST_INDENT: f32 = 18.0;
const TIMELINE_INDENT: f32 = 20.0;
const CHIP_PADDING: f32 = 6.0;
const CHIP_GAP: f32 = 6.0;

/// Font selection for a run of text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FontStyle {
    pub bold: bool,
    pub italic: bool,
}

impl FontStyle {
    pub const REGULAR: FontStyle = FontStyle {
        bold: false,
        italic: false,
    };
}

/// Measures text for line breaking and alignment.
pub trait TextMeasure {
    /// Horizontal advance of `text` at `size` pixels.
    fn advance(&self, text: &str, style: FontStyle, size: f32) -> f32;

    /// Distance from the top of the em box to the baseline.
    fn ascent(&self, size: f32) -> f32 {
        size * 0.8
    }
}

/// Measurement with a fixed advance per character; wide (CJK) characters count as one em.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MonospaceMeasure {
    pub em: f32,
}

impl Default for MonospaceMeasure {
    fn default() -> Self {
        Self { em: 0.5 }
    }
}

impl TextMeasure for MonospaceMeasure {
    fn advance(&self, text: &str, _style: FontStyle, size: f32) -> f32 {
        text.chars()
            .map(|ch| if is_wide(ch) { 1.0 } else { self.em })
            .sum::<f32>()
            * size
    }
}

/// Page dimensions in CSS pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub padding: f32,
    pub column_gap: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self {
            width: 794.0,
            padding: 32.0,
            column_gap: 24.0,
        }
    }
}

/// A positioned drawing command.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayItem {
    Text {
        x: f32,
        baseline: f32,
        size: f32,
        style: FontStyle,
        color: Rgb,
        underline: bool,
        text: String,
    },
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        color: Rgb,
    },
    Dot {
        cx: f32,
        cy: f32,
        radius: f32,
        color: Rgb,
    },
}

/// The laid-out page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayList {
    pub width: f32,
    pub height: f32,
    pub items: Vec<DisplayItem>,
}

impl DisplayList {
    /// Iterates over the text of every text item in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            DisplayItem::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Lays out `page` at the given geometry.
pub fn layout_page(page: &Page, geometry: &PageGeometry, measure: &dyn TextMeasure) -> DisplayList {
    let mut painter = Painter {
        measure,
        items: Vec::new(),
    };

    let x = geometry.padding;
    let width = (geometry.width - 2.0 * geometry.padding).max(1.0);
    let mut y = painter.header(page.header(), x, geometry.padding, width);

    let mut row: Vec<&Section> = Vec::new();
    for section in page.sections() {
        if section.column() == Column::Full {
            y = painter.row(&row, x, y, width, geometry.column_gap);
            row.clear();
            y = painter.section(section, x, y, width);
        } else {
            row.push(section);
        }
    }
    y = painter.row(&row, x, y, width, geometry.column_gap);
    y = painter.footer(page.footer(), x, y, width);

    let list = DisplayList {
        width: geometry.width,
        height: (y + geometry.padding).ceil(),
        items: painter.items,
    };
    debug!(
        "laid out page: {} items, {}x{} px",
        list.items.len(),
        list.width,
        list.height
    );
    list
}

fn is_wide(ch: char) -> bool {
    matches!(ch as u32,
        0x1100..=0x115F | 0x2E80..=0xA4CF | 0xAC00..=0xD7A3 | 0xF900..=0xFAFF | 0xFE30..=0xFE4F
        | 0xFF00..=0xFF60 | 0xFFE0..=0xFFE6 | 0x20000..=0x3FFFD)
}

/// Splits text into break opportunities: after whitespace and around wide characters.
fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (index, ch) in text.char_indices() {
        let end = index + ch.len_utf8();
        if is_wide(ch) {
            if start < index {
                out.push(&text[start..index]);
            }
            out.push(&text[index..end]);
            start = end;
        } else if ch.is_whitespace() {
            out.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

#[derive(Clone, Debug, PartialEq)]
struct Run {
    text: String,
    style: FontStyle,
    color: Rgb,
    underline: bool,
    width: f32,
}

#[derive(Clone, Debug, Default, PartialEq)]
struct Line {
    runs: Vec<Run>,
    width: f32,
}

impl Line {
    fn push(&mut self, text: &str, style: FontStyle, color: Rgb, underline: bool, width: f32) {
        self.width += width;
        if let Some(last) = self.runs.last_mut() {
            if last.style == style && last.color == color && last.underline == underline {
                last.text.push_str(text);
                last.width += width;
                return;
            }
        }
        self.runs.push(Run {
            text: text.to_string(),
            style,
            color,
            underline,
            width,
        });
    }
}

fn text_size(size: TextSize) -> f32 {
    match size {
        TextSize::Body => BODY_SIZE,
        TextSize::Small => SMALL_SIZE,
    }
}

struct Painter<'a> {
    measure: &'a dyn TextMeasure,
    items: Vec<DisplayItem>,
}

impl Painter<'_> {
    fn wrap(&self, spans: &[Span], size: f32, max_width: f32) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut current = Line::default();

        for span in spans {
            let style = FontStyle {
                bold: span.is_bold(),
                ..FontStyle::REGULAR
            };
            let color = span.color().map(color_to_rgb).unwrap_or(TEXT_COLOR);
            for token in tokens(span.text()) {
                let width = self.measure.advance(token, style, size);
                if current.width + width > max_width && !current.runs.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                if current.runs.is_empty() && token.trim().is_empty() {
                    continue;
                }
                current.push(token, style, color, span.is_underlined(), width);
            }
        }

        if !current.runs.is_empty() || lines.is_empty() {
            lines.push(current);
        }
        lines
    }

    fn draw_lines(
        &mut self,
        lines: Vec<Line>,
        x: f32,
        mut y: f32,
        width: f32,
        size: f32,
        alignment: HorizontalAlignment,
    ) -> f32 {
        let line_height = size * LINE_HEIGHT;
        for line in lines {
            let offset = match alignment {
                HorizontalAlignment::Left => 0.0,
                HorizontalAlignment::Center => (width - line.width) / 2.0,
                HorizontalAlignment::Right => width - line.width,
            }
            .max(0.0);
            let baseline = y + (line_height - size) / 2.0 + self.measure.ascent(size);
            let mut cursor = x + offset;
            for run in line.runs {
                let advance = run.width;
                self.items.push(DisplayItem::Text {
                    x: cursor,
                    baseline,
                    size,
                    style: run.style,
                    color: run.color,
                    underline: run.underline,
                    text: run.text,
                });
                cursor += advance;
            }
            y += line_height;
        }
        y
    }

    fn spans(
        &mut self,
        spans: &[Span],
        size: f32,
        x: f32,
        y: f32,
        width: f32,
        alignment: HorizontalAlignment,
    ) -> f32 {
        let lines = self.wrap(spans, size, width);
        self.draw_lines(lines, x, y, width, size, alignment)
    }

    fn paragraph(&mut self, paragraph: &RichParagraph, size: f32, x: f32, y: f32, width: f32) -> f32 {
        self.spans(paragraph.spans(), size, x, y, width, paragraph.alignment())
    }

    fn rect(&mut self, x: f32, y: f32, width: f32, height: f32, color: Rgb) {
        self.items.push(DisplayItem::Rect {
            x,
            y,
            width,
            height,
            color,
        });
    }

    fn dot(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb) {
        self.items.push(DisplayItem::Dot {
            cx,
            cy,
            radius,
            color,
        });
    }

    fn header(&mut self, header: &Header, x: f32, y: f32, width: f32) -> f32 {
        let name_width = width * 0.6;
        let name_end = self.spans(
            &[Span::new(header.name_line.as_str()).bold()],
            LARGE_SIZE,
            x,
            y,
            name_width,
            HorizontalAlignment::Left,
        );

        let meta_x = x + name_width;
        let meta_width = width - name_width;
        let mut meta_y = y;
        for line in &header.contact {
            meta_y = match line {
                ContactLine::Text(text) => self.spans(
                    &[Span::new(text.as_str())],
                    SMALL_SIZE,
                    meta_x,
                    meta_y,
                    meta_width,
                    HorizontalAlignment::Right,
                ),
                ContactLine::Link(url) => self.spans(
                    &[Span::link(url.as_str())],
                    SMALL_SIZE,
                    meta_x,
                    meta_y,
                    meta_width,
                    HorizontalAlignment::Right,
                ),
                ContactLine::Pills(pills) => {
                    self.chips(pills, meta_x, meta_y + 2.0, meta_width, true)
                }
            };
        }

        let bottom = name_end.max(meta_y) + 10.0;
        self.rect(x, bottom, width, 2.0, TEXT_COLOR);
        bottom + 2.0
    }

    fn row(&mut self, sections: &[&Section], x: f32, y: f32, width: f32, gap: f32) -> f32 {
        if sections.is_empty() {
            return y;
        }

        let unit = (width - gap) / 12.0;
        let main_width = unit * Column::Main.weight() as f32;
        let side_width = unit * Column::Side.weight() as f32;
        let side_x = x + main_width + gap;

        let mut main_y = y;
        let mut side_y = y;
        for section in sections {
            match section.column() {
                Column::Side => side_y = self.section(section, side_x, side_y, side_width),
                Column::Main | Column::Full => {
                    main_y = self.section(section, x, main_y, main_width)
                }
            }
        }
        main_y.max(side_y)
    }

    fn section(&mut self, section: &Section, x: f32, y: f32, width: f32) -> f32 {
        let mut y = self.spans(
            &[Span::new(section.title()).bold()],
            TITLE_SIZE,
            x,
            y + SECTION_GAP,
            width,
            HorizontalAlignment::Left,
        );
        self.rect(x, y + 1.0, width, 1.0, RULE_COLOR);
        y += 6.0;

        for block in section.blocks() {
            y = self.block(block, x, y, width);
        }
        y
    }

    fn block(&mut self, block: &Block, x: f32, y: f32, width: f32) -> f32 {
        match block {
            Block::Paragraph(paragraph) => {
                self.paragraph(paragraph, text_size(paragraph.size()), x, y, width)
            }
            Block::Heading(text) => self.spans(
                &[Span::new(text.as_str()).bold().colored(LINK_COLOR)],
                HEADING_SIZE,
                x,
                y + 6.0,
                width,
                HorizontalAlignment::Left,
            ),
            Block::ItemHeading { title, trailing } => {
                self.item_heading(title, trailing, x, y + 4.0, width)
            }
            Block::List(list) => self.list(list, x, y, width),
            Block::Timeline(items) => {
                let mut y = y + 2.0;
                for item in items {
                    let line_height = BODY_SIZE * LINE_HEIGHT;
                    self.dot(x + 6.0, y + line_height / 2.0, 4.0, ACCENT_COLOR);
                    y = self.spans(
                        &[
                            Span::new(item.term.as_str()).bold(),
                            Span::new("  "),
                            Span::new(item.desc.as_str()),
                        ],
                        BODY_SIZE,
                        x + TIMELINE_INDENT,
                        y,
                        width - TIMELINE_INDENT,
                        HorizontalAlignment::Left,
                    ) + 2.0;
                }
                y
            }
            Block::Tags(tags) => self.chips(tags, x, y + 2.0, width, false),
        }
    }

    fn item_heading(&mut self, title: &str, trailing: &str, x: f32, y: f32, width: f32) -> f32 {
        let trailing_width = self
            .measure
            .advance(trailing, FontStyle::REGULAR, SMALL_SIZE);
        let title_width = (width - trailing_width - 8.0).max(width * 0.5);

        let title_line_height = HEADING_SIZE * LINE_HEIGHT;
        let title_baseline =
            y + (title_line_height - HEADING_SIZE) / 2.0 + self.measure.ascent(HEADING_SIZE);
        self.items.push(DisplayItem::Text {
            x: x + (width - trailing_width).max(0.0),
            baseline: title_baseline,
            size: SMALL_SIZE,
            style: FontStyle::REGULAR,
            color: color_to_rgb(MUTED_COLOR),
            underline: false,
            text: trailing.to_string(),
        });

        self.spans(
            &[Span::new(title).bold()],
            HEADING_SIZE,
            x,
            y,
            title_width,
            HorizontalAlignment::Left,
        )
    }

    fn list(&mut self, list: &List, x: f32, mut y: f32, width: f32) -> f32 {
        for item in list.items() {
            let mut first = true;
            for line in item.lines() {
                let size = if list.is_small() {
                    SMALL_SIZE
                } else {
                    text_size(line.size())
                };
                if first {
                    let line_height = size * LINE_HEIGHT;
                    self.dot(x + 7.0, y + line_height / 2.0, 1.8, TEXT_COLOR);
                    first = false;
                }
                y = self.paragraph(line, size, x + LIST_INDENT, y, width - LIST_INDENT);
            }
            y += 2.0;
        }
        y
    }

    fn chips(&mut self, tags: &[String], x: f32, mut y: f32, width: f32, align_right: bool) -> f32 {
        if tags.is_empty() {
            return y;
        }

        let chip_height = SMALL_SIZE * 1.6;
        let widths: Vec<f32> = tags
            .iter()
            .map(|tag| {
                self.measure.advance(tag, FontStyle::REGULAR, SMALL_SIZE) + 2.0 * CHIP_PADDING
            })
            .collect();
        let total = widths.iter().sum::<f32>() + CHIP_GAP * (widths.len() - 1) as f32;

        let mut cursor = if align_right && total <= width {
            x + width - total
        } else {
            x
        };
        for (tag, chip_width) in tags.iter().zip(widths) {
            if cursor + chip_width > x + width && cursor > x {
                cursor = x;
                y += chip_height + 4.0;
            }
            self.rect(cursor, y, chip_width, chip_height, CHIP_COLOR);
            self.items.push(DisplayItem::Text {
                x: cursor + CHIP_PADDING,
                baseline: y + (chip_height - SMALL_SIZE) / 2.0 + self.measure.ascent(SMALL_SIZE),
                size: SMALL_SIZE,
                style: FontStyle::REGULAR,
                color: color_to_rgb(LINK_COLOR),
                underline: false,
                text: tag.clone(),
            });
            cursor += chip_width + CHIP_GAP;
        }
        y + chip_height + 4.0
    }

    fn footer(&mut self, text: &str, x: f32, y: f32, width: f32) -> f32 {
        let y = y + 20.0;
        self.rect(x, y, width, 1.0, RULE_COLOR);
        self.spans(
            &[Span::new(text).colored(Color::Greyscale(136))],
            FOOTER_SIZE,
            x,
            y + 10.0,
            width,
            HorizontalAlignment::Center,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Header, ListItem, SectionId};

    fn painter(measure: &MonospaceMeasure) -> Painter<'_> {
        Painter {
            measure,
            items: Vec::new(),
        }
    }

    fn sample_page() -> Page {
        Page::new(
            Header {
                name_line: "王小明 (Xiao-Ming Wang)".into(),
                contact: vec![
                    ContactLine::Text("xm@example.com".into()),
                    ContactLine::Pills(vec!["Portfolio".into(), "Blog".into()]),
                ],
            },
            vec![
                Section::new(SectionId::Overview, "Overview", Column::Full)
                    .with_block(Block::List(List::of_lines(["Line one"]))),
                Section::new(SectionId::Projects, "Projects", Column::Main).with_block(
                    Block::ItemHeading {
                        title: "Router".into(),
                        trailing: "2022 — 2023".into(),
                    },
                ),
                Section::new(SectionId::Skills, "Skills", Column::Side).with_block(Block::List(
                    List::new(vec![ListItem::new(RichParagraph::plain("Rust"))]),
                )),
            ],
            "Built with Rust",
        )
    }

    #[test]
    fn tokens_break_after_spaces_and_around_wide_chars() {
        assert_eq!(tokens("Hello big world"), ["Hello ", "big ", "world"]);
        assert_eq!(tokens("ab機器c"), ["ab", "機", "器", "c"]);
        assert!(tokens("").is_empty());
    }

    #[test]
    fn wrap_respects_width_and_keeps_text() {
        let measure = MonospaceMeasure::default();
        let painter = painter(&measure);
        let spans = [Span::new("alpha beta gamma delta")];
        let lines = painter.wrap(&spans, 10.0, 60.0);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(line.width <= 60.0 + f32::EPSILON || line.runs.len() == 1);
        }
        let joined: String = lines
            .iter()
            .flat_map(|line| line.runs.iter().map(|run| run.text.as_str()))
            .collect();
        assert_eq!(joined.replace(' ', ""), "alphabetagammadelta");
    }

    #[test]
    fn wrap_merges_runs_with_equal_style() {
        let measure = MonospaceMeasure::default();
        let painter = painter(&measure);
        let spans = [Span::new("School").bold(), Span::new(", Program")];
        let lines = painter.wrap(&spans, 10.0, 1000.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].runs.len(), 2);
        assert_eq!(lines[0].runs[1].text, ", Program");
    }

    #[test]
    fn page_layout_places_columns_side_by_side() {
        let measure = MonospaceMeasure::default();
        let geometry = PageGeometry::default();
        let list = layout_page(&sample_page(), &geometry, &measure);

        assert_eq!(list.width, 794.0);
        assert!(list.height > 0.0);

        let x_of = |needle: &str| {
            list.items.iter().find_map(|item| match item {
                DisplayItem::Text { x, text, .. } if text == needle => Some(*x),
                _ => None,
            })
        };
        let projects_x = x_of("Projects").expect("projects title");
        let skills_x = x_of("Skills").expect("skills title");
        assert_eq!(projects_x, geometry.padding);
        assert!(skills_x > geometry.width / 2.0);
    }

    #[test]
    fn page_layout_contains_all_text() {
        let measure = MonospaceMeasure::default();
        let list = layout_page(&sample_page(), &PageGeometry::default(), &measure);
        let texts: Vec<_> = list.texts().collect();
        for expected in [
            "xm@example.com",
            "Portfolio",
            "Blog",
            "Line one",
            "Router",
            "2022 — 2023",
            "Rust",
            "Built with Rust",
        ] {
            assert!(texts.contains(&expected), "missing {expected:?}: {texts:?}");
        }
        let name: String = texts
            .iter()
            .copied()
            .filter(|text| "王小明 (Xiao-Ming Wang)".contains(text))
            .collect();
        assert!(name.contains("Xiao-Ming"));
    }

    #[test]
    fn items_stay_inside_the_page() {
        let measure = MonospaceMeasure::default();
        let list = layout_page(&sample_page(), &PageGeometry::default(), &measure);
        for item in &list.items {
            if let DisplayItem::Rect { x, width, .. } = item {
                assert!(*x >= 0.0 && x + width <= list.width);
            }
        }
    }
}
