//! Selectable-text export of the rendered page, typeset with `genpdf`.
//!
//! Unlike the snapshot export this mode paginates: sections flow in page order (full-width
//! sections, then the main column, then the side column). Every page carries the footer and
//! pages after the first repeat the name line as a running head.  When the primary font cannot
//! cover the page text (CJK names), the whole document is typeset with the fallback face.

mod builder;
mod elements;

pub use builder::DocumentBuilder;
pub use elements::UnderlinedText;

use genpdf::elements::{Break, LinearLayout, Paragraph, UnorderedList};
use genpdf::style::Style;
use genpdf::{Alignment, Element as _, Margins};
use log::info;

use crate::export::ExportError;
use crate::fonts::FontBytes;
use crate::richtext::{spans_to_styled_strings, Span, LINK_COLOR, MUTED_COLOR};
use crate::view::{
    Block, Column, ContactLine, Header, HorizontalAlignment, List, Page, RichParagraph, Section,
    TextSize,
};

const BODY_FONT_SIZE: u8 = 10;
const SMALL_FONT_SIZE: u8 = 8;
const NAME_FONT_SIZE: u8 = 20;
const SECTION_FONT_SIZE: u8 = 13;
const HEADING_FONT_SIZE: u8 = 11;

/// Typesets `page` into a paginated A4 PDF and returns its bytes.
pub fn render_text_pdf(page: &Page, fonts: &FontBytes, title: &str) -> Result<Vec<u8>, ExportError> {
    let use_fallback = !fonts.primary_covers(&page.to_string());
    if use_fallback {
        info!("primary font lacks some characters, typesetting with the fallback face");
    }
    let mut document = DocumentBuilder::new()
        .with_title(title)
        .with_margins(Margins::trbl(15, 15, 10, 15))
        .with_running_head(page.header().name_line.as_str())
        .with_footer_text(page.footer())
        .build(fonts.to_genpdf_family(use_fallback)?);
    document.set_font_size(BODY_FONT_SIZE);
    document.set_line_spacing(1.25);

    push_header(&mut document, page.header());
    for column in [Column::Full, Column::Main, Column::Side] {
        for section in page.sections_in(column) {
            document.push(section_element(section));
        }
    }

    let mut bytes = Vec::new();
    document.render(&mut bytes)?;
    info!("typeset text PDF ({} bytes)", bytes.len());
    Ok(bytes)
}

fn push_header(document: &mut genpdf::Document, header: &Header) {
    document.push(
        Paragraph::new(header.name_line.as_str())
            .styled(Style::new().bold().with_font_size(NAME_FONT_SIZE)),
    );

    for line in &header.contact {
        match line {
            ContactLine::Text(text) => document.push(Paragraph::new(text.as_str())),
            ContactLine::Link(url) => document.push(UnderlinedText::new(spans_to_styled_strings(
                &[Span::link(url.as_str())],
            ))),
            ContactLine::Pills(pills) => document.push(
                Paragraph::new(pills.join("  ·  "))
                    .styled(Style::new().with_color(LINK_COLOR)),
            ),
        }
    }
    document.push(Break::new(1));
}

fn section_element(section: &Section) -> LinearLayout {
    let mut layout = LinearLayout::vertical();
    layout.push(
        Paragraph::new(section.title()).styled(
            Style::new()
                .bold()
                .with_font_size(SECTION_FONT_SIZE)
                .with_color(LINK_COLOR),
        ),
    );
    layout.push(Break::new(0.3));

    for block in section.blocks() {
        match block {
            Block::Paragraph(paragraph) => push_paragraph(&mut layout, paragraph),
            Block::Heading(text) => layout.push(
                Paragraph::new(text.as_str())
                    .styled(Style::new().bold().with_font_size(HEADING_FONT_SIZE)),
            ),
            Block::ItemHeading { title, trailing } => {
                let spans = [
                    Span::new(title.as_str()).bold(),
                    Span::new(format!("  {}", trailing)).colored(MUTED_COLOR),
                ];
                layout.push(styled_paragraph(&spans));
            }
            Block::List(list) => layout.push(list_element(list)),
            Block::Timeline(items) => {
                let mut timeline = UnorderedList::with_bullet("•");
                for item in items {
                    let spans = [
                        Span::new(item.term.as_str()).bold(),
                        Span::new(format!("  {}", item.desc)),
                    ];
                    timeline.push(styled_paragraph(&spans));
                }
                layout.push(timeline);
            }
            Block::Tags(tags) => {
                let text = tags
                    .iter()
                    .map(|tag| format!("[{}]", tag))
                    .collect::<Vec<_>>()
                    .join(" ");
                layout.push(
                    Paragraph::new(text).styled(
                        Style::new()
                            .with_font_size(SMALL_FONT_SIZE)
                            .with_color(LINK_COLOR),
                    ),
                );
            }
        }
    }

    layout.push(Break::new(0.8));
    layout
}

fn list_element(list: &List) -> UnorderedList {
    let mut element = UnorderedList::new();
    for item in list.items() {
        let mut lines = LinearLayout::vertical();
        for line in item.lines() {
            if list.is_small() {
                lines.push(
                    rich_paragraph(line).styled(Style::new().with_font_size(SMALL_FONT_SIZE)),
                );
            } else {
                push_paragraph(&mut lines, line);
            }
        }
        element.push(lines);
    }
    element
}

fn push_paragraph(layout: &mut LinearLayout, paragraph: &RichParagraph) {
    let font_size = match paragraph.size() {
        TextSize::Body => BODY_FONT_SIZE,
        TextSize::Small => SMALL_FONT_SIZE,
    };
    let style = Style::new().with_font_size(font_size);

    if paragraph.spans().iter().any(Span::is_underlined) {
        layout.push(
            UnderlinedText::new(spans_to_styled_strings(paragraph.spans()))
                .with_alignment(alignment(paragraph.alignment()))
                .styled(style),
        );
    } else {
        layout.push(rich_paragraph(paragraph).styled(style));
    }
}

fn rich_paragraph(paragraph: &RichParagraph) -> Paragraph {
    styled_paragraph(paragraph.spans()).aligned(alignment(paragraph.alignment()))
}

fn styled_paragraph(spans: &[Span]) -> Paragraph {
    let mut paragraph = Paragraph::default();
    for span in spans {
        paragraph.push(span.to_styled_string());
    }
    paragraph
}

fn alignment(alignment: HorizontalAlignment) -> Alignment {
    match alignment {
        HorizontalAlignment::Left => Alignment::Left,
        HorizontalAlignment::Center => Alignment::Center,
        HorizontalAlignment::Right => Alignment::Right,
    }
}
