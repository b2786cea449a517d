//! Page setup of the text export: A4 paper, margins, a running head and a ruled footer.

use genpdf::elements::Paragraph;
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::{Color, Style};
use genpdf::{self, Alignment, Element, Margins, Mm, PageDecorator, PaperSize, Position};

use crate::richtext::MUTED_COLOR;

const FURNITURE_FONT_SIZE: u8 = 8;
const RUNNING_HEAD_HEIGHT_MM: f64 = 8.0;
const FOOTER_HEIGHT_MM: f64 = 10.0;
const FOOTER_RULE_GAP_MM: f64 = 2.0;
/// Below this the body could not hold a single section heading.
const MIN_BODY_HEIGHT_MM: f64 = 40.0;
const RULE_COLOR: Color = Color::Rgb(221, 221, 221);

fn mm(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// Builds the `genpdf::Document` that the text export flows the CV into.
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    margins: Option<Margins>,
    running_head: Option<String>,
    footer_text: String,
}

impl DocumentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the document title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Repeats `text` right-aligned at the top of every page after the first.
    pub fn with_running_head(mut self, text: impl Into<String>) -> Self {
        self.running_head = Some(text.into());
        self
    }

    /// Text printed before the page number in the footer.
    pub fn with_footer_text(mut self, text: impl Into<String>) -> Self {
        self.footer_text = text.into();
        self
    }

    pub fn build(self, font_family: FontFamily<FontData>) -> genpdf::Document {
        let mut document = genpdf::Document::new(font_family);
        if let Some(title) = self.title {
            document.set_title(title);
        }
        document.set_paper_size(PaperSize::A4);
        document.set_page_decorator(CvPageDecorator {
            page: 0,
            margins: self.margins.unwrap_or_else(|| Margins::all(15)),
            running_head: self.running_head,
            footer_text: self.footer_text,
        });
        document
    }
}

struct CvPageDecorator {
    page: usize,
    margins: Margins,
    running_head: Option<String>,
    footer_text: String,
}

impl CvPageDecorator {
    fn footer_line(&self) -> String {
        if self.footer_text.is_empty() {
            self.page.to_string()
        } else {
            format!("{}  ·  {}", self.footer_text, self.page)
        }
    }
}

impl PageDecorator for CvPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        area.add_margins(self.margins);

        let furniture = style.and(
            Style::new()
                .with_font_size(FURNITURE_FONT_SIZE)
                .with_color(MUTED_COLOR),
        );
        let running_head = self.running_head.as_deref().filter(|_| self.page > 1);
        let mut reserved = mm(FOOTER_HEIGHT_MM);
        if running_head.is_some() {
            reserved += mm(RUNNING_HEAD_HEIGHT_MM);
        }
        if area.size().height - reserved < mm(MIN_BODY_HEIGHT_MM) {
            return Err(Error::new(
                format!("page {} has no room for CV content between head and footer", self.page),
                ErrorKind::PageSizeExceeded,
            ));
        }

        if let Some(text) = running_head {
            print_line(context, area.clone(), furniture, text, Alignment::Right)?;
            area.add_offset(Position::new(0, mm(RUNNING_HEAD_HEIGHT_MM)));
        }

        let body_height = area.size().height - mm(FOOTER_HEIGHT_MM);
        let mut footer_area = area.clone();
        footer_area.add_offset(Position::new(0, body_height));
        footer_area.draw_line(
            vec![
                Position::new(0, 0),
                Position::new(footer_area.size().width, 0),
            ],
            Style::new().with_color(RULE_COLOR),
        );
        footer_area.add_offset(Position::new(0, mm(FOOTER_RULE_GAP_MM)));
        print_line(context, footer_area, furniture, &self.footer_line(), Alignment::Center)?;

        area.set_height(body_height);
        Ok(area)
    }
}

fn print_line(
    context: &genpdf::Context,
    area: genpdf::render::Area<'_>,
    style: Style,
    text: &str,
    alignment: Alignment,
) -> Result<(), Error> {
    let mut line = Paragraph::new(text).aligned(alignment);
    if line.render(context, area, style)?.has_more {
        return Err(Error::new(
            format!("page furniture {:?} does not fit on one line", text),
            ErrorKind::PageSizeExceeded,
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn footer_line_numbers_pages() {
        let mut decorator = CvPageDecorator {
            page: 3,
            margins: Margins::all(15),
            running_head: None,
            footer_text: "Updated 2024".into(),
        };
        assert_eq!(decorator.footer_line(), "Updated 2024  ·  3");

        decorator.footer_text.clear();
        assert_eq!(decorator.footer_line(), "3");
    }
}
