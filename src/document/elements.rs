//! Text elements that `genpdf` does not ship with.

use genpdf::error::Error;
use genpdf::style::{Style, StyledString};
use genpdf::{render, Alignment, Element, Mm, Position, RenderResult, Size};

use crate::richtext::StyledSpan;

const DEFAULT_UNDERLINE_OFFSET_MM: f64 = 0.4;

fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

/// A single line of styled text that supports underlines by drawing thin strokes underneath.
///
/// Used for links, which `genpdf` paragraphs cannot underline.
pub struct UnderlinedText {
    spans: Vec<StyledSpan>,
    alignment: Alignment,
    underline_offset: Mm,
}

impl UnderlinedText {
    pub fn new(spans: Vec<StyledSpan>) -> Self {
        Self {
            spans,
            alignment: Alignment::Left,
            underline_offset: mm_from_f64(DEFAULT_UNDERLINE_OFFSET_MM),
        }
    }

    pub fn with_alignment(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }
}

impl Element for UnderlinedText {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        let mut prepared: Vec<(StyledString, bool, Mm)> = Vec::with_capacity(self.spans.len());
        let mut total_width = Mm::default();
        let mut max_line_height = style.line_height(&context.font_cache);
        let mut max_glyph_height = Mm::default();

        for span in &self.spans {
            let mut string = span.string.clone();
            string.style = style.and(string.style);
            let width = string.width(&context.font_cache);
            total_width += width;
            max_line_height = max_line_height.max(string.style.line_height(&context.font_cache));
            let glyph_height = string
                .style
                .font(&context.font_cache)
                .glyph_height(string.style.font_size());
            max_glyph_height = max_glyph_height.max(glyph_height);
            prepared.push((string, span.underline, width));
        }

        let available_width = area.size().width;
        let x_offset = match self.alignment {
            Alignment::Left => Mm::default(),
            Alignment::Center => (available_width - total_width) / 2.0,
            Alignment::Right => available_width - total_width,
        };

        let mut result = RenderResult::default();
        if max_line_height > area.size().height {
            result.has_more = true;
            return Ok(result);
        }

        match area.text_section(&context.font_cache, Position::new(x_offset, 0), style) {
            Some(mut section) => {
                for (string, _, _) in &prepared {
                    section.print_str(&string.s, string.style)?;
                }
            }
            None => {
                result.has_more = true;
                return Ok(result);
            }
        }

        let baseline = max_glyph_height + self.underline_offset;
        let mut cursor = x_offset;
        for (string, underline, width) in &prepared {
            if *underline {
                let mut line_style = Style::new();
                if let Some(color) = string.style.color().or(style.color()) {
                    line_style = line_style.with_color(color);
                }
                area.draw_line(
                    vec![
                        Position::new(cursor, baseline),
                        Position::new(cursor + *width, baseline),
                    ],
                    line_style,
                );
            }
            cursor += *width;
        }

        result.size = Size::new(total_width, max_line_height);
        Ok(result)
    }
}
