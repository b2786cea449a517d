//! Styled text fragments shared by the view tree, the rasterizer and the text PDF.
//!
//! A [`Span`] carries the inline decorations the CV layout needs: bold names and labels, coloured
//! links and underlines.  `genpdf`'s [`StyledString`] has no underline attribute, so
//! [`StyledSpan`] keeps that flag next to the converted string for the element layer.

use genpdf::style::{Color, Style, StyledString};

/// Colour used for hyperlinks in every output.
pub const LINK_COLOR: Color = Color::Rgb(36, 92, 160);

/// Colour used for secondary text such as date ranges and descriptions.
pub const MUTED_COLOR: Color = Color::Rgb(102, 102, 102);

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    text: String,
    bold: bool,
    color: Option<Color>,
    underline: bool,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Creates an underlined, link-coloured span.
    pub fn link(text: impl Into<String>) -> Self {
        Self::new(text).colored(LINK_COLOR).underline()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_bold(&self) -> bool {
        self.bold
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn is_underlined(&self) -> bool {
        self.underline
    }

    /// Marks the span as bold.
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    /// Marks the span as underlined.
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Assigns a color to the span.
    pub fn colored(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        style
    }

    /// Converts the span to a [`StyledString`], dropping the underline flag.
    pub fn to_styled_string(&self) -> StyledString {
        StyledString::new(self.text.clone(), self.to_style())
    }
}

impl From<&str> for Span {
    fn from(text: &str) -> Self {
        Span::new(text)
    }
}

impl From<String> for Span {
    fn from(text: String) -> Self {
        Span::new(text)
    }
}

/// A styled span ready to be consumed by `genpdf` elements together with the underline flag.
#[derive(Clone, Debug)]
pub struct StyledSpan {
    pub string: StyledString,
    pub underline: bool,
}

impl From<&Span> for StyledSpan {
    fn from(span: &Span) -> Self {
        StyledSpan {
            string: span.to_styled_string(),
            underline: span.underline,
        }
    }
}

/// Converts a sequence of [`Span`] values into styled strings while keeping underline flags.
pub fn spans_to_styled_strings<'a, I>(spans: I) -> Vec<StyledSpan>
where
    I: IntoIterator<Item = &'a Span>,
{
    spans.into_iter().map(StyledSpan::from).collect()
}

/// Concatenates the text of all spans.
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(Span::text).collect()
}

/// Splits a color into RGB components for raster output.
pub fn color_to_rgb(color: Color) -> (u8, u8, u8) {
    match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Greyscale(v) => (v, v, v),
        Color::Cmyk(c, m, y, k) => {
            let channel = |value: u8| {
                let ink = (value as u16 + k as u16).min(255);
                (255 - ink) as u8
            };
            (channel(c), channel(m), channel(y))
        }
    }
}
