//! Rasterizing the laid-out page into a bitmap.
//!
//! Glyph outlines come from `skrifa` and are filled with `tiny-skia`.  The whole page is drawn at
//! the oversampling factor of [`RasterOptions::scale`] onto an opaque background, so the resulting
//! bitmap carries no alpha channel.  Characters the primary face lacks are taken from the
//! fallback face of [`FontBytes`], if one is loaded.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, ImageOutputFormat, RgbImage};
use log::debug;
use skrifa::charmap::Charmap;
use skrifa::instance::{LocationRef, Size};
use skrifa::metrics::GlyphMetrics;
use skrifa::outline::{DrawSettings, OutlineGlyphCollection, OutlinePen};
use skrifa::{FontRef, GlyphId, MetadataProvider};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

use crate::export::ExportError;
use crate::fonts::{FontBytes, FontError};
use crate::layout::{
    layout_page, DisplayItem, FontStyle, MonospaceMeasure, PageGeometry, Rgb, TextMeasure,
};
use crate::view::Page;

/// Oversampling factor relative to the on-screen pixel size.
pub const DEFAULT_SCALE: f32 = 2.0;

/// Settings for one rasterization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterOptions {
    pub scale: f32,
    pub background: Rgb,
    pub geometry: PageGeometry,
}

impl Default for RasterOptions {
    fn default() -> Self {
        Self {
            scale: DEFAULT_SCALE,
            background: (255, 255, 255),
            geometry: PageGeometry::default(),
        }
    }
}

/// An opaque RGB8 bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    width: u32,
    height: u32,
    rgb: Vec<u8>,
}

impl Bitmap {
    /// Wraps packed RGB8 pixel data.
    pub fn from_rgb(width: u32, height: u32, rgb: Vec<u8>) -> Result<Self, ExportError> {
        let expected = width as usize * height as usize * 3;
        if width == 0 || height == 0 || rgb.len() != expected {
            return Err(ExportError::InvalidBitmap {
                width,
                height,
                len: rgb.len(),
            });
        }
        Ok(Self { width, height, rgb })
    }

    /// A bitmap filled with a single color.
    pub fn solid(width: u32, height: u32, color: Rgb) -> Result<Self, ExportError> {
        let pixel = [color.0, color.1, color.2];
        let rgb = pixel
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self::from_rgb(width, height, rgb)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.rgb
    }

    /// Returns the color of the pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        Some((self.rgb[offset], self.rgb[offset + 1], self.rgb[offset + 2]))
    }

    /// Encodes the bitmap as PNG.
    pub fn encode_png(&self) -> Result<EncodedImage, ExportError> {
        let buffer = RgbImage::from_raw(self.width, self.height, self.rgb.clone()).ok_or(
            ExportError::InvalidBitmap {
                width: self.width,
                height: self.height,
                len: self.rgb.len(),
            },
        )?;

        let mut png = Vec::new();
        DynamicImage::ImageRgb8(buffer)
            .write_to(&mut Cursor::new(&mut png), ImageOutputFormat::Png)
            .map_err(ExportError::Encode)?;

        Ok(EncodedImage {
            png,
            width: self.width,
            height: self.height,
        })
    }
}

/// A losslessly encoded bitmap.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    pub png: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Converts a rendered page into a bitmap.
pub trait Rasterizer {
    fn rasterize(&self, page: &Page, options: &RasterOptions) -> Result<Bitmap, ExportError>;
}

/// Rasterizer backed by `skrifa` outlines and `tiny-skia`.
#[derive(Clone, Debug)]
pub struct SkiaRasterizer {
    fonts: FontBytes,
}

impl SkiaRasterizer {
    pub fn new(fonts: FontBytes) -> Self {
        Self { fonts }
    }

    /// Locates the bundled fonts and builds a rasterizer from them.
    pub fn discover(fonts_dir: Option<&Path>) -> Result<Self, FontError> {
        FontBytes::discover(fonts_dir).map(Self::new)
    }

    fn faces(&self, style: FontStyle, size: f32) -> FaceSet<'_> {
        let primary = FontRef::new(self.fonts.style(style.bold, style.italic)).ok();
        let fallback = self
            .fonts
            .fallback()
            .and_then(|bytes| FontRef::new(bytes).ok());
        FaceSet {
            primary: primary.map(|font| Face::new(&font, size)),
            fallback: fallback.map(|font| Face::new(&font, size)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn draw_text(
        &self,
        pixmap: &mut Pixmap,
        transform: Transform,
        text: &str,
        x: f32,
        baseline: f32,
        size: f32,
        style: FontStyle,
        color: Rgb,
        underline: bool,
    ) {
        let faces = self.faces(style, size);

        let mut builder = PathBuilder::new();
        let mut cursor = x;
        for ch in text.chars() {
            let Some((face, glyph_id)) = faces.glyph(ch) else {
                continue;
            };
            if let Some(glyph) = face.outlines.get(glyph_id) {
                let mut pen = GlyphPen {
                    builder: &mut builder,
                    x: cursor,
                    y: baseline,
                };
                let settings = DrawSettings::unhinted(Size::new(size), LocationRef::default());
                if glyph.draw(settings, &mut pen).is_err() {
                    debug!("skipping undrawable glyph for {:?}", ch);
                }
            }
            cursor += face.metrics.advance_width(glyph_id).unwrap_or(0.0);
        }

        let paint = paint(color);
        if let Some(path) = builder.finish() {
            pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
        }

        if underline {
            let thickness = (size * 0.06).max(0.5);
            if let Some(rect) = Rect::from_xywh(x, baseline + size * 0.12, cursor - x, thickness) {
                pixmap.fill_rect(rect, &paint, transform, None);
            }
        }
    }
}

impl TextMeasure for SkiaRasterizer {
    fn advance(&self, text: &str, style: FontStyle, size: f32) -> f32 {
        let faces = self.faces(style, size);
        if faces.is_empty() {
            return MonospaceMeasure::default().advance(text, style, size);
        }
        text.chars()
            .filter_map(|ch| faces.glyph(ch))
            .map(|(face, glyph_id)| face.metrics.advance_width(glyph_id).unwrap_or(0.0))
            .sum()
    }

    fn ascent(&self, size: f32) -> f32 {
        FontRef::new(self.fonts.style(false, false))
            .map(|font| font.metrics(Size::new(size), LocationRef::default()).ascent)
            .unwrap_or(size * 0.8)
    }
}

impl Rasterizer for SkiaRasterizer {
    fn rasterize(&self, page: &Page, options: &RasterOptions) -> Result<Bitmap, ExportError> {
        let list = layout_page(page, &options.geometry, self);
        let width = (list.width * options.scale).ceil() as u32;
        let height = (list.height * options.scale).ceil() as u32;
        let mut pixmap =
            Pixmap::new(width, height).ok_or(ExportError::Canvas { width, height })?;

        let (r, g, b) = options.background;
        pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, 255));
        let transform = Transform::from_scale(options.scale, options.scale);

        for item in &list.items {
            match item {
                DisplayItem::Rect {
                    x,
                    y,
                    width,
                    height,
                    color,
                } => {
                    if let Some(rect) = Rect::from_xywh(*x, *y, *width, *height) {
                        pixmap.fill_rect(rect, &paint(*color), transform, None);
                    }
                }
                DisplayItem::Dot {
                    cx,
                    cy,
                    radius,
                    color,
                } => {
                    if let Some(path) = PathBuilder::from_circle(*cx, *cy, *radius) {
                        pixmap.fill_path(&path, &paint(*color), FillRule::Winding, transform, None);
                    }
                }
                DisplayItem::Text {
                    x,
                    baseline,
                    size,
                    style,
                    color,
                    underline,
                    text,
                } => self.draw_text(
                    &mut pixmap,
                    transform,
                    text,
                    *x,
                    *baseline,
                    *size,
                    *style,
                    *color,
                    *underline,
                ),
            }
        }

        debug!(
            "rasterized page at {}x: {}x{} px ({} items)",
            options.scale,
            width,
            height,
            list.items.len()
        );

        // The background is opaque, so premultiplied RGBA equals straight RGB.
        let rgb = pixmap
            .data()
            .chunks_exact(4)
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
            .collect();
        Bitmap::from_rgb(width, height, rgb)
    }
}

/// Per-size glyph tables of one font.
struct Face<'a> {
    charmap: Charmap<'a>,
    outlines: OutlineGlyphCollection<'a>,
    metrics: GlyphMetrics<'a>,
}

impl<'a> Face<'a> {
    fn new(font: &FontRef<'a>, size: f32) -> Self {
        Self {
            charmap: font.charmap(),
            outlines: font.outline_glyphs(),
            metrics: font.glyph_metrics(Size::new(size), LocationRef::default()),
        }
    }
}

/// The styled primary face and the fallback face, consulted in that order.
struct FaceSet<'a> {
    primary: Option<Face<'a>>,
    fallback: Option<Face<'a>>,
}

impl<'a> FaceSet<'a> {
    fn is_empty(&self) -> bool {
        self.primary.is_none() && self.fallback.is_none()
    }

    /// Face and glyph for `ch`; `.notdef` of the primary face when no face maps it.
    fn glyph(&self, ch: char) -> Option<(&Face<'a>, GlyphId)> {
        let faces = [self.primary.as_ref(), self.fallback.as_ref()];
        faces
            .iter()
            .flatten()
            .find_map(|face| face.charmap.map(ch).map(|glyph_id| (*face, glyph_id)))
            .or_else(|| {
                faces
                    .iter()
                    .flatten()
                    .next()
                    .map(|face| (*face, GlyphId::NOTDEF))
            })
    }
}

fn paint(color: Rgb) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.0, color.1, color.2, 255);
    paint.anti_alias = true;
    paint
}

/// Places glyph outlines (y-up, baseline origin) into a y-down page path.
struct GlyphPen<'a> {
    builder: &'a mut PathBuilder,
    x: f32,
    y: f32,
}

impl OutlinePen for GlyphPen<'_> {
    fn move_to(&mut self, x: f32, y: f32) {
        self.builder.move_to(self.x + x, self.y - y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.builder.line_to(self.x + x, self.y - y);
    }

    fn quad_to(&mut self, cx0: f32, cy0: f32, x: f32, y: f32) {
        self.builder
            .quad_to(self.x + cx0, self.y - cy0, self.x + x, self.y - y);
    }

    fn curve_to(&mut self, cx0: f32, cy0: f32, cx1: f32, cy1: f32, x: f32, y: f32) {
        self.builder.cubic_to(
            self.x + cx0,
            self.y - cy0,
            self.x + cx1,
            self.y - cy1,
            self.x + x,
            self.y - y,
        );
    }

    fn close(&mut self) {
        self.builder.close();
    }
}
