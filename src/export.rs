//! Snapshot export: rasterize the rendered page and wrap it in a single-page PDF.
//!
//! The bitmap is placed at the top-left corner of an A4 portrait page and scaled to the full page
//! width.  Content taller than the page is clipped at the bottom edge; there is no pagination.

use std::fs;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use log::{info, warn};
use printpdf::{Mm, PdfDocument};
use thiserror::Error;

use crate::fonts::{FontBytes, FontError};
use crate::raster::{EncodedImage, RasterOptions, Rasterizer, SkiaRasterizer};
use crate::view::{CvView, Page};

const MM_PER_PT: f64 = 25.4 / 72.0;

/// Errors raised while producing or saving an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("the CV has not loaded, there is nothing to export")]
    NotReady,
    #[error(transparent)]
    Fonts(#[from] FontError),
    #[error("unable to allocate a {width}x{height} canvas")]
    Canvas { width: u32, height: u32 },
    #[error("bitmap buffer of {len} bytes does not match {width}x{height} RGB")]
    InvalidBitmap { width: u32, height: u32, len: usize },
    #[error("failed to encode the snapshot")]
    Encode(#[source] image::ImageError),
    #[error("failed to write the PDF: {0}")]
    Pdf(String),
    #[error("failed to typeset the PDF")]
    Typeset(#[from] genpdf::error::Error),
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Page dimensions in PDF points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// ISO A4 portrait.
    pub const A4: PageSize = PageSize {
        width: 595.28,
        height: 841.89,
    };

    pub fn width_mm(&self) -> f64 {
        self.width * MM_PER_PT
    }

    pub fn height_mm(&self) -> f64 {
        self.height * MM_PER_PT
    }
}

impl Default for PageSize {
    fn default() -> Self {
        PageSize::A4
    }
}

/// Where the snapshot lands on the page, in points measured from the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Placement {
    /// Scales a `bitmap_width` x `bitmap_height` image to the page width, keeping its aspect ratio.
    pub fn fit_width(bitmap_width: u32, bitmap_height: u32, page: PageSize) -> Placement {
        let height = if bitmap_width == 0 {
            0.0
        } else {
            page.width * f64::from(bitmap_height) / f64::from(bitmap_width)
        };
        Placement {
            x: 0.0,
            y: 0.0,
            width: page.width,
            height,
        }
    }

    /// Whether part of the image falls below the bottom edge of `page`.
    pub fn is_clipped(&self, page: PageSize) -> bool {
        self.y + self.height > page.height
    }
}

/// Builds a one-page PDF around an encoded image.
pub trait PageWriter {
    fn write_single_page(&self, image: &EncodedImage, page: PageSize) -> Result<Vec<u8>, ExportError>;
}

/// [`PageWriter`] backed by `printpdf`.
#[derive(Clone, Debug)]
pub struct PrintpdfWriter {
    title: String,
}

impl PrintpdfWriter {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }
}

impl Default for PrintpdfWriter {
    fn default() -> Self {
        Self::new("CV")
    }
}

impl PageWriter for PrintpdfWriter {
    fn write_single_page(&self, image: &EncodedImage, page: PageSize) -> Result<Vec<u8>, ExportError> {
        let decoded = image::load_from_memory(&image.png).map_err(ExportError::Encode)?;
        let placement = Placement::fit_width(image.width, image.height, page);

        let (document, page_index, layer_index) = PdfDocument::new(
            self.title.as_str(),
            Mm(page.width_mm()),
            Mm(page.height_mm()),
            "Snapshot",
        );
        let layer = document.get_page(page_index).get_layer(layer_index);

        // At 72 dpi one pixel is one point; PDF y grows upwards from the bottom edge.
        let scale = placement.width / f64::from(image.width);
        let bottom = page.height - placement.y - placement.height;
        printpdf::Image::from_dynamic_image(&decoded).add_to_layer(
            layer,
            Some(Mm(placement.x * MM_PER_PT)),
            Some(Mm(bottom * MM_PER_PT)),
            None,
            Some(scale),
            Some(scale),
            Some(72.0),
        );

        let mut writer = BufWriter::new(Vec::new());
        document
            .save(&mut writer)
            .map_err(|err| ExportError::Pdf(err.to_string()))?;
        writer
            .into_inner()
            .map_err(|err| ExportError::Pdf(err.to_string()))
    }
}

/// Result of one export.
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    pub pdf: Vec<u8>,
    pub png: Vec<u8>,
    pub placement: Placement,
    pub bitmap_width: u32,
    pub bitmap_height: u32,
}

impl ExportArtifact {
    /// Writes the PDF to `dir/filename`, creating `dir` if needed.
    pub fn save(&self, dir: &Path, filename: &str) -> Result<PathBuf, ExportError> {
        write_file(dir, filename, &self.pdf)
    }

    /// Writes the PNG snapshot to `dir/filename`.
    pub fn save_png(&self, dir: &Path, filename: &str) -> Result<PathBuf, ExportError> {
        write_file(dir, filename, &self.png)
    }
}

/// Writes `bytes` to `dir/filename`, creating `dir` if needed.
pub fn write_file(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let path = dir.join(filename);
    fs::write(&path, bytes).map_err(|source| ExportError::Io {
        path: path.clone(),
        source,
    })?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Rasterizes pages and wraps them into single-page PDFs.
#[derive(Clone, Debug)]
pub struct Exporter<R, W> {
    rasterizer: R,
    writer: W,
    options: RasterOptions,
    page_size: PageSize,
}

impl Exporter<SkiaRasterizer, PrintpdfWriter> {
    /// Exporter using the bundled fonts, `tiny-skia` and `printpdf`.
    pub fn snapshot(fonts: FontBytes) -> Self {
        Exporter::new(SkiaRasterizer::new(fonts), PrintpdfWriter::default())
    }
}

impl<R: Rasterizer, W: PageWriter> Exporter<R, W> {
    pub fn new(rasterizer: R, writer: W) -> Self {
        Self {
            rasterizer,
            writer,
            options: RasterOptions::default(),
            page_size: PageSize::A4,
        }
    }

    pub fn with_options(mut self, options: RasterOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_scale(mut self, scale: f32) -> Self {
        self.options.scale = scale;
        self
    }

    pub fn with_page_size(mut self, page_size: PageSize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn options(&self) -> &RasterOptions {
        &self.options
    }

    /// Exports the page of a loaded view.
    pub fn export_view(&self, view: &CvView) -> Result<ExportArtifact, ExportError> {
        let page = view.page().ok_or(ExportError::NotReady)?;
        self.export(page)
    }

    /// Rasterizes `page`, encodes it as PNG and places it on a single PDF page.
    pub fn export(&self, page: &Page) -> Result<ExportArtifact, ExportError> {
        let bitmap = self.rasterizer.rasterize(page, &self.options)?;
        let encoded = bitmap.encode_png()?;
        let pdf = self.writer.write_single_page(&encoded, self.page_size)?;

        let placement = Placement::fit_width(bitmap.width(), bitmap.height(), self.page_size);
        if placement.is_clipped(self.page_size) {
            warn!(
                "snapshot is {:.0} pt tall; everything below {:.0} pt is clipped",
                placement.height, self.page_size.height
            );
        }
        info!(
            "exported {}x{} px snapshot into a {} byte PDF",
            bitmap.width(),
            bitmap.height(),
            pdf.len()
        );

        Ok(ExportArtifact {
            pdf,
            png: encoded.png,
            placement,
            bitmap_width: bitmap.width(),
            bitmap_height: bitmap.height(),
        })
    }
}
