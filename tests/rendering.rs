use std::path::PathBuf;

use cv_export::document::render_text_pdf;
use cv_export::export::{Exporter, PageSize};
use cv_export::fonts::{self, FontBytes};
use cv_export::loader::{FileSource, Session};
use cv_export::raster::{RasterOptions, Rasterizer, SkiaRasterizer};
use cv_export::record::CvRecord;
use cv_export::view::{render_page, Labels, Page};
use sha2::{Digest, Sha256};

const SKIP_HINT: &str =
    "bundled fonts missing. Set CV_EXPORT_FONTS_DIR or copy the Roboto files into assets/fonts.";

fn sample_record() -> CvRecord {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let session = Session::load(&FileSource::new(root));
    session.record().expect("sample data parses").clone()
}

fn sample_page() -> Page {
    render_page(&sample_record(), &Labels::english())
}

fn page_named(name: &str) -> Page {
    let record = CvRecord {
        name: name.into(),
        ..sample_record()
    };
    render_page(&record, &Labels::english())
}

fn load_fonts() -> Option<FontBytes> {
    if !fonts::default_fonts_available() {
        return None;
    }
    Some(FontBytes::discover(None).expect("load bundled fonts"))
}

fn bitmap_hash(rasterizer: &SkiaRasterizer, page: &Page) -> [u8; 32] {
    let bitmap = rasterizer
        .rasterize(page, &RasterOptions::default())
        .expect("rasterize sample page");
    Sha256::digest(bitmap.pixels()).into()
}

#[test]
fn snapshot_has_oversampled_page_width() {
    let Some(fonts) = load_fonts() else {
        eprintln!("Skipping snapshot_has_oversampled_page_width: {}", SKIP_HINT);
        return;
    };
    let rasterizer = SkiaRasterizer::new(fonts);
    let options = RasterOptions::default();

    let bitmap = rasterizer
        .rasterize(&sample_page(), &options)
        .expect("rasterize sample page");

    assert_eq!(
        bitmap.width() as f32,
        (options.geometry.width * options.scale).ceil()
    );
    assert!(bitmap.height() > bitmap.width() / 2);
    assert_eq!(bitmap.pixel(0, 0), Some(options.background));
    assert!(
        bitmap.pixels().iter().any(|&channel| channel < 128),
        "text should leave dark pixels"
    );
}

#[test]
fn rasterizing_is_deterministic() {
    let Some(fonts) = load_fonts() else {
        eprintln!("Skipping rasterizing_is_deterministic: {}", SKIP_HINT);
        return;
    };
    let rasterizer = SkiaRasterizer::new(fonts);
    let page = sample_page();

    assert_eq!(
        bitmap_hash(&rasterizer, &page),
        bitmap_hash(&rasterizer, &page),
        "snapshots of the same page must be pixel-identical"
    );
}

#[test]
fn snapshot_export_fills_the_page_width() {
    let Some(fonts) = load_fonts() else {
        eprintln!("Skipping snapshot_export_fills_the_page_width: {}", SKIP_HINT);
        return;
    };

    let artifact = Exporter::snapshot(fonts)
        .export(&sample_page())
        .expect("export sample page");

    let expected_height = PageSize::A4.width * f64::from(artifact.bitmap_height)
        / f64::from(artifact.bitmap_width);
    assert!((artifact.placement.width - PageSize::A4.width).abs() < 1e-9);
    assert!((artifact.placement.height - expected_height).abs() < 1e-6);

    let document = lopdf::Document::load_mem(&artifact.pdf).expect("parse exported PDF");
    assert_eq!(document.get_pages().len(), 1);
}

#[test]
fn text_export_renders_non_empty_output() {
    let Some(fonts) = load_fonts() else {
        eprintln!("Skipping text_export_renders_non_empty_output: {}", SKIP_HINT);
        return;
    };

    let bytes = render_text_pdf(&sample_page(), &fonts, "CV").expect("typeset sample page");

    assert!(bytes.starts_with(b"%PDF"));
    let document = lopdf::Document::load_mem(&bytes).expect("parse text PDF");
    assert!(!document.get_pages().is_empty());
}

#[test]
fn cjk_names_are_drawn_from_the_fallback_face() {
    let Some(fonts) = load_fonts() else {
        eprintln!("Skipping cjk_names_are_drawn_from_the_fallback_face: {}", SKIP_HINT);
        return;
    };
    if fonts.fallback().is_none() {
        eprintln!(
            "Skipping cjk_names_are_drawn_from_the_fallback_face: no CJK font. Set {} or copy NotoSansTC-Regular.otf into assets/fonts.",
            fonts::CJK_FONT_ENV
        );
        return;
    }
    assert!(!fonts.primary_covers("林育誠"));
    let rasterizer = SkiaRasterizer::new(fonts);

    assert_ne!(
        bitmap_hash(&rasterizer, &page_named("林育誠")),
        bitmap_hash(&rasterizer, &page_named("王小明")),
        "different CJK names must not collapse into identical .notdef boxes"
    );
}

#[test]
fn text_export_switches_to_the_fallback_for_cjk_pages() {
    let Some(fonts) = load_fonts() else {
        eprintln!("Skipping text_export_switches_to_the_fallback_for_cjk_pages: {}", SKIP_HINT);
        return;
    };
    if fonts.fallback().is_none() {
        eprintln!("Skipping text_export_switches_to_the_fallback_for_cjk_pages: no CJK font.");
        return;
    }

    let bytes = render_text_pdf(&page_named("林育誠"), &fonts, "CV").expect("typeset CJK page");

    assert!(bytes.starts_with(b"%PDF"));
    assert!(!lopdf::Document::load_mem(&bytes)
        .expect("parse text PDF")
        .get_pages()
        .is_empty());
}
