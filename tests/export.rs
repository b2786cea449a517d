use std::cell::Cell;

use cv_export::export::{ExportError, Exporter, PageSize, PrintpdfWriter};
use cv_export::loader::LoadState;
use cv_export::raster::{Bitmap, RasterOptions, Rasterizer};
use cv_export::record::{CvRecord, Education, ProjectEntry, SkillGroup};
use cv_export::view::{render, render_page, Labels, Page, DEFAULT_FILENAME};
use lopdf::Document;

/// Returns a blank bitmap of fixed size and remembers the requested scale.
struct BlankRasterizer {
    width: u32,
    height: u32,
    last_scale: Cell<f32>,
}

impl BlankRasterizer {
    fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            last_scale: Cell::new(0.0),
        }
    }
}

impl Rasterizer for BlankRasterizer {
    fn rasterize(&self, _page: &Page, options: &RasterOptions) -> Result<Bitmap, ExportError> {
        self.last_scale.set(options.scale);
        Bitmap::solid(self.width, self.height, options.background)
    }
}

fn sample_record() -> CvRecord {
    CvRecord {
        name: "林育誠".into(),
        english_name: "Yu-Cheng Lin".into(),
        email: "yucheng@example.com".into(),
        projects: vec![ProjectEntry {
            title: "Maze Router".into(),
            start: "2022".into(),
            end: "2023".into(),
            advisor: "Prof. Chen".into(),
            org: None,
            tags: None,
            bullets: vec!["Lee routing".into()],
        }],
        education: vec![Education {
            school: "NTU".into(),
            program: "EE".into(),
            start: "2021".into(),
            end: "2025".into(),
            desc: "".into(),
        }],
        skills: vec![SkillGroup {
            category: "Languages".into(),
            items: vec!["Rust".into()],
        }],
        ..CvRecord::default()
    }
}

fn single_page_media_box(pdf: &[u8]) -> (usize, Vec<f32>) {
    let document = Document::load_mem(pdf).expect("parse exported PDF");
    let pages = document.get_pages();
    let page_id = *pages.values().next().expect("at least one page");
    let media_box = document
        .get_object(page_id)
        .and_then(|object| object.as_dict())
        .and_then(|dict| dict.get(b"MediaBox"))
        .and_then(|object| object.as_array())
        .expect("page has a MediaBox")
        .iter()
        .map(|value| value.as_float().expect("numeric MediaBox entry"))
        .collect();
    (pages.len(), media_box)
}

/// Operand lists of every `cm` operator on the single page, in stream order.
fn page_transforms(pdf: &[u8]) -> Vec<Vec<f32>> {
    let document = Document::load_mem(pdf).expect("parse exported PDF");
    let page_id = *document.get_pages().values().next().expect("one page");
    let content = document
        .get_and_decode_page_content(page_id)
        .expect("decode page content");
    content
        .operations
        .iter()
        .filter(|operation| operation.operator == "cm")
        .map(|operation| {
            operation
                .operands
                .iter()
                .map(|operand| operand.as_float().expect("numeric cm operand"))
                .collect()
        })
        .collect()
}

fn assert_close(actual: &[f32], expected: [f32; 6]) {
    assert_eq!(actual.len(), 6, "{:?}", actual);
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 0.1, "got {:?}, expected {:?}", actual, expected);
    }
}

#[test]
fn image_is_drawn_full_width_from_the_top_edge() {
    for (width, height) in [(1588_u32, 1200_u32), (800, 2000)] {
        let page = render_page(&sample_record(), &Labels::english());
        let exporter =
            Exporter::new(BlankRasterizer::new(width, height), PrintpdfWriter::default());

        let artifact = exporter.export(&page).expect("export");

        let drawn_height = 595.28 * height as f32 / width as f32;
        let bottom = 841.89 - drawn_height;
        let transforms = page_transforms(&artifact.pdf);
        assert!(transforms.len() >= 2, "{}x{}: {:?}", width, height, transforms);
        let image = transforms.len() - 2;
        assert_close(&transforms[image], [1.0, 0.0, 0.0, 1.0, 0.0, bottom]);
        assert_close(
            &transforms[image + 1],
            [595.28, 0.0, 0.0, drawn_height, 0.0, 0.0],
        );
    }
}

#[test]
fn short_page_is_exported_to_one_a4_page() {
    let page = render_page(&sample_record(), &Labels::english());
    let rasterizer = BlankRasterizer::new(1588, 1200);
    let exporter = Exporter::new(rasterizer, PrintpdfWriter::default());

    let artifact = exporter.export(&page).expect("export");

    assert!(artifact.pdf.starts_with(b"%PDF"));
    assert!(artifact.png.starts_with(b"\x89PNG"));
    assert_eq!((artifact.bitmap_width, artifact.bitmap_height), (1588, 1200));
    assert!((artifact.placement.width - PageSize::A4.width).abs() < 1e-9);
    assert!((artifact.placement.height - 595.28 * 1200.0 / 1588.0).abs() < 1e-6);

    let (page_count, media_box) = single_page_media_box(&artifact.pdf);
    assert_eq!(page_count, 1);
    assert_eq!(media_box.len(), 4);
    assert!((media_box[2] - 595.28).abs() < 0.5, "width {:?}", media_box);
    assert!((media_box[3] - 841.89).abs() < 0.5, "height {:?}", media_box);
}

#[test]
fn tall_page_is_clipped_not_paginated() {
    let page = render_page(&sample_record(), &Labels::english());
    let exporter = Exporter::new(BlankRasterizer::new(1588, 6000), PrintpdfWriter::default());

    let artifact = exporter.export(&page).expect("export");

    assert!(artifact.placement.height > PageSize::A4.height);
    assert!(artifact.placement.is_clipped(PageSize::A4));
    let (page_count, _) = single_page_media_box(&artifact.pdf);
    assert_eq!(page_count, 1);
}

#[test]
fn scale_is_forwarded_to_the_rasterizer() {
    let page = render_page(&sample_record(), &Labels::english());
    let exporter =
        Exporter::new(BlankRasterizer::new(10, 10), PrintpdfWriter::default()).with_scale(3.0);

    exporter.export(&page).expect("export");

    assert_eq!(exporter.options().scale, 3.0);
}

#[test]
fn page_size_and_options_are_configurable() {
    let letter = PageSize {
        width: 612.0,
        height: 792.0,
    };
    let page = render_page(&sample_record(), &Labels::english());
    let rasterizer = BlankRasterizer::new(100, 100);
    let options = RasterOptions {
        scale: 1.5,
        ..RasterOptions::default()
    };
    let exporter = Exporter::new(rasterizer, PrintpdfWriter::default())
        .with_options(options)
        .with_page_size(letter);

    let artifact = exporter.export(&page).expect("export");

    assert_eq!(exporter.options().scale, 1.5);
    assert!((artifact.placement.height - 612.0).abs() < 1e-9);
    let (_, media_box) = single_page_media_box(&artifact.pdf);
    assert!((media_box[2] - 612.0).abs() < 0.5);
    assert!((media_box[3] - 792.0).abs() < 0.5);
}

#[test]
fn placeholder_view_cannot_be_exported() {
    let exporter = Exporter::new(BlankRasterizer::new(10, 10), PrintpdfWriter::default());
    let view = render(&LoadState::Loading, &Labels::english());

    assert!(matches!(
        exporter.export_view(&view),
        Err(ExportError::NotReady)
    ));
}

#[test]
fn artifact_is_saved_under_the_requested_name() {
    let dir = tempfile::tempdir().expect("temp dir");
    let out = dir.path().join("nested");
    let page = render_page(&sample_record(), &Labels::english());
    let artifact = Exporter::new(BlankRasterizer::new(20, 30), PrintpdfWriter::new("CV"))
        .export(&page)
        .expect("export");

    let path = artifact.save(&out, DEFAULT_FILENAME).expect("save");

    assert_eq!(path, out.join("cv.pdf"));
    assert_eq!(std::fs::read(&path).expect("read back"), artifact.pdf);
}
