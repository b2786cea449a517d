use std::fs;
use std::path::{Path, PathBuf};

use cv_export::classify::{Category, ProjectBuckets};
use cv_export::loader::{FileSource, LoadState, Session, DATA_PATH};
use cv_export::view::{render, Labels, SectionId};

fn write_data(root: &Path, body: &str) {
    let path = root.join(DATA_PATH);
    fs::create_dir_all(path.parent().expect("data dir")).expect("create data dir");
    fs::write(path, body).expect("write data file");
}

#[test]
fn loads_record_from_the_data_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    write_data(
        dir.path(),
        r#"{"name":"王小明","englishName":"Xiao-Ming Wang","email":"xm@example.com",
            "projects":[],"education":[],"skills":[],"sports":[]}"#,
    );

    let session = Session::load(&FileSource::new(dir.path()));
    let record = session.record().expect("record loaded");
    assert_eq!(record.english_name, "Xiao-Ming Wang");

    let view = render(session.state(), &Labels::english());
    let page = view.page().expect("page rendered");
    assert!(page.section(SectionId::Sports).is_none());
    assert!(page.section(SectionId::Education).is_some());
}

#[test]
fn missing_data_file_leaves_the_placeholder() {
    let dir = tempfile::tempdir().expect("temp dir");

    let session = Session::load(&FileSource::new(dir.path()));

    assert_eq!(session.state(), &LoadState::Failed);
    let view = render(session.state(), &Labels::english());
    assert!(view.is_placeholder());
    assert!(view.toolbar.action.is_none());
}

#[test]
fn bundled_sample_is_a_valid_record() {
    let root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let session = Session::load(&FileSource::new(root));
    let record = session.record().expect("sample data parses");

    let buckets = ProjectBuckets::partition(&record.projects);
    assert_eq!(buckets.len(), record.projects.len());
    assert_eq!(buckets.get(Category::Contest).len(), 2);
    assert_eq!(buckets.get(Category::Eda).len(), 1);
    assert_eq!(buckets.get(Category::Emc).len(), 2);
}
