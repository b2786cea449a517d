//! Renders a CV from a JSON record and exports it as a single-page PDF snapshot.
//!
//! The pipeline is: [`loader`] fetches the [`record::CvRecord`], [`view`] maps it into a page tree
//! (with projects grouped by [`classify`]), and [`export`] rasterizes that page through [`raster`]
//! and wraps the bitmap into an A4 PDF.  [`document`] offers a paginated text PDF of the same page.

pub mod classify;
pub mod document;
pub mod export;
pub mod fonts;
pub mod layout;
pub mod loader;
pub mod raster;
pub mod record;
pub mod richtext;
pub mod view;

pub use export::{ExportArtifact, ExportError, Exporter};
pub use loader::{LoadState, Session};
pub use record::CvRecord;
pub use view::{render, CvView, Labels};
