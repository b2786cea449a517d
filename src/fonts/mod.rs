//! Font discovery shared by the rasterizer and the text PDF.
//!
//! The bundled Roboto family is looked up in this order:
//!
//! 1. an explicitly configured directory,
//! 2. the `CV_EXPORT_FONTS_DIR` environment variable,
//! 3. `assets/fonts` next to the running executable,
//! 4. `assets/fonts` in the crate root.
//!
//! The same bytes feed `skrifa` (snapshot export) and `genpdf` (text export).
//!
//! Roboto has no CJK coverage, so a single fallback face is picked up from `CV_EXPORT_CJK_FONT`,
//! an explicit path, or a `NotoSansTC-Regular` file next to the Roboto files.  Characters missing
//! from the primary face are drawn from the fallback.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use genpdf::fonts::{FontData, FontFamily};
use log::debug;
use thiserror::Error;

/// Environment variable that points at a directory holding the font files.
pub const FONTS_DIR_ENV: &str = "CV_EXPORT_FONTS_DIR";

/// Environment variable that points at a fallback font file with CJK coverage.
pub const CJK_FONT_ENV: &str = "CV_EXPORT_CJK_FONT";

/// File names looked up for the fallback face inside the fonts directory.
const CJK_FALLBACK_FILES: [&str; 2] = ["NotoSansTC-Regular.otf", "NotoSansTC-Regular.ttf"];

/// Name of the bundled font family.
pub const DEFAULT_FONT_FAMILY_NAME: &str = "Roboto";

const FONT_FILES: FontFiles = FontFiles {
    regular: "Roboto-Regular.ttf",
    bold: "Roboto-Bold.ttf",
    italic: "Roboto-Italic.ttf",
    bold_italic: "Roboto-BoldItalic.ttf",
};

struct FontFiles {
    regular: &'static str,
    bold: &'static str,
    italic: &'static str,
    bold_italic: &'static str,
}

impl FontFiles {
    fn all(&self) -> [&'static str; 4] {
        [self.regular, self.bold, self.italic, self.bold_italic]
    }
}

#[derive(Debug, Error)]
pub enum FontError {
    #[error("unable to locate the {family} font directory; checked: {checked}. Set {env} or pass a fonts directory")]
    NotFound {
        family: &'static str,
        checked: String,
        env: &'static str,
    },
    #[error("failed to read font file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("font file {path} is not a usable font: {message}")]
    Invalid { path: PathBuf, message: String },
}

fn font_directory_candidates(explicit: Option<&Path>) -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    let mut push = |candidate: PathBuf| {
        if !candidates.contains(&candidate) {
            candidates.push(candidate);
        }
    };

    if let Some(path) = explicit {
        push(path.to_path_buf());
    }

    if let Some(path) = env::var_os(FONTS_DIR_ENV).filter(|value| !value.is_empty()) {
        push(PathBuf::from(path));
    }

    if let Ok(current_exe) = env::current_exe() {
        if let Some(bin_dir) = current_exe.parent() {
            push(bin_dir.join("assets/fonts"));
        }
    }

    push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("assets/fonts"));
    candidates
}

fn missing_font_files(path: &Path) -> Vec<&'static str> {
    FONT_FILES
        .all()
        .into_iter()
        .filter(|name| !path.join(name).is_file())
        .collect()
}

/// Finds the first candidate directory that holds the complete font family.
pub fn resolve_font_directory(explicit: Option<&Path>) -> Result<PathBuf, FontError> {
    let mut attempts = Vec::new();

    for candidate in font_directory_candidates(explicit) {
        if !candidate.is_dir() {
            attempts.push(format!("{} (directory missing)", candidate.display()));
            continue;
        }

        let missing = missing_font_files(&candidate);
        if missing.is_empty() {
            debug!("using fonts from {}", candidate.display());
            return Ok(candidate);
        }
        attempts.push(format!(
            "{} (missing files [{}])",
            candidate.display(),
            missing.join(", ")
        ));
    }

    Err(FontError::NotFound {
        family: DEFAULT_FONT_FAMILY_NAME,
        checked: attempts.join(", "),
        env: FONTS_DIR_ENV,
    })
}

/// Indicates whether the bundled font family can be found without an explicit directory.
pub fn default_fonts_available() -> bool {
    resolve_font_directory(None).is_ok()
}

fn read_font(path: &Path) -> Result<Arc<Vec<u8>>, FontError> {
    let bytes = fs::read(path).map_err(|source| FontError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    skrifa::FontRef::new(&bytes).map_err(|err| FontError::Invalid {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    Ok(Arc::new(bytes))
}

/// Raw font bytes for the four styles of one family plus an optional fallback face.
#[derive(Clone, Debug)]
pub struct FontBytes {
    pub regular: Arc<Vec<u8>>,
    pub bold: Arc<Vec<u8>>,
    pub italic: Arc<Vec<u8>>,
    pub bold_italic: Arc<Vec<u8>>,
    pub fallback: Option<Arc<Vec<u8>>>,
}

impl FontBytes {
    /// Loads the family from `directory`, including a fallback face stored next to it.
    pub fn load_from(directory: &Path) -> Result<Self, FontError> {
        let read = |name: &str| read_font(&directory.join(name));

        let fallback = CJK_FALLBACK_FILES
            .iter()
            .map(|name| directory.join(name))
            .find(|path| path.is_file())
            .map(|path| read_font(&path))
            .transpose()?;

        Ok(Self {
            regular: read(FONT_FILES.regular)?,
            bold: read(FONT_FILES.bold)?,
            italic: read(FONT_FILES.italic)?,
            bold_italic: read(FONT_FILES.bold_italic)?,
            fallback,
        })
    }

    /// Resolves the font directory and loads the family.
    ///
    /// A fallback named by `CV_EXPORT_CJK_FONT` replaces one found in the directory.
    pub fn discover(explicit: Option<&Path>) -> Result<Self, FontError> {
        let directory = resolve_font_directory(explicit)?;
        let fonts = Self::load_from(&directory)?;
        match env::var_os(CJK_FONT_ENV).filter(|value| !value.is_empty()) {
            Some(path) => fonts.with_fallback_file(Path::new(&path)),
            None => Ok(fonts),
        }
    }

    /// Uses the font at `path` for characters the primary family cannot draw.
    pub fn with_fallback_file(mut self, path: &Path) -> Result<Self, FontError> {
        self.fallback = Some(read_font(path)?);
        debug!("using fallback font {}", path.display());
        Ok(self)
    }

    pub fn fallback(&self) -> Option<&[u8]> {
        self.fallback.as_deref().map(Vec::as_slice)
    }

    /// Whether the regular face maps every visible character of `text`.
    pub fn primary_covers(&self, text: &str) -> bool {
        use skrifa::MetadataProvider as _;

        let Ok(font) = skrifa::FontRef::new(self.regular.as_slice()) else {
            return false;
        };
        let charmap = font.charmap();
        text.chars()
            .filter(|ch| !ch.is_whitespace() && !ch.is_control())
            .all(|ch| charmap.map(ch).is_some())
    }

    /// Returns the bytes for the requested style.
    pub fn style(&self, bold: bool, italic: bool) -> &[u8] {
        match (bold, italic) {
            (false, false) => self.regular.as_slice(),
            (true, false) => self.bold.as_slice(),
            (false, true) => self.italic.as_slice(),
            (true, true) => self.bold_italic.as_slice(),
        }
    }

    /// Converts the family into `genpdf` font data.
    ///
    /// `genpdf` cannot mix faces within a run, so with `use_fallback` set (and a fallback loaded)
    /// every style is backed by the fallback face.
    pub fn to_genpdf_family(&self, use_fallback: bool) -> Result<FontFamily<FontData>, FontError> {
        let data = |bytes: &Arc<Vec<u8>>, name: &str| {
            FontData::new(bytes.as_ref().clone(), None).map_err(|err| FontError::Invalid {
                path: PathBuf::from(name),
                message: err.to_string(),
            })
        };

        if let (true, Some(fallback)) = (use_fallback, &self.fallback) {
            let face = |name: &str| data(fallback, name);
            return Ok(FontFamily {
                regular: face("fallback regular")?,
                bold: face("fallback bold")?,
                italic: face("fallback italic")?,
                bold_italic: face("fallback bold italic")?,
            });
        }

        Ok(FontFamily {
            regular: data(&self.regular, FONT_FILES.regular)?,
            bold: data(&self.bold, FONT_FILES.bold)?,
            italic: data(&self.italic, FONT_FILES.italic)?,
            bold_italic: data(&self.bold_italic, FONT_FILES.bold_italic)?,
        })
    }
}
