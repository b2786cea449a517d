//! Loading the CV record and tracking the load lifecycle.
//!
//! A [`Session`] starts in [`LoadState::Loading`] and performs exactly one fetch.  Any failure
//! (missing file, HTTP error, malformed JSON, missing required fields) moves it to
//! [`LoadState::Failed`]; the failure is logged and otherwise swallowed, so the view shows the same
//! placeholder as while loading.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use thiserror::Error;

use crate::record::CvRecord;

/// Fixed location of the data file, relative to the data root.
pub const DATA_PATH: &str = "data/sample.json";

/// Errors that prevent a record from being loaded.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[cfg(feature = "remote")]
    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[cfg(feature = "remote")]
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("data is not a valid CV record")]
    Parse(#[from] serde_json::Error),
}

/// Where the JSON document comes from.
pub trait DataSource {
    /// Fetches the raw JSON bytes, bypassing any cache.
    fn fetch(&self) -> Result<Vec<u8>, LoadError>;

    /// Human-readable location used in log messages.
    fn describe(&self) -> String;
}

/// Reads [`DATA_PATH`] below a root directory on every fetch.
#[derive(Clone, Debug)]
pub struct FileSource {
    root: PathBuf,
}

impl FileSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Full path of the data file.
    pub fn path(&self) -> PathBuf {
        self.root.join(DATA_PATH)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl DataSource for FileSource {
    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        let path = self.path();
        fs::read(&path).map_err(|source| LoadError::Io { path, source })
    }

    fn describe(&self) -> String {
        self.path().display().to_string()
    }
}

/// Fetches [`DATA_PATH`] from a web server with caching disabled.
#[cfg(feature = "remote")]
#[derive(Debug)]
pub struct HttpSource {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::blocking::Client::new(),
        }
    }

    pub fn url(&self) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), DATA_PATH)
    }
}

#[cfg(feature = "remote")]
impl DataSource for HttpSource {
    fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        use reqwest::header::{CACHE_CONTROL, PRAGMA};

        let url = self.url();
        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-store")
            .header(PRAGMA, "no-cache")
            .send()
            .map_err(|source| LoadError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|source| LoadError::Http { url, source })
    }

    fn describe(&self) -> String {
        self.url()
    }
}

/// Lifecycle of the CV record.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Loading,
    Ready(CvRecord),
    Failed,
}

impl LoadState {
    /// Returns the record once loading succeeded.
    pub fn record(&self) -> Option<&CvRecord> {
        match self {
            LoadState::Ready(record) => Some(record),
            LoadState::Loading | LoadState::Failed => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, LoadState::Ready(_))
    }
}

/// Owns the load state for one run of the application.
#[derive(Debug, Default)]
pub struct Session {
    state: LoadState,
}

impl Session {
    /// Creates a session in the initial loading state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session and immediately performs its single load.
    pub fn load(source: &dyn DataSource) -> Self {
        let mut session = Self::new();
        session.complete(fetch_record(source));
        session
    }

    /// Applies the outcome of the load. Only the first completion has an effect.
    pub fn complete(&mut self, outcome: Result<CvRecord, LoadError>) {
        if !matches!(self.state, LoadState::Loading) {
            debug!("ignoring repeated load completion");
            return;
        }

        self.state = match outcome {
            Ok(record) => LoadState::Ready(record),
            Err(err) => {
                warn!("CV data unavailable: {}", error_chain(&err));
                LoadState::Failed
            }
        };
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn record(&self) -> Option<&CvRecord> {
        self.state.record()
    }
}

/// Fetches and parses the record from `source`.
pub fn fetch_record(source: &dyn DataSource) -> Result<CvRecord, LoadError> {
    debug!("fetching CV data from {}", source.describe());
    let bytes = source.fetch()?;
    let record = CvRecord::from_json_slice(&bytes)?;
    info!(
        "loaded CV for {} ({} projects) from {}",
        record.english_name,
        record.projects.len(),
        source.describe()
    );
    Ok(record)
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
