//! The structured CV record loaded once per session.
//!
//! Field names follow the camelCase keys of the JSON data file.  Optional sections are stored as
//! `Option<Vec<_>>` so that a missing key and an empty list can both be observed; the renderer treats
//! them identically through [`non_empty`].

use serde::{Deserialize, Serialize};

/// Immutable CV data as parsed from the data file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CvRecord {
    pub name: String,
    pub english_name: String,
    #[serde(default)]
    pub target_statement: Option<String>,
    #[serde(default)]
    pub overview: Option<Vec<String>>,
    pub email: String,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub links: Option<Vec<String>>,
    #[serde(default)]
    pub timeline: Option<Vec<TimelineEntry>>,
    #[serde(default)]
    pub clubs: Option<Vec<Club>>,
    #[serde(default)]
    pub sports: Option<Vec<String>>,
    pub projects: Vec<ProjectEntry>,
    pub education: Vec<Education>,
    pub skills: Vec<SkillGroup>,
}

impl CvRecord {
    /// Parses a record from raw JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// One term of the learning timeline.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub term: String,
    pub desc: String,
}

/// Club membership with an optional role and description.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub desc: Option<String>,
}

/// A project, competition or work item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub title: String,
    pub start: String,
    pub end: String,
    pub advisor: String,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    pub bullets: Vec<String>,
}

impl ProjectEntry {
    /// Creates an entry with only a title, mostly useful for classification.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Sets the tag list and returns the updated entry.
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the tags, treating a missing list as empty.
    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub school: String,
    pub program: String,
    pub start: String,
    pub end: String,
    pub desc: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillGroup {
    pub category: String,
    pub items: Vec<String>,
}

/// Returns the list when it is present and non-empty.
pub fn non_empty<T>(list: &Option<Vec<T>>) -> Option<&[T]> {
    match list {
        Some(items) if !items.is_empty() => Some(items.as_slice()),
        _ => None,
    }
}

/// Returns the text when it is present and non-empty.
pub fn non_blank(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|value| !value.is_empty())
}
