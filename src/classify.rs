//! Project classification into the three project subsections.

use std::fmt;

use crate::record::ProjectEntry;

const CONTEST_TERMS: &[&str] = &["競賽", "contest"];
const EMC_TERMS: &[&str] = &["emc", "signal integrity"];
const EMC_TAG: &str = "EMC";

/// Derived category of a [`ProjectEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Contest,
    Emc,
    Eda,
}

impl Category {
    /// Order in which the project subsections are rendered.
    pub const RENDER_ORDER: [Category; 3] = [Category::Contest, Category::Eda, Category::Emc];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Contest => "Contest",
            Category::Emc => "EMC",
            Category::Eda => "EDA",
        };
        f.write_str(name)
    }
}

fn title_matches(title: &str, terms: &[&str]) -> bool {
    let folded = title.to_lowercase();
    terms.iter().any(|term| folded.contains(term))
}

/// Classifies a project. Contest wins over EMC; EDA is everything else.
pub fn classify(project: &ProjectEntry) -> Category {
    if title_matches(&project.title, CONTEST_TERMS) {
        Category::Contest
    } else if title_matches(&project.title, EMC_TERMS)
        || project.tags().iter().any(|tag| tag == EMC_TAG)
    {
        Category::Emc
    } else {
        Category::Eda
    }
}

/// Projects split by category, each bucket in input order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProjectBuckets<'a> {
    pub contest: Vec<&'a ProjectEntry>,
    pub eda: Vec<&'a ProjectEntry>,
    pub emc: Vec<&'a ProjectEntry>,
}

impl<'a> ProjectBuckets<'a> {
    /// Partitions `projects` with [`classify`].
    pub fn partition(projects: &'a [ProjectEntry]) -> Self {
        let mut buckets = Self::default();
        for project in projects {
            match classify(project) {
                Category::Contest => buckets.contest.push(project),
                Category::Eda => buckets.eda.push(project),
                Category::Emc => buckets.emc.push(project),
            }
        }
        buckets
    }

    /// Returns the bucket for `category`.
    pub fn get(&self, category: Category) -> &[&'a ProjectEntry] {
        match category {
            Category::Contest => &self.contest,
            Category::Eda => &self.eda,
            Category::Emc => &self.emc,
        }
    }

    /// Iterates over the non-empty buckets in [`Category::RENDER_ORDER`].
    pub fn non_empty(&self) -> impl Iterator<Item = (Category, &[&'a ProjectEntry])> + '_ {
        Category::RENDER_ORDER
            .into_iter()
            .map(move |category| (category, self.get(category)))
            .filter(|(_, bucket)| !bucket.is_empty())
    }

    pub fn len(&self) -> usize {
        self.contest.len() + self.eda.len() + self.emc.len()
    }
}
