//! Maps a [`CvRecord`] into the view tree.
//!
//! Rendering is a pure function of the record and the [`Labels`]; project categories are
//! recomputed on every call.  Optional sections follow one rule: render iff present and non-empty.
//! Education and Skills are always rendered, even when their lists are empty.

mod model;
mod text;

pub use model::{
    Block, Column, ContactLine, Header, HorizontalAlignment, List, ListItem, Page, RichParagraph,
    Section, SectionId, TextSize, TimelineItem,
};

use crate::classify::{Category, ProjectBuckets};
use crate::loader::LoadState;
use crate::record::{non_blank, non_empty, CvRecord, ProjectEntry};
use crate::richtext::{Span, MUTED_COLOR};

/// File name offered by the toolbar download action.
pub const DEFAULT_FILENAME: &str = "cv.pdf";

/// User-visible strings and punctuation of the rendered view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Labels {
    pub toolbar_title: String,
    pub download: String,
    pub loading: String,
    pub footer: String,
    pub overview: String,
    pub timeline: String,
    pub projects: String,
    pub contest: String,
    pub eda: String,
    pub emc: String,
    pub education: String,
    pub skills: String,
    pub clubs: String,
    pub sports: String,
    pub open_paren: String,
    pub close_paren: String,
    pub comma: String,
    pub separator: String,
    pub colon: String,
    pub range: String,
}

impl Labels {
    pub fn english() -> Self {
        Self {
            toolbar_title: "CV Preview".into(),
            download: "Download PDF".into(),
            loading: "Loading data...".into(),
            footer: "Built with Rust".into(),
            overview: "Overview".into(),
            timeline: "Learning Path & Outlook".into(),
            projects: "Projects & Competitions".into(),
            contest: "Competitions".into(),
            eda: "EDA".into(),
            emc: "EMC".into(),
            education: "Education".into(),
            skills: "Skills & Tools".into(),
            clubs: "Clubs".into(),
            sports: "Sports".into(),
            open_paren: " (".into(),
            close_paren: ")".into(),
            comma: ", ".into(),
            separator: " | ".into(),
            colon: ": ".into(),
            range: " - ".into(),
        }
    }

    pub fn traditional_chinese() -> Self {
        Self {
            toolbar_title: "CV Preview".into(),
            download: "Download PDF".into(),
            loading: "Loading data...".into(),
            footer: "Built with Rust".into(),
            overview: "概述".into(),
            timeline: "學習脈絡與展望".into(),
            projects: "專題與競賽".into(),
            contest: "競賽".into(),
            eda: "EDA".into(),
            emc: "EMC".into(),
            education: "學歷".into(),
            skills: "技術與工具".into(),
            clubs: "社團參與".into(),
            sports: "運動習慣".into(),
            open_paren: "（".into(),
            close_paren: "）".into(),
            comma: "，".into(),
            separator: "｜".into(),
            colon: "：".into(),
            range: "—".into(),
        }
    }

    /// Subsection label of a project category.
    pub fn category(&self, category: Category) -> &str {
        match category {
            Category::Contest => &self.contest,
            Category::Eda => &self.eda,
            Category::Emc => &self.emc,
        }
    }

    fn parenthesized(&self, text: &str) -> String {
        format!("{}{}{}", self.open_paren, text, self.close_paren)
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}

/// The toolbar action that triggers the export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadAction {
    pub label: String,
    pub filename: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toolbar {
    pub title: String,
    /// Only present once a record is loaded.
    pub action: Option<DownloadAction>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    /// Shown while loading and after a failed load.
    Placeholder(String),
    Page(Page),
}

/// The complete rendered view: toolbar plus page or placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CvView {
    pub toolbar: Toolbar,
    pub body: Body,
}

impl CvView {
    /// Returns the exportable page, if a record was rendered.
    pub fn page(&self) -> Option<&Page> {
        match &self.body {
            Body::Page(page) => Some(page),
            Body::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, Body::Placeholder(_))
    }
}

/// Renders the view for the current load state.
pub fn render(state: &LoadState, labels: &Labels) -> CvView {
    match state.record() {
        Some(record) => render_record(record, labels),
        None => CvView {
            toolbar: Toolbar {
                title: labels.toolbar_title.clone(),
                action: None,
            },
            body: Body::Placeholder(labels.loading.clone()),
        },
    }
}

/// Renders the ready view of a loaded record.
pub fn render_record(record: &CvRecord, labels: &Labels) -> CvView {
    CvView {
        toolbar: Toolbar {
            title: labels.toolbar_title.clone(),
            action: Some(DownloadAction {
                label: labels.download.clone(),
                filename: DEFAULT_FILENAME.to_string(),
            }),
        },
        body: Body::Page(render_page(record, labels)),
    }
}

/// Renders the exportable page of a record.
pub fn render_page(record: &CvRecord, labels: &Labels) -> Page {
    let mut sections = Vec::new();

    if let Some(lines) = non_empty(&record.overview) {
        sections.push(
            Section::new(SectionId::Overview, &labels.overview, Column::Full)
                .with_block(Block::List(List::of_lines(lines.iter().cloned()))),
        );
    }

    if let Some(entries) = non_empty(&record.timeline) {
        let items = entries
            .iter()
            .map(|entry| TimelineItem {
                term: entry.term.clone(),
                desc: entry.desc.clone(),
            })
            .collect();
        sections.push(
            Section::new(SectionId::Timeline, &labels.timeline, Column::Full)
                .with_block(Block::Timeline(items)),
        );
    }

    sections.push(projects_section(&record.projects, labels));
    sections.push(education_section(record, labels));
    sections.push(skills_section(record, labels));

    if let Some(clubs) = non_empty(&record.clubs) {
        let items = clubs
            .iter()
            .map(|club| {
                let mut spans = vec![Span::new(club.name.as_str()).bold()];
                if let Some(role) = non_blank(&club.role) {
                    spans.push(Span::new(labels.parenthesized(role)));
                }
                let item = ListItem::new(RichParagraph::new(spans));
                match non_blank(&club.desc) {
                    Some(desc) => item.with_line(small_line(desc)),
                    None => item,
                }
            })
            .collect::<Vec<_>>();
        sections.push(
            Section::new(SectionId::Clubs, &labels.clubs, Column::Side)
                .with_block(Block::List(List::new(items))),
        );
    }

    if let Some(sports) = non_empty(&record.sports) {
        sections.push(
            Section::new(SectionId::Sports, &labels.sports, Column::Side)
                .with_block(Block::List(List::of_lines(sports.iter().cloned()).small())),
        );
    }

    Page::new(header(record, labels), sections, labels.footer.clone())
}

fn header(record: &CvRecord, labels: &Labels) -> Header {
    let mut contact = vec![ContactLine::Text(record.email.clone())];
    if let Some(github) = non_blank(&record.github) {
        contact.push(ContactLine::Link(github.to_string()));
    }
    if let Some(phone) = non_blank(&record.phone) {
        contact.push(ContactLine::Text(phone.to_string()));
    }
    if let Some(links) = non_empty(&record.links) {
        contact.push(ContactLine::Pills(links.to_vec()));
    }

    Header {
        name_line: format!(
            "{}{}",
            record.name,
            labels.parenthesized(&record.english_name)
        ),
        contact,
    }
}

fn small_line(text: &str) -> RichParagraph {
    RichParagraph::new(vec![Span::new(text).colored(MUTED_COLOR)]).with_size(TextSize::Small)
}

fn projects_section(projects: &[ProjectEntry], labels: &Labels) -> Section {
    let buckets = ProjectBuckets::partition(projects);
    let mut section = Section::new(SectionId::Projects, &labels.projects, Column::Main);
    for (category, bucket) in buckets.non_empty() {
        section = section.with_block(Block::Heading(labels.category(category).to_string()));
        for project in bucket {
            section = section.with_blocks(project_blocks(project, labels));
        }
    }
    section
}

fn project_blocks(project: &ProjectEntry, labels: &Labels) -> Vec<Block> {
    let mut blocks = vec![Block::ItemHeading {
        title: project.title.clone(),
        trailing: format!("{}{}{}", project.start, labels.range, project.end),
    }];

    let supervision = match non_blank(&project.org) {
        Some(org) => format!("{}{}{}", project.advisor, labels.separator, org),
        None => project.advisor.clone(),
    };
    blocks.push(Block::Paragraph(small_line(&supervision)));

    if !project.tags().is_empty() {
        blocks.push(Block::Tags(project.tags().to_vec()));
    }

    blocks.push(Block::List(List::of_lines(project.bullets.iter().cloned())));
    blocks
}

fn education_section(record: &CvRecord, labels: &Labels) -> Section {
    let items = record
        .education
        .iter()
        .map(|entry| {
            let first = RichParagraph::new(vec![
                Span::new(entry.school.as_str()).bold(),
                Span::new(format!(
                    "{}{}{}",
                    labels.comma,
                    entry.program,
                    labels.parenthesized(&format!("{}{}{}", entry.start, labels.range, entry.end))
                )),
            ]);
            ListItem::new(first).with_line(small_line(&entry.desc))
        })
        .collect::<Vec<_>>();
    Section::new(SectionId::Education, &labels.education, Column::Side)
        .with_block(Block::List(List::new(items)))
}

fn skills_section(record: &CvRecord, labels: &Labels) -> Section {
    let items = record
        .skills
        .iter()
        .map(|group| {
            ListItem::new(RichParagraph::new(vec![
                Span::new(format!("{}{}", group.category, labels.colon)).bold(),
                Span::new(group.items.join(", ")),
            ]))
        })
        .collect::<Vec<_>>();
    Section::new(SectionId::Skills, &labels.skills, Column::Side)
        .with_block(Block::List(List::new(items)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Club, Education, SkillGroup, TimelineEntry};

    fn record() -> CvRecord {
        CvRecord {
            name: "王小明".into(),
            english_name: "Xiao-Ming Wang".into(),
            email: "xm@example.com".into(),
            projects: vec![
                ProjectEntry {
                    title: "Placement Engine".into(),
                    start: "2023/02".into(),
                    end: "2023/12".into(),
                    advisor: "Prof. Lin".into(),
                    org: Some("EDA Lab".into()),
                    tags: None,
                    bullets: vec!["first".into(), "second".into()],
                },
                ProjectEntry::titled("EMC Filter Design"),
                ProjectEntry::titled("機器人競賽"),
            ],
            education: vec![Education {
                school: "NTU".into(),
                program: "EE".into(),
                start: "2021".into(),
                end: "2025".into(),
                desc: "GPA 4.0".into(),
            }],
            skills: vec![SkillGroup {
                category: "Languages".into(),
                items: vec!["Rust".into(), "C++".into()],
            }],
            ..CvRecord::default()
        }
    }

    fn titles(page: &Page) -> Vec<SectionId> {
        page.sections().iter().map(Section::id).collect()
    }

    #[test]
    fn overview_is_gated_on_content() {
        let labels = Labels::english();
        let mut data = record();
        data.overview = Some(Vec::new());
        assert!(render_page(&data, &labels).section(SectionId::Overview).is_none());

        data.overview = Some(vec!["a".into()]);
        let page = render_page(&data, &labels);
        let overview = page.section(SectionId::Overview).expect("overview rendered");
        match overview.blocks() {
            [Block::List(list)] => {
                assert_eq!(list.items().len(), 1);
                assert_eq!(list.items()[0].lines()[0].text(), "a");
            }
            other => panic!("unexpected overview blocks: {other:?}"),
        }
    }

    #[test]
    fn clubs_absent_and_empty_render_the_same() {
        let labels = Labels::english();
        let mut data = record();
        data.clubs = None;
        let absent = render_page(&data, &labels);
        data.clubs = Some(Vec::new());
        let empty = render_page(&data, &labels);
        assert!(absent.section(SectionId::Clubs).is_none());
        assert_eq!(absent, empty);
    }

    #[test]
    fn education_and_skills_always_render() {
        let labels = Labels::english();
        let mut data = record();
        data.education.clear();
        data.skills.clear();
        let page = render_page(&data, &labels);
        assert_eq!(
            titles(&page),
            [SectionId::Projects, SectionId::Education, SectionId::Skills]
        );
        let education = page.section(SectionId::Education).expect("education");
        assert!(matches!(education.blocks(), [Block::List(list)] if list.items().is_empty()));
    }

    #[test]
    fn section_order_follows_the_page_layout() {
        let labels = Labels::english();
        let mut data = record();
        data.overview = Some(vec!["o".into()]);
        data.timeline = Some(vec![TimelineEntry {
            term: "2023".into(),
            desc: "d".into(),
        }]);
        data.clubs = Some(vec![Club {
            name: "Chess".into(),
            role: Some("Lead".into()),
            desc: None,
        }]);
        data.sports = Some(vec!["Running".into()]);
        assert_eq!(
            titles(&render_page(&data, &labels)),
            [
                SectionId::Overview,
                SectionId::Timeline,
                SectionId::Projects,
                SectionId::Education,
                SectionId::Skills,
                SectionId::Clubs,
                SectionId::Sports,
            ]
        );
    }

    #[test]
    fn projects_are_grouped_contest_eda_emc() {
        let labels = Labels::english();
        let page = render_page(&record(), &labels);
        let projects = page.section(SectionId::Projects).expect("projects");
        let headings: Vec<_> = projects
            .blocks()
            .iter()
            .filter_map(|block| match block {
                Block::Heading(text) => Some(text.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(headings, ["Competitions", "EDA", "EMC"]);
    }

    #[test]
    fn project_item_joins_advisor_and_org() {
        let labels = Labels::traditional_chinese();
        let blocks = project_blocks(&record().projects[0], &labels);
        assert_eq!(
            blocks[0],
            Block::ItemHeading {
                title: "Placement Engine".into(),
                trailing: "2023/02—2023/12".into(),
            }
        );
        match &blocks[1] {
            Block::Paragraph(line) => assert_eq!(line.text(), "Prof. Lin｜EDA Lab"),
            other => panic!("unexpected block {other:?}"),
        }
        assert!(!blocks.iter().any(|block| matches!(block, Block::Tags(_))));
    }

    #[test]
    fn header_concatenates_names_and_gates_contacts() {
        let labels = Labels::traditional_chinese();
        let mut data = record();
        data.github = Some(String::new());
        data.phone = Some("0912-345-678".into());
        data.links = Some(Vec::new());
        let page = render_page(&data, &labels);
        assert_eq!(page.header().name_line, "王小明（Xiao-Ming Wang）");
        assert_eq!(
            page.header().contact,
            [
                ContactLine::Text("xm@example.com".into()),
                ContactLine::Text("0912-345-678".into()),
            ]
        );
    }

    #[test]
    fn placeholder_for_loading_and_failed_states() {
        let labels = Labels::english();
        let loading = render(&LoadState::Loading, &labels);
        let failed = render(&LoadState::Failed, &labels);
        assert_eq!(loading, failed);
        assert!(loading.is_placeholder());
        assert!(loading.toolbar.action.is_none());

        let ready = render(&LoadState::Ready(record()), &labels);
        let action = ready.toolbar.action.as_ref().expect("download action");
        assert_eq!(action.filename, DEFAULT_FILENAME);
        assert_eq!(action.label, "Download PDF");
    }

    #[test]
    fn rendering_is_repeatable() {
        let labels = Labels::english();
        let data = record();
        assert_eq!(render_record(&data, &labels), render_record(&data, &labels));
    }
}
