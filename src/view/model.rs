//! Data structures describing the rendered CV view.
//!
//! The view tree is the "on-screen" document: every output (text preview, raster snapshot,
//! typeset PDF) walks these types and nothing else.  They avoid referencing the outputs so a view
//! can be compared in tests without fonts or a PDF backend.

use crate::richtext::{plain_text, Span};

/// Relative text size of a paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextSize {
    #[default]
    Body,
    /// Secondary lines: descriptions, dates, the footer.
    Small,
}

/// Horizontal alignment of a paragraph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HorizontalAlignment {
    #[default]
    Left,
    Center,
    Right,
}

/// Rich text paragraph carrying inline styling, size and alignment.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RichParagraph {
    spans: Vec<Span>,
    size: TextSize,
    alignment: HorizontalAlignment,
}

impl RichParagraph {
    /// Creates a body-sized, left aligned paragraph from the provided spans.
    pub fn new(spans: impl Into<Vec<Span>>) -> Self {
        Self {
            spans: spans.into(),
            ..Self::default()
        }
    }

    /// Creates a paragraph holding a single unstyled span.
    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(vec![Span::new(text)])
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn size(&self) -> TextSize {
        self.size
    }

    pub fn alignment(&self) -> HorizontalAlignment {
        self.alignment
    }

    /// Returns the concatenated text of the paragraph.
    pub fn text(&self) -> String {
        plain_text(&self.spans)
    }

    pub fn with_size(mut self, size: TextSize) -> Self {
        self.size = size;
        self
    }

    pub fn with_alignment(mut self, alignment: HorizontalAlignment) -> Self {
        self.alignment = alignment;
        self
    }
}

/// One list item, made of one or more stacked lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListItem {
    lines: Vec<RichParagraph>,
}

impl ListItem {
    pub fn new(first: RichParagraph) -> Self {
        Self { lines: vec![first] }
    }

    /// Appends a line rendered below the previous ones, as after a line break.
    pub fn with_line(mut self, line: RichParagraph) -> Self {
        self.lines.push(line);
        self
    }

    pub fn lines(&self) -> &[RichParagraph] {
        &self.lines
    }
}

/// A bulleted list.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct List {
    items: Vec<ListItem>,
    small: bool,
}

impl List {
    pub fn new(items: impl Into<Vec<ListItem>>) -> Self {
        Self {
            items: items.into(),
            small: false,
        }
    }

    /// Builds a list where every item is a single unstyled line.
    pub fn of_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            lines
                .into_iter()
                .map(|line| ListItem::new(RichParagraph::plain(line)))
                .collect::<Vec<_>>(),
        )
    }

    pub fn items(&self) -> &[ListItem] {
        &self.items
    }

    pub fn is_small(&self) -> bool {
        self.small
    }

    /// Renders every item with the small text size.
    pub fn small(mut self) -> Self {
        self.small = true;
        self
    }
}

/// A term/description pair on the timeline, drawn next to a marker dot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TimelineItem {
    pub term: String,
    pub desc: String,
}

/// Individual content blocks that make up sections.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Block {
    /// Styled paragraph content.
    Paragraph(RichParagraph),
    /// A subsection label such as a project category.
    Heading(String),
    /// An item title with a trailing, right-aligned note (the project date range).
    ItemHeading { title: String, trailing: String },
    List(List),
    Timeline(Vec<TimelineItem>),
    /// A row of tag chips.
    Tags(Vec<String>),
}

/// Placement of a section in the page grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    /// Spans the whole page width.
    Full,
    /// The wide left column (7/12).
    Main,
    /// The narrow right column (5/12).
    Side,
}

impl Column {
    /// Relative weight of the column inside the two-column row.
    pub fn weight(self) -> usize {
        match self {
            Column::Full => 12,
            Column::Main => 7,
            Column::Side => 5,
        }
    }
}

/// Stable identifiers of the page sections.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SectionId {
    Overview,
    Timeline,
    Projects,
    Education,
    Skills,
    Clubs,
    Sports,
}

/// Logical representation of a page section.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Section {
    id: SectionId,
    title: String,
    column: Column,
    blocks: Vec<Block>,
}

impl Section {
    pub fn new(id: SectionId, title: impl Into<String>, column: Column) -> Self {
        Self {
            id,
            title: title.into(),
            column,
            blocks: Vec::new(),
        }
    }

    pub fn id(&self) -> SectionId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn column(&self) -> Column {
        self.column
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Appends a block and returns the updated section.
    pub fn with_block(mut self, block: Block) -> Self {
        self.blocks.push(block);
        self
    }

    /// Extends the section with additional blocks and returns the updated instance.
    pub fn with_blocks<I>(mut self, blocks: I) -> Self
    where
        I: IntoIterator<Item = Block>,
    {
        self.blocks.extend(blocks);
        self
    }
}

/// One line of the contact block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContactLine {
    Text(String),
    Link(String),
    /// Extra links shown as pills.
    Pills(Vec<String>),
}

/// The page header: name line plus contact block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub name_line: String,
    pub contact: Vec<ContactLine>,
}

/// The exportable page: everything below the toolbar.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Page {
    header: Header,
    sections: Vec<Section>,
    footer: String,
}

impl Page {
    pub fn new(header: Header, sections: Vec<Section>, footer: impl Into<String>) -> Self {
        Self {
            header,
            sections,
            footer: footer.into(),
        }
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// Returns the section with the given identifier, if it was rendered.
    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|section| section.id == id)
    }

    /// Sections placed in the given column, in page order.
    pub fn sections_in(&self, column: Column) -> impl Iterator<Item = &Section> {
        self.sections
            .iter()
            .filter(move |section| section.column == column)
    }
}
