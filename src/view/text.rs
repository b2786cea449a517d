//! Plain-text preview of the view tree.

use std::fmt::{self, Write as _};

use super::{Block, Body, ContactLine, CvView, List, Page, Section};

const INDENT: &str = "  ";

impl fmt::Display for CvView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "== {} ==", self.toolbar.title)?;
        if let Some(action) = &self.toolbar.action {
            write!(f, "  [{}: {}]", action.label, action.filename)?;
        }
        writeln!(f)?;

        match &self.body {
            Body::Placeholder(message) => writeln!(f, "{}", message),
            Body::Page(page) => fmt::Display::fmt(page, f),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = self.header();
        writeln!(f, "{}", header.name_line)?;
        for line in &header.contact {
            match line {
                ContactLine::Text(text) => writeln!(f, "{INDENT}{}", text)?,
                ContactLine::Link(url) => writeln!(f, "{INDENT}<{}>", url)?,
                ContactLine::Pills(pills) => {
                    let joined = pills
                        .iter()
                        .map(|pill| format!("({})", pill))
                        .collect::<Vec<_>>()
                        .join(" ");
                    writeln!(f, "{INDENT}{}", joined)?
                }
            }
        }

        for section in self.sections() {
            writeln!(f)?;
            write_section(f, section)?;
        }

        writeln!(f)?;
        writeln!(f, "-- {} --", self.footer())
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, section: &Section) -> fmt::Result {
    writeln!(f, "## {}", section.title())?;
    for block in section.blocks() {
        match block {
            Block::Paragraph(paragraph) => writeln!(f, "{}", paragraph.text())?,
            Block::Heading(text) => writeln!(f, "### {}", text)?,
            Block::ItemHeading { title, trailing } => writeln!(f, "{}  ({})", title, trailing)?,
            Block::List(list) => write_list(f, list)?,
            Block::Timeline(items) => {
                for item in items {
                    writeln!(f, "o {}  {}", item.term, item.desc)?;
                }
            }
            Block::Tags(tags) => {
                let mut line = String::new();
                for tag in tags {
                    write!(line, "[{}] ", tag)?;
                }
                writeln!(f, "{}", line.trim_end())?;
            }
        }
    }
    Ok(())
}

fn write_list(f: &mut fmt::Formatter<'_>, list: &List) -> fmt::Result {
    for item in list.items() {
        let mut lines = item.lines().iter();
        if let Some(first) = lines.next() {
            writeln!(f, "- {}", first.text())?;
        }
        for line in lines {
            writeln!(f, "{INDENT}{}", line.text())?;
        }
    }
    Ok(())
}
