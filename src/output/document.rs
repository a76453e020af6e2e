use crate::paper::{ChapterPosition, Paper, Section};

pub const INTRODUCTION_HEADING: &str = "Einleitung";
pub const CONCLUSION_HEADING: &str = "Fazit";
pub const BIBLIOGRAPHY_HEADING: &str = "Literaturverzeichnis";

pub fn render_title(title: &str) -> String {
    format!("# Title: {}\n\n", title)
}

/// Heading line plus body of one section
pub fn render_section(section: &Section) -> String {
    let heading = match section.position {
        ChapterPosition::Introduction => format!("## {}", INTRODUCTION_HEADING),
        ChapterPosition::Chapter(n) => format!("## Kapitel {}: {}", n, section.heading),
        ChapterPosition::Conclusion => format!("## {}", CONCLUSION_HEADING),
    };
    format!("{}\n\n{}\n\n", heading, section.body.trim())
}

/// Numbered list of cited URLs; empty when nothing was cited
pub fn render_bibliography(urls: &[&str]) -> String {
    if urls.is_empty() {
        return String::new();
    }

    let mut content = format!("## {}\n\n", BIBLIOGRAPHY_HEADING);
    for (idx, url) in urls.iter().enumerate() {
        content.push_str(&format!("{}. {}\n", idx + 1, url));
    }
    content
}

/// The whole document, block by block in reading order
pub fn render_paper(paper: &Paper) -> String {
    let mut content = render_title(&paper.details.title);
    content.push_str(&render_section(&paper.introduction));
    for chapter in &paper.chapters {
        content.push_str(&render_section(chapter));
    }
    content.push_str(&render_section(&paper.conclusion));
    content.push_str(&render_bibliography(&paper.bibliography()));
    content
}
