//! Persistence for papers, chapters and sources.
//!
//! Cross-table references are kept as comma-joined id lists; every statement
//! is parameterized and the schema is fixed.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::error::StoreError;
use crate::paper::{ChapterPosition, Outline, Paper, PaperDetails, Section, Source};
use async_trait::async_trait;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPaper {
    pub id: i64,
    pub request: String,
    pub details: Option<PaperDetails>,
    pub chapter_ids: Vec<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChapter {
    pub id: i64,
    pub position: ChapterPosition,
    pub heading: String,
    pub body: String,
    pub source_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSource {
    pub id: i64,
    pub url: String,
    pub summary: Option<String>,
}

#[async_trait]
pub trait PaperStore: Send + Sync {
    async fn create_paper(&self, request: &str) -> Result<i64, StoreError>;

    async fn set_paper_details(&self, paper_id: i64, details: &PaperDetails)
        -> Result<(), StoreError>;

    async fn set_paper_chapters(&self, paper_id: i64, chapter_ids: &[i64])
        -> Result<(), StoreError>;

    async fn paper(&self, paper_id: i64) -> Result<StoredPaper, StoreError>;

    async fn list_papers(&self) -> Result<Vec<StoredPaper>, StoreError>;

    async fn insert_chapter(
        &self,
        position: ChapterPosition,
        heading: &str,
        body: &str,
        source_ids: &[i64],
    ) -> Result<i64, StoreError>;

    async fn chapter(&self, chapter_id: i64) -> Result<StoredChapter, StoreError>;

    /// Insert a source URL, returning the existing id when the URL is known
    async fn insert_source(&self, url: &str) -> Result<i64, StoreError>;

    async fn set_source_summary(&self, source_id: i64, summary: &str) -> Result<(), StoreError>;

    async fn source(&self, source_id: i64) -> Result<StoredSource, StoreError>;
}

pub fn join_ids(ids: &[i64]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

pub fn split_ids(raw: &str) -> Result<Vec<i64>, StoreError> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|part| {
            part.trim()
                .parse::<i64>()
                .map_err(|_| StoreError::MalformedIdList(raw.to_string()))
        })
        .collect()
}

/// Rebuild a stored paper with its sections and cited sources
pub async fn load_paper(store: &dyn PaperStore, paper_id: i64) -> Result<Paper, StoreError> {
    let stored = store.paper(paper_id).await?;

    let mut sources: Vec<Source> = Vec::new();
    let mut by_id: HashMap<i64, usize> = HashMap::new();
    let mut introduction = None;
    let mut conclusion = None;
    let mut chapters = Vec::new();

    for chapter_id in &stored.chapter_ids {
        let chapter = store.chapter(*chapter_id).await?;
        let mut cited = Vec::new();
        for source_id in &chapter.source_ids {
            let idx = match by_id.get(source_id) {
                Some(idx) => *idx,
                None => {
                    let source = store.source(*source_id).await?;
                    sources.push(Source {
                        store_id: Some(source.id),
                        url: source.url,
                        summary: source.summary,
                    });
                    by_id.insert(*source_id, sources.len() - 1);
                    sources.len() - 1
                }
            };
            if !cited.contains(&idx) {
                cited.push(idx);
            }
        }

        let section = Section {
            position: chapter.position,
            heading: chapter.heading,
            body: chapter.body,
            sources: cited,
        };
        match section.position {
            ChapterPosition::Introduction => introduction = Some(section),
            ChapterPosition::Conclusion => conclusion = Some(section),
            ChapterPosition::Chapter(_) => chapters.push(section),
        }
    }
    chapters.sort_by_key(|c| match c.position {
        ChapterPosition::Chapter(n) => n,
        _ => 0,
    });

    let empty = |position| Section {
        position,
        heading: String::new(),
        body: String::new(),
        sources: Vec::new(),
    };

    Ok(Paper {
        request_id: format!("paper-{}", stored.id),
        details: stored.details.unwrap_or_else(PaperDetails::sentinel),
        outline: Outline(chapters.iter().map(|c| c.heading.clone()).collect()),
        introduction: introduction.unwrap_or_else(|| empty(ChapterPosition::Introduction)),
        chapters,
        conclusion: conclusion.unwrap_or_else(|| empty(ChapterPosition::Conclusion)),
        sources,
    })
}
