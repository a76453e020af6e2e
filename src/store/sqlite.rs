use super::{join_ids, split_ids, PaperStore, StoredChapter, StoredPaper, StoredSource};
use crate::error::StoreError;
use crate::paper::{ChapterPosition, PaperDetails};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use tracing::debug;

const SCHEMA: [&str; 3] = [
    r#"CREATE TABLE IF NOT EXISTS papers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        request TEXT NOT NULL,
        topic TEXT,
        title TEXT,
        question TEXT,
        chapter_ids TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS chapters (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        position TEXT NOT NULL,
        heading TEXT NOT NULL,
        body TEXT NOT NULL,
        source_ids TEXT NOT NULL DEFAULT ''
    )"#,
    r#"CREATE TABLE IF NOT EXISTS sources (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        url TEXT NOT NULL UNIQUE,
        summary TEXT
    )"#,
];

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) the database file and ensure the schema exists
    pub async fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        debug!("Opened store {}", path.display());
        Self::with_pool(pool).await
    }

    /// Database that lives as long as the store
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        Ok(Self { pool })
    }
}

fn paper_from_row(row: &SqliteRow) -> Result<StoredPaper, StoreError> {
    let topic: Option<String> = row.try_get("topic")?;
    let title: Option<String> = row.try_get("title")?;
    let question: Option<String> = row.try_get("question")?;
    let details = match (topic, title, question) {
        (Some(topic), Some(title), Some(question)) => Some(PaperDetails {
            topic,
            title,
            question,
        }),
        _ => None,
    };
    let chapter_ids: String = row.try_get("chapter_ids")?;

    Ok(StoredPaper {
        id: row.try_get("id")?,
        request: row.try_get("request")?,
        details,
        chapter_ids: split_ids(&chapter_ids)?,
        created_at: row.try_get("created_at")?,
    })
}

fn expect_updated(rows: u64, table: &'static str, id: i64) -> Result<(), StoreError> {
    if rows == 0 {
        Err(StoreError::NotFound { table, id })
    } else {
        Ok(())
    }
}

#[async_trait]
impl PaperStore for SqliteStore {
    async fn create_paper(&self, request: &str) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"INSERT INTO papers (request, created_at) VALUES (?1, ?2) RETURNING id"#,
        )
        .bind(request)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id")?)
    }

    async fn set_paper_details(
        &self,
        paper_id: i64,
        details: &PaperDetails,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE papers SET topic = ?1, title = ?2, question = ?3 WHERE id = ?4"#,
        )
        .bind(&details.topic)
        .bind(&details.title)
        .bind(&details.question)
        .bind(paper_id)
        .execute(&self.pool)
        .await?;
        expect_updated(result.rows_affected(), "papers", paper_id)
    }

    async fn set_paper_chapters(
        &self,
        paper_id: i64,
        chapter_ids: &[i64],
    ) -> Result<(), StoreError> {
        let result = sqlx::query(r#"UPDATE papers SET chapter_ids = ?1 WHERE id = ?2"#)
            .bind(join_ids(chapter_ids))
            .bind(paper_id)
            .execute(&self.pool)
            .await?;
        expect_updated(result.rows_affected(), "papers", paper_id)
    }

    async fn paper(&self, paper_id: i64) -> Result<StoredPaper, StoreError> {
        let row = sqlx::query(
            r#"SELECT id, request, topic, title, question, chapter_ids, created_at
               FROM papers WHERE id = ?1"#,
        )
        .bind(paper_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            table: "papers",
            id: paper_id,
        })?;
        paper_from_row(&row)
    }

    async fn list_papers(&self) -> Result<Vec<StoredPaper>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, request, topic, title, question, chapter_ids, created_at
               FROM papers ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(paper_from_row).collect()
    }

    async fn insert_chapter(
        &self,
        position: ChapterPosition,
        heading: &str,
        body: &str,
        source_ids: &[i64],
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"INSERT INTO chapters (position, heading, body, source_ids)
               VALUES (?1, ?2, ?3, ?4) RETURNING id"#,
        )
        .bind(position.to_string())
        .bind(heading)
        .bind(body)
        .bind(join_ids(source_ids))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.try_get("id")?)
    }

    async fn chapter(&self, chapter_id: i64) -> Result<StoredChapter, StoreError> {
        let row = sqlx::query(
            r#"SELECT id, position, heading, body, source_ids FROM chapters WHERE id = ?1"#,
        )
        .bind(chapter_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound {
            table: "chapters",
            id: chapter_id,
        })?;

        let position: String = row.try_get("position")?;
        let source_ids: String = row.try_get("source_ids")?;
        Ok(StoredChapter {
            id: row.try_get("id")?,
            position: position
                .parse()
                .map_err(|_| StoreError::MalformedPosition(position.clone()))?,
            heading: row.try_get("heading")?,
            body: row.try_get("body")?,
            source_ids: split_ids(&source_ids)?,
        })
    }

    async fn insert_source(&self, url: &str) -> Result<i64, StoreError> {
        sqlx::query(r#"INSERT INTO sources (url) VALUES (?1) ON CONFLICT(url) DO NOTHING"#)
            .bind(url)
            .execute(&self.pool)
            .await?;
        let row = sqlx::query(r#"SELECT id FROM sources WHERE url = ?1"#)
            .bind(url)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("id")?)
    }

    async fn set_source_summary(&self, source_id: i64, summary: &str) -> Result<(), StoreError> {
        let result = sqlx::query(r#"UPDATE sources SET summary = ?1 WHERE id = ?2"#)
            .bind(summary)
            .bind(source_id)
            .execute(&self.pool)
            .await?;
        expect_updated(result.rows_affected(), "sources", source_id)
    }

    async fn source(&self, source_id: i64) -> Result<StoredSource, StoreError> {
        let row = sqlx::query(r#"SELECT id, url, summary FROM sources WHERE id = ?1"#)
            .bind(source_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound {
                table: "sources",
                id: source_id,
            })?;
        Ok(StoredSource {
            id: row.try_get("id")?,
            url: row.try_get("url")?,
            summary: row.try_get("summary")?,
        })
    }
}
