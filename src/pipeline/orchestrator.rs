use super::ledger::SourceLedger;
use super::stages::{
    self, build_materials, StageContext, CONCLUSION_PLACEHOLDER, INTRO_PLACEHOLDER,
    SECTION_PLACEHOLDER,
};
use crate::config::{Config, FailurePolicy, OutlineConfig};
use crate::error::PipelineError;
use crate::output::{
    render_bibliography, render_section, render_title, DocumentWriter, CONCLUSION_HEADING,
    INTRODUCTION_HEADING,
};
use crate::paper::{ChapterPosition, Paper, PaperDetails, Section, Source};
use crate::prompt::{TemplateKind, Templates};
use crate::provider::ChatModel;
use crate::search::{build_query, find_sources, SearchProvider};
use crate::source::SourceSummarizer;
use crate::store::PaperStore;
use chrono::Local;
use rand::Rng;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Result of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    pub paper: Paper,
    /// Store row id of the paper when the run was persisted
    pub paper_id: Option<i64>,
    pub output_path: Option<PathBuf>,
    pub duration: Duration,
}

/// Draw the outline length uniformly from the configured inclusive range
pub fn bullet_count<R: Rng + ?Sized>(config: &OutlineConfig, rng: &mut R) -> usize {
    rng.gen_range(config.min_bullets..=config.max_bullets)
}

/// `<base>/<YYYY-MM-DD>` for today
pub fn dated_dir(base: &Path) -> PathBuf {
    base.join(Local::now().format("%Y-%m-%d").to_string())
}

pub struct Pipeline {
    config: Config,
    templates: Templates,
    chat: Arc<dyn ChatModel>,
    search: Arc<dyn SearchProvider>,
    summarizer: Arc<dyn SourceSummarizer>,
    store: Option<Arc<dyn PaperStore>>,
}

/// Per-run mutable state
struct RunState {
    ledger: SourceLedger,
    writer: Option<DocumentWriter>,
    /// Store row of the paper when persisting
    paper_id: Option<i64>,
    chapter_ids: Vec<i64>,
}

impl RunState {
    fn append(&mut self, block: &str) -> Result<(), PipelineError> {
        if let Some(writer) = self.writer.as_mut() {
            writer.append(block)?;
        }
        Ok(())
    }
}

impl Pipeline {
    pub fn new(
        config: Config,
        templates: Templates,
        chat: Arc<dyn ChatModel>,
        search: Arc<dyn SearchProvider>,
        summarizer: Arc<dyn SourceSummarizer>,
    ) -> Self {
        Self {
            config,
            templates,
            chat,
            search,
            summarizer,
            store: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn PaperStore>) -> Self {
        self.store = Some(store);
        self
    }

    fn context(&self) -> StageContext<'_> {
        StageContext {
            chat: self.chat.as_ref(),
            templates: &self.templates,
            retry: &self.config.retry,
            language: &self.config.language,
        }
    }

    /// Run the pipeline with an outline length drawn from the configured range.
    /// The document is written to `<output_dir>/<YYYY-MM-DD>/<request id>.txt`
    /// when `output_dir` is set.
    pub async fn run(
        &self,
        request: &str,
        output_dir: Option<&Path>,
    ) -> Result<RunReport, PipelineError> {
        let count = bullet_count(&self.config.outline, &mut rand::thread_rng());
        let dir = output_dir.map(dated_dir);
        self.run_with_count(request, count, dir.as_deref()).await
    }

    /// Run the pipeline with a fixed outline length, writing into `output_dir` as is
    pub async fn run_with_count(
        &self,
        request: &str,
        count: usize,
        output_dir: Option<&Path>,
    ) -> Result<RunReport, PipelineError> {
        let start = Instant::now();
        let ctx = self.context();

        let paper_id = match &self.store {
            Some(store) => Some(store.create_paper(request).await?),
            None => None,
        };
        let request_id = match paper_id {
            Some(id) => format!("paper-{}", id),
            None => uuid::Uuid::new_v4().to_string(),
        };
        info!("Starting {} (policy: {})", request_id, self.config.on_failure);

        let mut state = RunState {
            ledger: SourceLedger::default(),
            writer: match output_dir {
                Some(dir) => Some(DocumentWriter::create(dir, &request_id)?),
                None => None,
            },
            paper_id,
            chapter_ids: Vec::new(),
        };

        // Details
        let details = match stages::extract_details(&ctx, request).await {
            Ok(details) => details,
            Err(e) => {
                self.recover(e, "details")?;
                PaperDetails::sentinel()
            }
        };
        info!("Title: {}", details.title);
        if let (Some(store), Some(id)) = (&self.store, paper_id) {
            store.set_paper_details(id, &details).await?;
        }

        // Outline (fatal on failure)
        info!("Requesting outline with {} bullet points", count);
        let outline = stages::generate_outline(&ctx, &details, count).await?;
        if outline.len() != count {
            debug!("Outline has {} bullet points, asked for {}", outline.len(), count);
        }
        state.append(&render_title(&details.title))?;

        // Introduction
        info!("Writing introduction");
        let body = self.text_or_placeholder(
            stages::write_intro(&ctx, &details, &outline).await,
            "introduction",
            INTRO_PLACEHOLDER,
        )?;
        let introduction = Section {
            position: ChapterPosition::Introduction,
            heading: INTRODUCTION_HEADING.to_string(),
            body,
            sources: Vec::new(),
        };
        self.finish_section(&mut state, &introduction).await?;

        // Chapters
        let mut chapters = Vec::with_capacity(outline.len());
        for (idx, bulletpoint) in outline.iter().enumerate() {
            info!("Chapter {}/{}: {}", idx + 1, outline.len(), bulletpoint);
            let chapter = self
                .write_chapter(&ctx, &mut state, &details, idx + 1, bulletpoint)
                .await?;
            self.finish_section(&mut state, &chapter).await?;
            chapters.push(chapter);
        }

        // Conclusion
        info!("Writing conclusion");
        let body = self.text_or_placeholder(
            stages::write_conclusion(&ctx, &details, &outline).await,
            "conclusion",
            CONCLUSION_PLACEHOLDER,
        )?;
        let conclusion = Section {
            position: ChapterPosition::Conclusion,
            heading: CONCLUSION_HEADING.to_string(),
            body,
            sources: Vec::new(),
        };
        self.finish_section(&mut state, &conclusion).await?;

        let paper = Paper {
            request_id,
            details,
            outline,
            introduction,
            chapters,
            conclusion,
            sources: state.ledger.into_sources(),
        };
        let bibliography = paper.bibliography();
        if let Some(writer) = state.writer.as_mut() {
            writer.append(&render_bibliography(&bibliography))?;
        }

        let duration = start.elapsed();
        info!(
            "Finished {} in {:.1}s ({} chapters, {} cited sources)",
            paper.request_id,
            duration.as_secs_f64(),
            paper.chapters.len(),
            bibliography.len()
        );

        Ok(RunReport {
            output_path: state.writer.map(|w| w.path().to_path_buf()),
            paper,
            paper_id,
            duration,
        })
    }

    async fn write_chapter(
        &self,
        ctx: &StageContext<'_>,
        state: &mut RunState,
        details: &PaperDetails,
        number: usize,
        bulletpoint: &str,
    ) -> Result<Section, PipelineError> {
        let mut cited = Vec::new();
        if !bulletpoint.trim().is_empty() {
            let query = build_query(bulletpoint, &details.topic, &self.config.search);
            let urls = find_sources(
                self.search.as_ref(),
                &query,
                &self.config.search,
                &self.config.retry,
            )
            .await;

            let instruction = self.templates.render(
                TemplateKind::Summarize,
                &[("language", self.config.language.as_str()), ("bulletpoint", bulletpoint)],
            )?;
            for url in &urls {
                if let Some(idx) = self.resolve_source(state, url, &instruction).await? {
                    if !cited.contains(&idx) {
                        cited.push(idx);
                    }
                }
            }
        }

        let materials: Vec<(&str, &str)> = cited
            .iter()
            .filter_map(|idx| state.ledger.get(*idx))
            .filter_map(|s| s.summary.as_deref().map(|summary| (s.url.as_str(), summary)))
            .collect();
        let materials = build_materials(&materials);

        let body = self.text_or_placeholder(
            stages::write_section(ctx, &details.topic, bulletpoint, &materials).await,
            "section",
            SECTION_PLACEHOLDER,
        )?;

        Ok(Section {
            position: ChapterPosition::Chapter(number),
            heading: bulletpoint.to_string(),
            body,
            sources: cited,
        })
    }

    /// Ledger index of the source if it has usable text. Each URL is fetched at
    /// most once per run; with a store, a summary cached by an earlier run is reused.
    async fn resolve_source(
        &self,
        state: &mut RunState,
        url: &str,
        instruction: &str,
    ) -> Result<Option<usize>, PipelineError> {
        if let Some(idx) = state.ledger.position(url) {
            debug!("Reusing source {}", url);
            return Ok(state.ledger.usable(idx));
        }

        let mut store_id = None;
        if let Some(store) = &self.store {
            let id = store.insert_source(url).await?;
            store_id = Some(id);
            if let Some(summary) = store.source(id).await?.summary {
                debug!("Using stored summary for {}", url);
                let idx = state.ledger.push(Source {
                    store_id,
                    url: url.to_string(),
                    summary: Some(summary),
                });
                return Ok(state.ledger.usable(idx));
            }
        }

        let summary = match self.summarizer.summarize(url, instruction).await {
            Ok(summary) => {
                if let (Some(store), Some(id)) = (&self.store, store_id) {
                    store.set_source_summary(id, &summary).await?;
                }
                Some(summary)
            }
            Err(e) => {
                warn!("Skipping source: {}", e);
                None
            }
        };

        let idx = state.ledger.push(Source {
            store_id,
            url: url.to_string(),
            summary,
        });
        Ok(state.ledger.usable(idx))
    }

    /// Append the section to the output file and persist it
    async fn finish_section(
        &self,
        state: &mut RunState,
        section: &Section,
    ) -> Result<(), PipelineError> {
        state.append(&render_section(section))?;

        if let Some(store) = &self.store {
            let source_ids: Vec<i64> = section
                .sources
                .iter()
                .filter_map(|idx| state.ledger.get(*idx))
                .filter_map(|s| s.store_id)
                .collect();
            let id = store
                .insert_chapter(section.position, &section.heading, &section.body, &source_ids)
                .await?;
            state.chapter_ids.push(id);
            // Linked per section so an aborted run keeps what it wrote
            if let Some(paper_id) = state.paper_id {
                store.set_paper_chapters(paper_id, &state.chapter_ids).await?;
            }
        }
        Ok(())
    }

    fn text_or_placeholder(
        &self,
        result: Result<String, PipelineError>,
        stage: &str,
        placeholder: &str,
    ) -> Result<String, PipelineError> {
        match result {
            Ok(text) => Ok(text),
            Err(e) => {
                self.recover(e, stage)?;
                Ok(placeholder.to_string())
            }
        }
    }

    /// Apply the failure policy. `Ok(())` means the caller substitutes its
    /// placeholder; model and parse failures are the only recoverable kinds.
    fn recover(&self, error: PipelineError, stage: &str) -> Result<(), PipelineError> {
        let recoverable = matches!(
            error,
            PipelineError::Model { .. } | PipelineError::Parser(_)
        );
        if !recoverable || self.config.on_failure == FailurePolicy::Abort {
            return Err(error);
        }
        warn!("{} failed, using placeholder: {}", stage, error);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Engine;
    use crate::error::{FetchError, ModelError, SearchError};
    use crate::output::render_paper;
    use crate::provider::ChatRequest;
    use crate::search::SearchHit;
    use crate::store::SqliteStore;
    use async_trait::async_trait;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    const REQUEST: &str =
        "Hallo, ich möchte eine Hausarbeit über das Thema Influencer Marketing schreiben.";

    const DETAILS: &str = r#"```json
{"topic": "Influencer Marketing", "title": "Influencer Marketing im Wandel", "question": "Wie wirkt Influencer Marketing?"}
```"#;

    /// Answers by recognizing which template produced the prompt
    struct FakeChat {
        details: &'static str,
        outline: &'static str,
        empty_chapter: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeChat {
        fn new(outline: &'static str) -> Self {
            Self {
                details: DETAILS,
                outline,
                empty_chapter: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ChatModel for FakeChat {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(&self, request: &ChatRequest) -> Result<String, ModelError> {
            let prompt = request.last_prompt().to_string();
            self.prompts.lock().unwrap().push(prompt.clone());

            if prompt.contains("to extract topic, title and question") {
                return Ok(self.details.to_string());
            }
            if prompt.contains("Create an outline") {
                return Ok(self.outline.to_string());
            }
            if prompt.starts_with("Write the introduction") {
                return Ok("Diese Arbeit untersucht Influencer Marketing.".to_string());
            }
            if prompt.starts_with("Write the conclusion") {
                return Ok("Zusammenfassend zeigt sich ein gemischtes Bild.".to_string());
            }
            let chapter = prompt
                .lines()
                .find_map(|l| l.strip_prefix("Chapter: "))
                .unwrap_or_default()
                .to_string();
            if Some(chapter.as_str()) == self.empty_chapter {
                return Ok("   ".to_string());
            }
            Ok(format!("Text zu {}.", chapter))
        }
    }

    struct FakeSearch {
        results: HashMap<&'static str, Vec<&'static str>>,
    }

    #[async_trait]
    impl SearchProvider for FakeSearch {
        async fn search(&self, query: &str, engine: Engine) -> Result<Vec<SearchHit>, SearchError> {
            Ok(self
                .results
                .get(query)
                .map(|links| {
                    links
                        .iter()
                        .map(|link| SearchHit {
                            link: link.to_string(),
                            title: None,
                            engine,
                        })
                        .collect()
                })
                .unwrap_or_default())
        }

        fn name(&self) -> &'static str {
            "fake"
        }
    }

    #[derive(Default)]
    struct FakeSummarizer {
        failing: HashSet<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl SourceSummarizer for FakeSummarizer {
        async fn summarize(&self, url: &str, _instruction: &str) -> Result<String, FetchError> {
            self.calls.lock().unwrap().push(url.to_string());
            if self.failing.contains(url) {
                return Err(FetchError::Status(404, url.to_string()));
            }
            Ok(format!("Zusammenfassung von {}", url))
        }
    }

    const OUTLINE: &str = r#"{"bulletpoints": ["Grundlagen", "Plattformen", "Kritik"]}"#;

    fn search() -> Arc<FakeSearch> {
        Arc::new(FakeSearch {
            results: HashMap::from([
                ("Grundlagen", vec!["https://a.org/one", "https://shared.org/x"]),
                ("Plattformen", vec!["https://shared.org/x", "https://b.org/two"]),
                ("Kritik", vec![]),
            ]),
        })
    }

    fn pipeline(
        config: Config,
        chat: Arc<FakeChat>,
        summarizer: Arc<FakeSummarizer>,
    ) -> Pipeline {
        Pipeline::new(config, Templates::builtin(), chat, search(), summarizer)
    }

    fn chapter_headings(content: &str) -> Vec<&str> {
        content
            .lines()
            .filter(|l| l.starts_with("## Kapitel "))
            .collect()
    }

    #[tokio::test]
    async fn test_end_to_end_document() {
        let dir = tempfile::tempdir().unwrap();
        let chat = Arc::new(FakeChat::new(OUTLINE));
        let pipeline = pipeline(Config::default(), chat, Arc::new(FakeSummarizer::default()));

        let report = pipeline
            .run_with_count(REQUEST, 3, Some(dir.path()))
            .await
            .unwrap();
        let paper = &report.paper;
        assert!(!paper.details.is_sentinel());
        assert_eq!(paper.outline.len(), 3);

        let path = report.output_path.unwrap();
        assert_eq!(path, dir.path().join(format!("{}.txt", paper.request_id)));
        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, render_paper(paper));

        assert!(content.starts_with("# Title: Influencer Marketing im Wandel"));
        assert_eq!(
            chapter_headings(&content),
            vec![
                "## Kapitel 1: Grundlagen",
                "## Kapitel 2: Plattformen",
                "## Kapitel 3: Kritik"
            ]
        );
        let last_chapter = content.find("## Kapitel 3:").unwrap();
        let conclusion = content.find("## Fazit").unwrap();
        assert!(conclusion > last_chapter);
        assert!(content.find("## Einleitung").unwrap() < content.find("## Kapitel 1:").unwrap());
        assert!(content.contains("## Literaturverzeichnis\n\n1. https://a.org/one\n"));
    }

    #[tokio::test]
    async fn test_empty_section_gets_placeholder() {
        let mut chat = FakeChat::new(OUTLINE);
        chat.empty_chapter = Some("Plattformen");
        let pipeline = pipeline(
            Config::default(),
            Arc::new(chat),
            Arc::new(FakeSummarizer::default()),
        );

        let report = pipeline.run_with_count(REQUEST, 3, None).await.unwrap();
        let chapters = &report.paper.chapters;
        assert_eq!(chapters.len(), 3);
        assert_eq!(chapters[1].body, SECTION_PLACEHOLDER);
        assert_eq!(chapters[2].body, "Text zu Kritik.");
        assert!(!report.paper.conclusion.body.starts_with("Error"));
        assert!(report.output_path.is_none());
    }

    #[tokio::test]
    async fn test_abort_policy_fails_run() {
        let mut chat = FakeChat::new(OUTLINE);
        chat.empty_chapter = Some("Plattformen");
        let config = Config {
            on_failure: FailurePolicy::Abort,
            ..Config::default()
        };
        let pipeline = pipeline(config, Arc::new(chat), Arc::new(FakeSummarizer::default()));

        let err = pipeline.run_with_count(REQUEST, 3, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model { stage: "section", .. }));
    }

    #[tokio::test]
    async fn test_malformed_details_use_sentinel() {
        let mut chat = FakeChat::new(OUTLINE);
        chat.details = "Gerne helfe ich dir bei deiner Hausarbeit!";
        let chat = Arc::new(chat);
        let pipeline = pipeline(
            Config::default(),
            chat.clone(),
            Arc::new(FakeSummarizer::default()),
        );

        let report = pipeline.run_with_count(REQUEST, 3, None).await.unwrap();
        assert!(report.paper.details.is_sentinel());
        assert!(render_paper(&report.paper).starts_with("# Title: Error\n"));
        assert_eq!(report.paper.chapters.len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_details_abort() {
        let mut chat = FakeChat::new(OUTLINE);
        chat.details = "kein JSON";
        let config = Config {
            on_failure: FailurePolicy::Abort,
            ..Config::default()
        };
        let pipeline = pipeline(config, Arc::new(chat), Arc::new(FakeSummarizer::default()));

        let err = pipeline.run_with_count(REQUEST, 3, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Parser(_)));
    }

    #[tokio::test]
    async fn test_empty_outline_is_fatal() {
        let chat = Arc::new(FakeChat::new(r#"{"bulletpoints": []}"#));
        let pipeline = pipeline(Config::default(), chat, Arc::new(FakeSummarizer::default()));

        let err = pipeline.run_with_count(REQUEST, 4, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Parser(_)));
    }

    #[tokio::test]
    async fn test_outline_order_and_shorter_list() {
        let chat = Arc::new(FakeChat::new(
            r#"{"bulletpoints": ["Zuletzt", "Zuerst"]}"#,
        ));
        let pipeline = pipeline(Config::default(), chat, Arc::new(FakeSummarizer::default()));

        let report = pipeline.run_with_count(REQUEST, 5, None).await.unwrap();
        let headings: Vec<_> = report
            .paper
            .chapters
            .iter()
            .map(|c| (c.position, c.heading.as_str()))
            .collect();
        assert_eq!(
            headings,
            vec![
                (ChapterPosition::Chapter(1), "Zuletzt"),
                (ChapterPosition::Chapter(2), "Zuerst")
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cited() {
        let summarizer = Arc::new(FakeSummarizer {
            failing: HashSet::from(["https://shared.org/x"]),
            ..FakeSummarizer::default()
        });
        let pipeline = pipeline(
            Config::default(),
            Arc::new(FakeChat::new(OUTLINE)),
            summarizer.clone(),
        );

        let report = pipeline.run_with_count(REQUEST, 3, None).await.unwrap();
        let paper = &report.paper;

        for chapter in &paper.chapters {
            for idx in &chapter.sources {
                assert!(paper.sources[*idx].summary.is_some());
            }
        }
        assert_eq!(paper.bibliography(), vec!["https://a.org/one", "https://b.org/two"]);
        // the failed URL is not retried for the second chapter
        let calls = summarizer.calls.lock().unwrap();
        assert_eq!(
            calls.iter().filter(|u| *u == "https://shared.org/x").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_materials_reach_section_prompt() {
        let chat = Arc::new(FakeChat::new(OUTLINE));
        let pipeline = pipeline(
            Config::default(),
            chat.clone(),
            Arc::new(FakeSummarizer::default()),
        );
        pipeline.run_with_count(REQUEST, 3, None).await.unwrap();

        let prompts = chat.prompts.lock().unwrap();
        let kritik = prompts
            .iter()
            .find(|p| p.contains("Chapter: Kritik"))
            .unwrap();
        assert!(kritik.contains(stages::NO_MATERIAL));
        let grundlagen = prompts
            .iter()
            .find(|p| p.contains("Chapter: Grundlagen"))
            .unwrap();
        assert!(grundlagen.contains("Zusammenfassung von https://a.org/one"));
    }

    #[tokio::test]
    async fn test_store_dedups_sources() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let summarizer = Arc::new(FakeSummarizer::default());
        let pipeline = pipeline(
            Config::default(),
            Arc::new(FakeChat::new(OUTLINE)),
            summarizer.clone(),
        )
        .with_store(store.clone());

        let report = pipeline.run_with_count(REQUEST, 3, None).await.unwrap();
        let paper_id = report.paper_id.unwrap();
        assert_eq!(report.paper.request_id, format!("paper-{}", paper_id));

        let stored = store.paper(paper_id).await.unwrap();
        assert_eq!(stored.details.as_ref(), Some(&report.paper.details));
        // introduction, three chapters, conclusion
        assert_eq!(stored.chapter_ids.len(), 5);

        let first = store.chapter(stored.chapter_ids[1]).await.unwrap();
        let second = store.chapter(stored.chapter_ids[2]).await.unwrap();
        let shared: Vec<_> = first
            .source_ids
            .iter()
            .filter(|id| second.source_ids.contains(id))
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(
            store.source(*shared[0]).await.unwrap().url,
            "https://shared.org/x"
        );

        let calls = summarizer.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
    }

    #[tokio::test]
    async fn test_aborted_run_keeps_written_chapters_linked() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let mut chat = FakeChat::new(OUTLINE);
        chat.empty_chapter = Some("Kritik");
        let config = Config {
            on_failure: FailurePolicy::Abort,
            ..Config::default()
        };
        let pipeline = pipeline(config, Arc::new(chat), Arc::new(FakeSummarizer::default()))
            .with_store(store.clone());

        let err = pipeline.run_with_count(REQUEST, 3, None).await.unwrap_err();
        assert!(matches!(err, PipelineError::Model { stage: "section", .. }));

        let papers = store.list_papers().await.unwrap();
        assert_eq!(papers.len(), 1);
        // introduction and the two chapters before the failure
        let stored = store.paper(papers[0].id).await.unwrap();
        assert_eq!(stored.chapter_ids.len(), 3);
        let last = store.chapter(stored.chapter_ids[2]).await.unwrap();
        assert_eq!(last.position, ChapterPosition::Chapter(2));
        assert_eq!(last.heading, "Plattformen");
    }

    #[tokio::test]
    async fn test_question_reaches_intro_and_conclusion() {
        let chat = Arc::new(FakeChat::new(OUTLINE));
        let pipeline = pipeline(
            Config::default(),
            chat.clone(),
            Arc::new(FakeSummarizer::default()),
        );
        pipeline.run_with_count(REQUEST, 3, None).await.unwrap();

        let prompts = chat.prompts.lock().unwrap();
        for start in ["Write the introduction", "Write the conclusion"] {
            let prompt = prompts.iter().find(|p| p.starts_with(start)).unwrap();
            assert!(
                prompt.contains("Wie wirkt Influencer Marketing?"),
                "{}",
                start
            );
        }
    }

    #[tokio::test]
    async fn test_store_reuses_summaries_across_runs() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let summarizer = Arc::new(FakeSummarizer::default());
        let pipeline = pipeline(
            Config::default(),
            Arc::new(FakeChat::new(OUTLINE)),
            summarizer.clone(),
        )
        .with_store(store);

        let first = pipeline.run_with_count(REQUEST, 3, None).await.unwrap();
        let second = pipeline.run_with_count(REQUEST, 3, None).await.unwrap();

        assert_ne!(first.paper_id, second.paper_id);
        assert_eq!(summarizer.calls.lock().unwrap().len(), 3);
        assert_eq!(first.paper.bibliography(), second.paper.bibliography());
    }

    #[test]
    fn test_bullet_count_in_range() {
        let config = OutlineConfig::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let n = bullet_count(&config, &mut rng);
            assert!((4..=6).contains(&n));
            seen.insert(n);
        }
        assert_eq!(seen.len(), 3);

        let fixed = OutlineConfig {
            min_bullets: 2,
            max_bullets: 2,
        };
        assert_eq!(bullet_count(&fixed, &mut rng), 2);
    }

    #[test]
    fn test_dated_dir() {
        let dir = dated_dir(Path::new("papers"));
        let date = dir.file_name().unwrap().to_str().unwrap();
        assert_eq!(date.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").is_ok());
    }
}
