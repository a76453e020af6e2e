//! One function per model-backed stage. Each returns an explicit error; the
//! orchestrator decides whether a failure is substituted or fatal.

use super::retry::retry_with_backoff;
use crate::config::RetryConfig;
use crate::error::{ModelError, PipelineError};
use crate::paper::{Outline, PaperDetails};
use crate::parser::{parse_details, parse_outline};
use crate::prompt::{TemplateKind, Templates};
use crate::provider::{non_empty, ChatModel, ChatRequest};
use tracing::debug;

pub const SECTION_PLACEHOLDER: &str = "Error: GPT response is empty";
pub const INTRO_PLACEHOLDER: &str = "Error: GPT intro response is empty";
pub const CONCLUSION_PLACEHOLDER: &str = "Error: GPT conclusion response is empty";
pub const NO_MATERIAL: &str = "No research material was found for this chapter.";

/// Shared inputs of every stage
pub struct StageContext<'a> {
    pub chat: &'a dyn ChatModel,
    pub templates: &'a Templates,
    pub retry: &'a RetryConfig,
    pub language: &'a str,
}

impl StageContext<'_> {
    async fn complete(
        &self,
        stage: &'static str,
        request: ChatRequest,
    ) -> Result<String, PipelineError> {
        debug!(
            "{} prompt for {} ({} chars)",
            stage,
            self.chat.name(),
            request.last_prompt().len()
        );
        let chat = self.chat;
        let request = &request;
        retry_with_backoff(self.retry, stage, || async move {
            non_empty(Some(chat.complete(request).await?))
        })
        .await
        .map_err(|source| PipelineError::Model { stage, source })
    }
}

pub async fn extract_details(
    ctx: &StageContext<'_>,
    input: &str,
) -> Result<PaperDetails, PipelineError> {
    let prompt = ctx
        .templates
        .render(TemplateKind::Extract, &[("input", input), ("language", ctx.language)])?;
    let raw = ctx.complete("details", ChatRequest::json(prompt)).await?;
    Ok(parse_details(&raw)?)
}

pub async fn generate_outline(
    ctx: &StageContext<'_>,
    details: &PaperDetails,
    count: usize,
) -> Result<Outline, PipelineError> {
    let count = count.to_string();
    let prompt = ctx.templates.render(
        TemplateKind::Bullets,
        &[
            ("language", ctx.language),
            ("topic", details.topic.as_str()),
            ("title", details.title.as_str()),
            ("question", details.question.as_str()),
            ("count", count.as_str()),
        ],
    )?;
    let raw = ctx.complete("outline", ChatRequest::json(prompt)).await?;
    Ok(parse_outline(&raw)?)
}

pub async fn write_section(
    ctx: &StageContext<'_>,
    topic: &str,
    bulletpoint: &str,
    materials: &str,
) -> Result<String, PipelineError> {
    if bulletpoint.trim().is_empty() {
        return Err(PipelineError::Model {
            stage: "section",
            source: ModelError::EmptyResponse,
        });
    }
    let prompt = ctx.templates.render(
        TemplateKind::Extend,
        &[
            ("language", ctx.language),
            ("topic", topic),
            ("bulletpoint", bulletpoint),
            ("materials", materials),
        ],
    )?;
    ctx.complete("section", ChatRequest::prompt(prompt)).await
}

pub async fn write_intro(
    ctx: &StageContext<'_>,
    details: &PaperDetails,
    outline: &Outline,
) -> Result<String, PipelineError> {
    let bulletpoints = outline.as_list();
    let prompt = ctx.templates.render(
        TemplateKind::Intro,
        &[
            ("language", ctx.language),
            ("topic", details.topic.as_str()),
            ("question", details.question.as_str()),
            ("bulletpoints", bulletpoints.as_str()),
        ],
    )?;
    ctx.complete("introduction", ChatRequest::prompt(prompt)).await
}

pub async fn write_conclusion(
    ctx: &StageContext<'_>,
    details: &PaperDetails,
    outline: &Outline,
) -> Result<String, PipelineError> {
    let bulletpoints = outline.as_list();
    let prompt = ctx.templates.render(
        TemplateKind::Conclusion,
        &[
            ("language", ctx.language),
            ("topic", details.topic.as_str()),
            ("question", details.question.as_str()),
            ("bulletpoints", bulletpoints.as_str()),
        ],
    )?;
    ctx.complete("conclusion", ChatRequest::prompt(prompt)).await
}

/// Summaries of the cited sources, numbered in citation order
pub fn build_materials(sources: &[(&str, &str)]) -> String {
    if sources.is_empty() {
        return NO_MATERIAL.to_string();
    }
    sources
        .iter()
        .enumerate()
        .map(|(idx, (url, summary))| format!("[{}] {}\n{}", idx + 1, url, summary.trim()))
        .collect::<Vec<_>>()
        .join("\n\n")
}
