//! Recommendation Orchestrator.
//!
//! Turns a query and its ranked candidates into a single structured
//! recommendation: render the prompt, call the model in JSON mode, parse the
//! answer strictly and resolve every title against the catalog.

use crate::catalog::{Catalog, CatalogEntry};
use crate::ranker::Retriever;
use crate::types::{RankedCandidate, Recommendation, UserQuery};
use navigator_core::{AppError, AppResult};
use navigator_llm::{LlmClient, LlmRequest};
use navigator_prompt::{build_prompt, PromptDefinition};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// Most further reads attached to a recommendation.
pub const MAX_SECONDARY: usize = 2;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelAnswer {
    best_book: BookRef,
    new_reason: String,
    #[serde(default)]
    table_of_contents: Option<String>,
    #[serde(default)]
    application_points: Option<String>,
    #[serde(default)]
    second_and_third_books: Option<Vec<BookRef>>,
}

/// Authors are ignored; titles are the join key into the catalog.
#[derive(Debug, Deserialize)]
struct BookRef {
    title: String,
}

/// Asks a language model to choose among ranked candidates.
pub struct Recommender {
    llm: Arc<dyn LlmClient>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    catalog: Arc<Catalog>,
    prompt: PromptDefinition,
    timeout: Duration,
}

impl Recommender {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        model: impl Into<String>,
        catalog: Arc<Catalog>,
        prompt: PromptDefinition,
    ) -> Self {
        Self {
            llm,
            model: model.into(),
            temperature: None,
            max_tokens: None,
            catalog,
            prompt,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Pick one book for `query` out of `candidates`.
    ///
    /// A primary title outside the candidate set falls back to the top
    /// candidate and sets `used_fallback`.
    ///
    /// # Errors
    /// - `DataUnavailable` if `candidates` is empty
    /// - `GenerationFailed` on transport errors, timeouts or a response that
    ///   does not match the expected JSON shape
    pub async fn recommend(
        &self,
        query: &UserQuery,
        candidates: &[RankedCandidate],
    ) -> AppResult<Recommendation> {
        let top = candidates.first().ok_or_else(|| {
            AppError::DataUnavailable("No candidate books to recommend from".to_string())
        })?;

        let context = prompt_context(query, candidates);
        let built = build_prompt(&self.prompt, &context)?;

        let mut request = LlmRequest::new(built.user, self.model.clone());
        if built.metadata.json_output {
            request = request.with_json_mode();
        }
        if let Some(system) = built.system {
            request = request.with_system(system);
        }
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        tracing::debug!(
            provider = self.llm.provider_name(),
            model = %self.model,
            candidates = candidates.len(),
            "Requesting recommendation"
        );

        let response = match tokio::time::timeout(self.timeout, self.llm.complete(&request)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(AppError::GenerationFailed(format!(
                    "Recommendation request failed: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(AppError::GenerationFailed(format!(
                    "Recommendation request timed out after {}s",
                    self.timeout.as_secs()
                )))
            }
        };

        let answer = parse_answer(&response.content)?;

        let (chosen, used_fallback) = match find_candidate(candidates, &answer.best_book.title) {
            Some(candidate) => (self.resolve(&candidate.entry), false),
            None => {
                tracing::warn!(
                    suggested = %answer.best_book.title,
                    fallback = %top.entry.title,
                    "Model picked a title outside the candidates; using the top candidate"
                );
                (self.resolve(&top.entry), true)
            }
        };

        let secondary = self.resolve_secondary(
            &chosen,
            answer.second_and_third_books.unwrap_or_default(),
        );

        tracing::info!(
            chosen = %chosen.title,
            secondary = secondary.len(),
            used_fallback,
            "Recommendation ready"
        );

        Ok(Recommendation {
            chosen,
            rationale: answer.new_reason.trim().to_string(),
            table_of_contents: non_blank(answer.table_of_contents),
            application_suggestions: non_blank(answer.application_points),
            secondary,
            used_fallback,
        })
    }

    fn resolve(&self, entry: &CatalogEntry) -> CatalogEntry {
        self.catalog
            .find_by_title(&entry.title)
            .cloned()
            .unwrap_or_else(|| entry.clone())
    }

    fn resolve_secondary(&self, chosen: &CatalogEntry, books: Vec<BookRef>) -> Vec<CatalogEntry> {
        if books.len() > MAX_SECONDARY {
            tracing::warn!(
                returned = books.len(),
                kept = MAX_SECONDARY,
                "Model returned more secondary books than requested"
            );
        }

        let mut secondary: Vec<CatalogEntry> = Vec::with_capacity(MAX_SECONDARY);
        for book in books {
            if secondary.len() == MAX_SECONDARY {
                break;
            }
            let Some(entry) = self.catalog.find_by_title(&book.title) else {
                tracing::debug!(title = %book.title, "Dropping secondary book not in catalog");
                continue;
            };
            if entry.id == chosen.id || secondary.iter().any(|e| e.id == entry.id) {
                tracing::debug!(title = %entry.title, "Dropping duplicate secondary book");
                continue;
            }
            secondary.push(entry.clone());
        }
        secondary
    }
}

fn prompt_context(query: &UserQuery, candidates: &[RankedCandidate]) -> serde_json::Value {
    let candidates: Vec<serde_json::Value> = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            json!({
                "rank": i + 1,
                "title": candidate.entry.title,
                "author": candidate.entry.author,
                "description": candidate.entry.description,
                "score": format!("{:.3}", candidate.score),
            })
        })
        .collect();

    json!({
        "stage": query.growth_stage.label(),
        "challenge": query.challenge.label(),
        "problem": query.problem_text,
        "candidates": candidates,
    })
}

fn find_candidate<'a>(candidates: &'a [RankedCandidate], title: &str) -> Option<&'a RankedCandidate> {
    let title = title.trim();
    candidates.iter().find(|c| c.entry.title.trim() == title)
}

fn parse_answer(content: &str) -> AppResult<ModelAnswer> {
    let body = strip_code_fence(content);
    let answer: ModelAnswer = serde_json::from_str(body).map_err(|e| {
        AppError::GenerationFailed(format!("Model response is not a valid recommendation: {}", e))
    })?;

    if answer.new_reason.trim().is_empty() {
        return Err(AppError::GenerationFailed(
            "Model response has an empty new_reason".to_string(),
        ));
    }
    if answer.best_book.title.trim().is_empty() {
        return Err(AppError::GenerationFailed(
            "Model response has an empty best_book title".to_string(),
        ));
    }
    Ok(answer)
}

/// Models occasionally wrap JSON in a Markdown fence even in JSON mode.
fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Query-time path: embed the problem, rank the store, ask the model.
pub struct QueryPipeline {
    retriever: Retriever,
    recommender: Recommender,
    top_k: usize,
}

impl QueryPipeline {
    pub fn new(retriever: Retriever, recommender: Recommender, top_k: usize) -> Self {
        Self {
            retriever,
            recommender,
            top_k,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Full retrieval-augmented recommendation for one query.
    pub async fn run(&self, query: &UserQuery) -> AppResult<(Vec<RankedCandidate>, Recommendation)> {
        let candidates = self.retriever.search(&query.problem_text, self.top_k).await?;
        let recommendation = self.recommender.recommend(query, &candidates).await?;
        Ok((candidates, recommendation))
    }
}
