//! Shared stubs for the scenario tests.

use crate::catalog::{Catalog, CatalogEntry};
use crate::embeddings::EmbeddingProvider;
use crate::types::{Challenge, GrowthStage, UserQuery};
use navigator_core::{AppError, AppResult};
use navigator_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use std::sync::Mutex;

const TOPICS: [&[&str]; 3] = [
    &[
        "marketing", "traction", "growth", "customers", "channel", "sales", "acquire", "users",
        "ads",
    ],
    &["finance", "fundraising", "investor", "valuation", "cash", "budget"],
    &["hiring", "culture", "team", "people", "management", "leadership"],
];

/// Counts topic keywords; one axis per topic plus a small constant axis.
///
/// "acquire", "users" and "ads" sit on the marketing axis so that the
/// first-hundred-users question lands among the marketing titles.
#[derive(Debug, Default)]
pub struct TopicProvider;

#[async_trait::async_trait]
impl EmbeddingProvider for TopicProvider {
    fn provider_name(&self) -> &str {
        "topic-stub"
    }

    fn model_name(&self) -> &str {
        "topic-stub-1"
    }

    fn dimensions(&self) -> usize {
        TOPICS.len() + 1
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(AppError::EmbeddingUnavailable("blank".to_string()));
        }
        let lower = text.to_lowercase();
        let mut vector: Vec<f32> = TOPICS
            .iter()
            .map(|words| words.iter().map(|w| lower.matches(w).count() as f32).sum())
            .collect();
        vector.push(0.1);
        Ok(vector)
    }
}

/// LLM stub returning a fixed body and remembering the prompt it saw.
pub struct ScriptedLlm {
    body: String,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedLlm {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedLlm {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.prompts.lock().unwrap().push(request.prompt.clone());
        Ok(LlmResponse {
            content: self.body.clone(),
            model: request.model.clone(),
            usage: LlmUsage::new(1, 1),
            done: true,
        })
    }
}

pub const MARKETING_TITLES: [&str; 7] = [
    "Traction",
    "Hooked",
    "Crossing the Chasm",
    "Obviously Awesome",
    "The Mom Test",
    "Influence",
    "Hacking Growth",
];

pub const FINANCE_TITLES: [&str; 7] = [
    "Venture Deals",
    "Secrets of Sand Hill Road",
    "The Startup Owner's Manual",
    "Financial Intelligence",
    "Angel",
    "The Business of Venture Capital",
    "Mastering the VC Game",
];

pub const HR_TITLES: [&str; 6] = [
    "Who",
    "Radical Candor",
    "The Hard Thing About Hard Things",
    "No Rules Rules",
    "Powerful",
    "Work Rules",
];

/// Twenty titles split across three topics, interleaved so that order in
/// the file says nothing about relevance.
pub fn twenty_book_catalog() -> Catalog {
    let mut entries = Vec::new();
    for i in 0..7 {
        entries.push((MARKETING_TITLES[i], "marketing channel traction to win customers and growth"));
        entries.push((FINANCE_TITLES[i], "fundraising from an investor, valuation and cash budget"));
        if let Some(title) = HR_TITLES.get(i) {
            entries.push((*title, "hiring a team, culture and people management"));
        }
    }

    let entries = entries
        .into_iter()
        .enumerate()
        .map(|(id, (title, description))| CatalogEntry {
            id,
            title: title.to_string(),
            author: format!("Author {}", id),
            description: description.to_string(),
            table_of_contents: String::new(),
        })
        .collect();

    Catalog::from_entries(entries, "twenty".to_string()).unwrap()
}

/// The founder question used by the end-to-end scenarios.
pub const FIRST_USERS_PROBLEM: &str = "I want to acquire my first 100 users without paid ads";

pub fn first_users_query() -> UserQuery {
    UserQuery::new(
        "MVP 개발/초기 고객 확보".parse::<GrowthStage>().unwrap(),
        "마케팅/영업".parse::<Challenge>().unwrap(),
        FIRST_USERS_PROBLEM,
    )
    .unwrap()
}
