//! Search command handler.

use super::output::{candidates_json, print_candidates, print_json};
use clap::Args;
use navigator_core::{AppConfig, AppResult};
use navigator_knowledge::open_retriever;

/// Show the catalog entries most similar to a problem description
#[derive(Args, Debug)]
pub struct SearchCommand {
    /// Free-text problem description
    pub problem: String,

    /// Number of books to return (default: retrieval.topK from config)
    #[arg(short)]
    pub k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl SearchCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let k = self.k.unwrap_or(config.retrieval.top_k);
        tracing::debug!(k, "Searching index");

        let retriever = open_retriever(config)?;
        let candidates = retriever.search(&self.problem, k).await?;

        if self.json {
            print_json(&candidates_json(&candidates))
        } else {
            print_candidates(&candidates);
            Ok(())
        }
    }
}
