//! Recommend command handler.

use super::output::{candidates_json, print_candidates, print_json, print_recommendation};
use clap::Args;
use console::style;
use navigator_core::{AppConfig, AppResult};
use navigator_knowledge::{open_pipeline, Challenge, GrowthStage, UserQuery};

/// Recommend one book for a growth stage, challenge and problem
#[derive(Args, Debug)]
pub struct RecommendCommand {
    /// Growth stage (idea-validation, mvp-early-customers, product-market-fit, scale-up)
    #[arg(long)]
    pub stage: GrowthStage,

    /// Challenge (business-model, product, marketing-sales, team-culture, finance-fundraising)
    #[arg(long)]
    pub challenge: Challenge,

    /// Free-text problem description
    pub problem: String,

    /// Number of candidate books given to the model
    #[arg(short)]
    pub k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl RecommendCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let query = UserQuery::new(self.stage, self.challenge, &self.problem)?;

        let mut config = config.clone();
        if let Some(k) = self.k {
            config.retrieval.top_k = k;
        }

        let pipeline = open_pipeline(&config)?;
        let (candidates, recommendation) = pipeline.run(&query).await?;

        if self.json {
            return print_json(&serde_json::json!({
                "query": query,
                "candidates": candidates_json(&candidates),
                "recommendation": recommendation,
            }));
        }

        println!("{}", style("후보 도서").bold());
        print_candidates(&candidates);
        print_recommendation(&recommendation);
        Ok(())
    }
}
