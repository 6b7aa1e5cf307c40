//! Query pipeline from problem text to recommendation, with stub backends.

use super::fixtures::{first_users_query, twenty_book_catalog, ScriptedLlm, TopicProvider, MARKETING_TITLES};
use crate::builder::IndexBuilder;
use crate::ranker::Retriever;
use crate::recommend::{QueryPipeline, Recommender};
use crate::types::{Challenge, GrowthStage};
use crate::wizard::{transition, SessionContext, WizardEvent, WizardState};
use navigator_prompt::{builtin_prompt, RECOMMEND_PROMPT_ID};
use std::sync::Arc;
use std::time::Duration;

async fn pipeline(llm: Arc<ScriptedLlm>) -> QueryPipeline {
    let (store, _) = IndexBuilder::new(Arc::new(TopicProvider))
        .build(&twenty_book_catalog())
        .await
        .unwrap();
    let store = Arc::new(store);
    let catalog = Arc::new(store.catalog().unwrap());

    let retriever = Retriever::new(Arc::new(TopicProvider), store, Duration::from_secs(5));
    let prompt = builtin_prompt(RECOMMEND_PROMPT_ID).unwrap().unwrap();
    let recommender = Recommender::new(llm, "stub-model", catalog, prompt);
    QueryPipeline::new(retriever, recommender, 5)
}

#[tokio::test]
async fn test_hallucinated_title_falls_back_to_top_candidate() {
    let llm = Arc::new(ScriptedLlm::new(
        r#"{"best_book": {"title": "A Book Nobody Wrote", "author": "?"},
            "new_reason": "It fits perfectly",
            "second_and_third_books": [{"title": "Hooked"}]}"#,
    ));

    let (candidates, recommendation) = pipeline(llm.clone()).await.run(&first_users_query()).await.unwrap();

    assert!(recommendation.used_fallback);
    assert_eq!(recommendation.chosen, candidates[0].entry);
    assert!(MARKETING_TITLES.contains(&recommendation.chosen.title.as_str()));
    assert_eq!(recommendation.rationale, "It fits perfectly");

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("MVP 개발/초기 고객 확보"));
    assert!(prompts[0].contains("마케팅/영업"));
    assert!(prompts[0].contains("first 100 users"));
    for candidate in &candidates {
        assert!(prompts[0].contains(&candidate.entry.title));
    }
}

#[tokio::test]
async fn test_wizard_session_reaches_result_through_pipeline() {
    let llm = Arc::new(ScriptedLlm::new(
        r#"{"best_book": {"title": "Traction"}, "new_reason": "Test nineteen channels"}"#,
    ));
    let pipeline = pipeline(llm).await;

    let mut ctx = SessionContext::new();
    for event in [
        WizardEvent::StageSelected(GrowthStage::IdeaValidation),
        WizardEvent::ChallengeSelected(Challenge::MarketingSales),
        WizardEvent::ProblemSubmitted("marketing channel for growth".to_string()),
    ] {
        ctx = transition(&ctx, event).unwrap();
    }
    assert_eq!(ctx.state, WizardState::Recommend);

    let event = match pipeline.run(&ctx.user_query().unwrap()).await {
        Ok((_, recommendation)) => WizardEvent::RecommendationReady(recommendation),
        Err(e) => WizardEvent::failed(&e),
    };
    let ctx = transition(&ctx, event).unwrap();

    assert_eq!(ctx.state, WizardState::ShowResult);
    let recommendation = ctx.recommendation.unwrap();
    assert_eq!(recommendation.chosen.title, "Traction");
    assert!(!recommendation.used_fallback);
}

#[tokio::test]
async fn test_unparseable_answer_returns_wizard_to_problem_step() {
    let pipeline = pipeline(Arc::new(ScriptedLlm::new("I recommend Traction!"))).await;

    let mut ctx = SessionContext::new();
    ctx = transition(&ctx, WizardEvent::StageSelected(GrowthStage::ScaleUp)).unwrap();
    ctx = transition(&ctx, WizardEvent::ChallengeSelected(Challenge::MarketingSales)).unwrap();
    ctx = transition(&ctx, WizardEvent::ProblemSubmitted("sales channel".to_string())).unwrap();

    let err = pipeline.run(&ctx.user_query().unwrap()).await.unwrap_err();
    let ctx = transition(&ctx, WizardEvent::failed(&err)).unwrap();

    assert_eq!(ctx.state, WizardState::CollectProblem);
    assert_eq!(ctx.growth_stage, Some(GrowthStage::ScaleUp));
    assert!(ctx.last_error.is_some());
}
