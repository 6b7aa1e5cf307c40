//! Ranking correctness over a built store.

use super::fixtures::{
    first_users_query, twenty_book_catalog, TopicProvider, FINANCE_TITLES, FIRST_USERS_PROBLEM,
    HR_TITLES, MARKETING_TITLES,
};
use crate::builder::IndexBuilder;
use crate::embeddings::providers::MockProvider;
use crate::embeddings::EmbeddingProvider;
use crate::ranker::{cosine_similarity, rank, Retriever};
use crate::types::{Challenge, GrowthStage};
use navigator_core::AppError;
use std::sync::Arc;
use std::time::Duration;

#[tokio::test]
async fn test_first_users_question_ranks_marketing_books_first() {
    let catalog = twenty_book_catalog();
    let (store, report) = IndexBuilder::new(Arc::new(TopicProvider))
        .build(&catalog)
        .await
        .unwrap();
    assert_eq!(report.embedded, 20);

    let query = first_users_query();
    assert_eq!(query.growth_stage, GrowthStage::MvpEarlyCustomers);
    assert_eq!(query.challenge, Challenge::MarketingSales);
    assert_eq!(query.problem_text, FIRST_USERS_PROBLEM);

    let retriever = Retriever::new(Arc::new(TopicProvider), Arc::new(store), Duration::from_secs(5));
    let top = retriever.search(&query.problem_text, 5).await.unwrap();

    assert_eq!(top.len(), 5);
    for candidate in &top {
        assert!(
            MARKETING_TITLES.contains(&candidate.entry.title.as_str()),
            "{} should not be in the top 5",
            candidate.entry.title
        );
        assert!(!FINANCE_TITLES.contains(&candidate.entry.title.as_str()));
        assert!(!HR_TITLES.contains(&candidate.entry.title.as_str()));
    }
    assert!(top[4].score > 0.9);
}

#[tokio::test]
async fn test_scores_agree_with_direct_cosine() {
    let catalog = twenty_book_catalog();
    let (store, _) = IndexBuilder::new(Arc::new(MockProvider::new(64)))
        .build(&catalog)
        .await
        .unwrap();

    let embedding = MockProvider::new(64).embed("cash for fundraising").await.unwrap();

    let ranked = rank(&embedding, &store, store.len()).unwrap();
    assert_eq!(ranked.len(), 20);
    assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));

    for candidate in &ranked {
        let row = store
            .rows()
            .iter()
            .position(|r| r.entry.id == candidate.entry.id)
            .unwrap();
        let expected = cosine_similarity(&embedding, store.matrix().row(row).unwrap()).unwrap();
        assert!((candidate.score - expected).abs() < 1e-5);
    }
}

#[tokio::test]
async fn test_k_larger_than_store_returns_everything() {
    let catalog = twenty_book_catalog();
    let (store, _) = IndexBuilder::new(Arc::new(TopicProvider))
        .build(&catalog)
        .await
        .unwrap();

    let retriever = Retriever::new(Arc::new(TopicProvider), Arc::new(store), Duration::from_secs(5));
    assert_eq!(retriever.search("hiring", 100).await.unwrap().len(), 20);
    assert!(retriever.search("hiring", 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_query_cannot_be_embedded() {
    let catalog = twenty_book_catalog();
    let (store, _) = IndexBuilder::new(Arc::new(TopicProvider))
        .build(&catalog)
        .await
        .unwrap();

    let retriever = Retriever::new(Arc::new(TopicProvider), Arc::new(store), Duration::from_secs(5));
    assert!(matches!(
        retriever.search("   ", 5).await,
        Err(AppError::EmbeddingUnavailable(_))
    ));
}
