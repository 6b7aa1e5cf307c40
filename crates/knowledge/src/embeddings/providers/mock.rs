//! Deterministic offline embedding provider.

use crate::embeddings::provider::{prepare_text, EmbeddingProvider};
use navigator_core::AppResult;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hashing provider for tests, demos and air-gapped index builds.
///
/// Each word contributes its padded character bigrams and the whole word to
/// hashed buckets, so texts sharing vocabulary (including Korean stems with
/// different particles) land close together. Vectors are unit-normalised.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, feature: &str) -> usize {
        let hash = feature
            .bytes()
            .fold(FNV_OFFSET, |acc, b| (acc ^ b as u64).wrapping_mul(FNV_PRIME));
        (hash % self.dimensions as u64) as usize
    }

    fn hash_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];

        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }

            embedding[self.bucket(&word)] += 1.0;

            let padded: Vec<char> = std::iter::once(' ')
                .chain(word.chars())
                .chain(std::iter::once(' '))
                .collect();
            for pair in padded.windows(2) {
                let bigram: String = pair.iter().collect();
                embedding[self.bucket(&bigram)] += 0.5;
            }
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "hash-bigram-v1"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let text = prepare_text(text)?;
        Ok(self.hash_embedding(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranker::cosine_similarity;
    use navigator_core::AppError;

    #[tokio::test]
    async fn test_mock_provider_identity() {
        let provider = MockProvider::new(256);
        assert_eq!(provider.dimensions(), 256);
        assert_eq!(provider.provider_name(), "mock");
        assert_eq!(provider.model_name(), "hash-bigram-v1");
    }

    #[tokio::test]
    async fn test_embedding_is_unit_length() {
        let provider = MockProvider::new(256);
        let embedding = provider.embed("초기 고객을 모으는 마케팅 채널").await.unwrap();

        assert_eq!(embedding.len(), 256);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic_and_newline_insensitive() {
        let provider = MockProvider::new(256);
        let a = provider.embed("트랙션\n채널 전략").await.unwrap();
        let b = provider.embed("트랙션 채널 전략").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = MockProvider::new(512);
        let query = provider.embed("광고비 없이 마케팅으로 고객 모으기").await.unwrap();
        let marketing = provider.embed("마케팅 채널로 첫 고객을 모으는 방법").await.unwrap();
        let finance = provider.embed("재무제표와 투자 계약서 읽는 법").await.unwrap();

        let close = cosine_similarity(&query, &marketing).unwrap();
        let far = cosine_similarity(&query, &finance).unwrap();
        assert!(close > far, "{} should exceed {}", close, far);
    }

    #[tokio::test]
    async fn test_blank_text_is_unavailable() {
        let provider = MockProvider::new(64);
        assert!(matches!(
            provider.embed("   ").await,
            Err(AppError::EmbeddingUnavailable(_))
        ));
    }
}
