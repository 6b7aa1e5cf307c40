//! Query and result types shared by the ranking and recommendation steps.

use crate::catalog::CatalogEntry;
use navigator_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Where the founder's company currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GrowthStage {
    IdeaValidation,
    MvpEarlyCustomers,
    ProductMarketFit,
    ScaleUp,
}

impl GrowthStage {
    pub const ALL: [GrowthStage; 4] = [
        GrowthStage::IdeaValidation,
        GrowthStage::MvpEarlyCustomers,
        GrowthStage::ProductMarketFit,
        GrowthStage::ScaleUp,
    ];

    /// Label shown to the user and sent to the model.
    pub fn label(&self) -> &'static str {
        match self {
            GrowthStage::IdeaValidation => "아이디어 검증",
            GrowthStage::MvpEarlyCustomers => "MVP 개발/초기 고객 확보",
            GrowthStage::ProductMarketFit => "PMF(시장-제품 적합성) 탐색",
            GrowthStage::ScaleUp => "스케일업/투자 유치",
        }
    }

    /// ASCII identifier accepted on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            GrowthStage::IdeaValidation => "idea-validation",
            GrowthStage::MvpEarlyCustomers => "mvp-early-customers",
            GrowthStage::ProductMarketFit => "product-market-fit",
            GrowthStage::ScaleUp => "scale-up",
        }
    }
}

impl FromStr for GrowthStage {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|stage| stage.label() == s || stage.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Unknown growth stage '{}'. Expected one of: {}",
                    s,
                    Self::ALL.map(|stage| stage.slug()).join(", ")
                ))
            })
    }
}

impl fmt::Display for GrowthStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The category of problem the founder faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Challenge {
    BusinessModel,
    Product,
    MarketingSales,
    TeamCulture,
    FinanceFundraising,
}

impl Challenge {
    pub const ALL: [Challenge; 5] = [
        Challenge::BusinessModel,
        Challenge::Product,
        Challenge::MarketingSales,
        Challenge::TeamCulture,
        Challenge::FinanceFundraising,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Challenge::BusinessModel => "비즈니스 모델/전략",
            Challenge::Product => "제품/기술",
            Challenge::MarketingSales => "마케팅/영업",
            Challenge::TeamCulture => "팀/조직문화",
            Challenge::FinanceFundraising => "투자/재무",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Challenge::BusinessModel => "business-model",
            Challenge::Product => "product",
            Challenge::MarketingSales => "marketing-sales",
            Challenge::TeamCulture => "team-culture",
            Challenge::FinanceFundraising => "finance-fundraising",
        }
    }
}

impl FromStr for Challenge {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|challenge| challenge.label() == s || challenge.slug().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                AppError::InvalidInput(format!(
                    "Unknown challenge '{}'. Expected one of: {}",
                    s,
                    Self::ALL.map(|challenge| challenge.slug()).join(", ")
                ))
            })
    }
}

impl fmt::Display for Challenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A complete question from the interview surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQuery {
    pub growth_stage: GrowthStage,
    pub challenge: Challenge,
    /// Free-text problem description, trimmed and non-empty
    pub problem_text: String,
}

impl UserQuery {
    /// Build a query, rejecting problem text that is empty after trimming.
    pub fn new(
        growth_stage: GrowthStage,
        challenge: Challenge,
        problem_text: impl AsRef<str>,
    ) -> AppResult<Self> {
        let problem_text = problem_text.as_ref().trim();
        if problem_text.is_empty() {
            return Err(AppError::InvalidInput(
                "Problem description cannot be empty".to_string(),
            ));
        }

        Ok(Self {
            growth_stage,
            challenge,
            problem_text: problem_text.to_string(),
        })
    }
}

/// A catalog entry paired with its similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCandidate {
    pub entry: CatalogEntry,
    /// Cosine similarity in [-1, 1]
    pub score: f32,
}

/// The final answer handed back to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub chosen: CatalogEntry,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table_of_contents: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_suggestions: Option<String>,
    /// At most two further reads, never containing `chosen`
    pub secondary: Vec<CatalogEntry>,
    /// The model named a title outside the candidate set
    pub used_fallback: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_parses_from_label_and_slug() {
        assert_eq!(
            "아이디어 검증".parse::<GrowthStage>().unwrap(),
            GrowthStage::IdeaValidation
        );
        assert_eq!(
            "Product-Market-Fit".parse::<GrowthStage>().unwrap(),
            GrowthStage::ProductMarketFit
        );
        assert!(matches!(
            "series-b".parse::<GrowthStage>(),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_challenge_parses_from_label_and_slug() {
        assert_eq!(
            " 마케팅/영업 ".parse::<Challenge>().unwrap(),
            Challenge::MarketingSales
        );
        assert_eq!(
            "finance-fundraising".parse::<Challenge>().unwrap(),
            Challenge::FinanceFundraising
        );
    }

    #[test]
    fn test_every_variant_round_trips_through_label() {
        for stage in GrowthStage::ALL {
            assert_eq!(stage.to_string().parse::<GrowthStage>().unwrap(), stage);
        }
        for challenge in Challenge::ALL {
            assert_eq!(challenge.to_string().parse::<Challenge>().unwrap(), challenge);
        }
    }

    #[test]
    fn test_user_query_rejects_blank_problem() {
        let result = UserQuery::new(GrowthStage::ScaleUp, Challenge::TeamCulture, " \n\t ");
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_user_query_trims_problem() {
        let query = UserQuery::new(
            GrowthStage::MvpEarlyCustomers,
            Challenge::MarketingSales,
            "  초기 유저 100명을 모으고 싶어요\n",
        )
        .unwrap();
        assert_eq!(query.problem_text, "초기 유저 100명을 모으고 싶어요");
    }
}
