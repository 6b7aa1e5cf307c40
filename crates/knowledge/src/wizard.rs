//! Interview session as an explicit state machine.
//!
//! `transition` is a pure function of (context, event); the terminal surface
//! only collects input, performs the recommendation call in the `Recommend`
//! state and feeds the outcome back as an event.

use crate::types::{Challenge, GrowthStage, Recommendation, UserQuery};
use navigator_core::{AppError, AppResult};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardState {
    CollectStage,
    CollectChallenge,
    CollectProblem,
    Recommend,
    ShowResult,
    /// Terminal: the user quit or the session hit a fatal error
    Closed,
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WizardState::CollectStage => "collect_stage",
            WizardState::CollectChallenge => "collect_challenge",
            WizardState::CollectProblem => "collect_problem",
            WizardState::Recommend => "recommend",
            WizardState::ShowResult => "show_result",
            WizardState::Closed => "closed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WizardEvent {
    StageSelected(GrowthStage),
    ChallengeSelected(Challenge),
    ProblemSubmitted(String),
    RecommendationReady(Recommendation),
    RecommendationFailed { message: String, fatal: bool },
    Restart,
    Quit,
}

impl WizardEvent {
    /// Failure event for `error`; errors the user cannot fix close the session.
    pub fn failed(error: &AppError) -> Self {
        WizardEvent::RecommendationFailed {
            message: error.to_string(),
            fatal: !error.is_user_correctable(),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            WizardEvent::StageSelected(_) => "stage_selected",
            WizardEvent::ChallengeSelected(_) => "challenge_selected",
            WizardEvent::ProblemSubmitted(_) => "problem_submitted",
            WizardEvent::RecommendationReady(_) => "recommendation_ready",
            WizardEvent::RecommendationFailed { .. } => "recommendation_failed",
            WizardEvent::Restart => "restart",
            WizardEvent::Quit => "quit",
        }
    }
}

/// Everything a session knows so far.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    pub state: WizardState,
    pub growth_stage: Option<GrowthStage>,
    pub challenge: Option<Challenge>,
    pub problem_text: Option<String>,
    pub recommendation: Option<Recommendation>,
    /// Message from the last failed step, shown on re-entry
    pub last_error: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            state: WizardState::CollectStage,
            growth_stage: None,
            challenge: None,
            problem_text: None,
            recommendation: None,
            last_error: None,
        }
    }

    /// Clear every field and return to the first step.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn is_closed(&self) -> bool {
        self.state == WizardState::Closed
    }

    /// Assemble the query once stage, challenge and problem are all known.
    pub fn user_query(&self) -> AppResult<UserQuery> {
        match (&self.growth_stage, &self.challenge, &self.problem_text) {
            (Some(stage), Some(challenge), Some(problem)) => {
                UserQuery::new(*stage, *challenge, problem)
            }
            _ => Err(AppError::InvalidInput(
                "Session is missing stage, challenge or problem".to_string(),
            )),
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `event` to `ctx`.
///
/// `Restart` is accepted in every open state and `Quit` in every state.
///
/// # Errors
/// `InvalidInput` when the event does not apply to the current state, or
/// when a submitted problem is blank (the context is left unchanged).
pub fn transition(ctx: &SessionContext, event: WizardEvent) -> AppResult<SessionContext> {
    let mut next = ctx.clone();

    match (ctx.state, event) {
        (_, WizardEvent::Quit) => {
            next.state = WizardState::Closed;
        }

        (WizardState::Closed, event) => {
            return Err(AppError::InvalidInput(format!(
                "Session is closed; cannot apply {}",
                event.name()
            )));
        }

        (_, WizardEvent::Restart) => {
            next.reset();
        }

        (WizardState::CollectStage, WizardEvent::StageSelected(stage)) => {
            next.growth_stage = Some(stage);
            next.state = WizardState::CollectChallenge;
        }

        (WizardState::CollectChallenge, WizardEvent::ChallengeSelected(challenge)) => {
            next.challenge = Some(challenge);
            next.state = WizardState::CollectProblem;
        }

        (WizardState::CollectProblem, WizardEvent::ProblemSubmitted(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(AppError::InvalidInput(
                    "Please describe the problem you are facing".to_string(),
                ));
            }
            next.problem_text = Some(text.to_string());
            next.last_error = None;
            next.state = WizardState::Recommend;
        }

        (WizardState::Recommend, WizardEvent::RecommendationReady(recommendation)) => {
            next.recommendation = Some(recommendation);
            next.state = WizardState::ShowResult;
        }

        (WizardState::Recommend, WizardEvent::RecommendationFailed { message, fatal }) => {
            next.last_error = Some(message);
            next.state = if fatal {
                WizardState::Closed
            } else {
                WizardState::CollectProblem
            };
        }

        (state, event) => {
            return Err(AppError::InvalidInput(format!(
                "Event {} does not apply in state {}",
                event.name(),
                state
            )));
        }
    }

    tracing::debug!(from = %ctx.state, to = %next.state, "Wizard transition");
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn recommendation() -> Recommendation {
        Recommendation {
            chosen: CatalogEntry {
                id: 0,
                title: "트랙션".to_string(),
                author: "가브리엘 와인버그".to_string(),
                description: String::new(),
                table_of_contents: String::new(),
            },
            rationale: "채널을 실험하세요".to_string(),
            table_of_contents: None,
            application_suggestions: None,
            secondary: Vec::new(),
            used_fallback: false,
        }
    }

    fn at_recommend() -> SessionContext {
        let ctx = SessionContext::new();
        let ctx = transition(&ctx, WizardEvent::StageSelected(GrowthStage::IdeaValidation)).unwrap();
        let ctx = transition(&ctx, WizardEvent::ChallengeSelected(Challenge::MarketingSales)).unwrap();
        transition(&ctx, WizardEvent::ProblemSubmitted("  첫 고객 찾기 ".to_string())).unwrap()
    }

    #[test]
    fn test_happy_path_reaches_show_result() {
        let ctx = at_recommend();
        assert_eq!(ctx.state, WizardState::Recommend);
        assert_eq!(ctx.problem_text.as_deref(), Some("첫 고객 찾기"));

        let query = ctx.user_query().unwrap();
        assert_eq!(query.growth_stage, GrowthStage::IdeaValidation);
        assert_eq!(query.challenge, Challenge::MarketingSales);

        let ctx = transition(&ctx, WizardEvent::RecommendationReady(recommendation())).unwrap();
        assert_eq!(ctx.state, WizardState::ShowResult);
        assert!(ctx.recommendation.is_some());
    }

    #[test]
    fn test_generation_failure_returns_to_problem_keeping_tags() {
        let ctx = at_recommend();
        let err = AppError::GenerationFailed("bad json".to_string());

        let ctx = transition(&ctx, WizardEvent::failed(&err)).unwrap();
        assert_eq!(ctx.state, WizardState::CollectProblem);
        assert_eq!(ctx.growth_stage, Some(GrowthStage::IdeaValidation));
        assert_eq!(ctx.challenge, Some(Challenge::MarketingSales));
        assert!(ctx.last_error.as_deref().unwrap().contains("bad json"));

        let ctx = transition(&ctx, WizardEvent::ProblemSubmitted("다시".to_string())).unwrap();
        assert_eq!(ctx.state, WizardState::Recommend);
        assert_eq!(ctx.last_error, None);
    }

    #[test]
    fn test_data_unavailable_closes_session() {
        let ctx = at_recommend();
        let err = AppError::DataUnavailable("store missing".to_string());

        let ctx = transition(&ctx, WizardEvent::failed(&err)).unwrap();
        assert!(ctx.is_closed());
        assert!(transition(&ctx, WizardEvent::Restart).is_err());
    }

    #[test]
    fn test_blank_problem_is_rejected() {
        let ctx = at_recommend();
        let ctx = transition(&ctx, WizardEvent::failed(&AppError::DegenerateQuery("zero".into()))).unwrap();

        let result = transition(&ctx, WizardEvent::ProblemSubmitted("   ".to_string()));
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[test]
    fn test_out_of_order_events_are_invalid() {
        let ctx = SessionContext::new();
        assert!(matches!(
            transition(&ctx, WizardEvent::ChallengeSelected(Challenge::Product)),
            Err(AppError::InvalidInput(_))
        ));
        assert!(matches!(
            transition(&ctx, WizardEvent::RecommendationReady(recommendation())),
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_restart_clears_everything() {
        let ctx = at_recommend();
        let ctx = transition(&ctx, WizardEvent::RecommendationReady(recommendation())).unwrap();
        let ctx = transition(&ctx, WizardEvent::Restart).unwrap();
        assert_eq!(ctx, SessionContext::new());
    }

    #[test]
    fn test_quit_from_any_state() {
        let ctx = transition(&SessionContext::new(), WizardEvent::Quit).unwrap();
        assert!(ctx.is_closed());
    }

    #[test]
    fn test_user_query_requires_all_inputs() {
        let ctx = transition(
            &SessionContext::new(),
            WizardEvent::StageSelected(GrowthStage::ScaleUp),
        )
        .unwrap();
        assert!(matches!(ctx.user_query(), Err(AppError::InvalidInput(_))));
    }
}
