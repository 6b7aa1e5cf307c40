//! Wizard command handler.
//!
//! Drives the session state machine from terminal prompts.

use super::output::print_recommendation;
use clap::Args;
use console::style;
use dialoguer::{Input, Select};
use navigator_core::{AppConfig, AppError, AppResult};
use navigator_knowledge::{
    open_pipeline, transition, Challenge, GrowthStage, SessionContext, WizardEvent, WizardState,
};

/// Interactive recommendation session
#[derive(Args, Debug)]
pub struct WizardCommand {}

fn prompt_error(err: dialoguer::Error) -> AppError {
    AppError::Other(format!("Terminal prompt failed: {}", err))
}

impl WizardCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let pipeline = open_pipeline(config)?;

        println!("{}", style("스타트업 북 내비게이터").bold().cyan());
        println!("세 가지 질문에 답하면 지금 읽어야 할 책을 골라 드립니다.");
        println!();

        let mut ctx = SessionContext::new();

        while !ctx.is_closed() {
            let event = match ctx.state {
                WizardState::CollectStage => {
                    let labels: Vec<&str> = GrowthStage::ALL.iter().map(|s| s.label()).collect();
                    let choice = Select::new()
                        .with_prompt("Q1. 현재 스타트업은 어느 단계에 있나요?")
                        .items(&labels)
                        .default(0)
                        .interact()
                        .map_err(prompt_error)?;
                    WizardEvent::StageSelected(GrowthStage::ALL[choice])
                }

                WizardState::CollectChallenge => {
                    let labels: Vec<&str> = Challenge::ALL.iter().map(|c| c.label()).collect();
                    let choice = Select::new()
                        .with_prompt("Q2. 가장 큰 고민은 어떤 분야인가요?")
                        .items(&labels)
                        .default(0)
                        .interact()
                        .map_err(prompt_error)?;
                    WizardEvent::ChallengeSelected(Challenge::ALL[choice])
                }

                WizardState::CollectProblem => {
                    if let Some(message) = &ctx.last_error {
                        println!("{} {}", style("⚠").yellow(), message);
                        println!("고민을 조금 바꿔서 다시 시도해 보세요.");
                    }
                    let text: String = Input::new()
                        .with_prompt("Q3. 구체적인 고민을 적어 주세요")
                        .with_initial_text(ctx.problem_text.clone().unwrap_or_default())
                        .allow_empty(true)
                        .interact_text()
                        .map_err(prompt_error)?;
                    WizardEvent::ProblemSubmitted(text)
                }

                WizardState::Recommend => {
                    let query = ctx.user_query()?;
                    println!("{}", style("고민에 맞는 책을 찾는 중...").dim());

                    match pipeline.run(&query).await {
                        Ok((_, recommendation)) => WizardEvent::RecommendationReady(recommendation),
                        Err(e) if e.is_user_correctable() => {
                            tracing::warn!("Recommendation failed: {}", e);
                            WizardEvent::failed(&e)
                        }
                        Err(e) => return Err(e),
                    }
                }

                WizardState::ShowResult => {
                    if let Some(recommendation) = &ctx.recommendation {
                        print_recommendation(recommendation);
                    }
                    let choice = Select::new()
                        .with_prompt("다음")
                        .items(&["다른 고민 상담하기", "종료"])
                        .default(0)
                        .interact()
                        .map_err(prompt_error)?;
                    if choice == 0 {
                        WizardEvent::Restart
                    } else {
                        WizardEvent::Quit
                    }
                }

                WizardState::Closed => break,
            };

            match transition(&ctx, event) {
                Ok(next) => ctx = next,
                Err(AppError::InvalidInput(message)) => {
                    println!("{} {}", style("⚠").yellow(), message);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }
}
