//! Terminal rendering shared by the search, recommend and wizard commands.

use console::style;
use navigator_knowledge::{RankedCandidate, Recommendation};
use serde_json::json;

pub fn print_candidates(candidates: &[RankedCandidate]) {
    if candidates.is_empty() {
        println!("No books in the index.");
        return;
    }

    for (i, candidate) in candidates.iter().enumerate() {
        println!(
            "{:>2}. {} {} {}",
            i + 1,
            style(&candidate.entry.title).bold(),
            style(format!("({})", candidate.entry.author)).dim(),
            style(format!("{:.3}", candidate.score)).cyan()
        );
    }
}

pub fn print_recommendation(recommendation: &Recommendation) {
    let chosen = &recommendation.chosen;

    println!();
    println!("{}", style("추천 도서").bold().cyan());
    println!("  {} {}", style(&chosen.title).bold(), style(format!("/ {}", chosen.author)).dim());
    if recommendation.used_fallback {
        println!(
            "  {}",
            style("(모델이 후보 밖의 책을 골라 가장 관련도 높은 책으로 대체했습니다)").yellow()
        );
    }

    println!();
    println!("{}", style("추천 이유").bold().yellow());
    println!("{}", recommendation.rationale);

    let toc = recommendation
        .table_of_contents
        .as_deref()
        .or_else(|| Some(chosen.table_of_contents.as_str()).filter(|t| !t.trim().is_empty()));
    if let Some(toc) = toc {
        println!();
        println!("{}", style("목차").bold().yellow());
        println!("{}", toc);
    }

    if let Some(points) = &recommendation.application_suggestions {
        println!();
        println!("{}", style("적용 방향").bold().yellow());
        println!("{}", points);
    }

    if !recommendation.secondary.is_empty() {
        println!();
        println!("{}", style("함께 읽으면 좋은 책").bold().yellow());
        for entry in &recommendation.secondary {
            println!("  - {} {}", entry.title, style(format!("/ {}", entry.author)).dim());
        }
    }
    println!();
}

pub fn candidates_json(candidates: &[RankedCandidate]) -> serde_json::Value {
    let items: Vec<serde_json::Value> = candidates
        .iter()
        .enumerate()
        .map(|(i, candidate)| {
            json!({
                "rank": i + 1,
                "id": candidate.entry.id,
                "title": candidate.entry.title,
                "author": candidate.entry.author,
                "score": candidate.score,
            })
        })
        .collect();
    serde_json::Value::Array(items)
}

pub fn print_json(value: &serde_json::Value) -> navigator_core::AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
