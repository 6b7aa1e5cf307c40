//! Build-index command handler.

use super::output::print_json;
use clap::Args;
use console::style;
use navigator_core::{AppConfig, AppResult};
use navigator_knowledge::{build_index, BuildProgress, DropReason, ProgressCallback};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

/// Embed the book catalog and persist the vector store
#[derive(Args, Debug)]
pub struct BuildIndexCommand {
    /// Catalog CSV (default: catalog path from config)
    #[arg(long)]
    pub catalog: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl BuildIndexCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let catalog_path = self
            .catalog
            .clone()
            .unwrap_or_else(|| config.catalog_path());
        tracing::info!("Building index from {:?}", catalog_path);

        // Progress goes to stderr so --json output stays parseable
        let progress: Option<ProgressCallback> = if self.json {
            None
        } else {
            Some(Arc::new(|p: BuildProgress| {
                let mut stderr = std::io::stderr();
                let _ = write!(stderr, "\r{}", p.format_simple());
                if p.completed == p.total {
                    let _ = writeln!(stderr);
                }
                let _ = stderr.flush();
            }))
        };

        let report = build_index(config, &catalog_path, progress).await?;

        if self.json {
            return print_json(&serde_json::to_value(&report)?);
        }

        println!(
            "{} {} of {} books embedded into {} ({} dimensions, {:.1}s)",
            style("✓").green(),
            report.embedded,
            report.total,
            config.store_dir().display(),
            report.dimensions,
            report.duration_secs
        );

        if !report.dropped.is_empty() {
            println!("{}", style(format!("{} dropped:", report.dropped.len())).yellow());
            for dropped in &report.dropped {
                let reason = match &dropped.reason {
                    DropReason::NoContent => "no description or table of contents".to_string(),
                    DropReason::EmbeddingUnavailable(detail) => detail.clone(),
                };
                println!("  - [{}] {}: {}", dropped.id, dropped.title, reason);
            }
        }

        Ok(())
    }
}
