//! Init command handler.

use clap::Args;
use console::style;
use navigator_core::{config::write_default_config, AppConfig, AppError, AppResult};

/// Write a default config file into the workspace
#[derive(Args, Debug)]
pub struct InitCommand {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.navigator_dir().join("config.yaml"));

        if path.exists() && !self.force {
            return Err(AppError::Config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        config.ensure_navigator_dir()?;
        write_default_config(&path)?;

        println!("{} {}", style("Wrote").green(), path.display());
        println!(
            "Next: place your catalog at {} and run `navigator build-index`.",
            style(config.catalog_path().display()).cyan()
        );
        Ok(())
    }
}
