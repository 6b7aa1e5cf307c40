//! Prompt loader for YAML prompt definitions.
//!
//! A prompt is looked up as `<prompts_dir>/<id>.yml` first, so a workspace can
//! override any built-in prompt; otherwise the compiled-in definition is used.

use crate::types::{PromptDefinition, PromptSource};
use navigator_core::{AppError, AppResult};
use std::path::Path;

/// Identifier of the recommendation prompt.
pub const RECOMMEND_PROMPT_ID: &str = "recommend.default";

const BUILTIN_PROMPTS: &[(&str, &str)] = &[(
    RECOMMEND_PROMPT_ID,
    include_str!("../prompts/recommend.default.yml"),
)];

/// Load a prompt definition by ID.
///
/// # Arguments
/// * `prompts_dir` - Directory with workspace overrides (usually `.navigator/prompts`)
/// * `prompt_id` - Prompt identifier (e.g., "recommend.default")
///
/// # Example
/// ```no_run
/// use navigator_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (prompt, source) = load_prompt(Path::new(".navigator/prompts"), "recommend.default")?;
/// println!("Loaded prompt: {} ({:?})", prompt.title, source);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(
    prompts_dir: &Path,
    prompt_id: &str,
) -> AppResult<(PromptDefinition, PromptSource)> {
    let prompt_file = prompts_dir.join(format!("{}.yml", prompt_id));

    if prompt_file.exists() {
        tracing::debug!("Loading prompt override from: {:?}", prompt_file);

        let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
            AppError::Prompt(format!(
                "Failed to read prompt file {:?}: {}",
                prompt_file, e
            ))
        })?;

        let definition = parse_prompt(&contents, &prompt_file.to_string_lossy())?;
        tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);
        return Ok((definition, PromptSource::Workspace));
    }

    match builtin_prompt(prompt_id) {
        Some(definition) => Ok((definition?, PromptSource::Builtin)),
        None => Err(AppError::Prompt(format!(
            "Prompt '{}' not found in {:?} and no built-in default exists",
            prompt_id, prompts_dir
        ))),
    }
}

/// Parse a compiled-in prompt, if one exists for `prompt_id`.
pub fn builtin_prompt(prompt_id: &str) -> Option<AppResult<PromptDefinition>> {
    BUILTIN_PROMPTS
        .iter()
        .find(|(id, _)| *id == prompt_id)
        .map(|(id, contents)| parse_prompt(contents, &format!("builtin:{}", id)))
}

fn parse_prompt(contents: &str, origin: &str) -> AppResult<PromptDefinition> {
    let definition: PromptDefinition = serde_yaml::from_str(contents).map_err(|e| {
        AppError::Prompt(format!("Failed to parse prompt YAML {}: {}", origin, e))
    })?;

    validate_prompt(&definition)?;
    Ok(definition)
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.trim().is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    Ok(())
}
