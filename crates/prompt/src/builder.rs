//! Prompt builder: renders Handlebars templates against a JSON context.

use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use handlebars::Handlebars;
use navigator_core::{AppError, AppResult};
use serde_json::Value;

/// Build a prompt from a definition and a template context.
///
/// Both the optional system template and the user template are rendered with
/// the same context. HTML escaping is disabled; the output is plain text.
///
/// # Example
/// ```no_run
/// use navigator_prompt::{build_prompt, PromptDefinition};
/// use serde_json::json;
///
/// # fn example(def: PromptDefinition) -> Result<(), Box<dyn std::error::Error>> {
/// let context = json!({ "problem": "How do I find my first 100 users?" });
/// let built = build_prompt(&def, &context)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(definition: &PromptDefinition, context: &Value) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("user", &definition.template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let system = match &definition.system {
        Some(system) => {
            handlebars
                .register_template_string("system", system)
                .map_err(|e| {
                    AppError::Prompt(format!("Failed to register system template: {}", e))
                })?;
            Some(render(&handlebars, "system", context)?)
        }
        None => None,
    };

    let user = render(&handlebars, "user", context)?;

    let resolved_variables = context
        .as_object()
        .map(|map| map.keys().cloned().collect())
        .unwrap_or_default();

    Ok(BuiltPrompt {
        system,
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            json_output: definition.output.is_json(),
            resolved_variables,
        },
    })
}

fn render(handlebars: &Handlebars<'_>, name: &str, context: &Value) -> AppResult<String> {
    handlebars
        .render(name, context)
        .map_err(|e| AppError::Prompt(format!("Failed to render template '{}': {}", name, e)))
}
