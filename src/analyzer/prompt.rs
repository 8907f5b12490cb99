//! Prompt building for batch analysis.
//!
//! Templates live in `src/analyzer/prompts/` and are included at compile
//! time.

use super::batch::Batch;

/// Default section context prefix.
pub const DEFAULT_CONTEXT: &str = "Financial data API response";

/// Default language for human-readable field names.
pub const DEFAULT_LANGUAGE: &str = "English";

/// A request to a collaborator: fixed instructions plus the batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Single-text form for agents that read one prompt on stdin.
    pub fn combined(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Render the system instructions.
pub fn build_system_prompt(language: &str) -> String {
    const TEMPLATE: &str = include_str!("prompts/system.txt");
    TEMPLATE.trim_end().replace("{language}", language)
}

/// Build the prompt for one batch.
///
/// # Arguments
///
/// * `batch` - Fields to describe, in order
/// * `context` - Document context; the section name is appended
/// * `language` - Language for `dataName`
pub fn build_batch_prompt(
    batch: &Batch,
    context: &str,
    language: &str,
) -> Result<Prompt, serde_json::Error> {
    const TEMPLATE: &str = include_str!("prompts/batch.txt");

    let fields = serde_json::to_string(&batch.descriptors)?;
    let section_context = format!("{}, section: {}", context, batch.section);

    let user = TEMPLATE
        .trim_end()
        .replace("{context}", &section_context)
        .replace("{batch_label}", &batch.label())
        .replace("{count}", &batch.len().to_string())
        .replace("{fields}", &fields);

    Ok(Prompt {
        system: build_system_prompt(language),
        user,
    })
}
