/// Prompt building for LLM-judged comparisons.
use anyhow::{bail, Context, Result};
use std::path::Path;

/// Built-in prompt. The model analyzes briefly, then ends with a binary
/// verdict line; ties are not an option.
pub const DEFAULT_TEMPLATE: &str = "\
$criterion

Option A:
$option1

Option B:
$option2

Instructions:
Compare the two options in a short paragraph. You must pick one; a draw is not allowed. \
Then write \"Verdict:\" on its own line, followed by exactly one letter:

A: Option A wins
B: Option B wins
";

const REQUIRED_VARIABLES: [&str; 3] = ["$criterion", "$option1", "$option2"];

/// Load a custom template, checking that every variable is present.
pub fn load_template(path: &Path) -> Result<String> {
    let template = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read prompt template {}", path.display()))?;
    validate_template(&template)
        .with_context(|| format!("Invalid prompt template {}", path.display()))?;
    Ok(template)
}

fn validate_template(template: &str) -> Result<()> {
    let missing: Vec<&str> = REQUIRED_VARIABLES
        .iter()
        .copied()
        .filter(|var| !template.contains(var))
        .collect();
    if !missing.is_empty() {
        bail!("missing variables: {}", missing.join(", "));
    }
    Ok(())
}

/// Fill the template for one comparison.
pub fn build_prompt(template: &str, criterion: &str, option1: &str, option2: &str) -> String {
    template
        .replace("$criterion", criterion)
        .replace("$option1", option1)
        .replace("$option2", option2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_prompt_contains_all_parts() {
        let prompt = build_prompt(DEFAULT_TEMPLATE, "Which song is better?", "Hey Jude", "Yesterday");
        assert!(prompt.starts_with("Which song is better?"));
        assert!(prompt.contains("Option A:\nHey Jude"));
        assert!(prompt.contains("Option B:\nYesterday"));
        assert!(prompt.contains("Verdict:"));
        assert!(!prompt.contains('$'));
    }

    #[test]
    fn test_default_template_is_valid() {
        assert!(validate_template(DEFAULT_TEMPLATE).is_ok());
    }

    #[test]
    fn test_template_missing_variable() {
        let err = validate_template("$criterion\n$option1").unwrap_err();
        assert!(err.to_string().contains("$option2"));
    }
}
