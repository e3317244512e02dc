use crate::prompts::PromptSet;
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Keys that [`PromptSet::with_overrides`] understands.
const KNOWN_KEYS: &[&str] = &["persona", "feedback"];

/// Reads every `*.md` file in `dir_path` into a map keyed by file stem.
///
/// Files whose content is blank are skipped so an empty placeholder never
/// wipes out a built-in prompt.
pub fn load_prompt_overrides(dir_path: &Path) -> Result<HashMap<String, String>> {
    let mut prompts = HashMap::new();

    for entry in fs::read_dir(dir_path)
        .with_context(|| format!("Failed to read prompts directory: {}", dir_path.display()))?
    {
        let path = entry?.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("md") {
            continue;
        }

        let key = path
            .file_stem()
            .and_then(|s| s.to_str())
            .context("Could not get file stem for prompt file")?
            .to_string();

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read prompt file: {}", path.display()))?;
        let content = content.trim();
        if content.is_empty() {
            tracing::warn!("Skipping empty prompt file {}", path.display());
            continue;
        }
        if !KNOWN_KEYS.contains(&key.as_str()) {
            tracing::warn!("Prompt file '{}' does not override any known prompt", key);
        }

        prompts.insert(key, content.to_string());
    }

    Ok(prompts)
}

/// Builds the prompt set, applying overrides from `dir` when one is given.
pub fn load_prompt_set(dir: Option<&Path>) -> Result<PromptSet> {
    let prompts = PromptSet::default();
    match dir {
        Some(dir) => {
            let overrides = load_prompt_overrides(dir)?;
            tracing::info!("Loaded {} prompt override(s) from {}", overrides.len(), dir.display());
            Ok(prompts.with_overrides(&overrides))
        }
        None => Ok(prompts),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::DEFAULT_PERSONA;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_overrides_reads_markdown_only() -> Result<()> {
        let dir = tempdir()?;
        let dir_path = dir.path();

        let mut persona = File::create(dir_path.join("persona.md"))?;
        writeln!(persona, "You are a strict panel interviewer.")?;

        let mut notes = File::create(dir_path.join("notes.txt"))?;
        writeln!(notes, "not a prompt")?;

        File::create(dir_path.join("feedback.md"))?;
        std::fs::create_dir(dir_path.join("nested.md"))?;

        let prompts = load_prompt_overrides(dir_path)?;

        assert_eq!(prompts.len(), 1, "only the non-empty markdown file counts");
        assert_eq!(
            prompts.get("persona").map(String::as_str),
            Some("You are a strict panel interviewer.")
        );
        assert!(!prompts.contains_key("notes"));
        assert!(!prompts.contains_key("feedback"));
        Ok(())
    }

    #[test]
    fn test_missing_dir_is_an_error() {
        let result = load_prompt_overrides(Path::new("no_such_prompts_dir_for_interviews"));
        assert!(result.is_err());
    }

    #[test]
    fn test_prompt_set_applies_overrides() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("feedback.md"), "Score harshly.\n")?;

        let prompts = load_prompt_set(Some(dir.path()))?;
        assert_eq!(prompts.feedback, "Score harshly.");
        assert_eq!(prompts.persona, DEFAULT_PERSONA);

        assert_eq!(load_prompt_set(None)?, PromptSet::default());
        Ok(())
    }
}
