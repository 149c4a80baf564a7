use slashcode_core::EntityKind;

/// Locates the trigger keyword as a substring of a comment body and returns
/// the trimmed suffix after its first occurrence.
///
/// Returns `None` when the trigger is absent. An empty trimmed suffix is
/// returned as `Some(String::new())` — "legal and means use entity
/// title/body as prompt" per `spec.md` §4.2 step 4; the caller substitutes a
/// structured summary via `build_prompt_summary`. Multiple occurrences of
/// the trigger are treated as a single trigger: only the first is used.
pub fn extract_prompt(comment_body: &str, trigger_keyword: &str) -> Option<String> {
    let index = comment_body.find(trigger_keyword)?;
    let suffix = &comment_body[index + trigger_keyword.len()..];
    Some(suffix.trim().to_string())
}

/// Builds the human-readable prompt summary stored on the journal entry and
/// surfaced in the 202 response body: `**Issue:**|**PR:** <title>` with an
/// optional `**Instruction:** <prompt>` line when the prompt is non-empty.
pub fn build_prompt_summary(entity_kind: EntityKind, title: &str, prompt: &str) -> String {
    let label = match entity_kind {
        EntityKind::Issue => "Issue",
        EntityKind::Pr => "PR",
    };
    let mut summary = format!("**{label}:** {title}");
    if !prompt.is_empty() {
        summary.push_str(&format!("\n\n**Instruction:** {prompt}"));
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_extract_prompt_returns_none_when_trigger_absent() {
        assert_eq!(extract_prompt("just chatting", "/code"), None);
    }

    #[test]
    fn unit_extract_prompt_trims_suffix_after_trigger() {
        assert_eq!(
            extract_prompt("please /code   fix the bug   ", "/code"),
            Some("fix the bug".to_string())
        );
    }

    #[test]
    fn functional_extract_prompt_returns_empty_string_for_bare_trigger() {
        assert_eq!(extract_prompt("/code", "/code"), Some(String::new()));
    }

    #[test]
    fn regression_extract_prompt_uses_only_the_first_of_multiple_triggers() {
        let body = "/code do A\nand also /code do B";
        assert_eq!(
            extract_prompt(body, "/code"),
            Some("do A\nand also /code do B".to_string())
        );
    }

    #[test]
    fn functional_build_prompt_summary_omits_instruction_when_prompt_empty() {
        assert_eq!(
            build_prompt_summary(EntityKind::Issue, "Title here", ""),
            "**Issue:** Title here"
        );
    }

    #[test]
    fn functional_build_prompt_summary_includes_instruction_when_present() {
        assert_eq!(
            build_prompt_summary(EntityKind::Pr, "Title here", "fix it"),
            "**PR:** Title here\n\n**Instruction:** fix it"
        );
    }
}
