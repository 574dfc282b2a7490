//! Prompt text sent to the text-generation service.

pub const STATEMENT_USER_PROMPT: &str = "Write a short, encouraging Christian statement or verse that doesn't repeat the recent statements.";

pub const SELECTION_SYSTEM_PROMPT: &str = "You are a helpful AI that picks the best short, uplifting Christian verse among the candidates.
We WANT a verse that is short, meaningful, easy to read and understand.
If there are multiple options, pick the most encouraging one.
We do NOT want verses which require further context to make sense or just list names, places, etc.

Examples of acceptable verses:
- For God so loved the world that he gave his only son.
- And he said to them, Why were you looking for me?
- No, I tell you but unless you repent, you will all likewise perish.

Examples of not acceptable:
- The sons of Neziah, and the sons of Hatipha.
- The following were those who came up from Telmelah...
- Jezreel, Jokdeam, Zanoah...

We will provide a list of candidate verses; respond ONLY with the index (1-based), or 'none' if none are acceptable.";

/// System prompt for statement generation, listing `recent` (oldest first) as already used.
pub fn statement_system_prompt(recent: &[String]) -> String {
    let joined_recent = recent
        .iter()
        .map(|statement| format!("- {statement}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a helpful AI that writes short, uplifting, encouraging Christian statements. \
They must be concise, easy to read, and in plain language. \
Always remain consistent with biblical truth, but employ synonyms, figurative speech, \
and varied sentence structures. Avoid repeating the same ideas in the same way.\n\n\
Here are up to five recent statements we already used:\n\
{joined_recent}\n\n\
Please produce ONE new short, encouraging Christian statement or verse. \
If it conveys a similar idea to the recent ones, please rephrase and vary the wording."
    )
}

/// User prompt enumerating the candidate verse texts, 1-based.
pub fn selection_user_prompt(candidates: &[&str]) -> String {
    let mut content = String::from("Here are the candidate verses:\n\n");
    for (i, text) in candidates.iter().enumerate() {
        content.push_str(&format!("{}) {}\n", i + 1, text));
    }
    content.push_str("\nWhich one is the best? Return only the number or 'none'.");
    content
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_prompt_lists_recent_oldest_first() {
        let recent = vec!["first".to_string(), "second".to_string()];
        let prompt = statement_system_prompt(&recent);
        let first = prompt.find("- first").expect("first listed");
        let second = prompt.find("- second").expect("second listed");
        assert!(first < second);
    }

    #[test]
    fn test_selection_prompt_is_one_based() {
        let prompt = selection_user_prompt(&["Jesus wept.", "Pray without ceasing."]);
        assert!(prompt.contains("1) Jesus wept.\n"));
        assert!(prompt.contains("2) Pray without ceasing.\n"));
        assert!(prompt.ends_with("Return only the number or 'none'."));
    }
}
