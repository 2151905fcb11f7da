// Prompt formatting and generation clean-up
// Author: kelexine (https://github.com/kelexine)

use crate::config::PromptFormat;
use crate::conversation::{Message, Role};
use once_cell::sync::Lazy;
use regex::Regex;

/// One sentence: a run of non-terminators followed by terminators
static SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+[.!?]+").unwrap());

/// The model talking about itself: "Picksy: ...", "Assistant: ..."
static SELF_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:<\|assistant\|>|(?i:picksy|assistant|ai)\s*:)\s*").unwrap()
});

/// Markers after which the model starts writing the next turn itself
const TURN_MARKERS: &[&str] = &["</s>", "<|user|>", "<|system|>", "<|assistant|>", "\nUser:", "\nuser:"];

/// Render the conversation plus the new input for a model family.
pub fn format_prompt(format: PromptFormat, context: &[Message], input: &str) -> String {
    match format {
        // Small completion models do best with the bare question
        PromptFormat::Plain => input.to_string(),
        PromptFormat::Chat => {
            let mut prompt = String::new();
            for message in context {
                let tag = match message.role {
                    Role::System => "<|system|>",
                    Role::User => "<|user|>",
                    Role::Assistant => "<|assistant|>",
                };
                prompt.push_str(tag);
                prompt.push('\n');
                prompt.push_str(&message.content);
                prompt.push_str("</s>\n");
            }
            prompt.push_str("<|user|>\n");
            prompt.push_str(input);
            prompt.push_str("</s>\n<|assistant|>\n");
            prompt
        }
    }
}

/// Turn raw generator output into a reply, or `None` if nothing usable is
/// left.
///
/// Strips an echoed prompt and self-referential prefixes, cuts the text at
/// the first turn marker, keeps at most `max_sentences` sentences and makes
/// sure the reply ends in `.`, `!` or `?`.
pub fn postprocess(raw: &str, prompt: &str, max_sentences: usize) -> Option<String> {
    let echo = prompt.trim();
    let mut text = match raw.trim_start().strip_prefix(echo) {
        Some(rest) if !echo.is_empty() => rest.to_string(),
        _ => raw.to_string(),
    };

    loop {
        let stripped = SELF_PREFIX.replace(&text, "").into_owned();
        if stripped == text {
            break;
        }
        text = stripped;
    }

    if let Some(cut) = TURN_MARKERS.iter().filter_map(|m| text.find(m)).min() {
        text.truncate(cut);
    }

    let mut reply = text.trim().to_string();

    let limit = max_sentences.max(1);
    let matches: Vec<_> = SENTENCE.find_iter(&reply).collect();
    // An unterminated tail becomes a sentence of its own once punctuated
    let has_tail = matches
        .last()
        .map_or(false, |last| !reply[last.end()..].trim().is_empty());
    if matches.len() > limit || (has_tail && matches.len() >= limit) {
        reply = matches[..limit]
            .iter()
            .map(|m| m.as_str().trim())
            .collect::<Vec<_>>()
            .join(" ");
    }

    if reply.is_empty() {
        return None;
    }

    if !reply.ends_with(['.', '!', '?']) {
        reply.push('.');
    }

    Some(reply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_format_is_input_only() {
        let context = vec![Message::system("persona"), Message::user("q"), Message::assistant("a")];
        assert_eq!(format_prompt(PromptFormat::Plain, &context, "hi"), "hi");
    }

    #[test]
    fn test_chat_format_includes_history() {
        let context = vec![Message::system("persona"), Message::user("q"), Message::assistant("a")];
        let prompt = format_prompt(PromptFormat::Chat, &context, "hi");
        assert_eq!(
            prompt,
            "<|system|>\npersona</s>\n<|user|>\nq</s>\n<|assistant|>\na</s>\n<|user|>\nhi</s>\n<|assistant|>\n"
        );
    }

    #[test]
    fn test_adds_terminal_punctuation() {
        assert_eq!(postprocess("Great job", "", 4).as_deref(), Some("Great job."));
        assert_eq!(postprocess("Great job!", "", 4).as_deref(), Some("Great job!"));
        assert_eq!(postprocess("Really?", "", 4).as_deref(), Some("Really?"));
    }

    #[test]
    fn test_truncates_to_max_sentences() {
        let raw = "One. Two! Three? Four. Five. Six.";
        assert_eq!(
            postprocess(raw, "", 4).as_deref(),
            Some("One. Two! Three? Four.")
        );
        assert_eq!(postprocess("One. Two.", "", 4).as_deref(), Some("One. Two."));
    }

    #[test]
    fn test_trailing_fragment_counts_against_limit() {
        assert_eq!(
            postprocess("One. Two. Three. Four. and then", "", 4).as_deref(),
            Some("One. Two. Three. Four.")
        );
        // Room for the fragment: kept and punctuated
        assert_eq!(
            postprocess("One. Two. and then", "", 4).as_deref(),
            Some("One. Two. and then.")
        );
        assert_eq!(postprocess("Just a fragment", "", 1).as_deref(), Some("Just a fragment."));
    }

    #[test]
    fn test_strips_prompt_echo_and_self_prefix() {
        let prompt = "How do I keep time?";
        let raw = "How do I keep time? Picksy: Use a metronome";
        assert_eq!(
            postprocess(raw, prompt, 4).as_deref(),
            Some("Use a metronome.")
        );
        assert_eq!(
            postprocess("Assistant: assistant: Count out loud.", "", 4).as_deref(),
            Some("Count out loud.")
        );
    }

    #[test]
    fn test_cuts_at_next_turn() {
        let raw = "Tap your foot.</s>\n<|user|>\nthanks";
        assert_eq!(postprocess(raw, "", 4).as_deref(), Some("Tap your foot."));
    }

    #[test]
    fn test_empty_output_is_none() {
        assert_eq!(postprocess("   ", "", 4), None);
        assert_eq!(postprocess("q", "q", 4), None);
        assert_eq!(postprocess("Picksy:", "", 4), None);
    }
}
