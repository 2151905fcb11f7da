// Keyword responder - canned replies picked by substring rules
// Author: kelexine (https://github.com/kelexine)

/// Acknowledgement returned after the conversation is cleared
pub const RESET_ACKNOWLEDGEMENT: &str =
    "Conversation cleared! Let's start fresh. What would you like to practice?";

/// Reply used when no rule matches
pub const DEFAULT_REPLY: &str =
    "Keep practicing your rhythm skills regularly! I'm here to help you improve.";

/// Inputs that clear the conversation instead of being answered
const RESET_COMMANDS: &[&str] = &["clear", "clear conversation", "start over"];

/// Ordered rules: the first rule with any keyword contained in the input wins
const RULES: &[(&[&str], &str)] = &[
    (
        &["improve", "better"],
        "To improve your rhythm, try counting out loud while you practice. Start slowly and gradually increase your speed.",
    ),
    (
        &["rhythm", "beat"],
        "Rhythm is the pattern of sounds and silences in music. It's like the heartbeat that keeps everything together!",
    ),
    (
        &["mistake", "wrong"],
        "Everyone makes mistakes when learning rhythm! Try breaking the pattern into smaller parts and practice each section.",
    ),
    (
        &["practice", "learn"],
        "Regular practice is key to improving rhythm. Even just 10 minutes a day makes a big difference!",
    ),
    (
        &["hard", "difficult"],
        "Rhythm can be challenging at first. Try tapping your foot while you practice to help maintain a steady beat.",
    ),
    (
        &["time", "timing"],
        "Good timing comes from practice. Try using a metronome or clapping along with your favorite songs to develop your sense of rhythm.",
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordReply {
    /// The input asked for the conversation to be cleared
    Reset,
    Text(&'static str),
}

/// Whether `input` is one of the conversation reset commands
pub fn is_reset_command(input: &str) -> bool {
    let normalized = input.trim().to_lowercase();
    RESET_COMMANDS.contains(&normalized.as_str())
}

/// Answer `input` from the rule table.
pub fn respond(input: &str) -> KeywordReply {
    if is_reset_command(input) {
        return KeywordReply::Reset;
    }

    let lower = input.to_lowercase();
    let reply = RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(*k)))
        .map(|(_, reply)| *reply)
        .unwrap_or(DEFAULT_REPLY);

    KeywordReply::Text(reply)
}

/// Plain-text form of [`respond`], mapping a reset to its acknowledgement.
pub fn reply_text(input: &str) -> &'static str {
    match respond(input) {
        KeywordReply::Reset => RESET_ACKNOWLEDGEMENT,
        KeywordReply::Text(text) => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_rule_wins() {
        // "better" (rule 1) beats "rhythm" (rule 2)
        match respond("How do I get better at rhythm?") {
            KeywordReply::Text(text) => assert!(text.starts_with("To improve your rhythm")),
            KeywordReply::Reset => panic!("not a reset command"),
        }
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        assert_eq!(respond("WHAT IS A BEAT"), respond("what is a beat"));
    }

    #[test]
    fn test_reset_commands() {
        assert!(is_reset_command("clear"));
        assert!(is_reset_command("  Clear Conversation \n"));
        assert!(is_reset_command("START OVER"));
        assert!(!is_reset_command("clear the table"));
        assert_eq!(respond("start over"), KeywordReply::Reset);
        assert_eq!(reply_text("clear"), RESET_ACKNOWLEDGEMENT);
    }

    #[test]
    fn test_default_reply() {
        assert_eq!(respond("hello there"), KeywordReply::Text(DEFAULT_REPLY));
        assert_eq!(respond(""), KeywordReply::Text(DEFAULT_REPLY));
    }

    #[test]
    fn test_substring_matching() {
        // "sometimes" contains "time"
        match respond("sometimes I rush") {
            KeywordReply::Text(text) => assert!(text.starts_with("Good timing")),
            KeywordReply::Reset => panic!("not a reset command"),
        }
    }
}
