// Keyword responder and advice tests
// Author: kelexine (https://github.com/kelexine)

use picksy::responder::advice::{self, Analysis, Sentiment, Topic};
use picksy::responder::keywords::{self, KeywordReply, DEFAULT_REPLY, RESET_ACKNOWLEDGEMENT};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_improve_question_gets_improve_template() {
    assert_eq!(
        keywords::reply_text("How can I improve my rhythm?"),
        "To improve your rhythm, try counting out loud while you practice. Start slowly and gradually increase your speed."
    );
}

#[test]
fn test_rhythm_question() {
    assert_eq!(
        keywords::respond("what is rhythm"),
        KeywordReply::Text(
            "Rhythm is the pattern of sounds and silences in music. It's like the heartbeat that keeps everything together!"
        )
    );
}

#[test]
fn test_matching_is_case_insensitive() {
    assert_eq!(
        keywords::reply_text("I keep making MISTAKES"),
        keywords::reply_text("mistake")
    );
}

#[test]
fn test_unmatched_input_gets_default() {
    assert_eq!(keywords::reply_text("hello there"), DEFAULT_REPLY);
    assert_eq!(keywords::reply_text(""), DEFAULT_REPLY);
}

#[test]
fn test_reset_commands() {
    for input in ["clear", "  Clear Conversation ", "START OVER"] {
        assert!(keywords::is_reset_command(input), "{input}");
        assert_eq!(keywords::respond(input), KeywordReply::Reset);
        assert_eq!(keywords::reply_text(input), RESET_ACKNOWLEDGEMENT);
    }
    // Only whole-message commands reset
    assert!(!keywords::is_reset_command("please clear my head"));
}

#[test]
fn test_advice_follows_detected_topic() {
    let topics = advice::detect_topics("my tempo and speed keep drifting");
    assert_eq!(topics.first(), Some(&Topic::Tempo));

    let analysis = Analysis {
        topics,
        sentiment: Sentiment::Negative,
        confidence: 0.9,
    };
    let mut rng = StdRng::seed_from_u64(7);
    let reply = advice::advise(&analysis, &mut rng);
    assert!(!reply.is_empty());
}

#[test]
fn test_advice_without_topics_uses_defaults() {
    let analysis = Analysis {
        topics: Vec::new(),
        sentiment: Sentiment::Neutral,
        confidence: 0.5,
    };
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..10 {
        assert!(advice::DEFAULT_ADVICE.contains(&advice::advise(&analysis, &mut rng).as_str()));
    }
}
