//! Topic-based rhythm advice.
//!
//! Used when a sentiment classifier is available but no generator: the input
//! is scanned for practice topics, the classifier's sentiment selects the
//! tone, and a template is drawn at random from the matching bucket.
//!
//! Author: kelexine (<https://github.com/kelexine>)

use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Map a classifier label such as `POSITIVE` / `NEGATIVE`.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("positive") {
            Sentiment::Positive
        } else {
            Sentiment::Negative
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Tempo,
    Counting,
    Coordination,
    Reading,
    Listening,
    Practice,
}

impl Topic {
    /// All topics, in tie-break order
    pub const ALL: [Topic; 6] = [
        Topic::Tempo,
        Topic::Counting,
        Topic::Coordination,
        Topic::Reading,
        Topic::Listening,
        Topic::Practice,
    ];

    fn keywords(self) -> &'static [&'static str] {
        match self {
            Topic::Tempo => &["tempo", "speed", "slow", "fast", "bpm", "metronome"],
            Topic::Counting => &["count", "counting", "beats", "measure", "bar"],
            Topic::Coordination => &["coordination", "hands", "together", "independence"],
            Topic::Reading => &["read", "reading", "sheet", "notation", "notes"],
            Topic::Listening => &["listen", "hearing", "ear", "record", "playback"],
            Topic::Practice => &["practice", "rehearsal", "routine", "exercise", "drill"],
        }
    }

    fn templates(self, sentiment: Sentiment) -> &'static [&'static str] {
        match (self, sentiment) {
            (Topic::Tempo, Sentiment::Positive) => &[
                "Great job working on your tempo! Keep using a metronome to maintain consistency.",
                "You're doing well with controlling your speed. Try gradually increasing the tempo as you get more comfortable.",
                "Nice work with timing! Try practicing at different tempos to build flexibility.",
            ],
            (Topic::Tempo, Sentiment::Negative) => &[
                "To improve your tempo, start with a slower metronome setting and gradually increase as you build confidence.",
                "For better timing, try subdividing beats in your head (1-and-2-and) while playing at a comfortable tempo.",
                "When struggling with tempo, focus on consistency first rather than speed. Slow practice builds a solid foundation.",
            ],
            (Topic::Tempo, Sentiment::Neutral) => &[
                "Working on tempo is essential for rhythm mastery. Start slow and gradually increase speed as you practice.",
                "Using a metronome regularly will help you develop a reliable internal sense of tempo.",
                "Try practicing at 70% of your target speed until you can play perfectly, then gradually increase.",
            ],
            (Topic::Counting, Sentiment::Positive) => &[
                "Your counting skills are developing nicely! Continue counting out loud to reinforce the rhythm.",
                "Great work with counting beats! Try adding subdivisions to make complex rhythms easier.",
                "You're counting well! Now try counting out loud while tapping or clapping to strengthen this skill.",
            ],
            (Topic::Counting, Sentiment::Negative) => &[
                "To improve your counting, practice speaking the counts out loud while tapping the rhythm.",
                "When you find counting difficult, try simplifying the rhythm first, then add complexity gradually.",
                "For better counting, start by just clapping and counting before adding your instrument.",
            ],
            (Topic::Counting, Sentiment::Neutral) => &[
                "Counting aloud while practicing helps internalize rhythms and improves overall musical timing.",
                "A good approach is to count '1-and-2-and' for eighth notes or '1-e-and-a-2-e-and-a' for sixteenth notes.",
                "Regular counting practice helps you understand how different notes fit into the measure.",
            ],
            (Topic::Coordination, Sentiment::Positive) => &[
                "Your coordination is coming along nicely! Continue separating hand patterns before putting them together.",
                "Good work on coordination exercises! Try adding a simple foot tap to further challenge yourself.",
                "You're developing good coordination! Practice slowly and deliberately for the best results.",
            ],
            (Topic::Coordination, Sentiment::Negative) => &[
                "To improve coordination, break down the movements into smaller parts and practice them separately.",
                "When coordination is challenging, slow down significantly and focus on precision rather than speed.",
                "Try practicing each hand/part separately, then gradually combine them at a slower tempo.",
            ],
            (Topic::Coordination, Sentiment::Neutral) => &[
                "Developing good coordination requires patient practice - separate difficult parts and then combine them.",
                "Practicing coordination slowly and deliberately creates stronger neural pathways.",
                "Try tapping different rhythms with each hand to develop independence and coordination.",
            ],
            (Topic::Reading, Sentiment::Positive) => &[
                "You're making great progress with rhythm reading! Continue practicing with different notation examples.",
                "Nice work reading rhythms! Try sight-reading a new short example every day to build this skill.",
                "Your rhythm reading is improving! Practice identifying patterns rather than individual notes.",
            ],
            (Topic::Reading, Sentiment::Negative) => &[
                "To improve rhythm reading, start with simpler patterns and gradually work toward more complex ones.",
                "When reading rhythms is difficult, try speaking or clapping the rhythm before playing it.",
                "Break down complex rhythmic notation into smaller segments and practice them separately.",
            ],
            (Topic::Reading, Sentiment::Neutral) => &[
                "Regular practice with rhythm reading exercises helps develop this essential skill.",
                "Try to identify common rhythmic patterns rather than reading every individual note.",
                "Spend some time each day sight-reading new rhythmic examples to build your skills.",
            ],
            (Topic::Listening, Sentiment::Positive) => &[
                "Your listening skills are developing well! Continue recording yourself and comparing to original examples.",
                "Great job using your ears! The ability to hear and adjust your rhythm is invaluable.",
                "You have good rhythmic awareness! Keep listening carefully to stay precisely on beat.",
            ],
            (Topic::Listening, Sentiment::Negative) => &[
                "To develop better listening skills, record yourself practicing and compare it to a reference recording.",
                "Try playing along with recordings to help train your ear to recognize when you're off-rhythm.",
                "Active listening exercises will help you identify rhythmic deviations more easily.",
            ],
            (Topic::Listening, Sentiment::Neutral) => &[
                "Developing your ear for rhythm is just as important as learning to read it on paper.",
                "Recording your practice sessions helps you hear your rhythmic accuracy objectively.",
                "Listen to musicians with excellent timing and try to internalize how they feel the beat.",
            ],
            (Topic::Practice, Sentiment::Positive) => &[
                "Your practice routine is working well! Consistent, focused practice leads to steady improvement.",
                "Great job with your practice strategy! Regular, deliberate practice builds solid rhythm skills.",
                "You're taking a good approach to practice! Consistency will lead to lasting improvement.",
            ],
            (Topic::Practice, Sentiment::Negative) => &[
                "Consider restructuring your practice routine to include short, focused sessions on specific rhythm challenges.",
                "When practice feels unproductive, try breaking rhythms into smaller chunks and master each part.",
                "Setting clear, achievable goals for each practice session will help you make steady progress.",
            ],
            (Topic::Practice, Sentiment::Neutral) => &[
                "Effective rhythm practice combines focused exercises with real musical application.",
                "Short, consistent practice sessions often yield better results than occasional long ones.",
                "Using a practice journal can help you track your progress and identify areas for improvement.",
            ],
        }
    }
}

pub const DEFAULT_ADVICE: &[&str] = &[
    "To improve your rhythm, try practicing with a metronome and gradually increase the speed as you get comfortable.",
    "Developing good rhythm takes time and consistent practice. Try counting out loud while you play.",
    "One effective way to improve rhythm is to break difficult patterns into smaller parts and master each separately.",
    "Recording yourself and listening back can help identify rhythmic inconsistencies in your playing.",
    "Regular practice with a metronome is the foundation of strong rhythm skills.",
];

/// Chance of appending advice for the secondary topic
const SECONDARY_ADVICE_CHANCE: f64 = 0.25;

/// Result of scanning an input for topics and tone
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Up to two topics, strongest first
    pub topics: Vec<Topic>,
    pub sentiment: Sentiment,
    pub confidence: f32,
}

/// Score every topic by keyword hits and keep the best two.
pub fn detect_topics(input: &str) -> Vec<Topic> {
    let lower = input.to_lowercase();
    let mut scored: Vec<(Topic, usize)> = Topic::ALL
        .iter()
        .map(|&topic| {
            let hits = topic.keywords().iter().filter(|k| lower.contains(*k)).count();
            (topic, hits)
        })
        .filter(|(_, hits)| *hits > 0)
        .collect();

    // Stable sort keeps declaration order among equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().take(2).map(|(topic, _)| topic).collect()
}

/// Pick a reply for an analysis.
pub fn advise<R: Rng + ?Sized>(analysis: &Analysis, rng: &mut R) -> String {
    let Some(&primary) = analysis.topics.first() else {
        return pick(DEFAULT_ADVICE, rng).to_string();
    };

    let mut reply = pick(primary.templates(analysis.sentiment), rng).to_string();

    if let Some(&secondary) = analysis.topics.get(1) {
        if rng.gen_bool(SECONDARY_ADVICE_CHANCE) {
            reply.push(' ');
            reply.push_str(pick(secondary.templates(Sentiment::Neutral), rng));
        }
    }

    reply
}

fn pick<R: Rng + ?Sized>(options: &'static [&'static str], rng: &mut R) -> &'static str {
    options.choose(rng).copied().unwrap_or(DEFAULT_ADVICE[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_detect_topics_orders_by_hits() {
        // counting: count, beats, measure; tempo: metronome
        let topics = detect_topics("How do I count beats in a measure with a metronome?");
        assert_eq!(topics, vec![Topic::Counting, Topic::Tempo]);
    }

    #[test]
    fn test_detect_topics_ties_keep_declaration_order() {
        let topics = detect_topics("listen to my drill");
        assert_eq!(topics, vec![Topic::Listening, Topic::Practice]);
    }

    #[test]
    fn test_no_topics_uses_default_advice() {
        let mut rng = StdRng::seed_from_u64(7);
        let analysis = Analysis {
            topics: detect_topics("hello"),
            sentiment: Sentiment::Neutral,
            confidence: 0.5,
        };
        let reply = advise(&analysis, &mut rng);
        assert!(DEFAULT_ADVICE.contains(&reply.as_str()));
    }

    #[test]
    fn test_primary_topic_and_sentiment_select_bucket() {
        let mut rng = StdRng::seed_from_u64(42);
        let analysis = Analysis {
            topics: vec![Topic::Tempo],
            sentiment: Sentiment::Negative,
            confidence: 0.9,
        };
        for _ in 0..10 {
            let reply = advise(&analysis, &mut rng);
            assert!(Topic::Tempo
                .templates(Sentiment::Negative)
                .contains(&reply.as_str()));
        }
    }

    #[test]
    fn test_secondary_advice_is_appended_neutral() {
        let mut rng = StdRng::seed_from_u64(1);
        let analysis = Analysis {
            topics: vec![Topic::Reading, Topic::Listening],
            sentiment: Sentiment::Positive,
            confidence: 0.8,
        };
        for _ in 0..50 {
            let reply = advise(&analysis, &mut rng);
            let primary = Topic::Reading
                .templates(Sentiment::Positive)
                .iter()
                .find(|t| reply.starts_with(*t))
                .expect("reply starts with a primary template");
            let rest = reply[primary.len()..].trim_start();
            assert!(
                rest.is_empty()
                    || Topic::Listening.templates(Sentiment::Neutral).contains(&rest)
            );
        }
    }

    #[test]
    fn test_sentiment_from_label() {
        assert_eq!(Sentiment::from_label("POSITIVE"), Sentiment::Positive);
        assert_eq!(Sentiment::from_label("NEGATIVE"), Sentiment::Negative);
        assert_eq!(Sentiment::from_label("LABEL_0"), Sentiment::Negative);
    }
}
