use super::features::TextFeatures;
use super::sentiment::SentimentScores;

/// Everything a rule may look at. Rules never see each other's output.
pub struct RuleInput<'a> {
    pub text: &'a str,
    pub features: &'a TextFeatures,
    pub flesch_reading_ease: Option<f64>,
    pub sentiment: &'a SentimentScores,
}

pub struct SuggestionRule {
    pub name: &'static str,
    pub applies: fn(&RuleInput<'_>) -> bool,
    pub message: &'static str,
}

pub const CALL_TO_ACTION_WORDS: [&str; 3] = ["call", "check", "learn"];

/// Evaluated in order; output order follows this table.
pub const RULES: [SuggestionRule; 8] = [
    SuggestionRule {
        name: "too_short",
        applies: too_short,
        message: "Add more context: posts under ~10 words usually underperform.",
    },
    SuggestionRule {
        name: "long_sentences",
        applies: long_sentences,
        message: "Shorten sentences for scannability (aim for < 20 words).",
    },
    SuggestionRule {
        name: "hard_to_read",
        applies: hard_to_read,
        message: "Simplify wording to improve readability (Flesch < 60).",
    },
    SuggestionRule {
        name: "no_emoji",
        applies: no_emoji,
        message: "Consider 1-2 relevant emojis to add personality (avoid overuse).",
    },
    SuggestionRule {
        name: "no_hashtags",
        applies: no_hashtags,
        message: "Add 2-5 targeted hashtags to improve discovery.",
    },
    SuggestionRule {
        name: "no_call_to_action",
        applies: no_call_to_action,
        message: "Include a clear call-to-action (e.g., 'Learn more', 'Check the link').",
    },
    SuggestionRule {
        name: "no_link",
        applies: no_link,
        message: "Add a relevant link or mention where to find more info.",
    },
    SuggestionRule {
        name: "negative_tone",
        applies: negative_tone,
        message: "Tone seems negative; reframe to be more constructive or positive.",
    },
];

pub fn build_suggestions(input: &RuleInput<'_>) -> Vec<String> {
    RULES
        .iter()
        .filter(|rule| (rule.applies)(input))
        .map(|rule| rule.message.to_string())
        .collect()
}

fn too_short(input: &RuleInput<'_>) -> bool {
    input.features.word_count < 10
}

fn long_sentences(input: &RuleInput<'_>) -> bool {
    input.features.avg_sentence_len > 25.0
}

fn hard_to_read(input: &RuleInput<'_>) -> bool {
    input.flesch_reading_ease.map_or(false, |score| score < 60.0)
}

fn no_emoji(input: &RuleInput<'_>) -> bool {
    input.features.emoji_count == 0
}

fn no_hashtags(input: &RuleInput<'_>) -> bool {
    input.features.hashtags.is_empty()
}

fn no_call_to_action(input: &RuleInput<'_>) -> bool {
    let lowercase = input.text.to_lowercase();
    !CALL_TO_ACTION_WORDS
        .iter()
        .any(|word| lowercase.contains(word))
}

fn no_link(input: &RuleInput<'_>) -> bool {
    input.features.links.is_empty()
}

fn negative_tone(input: &RuleInput<'_>) -> bool {
    input.sentiment.compound < -0.3
}
