pub mod features;
pub mod readability;
pub mod sentiment;
pub mod suggestions;

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

pub use features::{extract_text_features, TextFeatures};
pub use sentiment::{SentimentScorer, SentimentScores, VaderScorer};
pub use suggestions::{build_suggestions, RuleInput, SuggestionRule, RULES};

/// Readability formulas are unreliable on samples at or below this many words.
pub const MIN_WORDS_FOR_READABILITY: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementMetrics {
    pub word_count: usize,
    pub char_count: usize,
    pub avg_sentence_len: f64,
    pub flesch_reading_ease: Option<f64>,
    pub readability_grade: Option<String>,
    pub sentiment: SentimentScores,
    pub hashtags: Vec<String>,
    pub mentions: Vec<String>,
    pub links: Vec<String>,
    pub emoji_count: usize,
    pub suggestions: Vec<String>,
}

#[derive(Clone)]
pub struct Analyzer {
    sentiment: Arc<dyn SentimentScorer>,
}

impl Analyzer {
    pub fn new(sentiment: Arc<dyn SentimentScorer>) -> Self {
        Self { sentiment }
    }

    pub fn with_vader() -> Self {
        Self::new(Arc::new(VaderScorer::new()))
    }

    pub fn analyze(&self, text: &str) -> EngagementMetrics {
        let clean = text.trim();
        let features = extract_text_features(clean);

        let (flesch_reading_ease, readability_grade) =
            if features.word_count > MIN_WORDS_FOR_READABILITY {
                readability_scores(clean)
            } else {
                (None, None)
            };

        let sentiment = if clean.is_empty() {
            SentimentScores::default()
        } else {
            self.sentiment.polarity_scores(clean)
        };

        let suggestions = build_suggestions(&RuleInput {
            text: clean,
            features: &features,
            flesch_reading_ease,
            sentiment: &sentiment,
        });

        debug!(
            words = features.word_count,
            sentences = features.sentence_count,
            suggestions = suggestions.len(),
            "Text analyzed"
        );

        EngagementMetrics {
            word_count: features.word_count,
            char_count: features.char_count,
            avg_sentence_len: round2(features.avg_sentence_len),
            flesch_reading_ease,
            readability_grade,
            sentiment,
            hashtags: features.hashtags,
            mentions: features.mentions,
            links: features.links,
            emoji_count: features.emoji_count,
            suggestions,
        }
    }
}

fn readability_scores(clean: &str) -> (Option<f64>, Option<String>) {
    let scores = readability::flesch_reading_ease(clean)
        .and_then(|ease| readability::text_standard(clean).map(|grade| (ease, grade)));
    match scores {
        Ok((ease, grade)) => (Some(ease), Some(grade)),
        Err(err) => {
            debug!(%err, "Readability unavailable");
            (None, None)
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
