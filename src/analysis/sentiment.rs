use serde::{Deserialize, Serialize};
use vader_sentiment::SentimentIntensityAnalyzer;

/// Lexicon-based polarity breakdown. `compound` lies in `[-1, 1]`; the three
/// proportions sum to one for any non-empty input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentScores {
    pub compound: f64,
    pub pos: f64,
    pub neu: f64,
    pub neg: f64,
}

/// Read-only polarity scorer shared by every analysis.
pub trait SentimentScorer: Send + Sync {
    fn polarity_scores(&self, text: &str) -> SentimentScores;
}

/// VADER scorer. Building it loads the lexicon, so construct it once per
/// process and share it.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    fn raw_scores(&self, text: &str) -> SentimentScores {
        let scores = self.analyzer.polarity_scores(text);
        let score = |key: &str| scores.get(key).copied().unwrap_or(0.0);
        SentimentScores {
            compound: score("compound"),
            pos: score("pos"),
            neu: score("neu"),
            neg: score("neg"),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for VaderScorer {
    fn polarity_scores(&self, text: &str) -> SentimentScores {
        let mut scores = self.raw_scores(text);
        if scores.compound != 0.0 && text.contains(['!', '?']) {
            // vader_sentiment subtracts the `!`/`?` emphasis even when the
            // word valences sum to zero. Zero valence means zero compound.
            let unpunctuated: String = text.chars().filter(|c| !matches!(c, '!' | '?')).collect();
            if self.raw_scores(&unpunctuated).compound == 0.0 {
                scores.compound = 0.0;
            }
        }
        scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{Analyzer, RULES};

    #[test]
    fn vader_polarity_direction() {
        let scorer = VaderScorer::new();
        let happy = scorer.polarity_scores("I love this, it is wonderful and great!");
        let angry = scorer.polarity_scores("This is terrible, awful and I hate it.");
        assert!(happy.compound > 0.3);
        assert!(angry.compound < -0.3);
        assert!((happy.pos + happy.neu + happy.neg - 1.0).abs() < 0.01);
    }

    #[test]
    fn punctuation_alone_is_not_negative() {
        let scorer = VaderScorer::new();
        let neutral = scorer.polarity_scores("Is the meeting at noon??? Room 4!!!!");
        assert_eq!(neutral.compound, 0.0);
        assert_eq!(scorer.polarity_scores("!!!").compound, 0.0);

        let metrics = Analyzer::with_vader().analyze("Is the meeting at noon??? Room 4!!!!");
        assert_eq!(metrics.sentiment.compound, 0.0);
        assert!(!metrics
            .suggestions
            .iter()
            .any(|message| message == RULES[7].message));
    }

    #[test]
    fn emphasis_still_strengthens_real_sentiment() {
        let scorer = VaderScorer::new();
        let plain = scorer.polarity_scores("This is great");
        let loud = scorer.polarity_scores("This is great!!!");
        assert!(plain.compound > 0.0);
        assert!(loud.compound > plain.compound);

        let angry = scorer.polarity_scores("This is terrible!!!");
        assert!(angry.compound < -0.3);
    }

    #[test]
    fn default_is_all_zero() {
        let scores = SentimentScores::default();
        assert_eq!(scores.compound, 0.0);
        assert_eq!(scores.pos + scores.neu + scores.neg, 0.0);
    }
}
