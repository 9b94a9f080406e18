//! Sentiment scoring capability.
//!
//! The toxicity stage of the classifier consults an external sentiment
//! scorer. It is abstracted behind a narrow trait so the implementation can
//! be swapped or stubbed without touching escalation logic; the bundled
//! default is a small word-polarity lexicon.

use thiserror::Error;

/// Scorer failure. The classifier degrades to a non-toxic verdict rather
/// than propagating this.
#[derive(Debug, Error)]
pub enum ScorerError {
    #[error("sentiment scorer unavailable: {0}")]
    Unavailable(String),
}

/// Black-box polarity scorer.
pub trait SentimentScorer: Send + Sync {
    /// Score `text`, returning a polarity in `[-1.0, 1.0]`
    /// (negative = hostile, positive = friendly).
    fn score(&self, text: &str) -> Result<f32, ScorerError>;
}

const POSITIVE_WORDS: &[&str] = &[
    "love", "great", "good", "awesome", "nice", "happy", "wonderful", "excellent", "amazing",
    "thanks", "thank", "cool", "best", "fantastic", "glad", "welcome",
];

const NEGATIVE_WORDS: &[&str] = &[
    "hate", "stupid", "idiot", "dumb", "awful", "terrible", "horrible", "worst", "disgusting",
    "ugly", "trash", "garbage", "pathetic", "loser", "annoying", "moron",
];

/// Word-polarity lexicon scorer.
///
/// Polarity is the balance of positive and negative tokens; text with no
/// polar words scores 0.0.
#[derive(Debug, Default, Clone)]
pub struct LexiconSentiment;

impl SentimentScorer for LexiconSentiment {
    fn score(&self, text: &str) -> Result<f32, ScorerError> {
        let mut positive = 0u32;
        let mut negative = 0u32;

        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            if POSITIVE_WORDS.contains(&token.as_str()) {
                positive += 1;
            } else if NEGATIVE_WORDS.contains(&token.as_str()) {
                negative += 1;
            }
        }

        let total = positive + negative;
        if total == 0 {
            return Ok(0.0);
        }

        let polarity = (positive as f32 - negative as f32) / total as f32;
        Ok(polarity.clamp(-1.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_text_scores_zero() {
        let scorer = LexiconSentiment;
        assert_eq!(scorer.score("the weather is cloudy today").unwrap(), 0.0);
    }

    #[test]
    fn hostile_text_scores_negative() {
        let scorer = LexiconSentiment;
        let polarity = scorer.score("i hate you, you stupid dumb idiot").unwrap();
        assert!(polarity < -0.5, "expected strongly negative, got {polarity}");
    }

    #[test]
    fn friendly_text_scores_positive() {
        let scorer = LexiconSentiment;
        let polarity = scorer.score("thanks, this is a great and wonderful group").unwrap();
        assert!(polarity > 0.5, "expected strongly positive, got {polarity}");
    }

    #[test]
    fn mixed_text_balances_out() {
        let scorer = LexiconSentiment;
        let polarity = scorer.score("good idea but terrible timing").unwrap();
        assert_eq!(polarity, 0.0);
    }
}
