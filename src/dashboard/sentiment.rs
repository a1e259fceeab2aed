//! Review sentiment on top of the VADER classifier from `vader_sentiment`.
//!
//! The classifier's compound polarity in [-1, 1] is mapped to a label and a
//! confidence the dashboard can show next to each review.

use std::fmt;

use serde::Serialize;
use vader_sentiment::SentimentIntensityAnalyzer;

/// Characters of review text considered; the rest is ignored.
pub const MAX_CHARS: usize = 512;

const POSITIVE_THRESHOLD: f64 = 0.05;
const NEGATIVE_THRESHOLD: f64 = -0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Positive,
    Neutral,
    Negative,
}

impl Label {
    pub const ALL: [Label; 3] = [Label::Positive, Label::Neutral, Label::Negative];

    pub fn as_str(self) -> &'static str {
        match self {
            Label::Positive => "POSITIVE",
            Label::Neutral => "NEUTRAL",
            Label::Negative => "NEGATIVE",
        }
    }

    fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            Label::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            Label::Negative
        } else {
            Label::Neutral
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentScore {
    pub label: Label,
    /// Compound polarity in [-1, 1].
    pub compound: f64,
    /// How far the score sits from the label boundary, in [0.5, 1].
    pub confidence: f64,
}

impl SentimentScore {
    fn from_compound(compound: f64) -> Self {
        let compound = if compound.is_finite() {
            compound.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let label = Label::from_compound(compound);
        let confidence = match label {
            Label::Neutral => 1.0 - compound.abs() * 10.0,
            _ => 0.5 + compound.abs() / 2.0,
        };
        Self {
            label,
            compound,
            confidence: confidence.clamp(0.5, 1.0),
        }
    }
}

/// Shared, read-only classifier. The lexicon lives in the crate's statics,
/// so one instance can score from any thread.
pub struct SentimentAnalyzer {
    vader: SentimentIntensityAnalyzer<'static>,
}

impl Default for SentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            vader: SentimentIntensityAnalyzer::new(),
        }
    }

    pub fn score(&self, text: &str) -> SentimentScore {
        let window: String = text.chars().take(MAX_CHARS).collect();
        if window.trim().is_empty() {
            return SentimentScore::from_compound(0.0);
        }
        let scores = self.vader.polarity_scores(&window);
        let compound = scores.get("compound").copied().unwrap_or(0.0);
        SentimentScore::from_compound(compound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(text: &str) -> Label {
        SentimentAnalyzer::new().score(text).label
    }

    #[test]
    fn clear_polarity() {
        assert_eq!(label("Great product, I love it"), Label::Positive);
        assert_eq!(label("Terrible, awful product. I hate it."), Label::Negative);
        assert_eq!(label("The box arrived on Tuesday."), Label::Neutral);
        assert_eq!(label(""), Label::Neutral);
        assert_eq!(label("   "), Label::Neutral);
    }

    #[test]
    fn negation_flips() {
        assert_eq!(label("This is good"), Label::Positive);
        assert_eq!(label("This is not good"), Label::Negative);
    }

    #[test]
    fn intensifiers_raise_magnitude() {
        let a = SentimentAnalyzer::new();
        let plain = a.score("The taste is good").compound;
        let boosted = a.score("The taste is extremely good").compound;
        assert!(boosted > plain);
    }

    #[test]
    fn but_weights_the_second_clause() {
        assert_eq!(label("The flavor is nice but the bottle is bad and I hate it"), Label::Negative);
        assert_eq!(label("Shipping was bad but the potion is great and I love it"), Label::Positive);
    }

    #[test]
    fn exclamation_adds_emphasis() {
        let a = SentimentAnalyzer::new();
        assert!(a.score("The taste is good!!").compound > a.score("The taste is good").compound);
    }

    #[test]
    fn deterministic_and_bounded() {
        let a = SentimentAnalyzer::new();
        let text = "Absolutely the best energy potion I have ever had, would recommend!";
        let first = a.score(text);
        for _ in 0..10 {
            assert_eq!(a.score(text), first);
        }
        assert_eq!(first.label, Label::Positive);
        assert!((-1.0..=1.0).contains(&first.compound));
        assert!((0.5..=1.0).contains(&first.confidence));
    }

    #[test]
    fn only_the_first_window_counts() {
        let a = SentimentAnalyzer::new();
        let padding = "the ".repeat(MAX_CHARS);
        let text = format!("{padding} terrible awful worst");
        assert_eq!(a.score(&text).label, Label::Neutral);
    }

    #[test]
    fn label_and_confidence_mapping() {
        let s = SentimentScore::from_compound(0.8);
        assert_eq!(s.label, Label::Positive);
        assert!((s.confidence - 0.9).abs() < 1e-9);

        let s = SentimentScore::from_compound(-0.05);
        assert_eq!(s.label, Label::Negative);
        assert!((s.confidence - 0.525).abs() < 1e-9);

        let s = SentimentScore::from_compound(0.0);
        assert_eq!(s.label, Label::Neutral);
        assert_eq!(s.confidence, 1.0);

        let s = SentimentScore::from_compound(0.04);
        assert_eq!(s.label, Label::Neutral);
        assert!((s.confidence - 0.6).abs() < 1e-9);

        let s = SentimentScore::from_compound(f64::NAN);
        assert_eq!(s.label, Label::Neutral);
    }
}
