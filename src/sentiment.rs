//! Lexicon-based sentiment tagging.
//!
//! Scores text against static word lists and maps the resulting polarity
//! to one of three discrete labels. Never fails on any input.

use once_cell::sync::Lazy;
use std::collections::HashSet;
use std::fmt;

static POSITIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "good", "great", "excellent", "amazing", "wonderful", "fantastic", "superb",
        "outstanding", "brilliant", "love", "loved", "loving", "like", "liked",
        "best", "better", "happy", "glad", "joy", "joyful", "beautiful", "perfect",
        "awesome", "incredible", "delightful", "pleasant", "satisfying", "satisfied",
        "enjoy", "enjoyed", "impressive", "exceptional", "remarkable", "success",
        "successful", "win", "winner", "helpful", "reliable", "thanks", "thank",
        "nice", "cool", "fun", "favorite", "recommend", "recommended",
    ]
    .into_iter()
    .collect()
});

static NEGATIVE_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "bad", "terrible", "awful", "horrible", "poor", "worst", "worse", "hate",
        "hated", "hating", "dislike", "disliked", "disappointing", "disappointed",
        "failure", "failed", "fail", "failing", "sad", "unhappy", "angry", "annoyed",
        "annoying", "frustrated", "frustrating", "problem", "problems", "issue",
        "issues", "broken", "crash", "crashed", "error", "errors", "mistake",
        "mistakes", "wrong", "useless", "waste", "scam", "fraud", "fake",
        "unreliable", "slow", "difficult", "confusing", "boring", "ugly", "pathetic",
    ]
    .into_iter()
    .collect()
});

/// Discrete sentiment tag embedded in each stored chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Map a polarity score in [-1, 1] to a label by sign.
    pub fn from_polarity(polarity: f32) -> Self {
        if polarity > 0.0 {
            SentimentLabel::Positive
        } else if polarity < 0.0 {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }

    /// Storage form (lowercase).
    pub fn as_str(&self) -> &'static str {
        match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s {
            "positive" => SentimentLabel::Positive,
            "negative" => SentimentLabel::Negative,
            _ => SentimentLabel::Neutral,
        }
    }
}

impl fmt::Display for SentimentLabel {
    /// Display form shown to users ("Positive", "Negative", "Neutral").
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "Positive",
            SentimentLabel::Negative => "Negative",
            SentimentLabel::Neutral => "Neutral",
        };
        write!(f, "{s}")
    }
}

/// Polarity score in [-1, 1]: (pos - neg) / (pos + neg) over lexicon hits,
/// 0.0 when the text contains no sentiment words (including empty text).
pub fn polarity(text: &str) -> f32 {
    let lowercase = text.to_lowercase();
    let mut positive = 0usize;
    let mut negative = 0usize;

    for word in lowercase.split(|c: char| !c.is_alphabetic()).filter(|w| !w.is_empty()) {
        if POSITIVE_WORDS.contains(word) {
            positive += 1;
        } else if NEGATIVE_WORDS.contains(word) {
            negative += 1;
        }
    }

    let total = positive + negative;
    if total == 0 {
        return 0.0;
    }
    (positive as f32 - negative as f32) / total as f32
}

/// Classify text into a discrete sentiment label.
pub fn classify(text: &str) -> SentimentLabel {
    SentimentLabel::from_polarity(polarity(text))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_sign_maps_to_label() {
        assert_eq!(SentimentLabel::from_polarity(0.7), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_polarity(0.001), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_polarity(-0.3), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_polarity(-0.001), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_polarity(0.0), SentimentLabel::Neutral);
    }

    #[test]
    fn test_positive_text() {
        assert_eq!(classify("I love this! It's amazing and wonderful."), SentimentLabel::Positive);
        assert!(polarity("great great great") > 0.0);
    }

    #[test]
    fn test_negative_text() {
        assert_eq!(classify("This is terrible, I hate it. Worst experience."), SentimentLabel::Negative);
        assert!(polarity("awful broken useless") < 0.0);
    }

    #[test]
    fn test_neutral_text() {
        assert_eq!(classify("The parcel arrived on Tuesday."), SentimentLabel::Neutral);
        assert_eq!(polarity("The parcel arrived on Tuesday."), 0.0);
    }

    #[test]
    fn test_empty_text_is_neutral() {
        assert_eq!(classify(""), SentimentLabel::Neutral);
        assert_eq!(polarity(""), 0.0);
        assert_eq!(classify("   \n\t"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_mixed_text_balances_out() {
        // one positive hit, one negative hit
        assert_eq!(classify("good but broken"), SentimentLabel::Neutral);
    }

    #[test]
    fn test_label_round_trip() {
        for label in [SentimentLabel::Positive, SentimentLabel::Negative, SentimentLabel::Neutral] {
            assert_eq!(SentimentLabel::from_str(label.as_str()), label);
        }
    }

    #[test]
    fn test_display_is_capitalized() {
        assert_eq!(SentimentLabel::Positive.to_string(), "Positive");
        assert_eq!(SentimentLabel::Neutral.to_string(), "Neutral");
    }
}
