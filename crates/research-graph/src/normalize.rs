//! Topic label normalization.
//!
//! Topic identity is the normalized label. Normalization is injected into
//! the accumulator so callers can choose how aggressively labels collapse.

use std::collections::HashSet;

use research_types::GraphSettings;

use crate::types::Topic;

/// Pure function from a raw label to a topic identity.
///
/// Returns `None` when nothing meaningful is left of the label.
pub trait TopicNormalizer: Send + Sync {
    /// Normalize a raw label.
    fn normalize(&self, label: &str) -> Option<Topic>;
}

impl<F> TopicNormalizer for F
where
    F: Fn(&str) -> Option<Topic> + Send + Sync,
{
    fn normalize(&self, label: &str) -> Option<Topic> {
        self(label)
    }
}

/// Passes labels through unchanged. Only the empty label is rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityNormalizer;

impl TopicNormalizer for IdentityNormalizer {
    fn normalize(&self, label: &str) -> Option<Topic> {
        if label.is_empty() {
            None
        } else {
            Some(Topic::from_normalized(label))
        }
    }
}

/// Case-folds, splits on non-alphanumeric characters, drops stop words, and
/// joins the remaining words with single spaces.
///
/// `"The Transformer-Architecture"` and `"transformer architecture"` both
/// normalize to `"transformer architecture"`.
#[derive(Debug, Clone, Default)]
pub struct StopWordNormalizer {
    extra_stop_words: HashSet<String>,
}

impl StopWordNormalizer {
    /// Create a normalizer using the built-in stop-word list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a normalizer with additional stop words.
    pub fn with_extra_stop_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extra_stop_words: words
                .into_iter()
                .map(|w| w.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Create a normalizer from graph settings.
    pub fn from_settings(settings: &GraphSettings) -> Self {
        Self::with_extra_stop_words(&settings.extra_stop_words)
    }

    fn is_dropped(&self, word: &str) -> bool {
        is_stop_word(word) || self.extra_stop_words.contains(word)
    }
}

impl TopicNormalizer for StopWordNormalizer {
    fn normalize(&self, label: &str) -> Option<Topic> {
        let folded = label.to_lowercase();
        let words: Vec<&str> = folded
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .filter(|w| !self.is_dropped(w))
            .collect();

        if words.is_empty() {
            None
        } else {
            Some(Topic::from_normalized(words.join(" ")))
        }
    }
}

/// Check if a word is a stop word.
///
/// Expects an already lowercased word.
pub fn is_stop_word(word: &str) -> bool {
    const STOP_WORDS: &[&str] = &[
        "a", "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
        "it", "its", "of", "on", "or", "that", "the", "to", "was", "were", "will", "with", "this",
        "they", "but", "have", "had", "what", "when", "where", "who", "which", "why", "how", "all",
        "each", "every", "both", "few", "more", "most", "other", "some", "such", "no", "nor",
        "not", "only", "own", "same", "so", "than", "too", "very", "can", "just", "should", "now",
        "also", "been", "being", "do", "does", "did", "doing", "would", "could", "might", "must",
        "shall", "about", "above", "after", "again", "against", "am", "any", "before", "below",
        "between", "into", "through", "during", "out", "over", "under", "up", "down", "then",
        "once", "here", "there", "if", "else", "while", "because", "until", "we", "you", "your",
        "our", "their", "him", "her", "them", "me", "my", "myself", "itself", "those", "these",
        "his", "using", "via", "towards",
    ];

    STOP_WORDS.contains(&word)
}
