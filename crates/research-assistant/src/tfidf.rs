//! TF-IDF keyword extraction.
//!
//! Used to derive topics for documents whose source supplies no tags.

use std::collections::{HashMap, HashSet};

use research_graph::is_stop_word;

/// TF-IDF calculator for keyword extraction.
///
/// Computes term importance based on frequency within documents and rarity
/// across the document corpus.
pub struct TfIdf {
    /// Term -> document count (how many documents contain this term)
    doc_frequencies: HashMap<String, usize>,
    /// Term -> total frequency across all documents
    term_frequencies: HashMap<String, usize>,
    total_terms: usize,
    doc_count: usize,
}

impl TfIdf {
    /// Create a new TF-IDF calculator from a corpus of documents.
    pub fn new(documents: &[&str]) -> Self {
        let mut doc_frequencies: HashMap<String, usize> = HashMap::new();
        let mut term_frequencies: HashMap<String, usize> = HashMap::new();
        let mut total_terms = 0;

        for doc in documents {
            let terms = tokenize(doc);
            let unique_terms: HashSet<&String> = terms.iter().collect();

            for term in unique_terms {
                *doc_frequencies.entry(term.clone()).or_insert(0) += 1;
            }

            total_terms += terms.len();
            for term in terms {
                *term_frequencies.entry(term).or_insert(0) += 1;
            }
        }

        Self {
            doc_frequencies,
            term_frequencies,
            total_terms,
            doc_count: documents.len(),
        }
    }

    /// Calculate TF-IDF score for a term.
    ///
    /// - TF = count of term / total terms
    /// - IDF = ln((N + 1) / (df + 1)) + 1
    pub fn score(&self, term: &str) -> f32 {
        self.term_frequency(term) * self.inverse_document_frequency(term)
    }

    fn term_frequency(&self, term: &str) -> f32 {
        if self.total_terms == 0 {
            return 0.0;
        }
        let count = self.term_frequencies.get(term).copied().unwrap_or(0) as f32;
        count / self.total_terms as f32
    }

    fn inverse_document_frequency(&self, term: &str) -> f32 {
        let df = self.doc_frequencies.get(term).copied().unwrap_or(0) as f32;
        if df == 0.0 {
            return 0.0;
        }
        let n = self.doc_count as f32;
        ((n + 1.0) / (df + 1.0)).ln() + 1.0
    }

    /// Get top N terms by TF-IDF score.
    ///
    /// Sorted by score descending; equal scores are ordered alphabetically so
    /// the result does not depend on hash order.
    pub fn top_terms(&self, n: usize) -> Vec<(String, f32)> {
        let mut scores: Vec<(String, f32)> = self
            .term_frequencies
            .keys()
            .map(|term| (term.clone(), self.score(term)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        scores.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });

        scores.truncate(n);
        scores
    }
}

/// Extract the `n` highest-scoring keywords from a set of text fragments.
pub fn extract_keywords(fragments: &[&str], n: usize) -> Vec<String> {
    TfIdf::new(fragments)
        .top_terms(n)
        .into_iter()
        .map(|(term, _)| term)
        .collect()
}

/// Tokenize text into lowercase words.
///
/// Filters out stop words, single characters and pure numbers.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.len() > 1)
        .filter(|s| !is_stop_word(s))
        .filter(|s| !s.chars().all(|c| c.is_numeric()))
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Hello World"), vec!["hello", "world"]);
    }

    #[test]
    fn test_tokenize_filters() {
        assert_eq!(tokenize("the quick fox"), vec!["quick", "fox"]);
        assert_eq!(tokenize("a b c rust"), vec!["rust"]);
        assert_eq!(tokenize("rust 123 2024 programming"), vec!["rust", "programming"]);
        assert_eq!(tokenize("rust, python, and java!"), vec!["rust", "python", "java"]);
    }

    #[test]
    fn test_score_nonexistent_term() {
        let tfidf = TfIdf::new(&["rust programming"]);
        assert!(tfidf.score("nonexistent").abs() < f32::EPSILON);
    }

    #[test]
    fn test_common_term_dominates() {
        let tfidf = TfIdf::new(&["rust programming", "python programming", "java programming"]);
        // programming: TF=0.5, IDF=1.0; rust: TF=1/6, IDF=ln(2)+1
        assert!(tfidf.score("programming") > tfidf.score("rust"));
        assert!(tfidf.score("rust") > 0.0);
    }

    #[test]
    fn test_top_terms_sorted() {
        let tfidf = TfIdf::new(&["rust rust rust systems", "python scripting", "rust memory safety"]);
        let top = tfidf.top_terms(3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].0, "rust");
        for pair in top.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }
    }

    #[test]
    fn test_ties_are_alphabetical() {
        let tfidf = TfIdf::new(&["zeta alpha mu"]);
        let terms: Vec<String> = tfidf.top_terms(3).into_iter().map(|(t, _)| t).collect();
        assert_eq!(terms, vec!["alpha", "mu", "zeta"]);
    }

    #[test]
    fn test_extract_keywords() {
        let keywords = extract_keywords(
            &[
                "Attention Is All You Need",
                "The dominant sequence transduction models use attention. Attention everywhere.",
            ],
            2,
        );
        assert_eq!(keywords[0], "attention");
        assert_eq!(keywords.len(), 2);
    }

    #[test]
    fn test_empty_corpus() {
        let tfidf = TfIdf::new(&[]);
        assert!(tfidf.top_terms(5).is_empty());
        assert!(extract_keywords(&[], 5).is_empty());
    }
}
