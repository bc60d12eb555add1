//! Summaries and topics built from document fields alone.

use research_types::{Document, DocumentSource};

use crate::tfidf::extract_keywords;

const ABSTRACT_PREVIEW_CHARS: usize = 200;

/// Summary assembled from a document's own fields.
///
/// Papers list title, authors, year and the start of the abstract. Projects
/// list repository name, description and topics.
pub fn basic_summary(document: &Document) -> String {
    match document.source {
        DocumentSource::Paper => {
            let year = document
                .year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let preview: String = document.body.chars().take(ABSTRACT_PREVIEW_CHARS).collect();
            format!(
                "Title: {}\nAuthors: {}\nYear: {}\nAbstract: {}...",
                document.title,
                document.authors.join(", "),
                year,
                preview
            )
        }
        DocumentSource::Repository => format!(
            "Repository: {}\nDescription: {}\nTopics: {}",
            document.title,
            document.body,
            document.tags.join(", ")
        ),
    }
}

/// Raw topic labels for a document.
///
/// Source-supplied tags win; otherwise the top `n` TF-IDF keywords of the
/// title and body.
pub fn document_topics(document: &Document, n: usize) -> Vec<String> {
    if !document.tags.is_empty() {
        return document.tags.clone();
    }
    extract_keywords(&[document.title.as_str(), document.body.as_str()], n)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper() -> Document {
        Document::new("arxiv:1706.03762", "Attention Is All You Need", DocumentSource::Paper)
            .with_authors(["Ashish Vaswani", "Noam Shazeer"])
            .with_year(2017)
            .with_body("The dominant sequence transduction models are based on recurrent networks.")
    }

    #[test]
    fn test_paper_summary() {
        let summary = basic_summary(&paper());
        assert_eq!(
            summary,
            "Title: Attention Is All You Need\n\
             Authors: Ashish Vaswani, Noam Shazeer\n\
             Year: 2017\n\
             Abstract: The dominant sequence transduction models are based on recurrent networks...."
        );
    }

    #[test]
    fn test_paper_summary_truncates_abstract() {
        let doc = Document::new("p", "Long", DocumentSource::Paper).with_body("é".repeat(500));
        let summary = basic_summary(&doc);
        assert!(summary.contains("Year: Unknown"));
        let abstract_line = summary.lines().last().unwrap();
        assert_eq!(abstract_line.chars().count(), "Abstract: ".len() + 200 + 3);
    }

    #[test]
    fn test_project_summary() {
        let doc = Document::new("github:huggingface/transformers", "huggingface/transformers", DocumentSource::Repository)
            .with_body("State-of-the-art machine learning")
            .with_tags(["nlp", "pytorch"]);
        assert_eq!(
            basic_summary(&doc),
            "Repository: huggingface/transformers\nDescription: State-of-the-art machine learning\nTopics: nlp, pytorch"
        );
    }

    #[test]
    fn test_topics_prefer_tags() {
        let doc = Document::new("r", "repo", DocumentSource::Repository).with_tags(["Deep Learning", "nlp"]);
        assert_eq!(document_topics(&doc, 5), vec!["Deep Learning", "nlp"]);
    }

    #[test]
    fn test_topics_fall_back_to_keywords() {
        let topics = document_topics(&paper(), 3);
        assert_eq!(topics.len(), 3);
        assert!(topics.iter().all(|t| t.chars().all(|c| c.is_lowercase())));
    }
}
