//! Keyword fallback for classifying free-text intent when no analysis
//! engine is available.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Question,
    Request,
    Complaint,
    Information,
    Other,
}

impl Intent {
    pub fn as_str(&self) -> &str {
        match self {
            Intent::Question => "question",
            Intent::Request => "request",
            Intent::Complaint => "complaint",
            Intent::Information => "information",
            Intent::Other => "other",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const REQUEST_KEYWORDS: &[&str] = &["please", "could you", "can you", "would you", "need", "request"];
const COMPLAINT_KEYWORDS: &[&str] = &[
    "complaint",
    "disappointed",
    "unacceptable",
    "broken",
    "not working",
    "problem",
    "issue",
];
const INFORMATION_KEYWORDS: &[&str] = &["fyi", "for your information", "update", "announce", "notice"];

/// Classify text by keyword.
///
/// A `?` anywhere wins over every keyword category, so "please help me?"
/// is a question.
pub fn classify_intent_fallback(text: &str) -> Intent {
    if text.contains('?') {
        return Intent::Question;
    }
    let lower = text.to_lowercase();
    let has_any = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if has_any(REQUEST_KEYWORDS) {
        Intent::Request
    } else if has_any(COMPLAINT_KEYWORDS) {
        Intent::Complaint
    } else if has_any(INFORMATION_KEYWORDS) {
        Intent::Information
    } else {
        Intent::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_question_mark_takes_precedence() {
        assert_eq!(classify_intent_fallback("please help me?"), Intent::Question);
    }

    #[test]
    fn test_keyword_categories() {
        assert_eq!(
            classify_intent_fallback("Please merge the branch"),
            Intent::Request
        );
        assert_eq!(
            classify_intent_fallback("The build is broken again"),
            Intent::Complaint
        );
        assert_eq!(
            classify_intent_fallback("FYI the release moved"),
            Intent::Information
        );
        assert_eq!(classify_intent_fallback("hello"), Intent::Other);
    }
}
