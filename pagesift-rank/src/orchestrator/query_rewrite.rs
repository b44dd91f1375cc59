//! Default phrase policy for multi-word queries.
//!
//! A query such as `annual report` is searched as the exact phrase
//! `"annual report"`. Queries that already use quote syntax are left for the
//! index store to interpret.

use std::fmt;

/// Result of applying the phrase policy to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryRewrite {
    /// The query was wrapped into an exact phrase.
    Phrase(String),
    /// The query is passed to the store as given (trimmed).
    Unchanged(String),
}

impl QueryRewrite {
    /// Query text to send to the index store.
    pub fn text(&self) -> &str {
        match self {
            Self::Phrase(text) | Self::Unchanged(text) => text,
        }
    }

    /// Whether the phrase policy fired.
    pub fn is_phrase(&self) -> bool {
        matches!(self, Self::Phrase(_))
    }

    /// Consume into the query text.
    pub fn into_text(self) -> String {
        match self {
            Self::Phrase(text) | Self::Unchanged(text) => text,
        }
    }
}

impl fmt::Display for QueryRewrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// Apply the phrase policy.
///
/// The query is trimmed. If it then contains whitespace and no `"`, runs of
/// whitespace collapse to one space and the whole query is quoted.
///
/// # Examples
///
/// ```
/// use pagesift_rank::orchestrator::query_rewrite::{rewrite_query, QueryRewrite};
///
/// assert_eq!(
///     rewrite_query("  annual   report "),
///     QueryRewrite::Phrase("\"annual report\"".into())
/// );
/// assert_eq!(rewrite_query("invoice"), QueryRewrite::Unchanged("invoice".into()));
/// ```
pub fn rewrite_query(raw: &str) -> QueryRewrite {
    let trimmed = raw.trim();
    if trimmed.contains('"') || !trimmed.contains(char::is_whitespace) {
        return QueryRewrite::Unchanged(trimmed.to_string());
    }
    let collapsed = trimmed.split_whitespace().collect::<Vec<_>>().join(" ");
    QueryRewrite::Phrase(format!("\"{collapsed}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_word_unchanged() {
        assert_eq!(rewrite_query("invoice"), QueryRewrite::Unchanged("invoice".into()));
    }

    #[test]
    fn single_word_is_trimmed() {
        let rewrite = rewrite_query("  invoice\t");
        assert_eq!(rewrite.text(), "invoice");
        assert!(!rewrite.is_phrase());
    }

    #[test]
    fn multi_word_becomes_phrase() {
        let rewrite = rewrite_query("annual report");
        assert!(rewrite.is_phrase());
        assert_eq!(rewrite.text(), "\"annual report\"");
    }

    #[test]
    fn internal_whitespace_collapses() {
        assert_eq!(
            rewrite_query("annual \t\n report  2024").into_text(),
            "\"annual report 2024\""
        );
    }

    #[test]
    fn quoted_query_unchanged() {
        assert_eq!(
            rewrite_query(" \"annual report\" "),
            QueryRewrite::Unchanged("\"annual report\"".into())
        );
    }

    #[test]
    fn partially_quoted_query_left_to_store() {
        let rewrite = rewrite_query("\"annual report\" draft");
        assert!(!rewrite.is_phrase());
        assert_eq!(rewrite.text(), "\"annual report\" draft");
    }

    #[test]
    fn blank_query_is_empty_text() {
        assert_eq!(rewrite_query("   ").text(), "");
    }

    #[test]
    fn display_shows_rewritten_text() {
        assert_eq!(rewrite_query("a b").to_string(), "\"a b\"");
    }
}
