//! Corpus import from the extraction pipeline.
//!
//! Text extraction (PDF, slides, notebooks...) happens outside pagesift and
//! produces JSON Lines, one object per page:
//!
//! ```json
//! {"file_name":"q1.pdf","path":"C:\\reports\\q1.pdf","author":"Ada","create_date":"2024-01-31 09:00:00","page":1,"content":"..."}
//! ```
//!
//! Loading never aborts on a bad record. Every problem is recorded in the
//! [`LoadReport`] returned by the call, and reports from several files are
//! merged by the caller.

use std::fmt;
use std::path::Path;

use chrono::NaiveDateTime;
use pagesift_rank::types::{CREATED_AT_FORMAT, UNKNOWN};
use serde::{Deserialize, Serialize};

/// One page as written by the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    /// File name without directories.
    pub file_name: String,
    /// Full source path, any separator convention.
    pub path: String,
    /// Declared author; `"Unknown"` and blank mean none.
    #[serde(default)]
    pub author: Option<String>,
    /// Creation timestamp, `%Y-%m-%d %H:%M:%S`.
    #[serde(default)]
    pub create_date: Option<String>,
    /// 1-based page number.
    pub page: u32,
    /// Extracted page text.
    pub content: String,
}

/// A validated page ready to be indexed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusPage {
    /// File name without directories.
    pub file_name: String,
    /// Full source path as given.
    pub path: String,
    /// Author, if one was declared.
    pub author: Option<String>,
    /// Creation timestamp, if known.
    pub created_at: Option<NaiveDateTime>,
    /// 1-based page number.
    pub page: u32,
    /// Page text, trimmed.
    pub content: String,
}

/// What went wrong with a record or file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// The corpus file could not be read.
    Unreadable,
    /// The line is not a valid page record.
    Malformed,
    /// The page has no text.
    EmptyContent,
    /// The page number is 0.
    InvalidPage,
    /// The record has no source path.
    MissingPath,
    /// The creation date could not be parsed; the record is kept.
    InvalidDate,
}

/// One problem found while loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadIssue {
    /// Corpus file the problem was found in.
    pub source: String,
    /// 1-based line number, 0 for file-level problems.
    pub line: usize,
    /// Document path of the offending record, when known.
    pub path: Option<String>,
    /// Category.
    pub kind: IssueKind,
    /// Human-readable detail.
    pub message: String,
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if self.line > 0 {
            write!(f, ":{}", self.line)?;
        }
        if let Some(path) = &self.path {
            write!(f, " ({path})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Pages and problems collected by one load call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    /// Accepted pages in file order.
    pub records: Vec<CorpusPage>,
    /// Problems, in the order they were found.
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    /// Append another report's pages and issues.
    pub fn merge(&mut self, other: LoadReport) {
        self.records.extend(other.records);
        self.issues.extend(other.issues);
    }

    /// Whether any problem was recorded.
    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

/// Parse JSON Lines text. `source` names the input in issues.
pub fn parse_jsonl(source: &str, text: &str) -> LoadReport {
    let mut report = LoadReport::default();
    for (index, line) in text.lines().enumerate() {
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }
        let issue = |path: Option<&str>, kind, message: String| LoadIssue {
            source: source.to_string(),
            line: line_no,
            path: path.map(str::to_string),
            kind,
            message,
        };

        let record: PageRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(e) => {
                report
                    .issues
                    .push(issue(None, IssueKind::Malformed, format!("invalid page record: {e}")));
                continue;
            }
        };

        if record.path.trim().is_empty() {
            report.issues.push(issue(
                None,
                IssueKind::MissingPath,
                "record has no source path".into(),
            ));
            continue;
        }
        let path = Some(record.path.as_str());
        if record.page == 0 {
            report
                .issues
                .push(issue(path, IssueKind::InvalidPage, "page numbers start at 1".into()));
            continue;
        }
        let content = record.content.trim();
        if content.is_empty() {
            report.issues.push(issue(
                path,
                IssueKind::EmptyContent,
                "document content is empty".into(),
            ));
            continue;
        }

        let created_at = match record.create_date.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) if raw == UNKNOWN => None,
            Some(raw) => match NaiveDateTime::parse_from_str(raw, CREATED_AT_FORMAT) {
                Ok(t) => Some(t),
                Err(e) => {
                    report.issues.push(issue(
                        path,
                        IssueKind::InvalidDate,
                        format!("invalid create_date {raw:?}: {e}"),
                    ));
                    None
                }
            },
        };
        let author = record
            .author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty() && a != UNKNOWN);

        report.records.push(CorpusPage {
            file_name: record.file_name,
            path: record.path,
            author,
            created_at,
            page: record.page,
            content: content.to_string(),
        });
    }
    report
}

/// Load one JSON Lines corpus file.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read. Bad records are
/// reported in the returned [`LoadReport`], never as errors.
pub fn load_jsonl(path: &Path) -> crate::error::Result<LoadReport> {
    let text = std::fs::read_to_string(path)?;
    let report = parse_jsonl(&path.display().to_string(), &text);
    tracing::debug!(
        path = %path.display(),
        records = report.records.len(),
        issues = report.issues.len(),
        "corpus file loaded"
    );
    Ok(report)
}

/// Load several corpus files into one merged report.
///
/// Unreadable files are recorded as issues.
pub fn load_corpora<P: AsRef<Path>>(paths: &[P]) -> LoadReport {
    let mut merged = LoadReport::default();
    for path in paths {
        let path = path.as_ref();
        match load_jsonl(path) {
            Ok(report) => merged.merge(report),
            Err(e) => merged.issues.push(LoadIssue {
                source: path.display().to_string(),
                line: 0,
                path: None,
                kind: IssueKind::Unreadable,
                message: e.to_string(),
            }),
        }
    }
    if merged.has_issues() {
        tracing::warn!(
            issues = merged.issues.len(),
            records = merged.records.len(),
            "corpus loaded with skipped or partial records"
        );
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD: &str = r#"{"file_name":"q1.pdf","path":"C:\\reports\\q1.pdf","author":"Ada","create_date":"2024-01-31 09:00:00","page":1,"content":"  Quarterly ledger  "}"#;

    #[test]
    fn valid_record_is_accepted() {
        let report = parse_jsonl("pages.jsonl", GOOD);
        assert!(report.issues.is_empty());
        let page = &report.records[0];
        assert_eq!(page.file_name, "q1.pdf");
        assert_eq!(page.author.as_deref(), Some("Ada"));
        assert_eq!(page.content, "Quarterly ledger");
        assert_eq!(
            page.created_at.map(|t| t.format(CREATED_AT_FORMAT).to_string()),
            Some("2024-01-31 09:00:00".to_string())
        );
    }

    #[test]
    fn malformed_line_is_recorded_and_skipped() {
        let text = format!("{GOOD}\nnot json\n");
        let report = parse_jsonl("pages.jsonl", &text);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::Malformed);
        assert_eq!(report.issues[0].line, 2);
    }

    #[test]
    fn empty_content_is_recorded_and_skipped() {
        let text = r#"{"file_name":"a.txt","path":"/a.txt","page":1,"content":"   "}"#;
        let report = parse_jsonl("pages.jsonl", text);
        assert!(report.records.is_empty());
        assert_eq!(report.issues[0].kind, IssueKind::EmptyContent);
        assert_eq!(report.issues[0].message, "document content is empty");
        assert_eq!(report.issues[0].path.as_deref(), Some("/a.txt"));
    }

    #[test]
    fn page_zero_and_blank_path_are_rejected() {
        let text = concat!(
            r#"{"file_name":"a.txt","path":"/a.txt","page":0,"content":"x"}"#,
            "\n",
            r#"{"file_name":"b.txt","path":" ","page":1,"content":"x"}"#,
        );
        let report = parse_jsonl("pages.jsonl", text);
        assert!(report.records.is_empty());
        let kinds: Vec<_> = report.issues.iter().map(|i| i.kind).collect();
        assert_eq!(kinds, vec![IssueKind::InvalidPage, IssueKind::MissingPath]);
    }

    #[test]
    fn bad_date_keeps_record_without_timestamp() {
        let text = r#"{"file_name":"a.txt","path":"/a.txt","create_date":"yesterday","page":1,"content":"x"}"#;
        let report = parse_jsonl("pages.jsonl", text);
        assert_eq!(report.records.len(), 1);
        assert!(report.records[0].created_at.is_none());
        assert_eq!(report.issues[0].kind, IssueKind::InvalidDate);
    }

    #[test]
    fn unknown_author_and_date_mean_missing() {
        let text = r#"{"file_name":"a.txt","path":"/a.txt","author":"Unknown","create_date":"Unknown","page":1,"content":"x"}"#;
        let report = parse_jsonl("pages.jsonl", text);
        assert!(report.issues.is_empty());
        assert!(report.records[0].author.is_none());
        assert!(report.records[0].created_at.is_none());
    }

    #[test]
    fn blank_lines_are_ignored() {
        let text = format!("\n{GOOD}\n\n");
        let report = parse_jsonl("pages.jsonl", &text);
        assert_eq!(report.records.len(), 1);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn reports_merge_in_order() {
        let mut first = parse_jsonl("a.jsonl", GOOD);
        let second = parse_jsonl("b.jsonl", "oops");
        first.merge(second);
        assert_eq!(first.records.len(), 1);
        assert_eq!(first.issues.len(), 1);
        assert_eq!(first.issues[0].source, "b.jsonl");
    }

    #[test]
    fn issue_display_names_location() {
        let report = parse_jsonl(
            "pages.jsonl",
            r#"{"file_name":"a","path":"/a","page":0,"content":"x"}"#,
        );
        assert_eq!(
            report.issues[0].to_string(),
            "pages.jsonl:1 (/a): page numbers start at 1"
        );
    }

    #[test]
    fn missing_file_is_recorded_by_load_corpora() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("pages.jsonl");
        std::fs::write(&good, GOOD).expect("write fixture");
        let missing = dir.path().join("absent.jsonl");

        let report = load_corpora(&[good, missing]);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].kind, IssueKind::Unreadable);
        assert_eq!(report.issues[0].line, 0);
    }
}
