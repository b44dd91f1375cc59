//! In-memory index store over imported corpus pages.
//!
//! A small reference adaptor used by the CLI, the HTTP service and the
//! tests. It indexes two fields per page, `content` and `file_name`.
//! Terms are lowercase alphanumeric runs; there is no stemming, stop-word
//! removal or other analysis.
//!
//! # Query syntax
//!
//! - bare words: each word is a term; one hit per term per matching page
//! - `"quoted words"`: an exact phrase; one hit per matching page listing
//!   every start position of the phrase
//!
//! An unterminated or empty phrase is a parse error.
//!
//! In the `content` field a bare term that does not occur on a page falls
//! back to fuzzy matching: tokens one edit away that share the term's first
//! character. The hit then carries the matched token as its term.

use std::collections::{BTreeSet, HashMap};

use pagesift_rank::orchestrator::path_normalize::normalize_path;
use pagesift_rank::types::UNKNOWN;
use pagesift_rank::{CorpusStats, Hit, IndexError, IndexStore};

use crate::corpus::CorpusPage;

/// Page text field.
pub const CONTENT_FIELD: &str = "content";
/// File name field.
pub const FILE_NAME_FIELD: &str = "file_name";

/// Fields every page is indexed under.
pub const FIELDS: [&str; 2] = [CONTENT_FIELD, FILE_NAME_FIELD];

/// Fields where bare terms fall back to fuzzy matching.
const FUZZY_FIELDS: [&str; 1] = [CONTENT_FIELD];
/// Largest edit distance accepted by the fuzzy fallback.
const FUZZY_MAX_DISTANCE: usize = 1;

/// Characters of context in a highlight window.
const SNIPPET_CHARS: usize = 160;
/// Characters kept before the first match.
const SNIPPET_LEAD: usize = 60;

/// One parsed piece of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryPart {
    /// A single term.
    Term(String),
    /// Consecutive terms.
    Phrase(Vec<String>),
}

impl QueryPart {
    fn label(&self) -> String {
        match self {
            Self::Term(term) => term.clone(),
            Self::Phrase(terms) => terms.join(" "),
        }
    }
}

/// Per-field postings for all pages.
#[derive(Debug, Default)]
struct FieldIndex {
    /// Token stream of each page, indexed like `MemoryIndex::pages`.
    tokens: Vec<Vec<String>>,
    /// Number of pages containing each term.
    doc_freq: HashMap<String, u64>,
    /// Highest per-page count of any single term.
    max_term_frequency: u32,
}

impl FieldIndex {
    fn build<'a>(texts: impl Iterator<Item = &'a str>) -> Self {
        let mut index = Self::default();
        for text in texts {
            let tokens: Vec<String> = tokenize(text).into_iter().map(|(_, _, t)| t).collect();
            let mut counts: HashMap<&str, u32> = HashMap::new();
            for token in &tokens {
                *counts.entry(token.as_str()).or_default() += 1;
            }
            for (term, count) in counts {
                index.max_term_frequency = index.max_term_frequency.max(count);
                *index.doc_freq.entry(term.to_string()).or_default() += 1;
            }
            index.tokens.push(tokens);
        }
        index
    }
}

/// In-memory [`IndexStore`] over a fixed set of pages.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    pages: Vec<CorpusPage>,
    doc_ids: Vec<String>,
    fields: HashMap<&'static str, FieldIndex>,
}

impl MemoryIndex {
    /// Index the given pages.
    pub fn new(pages: Vec<CorpusPage>) -> Self {
        let doc_ids = pages.iter().map(|p| normalize_path(&p.path)).collect();
        let mut fields = HashMap::new();
        fields.insert(
            CONTENT_FIELD,
            FieldIndex::build(pages.iter().map(|p| p.content.as_str())),
        );
        fields.insert(
            FILE_NAME_FIELD,
            FieldIndex::build(pages.iter().map(|p| p.file_name.as_str())),
        );
        tracing::debug!(pages = pages.len(), "memory index built");
        Self {
            pages,
            doc_ids,
            fields,
        }
    }

    /// Number of indexed pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the index holds no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// The first `n` pages, for inspection.
    pub fn sample(&self, n: usize) -> &[CorpusPage] {
        &self.pages[..n.min(self.pages.len())]
    }

    /// The `n` most frequent terms of a field with their total occurrence
    /// counts, most frequent first; ties in term order.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Unavailable`] for a field that is not indexed.
    pub fn top_terms(&self, field: &str, n: usize) -> Result<Vec<(String, u64)>, IndexError> {
        let index = self.field(field)?;
        let mut counts: HashMap<&str, u64> = HashMap::new();
        for token in index.tokens.iter().flatten() {
            *counts.entry(token.as_str()).or_default() += 1;
        }
        let mut ranked: Vec<(String, u64)> = counts
            .into_iter()
            .map(|(term, count)| (term.to_string(), count))
            .collect();
        ranked.sort_by(|(term_a, a), (term_b, b)| b.cmp(a).then_with(|| term_a.cmp(term_b)));
        ranked.truncate(n);
        Ok(ranked)
    }

    fn field(&self, field: &str) -> Result<&FieldIndex, IndexError> {
        self.fields
            .get(field)
            .ok_or_else(|| IndexError::Unavailable(format!("unknown field `{field}`")))
    }

    fn field_text<'a>(page: &'a CorpusPage, field: &str) -> &'a str {
        if field == FILE_NAME_FIELD {
            &page.file_name
        } else {
            &page.content
        }
    }

    fn rarity_for(&self, doc_freq: u64) -> f64 {
        if doc_freq == 0 {
            return 0.0;
        }
        (1.0 + self.pages.len() as f64 / doc_freq as f64).ln()
    }
}

impl IndexStore for MemoryIndex {
    fn retrieve(&self, query: &str, field: &str, limit: usize) -> Result<Vec<Hit>, IndexError> {
        let parts = parse_query(query)?;
        let index = self.field(field)?;
        let fuzzy = FUZZY_FIELDS.contains(&field);

        // (page index, part index, matched label, positions), in page order
        // then part order.
        let mut matches: Vec<(usize, usize, String, Vec<u32>)> = Vec::new();
        let mut part_doc_freq = vec![0u64; parts.len()];
        for (page_idx, tokens) in index.tokens.iter().enumerate() {
            for (part_idx, part) in parts.iter().enumerate() {
                let (label, positions) = match part {
                    QueryPart::Term(term) => {
                        let exact = term_positions(tokens, term);
                        if exact.is_empty() && fuzzy {
                            fuzzy_positions(tokens, term)
                        } else {
                            (term.clone(), exact)
                        }
                    }
                    QueryPart::Phrase(terms) => (part.label(), phrase_positions(tokens, terms)),
                };
                if !positions.is_empty() {
                    part_doc_freq[part_idx] += 1;
                    matches.push((page_idx, part_idx, label, positions));
                }
            }
        }

        let mut hits = Vec::with_capacity(matches.len().min(limit));
        for (page_idx, part_idx, label, positions) in matches.into_iter().take(limit) {
            let page = &self.pages[page_idx];
            let field_length = u32::try_from(index.tokens[page_idx].len()).unwrap_or(u32::MAX);
            let term_frequency = u32::try_from(positions.len()).unwrap_or(u32::MAX);
            let hit = Hit::builder(self.doc_ids[page_idx].as_str(), page.page)
                .field(field)
                .term(label)
                .term_frequency(term_frequency)
                .positions(positions)
                .field_length(field_length)
                .rarity(self.rarity_for(part_doc_freq[part_idx]))
                .author(page.author.clone())
                .created_at(page.created_at)
                .path(page.path.as_str())
                .snippet_source(Self::field_text(page, field))
                .build()?;
            hits.push(hit);
        }
        tracing::trace!(field, hits = hits.len(), "memory index retrieve");
        Ok(hits)
    }

    fn rarity(&self, field: &str, term: &str) -> f64 {
        let Ok(index) = self.field(field) else {
            return 0.0;
        };
        let doc_freq = index.doc_freq.get(&term.to_lowercase()).copied().unwrap_or(0);
        self.rarity_for(doc_freq)
    }

    fn highlight(&self, hit: &Hit) -> String {
        let words: Vec<String> = tokenize(hit.term()).into_iter().map(|(_, _, t)| t).collect();
        highlight_text(hit.snippet_source(), &words)
    }

    fn total_document_count(&self) -> u64 {
        self.pages.len() as u64
    }

    fn corpus_stats(&self, field: &str) -> CorpusStats {
        let document_count = self.pages.len() as u64;
        let Ok(index) = self.field(field) else {
            return CorpusStats {
                document_count,
                ..CorpusStats::default()
            };
        };
        // Any term or phrase occurs on at least one page, so df = 1 bounds rarity.
        let max_rarity = if index.doc_freq.is_empty() {
            0.0
        } else {
            self.rarity_for(1)
        };
        CorpusStats {
            document_count,
            max_term_frequency: index.max_term_frequency,
            max_rarity,
        }
    }

    fn authors(&self) -> Vec<String> {
        self.pages
            .iter()
            .map(|p| p.author.as_deref().unwrap_or(UNKNOWN).to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

/// Split text into lowercase alphanumeric tokens with their byte ranges.
pub fn tokenize(text: &str) -> Vec<(usize, usize, String)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, ch) in text.char_indices() {
        match (ch.is_alphanumeric(), start) {
            (true, None) => start = Some(idx),
            (false, Some(s)) => {
                tokens.push((s, idx, text[s..idx].to_lowercase()));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        tokens.push((s, text.len(), text[s..].to_lowercase()));
    }
    tokens
}

/// Parse query text into terms and phrases.
///
/// # Errors
///
/// Returns [`IndexError::Parse`] for an unterminated or empty phrase.
pub fn parse_query(query: &str) -> Result<Vec<QueryPart>, IndexError> {
    let mut parts: Vec<QueryPart> = Vec::new();
    let mut push = |part: QueryPart| {
        if !parts.contains(&part) {
            parts.push(part);
        }
    };

    let mut rest = query;
    let mut offset = 0;
    while let Some(open) = rest.find('"') {
        for (_, _, term) in tokenize(&rest[..open]) {
            push(QueryPart::Term(term));
        }
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('"') else {
            return Err(IndexError::Parse(format!(
                "unterminated phrase starting at column {}",
                offset + open + 1
            )));
        };
        let terms: Vec<String> = tokenize(&after_open[..close])
            .into_iter()
            .map(|(_, _, t)| t)
            .collect();
        if terms.is_empty() {
            return Err(IndexError::Parse(format!(
                "empty phrase at column {}",
                offset + open + 1
            )));
        }
        push(if terms.len() == 1 {
            QueryPart::Term(terms.into_iter().next().unwrap_or_default())
        } else {
            QueryPart::Phrase(terms)
        });
        let consumed = open + 1 + close + 1;
        offset += consumed;
        rest = &rest[consumed..];
    }
    for (_, _, term) in tokenize(rest) {
        push(QueryPart::Term(term));
    }
    Ok(parts)
}

fn term_positions(tokens: &[String], term: &str) -> Vec<u32> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| t.as_str() == term)
        .filter_map(|(i, _)| u32::try_from(i).ok())
        .collect()
}

/// Positions of tokens one edit from `term` sharing its first character,
/// labelled with the first such token.
fn fuzzy_positions(tokens: &[String], term: &str) -> (String, Vec<u32>) {
    let mut label: Option<&str> = None;
    let positions = tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| is_fuzzy_match(token, term))
        .filter_map(|(i, token)| {
            label.get_or_insert(token.as_str());
            u32::try_from(i).ok()
        })
        .collect();
    (label.unwrap_or(term).to_string(), positions)
}

/// Whether `token` is within one edit of `term` and shares its first
/// character. Identical strings are not fuzzy matches.
pub fn is_fuzzy_match(token: &str, term: &str) -> bool {
    if token == term || token.chars().next() != term.chars().next() {
        return false;
    }
    strsim::levenshtein(token, term) <= FUZZY_MAX_DISTANCE
}

fn phrase_positions(tokens: &[String], terms: &[String]) -> Vec<u32> {
    if terms.is_empty() || tokens.len() < terms.len() {
        return Vec::new();
    }
    tokens
        .windows(terms.len())
        .enumerate()
        .filter(|(_, window)| *window == terms)
        .filter_map(|(i, _)| u32::try_from(i).ok())
        .collect()
}

/// Render an HTML-safe window of `text` around the first occurrence of any
/// of `words`, wrapping each occurrence in `<b>…</b>`.
pub fn highlight_text(text: &str, words: &[String]) -> String {
    let tokens = tokenize(text);
    let is_match = |token: &str| words.iter().any(|w| w == token);
    let first = tokens.iter().find(|(_, _, t)| is_match(t)).map_or(0, |(s, _, _)| *s);

    let start = back_chars(text, first, SNIPPET_LEAD);
    let end = forward_chars(text, start, SNIPPET_CHARS);

    let mut out = String::new();
    if start > 0 {
        out.push_str("...");
    }
    let mut cursor = start;
    for (s, e, token) in &tokens {
        if *s < start || *e > end || !is_match(token) {
            continue;
        }
        out.push_str(&escape_html(&text[cursor..*s]));
        out.push_str("<b>");
        out.push_str(&escape_html(&text[*s..*e]));
        out.push_str("</b>");
        cursor = *e;
    }
    out.push_str(&escape_html(&text[cursor..end]));
    if end < text.len() {
        out.push_str("...");
    }
    out
}

/// Byte index `n` characters before `from`, or 0.
fn back_chars(text: &str, from: usize, n: usize) -> usize {
    text[..from]
        .char_indices()
        .rev()
        .nth(n.saturating_sub(1))
        .map_or(0, |(i, _)| i)
}

/// Byte index `n` characters after `from`, or the end of `text`.
fn forward_chars(text: &str, from: usize, n: usize) -> usize {
    text[from..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(i, _)| from + i)
}

/// Escape the five HTML-significant characters.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
