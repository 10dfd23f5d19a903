//! Source attribution re-ranking
//!
//! Decides which retrieved chunks are shown as citations for an answer.
//! The answer's salient tokens (amounts and other numbers, dates, content
//! words) are matched against every retrieved chunk with a weighted
//! overlap score:
//!
//! | match            | points |
//! |------------------|--------|
//! | number / amount  | 10     |
//! | date             | 8      |
//! | other keyword    | 2      |
//!
//! Only chunks scoring at least 20 are cited. When none do, the first
//! three retrieved chunks are shown with score 0. A short filtered list
//! (fewer than three) collapses to its single best chunk, and so does an
//! answer built around exactly one number and no dates.
//!
//! Pure and deterministic; no model calls.

use leasewise_domain::{Chunk, ScoredSource};
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Points for a number or amount found in a chunk
pub const NUMBER_WEIGHT: u32 = 10;
/// Points for a date found in a chunk
pub const DATE_WEIGHT: u32 = 8;
/// Points for any other keyword found in a chunk
pub const KEYWORD_WEIGHT: u32 = 2;

const MIN_KEYWORD_LEN: usize = 4;

static DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}/\d{1,2}/\d{2,4}\b|\b(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\.?\s+\d{1,2}(?:st|nd|rd|th)?,?\s+\d{4}\b",
    )
    .expect("date pattern is valid")
});

static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$?\d{1,3}(?:,\d{3})+(?:\.\d+)?|\$?\d+(?:\.\d+)?").expect("number pattern is valid")
});

static WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z]+").expect("word pattern is valid"));

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "also", "been", "before", "being", "below", "both", "could",
    "does", "each", "from", "have", "having", "here", "into", "just", "more", "most", "must",
    "only", "other", "over", "same", "shall", "should", "some", "such", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "those", "under", "until", "very", "were",
    "what", "when", "where", "which", "while", "will", "with", "would", "your", "according",
    "contract", "states", "stated",
];

/// Tunable parts of the re-ranking policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RerankPolicy {
    /// Minimum score for a chunk to be cited
    pub threshold: u32,
    /// Most sources returned
    pub max_sources: usize,
    /// Cite only the best chunk when the answer has exactly one number and no dates
    pub collapse_single_numeric: bool,
}

impl Default for RerankPolicy {
    fn default() -> Self {
        Self {
            threshold: 20,
            max_sources: 3,
            collapse_single_numeric: true,
        }
    }
}

/// Salient tokens pulled from an answer
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalientTokens {
    /// Numbers and amounts with `$` stripped, e.g. `2,500`
    pub numbers: Vec<String>,
    /// Date strings as written
    pub dates: Vec<String>,
    /// Lowercase content words of four or more letters
    pub keywords: Vec<String>,
}

impl SalientTokens {
    /// Extract salient tokens from answer text
    ///
    /// Dates are taken first and removed, so their digits are not counted
    /// again as numbers.
    pub fn extract(text: &str) -> Self {
        let dates = dedup(DATE.find_iter(text).map(|m| m.as_str().to_string()));
        let without_dates = DATE.replace_all(text, " ");

        let numbers = dedup(
            NUMBER
                .find_iter(&without_dates)
                .map(|m| m.as_str().trim_start_matches('$').to_string()),
        );
        let keywords = dedup(
            WORD.find_iter(&without_dates)
                .map(|m| m.as_str().to_lowercase())
                .filter(|w| w.len() >= MIN_KEYWORD_LEN && !STOPWORDS.contains(&w.as_str())),
        );

        Self {
            numbers,
            dates,
            keywords,
        }
    }

    /// Whether nothing salient was found
    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty() && self.dates.is_empty() && self.keywords.is_empty()
    }
}

fn dedup(tokens: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens.filter(|t| seen.insert(t.clone())).collect()
}

fn canonical_number(token: &str) -> String {
    token.trim_start_matches('$').replace(',', "")
}

/// Score one chunk against the answer's salient tokens
pub fn score_chunk(tokens: &SalientTokens, chunk: &Chunk) -> ScoredSource {
    let lower = chunk.text.to_lowercase();
    let chunk_numbers: HashSet<String> = NUMBER
        .find_iter(&chunk.text)
        .map(|m| canonical_number(m.as_str()))
        .collect();
    let chunk_words: HashSet<String> = WORD
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect();

    let mut score = 0;
    let mut matched = Vec::new();

    for number in &tokens.numbers {
        if chunk_numbers.contains(&canonical_number(number)) {
            score += NUMBER_WEIGHT;
            matched.push(number.clone());
        }
    }
    for date in &tokens.dates {
        if lower.contains(&date.to_lowercase()) {
            score += DATE_WEIGHT;
            matched.push(date.clone());
        }
    }
    for keyword in &tokens.keywords {
        if chunk_words.contains(keyword) {
            score += KEYWORD_WEIGHT;
            matched.push(keyword.clone());
        }
    }

    ScoredSource {
        chunk: chunk.clone(),
        score,
        matched,
    }
}

/// Choose the citations for `answer` among `retrieved`, best first
pub fn rerank(answer: &str, retrieved: &[Chunk], policy: &RerankPolicy) -> Vec<ScoredSource> {
    if retrieved.is_empty() {
        return Vec::new();
    }

    let tokens = SalientTokens::extract(answer);
    let mut kept: Vec<ScoredSource> = retrieved
        .iter()
        .map(|chunk| score_chunk(&tokens, chunk))
        .filter(|source| source.score >= policy.threshold)
        .collect();
    // Stable: equal scores keep retrieval order
    kept.sort_by(|a, b| b.score.cmp(&a.score));

    if kept.is_empty() {
        debug!("No source cleared {} points, falling back to retrieval order", policy.threshold);
        return retrieved
            .iter()
            .take(policy.max_sources)
            .map(|chunk| ScoredSource {
                chunk: chunk.clone(),
                score: 0,
                matched: Vec::new(),
            })
            .collect();
    }

    let single_numeric = tokens.numbers.len() == 1 && tokens.dates.is_empty();
    let limit = if kept.len() < policy.max_sources
        || (policy.collapse_single_numeric && single_numeric)
    {
        1
    } else {
        policy.max_sources
    };
    kept.truncate(limit);

    debug!(
        "Citing {} source(s), top score {}",
        kept.len(),
        kept.first().map_or(0, |s| s.score)
    );
    kept
}
