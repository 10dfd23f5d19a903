//! Per-field answer simplification
//!
//! Backfill answers are full sentences; each schema field has a small
//! deterministic function that pulls out the value worth storing. The
//! functions never call a model and are unit-tested against literal
//! input/output pairs.

use leasewise_domain::ContractField;
use regex::Regex;
use std::sync::LazyLock;

const MAX_TEXT_VALUE: usize = 200;

static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:S\$|US\$|\$|USD\s?|SGD\s?)\s?\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|(?:S\$|US\$|\$|USD\s?|SGD\s?)\s?\d+(?:\.\d{1,2})?")
        .expect("amount pattern is valid")
});

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?\s?%").expect("percent pattern is valid"));

static DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d+|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|eighteen|twenty-four)[\s-]*(?:\(\d+\)\s*)?(?:calendar\s+)?(?:months?|years?|weeks?)\b",
    )
    .expect("duration pattern is valid")
});

static DUE_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d{1,2}(?:st|nd|rd|th)\b(?:\s+(?:day\s+)?of\s+(?:each|every|the)(?:\s+calendar)?\s+month)?|\b(?:first|last)\s+day\s+of\s+(?:each|every|the)\s+month\b",
    )
    .expect("due day pattern is valid")
});

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?](?:\s|$)").expect("sentence pattern is valid"));

static CLAUSE_END: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[;,:]|[.!?](?:\s|$)|\s(?:but|although|however|while)\s")
        .expect("clause pattern is valid")
});

static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:unfortunately|sorry|i'm sorry|based on|according to|from|in|looking at)\b")
        .expect("preamble pattern is valid")
});

const UNKNOWN_PHRASES: &[&str] = &[
    "not mentioned",
    "not specified",
    "not stated",
    "not provided",
    "not included",
    "not found",
    "no information",
    "no mention",
    "does not mention",
    "doesn't mention",
    "does not specify",
    "doesn't specify",
    "does not contain",
    "doesn't contain",
    "does not say",
    "i don't know",
    "i do not know",
    "unable to find",
    "cannot find",
    "can't find",
    "unknown",
    "n/a",
];

/// Whether an answer amounts to "the contract does not say"
///
/// Only the leading clause is inspected, after skipping preambles such as
/// "Unfortunately," or "Based on the context,". An unknown phrase later in
/// the answer does not make the whole answer unknown.
pub fn is_unknown(answer: &str) -> bool {
    let trimmed = answer.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lead = CLAUSE_END
        .split(trimmed)
        .map(str::trim)
        .find(|clause| !clause.is_empty() && !PREAMBLE.is_match(clause))
        .unwrap_or(trimmed)
        .to_lowercase();
    UNKNOWN_PHRASES.iter().any(|p| lead.contains(p))
}

/// Simplifier for one field
pub type Simplifier = fn(&str) -> Option<String>;

/// The value pattern for `field`
///
/// `None` for free-text fields, which keep the answer's first sentence.
pub fn simplifier(field: ContractField) -> Option<Simplifier> {
    match field {
        ContractField::RentAmount | ContractField::SecurityDeposit => Some(first_amount),
        ContractField::LateFee => Some(first_amount_or_percent),
        ContractField::LeaseDuration => Some(first_duration),
        ContractField::PaymentDueDate => Some(first_due_day),
        ContractField::PetPolicy
        | ContractField::Maintenance
        | ContractField::Termination
        | ContractField::Utilities
        | ContractField::Parking => None,
    }
}

/// Reduce a backfill answer to a field value
///
/// A match of the field's pattern wins. Otherwise "unknown" answers give
/// `None` and anything else keeps its first sentence.
pub fn simplify(field: ContractField, answer: &str) -> Option<String> {
    if let Some(value) = simplifier(field).and_then(|pattern| pattern(answer)) {
        return Some(value);
    }
    if is_unknown(answer) {
        return None;
    }
    first_sentence(answer)
}

/// First currency amount, e.g. `$2,500`
pub fn first_amount(text: &str) -> Option<String> {
    AMOUNT.find(text).map(|m| m.as_str().trim().to_string())
}

/// Whichever of the first amount or first percentage comes earlier
pub fn first_amount_or_percent(text: &str) -> Option<String> {
    let amount = AMOUNT.find(text);
    let percent = PERCENT.find(text);
    let first = match (amount, percent) {
        (Some(a), Some(p)) => Some(if p.start() < a.start() { p } else { a }),
        (a, p) => a.or(p),
    };
    first.map(|m| m.as_str().trim().to_string())
}

/// First `N months`/`N years` style duration
pub fn first_duration(text: &str) -> Option<String> {
    DURATION.find(text).map(|m| m.as_str().trim().to_string())
}

/// First due-day phrase such as `1st of each month`
pub fn first_due_day(text: &str) -> Option<String> {
    DUE_DAY.find(text).map(|m| m.as_str().trim().to_string())
}

/// First sentence, capped at 200 characters
pub fn first_sentence(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let sentence = match SENTENCE_END.find(trimmed) {
        Some(m) => &trimmed[..m.start() + 1],
        None => trimmed,
    };
    let capped: String = sentence.chars().take(MAX_TEXT_VALUE).collect();
    Some(capped.trim().to_string())
}
