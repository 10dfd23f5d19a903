//! Parse structured-extraction output into an [`ExtractionRecord`]

use crate::simplify::is_unknown;
use leasewise_domain::{ContractField, ExtractionRecord};
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

/// The structured-extraction response could not be parsed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Malformed extraction response: {0}")]
pub struct MalformedExtraction(pub String);

/// Parse a model response into a record
///
/// Fields that are absent, null, blank or an "unknown" phrase hold the
/// sentinel. Keys are matched case-insensitively against the schema keys.
pub fn parse_extraction(response: &str) -> Result<ExtractionRecord, MalformedExtraction> {
    let json_str = extract_json(response)?;
    let json: Value = serde_json::from_str(json_str)
        .map_err(|e| MalformedExtraction(format!("JSON parse error: {}", e)))?;
    let obj = json
        .as_object()
        .ok_or_else(|| MalformedExtraction("Expected JSON object".to_string()))?;

    let mut record = ExtractionRecord::new();
    for (key, value) in obj {
        let normalized = key.trim().to_lowercase().replace([' ', '-'], "_");
        let Ok(field) = normalized.parse::<ContractField>() else {
            continue;
        };
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        if !is_unknown(&text) {
            record.set(field, text);
        }
    }
    Ok(record)
}

/// Parse a model response, defaulting every field to the sentinel on failure
pub fn parse_extraction_or_default(response: &str) -> ExtractionRecord {
    parse_extraction(response).unwrap_or_else(|e| {
        warn!("{}; defaulting every field", e);
        ExtractionRecord::new()
    })
}

/// Extract the JSON object from a response, handling markdown code blocks
/// and surrounding prose
fn extract_json(response: &str) -> Result<&str, MalformedExtraction> {
    let mut body = response.trim();

    // LLMs sometimes wrap JSON in markdown code blocks
    if body.starts_with("```") {
        body = body
            .split_once('\n')
            .map(|(_, rest)| rest)
            .unwrap_or_default();
        body = body.trim_end().trim_end_matches("```");
    }

    let start = body
        .find('{')
        .ok_or_else(|| MalformedExtraction("No JSON object found".to_string()))?;
    let end = body
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| MalformedExtraction("Unterminated JSON object".to_string()))?;
    Ok(&body[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use leasewise_domain::NOT_MENTIONED;

    #[test]
    fn test_parse_plain_object() {
        let record = parse_extraction(
            r#"{"rent_amount": "$2,500", "lease_duration": "12 months", "parking": "Not mentioned"}"#,
        )
        .unwrap();

        assert_eq!(&record[ContractField::RentAmount], "$2,500");
        assert_eq!(&record[ContractField::LeaseDuration], "12 months");
        assert_eq!(&record[ContractField::Parking], NOT_MENTIONED);
        assert_eq!(&record[ContractField::PetPolicy], NOT_MENTIONED);
    }

    #[test]
    fn test_parse_fenced_object() {
        let response = "```json\n{\"security_deposit\": \"$5,000\"}\n```";
        let record = parse_extraction(response).unwrap();
        assert_eq!(&record[ContractField::SecurityDeposit], "$5,000");
    }

    #[test]
    fn test_parse_object_inside_prose() {
        let response = "Here is the data:\n{\"Late Fee\": \"5%\", \"utilities\": null}\nHope this helps.";
        let record = parse_extraction(response).unwrap();
        assert_eq!(&record[ContractField::LateFee], "5%");
        assert_eq!(&record[ContractField::Utilities], NOT_MENTIONED);
    }

    #[test]
    fn test_numbers_and_unknown_phrases() {
        let record =
            parse_extraction(r#"{"rent_amount": 2500, "pet_policy": "The summary does not specify"}"#)
                .unwrap();
        assert_eq!(&record[ContractField::RentAmount], "2500");
        assert!(record.is_missing(ContractField::PetPolicy));
    }

    #[test]
    fn test_unknown_keys_ignored() {
        let record = parse_extraction(r#"{"landlord_name": "Acme"}"#).unwrap();
        assert_eq!(record, ExtractionRecord::new());
    }

    #[test]
    fn test_malformed_responses() {
        assert!(parse_extraction("no json here").is_err());
        assert!(parse_extraction("[1, 2, 3]").is_err());
        assert!(parse_extraction("{\"rent_amount\": ").is_err());
        assert!(parse_extraction("} backwards {").is_err());
    }

    #[test]
    fn test_malformed_defaults_to_sentinels() {
        let record = parse_extraction_or_default("The model refused.");
        assert_eq!(record.missing_fields().len(), ContractField::ALL.len());
    }
}
