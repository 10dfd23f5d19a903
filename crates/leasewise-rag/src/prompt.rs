//! Prompt templates

use leasewise_domain::{ContractField, SummaryKind, NOT_MENTIONED};

/// System instructions for answering questions
pub const QA_SYSTEM: &str = "You are an assistant that answers questions about a rental contract. \
Use only the contract excerpts in the context. Quote amounts, dates and durations exactly as \
they are written. If the context does not contain the answer, say that the contract does not \
mention it.";

/// Marker a compression call returns when nothing in the passage is relevant
pub const NO_OUTPUT: &str = "NO_OUTPUT";

/// The user turn for a question
pub fn question_prompt(question: &str) -> String {
    format!("Question: {}\nHelpful Answer:", question.trim())
}

/// Ask the model to copy out only the parts of `passage` relevant to `question`
pub fn compression_prompt(question: &str, passage: &str) -> String {
    format!(
        "Given the following question and context, extract any part of the context *AS IS* \
that is relevant to answer the question. If none of the context is relevant return {NO_OUTPUT}.\n\n\
> Question: {}\n> Context:\n>>>\n{}\n>>>\nExtracted relevant parts:",
        question.trim(),
        passage
    )
}

/// Summary prompt for `kind` over the given contract text
pub fn summary_prompt(kind: SummaryKind, text: &str) -> String {
    let instructions = match kind {
        SummaryKind::Brief => {
            "Provide a brief 1-2 paragraph summary of this rental contract.\n\
Focus on the most important terms: rent amount, duration, and key obligations.\n\
Write prose paragraphs, not lists."
        }
        SummaryKind::KeyPoints => {
            "Extract and list the key points from this rental contract.\n\
Format as a numbered list covering:\n\
1. Rental amount and payment terms\n\
2. Lease duration and dates\n\
3. Security deposit details\n\
4. Maintenance responsibilities\n\
5. Termination conditions\n\
6. Important restrictions or rules\n\
7. Any special clauses"
        }
        SummaryKind::Comprehensive => {
            "Provide a comprehensive summary of this rental contract.\n\
Include all important sections, each under its own label:\n\
- Parties and Property Details\n\
- Financial Terms (rent, deposits, fees)\n\
- Lease Period and Renewal\n\
- Responsibilities (tenant vs landlord)\n\
- Rules and Restrictions\n\
- Termination and Penalties\n\
- Special Conditions"
        }
    };
    let heading = match kind {
        SummaryKind::Brief => "Brief Summary:",
        SummaryKind::KeyPoints => "Key Points:",
        SummaryKind::Comprehensive => "Comprehensive Summary:",
    };

    format!("{instructions}\n\nContract content:\n{text}\n\n{heading}")
}

/// JSON schema handed to providers that support constrained output
pub fn extraction_schema() -> String {
    let properties: Vec<String> = ContractField::ALL
        .iter()
        .map(|f| format!("\"{}\":{{\"type\":\"string\"}}", f.key()))
        .collect();
    let required: Vec<String> = ContractField::ALL
        .iter()
        .map(|f| format!("\"{}\"", f.key()))
        .collect();
    format!(
        "{{\"type\":\"object\",\"properties\":{{{}}},\"required\":[{}]}}",
        properties.join(","),
        required.join(",")
    )
}

/// Ask for the structured record, grounded only in `summary`
pub fn extraction_prompt(summary: &str) -> String {
    let mut prompt = String::from(
        "Extract the following fields from this rental contract summary. Use only what the \
summary states; do not guess.\n\nFields:\n",
    );
    for field in ContractField::ALL {
        prompt.push_str(&format!("- {} ({})\n", field.key(), field.label()));
    }
    prompt.push_str(&format!(
        "\nReturn a single JSON object with exactly these keys and string values. \
Use \"{NOT_MENTIONED}\" for any field the summary does not state.\n\n\
Summary:\n{summary}\n\nJSON:"
    ));
    prompt
}
