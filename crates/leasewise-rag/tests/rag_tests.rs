//! End-to-end tests for a contract session
//!
//! Contracts are written as plain-text files so the whole pipeline runs:
//! backend selection, normalization, chunking, embedding, retrieval,
//! generation through `MockProvider`, re-ranking and extraction.

use leasewise_domain::{AnswerStatus, ContractField, SummaryKind, NOT_MENTIONED};
use leasewise_llm::MockProvider;
use leasewise_rag::{ContractRag, LoadStatus, RagConfig, RagError};
use leasewise_store::{ChunkCache, HashingEmbedder, StoreState};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

const ARTICLES: [&str; 10] = ["I", "II", "III", "IV", "V", "VI", "VII", "VIII", "IX", "X"];

const LEASE_BODIES: [&str; 10] = [
    "This Residential Lease is made between Harbor Properties (Landlord) and Jordan Lee (Tenant) \
for the apartment at Elm Street. Monthly rent: $2,500, due on the 1st of each month.",
    "Security deposit: $5,000, held by the Landlord and returned within thirty days after the \
tenancy ends, less lawful deductions for damage.",
    "The lease term is twelve months. The tenancy renews automatically unless either party gives \
written notice sixty days before expiry.",
    "A late fee of $150 applies to any payment received after the 5th day.",
    "Tenant keeps the premises clean and reports leaks promptly. Landlord handles structural \
repairs, plumbing and heating systems.",
    "Tenant pays electricity, internet and gas. Water and trash collection are covered by the \
Landlord.",
    "No pets are permitted on the premises without prior written consent of the Landlord.",
    "One assigned parking space in the rear garage is included. Visitors use street parking.",
    "Tenant may terminate early with sixty days notice and payment of a termination fee equal \
to two months of charges.",
    "Signed by both parties. Each party received an executed copy of this agreement.",
];

const STORAGE_BODY: &str = "This Storage Unit Agreement covers unit B at Riverside Storage. \
Monthly storage fee: $180, due on the 15th. Hazardous materials are prohibited.";

fn lease_text() -> String {
    ARTICLES
        .iter()
        .zip(LEASE_BODIES)
        .map(|(article, body)| format!("Article {}\n\n{}", article, body))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn config() -> RagConfig {
    RagConfig {
        chunk_size: 400,
        chunk_overlap: 40,
        ..RagConfig::default()
    }
}

fn session(provider: &MockProvider) -> ContractRag<MockProvider, HashingEmbedder> {
    ContractRag::new(provider.clone(), HashingEmbedder::new(256), config()).unwrap()
}

#[tokio::test]
async fn test_extract_rent_amount_from_ten_page_contract() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());

    let mut provider = MockProvider::new("The contract does not mention this.");
    provider.add_response("JSON:", r#"{"rent_amount": "$2,500 per month"}"#);
    provider.add_response(
        "Comprehensive Summary:",
        "Financial Terms: monthly rent of $2,500 due on the 1st.",
    );
    let mut rag = session(&provider);

    let report = rag.load(&lease).unwrap();
    assert_eq!(report.status, LoadStatus::Loaded);
    assert!(report.stats.chunks > 1);

    let outcome = rag.extract().await.unwrap();
    assert!(outcome.record[ContractField::RentAmount].contains("$2,500"));
    assert_eq!(&outcome.record[ContractField::Parking], NOT_MENTIONED);
    assert!(outcome.backfilled.is_empty());
    assert!(outcome.usage.total_tokens() > 0);

    // summary, extraction, then one question per missing field
    assert_eq!(provider.call_count(), 2 + ContractField::ALL.len() - 1);
}

#[tokio::test]
async fn test_ask_cites_the_rent_clause() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());

    let mut provider = MockProvider::default();
    provider.add_response(
        "Helpful Answer:",
        "The monthly rent is $2,500, due on the 1st of each month.",
    );
    let mut rag = session(&provider);
    rag.load(&lease).unwrap();

    let answer = rag.ask("What is the monthly rent?").await.unwrap();
    assert_eq!(answer.status, AnswerStatus::Answered);
    assert!(answer.answer.contains("2,500"));
    assert!(!answer.sources.is_empty());
    assert!(answer.sources[0].chunk.text.contains("2,500"));
    assert!(answer.sources[0].score >= 20);
    assert_eq!(rag.memory().len(), 1);
}

#[tokio::test]
async fn test_loading_another_contract_resets_the_session() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());
    let storage = write(dir.path(), "storage.txt", STORAGE_BODY);

    let mut provider = MockProvider::new("The monthly rent is $2,500.");
    let mut rag = session(&provider);

    rag.load(&lease).unwrap();
    rag.ask("What is the monthly rent?").await.unwrap();
    assert_eq!(rag.memory().len(), 1);

    let report = rag.load(&storage).unwrap();
    assert_eq!(report.status, LoadStatus::Loaded);
    assert!(rag.memory().is_empty());

    let stats = rag.statistics();
    assert_eq!(stats.loaded_contracts, 1);
    assert_eq!(stats.active_document.as_deref(), Some("storage.txt"));
    assert_eq!(stats.memory_turns, 0);

    provider.add_response("Helpful Answer:", "You have not asked anything yet.");
    rag.ask("What did I just ask?").await.unwrap();

    let request = provider.last_request().unwrap();
    assert!(request.history.is_empty());
    assert!(!request.context.is_empty());
    assert!(request.context.iter().all(|c| !c.contains("2,500")));
    assert!(request.context.iter().any(|c| c.contains("$180")));
}

#[tokio::test]
async fn test_brief_and_key_points_differ_in_shape() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());

    let mut provider = MockProvider::default();
    provider.add_response(
        "Brief Summary:",
        "This is a twelve month residential lease at a monthly rent of $2,500.\n\n\
The tenant pays most utilities and may not keep pets without consent.",
    );
    provider.add_response(
        "Key Points:",
        "1. Rent: $2,500 due on the 1st\n2. Deposit: $5,000\n3. Term: twelve months",
    );
    let mut rag = session(&provider);
    rag.load(&lease).unwrap();

    let brief = rag.summarize(SummaryKind::Brief).await.unwrap();
    let key_points = rag.summarize(SummaryKind::KeyPoints).await.unwrap();

    assert!(brief.text.contains("2,500"));
    assert!(key_points.text.contains("2,500"));
    assert!(brief.text.lines().all(|l| !l.trim_start().starts_with("1.")));
    assert!(key_points.text.lines().all(|l| l.chars().next().is_some_and(|c| c.is_ascii_digit())));

    let requests = provider.requests();
    assert!(requests[0].render().contains("prose paragraphs"));
    assert!(requests[1].render().contains("numbered list"));
    assert!(!brief.is_partial());
}

#[tokio::test]
async fn test_cache_hit_and_invalidation() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());
    let cache = ChunkCache::new(dir.path().join("cache")).unwrap();

    let provider = MockProvider::default();
    let mut rag = session(&provider).with_cache(cache);

    let first = rag.load(&lease).unwrap();
    assert_eq!(first.status, LoadStatus::Loaded);

    let again = rag.load(&lease).unwrap();
    assert_eq!(again.status, LoadStatus::AlreadyLoaded);
    assert_eq!(again.stats, first.stats);

    rag.clear();
    let cached = rag.load(&lease).unwrap();
    assert_eq!(cached.status, LoadStatus::FromCache);
    assert_eq!(cached.stats, first.stats);
    assert_eq!(rag.statistics().vector_index_size, first.stats.chunks);

    fs::write(&lease, format!("{}\n\nArticle XI\n\nAddendum on storage lockers.", lease_text()))
        .unwrap();
    rag.clear();
    let modified = rag.load(&lease).unwrap();
    assert_eq!(modified.status, LoadStatus::Loaded);
    assert!(modified.stats.characters > first.stats.characters);

    rag.clear();
    let bypassed = rag.load_with(&lease, false).unwrap();
    assert_eq!(bypassed.status, LoadStatus::Loaded);
}

#[tokio::test]
async fn test_failed_load_leaves_session_empty() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());
    let scan = write(dir.path(), "scan.bin", "\u{1}\u{2}");

    let provider = MockProvider::default();
    let mut rag = session(&provider);
    rag.load(&lease).unwrap();

    let err = rag.load(&scan).unwrap_err();
    assert!(matches!(err, RagError::Extraction(_)));
    assert_eq!(rag.state(), StoreState::Empty);
    assert_eq!(rag.current_document_info(), "No documents loaded");

    let missing = rag.load(&dir.path().join("missing.pdf")).unwrap_err();
    assert!(matches!(missing, RagError::Extraction(_)));
}

#[tokio::test]
async fn test_nothing_loaded() {
    let provider = MockProvider::default();
    let mut rag = session(&provider);

    let answer = rag.ask("What is the rent?").await.unwrap();
    assert!(answer.is_no_contract());
    assert!(rag.memory().is_empty());

    assert!(matches!(
        rag.summarize(SummaryKind::Brief).await,
        Err(RagError::NoActiveDocument)
    ));
    assert!(matches!(rag.extract().await, Err(RagError::NoActiveDocument)));
    assert_eq!(provider.call_count(), 0);

    let stats = rag.statistics();
    assert_eq!(stats.loaded_contracts, 0);
    assert_eq!(stats.total_chunks, 0);
    assert_eq!(stats.active_document, None);
}

#[tokio::test]
async fn test_blank_question_is_not_reported_as_nothing_loaded() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());

    let provider = MockProvider::default();
    let mut rag = session(&provider);
    rag.load(&lease).unwrap();

    let err = rag.ask("   ").await.unwrap_err();
    assert!(matches!(err, RagError::EmptyQuestion));
    assert!(matches!(rag.state(), StoreState::Active(_)));
    assert!(rag.memory().is_empty());
    assert_eq!(provider.call_count(), 0);
}

#[tokio::test]
async fn test_slow_model_times_out() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());

    let provider = MockProvider::default().with_latency(Duration::from_secs(2));
    let config = RagConfig {
        llm_timeout_secs: 1,
        ..config()
    };
    let mut rag = ContractRag::new(provider, HashingEmbedder::new(256), config).unwrap();
    rag.load(&lease).unwrap();

    let err = rag.ask("What is the monthly rent?").await.unwrap_err();
    assert!(matches!(err, RagError::AnswerGeneration(_)));
    assert!(rag.memory().is_empty());

    let err = rag.summarize(SummaryKind::Brief).await.unwrap_err();
    assert!(matches!(err, RagError::Timeout(1)));
}

#[tokio::test]
async fn test_index_round_trip_through_disk() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());
    let index_path = dir.path().join("index").join("lease.json");

    let mut provider = MockProvider::default();
    provider.add_response("Helpful Answer:", "The monthly rent is $2,500.");
    let mut rag = session(&provider);
    rag.load(&lease).unwrap();
    rag.save_index(&index_path).unwrap();

    let mut restored = session(&provider);
    assert!(restored.load_index(&index_path, false).is_err());
    assert_eq!(restored.state(), StoreState::Empty);

    let report = restored.load_index(&index_path, true).unwrap();
    assert_eq!(report.stats, rag.active_document().unwrap().stats);

    let answer = restored.ask("What is the monthly rent?").await.unwrap();
    assert!(answer.sources[0].chunk.text.contains("2,500"));
}

#[tokio::test]
async fn test_parallel_extraction_matches_sequential() {
    let dir = TempDir::new().unwrap();
    let lease = write(dir.path(), "lease.txt", &lease_text());

    let mut provider = MockProvider::new("The contract does not mention this.");
    provider.add_response("JSON:", "{}");
    provider.add_response("security deposit amount", "The security deposit is $5,000.");
    provider.add_response("pet policy", "No pets are permitted without written consent.");
    let mut rag = session(&provider);
    rag.load(&lease).unwrap();

    let sequential = rag.extract().await.unwrap();
    rag.set_parallel_backfill(true);
    let parallel = rag.extract().await.unwrap();

    assert_eq!(sequential.record, parallel.record);
    assert_eq!(sequential.backfilled, parallel.backfilled);
    assert_eq!(&sequential.record[ContractField::SecurityDeposit], "$5,000");
    assert_eq!(
        sequential.backfilled,
        vec![ContractField::SecurityDeposit, ContractField::PetPolicy]
    );
}
