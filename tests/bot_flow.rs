//! Flow tests over the store, sentiment tagging, extraction dispatch, and
//! download cleanup, without touching Telegram or Gemini.

use sagebot::bot::download::DownloadedFile;
use sagebot::bot::extract::{self, Extraction, FileKind};
use sagebot::bot::handlers::compose_reply;
use sagebot::bot::ocr::OcrEngine;
use sagebot::bot::search;
use sagebot::bot::store::{ChatTurn, RegistrationState, Store};
use sagebot::sentiment::{self, SentimentLabel};

/// The registration-then-chat scenario for chat id 42.
#[test]
fn registration_then_chat_scenario() {
    let store = Store::in_memory().unwrap();

    // /start from an unseen chat id creates a pending-phone row
    store.create_user(42, "Dana", Some("dana42")).unwrap();
    let user = store.find_user(42).unwrap().unwrap();
    assert_eq!(user.phone_number, None);
    assert_eq!(user.state, RegistrationState::PendingPhone);

    // a second /start never creates a second row
    assert!(store.create_user(42, "Dana", Some("dana42")).is_err());
    assert_eq!(store.user_count(), 1);

    // matching contact share captures the phone number
    store.record_phone(42, "+15551234").unwrap();
    let user = store.find_user(42).unwrap().unwrap();
    assert_eq!(user.phone_number.as_deref(), Some("+15551234"));
    assert_eq!(user.state, RegistrationState::Registered);

    // "I love this!" is tagged positive, prefixed, and persisted
    let text = "I love this!";
    let label = sentiment::classify(text);
    assert_eq!(label, SentimentLabel::Positive);

    let reply = compose_reply(label, "Happy to hear it.");
    assert!(reply.starts_with("😊 That sounds great! "));

    store
        .insert_chat_turn(&ChatTurn {
            chat_id: 42,
            user_input: text.to_string(),
            bot_response: reply,
            sentiment: label,
        })
        .unwrap();
    assert_eq!(store.chat_turn_count(), 1);
}

/// A rejected contact share must leave the stored phone number untouched.
/// The handler's own-number check short-circuits before any store call;
/// this pins the store-level behavior it relies on.
#[test]
fn rejected_contact_mutates_nothing() {
    let store = Store::in_memory().unwrap();
    store.create_user(7, "Avery", None).unwrap();

    // no record_phone call happens on mismatch; the row stays pending
    let user = store.find_user(7).unwrap().unwrap();
    assert_eq!(user.phone_number, None);
    assert_eq!(user.state, RegistrationState::PendingPhone);
}

/// The dispatch table over the declared test fixtures.
#[test]
fn dispatch_table_over_declared_types() {
    assert_eq!(FileKind::classify(false, Some("image/png")), FileKind::Image);
    assert_eq!(FileKind::classify(false, Some("application/pdf")), FileKind::Pdf);
    assert_eq!(FileKind::classify(false, Some("text/plain")), FileKind::PlainText);
    assert_eq!(FileKind::classify(false, Some("application/zip")), FileKind::Unsupported);
    assert_eq!(FileKind::classify(true, None), FileKind::Image);
}

/// After processing fails, the downloaded file must be gone from disk.
#[test]
fn downloaded_file_removed_after_failed_processing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.png");
    std::fs::write(&path, b"not really a png").unwrap();

    let guard = DownloadedFile::claim(path.clone());
    let engine = OcrEngine::new(None);
    let result = extract::extract(FileKind::Image, guard.path(), &engine);
    assert!(result.is_err());

    drop(guard);
    assert!(!path.exists());
}

/// After successful processing, the downloaded file must also be gone.
#[test]
fn downloaded_file_removed_after_successful_processing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.txt");
    std::fs::write(&path, b"quarterly planning notes").unwrap();

    let guard = DownloadedFile::claim(path.clone());
    let engine = OcrEngine::new(None);
    let result = extract::extract(FileKind::PlainText, guard.path(), &engine).unwrap();
    assert_eq!(result, Extraction::Text("quarterly planning notes".to_string()));

    drop(guard);
    assert!(!path.exists());
}

/// Unsupported types skip extraction and persist an empty analysis.
#[test]
fn unsupported_type_persists_empty_analysis() {
    let store = Store::in_memory().unwrap();
    let engine = OcrEngine::new(None);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("archive.zip");
    std::fs::write(&path, b"PK\x03\x04").unwrap();

    let kind = FileKind::classify(false, Some("application/zip"));
    let extraction = extract::extract(kind, &path, &engine).unwrap();
    assert_eq!(extraction, Extraction::Skipped);

    store.insert_file_analysis(42, "archive.zip", "").unwrap();
    assert_eq!(store.file_analysis_count(), 1);
}

/// Empty or missing search results mean "no results" and no summarization.
#[test]
fn empty_search_results_short_circuit() {
    let results = search::parse_results(r#"{"kind": "customsearch#search"}"#).unwrap();
    assert!(results.is_empty());

    let results = search::parse_results(r#"{"items": []}"#).unwrap();
    assert!(results.is_empty());
}

/// A populated response becomes an ordered listing for the summarizer.
#[test]
fn search_results_feed_the_summarizer_prompt() {
    let body = r#"{"items": [
        {"title": "Rust Book", "link": "https://doc.rust-lang.org/book/"},
        {"title": "Rustlings", "link": "https://github.com/rust-lang/rustlings"}
    ]}"#;
    let results = search::parse_results(body).unwrap();
    let prompt = search::summary_prompt(&results);
    assert!(prompt.starts_with("Summarize these search results: "));
    assert!(prompt.contains("**Rust Book**: https://doc.rust-lang.org/book/"));
    assert!(prompt.contains("**Rustlings**: https://github.com/rust-lang/rustlings"));
}
