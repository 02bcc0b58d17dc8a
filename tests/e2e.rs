//! End-to-end tests against the live Gemini API.
//!
//! Gated behind `E2E_ENABLED` and `GOOGLE_API_KEY` so they never run in CI
//! unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 GOOGLE_API_KEY=... cargo test --test e2e -- --nocapture

mod common;

use common::cats_and_dogs_pdf;
use edgequake_pdfstudy::{AssistantConfig, Dispatcher, Notice, Outcome, QuickAction, Session, Upload};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Skip this test unless E2E_ENABLED and an API key are set; yields the key.
macro_rules! e2e_skip_unless_ready {
    () => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        match std::env::var("GOOGLE_API_KEY") {
            Ok(key) if !key.trim().is_empty() => key,
            _ => {
                println!("SKIP: GOOGLE_API_KEY is not set");
                return;
            }
        }
    }};
}

fn session_with(config: &AssistantConfig, key: &str) -> Session {
    let mut session = Session::new(config);
    session
        .upload(Upload::new("cats-and-dogs.pdf", cats_and_dogs_pdf()))
        .unwrap();
    session.set_credential(key);
    session
}

#[tokio::test]
async fn test_live_flashcards() {
    let key = e2e_skip_unless_ready!();
    let config = AssistantConfig::default();
    let session = session_with(&config, &key);

    let outcome = Dispatcher::new(&config)
        .unwrap()
        .dispatch(&session, Some(QuickAction::Flashcards), None)
        .await;

    let answer = outcome.answer().unwrap_or_else(|| panic!("got {outcome:?}"));
    println!("{}", answer.response);
    assert!(answer.response.contains("Concepto"));
    assert!(answer.response.to_lowercase().contains("mam"));
}

#[tokio::test]
async fn test_live_invalid_key_is_generic_notice() {
    let _key = e2e_skip_unless_ready!();
    let config = AssistantConfig::default();
    let session = session_with(&config, "definitely-not-a-valid-key");

    let outcome = Dispatcher::new(&config)
        .unwrap()
        .dispatch(&session, None, Some("¿Qué animales aparecen?"))
        .await;
    assert_eq!(outcome, Outcome::Notice(Notice::InvocationFailed));
}
