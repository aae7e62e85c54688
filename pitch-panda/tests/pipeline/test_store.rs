//! Saving pipeline output and reading it back as a report

use super::common::*;
use pitch_panda::pipeline::{run_analysis, AnalysisInput};
use pitch_panda::render::render_report;
use pitch_panda::store::AnalysisStore;
use std::sync::Arc;

#[tokio::test]
async fn test_saved_run_renders_the_same_report() {
    let site = website().await;
    let ctx = context(Arc::new(scripted_llm()));

    let input = AnalysisInput::new(site.uri()).with_slides(slides(1));
    let state = run_analysis(input, &ctx).await;
    assert!(state.final_analysis.is_some());

    let dir = tempfile::tempdir().unwrap();
    let store = AnalysisStore::open(dir.path().join("analyses.db")).unwrap();
    store.save(&site.uri(), &state).unwrap();

    let stored = store.get_by_url(&site.uri()).unwrap().unwrap();
    assert_eq!(stored.startup_id, state.startup_id);
    assert_eq!(stored.memo, state.memo);

    // Slide images and raw HTML are not persisted
    assert!(stored.state.deck_slides.is_none());
    assert!(stored.state.website_html.is_none());
    assert_eq!(stored.state.deck_structured, state.deck_structured);

    assert_eq!(render_report(&stored.state), render_report(&state));
}

#[test]
fn test_domain_keys_ignore_scheme_and_www() {
    let store = AnalysisStore::new_in_memory().unwrap();
    store.initialize_schema().unwrap();

    let state = pitch_panda::pipeline::StartupState::new(AnalysisInput::new("https://acme.io"));
    store.save("https://www.acme.io/", &state).unwrap();

    assert!(store.exists("http://acme.io/pricing").unwrap());
    assert!(store.exists("ACME.io").unwrap());
    assert!(!store.exists("https://acme.com").unwrap());

    assert!(store.delete("acme.io").unwrap());
    assert_eq!(store.count().unwrap(), 0);
}
