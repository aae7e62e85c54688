//! End-to-end runs of the stage graph with a scripted LLM

use super::common::*;
use pitch_panda::pipeline::{
    run_analysis, run_status, stream_analysis, AnalysisInput, Stage,
};
use pitch_panda::render::render_report;
use pitch_panda_sdk::AnalysisStatus;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

// ============================================================================
// Full runs
// ============================================================================

#[tokio::test]
async fn test_full_run_produces_analysis_and_memo() {
    let site = website().await;
    let llm = Arc::new(scripted_llm());
    let ctx = context(llm.clone());

    let input = AnalysisInput {
        url: site.uri(),
        startup_id: Some("analysis-acme".to_string()),
        deck_slides: slides(2),
        extra_context: Some("MRR: $40k\nRevenue: $1.2M".to_string()),
    };

    let state = run_analysis(input, &ctx).await;

    assert!(state.errors.is_empty(), "unexpected errors: {:?}", state.errors);
    assert_eq!(run_status(&state), AnalysisStatus::Completed);

    // Ingestion
    let chunks = state.web_chunks.as_ref().unwrap();
    assert!(chunks.iter().any(|c| c.text.contains("Invoice reconciliation")));
    assert!(chunks.iter().any(|c| c.text.contains("former Stripe engineers")));
    assert!(!chunks.iter().any(|c| c.text.contains("track()")));
    assert_eq!(state.deck_structured.as_ref().unwrap().len(), 2);

    // Private context: explicit MRR kept, ARR under a "revenue" label demoted
    let extra = state.extra_context.as_ref().unwrap();
    assert_eq!(extra.mrr.as_deref(), Some("$40k"));
    assert!(extra.arr.is_none());
    assert!(extra.unclassified_values.iter().any(|v| v.value == "$1.2M"));

    let analysis = state.final_analysis.as_ref().unwrap();
    assert_eq!(analysis.startup_id, "analysis-acme");
    assert_eq!(analysis.problem.one_liner, "Reconciliation is slow");
    assert_eq!(analysis.team.size.as_deref(), Some("12"));
    assert_eq!(analysis.market.as_ref().unwrap().tam.as_deref(), Some("$20B"));
    assert_eq!(analysis.risks.len(), 2);
    assert_eq!(analysis.missing_info, vec!["Churn figures"]);
    assert!(analysis.extra_context.is_some());

    assert_eq!(state.memo.as_deref(), Some(MEMO_TEXT));

    assert_eq!(llm.calls_matching(VISION), 2);
    assert_eq!(llm.calls_matching(EXTRA_CONTEXT), 1);
    assert_eq!(llm.calls_matching(MEMO), 1);
    assert_eq!(llm.total_calls(), 9);

    let report = render_report(&state);
    assert!(report.contains("## Investment Memo"));
    assert!(report.contains("LedgerCo"));
    assert!(!report.contains("## Pipeline Errors"));
}

#[tokio::test]
async fn test_run_without_deck_or_context_skips_those_stages() {
    let site = website().await;
    let llm = Arc::new(scripted_llm());
    let ctx = context(llm.clone());

    let state = run_analysis(AnalysisInput::new(site.uri()), &ctx).await;

    assert!(state.errors.is_empty(), "unexpected errors: {:?}", state.errors);
    assert_eq!(state.deck_structured, Some(vec![]));
    assert!(state.extra_context.is_none());
    assert!(state.startup_id.starts_with("analysis-"));
    assert_eq!(llm.calls_matching(VISION), 0);
    assert_eq!(llm.calls_matching(EXTRA_CONTEXT), 0);
    assert!(state.final_analysis.unwrap().extra_context.is_none());
}

// ============================================================================
// Failure propagation
// ============================================================================

#[tokio::test]
async fn test_failed_business_stage_does_not_abort_run() {
    let site = website().await;
    let llm = Arc::new(
        MockLlm::new()
            .fail(BUSINESS)
            .respond(EVIDENCE, EVIDENCE_JSON)
            .respond(CORE, CORE_JSON)
            .respond(MARKET, MARKET_JSON)
            .respond(RISK, RISK_JSON)
            .respond(MEMO, MEMO_TEXT),
    );
    let ctx = context(llm.clone());

    let state = run_analysis(AnalysisInput::new(site.uri()), &ctx).await;

    assert!(state.core.is_some());
    assert!(state.market.is_some());
    assert!(state.business.is_none());
    assert!(state.risk.is_none());
    assert!(state.final_analysis.is_none());
    assert!(state.memo.is_none());
    assert_eq!(run_status(&state), AnalysisStatus::Failed);

    for node in [
        "business_analysis",
        "risk_analysis",
        "merge_analysis",
        "investment_memo",
    ] {
        let prefix = format!("{} failed:", node);
        assert!(
            state.errors.iter().any(|e| e.starts_with(&prefix)),
            "missing error for {}: {:?}",
            node,
            state.errors
        );
    }

    // Risk never reached the model
    assert_eq!(llm.calls_matching(RISK), 0);

    let report = render_report(&state);
    assert!(report.contains("## Pipeline Errors"));
    assert!(report.contains("Reconciliation is slow"));
}

#[tokio::test]
async fn test_evidence_without_any_content_skips_llm() {
    let llm = Arc::new(scripted_llm());
    let ctx = context(llm.clone());

    let state = run_analysis(AnalysisInput::new(UNREACHABLE_URL), &ctx).await;

    assert_eq!(state.web_chunks, Some(vec![]));
    assert!(state.errors.iter().any(|e| e.starts_with("ingest_website failed:")));
    assert!(state
        .errors
        .iter()
        .any(|e| e.starts_with("evidence_extraction failed:") && e.contains("No content available")));
    assert!(state.evidence.is_none());
    assert_eq!(llm.calls_matching(EVIDENCE), 0);
    assert_eq!(llm.total_calls(), 0);
    assert!(state.final_analysis.is_none());
}

#[tokio::test]
async fn test_private_context_alone_is_enough_for_evidence() {
    let llm = Arc::new(scripted_llm());
    let ctx = context(llm.clone());

    let input = AnalysisInput::new(UNREACHABLE_URL).with_context("MRR: $40k");
    let state = run_analysis(input, &ctx).await;

    assert_eq!(llm.calls_matching(EVIDENCE), 1);
    assert!(state.evidence.is_some());
    assert!(state.final_analysis.is_some());
    assert_eq!(run_status(&state), AnalysisStatus::CompletedWithErrors);
    assert_eq!(state.errors.len(), 1);
}

// ============================================================================
// Deck vision
// ============================================================================

#[tokio::test]
async fn test_vision_output_sorted_by_input_page() {
    let site = website().await;
    // Slide 1 finishes last
    let llm = Arc::new(
        MockLlm::new()
            .respond_after("Analyze slide 1:", SLIDE_JSON, Duration::from_millis(120))
            .respond_after("Analyze slide 2:", SLIDE_JSON, Duration::from_millis(60))
            .respond(VISION, SLIDE_JSON)
            .respond(EVIDENCE, EVIDENCE_JSON)
            .respond(CORE, CORE_JSON)
            .respond(BUSINESS, BUSINESS_JSON)
            .respond(MARKET, MARKET_JSON)
            .respond(RISK, RISK_JSON)
            .respond(MEMO, MEMO_TEXT),
    );
    let ctx = context(llm.clone());

    let input = AnalysisInput::new(site.uri()).with_slides(slides(3));
    let state = run_analysis(input, &ctx).await;

    let pages: Vec<u32> = state
        .deck_structured
        .as_ref()
        .unwrap()
        .iter()
        .map(|s| s.page)
        .collect();
    assert_eq!(pages, vec![1, 2, 3]);
    assert_eq!(llm.calls_matching(VISION), 3);
}

#[tokio::test]
async fn test_failed_slide_is_dropped() {
    let site = website().await;
    let llm = Arc::new(
        MockLlm::new()
            .fail("Analyze slide 2:")
            .respond(VISION, SLIDE_JSON)
            .respond(EVIDENCE, EVIDENCE_JSON)
            .respond(CORE, CORE_JSON)
            .respond(BUSINESS, BUSINESS_JSON)
            .respond(MARKET, MARKET_JSON)
            .respond(RISK, RISK_JSON)
            .respond(MEMO, MEMO_TEXT),
    );
    let ctx = context(llm);

    let input = AnalysisInput::new(site.uri()).with_slides(slides(3));
    let state = run_analysis(input, &ctx).await;

    let pages: Vec<u32> = state
        .deck_structured
        .as_ref()
        .unwrap()
        .iter()
        .map(|s| s.page)
        .collect();
    assert_eq!(pages, vec![1, 3]);
    assert!(state.errors.is_empty(), "unexpected errors: {:?}", state.errors);
}

#[tokio::test]
async fn test_all_slides_failing_records_vision_error() {
    let site = website().await;
    let llm = Arc::new(
        MockLlm::new()
            .fail(VISION)
            .respond(EVIDENCE, EVIDENCE_JSON)
            .respond(CORE, CORE_JSON)
            .respond(BUSINESS, BUSINESS_JSON)
            .respond(MARKET, MARKET_JSON)
            .respond(RISK, RISK_JSON)
            .respond(MEMO, MEMO_TEXT),
    );
    let ctx = context(llm);

    let input = AnalysisInput::new(site.uri()).with_slides(slides(2));
    let state = run_analysis(input, &ctx).await;

    assert_eq!(state.deck_structured, Some(vec![]));
    assert_eq!(state.errors.len(), 1);
    assert!(state.errors[0].starts_with("deck_vision failed:"));
    // The website alone still carries the run
    assert!(state.final_analysis.is_some());
}

// ============================================================================
// Streaming
// ============================================================================

#[tokio::test]
async fn test_stream_reports_every_stage_in_order() {
    let site = website().await;
    let llm = Arc::new(scripted_llm());
    let ctx = context(llm);

    let (tx, mut rx) = mpsc::channel(16);
    let state = stream_analysis(AnalysisInput::new(site.uri()), &ctx, tx).await;

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }

    let stages: Vec<Stage> = events.iter().map(|e| e.stage).collect();
    assert_eq!(
        stages,
        vec![
            Stage::Ingest,
            Stage::Vision,
            Stage::Evidence,
            Stage::Analysis,
            Stage::Risk,
            Stage::Merge,
            Stage::Memo,
        ]
    );
    let progress: Vec<u8> = events.iter().map(|e| e.progress).collect();
    assert_eq!(progress, vec![15, 30, 45, 65, 80, 90, 100]);
    assert!(events.iter().all(|e| e.errors_so_far == 0));
    assert!(state.memo.is_some());
}

#[tokio::test]
async fn test_stream_survives_dropped_receiver() {
    let site = website().await;
    let ctx = context(Arc::new(scripted_llm()));

    let (tx, rx) = mpsc::channel(1);
    drop(rx);

    let state = stream_analysis(AnalysisInput::new(site.uri()), &ctx, tx).await;
    assert!(state.final_analysis.is_some());
}
