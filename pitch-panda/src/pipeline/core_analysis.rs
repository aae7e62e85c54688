//! Problem, solution and value proposition synthesis

use anyhow::{anyhow, Context, Result};
use pitch_panda_sdk::log_node_progress;

use super::node::numbered;
use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::complete_json;
use crate::schemas::{Core, Evidence, EvidenceItem};

const CORE_ANALYSIS_PROMPT: &str = r#"You are a VC analyst synthesizing the core of a startup from raw evidence.

Describe:
1. Problem: what problem is solved, who has it, the pain points.
2. Solution: the product or service, how it works, key features.
3. Value proposition: the unique value delivered and why it differs.

Guidelines:
- One-liners are one sentence; details are 2-4 sentences.
- Resolve contradictions where possible and note the ones you cannot.
- Stay within the evidence. If it is thin, say so briefly in the details.

Return a JSON object:
{"problem": {"one_liner", "details", "pain_points": [], "target_users"},
 "solution": {"one_liner", "details", "features": []},
 "value_proposition": {"summary", "key_benefits": []}}"#;

fn cited(items: &[EvidenceItem]) -> String {
    numbered(
        items
            .iter()
            .map(|e| format!("{} [Source: {}]", e.text, e.source.cite())),
    )
}

fn core_evidence_context(evidence: &Evidence) -> String {
    let mut sections = Vec::new();

    if !evidence.problem_snippets.is_empty() {
        sections.push(format!("Problem evidence:\n{}", cited(&evidence.problem_snippets)));
    }
    if !evidence.solution_snippets.is_empty() {
        sections.push(format!("Solution evidence:\n{}", cited(&evidence.solution_snippets)));
    }
    if !evidence.value_prop_snippets.is_empty() {
        sections.push(format!(
            "Value proposition evidence:\n{}",
            cited(&evidence.value_prop_snippets)
        ));
    }
    if !evidence.market_snippets.is_empty() {
        sections.push(format!(
            "Market context:\n{}",
            numbered(evidence.market_snippets.iter().map(|e| e.text.as_str()))
        ));
    }
    if !evidence.claims.is_empty() {
        sections.push(format!(
            "Claims:\n{}",
            numbered(evidence.claims.iter().take(5).map(|c| c.text.as_str()))
        ));
    }

    if sections.is_empty() {
        "No evidence available.".to_string()
    } else {
        sections.join("\n\n")
    }
}

pub async fn analyze_core(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let evidence = state
        .evidence
        .as_ref()
        .context("No evidence available for core analysis")?;

    let request = ctx.json_request(
        CORE_ANALYSIS_PROMPT,
        format!(
            "Synthesize the core problem, solution, and value proposition from this evidence:\n\n{}\n\nRespond with JSON.",
            core_evidence_context(evidence)
        ),
    );

    let core: Core = complete_json(ctx.llm.as_ref(), request)
        .await
        .map_err(|e| anyhow!("Failed to synthesize core analysis: {}", e))?;

    log_node_progress!("core_analysis", format!("Problem: {}", core.problem.one_liner));

    Ok(StateUpdate {
        core: Some(core),
        ..Default::default()
    })
}
