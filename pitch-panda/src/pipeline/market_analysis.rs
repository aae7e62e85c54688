//! Market sizing, trends and target customers

use anyhow::{anyhow, Context, Result};
use pitch_panda_sdk::log_node_progress;

use super::labels::enforce_market_labels;
use super::node::{from_wrapped, numbered};
use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::complete_json;
use crate::schemas::{Evidence, ExtraContextData, Market};

const MARKET_PROMPT: &str = r#"You are a market analyst sizing the opportunity for a startup.

Estimate TAM/SAM/SOM, identify growth trends and describe the target customers.

Labelling rules:
- Never treat a number as TAM, SAM or SOM unless the material uses those labels
  ("TAM", "Total Addressable Market", "SAM", "Serviceable Addressable Market",
  "SOM", "Serviceable Obtainable Market").
- Industry spend, "market size" or "$XB market" without those labels is not TAM.
  Put it in industry_investment_size or spend_in_category with its exact label and
  explain in market_notes. Set is_claimed_TAM to false when it was presented as TAM.
- When you estimate a figure yourself, set the matching *_is_explicit to false.

Return a JSON object:
{"tam", "tam_label", "tam_is_explicit", "sam", "sam_label", "sam_is_explicit",
 "som", "som_label", "som_is_explicit",
 "market_size_summary": "2-4 sentences",
 "growth_trends": [],
 "target_customers": "2-3 sentences on the ideal customer profile",
 "industry_investment_size", "industry_investment_label",
 "spend_in_category", "spend_in_category_label",
 "market_notes", "is_claimed_TAM", "sources": []}"#;

fn market_evidence_context(evidence: &Evidence) -> String {
    let mut sections = vec![format!(
        "Market evidence:\n{}",
        numbered(
            evidence
                .market_snippets
                .iter()
                .map(|e| format!("{} [Source: {}]", e.text, e.source.cite()))
        )
    )];

    if let Some(problem) = evidence.problem_snippets.first() {
        sections.push(format!("Problem: {}", problem.text));
    }
    if let Some(solution) = evidence.solution_snippets.first() {
        sections.push(format!("Solution: {}", solution.text));
    }
    if !evidence.competition_snippets.is_empty() {
        sections.push(format!(
            "Competition:\n{}",
            numbered(evidence.competition_snippets.iter().map(|e| e.text.as_str()))
        ));
    }

    sections.join("\n\n")
}

fn private_market_context(data: &ExtraContextData) -> Option<String> {
    let mut lines = Vec::new();

    let claims = [
        ("TAM", &data.tam_claimed, &data.tam_label),
        ("SAM", &data.sam_claimed, &data.sam_label),
        ("SOM", &data.som_claimed, &data.som_label),
        (
            "Industry investment",
            &data.industry_investment_size,
            &data.industry_investment_label,
        ),
    ];
    for (name, value, label) in claims {
        if let Some(value) = value {
            lines.push(format!(
                "- {} claimed: {} (label: {})",
                name,
                value,
                label.as_deref().unwrap_or("none")
            ));
        }
    }
    if let Some(spend) = &data.spend_in_category {
        lines.push(format!("- Spend in category: {}", spend));
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

pub async fn analyze_market(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let evidence = state
        .evidence
        .as_ref()
        .context("No evidence available for market analysis")?;

    let mut user = format!(
        "Startup URL: {}\n\n{}",
        state.url,
        market_evidence_context(evidence)
    );
    if let Some(private) = state.extra_context.as_ref().and_then(private_market_context) {
        user.push_str(&format!(
            "\n\nPRIVATE CONTEXT (company claims, use with caution):\n{}",
            private
        ));
    }
    user.push_str("\n\nRespond with the market analysis as JSON.");

    let value: serde_json::Value = complete_json(ctx.llm.as_ref(), ctx.json_request(MARKET_PROMPT, user))
        .await
        .map_err(|e| anyhow!("Failed to analyze market: {}", e))?;
    let market: Market = from_wrapped(value, "market")?;
    let market = enforce_market_labels(market);

    log_node_progress!(
        "market_analysis",
        format!("TAM: {}", market.tam.as_deref().unwrap_or("unknown"))
    );

    Ok(StateUpdate {
        market: Some(market),
        ..Default::default()
    })
}
