//! Team, traction, competition, funding and business model

use anyhow::{anyhow, Context, Result};
use pitch_panda_sdk::log_node_progress;

use super::node::numbered;
use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::complete_json;
use crate::schemas::{Business, Evidence, ExtraContextData};

const BUSINESS_ANALYSIS_PROMPT: &str = r#"You are a VC analyst assessing startup business fundamentals.

From the evidence, build:
1. Team: key members, roles, backgrounds and strengths.
2. Traction: metrics with exact values and timeframes, partnerships, milestones.
3. Competition: named competitors and how the startup positions itself.
4. Funding: rounds in chronological order, amounts, investors, current status.
5. Business model: concrete revenue streams and pricing.

Be factual. Use empty lists for missing information and do not speculate.
Private-context figures are only usable when they carry an explicit label.

Return a JSON object:
{"team": {"size", "members": [{"name", "role", "background", "strengths": [], "source_ids": []}], "collective_expertise"},
 "traction": {"metrics": [{"metric", "value", "trend", "timeframe"}], "partnerships": [{"name", "type", "details"}], "milestones": []},
 "competition": {"competitors": [{"name", "description", "differentiation"}], "positioning", "notes"},
 "funding": {"rounds": [{"type", "amount", "investors": [], "date", "status"}], "total_raised", "status", "notes"},
 "business_model": {"summary", "monetization": [], "pricing"}}"#;

fn business_evidence_context(evidence: &Evidence) -> String {
    let mut sections = Vec::new();

    if !evidence.team_facts.is_empty() {
        sections.push(format!(
            "Team:\n{}",
            numbered(evidence.team_facts.iter().map(|t| {
                let mut line = t.name.clone();
                if let Some(role) = &t.role {
                    line.push_str(&format!(" - {}", role));
                }
                if let Some(background) = &t.background {
                    line.push_str(&format!(": {}", background));
                }
                format!("{} [Source: {}]", line, t.source.cite())
            }))
        ));
    }

    if !evidence.traction_facts.is_empty() {
        sections.push(format!(
            "Traction:\n{}",
            numbered(evidence.traction_facts.iter().map(|t| {
                let mut line = format!(
                    "{}: {}",
                    t.metric_type,
                    t.value.as_deref().unwrap_or("n/a")
                );
                if let Some(timeframe) = &t.timeframe {
                    line.push_str(&format!(" ({})", timeframe));
                }
                if let Some(context) = &t.context {
                    line.push_str(&format!(" - {}", context));
                }
                format!("{} [Source: {}]", line, t.source.cite())
            }))
        ));
    }

    if !evidence.competition_snippets.is_empty() {
        sections.push(format!(
            "Competition:\n{}",
            numbered(
                evidence
                    .competition_snippets
                    .iter()
                    .map(|e| format!("{} [Source: {}]", e.text, e.source.cite()))
            )
        ));
    }

    if !evidence.funding_facts.is_empty() {
        sections.push(format!(
            "Funding:\n{}",
            numbered(evidence.funding_facts.iter().map(|f| {
                let mut line = f.round_type.clone().unwrap_or_else(|| "Round".to_string());
                if let Some(amount) = &f.amount {
                    line.push_str(&format!(": {}", amount));
                }
                if !f.investors.is_empty() {
                    line.push_str(&format!(" from {}", f.investors.join(", ")));
                }
                if let Some(date) = &f.date {
                    line.push_str(&format!(" ({})", date));
                }
                format!("{} [Source: {}]", line, f.source.cite())
            }))
        ));
    }

    if !evidence.business_model_snippets.is_empty() {
        sections.push(format!(
            "Business model:\n{}",
            numbered(
                evidence
                    .business_model_snippets
                    .iter()
                    .map(|e| format!("{} [Source: {}]", e.text, e.source.cite()))
            )
        ));
    }

    if sections.is_empty() {
        "No evidence available.".to_string()
    } else {
        sections.join("\n\n")
    }
}

/// Explicitly labelled private facts relevant to the business picture
fn private_business_context(data: &ExtraContextData) -> Option<String> {
    let mut lines = Vec::new();

    let mut push = |label: &str, value: &Option<String>| {
        if let Some(value) = value {
            lines.push(format!("- {}: {}", label, value));
        }
    };
    if data.mrr_is_explicit {
        push("MRR", &data.mrr);
    }
    if data.arr_is_explicit {
        push("ARR", &data.arr);
    }
    if data.funding_raised_is_explicit {
        push("Total raised", &data.funding_raised_total);
    }
    push("Current round", &data.current_funding_round);
    push("Target raise", &data.target_funding_amount);
    push("Burn rate", &data.burn_rate);
    push("Runway", &data.runway);
    push("Valuation", &data.valuation);
    push("Team size", &data.team_size_claimed);
    push("Customers", &data.customer_count);
    push("Users", &data.user_count);
    push("Retention", &data.retention_rate);
    push("Churn", &data.churn_rate);
    push("LTV", &data.ltv);
    push("CAC", &data.cac);
    push("LOIs", &data.loi_count);
    push("LOI value", &data.loi_value);

    for round in &data.funding_rounds {
        lines.push(format!(
            "- Funding round ({}): {} {}",
            round.source_label.as_deref().unwrap_or("labelled"),
            round.round_type.as_deref().unwrap_or("Round"),
            round.amount.as_deref().unwrap_or("")
        ));
    }
    for member in &data.team_members {
        lines.push(format!(
            "- Team member: {} ({})",
            member.name,
            member.role.as_deref().unwrap_or("role n/a")
        ));
    }
    for claim in &data.competition_claims {
        lines.push(format!("- Competition claim: {}", claim));
    }

    (!lines.is_empty()).then(|| lines.join("\n"))
}

pub async fn analyze_business(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let evidence = state
        .evidence
        .as_ref()
        .context("No evidence available for business analysis")?;

    let mut user = format!(
        "Analyze the business fundamentals from the following evidence:\n\n{}",
        business_evidence_context(evidence)
    );
    if let Some(private) = state.extra_context.as_ref().and_then(private_business_context) {
        user.push_str(&format!("\n\nPRIVATE CONTEXT (user-supplied):\n{}", private));
    }
    user.push_str("\n\nRespond with JSON covering team, traction, competition, funding, and business model.");

    let business: Business = complete_json(ctx.llm.as_ref(), ctx.json_request(BUSINESS_ANALYSIS_PROMPT, user))
        .await
        .map_err(|e| anyhow!("Failed to analyze business: {}", e))?;

    log_node_progress!(
        "business_analysis",
        format!(
            "{} team member(s), {} metric(s), {} competitor(s), {} funding round(s)",
            business.team.members.len(),
            business.traction.metrics.len(),
            business.competition.competitors.len(),
            business.funding.rounds.len()
        )
    );

    Ok(StateUpdate {
        business: Some(business),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_private_context_skips_unlabelled_metrics() {
        let data = ExtraContextData {
            mrr: Some("$50K".into()),
            mrr_is_explicit: false,
            arr: Some("$600K".into()),
            arr_is_explicit: true,
            runway: Some("18 months".into()),
            ..Default::default()
        };

        let text = private_business_context(&data).unwrap();
        assert!(!text.contains("MRR"));
        assert!(text.contains("- ARR: $600K"));
        assert!(text.contains("- Runway: 18 months"));
        assert!(private_business_context(&ExtraContextData::default()).is_none());
    }
}
