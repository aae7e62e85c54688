//! Stage 5: risks and missing information

use anyhow::{anyhow, bail, Result};
use pitch_panda_sdk::log_node_progress;
use std::collections::BTreeMap;

use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::complete_json;
use crate::schemas::{Business, Core, Evidence, Market, Risk};

const RISK_ANALYSIS_PROMPT: &str = r#"You are a neutral VC analyst identifying investment risks and information gaps.

Stay objective: base risks on facts and gaps in the data, do not exaggerate or
downplay, and state them plainly ("No revenue data provided").

Identify:
1. risks, each with a category (market, team, competition, technology,
   business_model, execution, regulatory, financial), a description and a
   severity of low, medium, high or critical.
2. missing_info: specific questions an investor would still need answered.

Focus on material risks. Every startup has some.

Return a JSON object:
{"risks": [{"category", "description", "severity"}], "missing_info": []}"#;

fn risk_context(
    core: &Core,
    business: &Business,
    market: Option<&Market>,
    evidence: Option<&Evidence>,
) -> String {
    let mut sections = vec![format!(
        "Problem/Solution:\nProblem: {}\nSolution: {}\nValue Prop: {}",
        core.problem.one_liner, core.solution.one_liner, core.value_proposition.summary
    )];

    let team = &business.team;
    let members: Vec<String> = team
        .members
        .iter()
        .map(|m| format!("- {} ({})", m.name, m.role))
        .collect();
    sections.push(format!(
        "Team:\nSize: {}\nMembers: {} key members identified\n{}",
        team.size.as_deref().unwrap_or("Unknown"),
        team.members.len(),
        members.join("\n")
    ));

    let traction = &business.traction;
    let metrics = if traction.metrics.is_empty() {
        "None reported".to_string()
    } else {
        traction
            .metrics
            .iter()
            .map(|m| format!("{}: {}", m.metric, m.value))
            .collect::<Vec<_>>()
            .join(", ")
    };
    sections.push(format!(
        "Traction:\nMetrics: {}\nPartnerships: {}\nMilestones: {}",
        metrics,
        traction.partnerships.len(),
        traction.milestones.len()
    ));

    sections.push(format!(
        "Competition:\nCompetitors: {} identified\nPositioning: {}",
        business.competition.competitors.len(),
        business.competition.positioning
    ));

    sections.push(format!(
        "Funding:\nRounds: {}\nStatus: {}",
        business.funding.rounds.len(),
        business.funding.status
    ));

    let model = &business.business_model;
    sections.push(format!(
        "Business Model:\n{}\nMonetization: {}",
        model.summary.as_deref().unwrap_or("Not clearly defined"),
        model
            .monetization
            .as_ref()
            .filter(|m| !m.is_empty())
            .map(|m| m.join(", "))
            .unwrap_or_else(|| "Not specified".to_string())
    ));

    if let Some(market) = market {
        sections.push(format!(
            "Market:\nTAM: {}{}\nSummary: {}",
            market.tam.as_deref().unwrap_or("Unknown"),
            if market.tam_is_explicit { "" } else { " (not explicitly labelled)" },
            market.market_size_summary
        ));
    }

    if let Some(evidence) = evidence {
        sections.push(format!(
            "Evidence Coverage:\nProblem snippets: {}\nSolution snippets: {}\nTeam facts: {}\n\
             Traction facts: {}\nFunding facts: {}\nCompetition snippets: {}\nMarket snippets: {}",
            evidence.problem_snippets.len(),
            evidence.solution_snippets.len(),
            evidence.team_facts.len(),
            evidence.traction_facts.len(),
            evidence.funding_facts.len(),
            evidence.competition_snippets.len(),
            evidence.market_snippets.len()
        ));
    }

    sections.join("\n\n")
}

pub async fn analyze_risk(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let (Some(core), Some(business)) = (&state.core, &state.business) else {
        bail!("Core and business analysis required for risk assessment");
    };

    let request = ctx.json_request(
        RISK_ANALYSIS_PROMPT,
        format!(
            "Identify investment risks and missing critical information:\n\n{}\n\n\
             Respond with JSON: categorized risks with severity levels and a list of missing information.",
            risk_context(core, business, state.market.as_ref(), state.evidence.as_ref())
        ),
    );

    let risk: Risk = complete_json(ctx.llm.as_ref(), request)
        .await
        .map_err(|e| anyhow!("Failed to analyze risks: {}", e))?;

    let mut categories: BTreeMap<&str, usize> = BTreeMap::new();
    for item in &risk.risks {
        *categories.entry(item.category.as_str()).or_default() += 1;
    }
    tracing::debug!(?categories, "risk categories");
    log_node_progress!(
        "risk_analysis",
        format!(
            "{} risk(s), {} missing info item(s)",
            risk.risks.len(),
            risk.missing_info.len()
        )
    );

    Ok(StateUpdate {
        risk: Some(risk),
        ..Default::default()
    })
}
