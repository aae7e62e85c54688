//! Stage 7: neutral investment memo from the merged analysis

use anyhow::{anyhow, Context, Result};
use pitch_panda_sdk::log_node_progress;
use std::collections::BTreeMap;

use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::{complete_text, ChatMessage, ChatRequest};
use crate::schemas::StartupAnalysis;

const MEMO_TEMPERATURE: f32 = 0.3;
const MEMO_MAX_TOKENS: u32 = 2000;

const MEMO_GENERATION_PROMPT: &str = r#"You are a neutral VC analyst writing a factual investment memo in markdown.

Neutrality:
- Report facts as presented. No promotional language or positive spin.
- Avoid superlatives such as "impressive" or "strong" unless quoting.
- Write "Raised $2M", not "Successfully raised $2M"; "Has 100K users", not "Achieved 100K users".

Structure:
1. Executive Summary (2-3 paragraphs): company and URL, one-liner, problem and solution, key metrics, neutral thesis snapshot.
2. The Opportunity: problem, solution, value proposition as claimed, market context.
3. Business Fundamentals: product, business model, traction, go-to-market if present.
4. Team: members with titles and background facts.
5. Competition & Positioning: landscape, claimed differentiation, defensibility.
6. Traction: metrics as reported, partnerships and customers, milestones.
7. Funding: history, current raise, use of funds if mentioned.
8. Investment Considerations: Pros, Cons / Risks, Missing Information / Open Questions (bulleted).
9. Recommendation: one of "Pass", "Track", "Take Intro Call", "Deep Dive" with a 1-2 sentence factual rationale.

Aim for 600-1000 words."#;

fn opt_line(label: &str, value: Option<&str>) -> Option<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .map(|v| format!("{}: {}", label, v))
}

pub(crate) fn memo_context(analysis: &StartupAnalysis) -> String {
    let mut sections = Vec::new();

    let analyzed = chrono::DateTime::parse_from_rfc3339(&analysis.analyzed_at)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| analysis.analyzed_at.clone());
    sections.push(format!("Startup: {}\nAnalyzed: {}", analysis.url, analyzed));

    let problem = &analysis.problem;
    sections.push(format!(
        "PROBLEM:\n{}\n{}\nTarget users: {}\nPain points: {}",
        problem.one_liner,
        problem.details,
        problem.target_users,
        problem.pain_points.join(", ")
    ));

    let solution = &analysis.solution;
    sections.push(format!(
        "SOLUTION:\n{}\n{}\nFeatures: {}",
        solution.one_liner,
        solution.details,
        solution.features.join(", ")
    ));

    sections.push(format!(
        "VALUE PROPOSITION:\n{}\nBenefits: {}",
        analysis.value_proposition.summary,
        analysis.value_proposition.key_benefits.join(", ")
    ));

    if let Some(market) = &analysis.market {
        let mut lines = vec!["MARKET:".to_string(), market.market_size_summary.clone()];
        lines.extend(opt_line("TAM", market.tam.as_deref()));
        lines.extend(opt_line("SAM", market.sam.as_deref()));
        lines.extend(opt_line("SOM", market.som.as_deref()));
        if !market.growth_trends.is_empty() {
            lines.push(format!("Trends: {}", market.growth_trends.join("; ")));
        }
        lines.extend(opt_line("Target customers", Some(market.target_customers.as_str())));
        sections.push(lines.join("\n"));
    }

    let team = &analysis.team;
    let mut team_lines = vec![
        "TEAM:".to_string(),
        format!("Size: {}", team.size.as_deref().unwrap_or("Not specified")),
        "Key members:".to_string(),
    ];
    for member in &team.members {
        let mut line = format!("- {} ({})", member.name, member.role);
        if let Some(background) = &member.background {
            line.push_str(&format!(": {}", background));
        }
        team_lines.push(line);
        if !member.strengths.is_empty() {
            team_lines.push(format!("  Strengths: {}", member.strengths.join(", ")));
        }
    }
    team_lines.extend(opt_line(
        "Collective expertise",
        team.collective_expertise.as_deref(),
    ));
    sections.push(team_lines.join("\n"));

    let traction = &analysis.traction;
    let mut traction_lines = vec!["TRACTION:".to_string(), "Metrics:".to_string()];
    for metric in &traction.metrics {
        let mut line = format!("- {}: {}", metric.metric, metric.value);
        if let Some(trend) = &metric.trend {
            line.push_str(&format!(" ({})", trend));
        }
        if let Some(timeframe) = &metric.timeframe {
            line.push_str(&format!(" [{}]", timeframe));
        }
        traction_lines.push(line);
    }
    traction_lines.push("Partnerships:".to_string());
    for partner in &traction.partnerships {
        let mut line = format!("- {} ({})", partner.name, partner.kind);
        if let Some(details) = &partner.details {
            line.push_str(&format!(": {}", details));
        }
        traction_lines.push(line);
    }
    traction_lines.push("Milestones:".to_string());
    traction_lines.extend(traction.milestones.iter().map(|m| format!("- {}", m)));
    sections.push(traction_lines.join("\n"));

    let competition = &analysis.competition;
    let mut competition_lines = vec![
        "COMPETITION:".to_string(),
        format!("Positioning: {}", competition.positioning),
        "Competitors:".to_string(),
    ];
    for competitor in &competition.competitors {
        let mut line = format!("- {}", competitor.name);
        if let Some(description) = &competitor.description {
            line.push_str(&format!(": {}", description));
        }
        if let Some(diff) = &competitor.differentiation {
            line.push_str(&format!(" | Differentiation: {}", diff));
        }
        competition_lines.push(line);
    }
    competition_lines.extend(opt_line("Notes", competition.notes.as_deref()));
    sections.push(competition_lines.join("\n"));

    let funding = &analysis.funding;
    let mut funding_lines = vec![
        "FUNDING:".to_string(),
        format!("Status: {}", funding.status),
    ];
    funding_lines.extend(opt_line("Total raised", funding.total_raised.as_deref()));
    funding_lines.push("Rounds:".to_string());
    for round in &funding.rounds {
        let mut line = format!("- {}", round.round_type);
        if let Some(amount) = &round.amount {
            line.push_str(&format!(": {}", amount));
        }
        if !round.investors.is_empty() {
            line.push_str(&format!(" from {}", round.investors.join(", ")));
        }
        if let Some(date) = &round.date {
            line.push_str(&format!(" ({})", date));
        }
        funding_lines.push(line);
    }
    funding_lines.extend(opt_line("Notes", funding.notes.as_deref()));
    sections.push(funding_lines.join("\n"));

    let model = &analysis.business_model;
    let mut model_lines = vec![
        "BUSINESS MODEL:".to_string(),
        model
            .summary
            .clone()
            .unwrap_or_else(|| "Not clearly defined".to_string()),
    ];
    if let Some(monetization) = model.monetization.as_ref().filter(|m| !m.is_empty()) {
        model_lines.push(format!("Monetization: {}", monetization.join(", ")));
    }
    model_lines.extend(opt_line("Pricing", model.pricing.as_deref()));
    sections.push(model_lines.join("\n"));

    let mut by_category: BTreeMap<&str, Vec<String>> = BTreeMap::new();
    for risk in &analysis.risks {
        let line = match risk.severity {
            Some(severity) => format!("- {} [{}]", risk.description, severity.as_str()),
            None => format!("- {}", risk.description),
        };
        by_category.entry(risk.category.as_str()).or_default().push(line);
    }
    let risks: Vec<String> = by_category
        .into_iter()
        .map(|(category, lines)| format!("{}:\n{}", category.to_uppercase(), lines.join("\n")))
        .collect();
    sections.push(format!("RISKS:\n{}", risks.join("\n\n")));

    let missing: Vec<String> = analysis.missing_info.iter().map(|m| format!("- {}", m)).collect();
    sections.push(format!("MISSING INFORMATION:\n{}", missing.join("\n")));

    if let Some(extra) = &analysis.extra_context {
        let mut lines = vec!["PRIVATE CONTEXT (user-supplied, explicit labels only):".to_string()];
        if extra.mrr_is_explicit {
            lines.extend(opt_line("MRR", extra.mrr.as_deref()));
        }
        if extra.arr_is_explicit {
            lines.extend(opt_line("ARR", extra.arr.as_deref()));
        }
        if extra.funding_raised_is_explicit {
            lines.extend(opt_line("Total raised", extra.funding_raised_total.as_deref()));
        }
        lines.extend(opt_line("Current round", extra.current_funding_round.as_deref()));
        lines.extend(opt_line("Runway", extra.runway.as_deref()));
        lines.extend(opt_line("Customers", extra.customer_count.as_deref()));
        if lines.len() > 1 {
            sections.push(lines.join("\n"));
        }
    }

    sections.join("\n\n")
}

pub async fn generate_memo(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let analysis = state
        .final_analysis
        .as_ref()
        .context("Final analysis required for memo generation")?;

    let mut request = ChatRequest::new(vec![
        ChatMessage::system(MEMO_GENERATION_PROMPT),
        ChatMessage::user(format!(
            "Generate a professional investment memo from this structured analysis:\n\n{}\n\n\
             Write a clear, balanced, actionable investment memo.",
            memo_context(analysis)
        )),
    ])
    .with_temperature(MEMO_TEMPERATURE)
    .with_max_tokens(MEMO_MAX_TOKENS);
    if let Some(model) = &ctx.options.model {
        request = request.with_model(model.clone());
    }

    let memo = complete_text(ctx.llm.as_ref(), request)
        .await
        .map_err(|e| anyhow!("Failed to generate memo: {}", e))?;

    log_node_progress!("investment_memo", format!("Memo length: {} characters", memo.len()));

    Ok(StateUpdate {
        memo: Some(memo),
        ..Default::default()
    })
}
