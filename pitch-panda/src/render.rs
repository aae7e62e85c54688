//! Markdown report rendering
//!
//! Works on partial state: a section whose stage failed renders as
//! "Not available" instead of being dropped.

use std::collections::BTreeMap;
use std::fmt::Write;

use crate::pipeline::StartupState;
use crate::schemas::{
    Business, Competition, Core, Evidence, ExtraContextData, Market, Risk, RiskItem, Severity,
};
use crate::utils::{get_domain, truncate_chars};

const ONELINER_NOTE_CHARS: usize = 180;
const NOT_AVAILABLE: &str = "_Not available._";

fn bullets<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let lines: Vec<String> = items
        .into_iter()
        .map(|item| format!("- {}", item.as_ref()))
        .collect();
    if lines.is_empty() {
        "- None".to_string()
    } else {
        lines.join("\n")
    }
}

fn or_unknown(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("Unknown")
}

/// Cut to at most `max_chars`, ellipsis included
fn clip(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        truncate_chars(text, max_chars.saturating_sub(1))
    }
}

/// One line per competitor: `name: description; differentiation`
pub fn render_competition_oneliners(competition: &Competition) -> String {
    if competition.competitors.is_empty() {
        return "(no competitors found)".to_string();
    }

    competition
        .competitors
        .iter()
        .map(|c| {
            let name = if c.name.trim().is_empty() { "Unknown" } else { c.name.trim() };
            let description = c
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or("n/a");
            let note = c.differentiation.as_deref().unwrap_or("n/a");
            format!("{}: {}; {}", name, description.trim(), clip(note, ONELINER_NOTE_CHARS))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_core(out: &mut String, core: Option<&Core>) {
    let Some(core) = core else {
        for heading in ["Problem", "Solution", "Value Proposition"] {
            let _ = writeln!(out, "## {}\n{}\n", heading, NOT_AVAILABLE);
        }
        return;
    };

    let p = &core.problem;
    let _ = writeln!(
        out,
        "## Problem\n**{}**\n\n{}\n\n**Target users:** {}\n\n**Pain points**\n{}\n",
        p.one_liner,
        p.details,
        or_unknown(Some(p.target_users.as_str())),
        bullets(&p.pain_points)
    );

    let s = &core.solution;
    let _ = writeln!(
        out,
        "## Solution\n**{}**\n\n{}\n\n**Features**\n{}\n",
        s.one_liner,
        s.details,
        bullets(&s.features)
    );

    let v = &core.value_proposition;
    let _ = writeln!(
        out,
        "## Value Proposition\n{}\n\n**Key benefits**\n{}\n",
        v.summary,
        bullets(&v.key_benefits)
    );
}

fn sized(value: Option<&str>, explicit: bool) -> String {
    match value {
        Some(v) if explicit => v.to_string(),
        Some(v) => format!("{} (estimate, not explicitly labelled)", v),
        None => "Unknown".to_string(),
    }
}

fn render_market(out: &mut String, market: Option<&Market>) {
    let _ = writeln!(out, "## Market");
    let Some(m) = market else {
        let _ = writeln!(out, "{}\n", NOT_AVAILABLE);
        return;
    };

    let _ = writeln!(
        out,
        "**TAM:** {}  \n**SAM:** {}  \n**SOM:** {}\n\n{}\n\n**Growth trends**\n{}\n\n**Target customers:** {}\n",
        sized(m.tam.as_deref(), m.tam_is_explicit),
        sized(m.sam.as_deref(), m.sam_is_explicit),
        sized(m.som.as_deref(), m.som_is_explicit),
        m.market_size_summary,
        bullets(&m.growth_trends),
        or_unknown(Some(m.target_customers.as_str()))
    );

    if let Some(size) = &m.industry_investment_size {
        let _ = writeln!(
            out,
            "**Industry investment:** {} ({})\n",
            size,
            or_unknown(m.industry_investment_label.as_deref())
        );
    }
    if let Some(spend) = &m.spend_in_category {
        let _ = writeln!(out, "**Spend in category:** {}\n", spend);
    }
    if let Some(notes) = &m.market_notes {
        let _ = writeln!(out, "_{}_\n", notes);
    }
}

fn render_business(out: &mut String, business: Option<&Business>) {
    let Some(b) = business else {
        for heading in ["Team", "Traction", "Competition", "Funding", "Business Model"] {
            let _ = writeln!(out, "## {}\n{}\n", heading, NOT_AVAILABLE);
        }
        return;
    };

    let members = b.team.members.iter().map(|m| {
        let mut line = format!("**{}** ({})", m.name, m.role);
        if let Some(background) = &m.background {
            let _ = write!(line, ": {}", background);
        }
        line
    });
    let _ = writeln!(
        out,
        "## Team\n**Size:** {}\n\n{}\n",
        or_unknown(b.team.size.as_deref()),
        bullets(members)
    );
    if let Some(expertise) = &b.team.collective_expertise {
        let _ = writeln!(out, "**Collective expertise:** {}\n", expertise);
    }

    let metrics = b.traction.metrics.iter().map(|m| {
        let mut line = format!("{}: {}", m.metric, m.value);
        if let Some(timeframe) = &m.timeframe {
            let _ = write!(line, " ({})", timeframe);
        }
        if let Some(trend) = &m.trend {
            let _ = write!(line, ", {}", trend);
        }
        line
    });
    let partnerships = b
        .traction
        .partnerships
        .iter()
        .map(|p| format!("{} ({})", p.name, p.kind));
    let _ = writeln!(
        out,
        "## Traction\n**Metrics**\n{}\n\n**Partnerships**\n{}\n\n**Milestones**\n{}\n",
        bullets(metrics),
        bullets(partnerships),
        bullets(&b.traction.milestones)
    );

    let _ = writeln!(
        out,
        "## Competition\n**Positioning:** {}\n\n{}\n",
        or_unknown(Some(b.competition.positioning.as_str())),
        render_competition_oneliners(&b.competition)
    );
    if let Some(notes) = &b.competition.notes {
        let _ = writeln!(out, "_{}_\n", notes);
    }

    let rounds = b.funding.rounds.iter().map(|r| {
        let mut line = r.round_type.clone();
        if let Some(amount) = &r.amount {
            let _ = write!(line, ": {}", amount);
        }
        if !r.investors.is_empty() {
            let _ = write!(line, " from {}", r.investors.join(", "));
        }
        if let Some(date) = &r.date {
            let _ = write!(line, " ({})", date);
        }
        line
    });
    let _ = writeln!(
        out,
        "## Funding\n**Status:** {}  \n**Total raised:** {}\n\n{}\n",
        or_unknown(Some(b.funding.status.as_str())),
        or_unknown(b.funding.total_raised.as_deref()),
        bullets(rounds)
    );

    let model = &b.business_model;
    let _ = writeln!(
        out,
        "## Business Model\n{}\n\n**Monetization**\n{}\n\n**Pricing:** {}\n",
        model.summary.as_deref().unwrap_or("Not clearly defined"),
        bullets(model.monetization.as_deref().unwrap_or_default()),
        or_unknown(model.pricing.as_deref())
    );
}

fn severity_rank(item: &RiskItem) -> Option<Severity> {
    item.severity
}

/// Categories ordered by their most severe risk, then by name
fn group_risks(risks: &[RiskItem]) -> Vec<(&str, Vec<&RiskItem>)> {
    let mut groups: BTreeMap<&str, Vec<&RiskItem>> = BTreeMap::new();
    for risk in risks {
        groups.entry(risk.category.as_str()).or_default().push(risk);
    }

    let mut groups: Vec<(&str, Vec<&RiskItem>)> = groups.into_iter().collect();
    for (_, items) in &mut groups {
        items.sort_by(|a, b| severity_rank(b).cmp(&severity_rank(a)));
    }
    groups.sort_by(|(a_name, a), (b_name, b)| {
        let a_max = a.first().and_then(|r| severity_rank(r));
        let b_max = b.first().and_then(|r| severity_rank(r));
        b_max.cmp(&a_max).then_with(|| a_name.cmp(b_name))
    });
    groups
}

fn render_risks(out: &mut String, risk: Option<&Risk>) {
    let _ = writeln!(out, "## Risks");
    let Some(risk) = risk else {
        let _ = writeln!(out, "{}\n", NOT_AVAILABLE);
        let _ = writeln!(out, "## Missing Information\n{}\n", NOT_AVAILABLE);
        return;
    };

    if risk.risks.is_empty() {
        let _ = writeln!(out, "- None\n");
    }
    for (category, items) in group_risks(&risk.risks) {
        let lines = items.iter().map(|r| match r.severity {
            Some(severity) => format!("**[{}]** {}", severity.as_str(), r.description),
            None => r.description.clone(),
        });
        let _ = writeln!(out, "### {}\n{}\n", category, bullets(lines));
    }

    let _ = writeln!(out, "## Missing Information\n{}\n", bullets(&risk.missing_info));
}

fn render_private_context(out: &mut String, extra: &ExtraContextData) {
    let mut facts = Vec::new();
    let mut fact = |label: &str, value: &Option<String>, explicit: bool| {
        if let (Some(value), true) = (value, explicit) {
            facts.push(format!("**{}:** {}", label, value));
        }
    };
    fact("Founded", &extra.founded_year, true);
    fact("MRR", &extra.mrr, extra.mrr_is_explicit);
    fact("ARR", &extra.arr, extra.arr_is_explicit);
    fact("Total raised", &extra.funding_raised_total, extra.funding_raised_is_explicit);
    fact("Current round", &extra.current_funding_round, true);
    fact("Target raise", &extra.target_funding_amount, true);
    fact("Burn rate", &extra.burn_rate, true);
    fact("Runway", &extra.runway, true);
    fact("Valuation", &extra.valuation, true);
    fact("TAM (claimed)", &extra.tam_claimed, extra.tam_is_explicit);
    fact("SAM (claimed)", &extra.sam_claimed, extra.sam_is_explicit);
    fact("SOM (claimed)", &extra.som_claimed, extra.som_is_explicit);
    fact("Team size", &extra.team_size_claimed, true);
    fact("Customers", &extra.customer_count, true);
    fact("Users", &extra.user_count, true);
    fact("Retention", &extra.retention_rate, true);
    fact("Churn", &extra.churn_rate, true);
    fact("LTV", &extra.ltv, true);
    fact("CAC", &extra.cac, true);
    fact("LOIs", &extra.loi_count, true);
    fact("LOI value", &extra.loi_value, true);

    let _ = writeln!(out, "## Private Context Highlights\n{}\n", bullets(&facts));

    if !extra.competition_claims.is_empty() {
        let _ = writeln!(
            out,
            "**Competition claims (self-reported)**\n{}\n",
            bullets(&extra.competition_claims)
        );
    }
    if !extra.unclassified_values.is_empty() {
        let values = extra.unclassified_values.iter().map(|u| {
            format!(
                "{} ({}) - {}",
                u.value,
                u.context.as_deref().unwrap_or("no context"),
                u.reason_unclassified
            )
        });
        let _ = writeln!(out, "**Unclassified values**\n{}\n", bullets(values));
    }
}

fn render_evidence(out: &mut String, summary: Option<&str>, evidence: Option<&Evidence>) {
    let text = summary
        .map(str::to_string)
        .or_else(|| evidence.map(Evidence::summary))
        .unwrap_or_else(|| "No evidence available".to_string());
    let _ = writeln!(out, "## Evidence Summary\n{}\n", text);
}

/// Render the whole analysis as a markdown document
pub fn render_report(state: &StartupState) -> String {
    let mut out = String::new();
    let analysis = state.final_analysis.as_ref();

    let _ = writeln!(out, "# Startup Analysis: {}\n", get_domain(&state.url));
    let _ = writeln!(out, "**Website:** {}  ", state.url);
    if let Some(analysis) = analysis {
        let _ = writeln!(out, "**Analyzed:** {}  ", analysis.analyzed_at);
    }
    let _ = writeln!(out, "**Analysis ID:** {}\n", state.startup_id);

    render_core(&mut out, state.core.as_ref());
    render_market(&mut out, state.market.as_ref());
    render_business(&mut out, state.business.as_ref());
    render_risks(&mut out, state.risk.as_ref());

    if let Some(extra) = state.extra_context.as_ref().filter(|e| !e.is_empty()) {
        render_private_context(&mut out, extra);
    }

    render_evidence(
        &mut out,
        analysis.and_then(|a| a.evidence_summary.as_deref()),
        state.evidence.as_ref(),
    );

    if let Some(memo) = &state.memo {
        let _ = writeln!(out, "## Investment Memo\n\n{}\n", memo.trim());
    }

    if !state.errors.is_empty() {
        let _ = writeln!(out, "## Pipeline Errors\n{}\n", bullets(&state.errors));
    }

    out.trim_end().to_string() + "\n"
}
