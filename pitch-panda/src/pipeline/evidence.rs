//! Stage 3: grounded evidence extraction across website, deck and private context

use anyhow::{anyhow, bail, Result};
use pitch_panda_sdk::log_node_progress;

use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::complete_json;
use crate::schemas::{Evidence, ExtraContextData, Slide, TextChunk};

const EVIDENCE_EXTRACTION_PROMPT: &str = r#"You extract factual evidence from startup materials for VC analysis.

Rules:
1. Extract only explicitly stated facts. No inference, reasoning or assumptions.
2. Leave a list empty when the information is not present.
3. Attach accurate provenance to every item.
4. Keep the exact wording of metrics, claims and quotes.

Return a JSON object with these lists:
- problem_snippets, solution_snippets, value_prop_snippets, competition_snippets,
  market_snippets, business_model_snippets, claims: [{text, source}]
- team_facts: [{name, role, background, source}]
- funding_facts: [{round_type, amount, investors[], date, source}]
- traction_facts: [{metric_type, value, timeframe, context, source}]

`source` is {"kind": "deck_slide", "page": <n>} for slides or
{"kind": "website", "location": "<location>"} for website text, optionally with a short "snippet".
Private context counts as website evidence with location "private_context".

Empty lists are better than invented data."#;

fn website_context(chunks: &[TextChunk]) -> String {
    if chunks.is_empty() {
        return "No website content available.".to_string();
    }

    chunks
        .iter()
        .map(|chunk| format!("[Website: {}]\n{}\n", chunk.location, chunk.text))
        .collect::<Vec<_>>()
        .join("\n---\n")
}

fn slide_context(slide: &Slide) -> String {
    let mut parts = vec![format!(
        "[Slide {} - Type: {}]",
        slide.page,
        slide.slide_type.as_str()
    )];

    if let Some(title) = &slide.title {
        parts.push(format!("Title: {}", title));
    }
    if !slide.main_bullets.is_empty() {
        let bullets: Vec<String> = slide.main_bullets.iter().map(|b| format!("  - {}", b)).collect();
        parts.push(format!("Bullets:\n{}", bullets.join("\n")));
    }
    if !slide.figures.is_empty() {
        let figures: Vec<String> = slide
            .figures
            .iter()
            .map(|f| format!("  - {}: {}{}", f.label, f.value, f.unit.as_deref().unwrap_or("")))
            .collect();
        parts.push(format!("Figures:\n{}", figures.join("\n")));
    }
    if !slide.logos.is_empty() {
        let logos: Vec<String> = slide
            .logos
            .iter()
            .map(|l| match &l.role {
                Some(role) => format!("{} ({})", l.name, role),
                None => l.name.clone(),
            })
            .collect();
        parts.push(format!("Logos: {}", logos.join(", ")));
    }
    if !slide.claims.is_empty() {
        let claims: Vec<String> = slide.claims.iter().map(|c| format!("  - {}", c)).collect();
        parts.push(format!("Claims:\n{}", claims.join("\n")));
    }
    if !slide.visual_structures.is_empty() {
        let visuals: Vec<String> = slide
            .visual_structures
            .iter()
            .map(|v| {
                let mut line = format!("  - {}", v.kind);
                if let Some(subject) = &v.subject {
                    line.push_str(&format!(": {}", subject));
                }
                if let Some(trend) = &v.qualitative_trend {
                    line.push_str(&format!(" ({})", trend));
                }
                line
            })
            .collect();
        parts.push(format!("Visuals:\n{}", visuals.join("\n")));
    }
    if !slide.caveats.is_empty() {
        parts.push(format!("Caveats: {}", slide.caveats.join("; ")));
    }

    parts.join("\n")
}

fn deck_context(slides: &[Slide]) -> String {
    if slides.is_empty() {
        return "No pitch deck available.".to_string();
    }

    slides
        .iter()
        .map(slide_context)
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Summarize private-context facts for the evidence prompt
fn private_context(data: Option<&ExtraContextData>) -> String {
    let Some(data) = data.filter(|d| !d.is_empty()) else {
        return "No private context provided.".to_string();
    };

    serde_json::to_string_pretty(data).unwrap_or_else(|_| "No private context provided.".to_string())
}

pub async fn extract_evidence(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let chunks = state.web_chunks.as_deref().unwrap_or_default();
    let slides = state.deck_structured.as_deref().unwrap_or_default();
    let extra = state.extra_context.as_ref().filter(|d| !d.is_empty());

    if chunks.is_empty() && slides.is_empty() && extra.is_none() {
        bail!("No content available for evidence extraction (website, deck and private context all missing)");
    }

    let request = ctx.json_request(
        EVIDENCE_EXTRACTION_PROMPT,
        format!(
            "Extract all factual evidence from the following startup materials.\n\n\
             WEBSITE CONTENT:\n{}\n\n\
             PITCH DECK SLIDES:\n{}\n\n\
             PRIVATE CONTEXT:\n{}\n\n\
             Return the evidence as JSON with accurate provenance.",
            website_context(chunks),
            deck_context(slides),
            private_context(extra)
        ),
    );

    let evidence: Evidence = complete_json(ctx.llm.as_ref(), request)
        .await
        .map_err(|e| anyhow!("Failed to extract evidence: {}", e))?;

    tracing::debug!(
        problem = evidence.problem_snippets.len(),
        solution = evidence.solution_snippets.len(),
        team = evidence.team_facts.len(),
        traction = evidence.traction_facts.len(),
        funding = evidence.funding_facts.len(),
        competition = evidence.competition_snippets.len(),
        market = evidence.market_snippets.len(),
        "evidence extracted"
    );
    log_node_progress!("evidence_extraction", evidence.summary());

    Ok(StateUpdate {
        evidence: Some(evidence),
        ..Default::default()
    })
}
