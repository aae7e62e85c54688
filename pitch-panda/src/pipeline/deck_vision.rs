//! Stage 2: per-slide vision extraction

use anyhow::{anyhow, bail, Result};
use pitch_panda_sdk::{log_node_progress, log_progress};

use super::batch::{execute_batch, TaskContext};
use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::{complete_json, ChatMessage, ChatRequest, ContentPart, LlmClient};
use crate::schemas::{Slide, SlideImage};

const VISION_MAX_TOKENS: u32 = 4096;

const SLIDE_ANALYSIS_PROMPT: &str = r#"You analyze pitch deck slides for venture capital due diligence.

Extract from the slide image:
1. slide_type: one of problem, solution, team, traction, market, competition, product, roadmap, financials, funding, other
2. title: the main heading, or null
3. main_bullets: the main text points
4. figures: quantitative metrics as {label, value, unit} (e.g. "ARR", "2", "$M")
5. logos: {name, role} where role is customer, partner, investor or competitor when it can be told
6. claims: explicit self-reported statements ("First to market", "Patent pending")
7. visual_structures: charts and diagrams as {type, subject, qualitative_trend}
8. caveats: disclaimers, footnotes, asterisks

Extract only what is visibly shown. Empty arrays are better than guesses.
Respond with a single JSON object with exactly those keys."#;

async fn analyze_slide(
    llm: &dyn LlmClient,
    model: Option<&str>,
    slide: &SlideImage,
) -> Result<Slide> {
    let message = ChatMessage::user_parts(vec![
        ContentPart::text(format!("{}\n\nAnalyze slide {}:", SLIDE_ANALYSIS_PROMPT, slide.page)),
        ContentPart::image(slide.image_data_url.clone()),
    ]);

    let mut request = ChatRequest::new(vec![message]).with_max_tokens(VISION_MAX_TOKENS);
    if let Some(model) = model {
        request = request.with_model(model);
    }

    let mut parsed: Slide = complete_json(llm, request)
        .await
        .map_err(|e| anyhow!("slide {}: {}", slide.page, e))?;

    // The model's own page number is not trusted
    parsed.page = slide.page;
    Ok(parsed)
}

/// Analyze every slide with bounded concurrency.
///
/// A slide that fails is logged and left out; the node only fails when no
/// slide could be analyzed at all.
pub async fn deck_vision(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let slides = state.deck_slides.clone().unwrap_or_default();
    if slides.is_empty() {
        return Ok(StateUpdate {
            deck_structured: Some(Vec::new()),
            ..Default::default()
        });
    }

    let llm = ctx.llm.as_ref();
    let model = ctx.options.vision_model.as_deref();
    let total = slides.len();

    let results = execute_batch(
        slides,
        ctx.options.vision_concurrency,
        |slide, task: TaskContext| async move {
            let result = analyze_slide(llm, model, &slide).await;
            log_progress!(task.task_number, task.total_tasks, "slides");
            result
        },
    )
    .await;

    let mut structured = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for (_, result) in results {
        match result {
            Ok(slide) => structured.push(slide),
            Err(e) => {
                tracing::warn!("Dropping slide after vision failure: {:#}", e);
                failures.push(format!("{:#}", e));
            }
        }
    }

    if structured.is_empty() {
        bail!(
            "all {} slide(s) failed vision analysis: {}",
            total,
            failures.join("; ")
        );
    }

    structured.sort_by_key(|s| s.page);

    let types: Vec<String> = structured
        .iter()
        .map(|s| format!("{}:{}", s.page, s.slide_type.as_str()))
        .collect();
    log_node_progress!(
        "deck_vision",
        format!("Analyzed {}/{} slides ({})", structured.len(), total, types.join(", "))
    );

    Ok(StateUpdate {
        deck_structured: Some(structured),
        ..Default::default()
    })
}
