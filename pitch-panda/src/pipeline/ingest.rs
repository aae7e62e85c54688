//! Stage 1 ingestion: website crawl and deck validation

use anyhow::{Context, Result};
use pitch_panda_sdk::log_node_progress;

use super::{PipelineContext, StartupState, StateUpdate};
use crate::deck::validate_slides;
use crate::scraper::crawl_website;

/// Crawl the company website into text chunks
pub async fn ingest_website(state: &StartupState, ctx: &PipelineContext) -> Result<StateUpdate> {
    let crawl = crawl_website(&ctx.http, &state.url, ctx.options.max_pages)
        .await
        .with_context(|| format!("Failed to ingest website {}", state.url))?;

    log_node_progress!(
        "ingest_website",
        format!(
            "Extracted {} text chunks from {} page(s)",
            crawl.chunks.len(),
            crawl.pages.len()
        )
    );

    Ok(StateUpdate {
        website_html: Some(crawl.html),
        web_chunks: Some(crawl.chunks),
        ..Default::default()
    })
}

/// Keep only well-formed slide images
pub async fn ingest_deck(state: &StartupState) -> Result<StateUpdate> {
    let slides = state.deck_slides.clone().unwrap_or_default();
    if slides.is_empty() {
        return Ok(StateUpdate {
            deck_slides: Some(Vec::new()),
            ..Default::default()
        });
    }

    let (valid, dropped) = validate_slides(slides);
    if dropped > 0 {
        tracing::warn!("Filtered out {} invalid slide(s)", dropped);
    }
    log_node_progress!("ingest_deck", format!("Validated {} slide(s)", valid.len()));

    Ok(StateUpdate {
        deck_slides: Some(valid),
        ..Default::default()
    })
}
