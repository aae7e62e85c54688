//! Pipeline state and the per-node updates merged into it

use serde::{Deserialize, Serialize};

use crate::schemas::{
    Business, Core, Evidence, ExtraContextData, Market, Risk, Slide, SlideImage, StartupAnalysis,
    TextChunk,
};

/// What the caller hands to the pipeline
#[derive(Debug, Clone, Default)]
pub struct AnalysisInput {
    pub url: String,
    /// Generated as `analysis-<uuid>` when absent
    pub startup_id: Option<String>,
    pub deck_slides: Vec<SlideImage>,
    /// Free-text private context (notes, metrics, internal docs)
    pub extra_context: Option<String>,
}

impl AnalysisInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_slides(mut self, slides: Vec<SlideImage>) -> Self {
        self.deck_slides = slides;
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.extra_context = Some(context.into());
        self
    }
}

/// State threaded through every stage of an analysis run.
///
/// Nodes never mutate this directly; they return a [`StateUpdate`] which the
/// graph runner folds in with [`StartupState::merge`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StartupState {
    pub startup_id: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deck_slides: Option<Vec<SlideImage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_context_raw: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_html: Option<String>,
    #[serde(default)]
    pub web_chunks: Option<Vec<TextChunk>>,
    #[serde(default)]
    pub deck_structured: Option<Vec<Slide>>,
    #[serde(default)]
    pub extra_context: Option<ExtraContextData>,

    #[serde(default)]
    pub evidence: Option<Evidence>,
    #[serde(default)]
    pub core: Option<Core>,
    #[serde(default)]
    pub business: Option<Business>,
    #[serde(default)]
    pub market: Option<Market>,
    #[serde(default)]
    pub risk: Option<Risk>,

    #[serde(default)]
    pub final_analysis: Option<StartupAnalysis>,
    #[serde(default)]
    pub memo: Option<String>,

    #[serde(default)]
    pub errors: Vec<String>,
}

/// Fields a single node produced. `None` means "not touched".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub deck_slides: Option<Vec<SlideImage>>,
    pub website_html: Option<String>,
    pub web_chunks: Option<Vec<TextChunk>>,
    pub deck_structured: Option<Vec<Slide>>,
    pub extra_context: Option<ExtraContextData>,
    pub evidence: Option<Evidence>,
    pub core: Option<Core>,
    pub business: Option<Business>,
    pub market: Option<Market>,
    pub risk: Option<Risk>,
    pub final_analysis: Option<StartupAnalysis>,
    pub memo: Option<String>,
    pub errors: Vec<String>,
}

impl StateUpdate {
    /// Update carrying only an error
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }
}

impl StartupState {
    pub fn new(input: AnalysisInput) -> Self {
        let startup_id = input
            .startup_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| format!("analysis-{}", uuid::Uuid::new_v4()));

        let extra_context_raw = input.extra_context.filter(|c| !c.trim().is_empty());

        Self {
            startup_id,
            url: input.url,
            deck_slides: Some(input.deck_slides),
            extra_context_raw,
            ..Default::default()
        }
    }

    /// Fold a node's update into the state.
    ///
    /// Only fields the update sets are written; errors are appended.
    pub fn merge(&mut self, update: StateUpdate) {
        let StateUpdate {
            deck_slides,
            website_html,
            web_chunks,
            deck_structured,
            extra_context,
            evidence,
            core,
            business,
            market,
            risk,
            final_analysis,
            memo,
            errors,
        } = update;

        fn set<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        set(&mut self.deck_slides, deck_slides);
        set(&mut self.website_html, website_html);
        set(&mut self.web_chunks, web_chunks);
        set(&mut self.deck_structured, deck_structured);
        set(&mut self.extra_context, extra_context);
        set(&mut self.evidence, evidence);
        set(&mut self.core, core);
        set(&mut self.business, business);
        set(&mut self.market, market);
        set(&mut self.risk, risk);
        set(&mut self.final_analysis, final_analysis);
        set(&mut self.memo, memo);

        self.errors.extend(errors);
    }

    pub fn has_slides(&self) -> bool {
        self.deck_slides.as_ref().is_some_and(|s| !s.is_empty())
    }

    /// Copy suitable for persistence: slide images and raw HTML dropped
    pub fn for_storage(&self) -> StartupState {
        StartupState {
            deck_slides: None,
            website_html: None,
            ..self.clone()
        }
    }
}
