//! Stage graph: runs the nodes in order, parallel where inputs allow
//!
//! ```text
//! 1 ingest_website ║ ingest_deck ║ extra_context
//! 2 deck_vision                     (skipped without slides)
//! 3 evidence_extraction
//! 4 core_analysis ║ business_analysis ║ market_analysis
//! 5 risk_analysis
//! 6 merge_analysis
//! 7 investment_memo
//! ```
//!
//! A failed node never aborts the run; later nodes see the missing inputs
//! and record their own errors.

use pitch_panda_sdk::{
    log_stage_complete, log_stage_skipped, log_stage_start, AnalysisLog, AnalysisStatus,
};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::business_analysis::analyze_business;
use super::core_analysis::analyze_core;
use super::deck_vision::deck_vision;
use super::evidence::extract_evidence;
use super::extra_context::extract_extra_context;
use super::ingest::{ingest_deck, ingest_website};
use super::market_analysis::analyze_market;
use super::memo::generate_memo;
use super::merge::merge_analysis;
use super::node::execute_node;
use super::risk_analysis::analyze_risk;
use super::{AnalysisInput, StartupState, StateUpdate};
use crate::llm::{ChatMessage, ChatRequest, LlmClient};

/// Tunables for one analysis run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Model for text stages; the client's default when unset
    pub model: Option<String>,
    /// Model for slide images; the client's default when unset
    pub vision_model: Option<String>,
    pub temperature: f32,
    /// Slides analyzed at once
    pub vision_concurrency: usize,
    /// Website pages crawled, landing page included
    pub max_pages: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            model: None,
            vision_model: None,
            temperature: 0.1,
            vision_concurrency: 3,
            max_pages: 5,
        }
    }
}

/// Shared dependencies handed to every node
#[derive(Clone)]
pub struct PipelineContext {
    pub llm: Arc<dyn LlmClient>,
    pub http: reqwest::Client,
    pub options: PipelineOptions,
}

impl PipelineContext {
    pub fn new(llm: Arc<dyn LlmClient>, http: reqwest::Client) -> Self {
        Self {
            llm,
            http,
            options: PipelineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: PipelineOptions) -> Self {
        self.options = options;
        self
    }

    /// System + user request with the run's model and temperature
    pub fn json_request(&self, system: &str, user: String) -> ChatRequest {
        let mut request = ChatRequest::new(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .with_temperature(self.options.temperature);
        if let Some(model) = &self.options.model {
            request = request.with_model(model.clone());
        }
        request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Vision,
    Evidence,
    Analysis,
    Risk,
    Merge,
    Memo,
}

impl Stage {
    pub const COUNT: usize = 7;

    pub fn number(&self) -> usize {
        match self {
            Stage::Ingest => 1,
            Stage::Vision => 2,
            Stage::Evidence => 3,
            Stage::Analysis => 4,
            Stage::Risk => 5,
            Stage::Merge => 6,
            Stage::Memo => 7,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Ingest => "Ingestion",
            Stage::Vision => "Deck Vision",
            Stage::Evidence => "Evidence Extraction",
            Stage::Analysis => "Domain Analysis",
            Stage::Risk => "Risk Analysis",
            Stage::Merge => "Merge",
            Stage::Memo => "Investment Memo",
        }
    }

    /// Percent complete once this stage has finished
    pub fn progress(&self) -> u8 {
        match self {
            Stage::Ingest => 15,
            Stage::Vision => 30,
            Stage::Evidence => 45,
            Stage::Analysis => 65,
            Stage::Risk => 80,
            Stage::Merge => 90,
            Stage::Memo => 100,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Sent after each stage of [`stream_analysis`]
#[derive(Debug, Clone, PartialEq)]
pub struct StageEvent {
    pub stage: Stage,
    pub progress: u8,
    pub errors_so_far: usize,
}

struct Runner<'a> {
    ctx: &'a PipelineContext,
    events: Option<mpsc::Sender<StageEvent>>,
}

impl Runner<'_> {
    fn start(&self, stage: Stage) {
        tracing::info!(stage = stage.number(), "{} started", stage);
        log_stage_start!(stage.number(), stage.name(), Stage::COUNT);
    }

    async fn finish(&self, stage: Stage, state: &StartupState) {
        tracing::info!(
            stage = stage.number(),
            errors = state.errors.len(),
            "{} complete",
            stage
        );
        log_stage_complete!(stage.number(), stage.name());

        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching
            let _ = tx
                .send(StageEvent {
                    stage,
                    progress: stage.progress(),
                    errors_so_far: state.errors.len(),
                })
                .await;
        }
    }

    async fn run(&self, input: AnalysisInput) -> StartupState {
        let ctx = self.ctx;
        let mut state = StartupState::new(input);

        // Stage 1: ingestion
        self.start(Stage::Ingest);
        let (website, deck, extra) = tokio::join!(
            execute_node(
                "ingest_website",
                StateUpdate {
                    web_chunks: Some(Vec::new()),
                    ..Default::default()
                },
                ingest_website(&state, ctx),
            ),
            execute_node(
                "ingest_deck",
                StateUpdate {
                    deck_slides: Some(Vec::new()),
                    ..Default::default()
                },
                ingest_deck(&state),
            ),
            async {
                if state.extra_context_raw.is_some() {
                    execute_node(
                        "extra_context",
                        StateUpdate::default(),
                        extract_extra_context(&state, ctx),
                    )
                    .await
                } else {
                    StateUpdate::default()
                }
            },
        );
        state.merge(website);
        state.merge(deck);
        state.merge(extra);
        self.finish(Stage::Ingest, &state).await;

        // Stage 2: deck vision
        if state.has_slides() {
            self.start(Stage::Vision);
            let update = execute_node(
                "deck_vision",
                StateUpdate {
                    deck_structured: Some(Vec::new()),
                    ..Default::default()
                },
                deck_vision(&state, ctx),
            )
            .await;
            state.merge(update);
        } else {
            log_stage_skipped!(Stage::Vision.number(), Stage::Vision.name(), "no deck slides");
            state.merge(StateUpdate {
                deck_structured: Some(Vec::new()),
                ..Default::default()
            });
        }
        self.finish(Stage::Vision, &state).await;

        // Stage 3: evidence
        self.start(Stage::Evidence);
        let update = execute_node(
            "evidence_extraction",
            StateUpdate::default(),
            extract_evidence(&state, ctx),
        )
        .await;
        state.merge(update);
        self.finish(Stage::Evidence, &state).await;

        // Stage 4: parallel domain analyses
        self.start(Stage::Analysis);
        let (core, business, market) = tokio::join!(
            execute_node("core_analysis", StateUpdate::default(), analyze_core(&state, ctx)),
            execute_node(
                "business_analysis",
                StateUpdate::default(),
                analyze_business(&state, ctx),
            ),
            execute_node(
                "market_analysis",
                StateUpdate::default(),
                analyze_market(&state, ctx),
            ),
        );
        state.merge(core);
        state.merge(business);
        state.merge(market);
        self.finish(Stage::Analysis, &state).await;

        // Stage 5: risk
        self.start(Stage::Risk);
        let update = execute_node("risk_analysis", StateUpdate::default(), analyze_risk(&state, ctx)).await;
        state.merge(update);
        self.finish(Stage::Risk, &state).await;

        // Stage 6: merge
        self.start(Stage::Merge);
        let update = execute_node("merge_analysis", StateUpdate::default(), async {
            merge_analysis(&state)
        })
        .await;
        state.merge(update);
        self.finish(Stage::Merge, &state).await;

        // Stage 7: memo
        self.start(Stage::Memo);
        let update = execute_node("investment_memo", StateUpdate::default(), generate_memo(&state, ctx)).await;
        state.merge(update);
        self.finish(Stage::Memo, &state).await;

        AnalysisLog::RunFinished {
            startup_id: state.startup_id.clone(),
            status: run_status(&state),
            error_count: state.errors.len(),
        }
        .emit();

        state
    }
}

/// Overall outcome of a finished run
pub fn run_status(state: &StartupState) -> AnalysisStatus {
    match (&state.final_analysis, state.errors.is_empty()) {
        (None, _) => AnalysisStatus::Failed,
        (Some(_), true) => AnalysisStatus::Completed,
        (Some(_), false) => AnalysisStatus::CompletedWithErrors,
    }
}

/// Run the full graph and return the final state
pub async fn run_analysis(input: AnalysisInput, ctx: &PipelineContext) -> StartupState {
    Runner { ctx, events: None }.run(input).await
}

/// Like [`run_analysis`], also sending a [`StageEvent`] after every stage
pub async fn stream_analysis(
    input: AnalysisInput,
    ctx: &PipelineContext,
    events: mpsc::Sender<StageEvent>,
) -> StartupState {
    Runner {
        ctx,
        events: Some(events),
    }
    .run(input)
    .await
}
