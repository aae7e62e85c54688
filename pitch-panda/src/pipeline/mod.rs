//! Multi-stage analysis pipeline
//!
//! Each node reads a shared [`StartupState`] and returns a [`StateUpdate`];
//! the graph runner merges updates in a fixed order.

pub mod batch;
pub mod business_analysis;
pub mod core_analysis;
pub mod deck_vision;
pub mod evidence;
pub mod extra_context;
pub mod graph;
pub mod ingest;
pub mod labels;
pub mod market_analysis;
pub mod memo;
pub mod merge;
pub mod node;
pub mod risk_analysis;
pub mod state;

pub use graph::{
    run_analysis, run_status, stream_analysis, PipelineContext, PipelineOptions, Stage, StageEvent,
};
pub use state::{AnalysisInput, StartupState, StateUpdate};
