//! Typed records produced and consumed by the analysis pipeline
//!
//! Everything the model returns is deserialized leniently: missing fields fall
//! back to their defaults and `null` arrays become empty, so a sparse answer
//! still yields a usable record.

pub mod business;
pub mod core_analysis;
pub mod deck;
pub mod evidence;
pub mod extra_context;
pub mod market;
pub mod risk;
pub mod startup;

pub use business::{
    Business, BusinessModel, Competition, Competitor, Funding, FundingRound, Partnership, Team,
    TeamMember, Traction, TractionMetric,
};
pub use core_analysis::{Core, Problem, Solution, ValueProposition};
pub use deck::{Figure, Logo, Slide, SlideImage, SlideType, VisualStructure};
pub use evidence::{
    Evidence, EvidenceItem, FundingFact, Provenance, SourceKind, TeamFact, TractionFact,
};
pub use extra_context::{ExtraContextData, ExtraFundingRound, ExtraTeamMember, UnclassifiedValue};
pub use market::Market;
pub use risk::{Risk, RiskItem, Severity};
pub use startup::{StartupAnalysis, TextChunk};

use serde::{Deserialize, Deserializer};

/// Treat an explicit `null` the same as a missing field
pub(crate) fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept either a JSON string or a number and keep it as text
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Optional variant of [`string_or_number`]
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}
