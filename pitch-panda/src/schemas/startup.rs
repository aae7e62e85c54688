use serde::{Deserialize, Serialize};

use super::{
    BusinessModel, Competition, ExtraContextData, Funding, Market, Problem, RiskItem, Solution,
    Team, Traction, ValueProposition,
};

/// Text block scraped from the company website
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextChunk {
    pub id: String,
    pub text: String,
    /// Always `website`
    pub source_type: String,
    /// Page path or section, e.g. `/` or `/about#Our Story`
    pub location: String,
}

impl TextChunk {
    pub fn website(id: impl Into<String>, text: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            source_type: "website".to_string(),
            location: location.into(),
        }
    }
}

/// Final merged analysis of one startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupAnalysis {
    pub startup_id: String,
    pub url: String,

    pub problem: Problem,
    pub solution: Solution,
    pub value_proposition: ValueProposition,

    pub team: Team,
    pub traction: Traction,
    pub competition: Competition,
    pub funding: Funding,
    pub business_model: BusinessModel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market: Option<Market>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_context: Option<ExtraContextData>,

    pub risks: Vec<RiskItem>,
    pub missing_info: Vec<String>,

    #[serde(default)]
    pub evidence_summary: Option<String>,
    /// RFC 3339
    pub analyzed_at: String,
}
