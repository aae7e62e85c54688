//! Team, traction, competition, funding and business model

use serde::{Deserialize, Serialize};

use super::{null_to_default, string_or_number};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    pub background: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub strengths: Vec<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub source_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    #[serde(deserialize_with = "super::opt_string_or_number")]
    pub size: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub members: Vec<TeamMember>,
    pub collective_expertise: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TractionMetric {
    pub metric: String,
    #[serde(deserialize_with = "string_or_number")]
    pub value: String,
    pub trend: Option<String>,
    pub timeframe: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Partnership {
    pub name: String,
    /// customer, partner, LOI, pilot, integration, distribution, ...
    #[serde(rename = "type")]
    pub kind: String,
    pub details: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Traction {
    #[serde(deserialize_with = "null_to_default")]
    pub metrics: Vec<TractionMetric>,
    #[serde(deserialize_with = "null_to_default")]
    pub partnerships: Vec<Partnership>,
    #[serde(deserialize_with = "null_to_default")]
    pub milestones: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Competitor {
    pub name: String,
    pub description: Option<String>,
    pub differentiation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Competition {
    #[serde(deserialize_with = "null_to_default")]
    pub competitors: Vec<Competitor>,
    pub positioning: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FundingRound {
    /// pre-seed, seed, Series A, ...
    #[serde(rename = "type")]
    pub round_type: String,
    pub amount: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub investors: Vec<String>,
    pub date: Option<String>,
    /// completed, ongoing or target
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Funding {
    #[serde(deserialize_with = "null_to_default")]
    pub rounds: Vec<FundingRound>,
    pub total_raised: Option<String>,
    pub status: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessModel {
    pub summary: Option<String>,
    pub monetization: Option<Vec<String>>,
    pub pricing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Business {
    pub team: Team,
    pub traction: Traction,
    pub competition: Competition,
    pub funding: Funding,
    pub business_model: BusinessModel,
}
