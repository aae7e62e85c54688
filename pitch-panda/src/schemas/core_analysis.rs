use serde::{Deserialize, Serialize};

use super::null_to_default;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Problem {
    pub one_liner: String,
    pub details: String,
    #[serde(deserialize_with = "null_to_default")]
    pub pain_points: Vec<String>,
    pub target_users: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Solution {
    pub one_liner: String,
    pub details: String,
    #[serde(deserialize_with = "null_to_default")]
    pub features: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueProposition {
    pub summary: String,
    #[serde(deserialize_with = "null_to_default")]
    pub key_benefits: Vec<String>,
}

/// Problem, solution and value proposition synthesized from evidence
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Core {
    pub problem: Problem,
    pub solution: Solution,
    pub value_proposition: ValueProposition,
}
