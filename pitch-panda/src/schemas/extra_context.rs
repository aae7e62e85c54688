//! Facts parsed out of private, user-supplied context.
//!
//! Every metric that could be confused with another (MRR vs ARR, TAM vs
//! industry spend, a bare number vs a funding amount) carries the label it was
//! found under and an `_is_explicit` flag. Values whose label does not name
//! the metric are demoted to `unclassified_values` after parsing.

use serde::{Deserialize, Serialize};

use super::{null_to_default, opt_string_or_number};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraFundingRound {
    #[serde(rename = "type")]
    pub round_type: Option<String>,
    pub amount: Option<String>,
    pub status: Option<String>,
    /// equity, non-dilutive, grant, debt
    pub source: Option<String>,
    pub date: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub investors: Vec<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub is_explicit_label: bool,
    pub source_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub is_inferred: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraTeamMember {
    pub name: String,
    pub role: Option<String>,
    pub past_experience: Option<String>,
}

/// A number that could not be tied to a metric
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UnclassifiedValue {
    pub value: String,
    pub context: Option<String>,
    pub possible_meaning: Option<String>,
    pub reason_unclassified: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtraContextData {
    #[serde(deserialize_with = "opt_string_or_number")]
    pub founded_year: Option<String>,

    pub mrr: Option<String>,
    pub mrr_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub mrr_is_explicit: bool,

    pub arr: Option<String>,
    pub arr_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub arr_is_explicit: bool,

    pub funding_raised_total: Option<String>,
    pub funding_raised_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub funding_raised_is_explicit: bool,
    #[serde(deserialize_with = "null_to_default")]
    pub funding_rounds: Vec<ExtraFundingRound>,
    pub non_dilutive_funding: Option<String>,
    pub current_funding_round: Option<String>,
    pub target_funding_amount: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub funding_investors: Vec<String>,

    pub burn_rate: Option<String>,
    pub runway: Option<String>,
    pub valuation: Option<String>,

    pub tam_claimed: Option<String>,
    pub tam_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub tam_is_explicit: bool,

    pub sam_claimed: Option<String>,
    pub sam_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub sam_is_explicit: bool,

    pub som_claimed: Option<String>,
    pub som_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub som_is_explicit: bool,

    pub industry_investment_size: Option<String>,
    pub industry_investment_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub industry_investment_is_explicit: bool,
    pub spend_in_category: Option<String>,

    #[serde(deserialize_with = "opt_string_or_number")]
    pub team_size_claimed: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub team_members: Vec<ExtraTeamMember>,
    #[serde(deserialize_with = "null_to_default")]
    pub key_hires: Vec<String>,

    #[serde(deserialize_with = "opt_string_or_number")]
    pub customer_count: Option<String>,
    #[serde(deserialize_with = "opt_string_or_number")]
    pub user_count: Option<String>,
    pub retention_rate: Option<String>,
    pub churn_rate: Option<String>,
    pub ltv: Option<String>,
    pub cac: Option<String>,
    #[serde(deserialize_with = "opt_string_or_number")]
    pub loi_count: Option<String>,
    pub loi_value: Option<String>,

    /// Self-reported and usually self-serving
    #[serde(deserialize_with = "null_to_default")]
    pub competition_claims: Vec<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub unique_advantages_claimed: Vec<String>,

    #[serde(deserialize_with = "null_to_default")]
    pub unclassified_values: Vec<UnclassifiedValue>,
    #[serde(deserialize_with = "null_to_default")]
    pub other_notes: Vec<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub sources: Vec<String>,
}

impl ExtraContextData {
    /// True when nothing at all was extracted
    pub fn is_empty(&self) -> bool {
        *self == ExtraContextData::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_labelled_metrics() {
        let data: ExtraContextData = serde_json::from_str(
            r#"{
                "mrr": "€45K", "mrr_label": "MRR in k€", "mrr_is_explicit": true,
                "loi_count": 5,
                "funding_rounds": [{"type": "Seed", "amount": "$2M", "is_explicit_label": true, "source_label": "Seed funding"}],
                "sources": ["Pitch deck page 5"]
            }"#,
        )
        .unwrap();

        assert_eq!(data.mrr.as_deref(), Some("€45K"));
        assert!(data.mrr_is_explicit);
        assert_eq!(data.loi_count.as_deref(), Some("5"));
        assert_eq!(data.funding_rounds[0].round_type.as_deref(), Some("Seed"));
        assert!(!data.is_empty());
    }

    #[test]
    fn test_empty_object_is_empty() {
        let data: ExtraContextData = serde_json::from_str("{}").unwrap();
        assert!(data.is_empty());
    }
}
