use serde::{Deserialize, Serialize};

use super::null_to_default;

/// Market sizing and trends.
///
/// TAM/SAM/SOM carry the label they were found under. A figure whose label
/// lacks the metric keyword is kept but marked non-explicit, since market
/// figures may be the analyst's own estimates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Market {
    pub tam: Option<String>,
    pub tam_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub tam_is_explicit: bool,

    pub sam: Option<String>,
    pub sam_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub sam_is_explicit: bool,

    pub som: Option<String>,
    pub som_label: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub som_is_explicit: bool,

    pub market_size_summary: String,
    #[serde(deserialize_with = "null_to_default")]
    pub growth_trends: Vec<String>,
    pub target_customers: String,

    pub industry_investment_size: Option<String>,
    pub industry_investment_label: Option<String>,
    pub spend_in_category: Option<String>,
    pub spend_in_category_label: Option<String>,
    pub market_notes: Option<String>,
    #[serde(rename = "is_claimed_TAM", skip_serializing_if = "Option::is_none")]
    pub is_claimed_tam: Option<bool>,

    #[serde(deserialize_with = "null_to_default")]
    pub sources: Vec<String>,
}
