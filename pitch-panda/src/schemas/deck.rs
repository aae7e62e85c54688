//! Pitch deck slides: raw images in, structured slides out

use serde::{Deserialize, Serialize};

use super::null_to_default;

/// Classified purpose of a slide. Unknown labels map to [`SlideType::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SlideType {
    Problem,
    Solution,
    Team,
    Traction,
    Market,
    Competition,
    Product,
    Roadmap,
    Financials,
    Funding,
    #[default]
    Other,
}

impl SlideType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlideType::Problem => "problem",
            SlideType::Solution => "solution",
            SlideType::Team => "team",
            SlideType::Traction => "traction",
            SlideType::Market => "market",
            SlideType::Competition => "competition",
            SlideType::Product => "product",
            SlideType::Roadmap => "roadmap",
            SlideType::Financials => "financials",
            SlideType::Funding => "funding",
            SlideType::Other => "other",
        }
    }
}

impl From<String> for SlideType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "problem" => SlideType::Problem,
            "solution" => SlideType::Solution,
            "team" => SlideType::Team,
            "traction" => SlideType::Traction,
            "market" => SlideType::Market,
            "competition" => SlideType::Competition,
            "product" => SlideType::Product,
            "roadmap" => SlideType::Roadmap,
            "financials" => SlideType::Financials,
            "funding" => SlideType::Funding,
            _ => SlideType::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Figure {
    pub label: String,
    #[serde(deserialize_with = "super::string_or_number")]
    pub value: String,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Logo {
    pub name: String,
    /// customer, partner, investor or competitor
    pub role: Option<String>,
}

/// Chart, graph or diagram seen on a slide
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualStructure {
    #[serde(rename = "type")]
    pub kind: String,
    pub subject: Option<String>,
    pub qualitative_trend: Option<String>,
}

/// Structured reading of a single slide
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Slide {
    /// 1-based; always overwritten with the page of the source image
    pub page: u32,
    pub slide_type: SlideType,
    pub title: Option<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub main_bullets: Vec<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub figures: Vec<Figure>,
    #[serde(deserialize_with = "null_to_default")]
    pub logos: Vec<Logo>,
    #[serde(deserialize_with = "null_to_default")]
    pub claims: Vec<String>,
    #[serde(deserialize_with = "null_to_default")]
    pub visual_structures: Vec<VisualStructure>,
    #[serde(deserialize_with = "null_to_default")]
    pub caveats: Vec<String>,
}

/// Raw slide image as a base64 data URL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideImage {
    pub page: u32,
    pub image_data_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}
