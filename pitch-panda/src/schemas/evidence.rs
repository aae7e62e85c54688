//! Raw evidence with provenance. Nothing here is synthesized; every item
//! points back at a slide page or a website location.

use serde::{Deserialize, Serialize};

use super::{null_to_default, opt_string_or_number};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    DeckSlide,
    Website,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub kind: SourceKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Provenance {
    /// Short citation used inside prompts: `Slide 3` or `/about`
    pub fn cite(&self) -> String {
        match self.kind {
            SourceKind::DeckSlide => match self.page {
                Some(page) => format!("Slide {}", page),
                None => "Deck".to_string(),
            },
            SourceKind::Website => self
                .location
                .clone()
                .unwrap_or_else(|| "Website".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub text: String,
    pub source: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingFact {
    #[serde(default)]
    pub round_type: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub investors: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
    pub source: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TractionFact {
    pub metric_type: String,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub value: Option<String>,
    #[serde(default)]
    pub timeframe: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    pub source: Provenance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamFact {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub background: Option<String>,
    pub source: Provenance,
}

/// Complete evidence collection. Every list is present, possibly empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Evidence {
    #[serde(deserialize_with = "null_to_default")]
    pub problem_snippets: Vec<EvidenceItem>,
    #[serde(deserialize_with = "null_to_default")]
    pub solution_snippets: Vec<EvidenceItem>,
    #[serde(deserialize_with = "null_to_default")]
    pub value_prop_snippets: Vec<EvidenceItem>,
    #[serde(deserialize_with = "null_to_default")]
    pub team_facts: Vec<TeamFact>,
    #[serde(deserialize_with = "null_to_default")]
    pub competition_snippets: Vec<EvidenceItem>,
    #[serde(deserialize_with = "null_to_default")]
    pub funding_facts: Vec<FundingFact>,
    #[serde(deserialize_with = "null_to_default")]
    pub traction_facts: Vec<TractionFact>,
    #[serde(deserialize_with = "null_to_default")]
    pub market_snippets: Vec<EvidenceItem>,
    #[serde(deserialize_with = "null_to_default")]
    pub business_model_snippets: Vec<EvidenceItem>,
    #[serde(deserialize_with = "null_to_default")]
    pub claims: Vec<EvidenceItem>,
}

impl Evidence {
    /// Items counted toward the evidence total
    pub fn total_items(&self) -> usize {
        self.problem_snippets.len()
            + self.solution_snippets.len()
            + self.team_facts.len()
            + self.traction_facts.len()
            + self.funding_facts.len()
            + self.competition_snippets.len()
            + self.market_snippets.len()
    }

    /// Count snippet sources as (deck, website)
    pub fn source_split(&self) -> (usize, usize) {
        let snippet_lists = [
            &self.problem_snippets,
            &self.solution_snippets,
            &self.value_prop_snippets,
            &self.competition_snippets,
            &self.market_snippets,
            &self.business_model_snippets,
            &self.claims,
        ];

        snippet_lists
            .iter()
            .flat_map(|items| items.iter())
            .fold((0, 0), |(deck, web), item| match item.source.kind {
                SourceKind::DeckSlide => (deck + 1, web),
                SourceKind::Website => (deck, web + 1),
            })
    }

    /// Areas with at least one piece of evidence
    pub fn covered_areas(&self) -> Vec<&'static str> {
        let mut areas = Vec::new();
        if !self.problem_snippets.is_empty() {
            areas.push("problem");
        }
        if !self.solution_snippets.is_empty() {
            areas.push("solution");
        }
        if !self.team_facts.is_empty() {
            areas.push("team");
        }
        if !self.traction_facts.is_empty() {
            areas.push("traction");
        }
        if !self.funding_facts.is_empty() {
            areas.push("funding");
        }
        if !self.competition_snippets.is_empty() {
            areas.push("competition");
        }
        if !self.market_snippets.is_empty() {
            areas.push("market");
        }
        areas
    }

    /// One-line summary: total, deck/website split, covered areas
    pub fn summary(&self) -> String {
        let (deck, website) = self.source_split();
        let areas = self.covered_areas();
        format!(
            "Total evidence items: {}. Sources - Deck: {}, Website: {}. Coverage: {}",
            self.total_items(),
            deck,
            website,
            if areas.is_empty() {
                "none".to_string()
            } else {
                areas.join(", ")
            }
        )
    }
}
