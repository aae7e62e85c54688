//! Explicit-label enforcement for model-extracted metrics.
//!
//! A number only counts as TAM, MRR, funding, ... when the label it was
//! found under actually names that metric. Everything else is demoted.

use crate::schemas::{ExtraContextData, Market, UnclassifiedValue};

pub const TAM_KEYWORDS: &[&str] = &["tam", "total addressable market"];
pub const SAM_KEYWORDS: &[&str] = &["sam", "serviceable addressable market"];
pub const SOM_KEYWORDS: &[&str] = &["som", "serviceable obtainable market"];
pub const MRR_KEYWORDS: &[&str] = &["mrr", "monthly recurring revenue"];
pub const ARR_KEYWORDS: &[&str] = &["arr", "annual recurring revenue"];
pub const FUNDING_KEYWORDS: &[&str] = &[
    "funding",
    "raised",
    "seed",
    "series",
    "round",
    "investment",
    "capital",
];

/// Case-insensitive keyword check.
///
/// Multi-word keywords match as substrings. Single words must match a whole
/// word of the label (`TAM` does not match "status"); words longer than
/// three letters also match as a word prefix ("rounds", "investments").
pub fn label_matches(label: Option<&str>, keywords: &[&str]) -> bool {
    let Some(label) = label else {
        return false;
    };
    let label = label.to_lowercase();
    let words: Vec<&str> = label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    keywords.iter().any(|keyword| {
        if keyword.contains(' ') {
            label.contains(keyword)
        } else {
            words
                .iter()
                .any(|w| *w == *keyword || (keyword.len() > 3 && w.starts_with(keyword)))
        }
    })
}

struct LabelledMetric<'a> {
    name: &'static str,
    keywords: &'static [&'static str],
    value: &'a mut Option<String>,
    label: &'a mut Option<String>,
    is_explicit: &'a mut bool,
}

impl LabelledMetric<'_> {
    /// Returns the demoted value when the label fails the check
    fn enforce(self) -> Option<UnclassifiedValue> {
        let Some(value) = self.value.as_ref().filter(|v| !v.trim().is_empty()).cloned() else {
            *self.is_explicit = false;
            return None;
        };

        if label_matches(self.label.as_deref(), self.keywords) {
            *self.is_explicit = true;
            return None;
        }

        let context = self.label.take();
        *self.value = None;
        *self.is_explicit = false;

        Some(UnclassifiedValue {
            value,
            reason_unclassified: match &context {
                Some(label) => format!("Label '{}' does not explicitly name {}", label, self.name),
                None => format!("No explicit {} label", self.name),
            },
            context,
            possible_meaning: Some(format!("Possibly {}", self.name)),
        })
    }
}

/// Demote unlabeled metrics in private-context data into `unclassified_values`
pub fn enforce_extra_context_labels(mut data: ExtraContextData) -> ExtraContextData {
    let mut demoted = Vec::new();

    let metrics = [
        LabelledMetric {
            name: "MRR",
            keywords: MRR_KEYWORDS,
            value: &mut data.mrr,
            label: &mut data.mrr_label,
            is_explicit: &mut data.mrr_is_explicit,
        },
        LabelledMetric {
            name: "ARR",
            keywords: ARR_KEYWORDS,
            value: &mut data.arr,
            label: &mut data.arr_label,
            is_explicit: &mut data.arr_is_explicit,
        },
        LabelledMetric {
            name: "funding raised",
            keywords: FUNDING_KEYWORDS,
            value: &mut data.funding_raised_total,
            label: &mut data.funding_raised_label,
            is_explicit: &mut data.funding_raised_is_explicit,
        },
        LabelledMetric {
            name: "TAM",
            keywords: TAM_KEYWORDS,
            value: &mut data.tam_claimed,
            label: &mut data.tam_label,
            is_explicit: &mut data.tam_is_explicit,
        },
        LabelledMetric {
            name: "SAM",
            keywords: SAM_KEYWORDS,
            value: &mut data.sam_claimed,
            label: &mut data.sam_label,
            is_explicit: &mut data.sam_is_explicit,
        },
        LabelledMetric {
            name: "SOM",
            keywords: SOM_KEYWORDS,
            value: &mut data.som_claimed,
            label: &mut data.som_label,
            is_explicit: &mut data.som_is_explicit,
        },
    ];
    demoted.extend(metrics.into_iter().filter_map(LabelledMetric::enforce));

    let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(&mut data.funding_rounds)
        .into_iter()
        .partition(|round| {
            round.is_explicit_label
                && round
                    .source_label
                    .as_deref()
                    .is_some_and(|label| !label.trim().is_empty())
        });
    data.funding_rounds = kept;

    demoted.extend(dropped.into_iter().filter_map(|round| {
        let value = round.amount.clone().or_else(|| round.round_type.clone())?;
        Some(UnclassifiedValue {
            value,
            context: round.source_label.or(round.round_type),
            possible_meaning: Some("Possibly a funding round".to_string()),
            reason_unclassified: "Funding round without an explicit funding label".to_string(),
        })
    }));

    if !demoted.is_empty() {
        tracing::debug!(count = demoted.len(), "demoted unlabeled metrics");
    }
    data.unclassified_values.extend(demoted);
    data
}

/// Market figures may be estimates, so a failed label only clears the flag
pub fn enforce_market_labels(mut market: Market) -> Market {
    let checks = [
        (&market.tam, &market.tam_label, &mut market.tam_is_explicit, TAM_KEYWORDS),
        (&market.sam, &market.sam_label, &mut market.sam_is_explicit, SAM_KEYWORDS),
        (&market.som, &market.som_label, &mut market.som_is_explicit, SOM_KEYWORDS),
    ];

    for (value, label, is_explicit, keywords) in checks {
        if value.is_none() || !label_matches(label.as_deref(), keywords) {
            *is_explicit = false;
        }
    }

    market
}
