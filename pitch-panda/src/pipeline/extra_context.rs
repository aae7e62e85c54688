//! Private-context extraction: user-supplied notes into labelled facts

use anyhow::{anyhow, Result};
use pitch_panda_sdk::log_node_progress;

use super::labels::enforce_extra_context_labels;
use super::node::from_wrapped;
use super::{PipelineContext, StartupState, StateUpdate};
use crate::llm::complete_json;
use crate::schemas::ExtraContextData;

const EXTRA_CONTEXT_PROMPT: &str = r#"You extract structured data from private context a user supplied about a startup (pitch notes, internal metrics, investor updates).

Sort what you find into:
1. Factual data: financial metrics, dates, team size, funding details.
2. Market claims: TAM/SAM/SOM from pitch material. These may be optimistic.
3. Competition claims: what the company says about competitors. These are self-reported; prefix them with "Claims...".

EXPLICIT LABELS ONLY. A number may be classified as a metric only when the source names that metric:
- Funding: "funding", "raised", "seed", "pre-seed", "Series A/B/C", "round", "investment", "capital".
- MRR / ARR: "MRR", "Monthly Recurring Revenue", "ARR", "Annual Recurring Revenue".
- TAM / SAM / SOM: "TAM", "Total Addressable Market", "SAM", "Serviceable Addressable Market", "SOM", "Serviceable Obtainable Market".
- Industry spend: "invested in", "spent in", "annual spend", "industry investment".
Never infer meaning from position, table order, styling or investor logos. "Backed by X" does not imply an amount.
Anything without a label goes to unclassified_values with the value, its surrounding context, an optional possible meaning and the reason it could not be classified.

Return a JSON object with any of these keys (omit what is not stated):
founded_year, mrr, mrr_label, mrr_is_explicit, arr, arr_label, arr_is_explicit,
funding_raised_total, funding_raised_label, funding_raised_is_explicit,
funding_rounds [{type, amount, status, source, date, investors[], is_explicit_label, source_label, is_inferred}],
non_dilutive_funding, current_funding_round, target_funding_amount, funding_investors[],
burn_rate, runway, valuation,
tam_claimed, tam_label, tam_is_explicit, sam_claimed, sam_label, sam_is_explicit, som_claimed, som_label, som_is_explicit,
industry_investment_size, industry_investment_label, industry_investment_is_explicit, spend_in_category,
team_size_claimed, team_members [{name, role, past_experience}], key_hires[],
customer_count, user_count, retention_rate, churn_rate, ltv, cac, loi_count, loi_value,
competition_claims[], unique_advantages_claimed[],
unclassified_values [{value, context, possible_meaning, reason_unclassified}],
other_notes[], sources[]

Every *_label must quote the exact label from the source."#;

/// Parse the raw private context. Returns an empty update when none was given.
pub async fn extract_extra_context(
    state: &StartupState,
    ctx: &PipelineContext,
) -> Result<StateUpdate> {
    let Some(raw) = state.extra_context_raw.as_deref().filter(|c| !c.trim().is_empty()) else {
        return Ok(StateUpdate::default());
    };

    let request = ctx.json_request(
        EXTRA_CONTEXT_PROMPT,
        format!(
            "Startup URL: {}\n\nUSER-PROVIDED CONTEXT:\n{}\n\nExtract the structured data as JSON.",
            state.url, raw
        ),
    );

    let value: serde_json::Value = complete_json(ctx.llm.as_ref(), request)
        .await
        .map_err(|e| anyhow!("Failed to parse extra context: {}", e))?;
    let data: ExtraContextData = from_wrapped(value, "extra_context")?;
    let data = enforce_extra_context_labels(data);

    log_node_progress!(
        "extra_context",
        format!(
            "Extracted private context ({} unclassified value(s))",
            data.unclassified_values.len()
        )
    );

    Ok(StateUpdate {
        extra_context: Some(data),
        ..Default::default()
    })
}
