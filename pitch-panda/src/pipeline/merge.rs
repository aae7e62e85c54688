//! Stage 6: assemble the final analysis. No model calls.

use anyhow::{bail, Result};

use super::{StartupState, StateUpdate};
use crate::schemas::StartupAnalysis;

/// Combine core, business and risk (plus optional market and private context)
pub fn merge_analysis(state: &StartupState) -> Result<StateUpdate> {
    let (Some(core), Some(business), Some(risk)) = (&state.core, &state.business, &state.risk)
    else {
        bail!("Core, business, and risk analysis required for merge");
    };

    let final_analysis = StartupAnalysis {
        startup_id: state.startup_id.clone(),
        url: state.url.clone(),

        problem: core.problem.clone(),
        solution: core.solution.clone(),
        value_proposition: core.value_proposition.clone(),

        team: business.team.clone(),
        traction: business.traction.clone(),
        competition: business.competition.clone(),
        funding: business.funding.clone(),
        business_model: business.business_model.clone(),

        market: state.market.clone(),
        extra_context: state.extra_context.clone().filter(|d| !d.is_empty()),

        risks: risk.risks.clone(),
        missing_info: risk.missing_info.clone(),

        evidence_summary: Some(evidence_summary(state)),
        analyzed_at: chrono::Utc::now().to_rfc3339(),
    };

    Ok(StateUpdate {
        final_analysis: Some(final_analysis),
        ..Default::default()
    })
}

fn evidence_summary(state: &StartupState) -> String {
    match &state.evidence {
        Some(evidence) => evidence.summary(),
        None => "No evidence available".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::AnalysisInput;
    use crate::schemas::{Business, Core, Risk};

    #[test]
    fn test_merge_requires_all_parts() {
        let mut state = StartupState::new(AnalysisInput::new("https://acme.io"));
        state.core = Some(Core::default());
        state.business = Some(Business::default());

        let err = merge_analysis(&state).unwrap_err();
        assert!(err.to_string().contains("Core, business, and risk"));
    }

    #[test]
    fn test_merge_builds_final_analysis() {
        let mut state = StartupState::new(AnalysisInput::new("https://acme.io"));
        state.core = Some(Core::default());
        state.business = Some(Business::default());
        state.risk = Some(Risk {
            missing_info: vec!["No revenue data".into()],
            ..Default::default()
        });

        let update = merge_analysis(&state).unwrap();
        let analysis = update.final_analysis.unwrap();

        assert_eq!(analysis.startup_id, state.startup_id);
        assert_eq!(analysis.missing_info, vec!["No revenue data"]);
        assert_eq!(analysis.evidence_summary.as_deref(), Some("No evidence available"));
        assert!(analysis.extra_context.is_none());
        assert!(chrono::DateTime::parse_from_rfc3339(&analysis.analyzed_at).is_ok());
    }
}
