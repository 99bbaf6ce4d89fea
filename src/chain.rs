//! Boundary checks for chain steps and softness scoring.
//!
//! Schema-level chain validation (non-empty steps, well-typed steps, the
//! sense-shift gate) lives in [`crate::validate`] alongside every other event type.
//! What's specific to chains is cross-checking each step against the store (this
//! module) and the softness arithmetic, which lives on [`crate::event::Softness`].

use std::collections::BTreeMap;

use crate::error::FieldError;
use crate::event::{BridgeTriple, ChainStep, Proposal, StepType};

/// Cross-checks each step against the store: `proposal`-typed steps must name a
/// stored proposal, `bridge`-typed steps a stored bridge triple. Arrow-typed steps
/// are never cross-checked -- arrows are external to this core.
///
/// Returns the first violation found: boundary violations are disjoint by
/// construction, so only one can ever fire for a given step.
pub fn check_step_boundaries(
    steps: &[ChainStep],
    proposals: &BTreeMap<String, Proposal>,
    bridge_triples: &BTreeMap<String, BridgeTriple>,
) -> Result<(), FieldError> {
    for (index, step) in steps.iter().enumerate() {
        match step.step_type {
            StepType::Proposal if !proposals.contains_key(&step.target_id) => {
                return Err(FieldError::missing(
                    format!("steps[{index}].target-id"),
                    format!("proposal '{}' is not stored", step.target_id),
                ));
            }
            StepType::Bridge if !bridge_triples.contains_key(&step.target_id) => {
                return Err(FieldError::missing(
                    format!("steps[{index}].target-id"),
                    format!("bridge triple '{}' is not stored", step.target_id),
                ));
            }
            StepType::Proposal | StepType::Bridge | StepType::Arrow => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{ProposalStatus, Softness};
    use chrono::Utc;

    fn proposal(id: &str) -> Proposal {
        Proposal {
            id: id.to_string(),
            kind: "claim".to_string(),
            target_id: None,
            status: ProposalStatus::Pending,
            score: 0.5,
            method: "ann".to_string(),
            evidence: vec![],
            created_at: Utc::now(),
        }
    }

    fn bridge(id: &str) -> BridgeTriple {
        BridgeTriple {
            id: id.to_string(),
            created_at: Utc::now(),
            subject: None,
            predicate: None,
            object: None,
            rationale: None,
        }
    }

    fn step(step_type: StepType, target_id: &str) -> ChainStep {
        ChainStep {
            step_type,
            target_id: target_id.to_string(),
            shift: None,
            gate: None,
            notes: None,
        }
    }

    #[test]
    fn arrow_steps_are_never_cross_checked() {
        let proposals = BTreeMap::new();
        let bridges = BTreeMap::new();
        let steps = vec![step(StepType::Arrow, "a-1")];
        assert!(check_step_boundaries(&steps, &proposals, &bridges).is_ok());
    }

    #[test]
    fn proposal_step_requires_stored_proposal() {
        let mut proposals = BTreeMap::new();
        proposals.insert("p-2".to_string(), proposal("p-2"));
        let bridges = BTreeMap::new();

        let steps = vec![step(StepType::Proposal, "p-2")];
        assert!(check_step_boundaries(&steps, &proposals, &bridges).is_ok());

        let steps = vec![step(StepType::Proposal, "p-missing")];
        let err = check_step_boundaries(&steps, &proposals, &bridges).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Missing);
    }

    #[test]
    fn bridge_step_requires_stored_bridge_triple() {
        let proposals = BTreeMap::new();
        let mut bridges = BTreeMap::new();
        bridges.insert("b-1".to_string(), bridge("b-1"));

        let steps = vec![step(StepType::Bridge, "b-1")];
        assert!(check_step_boundaries(&steps, &proposals, &bridges).is_ok());

        let steps = vec![step(StepType::Bridge, "b-missing")];
        assert!(check_step_boundaries(&steps, &proposals, &bridges).is_err());
    }

    #[test]
    fn softness_scores_mixed_step_sequence() {
        let steps = vec![
            step(StepType::Arrow, "a-1"),
            step(StepType::Bridge, "b-1"),
            step(StepType::Proposal, "p-2"),
        ];
        let softness = Softness::compute(&steps);
        assert_eq!(softness.total, 1.5);
        assert_eq!(softness.average, 0.5);
        assert_eq!(softness.per_step, vec![0.0, 0.5, 1.0]);
    }
}
