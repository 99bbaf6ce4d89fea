//! Structural and type validation for every event payload.
//!
//! [`validate`] is a pure function of an [`Event`] -- no IO, no clock, no store
//! lookups. It gathers *every* violation before returning, so a rejected write's
//! audit record carries the complete failure set, not just the first thing that
//! happened to be wrong.

use serde_json::Value;

use crate::error::FieldError;
use crate::event::{Event, EventType, Gate, StepType};

/// Validates `event` against the schema for its `event_type`. Returns every
/// violation found, in the order checks were performed.
pub fn validate(event: &Event) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    if event.id.trim().is_empty() {
        errors.push(FieldError::invalid("id", "event id must not be blank"));
    }

    let allowed: &[&str] = match event.event_type {
        EventType::ProposalRecorded => &[
            "id", "kind", "target-id", "status", "score", "method", "evidence", "created-at",
        ],
        EventType::PromotionRecorded => &[
            "id",
            "proposal-id",
            "kind",
            "target-id",
            "decided-by",
            "rationale",
            "created-at",
        ],
        EventType::EvidenceAttached => &["id", "target", "method", "payload", "created-at"],
        EventType::ActionRecorded => &["id", "type", "actor", "note", "created-at"],
        EventType::FactMaterialized => &[
            "id",
            "kind",
            "body",
            "created-at",
            "promotion-id",
            "subject",
            "predicate",
            "object",
            "rationale",
        ],
        EventType::ChainBuilt => &["id", "steps", "created-at"],
    };
    reject_unknown_fields(event, allowed, &mut errors);

    match event.event_type {
        EventType::ProposalRecorded => validate_proposal(event, &mut errors),
        EventType::PromotionRecorded => validate_promotion(event, &mut errors),
        EventType::EvidenceAttached => validate_evidence(event, &mut errors),
        EventType::ActionRecorded => validate_action(event, &mut errors),
        EventType::FactMaterialized => validate_fact(event, &mut errors),
        EventType::ChainBuilt => validate_chain(event, &mut errors),
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn reject_unknown_fields(event: &Event, allowed: &[&str], errors: &mut Vec<FieldError>) {
    let mut unknown: Vec<String> = event
        .fields
        .keys()
        .filter(|k| !allowed.contains(&k.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        errors.push(
            FieldError::new(
                "unknown-fields",
                crate::error::ErrorKind::Unknown,
                "payload carries fields this event type does not recognize",
            )
            .with_detail(unknown),
        );
    }
}

fn require_non_blank_string(event: &Event, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match event.field(field) {
        None => {
            errors.push(FieldError::missing(field, format!("{field} is required")));
            None
        }
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        Some(Value::String(_)) => {
            errors.push(FieldError::invalid(field, format!("{field} must not be blank")));
            None
        }
        Some(_) => {
            errors.push(FieldError::invalid(field, format!("{field} must be a string")));
            None
        }
    }
}

fn validate_proposal(event: &Event, errors: &mut Vec<FieldError>) {
    require_non_blank_string(event, "kind", errors);

    match event.field("status") {
        None => errors.push(FieldError::missing("status", "status is required")),
        Some(Value::String(s)) if ["pending", "accepted", "rejected"].contains(&s.as_str()) => {}
        Some(_) => errors.push(FieldError::invalid(
            "status",
            "status must be one of pending, accepted, rejected",
        )),
    }

    match event.field("score") {
        None => errors.push(FieldError::missing("score", "score is required")),
        Some(Value::Number(n)) => {
            let score = n.as_f64().unwrap_or(f64::NAN);
            if !(0.0..=1.0).contains(&score) {
                errors.push(FieldError::invalid("score", "score must fall within [0.0, 1.0]"));
            }
        }
        Some(_) => errors.push(FieldError::invalid("score", "score must be a number")),
    }

    require_non_blank_string(event, "method", errors);

    match event.field("evidence") {
        None => errors.push(FieldError::missing("evidence", "evidence is required")),
        Some(Value::Array(_)) => {}
        Some(_) => errors.push(FieldError::invalid("evidence", "evidence must be a collection")),
    }
}

fn validate_promotion(event: &Event, errors: &mut Vec<FieldError>) {
    require_non_blank_string(event, "proposal-id", errors);
    require_non_blank_string(event, "kind", errors);
    require_non_blank_string(event, "decided-by", errors);
    require_non_blank_string(event, "rationale", errors);
}

fn validate_evidence(event: &Event, errors: &mut Vec<FieldError>) {
    match event.field("target") {
        None => errors.push(FieldError::missing("target", "target is required")),
        Some(Value::Object(obj)) => {
            match obj.get("type") {
                Some(Value::String(s)) if s == "proposal" || s == "promotion" => {}
                Some(_) => errors.push(FieldError::invalid(
                    "target.type",
                    "target.type must be one of proposal, promotion",
                )),
                None => errors.push(FieldError::missing("target.type", "target.type is required")),
            }
            match obj.get("id") {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(Value::String(_)) => {
                    errors.push(FieldError::invalid("target.id", "target.id must not be blank"))
                }
                Some(_) => errors.push(FieldError::invalid("target.id", "target.id must be a string")),
                None => errors.push(FieldError::missing("target.id", "target.id is required")),
            }
        }
        Some(_) => errors.push(FieldError::invalid("target", "target must be an object")),
    }

    require_non_blank_string(event, "method", errors);

    if event.field("payload").is_none() {
        errors.push(FieldError::missing("payload", "payload is required"));
    }
}

fn validate_action(event: &Event, errors: &mut Vec<FieldError>) {
    require_non_blank_string(event, "type", errors);
}

fn validate_fact(event: &Event, errors: &mut Vec<FieldError>) {
    require_non_blank_string(event, "kind", errors);
    require_non_blank_string(event, "promotion-id", errors);
}

fn validate_chain(event: &Event, errors: &mut Vec<FieldError>) {
    let steps = match event.field("steps") {
        None => {
            errors.push(FieldError::missing("steps", "steps is required"));
            return;
        }
        Some(Value::Array(steps)) => steps,
        Some(_) => {
            errors.push(FieldError::invalid("steps", "steps must be a collection"));
            return;
        }
    };

    if steps.is_empty() {
        errors.push(FieldError::invalid("steps", "a chain must have at least one step"));
        return;
    }

    for (index, step) in steps.iter().enumerate() {
        validate_chain_step(index, step, errors);
    }
}

fn validate_chain_step(index: usize, step: &Value, errors: &mut Vec<FieldError>) {
    let Value::Object(step) = step else {
        errors.push(FieldError::invalid(
            format!("steps[{index}]"),
            "each step must be an object",
        ));
        return;
    };

    let step_type = match step.get("type") {
        Some(Value::String(s)) => match s.as_str() {
            "arrow" => Some(StepType::Arrow),
            "bridge" => Some(StepType::Bridge),
            "proposal" => Some(StepType::Proposal),
            _ => {
                errors.push(FieldError::invalid(
                    format!("steps[{index}].type"),
                    "type must be one of arrow, bridge, proposal",
                ));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::invalid(
                format!("steps[{index}].type"),
                "type must be a string",
            ));
            None
        }
        None => {
            errors.push(FieldError::missing(
                format!("steps[{index}].type"),
                "type is required",
            ));
            None
        }
    };
    let _ = step_type;

    match step.get("target-id") {
        Some(Value::String(s)) if !s.trim().is_empty() => {}
        Some(Value::String(_)) => errors.push(FieldError::invalid(
            format!("steps[{index}].target-id"),
            "target-id must not be blank",
        )),
        Some(_) => errors.push(FieldError::invalid(
            format!("steps[{index}].target-id"),
            "target-id must be a string",
        )),
        None => errors.push(FieldError::missing(
            format!("steps[{index}].target-id"),
            "target-id is required",
        )),
    }

    let shift = matches!(step.get("shift"), Some(Value::Bool(true)));
    let gate = match step.get("gate") {
        Some(Value::String(s)) => match s.as_str() {
            "typed-arrow" => Some(Gate::TypedArrow),
            "bridge-triple" => Some(Gate::BridgeTriple),
            _ => {
                errors.push(FieldError::invalid(
                    format!("steps[{index}].gate"),
                    "gate must be one of typed-arrow, bridge-triple",
                ));
                None
            }
        },
        Some(_) => {
            errors.push(FieldError::invalid(
                format!("steps[{index}].gate"),
                "gate must be a string",
            ));
            None
        }
        None => None,
    };

    // A sense-shift step without a valid gate is rejected. A gate present
    // without `shift` is accepted -- gates are advisory there.
    if shift && gate.is_none() && step.get("gate").is_none() {
        errors.push(FieldError::missing(
            "step/gate",
            format!("steps[{index}] is marked shift but carries no gate"),
        ));
    }
}
