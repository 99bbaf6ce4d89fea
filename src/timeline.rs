//! Per-entity success/failure timeline built entirely from the audit log.
//!
//! Every successful commit already produces a `success` audit entry carrying the
//! same entity data, so the audit list alone is a complete replay source -- the
//! reconstructor never needs to touch the in-memory collections.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::audit::{AuditEntry, AuditType};
use crate::event::{Event, EventType};

/// Whether a [`TimelineEvent`] records a committed write or a rejected attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineOutcome {
    Success,
    Failure,
}

/// One entry in an entity's reconstructed timeline.
#[derive(Debug, Clone)]
pub struct TimelineEvent {
    pub event_type: EventType,
    pub outcome: TimelineOutcome,
    pub at: DateTime<Utc>,
}

/// Whether `event`'s payload relates to `id`: either the envelope id itself, or
/// one of the named cross-reference fields.
pub fn touches(event: &Event, id: &str) -> bool {
    if event.id == id {
        return true;
    }
    match event.event_type {
        EventType::PromotionRecorded => field_str_eq(event, "proposal-id", id),
        EventType::EvidenceAttached => nested_str_eq(event, "target", "id", id),
        EventType::FactMaterialized => field_str_eq(event, "promotion-id", id),
        EventType::ChainBuilt => chain_step_matches(event, id),
        EventType::ProposalRecorded | EventType::ActionRecorded => false,
    }
}

fn field_str_eq(event: &Event, field: &str, id: &str) -> bool {
    matches!(event.field(field), Some(Value::String(s)) if s == id)
}

fn nested_str_eq(event: &Event, field: &str, nested: &str, id: &str) -> bool {
    match event.field(field) {
        Some(Value::Object(obj)) => matches!(obj.get(nested), Some(Value::String(s)) if s == id),
        _ => false,
    }
}

fn chain_step_matches(event: &Event, id: &str) -> bool {
    let Some(Value::Array(steps)) = event.field("steps") else {
        return false;
    };
    steps.iter().any(|step| match step {
        Value::Object(obj) => matches!(obj.get("target-id"), Some(Value::String(s)) if s == id),
        _ => false,
    })
}

/// `created-at` recorded on the entity itself, falling back to the envelope's own
/// `at` if the payload omitted it (shouldn't happen post-fill, but timeline
/// reconstruction should never panic on malformed/legacy audit data).
fn entity_created_at(event: &Event) -> DateTime<Utc> {
    match event.field("created-at") {
        Some(Value::String(s)) => s.parse().unwrap_or(event.at),
        _ => event.at,
    }
}

/// Reconstructs the chronological timeline of every event touching `id`.
/// Sort key is `at` ascending; success entries sort by the entity's `created-at`,
/// failure entries by the audit entry's own `at`. Ties keep audit insertion order
/// (stable sort).
pub fn timeline(entries: &[AuditEntry], id: &str) -> Vec<TimelineEvent> {
    let mut events: Vec<TimelineEvent> = entries
        .iter()
        .filter(|entry| touches(&entry.event, id))
        .map(|entry| {
            let outcome = if entry.audit_type == AuditType::Success {
                TimelineOutcome::Success
            } else {
                TimelineOutcome::Failure
            };
            let at = match outcome {
                TimelineOutcome::Success => entity_created_at(&entry.event),
                TimelineOutcome::Failure => entry.at,
            };
            TimelineEvent {
                event_type: entry.event.event_type,
                outcome,
                at,
            }
        })
        .collect();

    events.sort_by_key(|e| e.at);
    events
}

/// The subset of audit entries whose event touches `id` and whose outcome is a
/// failure, in original audit order.
pub fn failure_reasons<'a>(entries: &'a [AuditEntry], id: &str) -> Vec<&'a AuditEntry> {
    entries
        .iter()
        .filter(|entry| entry.audit_type.is_failure() && touches(&entry.event, id))
        .collect()
}
