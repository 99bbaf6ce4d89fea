//! The keyed, append-only collections every record-operation writes into, wired
//! to the validator, the audit sink, the chain engine, and the clock/id services.
//!
//! Every operation runs the same six-step pipeline: fill `created-at`, build the
//! event envelope, validate, boundary-check, uniqueness-check, then audit and
//! commit. Audit happens before the in-memory insert -- a failed audit write
//! aborts the operation before any collection is touched, so the durable log is
//! never behind the in-memory state.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::audit::{AuditEntry, AuditSink, AuditType};
use crate::chain::check_step_boundaries;
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::error::{FieldError, LedgerError};
use crate::event::{
    to_fields, Action, ActionInput, BridgeTriple, BridgeTripleInput, Chain, ChainInput, Event,
    EventType, Evidence, EvidenceInput, Fact, FactInput, Promotion, PromotionInput, Proposal,
    ProposalInput, Softness, TargetType, BRIDGE_TRIPLE_KIND,
};
use crate::ids::{IdGenerator, Uuid7IdGenerator};
use crate::timeline::{
    failure_reasons as reconstruct_failure_reasons, timeline as reconstruct_timeline, TimelineEvent,
};

#[derive(Debug, Default)]
struct LedgerState {
    proposals: BTreeMap<String, Proposal>,
    promotions: BTreeMap<String, Promotion>,
    evidence: BTreeMap<String, Evidence>,
    actions: BTreeMap<String, Action>,
    facts: BTreeMap<String, Fact>,
    bridge_triples: BTreeMap<String, BridgeTriple>,
    chains: BTreeMap<String, Chain>,
}

struct Inner {
    state: LedgerState,
    audit: AuditSink,
}

/// The outcome of a successful `record-proposal`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalOutcome {
    pub id: String,
}

/// The outcome of a successful `record-promotion`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionOutcome {
    pub id: String,
}

/// The outcome of a successful `record-evidence`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvidenceOutcome {
    pub id: String,
}

/// The outcome of a successful `record-action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub id: String,
}

/// The outcome of a successful `record-fact`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactOutcome {
    pub id: String,
}

/// The outcome of a successful `record-bridge-triple`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeTripleOutcome {
    pub id: String,
}

/// The outcome of a successful `build-chain`, including the computed softness.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainOutcome {
    pub id: String,
    pub softness: Softness,
}

/// The append-only, validated, audited store for every entity kind.
///
/// Constructed with an explicit [`LedgerConfig`] plus injected [`Clock`] and
/// [`IdGenerator`] -- there is no process-wide singleton. A single mutex guards
/// both the in-memory collections and the audit sink together, so the audit file
/// always reflects the same linearization order as the collections it describes.
pub struct Ledger {
    inner: Mutex<Inner>,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
}

impl Ledger {
    /// Builds a store backed by `config`'s audit path, with explicit clock and id
    /// services.
    pub fn new(
        config: LedgerConfig,
        clock: Box<dyn Clock>,
        ids: Box<dyn IdGenerator>,
    ) -> std::io::Result<Self> {
        let audit = AuditSink::new(config.audit_path())?;
        Ok(Self {
            inner: Mutex::new(Inner {
                state: LedgerState::default(),
                audit,
            }),
            clock,
            ids,
        })
    }

    /// Builds a store using the real clock and a uuid7-backed id generator.
    pub fn open(config: LedgerConfig) -> std::io::Result<Self> {
        Self::new(config, Box::new(SystemClock), Box::new(Uuid7IdGenerator))
    }

    /// Builds a store from `LOG_ROOT`, using the real clock and id generator.
    pub fn from_env() -> std::io::Result<Self> {
        Self::open(LedgerConfig::from_env())
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("ledger mutex poisoned")
    }

    /// Appends one audit entry, stamping it with the current time.
    fn record_audit(
        &self,
        inner: &mut Inner,
        audit_type: AuditType,
        event: Event,
        errors: Option<Vec<FieldError>>,
    ) -> Result<(), LedgerError> {
        let at = self.clock.now();
        inner.audit.append(AuditEntry {
            audit_type,
            event,
            errors,
            at,
        })?;
        Ok(())
    }

    /// Audits a rejection and returns the error the caller should see. If the audit
    /// write itself fails, that IO error takes precedence -- a silent audit failure
    /// would leave the caller believing a record exists in the log that doesn't.
    fn reject(
        &self,
        inner: &mut Inner,
        audit_type: AuditType,
        event: Event,
        errors: Vec<FieldError>,
    ) -> LedgerError {
        warn!(id = %event.id, event_type = event.event_type.as_str(), ?audit_type, "event rejected");
        match self.record_audit(inner, audit_type, event, Some(errors.clone())) {
            Ok(()) => LedgerError::Rejected(errors),
            Err(audit_err) => audit_err,
        }
    }

    /// Audits a success. Must run before the entity is inserted into its
    /// collection.
    fn accept(&self, inner: &mut Inner, event: Event) -> Result<(), LedgerError> {
        self.record_audit(inner, AuditType::Success, event, None)
    }

    // -- record-proposal -----------------------------------------------------

    pub fn record_proposal(&self, mut input: ProposalInput) -> Result<ProposalOutcome, LedgerError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let created_at = input.created_at.unwrap_or(now);
        input.created_at = Some(created_at);

        let id = input.id.clone();
        let event = Event::new(EventType::ProposalRecorded, id.clone(), now, to_fields(&input));
        debug!(%id, "validating proposal");

        if let Err(errors) = crate::validate::validate(&event) {
            return Err(self.reject(&mut inner, AuditType::ValidationFailure, event, errors));
        }

        if inner.state.proposals.contains_key(&id) {
            let err = FieldError::duplicate("proposal-id", format!("proposal '{id}' already exists"));
            return Err(self.reject(&mut inner, AuditType::AppendOnlyViolation, event, vec![err]));
        }

        let proposal = Proposal {
            id: id.clone(),
            kind: input.kind,
            target_id: input.target_id,
            status: input.status,
            score: input.score,
            method: input.method,
            evidence: input.evidence,
            created_at,
        };

        self.accept(&mut inner, event)?;
        inner.state.proposals.insert(id.clone(), proposal);
        info!(%id, "proposal recorded");
        Ok(ProposalOutcome { id })
    }

    // -- record-promotion ------------------------------------------------------

    pub fn record_promotion(&self, mut input: PromotionInput) -> Result<PromotionOutcome, LedgerError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let created_at = input.created_at.unwrap_or(now);
        input.created_at = Some(created_at);

        let id = input.id.clone();
        let event = Event::new(EventType::PromotionRecorded, id.clone(), now, to_fields(&input));
        debug!(%id, "validating promotion");

        if let Err(errors) = crate::validate::validate(&event) {
            return Err(self.reject(&mut inner, AuditType::ValidationFailure, event, errors));
        }

        if !inner.state.proposals.contains_key(&input.proposal_id) {
            let err = FieldError::missing(
                "proposal-id",
                format!("proposal '{}' is not stored", input.proposal_id),
            );
            return Err(self.reject(&mut inner, AuditType::BoundaryViolation, event, vec![err]));
        }

        if inner.state.promotions.contains_key(&id) {
            let err = FieldError::duplicate("promotion-id", format!("promotion '{id}' already exists"));
            return Err(self.reject(&mut inner, AuditType::AppendOnlyViolation, event, vec![err]));
        }

        let promotion = Promotion {
            id: id.clone(),
            proposal_id: input.proposal_id,
            kind: input.kind,
            target_id: input.target_id,
            decided_by: input.decided_by,
            rationale: input.rationale,
            created_at,
        };

        self.accept(&mut inner, event)?;
        inner.state.promotions.insert(id.clone(), promotion);
        info!(%id, "promotion recorded");
        Ok(PromotionOutcome { id })
    }

    // -- record-evidence ---------------------------------------------------------

    pub fn record_evidence(&self, mut input: EvidenceInput) -> Result<EvidenceOutcome, LedgerError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let created_at = input.created_at.unwrap_or(now);
        input.created_at = Some(created_at);

        let id = input.id.clone();
        let event = Event::new(EventType::EvidenceAttached, id.clone(), now, to_fields(&input));
        debug!(%id, "validating evidence");

        if let Err(errors) = crate::validate::validate(&event) {
            return Err(self.reject(&mut inner, AuditType::ValidationFailure, event, errors));
        }

        let target_exists = match input.target.target_type {
            TargetType::Proposal => inner.state.proposals.contains_key(&input.target.id),
            TargetType::Promotion => inner.state.promotions.contains_key(&input.target.id),
        };
        if !target_exists {
            let err = FieldError::missing(
                "target-id",
                format!(
                    "{} '{}' is not stored",
                    input.target.target_type.as_str(),
                    input.target.id
                ),
            );
            return Err(self.reject(&mut inner, AuditType::BoundaryViolation, event, vec![err]));
        }

        if inner.state.evidence.contains_key(&id) {
            let err = FieldError::duplicate("evidence-id", format!("evidence '{id}' already exists"));
            return Err(self.reject(&mut inner, AuditType::AppendOnlyViolation, event, vec![err]));
        }

        let evidence = Evidence {
            id: id.clone(),
            target: input.target,
            method: input.method,
            payload: input.payload,
            created_at,
        };

        self.accept(&mut inner, event)?;
        inner.state.evidence.insert(id.clone(), evidence);
        info!(%id, "evidence attached");
        Ok(EvidenceOutcome { id })
    }

    // -- record-action --------------------------------------------------------

    pub fn record_action(&self, mut input: ActionInput) -> Result<ActionOutcome, LedgerError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let created_at = input.created_at.unwrap_or(now);
        input.created_at = Some(created_at);

        let id = input.id.clone();
        let event = Event::new(EventType::ActionRecorded, id.clone(), now, to_fields(&input));
        debug!(%id, "validating action");

        if let Err(errors) = crate::validate::validate(&event) {
            return Err(self.reject(&mut inner, AuditType::ValidationFailure, event, errors));
        }

        if inner.state.actions.contains_key(&id) {
            let err = FieldError::duplicate("action-id", format!("action '{id}' already exists"));
            return Err(self.reject(&mut inner, AuditType::AppendOnlyViolation, event, vec![err]));
        }

        let action = Action {
            id: id.clone(),
            action_type: input.action_type,
            actor: input.actor,
            note: input.note,
            created_at,
        };

        self.accept(&mut inner, event)?;
        inner.state.actions.insert(id.clone(), action);
        info!(%id, "action recorded");
        Ok(ActionOutcome { id })
    }

    /// Shared boundary check for both plain facts and bridge triples: the
    /// promotion must be stored, and its `kind` must match the fact's `kind`.
    fn check_fact_boundary(&self, inner: &Inner, promotion_id: &str, kind: &str) -> Result<(), FieldError> {
        match inner.state.promotions.get(promotion_id) {
            None => Err(FieldError::missing(
                "promotion-id",
                format!("promotion '{promotion_id}' is not stored"),
            )),
            Some(promotion) if promotion.kind != kind => Err(FieldError::mismatch(
                "fact-kind",
                format!(
                    "fact kind '{kind}' does not match promotion kind '{}'",
                    promotion.kind
                ),
            )),
            Some(_) => Ok(()),
        }
    }

    // -- record-fact -----------------------------------------------------------

    pub fn record_fact(&self, mut input: FactInput) -> Result<FactOutcome, LedgerError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let created_at = input.created_at.unwrap_or(now);
        input.created_at = Some(created_at);

        let id = input.id.clone();
        let event = Event::new(EventType::FactMaterialized, id.clone(), now, to_fields(&input));
        debug!(%id, "validating fact");

        if let Err(errors) = crate::validate::validate(&event) {
            return Err(self.reject(&mut inner, AuditType::ValidationFailure, event, errors));
        }

        if let Err(err) = self.check_fact_boundary(&inner, &input.promotion_id, &input.kind) {
            return Err(self.reject(&mut inner, AuditType::BoundaryViolation, event, vec![err]));
        }

        if inner.state.facts.contains_key(&id) {
            let err = FieldError::duplicate("fact-id", format!("fact '{id}' already exists"));
            return Err(self.reject(&mut inner, AuditType::AppendOnlyViolation, event, vec![err]));
        }

        let fact = Fact {
            id: id.clone(),
            kind: input.kind,
            body: input.body,
            created_at,
            promotion_id: input.promotion_id,
        };

        self.accept(&mut inner, event)?;
        inner.state.facts.insert(id.clone(), fact);
        info!(%id, "fact materialized");
        Ok(FactOutcome { id })
    }

    // -- record-bridge-triple ----------------------------------------------------

    /// Writes a fact of kind `bridge-triple` via the fact pathway and, on success
    /// only, an index entry keyed by the same id. If the fact write fails for any
    /// reason, the bridge index is left untouched -- there is no partial success.
    pub fn record_bridge_triple(
        &self,
        mut input: BridgeTripleInput,
    ) -> Result<BridgeTripleOutcome, LedgerError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let created_at = input.created_at.unwrap_or(now);
        input.created_at = Some(created_at);

        let id = input.id.clone();
        let mut fields = to_fields(&input);
        fields.insert("kind".to_string(), Value::String(BRIDGE_TRIPLE_KIND.to_string()));
        let event = Event::new(EventType::FactMaterialized, id.clone(), now, fields);
        debug!(%id, "validating bridge triple");

        if let Err(errors) = crate::validate::validate(&event) {
            return Err(self.reject(&mut inner, AuditType::ValidationFailure, event, errors));
        }

        if let Err(err) = self.check_fact_boundary(&inner, &input.promotion_id, BRIDGE_TRIPLE_KIND) {
            return Err(self.reject(&mut inner, AuditType::BoundaryViolation, event, vec![err]));
        }

        if inner.state.facts.contains_key(&id) || inner.state.bridge_triples.contains_key(&id) {
            let err = FieldError::duplicate("bridge-id", format!("bridge triple '{id}' already exists"));
            return Err(self.reject(&mut inner, AuditType::AppendOnlyViolation, event, vec![err]));
        }

        let body = serde_json::json!({
            "subject": input.subject,
            "predicate": input.predicate,
            "object": input.object,
            "rationale": input.rationale,
        });
        let fact = Fact {
            id: id.clone(),
            kind: BRIDGE_TRIPLE_KIND.to_string(),
            body,
            created_at,
            promotion_id: input.promotion_id,
        };
        let bridge = BridgeTriple {
            id: id.clone(),
            created_at,
            subject: input.subject,
            predicate: input.predicate,
            object: input.object,
            rationale: input.rationale,
        };

        self.accept(&mut inner, event)?;
        inner.state.facts.insert(id.clone(), fact);
        inner.state.bridge_triples.insert(id.clone(), bridge);
        info!(%id, "bridge triple recorded");
        Ok(BridgeTripleOutcome { id })
    }

    // -- build-chain -----------------------------------------------------------

    pub fn build_chain(&self, mut input: ChainInput) -> Result<ChainOutcome, LedgerError> {
        let mut inner = self.lock();
        let now = self.clock.now();
        let created_at = input.created_at.unwrap_or(now);
        input.created_at = Some(created_at);
        if input.id.is_none() {
            input.id = Some(self.ids.gen_id("chain"));
        }
        let id = input.id.clone().expect("id generated above if absent");

        let event = Event::new(EventType::ChainBuilt, id.clone(), now, to_fields(&input));
        debug!(%id, "validating chain");

        if let Err(errors) = crate::validate::validate(&event) {
            return Err(self.reject(&mut inner, AuditType::ValidationFailure, event, errors));
        }

        if let Err(err) =
            check_step_boundaries(&input.steps, &inner.state.proposals, &inner.state.bridge_triples)
        {
            return Err(self.reject(&mut inner, AuditType::BoundaryViolation, event, vec![err]));
        }

        if inner.state.chains.contains_key(&id) {
            let err = FieldError::duplicate("chain-id", format!("chain '{id}' already exists"));
            return Err(self.reject(&mut inner, AuditType::AppendOnlyViolation, event, vec![err]));
        }

        let softness = Softness::compute(&input.steps);
        let chain = Chain {
            id: id.clone(),
            created_at,
            steps: input.steps,
            softness_total: softness.total,
            softness_average: softness.average,
            softness_per_step: softness.per_step.clone(),
        };

        self.accept(&mut inner, event)?;
        inner.state.chains.insert(id.clone(), chain);
        info!(%id, softness_total = softness.total, "chain built");
        Ok(ChainOutcome { id, softness })
    }

    // -- observable state --------------------------------------------------------

    pub fn proposals(&self) -> Vec<Proposal> {
        self.lock().state.proposals.values().cloned().collect()
    }

    pub fn promotions(&self) -> Vec<Promotion> {
        self.lock().state.promotions.values().cloned().collect()
    }

    pub fn evidence(&self) -> Vec<Evidence> {
        self.lock().state.evidence.values().cloned().collect()
    }

    pub fn actions(&self) -> Vec<Action> {
        self.lock().state.actions.values().cloned().collect()
    }

    pub fn facts(&self) -> Vec<Fact> {
        self.lock().state.facts.values().cloned().collect()
    }

    pub fn bridge_triples(&self) -> Vec<BridgeTriple> {
        self.lock().state.bridge_triples.values().cloned().collect()
    }

    pub fn chains(&self) -> Vec<Chain> {
        self.lock().state.chains.values().cloned().collect()
    }

    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.lock().audit.entries().to_vec()
    }

    /// Chronologically sorted events touching `id`, success or failure.
    pub fn timeline(&self, id: &str) -> Vec<TimelineEvent> {
        reconstruct_timeline(self.lock().audit.entries(), id)
    }

    /// Failure audit entries touching `id`, in audit order.
    pub fn failure_reasons(&self, id: &str) -> Vec<AuditEntry> {
        reconstruct_failure_reasons(self.lock().audit.entries(), id)
            .into_iter()
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FakeClock;
    use crate::event::{ChainStep, EvidenceTarget, Gate, ProposalStatus, StepType};
    use crate::ids::SequentialIdGenerator;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn new_ledger(dir: &std::path::Path) -> Ledger {
        let config = LedgerConfig::new(dir);
        let clock = Box::new(FakeClock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        let ids = Box::new(SequentialIdGenerator::new());
        Ledger::new(config, clock, ids).expect("audit sink opens")
    }

    fn proposal_input(id: &str) -> ProposalInput {
        ProposalInput {
            id: id.to_string(),
            kind: "claim".to_string(),
            target_id: None,
            status: ProposalStatus::Pending,
            score: 0.42,
            method: "ann".to_string(),
            evidence: vec![],
            created_at: None,
        }
    }

    #[test]
    fn duplicate_proposal_is_audited() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        assert!(ledger.record_proposal(proposal_input("p-1")).is_ok());
        let err = ledger.record_proposal(proposal_input("p-1")).unwrap_err();
        let errors = err.errors().unwrap();
        assert_eq!(errors[0].kind, crate::error::ErrorKind::Duplicate);

        let reasons = ledger.failure_reasons("p-1");
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].audit_type, AuditType::AppendOnlyViolation);

        let timeline = ledger.timeline("p-1");
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn missing_proposal_blocks_promotion() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        let err = ledger
            .record_promotion(PromotionInput {
                id: "pr-1".to_string(),
                proposal_id: "missing".to_string(),
                kind: "claim".to_string(),
                target_id: None,
                decided_by: "reviewer".to_string(),
                rationale: "x".to_string(),
                created_at: None,
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));

        let reasons = ledger.failure_reasons("pr-1");
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].audit_type, AuditType::BoundaryViolation);
    }

    #[test]
    fn timeline_links_related_records() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        ledger.record_proposal(proposal_input("p-3")).unwrap();
        ledger
            .record_promotion(PromotionInput {
                id: "pr-3".to_string(),
                proposal_id: "p-3".to_string(),
                kind: "claim".to_string(),
                target_id: None,
                decided_by: "reviewer".to_string(),
                rationale: "x".to_string(),
                created_at: None,
            })
            .unwrap();
        ledger
            .record_fact(FactInput {
                id: "f-3".to_string(),
                kind: "claim".to_string(),
                body: Value::Null,
                created_at: None,
                promotion_id: "pr-3".to_string(),
            })
            .unwrap();

        let timeline = ledger.timeline("p-3");
        let types: Vec<&str> = timeline.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            types,
            vec!["proposal-recorded", "promotion-recorded", "fact-materialized"]
        );
    }

    #[test]
    fn chain_softness_scoring() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        ledger.record_proposal(proposal_input("p-2")).unwrap();
        ledger
            .record_promotion(PromotionInput {
                id: "pr-2".to_string(),
                proposal_id: "p-2".to_string(),
                kind: "bridge-triple".to_string(),
                target_id: None,
                decided_by: "reviewer".to_string(),
                rationale: "x".to_string(),
                created_at: None,
            })
            .unwrap();
        ledger
            .record_bridge_triple(BridgeTripleInput {
                id: "b-1".to_string(),
                promotion_id: "pr-2".to_string(),
                created_at: None,
                subject: Some("a".to_string()),
                predicate: Some("relates-to".to_string()),
                object: Some("b".to_string()),
                rationale: Some("observed".to_string()),
            })
            .unwrap();

        let outcome = ledger
            .build_chain(ChainInput {
                id: Some("c-1".to_string()),
                steps: vec![
                    ChainStep {
                        step_type: StepType::Arrow,
                        target_id: "a-1".to_string(),
                        shift: None,
                        gate: None,
                        notes: None,
                    },
                    ChainStep {
                        step_type: StepType::Bridge,
                        target_id: "b-1".to_string(),
                        shift: None,
                        gate: None,
                        notes: None,
                    },
                    ChainStep {
                        step_type: StepType::Proposal,
                        target_id: "p-2".to_string(),
                        shift: None,
                        gate: None,
                        notes: None,
                    },
                ],
                created_at: None,
            })
            .unwrap();

        assert_eq!(outcome.softness.total, 1.5);
        assert_eq!(outcome.softness.average, 0.5);

        let types: Vec<&str> = ledger
            .timeline("p-2")
            .iter()
            .map(|e| e.event_type.as_str())
            .collect();
        assert!(types.contains(&"chain-built"));
    }

    #[test]
    fn sense_shift_gate() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        ledger.record_proposal(proposal_input("p-2")).unwrap();
        ledger
            .record_promotion(PromotionInput {
                id: "pr-2".to_string(),
                proposal_id: "p-2".to_string(),
                kind: "bridge-triple".to_string(),
                target_id: None,
                decided_by: "reviewer".to_string(),
                rationale: "x".to_string(),
                created_at: None,
            })
            .unwrap();
        ledger
            .record_bridge_triple(BridgeTripleInput {
                id: "b-1".to_string(),
                promotion_id: "pr-2".to_string(),
                created_at: None,
                subject: None,
                predicate: None,
                object: None,
                rationale: None,
            })
            .unwrap();

        let gated = ledger.build_chain(ChainInput {
            id: Some("c-ok".to_string()),
            steps: vec![ChainStep {
                step_type: StepType::Bridge,
                target_id: "b-1".to_string(),
                shift: Some(true),
                gate: Some(Gate::TypedArrow),
                notes: None,
            }],
            created_at: None,
        });
        assert!(gated.is_ok());

        let ungated = ledger
            .build_chain(ChainInput {
                id: Some("c-bad".to_string()),
                steps: vec![ChainStep {
                    step_type: StepType::Bridge,
                    target_id: "b-1".to_string(),
                    shift: Some(true),
                    gate: None,
                    notes: None,
                }],
                created_at: None,
            })
            .unwrap_err();
        let errors = ungated.errors().unwrap();
        assert!(errors.iter().any(|e| e.field == "step/gate"));
    }

    #[test]
    fn kind_mismatch_on_fact() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        ledger.record_proposal(proposal_input("p-6")).unwrap();
        ledger
            .record_promotion(PromotionInput {
                id: "pr-6".to_string(),
                proposal_id: "p-6".to_string(),
                kind: "claim".to_string(),
                target_id: None,
                decided_by: "reviewer".to_string(),
                rationale: "x".to_string(),
                created_at: None,
            })
            .unwrap();

        let err = ledger
            .record_fact(FactInput {
                id: "f-6".to_string(),
                kind: BRIDGE_TRIPLE_KIND.to_string(),
                body: Value::Null,
                created_at: None,
                promotion_id: "pr-6".to_string(),
            })
            .unwrap_err();
        let errors = err.errors().unwrap();
        assert_eq!(errors[0].field, "fact-kind");
        assert_eq!(errors[0].kind, crate::error::ErrorKind::Mismatch);

        let reasons = ledger.failure_reasons("f-6");
        assert_eq!(reasons[0].audit_type, AuditType::BoundaryViolation);
    }

    #[test]
    fn evidence_requires_stored_target() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        let err = ledger
            .record_evidence(EvidenceInput {
                id: "e-1".to_string(),
                target: EvidenceTarget {
                    target_type: crate::event::TargetType::Proposal,
                    id: "missing".to_string(),
                },
                method: "manual".to_string(),
                payload: Value::Null,
                created_at: None,
            })
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected(_)));

        ledger.record_proposal(proposal_input("p-7")).unwrap();
        let ok = ledger.record_evidence(EvidenceInput {
            id: "e-2".to_string(),
            target: EvidenceTarget {
                target_type: crate::event::TargetType::Proposal,
                id: "p-7".to_string(),
            },
            method: "manual".to_string(),
            payload: Value::Null,
            created_at: None,
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn chain_without_explicit_id_gets_one_generated() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        ledger.record_proposal(proposal_input("p-8")).unwrap();
        let outcome = ledger
            .build_chain(ChainInput {
                id: None,
                steps: vec![ChainStep {
                    step_type: StepType::Proposal,
                    target_id: "p-8".to_string(),
                    shift: None,
                    gate: None,
                    notes: None,
                }],
                created_at: None,
            })
            .unwrap();
        assert!(outcome.id.starts_with("chain-"));
    }

    #[test]
    fn resubmitting_same_event_never_produces_two_successes() {
        let dir = tempdir().unwrap();
        let ledger = new_ledger(dir.path());

        assert!(ledger.record_proposal(proposal_input("p-9")).is_ok());
        assert!(ledger.record_proposal(proposal_input("p-9")).is_err());
        assert!(ledger.record_proposal(proposal_input("p-9")).is_err());

        let successes = ledger
            .audit_log()
            .into_iter()
            .filter(|e| e.audit_type == AuditType::Success && e.event.id == "p-9")
            .count();
        assert_eq!(successes, 1);
    }
}
