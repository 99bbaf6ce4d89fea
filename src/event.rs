//! Entity payloads, event envelopes, and the record-operation inputs callers build
//! them from.
//!
//! Every entity is a plain, append-only record keyed by its own id. The wire
//! representation each record is validated against is a flat [`serde_json::Map`] --
//! not the typed struct directly -- so the schema validator stays a pure function
//! of data, independent of how an in-process Rust caller happens to construct it.
//! [`Event::fields`] is that map; the `*Input` types are the ergonomic
//! constructors most callers will actually use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The six event types the schema validator recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    ProposalRecorded,
    PromotionRecorded,
    EvidenceAttached,
    ActionRecorded,
    FactMaterialized,
    ChainBuilt,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::ProposalRecorded => "proposal-recorded",
            EventType::PromotionRecorded => "promotion-recorded",
            EventType::EvidenceAttached => "evidence-attached",
            EventType::ActionRecorded => "action-recorded",
            EventType::FactMaterialized => "fact-materialized",
            EventType::ChainBuilt => "chain-built",
        }
    }
}

/// An event envelope plus its payload fields, the unit both the validator and
/// the audit sink operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub id: String,
    pub at: DateTime<Utc>,
    pub fields: Map<String, Value>,
}

impl Event {
    pub fn new(
        event_type: EventType,
        id: impl Into<String>,
        at: DateTime<Utc>,
        fields: Map<String, Value>,
    ) -> Self {
        Self {
            event_type,
            id: id.into(),
            at,
            fields,
        }
    }

    /// The value a field of the payload holds, if present.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}

/// Serializes `input` and flattens it into the field map an [`Event`] carries.
/// Every `*Input` type is `#[serde(rename_all = "kebab-case")]`, so the map keys
/// this produces already match the field names the validator checks against.
pub(crate) fn to_fields<T: Serialize>(input: &T) -> Map<String, Value> {
    match serde_json::to_value(input).expect("record inputs always serialize") {
        Value::Object(map) => map,
        other => unreachable!("record inputs always serialize to an object, got {other:?}"),
    }
}

/// The proposal lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProposalStatus {
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

/// The kind of entity an [`Evidence`] record points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetType {
    Proposal,
    Promotion,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Proposal => "proposal",
            TargetType::Promotion => "promotion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvidenceTarget {
    #[serde(rename = "type")]
    pub target_type: TargetType,
    pub id: String,
}

/// A candidate claim, inherently fuzzy until promoted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Proposal {
    pub id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub status: ProposalStatus,
    pub score: f64,
    pub method: String,
    pub evidence: Vec<Value>,
    pub created_at: DateTime<Utc>,
}

/// An explicit reviewer decision to accept a proposal as a fact.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Promotion {
    pub id: String,
    pub proposal_id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_id: Option<String>,
    pub decided_by: String,
    pub rationale: String,
    pub created_at: DateTime<Utc>,
}

/// Supporting payload attached to a proposal or a promotion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Evidence {
    pub id: String,
    pub target: EvidenceTarget,
    pub method: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

/// Reviewer or agent activity, deliberately loose beyond its required fields:
/// `actor` and `note` are optional and must not be relied upon.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Action {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A materialized decision outcome recorded in the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Fact {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub body: Value,
    pub created_at: DateTime<Utc>,
    pub promotion_id: String,
}

/// The fixed kind used for bridge-triple facts.
pub const BRIDGE_TRIPLE_KIND: &str = "bridge-triple";

/// A fact of kind `bridge-triple` that warrants a sense-shift between concepts.
/// Stored both as a [`Fact`] and, under the same id, in the bridge-triple index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeTriple {
    pub id: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predicate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

/// The closed tagged variant a chain step may be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepType {
    Arrow,
    Bridge,
    Proposal,
}

impl StepType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepType::Arrow => "arrow",
            StepType::Bridge => "bridge",
            StepType::Proposal => "proposal",
        }
    }

    /// Per-step softness weight.
    pub fn softness_weight(&self) -> f64 {
        match self {
            StepType::Arrow => 0.0,
            StepType::Bridge => 0.5,
            StepType::Proposal => 1.0,
        }
    }
}

/// The warrant required for a step marked as a sense-shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Gate {
    TypedArrow,
    BridgeTriple,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainStep {
    #[serde(rename = "type")]
    pub step_type: StepType,
    pub target_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shift: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gate: Option<Gate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl ChainStep {
    /// Whether this step is marked as a sense-shift.
    pub fn is_shift(&self) -> bool {
        self.shift.unwrap_or(false)
    }
}

/// The weighted totals computed for a built chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Softness {
    pub total: f64,
    pub average: f64,
    pub per_step: Vec<f64>,
}

impl Softness {
    pub fn compute(steps: &[ChainStep]) -> Self {
        let per_step: Vec<f64> = steps.iter().map(|s| s.step_type.softness_weight()).collect();
        let total: f64 = per_step.iter().sum();
        // count == 0 is unreachable (validation rejects empty chains before this
        // runs) but the defensive branch is kept anyway.
        let average = if per_step.is_empty() {
            0.0
        } else {
            total / per_step.len() as f64
        };
        Softness {
            total,
            average,
            per_step,
        }
    }
}

/// An ordered sequence of hops that collectively justify a derived claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Chain {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub steps: Vec<ChainStep>,
    pub softness_total: f64,
    pub softness_average: f64,
    pub softness_per_step: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Record-operation inputs: what a caller actually builds and hands to `Ledger`.
// ---------------------------------------------------------------------------

/// Input to [`crate::Ledger::record_proposal`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProposalInput {
    pub id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_id: Option<String>,
    pub status: ProposalStatus,
    pub score: f64,
    pub method: String,
    #[serde(default)]
    pub evidence: Vec<Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::Ledger::record_promotion`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PromotionInput {
    pub id: String,
    pub proposal_id: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_id: Option<String>,
    pub decided_by: String,
    pub rationale: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::Ledger::record_evidence`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct EvidenceInput {
    pub id: String,
    pub target: EvidenceTarget,
    pub method: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::Ledger::record_action`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ActionInput {
    pub id: String,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub actor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input to [`crate::Ledger::record_fact`]. `promotion_id` is threaded separately
/// from the struct in the operation surface, but is carried here too so the same
/// struct can build the validator's event map.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct FactInput {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub body: Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
    pub promotion_id: String,
}

/// Input to [`crate::Ledger::record_bridge_triple`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct BridgeTripleInput {
    pub id: String,
    pub promotion_id: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub predicate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub object: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rationale: Option<String>,
}

/// Input to [`crate::Ledger::build_chain`]. `id` is the one entity id allowed to be
/// absent -- the chain engine generates one when omitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChainInput {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub id: Option<String>,
    pub steps: Vec<ChainStep>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub created_at: Option<DateTime<Utc>>,
}
