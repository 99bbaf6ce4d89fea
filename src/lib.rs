//! An append-only, validated, event-sourced ledger for the lifecycle of
//! fuzzy-to-authoritative knowledge: proposals, promotions, evidence, facts
//! (including bridge triples), reviewer/agent actions, and derivation chains.
//!
//! Every write passes through the same pipeline (see [`store`]): schema
//! validation ([`validate`]), referential-integrity boundary checks, duplicate
//! suppression, and a durable append-only audit trail ([`audit`]). Nothing is ever
//! mutated in place -- corrections are new records, and the audit log is the
//! source of truth for reconstructing what happened to a given id ([`timeline`]).
//!
//! ```no_run
//! use sidecar_ledger::{Ledger, LedgerConfig};
//! use sidecar_ledger::event::{ProposalInput, ProposalStatus};
//!
//! let ledger = Ledger::open(LedgerConfig::new("./log"))?;
//! ledger.record_proposal(ProposalInput {
//!     id: "p-1".to_string(),
//!     kind: "claim".to_string(),
//!     target_id: None,
//!     status: ProposalStatus::Pending,
//!     score: 0.42,
//!     method: "ann".to_string(),
//!     evidence: vec![],
//!     created_at: None,
//! })?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audit;
pub mod chain;
pub mod clock;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod store;
pub mod timeline;
pub mod validate;

pub use audit::{read_audit_log, AuditEntry, AuditSink, AuditType};
pub use clock::{Clock, FakeClock, SystemClock};
pub use config::LedgerConfig;
pub use error::{ErrorKind, FieldError, LedgerError};
pub use event::{
    Action, ActionInput, BridgeTriple, BridgeTripleInput, Chain, ChainInput, ChainStep, Evidence,
    EvidenceInput, EvidenceTarget, Event, EventType, Fact, FactInput, Gate, Promotion,
    PromotionInput, Proposal, ProposalInput, ProposalStatus, Softness, StepType, TargetType,
    BRIDGE_TRIPLE_KIND,
};
pub use ids::{IdGenerator, SequentialIdGenerator, Uuid7IdGenerator};
pub use store::{
    ActionOutcome, BridgeTripleOutcome, ChainOutcome, EvidenceOutcome, FactOutcome, Ledger,
    PromotionOutcome, ProposalOutcome,
};
pub use timeline::{failure_reasons, timeline, TimelineEvent, TimelineOutcome};
