//! Credit approval relay — classification, correlation, and decision routing.
//!
//! A requester's message is forwarded to the primary manager. The forward's
//! provider message id is the correlation key: when a manager replies
//! "approve" or "decline" to that message, the decision is matched back to
//! the pending request and announced to the requester.

pub mod classifier;
pub mod coordinator;
pub mod model;
pub mod routes;
pub mod store;

pub use classifier::Classifier;
pub use coordinator::{Coordinator, PendingApproval};
pub use model::{
    ApprovalOutcome, ClassifiedEvent, Decision, DecisionState, HandleResult, InboundEvent,
    PendingRequest,
};
pub use routes::{RelayState, relay_routes};
pub use store::CorrelationStore;
