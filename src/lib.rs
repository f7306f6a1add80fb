//! Credit Relay — WhatsApp credit requests routed to a manager for approval.

pub mod channels;
pub mod config;
pub mod error;
pub mod relay;
