//! Notifier implementations.

pub mod email_relay;
pub mod in_memory;
