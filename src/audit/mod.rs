//! Audit trail for the gesture sentinel.
//!
//! Keeps running totals of what the engine has seen and decided, so that an
//! operator can check how many gestures were judged and how.

pub mod log;

// Re-export commonly used types
pub use log::{
    create_shared_log, create_shared_log_with_persistence, AuditLog, AuditStats, SharedAuditLog,
};
