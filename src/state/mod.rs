//! Request state
//!
//! Handles:
//! - Pending request entries keyed by request identity
//! - Submission height and gas price bookkeeping

mod store;

pub use store::{PendingEntry, RequestStore};
