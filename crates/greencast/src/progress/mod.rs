//! Recorded case progress and forecast re-anchoring.
//!
//! Progress records are caller-owned values; every update operation
//! returns a new record. Re-anchoring takes the current moment as an
//! explicit parameter so it stays reproducible.

mod reanchor;
mod receipt;
mod record;

pub use reanchor::{reanchor, ReanchoredPath, StageRemaining};
pub use receipt::{ReceiptNumber, ServiceCenter};
pub use record::{CaseProgress, ProgressStatus, StageProgress};
