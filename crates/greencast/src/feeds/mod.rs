//! Plain-data shapes the engine consumes from its collaborators.
//!
//! The engine never fetches anything itself: the scraping/caching handlers
//! hand it already-resolved snapshots of these types. Missing or partial
//! feeds degrade the forecast's precision, never its availability.

mod assumptions;
mod bulletin;
mod processing_times;

pub use assumptions::{CategoryAssumptions, VelocityAssumptions};
pub use bulletin::{BulletinTable, Chargeability, Cutoff, VisaBulletin};
pub use processing_times::{
    DolTimes, FormTimeEntry, MonthsRange, PermTimes, ProcessingTimes, PwdTimes, ReviewQueue,
    ServiceTier, UscisTimes,
};
