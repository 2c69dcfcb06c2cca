pub mod catalog;
pub mod duration;
pub mod eligibility;
pub mod error;
pub mod feeds;
pub mod profile;
pub mod progress;
pub mod timeline;
pub mod timeutil;
pub mod tracked;
pub mod velocity;
pub mod worker;

pub use catalog::{default_catalog, load_catalog, Catalog, GcCategory, PathwayTemplate, StageId};
pub use duration::{DurationRange, DurationResolver};
pub use error::{CatalogError, GreencastError, Result, VelocityError};
pub use feeds::{Chargeability, Cutoff, ProcessingTimes, VelocityAssumptions, VisaBulletin};
pub use profile::{Country, EducationLevel, ExperienceBand, Profile, SpecialFlags, VisaStatus};
pub use progress::{reanchor, CaseProgress, ProgressStatus, ReanchoredPath, StageProgress};
pub use timeline::{ComposedPath, Composer, Stage};
pub use tracked::{TrackedCase, TrackedCaseBuilder};
pub use velocity::{estimate_wait, WaitEstimate};
pub use worker::compose_parallel;
