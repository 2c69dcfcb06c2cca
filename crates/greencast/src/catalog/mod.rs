//! Pathway catalog: stage definitions and pathway templates.
//!
//! The catalog is immutable reference data. It ships embedded in the crate
//! and is validated twice at load time: structurally against a JSON Schema,
//! then semantically (duplicate ids, undefined stage references, inverted
//! fallback ranges). A broken catalog is a defect and fails loudly.

mod loader;
mod schema;

pub use loader::{default_catalog, load_catalog, load_catalog_from_str};
pub use schema::{
    Catalog, CompoundCondition, Condition, FallbackMonths, Flag, GcCategory, PathwayTemplate,
    SimpleCondition, StageDef, StageId, StageRef, Track,
};
