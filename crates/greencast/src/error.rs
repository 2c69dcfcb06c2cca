use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::GcCategory;

#[derive(Error, Debug)]
pub enum GreencastError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Velocity model error: {0}")]
    Velocity(#[from] VelocityError),
}

/// Errors raised while loading embedded or user-supplied reference data
/// (pathway catalog, velocity assumptions). All of these are defects in the
/// data, not recoverable runtime conditions.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to read catalog file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse reference data JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Catalog validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Duplicate pathway id '{id}'")]
    DuplicatePathway { id: String },

    #[error("Pathway '{pathway}' references stage '{stage}' with no definition")]
    UndefinedStage { pathway: String, stage: String },

    #[error("Invalid stage definition '{stage}': {reason}")]
    InvalidStage { stage: String, reason: String },
}

#[derive(Error, Debug)]
pub enum VelocityError {
    #[error("No velocity assumptions for category '{category}'")]
    MissingCategory { category: GcCategory },

    #[error("Degenerate velocity inputs for category '{category}': {detail}")]
    DegenerateInputs {
        category: GcCategory,
        detail: String,
    },
}

pub type Result<T> = std::result::Result<T, GreencastError>;
