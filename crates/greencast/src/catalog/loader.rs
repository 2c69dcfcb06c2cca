use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use tracing::debug;

use crate::catalog::schema::{Catalog, RawCatalog, StageId, Track};
use crate::error::CatalogError;

const CATALOG_SCHEMA: &str = include_str!("../../../../schema/catalog-v1.json");
const DEFAULT_CATALOG: &str = include_str!("../../data/catalog.json");

/// The catalog shipped with the crate.
pub fn default_catalog() -> Result<Catalog, CatalogError> {
    load_catalog_from_str(DEFAULT_CATALOG)
}

/// Load a custom catalog from disk (same format as the embedded one).
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<Catalog, CatalogError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| CatalogError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_catalog_from_str(&content)
}

pub fn load_catalog_from_str(content: &str) -> Result<Catalog, CatalogError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let raw: RawCatalog = serde_json::from_value(json_value)?;

    validate_catalog(&raw)?;

    let mut stages = BTreeMap::new();
    for def in raw.stages {
        stages.insert(def.id, def);
    }
    debug!(
        stages = stages.len(),
        pathways = raw.pathways.len(),
        "catalog loaded"
    );

    Ok(Catalog::new(stages, raw.pathways))
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), CatalogError> {
    let schema: serde_json::Value =
        serde_json::from_str(CATALOG_SCHEMA).map_err(|e| CatalogError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator =
        jsonschema::validator_for(&schema).map_err(|e| CatalogError::Validation {
            message: format!("Failed to compile JSON schema: {}", e),
        })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| format!("{} at {}", e, e.instance_path()))
        .collect();
    if !error_messages.is_empty() {
        return Err(CatalogError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_catalog(raw: &RawCatalog) -> Result<(), CatalogError> {
    if raw.version != "1.0" {
        return Err(CatalogError::Validation {
            message: format!("Unsupported catalog version: {}", raw.version),
        });
    }

    let mut defined: HashSet<StageId> = HashSet::new();
    for def in &raw.stages {
        if !defined.insert(def.id) {
            return Err(CatalogError::InvalidStage {
                stage: def.id.to_string(),
                reason: "Duplicate stage definition".to_string(),
            });
        }
        if !def.fallback_months.min.is_finite()
            || !def.fallback_months.max.is_finite()
            || def.fallback_months.min < 0.0
            || def.fallback_months.min > def.fallback_months.max
        {
            return Err(CatalogError::InvalidStage {
                stage: def.id.to_string(),
                reason: format!(
                    "Inverted or non-finite fallback range {}..{}",
                    def.fallback_months.min, def.fallback_months.max
                ),
            });
        }
        if def.queue_wait && def.track != Track::GreenCard {
            return Err(CatalogError::InvalidStage {
                stage: def.id.to_string(),
                reason: "Queue-wait stages must be on the green-card track".to_string(),
            });
        }
    }

    let stage_track = |id: StageId| raw.stages.iter().find(|d| d.id == id).map(|d| d.track);

    let mut pathway_ids = HashSet::new();
    for pathway in &raw.pathways {
        if !pathway_ids.insert(&pathway.id) {
            return Err(CatalogError::DuplicatePathway {
                id: pathway.id.clone(),
            });
        }

        for stage_ref in &pathway.stages {
            if !defined.contains(&stage_ref.id) {
                return Err(CatalogError::UndefinedStage {
                    pathway: pathway.id.clone(),
                    stage: stage_ref.id.to_string(),
                });
            }
        }

        // Every pathway ends at the finish-line marker.
        let last_gc = pathway
            .stages
            .iter()
            .rev()
            .find(|r| stage_track(r.id) == Some(Track::GreenCard));
        if last_gc.map(|r| r.id) != Some(StageId::GreenCard) {
            return Err(CatalogError::Validation {
                message: format!(
                    "Pathway '{}' must end its green-card track with the greenCard marker",
                    pathway.id
                ),
            });
        }

        if let Some(gate) = pathway.gc_after_status {
            let gated = pathway
                .stages
                .iter()
                .any(|r| r.id == gate && stage_track(r.id) == Some(Track::Status));
            if !gated {
                return Err(CatalogError::Validation {
                    message: format!(
                        "Pathway '{}' gates its green-card track on '{}', which is not one of its status stages",
                        pathway.id, gate
                    ),
                });
            }
        }
    }

    Ok(())
}
