use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::GcCategory;
use crate::error::CatalogError;
use crate::feeds::Chargeability;

const ASSUMPTIONS_SCHEMA: &str = include_str!("../../../../schema/velocity-assumptions-v1.json");
const BUILTIN_ASSUMPTIONS: &str = include_str!("../../data/velocity-assumptions.json");

/// Constants behind the velocity model: demand multipliers, country shares,
/// annual certification volumes. These are the model's explainability
/// surface; every estimate names the figures it used.
///
/// The builtin numbers are derived from DOL PERM disclosure files and the
/// DOS annual report of immigrant visa issuances; callers with fresher
/// figures can load their own document of the same shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VelocityAssumptions {
    pub version: String,
    /// Visas consumed per principal applicant (principal + derivatives).
    pub dependents_multiplier: f64,
    /// Statutory per-country ceiling as a fraction of each category.
    pub per_country_cap: f64,
    /// Total employment-based visas available per fiscal year.
    pub statutory_employment_total: f64,
    pub category: BTreeMap<GcCategory, CategoryAssumptions>,
    pub country_demand_share: BTreeMap<Chargeability, f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryAssumptions {
    /// Labor certifications / petitions approved per year in this category.
    pub annual_certifications: f64,
    /// This category's fraction of the statutory employment total.
    pub allocation_share: f64,
}

impl VelocityAssumptions {
    /// The assumption set shipped with the crate.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json_str(BUILTIN_ASSUMPTIONS)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        let json_value: serde_json::Value = serde_json::from_str(content)?;

        validate_schema(&json_value)?;

        let assumptions: VelocityAssumptions = serde_json::from_value(json_value)?;

        validate_assumptions(&assumptions)?;

        Ok(assumptions)
    }

    /// Demand share for a chargeability area, falling back to the
    /// rest-of-world residual when a country is missing from the table.
    pub fn demand_share(&self, country: Chargeability) -> f64 {
        if let Some(share) = self.country_demand_share.get(&country) {
            return *share;
        }
        warn!(country = %country, "no demand share recorded, using rest-of-world residual");
        self.country_demand_share
            .get(&Chargeability::RestOfWorld)
            .copied()
            .unwrap_or(1.0)
    }
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), CatalogError> {
    let schema: serde_json::Value =
        serde_json::from_str(ASSUMPTIONS_SCHEMA).map_err(|e| CatalogError::Validation {
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

fn validate_assumptions(a: &VelocityAssumptions) -> Result<(), CatalogError> {
    if a.version != "1.0" {
        return Err(CatalogError::Validation {
            message: format!("Unsupported assumptions version: {}", a.version),
        });
    }
    if a.dependents_multiplier < 1.0 || !a.dependents_multiplier.is_finite() {
        return Err(CatalogError::Validation {
            message: "dependentsMultiplier must be at least 1".to_string(),
        });
    }
    if !(0.0..=1.0).contains(&a.per_country_cap) {
        return Err(CatalogError::Validation {
            message: "perCountryCap must be a fraction in [0, 1]".to_string(),
        });
    }
    if a.statutory_employment_total <= 0.0 {
        return Err(CatalogError::Validation {
            message: "statutoryEmploymentTotal must be positive".to_string(),
        });
    }
    for (category, cat) in &a.category {
        if cat.annual_certifications <= 0.0 || !(0.0..=1.0).contains(&cat.allocation_share) {
            return Err(CatalogError::Validation {
                message: format!("Invalid figures for category '{}'", category),
            });
        }
    }
    for (country, share) in &a.country_demand_share {
        if !(0.0..=1.0).contains(share) {
            return Err(CatalogError::Validation {
                message: format!("Demand share for '{}' must be a fraction in [0, 1]", country),
            });
        }
    }
    Ok(())
}
