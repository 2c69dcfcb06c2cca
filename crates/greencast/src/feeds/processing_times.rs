use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Live agency processing-time data as published by the caching
/// collaborators. Every field is optional-tolerant: missing pieces degrade
/// to the catalog's static fallbacks, never to an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessingTimes {
    pub uscis: UscisTimes,
    pub dol: Option<DolTimes>,
    /// When the upstream snapshot was taken.
    pub fetched_at: Option<NaiveDate>,
}

/// USCIS form processing times: per-form arrays of per-center (or per-tier)
/// ranges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UscisTimes {
    /// Keyed by form name as published, e.g. "I-140".
    pub forms: BTreeMap<String, Vec<FormTimeEntry>>,
}

impl UscisTimes {
    pub fn form(&self, name: &str) -> &[FormTimeEntry] {
        self.forms.get(name).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ServiceTier {
    Standard,
    Premium,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormTimeEntry {
    #[serde(default)]
    pub service_center: Option<String>,
    #[serde(default)]
    pub tier: Option<ServiceTier>,
    pub processing_time: MonthsRange,
}

/// Raw min/max months as reported upstream. Not validated here; the
/// duration resolver rejects inverted or non-finite ranges and falls back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthsRange {
    pub min: f64,
    pub max: f64,
}

/// DOL-specific figures for prevailing-wage determinations and PERM.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DolTimes {
    pub pwd: Option<PwdTimes>,
    pub perm: Option<PermTimes>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PwdTimes {
    pub estimated_months: Option<f64>,
    /// Month the analysts are currently working through, e.g. "2026-01".
    pub currently_processing: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PermTimes {
    pub analyst_review: Option<ReviewQueue>,
    pub audit_review: Option<ReviewQueue>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReviewQueue {
    pub average_days: Option<f64>,
    pub currently_processing: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_sparse_feed() {
        let json = r#"
        {
            "uscis": {
                "forms": {
                    "I-140": [
                        { "serviceCenter": "Texas Service Center",
                          "tier": "standard",
                          "processingTime": { "min": 7.5, "max": 10.5 } },
                        { "tier": "premium",
                          "processingTime": { "min": 0.5, "max": 0.5 } }
                    ]
                }
            },
            "dol": {
                "pwd": { "estimatedMonths": 6.0 },
                "perm": { "analystReview": { "averageDays": 480 } }
            }
        }
        "#;
        let times: ProcessingTimes = serde_json::from_str(json).unwrap();
        assert_eq!(times.uscis.form("I-140").len(), 2);
        assert_eq!(times.uscis.form("I-485").len(), 0);
        let dol = times.dol.unwrap();
        assert_eq!(dol.pwd.unwrap().estimated_months, Some(6.0));
        assert_eq!(
            dol.perm.unwrap().analyst_review.unwrap().average_days,
            Some(480.0)
        );
    }

    #[test]
    fn test_empty_feed_is_valid() {
        let times: ProcessingTimes = serde_json::from_str("{}").unwrap();
        assert!(times.dol.is_none());
        assert!(times.uscis.forms.is_empty());
    }
}
