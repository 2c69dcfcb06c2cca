//! Stage duration resolution: live agency data first, static fallbacks
//! otherwise.
//!
//! Queue-bound stages are deliberately not handled here; their length comes
//! from the velocity model.

use serde::Serialize;
use tracing::warn;

use crate::catalog::{StageDef, StageId};
use crate::feeds::{ProcessingTimes, ServiceTier};
use crate::timeutil::DAYS_PER_MONTH;

/// A validated min/max duration in months plus a human-readable rendering.
/// `min <= max` always holds; an inverted pair from upstream is a
/// data-integrity defect and is rejected before it gets here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DurationRange {
    min_months: f64,
    max_months: f64,
    display: String,
}

impl DurationRange {
    pub fn new(min_months: f64, max_months: f64) -> Self {
        debug_assert!(
            min_months.is_finite() && max_months.is_finite(),
            "non-finite duration range {}..{}",
            min_months,
            max_months
        );
        debug_assert!(
            min_months >= 0.0 && min_months <= max_months,
            "inverted duration range {}..{}",
            min_months,
            max_months
        );
        let min = if min_months.is_finite() { min_months.max(0.0) } else { 0.0 };
        let max = if max_months.is_finite() { max_months.max(min) } else { min };
        Self {
            min_months: min,
            max_months: max,
            display: humanize_months(min, max),
        }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0)
    }

    pub fn min_months(&self) -> f64 {
        self.min_months
    }

    pub fn max_months(&self) -> f64 {
        self.max_months
    }

    pub fn display(&self) -> &str {
        &self.display
    }

    pub fn is_zero(&self) -> bool {
        self.max_months == 0.0
    }
}

/// Renders a month range the way the timeline labels it: "~6 months",
/// "12-18 months", "2-4 years".
fn humanize_months(min: f64, max: f64) -> String {
    if max == 0.0 {
        return "done".to_string();
    }
    if max < 1.0 {
        return "under a month".to_string();
    }
    if max >= 24.0 {
        let min_years = (min / 12.0 * 10.0).round() / 10.0;
        let max_years = (max / 12.0 * 10.0).round() / 10.0;
        if (max_years - min_years).abs() < 0.05 {
            return format!("~{} years", trim_fraction(max_years));
        }
        return format!("{}-{} years", trim_fraction(min_years), trim_fraction(max_years));
    }
    let min_m = min.round() as i64;
    let max_m = max.round() as i64;
    if min_m == max_m {
        return format!("~{} months", max_m);
    }
    format!("{}-{} months", min_m, max_m)
}

fn trim_fraction(v: f64) -> String {
    if (v - v.round()).abs() < 0.05 {
        format!("{}", v.round() as i64)
    } else {
        format!("{:.1}", v)
    }
}

/// Resolves a stage's duration from live processing-time data, falling back
/// to the catalog's static range whenever the live figures are missing,
/// non-finite, or inverted.
pub struct DurationResolver<'a> {
    live: Option<&'a ProcessingTimes>,
}

impl<'a> DurationResolver<'a> {
    pub fn new(live: Option<&'a ProcessingTimes>) -> Self {
        Self { live }
    }

    /// Duration for a stage at the standard service tier.
    pub fn resolve(&self, def: &StageDef) -> DurationRange {
        self.resolve_tier(def, ServiceTier::Standard)
    }

    /// Duration for a stage at a specific service tier. Only petition
    /// stages with premium processing distinguish tiers.
    pub fn resolve_tier(&self, def: &StageDef, tier: ServiceTier) -> DurationRange {
        if def.queue_wait {
            return DurationRange::zero();
        }

        let live = match def.id {
            StageId::Pwd => self.dol_pwd(),
            StageId::Perm => self.dol_perm(def),
            StageId::I140 => self.uscis_range("I-140", tier),
            StageId::I130 => self.uscis_range("I-130", tier),
            StageId::I526 => self.uscis_range("I-526", tier),
            StageId::I485 => self.uscis_range("I-485", tier),
            _ => None,
        };

        match live {
            Some(range) => range,
            None => fallback_range(def),
        }
    }

    fn dol_pwd(&self) -> Option<DurationRange> {
        let pwd = self.live?.dol.as_ref()?.pwd.as_ref()?;
        let months = pwd.estimated_months?;
        if !months.is_finite() || months < 0.0 {
            warn!(months, "ignoring bad DOL PWD estimate");
            return None;
        }
        Some(DurationRange::new(months, months))
    }

    /// PERM spans analyst review (the normal path) through audit review
    /// (the slow path), so those two queues bound the range.
    fn dol_perm(&self, def: &StageDef) -> Option<DurationRange> {
        let perm = self.live?.dol.as_ref()?.perm.as_ref()?;
        let analyst = perm
            .analyst_review
            .as_ref()
            .and_then(|q| q.average_days)
            .map(|d| d / DAYS_PER_MONTH);
        let audit = perm
            .audit_review
            .as_ref()
            .and_then(|q| q.average_days)
            .map(|d| d / DAYS_PER_MONTH);

        match (analyst, audit) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() && 0.0 <= a && a <= b => {
                Some(DurationRange::new(a, b))
            }
            (Some(a), _) if a.is_finite() && a >= 0.0 => {
                Some(DurationRange::new(a, a.max(def.fallback_months.max)))
            }
            (Some(_), _) | (None, Some(_)) => {
                warn!(stage = %def.id, "ignoring inconsistent DOL PERM figures");
                None
            }
            (None, None) => None,
        }
    }

    /// Duration narrowed to one service center, e.g. the one a receipt
    /// number names. Falls back to the all-center range, then to statics.
    pub fn resolve_for_center(&self, def: &StageDef, center: &str) -> DurationRange {
        let form = match def.id {
            StageId::I140 => "I-140",
            StageId::I130 => "I-130",
            StageId::I526 => "I-526",
            StageId::I485 => "I-485",
            _ => return self.resolve(def),
        };
        self.uscis_range_filtered(form, ServiceTier::Standard, Some(center))
            .unwrap_or_else(|| self.resolve(def))
    }

    fn uscis_range(&self, form: &str, tier: ServiceTier) -> Option<DurationRange> {
        self.uscis_range_filtered(form, tier, None)
    }

    fn uscis_range_filtered(
        &self,
        form: &str,
        tier: ServiceTier,
        center: Option<&str>,
    ) -> Option<DurationRange> {
        let entries = self.live?.uscis.form(form);

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for entry in entries {
            // Entries without an explicit tier are standard processing.
            let entry_tier = entry.tier.unwrap_or(ServiceTier::Standard);
            if entry_tier != tier {
                continue;
            }
            if let Some(wanted) = center {
                let matches_center = entry
                    .service_center
                    .as_deref()
                    .map(|c| c.eq_ignore_ascii_case(wanted))
                    .unwrap_or(false);
                if !matches_center {
                    continue;
                }
            }
            let range = entry.processing_time;
            if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 || range.min > range.max
            {
                warn!(form, ?range, "skipping inverted or non-finite processing-time entry");
                continue;
            }
            min = min.min(range.min);
            max = max.max(range.max);
        }

        if min.is_finite() && max.is_finite() {
            Some(DurationRange::new(min, max))
        } else {
            None
        }
    }
}

fn fallback_range(def: &StageDef) -> DurationRange {
    DurationRange::new(def.fallback_months.min, def.fallback_months.max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;

    fn live_times() -> ProcessingTimes {
        serde_json::from_str(
            r#"
            {
                "uscis": {
                    "forms": {
                        "I-140": [
                            { "serviceCenter": "Texas Service Center",
                              "processingTime": { "min": 7.0, "max": 10.5 } },
                            { "serviceCenter": "Nebraska Service Center",
                              "processingTime": { "min": 6.0, "max": 9.0 } },
                            { "tier": "premium",
                              "processingTime": { "min": 0.5, "max": 0.5 } }
                        ],
                        "I-485": [
                            { "processingTime": { "min": 20.0, "max": 9.0 } }
                        ]
                    }
                },
                "dol": {
                    "pwd": { "estimatedMonths": 6.5 },
                    "perm": {
                        "analystReview": { "averageDays": 456.6 },
                        "auditReview": { "averageDays": 608.8 }
                    }
                }
            }
            "#,
        )
        .unwrap()
    }

    #[test]
    fn test_uscis_standard_spans_centers() {
        let catalog = default_catalog().unwrap();
        let times = live_times();
        let resolver = DurationResolver::new(Some(&times));
        let range = resolver.resolve(catalog.stage(StageId::I140));
        assert_eq!(range.min_months(), 6.0);
        assert_eq!(range.max_months(), 10.5);
    }

    #[test]
    fn test_center_specific_range() {
        let catalog = default_catalog().unwrap();
        let times = live_times();
        let resolver = DurationResolver::new(Some(&times));
        let def = catalog.stage(StageId::I140);

        let texas = resolver.resolve_for_center(def, "Texas Service Center");
        assert_eq!(texas.min_months(), 7.0);
        assert_eq!(texas.max_months(), 10.5);

        // Unknown center falls back to the all-center range.
        let unknown = resolver.resolve_for_center(def, "Atlantis Service Center");
        assert_eq!(unknown.min_months(), 6.0);
        assert_eq!(unknown.max_months(), 10.5);
    }

    #[test]
    fn test_premium_tier() {
        let catalog = default_catalog().unwrap();
        let times = live_times();
        let resolver = DurationResolver::new(Some(&times));
        let range = resolver.resolve_tier(catalog.stage(StageId::I140), ServiceTier::Premium);
        assert_eq!(range.max_months(), 0.5);
    }

    #[test]
    fn test_inverted_live_entry_falls_back() {
        let catalog = default_catalog().unwrap();
        let times = live_times();
        let resolver = DurationResolver::new(Some(&times));
        let def = catalog.stage(StageId::I485);
        let range = resolver.resolve(def);
        assert_eq!(range.min_months(), def.fallback_months.min);
        assert_eq!(range.max_months(), def.fallback_months.max);
    }

    #[test]
    fn test_perm_spans_analyst_to_audit() {
        let catalog = default_catalog().unwrap();
        let times = live_times();
        let resolver = DurationResolver::new(Some(&times));
        let range = resolver.resolve(catalog.stage(StageId::Perm));
        assert!((range.min_months() - 15.0).abs() < 0.1);
        assert!((range.max_months() - 20.0).abs() < 0.1);
    }

    #[test]
    fn test_no_live_data_uses_fallback() {
        let catalog = default_catalog().unwrap();
        let resolver = DurationResolver::new(None);
        let def = catalog.stage(StageId::Perm);
        let range = resolver.resolve(def);
        assert_eq!(range.min_months(), 12.0);
        assert_eq!(range.max_months(), 18.0);
    }

    #[test]
    fn test_queue_wait_resolves_to_zero() {
        let catalog = default_catalog().unwrap();
        let resolver = DurationResolver::new(None);
        assert!(resolver.resolve(catalog.stage(StageId::PdWait)).is_zero());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(DurationRange::new(12.0, 18.0).display(), "12-18 months");
        assert_eq!(DurationRange::new(6.5, 6.5).display(), "~7 months"); // rounds
        assert_eq!(DurationRange::new(24.0, 48.0).display(), "2-4 years");
        assert_eq!(DurationRange::new(0.0, 0.0).display(), "done");
        assert_eq!(DurationRange::new(0.2, 0.8).display(), "under a month");
    }
}
