//! Queue-wait estimation from historical cutoff velocity.
//!
//! The visa-bulletin cutoff for a category/country advances at a rate set
//! by demand (certifications filed, times family members) against supply
//! (the statutory allocation that country can absorb). Projecting the
//! remaining wait is a matter of dividing the backlog between cutoff and
//! priority date by that advancement rate. The result is deliberately not
//! a black box: every estimate carries the figures it was built from.

use chrono::NaiveDate;
use serde::Serialize;

use crate::catalog::GcCategory;
use crate::error::VelocityError;
use crate::feeds::{Chargeability, Cutoff, VelocityAssumptions};
use crate::timeutil::months_between;

/// Floor for cutoff advancement, months of movement per year. Keeps a
/// near-zero velocity from projecting a multi-century wait.
pub const MIN_VELOCITY: f64 = 0.5;
/// Ceiling for cutoff advancement: a cutoff cannot usefully advance faster
/// than real time once a date is current.
pub const MAX_VELOCITY: f64 = 12.0;
/// Hard ceiling on any projected wait.
pub const MAX_WAIT_MONTHS: f64 = 600.0;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitEstimate {
    pub estimated_months: f64,
    pub range_min: f64,
    pub range_max: f64,
    /// 0..1, how much to trust this projection.
    pub confidence: f64,
    pub explanation: String,
}

impl WaitEstimate {
    fn zero(confidence: f64, explanation: String) -> Self {
        Self {
            estimated_months: 0.0,
            range_min: 0.0,
            range_max: 0.0,
            confidence,
            explanation,
        }
    }

    pub fn is_current(&self) -> bool {
        self.estimated_months == 0.0
    }
}

/// Estimate the remaining queue wait for a priority date under a bulletin
/// cutoff.
///
/// Returns exactly zero when the cutoff has reached the priority date.
/// Unknown categories are a programmer error, not a silent default.
pub fn estimate_wait(
    priority_date: NaiveDate,
    cutoff: Cutoff,
    country: Chargeability,
    category: GcCategory,
    assumptions: &VelocityAssumptions,
) -> Result<WaitEstimate, VelocityError> {
    if category == GcCategory::FamilyImmediate {
        return Ok(WaitEstimate::zero(
            0.95,
            "Immediate-relative visas are not numerically limited; no queue wait.".to_string(),
        ));
    }

    if cutoff.reached(priority_date) {
        let cutoff_text = match cutoff.date() {
            Some(d) => format!("cutoff {}", d.format("%Y-%m-%d")),
            None => "a current cutoff".to_string(),
        };
        return Ok(WaitEstimate::zero(
            0.95,
            format!(
                "Priority date {} is current under {}.",
                priority_date.format("%Y-%m-%d"),
                cutoff_text
            ),
        ));
    }

    // reached() is false, so the cutoff must carry a date earlier than the
    // priority date.
    let cutoff_date = cutoff
        .date()
        .expect("a non-current cutoff carries a date");
    let backlog_months = months_between(cutoff_date, priority_date).max(0.0);

    let cat = assumptions
        .category
        .get(&category)
        .ok_or(VelocityError::MissingCategory { category })?;

    let demand_share = assumptions.demand_share(country);
    let demand =
        cat.annual_certifications * assumptions.dependents_multiplier * demand_share;
    let supply_share = match country {
        Chargeability::RestOfWorld => {
            (1.0 - assumptions.per_country_cap * Chargeability::CAPPED_AREAS as f64)
                .max(assumptions.per_country_cap)
        }
        _ => assumptions.per_country_cap,
    };
    let supply = assumptions.statutory_employment_total * cat.allocation_share * supply_share;

    if demand <= 0.0 || !demand.is_finite() || !supply.is_finite() {
        return Err(VelocityError::DegenerateInputs {
            category,
            detail: format!("demand {} / supply {}", demand, supply),
        });
    }

    let raw_velocity = 12.0 * supply / demand;
    let velocity = raw_velocity.clamp(MIN_VELOCITY, MAX_VELOCITY);
    let clamped = raw_velocity != velocity;

    let wait = (backlog_months / velocity * 12.0).clamp(0.0, MAX_WAIT_MONTHS);
    let range_min = (wait * 0.75).max(0.0);
    let range_max = (wait * 1.25).min(MAX_WAIT_MONTHS);

    let mut confidence: f64 = 0.7;
    if country == Chargeability::RestOfWorld {
        // The residual column averages many dissimilar countries.
        confidence -= 0.15;
    }
    if clamped || wait >= MAX_WAIT_MONTHS {
        confidence -= 0.1;
    }
    let confidence = confidence.clamp(0.3, 0.95);

    let explanation = format!(
        "{} for {}: cutoff {} trails priority date {} by {:.0} months. \
         Demand ~{:.0} visas/yr ({:.0} certifications x {:.1} family factor x {:.0}% \
         country share) against ~{:.0} visas/yr of supply, so the cutoff advances \
         ~{:.1} months per year.",
        category,
        country,
        cutoff_date.format("%Y-%m-%d"),
        priority_date.format("%Y-%m-%d"),
        backlog_months,
        demand,
        cat.annual_certifications,
        assumptions.dependents_multiplier,
        demand_share * 100.0,
        supply,
        velocity,
    );

    Ok(WaitEstimate {
        estimated_months: wait,
        range_min,
        range_max,
        confidence,
        explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn assumptions() -> VelocityAssumptions {
        VelocityAssumptions::builtin().unwrap()
    }

    #[test]
    fn test_pd_equal_to_cutoff_is_current() {
        let estimate = estimate_wait(
            date(2012, 5, 1),
            Cutoff::Date(date(2012, 5, 1)),
            Chargeability::India,
            GcCategory::Eb2,
            &assumptions(),
        )
        .unwrap();
        assert_eq!(estimate.estimated_months, 0.0);
        assert!(estimate.is_current());
    }

    #[test]
    fn test_current_cutoff_is_zero() {
        let estimate = estimate_wait(
            date(2026, 1, 1),
            Cutoff::Current,
            Chargeability::RestOfWorld,
            GcCategory::Eb2,
            &assumptions(),
        )
        .unwrap();
        assert_eq!(estimate.estimated_months, 0.0);
    }

    #[test]
    fn test_backlogged_india_waits_longer_than_rest_of_world() {
        let a = assumptions();
        let cutoff = Cutoff::Date(date(2024, 1, 1));
        let pd = date(2025, 1, 1);

        let india = estimate_wait(pd, cutoff, Chargeability::India, GcCategory::Eb2, &a).unwrap();
        let row =
            estimate_wait(pd, cutoff, Chargeability::RestOfWorld, GcCategory::Eb2, &a).unwrap();

        assert!(india.estimated_months > row.estimated_months);
        assert!(india.estimated_months > 0.0);
        assert!(india.range_min <= india.estimated_months);
        assert!(india.range_max >= india.estimated_months);
    }

    #[test]
    fn test_never_negative_and_bounded() {
        let a = assumptions();
        let estimate = estimate_wait(
            date(2026, 1, 1),
            Cutoff::Date(date(1990, 1, 1)),
            Chargeability::India,
            GcCategory::Eb2,
            &a,
        )
        .unwrap();
        assert!(estimate.estimated_months >= 0.0);
        assert!(estimate.estimated_months <= MAX_WAIT_MONTHS);
        assert!(estimate.range_min >= 0.0);
        assert!(estimate.range_max <= MAX_WAIT_MONTHS);
    }

    #[test]
    fn test_unknown_category_fails_loudly() {
        let mut a = assumptions();
        a.category.remove(&GcCategory::Eb2);
        let result = estimate_wait(
            date(2026, 1, 1),
            Cutoff::Date(date(2020, 1, 1)),
            Chargeability::India,
            GcCategory::Eb2,
            &a,
        );
        assert!(matches!(
            result,
            Err(VelocityError::MissingCategory { .. })
        ));
    }

    #[test]
    fn test_family_immediate_has_no_queue() {
        let estimate = estimate_wait(
            date(2026, 1, 1),
            Cutoff::Date(date(2000, 1, 1)),
            Chargeability::India,
            GcCategory::FamilyImmediate,
            &assumptions(),
        )
        .unwrap();
        assert_eq!(estimate.estimated_months, 0.0);
    }

    #[test]
    fn test_explanation_names_assumptions() {
        let estimate = estimate_wait(
            date(2026, 1, 1),
            Cutoff::Date(date(2012, 5, 1)),
            Chargeability::India,
            GcCategory::Eb2,
            &assumptions(),
        )
        .unwrap();
        assert!(estimate.explanation.contains("family factor"));
        assert!(estimate.explanation.contains("country share"));
    }
}
