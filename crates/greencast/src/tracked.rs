//! Tracked-case builder: one real in-progress case with explicit milestone
//! dates, producing the same timeline shape as the generic composer.

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info_span};

use crate::catalog::{
    Catalog, CompoundCondition, Condition, GcCategory, PathwayTemplate, StageId, StageRef,
};
use crate::duration::DurationResolver;
use crate::error::Result;
use crate::feeds::{Chargeability, ProcessingTimes, VelocityAssumptions, VisaBulletin};
use crate::progress::{reanchor, CaseProgress, ReanchoredPath, StageProgress};
use crate::timeline::Composer;
use crate::timeutil::{months_between, DAYS_PER_MONTH};

/// A single real case: category, chargeability, and whatever milestone
/// dates the user has recorded so far.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedCase {
    pub category: GcCategory,
    pub chargeability: Chargeability,
    /// Explicit priority date, when known. Otherwise it is derived from
    /// the PD-establishing milestone, or projected from remaining
    /// prerequisite durations.
    #[serde(default, with = "crate::timeutil::lenient_date")]
    pub priority_date: Option<NaiveDate>,
    /// Self-petitioned employment cases (NIW, EB-1A) skip labor
    /// certification.
    #[serde(default)]
    pub self_petitioned: bool,
    #[serde(default)]
    pub milestones: BTreeMap<StageId, StageProgress>,
}

impl TrackedCase {
    /// The stage sequence this case runs through.
    fn stage_sequence(&self) -> Vec<StageRef> {
        let seq: &[(StageId, bool)] = match self.category {
            GcCategory::Eb2 | GcCategory::Eb3 if !self.self_petitioned => &[
                (StageId::Pwd, false),
                (StageId::Perm, false),
                (StageId::I140, false),
                (StageId::PdWait, false),
                (StageId::I485, false),
                (StageId::GreenCard, false),
            ],
            GcCategory::Eb1 | GcCategory::Eb2 | GcCategory::Eb3 => &[
                (StageId::I140, false),
                (StageId::PdWait, false),
                (StageId::I485, false),
                (StageId::GreenCard, false),
            ],
            GcCategory::Eb5 => &[
                (StageId::I526, false),
                (StageId::PdWait, false),
                (StageId::I485, false),
                (StageId::GreenCard, false),
            ],
            GcCategory::FamilyImmediate => &[
                (StageId::I130, false),
                (StageId::I485, true),
                (StageId::GreenCard, false),
            ],
        };
        seq.iter()
            .map(|&(id, concurrent)| StageRef { id, concurrent })
            .collect()
    }
}

pub struct TrackedCaseBuilder<'a> {
    catalog: &'a Catalog,
    composer: Composer<'a>,
    resolver: DurationResolver<'a>,
    assumptions: &'a VelocityAssumptions,
    bulletin: Option<&'a VisaBulletin>,
}

impl<'a> TrackedCaseBuilder<'a> {
    pub fn new(
        catalog: &'a Catalog,
        processing_times: Option<&'a ProcessingTimes>,
        assumptions: &'a VelocityAssumptions,
        bulletin: Option<&'a VisaBulletin>,
    ) -> Self {
        Self {
            catalog,
            composer: Composer::new(catalog, processing_times, assumptions, bulletin),
            resolver: DurationResolver::new(processing_times),
            assumptions,
            bulletin,
        }
    }

    /// Build the case timeline: compose the category's stage sequence
    /// against the case's (possibly projected) priority date, then
    /// re-anchor it on the recorded milestones.
    pub fn build(&self, case: &TrackedCase, now: NaiveDate) -> Result<ReanchoredPath> {
        let _span = info_span!("tracked_case", category = %case.category).entered();

        let stages = case.stage_sequence();

        if self.fully_approved(case, &stages) {
            debug!("all milestones approved, emitting done path");
            return Ok(done_path(case));
        }

        let priority_date = self.priority_date_for(case, &stages, now);
        debug!(priority_date = %priority_date, "priority date basis");

        let template = PathwayTemplate {
            id: "tracked-case".to_string(),
            name: format!("Your {} case", case.category),
            category: case.category,
            stages,
            self_petitioned: case.self_petitioned,
            lottery: false,
            gc_after_status: None,
            eligibility: Condition::Compound(CompoundCondition {
                all: Some(Vec::new()),
                any: None,
                not: None,
            }),
        };

        let composed =
            self.composer
                .compose_with_priority_date(&template, case.chargeability, priority_date)?;
        let Some(path) = composed else {
            // A sequence with nothing left to schedule collapses to done.
            return Ok(done_path(case));
        };

        let progress = CaseProgress {
            records: case.milestones.clone(),
            ported_priority_date: Some(priority_date),
            ported_category: Some(case.category),
        };

        Ok(reanchor(
            &path,
            &progress,
            self.catalog,
            self.assumptions,
            self.bulletin,
            case.chargeability,
            now,
        ))
    }

    fn fully_approved(&self, case: &TrackedCase, stages: &[StageRef]) -> bool {
        stages
            .iter()
            .filter(|r| r.id != StageId::GreenCard && r.id != StageId::PdWait)
            .all(|r| {
                case.milestones
                    .get(&r.id)
                    .map(StageProgress::is_approved)
                    .unwrap_or(false)
            })
    }

    /// The priority date used for queue math: explicit, else taken from
    /// the PD-establishing milestone, else projected forward across the
    /// remaining prerequisite stages (an unfiled PERM still needs its PWD
    /// time before it can establish a date).
    fn priority_date_for(
        &self,
        case: &TrackedCase,
        stages: &[StageRef],
        now: NaiveDate,
    ) -> NaiveDate {
        if let Some(pd) = case.priority_date {
            return pd;
        }

        let Some(pd_stage_index) = stages.iter().position(|r| {
            self.catalog
                .stage_opt(r.id)
                .map(|def| def.establishes_priority_date)
                .unwrap_or(false)
        }) else {
            return now;
        };

        let pd_stage = stages[pd_stage_index];
        if let Some(record) = case.milestones.get(&pd_stage.id) {
            if let Some(date) = record.priority_date.or(record.filed) {
                return date;
            }
        }

        // Not filed yet: project the filing date from the prerequisites'
        // remaining time.
        let mut months_ahead = 0.0;
        for stage_ref in &stages[..pd_stage_index] {
            let def = self.catalog.stage(stage_ref.id);
            let duration = self.resolver.resolve(def);
            let record = case.milestones.get(&stage_ref.id);
            let remaining = match record {
                Some(r) if r.is_approved() => 0.0,
                Some(r) if r.is_started() => match r.filed {
                    Some(filed) => {
                        (duration.max_months() - months_between(filed, now).max(0.0)).max(0.0)
                    }
                    None => duration.max_months(),
                },
                _ => duration.max_months(),
            };
            months_ahead += remaining;
        }

        now.checked_add_days(Days::new((months_ahead * DAYS_PER_MONTH).round().max(0.0) as u64))
            .unwrap_or(now)
    }
}

fn done_path(case: &TrackedCase) -> ReanchoredPath {
    let path = crate::timeline::ComposedPath::done(
        "tracked-case",
        format!("Your {} case", case.category),
        case.category,
    );
    let remaining = path
        .stages
        .iter()
        .map(|stage| {
            (
                stage.id,
                crate::progress::StageRemaining {
                    stage: stage.id,
                    status: crate::progress::ProgressStatus::Approved,
                    elapsed_months: 0.0,
                    remaining: crate::duration::DurationRange::zero(),
                    resolved_wait: false,
                },
            )
        })
        .collect();
    ReanchoredPath {
        path,
        remaining,
        anchored_to_now: true,
        total_remaining: crate::duration::DurationRange::zero(),
    }
}
