use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info_span};

use crate::catalog::{Catalog, StageId};
use crate::duration::DurationRange;
use crate::feeds::{Chargeability, VelocityAssumptions, VisaBulletin};
use crate::progress::record::{CaseProgress, ProgressStatus, StageProgress};
use crate::timeline::{schedule, ComposedPath, ScheduleItem, Stage};
use crate::timeutil::months_between;
use crate::velocity::estimate_wait;

/// Remaining-time summary for one stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRemaining {
    pub stage: StageId,
    pub status: ProgressStatus,
    /// Months already spent in this stage (zero when not yet filed).
    pub elapsed_months: f64,
    pub remaining: DurationRange,
    /// A queue wait whose cutoff has since passed.
    pub resolved_wait: bool,
}

/// A composed path revised against recorded real-world progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReanchoredPath {
    pub path: ComposedPath,
    pub remaining: BTreeMap<StageId, StageRemaining>,
    /// Whether offsets are measured forward from `now` (true once any
    /// green-card-track stage has progress) or from the original path
    /// origin.
    pub anchored_to_now: bool,
    pub total_remaining: DurationRange,
}

/// Revise a composed path against recorded progress.
///
/// Per green-card-track stage, in sequence order: approved stages
/// contribute nothing; filed stages contribute their estimate net of time
/// already elapsed, floored at zero; untouched stages contribute their full
/// estimate. Concurrent stages bound the running total instead of adding
/// to it. Until the first green-card-track milestone exists the original
/// offsets are preserved; from then on everything is measured forward from
/// `now`.
pub fn reanchor(
    path: &ComposedPath,
    progress: &CaseProgress,
    catalog: &Catalog,
    assumptions: &VelocityAssumptions,
    bulletin: Option<&VisaBulletin>,
    chargeability: Chargeability,
    now: NaiveDate,
) -> ReanchoredPath {
    let _span = info_span!("reanchor", pathway = %path.id).entered();

    let anchored = progress.has_gc_progress(catalog);

    if !anchored {
        let remaining = path
            .stages
            .iter()
            .map(|stage| {
                (
                    stage.id,
                    StageRemaining {
                        stage: stage.id,
                        status: ProgressStatus::NotStarted,
                        elapsed_months: 0.0,
                        remaining: stage.duration.clone(),
                        resolved_wait: false,
                    },
                )
            })
            .collect();
        return ReanchoredPath {
            path: path.clone(),
            remaining,
            anchored_to_now: false,
            total_remaining: path.total.clone(),
        };
    }

    let effective_pd = progress.effective_priority_date(catalog);

    let revised: Vec<(Stage, StageRemaining)> = path
        .stages
        .iter()
        .map(|stage| {
            revise_stage(
                stage,
                progress.record(stage.id),
                effective_pd,
                path,
                assumptions,
                bulletin,
                chargeability,
                now,
            )
        })
        .collect();

    let items: Vec<ScheduleItem> = revised
        .iter()
        .map(|(stage, remaining)| ScheduleItem {
            track: stage.track,
            concurrent: stage.concurrent,
            min_months: remaining.remaining.min_months(),
            max_months: remaining.remaining.max_months(),
        })
        .collect();
    let offsets = schedule(&items, None);

    let mut stages = Vec::with_capacity(revised.len());
    let mut remaining_map = BTreeMap::new();
    let mut total_remaining = DurationRange::zero();
    for ((mut stage, summary), scheduled) in revised.into_iter().zip(offsets) {
        stage.start_offset_months = scheduled.start_max;
        stage.duration = summary.remaining.clone();
        if stage.id == StageId::GreenCard {
            total_remaining = DurationRange::new(scheduled.start_min, scheduled.start_max);
        }
        remaining_map.insert(stage.id, summary);
        stages.push(stage);
    }

    debug!(
        pathway = %path.id,
        remaining_months = total_remaining.max_months(),
        "re-anchored"
    );

    let path = ComposedPath {
        stages,
        total: total_remaining.clone(),
        ..path.clone()
    };

    ReanchoredPath {
        path,
        remaining: remaining_map,
        anchored_to_now: true,
        total_remaining,
    }
}

#[allow(clippy::too_many_arguments)]
fn revise_stage(
    stage: &Stage,
    record: Option<&StageProgress>,
    effective_pd: Option<NaiveDate>,
    path: &ComposedPath,
    assumptions: &VelocityAssumptions,
    bulletin: Option<&VisaBulletin>,
    chargeability: Chargeability,
    now: NaiveDate,
) -> (Stage, StageRemaining) {
    if stage.queue_wait {
        return revise_queue_wait(
            stage,
            effective_pd,
            path,
            assumptions,
            bulletin,
            chargeability,
        );
    }

    let status = record.map(|r| r.status).unwrap_or_default();
    let (elapsed, remaining) = match status {
        ProgressStatus::Approved => (stage.duration.max_months(), DurationRange::zero()),
        ProgressStatus::Filed => match record.and_then(|r| r.filed) {
            Some(filed) => {
                // A filed date in the future counts as zero elapsed.
                let elapsed = months_between(filed, now).max(0.0);
                let remaining = DurationRange::new(
                    (stage.duration.min_months() - elapsed).max(0.0),
                    (stage.duration.max_months() - elapsed).max(0.0),
                );
                (elapsed, remaining)
            }
            // Filed but no usable date: fall back to the full estimate.
            None => (0.0, stage.duration.clone()),
        },
        ProgressStatus::NotStarted => (0.0, stage.duration.clone()),
    };

    let summary = StageRemaining {
        stage: stage.id,
        status,
        elapsed_months: elapsed,
        remaining,
        resolved_wait: false,
    };
    (stage.clone(), summary)
}

/// Recompute a queue wait from the effective priority date. A wait whose
/// cutoff has since passed is kept but marked resolved, preserving the
/// timeline's history.
fn revise_queue_wait(
    stage: &Stage,
    effective_pd: Option<NaiveDate>,
    path: &ComposedPath,
    assumptions: &VelocityAssumptions,
    bulletin: Option<&VisaBulletin>,
    chargeability: Chargeability,
) -> (Stage, StageRemaining) {
    let keep_composed = |stage: &Stage| {
        let summary = StageRemaining {
            stage: stage.id,
            status: ProgressStatus::NotStarted,
            elapsed_months: 0.0,
            remaining: stage.duration.clone(),
            resolved_wait: false,
        };
        (stage.clone(), summary)
    };

    // Without an established priority date or bulletin data there is
    // nothing to recompute against; the composed estimate stands.
    let Some(pd) = effective_pd else {
        return keep_composed(stage);
    };
    let Some(cutoff) = bulletin.and_then(|b| b.final_action.cutoff(path.category, chargeability))
    else {
        return keep_composed(stage);
    };

    match estimate_wait(pd, cutoff, chargeability, path.category, assumptions) {
        Ok(estimate) if estimate.is_current() => {
            let mut revised = stage.clone();
            revised.resolved = true;
            revised.wait = Some(estimate);
            let summary = StageRemaining {
                stage: stage.id,
                status: ProgressStatus::Approved,
                elapsed_months: stage.duration.max_months(),
                remaining: DurationRange::zero(),
                resolved_wait: true,
            };
            (revised, summary)
        }
        Ok(estimate) => {
            let mut revised = stage.clone();
            let remaining = DurationRange::new(estimate.range_min, estimate.range_max);
            revised.wait = Some(estimate);
            let summary = StageRemaining {
                stage: stage.id,
                status: ProgressStatus::NotStarted,
                elapsed_months: 0.0,
                remaining,
                resolved_wait: false,
            };
            (revised, summary)
        }
        // Broken assumptions would already have failed composition; keep
        // the composed figure rather than losing the stage.
        Err(_) => keep_composed(stage),
    }
}
