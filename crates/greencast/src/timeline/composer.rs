use chrono::NaiveDate;
use tracing::{debug, info_span, warn};

use crate::catalog::{Catalog, PathwayTemplate, StageDef, StageId, Track};
use crate::duration::{DurationRange, DurationResolver};
use crate::error::Result;
use crate::feeds::{Chargeability, ProcessingTimes, VelocityAssumptions, VisaBulletin};
use crate::profile::Profile;
use crate::timeline::path::ComposedPath;
use crate::timeline::stage::{schedule, ScheduleItem, Stage};
use crate::velocity::{estimate_wait, WaitEstimate};

/// The scheduling core: turns eligible pathway templates into concrete
/// timelines.
///
/// Composition is a pure function of its inputs. The reference moment
/// (`as_of`) is an explicit parameter, never the wall clock, so composing
/// the same inputs twice yields identical output.
pub struct Composer<'a> {
    catalog: &'a Catalog,
    resolver: DurationResolver<'a>,
    assumptions: &'a VelocityAssumptions,
    bulletin: Option<&'a VisaBulletin>,
}

struct Planned<'c> {
    def: &'c StageDef,
    concurrent: bool,
    duration: DurationRange,
    wait: Option<WaitEstimate>,
}

impl<'a> Composer<'a> {
    pub fn new(
        catalog: &'a Catalog,
        processing_times: Option<&'a ProcessingTimes>,
        assumptions: &'a VelocityAssumptions,
        bulletin: Option<&'a VisaBulletin>,
    ) -> Self {
        Self {
            catalog,
            resolver: DurationResolver::new(processing_times),
            assumptions,
            bulletin,
        }
    }

    pub fn catalog(&self) -> &'a Catalog {
        self.catalog
    }

    /// Compose every template, dropping the ones that produce no usable
    /// timeline.
    pub fn compose_all(
        &self,
        templates: &[&PathwayTemplate],
        profile: &Profile,
        as_of: NaiveDate,
    ) -> Result<Vec<ComposedPath>> {
        let mut paths = Vec::with_capacity(templates.len());
        for template in templates {
            if let Some(path) = self.compose(template, profile, as_of)? {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    pub fn compose(
        &self,
        template: &PathwayTemplate,
        profile: &Profile,
        as_of: NaiveDate,
    ) -> Result<Option<ComposedPath>> {
        // Someone with a ported priority date keeps their old place in the
        // queue; everyone else joins the back of it today.
        let priority_date = profile
            .prior_case
            .as_ref()
            .map(|prior| prior.priority_date)
            .unwrap_or(as_of);
        self.compose_with_priority_date(template, profile.chargeability(), priority_date)
    }

    /// Compose one template against an explicit priority date. This is the
    /// entry point the tracked-case builder shares.
    pub fn compose_with_priority_date(
        &self,
        template: &PathwayTemplate,
        chargeability: Chargeability,
        priority_date: NaiveDate,
    ) -> Result<Option<ComposedPath>> {
        let _span = info_span!("compose", pathway = %template.id).entered();

        let mut planned: Vec<Planned<'_>> = Vec::with_capacity(template.stages.len());
        for stage_ref in &template.stages {
            let def = self.catalog.stage(stage_ref.id);

            if def.queue_wait {
                let estimate =
                    match self.queue_wait(template, chargeability, priority_date)? {
                        Some(estimate) => estimate,
                        None => continue,
                    };
                planned.push(Planned {
                    def,
                    concurrent: stage_ref.concurrent,
                    duration: DurationRange::new(estimate.range_min, estimate.range_max),
                    wait: Some(estimate),
                });
            } else {
                planned.push(Planned {
                    def,
                    concurrent: stage_ref.concurrent,
                    duration: self.resolver.resolve(def),
                    wait: None,
                });
            }
        }

        let has_work = planned
            .iter()
            .any(|p| p.def.track == Track::GreenCard && p.def.id != StageId::GreenCard);
        if !has_work {
            warn!(pathway = %template.id, "no resolvable stages, dropping pathway");
            return Ok(None);
        }

        self.mark_concurrent_filing(template, chargeability, priority_date, &mut planned);

        let gc_gate = template.gc_after_status.and_then(|gate| {
            planned
                .iter()
                .position(|p| p.def.id == gate && p.def.track == Track::Status)
        });

        let items: Vec<ScheduleItem> = planned
            .iter()
            .map(|p| ScheduleItem {
                track: p.def.track,
                concurrent: p.concurrent,
                min_months: p.duration.min_months(),
                max_months: p.duration.max_months(),
            })
            .collect();
        let offsets = schedule(&items, gc_gate);

        let stages: Vec<Stage> = planned
            .iter()
            .zip(&offsets)
            .map(|(p, scheduled)| Stage {
                id: p.def.id,
                name: p.def.name.clone(),
                track: p.def.track,
                duration: p.duration.clone(),
                start_offset_months: scheduled.start_max,
                concurrent: p.concurrent,
                queue_wait: p.def.queue_wait,
                wait: p.wait.clone(),
                resolved: false,
            })
            .collect();

        let marker = stages
            .iter()
            .zip(&offsets)
            .find(|(s, _)| s.id == StageId::GreenCard)
            .expect("catalog validation requires a greenCard marker");
        let total = DurationRange::new(marker.1.start_min, marker.0.start_offset_months);

        let estimated_cost_usd = planned.iter().map(|p| p.def.cost_usd).sum();

        debug!(
            pathway = %template.id,
            total_months = total.max_months(),
            stages = stages.len(),
            "composed"
        );

        Ok(Some(ComposedPath {
            id: template.id.clone(),
            name: template.name.clone(),
            category: template.category,
            stages,
            total,
            estimated_cost_usd,
            lottery: template.lottery,
            self_petitioned: template.self_petitioned,
        }))
    }

    /// Size the queue wait, or `None` when no wait stage is needed: either
    /// the cutoff has already reached the priority date, or there is no
    /// bulletin data to judge by (the forecast degrades, it does not fail).
    fn queue_wait(
        &self,
        template: &PathwayTemplate,
        chargeability: Chargeability,
        priority_date: NaiveDate,
    ) -> Result<Option<WaitEstimate>> {
        let Some(bulletin) = self.bulletin else {
            warn!(pathway = %template.id, "no bulletin data, assuming current");
            return Ok(None);
        };
        let Some(cutoff) = bulletin
            .final_action
            .cutoff(template.category, chargeability)
        else {
            warn!(
                pathway = %template.id,
                category = %template.category,
                country = %chargeability,
                "no final-action cutoff published, assuming current"
            );
            return Ok(None);
        };

        let estimate = estimate_wait(
            priority_date,
            cutoff,
            chargeability,
            template.category,
            self.assumptions,
        )?;
        if estimate.is_current() {
            return Ok(None);
        }
        Ok(Some(estimate))
    }

    /// Dates-for-Filing refinement: when the final-action cutoff has not
    /// reached the priority date but the filing cutoff has, the adjustment
    /// application may be filed while the queue wait runs. The I-485 that
    /// follows a queue wait then becomes concurrent with it.
    fn mark_concurrent_filing(
        &self,
        template: &PathwayTemplate,
        chargeability: Chargeability,
        priority_date: NaiveDate,
        planned: &mut [Planned<'_>],
    ) {
        let Some(bulletin) = self.bulletin else {
            return;
        };
        let filing_open = bulletin
            .dates_for_filing
            .cutoff(template.category, chargeability)
            .map(|cutoff| cutoff.reached(priority_date))
            .unwrap_or(false);
        if !filing_open {
            return;
        }

        let Some(wait_index) = planned.iter().position(|p| p.def.queue_wait) else {
            return;
        };
        if let Some(next) = planned.get_mut(wait_index + 1) {
            if next.def.id == StageId::I485 {
                debug!(pathway = %template.id, "dates-for-filing current, filing I-485 concurrently");
                next.concurrent = true;
            }
        }
    }
}
