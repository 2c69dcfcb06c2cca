//! One-shot parallel composition: fan eligible templates out across worker
//! threads. Composition is pure, so invocations only need their own input
//! snapshot; results are re-ordered to match the input order, keeping the
//! parallel path deterministic.

use chrono::NaiveDate;
use crossbeam_channel::bounded;
use log::{debug, info};
use uuid::Uuid;

use crate::catalog::PathwayTemplate;
use crate::error::Result;
use crate::profile::Profile;
use crate::timeline::{ComposedPath, Composer};

struct ComposeJob<'t> {
    id: Uuid,
    index: usize,
    template: &'t PathwayTemplate,
}

/// Compose all templates across `worker_count` threads (defaults to the
/// machine's logical CPU count). Output order matches input order.
pub fn compose_parallel(
    composer: &Composer<'_>,
    templates: &[&PathwayTemplate],
    profile: &Profile,
    as_of: NaiveDate,
    worker_count: Option<usize>,
) -> Result<Vec<ComposedPath>> {
    if templates.is_empty() {
        return Ok(Vec::new());
    }

    let workers = worker_count
        .unwrap_or_else(num_cpus::get)
        .clamp(1, templates.len());

    let (job_tx, job_rx) = bounded::<ComposeJob<'_>>(templates.len());
    let (result_tx, result_rx) = bounded(templates.len());

    for (index, template) in templates.iter().enumerate() {
        let job = ComposeJob {
            id: Uuid::new_v4(),
            index,
            template,
        };
        job_tx.send(job).expect("job channel sized to template count");
    }
    drop(job_tx);

    std::thread::scope(|scope| {
        for worker_id in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                while let Ok(job) = job_rx.recv() {
                    debug!(
                        "worker {} composing '{}' (job {})",
                        worker_id, job.template.id, job.id
                    );
                    let outcome = composer.compose(job.template, profile, as_of);
                    if result_tx.send((job.index, outcome)).is_err() {
                        break;
                    }
                }
            });
        }
    });
    drop(result_tx);

    let mut slots: Vec<Option<ComposedPath>> = Vec::new();
    slots.resize_with(templates.len(), || None);
    while let Ok((index, outcome)) = result_rx.recv() {
        slots[index] = outcome?;
    }

    info!(
        "Composed {} pathway templates across {} workers",
        templates.len(),
        workers
    );

    Ok(slots.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use crate::eligibility;
    use crate::feeds::{VelocityAssumptions, VisaBulletin};
    use crate::profile::{Country, EducationLevel, ExperienceBand, SpecialFlags, VisaStatus};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile() -> Profile {
        Profile {
            status: VisaStatus::H1b,
            education: EducationLevel::Masters,
            experience: ExperienceBand::TwoToFive,
            country_of_birth: Country::India,
            citizenship: None,
            flags: SpecialFlags {
                is_stem: true,
                ..SpecialFlags::default()
            },
            prior_case: None,
        }
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let catalog = default_catalog().unwrap();
        let assumptions = VelocityAssumptions::builtin().unwrap();
        let bulletin: VisaBulletin = serde_json::from_str(
            r#"{ "finalAction": { "eb2": { "india": "2012-05-01" },
                                  "eb3": { "india": "2013-01-01" } } }"#,
        )
        .unwrap();
        let composer = Composer::new(&catalog, None, &assumptions, Some(&bulletin));
        let profile = profile();
        let templates = eligibility::filter(&catalog, &profile);
        let as_of = date(2026, 8, 1);

        let sequential = composer.compose_all(&templates, &profile, as_of).unwrap();
        let parallel =
            compose_parallel(&composer, &templates, &profile, as_of, Some(4)).unwrap();

        assert_eq!(
            serde_json::to_string(&sequential).unwrap(),
            serde_json::to_string(&parallel).unwrap()
        );
    }

    #[test]
    fn test_empty_input() {
        let catalog = default_catalog().unwrap();
        let assumptions = VelocityAssumptions::builtin().unwrap();
        let composer = Composer::new(&catalog, None, &assumptions, None);
        let paths =
            compose_parallel(&composer, &[], &profile(), date(2026, 8, 1), None).unwrap();
        assert!(paths.is_empty());
    }
}
