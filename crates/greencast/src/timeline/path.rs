use serde::Serialize;

use crate::catalog::{GcCategory, StageId, Track};
use crate::duration::DurationRange;
use crate::timeline::Stage;

/// A fully scheduled pathway: the engine's main output unit.
///
/// Value object: built once, never mutated. Stage start offsets obey the
/// track scheduling rules (sequential stages start at or after their
/// predecessor's end, concurrent stages share their predecessor's start);
/// the terminal green-card marker's offset is the path's total duration.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposedPath {
    pub id: String,
    pub name: String,
    pub category: GcCategory,
    pub stages: Vec<Stage>,
    pub total: DurationRange,
    pub estimated_cost_usd: u32,
    pub lottery: bool,
    pub self_petitioned: bool,
}

impl ComposedPath {
    pub fn gc_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.track == Track::GreenCard)
    }

    pub fn status_stages(&self) -> impl Iterator<Item = &Stage> {
        self.stages.iter().filter(|s| s.track == Track::Status)
    }

    pub fn stage(&self, id: StageId) -> Option<&Stage> {
        self.stages.iter().find(|s| s.id == id)
    }

    /// Months to the finish line (the green-card marker's offset).
    pub fn total_months(&self) -> f64 {
        self.total.max_months()
    }

    /// The trivial already-done path: a single zero-duration marker. Used
    /// when a tracked case is fully approved.
    pub fn done(id: impl Into<String>, name: impl Into<String>, category: GcCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            stages: vec![Stage {
                id: StageId::GreenCard,
                name: "Green card".to_string(),
                track: Track::GreenCard,
                duration: DurationRange::zero(),
                start_offset_months: 0.0,
                concurrent: false,
                queue_wait: false,
                wait: None,
                resolved: false,
            }],
            total: DurationRange::zero(),
            estimated_cost_usd: 0,
            lottery: false,
            self_petitioned: false,
        }
    }
}
