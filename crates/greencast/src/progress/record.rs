use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, GcCategory, StageId, Track};
use crate::timeutil::lenient_date;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ProgressStatus {
    #[default]
    NotStarted,
    Filed,
    Approved,
}

/// Per-stage user-entered progress. All date fields deserialize leniently:
/// a malformed date is the same as no date recorded.
///
/// Records are immutable values; the `with_*` methods return updated
/// copies so re-anchoring stays pure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageProgress {
    pub status: ProgressStatus,
    #[serde(with = "lenient_date")]
    pub filed: Option<NaiveDate>,
    #[serde(with = "lenient_date")]
    pub approved: Option<NaiveDate>,
    pub receipt_number: Option<String>,
    /// Only meaningful on stages that can establish a priority date.
    #[serde(with = "lenient_date")]
    pub priority_date: Option<NaiveDate>,
    pub notes: String,
}

impl StageProgress {
    pub fn with_status(self, status: ProgressStatus) -> Self {
        Self { status, ..self }
    }

    pub fn with_filed(self, filed: Option<NaiveDate>) -> Self {
        Self { filed, ..self }
    }

    pub fn with_approved(self, approved: Option<NaiveDate>) -> Self {
        Self { approved, ..self }
    }

    pub fn with_receipt_number(self, receipt_number: Option<String>) -> Self {
        Self {
            receipt_number,
            ..self
        }
    }

    pub fn with_priority_date(self, priority_date: Option<NaiveDate>) -> Self {
        Self {
            priority_date,
            ..self
        }
    }

    pub fn with_notes(self, notes: impl Into<String>) -> Self {
        Self {
            notes: notes.into(),
            ..self
        }
    }

    pub fn is_started(&self) -> bool {
        self.status != ProgressStatus::NotStarted
    }

    pub fn is_approved(&self) -> bool {
        self.status == ProgressStatus::Approved
    }
}

/// All recorded progress for one case: per-stage records plus the
/// process-wide ported priority date from a prior filing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseProgress {
    pub records: BTreeMap<StageId, StageProgress>,
    #[serde(with = "lenient_date")]
    pub ported_priority_date: Option<NaiveDate>,
    pub ported_category: Option<GcCategory>,
}

impl CaseProgress {
    pub fn record(&self, id: StageId) -> Option<&StageProgress> {
        self.records.get(&id)
    }

    /// Immutable update: a new `CaseProgress` with one record replaced.
    pub fn with_record(mut self, id: StageId, record: StageProgress) -> Self {
        self.records.insert(id, record);
        self
    }

    pub fn with_ported_priority_date(self, date: Option<NaiveDate>) -> Self {
        Self {
            ported_priority_date: date,
            ..self
        }
    }

    /// The earliest priority date established by an approved PD-bearing
    /// stage. The record's explicit priority date wins over its filed date,
    /// since the receipt notice is authoritative.
    pub fn established_priority_date(&self, catalog: &Catalog) -> Option<NaiveDate> {
        self.records
            .iter()
            .filter(|(id, record)| {
                record.is_approved()
                    && catalog
                        .stage_opt(**id)
                        .map(|def| def.establishes_priority_date)
                        .unwrap_or(false)
            })
            .filter_map(|(_, record)| record.priority_date.or(record.filed))
            .min()
    }

    /// The priority date used for queue math: the earlier of the ported
    /// date and any stage-established date. `None` means the place in the
    /// queue has not been established yet.
    pub fn effective_priority_date(&self, catalog: &Catalog) -> Option<NaiveDate> {
        let established = self.established_priority_date(catalog);
        match (self.ported_priority_date, established) {
            (Some(ported), Some(established)) => Some(ported.min(established)),
            (Some(ported), None) => Some(ported),
            (None, established) => established,
        }
    }

    /// Whether any green-card-track stage has recorded progress. Progress
    /// on the status track alone does not re-anchor the forecast.
    pub fn has_gc_progress(&self, catalog: &Catalog) -> bool {
        self.records.iter().any(|(id, record)| {
            record.is_started()
                && catalog
                    .stage_opt(*id)
                    .map(|def| def.track == Track::GreenCard)
                    .unwrap_or(false)
        })
    }
}
