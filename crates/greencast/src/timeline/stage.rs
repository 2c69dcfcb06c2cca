use serde::Serialize;

use crate::catalog::{StageId, Track};
use crate::duration::DurationRange;
use crate::velocity::WaitEstimate;

/// One scheduled administrative step inside a composed path.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    pub id: StageId,
    pub name: String,
    pub track: Track,
    pub duration: DurationRange,
    /// Months from the path origin (or from "now" after re-anchoring).
    pub start_offset_months: f64,
    /// Runs alongside the previous stage on its track.
    pub concurrent: bool,
    /// Government-queue time rather than agency-processing time.
    pub queue_wait: bool,
    /// The velocity estimate a queue-wait stage was sized from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wait: Option<WaitEstimate>,
    /// A queue wait whose cutoff has since passed: kept for history,
    /// rendered struck through.
    pub resolved: bool,
}

impl Stage {
    pub fn end_offset_months(&self) -> f64 {
        self.start_offset_months + self.duration.max_months()
    }
}

/// Scheduling input: track, concurrency and duration bounds for one stage.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ScheduleItem {
    pub track: Track,
    pub concurrent: bool,
    pub min_months: f64,
    pub max_months: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Scheduled {
    pub start_min: f64,
    pub start_max: f64,
}

/// Lays out stages on their two parallel tracks.
///
/// Within a track, stages are sequential by default: each starts at the
/// latest end seen so far on that track. A concurrent stage instead shares
/// its immediate predecessor's start; the track cursor then advances to the
/// maximum end of the group, so parallel work bounds rather than adds.
///
/// `gc_gate` optionally names the index of a status-track item whose end
/// seeds the green-card track's starting cursor (lottery-gated paths).
pub(crate) fn schedule(items: &[ScheduleItem], gc_gate: Option<usize>) -> Vec<Scheduled> {
    let mut out = vec![Scheduled::default(); items.len()];

    schedule_track(items, Track::Status, (0.0, 0.0), &mut out);

    let gc_start = match gc_gate {
        Some(gate) => {
            let item = items[gate];
            (
                out[gate].start_min + item.min_months,
                out[gate].start_max + item.max_months,
            )
        }
        None => (0.0, 0.0),
    };
    schedule_track(items, Track::GreenCard, gc_start, &mut out);

    out
}

fn schedule_track(
    items: &[ScheduleItem],
    track: Track,
    start: (f64, f64),
    out: &mut [Scheduled],
) {
    let (mut cursor_min, mut cursor_max) = start;
    let mut prev_start = start;

    for (i, item) in items.iter().enumerate() {
        if item.track != track {
            continue;
        }
        let stage_start = if item.concurrent {
            prev_start
        } else {
            (cursor_min, cursor_max)
        };
        let end = (
            stage_start.0 + item.min_months,
            stage_start.1 + item.max_months,
        );
        cursor_min = cursor_min.max(end.0);
        cursor_max = cursor_max.max(end.1);
        prev_start = stage_start;
        out[i] = Scheduled {
            start_min: stage_start.0,
            start_max: stage_start.1,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(track: Track, concurrent: bool, max: f64) -> ScheduleItem {
        ScheduleItem {
            track,
            concurrent,
            min_months: max / 2.0,
            max_months: max,
        }
    }

    #[test]
    fn test_sequential_chain() {
        let items = [
            item(Track::GreenCard, false, 10.0),
            item(Track::GreenCard, false, 6.0),
            item(Track::GreenCard, false, 0.0),
        ];
        let out = schedule(&items, None);
        assert_eq!(out[0].start_max, 0.0);
        assert_eq!(out[1].start_max, 10.0);
        assert_eq!(out[2].start_max, 16.0);
    }

    #[test]
    fn test_concurrent_shares_start_and_bounds_cursor() {
        let items = [
            item(Track::GreenCard, false, 10.0),
            item(Track::GreenCard, true, 14.0),
            item(Track::GreenCard, false, 0.0),
        ];
        let out = schedule(&items, None);
        assert_eq!(out[1].start_max, out[0].start_max);
        // The follower starts at the longest end of the group, not the sum.
        assert_eq!(out[2].start_max, 14.0);
    }

    #[test]
    fn test_tracks_are_independent() {
        let items = [
            item(Track::Status, false, 36.0),
            item(Track::GreenCard, false, 12.0),
            item(Track::GreenCard, false, 0.0),
        ];
        let out = schedule(&items, None);
        assert_eq!(out[1].start_max, 0.0);
        assert_eq!(out[2].start_max, 12.0);
    }

    #[test]
    fn test_gc_gate_delays_gc_track() {
        let items = [
            item(Track::Status, false, 6.0),
            item(Track::Status, false, 36.0),
            item(Track::GreenCard, false, 12.0),
            item(Track::GreenCard, false, 0.0),
        ];
        let out = schedule(&items, Some(0));
        assert_eq!(out[2].start_max, 6.0);
        assert_eq!(out[3].start_max, 18.0);
    }
}
