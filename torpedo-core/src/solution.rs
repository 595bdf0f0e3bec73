//! Glue between a `solution` array (one converter id per BF, `-1` for
//! emergency) and the timeline/placement machinery.

use crate::instance::Instance;
use crate::schedule::ScheduleMap;
use crate::timeline::{emergency_placement, schedule_placement, ConflictTimeline, Placement, PipelineState};

/// `solution[bf_id]` is the converter index serving that BF, or `-1` if
/// it was routed through the emergency pit.
pub type Solution = Vec<i64>;

pub const EMERGENCY: i64 = -1;

/// Builds the [`Placement`] (absolute slot range + state sequence) for a
/// single BF under its current routing.
pub fn placement_for(instance: &Instance, solution: &Solution, matrix: &[ScheduleMap], bf_id: usize) -> Placement {
    let converter = solution[bf_id];
    if converter < 0 {
        let bf = instance.bf_schedules[bf_id];
        emergency_placement(instance, &bf)
    } else {
        let schedule = matrix[converter as usize].schedule_for(bf_id).expect("solution references a live schedule");
        schedule_placement(instance, schedule)
    }
}

/// Builds the full conflict timeline for a complete solution by summing
/// every BF's placement.
pub fn build_conflict_timeline(instance: &Instance, solution: &Solution, matrix: &[ScheduleMap]) -> ConflictTimeline {
    let mut timeline = ConflictTimeline::new(instance.timeline_length() as usize);
    for bf_id in 0..solution.len() {
        let placement = placement_for(instance, solution, matrix, bf_id);
        timeline.add(&placement);
    }
    timeline
}

/// A detailed, per-slot view of which BF occupies each pipeline state —
/// used by the conflict resolver, which needs to know *which* schedule to
/// adjust, not just how many torpedoes collide.
pub fn build_detailed_timeline(
    instance: &Instance,
    solution: &Solution,
    matrix: &[ScheduleMap],
) -> Vec<Vec<(usize, PipelineState)>> {
    let mut timeline: Vec<Vec<(usize, PipelineState)>> = vec![Vec::new(); instance.timeline_length() as usize];
    for bf_id in 0..solution.len() {
        let placement = placement_for(instance, solution, matrix, bf_id);
        for (i, state) in placement.states.iter().enumerate() {
            let t = placement.start as usize + i;
            if t < timeline.len() {
                timeline[t].push((bf_id, *state));
            }
        }
    }
    timeline
}
