//! Best-effort repair pass for `T_FULL_TO_DESULF` double-occupancy left
//! behind by the search or hill-climb: that transit lane has capacity 1,
//! but neither stage checks it directly against every other assignment.

use tracing::debug;

use crate::error::SchedulingError;
use crate::instance::Instance;
use crate::schedule::ScheduleMap;
use crate::solution::{build_detailed_timeline, Solution};
use crate::timeline::PipelineState;

enum Conflict {
    Pair { current_bf: usize, current_count: i64, other_bf: usize },
    Triple { slot: usize, count: usize },
}

fn find_conflict(timeline: &[Vec<(usize, PipelineState)>]) -> Option<Conflict> {
    let mut current_bf: Option<usize> = None;
    let mut current_count: i64 = 0;

    for (slot, entries) in timeline.iter().enumerate() {
        let transiting: Vec<usize> = entries
            .iter()
            .filter(|(_, s)| matches!(s, PipelineState::FullToDesulf))
            .map(|(bf, _)| *bf)
            .collect();

        match transiting.len() {
            0 => {
                current_bf = None;
                current_count = 0;
            }
            1 => {
                let bf = transiting[0];
                if current_bf == Some(bf) {
                    current_count += 1;
                } else {
                    current_bf = Some(bf);
                    current_count = 1;
                }
            }
            2 => {
                let tracked = current_bf.unwrap_or(transiting[0]);
                let other = transiting.iter().copied().find(|&bf| bf != tracked).unwrap_or(transiting[1]);
                return Some(Conflict::Pair { current_bf: tracked, current_count, other_bf: other });
            }
            n => return Some(Conflict::Triple { slot, count: n }),
        }
    }
    None
}

fn schedule_mut<'a>(matrix: &'a mut [ScheduleMap], solution: &Solution, bf_id: usize) -> &'a mut crate::schedule::Schedule {
    let c = solution[bf_id] as usize;
    matrix[c].sparse_list[bf_id].as_mut().expect("solution references a live schedule")
}

/// Repeatedly finds the earliest `T_FULL_TO_DESULF` overlap and absorbs it
/// into whichever of the two colliding schedules has enough buffer slack,
/// shifting slack between `buffer_duration` and `converter_early_arrival`
/// so total trip duration is unchanged. Fails if neither schedule has
/// enough slack, or if three or more torpedoes ever collide at once.
pub fn resolve_conflicts(instance: &Instance, solution: &Solution, matrix: &mut [ScheduleMap]) -> Result<(), SchedulingError> {
    let max_iterations = solution.len() * 2 + 4;
    for _ in 0..max_iterations {
        let timeline = build_detailed_timeline(instance, solution, matrix);
        match find_conflict(&timeline) {
            None => return Ok(()),
            Some(Conflict::Triple { slot, count }) => {
                return Err(SchedulingError::InvariantViolation { slot, count });
            }
            Some(Conflict::Pair { current_bf, current_count, other_bf }) => {
                let delta = instance.tt_full_buffer_to_desulf - current_count.max(0);
                if delta <= 0 {
                    return Err(SchedulingError::IrreparableConflict);
                }

                let current_buffer = schedule_mut(matrix, solution, current_bf).buffer_duration;
                if current_buffer >= delta {
                    let s = schedule_mut(matrix, solution, current_bf);
                    s.buffer_duration -= delta;
                    s.converter_early_arrival += delta;
                    debug!(bf = current_bf, delta, "resolved conflict by absorbing into current schedule");
                    continue;
                }

                let other_buffer = schedule_mut(matrix, solution, other_bf).buffer_duration;
                let min_required = instance.tt_full_buffer_to_desulf + delta;
                if other_buffer >= min_required {
                    let s = schedule_mut(matrix, solution, other_bf);
                    s.buffer_duration -= delta;
                    s.converter_early_arrival += delta;
                    debug!(bf = other_bf, delta, "resolved conflict by absorbing into other schedule");
                    continue;
                }

                return Err(SchedulingError::IrreparableConflict);
            }
        }
    }
    Err(SchedulingError::IrreparableConflict)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_conflict_on_empty_timeline() {
        let timeline: Vec<Vec<(usize, PipelineState)>> = vec![Vec::new(); 5];
        assert!(find_conflict(&timeline).is_none());
    }

    #[test]
    fn detects_pairwise_overlap() {
        let timeline = vec![
            vec![(0usize, PipelineState::FullToDesulf)],
            vec![(0usize, PipelineState::FullToDesulf), (1usize, PipelineState::FullToDesulf)],
        ];
        match find_conflict(&timeline) {
            Some(Conflict::Pair { current_bf, other_bf, current_count }) => {
                assert_eq!(current_bf, 0);
                assert_eq!(other_bf, 1);
                assert_eq!(current_count, 1);
            }
            _ => panic!("expected a pairwise conflict"),
        }
    }

    #[test]
    fn detects_triple_overlap() {
        let timeline = vec![vec![
            (0usize, PipelineState::FullToDesulf),
            (1usize, PipelineState::FullToDesulf),
            (2usize, PipelineState::FullToDesulf),
        ]];
        match find_conflict(&timeline) {
            Some(Conflict::Triple { slot, count }) => {
                assert_eq!(slot, 0);
                assert_eq!(count, 3);
            }
            _ => panic!("expected a triple conflict"),
        }
    }
}
