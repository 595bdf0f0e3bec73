//! Hill-climbing local search: repeatedly swap pairs of BFs between
//! converters (or between a converter and the emergency pit) whenever the
//! swap strictly lowers total desulf time without making any pipeline
//! state more congested than it already was.

use tracing::debug;

use crate::instance::Instance;
use crate::schedule::ScheduleMap;
use crate::solution::{placement_for, Solution, EMERGENCY};
use crate::timeline::{ConflictTimeline, Placement};

/// Knobs exposed to callers; defaults mirror the heuristic's historical
/// behavior.
#[derive(Debug, Clone, Copy)]
pub struct OptimizerConfig {
    pub lookahead_cap: usize,
    pub allow_emergency_swap: bool,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig { lookahead_cap: 32, allow_emergency_swap: true }
    }
}

/// Runs the hill-climb to convergence, mutating `solution` and `matrix` in
/// place.
pub fn hill_climb(instance: &Instance, solution: &mut Solution, matrix: &mut [ScheduleMap], config: &OptimizerConfig) {
    let b = instance.bf_schedules.len();
    if b == 0 || matrix.is_empty() {
        return;
    }

    let mut timeline = crate::solution::build_conflict_timeline(instance, solution, matrix);
    let max_lookahead = config.lookahead_cap.min(b.saturating_sub(1)).max(1);
    let mut lookahead = 1usize.min(max_lookahead);

    loop {
        loop {
            let mut updates = 0usize;
            for c1 in 0..matrix.len() {
                if try_improve_converter(instance, solution, matrix, &mut timeline, c1, lookahead, config) {
                    updates += 1;
                }
            }
            if updates == 0 {
                break;
            }
        }
        if lookahead >= max_lookahead {
            break;
        }
        lookahead = (lookahead * 2).min(max_lookahead);
    }
}

fn try_improve_converter(
    instance: &Instance,
    solution: &mut Solution,
    matrix: &mut [ScheduleMap],
    timeline: &mut ConflictTimeline,
    c1: usize,
    lookahead: usize,
    config: &OptimizerConfig,
) -> bool {
    let Some(current_index) = matrix[c1].current_index else {
        return false;
    };
    let sorted_len = matrix[c1].sorted_list.len();
    let a = matrix[c1].sorted_list[current_index];
    let curr1_duration = matrix[c1].schedule_for(a).unwrap().desulf_duration;

    let end = (current_index + 1 + lookahead).min(sorted_len);
    for cand_pos in (current_index + 1)..end {
        let b = matrix[c1].sorted_list[cand_pos];
        let new1_duration = matrix[c1].schedule_for(b).unwrap().desulf_duration;
        if new1_duration >= curr1_duration {
            continue;
        }
        if !matrix[c1].schedule_for(b).unwrap().is_pullable {
            continue;
        }

        let c2 = solution[b];
        let accepted = if c2 >= 0 {
            try_regular_swap(instance, solution, matrix, timeline, c1, a, cand_pos, b, c2 as usize)
        } else if config.allow_emergency_swap {
            try_emergency_swap(instance, solution, matrix, timeline, c1, a, cand_pos, b)
        } else {
            false
        };

        if accepted {
            return true;
        }
    }
    false
}

fn measure(timeline: &ConflictTimeline, capacities: &[i64; 9], placements: &[&Placement]) -> Vec<crate::timeline::ConflictReport> {
    placements
        .iter()
        .map(|p| {
            let (start, end) = p.interval();
            timeline.count_conflicts(start, end, capacities)
        })
        .collect()
}

fn accepted(before: &[crate::timeline::ConflictReport], after: &[crate::timeline::ConflictReport]) -> bool {
    before.iter().zip(after.iter()).all(|(b, a)| {
        a.max_torpedoes <= b.max_torpedoes && (0..9).all(|s| a.per_state[s] <= b.per_state[s])
    })
}

/// Attempts the swap, testing feasibility over the four affected
/// intervals (old and new placement of each BF). Mutates `timeline` only
/// if the move is accepted; otherwise the add/subtract pair cancels out.
fn try_move(instance: &Instance, timeline: &mut ConflictTimeline, old: &[Placement], new: &[Placement]) -> bool {
    let capacities = instance.state_capacities();
    let old_refs: Vec<&Placement> = old.iter().chain(new.iter()).collect();
    let before = measure(timeline, &capacities, &old_refs);

    for p in old {
        timeline.subtract(p);
    }
    for p in new {
        timeline.add(p);
    }

    let new_refs: Vec<&Placement> = old.iter().chain(new.iter()).collect();
    let after = measure(timeline, &capacities, &new_refs);

    if accepted(&before, &after) {
        true
    } else {
        for p in new {
            timeline.subtract(p);
        }
        for p in old {
            timeline.add(p);
        }
        false
    }
}

#[allow(clippy::too_many_arguments)]
fn try_regular_swap(
    instance: &Instance,
    solution: &mut Solution,
    matrix: &mut [ScheduleMap],
    timeline: &mut ConflictTimeline,
    c1: usize,
    a: usize,
    cand_pos: usize,
    b: usize,
    c2: usize,
) -> bool {
    if c2 == c1 {
        return false;
    }
    let Some(new2) = matrix[c2].schedule_for(a).cloned() else {
        return false;
    };
    if !new2.is_pullable {
        return false;
    }
    let curr2_index = matrix[c2].current_index;
    if curr2_index != Some(matrix[c2].schedule_for(b).unwrap().index) {
        // b isn't actually c2's currently-active choice; shouldn't happen
        // since solution[b] == c2 implies it is, but guard defensively.
        return false;
    }

    let curr1 = placement_for(instance, solution, matrix, a);
    let curr2 = placement_for(instance, solution, matrix, b);

    let new1_schedule = matrix[c1].schedule_for(b).unwrap().clone();
    let new1 = crate::timeline::schedule_placement(instance, &new1_schedule);
    let new2 = crate::timeline::schedule_placement(instance, &new2);

    let moved = try_move(instance, timeline, &[curr1, curr2], &[new1, new2]);
    if !moved {
        return false;
    }

    solution[a] = c2 as i64;
    solution[b] = c1 as i64;
    matrix[c1].current_index = Some(cand_pos);
    matrix[c2].current_index = Some(matrix[c2].schedule_for(a).unwrap().index);
    debug!(c1, c2, a, b, "accepted regular swap");
    true
}

fn try_emergency_swap(
    instance: &Instance,
    solution: &mut Solution,
    matrix: &mut [ScheduleMap],
    timeline: &mut ConflictTimeline,
    c1: usize,
    a: usize,
    cand_pos: usize,
    b: usize,
) -> bool {
    let curr1 = placement_for(instance, solution, matrix, a);
    let curr2 = placement_for(instance, solution, matrix, b);

    let new1_schedule = matrix[c1].schedule_for(b).unwrap().clone();
    let new1 = crate::timeline::schedule_placement(instance, &new1_schedule);
    let new2 = crate::timeline::emergency_placement(instance, &instance.bf_schedules[a]);

    let moved = try_move(instance, timeline, &[curr1, curr2], &[new1, new2]);
    if !moved {
        return false;
    }

    solution[a] = EMERGENCY;
    solution[b] = c1 as i64;
    matrix[c1].current_index = Some(cand_pos);
    debug!(c1, a, b, "accepted emergency swap");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BfEvent, ConverterEvent, InstanceProperties};
    use crate::matrix::build_adjacency_matrix;
    use crate::search::initial_solution;

    fn props() -> InstanceProperties {
        InstanceProperties {
            dur_bf: 5,
            dur_desulf: 2,
            dur_converter: 5,
            nb_slots_full_buffer: 3,
            nb_slots_desulf: 1,
            nb_slots_converter: 1,
            tt_empty_to_bf: 2,
            tt_bf_to_full_buffer: 1,
            tt_full_buffer_to_desulf: 1,
            tt_desulf_to_converter: 1,
            tt_converter_to_empty_buffer: 2,
            tt_bf_emergency_pit_to_empty_buffer: 3,
        }
    }

    #[test]
    fn hill_climb_never_increases_desulf_time() {
        let instance = Instance::new(
            props(),
            vec![
                BfEvent { id: 0, time: 10, sulf_level: 3 },
                BfEvent { id: 1, time: 12, sulf_level: 1 },
            ],
            vec![
                ConverterEvent { id: 0, time: 60, max_sulf_level: 1, depart_delay: 0, min_early_arrival: 0 },
                ConverterEvent { id: 1, time: 80, max_sulf_level: 3, depart_delay: 0, min_early_arrival: 0 },
            ],
        )
        .unwrap();

        let (mut solution, mut matrix) = initial_solution(&instance).unwrap();
        let before: i64 = solution
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != EMERGENCY)
            .map(|(bf, &c)| matrix[c as usize].schedule_for(bf).unwrap().desulf_duration)
            .sum();

        hill_climb(&instance, &mut solution, &mut matrix, &OptimizerConfig::default());

        let after: i64 = solution
            .iter()
            .enumerate()
            .filter(|(_, &c)| c != EMERGENCY)
            .map(|(bf, &c)| matrix[c as usize].schedule_for(bf).unwrap().desulf_duration)
            .sum();
        assert!(after <= before);
    }

    #[test]
    fn no_op_on_single_bf_instance() {
        let instance = Instance::new(
            props(),
            vec![BfEvent { id: 0, time: 10, sulf_level: 1 }],
            vec![ConverterEvent { id: 0, time: 60, max_sulf_level: 1, depart_delay: 0, min_early_arrival: 0 }],
        )
        .unwrap();
        let mut matrix = build_adjacency_matrix(&instance);
        matrix[0].current_index = Some(0);
        let mut solution: Solution = vec![0];
        hill_climb(&instance, &mut solution, &mut matrix, &OptimizerConfig::default());
        assert_eq!(solution, vec![0]);
    }
}
