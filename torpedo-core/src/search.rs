//! Initial-solution search: most-constrained-variable greedy backtracking
//! over an explicit stack, with forward checking and two-element cluster
//! widening for converters too close together to both admit a pullable BF.

use tracing::{debug, trace};

use crate::error::SchedulingError;
use crate::instance::{ConverterSnapshot, Instance};
use crate::matrix::build_schedule_map;
use crate::schedule::ScheduleMap;
use crate::solution::{Solution, EMERGENCY};

#[derive(Debug, Clone, Default)]
struct StackFrame {
    bf_id: Option<usize>,
    feasible_index: Option<usize>,
    decremented: Vec<usize>,
}

/// Runs the search to completion, returning the routing solution and the
/// (possibly rebuilt, by cluster widening) adjacency matrix.
pub fn initial_solution(instance: &Instance) -> Result<(Solution, Vec<ScheduleMap>), SchedulingError> {
    let b = instance.bf_schedules.len();
    let c = instance.converter_schedules.len();

    let mut snapshots: Vec<ConverterSnapshot> = instance.converter_schedules.iter().map(ConverterSnapshot::from).collect();
    let mut matrix: Vec<ScheduleMap> = snapshots
        .iter()
        .map(|snap| build_schedule_map(instance, &instance.bf_schedules, snap))
        .collect();

    let mut sorted_converters: Vec<usize> = (0..c).collect();
    sorted_converters.sort_by_key(|&k| matrix[k].domain_size);

    let mut solution: Solution = vec![EMERGENCY; b];
    let mut stack: Vec<StackFrame> = vec![StackFrame::default(); c];

    let mut i: isize = 0;
    while (i as usize) < c {
        if i < 0 {
            return Err(SchedulingError::Infeasible);
        }
        let level = i as usize;
        let k = sorted_converters[level];
        let resume_from = stack[level].feasible_index.map(|p| p + 1).unwrap_or(0);

        let mut found: Option<usize> = None;
        let mut non_pullable = 0usize;
        for pos in resume_from..matrix[k].sorted_list.len() {
            let bf_id = matrix[k].sorted_list[pos];
            if solution[bf_id] != EMERGENCY {
                continue;
            }
            let sched = matrix[k].schedule_for(bf_id).expect("sorted_list entries are always Some");
            if !sched.is_pullable {
                non_pullable += 1;
                continue;
            }
            found = Some(pos);
            break;
        }

        match found {
            Some(pos) => {
                let bf_id = matrix[k].sorted_list[pos];
                let mut decremented = Vec::new();
                let mut collapsed = false;
                for &k2 in &sorted_converters[level + 1..] {
                    let before = matrix[k2].domain_size;
                    let after = matrix[k2].constrain_domain(bf_id);
                    if after != before {
                        decremented.push(k2);
                    }
                    if after == 0 {
                        collapsed = true;
                        break;
                    }
                }
                if collapsed {
                    for &k2 in decremented.iter().rev() {
                        matrix[k2].undo_domain_constraint(bf_id);
                    }
                    trace!(converter = k, bf = bf_id, "forward check collapsed a future domain, retrying");
                    stack[level] = StackFrame { bf_id: None, feasible_index: Some(pos), decremented: Vec::new() };
                } else {
                    solution[bf_id] = k as i64;
                    matrix[k].current_index = Some(pos);
                    stack[level] = StackFrame { bf_id: Some(bf_id), feasible_index: Some(pos), decremented };
                    i += 1;
                }
            }
            None if non_pullable > 0 => {
                widen_or_fail(instance, &mut snapshots, &mut matrix, &solution, k)?;
                stack[level] = StackFrame::default();
                debug!(converter = k, "widened cluster, retrying level");
            }
            None => {
                debug!(level, converter = k, "no candidate left, backtracking");
                i -= 1;
                if i < 0 {
                    return Err(SchedulingError::Infeasible);
                }
                let prev = i as usize;
                if let Some(bf_released) = stack[prev].bf_id {
                    solution[bf_released] = EMERGENCY;
                    for &k2 in &stack[prev].decremented {
                        matrix[k2].undo_domain_constraint(bf_released);
                    }
                }
                stack[prev].bf_id = None;
                stack[prev].decremented = Vec::new();
            }
        }
    }

    Ok((solution, matrix))
}

/// Widens the two-element cluster `k`, `k+1` by pulling `k+1`'s
/// `min_early_arrival` up to cover the gap and zeroing `k`'s, then rebuilds
/// both converters' schedule maps, resyncing `domain_size` against the
/// BFs already claimed elsewhere in `solution`.
fn widen_or_fail(
    instance: &Instance,
    snapshots: &mut [ConverterSnapshot],
    matrix: &mut [ScheduleMap],
    solution: &Solution,
    k: usize,
) -> Result<(), SchedulingError> {
    let next = k + 1;
    if next >= snapshots.len() || snapshots[next].min_early_arrival != 0 {
        return Err(SchedulingError::ClusterTooLong);
    }

    snapshots[next].min_early_arrival = (snapshots[next].time - snapshots[k].time + instance.tt_desulf_to_converter).max(0);
    snapshots[k].min_early_arrival = 0;

    for &idx in &[k, next] {
        let mut rebuilt = build_schedule_map(instance, &instance.bf_schedules, &snapshots[idx]);
        for (bf_id, &assignment) in solution.iter().enumerate() {
            if assignment != EMERGENCY {
                rebuilt.constrain_domain(bf_id);
            }
        }
        matrix[idx] = rebuilt;
    }

    Ok(())
}
