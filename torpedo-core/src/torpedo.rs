//! Reconstructs the minimal torpedo-car pool that can physically execute
//! a solution, and the per-torpedo run records `torpedo-report` prints.

use tracing::debug;

use crate::instance::Instance;
use crate::schedule::{Schedule, ScheduleMap};
use crate::solution::Solution;

/// Full stage-by-stage timing for one BF's trip, routed or emergency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub bf_id: usize,
    pub converter_id: i64,
    pub start_empty_buffer: i64,
    pub end_empty_buffer: i64,
    pub start_bf: i64,
    pub end_bf: i64,
    pub full_buffer: Option<(i64, i64)>,
    pub desulf: Option<(i64, i64)>,
    pub converter: Option<(i64, i64)>,
}

/// One torpedo's full duty chain, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TorpedoRun {
    pub torpedo_id: usize,
    pub records: Vec<RunRecord>,
}

fn routed_record(instance: &Instance, schedule: &Schedule) -> RunRecord {
    let mut t = schedule.start_time;
    let start_empty_buffer = t;
    t += instance.tt_empty_to_bf;
    let start_bf = t;
    t += instance.dur_bf;
    let end_bf = t;
    t += instance.tt_bf_to_full_buffer;
    let start_full_buffer = t;
    t += schedule.buffer_duration;
    let end_full_buffer = t;
    t += instance.tt_full_buffer_to_desulf;
    let start_desulf = t;
    t += schedule.desulf_duration;
    let end_desulf = t;
    t += instance.tt_desulf_to_converter;
    let start_converter = t;
    t += schedule.converter_early_arrival + instance.dur_converter + schedule.converter_depart_delay;
    let end_converter = t;
    t += instance.tt_converter_to_empty_buffer;
    let end_empty_buffer = t;
    debug_assert_eq!(end_empty_buffer, schedule.end_time);

    RunRecord {
        bf_id: schedule.bf_id,
        converter_id: schedule.converter_id as i64,
        start_empty_buffer,
        end_empty_buffer,
        start_bf,
        end_bf,
        full_buffer: Some((start_full_buffer, end_full_buffer)),
        desulf: Some((start_desulf, end_desulf)),
        converter: Some((start_converter, end_converter)),
    }
}

fn emergency_record(instance: &Instance, bf_id: usize) -> RunRecord {
    let bf = instance.bf_schedules[bf_id];
    let start_empty_buffer = bf.time - instance.tt_empty_to_bf;
    let start_bf = bf.time;
    let end_bf = start_bf + instance.dur_bf;
    let end_empty_buffer = end_bf + instance.tt_bf_emergency_pit_to_empty_buffer;

    RunRecord {
        bf_id,
        converter_id: -1,
        start_empty_buffer,
        end_empty_buffer,
        start_bf,
        end_bf,
        full_buffer: None,
        desulf: None,
        converter: None,
    }
}

/// Assigns a minimal pool of torpedoes to cover every BF's trip, in BF
/// order, greedily reusing whichever torpedo is physically free first.
///
/// Availability is judged on each torpedo's actual physical completion
/// time (`end_empty_buffer` from its own stage boundaries) rather than the
/// start time of its last run — using start time alone would let two
/// overlapping trips share a torpedo. The *reported* `end_empty_buffer` of
/// a reused run is still pulled forward to the next run's start (the
/// torpedo idles at the empty buffer in between), and the final run of
/// every torpedo is closed out at the overall schedule horizon.
pub fn reconstruct_torpedo_runs(instance: &Instance, solution: &Solution, matrix: &[ScheduleMap]) -> Vec<TorpedoRun> {
    let mut records: Vec<RunRecord> = (0..solution.len())
        .map(|bf_id| {
            let c = solution[bf_id];
            if c < 0 {
                emergency_record(instance, bf_id)
            } else {
                routed_record(instance, matrix[c as usize].schedule_for(bf_id).expect("solution references a live schedule"))
            }
        })
        .collect();

    let mut free_at: Vec<i64> = Vec::new();
    let mut assigned_torpedo: Vec<usize> = Vec::with_capacity(records.len());

    for record in &records {
        let idle = free_at.iter().position(|&t| t <= record.start_empty_buffer);
        let torpedo_id = match idle {
            Some(id) => id,
            None => {
                free_at.push(i64::MIN);
                free_at.len() - 1
            }
        };
        free_at[torpedo_id] = record.end_empty_buffer;
        assigned_torpedo.push(torpedo_id);
    }

    let latest_time = records.iter().map(|r| r.end_empty_buffer).max().unwrap_or(0);

    let mut runs: Vec<TorpedoRun> = (0..free_at.len()).map(|id| TorpedoRun { torpedo_id: id, records: Vec::new() }).collect();
    for (i, &torpedo_id) in assigned_torpedo.iter().enumerate() {
        runs[torpedo_id].records.push(records[i].clone());
    }

    // Close each run's reported end at the start of the next run on the
    // same torpedo, and the final run at the schedule horizon.
    for run in &mut runs {
        for w in 0..run.records.len() {
            let next_start = run.records.get(w + 1).map(|r| r.start_empty_buffer);
            run.records[w].end_empty_buffer = next_start.unwrap_or(latest_time);
        }
    }

    debug!(torpedoes = runs.len(), bfs = records.len(), "reconstructed torpedo pool");
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BfEvent, ConverterEvent, InstanceProperties};
    use crate::matrix::build_adjacency_matrix;
    use crate::solution::EMERGENCY;

    fn props() -> InstanceProperties {
        InstanceProperties {
            dur_bf: 5,
            dur_desulf: 2,
            dur_converter: 5,
            nb_slots_full_buffer: 2,
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
    fn reuses_a_single_torpedo_for_sequential_bfs() {
        let instance = Instance::new(
            props(),
            vec![
                BfEvent { id: 0, time: 10, sulf_level: 1 },
                BfEvent { id: 1, time: 200, sulf_level: 1 },
            ],
            vec![ConverterEvent { id: 0, time: 60, max_sulf_level: 1, depart_delay: 0, min_early_arrival: 0 }],
        )
        .unwrap();
        let matrix = build_adjacency_matrix(&instance);
        let solution = vec![0i64, EMERGENCY];
        let runs = reconstruct_torpedo_runs(&instance, &solution, &matrix);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].records.len(), 2);
    }

    #[test]
    fn overlapping_bfs_need_separate_torpedoes() {
        let instance = Instance::new(
            props(),
            vec![
                BfEvent { id: 0, time: 10, sulf_level: 1 },
                BfEvent { id: 1, time: 11, sulf_level: 1 },
            ],
            vec![
                ConverterEvent { id: 0, time: 60, max_sulf_level: 1, depart_delay: 0, min_early_arrival: 0 },
                ConverterEvent { id: 1, time: 61, max_sulf_level: 1, depart_delay: 0, min_early_arrival: 0 },
            ],
        )
        .unwrap();
        let matrix = build_adjacency_matrix(&instance);
        let solution = vec![0i64, 1i64];
        let runs = reconstruct_torpedo_runs(&instance, &solution, &matrix);
        assert_eq!(runs.len(), 2);
    }
}
