//! Builds, for every converter, the set of BFs it could feasibly serve —
//! the adjacency matrix the search and optimizer both operate on.

use crate::instance::{BfEvent, ConverterSnapshot, Instance};
use crate::schedule::{Schedule, ScheduleMap};

/// Computes the single feasible [`Schedule`] between `bf` and `converter`,
/// or `None` if the pairing is infeasible (converter fires before the BF
/// is even tapped, or the full-buffer dwell would have to be negative).
pub fn compute_schedule(instance: &Instance, bf: &BfEvent, converter: &ConverterSnapshot) -> Option<Schedule> {
    if converter.time < bf.time {
        return None;
    }

    let desulf_steps = bf.sulf_level - converter.max_sulf_level;
    let desulf_duration_raw = desulf_steps * instance.dur_desulf;
    // The raw, unclamped value is what the tie-break sort wants: the more
    // desulf a pairing needs, the more negative this gets.
    let desulf_efficiency = -desulf_duration_raw;
    let desulf_duration = desulf_duration_raw.max(0);

    let start_time = bf.time - instance.tt_empty_to_bf;
    let end_time = converter.time + instance.dur_converter + instance.tt_converter_to_empty_buffer + converter.depart_delay;
    let buffer_arrival = bf.time + instance.dur_bf + instance.tt_bf_to_full_buffer;
    let desulf_overhead = instance.tt_full_buffer_to_desulf + desulf_duration + instance.tt_desulf_to_converter;
    let buffer_duration = (converter.time - converter.min_early_arrival) - desulf_overhead - buffer_arrival;

    if buffer_duration < 0 {
        return None;
    }

    Some(Schedule {
        bf_id: bf.id,
        converter_id: converter.id,
        start_time,
        end_time,
        desulf_duration,
        desulf_efficiency,
        buffer_duration,
        converter_depart_delay: converter.depart_delay,
        converter_early_arrival: 0,
        is_pullable: buffer_duration > 0,
        index: 0,
    })
}

/// Builds one converter's [`ScheduleMap`] against every BF in `bf_schedules`.
pub fn build_schedule_map(instance: &Instance, bf_schedules: &[BfEvent], converter: &ConverterSnapshot) -> ScheduleMap {
    let mut sparse_list: Vec<Option<Schedule>> = vec![None; bf_schedules.len()];
    for bf in bf_schedules {
        sparse_list[bf.id] = compute_schedule(instance, bf, converter);
    }

    let mut sorted_list: Vec<usize> = sparse_list
        .iter()
        .enumerate()
        .filter_map(|(bf_id, s)| s.as_ref().map(|_| bf_id))
        .collect();
    sorted_list.sort_by_key(|&bf_id| {
        let s = sparse_list[bf_id].as_ref().unwrap();
        (s.duration(), s.desulf_efficiency)
    });
    for (pos, &bf_id) in sorted_list.iter().enumerate() {
        sparse_list[bf_id].as_mut().unwrap().index = pos;
    }

    ScheduleMap::new(converter.id, sparse_list, sorted_list)
}

/// Builds the full adjacency matrix — one [`ScheduleMap`] per converter —
/// directly off the instance's own derived converter timings. Pure: called
/// twice on the same instance it yields bit-identical maps.
pub fn build_adjacency_matrix(instance: &Instance) -> Vec<ScheduleMap> {
    instance
        .converter_schedules
        .iter()
        .map(|c| build_schedule_map(instance, &instance.bf_schedules, &ConverterSnapshot::from(c)))
        .collect()
}
