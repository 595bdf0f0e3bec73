//! Pure summary statistics over a finished solution, consumed by
//! `torpedo-report` for the `solve`/`initial-solution` CLI output.

use crate::instance::Instance;
use crate::schedule::ScheduleMap;
use crate::solution::{build_conflict_timeline, Solution};
use crate::timeline::ConflictReport;

/// Sum of `desulf_duration` across every routed BF (emergency BFs
/// contribute nothing — they never pass through the desulf station).
pub fn desulf_time(solution: &Solution, matrix: &[ScheduleMap]) -> i64 {
    solution
        .iter()
        .enumerate()
        .filter(|(_, &c)| c >= 0)
        .map(|(bf, &c)| matrix[c as usize].schedule_for(bf).expect("solution references a live schedule").desulf_duration)
        .sum()
}

/// Sum of total trip duration across every BF, routed or emergency.
pub fn total_busy_time(instance: &Instance, solution: &Solution, matrix: &[ScheduleMap]) -> i64 {
    solution
        .iter()
        .enumerate()
        .map(|(bf, &c)| {
            if c < 0 {
                instance.dur_emergency
            } else {
                matrix[c as usize].schedule_for(bf).expect("solution references a live schedule").duration()
            }
        })
        .sum()
}

/// Per-state conflicting-slot counts and peak fleet size across the whole
/// solution.
pub fn conflict_distribution(instance: &Instance, solution: &Solution, matrix: &[ScheduleMap]) -> ConflictReport {
    let timeline = build_conflict_timeline(instance, solution, matrix);
    timeline.count_conflicts(0, timeline.len(), &instance.state_capacities())
}

/// `torpedo_count + desulf_time / (4 * C * dur_desulf)`, the headline cost
/// figure balancing fleet size against sulfur-removal overhead.
pub fn cost(instance: &Instance, torpedo_count: i64, desulf_time: i64) -> f64 {
    let converters = instance.converter_schedules.len() as f64;
    let denom = 4.0 * converters * instance.dur_desulf as f64;
    let desulf_term = if denom > 0.0 { desulf_time as f64 / denom } else { 0.0 };
    torpedo_count as f64 + desulf_term
}

/// `B + 1 - cost`, a monotonically-decreasing-in-cost "gain" figure sized
/// so it stays positive across realistic instances.
pub fn gain(instance: &Instance, cost: f64) -> f64 {
    instance.bf_schedules.len() as f64 + 1.0 - cost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BfEvent, ConverterEvent, InstanceProperties};
    use crate::matrix::build_adjacency_matrix;

    fn instance() -> Instance {
        Instance::new(
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
            },
            vec![BfEvent { id: 0, time: 10, sulf_level: 3 }],
            vec![ConverterEvent { id: 0, time: 60, max_sulf_level: 1, depart_delay: 0, min_early_arrival: 0 }],
        )
        .unwrap()
    }

    #[test]
    fn desulf_time_counts_only_routed_bfs() {
        let instance = instance();
        let matrix = build_adjacency_matrix(&instance);
        let solution = vec![-1i64];
        assert_eq!(desulf_time(&solution, &matrix), 0);
    }

    #[test]
    fn cost_and_gain_are_inversely_related() {
        let instance = instance();
        let c1 = cost(&instance, 2, 0);
        let c2 = cost(&instance, 2, 40);
        assert!(c2 > c1);
        assert!(gain(&instance, c2) < gain(&instance, c1));
    }
}
