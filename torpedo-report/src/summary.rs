//! Solve-summary metrics, rendered as JSON for the `solve` and
//! `initial-solution` CLI commands.

use serde::Serialize;

use torpedo_core::instance::Instance;
use torpedo_core::schedule::ScheduleMap;
use torpedo_core::solution::Solution;
use torpedo_core::{metrics, torpedo};

#[derive(Debug, Clone, Serialize)]
pub struct ConflictSummary {
    pub empty_to_bf: i64,
    pub at_bf: i64,
    pub bf_to_full_buffer: i64,
    pub at_full_buffer: i64,
    pub full_to_desulf: i64,
    pub at_desulf: i64,
    pub desulf_to_converter: i64,
    pub at_converter: i64,
    pub converter_to_empty: i64,
    pub max_torpedoes: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SolveSummary {
    pub torpedo_count: usize,
    pub desulf_time: i64,
    pub total_busy_time: i64,
    pub conflicts: ConflictSummary,
    pub cost: f64,
    pub gain: f64,
}

pub fn build_summary(instance: &Instance, solution: &Solution, matrix: &[ScheduleMap]) -> SolveSummary {
    let runs = torpedo::reconstruct_torpedo_runs(instance, solution, matrix);
    let desulf_time = metrics::desulf_time(solution, matrix);
    let total_busy_time = metrics::total_busy_time(instance, solution, matrix);
    let report = metrics::conflict_distribution(instance, solution, matrix);
    let cost = metrics::cost(instance, runs.len() as i64, desulf_time);
    let gain = metrics::gain(instance, cost);

    SolveSummary {
        torpedo_count: runs.len(),
        desulf_time,
        total_busy_time,
        conflicts: ConflictSummary {
            empty_to_bf: report.per_state[0],
            at_bf: report.per_state[1],
            bf_to_full_buffer: report.per_state[2],
            at_full_buffer: report.per_state[3],
            full_to_desulf: report.per_state[4],
            at_desulf: report.per_state[5],
            desulf_to_converter: report.per_state[6],
            at_converter: report.per_state[7],
            converter_to_empty: report.per_state[8],
            max_torpedoes: report.max_torpedoes,
        },
        cost,
        gain,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use torpedo_core::instance::{BfEvent, ConverterEvent, InstanceProperties};
    use torpedo_core::matrix::build_adjacency_matrix;

    #[test]
    fn summary_counts_one_torpedo_for_one_bf() {
        let instance = Instance::new(
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
            vec![BfEvent { id: 0, time: 10, sulf_level: 1 }],
            vec![ConverterEvent { id: 0, time: 60, max_sulf_level: 1, depart_delay: 0, min_early_arrival: 0 }],
        )
        .unwrap();
        let matrix = build_adjacency_matrix(&instance);
        let solution: Solution = vec![0];
        let summary = build_summary(&instance, &solution, &matrix);
        assert_eq!(summary.torpedo_count, 1);
    }
}
