//! Pipeline state model and the per-slot conflict counters the search,
//! optimizer, and resolver all share.

use crate::instance::{BfEvent, Instance};
use crate::schedule::Schedule;

/// The nine capacity-bearing pipeline states a torpedo passes through on a
/// normal run, plus the emergency detour as a tenth, uncapped state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    EmptyToBf = 0,
    AtBf = 1,
    BfToFullBuffer = 2,
    AtFullBuffer = 3,
    FullToDesulf = 4,
    AtDesulf = 5,
    DesulfToConverter = 6,
    AtConverter = 7,
    ConverterToEmpty = 8,
    Emergency = 9,
}

pub const STATE_COUNT: usize = 10;

/// One torpedo's state sequence, anchored at an absolute start slot.
pub struct Placement {
    pub start: i64,
    pub states: Vec<PipelineState>,
}

impl Placement {
    pub fn interval(&self) -> (usize, usize) {
        (self.start as usize, self.start as usize + self.states.len())
    }
}

fn push_n(out: &mut Vec<PipelineState>, state: PipelineState, n: i64) {
    for _ in 0..n.max(0) {
        out.push(state);
    }
}

/// Expands a schedule into its full per-slot pipeline state sequence.
pub fn schedule_placement(instance: &Instance, schedule: &Schedule) -> Placement {
    let mut states = Vec::new();
    push_n(&mut states, PipelineState::EmptyToBf, instance.tt_empty_to_bf);
    push_n(&mut states, PipelineState::AtBf, instance.dur_bf);
    push_n(&mut states, PipelineState::BfToFullBuffer, instance.tt_bf_to_full_buffer);
    push_n(&mut states, PipelineState::AtFullBuffer, schedule.buffer_duration);
    push_n(&mut states, PipelineState::FullToDesulf, instance.tt_full_buffer_to_desulf);
    push_n(&mut states, PipelineState::AtDesulf, schedule.desulf_duration);
    push_n(&mut states, PipelineState::DesulfToConverter, instance.tt_desulf_to_converter);
    push_n(
        &mut states,
        PipelineState::AtConverter,
        schedule.converter_early_arrival + instance.dur_converter + schedule.converter_depart_delay,
    );
    push_n(&mut states, PipelineState::ConverterToEmpty, instance.tt_converter_to_empty_buffer);
    Placement { start: schedule.start_time, states }
}

/// Expands a BF's emergency-pit detour into its per-slot state sequence.
pub fn emergency_placement(instance: &Instance, bf: &BfEvent) -> Placement {
    let mut states = Vec::new();
    push_n(&mut states, PipelineState::EmptyToBf, instance.tt_empty_to_bf);
    push_n(&mut states, PipelineState::AtBf, instance.dur_bf);
    push_n(&mut states, PipelineState::Emergency, instance.tt_bf_emergency_pit_to_empty_buffer);
    let (start, _) = instance.emergency_interval(bf);
    Placement { start, states }
}

/// Conflict counts and peak fleet size measured over a slot range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConflictReport {
    pub per_state: [i64; 9],
    pub max_torpedoes: i64,
}

/// A length-`L+1` array of 10-wide occupancy counters, one per pipeline
/// slot, supporting reversible add/subtract so the optimizer can test a
/// prospective move and roll it back without rebuilding from scratch.
#[derive(Debug, Clone)]
pub struct ConflictTimeline {
    counters: Vec<[i64; STATE_COUNT]>,
}

impl ConflictTimeline {
    pub fn new(len: usize) -> Self {
        ConflictTimeline { counters: vec![[0; STATE_COUNT]; len] }
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn add(&mut self, placement: &Placement) {
        for (i, state) in placement.states.iter().enumerate() {
            let t = placement.start as usize + i;
            self.counters[t][*state as usize] += 1;
        }
    }

    pub fn subtract(&mut self, placement: &Placement) {
        for (i, state) in placement.states.iter().enumerate() {
            let t = placement.start as usize + i;
            self.counters[t][*state as usize] -= 1;
        }
    }

    /// Counts, over the half-open slot range `[start, end)`: for each
    /// capacity-bearing state `s`, the number of slots where
    /// `counter[t][s] > capacities[s]` (a genuine conflict, per §4.3 —
    /// not merely raw occupancy), plus the overall peak fleet size
    /// (`max_torpedoes`, the peak sum across all ten states, which has no
    /// capacity of its own — it is an estimate, not a constraint check).
    pub fn count_conflicts(&self, start: usize, end: usize, capacities: &[i64; 9]) -> ConflictReport {
        let mut per_state = [0i64; 9];
        let mut max_torpedoes = 0i64;
        let end = end.min(self.counters.len());
        for slot in &self.counters[start.min(end)..end] {
            for s in 0..9 {
                if slot[s] > capacities[s] {
                    per_state[s] += 1;
                }
            }
            let total: i64 = slot.iter().sum();
            max_torpedoes = max_torpedoes.max(total);
        }
        ConflictReport { per_state, max_torpedoes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::{BfEvent, Instance, InstanceProperties};

    fn instance() -> Instance {
        Instance::new(
            InstanceProperties {
                dur_bf: 2,
                dur_desulf: 2,
                dur_converter: 2,
                nb_slots_full_buffer: 1,
                nb_slots_desulf: 1,
                nb_slots_converter: 1,
                tt_empty_to_bf: 1,
                tt_bf_to_full_buffer: 1,
                tt_full_buffer_to_desulf: 1,
                tt_desulf_to_converter: 1,
                tt_converter_to_empty_buffer: 1,
                tt_bf_emergency_pit_to_empty_buffer: 1,
            },
            vec![BfEvent { id: 0, time: 10, sulf_level: 0 }],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn emergency_placement_spans_three_legs() {
        let instance = instance();
        let bf = instance.bf_schedules[0];
        let placement = emergency_placement(&instance, &bf);
        assert_eq!(placement.states.len(), 1 + 2 + 1);
        assert_eq!(placement.start, bf.time - instance.tt_empty_to_bf);
    }

    #[test]
    fn add_then_subtract_is_a_no_op() {
        let instance = instance();
        let bf = instance.bf_schedules[0];
        let placement = emergency_placement(&instance, &bf);
        let caps = instance.state_capacities();
        let mut timeline = ConflictTimeline::new(50);
        let before = timeline.count_conflicts(0, 50, &caps);
        timeline.add(&placement);
        timeline.subtract(&placement);
        let after = timeline.count_conflicts(0, 50, &caps);
        assert_eq!(before, after);
    }

    #[test]
    fn detects_overlap_in_single_capacity_state() {
        let caps = [1, 1, 1, 1, 1, 1, 1, 1, 1];
        let mut timeline = ConflictTimeline::new(10);
        let p1 = Placement { start: 3, states: vec![PipelineState::FullToDesulf] };
        let p2 = Placement { start: 3, states: vec![PipelineState::FullToDesulf] };
        timeline.add(&p1);
        timeline.add(&p2);
        let report = timeline.count_conflicts(0, 10, &caps);
        assert_eq!(report.per_state[PipelineState::FullToDesulf as usize], 1);
        assert_eq!(report.max_torpedoes, 2);
    }

    #[test]
    fn occupancy_under_capacity_is_not_a_conflict() {
        let caps = [1, 1, 1, 3, 1, 1, 1, 1, 1];
        let mut timeline = ConflictTimeline::new(10);
        let p1 = Placement { start: 3, states: vec![PipelineState::AtFullBuffer] };
        let p2 = Placement { start: 3, states: vec![PipelineState::AtFullBuffer] };
        timeline.add(&p1);
        timeline.add(&p2);
        let report = timeline.count_conflicts(0, 10, &caps);
        assert_eq!(report.per_state[PipelineState::AtFullBuffer as usize], 0);
        assert_eq!(report.max_torpedoes, 2);
    }
}
