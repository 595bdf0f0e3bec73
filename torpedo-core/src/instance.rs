//! The problem instance: pipeline geometry, capacities, and the two event
//! streams (blast furnace taps, converter charges) it must route between.

use serde::{Deserialize, Serialize};

use crate::error::SchedulingError;

/// Canonical camelCase property names, in the order they're written back
/// out by [`Instance::to_properties`]. `torpedo-parse` maps text-format
/// key lines onto these same names.
pub const PROPERTY_NAMES: [&str; 12] = [
    "durBF",
    "durDesulf",
    "durConverter",
    "nbSlotsFullBuffer",
    "nbSlotsDesulf",
    "nbSlotsConverter",
    "ttEmptyBufferToBF",
    "ttBFToFullBuffer",
    "ttFullBufferToDesulf",
    "ttDesulfToConverter",
    "ttConverterToEmptyBuffer",
    "ttBFEmergencyPitEmptyBuffer",
];

/// Raw properties as read off the wire, before derivation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceProperties {
    pub dur_bf: i64,
    pub dur_desulf: i64,
    pub dur_converter: i64,
    pub nb_slots_full_buffer: i64,
    pub nb_slots_desulf: i64,
    pub nb_slots_converter: i64,
    pub tt_empty_to_bf: i64,
    pub tt_bf_to_full_buffer: i64,
    pub tt_full_buffer_to_desulf: i64,
    pub tt_desulf_to_converter: i64,
    pub tt_converter_to_empty_buffer: i64,
    pub tt_bf_emergency_pit_to_empty_buffer: i64,
}

/// A single blast-furnace tap: `bf.time` is when the torpedo is ready to
/// leave the empty buffer for the furnace, `sulf_level` is the sulfur
/// content it arrives at the full buffer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BfEvent {
    pub id: usize,
    pub time: i64,
    pub sulf_level: i64,
}

/// A single converter charge window, with the two derived serialization
/// fields (`depart_delay`, `min_early_arrival`) folded in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConverterEvent {
    pub id: usize,
    pub time: i64,
    pub max_sulf_level: i64,
    pub depart_delay: i64,
    pub min_early_arrival: i64,
}

/// A mutable snapshot of a converter's timing, used by the search when it
/// needs to widen a two-element cluster without touching the instance's
/// own derived fields (see `search::widen_cluster`).
#[derive(Debug, Clone, Copy)]
pub struct ConverterSnapshot {
    pub id: usize,
    pub time: i64,
    pub max_sulf_level: i64,
    pub depart_delay: i64,
    pub min_early_arrival: i64,
}

impl From<&ConverterEvent> for ConverterSnapshot {
    fn from(c: &ConverterEvent) -> Self {
        ConverterSnapshot {
            id: c.id,
            time: c.time,
            max_sulf_level: c.max_sulf_level,
            depart_delay: c.depart_delay,
            min_early_arrival: c.min_early_arrival,
        }
    }
}

/// A fully validated, immutable problem instance.
///
/// Constructed once by [`Instance::new`] and read-only thereafter; the
/// search keeps its own mutable [`ConverterSnapshot`] copies when it needs
/// to experiment with cluster widening.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub dur_bf: i64,
    pub dur_desulf: i64,
    pub dur_converter: i64,
    pub nb_slots_full_buffer: i64,
    pub nb_slots_desulf: i64,
    pub nb_slots_converter: i64,
    pub tt_empty_to_bf: i64,
    pub tt_bf_to_full_buffer: i64,
    pub tt_full_buffer_to_desulf: i64,
    pub tt_desulf_to_converter: i64,
    pub tt_converter_to_empty_buffer: i64,
    pub tt_bf_emergency_pit_to_empty_buffer: i64,
    pub dur_emergency: i64,
    pub bf_schedules: Vec<BfEvent>,
    pub converter_schedules: Vec<ConverterEvent>,
}

impl Instance {
    /// Builds an instance from raw properties and event lists, deriving
    /// `depart_delay`, `min_early_arrival`, and `dur_emergency`, and
    /// checking the structural invariants the rest of the core relies on.
    pub fn new(
        properties: InstanceProperties,
        mut bf_schedules: Vec<BfEvent>,
        mut converter_schedules: Vec<ConverterEvent>,
    ) -> Result<Instance, SchedulingError> {
        bf_schedules.sort_by_key(|b| b.time);
        converter_schedules.sort_by_key(|c| c.time);

        for (i, bf) in bf_schedules.iter().enumerate() {
            if bf.id != i {
                return Err(SchedulingError::InvalidInstance(format!(
                    "BF ids must be dense and zero-based in time order, expected {i} got {}",
                    bf.id
                )));
            }
        }
        for (i, c) in converter_schedules.iter().enumerate() {
            if c.id != i {
                return Err(SchedulingError::InvalidInstance(format!(
                    "converter ids must be dense and zero-based in time order, expected {i} got {}",
                    c.id
                )));
            }
        }

        if properties.dur_bf < 0
            || properties.dur_desulf < 0
            || properties.dur_converter < 0
            || properties.nb_slots_full_buffer < 1
            || properties.nb_slots_desulf < 1
            || properties.nb_slots_converter < 1
            || properties.tt_empty_to_bf < 0
            || properties.tt_bf_to_full_buffer < 0
            || properties.tt_full_buffer_to_desulf < 0
            || properties.tt_desulf_to_converter < 0
            || properties.tt_converter_to_empty_buffer < 0
            || properties.tt_bf_emergency_pit_to_empty_buffer < 0
        {
            return Err(SchedulingError::InvalidInstance(
                "durations must be non-negative and slot capacities must be at least 1".into(),
            ));
        }

        derive_depart_delay(&properties, &mut converter_schedules);
        derive_min_early_arrival(&properties, &mut converter_schedules);

        let dur_emergency = properties.tt_empty_to_bf
            + properties.dur_bf
            + properties.tt_bf_emergency_pit_to_empty_buffer;

        Ok(Instance {
            dur_bf: properties.dur_bf,
            dur_desulf: properties.dur_desulf,
            dur_converter: properties.dur_converter,
            nb_slots_full_buffer: properties.nb_slots_full_buffer,
            nb_slots_desulf: properties.nb_slots_desulf,
            nb_slots_converter: properties.nb_slots_converter,
            tt_empty_to_bf: properties.tt_empty_to_bf,
            tt_bf_to_full_buffer: properties.tt_bf_to_full_buffer,
            tt_full_buffer_to_desulf: properties.tt_full_buffer_to_desulf,
            tt_desulf_to_converter: properties.tt_desulf_to_converter,
            tt_converter_to_empty_buffer: properties.tt_converter_to_empty_buffer,
            tt_bf_emergency_pit_to_empty_buffer: properties.tt_bf_emergency_pit_to_empty_buffer,
            dur_emergency,
            bf_schedules,
            converter_schedules,
        })
    }

    pub fn properties(&self) -> InstanceProperties {
        InstanceProperties {
            dur_bf: self.dur_bf,
            dur_desulf: self.dur_desulf,
            dur_converter: self.dur_converter,
            nb_slots_full_buffer: self.nb_slots_full_buffer,
            nb_slots_desulf: self.nb_slots_desulf,
            nb_slots_converter: self.nb_slots_converter,
            tt_empty_to_bf: self.tt_empty_to_bf,
            tt_bf_to_full_buffer: self.tt_bf_to_full_buffer,
            tt_full_buffer_to_desulf: self.tt_full_buffer_to_desulf,
            tt_desulf_to_converter: self.tt_desulf_to_converter,
            tt_converter_to_empty_buffer: self.tt_converter_to_empty_buffer,
            tt_bf_emergency_pit_to_empty_buffer: self.tt_bf_emergency_pit_to_empty_buffer,
        }
    }

    /// Per-state occupancy caps for the nine non-emergency pipeline
    /// states, in [`crate::timeline::PipelineState`] order.
    pub fn state_capacities(&self) -> [i64; 9] {
        [
            1, // T_EMPTY_TO_BF: single transit lane
            1, // AT_BF: single tap in progress at a time
            1, // T_BF_TO_FULL_BUFFER: single transit lane
            self.nb_slots_full_buffer,
            1, // T_FULL_TO_DESULF: single transit lane
            self.nb_slots_desulf,
            1, // T_DESULF_TO_CONVERTER: single transit lane
            self.nb_slots_converter,
            1, // T_CONVERTER_TO_EMPTY: single transit lane
        ]
    }

    /// Inclusive `[start, end]` slot range a BF occupies when routed
    /// through the emergency pit instead of a converter.
    pub fn emergency_interval(&self, bf: &BfEvent) -> (i64, i64) {
        let start = bf.time - self.tt_empty_to_bf;
        (start, start + self.dur_emergency - 1)
    }

    /// Length of the timeline needed to cover every scheduled event,
    /// including the longest possible emergency detour.
    pub fn timeline_length(&self) -> i64 {
        let converter_end = self
            .converter_schedules
            .last()
            .map(|c| c.time + self.dur_converter + self.tt_converter_to_empty_buffer + c.depart_delay)
            .unwrap_or(0);
        let bf_end = self
            .bf_schedules
            .last()
            .map(|b| b.time + self.tt_bf_emergency_pit_to_empty_buffer)
            .unwrap_or(0);
        converter_end.max(bf_end) + 1
    }
}

/// Walks the converter list in time order, assigning each converter just
/// enough `depart_delay` so its T_CONVERTER_TO_EMPTY transit never starts
/// before the previous converter's has finished (that transit state has
/// capacity 1).
fn derive_depart_delay(properties: &InstanceProperties, converters: &mut [ConverterEvent]) {
    let mut prev_arrival: Option<i64> = None;
    for c in converters.iter_mut() {
        let candidate_departure = c.time + properties.dur_converter;
        c.depart_delay = match prev_arrival {
            None => 0,
            Some(prev) => (prev - candidate_departure).max(0),
        };
        prev_arrival = Some(candidate_departure + c.depart_delay + properties.tt_converter_to_empty_buffer);
    }
}

/// Walks the converter list backward, assigning each converter just enough
/// `min_early_arrival` so consecutive T_DESULF_TO_CONVERTER transits (also
/// capacity 1) never overlap, using each converter's "effective" time —
/// its real time minus its own `min_early_arrival` — as the anchor for the
/// gap check against its predecessor in the walk.
fn derive_min_early_arrival(properties: &InstanceProperties, converters: &mut [ConverterEvent]) {
    let mut next_effective: Option<i64> = None;
    for c in converters.iter_mut().rev() {
        c.min_early_arrival = match next_effective {
            None => 0,
            Some(next_eff) => {
                let gap = next_eff - c.time;
                (properties.tt_desulf_to_converter - gap).max(0)
            }
        };
        next_effective = Some(c.time - c.min_early_arrival);
    }
}
