//! Line-oriented instance text format:
//!
//! ```text
//! # comments and blank lines are skipped
//! durBF=10
//! durDesulf=5
//! durConverter=8
//! nbSlotsFullBuffer=2
//! nbSlotsDesulf=1
//! nbSlotsConverter=1
//! ttEmptyBufferToBF=3
//! ttBFToFullBuffer=2
//! ttFullBufferToDesulf=2
//! ttDesulfToConverter=2
//! ttConverterToEmptyBuffer=3
//! ttBFEmergencyPitEmptyBuffer=4
//! BF 0 20 5
//! C 0 60 5
//! ```
//!
//! BF lines are `BF <id> <time> <sulfLevel>`; converter lines are
//! `C <id> <time> <maxSulfLevel>`. Property order and event order in the
//! source text don't matter — both are sorted the same way `Instance::new`
//! sorts them.

use std::collections::HashMap;

use tracing::trace;

use torpedo_core::{BfEvent, ConverterEvent, Instance, InstanceProperties, PROPERTY_NAMES};

use crate::error::ParseError;

fn set_property(props: &mut InstanceProperties, name: &str, value: i64) -> bool {
    match name {
        "durBF" => props.dur_bf = value,
        "durDesulf" => props.dur_desulf = value,
        "durConverter" => props.dur_converter = value,
        "nbSlotsFullBuffer" => props.nb_slots_full_buffer = value,
        "nbSlotsDesulf" => props.nb_slots_desulf = value,
        "nbSlotsConverter" => props.nb_slots_converter = value,
        "ttEmptyBufferToBF" => props.tt_empty_to_bf = value,
        "ttBFToFullBuffer" => props.tt_bf_to_full_buffer = value,
        "ttFullBufferToDesulf" => props.tt_full_buffer_to_desulf = value,
        "ttDesulfToConverter" => props.tt_desulf_to_converter = value,
        "ttConverterToEmptyBuffer" => props.tt_converter_to_empty_buffer = value,
        "ttBFEmergencyPitEmptyBuffer" => props.tt_bf_emergency_pit_to_empty_buffer = value,
        _ => return false,
    }
    true
}

fn get_property(props: &InstanceProperties, name: &str) -> i64 {
    match name {
        "durBF" => props.dur_bf,
        "durDesulf" => props.dur_desulf,
        "durConverter" => props.dur_converter,
        "nbSlotsFullBuffer" => props.nb_slots_full_buffer,
        "nbSlotsDesulf" => props.nb_slots_desulf,
        "nbSlotsConverter" => props.nb_slots_converter,
        "ttEmptyBufferToBF" => props.tt_empty_to_bf,
        "ttBFToFullBuffer" => props.tt_bf_to_full_buffer,
        "ttFullBufferToDesulf" => props.tt_full_buffer_to_desulf,
        "ttDesulfToConverter" => props.tt_desulf_to_converter,
        "ttConverterToEmptyBuffer" => props.tt_converter_to_empty_buffer,
        "ttBFEmergencyPitEmptyBuffer" => props.tt_bf_emergency_pit_to_empty_buffer,
        _ => unreachable!("caller only passes names from PROPERTY_NAMES"),
    }
}

/// Parses the instance text format into a validated `torpedo_core::Instance`.
pub fn parse_instance(text: &str) -> Result<Instance, ParseError> {
    let mut properties = InstanceProperties::default();
    let mut seen: HashMap<&'static str, bool> = PROPERTY_NAMES.iter().map(|&n| (n, false)).collect();
    let mut bf_schedules = Vec::new();
    let mut converter_schedules = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let mut tokens = trimmed.split_whitespace();
        match tokens.next() {
            Some("BF") => {
                let rest: Vec<&str> = tokens.collect();
                let [id, time, sulf] = rest[..] else {
                    return Err(ParseError::MalformedBf { line: line_no, raw: trimmed.to_string() });
                };
                let parsed = (|| -> Option<BfEvent> {
                    Some(BfEvent { id: id.parse().ok()?, time: time.parse().ok()?, sulf_level: sulf.parse().ok()? })
                })();
                match parsed {
                    Some(bf) => bf_schedules.push(bf),
                    None => return Err(ParseError::MalformedBf { line: line_no, raw: trimmed.to_string() }),
                }
            }
            Some("C") => {
                let rest: Vec<&str> = tokens.collect();
                let [id, time, max_sulf] = rest[..] else {
                    return Err(ParseError::MalformedConverter { line: line_no, raw: trimmed.to_string() });
                };
                let parsed = (|| -> Option<ConverterEvent> {
                    Some(ConverterEvent {
                        id: id.parse().ok()?,
                        time: time.parse().ok()?,
                        max_sulf_level: max_sulf.parse().ok()?,
                        depart_delay: 0,
                        min_early_arrival: 0,
                    })
                })();
                match parsed {
                    Some(c) => converter_schedules.push(c),
                    None => return Err(ParseError::MalformedConverter { line: line_no, raw: trimmed.to_string() }),
                }
            }
            Some(_) if trimmed.contains('=') => {
                let mut parts = trimmed.splitn(2, '=');
                let name = parts.next().unwrap().trim();
                let value_str = parts.next().unwrap_or("").trim();
                let Some(&canonical) = PROPERTY_NAMES.iter().find(|&&n| n == name) else {
                    return Err(ParseError::UnknownProperty { line: line_no, name: name.to_string() });
                };
                let value: i64 = value_str
                    .parse()
                    .map_err(|_| ParseError::MalformedProperty { line: line_no, raw: trimmed.to_string() })?;
                set_property(&mut properties, canonical, value);
                seen.insert(canonical, true);
            }
            _ => return Err(ParseError::UnrecognizedLine { line: line_no, raw: trimmed.to_string() }),
        }
    }

    if let Some(&missing) = PROPERTY_NAMES.iter().find(|&&n| !seen[n]) {
        return Err(ParseError::MissingProperty(missing));
    }

    trace!(bfs = bf_schedules.len(), converters = converter_schedules.len(), "parsed instance");
    Ok(Instance::new(properties, bf_schedules, converter_schedules)?)
}

/// Serializes an instance back to the text format, in canonical property
/// order followed by BF lines and converter lines (both already sorted by
/// `Instance::new`).
pub fn write_instance(instance: &Instance) -> String {
    let props = instance.properties();
    let mut out = String::new();
    for &name in PROPERTY_NAMES.iter() {
        out.push_str(&format!("{name}={}\n", get_property(&props, name)));
    }
    for bf in &instance.bf_schedules {
        out.push_str(&format!("BF {} {} {}\n", bf.id, bf.time, bf.sulf_level));
    }
    for c in &instance.converter_schedules {
        out.push_str(&format!("C {} {} {}\n", c.id, c.time, c.max_sulf_level));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> String {
        [
            "# a comment",
            "",
            "durBF=10",
            "durDesulf=5",
            "durConverter=8",
            "nbSlotsFullBuffer=2",
            "nbSlotsDesulf=1",
            "nbSlotsConverter=1",
            "ttEmptyBufferToBF=3",
            "ttBFToFullBuffer=2",
            "ttFullBufferToDesulf=2",
            "ttDesulfToConverter=2",
            "ttConverterToEmptyBuffer=3",
            "ttBFEmergencyPitEmptyBuffer=4",
            "BF 0 20 5",
            "C 0 60 5",
        ]
        .join("\n")
    }

    #[test]
    fn parses_a_complete_instance() {
        let instance = parse_instance(&sample()).unwrap();
        assert_eq!(instance.dur_bf, 10);
        assert_eq!(instance.bf_schedules.len(), 1);
        assert_eq!(instance.converter_schedules.len(), 1);
    }

    #[test]
    fn round_trips_through_write_instance() {
        let instance = parse_instance(&sample()).unwrap();
        let text = write_instance(&instance);
        let reparsed = parse_instance(&text).unwrap();
        assert_eq!(instance.properties(), reparsed.properties());
        assert_eq!(instance.bf_schedules, reparsed.bf_schedules);
    }

    #[test]
    fn rejects_unknown_property() {
        let text = sample().replace("durBF=10", "durBF=10\nbogusProp=1");
        let err = parse_instance(&text).unwrap_err();
        assert!(matches!(err, ParseError::UnknownProperty { .. }));
    }

    #[test]
    fn rejects_missing_property() {
        let text = sample().replace("durBF=10\n", "");
        let err = parse_instance(&text).unwrap_err();
        assert!(matches!(err, ParseError::MissingProperty("durBF")));
    }
}
