//! Human-readable per-torpedo-run formatting for the `print-solution`
//! CLI command.

use torpedo_core::torpedo::{RunRecord, TorpedoRun};

fn format_bound(name: &str, value: Option<i64>) -> String {
    match value {
        Some(v) => format!("{name}={v}"),
        None => format!("{name}=-"),
    }
}

/// Renders one run record as the spec's 13 named fields: `idTorpedo`,
/// `idBF`, `idConverter`, then the start/end boundary of every stage
/// (`startBF`/`endBF`, `startFullBuffer`/`endFullBuffer`,
/// `startDesulf`/`endDesulf`, `startConverter`/`endConverter`,
/// `startEmptyBuffer`/`endEmptyBuffer`).
fn format_record(torpedo_id: usize, record: &RunRecord) -> String {
    format!(
        "idTorpedo={} idBF={} idConverter={} {} {} {} {} {} {} {} {} {} {}",
        torpedo_id,
        record.bf_id,
        record.converter_id,
        format_bound("startBF", Some(record.start_bf)),
        format_bound("endBF", Some(record.end_bf)),
        format_bound("startFullBuffer", record.full_buffer.map(|(s, _)| s)),
        format_bound("endFullBuffer", record.full_buffer.map(|(_, e)| e)),
        format_bound("startDesulf", record.desulf.map(|(s, _)| s)),
        format_bound("endDesulf", record.desulf.map(|(_, e)| e)),
        format_bound("startConverter", record.converter.map(|(s, _)| s)),
        format_bound("endConverter", record.converter.map(|(_, e)| e)),
        format_bound("startEmptyBuffer", Some(record.start_empty_buffer)),
        format_bound("endEmptyBuffer", Some(record.end_empty_buffer)),
    )
}

/// Renders every torpedo's duty chain as one line per run record.
pub fn format_runs(runs: &[TorpedoRun]) -> String {
    let mut out = String::new();
    for run in runs {
        for record in &run.records {
            out.push_str(&format_record(run.torpedo_id, record));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_routed_and_emergency_records() {
        let runs = vec![TorpedoRun {
            torpedo_id: 0,
            records: vec![
                RunRecord {
                    bf_id: 0,
                    converter_id: 1,
                    start_empty_buffer: 0,
                    end_empty_buffer: 20,
                    start_bf: 2,
                    end_bf: 7,
                    full_buffer: Some((8, 10)),
                    desulf: Some((11, 13)),
                    converter: Some((14, 18)),
                },
                RunRecord {
                    bf_id: 1,
                    converter_id: -1,
                    start_empty_buffer: 20,
                    end_empty_buffer: 30,
                    start_bf: 22,
                    end_bf: 27,
                    full_buffer: None,
                    desulf: None,
                    converter: None,
                },
            ],
        }];
        let text = format_runs(&runs);
        assert!(text.contains("idTorpedo=0 idBF=0 idConverter=1"));
        assert!(text.contains("startFullBuffer=8 endFullBuffer=10"));
        assert!(text.contains("idTorpedo=0 idBF=1 idConverter=-1"));
        assert!(text.contains("startDesulf=- endDesulf=-"));
        assert!(text.contains("startConverter=- endConverter=-"));
        assert!(text.contains("startEmptyBuffer=20 endEmptyBuffer=30"));
    }
}
