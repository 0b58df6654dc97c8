//! Integration tests for the table-to-stream parse path.
//!
//! These feed hand-written `xctrace export` XML documents through the full
//! decode → extract → filter → project → normalize chain and check the
//! resulting streams, without touching the external xctrace binary.

use xcperf::error::TableError;
use xcperf::export::save_streams;
use xcperf::metrics::{fps_samples, resource_samples};
use xcperf::series::{normalize, Stream};
use xcperf::table::TableDocument;
use tempfile::TempDir;

/// One sysmon-process row. `cpu` of None omits the element entirely so the
/// extractor has to carry the previous value forward.
fn sysmon_row(time: &str, process: &str, cpu: Option<&str>, mem: u64, resident: u64) -> String {
    let mut row = String::from("    <row>\n");
    row.push_str(&format!(
        "      <start-time fmt=\"{time}\">0</start-time>\n"
    ));
    row.push_str(&format!("      <process fmt=\"{process}\">0</process>\n"));
    if let Some(cpu) = cpu {
        row.push_str(&format!(
            "      <system-cpu-percent>{cpu}</system-cpu-percent>\n"
        ));
    }
    for n in 1..=9u64 {
        let bytes = match n {
            3 => mem,
            9 => resident,
            _ => n * 512,
        };
        row.push_str(&format!("      <size-in-bytes>{bytes}</size-in-bytes>\n"));
    }
    row.push_str("    </row>\n");
    row
}

fn sysmon_document(rows: &[String]) -> String {
    format!(
        "<?xml version=\"1.0\"?>\n<trace-query-result>\n  <node>\n    \
         <schema name=\"sysmon-process\"/>\n{}  </node>\n</trace-query-result>",
        rows.concat()
    )
}

#[test]
fn sysmon_rows_become_cpu_and_memory_streams() {
    // Rows as the exporter emits them: newest first.
    let xml = sysmon_document(&[
        sysmon_row("0:01.900", "Steam (501)", Some("15.0"), 3_145_728, 1_572_864),
        sysmon_row("0:01.500", "Steam (501)", Some("12.5"), 2_097_152, 1_048_576),
        sysmon_row("0:00.200", "Steam (501)", Some("8.0"), 1_048_576, 524_288),
    ]);

    let doc = TableDocument::parse_str(&xml).unwrap();
    let resources = resource_samples(&doc, "Steam").unwrap();

    // The two 0:01 samples collapse; the chronologically later one wins.
    let cpu = Stream::new("cpu", normalize(resources.cpu).unwrap());
    let (labels, values) = cpu.axes();
    assert_eq!(labels, ["0:00", "0:01"]);
    assert_eq!(values, [8.0, 15.0]);

    let mem = Stream::new("mem", normalize(resources.memory).unwrap());
    let (labels, values) = mem.axes();
    assert_eq!(labels, ["0:00", "0:01"]);
    assert_eq!(values, [1.0, 3.0]);
}

#[test]
fn rows_of_other_processes_are_dropped_silently() {
    let xml = sysmon_document(&[
        sysmon_row("0:02.000", "Steam (501)", Some("10.0"), 1_048_576, 524_288),
        sysmon_row("0:01.000", "SteamHelper (502)", Some("90.0"), 1_048_576, 524_288),
        sysmon_row("0:00.000", "kernel_task (0)", Some("50.0"), 1_048_576, 524_288),
    ]);

    let doc = TableDocument::parse_str(&xml).unwrap();
    let resources = resource_samples(&doc, "Steam").unwrap();
    assert_eq!(resources.cpu.len(), 1);
    assert_eq!(resources.cpu[0].value, 10.0);
    // Filtering is not an error and drops nothing from the stats.
    assert_eq!(resources.stats.rows_dropped(), 0);
}

#[test]
fn reference_compressed_values_resolve_across_rows() {
    // The fps value is stored once and referenced by the later row.
    let xml = "<?xml version=\"1.0\"?>\n<trace-query-result>\n  <node>\n    \
               <schema name=\"core-animation-fps-estimate\"/>\n\
               <row>\n\
                 <start-time id=\"1\" fmt=\"0:02.000\">2000000</start-time>\n\
                 <fps id=\"2\">59.9</fps>\n\
               </row>\n\
               <row>\n\
                 <start-time fmt=\"0:01.000\">1000000</start-time>\n\
                 <fps ref=\"2\"/>\n\
               </row>\n\
             </node>\n</trace-query-result>";

    let doc = TableDocument::parse_str(xml).unwrap();
    let (samples, stats) = fps_samples(&doc).unwrap();
    assert_eq!(stats.rows_seen, 2);
    assert_eq!(samples[0].value, 59.9);
    assert_eq!(samples[1].value, 59.9);

    let fps = Stream::new("fps", normalize(samples).unwrap());
    let (labels, values) = fps.axes();
    assert_eq!(labels, ["0:01", "0:02"]);
    assert_eq!(values, [59.9, 59.9]);
}

#[test]
fn dangling_reference_aborts_the_document() {
    let xml = "<?xml version=\"1.0\"?>\n<trace-query-result>\n  <node>\n    \
               <schema name=\"core-animation-fps-estimate\"/>\n\
               <row>\n\
                 <start-time fmt=\"0:01.000\">1000000</start-time>\n\
                 <fps ref=\"42\"/>\n\
               </row>\n\
             </node>\n</trace-query-result>";

    let doc = TableDocument::parse_str(xml).unwrap();
    let err = fps_samples(&doc).unwrap_err();
    assert_eq!(
        err,
        TableError::DanglingReference {
            schema: "core-animation-fps-estimate".to_string(),
            row: 0,
            id: "42".to_string(),
        }
    );
}

#[test]
fn missing_cpu_carries_the_previous_value_forward() {
    let xml = sysmon_document(&[
        sysmon_row("0:02.000", "Steam (501)", Some("20.0"), 1_048_576, 524_288),
        sysmon_row("0:01.000", "Steam (501)", None, 1_048_576, 524_288),
        sysmon_row("0:00.000", "Steam (501)", Some("10.0"), 1_048_576, 524_288),
    ]);

    let doc = TableDocument::parse_str(&xml).unwrap();
    let resources = resource_samples(&doc, "Steam").unwrap();
    // Document order: the 0:01 row inherits the 0:02 row's 20.0.
    let values: Vec<f64> = resources.cpu.iter().map(|s| s.value).collect();
    assert_eq!(values, [20.0, 20.0, 10.0]);
}

#[test]
fn streams_save_as_json_arrays() {
    let xml = sysmon_document(&[sysmon_row(
        "0:00.500",
        "Steam (501)",
        Some("12.5"),
        104_857_600,
        52_428_800,
    )]);

    let doc = TableDocument::parse_str(&xml).unwrap();
    let resources = resource_samples(&doc, "Steam").unwrap();
    let streams = vec![
        Stream::new("cpu", normalize(resources.cpu).unwrap()),
        Stream::new("mem", normalize(resources.memory).unwrap()),
    ];

    let dir = TempDir::new().unwrap();
    let paths = save_streams(dir.path(), "test_session", &streams).unwrap();
    assert_eq!(paths.len(), 2);

    let mem: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths[1]).unwrap()).unwrap();
    assert_eq!(mem[0]["time"], "0:00");
    assert_eq!(mem[0]["value"], 100.0);
}
