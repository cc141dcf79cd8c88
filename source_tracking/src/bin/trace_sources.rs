use std::collections::BTreeMap;
use std::env;
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::process::ExitCode;

use serde::{Deserialize, Serialize};
use tracing::{error, info};

use source_tracking::d8::{
    closed_core_mask, intersect_core_masks, routing_from_esri_codes_masked, RasterShape,
};
use source_tracking::{
    load_config_from_env, CellId, FlowNetwork, FractionMap, Label, Routing, SourceTracker,
};

/// Either an explicit receiver table or a D8 direction raster.
#[derive(Debug, Deserialize)]
struct NetworkInput {
    #[serde(default)]
    receivers: Option<Vec<CellId>>,
    #[serde(default)]
    d8: Option<D8Input>,
    labels: Vec<i64>,
    #[serde(default)]
    core: Option<Vec<bool>>,
}

#[derive(Debug, Deserialize)]
struct D8Input {
    rows: usize,
    cols: usize,
    codes: Vec<i32>,
    #[serde(default)]
    nodata: Option<i32>,
}

#[derive(Debug, Serialize)]
struct TraceOutput {
    flow_accum: BTreeMap<CellId, u32>,
    hsd_upstr: BTreeMap<CellId, Vec<Label>>,
    fractions: BTreeMap<CellId, FractionMap>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(target: "source_tracking::cli", error = %err, "trace_sources.failed");
            eprintln!("trace_sources: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let raw = match env::args().nth(1).as_deref() {
        Some("-h") | Some("--help") => {
            print_usage();
            return Ok(());
        }
        Some("-") | None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
        Some(path) => fs::read_to_string(path)?,
    };
    let input: NetworkInput = serde_json::from_str(&raw)?;

    let (config, source) = load_config_from_env();
    info!(
        target: "source_tracking::cli",
        source = ?source,
        cells = input.labels.len(),
        "trace_sources.start"
    );

    let network = match (input.receivers, input.d8) {
        (Some(receivers), None) => {
            let network = FlowNetwork::new(Routing::Single(receivers));
            match input.core {
                Some(core) => network.with_core_mask(core),
                None => network,
            }
        }
        (None, Some(d8)) => {
            let shape = RasterShape::new(d8.rows, d8.cols);
            let mut core = closed_core_mask(shape, &d8.codes, d8.nodata)?;
            if let Some(extra) = &input.core {
                core = intersect_core_masks(&core, extra)?;
            }
            let routing = routing_from_esri_codes_masked(shape, &d8.codes, &core)?;
            FlowNetwork::new(routing).with_core_mask(core)
        }
        _ => return Err("input needs exactly one of `receivers` or `d8`".into()),
    };

    let trace = SourceTracker::new(config).trace(&network, &input.labels)?;
    let output = TraceOutput {
        flow_accum: trace.flow_accumulation(),
        hsd_upstr: trace.upstream_compositions(),
        fractions: trace.unique_fractions(),
    };

    let stdout = io::stdout();
    serde_json::to_writer_pretty(stdout.lock(), &output)?;
    println!();
    Ok(())
}

fn print_usage() {
    eprintln!("Usage: trace_sources [INPUT.json | -]");
    eprintln!("       INPUT: {{ \"receivers\": [..], \"labels\": [..], \"core\": [..] }}");
    eprintln!("          or: {{ \"d8\": {{ \"rows\", \"cols\", \"codes\", \"nodata\" }},");
    eprintln!("                 \"labels\": [..], \"core\": [..] }}");
    eprintln!("       D8 rasters keep only interior, non-nodata cells inside `core`.");
}
