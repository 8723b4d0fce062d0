//! `simulate`: drive the detector over a page fixture.
//!
//! The start request is delivered the way the coordinator would send it,
//! then the runtime runs until idle (or `--until-ms`). A JSON summary of the
//! outcome goes to stdout.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use meet_recorder_core::{
    format_trace, load_config, Detector, FileSettingsStore, FixturePage, HostSignal, Millis, Pace,
    PageRuntime, Phase, RecorderError, Result, StorageConfig,
};
use meet_recorder_protocol::{DetectionMethod, DetectorReport, DetectorRequest, RecordingStatus};

pub struct SimulateOptions {
    pub fixture: PathBuf,
    pub method: DetectionMethod,
    pub config: Option<PathBuf>,
    pub until_ms: Option<Millis>,
    pub trace: bool,
    pub realtime: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulationSummary {
    phase: Phase,
    elapsed_ms: Millis,
    status: RecordingStatus,
    host_signal: Option<HostSignal>,
    retry_count: u32,
    reports: Vec<DetectorReport>,
    clicks: Vec<ClickSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClickSummary {
    at_ms: Millis,
    target: String,
}

pub fn run(storage: &StorageConfig, options: SimulateOptions) -> Result<()> {
    let config_path = options.config.unwrap_or_else(|| storage.config_file());
    let config = load_config(&config_path)?;
    let settings = Arc::new(FileSettingsStore::new(storage.settings_file()));
    let page = FixturePage::load(&options.fixture)?;
    let pace = if options.realtime {
        Pace::RealTime
    } else {
        Pace::Virtual
    };

    info!(
        fixture = %options.fixture.display(),
        method = options.method.as_str(),
        pace = ?pace,
        "Simulation starting"
    );
    let mut runtime = PageRuntime::with_pace(Detector::new(config, settings), page, pace);
    runtime.deliver(DetectorRequest::StartHostDetection {
        method: options.method,
    });
    match options.until_ms {
        Some(limit) => runtime.run_until(limit),
        None => runtime.run_until_idle(),
    }

    let summary = summarize(&mut runtime);
    info!(phase = %summary.phase, elapsed_ms = summary.elapsed_ms, "Simulation finished");

    if options.trace {
        println!("{}", format_trace(runtime.detector().trace()));
    }
    let json = serde_json::to_string_pretty(&summary).map_err(|source| RecorderError::Json {
        context: "serializing simulation summary".to_string(),
        source,
    })?;
    println!("{}", json);
    Ok(())
}

fn summarize(runtime: &mut PageRuntime<FixturePage>) -> SimulationSummary {
    let reports = runtime.drain_reports();
    let session = runtime.detector().session();
    let clicks = runtime
        .page()
        .clicks()
        .iter()
        .map(|click| ClickSummary {
            at_ms: click.at,
            target: click
                .key
                .clone()
                .unwrap_or_else(|| format!("node-{}", click.node.index())),
        })
        .collect();
    SimulationSummary {
        phase: session.phase,
        elapsed_ms: runtime.now(),
        status: session.status(),
        host_signal: session.host_signal,
        retry_count: session.retry_count,
        reports,
        clicks,
    }
}
