use std::path::PathBuf;
use std::sync::Arc;

use meet_recorder_core::{
    Detector, FixturePage, MemorySettingsStore, PageRuntime, Phase, RecorderConfig, Wake,
};
use meet_recorder_protocol::{DetectorReport, FailureReason};

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/pages")
        .join(name)
}

fn runtime_for(name: &str) -> PageRuntime<FixturePage> {
    let page = FixturePage::load(&fixture_path(name)).expect("fixture should load");
    let detector = Detector::new(
        RecorderConfig::default(),
        Arc::new(MemorySettingsStore::default()),
    );
    PageRuntime::new(detector, page)
}

#[test]
fn test_scenario_a_toolbar_control_starts_in_one_cycle() {
    let mut runtime = runtime_for("scenario_a.json");
    runtime.page_ready();

    assert_eq!(runtime.detector().phase(), Phase::Started);
    assert_eq!(runtime.now(), 0);
    assert_eq!(runtime.page().click_count("record"), 1);
    assert_eq!(runtime.drain_reports(), vec![DetectorReport::started()]);

    // The indicator the click revealed is seen by the observer and skipped.
    runtime.run_until_idle();
    assert!(runtime.drain_reports().is_empty());
    assert_eq!(runtime.page().clicks().len(), 1);
}

#[test]
fn test_scenario_b_fails_once_after_max_retries() {
    let mut runtime = runtime_for("scenario_b.json");
    runtime.page_ready();
    runtime.run_until_idle();

    let session = runtime.detector().session();
    assert_eq!(session.phase, Phase::Failed);
    assert_eq!(session.retry_count, 10);
    assert!(!session.recording_started());
    assert_eq!(
        runtime.drain_reports(),
        vec![DetectorReport::failed(FailureReason::MaxRetries)]
    );
    assert!(runtime.page().clicks().is_empty());
    assert_eq!(runtime.scheduler().pending(), 0);

    // 2s + 4s + 8s + 16s + 5 x 30s between the ten attempts.
    assert_eq!(runtime.now(), 180_000);
}

#[test]
fn test_scenario_c_overflow_menu_and_slow_panel() {
    let mut runtime = runtime_for("scenario_c.json");
    runtime.page_ready();
    runtime.run_until_idle();

    assert_eq!(runtime.detector().phase(), Phase::Started);
    assert_eq!(runtime.drain_reports(), vec![DetectorReport::started()]);

    let page = runtime.page();
    assert_eq!(page.click_count("more"), 1);
    assert_eq!(page.click_count("manage"), 1);
    assert_eq!(page.click_count("captions"), 1);
    assert_eq!(page.click_count("start"), 1);
    assert_eq!(page.is_checked("captions"), Some(true));

    // Captions toggled before the start click.
    let order: Vec<&str> = page
        .clicks()
        .iter()
        .filter_map(|click| click.key.as_deref())
        .collect();
    assert_eq!(order, vec!["more", "manage", "captions", "start"]);

    // The empty panel shell forced exactly one recheck.
    let rechecks = runtime
        .scheduler()
        .history()
        .iter()
        .filter(|record| record.wake == Wake::CheckPanel { recheck: true })
        .count();
    assert_eq!(rechecks, 1);
}

#[test]
fn test_scenario_c_trace_names_every_stage() {
    let mut runtime = runtime_for("scenario_c.json");
    runtime.page_ready();
    runtime.run_until_idle();

    let phases: Vec<Phase> = runtime
        .detector()
        .trace()
        .entries()
        .iter()
        .map(|entry| entry.phase)
        .collect();
    for expected in [
        Phase::DetectingJoin,
        Phase::DetectingHost,
        Phase::LocatingControl,
        Phase::Confirming,
        Phase::Started,
    ] {
        assert!(phases.contains(&expected), "missing {:?} in {:?}", expected, phases);
    }
    let text = meet_recorder_core::format_trace(runtime.detector().trace());
    assert!(text.contains("opened recording panel from overflow_menu"));
}
