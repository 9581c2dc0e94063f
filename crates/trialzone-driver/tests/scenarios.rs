//! End-to-end driver tests: a handful of readers wired directly into a
//! [`Router`], run through a real [`Driver`], with the emitted JSON-lines
//! file read back and checked against hand-computed expected values.

use std::collections::HashMap;
use std::io::BufRead;

use trialzone_core::{BufferId, BufferKind, NumericEventBuffer, NumericRow, SignalBuffer, TextEventBuffer, TextRow};
use trialzone_driver::{Driver, RunMode};
use trialzone_enhance::{EnhancerPipeline, SignalNormalizer};
use trialzone_extract::{Extractor, ExtractorConfig, WrtConfig};
use trialzone_readers::{AnyBuffer, DerivedEntry, InMemoryReader, Router, RouterEntry};
use trialzone_sink::JsonLinesSink;
use trialzone_sync::{SyncDescriptor, SyncRegistry};
use trialzone_transform::{OffsetThenGain, Pipeline};

fn reference_sync(reader_name: &str) -> SyncRegistry {
    let mut descriptors = HashMap::new();
    descriptors.insert(
        reader_name.to_string(),
        SyncDescriptor::reference("unused", trialzone_expr::parse("false").unwrap()),
    );
    SyncRegistry::new(descriptors).unwrap()
}

fn run_experiment(router: Router, sync: SyncRegistry, extractor: Extractor) -> (trialzone_driver::RunSummary, Vec<serde_json::Value>) {
    run_experiment_with_collecters(router, sync, extractor, Vec::new())
}

fn run_experiment_with_collecters(
    router: Router,
    sync: SyncRegistry,
    extractor: Extractor,
    collecters: Vec<Box<dyn trialzone_enhance::Collecter>>,
) -> (trialzone_driver::RunSummary, Vec<serde_json::Value>) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trials.jsonl");
    let sink = JsonLinesSink::create(&path).unwrap();

    let experiment = trialzone_config::Experiment {
        experiment: toml::value::Table::new(),
        router,
        sync,
        extractor,
        collecters,
        gui_paced: false,
    };

    let mut driver = Driver::new(experiment, Box::new(sink), RunMode::Convert);
    let summary = driver.run().unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let lines: Vec<serde_json::Value> = std::io::BufReader::new(file)
        .lines()
        .map(|l| serde_json::from_str(&l.unwrap()).unwrap())
        .collect();
    (summary, lines)
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

/// The core demo: three numeric readers (a start/WRT delimiter buffer, a
/// `bar` buffer with a derived `bar_2 = OffsetThenGain(10, -2)`) plus a
/// text reader, producing trial 0, two bounded trials, and a final
/// open-ended trial.
#[test]
fn core_demo_produces_four_trials_with_expected_shapes() {
    let mut delim = NumericEventBuffer::new("delim");
    delim
        .append(vec![
            NumericRow::new(1.0, vec![1010.0]),
            NumericRow::new(1.5, vec![42.0]),
            NumericRow::new(2.0, vec![1010.0]),
            NumericRow::new(2.5, vec![42.0]),
            NumericRow::new(2.6, vec![42.0]),
            NumericRow::new(3.0, vec![1010.0]),
            NumericRow::new(3.5, vec![42.0]),
        ])
        .unwrap();

    let mut bar = NumericEventBuffer::new("bar");
    bar.append(vec![NumericRow::new(0.1, vec![1.0]), NumericRow::new(3.1, vec![0.0])])
        .unwrap();

    let mut foo = TextEventBuffer::new("foo");
    foo.append(vec![
        TextRow::new(0.2, "red"),
        TextRow::new(1.2, "red"),
        TextRow::new(1.3, "green"),
        TextRow::new(2.2, "red"),
        TextRow::new(2.3, "green"),
    ])
    .unwrap();

    // bar_2's content is what OffsetThenGain(10, -2) would produce from
    // `bar`; populated directly here (rather than replayed through a live
    // reader pull) the same way the extractor's own unit tests pre-load
    // buffers, since no reader in this test emits a piece through the
    // router's route_piece fan-out.
    let mut bar_2 = NumericEventBuffer::new("bar_2");
    bar_2
        .append(vec![NumericRow::new(0.1, vec![-22.0]), NumericRow::new(3.1, vec![-20.0])])
        .unwrap();
    let mut pipeline = Pipeline::default();
    pipeline.push(Box::new(OffsetThenGain::new(10.0, -2.0)));

    let mut router = Router::new();
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("delim_reader", Vec::new())),
        AnyBuffer::Numeric(delim),
        Vec::new(),
    ));
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("bar_reader", Vec::new())),
        AnyBuffer::Numeric(bar),
        vec![DerivedEntry {
            pipeline,
            buffer: AnyBuffer::Numeric(bar_2),
        }],
    ));
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("foo_reader", Vec::new())),
        AnyBuffer::Text(foo),
        Vec::new(),
    ));

    let sync = reference_sync("delim_reader");
    let config = ExtractorConfig {
        start_buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
        start_column: 0,
        start_value: 1010.0,
        wrt: Some(WrtConfig {
            buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
            column: 0,
            value: 42.0,
        }),
    };
    let extractor = Extractor::new(config, EnhancerPipeline::default());

    let (summary, lines) = run_experiment(router, sync, extractor);
    assert_eq!(summary.trials_emitted, 4);
    assert_eq!(lines.len(), 4);

    let t0 = &lines[0];
    assert_eq!(t0["start_time"], serde_json::Value::Null);
    assert_eq!(t0["end_time"], serde_json::json!(1.0));
    assert_eq!(t0["wrt_time"], serde_json::json!(0.0));
    assert_eq!(t0["numeric_events"]["bar"], serde_json::json!([[0.1, 1.0]]));
    assert_eq!(t0["numeric_events"]["bar_2"], serde_json::json!([[0.1, -22.0]]));
    assert_eq!(t0["text_events"]["foo"]["timestamp_data"], serde_json::json!([0.2]));
    assert_eq!(t0["text_events"]["foo"]["text_data"], serde_json::json!(["red"]));

    let t1 = &lines[1];
    assert_eq!(t1["start_time"], serde_json::json!(1.0));
    assert_eq!(t1["end_time"], serde_json::json!(2.0));
    assert_eq!(t1["wrt_time"], serde_json::json!(1.5));
    let foo1_ts: Vec<f64> = t1["text_events"]["foo"]["timestamp_data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_f64().unwrap())
        .collect();
    assert!(approx(foo1_ts[0], -0.3));
    assert!(approx(foo1_ts[1], -0.2));

    let t2 = &lines[2];
    assert_eq!(t2["start_time"], serde_json::json!(2.0));
    assert_eq!(t2["end_time"], serde_json::json!(3.0));
    assert_eq!(t2["wrt_time"], serde_json::json!(2.5));

    let t3 = &lines[3];
    assert_eq!(t3["start_time"], serde_json::json!(3.0));
    assert_eq!(t3["end_time"], serde_json::Value::Null);
    assert_eq!(t3["wrt_time"], serde_json::json!(3.5));
    let bar3 = t3["numeric_events"]["bar"].as_array().unwrap();
    assert!(approx(bar3[0][0].as_f64().unwrap(), -0.4));
    assert_eq!(bar3[0][1], serde_json::json!(0.0));
    let bar2_3 = t3["numeric_events"]["bar_2"].as_array().unwrap();
    assert!(approx(bar2_3[0][0].as_f64().unwrap(), -0.4));
    assert_eq!(bar2_3[0][1], serde_json::json!(-20.0));
}

/// A first start event with nothing before it: the implicit trial 0 covers
/// `(-inf, first_start)`, its WRT defaults to 0 since no WRT is configured,
/// and an unrelated text buffer passes through unshifted.
#[test]
fn pre_start_trial_zero_is_unshifted_with_no_wrt() {
    let mut delim = NumericEventBuffer::new("delim");
    delim.append(vec![NumericRow::new(1.0, vec![1010.0])]).unwrap();
    let mut foo = TextEventBuffer::new("foo");
    foo.append(vec![TextRow::new(0.2, "early")]).unwrap();

    let mut router = Router::new();
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("delim_reader", Vec::new())),
        AnyBuffer::Numeric(delim),
        Vec::new(),
    ));
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("foo_reader", Vec::new())),
        AnyBuffer::Text(foo),
        Vec::new(),
    ));

    let sync = reference_sync("delim_reader");
    let config = ExtractorConfig {
        start_buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
        start_column: 0,
        start_value: 1010.0,
        wrt: None,
    };
    let extractor = Extractor::new(config, EnhancerPipeline::default());

    let (summary, lines) = run_experiment(router, sync, extractor);
    assert_eq!(summary.trials_emitted, 2);

    let t0 = &lines[0];
    assert_eq!(t0["start_time"], serde_json::Value::Null);
    assert_eq!(t0["end_time"], serde_json::json!(1.0));
    assert_eq!(t0["wrt_time"], serde_json::json!(0.0));
    assert_eq!(t0["text_events"]["foo"]["timestamp_data"], serde_json::json!([0.2]));
    assert_eq!(t0["text_events"]["foo"]["text_data"], serde_json::json!(["early"]));
}

/// A follower reader drifts ~50ms against the reference clock; the
/// corrected offset, once collected from the shared "delim" buffer's sync
/// markers, shifts a follower-owned data point into the reference clock.
#[test]
fn sync_correction_shifts_follower_data_by_the_estimated_offset() {
    let mut delim = NumericEventBuffer::new("delim");
    delim
        .append(vec![
            NumericRow::new(0.0, vec![1010.0]),
            NumericRow::new(1.0, vec![1.0]),
            NumericRow::new(10.0, vec![1010.0]),
            NumericRow::new(11.0, vec![1.0]),
            NumericRow::new(20.0, vec![1010.0]),
            NumericRow::new(21.0, vec![1.0]),
        ])
        .unwrap();

    let mut follower_data = NumericEventBuffer::new("follower_data");
    follower_data
        .append(vec![
            NumericRow::new(1.05, vec![1.0]),
            NumericRow::new(11.55, vec![1.0]),
            NumericRow::new(15.2, vec![999.0]),
            NumericRow::new(22.05, vec![1.0]),
        ])
        .unwrap();

    let mut router = Router::new();
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("ref_reader", Vec::new())),
        AnyBuffer::Numeric(delim),
        Vec::new(),
    ));
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("follower_reader", Vec::new())),
        AnyBuffer::Numeric(follower_data),
        Vec::new(),
    ));

    let mut descriptors = HashMap::new();
    descriptors.insert(
        "ref_reader".to_string(),
        SyncDescriptor::reference("delim", trialzone_expr::parse("value == 1").unwrap()),
    );
    descriptors.insert(
        "follower_reader".to_string(),
        SyncDescriptor::owning("follower_data", trialzone_expr::parse("value == 1").unwrap()),
    );
    let sync = SyncRegistry::new(descriptors).unwrap();

    let config = ExtractorConfig {
        start_buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
        start_column: 0,
        start_value: 1010.0,
        wrt: None,
    };
    let extractor = Extractor::new(config, EnhancerPipeline::default());

    let (summary, lines) = run_experiment(router, sync, extractor);
    assert_eq!(summary.trials_emitted, 4);

    // trial 2 spans reference time [10, 20); the 999-valued row sits at
    // local time 15.2 and should land at 15.2 - 0.05 = 15.15 once the
    // -0.05s drift collected from the shared sync markers is applied.
    let t2 = &lines[2];
    assert_eq!(t2["start_time"], serde_json::json!(10.0));
    assert_eq!(t2["end_time"], serde_json::json!(20.0));
    let rows = t2["numeric_events"]["follower_data"].as_array().unwrap();
    let matched = rows
        .iter()
        .find(|row| row[1].as_f64() == Some(999.0))
        .expect("the 999-valued row must survive into trial 2");
    assert!(approx(matched[0].as_f64().unwrap(), 15.15));
}

/// A signal chunk queried into a trial whose WRT lands one second after the
/// chunk's own `t0`: the whole chunk shifts so its first sample reads at
/// local time -1.0.
#[test]
fn signal_trial_aligns_first_sample_to_wrt() {
    let mut delim = NumericEventBuffer::new("delim");
    delim
        .append(vec![NumericRow::new(0.0, vec![1010.0]), NumericRow::new(1.0, vec![42.0])])
        .unwrap();

    let mut sig = SignalBuffer::new("sig");
    let samples: Vec<f64> = (0..120).map(|i| i as f64).collect();
    sig.append(0.0, 10.0, &["ch0".to_string(), "ch1".to_string()], samples).unwrap();

    let mut router = Router::new();
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("delim_reader", Vec::new())),
        AnyBuffer::Numeric(delim),
        Vec::new(),
    ));
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("sig_reader", Vec::new())),
        AnyBuffer::Signal(sig),
        Vec::new(),
    ));

    let sync = reference_sync("delim_reader");
    let config = ExtractorConfig {
        start_buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
        start_column: 0,
        start_value: 1010.0,
        wrt: Some(WrtConfig {
            buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
            column: 0,
            value: 42.0,
        }),
    };
    let extractor = Extractor::new(config, EnhancerPipeline::default());

    let (summary, lines) = run_experiment(router, sync, extractor);
    assert_eq!(summary.trials_emitted, 2);

    let t1 = &lines[1];
    assert_eq!(t1["start_time"], serde_json::json!(0.0));
    assert_eq!(t1["wrt_time"], serde_json::json!(1.0));
    let sig_json = &t1["signals"]["sig"];
    assert!(approx(sig_json["first_sample_time"].as_f64().unwrap(), -1.0));
    assert_eq!(sig_json["sample_frequency"], serde_json::json!(10.0));
    assert_eq!(sig_json["channel_ids"], serde_json::json!(["ch0", "ch1"]));
    let rows = sig_json["signal_data"].as_array().unwrap();
    assert_eq!(rows.len(), 60);
    assert_eq!(rows[0], serde_json::json!([0.0, 1.0]));
}

/// A `SignalNormalizer` collecter runs once at end of stream and rewrites
/// every signal-bearing trial's enhancements with a factor derived from the
/// global max sample magnitude across the whole run.
#[test]
fn signal_normalizer_rescales_by_global_max() {
    let mut delim = NumericEventBuffer::new("delim");
    delim
        .append(vec![
            NumericRow::new(0.0, vec![1010.0]),
            NumericRow::new(1.0, vec![1010.0]),
            NumericRow::new(2.0, vec![1010.0]),
        ])
        .unwrap();

    let mut sig = SignalBuffer::new("sig");
    let samples: Vec<f64> = (0..20).map(|i| i as f64).collect();
    sig.append(0.0, 10.0, &["ch0".to_string()], samples).unwrap();

    let mut router = Router::new();
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("delim_reader", Vec::new())),
        AnyBuffer::Numeric(delim),
        Vec::new(),
    ));
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("sig_reader", Vec::new())),
        AnyBuffer::Signal(sig),
        Vec::new(),
    ));

    let sync = reference_sync("delim_reader");
    let config = ExtractorConfig {
        start_buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
        start_column: 0,
        start_value: 1010.0,
        wrt: None,
    };
    let extractor = Extractor::new(config, EnhancerPipeline::default());
    let collecters: Vec<Box<dyn trialzone_enhance::Collecter>> = vec![Box::new(SignalNormalizer {
        signal_name: "sig".to_string(),
    })];

    let (summary, lines) = run_experiment_with_collecters(router, sync, extractor, collecters);
    assert_eq!(summary.trials_emitted, 4);
    assert_eq!(summary.trials_rewritten, 4);

    // trial 1 spans [0, 1): samples 0..9; trial 2 spans [1, 2): samples
    // 10..19. The global max across the whole run is 19, so both carry the
    // same 1/19 factor regardless of their own local maximum.
    let factor = 1.0 / 19.0;
    for index in [1, 2] {
        let got = lines[index]["enhancements"]["sig_normalization_factor"].as_f64().unwrap();
        assert!(approx(got, factor), "trial {index}: expected {factor}, got {got}");
    }
}

#[derive(Debug)]
struct AlwaysFailsEnhancer;
impl trialzone_enhance::Enhancer for AlwaysFailsEnhancer {
    fn name(&self) -> &str {
        "always_fails"
    }
    fn apply(&self, _trial: &mut trialzone_core::Trial) -> Result<(), trialzone_enhance::EnhanceError> {
        Err(trialzone_enhance::EnhanceError::Enhancer {
            name: "always_fails".to_string(),
            message: "boom".to_string(),
        })
    }
}

#[derive(Debug)]
struct SetsFlagEnhancer;
impl trialzone_enhance::Enhancer for SetsFlagEnhancer {
    fn name(&self) -> &str {
        "sets_flag"
    }
    fn apply(&self, trial: &mut trialzone_core::Trial) -> Result<(), trialzone_enhance::EnhanceError> {
        trial.set_enhancement("flag", serde_json::json!(true));
        Ok(())
    }
}

/// An enhancer that always fails does not stop the pipeline, the trial, or
/// the run: later enhancer stages still apply and the trial is still
/// written to the sink with whatever enhancements succeeded.
#[test]
fn failing_enhancer_does_not_abort_the_run() {
    let mut delim = NumericEventBuffer::new("delim");
    delim.append(vec![NumericRow::new(1.0, vec![1010.0])]).unwrap();

    let mut router = Router::new();
    router.add_reader(RouterEntry::new(
        Box::new(InMemoryReader::new("delim_reader", Vec::new())),
        AnyBuffer::Numeric(delim),
        Vec::new(),
    ));

    let sync = reference_sync("delim_reader");
    let config = ExtractorConfig {
        start_buffer: BufferId::new(BufferKind::NumericEvent, "delim"),
        start_column: 0,
        start_value: 1010.0,
        wrt: None,
    };
    let pipeline = EnhancerPipeline::new(vec![Box::new(AlwaysFailsEnhancer), Box::new(SetsFlagEnhancer)]);
    let extractor = Extractor::new(config, pipeline);

    let (summary, lines) = run_experiment(router, sync, extractor);
    assert_eq!(summary.trials_emitted, 2);
    for trial in &lines {
        assert_eq!(trial["enhancements"]["flag"], serde_json::json!(true));
        assert!(trial["enhancements"].get("always_fails").is_none());
    }
}
