mod common;
use common::{synthetic, write_sample_dataset, CaptureRenderer, Synth};
use erpkit::{run_pipeline, AnalysisConfig, DataConfig, PngRenderer};
use std::path::Path;

fn cfg_in(dir: &Path) -> AnalysisConfig {
    AnalysisConfig {
        erp_csv: dir.join("erp_peaks.csv"),
        tfr_csv: dir.join("tfr_band_power.csv"),
        ..AnalysisConfig::default()
    }
}

#[test]
fn end_to_end_on_sample_layout() {
    let (rec, _) = synthetic(&Synth { artifacts: vec![5], ..Synth::default() });
    let root = tempfile::tempdir().unwrap();
    write_sample_dataset(root.path(), &rec);
    let out = tempfile::tempdir().unwrap();
    let cfg = cfg_in(out.path());

    let mut r = CaptureRenderer::default();
    let summary = run_pipeline(None, &DataConfig::with_root(root.path()), &cfg, &mut r).unwrap();

    assert_eq!(summary.n_events, 20);
    assert_eq!(summary.n_epochs, 18);
    assert_eq!(summary.n_dropped, 2);
    assert_eq!(summary.peak.channel, "EEG 001");
    assert_eq!(summary.band_power.len(), 1);
    assert_eq!(r.raw.len(), 1);
    assert_eq!(r.tfr.len(), 1);

    let erp = std::fs::read_to_string(&cfg.erp_csv).unwrap();
    assert!(erp.starts_with("channel,amplitude_uV,latency_s\nEEG 001,"));
    let tfr = std::fs::read_to_string(&cfg.tfr_csv).unwrap();
    assert!(tfr.starts_with("channel,8-12Hz_power\nEEG 001,"));

    // A second run rewrites both files instead of appending.
    run_pipeline(None, &DataConfig::with_root(root.path()), &cfg, &mut r).unwrap();
    assert_eq!(std::fs::read_to_string(&cfg.erp_csv).unwrap().lines().count(), 2);
    assert_eq!(std::fs::read_to_string(&cfg.tfr_csv).unwrap().lines().count(), 2);
}

#[test]
fn json_overrides_reach_every_stage() {
    let (rec, _) = synthetic(&Synth::default());
    let root = tempfile::tempdir().unwrap();
    let raw_path = write_sample_dataset(root.path(), &rec);
    let out = tempfile::tempdir().unwrap();

    let json = serde_json::json!({
        "h_freq": 30.0,
        "event_id": { "standard": 2 },
        "condition": "standard",
        "peak_channel": "EEG 003",
        "freqs": [8.0, 10.0, 12.0],
        "n_cycles": [4.0],
        "band": [9.0, 11.0],
        "erp_csv": out.path().join("peaks.csv"),
        "tfr_csv": out.path().join("band.csv"),
    });
    let cfg_path = out.path().join("analysis.json");
    std::fs::write(&cfg_path, json.to_string()).unwrap();
    let cfg = AnalysisConfig::from_json_file(&cfg_path).unwrap();
    assert_eq!(cfg.tmin, -0.2);
    assert_eq!(cfg.h_freq, 30.0);

    let summary = run_pipeline(Some(&raw_path), &DataConfig::default(), &cfg, &mut CaptureRenderer::default()).unwrap();
    // only code-2 events are epoched; the last of them runs off the end
    assert_eq!(summary.n_epochs, 9);
    assert_eq!(summary.peak.channel, "EEG 003");

    let band = std::fs::read_to_string(out.path().join("band.csv")).unwrap();
    assert!(band.starts_with("channel,9-11Hz_power\n"));
}

#[test]
fn png_renderer_writes_preview_and_tfr() {
    let (rec, _) = synthetic(&Synth { duration: 12.0, ..Synth::default() });
    let root = tempfile::tempdir().unwrap();
    write_sample_dataset(root.path(), &rec);
    let out = tempfile::tempdir().unwrap();
    let plots = out.path().join("plots");

    let mut png = PngRenderer::new(&plots).unwrap().with_size(200, 120);
    run_pipeline(None, &DataConfig::with_root(root.path()), &cfg_in(out.path()), &mut png).unwrap();
    assert_eq!(png.written().len(), 2);
    assert!(plots.join("00_raw_eeg.png").exists());
    assert!(plots.join("01_tfr_eeg_001.png").exists());
}

#[test]
fn missing_condition_fails() {
    let (rec, _) = synthetic(&Synth { duration: 8.0, ..Synth::default() });
    let root = tempfile::tempdir().unwrap();
    write_sample_dataset(root.path(), &rec);
    let out = tempfile::tempdir().unwrap();
    let cfg = AnalysisConfig { condition: "auditory/left".into(), ..cfg_in(out.path()) };
    assert!(run_pipeline(None, &DataConfig::with_root(root.path()), &cfg, &mut CaptureRenderer::default()).is_err());
}
