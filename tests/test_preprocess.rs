mod common;
use common::{synthetic, Synth};
use erpkit::epochs::peak_to_peak;
use erpkit::events::from_pairs;
use erpkit::{filter_raw, find_events, reject_epochs, Channel, ChannelKind, DropReason, Recording};
use ndarray::{s, Array2, Axis};
use std::collections::BTreeMap;
use std::f64::consts::PI;

const THRESHOLD: f64 = 100e-6;

// ── filter_raw ────────────────────────────────────────────────────────────────

#[test]
fn bandpass_keeps_alpha_and_removes_line_noise() {
    let sfreq = 250.0;
    let n = 5000;
    let clean = |t: usize| (2.0 * PI * 10.0 * t as f64 / sfreq).sin();
    let data = Array2::from_shape_fn((2, n), |(c, t)| {
        if c == 0 {
            clean(t) + 0.5 * (2.0 * PI * 60.0 * t as f64 / sfreq).sin() + 0.3
        } else {
            (t % 1000 == 0) as i32 as f64
        }
    });
    let chans = vec![Channel::new("EEG 001", ChannelKind::Eeg), Channel::new("STI 014", ChannelKind::Stim)];
    let rec = Recording::new(data, sfreq, chans).unwrap();

    let out = filter_raw(&rec, 1.0, 40.0).unwrap();
    for t in 1500..3500 {
        let err = (out.data[[0, t]] - clean(t)).abs();
        assert!(err < 0.02, "t={t}: filtered {} vs clean {}", out.data[[0, t]], clean(t));
    }
    assert_eq!(out.data.row(1), rec.data.row(1));
    assert_eq!(rec.highpass, None);
    assert_eq!(out.highpass, Some(1.0));
    assert_eq!(out.lowpass, Some(40.0));
}

#[test]
fn invalid_bands_are_rejected() {
    let (rec, _) = synthetic(&Synth { duration: 5.0, ..Synth::default() });
    assert!(filter_raw(&rec, 40.0, 1.0).is_err());
    assert!(filter_raw(&rec, 20.0, 20.0).is_err());
    assert!(filter_raw(&rec, 1.0, 100.0).is_err()); // nyquist
    assert!(filter_raw(&rec, -1.0, 40.0).is_err());
}

// ── find_events ───────────────────────────────────────────────────────────────

#[test]
fn events_match_trigger_pulses() {
    let (rec, expected) = synthetic(&Synth::default());
    let events = find_events(&rec, "STI 014").unwrap();
    assert_eq!(events, from_pairs(&expected).unwrap());
    assert_eq!(events.len(), 20);
    assert_eq!(events[0].sample, 200);
}

// ── reject_epochs ─────────────────────────────────────────────────────────────

fn filtered(s: &Synth) -> (Recording, Vec<erpkit::Event>) {
    let (rec, pairs) = synthetic(s);
    let events = from_pairs(&pairs).unwrap();
    (filter_raw(&rec, 1.0, 40.0).unwrap(), events)
}

#[test]
fn artifacts_and_edge_windows_are_dropped() {
    let (rec, events) = filtered(&Synth { artifacts: vec![3, 7], ..Synth::default() });
    let epochs = reject_epochs(&rec, &events, None, -0.2, 0.8, THRESHOLD).unwrap();

    // 20 events: the last runs off the end, two carry artifacts
    assert_eq!(epochs.len(), 17);
    assert!(epochs.len() <= events.len());
    assert_eq!(epochs.drop_log.len(), 3);
    assert!(epochs.drop_log.iter().any(|d| d.event == events[19] && d.reason == DropReason::NoData));
    for idx in [3, 7] {
        let d = epochs.drop_log.iter().find(|d| d.event == events[idx]).unwrap();
        match &d.reason {
            DropReason::Rejected { channel, ptp } => {
                assert_eq!(channel, "EEG 002");
                assert!(*ptp >= THRESHOLD);
            }
            other => panic!("unexpected drop reason {other:?}"),
        }
    }

    assert_eq!(epochs.n_times(), 201);
    assert_eq!(epochs.n_chan(), rec.n_chan());
    assert_eq!(epochs.times[0], -0.2);
    assert_eq!(epochs.times[40], 0.0);
}

#[test]
fn retained_trials_are_under_threshold_everywhere() {
    let (rec, events) = filtered(&Synth { artifacts: vec![1, 4, 10], ..Synth::default() });
    let epochs = reject_epochs(&rec, &events, None, -0.2, 0.8, THRESHOLD).unwrap();
    let eeg: Vec<usize> = (0..rec.n_chan()).filter(|&i| rec.channels[i].kind == ChannelKind::Eeg).collect();
    for trial in epochs.data.axis_iter(Axis(0)) {
        for &ch in &eeg {
            assert!(peak_to_peak(trial.row(ch)) < THRESHOLD);
        }
    }
}

#[test]
fn baseline_is_removed() {
    let (rec, events) = filtered(&Synth::default());
    let epochs = reject_epochs(&rec, &events, None, -0.2, 0.8, THRESHOLD).unwrap();
    for trial in epochs.data.axis_iter(Axis(0)) {
        let mean = trial.slice(s![0, 0..=40]).mean().unwrap();
        assert!(mean.abs() < 1e-18);
    }
}

#[test]
fn event_id_selects_and_tags_conditions() {
    let (rec, events) = filtered(&Synth { artifacts: vec![2, 3], ..Synth::default() });

    let all = reject_epochs(&rec, &events, None, -0.2, 0.8, THRESHOLD).unwrap();
    let keys: Vec<&str> = all.event_id.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["1", "2"]);

    let id = BTreeMap::from([("auditory".to_string(), 1)]);
    let only = reject_epochs(&rec, &events, Some(&id), -0.2, 0.8, THRESHOLD).unwrap();
    // ten code-1 events, the one at index 2 rejected
    assert_eq!(only.len(), 9);
    assert!(only.events.iter().all(|e| e.code == 1));
    assert_eq!(only.condition_indices("auditory").unwrap().len(), 9);
    assert!(only.condition_indices("visual").is_err());

    let missing = BTreeMap::from([("visual".to_string(), 3)]);
    assert!(reject_epochs(&rec, &events, Some(&missing), -0.2, 0.8, THRESHOLD).is_err());
}

#[test]
fn tiny_threshold_rejects_everything() {
    let (rec, events) = filtered(&Synth { duration: 10.0, ..Synth::default() });
    let epochs = reject_epochs(&rec, &events, None, -0.2, 0.8, 1e-9).unwrap();
    assert!(epochs.is_empty());
    assert_eq!(epochs.drop_log.len(), events.len());
}

#[test]
fn inverted_window_is_an_error() {
    let (rec, events) = filtered(&Synth { duration: 5.0, ..Synth::default() });
    assert!(reject_epochs(&rec, &events, None, 0.8, -0.2, THRESHOLD).is_err());
}
