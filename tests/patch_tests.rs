use polyfm::synth::{Curve, Patch, SynthConfig, SynthError, SynthMode, Synth, Waveform};

#[test]
fn test_default_patch_round_trips() {
    let patch = Patch::default();
    let json = patch.to_json().expect("serializable");
    let restored = Patch::from_json(&json).expect("parseable");
    assert_eq!(patch, restored);
}

#[test]
fn test_missing_fields_take_defaults() {
    let patch = Patch::from_json(r#"{ "name": "bare", "operators": [ { "base_frequency": 330.0 } ] }"#)
        .expect("parseable");

    assert_eq!(patch.mode, SynthMode::Dynamic);
    let op = &patch.operators[0];
    assert_eq!(op.base_frequency, 330.0);
    assert_eq!(op.volume, 1.0);
    assert_eq!(op.waveform, Waveform::Sine);
    assert_eq!(op.modulator, None);
    assert_eq!(op.lfo_curve, Curve::constant(1.0));
    assert_eq!(op.envelope.attack, 1.0);
    assert!(!op.envelope.can_interrupt);
}

#[test]
fn test_lfo_curve_is_keyframe_list() {
    let patch = Patch::from_json(
        r#"{ "name": "wobble", "operators": [ {
            "use_lfo": true,
            "lfo_curve": [ { "time": 1.0, "value": 1.0 }, { "time": 0.0, "value": 0.5 } ]
        } ] }"#,
    )
    .expect("parseable");

    let curve = &patch.operators[0].lfo_curve;
    assert_eq!(curve.keys()[0].time, 0.0);
    assert!((curve.evaluate(0.5) - 0.75).abs() < 1e-6);
}

#[test]
fn test_load_bell_patch() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/patches/bell.json");
    let patch = Patch::load(path).expect("bell patch loads");
    assert_eq!(patch.name, "bell");
    assert_eq!(patch.mode, SynthMode::Midi);
    assert_eq!(patch.operators.len(), 2);

    let (synth, controller) = Synth::from_patch(&patch, &SynthConfig::default()).expect("valid chain");
    assert_eq!(synth.chain().len(), 2);
    assert_eq!(controller.operator_count(), 2);
    assert!(controller.is_note_on());
}

#[test]
fn test_load_errors() {
    let missing = Patch::load("does/not/exist.json");
    assert!(matches!(missing, Err(SynthError::PatchRead { .. })));

    let malformed = Patch::from_json("{ not json");
    assert!(matches!(malformed, Err(SynthError::PatchParse(_))));
}

#[test]
fn test_bad_links_fail_to_build() {
    let patch = Patch::from_json(r#"{ "name": "loop", "operators": [ { "modulator": 0 } ] }"#)
        .expect("parseable");
    let result = Synth::from_patch(&patch, &SynthConfig::default());
    assert!(matches!(result, Err(SynthError::ModulatorOrder { .. })));
}
