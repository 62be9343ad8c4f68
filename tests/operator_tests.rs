use polyfm::synth::scale::NoteName;
use polyfm::synth::voice::Voice;
use polyfm::synth::{
    CycleDirection, Curve, EnvelopeConfig, EnvelopeState, Operator, OperatorConfig, Waveform,
};

const SAMPLE_RATE: f32 = 48000.0;
const DT: f32 = 1.0 / SAMPLE_RATE;

fn operator(envelope: EnvelopeConfig) -> Operator {
    let config = OperatorConfig {
        base_frequency: 440.0,
        volume: 1.0,
        waveform: Waveform::Sine,
        quantize_to_scale: false,
        use_lfo: false,
        envelope,
        ..OperatorConfig::default()
    };
    Operator::new(config, SAMPLE_RATE, 32)
}

#[test]
fn test_drone_envelope_reaches_peak_then_sustain() {
    let mut op = operator(EnvelopeConfig::new(0.1, 0.2, 0.7, 0.5));

    for _ in 0..4800 {
        op.frequency_sample_value(true, DT, None);
    }
    let peak = op.envelope().amplitude();
    assert!((peak - 1.0).abs() < 1e-2, "amplitude after attack was {}", peak);

    for _ in 4800..14400 {
        op.frequency_sample_value(true, DT, None);
    }
    let level = op.envelope().amplitude();
    assert!((level - 0.7).abs() < 1e-2, "amplitude after decay was {}", level);
}

#[test]
fn test_voices_sum_independently() {
    let envelope = EnvelopeConfig::new(0.01, 0.01, 0.7, 0.05);
    let mut op = operator(envelope);
    op.set_primary_enabled(false);

    let a4 = op.add_voice(440.0);
    let c5 = op.add_voice(554.37);
    assert_eq!(op.voice_count(), 2);

    let mut reference_a4 = Voice::new(a4, 440.0, envelope, SAMPLE_RATE);
    let mut reference_c5 = Voice::new(c5, 554.37, envelope, SAMPLE_RATE);

    for _ in 0..1000 {
        let sample = op.frequency_sample_value(true, DT, None);
        let expected = reference_a4.next_sample(1.0, Waveform::Sine, DT)
            + reference_c5.next_sample(1.0, Waveform::Sine, DT);
        assert!((sample - expected).abs() < 1e-5);
    }

    assert!(op.remove_voice(a4));
    assert!(!op.remove_voice(a4), "second removal should be a no-op");

    let released = op.voice(a4).map(|voice| voice.envelope().state());
    assert_eq!(released, Some(EnvelopeState::Sustain));
    op.frequency_sample_value(true, DT, None);
    assert_eq!(
        op.voice(a4).map(|voice| voice.envelope().state()),
        Some(EnvelopeState::Release)
    );

    for _ in 0..5000 {
        op.frequency_sample_value(true, DT, None);
    }
    assert!(op.voice(a4).is_none(), "released voice should be discarded");
    let held = op.voice(c5).map(|voice| voice.envelope().state());
    assert_eq!(held, Some(EnvelopeState::Sustain));
    assert_eq!(op.voice_count(), 1);
}

#[test]
fn test_full_pool_steals_oldest_voice() {
    let mut op = Operator::new(OperatorConfig::default(), SAMPLE_RATE, 2);
    let first = op.add_voice(220.0);
    let second = op.add_voice(330.0);
    let third = op.add_voice(440.0);

    assert_eq!(op.voice_count(), 2);
    assert!(op.voice(first).is_none());
    assert!(op.voice(second).is_some());
    assert!(op.voice(third).is_some());
}

#[test]
fn test_silent_without_drone_or_voices() {
    let mut op = operator(EnvelopeConfig::new(0.0, 0.0, 1.0, 0.0));
    op.set_primary_enabled(false);
    for _ in 0..100 {
        assert_eq!(op.frequency_sample_value(true, DT, Some(0.5)), 0.0);
    }
}

#[test]
fn test_quantize_reports_note_name() {
    let mut op = operator(EnvelopeConfig::default());
    assert_eq!(op.current_note(), None);

    op.set_base_frequency(445.0);
    op.set_quantize_to_scale(true);
    op.frequency_sample_value(true, DT, None);
    assert_eq!(op.current_note(), Some(NoteName::A));

    op.set_base_frequency(262.0);
    op.frequency_sample_value(true, DT, None);
    assert_eq!(op.current_note(), Some(NoteName::C));
    assert_eq!(op.current_note().map(|n| n.to_string()), Some("C".to_string()));

    op.set_quantize_to_scale(false);
    assert_eq!(op.current_note(), None);
}

#[test]
fn test_setters_clamp_to_ranges() {
    let mut op = Operator::default();

    op.set_base_frequency(10_000.0);
    assert_eq!(op.config().base_frequency, 5000.0);
    op.set_base_frequency(0.0);
    assert_eq!(op.config().base_frequency, 1.0);
    op.set_base_frequency(f32::NAN);
    assert_eq!(op.config().base_frequency, 1.0);

    op.set_volume(2.0);
    assert_eq!(op.config().volume, 1.0);
    op.set_volume(-1.0);
    assert_eq!(op.config().volume, 0.0);

    op.set_lfo(true, 100.0);
    assert!(op.config().use_lfo);
    assert_eq!(op.config().lfo_frequency, 20.0);
    op.set_lfo(false, 0.0);
    assert_eq!(op.config().lfo_frequency, 0.1);
}

#[test]
fn test_cycle_waveform_wraps() {
    let mut op = Operator::default();
    assert_eq!(op.config().waveform, Waveform::Sine);

    op.cycle_waveform(CycleDirection::Forward);
    assert_eq!(op.config().waveform, Waveform::Square);

    op.cycle_waveform(CycleDirection::Backward);
    op.cycle_waveform(CycleDirection::Backward);
    assert_eq!(op.config().waveform, Waveform::Triangle);
}

#[test]
fn test_modulation_shifts_drone_frequency() {
    let mut plain = operator(EnvelopeConfig::new(0.0, 0.0, 1.0, 0.0));
    let mut modulated = operator(EnvelopeConfig::new(0.0, 0.0, 1.0, 0.0));

    let mut differs = false;
    for _ in 0..100 {
        let a = plain.frequency_sample_value(true, DT, Some(0.0));
        let b = modulated.frequency_sample_value(true, DT, Some(1.0));
        differs |= (a - b).abs() > 1e-4;
    }
    assert!(differs, "modulator output should change the carrier");
}

fn lfo_operator(use_lfo: bool, lfo_curve: Curve) -> Operator {
    let config = OperatorConfig {
        base_frequency: 440.0,
        use_lfo,
        lfo_frequency: 5.0,
        lfo_curve,
        envelope: EnvelopeConfig::new(0.0, 0.0, 1.0, 0.0),
        ..OperatorConfig::default()
    };
    Operator::new(config, SAMPLE_RATE, 32)
}

#[test]
fn test_lfo_curve_bends_drone_frequency() {
    let mut plain = lfo_operator(false, Curve::vibrato(0.5));
    let mut wobbling = lfo_operator(true, Curve::vibrato(0.5));

    let mut max_diff = 0.0f32;
    for _ in 0..4800 {
        let a = plain.frequency_sample_value(true, DT, None);
        let b = wobbling.frequency_sample_value(true, DT, None);
        max_diff = max_diff.max((a - b).abs());
    }
    assert!(max_diff > 0.1, "vibrato had no effect (max diff {})", max_diff);
}

#[test]
fn test_empty_lfo_curve_means_no_wobble() {
    let mut plain = lfo_operator(false, Curve::default());
    let mut from_config = lfo_operator(true, Curve::default());
    let mut replaced = lfo_operator(true, Curve::vibrato(0.5));
    replaced.set_lfo_curve(Curve::default());

    assert_eq!(from_config.config().lfo_curve, Curve::constant(1.0));
    assert_eq!(replaced.config().lfo_curve, Curve::constant(1.0));

    for _ in 0..4800 {
        let expected = plain.frequency_sample_value(true, DT, None);
        assert_eq!(from_config.frequency_sample_value(true, DT, None), expected);
        assert_eq!(replaced.frequency_sample_value(true, DT, None), expected);
    }
}
