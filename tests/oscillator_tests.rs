use polyfm::synth::oscillator::Oscillator;
use polyfm::synth::{Curve, Keyframe, Waveform};

#[test]
fn test_waveform_shapes() {
    assert!(Waveform::Sine.evaluate(0.0, None).abs() < 1e-6);
    assert!((Waveform::Sine.evaluate(0.25, None) - 1.0).abs() < 1e-6);

    assert_eq!(Waveform::Square.evaluate(0.1, None), 1.0);
    assert_eq!(Waveform::Square.evaluate(0.6, None), -1.0);

    assert_eq!(Waveform::Sawtooth.evaluate(0.0, None), -1.0);
    assert_eq!(Waveform::Sawtooth.evaluate(0.5, None), 0.0);

    assert_eq!(Waveform::Triangle.evaluate(0.0, None), -1.0);
    assert_eq!(Waveform::Triangle.evaluate(0.25, None), 0.0);
    assert_eq!(Waveform::Triangle.evaluate(0.5, None), 1.0);
    assert_eq!(Waveform::Triangle.evaluate(0.75, None), 0.0);
}

#[test]
fn test_custom_waveform_follows_curve() {
    let ramp = Curve::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1.0, 1.0)]);
    assert!((Waveform::Custom.evaluate(0.3, Some(&ramp)) - 0.3).abs() < 1e-6);
    assert_eq!(Waveform::Custom.evaluate(0.3, None), 0.0);

    let loud = Curve::constant(3.0);
    assert_eq!(Waveform::Custom.evaluate(0.5, Some(&loud)), 1.0);
}

#[test]
fn test_curve_holds_end_values() {
    let curve = Curve::new(vec![Keyframe::new(1.0, 4.0), Keyframe::new(0.5, 2.0)]);
    assert_eq!(curve.keys()[0].time, 0.5);
    assert_eq!(curve.evaluate(0.0), 2.0);
    assert_eq!(curve.evaluate(0.75), 3.0);
    assert_eq!(curve.evaluate(2.0), 4.0);
    assert_eq!(Curve::default().evaluate(0.5), 0.0);
}

#[test]
fn test_phase_stays_normalized() {
    let mut osc = Oscillator::new(48000.0);
    for _ in 0..48000 {
        osc.generate_sample(12345.0, 1.0, Waveform::Sine);
        assert!((0.0..1.0).contains(&osc.phase()));
    }

    // A frequency above the sample rate still wraps.
    osc.generate_sample(100_000.0, 1.0, Waveform::Sine);
    assert!((0.0..1.0).contains(&osc.phase()));

    osc.generate_sample(f32::INFINITY, 1.0, Waveform::Sine);
    assert_eq!(osc.phase(), 0.0);
}

#[test]
fn test_sine_period_matches_frequency() {
    let mut osc = Oscillator::new(48000.0);
    let samples: Vec<f32> = (0..480)
        .map(|_| osc.generate_sample(100.0, 0.5, Waveform::Sine))
        .collect();

    // One full cycle at 100 Hz is 480 samples; the last sample lands back on phase 0.
    assert!(samples.iter().all(|s| s.abs() <= 0.5 + 1e-6));
    assert!(osc.phase() < 1e-9 || osc.phase() > 1.0 - 1e-9);
}
