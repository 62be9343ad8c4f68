use polyfm::synth::note::midi_note_to_frequency;
use polyfm::synth::scale::{quantize, semitone_to_frequency, NoteName};
use proptest::prelude::*;

#[test]
fn test_quantize_known_pitches() {
    let a4 = quantize(440.0).expect("440 Hz is a pitch");
    assert_eq!(a4.semitones, 0);
    assert_eq!(a4.note, NoteName::A);
    assert_eq!(a4.frequency, 440.0);

    let c4 = quantize(261.0).expect("261 Hz is a pitch");
    assert_eq!(c4.note, NoteName::C);
    assert!((c4.frequency - 261.6256).abs() < 1e-3);

    let a_sharp = quantize(466.0).expect("466 Hz is a pitch");
    assert_eq!(a_sharp.note.to_string(), "A#");
}

#[test]
fn test_quantize_rejects_non_pitches() {
    assert!(quantize(0.0).is_none());
    assert!(quantize(-20.0).is_none());
    assert!(quantize(f32::NAN).is_none());
}

#[test]
fn test_midi_note_to_frequency() {
    assert_eq!(midi_note_to_frequency(69), 440.0);
    assert!((midi_note_to_frequency(60) - 261.6256).abs() < 1e-3);
    assert!((midi_note_to_frequency(81) - 880.0).abs() < 1e-3);
}

proptest! {
    #[test]
    fn quantized_pitch_is_within_half_a_semitone(freq in 20.0f32..5000.0) {
        let pitch = quantize(freq).unwrap();
        let cents = 1200.0 * (f64::from(freq) / f64::from(pitch.frequency)).log2();
        prop_assert!(cents.abs() <= 50.0 + 1e-3, "{} Hz is {} cents from {}", freq, cents, pitch.frequency);
    }

    #[test]
    fn quantize_is_idempotent(freq in 20.0f32..5000.0) {
        let once = quantize(freq).unwrap();
        let twice = quantize(once.frequency).unwrap();
        prop_assert_eq!(once.semitones, twice.semitones);
        prop_assert_eq!(once.note, twice.note);
    }

    #[test]
    fn note_names_repeat_every_octave(semitones in -48i32..48) {
        prop_assert_eq!(NoteName::from_semitones(semitones), NoteName::from_semitones(semitones + 12));
        let up = semitone_to_frequency(semitones + 12);
        let base = semitone_to_frequency(semitones);
        prop_assert!((up / base - 2.0).abs() < 1e-4);
    }
}
