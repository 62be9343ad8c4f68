use polyfm::synth::{Envelope, EnvelopeConfig, EnvelopeState};

const DT: f32 = 1.0 / 1000.0;

fn run(envelope: &mut Envelope, note_on: bool, steps: usize) -> f32 {
    let mut amplitude = 0.0;
    for _ in 0..steps {
        amplitude = envelope.update(note_on, DT);
    }
    amplitude
}

fn adsr() -> EnvelopeConfig {
    EnvelopeConfig::new(0.1, 0.2, 0.7, 0.5)
}

#[test]
fn test_full_cycle_returns_to_idle() {
    let mut envelope = Envelope::new(adsr());
    assert_eq!(envelope.state(), EnvelopeState::Idle);

    assert_eq!(envelope.update(true, DT), 0.0);
    assert_eq!(envelope.state(), EnvelopeState::Attack);

    let held = run(&mut envelope, true, 400);
    assert_eq!(envelope.state(), EnvelopeState::Sustain);
    assert!((held - 0.7).abs() < 1e-6, "sustain level was {}", held);

    let first_release = envelope.update(false, DT);
    assert_eq!(envelope.state(), EnvelopeState::Release);
    assert!((first_release - 0.7).abs() < 1e-6);

    run(&mut envelope, false, 600);
    assert_eq!(envelope.state(), EnvelopeState::Idle);
    assert!(envelope.is_complete());
    assert_eq!(envelope.amplitude(), 0.0);
}

#[test]
fn test_attack_is_linear() {
    let mut envelope = Envelope::new(adsr());
    // 51st call has 50 ms elapsed: half way up a 100 ms attack.
    let amplitude = run(&mut envelope, true, 51);
    assert_eq!(envelope.state(), EnvelopeState::Attack);
    assert!((amplitude - 0.5).abs() < 1e-3, "amplitude was {}", amplitude);
}

#[test]
fn test_non_interruptible_release_waits_for_sustain() {
    let mut envelope = Envelope::new(adsr());
    run(&mut envelope, true, 10);

    envelope.update(false, DT);
    assert_eq!(envelope.state(), EnvelopeState::Attack);

    // Remaining attack (~90 ms) plus decay (200 ms), then release starts.
    run(&mut envelope, false, 400);
    assert_eq!(envelope.state(), EnvelopeState::Release);

    run(&mut envelope, false, 1000);
    assert!(envelope.is_complete());
}

#[test]
fn test_interruptible_release_is_immediate() {
    let mut envelope = Envelope::new(adsr().with_interrupt(true));
    let partial = run(&mut envelope, true, 10);
    assert!(partial > 0.0 && partial < 1.0);

    let released = envelope.update(false, DT);
    assert_eq!(envelope.state(), EnvelopeState::Release);
    assert!((released - partial).abs() < 1e-3);
}

#[test]
fn test_note_on_during_release_restarts_attack() {
    let mut envelope = Envelope::new(adsr());
    run(&mut envelope, true, 400);
    run(&mut envelope, false, 100);
    assert_eq!(envelope.state(), EnvelopeState::Release);
    assert!(envelope.amplitude() > 0.0);

    // Attack restarts from zero rather than from the release level.
    let restarted = envelope.update(true, DT);
    assert_eq!(envelope.state(), EnvelopeState::Attack);
    assert_eq!(restarted, 0.0);
}

#[test]
fn test_mute_and_unmute_restore_stage() {
    let mut envelope = Envelope::new(adsr());
    run(&mut envelope, true, 400);
    assert_eq!(envelope.state(), EnvelopeState::Sustain);

    envelope.mute();
    envelope.mute();
    assert!(envelope.is_muted());
    assert_eq!(envelope.update(true, DT), 0.0);

    envelope.unmute();
    assert_eq!(envelope.state(), EnvelopeState::Sustain);
    let level = envelope.update(true, DT);
    assert!((level - 0.7).abs() < 1e-6);

    // Unmuting an envelope that is not muted changes nothing.
    envelope.unmute();
    assert_eq!(envelope.state(), EnvelopeState::Sustain);
}

#[test]
fn test_zero_times_complete_immediately() {
    let mut envelope = Envelope::new(EnvelopeConfig::new(0.0, 0.0, 0.5, 0.0));
    assert_eq!(envelope.update(true, DT), 1.0);
    assert_eq!(envelope.state(), EnvelopeState::Decay);
    assert_eq!(envelope.update(true, DT), 0.5);
    assert_eq!(envelope.state(), EnvelopeState::Sustain);

    envelope.update(false, DT);
    assert!(envelope.is_complete());
}

#[test]
fn test_config_is_sanitized() {
    let config = EnvelopeConfig::new(-1.0, f32::NAN, 3.0, 0.2);
    assert_eq!(config.attack, 0.0);
    assert_eq!(config.decay, EnvelopeConfig::default().decay);
    assert_eq!(config.sustain, 1.0);
    assert_eq!(config.release, 0.2);
}

#[test]
fn test_mute_during_attack_holds_progress() {
    let mut envelope = Envelope::new(adsr());
    let before = run(&mut envelope, true, 51);
    assert_eq!(envelope.state(), EnvelopeState::Attack);
    let elapsed = envelope.elapsed();

    envelope.mute();
    for _ in 0..200 {
        assert_eq!(envelope.update(true, DT), 0.0);
    }
    assert_eq!(envelope.elapsed(), elapsed, "muted envelope must not advance");

    envelope.unmute();
    assert_eq!(envelope.state(), EnvelopeState::Attack);
    let resumed = envelope.update(true, DT);
    assert_eq!(envelope.state(), EnvelopeState::Attack);
    assert!((resumed - elapsed / 0.1).abs() < 1e-4, "resumed at {}", resumed);
    assert!(resumed > before);
}
