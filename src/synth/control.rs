use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossbeam_channel::{Sender, TrySendError};
use tracing::{debug, warn};

use super::core::{SynthId, SynthMode, SynthShared};
use super::mixer::SynthIdentity;
use super::operator::{CycleDirection, OperatorEvent};
use super::scheduler::{Scheduler, TimerToken};
use super::voice::VoiceHandle;

/// Work the control side hands to the render side.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SynthCommand {
    AddVoice {
        operator: usize,
        handle: VoiceHandle,
        frequency: f32,
    },
    RemoveVoice {
        operator: usize,
        handle: VoiceHandle,
    },
    SetMode(SynthMode),
    Operator(OperatorEvent),
}

/// One polyphonic note: a voice handle per operator, in chain order.
#[derive(Clone, Debug)]
pub struct NoteHandle {
    voices: Vec<VoiceHandle>,
    stop_timer: Option<TimerToken>,
}

impl NoteHandle {
    pub fn voices(&self) -> &[VoiceHandle] {
        &self.voices
    }

    /// Timer that will stop this note, when it was played with a duration.
    pub fn stop_timer(&self) -> Option<&TimerToken> {
        self.stop_timer.as_ref()
    }
}

/// Control side of a synth. Cheap to clone; every clone drives the same synth.
#[derive(Clone)]
pub struct SynthController {
    shared: Arc<SynthShared>,
    commands: Sender<SynthCommand>,
    operator_count: usize,
    pending_note_off: Arc<Mutex<Option<TimerToken>>>,
}

impl SynthController {
    pub(crate) fn new(shared: Arc<SynthShared>, commands: Sender<SynthCommand>, operator_count: usize) -> Self {
        Self {
            shared,
            commands,
            operator_count,
            pending_note_off: Arc::new(Mutex::new(None)),
        }
    }

    /// Opens the gate. Any timed note-off still pending is cancelled.
    ///
    /// The render side restarts the drones on the closed-to-open edge, so a
    /// note on while the gate is already open leaves the phase alone.
    pub fn note_on(&self) {
        self.cancel_pending_note_off();
        self.shared.set_note_on(true);
    }

    /// Opens the gate and schedules a note-off after `duration` seconds.
    pub fn note_on_for(&self, duration: f32, scheduler: &mut Scheduler) -> TimerToken {
        self.note_on();
        let controller = self.clone();
        let token = scheduler.schedule(seconds(duration), move || controller.close_gate());
        *self
            .pending_note_off
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(token.clone());
        token
    }

    /// Closes the gate. Ignored in [`SynthMode::Midi`], where the gate is held open.
    pub fn note_off(&self) {
        self.cancel_pending_note_off();
        self.close_gate();
    }

    fn close_gate(&self) {
        if self.shared.mode() == SynthMode::Midi {
            debug!("note_off ignored for {:?}: synth is in MIDI mode", self.shared.id());
            return;
        }
        self.shared.set_note_on(false);
    }

    fn cancel_pending_note_off(&self) {
        let pending = self
            .pending_note_off
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(token) = pending {
            token.cancel();
        }
    }

    /// Reserves voice handles for a note without starting it.
    pub fn allocate_note(&self) -> NoteHandle {
        NoteHandle {
            voices: (0..self.operator_count).map(|_| VoiceHandle::next()).collect(),
            stop_timer: None,
        }
    }

    /// Starts a previously allocated note on every operator.
    pub fn start_note(&self, note: &NoteHandle, frequency: f32) {
        for (operator, &handle) in note.voices.iter().enumerate() {
            self.send(SynthCommand::AddVoice {
                operator,
                handle,
                frequency,
            });
        }
    }

    /// Adds a voice at `frequency` to every operator.
    pub fn play_note(&self, frequency: f32) -> NoteHandle {
        let note = self.allocate_note();
        self.start_note(&note, frequency);
        note
    }

    /// Plays a note and schedules its release after `duration` seconds.
    pub fn play_note_for(&self, frequency: f32, duration: f32, scheduler: &mut Scheduler) -> NoteHandle {
        let mut note = self.play_note(frequency);
        let controller = self.clone();
        let to_stop = note.clone();
        note.stop_timer = Some(scheduler.schedule(seconds(duration), move || {
            controller.stop_note(&to_stop)
        }));
        note
    }

    /// Releases the note's voices. Each voice finishes its release tail before
    /// it is discarded. Stopping a note twice is a no-op.
    pub fn stop_note(&self, note: &NoteHandle) {
        if let Some(timer) = &note.stop_timer {
            timer.cancel();
        }
        for (operator, &handle) in note.voices.iter().enumerate() {
            self.send(SynthCommand::RemoveVoice { operator, handle });
        }
    }

    pub fn set_mode(&self, mode: SynthMode) {
        self.shared.set_mode(mode);
        if mode == SynthMode::Midi {
            self.cancel_pending_note_off();
            self.shared.set_note_on(true);
        }
        self.send(SynthCommand::SetMode(mode));
    }

    pub fn cycle_waveform(&self, direction: CycleDirection) {
        self.operator_event(OperatorEvent::CycleWaveform { direction });
    }

    pub fn operator_event(&self, event: OperatorEvent) {
        self.send(SynthCommand::Operator(event));
    }

    /// Marks the synth for removal by its render host.
    pub fn retire(&self) {
        self.cancel_pending_note_off();
        self.shared.retire();
    }

    pub fn id(&self) -> SynthId {
        self.shared.id()
    }

    pub fn is_note_on(&self) -> bool {
        self.shared.is_note_on()
    }

    pub fn mode(&self) -> SynthMode {
        self.shared.mode()
    }

    pub fn operator_count(&self) -> usize {
        self.operator_count
    }

    fn send(&self, command: SynthCommand) {
        match self.commands.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                warn!("Command queue full for {:?}; dropping {:?}", self.shared.id(), command);
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("Synth {:?} is gone; command ignored", self.shared.id());
            }
        }
    }
}

impl SynthIdentity for SynthController {
    fn shared(&self) -> &Arc<SynthShared> {
        &self.shared
    }
}

const MAX_DELAY_SECONDS: f32 = 1.0e9;

/// Delay for `duration` seconds, saturating at [`MAX_DELAY_SECONDS`].
/// NaN and non-positive values mean no delay.
pub(crate) fn seconds(duration: f32) -> Duration {
    if duration > 0.0 {
        Duration::from_secs_f32(duration.min(MAX_DELAY_SECONDS))
    } else {
        Duration::ZERO
    }
}
