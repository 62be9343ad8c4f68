//! Timed note playback.
//!
//! A [`NoteSequence`] is what a MIDI file loader hands over: notes with a
//! start time and a length. Scheduling it queues a `start_note` and a
//! `stop_note` per note on a [`Scheduler`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::synth::control::seconds;
use crate::synth::note::midi_note_to_frequency;
use crate::synth::{NoteHandle, Scheduler, SynthController, SynthError, TimerToken};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledNote {
    pub note_number: u8,
    /// Seconds from the start of the sequence.
    pub start: f32,
    /// Seconds the note is held before release.
    pub duration: f32,
}

impl ScheduledNote {
    pub fn new(note_number: u8, start: f32, duration: f32) -> Result<Self, SynthError> {
        if note_number > 127 {
            return Err(SynthError::InvalidNote(note_number));
        }
        let valid = start.is_finite() && duration.is_finite() && (start + duration).is_finite();
        if !(valid && start >= 0.0 && duration >= 0.0) {
            return Err(SynthError::InvalidTiming { start, duration });
        }
        Ok(Self {
            note_number,
            start,
            duration,
        })
    }

    /// Converts tick positions at a fixed tempo to seconds:
    /// `60 * ticks / (bpm * ticks_per_quarter)`.
    pub fn from_ticks(
        note_number: u8,
        start_ticks: u64,
        length_ticks: u64,
        bpm: f32,
        ticks_per_quarter: f32,
    ) -> Result<Self, SynthError> {
        if !(bpm.is_finite() && bpm > 0.0 && ticks_per_quarter.is_finite() && ticks_per_quarter > 0.0) {
            return Err(SynthError::InvalidTempo {
                bpm,
                ticks_per_quarter,
            });
        }
        let seconds_per_tick = 60.0 / (bpm * ticks_per_quarter);
        Self::new(
            note_number,
            start_ticks as f32 * seconds_per_tick,
            length_ticks as f32 * seconds_per_tick,
        )
    }

    pub fn frequency(&self) -> f32 {
        midi_note_to_frequency(self.note_number)
    }

    pub fn end(&self) -> f32 {
        self.start + self.duration
    }
}

/// Notes ordered by start time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteSequence {
    notes: Vec<ScheduledNote>,
}

impl NoteSequence {
    pub fn new(mut notes: Vec<ScheduledNote>) -> Self {
        notes.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { notes }
    }

    pub fn push(&mut self, note: ScheduledNote) {
        let index = self.notes.partition_point(|n| n.start <= note.start);
        self.notes.insert(index, note);
    }

    pub fn notes(&self) -> &[ScheduledNote] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// Time at which the last note is released.
    pub fn length(&self) -> f32 {
        self.notes.iter().map(ScheduledNote::end).fold(0.0, f32::max)
    }

    /// Queues every note on `scheduler`, relative to the scheduler's current time.
    /// Delays past the scheduler's horizon saturate instead of failing.
    pub fn schedule(&self, controller: &SynthController, scheduler: &mut Scheduler) -> ScheduledSequence {
        let mut timers = Vec::with_capacity(self.notes.len() * 2);
        let mut notes = Vec::with_capacity(self.notes.len());

        for note in &self.notes {
            let handle = controller.allocate_note();
            let progress = Arc::new(NoteProgress::default());
            let frequency = note.frequency();

            let on = controller.clone();
            let on_handle = handle.clone();
            let on_progress = Arc::clone(&progress);
            timers.push(scheduler.schedule(seconds(note.start), move || {
                on_progress.started.store(true, Ordering::Release);
                on.start_note(&on_handle, frequency)
            }));

            let off = controller.clone();
            let off_handle = handle.clone();
            let off_progress = Arc::clone(&progress);
            timers.push(scheduler.schedule(seconds(note.end()), move || {
                off_progress.stopped.store(true, Ordering::Release);
                off.stop_note(&off_handle)
            }));

            notes.push((handle, progress));
        }

        debug!("Scheduled {} note(s) over {:.2}s", self.notes.len(), self.length());
        ScheduledSequence {
            controller: controller.clone(),
            timers,
            notes,
        }
    }
}

impl FromIterator<ScheduledNote> for NoteSequence {
    fn from_iter<I: IntoIterator<Item = ScheduledNote>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[derive(Default)]
struct NoteProgress {
    started: AtomicBool,
    stopped: AtomicBool,
}

impl NoteProgress {
    fn is_sounding(&self) -> bool {
        self.started.load(Ordering::Acquire) && !self.stopped.load(Ordering::Acquire)
    }
}

/// A sequence already queued on a scheduler.
pub struct ScheduledSequence {
    controller: SynthController,
    timers: Vec<TimerToken>,
    notes: Vec<(NoteHandle, Arc<NoteProgress>)>,
}

impl ScheduledSequence {
    /// Cancels notes that have not started and releases the ones still sounding.
    /// Notes that never started or already stopped send nothing.
    pub fn cancel(&self) {
        for timer in &self.timers {
            timer.cancel();
        }
        for (handle, progress) in &self.notes {
            if progress.is_sounding() {
                self.controller.stop_note(handle);
                progress.stopped.store(true, Ordering::Release);
            }
        }
    }

    pub fn handles(&self) -> impl Iterator<Item = &NoteHandle> + '_ {
        self.notes.iter().map(|(handle, _)| handle)
    }
}
