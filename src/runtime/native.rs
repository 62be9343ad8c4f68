use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::audio::{AudioBackend, CpalBackend};
use crate::input::{InputEvent, KeyboardHandler, MidiHandler, NoteSequence, ScheduledNote};
use crate::runtime::RenderHost;
use crate::synth::note::NoteEvent;
use crate::synth::{Mixer, NoteHandle, Patch, Scheduler, Synth, SynthConfig, SynthController, SynthError};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Command line options for the desktop player.
#[derive(Debug, Default)]
pub struct Options {
    /// Patch file to load instead of the built-in FM pair.
    pub patch: Option<String>,
    /// Play a short arpeggio on startup.
    pub demo: bool,
}

impl Options {
    pub fn from_args(args: impl IntoIterator<Item = String>) -> Self {
        let mut options = Self::default();
        for arg in args {
            match arg.as_str() {
                "--demo" => options.demo = true,
                _ if options.patch.is_none() => options.patch = Some(arg),
                _ => warn!("Ignoring extra argument '{}'", arg),
            }
        }
        options
    }
}

/// Opens the audio device and plays the computer keyboard and MIDI input
/// through a single synth until the process is killed.
pub fn start(options: Options) -> Result<(), SynthError> {
    let patch = match &options.patch {
        Some(path) => Patch::load(path)?,
        None => Patch::default(),
    };
    let config = SynthConfig::default();
    let mixer = Arc::new(Mixer::new());

    let (synth, controller) = Synth::from_patch(&patch, &config)?;
    mixer.register(&controller, true);

    let (host, synths) = RenderHost::new(Arc::clone(&mixer));
    if synths.add(synth).is_err() {
        return Err(SynthError::Audio("render host refused the synth".into()));
    }

    let mut audio_backend = CpalBackend::new(host);
    audio_backend.start()?;
    info!("Playing patch '{}' in {:?} mode", patch.name, controller.mode());

    let (input_tx, input_rx) = crossbeam_channel::unbounded();
    let mut keyboard_handler = KeyboardHandler::new(input_tx.clone());
    let mut midi_handler = MidiHandler::new(input_tx);

    let mut scheduler = Scheduler::new();
    if options.demo {
        demo_arpeggio()?.schedule(&controller, &mut scheduler);
    }

    let mut player = Player::new(controller);
    let mut last_tick = Instant::now();
    loop {
        keyboard_handler.update();
        midi_handler.update();
        player.drain(&input_rx);

        let now = Instant::now();
        scheduler.advance(now - last_tick);
        last_tick = now;
        mixer.prune_retired();

        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Routes input events to a synth, tracking the voices each held key owns.
struct Player {
    controller: SynthController,
    held: HashMap<u8, NoteHandle>,
}

impl Player {
    fn new(controller: SynthController) -> Self {
        Self {
            controller,
            held: HashMap::new(),
        }
    }

    fn drain(&mut self, events: &Receiver<InputEvent>) {
        while let Ok(event) = events.try_recv() {
            match event {
                InputEvent::Note(note) => self.note(note),
                InputEvent::Operator(event) => self.controller.operator_event(event),
                InputEvent::ToggleGate => {
                    if self.controller.is_note_on() {
                        self.controller.note_off();
                    } else {
                        self.controller.note_on();
                    }
                }
            }
        }
    }

    fn note(&mut self, event: NoteEvent) {
        if event.is_on {
            // A repeated note on restarts the note rather than stacking voices.
            if let Some(previous) = self.held.remove(&event.note_number) {
                self.controller.stop_note(&previous);
            }
            debug!("Note on {} ({:.2} Hz)", event.note_number, event.frequency);
            let handle = self.controller.play_note(event.frequency);
            self.held.insert(event.note_number, handle);
        } else if let Some(handle) = self.held.remove(&event.note_number) {
            debug!("Note off {}", event.note_number);
            self.controller.stop_note(&handle);
        }
    }
}

/// C major arpeggio in eighth notes at 120 bpm.
fn demo_arpeggio() -> Result<NoteSequence, SynthError> {
    const TICKS_PER_QUARTER: u64 = 480;
    const EIGHTH: u64 = TICKS_PER_QUARTER / 2;

    [60u8, 64, 67, 72, 67, 64, 60]
        .into_iter()
        .enumerate()
        .map(|(i, note)| {
            ScheduledNote::from_ticks(note, i as u64 * EIGHTH, EIGHTH, 120.0, TICKS_PER_QUARTER as f32)
        })
        .collect()
}
