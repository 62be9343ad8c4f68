use std::collections::HashMap;

use crossbeam_channel::Sender;
use device_query::{DeviceQuery, DeviceState, Keycode};
use tracing::{debug, warn};

use super::InputEvent;
use crate::synth::note::{NoteEvent, NoteSource};
use crate::synth::operator::{CycleDirection, OperatorEvent};

const KEY_VELOCITY: u8 = 100;

/// Polls the computer keyboard and plays it like a one-and-a-half octave piano.
///
/// `,` and `.` cycle the waveform of every operator; space toggles the gate.
pub struct KeyboardHandler {
    device_state: DeviceState,
    key_states: HashMap<Keycode, bool>,
    key_to_note: HashMap<Keycode, u8>,
    control_keys: HashMap<Keycode, bool>,
    sender: Sender<InputEvent>,
}

impl KeyboardHandler {
    pub fn new(sender: Sender<InputEvent>) -> Self {
        let key_to_note: HashMap<Keycode, u8> = [
            // Home row: naturals from A3 to C5
            (Keycode::A, 57),
            (Keycode::S, 59),
            (Keycode::D, 60),
            (Keycode::F, 62),
            (Keycode::G, 64),
            (Keycode::H, 65),
            (Keycode::J, 67),
            (Keycode::K, 69),
            (Keycode::L, 71),
            (Keycode::Semicolon, 72),
            // Top row: sharps
            (Keycode::W, 58),
            (Keycode::R, 61),
            (Keycode::T, 63),
            (Keycode::U, 66),
            (Keycode::I, 68),
            (Keycode::O, 70),
            (Keycode::LeftBracket, 73),
        ]
        .into_iter()
        .collect();

        let key_states = key_to_note.keys().map(|key| (*key, false)).collect();
        let control_keys = [Keycode::Comma, Keycode::Dot, Keycode::Space]
            .into_iter()
            .map(|key| (key, false))
            .collect();

        Self {
            device_state: DeviceState::new(),
            key_states,
            key_to_note,
            control_keys,
            sender,
        }
    }

    pub fn update(&mut self) {
        let keys: Vec<Keycode> = self.device_state.get_keys();

        for (key, note) in &self.key_to_note {
            let is_pressed = keys.contains(key);
            let was_pressed = self.key_states.get(key).copied().unwrap_or(false);
            if is_pressed == was_pressed {
                continue;
            }
            self.key_states.insert(*key, is_pressed);

            let velocity = if is_pressed { KEY_VELOCITY } else { 0 };
            debug!(
                "Key '{:?}' {} - note {}",
                key,
                if is_pressed { "pressed" } else { "released" },
                note
            );
            match NoteEvent::new(*note, velocity, is_pressed, NoteSource::Keyboard) {
                Ok(event) => send(&self.sender, InputEvent::Note(event)),
                Err(e) => warn!("Dropping key '{:?}': {}", key, e),
            }
        }

        for key in [Keycode::Comma, Keycode::Dot, Keycode::Space] {
            let is_pressed = keys.contains(&key);
            let was_pressed = self.control_keys.get(&key).copied().unwrap_or(false);
            self.control_keys.insert(key, is_pressed);
            if !is_pressed || was_pressed {
                continue;
            }

            let event = match key {
                Keycode::Comma => InputEvent::Operator(OperatorEvent::CycleWaveform {
                    direction: CycleDirection::Backward,
                }),
                Keycode::Dot => InputEvent::Operator(OperatorEvent::CycleWaveform {
                    direction: CycleDirection::Forward,
                }),
                _ => InputEvent::ToggleGate,
            };
            send(&self.sender, event);
        }
    }
}

fn send(sender: &Sender<InputEvent>, event: InputEvent) {
    if let Err(e) = sender.send(event) {
        warn!("Error sending input event: {}", e);
    }
}
