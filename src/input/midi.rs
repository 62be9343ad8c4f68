use std::io::{stdin, stdout, Write};

use crossbeam_channel::{Receiver, Sender};
use midir::{MidiInput, MidiInputConnection, MidiInputPort};
use tracing::{debug, info, warn};

use super::InputEvent;
use crate::synth::note::{NoteEvent, NoteSource};
use crate::synth::SynthError;

const NOTE_OFF: u8 = 0x80;
const NOTE_ON: u8 = 0x90;

/// Reads note on/off messages from a MIDI input port.
///
/// When no port can be opened the handler stays inert and [`MidiHandler::update`]
/// does nothing.
pub struct MidiHandler {
    /// Holds the connection to keep it alive
    #[allow(dead_code)]
    connection: Option<MidiInputConnection<()>>,
    receiver: Option<Receiver<(u8, u8, u8)>>, // (status, data1, data2)
    sender: Sender<InputEvent>,
}

impl MidiHandler {
    pub fn new(sender: Sender<InputEvent>) -> Self {
        match Self::try_new(sender.clone()) {
            Ok(handler) => handler,
            Err(e) => {
                warn!("Failed to initialize MIDI: {}. MIDI input is disabled.", e);
                Self {
                    connection: None,
                    receiver: None,
                    sender,
                }
            }
        }
    }

    fn try_new(sender: Sender<InputEvent>) -> Result<Self, SynthError> {
        let midi_in = MidiInput::new("polyfm input").map_err(midi_error)?;
        let port = Self::select_input_port(&midi_in)?;
        let port_name = midi_in.port_name(&port).map_err(midi_error)?;

        let (tx, rx) = crossbeam_channel::unbounded();
        let connection = midi_in
            .connect(
                &port,
                "polyfm-read-input",
                move |_, message, _| {
                    if message.len() >= 3 {
                        let _ = tx.send((message[0], message[1], message[2]));
                    }
                },
                (),
            )
            .map_err(midi_error)?;

        info!("Opened MIDI port: {}", port_name);

        Ok(Self {
            connection: Some(connection),
            receiver: Some(rx),
            sender,
        })
    }

    fn select_input_port(midi_in: &MidiInput) -> Result<MidiInputPort, SynthError> {
        let in_ports = midi_in.ports();
        if in_ports.is_empty() {
            return Err(SynthError::Midi("No MIDI input ports found".into()));
        }

        println!("Available MIDI input ports:");
        for (i, port) in in_ports.iter().enumerate() {
            println!("{}: {}", i, midi_in.port_name(port).map_err(midi_error)?);
        }

        print!("Select MIDI input port: ");
        stdout().flush().map_err(midi_error)?;
        let mut input = String::new();
        stdin().read_line(&mut input).map_err(midi_error)?;
        let selection = input.trim().parse::<usize>().unwrap_or(0);

        in_ports
            .get(selection)
            .cloned()
            .ok_or_else(|| SynthError::Midi(format!("Invalid MIDI port selection: {}", selection)))
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    pub fn update(&mut self) {
        let Some(receiver) = &self.receiver else {
            return;
        };
        while let Ok((status, data1, data2)) = receiver.try_recv() {
            let Some(result) = parse_message(status, data1, data2) else {
                continue;
            };
            match result {
                Ok(event) => {
                    if let Err(e) = self.sender.send(InputEvent::Note(event)) {
                        warn!("Failed to send MIDI note event: {}", e);
                    }
                }
                Err(e) => debug!("Ignoring MIDI message: {}", e),
            }
        }
    }
}

/// Note on with velocity 0 counts as note off. Anything else is ignored.
fn parse_message(status: u8, data1: u8, data2: u8) -> Option<Result<NoteEvent, SynthError>> {
    match status & 0xF0 {
        NOTE_ON if data2 > 0 => Some(NoteEvent::new(data1, data2, true, NoteSource::Midi)),
        NOTE_ON | NOTE_OFF => Some(NoteEvent::new(data1, 0, false, NoteSource::Midi)),
        _ => None,
    }
}

fn midi_error(e: impl std::fmt::Display) -> SynthError {
    SynthError::Midi(e.to_string())
}
