use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::Receiver;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::chain::OperatorChain;
use super::config::{Patch, SynthConfig};
use super::control::{SynthCommand, SynthController};
use super::error::SynthError;
use super::mixer::{Mixer, SynthIdentity};
use super::operator::OperatorEvent;

static NEXT_SYNTH_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SynthId(u64);

impl SynthId {
    fn next() -> Self {
        Self(NEXT_SYNTH_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// How the synth's gate is held.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SynthMode {
    /// Notes arrive as polyphonic voices; the gate is held open and each
    /// drone drops to zero base frequency, sounding only its modulation while
    /// notes are held.
    Midi,
    /// The caller drives the gate with note on/off; no note voices.
    #[default]
    Dynamic,
}

/// State visible to both the control side and the render side.
#[derive(Debug)]
pub struct SynthShared {
    id: SynthId,
    note_on: AtomicBool,
    midi_mode: AtomicBool,
    retired: AtomicBool,
}

impl SynthShared {
    fn new(mode: SynthMode) -> Self {
        let midi = mode == SynthMode::Midi;
        Self {
            id: SynthId::next(),
            note_on: AtomicBool::new(midi),
            midi_mode: AtomicBool::new(midi),
            retired: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> SynthId {
        self.id
    }

    pub fn is_note_on(&self) -> bool {
        self.note_on.load(Ordering::Acquire)
    }

    pub(crate) fn set_note_on(&self, on: bool) {
        self.note_on.store(on, Ordering::Release);
    }

    pub fn mode(&self) -> SynthMode {
        if self.midi_mode.load(Ordering::Acquire) {
            SynthMode::Midi
        } else {
            SynthMode::Dynamic
        }
    }

    pub(crate) fn set_mode(&self, mode: SynthMode) {
        self.midi_mode
            .store(mode == SynthMode::Midi, Ordering::Release);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::Acquire)
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::Release);
    }
}

/// Render side of a synth: owns the operator chain and produces audio blocks.
///
/// Created together with its [`SynthController`]; control calls made on the
/// controller reach the chain as queued commands applied at the start of each
/// block.
pub struct Synth {
    chain: OperatorChain,
    shared: Arc<SynthShared>,
    commands: Receiver<SynthCommand>,
    mode: SynthMode,
    /// Gate as last seen by the render side.
    gate: bool,
    sample_rate: f32,
    dt: f32,
}

impl Synth {
    pub fn new(chain: OperatorChain, mode: SynthMode, config: &SynthConfig) -> (Self, SynthController) {
        if chain.is_empty() {
            warn!("No operators assigned to synth; it will render silence");
        }
        let shared = Arc::new(SynthShared::new(mode));
        let (tx, rx) = crossbeam_channel::bounded(config.command_capacity.max(1));
        let controller = SynthController::new(Arc::clone(&shared), tx, chain.len());
        let sample_rate = config.sample_rate.max(1.0);
        let mut synth = Self {
            chain,
            shared,
            commands: rx,
            mode,
            gate: false,
            sample_rate,
            dt: 1.0 / sample_rate,
        };
        synth.apply_mode(mode);
        (synth, controller)
    }

    pub fn from_patch(patch: &Patch, config: &SynthConfig) -> Result<(Self, SynthController), SynthError> {
        let chain = OperatorChain::from_configs(&patch.operators, config.sample_rate, config.max_voices)?;
        debug!(
            "Built synth from patch '{}' ({} operators)",
            patch.name,
            chain.len()
        );
        Ok(Self::new(chain, patch.mode, config))
    }

    /// Mixes one block into `buffer` (interleaved, `channel_count` samples per frame).
    ///
    /// The carrier sample is divided by the mixer's active-synth count, clamped,
    /// and added to every channel. Nothing is written when the mixer does not
    /// currently allow this synth to sound.
    pub fn render_block(
        &mut self,
        buffer: &mut [f32],
        frame_count: usize,
        channel_count: usize,
        mixer: &Mixer,
    ) {
        self.apply_pending_commands();

        if channel_count == 0 || self.chain.is_empty() {
            return;
        }
        let note_on = self.read_gate();
        if !mixer.can_be_active(&*self) {
            return;
        }

        let divisor = mixer.active_synth_count() as f32;

        for frame in buffer.chunks_exact_mut(channel_count).take(frame_count) {
            let value = self.chain.frequency_sample_value(0, note_on, self.dt);
            let value = (value / divisor).clamp(-1.0, 1.0);
            for sample in frame.iter_mut() {
                *sample = (*sample + value).clamp(-1.0, 1.0);
            }
        }
    }

    /// Raw carrier output for one sample, before mixing. Queued commands are
    /// not applied.
    pub fn next_sample(&mut self) -> f32 {
        let note_on = self.read_gate();
        self.chain.frequency_sample_value(0, note_on, self.dt)
    }

    /// Samples the shared gate once and restarts the drones on a rising edge.
    fn read_gate(&mut self) -> bool {
        let note_on = self.shared.is_note_on();
        if note_on && !self.gate {
            for op in self.chain.iter_mut() {
                op.retrigger();
            }
        }
        self.gate = note_on;
        note_on
    }

    /// Drains the command queue without blocking.
    pub fn apply_pending_commands(&mut self) {
        while let Ok(command) = self.commands.try_recv() {
            self.apply(command);
        }
    }

    fn apply(&mut self, command: SynthCommand) {
        match command {
            SynthCommand::AddVoice {
                operator,
                handle,
                frequency,
            } => {
                if let Some(op) = self.chain.get_mut(operator) {
                    op.insert_voice(handle, frequency);
                }
            }
            SynthCommand::RemoveVoice { operator, handle } => {
                if let Some(op) = self.chain.get_mut(operator) {
                    op.remove_voice(handle);
                }
            }
            SynthCommand::SetMode(mode) => self.apply_mode(mode),
            SynthCommand::Operator(event) => self.apply_operator_event(event),
        }
    }

    fn apply_mode(&mut self, mode: SynthMode) {
        self.mode = mode;
        match mode {
            SynthMode::Midi => {
                for op in self.chain.iter_mut() {
                    op.set_voice_driven(true);
                }
            }
            SynthMode::Dynamic => {
                for op in self.chain.iter_mut() {
                    op.clear_voices();
                    op.set_voice_driven(false);
                    op.set_primary_enabled(true);
                }
            }
        }
    }

    fn apply_operator_event(&mut self, event: OperatorEvent) {
        match event {
            OperatorEvent::CycleWaveform { direction } => {
                for op in self.chain.iter_mut() {
                    op.cycle_waveform(direction);
                }
            }
            OperatorEvent::SetWaveform { operator, waveform } => {
                if let Some(op) = self.chain.get_mut(operator) {
                    op.set_waveform(waveform);
                }
            }
            OperatorEvent::SetVolume { operator, volume } => {
                if let Some(op) = self.chain.get_mut(operator) {
                    op.set_volume(volume);
                }
            }
            OperatorEvent::SetModulationDepth { operator, depth } => {
                if let Some(op) = self.chain.get_mut(operator) {
                    op.set_modulation_depth(depth);
                }
            }
            OperatorEvent::SetQuantize { operator, enabled } => {
                if let Some(op) = self.chain.get_mut(operator) {
                    op.set_quantize_to_scale(enabled);
                }
            }
            OperatorEvent::SetLfo {
                operator,
                enabled,
                frequency,
            } => {
                if let Some(op) = self.chain.get_mut(operator) {
                    op.set_lfo(enabled, frequency);
                }
            }
        }
    }

    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let sample_rate = sample_rate.max(1.0);
        if sample_rate == self.sample_rate {
            return;
        }
        debug!("Synth {:?} sample rate set to: {}", self.shared.id(), sample_rate);
        self.sample_rate = sample_rate;
        self.dt = 1.0 / sample_rate;
        for op in self.chain.iter_mut() {
            op.set_sample_rate(sample_rate);
        }
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn mode(&self) -> SynthMode {
        self.mode
    }

    pub fn chain(&self) -> &OperatorChain {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut OperatorChain {
        &mut self.chain
    }

    pub fn id(&self) -> SynthId {
        self.shared.id()
    }

    pub fn is_note_on(&self) -> bool {
        self.shared.is_note_on()
    }

    pub fn is_retired(&self) -> bool {
        self.shared.is_retired()
    }
}

impl SynthIdentity for Synth {
    fn shared(&self) -> &Arc<SynthShared> {
        &self.shared
    }
}
