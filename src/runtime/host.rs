use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError};
use tracing::{debug, warn};

use crate::synth::{Mixer, Synth};

/// Upper bound on synths a host renders; the synth list never reallocates past it.
pub const MAX_SYNTHS: usize = 64;

/// Audio-thread owner of every render-side [`Synth`].
///
/// New synths arrive through the [`SynthSender`] returned by
/// [`RenderHost::new`]. Each [`RenderHost::process`] call zeroes the output
/// block, lets every synth mix itself in, and drops synths whose controller
/// retired them.
pub struct RenderHost {
    synths: Vec<Synth>,
    incoming: Receiver<Synth>,
    mixer: Arc<Mixer>,
}

/// Control-side handle for handing synths to a [`RenderHost`].
#[derive(Clone)]
pub struct SynthSender {
    tx: Sender<Synth>,
}

impl SynthSender {
    /// Queues `synth` for the host. Returns it back if the host is full or gone.
    pub fn add(&self, synth: Synth) -> Result<(), Synth> {
        match self.tx.try_send(synth) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(synth)) => {
                warn!("Render host is full; synth {:?} not added", synth.id());
                Err(synth)
            }
            Err(TrySendError::Disconnected(synth)) => {
                debug!("Render host is gone; synth {:?} not added", synth.id());
                Err(synth)
            }
        }
    }
}

impl RenderHost {
    pub fn new(mixer: Arc<Mixer>) -> (Self, SynthSender) {
        let (tx, rx) = crossbeam_channel::bounded(MAX_SYNTHS);
        (
            Self {
                synths: Vec::with_capacity(MAX_SYNTHS),
                incoming: rx,
                mixer,
            },
            SynthSender { tx },
        )
    }

    /// Fills `data` (interleaved, `channels` per frame) with the mix of all synths.
    pub fn process(&mut self, data: &mut [f32], channels: usize, sample_rate: f32) {
        while self.synths.len() < MAX_SYNTHS {
            match self.incoming.try_recv() {
                Ok(synth) => self.synths.push(synth),
                Err(_) => break,
            }
        }

        data.fill(0.0);
        if channels == 0 {
            return;
        }
        let frames = data.len() / channels;

        for synth in self.synths.iter_mut() {
            synth.set_sample_rate(sample_rate);
            synth.render_block(data, frames, channels, &self.mixer);
        }

        // TODO: hand retired synths back to the control thread so their
        // buffers are freed off the audio thread.
        self.synths.retain(|synth| !synth.is_retired());
    }

    pub fn synth_count(&self) -> usize {
        self.synths.len()
    }

    pub fn mixer(&self) -> &Arc<Mixer> {
        &self.mixer
    }
}
