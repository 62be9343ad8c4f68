//! Registry of live synths and the shared mixing divisor.
//!
//! Each registration pairs a synth with an `is_active` permission that is
//! independent of the synth's own gate. The audio thread reads a wait-free
//! point-in-time snapshot of the list, so synths can be registered or removed
//! from the control thread mid-callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tracing::{debug, info};

use super::core::{SynthId, SynthShared};

/// Anything that identifies a synth: its render side or any of its controllers.
pub trait SynthIdentity {
    fn shared(&self) -> &Arc<SynthShared>;

    fn synth_id(&self) -> SynthId {
        self.shared().id()
    }
}

#[derive(Debug)]
struct Registration {
    shared: Arc<SynthShared>,
    active: AtomicBool,
}

impl Registration {
    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Process-scoped registry, created once per audio session and shared by
/// reference with every render host and control loop that needs it.
pub struct Mixer {
    registrations: ArcSwap<Vec<Arc<Registration>>>,
}

impl Mixer {
    pub fn new() -> Self {
        Self {
            registrations: ArcSwap::from_pointee(Vec::new()),
        }
    }

    /// Registers `synth`. Registering an already known synth changes nothing.
    pub fn register<S: SynthIdentity + ?Sized>(&self, synth: &S, active: bool) {
        let shared = synth.shared();
        let id = shared.id();
        self.registrations.rcu(|current| {
            if current.iter().any(|r| r.shared.id() == id) {
                return Arc::clone(current);
            }
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::new(Registration {
                shared: Arc::clone(shared),
                active: AtomicBool::new(active),
            }));
            Arc::new(next)
        });
        debug!("Registered synth {:?} (active: {})", id, active);
    }

    pub fn unregister<S: SynthIdentity + ?Sized>(&self, synth: &S) {
        let id = synth.synth_id();
        self.remove_where(|shared| shared.id() == id);
    }

    /// Drops registrations of synths whose controller retired them.
    pub fn prune_retired(&self) {
        self.remove_where(SynthShared::is_retired);
    }

    fn remove_where(&self, predicate: impl Fn(&SynthShared) -> bool) {
        let before = self.registrations.load().len();
        self.registrations.rcu(|current| {
            current
                .iter()
                .filter(|r| !predicate(r.shared.as_ref()))
                .cloned()
                .collect::<Vec<_>>()
        });
        let removed = before.saturating_sub(self.registrations.load().len());
        if removed > 0 {
            info!("Removed {} synth registration(s)", removed);
        }
    }

    /// Grants or revokes permission to sound. The synth's gate is untouched.
    /// Unknown synths are ignored.
    pub fn set_active<S: SynthIdentity + ?Sized>(&self, synth: &S, active: bool) {
        let id = synth.synth_id();
        match self.registrations.load().iter().find(|r| r.shared.id() == id) {
            Some(registration) => registration.active.store(active, Ordering::Release),
            None => debug!("set_active on unregistered synth {:?}", id),
        }
    }

    /// Permission lookup; unregistered synths may not sound.
    pub fn can_be_active<S: SynthIdentity + ?Sized>(&self, synth: &S) -> bool {
        let id = synth.synth_id();
        self.registrations
            .load()
            .iter()
            .find(|r| r.shared.id() == id)
            .is_some_and(|r| r.is_active())
    }

    /// Synths that are both permitted and gated on, never less than 1.
    pub fn active_synth_count(&self) -> usize {
        self.registrations
            .load()
            .iter()
            .filter(|r| r.is_active() && r.shared.is_note_on())
            .count()
            .max(1)
    }

    pub fn is_registered<S: SynthIdentity + ?Sized>(&self, synth: &S) -> bool {
        let id = synth.synth_id();
        self.registrations.load().iter().any(|r| r.shared.id() == id)
    }

    pub fn len(&self) -> usize {
        self.registrations.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.load().is_empty()
    }

    /// Forgets every synth; used when the audio session shuts down.
    pub fn clear(&self) {
        self.registrations.store(Arc::new(Vec::new()));
    }
}

impl Default for Mixer {
    fn default() -> Self {
        Self::new()
    }
}
