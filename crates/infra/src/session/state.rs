//! Observable session state with generation fencing

use std::sync::atomic::{AtomicU64, Ordering};

use mystar_domain::SessionState;
use tokio::sync::watch;

/// Publishes [`SessionState`] to subscribers.
///
/// Every session owns a generation number. Starting or stopping a session
/// moves the counter forward, after which updates tagged with an older
/// generation are dropped on arrival.
#[derive(Debug)]
pub(crate) struct StatePublisher {
    state: watch::Sender<SessionState>,
    generation: AtomicU64,
}

impl StatePublisher {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(SessionState::default());
        Self { state, generation: AtomicU64::new(0) }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    pub(crate) fn current(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Invalidate every earlier generation and return the new one.
    pub(crate) fn advance(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Apply `update` if `generation` is still the live one.
    ///
    /// The check runs under the channel's write lock, so an update can never
    /// land after a newer generation has published.
    pub(crate) fn publish_if_current<F>(&self, generation: u64, update: F) -> bool
    where
        F: FnOnce(&mut SessionState),
    {
        self.state.send_if_modified(|state| {
            if !self.is_current(generation) {
                return false;
            }
            update(state);
            true
        })
    }

    /// Apply `update` regardless of generation.
    pub(crate) fn publish(&self, update: impl FnOnce(&mut SessionState)) {
        self.state.send_modify(update);
    }
}
