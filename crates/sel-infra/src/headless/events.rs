use std::sync::{Mutex, PoisonError};

use sel_core::ports::ClientEventPort;
use sel_core::{ClientId, ProtocolError, WireEvent};
use tracing::trace;

/// Wire transport that records everything sent, per client.
#[derive(Debug, Default)]
pub struct RecordingClientEvents {
    events: Mutex<Vec<(ClientId, WireEvent)>>,
    errors: Mutex<Vec<(ClientId, ProtocolError)>>,
}

impl RecordingClientEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events_for(&self, client: &ClientId) -> Vec<WireEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(to, _)| to == client)
            .map(|(_, event)| event.clone())
            .collect()
    }

    /// Events for `client`, removing them from the log.
    pub fn take_events_for(&self, client: &ClientId) -> Vec<WireEvent> {
        let mut events = self.events.lock().unwrap_or_else(PoisonError::into_inner);
        let (taken, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut *events)
            .into_iter()
            .partition(|(to, _)| to == client);
        *events = kept;
        taken.into_iter().map(|(_, event)| event).collect()
    }

    pub fn errors_for(&self, client: &ClientId) -> Vec<ProtocolError> {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(to, _)| to == client)
            .map(|(_, error)| error.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ClientEventPort for RecordingClientEvents {
    fn send(&self, client: &ClientId, event: WireEvent) {
        trace!(%client, ?event, "wire event");
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((client.clone(), event));
    }

    fn post_error(&self, client: &ClientId, error: &ProtocolError) {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((client.clone(), error.clone()));
    }
}
