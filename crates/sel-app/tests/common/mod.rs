//! Shared harness: a session wired to the headless adapters.
#![allow(dead_code)]

use std::sync::Arc;

use sel_app::{MemorySink, SelectionSession, SessionPorts};
use sel_core::{ClientId, MimeType, OfferId, Point, SessionConfig, SourceId, SurfaceId, WireEvent};
use sel_infra::{HeadlessSeat, InMemorySourceStreams, RecordingClientEvents, SurfaceRect};

pub struct Harness {
    pub session: SelectionSession,
    pub events: Arc<RecordingClientEvents>,
    pub streams: Arc<InMemorySourceStreams>,
    pub seat: Arc<HeadlessSeat>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(SessionConfig::default())
    }

    pub fn with_config(config: SessionConfig) -> Self {
        let events = Arc::new(RecordingClientEvents::new());
        let streams = Arc::new(InMemorySourceStreams::new());
        let seat = Arc::new(HeadlessSeat::new());
        let ports = SessionPorts {
            events: events.clone(),
            streams: streams.clone(),
            focus: seat.clone(),
            grab: seat.clone(),
            visual: seat.clone(),
        };
        let session = SelectionSession::new(ports, config).expect("valid config");
        Self {
            session,
            events,
            streams,
            seat,
        }
    }

    /// Move keyboard focus and let the session react.
    pub fn focus(&mut self, client: &ClientId) {
        self.seat.set_focus(Some(client.clone()));
        self.session.keyboard_focus_changed();
    }

    pub fn add_surface(&self, surface: &str, client: &ClientId, x: f64, y: f64) {
        self.seat.add_surface(SurfaceRect {
            surface: SurfaceId::from(surface),
            client: client.clone(),
            origin: Point::new(x, y),
            width: 100.0,
            height: 100.0,
        });
    }

    /// Create a source with `payload` registered for every mimetype.
    pub fn source_with_payload(
        &mut self,
        client: &ClientId,
        protocol: sel_core::WireProtocol,
        mime_types: &[MimeType],
        payload: &'static str,
    ) -> SourceId {
        let source = self
            .session
            .create_source(client, protocol, mime_types)
            .expect("source created");
        for mime_type in mime_types {
            self.streams.register(&source, mime_type.clone(), payload);
        }
        source
    }
}

pub fn client(name: &str) -> ClientId {
    ClientId::from(name)
}

/// Offer carried by the most recent selection event.
pub fn last_selection_offer(events: &[WireEvent]) -> Option<OfferId> {
    events.iter().rev().find_map(|event| match event {
        WireEvent::Selection { offer, .. } => Some(offer.clone()),
        _ => None,
    })?
}

/// Offer carried by the most recent enter event.
pub fn last_enter_offer(events: &[WireEvent]) -> Option<OfferId> {
    events.iter().rev().find_map(|event| match event {
        WireEvent::Enter { offer, .. } => Some(offer.clone()),
        _ => None,
    })?
}

pub fn utf8(sink: &MemorySink) -> String {
    String::from_utf8_lossy(&sink.bytes()).into_owned()
}
