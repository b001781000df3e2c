//! Headless clipboard probe.
//!
//! Runs a complete paste cycle against a session wired to the headless
//! adapters: a writer client takes the clipboard and disconnects, then a
//! reader client gets focus and pastes. With persistence on, the reader
//! still receives the writer's bytes.

use std::sync::Arc;

use anyhow::Context;
use sel_app::{MemorySink, SelectionSession, SessionPorts};
use sel_core::{ClientId, MimeType, SelectionClass, Serial, SessionConfig, WireEvent, WireProtocol};
use sel_infra::{HeadlessSeat, InMemorySourceStreams, RecordingClientEvents};
use serde::Serialize;
use tracing::{info, info_span, Instrument};

#[derive(Debug, Clone)]
pub struct ProbeOptions {
    pub text: String,
    pub mime_type: MimeType,
    pub max_bytes: Option<u64>,
}

/// What the reader saw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub mime_type: String,
    /// Mimetypes announced to the reader with its clipboard offer.
    pub offered: Vec<String>,
    pub received: String,
    pub bytes: u64,
    /// The writer was gone and a persisted copy served the paste.
    pub persisted: bool,
}

pub async fn run_probe(config: SessionConfig, options: ProbeOptions) -> anyhow::Result<ProbeReport> {
    let span = info_span!("selection.probe", mime = %options.mime_type, max_bytes = ?options.max_bytes);
    probe(config, options).instrument(span).await
}

async fn probe(config: SessionConfig, options: ProbeOptions) -> anyhow::Result<ProbeReport> {
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
    let mut session = SelectionSession::new(ports, config)?;

    let writer = ClientId::from("probe-writer");
    let reader = ClientId::from("probe-reader");

    let device = session.bind_device(&writer, WireProtocol::DataDevice);
    seat.set_focus(Some(writer.clone()));
    session.keyboard_focus_changed();
    let source = session
        .create_source(&writer, WireProtocol::DataDevice, &[options.mime_type.clone()])
        .context("writer could not create a source")?;
    streams.register(&source, options.mime_type.clone(), options.text.clone().into_bytes());
    session
        .set_selection(&writer, &device, Some(&source), Serial(1))
        .context("writer could not set the clipboard")?;
    session.wait_transfers().await;

    session.client_disconnected(&writer);
    let persisted = session
        .owner(SelectionClass::Clipboard)
        .is_some_and(|owner| owner != &source);
    info!(persisted, "writer disconnected");

    session.bind_device(&reader, WireProtocol::DataDevice);
    seat.set_focus(Some(reader.clone()));
    session.keyboard_focus_changed();
    let offered = events
        .events_for(&reader)
        .into_iter()
        .filter_map(|event| match event {
            WireEvent::Offer { mime_type, .. } => Some(mime_type.to_string()),
            _ => None,
        })
        .collect();

    let sink = MemorySink::new();
    let bytes = session
        .transfer(
            SelectionClass::Clipboard,
            options.mime_type.clone(),
            options.max_bytes,
            sink.boxed(),
        )
        .await
        .context("transfer task failed")?
        .context("paste failed")?;
    session.shutdown();

    Ok(ProbeReport {
        mime_type: options.mime_type.to_string(),
        offered,
        received: String::from_utf8_lossy(&sink.bytes()).into_owned(),
        bytes,
        persisted,
    })
}
