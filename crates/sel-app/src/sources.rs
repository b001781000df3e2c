//! Wire-client source backend.

use std::sync::Arc;

use async_trait::async_trait;
use sel_core::ports::{ClientEventPort, DataSourceBackend, SourceStream, SourceStreamPort};
use sel_core::{ClientId, DndAction, MimeType, SourceId, TransferError, WireEvent, WireProtocol};

/// Backend of a source created by a client: notifications become wire
/// events to the owner, reads ask the transport for a stream.
pub struct ClientSourceBackend {
    client: ClientId,
    source: SourceId,
    protocol: WireProtocol,
    events: Arc<dyn ClientEventPort>,
    streams: Arc<dyn SourceStreamPort>,
}

impl ClientSourceBackend {
    pub fn new(
        client: ClientId,
        source: SourceId,
        protocol: WireProtocol,
        events: Arc<dyn ClientEventPort>,
        streams: Arc<dyn SourceStreamPort>,
    ) -> Self {
        Self {
            client,
            source,
            protocol,
            events,
            streams,
        }
    }

    fn send(&self, event: WireEvent) {
        self.events.send(&self.client, event);
    }
}

#[async_trait]
impl DataSourceBackend for ClientSourceBackend {
    async fn open(&self, mime_type: &MimeType) -> Result<SourceStream, TransferError> {
        self.streams
            .request_stream(&self.client, &self.source, mime_type)
            .await
    }

    fn target(&self, mime_type: Option<MimeType>) {
        self.send(WireEvent::Target {
            source: self.source.clone(),
            mime_type,
        });
    }

    fn cancelled(&self) {
        self.send(WireEvent::Cancelled {
            protocol: self.protocol,
            source: self.source.clone(),
        });
    }

    fn action(&self, action: DndAction) {
        self.send(WireEvent::SourceAction {
            source: self.source.clone(),
            action,
        });
    }

    fn drop_performed(&self) {
        self.send(WireEvent::DndDropPerformed {
            source: self.source.clone(),
        });
    }

    fn finished(&self) {
        self.send(WireEvent::DndFinished {
            source: self.source.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::{always, eq};
    use sel_core::ProtocolError;

    mock! {
        Events {}

        impl ClientEventPort for Events {
            fn send(&self, client: &ClientId, event: WireEvent);
            fn post_error(&self, client: &ClientId, error: &ProtocolError);
        }
    }

    mock! {
        Streams {}

        #[async_trait]
        impl SourceStreamPort for Streams {
            async fn request_stream(
                &self,
                client: &ClientId,
                source: &SourceId,
                mime_type: &MimeType,
            ) -> Result<SourceStream, TransferError>;
        }
    }

    fn backend(events: MockEvents, streams: MockStreams, protocol: WireProtocol) -> ClientSourceBackend {
        ClientSourceBackend::new(
            ClientId::from("owner"),
            SourceId::from("source"),
            protocol,
            Arc::new(events),
            Arc::new(streams),
        )
    }

    #[test]
    fn cancelled_is_framed_on_the_source_protocol() {
        let mut events = MockEvents::new();
        events
            .expect_send()
            .with(
                eq(ClientId::from("owner")),
                eq(WireEvent::Cancelled {
                    protocol: WireProtocol::PrimarySelection,
                    source: SourceId::from("source"),
                }),
            )
            .times(1)
            .return_const(());

        backend(events, MockStreams::new(), WireProtocol::PrimarySelection).cancelled();
    }

    #[tokio::test]
    async fn open_asks_the_owner_for_a_stream() {
        let mut streams = MockStreams::new();
        streams
            .expect_request_stream()
            .with(
                eq(ClientId::from("owner")),
                eq(SourceId::from("source")),
                eq(MimeType::text_plain()),
            )
            .times(1)
            .returning(|_, _, _| Ok(Box::new(std::io::Cursor::new(b"x".to_vec()))));
        let mut events = MockEvents::new();
        events.expect_send().with(always(), always()).never();

        let opened = backend(events, streams, WireProtocol::DataDevice)
            .open(&MimeType::text_plain())
            .await;

        assert!(opened.is_ok());
    }
}
