use crate::error::ProtocolError;
use crate::ids::ClientId;
use crate::wire::WireEvent;

/// Per-client wire transport.
pub trait ClientEventPort: Send + Sync {
    /// Queue `event` for delivery to `client`. Unknown clients are ignored.
    fn send(&self, client: &ClientId, event: WireEvent);

    /// Post a fatal protocol error; the session tears the client down
    /// right after this call.
    fn post_error(&self, client: &ClientId, error: &ProtocolError);
}
