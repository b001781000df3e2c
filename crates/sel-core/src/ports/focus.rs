use crate::ids::ClientId;

pub trait KeyboardFocusPort: Send + Sync {
    /// Client owning the surface with keyboard focus, if any.
    fn focused_client(&self) -> Option<ClientId>;
}
