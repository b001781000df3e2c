use crate::geometry::Point;
use crate::ids::{ClientId, SurfaceId};

/// Result of picking the surface under a global point.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceHit {
    pub surface: SurfaceId,
    pub client: ClientId,
    /// Surface-local coordinates of the picked point.
    pub local: Point,
}

pub trait VisualLayerPort: Send + Sync {
    fn surface_at(&self, position: Point) -> Option<SurfaceHit>;

    /// Show `icon` following the pointer, starting at `position`.
    fn attach_drag_icon(&self, icon: &SurfaceId, position: Point);

    fn move_drag_icon(&self, icon: &SurfaceId, position: Point);

    fn detach_drag_icon(&self, icon: &SurfaceId);
}
