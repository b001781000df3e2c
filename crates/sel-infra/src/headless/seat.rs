use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use sel_core::ports::{GrabDevice, GrabPort, KeyboardFocusPort, SurfaceHit, VisualLayerPort};
use sel_core::{ButtonMask, ClientId, Modifiers, Point, Serial, SurfaceId};

/// An axis-aligned surface on the headless output.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceRect {
    pub surface: SurfaceId,
    pub client: ClientId,
    pub origin: Point,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    fn contains(&self, point: Point) -> bool {
        point.x >= self.origin.x
            && point.y >= self.origin.y
            && point.x < self.origin.x + self.width
            && point.y < self.origin.y + self.height
    }
}

#[derive(Debug, Default)]
struct SeatState {
    focus: Option<ClientId>,
    pointer: Point,
    modifiers: Modifiers,
    buttons: ButtonMask,
    press: Option<(SurfaceId, Serial, GrabDevice)>,
    surfaces: Vec<SurfaceRect>,
    drag_grab: Option<GrabDevice>,
    icons: HashMap<SurfaceId, Point>,
}

/// Scripted seat: keyboard focus, one pointer, touch presses, and a flat
/// stack of rectangular surfaces (last added is on top).
#[derive(Debug, Default)]
pub struct HeadlessSeat {
    state: Mutex<SeatState>,
}

impl HeadlessSeat {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SeatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_focus(&self, client: Option<ClientId>) {
        self.state().focus = client;
    }

    pub fn add_surface(&self, rect: SurfaceRect) {
        self.state().surfaces.push(rect);
    }

    pub fn move_pointer(&self, position: Point) {
        self.state().pointer = position;
    }

    pub fn set_modifiers(&self, modifiers: Modifiers) {
        self.state().modifiers = modifiers;
    }

    pub fn set_buttons(&self, buttons: ButtonMask) {
        self.state().buttons = buttons;
    }

    /// Press the primary button on `surface`, arming a press grab.
    pub fn press(&self, surface: SurfaceId, serial: Serial) {
        let mut state = self.state();
        state.buttons |= ButtonMask::PRIMARY;
        state.press = Some((surface, serial, GrabDevice::Pointer));
    }

    /// Touch down on `surface` at the current pointer position.
    pub fn touch_down(&self, surface: SurfaceId, serial: Serial, slot: i32) {
        self.state().press = Some((surface, serial, GrabDevice::Touch { slot }));
    }

    /// Release every button and disarm the press grab.
    pub fn release_all(&self) {
        let mut state = self.state();
        state.buttons = ButtonMask::empty();
        state.press = None;
    }

    pub fn drag_grab(&self) -> Option<GrabDevice> {
        self.state().drag_grab
    }

    pub fn icon_position(&self, icon: &SurfaceId) -> Option<Point> {
        self.state().icons.get(icon).copied()
    }
}

impl KeyboardFocusPort for HeadlessSeat {
    fn focused_client(&self) -> Option<ClientId> {
        self.state().focus.clone()
    }
}

impl GrabPort for HeadlessSeat {
    fn press_grab(&self, origin: &SurfaceId, serial: Serial) -> Option<GrabDevice> {
        match &self.state().press {
            Some((surface, pressed, device)) if surface == origin && *pressed == serial => {
                Some(*device)
            }
            _ => None,
        }
    }

    fn pointer_position(&self) -> Point {
        self.state().pointer
    }

    fn modifiers(&self) -> Modifiers {
        self.state().modifiers
    }

    fn buttons(&self) -> ButtonMask {
        self.state().buttons
    }

    fn begin_drag_grab(&self, device: GrabDevice) {
        self.state().drag_grab = Some(device);
    }

    fn end_drag_grab(&self) {
        self.state().drag_grab = None;
    }
}

impl VisualLayerPort for HeadlessSeat {
    fn surface_at(&self, position: Point) -> Option<SurfaceHit> {
        self.state()
            .surfaces
            .iter()
            .rev()
            .find(|rect| rect.contains(position))
            .map(|rect| SurfaceHit {
                surface: rect.surface.clone(),
                client: rect.client.clone(),
                local: Point::new(position.x - rect.origin.x, position.y - rect.origin.y),
            })
    }

    fn attach_drag_icon(&self, icon: &SurfaceId, position: Point) {
        self.state().icons.insert(icon.clone(), position);
    }

    fn move_drag_icon(&self, icon: &SurfaceId, position: Point) {
        if let Some(current) = self.state().icons.get_mut(icon) {
            *current = position;
        }
    }

    fn detach_drag_icon(&self, icon: &SurfaceId) {
        self.state().icons.remove(icon);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topmost_surface_wins_and_reports_local_coordinates() {
        let seat = HeadlessSeat::new();
        seat.add_surface(SurfaceRect {
            surface: SurfaceId::from("below"),
            client: ClientId::from("a"),
            origin: Point::new(0.0, 0.0),
            width: 100.0,
            height: 100.0,
        });
        seat.add_surface(SurfaceRect {
            surface: SurfaceId::from("above"),
            client: ClientId::from("b"),
            origin: Point::new(50.0, 50.0),
            width: 100.0,
            height: 100.0,
        });

        let hit = seat.surface_at(Point::new(60.0, 70.0)).unwrap();

        assert_eq!(hit.surface, SurfaceId::from("above"));
        assert_eq!(hit.local, Point::new(10.0, 20.0));
        assert!(seat.surface_at(Point::new(500.0, 0.0)).is_none());
    }

    #[test]
    fn press_grab_requires_matching_serial() {
        let seat = HeadlessSeat::new();
        seat.press(SurfaceId::from("s"), Serial(4));

        assert_eq!(
            seat.press_grab(&SurfaceId::from("s"), Serial(4)),
            Some(GrabDevice::Pointer)
        );
        assert_eq!(seat.press_grab(&SurfaceId::from("s"), Serial(5)), None);
        assert_eq!(seat.press_grab(&SurfaceId::from("t"), Serial(4)), None);
    }
}
