//! Drag state machine.
//!
//! Defines a pure state transition function for an in-progress drag.

use crate::geometry::Point;
use crate::ids::{ClientId, SurfaceId};
use crate::ports::SurfaceHit;
use crate::selection::DndAction;

/// Surface currently under the drag, and its owner.
///
/// 当前拖拽焦点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragFocus {
    pub surface: SurfaceId,
    pub client: ClientId,
}

impl From<&SurfaceHit> for DragFocus {
    fn from(hit: &SurfaceHit) -> Self {
        Self {
            surface: hit.surface.clone(),
            client: hit.client.clone(),
        }
    }
}

/// How a drag ended.
///
/// 拖拽结束方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragOutcome {
    /// Dropped on a destination that accepted it.
    Dropped,
    /// Dropped on no surface; completed locally.
    DesktopDropped,
    /// Released over nothing usable; the source was cancelled.
    Failed,
    /// Escape, or the source went away.
    Cancelled,
}

/// Drag state.
///
/// 拖拽状态。
#[derive(Debug, Clone, PartialEq)]
pub enum DragState {
    Dragging {
        focus: Option<DragFocus>,
        /// Drags without a source only reach the origin client.
        restrict_to: Option<ClientId>,
    },
    Ended(DragOutcome),
}

impl DragState {
    pub fn start(restrict_to: Option<ClientId>) -> Self {
        DragState::Dragging {
            focus: None,
            restrict_to,
        }
    }

    pub fn focus(&self) -> Option<&DragFocus> {
        match self {
            DragState::Dragging { focus, .. } => focus.as_ref(),
            DragState::Ended(_) => None,
        }
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, DragState::Ended(_))
    }
}

/// Events that drive a drag.
///
/// 驱动拖拽的事件。
#[derive(Debug, Clone, PartialEq)]
pub enum DragEvent {
    /// Pointer (or grabbing touch point) moved; `hit` is the surface under it.
    Motion {
        hit: Option<SurfaceHit>,
        position: Point,
        time: u32,
    },
    /// Modifier or button state changed the user-forced action.
    UserAction { action: DndAction },
    /// The release that ends the grab.
    ///
    /// `target_ready`: the focused destination accepted a mimetype and a
    /// non-none action was negotiated. `desktop_drop`: the source can be
    /// completed without a destination.
    Release { target_ready: bool, desktop_drop: bool },
    Escape,
    /// The dragged source was destroyed by its owner.
    SourceGone,
}

/// Side-effects produced by drag transitions.
///
/// 拖拽状态迁移产生的副作用。
#[derive(Debug, Clone, PartialEq)]
pub enum DragAction {
    /// Send leave to the old focus and drop its offer.
    FocusOut { focus: DragFocus },
    /// Create an offer for the new focus and send enter.
    FocusIn { hit: SurfaceHit },
    /// Forward surface-local motion to the focus.
    Motion { local: Point, time: u32 },
    MoveIcon { position: Point },
    UpdateUserAction { action: DndAction },
    /// Send drop to the focus and drop-performed to the source.
    Drop { focus: DragFocus },
    /// Drain the source locally and complete it.
    DesktopDrop,
    CancelSource,
    /// Detach the icon, end the grab and clear the drag-and-drop owner.
    Teardown,
}

/// Pure drag state machine.
///
/// 纯状态机：不包含副作用。
pub struct DragStateMachine;

impl DragStateMachine {
    pub fn transition(state: DragState, event: DragEvent) -> (DragState, Vec<DragAction>) {
        let (focus, restrict_to) = match state {
            DragState::Dragging { focus, restrict_to } => (focus, restrict_to),
            ended @ DragState::Ended(_) => return (ended, Vec::new()),
        };

        match event {
            DragEvent::Motion {
                hit,
                position,
                time,
            } => {
                let hit = hit.filter(|hit| {
                    restrict_to
                        .as_ref()
                        .map_or(true, |client| &hit.client == client)
                });
                let mut actions = vec![DragAction::MoveIcon { position }];
                let next_focus = hit.as_ref().map(DragFocus::from);
                if next_focus != focus {
                    if let Some(old) = focus {
                        actions.push(DragAction::FocusOut { focus: old });
                    }
                    if let Some(hit) = &hit {
                        actions.push(DragAction::FocusIn { hit: hit.clone() });
                    }
                }
                if let Some(hit) = hit {
                    actions.push(DragAction::Motion {
                        local: hit.local,
                        time,
                    });
                }
                (
                    DragState::Dragging {
                        focus: next_focus,
                        restrict_to,
                    },
                    actions,
                )
            }
            DragEvent::UserAction { action } => (
                DragState::Dragging { focus, restrict_to },
                vec![DragAction::UpdateUserAction { action }],
            ),
            DragEvent::Release {
                target_ready,
                desktop_drop,
            } => match focus {
                Some(focus) if target_ready => (
                    DragState::Ended(DragOutcome::Dropped),
                    vec![DragAction::Drop { focus }, DragAction::Teardown],
                ),
                None if desktop_drop => (
                    DragState::Ended(DragOutcome::DesktopDropped),
                    vec![DragAction::DesktopDrop, DragAction::Teardown],
                ),
                focus => (
                    DragState::Ended(DragOutcome::Failed),
                    Self::abort(focus, true),
                ),
            },
            DragEvent::Escape => (
                DragState::Ended(DragOutcome::Cancelled),
                Self::abort(focus, true),
            ),
            DragEvent::SourceGone => (
                DragState::Ended(DragOutcome::Cancelled),
                Self::abort(focus, false),
            ),
        }
    }

    fn abort(focus: Option<DragFocus>, cancel_source: bool) -> Vec<DragAction> {
        let mut actions = Vec::with_capacity(3);
        if let Some(focus) = focus {
            actions.push(DragAction::FocusOut { focus });
        }
        if cancel_source {
            actions.push(DragAction::CancelSource);
        }
        actions.push(DragAction::Teardown);
        actions
    }
}
