//! Drag-and-drop over the headless seat.

mod common;

use common::{client, last_enter_offer, utf8, Harness};
use sel_app::MemorySink;
use sel_core::config::DndConfig;
use sel_core::ports::GrabDevice;
use sel_core::wire::Request;
use sel_core::{
    ButtonMask, ClientId, DeviceId, DndAction, MimeType, Modifiers, OfferId, Point, ProtocolError,
    SelectionClass, Serial, SessionConfig, SourceId, SurfaceId, WireEvent, WireProtocol,
};

struct DragSetup {
    h: Harness,
    x: ClientId,
    y: ClientId,
    source: SourceId,
}

/// X on the left with a copy|move source, Y on the right. The drag starts
/// on X's surface and is moved over Y's.
fn drag_over_destination(config: SessionConfig) -> DragSetup {
    drag_with_actions(config, DndAction::COPY | DndAction::MOVE)
}

fn drag_with_actions(config: SessionConfig, actions: DndAction) -> DragSetup {
    let mut h = Harness::with_config(config);
    let (x, y) = (client("x"), client("y"));
    h.add_surface("x-surface", &x, 0.0, 0.0);
    h.add_surface("y-surface", &y, 200.0, 0.0);
    let x_device = h.session.bind_device(&x, WireProtocol::DataDevice);
    h.session.bind_device(&y, WireProtocol::DataDevice);

    let source = h.source_with_payload(&x, WireProtocol::DataDevice, &[MimeType::text_plain()], "dragged");
    h.session
        .dispatch(
            &x,
            Request::SourceSetActions {
                source: source.clone(),
                actions: actions.bits(),
            },
        )
        .unwrap();

    h.seat.move_pointer(Point::new(10.0, 10.0));
    h.seat.press(SurfaceId::from("x-surface"), Serial(7));
    let started = h
        .session
        .start_drag(
            &x,
            &x_device,
            Some(&source),
            &SurfaceId::from("x-surface"),
            Some(&SurfaceId::from("icon")),
            Serial(7),
        )
        .unwrap();
    assert!(started);

    h.seat.move_pointer(Point::new(210.0, 20.0));
    h.session.drag_motion(16);

    DragSetup { h, x, y, source }
}

fn y_offer(setup: &DragSetup) -> OfferId {
    last_enter_offer(&setup.h.events.events_for(&setup.y)).expect("y entered with an offer")
}

/// Y accepts text/plain and announces its actions.
fn y_accepts(setup: &mut DragSetup, supported: DndAction, preferred: DndAction) -> OfferId {
    let offer = y_offer(setup);
    setup
        .h
        .session
        .dispatch(
            &setup.y,
            Request::OfferAccept {
                offer: offer.clone(),
                serial: Serial(7),
                mime_type: Some(MimeType::text_plain()),
            },
        )
        .unwrap();
    setup
        .h
        .session
        .dispatch(
            &setup.y,
            Request::OfferSetActions {
                offer: offer.clone(),
                supported: supported.bits(),
                preferred: preferred.bits(),
            },
        )
        .unwrap();
    offer
}

fn has_drop(events: &[WireEvent]) -> bool {
    events.iter().any(|event| matches!(event, WireEvent::Drop { .. }))
}

fn has_cancelled(events: &[WireEvent]) -> bool {
    events.iter().any(|event| matches!(event, WireEvent::Cancelled { .. }))
}

#[tokio::test]
async fn drop_transfers_and_finishes() {
    let mut s = drag_over_destination(SessionConfig::default());
    let offer = y_offer(&s);
    assert_eq!(s.h.session.owner(SelectionClass::DragAndDrop), Some(&s.source));
    assert!(s.h.events.events_for(&s.y).contains(&WireEvent::SourceActions {
        offer: offer.clone(),
        actions: DndAction::COPY | DndAction::MOVE,
    }));
    assert!(s.h.events.events_for(&s.x).iter().any(|event| matches!(event, WireEvent::Leave { .. })));

    s.h.session
        .dispatch(
            &s.y,
            Request::OfferAccept {
                offer: offer.clone(),
                serial: Serial(7),
                mime_type: Some(MimeType::text_plain()),
            },
        )
        .unwrap();
    s.h.session
        .dispatch(
            &s.y,
            Request::OfferSetActions {
                offer: offer.clone(),
                supported: (DndAction::COPY | DndAction::MOVE).bits(),
                preferred: DndAction::MOVE.bits(),
            },
        )
        .unwrap();
    assert!(s.h.events.events_for(&s.y).contains(&WireEvent::Action {
        offer: offer.clone(),
        action: DndAction::MOVE,
    }));

    s.h.seat.release_all();
    s.h.session.drag_button(ButtonMask::empty());

    assert!(!s.h.session.is_dragging());
    assert!(s.h.events.events_for(&s.y).iter().any(|event| matches!(event, WireEvent::Drop { .. })));
    let x_events = s.h.events.events_for(&s.x);
    assert!(x_events.contains(&WireEvent::Target {
        source: s.source.clone(),
        mime_type: Some(MimeType::text_plain()),
    }));
    assert!(x_events.contains(&WireEvent::SourceAction {
        source: s.source.clone(),
        action: DndAction::MOVE,
    }));
    assert!(x_events.contains(&WireEvent::DndDropPerformed {
        source: s.source.clone(),
    }));
    assert_eq!(s.h.seat.drag_grab(), None);
    assert_eq!(s.h.seat.icon_position(&SurfaceId::from("icon")), None);
    assert_eq!(s.h.session.owner(SelectionClass::DragAndDrop), None);

    let sink = MemorySink::new();
    s.h.session
        .receive(&s.y, &offer, MimeType::text_plain(), sink.boxed())
        .unwrap()
        .await
        .unwrap()
        .unwrap();
    assert_eq!(utf8(&sink), "dragged");

    s.h.session
        .dispatch(&s.y, Request::OfferFinish { offer })
        .unwrap();
    assert!(s.h.events.events_for(&s.x).contains(&WireEvent::DndFinished {
        source: s.source.clone(),
    }));
}

#[tokio::test]
async fn finish_before_accept_is_premature() {
    let mut s = drag_over_destination(SessionConfig::default());
    let offer = y_offer(&s);

    let err = s
        .h
        .session
        .dispatch(&s.y, Request::OfferFinish { offer })
        .unwrap_err();

    assert_eq!(err, ProtocolError::PrematureFinish);
    assert!(!s
        .h
        .events
        .events_for(&s.x)
        .iter()
        .any(|event| matches!(event, WireEvent::DndFinished { .. })));
}

#[tokio::test]
async fn modifiers_force_the_user_action() {
    let mut s = drag_over_destination(SessionConfig::default());
    let offer = y_offer(&s);
    s.h.session
        .dispatch(
            &s.y,
            Request::OfferSetActions {
                offer: offer.clone(),
                supported: (DndAction::COPY | DndAction::MOVE).bits(),
                preferred: 0,
            },
        )
        .unwrap();
    assert!(s.h.events.events_for(&s.y).contains(&WireEvent::Action {
        offer: offer.clone(),
        action: DndAction::COPY,
    }));

    s.h.session.drag_modifiers(Modifiers::SHIFT);

    assert_eq!(
        s.h.events.events_for(&s.y).last(),
        Some(&WireEvent::Action {
            offer,
            action: DndAction::MOVE,
        })
    );
}

#[tokio::test]
async fn escape_cancels_and_removes_the_icon() {
    let mut s = drag_over_destination(SessionConfig::default());
    assert_eq!(s.h.seat.drag_grab(), Some(GrabDevice::Pointer));
    assert!(s.h.seat.icon_position(&SurfaceId::from("icon")).is_some());

    s.h.session.drag_escape();

    assert!(!s.h.session.is_dragging());
    assert_eq!(s.h.seat.icon_position(&SurfaceId::from("icon")), None);
    assert_eq!(s.h.seat.drag_grab(), None);
    assert!(s.h.events.events_for(&s.x).contains(&WireEvent::Cancelled {
        protocol: WireProtocol::DataDevice,
        source: s.source.clone(),
    }));
}

#[tokio::test]
async fn release_without_accept_fails_the_drag() {
    let mut s = drag_over_destination(SessionConfig::default());

    s.h.seat.release_all();
    s.h.session.drag_button(ButtonMask::empty());

    assert!(!s.h.session.is_dragging());
    assert!(s.h.events.events_for(&s.y).iter().any(|event| matches!(event, WireEvent::Leave { .. })));
    assert!(s.h.events.events_for(&s.x).contains(&WireEvent::Cancelled {
        protocol: WireProtocol::DataDevice,
        source: s.source.clone(),
    }));
}

#[tokio::test]
async fn drag_needs_a_matching_press() {
    let mut h = Harness::new();
    let x = client("x");
    let device = h.session.bind_device(&x, WireProtocol::DataDevice);
    let source = h.source_with_payload(&x, WireProtocol::DataDevice, &[MimeType::text_plain()], "a");
    h.seat.press(SurfaceId::from("x-surface"), Serial(3));

    let started = h
        .session
        .start_drag(&x, &device, Some(&source), &SurfaceId::from("x-surface"), None, Serial(4))
        .unwrap();

    assert!(!started);
    assert!(!h.session.is_dragging());
}

#[tokio::test]
async fn drag_on_a_foreign_device_is_an_error() {
    let mut h = Harness::new();
    let (x, y) = (client("x"), client("y"));
    h.session.bind_device(&x, WireProtocol::DataDevice);
    h.session.bind_device(&y, WireProtocol::DataDevice);
    h.seat.press(SurfaceId::from("x-surface"), Serial(1));

    let err = h
        .session
        .start_drag(&x, &DeviceId::from("nope"), None, &SurfaceId::from("x-surface"), None, Serial(1))
        .unwrap_err();

    assert!(matches!(err, ProtocolError::UnknownObject { .. }));
}

fn desktop_drop_config() -> SessionConfig {
    SessionConfig {
        dnd: DndConfig {
            desktop_drop: true,
            ..DndConfig::default()
        },
        ..SessionConfig::default()
    }
}

#[tokio::test]
async fn release_over_the_desktop_completes_the_source() {
    let mut h = Harness::with_config(desktop_drop_config());
    let x = client("x");
    h.add_surface("x-surface", &x, 0.0, 0.0);
    let device = h.session.bind_device(&x, WireProtocol::DataDevice);
    let source = h.source_with_payload(&x, WireProtocol::DataDevice, &[MimeType::uri_list()], "file:///tmp/a\n");
    h.seat.press(SurfaceId::from("x-surface"), Serial(2));
    h.seat.move_pointer(Point::new(500.0, 500.0));
    assert!(h
        .session
        .start_drag(&x, &device, Some(&source), &SurfaceId::from("x-surface"), None, Serial(2))
        .unwrap());

    h.seat.release_all();
    h.session.drag_button(ButtonMask::empty());
    h.session.wait_transfers().await;

    let events = h.events.events_for(&x);
    assert!(events.contains(&WireEvent::DndDropPerformed { source: source.clone() }));
    assert!(events.contains(&WireEvent::DndFinished { source: source.clone() }));
    assert!(!events
        .iter()
        .any(|event| matches!(event, WireEvent::Cancelled { .. })));
    assert!(h
        .streams
        .requests()
        .iter()
        .any(|(_, requested, mime)| requested == &source && mime == &MimeType::uri_list()));
}

#[tokio::test]
async fn source_destroyed_during_desktop_drain_is_not_notified() {
    let mut h = Harness::with_config(desktop_drop_config());
    let x = client("x");
    h.add_surface("x-surface", &x, 0.0, 0.0);
    let device = h.session.bind_device(&x, WireProtocol::DataDevice);
    let source = h.source_with_payload(&x, WireProtocol::DataDevice, &[MimeType::uri_list()], "file:///tmp/a\n");
    h.seat.press(SurfaceId::from("x-surface"), Serial(2));
    h.seat.move_pointer(Point::new(500.0, 500.0));
    assert!(h
        .session
        .start_drag(&x, &device, Some(&source), &SurfaceId::from("x-surface"), None, Serial(2))
        .unwrap());
    h.seat.release_all();
    h.session.drag_button(ButtonMask::empty());
    assert!(h
        .events
        .take_events_for(&x)
        .contains(&WireEvent::DndDropPerformed { source: source.clone() }));

    h.session
        .dispatch(&x, Request::DestroySource { source: source.clone() })
        .unwrap();
    h.session.wait_transfers().await;

    let events = h.events.events_for(&x);
    assert!(!events
        .iter()
        .any(|event| matches!(event, WireEvent::DndFinished { .. })));
    assert!(!has_cancelled(&events));
}

#[tokio::test]
async fn touch_drag_drops_when_its_touch_point_lifts() {
    let mut h = Harness::new();
    let (x, y) = (client("x"), client("y"));
    h.add_surface("x-surface", &x, 0.0, 0.0);
    h.add_surface("y-surface", &y, 200.0, 0.0);
    let x_device = h.session.bind_device(&x, WireProtocol::DataDevice);
    h.session.bind_device(&y, WireProtocol::DataDevice);
    let source = h.source_with_payload(&x, WireProtocol::DataDevice, &[MimeType::text_plain()], "touched");
    h.session
        .dispatch(
            &x,
            Request::SourceSetActions {
                source: source.clone(),
                actions: DndAction::COPY.bits(),
            },
        )
        .unwrap();

    h.seat.move_pointer(Point::new(10.0, 10.0));
    h.seat.touch_down(SurfaceId::from("x-surface"), Serial(7), 0);
    assert!(h
        .session
        .start_drag(&x, &x_device, Some(&source), &SurfaceId::from("x-surface"), None, Serial(7))
        .unwrap());
    assert_eq!(h.seat.drag_grab(), Some(GrabDevice::Touch { slot: 0 }));
    h.seat.move_pointer(Point::new(250.0, 50.0));
    h.session.drag_motion(20);

    let mut s = DragSetup { h, x, y, source };
    y_accepts(&mut s, DndAction::COPY, DndAction::COPY);

    s.h.session.drag_touch_up(1);
    assert!(s.h.session.is_dragging());
    s.h.session.drag_button(ButtonMask::empty());
    assert!(s.h.session.is_dragging());

    s.h.session.drag_touch_up(0);

    assert!(!s.h.session.is_dragging());
    assert_eq!(s.h.seat.drag_grab(), None);
    assert!(has_drop(&s.h.events.events_for(&s.y)));
    assert!(s.h.events.events_for(&s.x).contains(&WireEvent::DndDropPerformed {
        source: s.source.clone(),
    }));
}

#[tokio::test]
async fn sourceless_drag_stays_within_the_origin_client() {
    let mut h = Harness::new();
    let (x, y) = (client("x"), client("y"));
    h.add_surface("x-surface", &x, 0.0, 0.0);
    h.add_surface("y-surface", &y, 200.0, 0.0);
    h.add_surface("x-other", &x, 400.0, 0.0);
    let x_device = h.session.bind_device(&x, WireProtocol::DataDevice);
    h.session.bind_device(&y, WireProtocol::DataDevice);

    h.seat.move_pointer(Point::new(10.0, 10.0));
    h.seat.press(SurfaceId::from("x-surface"), Serial(4));
    assert!(h
        .session
        .start_drag(&x, &x_device, None, &SurfaceId::from("x-surface"), None, Serial(4))
        .unwrap());
    assert_eq!(h.session.owner(SelectionClass::DragAndDrop), None);

    h.seat.move_pointer(Point::new(250.0, 10.0));
    h.session.drag_motion(1);
    h.seat.move_pointer(Point::new(450.0, 10.0));
    h.session.drag_motion(2);
    h.seat.release_all();
    h.session.drag_button(ButtonMask::empty());

    assert!(!h.session.is_dragging());
    assert!(h.events.events_for(&y).is_empty());
    let x_events = h.events.events_for(&x);
    let entered: Vec<_> = x_events
        .iter()
        .filter_map(|event| match event {
            WireEvent::Enter { surface, offer, .. } => Some((surface.clone(), offer.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(
        entered,
        vec![
            (SurfaceId::from("x-surface"), None),
            (SurfaceId::from("x-other"), None),
        ]
    );
    assert_eq!(x_events.last(), Some(&WireEvent::Drop { device: x_device }));
}

#[tokio::test]
async fn destroying_the_dragged_source_tears_down_quietly() {
    let mut s = drag_over_destination(SessionConfig::default());
    assert!(s.h.seat.icon_position(&SurfaceId::from("icon")).is_some());

    s.h.session
        .dispatch(&s.x, Request::DestroySource { source: s.source.clone() })
        .unwrap();

    assert!(!s.h.session.is_dragging());
    assert_eq!(s.h.seat.icon_position(&SurfaceId::from("icon")), None);
    assert_eq!(s.h.seat.drag_grab(), None);
    assert_eq!(s.h.session.owner(SelectionClass::DragAndDrop), None);
    assert!(!has_cancelled(&s.h.events.events_for(&s.x)));
    assert!(matches!(
        s.h.events.events_for(&s.y).last(),
        Some(WireEvent::Leave { .. })
    ));
}

#[tokio::test]
async fn action_changes_are_held_back_while_the_source_asks() {
    let all = DndAction::COPY | DndAction::MOVE | DndAction::ASK;
    let mut s = drag_with_actions(SessionConfig::default(), all);
    let offer = y_accepts(&mut s, DndAction::COPY | DndAction::ASK, DndAction::ASK);
    assert!(s.h.events.events_for(&s.y).contains(&WireEvent::Action {
        offer: offer.clone(),
        action: DndAction::ASK,
    }));

    s.h.seat.release_all();
    s.h.session.drag_button(ButtonMask::empty());
    assert!(has_drop(&s.h.events.take_events_for(&s.y)));
    s.h.events.take_events_for(&s.x);

    s.h.session
        .dispatch(
            &s.y,
            Request::OfferSetActions {
                offer: offer.clone(),
                supported: DndAction::COPY.bits(),
                preferred: DndAction::COPY.bits(),
            },
        )
        .unwrap();

    assert!(!s
        .h
        .events
        .events_for(&s.y)
        .iter()
        .any(|event| matches!(event, WireEvent::Action { .. })));
    assert!(s.h.events.events_for(&s.x).is_empty());

    s.h.session
        .dispatch(&s.y, Request::OfferFinish { offer })
        .unwrap();
    assert_eq!(
        s.h.events.events_for(&s.x),
        vec![
            WireEvent::SourceAction {
                source: s.source.clone(),
                action: DndAction::COPY,
            },
            WireEvent::DndFinished {
                source: s.source.clone(),
            },
        ]
    );
}

#[tokio::test]
async fn alt_asks_the_user() {
    let all = DndAction::COPY | DndAction::MOVE | DndAction::ASK;
    let mut s = drag_with_actions(SessionConfig::default(), all);
    let offer = y_accepts(&mut s, all, DndAction::COPY);

    s.h.seat.set_modifiers(Modifiers::ALT);
    s.h.session.drag_modifiers(Modifiers::ALT);

    assert_eq!(
        s.h.events.events_for(&s.y).last(),
        Some(&WireEvent::Action {
            offer,
            action: DndAction::ASK,
        })
    );
    assert!(s.h.events.events_for(&s.x).contains(&WireEvent::SourceAction {
        source: s.source.clone(),
        action: DndAction::ASK,
    }));
}

#[tokio::test]
async fn secondary_button_asks_until_it_is_released() {
    let all = DndAction::COPY | DndAction::MOVE | DndAction::ASK;
    let mut s = drag_with_actions(SessionConfig::default(), all);
    let offer = y_accepts(&mut s, all, DndAction::COPY);

    s.h.session.drag_button(ButtonMask::PRIMARY | ButtonMask::SECONDARY);
    assert!(s.h.session.is_dragging());
    assert_eq!(
        s.h.events.events_for(&s.y).last(),
        Some(&WireEvent::Action {
            offer: offer.clone(),
            action: DndAction::ASK,
        })
    );

    s.h.session.drag_button(ButtonMask::PRIMARY);
    assert!(s.h.session.is_dragging());
    assert_eq!(
        s.h.events.events_for(&s.y).last(),
        Some(&WireEvent::Action {
            offer,
            action: DndAction::COPY,
        })
    );
}
