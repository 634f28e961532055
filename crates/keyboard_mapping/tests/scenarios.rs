//! End-to-end runs of the binding menu, the restore prompt and the host
//! interceptor against a small configuration.

use keyboard_mapping::{
    ActionId, CaptureOutcome, CapturePhase, CaptureState, CaptureStep, KeyCode, KeyDispatch,
    KeyDownEvent, KeyMapping, KeyboardMapping, MappingError, MemoryPersistence, RecordingHost,
    RestoreState, ToggleAction, Workflow, load_into, save_if_dirty,
};

fn small_engine() -> KeyboardMapping {
    KeyboardMapping::builder()
        .add_action("ok", "Action/Confirm")
        .add_action("escape", "Cancel/Menu")
        .add_action("left", "Move Left")
        .add_default_binding(13u32, "ok")
        .add_default_binding(27u32, "escape")
        .add_default_binding(37u32, "left")
        .safeguard(37u32)
        .build()
}

fn press(
    engine: &KeyboardMapping,
    host: &mut RecordingHost,
    session: Option<&mut keyboard_mapping::CaptureSession>,
    key: u32,
) -> (KeyDispatch, KeyDownEvent) {
    let mut event = KeyDownEvent::new(key);
    let dispatch = engine.on_key_down(&mut event, host, session);
    (dispatch, event)
}

#[test]
fn safeguarded_key_keeps_listening() {
    let engine = small_engine();
    let mut host = RecordingHost::default();
    let mut session = engine.start_capture().unwrap();

    let (dispatch, _) = press(&engine, &mut host, Some(&mut session), 37);
    assert_eq!(dispatch, KeyDispatch::Captured(CaptureStep::Ignored));
    assert_eq!(session.state(), CaptureState::AwaitingKey);
    assert_eq!(engine.store().get(KeyCode(37)), Some(ActionId::from("left")));
}

#[test]
fn unbound_key_offers_catalog_only() {
    let engine = small_engine();
    let mut host = RecordingHost::default();
    let mut session = engine.start_capture().unwrap();

    press(&engine, &mut host, Some(&mut session), 65);
    assert_eq!(session.state(), CaptureState::ChoosingAction);

    let labels: Vec<_> = session.candidates().iter().map(|c| c.label.as_str()).collect();
    assert_eq!(labels, ["Action/Confirm", "Cancel/Menu", "Move Left"]);
    assert!(!session.captured().unwrap().is_bound());
}

#[test]
fn bound_key_can_be_unbound() {
    let engine = small_engine();
    let mut host = RecordingHost::default();
    let mut session = engine.start_capture().unwrap();

    press(&engine, &mut host, Some(&mut session), 13);
    let candidates = session.candidates();
    assert_eq!(candidates.len(), 4);
    assert!(candidates[0].is_unbind());
    assert_eq!(candidates[1].action, Some(ActionId::from("ok")));

    let outcome = session.choose(0, &mut host).unwrap();
    assert_eq!(outcome, CaptureOutcome::Unbound(KeyCode(13)));
    assert_eq!(session.state(), CaptureState::Terminal(CaptureOutcome::Unbound(KeyCode(13))));
    assert_eq!(engine.store().get(KeyCode(13)), None);
    assert_eq!(engine.capture_phase(), CapturePhase::Idle);
}

#[test]
fn cancelling_keeps_the_binding() {
    let engine = small_engine();
    let mut host = RecordingHost::default();
    let mut session = engine.start_capture().unwrap();

    press(&engine, &mut host, Some(&mut session), 13);
    session.cancel().unwrap();
    assert_eq!(engine.store().get(KeyCode(13)), Some(ActionId::from("ok")));
    assert!(!engine.store().is_dirty());
}

#[test]
fn second_capture_leaves_the_first_untouched() {
    let engine = small_engine();
    let mut host = RecordingHost::default();
    let mut first = engine.start_capture().unwrap();
    press(&engine, &mut host, Some(&mut first), 65);

    let err = engine.start_capture().unwrap_err();
    assert!(matches!(err, MappingError::AlreadyCapturing));
    assert_eq!(first.state(), CaptureState::ChoosingAction);
    assert_eq!(first.key_code(), Some(KeyCode(65)));

    first.choose(2, &mut host).unwrap();
    assert!(engine.start_capture().is_ok());
}

#[test]
fn restore_declined_then_confirmed() {
    let engine = small_engine();
    let mut host = RecordingHost::default();
    engine.store().set(KeyCode(13), "left");
    engine.store().unset(KeyCode(37));
    engine.store().set(KeyCode(90), "ok");
    let modified = engine.store().snapshot_for_persistence();

    let mut flow = engine.start_restore();
    assert_eq!(flow.state(), RestoreState::Prompting);
    flow.decline().unwrap();
    assert_eq!(engine.store().snapshot_for_persistence(), modified);

    let mut flow = engine.start_restore();
    flow.confirm(&mut host).unwrap();
    assert_eq!(flow.state(), RestoreState::Confirmed);

    let expected: KeyMapping = [
        (KeyCode(13), ActionId::from("ok")),
        (KeyCode(27), ActionId::from("escape")),
        (KeyCode(37), ActionId::from("left")),
    ]
    .into_iter()
    .collect();
    assert_eq!(engine.store().snapshot_for_persistence(), expected);
}

#[test]
fn suppressed_fullscreen_key_toggles_once() {
    let engine = KeyboardMapping::builder()
        .add_default_binding(122u32, "_fullscreen")
        .suppress(122u32)
        .build();
    let mut host = RecordingHost::default();

    let (dispatch, event) = press(&engine, &mut host, None, 122);
    assert_eq!(dispatch, KeyDispatch::Toggled(ToggleAction::Fullscreen));
    assert!(event.default_prevented);
    assert_eq!(host.toggles, vec![ToggleAction::Fullscreen]);
}

#[test]
fn stock_configuration_round_trips_through_persistence() {
    let engine = KeyboardMapping::default();
    let mut host = RecordingHost::default();
    let bridge = MemoryPersistence::new();

    let mut session = engine.start_capture().unwrap();
    press(&engine, &mut host, Some(&mut session), 66);
    session.choose_action(&ActionId::from("_stretch"), &mut host).unwrap();
    assert!(save_if_dirty(engine.store(), &bridge).unwrap());

    let reloaded = KeyboardMapping::default();
    assert!(load_into(reloaded.store(), &bridge).unwrap().is_empty());

    let (dispatch, _) = press(&reloaded, &mut host, None, 66);
    assert_eq!(dispatch, KeyDispatch::Toggled(ToggleAction::StretchMode));
    assert_eq!(reloaded.store().get(KeyCode(120)), Some(ActionId::from("debug")));
}

#[test]
fn bindings_outside_the_catalog_dispatch_but_are_not_listed() {
    let engine = KeyboardMapping::default();
    let mut host = RecordingHost::default();

    let (dispatch, _) = press(&engine, &mut host, None, 120);
    assert_eq!(dispatch, KeyDispatch::Action(ActionId::from("debug")));
    assert!(engine.listing().entries().iter().all(|entry| entry.key_code != KeyCode(120)));
}
