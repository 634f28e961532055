//! Replays a scripted key sequence through the binding menu.
//!
//! Run with `RUST_LOG=keyboard_mapping=debug` to see every transition.

use anyhow::Result;
use keyboard_mapping::{
    CaptureSession, HostBridge, KeyDispatch, KeyDownEvent, KeyboardMapping, MemoryPersistence,
    ToggleAction, Workflow, save_if_dirty,
};
use tracing_subscriber::{layer::SubscriberExt as _, util::SubscriberInitExt as _};

/// Host that prints what the game would do.
struct ConsoleHost;

impl HostBridge for ConsoleHost {
    fn toggle(&mut self, toggle: ToggleAction) {
        println!("  host: toggle {toggle}");
    }

    fn clear_pending_input(&mut self) {
        println!("  host: input cleared");
    }
}

fn press(
    engine: &KeyboardMapping,
    host: &mut ConsoleHost,
    session: Option<&mut CaptureSession>,
    key: u32,
) -> KeyDispatch {
    let mut event = KeyDownEvent::new(key);
    let dispatch = engine.on_key_down(&mut event, host, session);
    let name = engine.keys().display_name(event.key_code);
    let suppressed = if event.default_prevented { " (default prevented)" } else { "" };
    println!("[{name}] -> {dispatch:?}{suppressed}");
    dispatch
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("keyboard_mapping=info".parse()?))
        .init();

    let engine = KeyboardMapping::default();
    let persistence = MemoryPersistence::new();
    let mut host = ConsoleHost;

    println!("== gameplay");
    press(&engine, &mut host, None, 90);
    press(&engine, &mut host, None, 115);
    press(&engine, &mut host, None, 116);

    println!("== bind B to Dash");
    let mut session = engine.start_capture()?;
    press(&engine, &mut host, Some(&mut session), 37);
    press(&engine, &mut host, Some(&mut session), 66);
    if let Some(captured) = session.captured() {
        println!("captured {} (bound: {})", captured.key_name, captured.is_bound());
    }
    for (index, candidate) in session.candidates().iter().enumerate() {
        println!("  {index}: {}", candidate.label);
    }
    let dash = session
        .candidates()
        .iter()
        .position(|candidate| candidate.label == "Dash")
        .unwrap_or(0);
    session.choose(dash, &mut host)?;
    println!("outcome: {:?}", session.state());

    println!("== unbind F4");
    let mut session = engine.start_capture()?;
    press(&engine, &mut host, Some(&mut session), 115);
    session.unbind(&mut host)?;
    press(&engine, &mut host, None, 115);

    save_if_dirty(engine.store(), &persistence)?;
    println!("== saved: {}", persistence.value().unwrap_or_default());

    println!("== restore defaults");
    let mut restore = engine.start_restore();
    restore.confirm(&mut host)?;
    press(&engine, &mut host, None, 115);

    println!("== bindings");
    println!("{}", engine.listing().render_text());
    Ok(())
}
