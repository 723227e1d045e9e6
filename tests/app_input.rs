use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use dnr_player::app::App;
use dnr_player::events::AppEvent;
use dnr_player::player::{MockEngine, MockEngineBuilder};
use dnr_player::viewmodel;

const URL: &str = "https://example.com/episodes/1874.mp3";

/// Helper to build the screen around a mock engine
fn create_test_app(
    engine: MockEngine,
) -> (Arc<MockEngine>, App, mpsc::UnboundedReceiver<AppEvent>) {
    let engine = Arc::new(engine);
    let view_model = viewmodel::spawn(engine.clone(), URL);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let app = App::new(view_model, engine.clone(), event_tx);
    (engine, app, event_rx)
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[tokio::test]
async fn test_play_key_starts_engine() {
    let (engine, mut app, _events) = create_test_app(MockEngine::new());

    app.handle_input(key(KeyCode::Char('p')));
    engine.wait_for_start().await;

    let snapshot = app.view_model.snapshot().await.unwrap();
    assert!(snapshot.is_playing);
    assert_eq!(engine.requested_urls(), vec![URL.to_string()]);
}

#[tokio::test]
async fn test_failed_play_surfaces_notification() {
    let (_engine, mut app, mut events) =
        create_test_app(MockEngineBuilder::new().fail_start().build());

    app.handle_input(key(KeyCode::Enter));

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("no event received")
        .expect("event channel closed");
    let message = match event {
        AppEvent::CommandFailed(message) => message,
        other => panic!("Expected CommandFailed, got {:?}", other),
    };
    assert!(message.contains(URL));

    app.on_command_failed(message);
    assert_eq!(app.notifications.active_notifications().len(), 1);
    assert!(!app.view_model.is_playing());
}

#[tokio::test]
async fn test_space_toggles_between_play_and_stop() {
    let (engine, mut app, _events) = create_test_app(MockEngine::new());

    app.handle_input(key(KeyCode::Char(' ')));
    engine.wait_for_start().await;
    wait_until(|| app.view_model.is_playing()).await;

    app.handle_input(key(KeyCode::Char(' ')));
    wait_until(|| engine.stop_calls() == 1).await;

    assert!(!app.view_model.is_playing());
    assert_eq!(engine.start_calls(), 1);
}

#[tokio::test]
async fn test_downloading_state_drives_spinner() {
    let (engine, mut app, _events) = create_test_app(MockEngineBuilder::new().hold_start().build());
    assert!(!app.is_downloading());

    app.handle_input(key(KeyCode::Char('p')));
    engine.wait_for_start().await;
    assert!(app.is_downloading());

    engine.emit_position(Duration::from_secs(1), Duration::from_secs(61));
    app.view_model.snapshot().await.unwrap();
    assert!(!app.is_downloading());
    assert_eq!(app.progress(), (Duration::from_secs(1), Duration::from_secs(61)));

    app.tick();
    engine.release_start();
}

#[tokio::test]
async fn test_quit_keys() {
    let (_engine, mut app, _events) = create_test_app(MockEngine::new());
    app.handle_input(key(KeyCode::Char('x')));
    assert!(!app.should_quit);

    app.handle_input(key(KeyCode::Char('q')));
    assert!(app.should_quit);

    let (_engine, mut app, _events) = create_test_app(MockEngine::new());
    app.handle_input(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
    assert!(app.should_quit);
}
