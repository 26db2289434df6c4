//! Integration tests for the panel controller.
//!
//! These tests run the full actor against the in-memory window manager: the
//! adapter pump, the directory, the taskbar and the registry, through the
//! public `PanelHandle` only.
//!
//! ## Running
//!
//! ```bash
//! cargo test -p shelf --test controller_integration
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use shelf_lib::config::ShelfConfig;
use shelf_lib::error::ShelfError;
use shelf_lib::geometry::{Edge, Rect};
use shelf_lib::modules::panel::{
    AdapterState, MemoryStore, PanelActor, PanelHandle, PanelMessage, PanelOptions, PluginKind,
    PluginRegistry, RecordingServices,
};
use shelf_lib::modules::taskbar::{EntryTarget, MouseButton, TaskbarInput};
use shelf_lib::modules::windows::{AttributeDelta, DesktopInfo, WindowAttributes, WmRequest};
use shelf_lib::platform::InMemoryWindowManager;

// ============================================================================
// Helpers
// ============================================================================

const SCREEN: Rect = Rect::new(0, 0, 1920, 1080);

fn test_config() -> ShelfConfig {
    let mut config = ShelfConfig::default();
    config.adapter.reconnect_min_ms = 10;
    config.adapter.reconnect_max_ms = 40;
    config
}

fn window(title: &str, class: &str) -> WindowAttributes { WindowAttributes::new(title, class) }

fn spawn_panel(wm: &Arc<InMemoryWindowManager>) -> PanelHandle {
    let registry = PluginRegistry::open(Box::new(MemoryStore::new())).unwrap();
    PanelActor::spawn(PanelOptions {
        config: test_config(),
        registry,
        services: Arc::new(RecordingServices::new()),
        adapter: Arc::clone(wm) as _,
        screen: SCREEN,
    })
}

/// Polls `check` until it holds, failing after about two seconds.
async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for: {what}");
}

async fn window_count(handle: &PanelHandle) -> usize {
    handle.windows().await.map(|w| w.len()).unwrap_or_default()
}

async fn is_state(handle: &PanelHandle, expected: AdapterState) -> bool {
    handle.adapter_state().await.is_ok_and(|state| state == expected)
}

// ============================================================================
// Window tracking
// ============================================================================

#[tokio::test]
async fn test_snapshot_then_live_events() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    wm.open_window(window("Terminal", "xterm"));
    wm.open_window(window("Browser", "firefox"));

    let handle = spawn_panel(&wm);
    eventually("snapshot", || async { window_count(&handle).await == 2 }).await;
    assert!(is_state(&handle, AdapterState::Connected).await);

    let editor = wm.open_window(window("Editor", "gedit"));
    eventually("created window", || async { window_count(&handle).await == 3 }).await;

    wm.close_window(editor);
    eventually("destroyed window", || async { window_count(&handle).await == 2 }).await;

    let view = handle.current_taskbar();
    assert!(view.find_window(editor).is_none());
}

#[tokio::test]
async fn test_reconnect_reconciles_without_duplicates() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    let kept = wm.open_window(window("Terminal", "xterm"));
    let closed = wm.open_window(window("Browser", "firefox"));

    let handle = spawn_panel(&wm);
    eventually("snapshot", || async { window_count(&handle).await == 2 }).await;

    wm.disconnect();
    eventually("degraded", || async { is_state(&handle, AdapterState::Degraded).await }).await;
    assert!(handle.current_taskbar().stale);

    // Changes made while the panel cannot see them.
    wm.close_window(closed);
    let opened = wm.open_window(window("Editor", "gedit"));
    wm.change(kept, AttributeDelta {
        title: Some("vim".to_string()),
        ..Default::default()
    });

    wm.reconnect();
    eventually("reconnected", || async { is_state(&handle, AdapterState::Connected).await })
        .await;

    let windows = handle.windows().await.unwrap();
    let mut ids: Vec<_> = windows.iter().map(|w| w.id).collect();
    ids.sort();
    assert_eq!(ids, vec![kept, opened]);
    let title = windows.iter().find(|w| w.id == kept).map(|w| w.attributes.title.clone());
    assert_eq!(title.as_deref(), Some("vim"));
    assert!(!handle.current_taskbar().stale);
    assert_eq!(wm.subscriber_count(), 1);
}

#[tokio::test]
async fn test_change_for_unseen_window_triggers_lookup() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    let handle = spawn_panel(&wm);
    eventually("connected", || async { is_state(&handle, AdapterState::Connected).await }).await;

    wm.set_event_loss(true);
    let ghost = wm.open_window(window("Ghost", "ghost"));
    wm.set_event_loss(false);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(window_count(&handle).await, 0);

    wm.change(ghost, AttributeDelta {
        title: Some("Ghost (2)".to_string()),
        ..Default::default()
    });
    eventually("looked-up window", || async { window_count(&handle).await == 1 }).await;

    let view = handle.current_taskbar();
    let entry = view.find_window(ghost).expect("window on the taskbar");
    assert_eq!(entry.title, "Ghost (2)");
}

// ============================================================================
// Requests
// ============================================================================

#[tokio::test]
async fn test_strut_reserved_once_connected() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    let handle = spawn_panel(&wm);
    eventually("connected", || async { is_state(&handle, AdapterState::Connected).await }).await;

    let struts: Vec<_> = wm
        .requests()
        .into_iter()
        .filter(|r| matches!(r, WmRequest::ReserveScreenStrut { .. }))
        .collect();
    assert_eq!(struts.len(), 1);
    assert!(matches!(
        struts[0],
        WmRequest::ReserveScreenStrut {
            edge: Edge::Bottom,
            thickness: 46,
            ..
        }
    ));
}

#[tokio::test]
async fn test_click_activates_window() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    let id = wm.open_window(window("Terminal", "xterm"));
    let handle = spawn_panel(&wm);
    eventually("snapshot", || async { window_count(&handle).await == 1 }).await;

    handle
        .taskbar_input(TaskbarInput::Click {
            target: EntryTarget::Window(id),
            button: MouseButton::Left,
        })
        .await
        .unwrap();

    eventually("activate request", || async {
        wm.requests().contains(&WmRequest::Activate { window_id: id })
    })
    .await;
}

// ============================================================================
// Plugins and configuration
// ============================================================================

#[tokio::test]
async fn test_plugin_mutations_through_handle() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    let handle = spawn_panel(&wm);

    let before = handle.plugins().await.unwrap().len();
    let clock = handle.add_plugin(PluginKind::Clock, Some(0), serde_json::Value::Null).await.unwrap();
    let plugins = handle.plugins().await.unwrap();
    assert_eq!(plugins.len(), before + 1);
    assert_eq!(plugins[0].id, clock);
    assert!(handle.layout().await.unwrap().slot(clock).is_some());

    let duplicate =
        handle.add_plugin(PluginKind::Taskbar, None, serde_json::Value::Null).await;
    assert!(matches!(duplicate, Err(ShelfError::DuplicateSingleton(_))));

    let invalid = handle.reconfigure_plugin(clock, serde_json::json!({ "format": 42 })).await;
    assert!(matches!(invalid, Err(ShelfError::PluginError(_))));
    assert_eq!(handle.plugins().await.unwrap()[0].config, serde_json::Value::Null);

    handle.remove_plugin(clock).await.unwrap();
    assert_eq!(handle.plugins().await.unwrap().len(), before);
}

#[tokio::test]
async fn test_config_change_moves_panel() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    let handle = spawn_panel(&wm);
    eventually("connected", || async { is_state(&handle, AdapterState::Connected).await }).await;

    let mut config = test_config();
    config.panel.edge = Edge::Top;
    handle.send(PanelMessage::ConfigChanged(Box::new(config))).unwrap();

    eventually("layout on top", || async {
        handle.layout().await.is_ok_and(|layout| layout.edge == Edge::Top && layout.panel.y == 0)
    })
    .await;
    assert_eq!(handle.current_layout().edge, Edge::Top);
}

#[tokio::test]
async fn test_shutdown_stops_actor() {
    let wm = Arc::new(InMemoryWindowManager::new(DesktopInfo::default()));
    let handle = spawn_panel(&wm);
    eventually("connected", || async { is_state(&handle, AdapterState::Connected).await }).await;

    handle.shutdown().await.unwrap();
    eventually("closed", || async { handle.is_closed() }).await;
    eventually("pump stopped", || async { wm.subscriber_count() == 0 }).await;
}
