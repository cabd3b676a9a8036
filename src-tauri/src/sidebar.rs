//! Panel visibility and webview layout.
//!
//! The bridge owns the open/closed state; neither the panel nor the chat
//! page can change it directly. Visibility is applied purely through
//! webview bounds: the chat webview reclaims the panel's width while
//! closed, and the floating toggle strip gets real bounds only after the
//! close has settled.

use serde::Serialize;
use tauri::{
    AppHandle, LogicalPosition, LogicalSize, Manager, Position, Rect, Size, WebviewUrl,
    webview::WebviewBuilder,
};

/// Delay between the panel collapsing and the toggle strip reappearing,
/// standing in for the close animation finishing.
pub(crate) const SETTLE_MS: u64 = 300;

/// Logical size of the floating toggle strip.
const TOGGLE_WIDTH: f64 = 28.0;
const TOGGLE_HEIGHT: f64 = 48.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Visibility {
    Open,
    Closed,
}

impl Visibility {
    fn flipped(self) -> Self {
        match self {
            Visibility::Open => Visibility::Closed,
            Visibility::Closed => Visibility::Open,
        }
    }
}

/// The single source of truth for panel visibility.
///
/// `settle_gen` increments on every transition so a pending settle timer
/// can detect it was superseded and do nothing; a newer transition always
/// wins, never races.
pub(crate) struct SidebarState {
    visibility: Visibility,
    toggle_visible: bool,
    settle_gen: u64,
}

impl SidebarState {
    pub(crate) fn new() -> Self {
        Self {
            visibility: Visibility::Closed,
            toggle_visible: false,
            settle_gen: 0,
        }
    }

    pub(crate) fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub(crate) fn toggle_visible(&self) -> bool {
        self.toggle_visible
    }

    /// Move to `target`. Returns the new generation, or `None` when the
    /// request is a same-state no-op.
    pub(crate) fn request(&mut self, target: Visibility) -> Option<u64> {
        if self.visibility == target {
            return None;
        }
        self.visibility = target;
        self.toggle_visible = false;
        self.settle_gen += 1;
        Some(self.settle_gen)
    }

    /// Show the toggle strip if the close that scheduled this settle is
    /// still the current transition.
    pub(crate) fn settle(&mut self, generation: u64) -> bool {
        if self.settle_gen == generation && self.visibility == Visibility::Closed {
            self.toggle_visible = true;
            true
        } else {
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Effects
// ---------------------------------------------------------------------------

pub(crate) fn toggle(app: &AppHandle) {
    let target = {
        let state = app.state::<std::sync::Arc<crate::AppState>>();
        let sidebar = state.sidebar.lock();
        sidebar.visibility().flipped()
    };
    match target {
        Visibility::Open => open(app),
        Visibility::Closed => close(app),
    }
}

/// closed -> open: reattach the panel if it was detached, reserve layout
/// space, hide the toggle. A second open is a no-op.
pub(crate) fn open(app: &AppHandle) {
    let state = app.state::<std::sync::Arc<crate::AppState>>();
    if state.sidebar.lock().request(Visibility::Open).is_none() {
        return;
    }
    if let Err(e) = ensure_panel(app) {
        tracing::warn!("could not attach panel webview: {e}");
        return;
    }
    if let Err(e) = apply_layout(app) {
        tracing::warn!("could not apply open layout: {e}");
    }
}

/// open -> closed: collapse the panel immediately, then show the toggle
/// after the settle delay unless a newer transition supersedes it.
pub(crate) fn close(app: &AppHandle) {
    let state = app.state::<std::sync::Arc<crate::AppState>>();
    let Some(generation) = state.sidebar.lock().request(Visibility::Closed) else {
        return;
    };

    if state.config.read().detach_on_close {
        if let Some(panel) = app.get_webview(crate::PANEL_WEBVIEW) {
            if let Err(e) = panel.close() {
                tracing::warn!("could not detach panel webview: {e}");
            }
        }
    }
    if let Err(e) = apply_layout(app) {
        tracing::warn!("could not apply closed layout: {e}");
    }

    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(SETTLE_MS)).await;
        let state = app.state::<std::sync::Arc<crate::AppState>>();
        let settled = state.sidebar.lock().settle(generation);
        if settled {
            if let Err(e) = apply_layout(&app) {
                tracing::warn!("could not show toggle: {e}");
            }
        }
    });
}

/// Attach the panel webview if it is not already attached. Presence of the
/// webview itself is the guard, so a second call cannot create a duplicate.
fn ensure_panel(app: &AppHandle) -> tauri::Result<()> {
    if app.get_webview(crate::PANEL_WEBVIEW).is_some() {
        return Ok(());
    }
    let window = app
        .get_window(crate::MAIN_WINDOW)
        .ok_or_else(|| tauri::Error::WindowNotFound)?;
    window.add_child(
        WebviewBuilder::new(crate::PANEL_WEBVIEW, WebviewUrl::App("index.html".into())),
        Position::Logical(LogicalPosition { x: 0.0, y: 0.0 }),
        Size::Logical(LogicalSize {
            width: 1.0,
            height: 1.0,
        }),
    )?;
    Ok(())
}

/// Position the three webviews for the current visibility. Safe to call on
/// every resize; collapsed webviews get zero-width bounds rather than
/// being destroyed.
pub(crate) fn apply_layout(app: &AppHandle) -> tauri::Result<()> {
    let window = app
        .get_window(crate::MAIN_WINDOW)
        .ok_or_else(|| tauri::Error::WindowNotFound)?;
    let scale_factor = window.scale_factor()?;
    let physical = window.inner_size()?;
    let width = (physical.width as f64 / scale_factor).max(0.0).floor();
    let height = (physical.height as f64 / scale_factor).max(0.0).floor();

    let state = app.state::<std::sync::Arc<crate::AppState>>();
    let panel_width = state.config.read().panel_width;
    let (visibility, show_toggle) = {
        let sidebar = state.sidebar.lock();
        (sidebar.visibility(), sidebar.toggle_visible())
    };

    let reserved = match visibility {
        Visibility::Open => panel_width.min(width),
        Visibility::Closed => 0.0,
    };

    if let Some(chat) = app.get_webview(crate::CHAT_WEBVIEW) {
        chat.set_bounds(logical_rect(0.0, 0.0, width - reserved, height))?;
    }
    if let Some(panel) = app.get_webview(crate::PANEL_WEBVIEW) {
        panel.set_bounds(logical_rect(width - reserved, 0.0, reserved, height))?;
    }
    if let Some(toggle) = app.get_webview(crate::TOGGLE_WEBVIEW) {
        let bounds = if show_toggle {
            logical_rect(
                width - TOGGLE_WIDTH,
                ((height - TOGGLE_HEIGHT) / 2.0).max(0.0),
                TOGGLE_WIDTH,
                TOGGLE_HEIGHT,
            )
        } else {
            logical_rect(width, 0.0, 0.0, 0.0)
        };
        toggle.set_bounds(bounds)?;
    }

    Ok(())
}

fn logical_rect(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect {
        position: Position::Logical(LogicalPosition { x, y }),
        size: Size::Logical(LogicalSize { width, height }),
    }
}

/// Toggle strip and menu entry point.
#[tauri::command]
pub(crate) fn toggle_sidebar(app: AppHandle) {
    toggle(&app);
}
