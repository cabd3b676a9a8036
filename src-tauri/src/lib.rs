pub(crate) mod bridge;
pub(crate) mod catalog;
pub(crate) mod config;
pub(crate) mod injector;
pub(crate) mod panel;
pub(crate) mod sidebar;
pub(crate) mod state;

use std::sync::Arc;
use tauri::{
    LogicalPosition, LogicalSize, Manager, Position, Size, WebviewUrl, WindowEvent,
    webview::{NewWindowResponse, WebviewBuilder},
};
use tauri_plugin_global_shortcut::{GlobalShortcutExt, ShortcutState};
use tauri_plugin_opener::OpenerExt;

pub(crate) use state::AppState;

pub(crate) const MAIN_WINDOW: &str = "main";
/// The embedded panel sub-document. Only messages from this webview are
/// accepted by the bridge.
pub(crate) const PANEL_WEBVIEW: &str = "panel";
/// The third-party chat page. Its DOM is not ours.
pub(crate) const CHAT_WEBVIEW: &str = "chat";
/// Floating strip shown only while the panel is closed.
pub(crate) const TOGGLE_WEBVIEW: &str = "toggle";

/// Desktop Safari user agent; some chat services degrade or block
/// embedded-webview user agents.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15";

/// Login popups must stay inside the app so session cookies land in the
/// chat webview's store; anything else goes to the default browser.
fn is_auth_popup(url: &url::Url) -> bool {
    let url_str = url.as_str().to_lowercase();
    if url_str.is_empty() || url_str == "about:blank" {
        return true;
    }
    if ["oauth", "sso", "signin", "login", "authorize"]
        .iter()
        .any(|needle| url_str.contains(needle))
    {
        return true;
    }
    const AUTH_HOST_SUFFIXES: [&str; 4] = [
        "accounts.google.com",
        "login.microsoftonline.com",
        "appleid.apple.com",
        "auth0.com",
    ];
    if let Some(host) = url.host_str() {
        let host = host.to_lowercase();
        return AUTH_HOST_SUFFIXES
            .iter()
            .any(|suffix| host == *suffix || host.ends_with(&format!(".{suffix}")));
    }
    false
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "promptdock=info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app_config = config::load_app_config();
    let state = Arc::new(AppState::new(app_config));

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .plugin(tauri_plugin_global_shortcut::Builder::new().build())
        .plugin(tauri_plugin_window_state::Builder::new().build())
        .plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            if let Some(window) = app.get_window(MAIN_WINDOW) {
                let _ = window.unminimize();
                let _ = window.set_focus();
            }
        }))
        .manage(state)
        .setup(|app| {
            let handle = app.handle().clone();
            let cfg = app
                .state::<Arc<AppState>>()
                .config
                .read()
                .clone();

            let window = tauri::window::WindowBuilder::new(app, MAIN_WINDOW)
                .title("PromptDock")
                .inner_size(1280.0, 860.0)
                .min_inner_size(720.0, 480.0)
                .visible(false)
                .build()?;

            let chat_url: url::Url = cfg.chat_url.parse().unwrap_or_else(|e| {
                tracing::warn!("invalid chat_url {:?}: {e}; using default", cfg.chat_url);
                config::AppConfig::default()
                    .chat_url
                    .parse()
                    .expect("default chat URL is valid")
            });

            let opener_handle = handle.clone();
            let chat_builder = WebviewBuilder::new(CHAT_WEBVIEW, WebviewUrl::External(chat_url))
                .user_agent(USER_AGENT)
                .on_new_window(move |url, _features| {
                    if is_auth_popup(&url) {
                        return NewWindowResponse::Allow;
                    }
                    match opener_handle.opener().open_url(url.to_string(), None::<&str>) {
                        Ok(_) => NewWindowResponse::Deny,
                        Err(_) => NewWindowResponse::Allow,
                    }
                });
            window.add_child(
                chat_builder,
                Position::Logical(LogicalPosition { x: 0.0, y: 0.0 }),
                Size::Logical(LogicalSize {
                    width: 1.0,
                    height: 1.0,
                }),
            )?;

            window.add_child(
                WebviewBuilder::new(
                    TOGGLE_WEBVIEW,
                    WebviewUrl::App("index.html?view=toggle".into()),
                ),
                Position::Logical(LogicalPosition { x: 0.0, y: 0.0 }),
                Size::Logical(LogicalSize {
                    width: 1.0,
                    height: 1.0,
                }),
            )?;

            // The panel itself attaches through sidebar::open, whose
            // presence check is the only creation path.
            sidebar::open(&handle);

            // Activation trigger: a registration failure downgrades to
            // "no shortcut", it never takes the app down.
            if let Err(e) = app.global_shortcut().on_shortcut(
                cfg.shortcut.as_str(),
                |app, _shortcut, event| {
                    if event.state() == ShortcutState::Pressed {
                        sidebar::toggle(app);
                    }
                },
            ) {
                tracing::warn!("could not register global shortcut {:?}: {e}", cfg.shortcut);
            }

            window.show()?;
            Ok(())
        })
        .on_window_event(|window, event| {
            if window.label() != MAIN_WINDOW {
                return;
            }
            let relayout = matches!(
                event,
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. }
            );
            if relayout {
                if let Err(e) = sidebar::apply_layout(window.app_handle()) {
                    tracing::warn!("failed to apply layout: {e}");
                }
            }
        })
        .invoke_handler(tauri::generate_handler![
            panel::panel_snapshot,
            panel::panel_select_template,
            panel::panel_set_text,
            panel::panel_run,
            bridge::panel_message,
            sidebar::toggle_sidebar,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popup(s: &str) -> bool {
        is_auth_popup(&s.parse().unwrap())
    }

    #[test]
    fn auth_hosts_stay_in_app() {
        assert!(popup("https://accounts.google.com/o/oauth2/v2/auth"));
        assert!(popup("https://tenant.auth0.com/login"));
        assert!(popup("https://example.com/oauth/callback"));
        assert!(popup("https://example.com/signin?next=/"));
    }

    #[test]
    fn ordinary_links_go_to_the_browser() {
        assert!(!popup("https://example.com/docs"));
        assert!(!popup("https://openai.com/pricing"));
    }

    #[test]
    fn lookalike_hosts_are_not_auth() {
        assert!(!popup("https://accounts.google.com.evil.example/"));
    }
}
