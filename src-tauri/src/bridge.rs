//! Host bridge: validates messages coming out of the panel webview and
//! executes their effects against the chat webview.
//!
//! The panel runs in an isolated webview with no access to the chat page;
//! everything it wants done arrives here as a JSON message. Messages are
//! fire-and-forget: no acknowledgment, no retry. The enum is tagged so an
//! acknowledgment pair could be added later without changing the wire
//! format of the existing messages.

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager};

/// Wire shape of panel-to-bridge messages.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub(crate) enum PanelMessage {
    /// Type the prompt into the chat input and submit it.
    InjectPrompt { prompt: String },
    /// Hide the panel.
    CloseSidebar,
}

/// Validate an inbound message. Anything not from the panel webview, and
/// any payload without a recognized `type`, is discarded silently (logged
/// at debug only, never surfaced).
pub(crate) fn parse_message(origin: &str, payload: &serde_json::Value) -> Option<PanelMessage> {
    if origin != crate::PANEL_WEBVIEW {
        tracing::debug!(origin, "discarding message from unexpected webview");
        return None;
    }
    match PanelMessage::deserialize(payload) {
        Ok(msg) => Some(msg),
        Err(e) => {
            tracing::debug!("discarding unrecognized panel message: {e}");
            None
        }
    }
}

pub(crate) fn handle_message(app: &AppHandle, origin: &str, payload: serde_json::Value) {
    let Some(msg) = parse_message(origin, &payload) else {
        return;
    };
    match msg {
        PanelMessage::InjectPrompt { prompt } => {
            if let Err(e) = inject_and_submit(app, &prompt) {
                // The user's text is still in the panel; nothing is lost.
                tracing::warn!("injection failed: {e}");
            }
        }
        PanelMessage::CloseSidebar => crate::sidebar::close(app),
    }
}

/// Evaluate the injection script in the chat webview. Target-not-found is
/// reported inside the page (a blocking alert); a missing send control
/// degrades to the script's Enter fallback, with no error path out.
pub(crate) fn inject_and_submit(app: &AppHandle, text: &str) -> Result<(), String> {
    let chat = app
        .get_webview(crate::CHAT_WEBVIEW)
        .ok_or_else(|| "chat webview not found".to_string())?;
    chat.eval(&crate::injector::inject_script(text))
        .map_err(|e| e.to_string())
}

/// IPC entry point for the panel webview. The sending webview's label is
/// the origin; it is attached by Tauri, not by the sender, so it cannot be
/// spoofed from page script.
#[tauri::command]
pub(crate) fn panel_message(app: AppHandle, webview: tauri::Webview, payload: serde_json::Value) {
    handle_message(&app, webview.label(), payload);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_inject_prompt() {
        let msg = parse_message(
            crate::PANEL_WEBVIEW,
            &json!({"type": "inject-prompt", "prompt": "Summarize this: report"}),
        );
        assert_eq!(
            msg,
            Some(PanelMessage::InjectPrompt {
                prompt: "Summarize this: report".to_string()
            })
        );
    }

    #[test]
    fn parses_close_sidebar() {
        let msg = parse_message(crate::PANEL_WEBVIEW, &json!({"type": "close-sidebar"}));
        assert_eq!(msg, Some(PanelMessage::CloseSidebar));
    }

    #[test]
    fn wire_shape_matches_protocol() {
        let value = serde_json::to_value(PanelMessage::InjectPrompt {
            prompt: "x".to_string(),
        })
        .unwrap();
        assert_eq!(value, json!({"type": "inject-prompt", "prompt": "x"}));

        let value = serde_json::to_value(PanelMessage::CloseSidebar).unwrap();
        assert_eq!(value, json!({"type": "close-sidebar"}));
    }

    #[test]
    fn discards_message_from_wrong_origin() {
        let msg = parse_message("chat", &json!({"type": "close-sidebar"}));
        assert!(msg.is_none());
    }

    #[test]
    fn discards_unknown_type() {
        let msg = parse_message(crate::PANEL_WEBVIEW, &json!({"type": "self-destruct"}));
        assert!(msg.is_none());
    }

    #[test]
    fn discards_payload_without_type() {
        assert!(parse_message(crate::PANEL_WEBVIEW, &json!({"prompt": "hi"})).is_none());
        assert!(parse_message(crate::PANEL_WEBVIEW, &json!("just a string")).is_none());
        assert!(parse_message(crate::PANEL_WEBVIEW, &json!(null)).is_none());
    }

    #[test]
    fn tolerates_extra_fields() {
        let msg = parse_message(
            crate::PANEL_WEBVIEW,
            &json!({"type": "inject-prompt", "prompt": "hi", "requestId": 7}),
        );
        assert_eq!(
            msg,
            Some(PanelMessage::InjectPrompt {
                prompt: "hi".to_string()
            })
        );
    }
}
