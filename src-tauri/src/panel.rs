//! Panel Controller: all user-facing state of the preset panel.
//!
//! The panel webview is a thin renderer; the selected template, free text,
//! derived preview and submit preconditions all live here. The webview
//! receives a [`PanelSnapshot`] after every interaction and draws it.

use serde::Serialize;
use std::sync::Arc;
use tauri::{AppHandle, Emitter, State};

use crate::bridge::{self, PanelMessage};
use crate::catalog::{self, Template};
use crate::config::{self, SessionPrefs};
use crate::state::AppState;

/// Shown in the preview box until a preset is selected and text entered.
pub(crate) const PREVIEW_PLACEHOLDER: &str =
    "(Select a preset and type your content to see a preview)";

/// How long the Run control stays disabled after a dispatch. There is no
/// acknowledgment channel from the injection side, so re-enabling is an
/// optimistic timeout, not a confirmation.
pub(crate) const RUN_REARM_MS: u64 = 800;

/// Advisory auto-hide for transient status messages.
pub(crate) const STATUS_HIDE_MS: u64 = 3500;

/// Event pushed to the panel webview when backend state changes without a
/// command round trip (currently only the run re-arm). Payload is a
/// [`PanelSnapshot`].
pub(crate) const PANEL_REFRESH_EVENT: &str = "panel-refresh";

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// One panel session: catalog plus the user's working state.
pub(crate) struct PanelSession {
    catalog: Vec<Template>,
    catalog_error: Option<String>,
    selected: Option<String>,
    user_text: String,
    in_flight: bool,
    initialized: bool,
}

/// Why a Run was refused.
#[derive(Debug, PartialEq)]
pub(crate) enum RunBlock {
    NoTemplate,
    EmptyText,
    /// A dispatch is already in flight; the duplicate is dropped silently.
    Busy,
}

impl PanelSession {
    pub(crate) fn new() -> Self {
        Self {
            catalog: Vec::new(),
            catalog_error: None,
            selected: None,
            user_text: String::new(),
            in_flight: false,
            initialized: false,
        }
    }

    /// Install the catalog loaded for this session. On failure the selector
    /// stays unusable but the rest of the panel keeps working.
    pub(crate) fn load(&mut self, catalog: Result<Vec<Template>, String>) {
        match catalog {
            Ok(templates) => {
                self.catalog = templates;
                self.catalog_error = None;
            }
            Err(e) => {
                self.catalog = Vec::new();
                self.catalog_error = Some(e);
            }
        }
        self.initialized = true;
    }

    pub(crate) fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Reapply the previous session's selection and text. A template id
    /// that no longer exists in the freshly loaded catalog is dropped; the
    /// text is restored verbatim.
    pub(crate) fn restore(&mut self, prefs: &SessionPrefs) {
        if !prefs.last_template_id.is_empty()
            && self.catalog.iter().any(|t| t.id == prefs.last_template_id)
        {
            self.selected = Some(prefs.last_template_id.clone());
        }
        if !prefs.last_user_text.is_empty() {
            self.user_text = prefs.last_user_text.clone();
        }
    }

    /// Select a template by id. Unknown ids leave the selection unchanged.
    pub(crate) fn select(&mut self, id: &str) -> bool {
        if self.catalog.iter().any(|t| t.id == id) {
            self.selected = Some(id.to_string());
            true
        } else {
            false
        }
    }

    pub(crate) fn set_text(&mut self, text: String) {
        self.user_text = text;
    }

    pub(crate) fn selected_template(&self) -> Option<&Template> {
        let id = self.selected.as_deref()?;
        self.catalog.iter().find(|t| t.id == id)
    }

    /// The assembled prompt: template body followed by the trimmed text.
    /// `None` unless a template is selected and the trimmed text is
    /// non-empty; nothing is ever dispatched otherwise.
    pub(crate) fn assemble(&self) -> Option<String> {
        let template = self.selected_template()?;
        let trimmed = self.user_text.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(format!("{}{}", template.body, trimmed))
    }

    /// Recomputed on every change; rendering it has no persistence effect.
    pub(crate) fn preview(&self) -> String {
        self.assemble()
            .unwrap_or_else(|| PREVIEW_PLACEHOLDER.to_string())
    }

    /// Validate and arm a Run. Order matters: template first, then text.
    pub(crate) fn begin_run(&mut self) -> Result<String, RunBlock> {
        if self.in_flight {
            return Err(RunBlock::Busy);
        }
        if self.selected_template().is_none() {
            return Err(RunBlock::NoTemplate);
        }
        let prompt = self.assemble().ok_or(RunBlock::EmptyText)?;
        self.in_flight = true;
        Ok(prompt)
    }

    pub(crate) fn finish_run(&mut self) {
        self.in_flight = false;
    }

    fn snapshot(&self) -> PanelSnapshot {
        PanelSnapshot {
            templates: self.catalog.clone(),
            catalog_error: self.catalog_error.clone(),
            selected_id: self.selected.clone(),
            description: self
                .selected_template()
                .map(|t| t.description.clone())
                .unwrap_or_default(),
            user_text: self.user_text.clone(),
            char_count: self.user_text.chars().count(),
            preview: self.preview(),
            in_flight: self.in_flight,
        }
    }
}

// ---------------------------------------------------------------------------
// IPC surface
// ---------------------------------------------------------------------------

/// Everything the panel webview needs to render.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PanelSnapshot {
    pub(crate) templates: Vec<Template>,
    pub(crate) catalog_error: Option<String>,
    pub(crate) selected_id: Option<String>,
    pub(crate) description: String,
    pub(crate) user_text: String,
    pub(crate) char_count: usize,
    pub(crate) preview: String,
    pub(crate) in_flight: bool,
}

#[derive(Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Severity {
    Success,
    Error,
}

/// A transient status line for the panel, with a focus hint for validation
/// failures.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PanelStatus {
    pub(crate) message: String,
    pub(crate) severity: Severity,
    pub(crate) focus: Option<&'static str>,
    pub(crate) auto_hide_ms: u64,
}

impl PanelStatus {
    fn error(message: &str, focus: Option<&'static str>) -> Self {
        Self {
            message: message.to_string(),
            severity: Severity::Error,
            focus,
            auto_hide_ms: STATUS_HIDE_MS,
        }
    }

    fn success(message: &str) -> Self {
        Self {
            message: message.to_string(),
            severity: Severity::Success,
            focus: None,
            auto_hide_ms: STATUS_HIDE_MS,
        }
    }
}

/// Clear the in-flight flag and produce the snapshot the panel webview
/// should redraw from.
pub(crate) fn rearm(state: &AppState) -> PanelSnapshot {
    let mut panel = state.panel.lock();
    panel.finish_run();
    panel.snapshot()
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RunOutcome {
    pub(crate) snapshot: PanelSnapshot,
    pub(crate) status: Option<PanelStatus>,
}

/// First call of a session loads the catalog and restores the previous
/// selection and text; later calls just re-render current state.
#[tauri::command]
pub(crate) async fn panel_snapshot(
    state: State<'_, Arc<AppState>>,
) -> Result<PanelSnapshot, String> {
    let mut panel = state.panel.lock();
    if !panel.is_initialized() {
        panel.load(catalog::load_catalog());
        panel.restore(&config::load_session_prefs());
    }
    Ok(panel.snapshot())
}

/// Template selection persists immediately.
#[tauri::command]
pub(crate) async fn panel_select_template(
    state: State<'_, Arc<AppState>>,
    id: String,
) -> Result<PanelSnapshot, String> {
    let (snapshot, prefs) = {
        let mut panel = state.panel.lock();
        if !panel.select(&id) {
            tracing::warn!("ignoring selection of unknown template {id}");
        }
        (
            panel.snapshot(),
            SessionPrefs {
                last_template_id: panel.selected.clone().unwrap_or_default(),
                last_user_text: panel.user_text.clone(),
            },
        )
    };
    if let Err(e) = config::save_session_prefs(&prefs) {
        tracing::warn!("failed to persist template selection: {e}");
    }
    Ok(snapshot)
}

/// Free text persists on a trailing debounce so a typing burst becomes a
/// single write of the latest value.
#[tauri::command]
pub(crate) async fn panel_set_text(
    state: State<'_, Arc<AppState>>,
    text: String,
) -> Result<PanelSnapshot, String> {
    let (snapshot, prefs) = {
        let mut panel = state.panel.lock();
        panel.set_text(text);
        (
            panel.snapshot(),
            SessionPrefs {
                last_template_id: panel.selected.clone().unwrap_or_default(),
                last_user_text: panel.user_text.clone(),
            },
        )
    };
    state.text_saver.schedule(move || {
        if let Err(e) = config::save_session_prefs(&prefs) {
            tracing::warn!("failed to persist panel text: {e}");
        }
    });
    Ok(snapshot)
}

/// Validate, assemble and dispatch an inject request. The request goes
/// through the same message entry point the panel webview uses, so the
/// wire shape is identical either way.
#[tauri::command]
pub(crate) async fn panel_run(
    app: AppHandle,
    state: State<'_, Arc<AppState>>,
) -> Result<RunOutcome, String> {
    let armed = {
        let mut panel = state.panel.lock();
        panel.begin_run()
    };

    let prompt = match armed {
        Ok(prompt) => prompt,
        Err(block) => {
            let status = match block {
                RunBlock::NoTemplate => {
                    Some(PanelStatus::error("Please select a preset first.", Some("preset-select")))
                }
                RunBlock::EmptyText => {
                    Some(PanelStatus::error("Please type your content or question.", Some("user-input")))
                }
                RunBlock::Busy => None,
            };
            let snapshot = state.panel.lock().snapshot();
            return Ok(RunOutcome { snapshot, status });
        }
    };

    let payload = serde_json::to_value(PanelMessage::InjectPrompt { prompt })
        .map_err(|e| e.to_string())?;
    bridge::handle_message(&app, crate::PANEL_WEBVIEW, payload);

    // Optimistic re-arm: no acknowledgment ever arrives. The webview only
    // redraws from snapshots, so the re-armed one has to be pushed to it;
    // otherwise the run control stays disabled until the next interaction.
    let rearm_state = state.inner().clone();
    let rearm_app = app.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(RUN_REARM_MS)).await;
        let snapshot = rearm(&rearm_state);
        if let Err(e) = rearm_app.emit_to(crate::PANEL_WEBVIEW, PANEL_REFRESH_EVENT, &snapshot) {
            tracing::debug!("could not push re-armed snapshot: {e}");
        }
    });

    let snapshot = state.panel.lock().snapshot();
    Ok(RunOutcome {
        snapshot,
        status: Some(PanelStatus::success("Prompt sent! Check the chat.")),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Template> {
        vec![
            Template {
                id: "a".to_string(),
                label: "Summarize".to_string(),
                description: "Condense the content".to_string(),
                body: "Summarize this: ".to_string(),
            },
            Template {
                id: "b".to_string(),
                label: "Explain".to_string(),
                description: String::new(),
                body: "Explain: ".to_string(),
            },
        ]
    }

    fn session() -> PanelSession {
        let mut s = PanelSession::new();
        s.load(Ok(catalog()));
        s
    }

    // --- assembly ---

    #[test]
    fn assemble_is_body_plus_trimmed_text() {
        let mut s = session();
        s.select("a");
        s.set_text("  report text \n".to_string());
        assert_eq!(s.assemble().unwrap(), "Summarize this: report text");
    }

    #[test]
    fn assemble_does_not_trim_template_body() {
        let mut s = session();
        s.select("a");
        s.set_text(" the attached report".to_string());
        // body keeps its own trailing space; only the user text is trimmed
        assert_eq!(s.assemble().unwrap(), "Summarize this: the attached report");
    }

    #[test]
    fn assemble_none_without_template_or_text() {
        let mut s = session();
        assert!(s.assemble().is_none());
        s.set_text("something".to_string());
        assert!(s.assemble().is_none());
        s.select("a");
        s.set_text("   ".to_string());
        assert!(s.assemble().is_none());
    }

    #[test]
    fn preview_shows_placeholder_until_complete() {
        let mut s = session();
        assert_eq!(s.preview(), PREVIEW_PLACEHOLDER);
        s.select("b");
        assert_eq!(s.preview(), PREVIEW_PLACEHOLDER);
        s.set_text("how do trees grow".to_string());
        assert_eq!(s.preview(), "Explain: how do trees grow");
    }

    // --- validation order and run lifecycle ---

    #[test]
    fn run_blocks_on_missing_template_before_empty_text() {
        let mut s = session();
        assert_eq!(s.begin_run().unwrap_err(), RunBlock::NoTemplate);
    }

    #[test]
    fn run_blocks_on_empty_trimmed_text() {
        let mut s = session();
        s.select("a");
        s.set_text("   \n ".to_string());
        assert_eq!(s.begin_run().unwrap_err(), RunBlock::EmptyText);
    }

    #[test]
    fn run_arms_in_flight_and_blocks_duplicates() {
        let mut s = session();
        s.select("a");
        s.set_text("content".to_string());
        let prompt = s.begin_run().unwrap();
        assert_eq!(prompt, "Summarize this: content");
        assert_eq!(s.begin_run().unwrap_err(), RunBlock::Busy);
        s.finish_run();
        assert!(s.begin_run().is_ok());
    }

    #[test]
    fn rearm_snapshot_reenables_run_control() {
        // The webview renders only what it is handed; the re-armed
        // snapshot must come back with in_flight cleared.
        let state = AppState::new(crate::config::AppConfig::default());
        {
            let mut p = state.panel.lock();
            p.load(Ok(catalog()));
            p.select("a");
            p.set_text("content".to_string());
            p.begin_run().unwrap();
        }
        assert!(state.panel.lock().snapshot().in_flight);
        let snapshot = rearm(&state);
        assert!(!snapshot.in_flight);
        assert!(state.panel.lock().begin_run().is_ok());
    }

    // --- restore ---

    #[test]
    fn restore_reselects_existing_template_and_text() {
        let mut s = session();
        s.restore(&SessionPrefs {
            last_template_id: "b".to_string(),
            last_user_text: " kept verbatim ".to_string(),
        });
        assert_eq!(s.selected.as_deref(), Some("b"));
        assert_eq!(s.user_text, " kept verbatim ");
        assert_eq!(s.snapshot().char_count, " kept verbatim ".chars().count());
    }

    #[test]
    fn restore_drops_stale_template_id() {
        let mut s = session();
        s.restore(&SessionPrefs {
            last_template_id: "gone".to_string(),
            last_user_text: String::new(),
        });
        assert!(s.selected.is_none());
    }

    // --- catalog failure ---

    #[test]
    fn catalog_failure_disables_selector_but_not_panel() {
        let mut s = PanelSession::new();
        s.load(Err("invalid preset catalog".to_string()));
        assert!(s.catalog_error.is_some());
        assert!(!s.select("a"));
        s.set_text("typing still works".to_string());
        assert_eq!(s.begin_run().unwrap_err(), RunBlock::NoTemplate);
    }

    #[test]
    fn select_unknown_id_keeps_previous_selection() {
        let mut s = session();
        assert!(s.select("a"));
        assert!(!s.select("zzz"));
        assert_eq!(s.selected.as_deref(), Some("a"));
    }

    // --- snapshot ---

    #[test]
    fn snapshot_reports_description_of_selection() {
        let mut s = session();
        assert_eq!(s.snapshot().description, "");
        s.select("a");
        assert_eq!(s.snapshot().description, "Condense the content");
    }

    #[test]
    fn snapshot_carries_catalog_in_order() {
        let s = session();
        let snap = s.snapshot();
        let ids: Vec<_> = snap.templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
