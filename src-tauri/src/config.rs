use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::PathBuf;

/// Get the config directory using platform-appropriate location.
///
/// - macOS: `~/Library/Application Support/promptdock/`
/// - Linux: `~/.config/promptdock/` (or `$XDG_CONFIG_HOME`)
/// - Windows: `%APPDATA%/promptdock/`
///
/// Falls back to `~/.promptdock/` if the platform dir is unavailable.
pub(crate) fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("promptdock"))
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".promptdock")
        })
}

/// Load a JSON config file, returning Default if missing or corrupt.
/// A corrupt file is logged instead of silently resetting state.
pub(crate) fn load_json_config<T: DeserializeOwned + Default>(filename: &str) -> T {
    let path = config_dir().join(filename);
    if !path.exists() {
        return T::default();
    }
    let content = match std::fs::read_to_string(&path) {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!("could not read config {}: {e}", path.display());
            return T::default();
        }
    };
    match serde_json::from_str(&content) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!("corrupt config {}: {e}. Using defaults.", path.display());
            T::default()
        }
    }
}

/// Save a JSON config file atomically (temp file + rename).
/// Sets 0600 permissions on Unix.
pub(crate) fn save_json_config<T: Serialize>(filename: &str, config: &T) -> Result<(), String> {
    let dir = config_dir();
    std::fs::create_dir_all(&dir).map_err(|e| format!("Failed to create config directory: {e}"))?;

    let json = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {e}"))?;

    let target = dir.join(filename);
    let temp = dir.join(format!("{}.tmp.{}", filename, std::process::id()));

    std::fs::write(&temp, &json).map_err(|e| format!("Failed to write temp config: {e}"))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&temp, perms)
            .map_err(|e| format!("Failed to set config permissions: {e}"))?;
    }

    // Atomic rename: either the old file or new file exists, never partial
    std::fs::rename(&temp, &target).map_err(|e| {
        let _ = std::fs::remove_file(&temp);
        format!("Failed to commit config: {e}")
    })?;

    Ok(())
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

#[derive(Clone, Serialize, Deserialize)]
pub(crate) struct AppConfig {
    /// URL of the chat service loaded into the host webview
    #[serde(default = "default_chat_url")]
    pub(crate) chat_url: String,
    /// Logical width of the panel webview when open
    #[serde(default = "default_panel_width")]
    pub(crate) panel_width: f64,
    /// Global shortcut that toggles the panel
    #[serde(default = "default_shortcut")]
    pub(crate) shortcut: String,
    /// Close the panel webview entirely when hidden, instead of collapsing it.
    /// Both behaviors leave no visible residue; this one also frees the webview.
    #[serde(default)]
    pub(crate) detach_on_close: bool,
}

fn default_chat_url() -> String {
    "https://chat.openai.com/".to_string()
}

fn default_panel_width() -> f64 {
    320.0
}

fn default_shortcut() -> String {
    "CmdOrCtrl+Shift+Space".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            panel_width: default_panel_width(),
            shortcut: default_shortcut(),
            detach_on_close: false,
        }
    }
}

// ---------------------------------------------------------------------------
// SessionPrefs — last-used preset and free text, restored on panel startup
// ---------------------------------------------------------------------------

/// Key names are part of the storage contract and stay camelCase on disk.
#[derive(Clone, Default, Serialize, Deserialize)]
pub(crate) struct SessionPrefs {
    #[serde(default, rename = "lastTemplateId")]
    pub(crate) last_template_id: String,
    #[serde(default, rename = "lastUserText")]
    pub(crate) last_user_text: String,
}

const APP_CONFIG_FILE: &str = "config.json";
const SESSION_PREFS_FILE: &str = "prefs.json";

/// Read once at startup. The file is edited by hand; there is no settings
/// surface writing it back.
pub(crate) fn load_app_config() -> AppConfig {
    load_json_config(APP_CONFIG_FILE)
}

pub(crate) fn load_session_prefs() -> SessionPrefs {
    load_json_config(SESSION_PREFS_FILE)
}

/// Last-write-wins; only one panel session writes at a time.
pub(crate) fn save_session_prefs(prefs: &SessionPrefs) -> Result<(), String> {
    save_json_config(SESSION_PREFS_FILE, prefs)
}
