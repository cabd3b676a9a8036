//! Template catalog: the ordered list of preset prompts the panel offers.
//!
//! Loaded once per panel session from `presets.json` in the config dir.
//! When no user file exists the bundled default catalog is used, so a fresh
//! install always has working presets. A user file that exists but cannot be
//! parsed is an error the panel surfaces as a non-blocking status.

use serde::{Deserialize, Serialize};

/// A reusable prompt prefix. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct Template {
    pub(crate) id: String,
    pub(crate) label: String,
    #[serde(default)]
    pub(crate) description: String,
    /// The text prepended to the user's input. Older preset files call
    /// this field `template`.
    #[serde(alias = "template")]
    pub(crate) body: String,
}

#[derive(Deserialize)]
struct CatalogFile {
    prompts: Vec<Template>,
}

/// Catalog compiled into the binary; used when the user has no presets.json.
const DEFAULT_CATALOG: &str = include_str!("../presets/default.json");

const PRESETS_FILE: &str = "presets.json";

/// Parse a catalog file, preserving the order of entries.
pub(crate) fn parse_catalog(json: &str) -> Result<Vec<Template>, String> {
    let file: CatalogFile =
        serde_json::from_str(json).map_err(|e| format!("invalid preset catalog: {e}"))?;
    Ok(file.prompts)
}

/// Load the catalog for one panel session.
///
/// User file takes precedence; absence of the file is not an error. The
/// bundled default must always parse, so a failure there is a build defect
/// and panics at first use rather than producing an empty selector.
pub(crate) fn load_catalog() -> Result<Vec<Template>, String> {
    let path = crate::config::config_dir().join(PRESETS_FILE);
    if path.exists() {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("could not read {}: {e}", path.display()))?;
        return parse_catalog(&content);
    }
    Ok(parse_catalog(DEFAULT_CATALOG).expect("bundled preset catalog is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_parses_and_is_nonempty() {
        let templates = parse_catalog(DEFAULT_CATALOG).unwrap();
        assert!(!templates.is_empty());
        // ids must be unique for restore-by-id to be unambiguous
        let mut ids: Vec<_> = templates.iter().map(|t| t.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), templates.len());
    }

    #[test]
    fn parse_preserves_order() {
        let json = r#"{"prompts":[
            {"id":"b","label":"B","body":"b: "},
            {"id":"a","label":"A","body":"a: "},
            {"id":"c","label":"C","body":"c: "}
        ]}"#;
        let templates = parse_catalog(json).unwrap();
        let ids: Vec<_> = templates.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }

    #[test]
    fn parse_accepts_legacy_template_field() {
        let json = r#"{"prompts":[{"id":"x","label":"X","description":"d","template":"Summarize this: "}]}"#;
        let templates = parse_catalog(json).unwrap();
        assert_eq!(templates[0].body, "Summarize this: ");
    }

    #[test]
    fn parse_defaults_missing_description() {
        let json = r#"{"prompts":[{"id":"x","label":"X","body":"x"}]}"#;
        let templates = parse_catalog(json).unwrap();
        assert_eq!(templates[0].description, "");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!(parse_catalog("not json").is_err());
        assert!(parse_catalog(r#"{"prompts": "nope"}"#).is_err());
    }

    #[test]
    fn body_newlines_survive_round_trip() {
        let json = r#"{"prompts":[{"id":"x","label":"X","body":"line one\n\nline two: "}]}"#;
        let templates = parse_catalog(json).unwrap();
        assert_eq!(templates[0].body, "line one\n\nline two: ");
    }
}
