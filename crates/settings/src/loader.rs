//! Reading `key=value` settings text.
//!
//! The engine writes all world options on one line:
//! ```text
//! [/Script/Pal.PalGameWorldSettings]
//! OptionSettings=(Difficulty=None,DayTimeSpeedRate=1.000000,ServerName="Default Palworld Server")
//! ```
//! That tuple is expanded into individual settings. Plain `Key=Value` lines
//! are accepted as well; section headers only group lines and do not
//! namespace keys.

use ini::{Ini, ParseOption};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use worldoption_common::{split_fields, strip_parens};

/// Key whose parenthesized value holds the engine's packed option tuple.
const OPTION_SETTINGS_KEY: &str = "OptionSettings";

/// Errors from loading the settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("settings file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("malformed settings in {origin}: {reason}")]
    Parse { origin: String, reason: String },
    #[error("duplicate setting {key:?} in {origin} (keys are case-insensitive)")]
    DuplicateKey { key: String, origin: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One raw setting, with the key spelled as it appeared in the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawSetting {
    pub key: String,
    pub value: String,
}

/// Flat, case-insensitive key/value view of a settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSettings {
    entries: BTreeMap<String, RawSetting>,
}

impl RawSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build settings from in-memory pairs, rejecting case-folded duplicates.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut settings = Self::new();
        for (key, value) in pairs {
            settings.insert(key.into(), value.into(), "<memory>")?;
        }
        Ok(settings)
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&RawSetting> {
        self.entries.get(&normalize(key))
    }

    /// Iterate in normalized key order.
    pub fn iter(&self) -> impl Iterator<Item = &RawSetting> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: String, value: String, origin: &str) -> Result<(), SettingsError> {
        let normalized = normalize(&key);
        if self.entries.contains_key(&normalized) {
            return Err(SettingsError::DuplicateKey {
                key,
                origin: origin.to_string(),
            });
        }
        self.entries.insert(normalized, RawSetting { key, value });
        Ok(())
    }
}

fn normalize(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

/// Load settings from a file on disk.
pub fn load(path: impl AsRef<Path>) -> Result<RawSettings, SettingsError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(SettingsError::NotFound(path.to_path_buf()));
    }
    let origin = path.display().to_string();
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Err(SettingsError::Parse {
                origin,
                reason: "file is not valid UTF-8".into(),
            });
        }
        Err(e) => return Err(e.into()),
    };
    let settings = parse_str(&text, &origin)?;
    info!(path = %path.display(), keys = settings.len(), "loaded settings");
    Ok(settings)
}

/// Parse settings text. `origin` names the source in error messages.
pub fn parse_str(text: &str, origin: &str) -> Result<RawSettings, SettingsError> {
    // Editors on Windows like to prepend a byte order mark.
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let opt = ParseOption {
        enabled_quote: false,
        enabled_escape: false,
        ..ParseOption::default()
    };
    let ini = Ini::load_from_str_opt(text, opt).map_err(|e| SettingsError::Parse {
        origin: origin.to_string(),
        reason: e.to_string(),
    })?;

    let mut settings = RawSettings::new();
    for (section, props) in ini.iter() {
        for (key, value) in props.iter() {
            if key.eq_ignore_ascii_case(OPTION_SETTINGS_KEY) && value.trim_start().starts_with('(') {
                let Some(tuple) = strip_parens(value) else {
                    return Err(parse_error(origin, "option tuple has no closing parenthesis"));
                };
                debug!(section = section.unwrap_or(""), "expanding option tuple");
                expand_tuple(&mut settings, tuple, origin)?;
                continue;
            }
            settings.insert(key.to_string(), value.to_string(), origin)?;
        }
    }
    Ok(settings)
}

fn parse_error(origin: &str, reason: impl Into<String>) -> SettingsError {
    SettingsError::Parse {
        origin: origin.to_string(),
        reason: reason.into(),
    }
}

fn expand_tuple(settings: &mut RawSettings, tuple: &str, origin: &str) -> Result<(), SettingsError> {
    let fields = split_fields(tuple).ok_or_else(|| {
        parse_error(origin, "unbalanced quotes or parentheses in option tuple")
    })?;
    for field in fields {
        let Some((key, value)) = field.split_once('=') else {
            return Err(parse_error(
                origin,
                format!("option field {field:?} is not a key=value pair"),
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(parse_error(
                origin,
                format!("option field {field:?} has an empty key"),
            ));
        }
        settings.insert(key.to_string(), value.trim().to_string(), origin)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENGINE_FILE: &str = r#"; This configuration file is a sample of the default server settings.
[/Script/Pal.PalGameWorldSettings]
OptionSettings=(Difficulty=None,DayTimeSpeedRate=1.000000,bIsMultiplay=False,ServerName="Default Palworld Server",ServerDescription="",PublicPort=8211)
"#;

    #[test]
    fn load_missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("PalWorldSettings.ini");
        match load(&path) {
            Err(SettingsError::NotFound(p)) => assert_eq!(p, path),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn load_directory_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(matches!(load(tmp.path()), Err(SettingsError::NotFound(_))));
    }

    #[test]
    fn engine_tuple_is_expanded() {
        let settings = parse_str(ENGINE_FILE, "test").unwrap();
        assert_eq!(settings.len(), 6);
        assert_eq!(settings.get("Difficulty").unwrap().value, "None");
        assert_eq!(settings.get("DayTimeSpeedRate").unwrap().value, "1.000000");
        assert_eq!(
            settings.get("ServerName").unwrap().value,
            "\"Default Palworld Server\""
        );
        assert_eq!(settings.get("ServerDescription").unwrap().value, "\"\"");
        assert!(settings.get("OptionSettings").is_none());
    }

    #[test]
    fn quoted_commas_stay_in_value() {
        let text = "OptionSettings=(ServerName=\"Pals, Inc.\",PublicPort=8211)\n";
        let settings = parse_str(text, "test").unwrap();
        assert_eq!(settings.get("servername").unwrap().value, "\"Pals, Inc.\"");
        assert_eq!(settings.len(), 2);
    }

    #[test]
    fn flat_lines_and_comments() {
        let text = "# comment\n\n; another\nDifficulty=Normal\nbIsMultiplay = true\n";
        let settings = parse_str(text, "test").unwrap();
        assert_eq!(settings.len(), 2);
        assert_eq!(settings.get("bismultiplay").unwrap().value, "true");
        assert_eq!(settings.get("BISMULTIPLAY").unwrap().key, "bIsMultiplay");
    }

    #[test]
    fn keys_unique_after_case_folding() {
        let text = "ExpRate=1.0\nexprate=2.0\n";
        match parse_str(text, "test") {
            Err(SettingsError::DuplicateKey { key, .. }) => assert_eq!(key, "exprate"),
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn tuple_and_flat_duplicate_detected() {
        let text = "OptionSettings=(ExpRate=1.0)\nEXPRATE=2.0\n";
        assert!(matches!(
            parse_str(text, "test"),
            Err(SettingsError::DuplicateKey { .. })
        ));
    }

    #[test]
    fn line_without_separator_is_parse_error() {
        let text = "[Section]\nGood=1\nthis line has no separator\n";
        assert!(matches!(
            parse_str(text, "test"),
            Err(SettingsError::Parse { .. })
        ));
    }

    #[test]
    fn tuple_field_without_separator_is_parse_error() {
        let text = "OptionSettings=(Difficulty=None,broken,ExpRate=1.0)\n";
        match parse_str(text, "test") {
            Err(SettingsError::Parse { reason, .. }) => assert!(reason.contains("broken")),
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    fn expect_parse_error(text: &str) -> String {
        match parse_str(text, "test") {
            Err(SettingsError::Parse { reason, .. }) => reason,
            other => panic!("expected Parse for {text:?}, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_quote_in_tuple_is_parse_error() {
        let reason = expect_parse_error(
            "OptionSettings=(ServerName=\"My Server,ExpRate=2.0,bIsPvP=maybe)\n",
        );
        assert!(reason.contains("unbalanced"));
    }

    #[test]
    fn unclosed_paren_in_tuple_is_parse_error() {
        expect_parse_error("OptionSettings=(CrossplayPlatforms=(Steam,ExpRate=2.0,bIsPvP=maybe)\n");
    }

    #[test]
    fn stray_close_paren_in_tuple_is_parse_error() {
        expect_parse_error("OptionSettings=(ExpRate=2.0),bIsPvP=true)\n");
    }

    #[test]
    fn tuple_without_closing_paren_is_parse_error() {
        let reason = expect_parse_error("OptionSettings=(ExpRate=2.0,bIsPvP=true\n");
        assert!(reason.contains("closing parenthesis"));
    }

    #[test]
    fn balanced_nested_tuple_still_expands() {
        let text = "OptionSettings=(CrossplayPlatforms=(Steam,Xbox),ServerName=\"a (b)\")\n";
        let settings = parse_str(text, "test").unwrap();
        assert_eq!(settings.get("CrossplayPlatforms").unwrap().value, "(Steam,Xbox)");
        assert_eq!(settings.get("ServerName").unwrap().value, "\"a (b)\"");
    }

    #[test]
    fn byte_order_mark_ignored() {
        let settings = parse_str("\u{feff}ExpRate=2.0\n", "test").unwrap();
        assert_eq!(settings.get("ExpRate").unwrap().value, "2.0");
    }

    #[test]
    fn load_from_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("PalWorldSettings.ini");
        std::fs::write(&path, ENGINE_FILE).unwrap();
        let settings = load(&path).unwrap();
        assert_eq!(settings.get("PublicPort").unwrap().value, "8211");
    }

    #[test]
    fn invalid_utf8_file_is_parse_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("PalWorldSettings.ini");
        std::fs::write(&path, [0xff, 0xfe, b'A', b'=', b'1', b'\n']).unwrap();
        match load(&path) {
            Err(SettingsError::Parse { origin, reason }) => {
                assert_eq!(origin, path.display().to_string());
                assert!(reason.contains("UTF-8"));
            }
            other => panic!("expected Parse, got {other:?}"),
        }
    }

    #[test]
    fn from_pairs_rejects_duplicates() {
        let settings = RawSettings::from_pairs([("A", "1"), ("B", "2")]).unwrap();
        assert_eq!(settings.len(), 2);
        assert!(RawSettings::from_pairs([("A", "1"), ("a", "2")]).is_err());
    }
}
