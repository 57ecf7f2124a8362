use crate::catalog::Catalog;
use crate::loader::DEFAULT_CACHE_VERSION;
use crate::transform::{Speaker, SpeakerTable};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CURRENT_VERSION: u32 = 2;
const SETTINGS_FILENAME: &str = ".divide_reader.yaml";
const STORE_FILENAME: &str = ".divide_reader_store.json";
pub const SETTINGS_ENV: &str = "DIVIDE_READER_SETTINGS";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YamlSpeaker {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_last_chapter")]
    pub last_chapter: u32,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chapter_names: BTreeMap<u32, String>,

    #[serde(default = "default_cache_version")]
    pub cache_version: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_path: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub speakers: Vec<YamlSpeaker>,

    #[serde(default)]
    pub margin: u16,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_base_url() -> String {
    "https://hyals.ink/divide/ch".to_string()
}

fn default_last_chapter() -> u32 {
    12
}

fn default_cache_version() -> String {
    DEFAULT_CACHE_VERSION.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            base_url: default_base_url(),
            last_chapter: default_last_chapter(),
            chapter_names: BTreeMap::new(),
            cache_version: default_cache_version(),
            store_path: None,
            speakers: Vec::new(),
            margin: 0,
        }
    }
}

impl Settings {
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.last_chapter).with_names(self.chapter_names.clone())
    }

    /// Built-in speakers plus the configured ones; configured entries win.
    pub fn speaker_table(&self) -> SpeakerTable {
        let mut table = SpeakerTable::default();
        for speaker in &self.speakers {
            let label = speaker.label.clone().unwrap_or_else(|| speaker.key.clone());
            table.insert(speaker.key.clone(), Speaker::new(label, speaker.color.clone()));
        }
        table
    }

    pub fn resolved_store_path(&self) -> PathBuf {
        match &self.store_path {
            Some(path) => PathBuf::from(path),
            None => home::home_dir()
                .map(|home| home.join(STORE_FILENAME))
                .unwrap_or_else(|| PathBuf::from(STORE_FILENAME)),
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(SETTINGS_ENV) {
        return Some(PathBuf::from(path));
    }
    home::home_dir().map(|home| home.join(SETTINGS_FILENAME))
}

/// Loads settings from the default location, writing a commented default
/// file on first run. Problems are logged and defaults used.
pub fn load_settings() -> Settings {
    let Some(path) = settings_path() else {
        warn!("Could not determine home directory, using default settings");
        return Settings::default();
    };

    if !path.exists() {
        info!(
            "Settings file not found at {:?}, creating with defaults",
            path
        );
        let settings = Settings::default();
        save_settings_to_file(&settings, &path);
        return settings;
    }

    match load_settings_from_file(&path) {
        Ok(settings) => settings,
        Err(e) => {
            error!("{e}");
            Settings::default()
        }
    }
}

pub fn load_settings_from_file(path: &Path) -> Result<Settings, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut settings: Settings =
        serde_yaml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    debug!("Loaded settings from {:?}", path);

    if settings.version < CURRENT_VERSION {
        migrate_settings(&mut settings);
        save_settings_to_file(&settings, path);
    }
    Ok(settings)
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // v1 kept the chapter cache unversioned; start a fresh cache namespace.
    if settings.version < 2 && settings.cache_version == DEFAULT_CACHE_VERSION {
        settings.cache_version = "v2".to_string();
    }

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    let content = generate_settings_yaml(settings);

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {:?}", path),
        Err(e) => error!("Failed to save settings to {:?}: {}", path, e),
    }
}

fn generate_settings_yaml(settings: &Settings) -> String {
    let mut content = String::new();

    content.push_str(&format!("version: {}\n", settings.version));
    content.push_str(&format!("base_url: {}\n", yaml_scalar(&settings.base_url)));
    content.push_str(&format!("last_chapter: {}\n", settings.last_chapter));
    content.push_str(&format!(
        "cache_version: {}\n",
        yaml_scalar(&settings.cache_version)
    ));
    if let Some(store_path) = &settings.store_path {
        content.push_str(&format!("store_path: {}\n", yaml_scalar(store_path)));
    }
    content.push_str(&format!("margin: {}\n", settings.margin));
    content.push('\n');

    if settings.chapter_names.is_empty() {
        content.push_str("chapter_names: {}\n");
    } else {
        content.push_str("chapter_names:\n");
        for (number, name) in &settings.chapter_names {
            content.push_str(&format!("  {}: {}\n", number, yaml_scalar(name)));
        }
    }
    content.push('\n');

    content.push_str(SPEAKERS_TEMPLATE);

    if settings.speakers.is_empty() {
        content.push_str("speakers: []\n");
    } else {
        content.push_str("speakers:\n");
        for speaker in &settings.speakers {
            content.push_str(&format!("  - key: {}\n", yaml_scalar(&speaker.key)));
            if let Some(label) = &speaker.label {
                content.push_str(&format!("    label: {}\n", yaml_scalar(label)));
            }
            content.push_str(&format!("    color: {}\n", yaml_scalar(&speaker.color)));
        }
    }

    content
}

/// Renders a string as a single-line YAML scalar, quoted and escaped when needed.
fn yaml_scalar(value: &str) -> String {
    match serde_yaml::to_string(value) {
        Ok(yaml) => yaml.trim_end().to_string(),
        Err(e) => {
            warn!("Failed to encode {:?} as YAML: {}", value, e);
            format!("{value:?}")
        }
    }
}

const SPEAKERS_TEMPLATE: &str = r#"# ============================================================================
# Speakers
# ============================================================================
# Lines of the form "[Key] dialogue" are drawn as a dialogue box for known
# speakers. Hya, Lina, Vita and Gaukel are built in; entries here add new
# speakers or override the built-in ones.
#
# Colors: red, blue, green, yellow, purple, orange, cyan
#
# Example:
#   - key: "Oru"
#     label: "Oru the Ferryman"
#     color: "green"

"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn generated_file_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        let mut settings = Settings::default();
        settings.chapter_names.insert(1, "Arrival".to_string());
        settings.speakers.push(YamlSpeaker {
            key: "Oru".to_string(),
            label: None,
            color: "green".to_string(),
        });
        settings.store_path = Some("/tmp/store.json".to_string());

        save_settings_to_file(&settings, &path);
        assert_eq!(load_settings_from_file(&path).unwrap(), settings);
    }

    #[test]
    fn quoted_names_survive_migration_rewrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(
            &path,
            concat!(
                "version: 1\n",
                "chapter_names:\n",
                "  3: 'The \"Gate\"'\n",
                "  4: 'C:\\dir'\n",
                "speakers:\n",
                "  - key: Oru\n",
                "    label: 'Oru \"the\" Ferryman'\n",
                "    color: green\n",
            ),
        )
        .unwrap();

        let first = load_settings_from_file(&path).unwrap();
        let reloaded = load_settings_from_file(&path).unwrap();
        assert_eq!(reloaded, first);
        assert_eq!(reloaded.chapter_names[&3], "The \"Gate\"");
        assert_eq!(reloaded.chapter_names[&4], "C:\\dir");
        assert_eq!(
            reloaded.speakers[0].label.as_deref(),
            Some("Oru \"the\" Ferryman")
        );
    }

    #[test]
    fn missing_fields_take_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "version: 2\nlast_chapter: 40\n").unwrap();

        let settings = load_settings_from_file(&path).unwrap();
        assert_eq!(settings.last_chapter, 40);
        assert_eq!(settings.base_url, default_base_url());
        assert_eq!(settings.catalog().last(), 40);
    }

    #[test]
    fn v1_files_are_migrated_to_a_new_cache_namespace() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "version: 1\ncache_version: \"v1\"\n").unwrap();

        let settings = load_settings_from_file(&path).unwrap();
        assert_eq!(settings.version, CURRENT_VERSION);
        assert_eq!(settings.cache_version, "v2");

        let rewritten = fs::read_to_string(&path).unwrap();
        assert!(rewritten.contains("version: 2"));
    }

    #[test]
    fn configured_speakers_extend_the_table() {
        let mut settings = Settings::default();
        settings.speakers.push(YamlSpeaker {
            key: "Hya".to_string(),
            label: Some("Hya (older)".to_string()),
            color: "purple".to_string(),
        });
        let table = settings.speaker_table();
        assert_eq!(table.get("Hya").unwrap().color, "purple");
        assert_eq!(table.get("Lina").unwrap().color, "blue");
    }

    #[test]
    fn broken_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.yaml");
        fs::write(&path, "last_chapter: [").unwrap();
        assert!(matches!(
            load_settings_from_file(&path),
            Err(SettingsError::Parse { .. })
        ));
    }
}
