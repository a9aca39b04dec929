//! Settings persistence using TOML
//!
//! Stores settings in ~/.config/expertris/settings.toml (or platform equivalent)

use crate::mode::{GameMode, Rules};
use anyhow::{Context, Result};
use chrono::Local;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Entries kept per mode
const HIGH_SCORES_KEPT: usize = 10;

/// Game settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Keybindings
    pub keys: KeyBindings,
    /// Gameplay settings
    pub gameplay: GameplaySettings,
    /// Audio settings
    pub audio: AudioSettings,
    /// High scores
    pub high_scores: HighScores,
}

/// Key bindings (stored as strings for easy editing)
/// Each action can have one or more keys bound to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub rotate: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub pause: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub start: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub reset: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub transfer_to_reserve: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub use_reserve: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub generate_next: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub show_stats: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub optimize_queue: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub suggest: Vec<String>,
    #[serde(deserialize_with = "deserialize_keys", serialize_with = "serialize_keys")]
    pub quit: Vec<String>,
}

/// Deserialize keys as either a single string or array of strings
fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeysVisitor;

    impl<'de> Visitor<'de> for KeysVisitor {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or array of strings")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            let mut keys = Vec::new();
            while let Some(key) = seq.next_element::<String>()? {
                keys.push(key);
            }
            Ok(keys)
        }
    }

    deserializer.deserialize_any(KeysVisitor)
}

/// Serialize keys: single key as string, multiple as array
fn serialize_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq;

    if let [key] = keys {
        serializer.serialize_str(key)
    } else {
        let mut seq = serializer.serialize_seq(Some(keys.len()))?;
        for key in keys {
            seq.serialize_element(key)?;
        }
        seq.end()
    }
}

/// Gameplay settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GameplaySettings {
    /// Delayed Auto Shift in milliseconds
    pub das_ms: u64,
    /// Auto Repeat Rate in milliseconds
    pub arr_ms: u64,
    /// Draw the landing preview
    pub show_ghost: bool,
    pub rules: Rules,
}

/// Audio settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub enabled: bool,
    /// Effect volume (0-100)
    pub volume: u32,
}

/// High scores for each mode
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HighScores {
    pub marathon: Vec<ScoreEntry>,
    pub relax: Vec<ScoreEntry>,
}

/// A single high score entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreEntry {
    pub score: u64,
    pub lines: u32,
    pub level: u32,
    pub expert_points: u64,
    /// Date as ISO string
    pub date: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |list: &[&str]| list.iter().map(|k| k.to_string()).collect::<Vec<_>>();
        Self {
            move_left: keys(&["Left", "a"]),
            move_right: keys(&["Right", "d"]),
            soft_drop: keys(&["Down", "s"]),
            hard_drop: keys(&["Space"]),
            rotate: keys(&["Up", "w"]),
            pause: keys(&["p", "Esc"]),
            start: keys(&["Enter"]),
            reset: keys(&["r"]),
            transfer_to_reserve: keys(&["c"]),
            use_reserve: keys(&["v"]),
            generate_next: keys(&["g"]),
            show_stats: keys(&["i"]),
            optimize_queue: keys(&["o"]),
            suggest: keys(&["h"]),
            quit: keys(&["q"]),
        }
    }
}

impl Default for GameplaySettings {
    fn default() -> Self {
        Self {
            das_ms: 170,
            arr_ms: 50,
            show_ghost: true,
            rules: Rules::default(),
        }
    }
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            volume: 50,
        }
    }
}

impl HighScores {
    pub fn for_mode(&self, mode: GameMode) -> &[ScoreEntry] {
        match mode {
            GameMode::Marathon => &self.marathon,
            GameMode::Relax => &self.relax,
        }
    }

    fn for_mode_mut(&mut self, mode: GameMode) -> &mut Vec<ScoreEntry> {
        match mode {
            GameMode::Marathon => &mut self.marathon,
            GameMode::Relax => &mut self.relax,
        }
    }
}

impl Settings {
    /// Get the config directory path
    fn config_dir() -> Option<PathBuf> {
        ProjectDirs::from("com", "expertris", "expertris")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.toml"))
    }

    /// Load settings from the config directory, or fall back to defaults
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load settings from a file; missing or broken files give defaults
    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        match toml::from_str(&contents) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("ignoring invalid settings file {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Save settings to the config directory
    pub fn save(&self) -> Result<()> {
        let path = Self::settings_path().context("could not determine config directory")?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("failed to create config dir {}", dir.display()))?;
        }
        let contents = toml::to_string_pretty(self).context("failed to serialize settings")?;
        fs::write(path, contents)
            .with_context(|| format!("failed to write settings to {}", path.display()))?;
        Ok(())
    }

    /// Record a finished game, keeping the best entries per mode
    pub fn add_score(&mut self, mode: GameMode, score: u64, lines: u32, level: u32, expert_points: u64) {
        let entries = self.high_scores.for_mode_mut(mode);
        entries.push(ScoreEntry {
            score,
            lines,
            level,
            expert_points,
            date: today(),
        });
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(HIGH_SCORES_KEPT);
    }

    pub fn best(&self, mode: GameMode) -> Option<u64> {
        self.high_scores.for_mode(mode).first().map(|e| e.score)
    }
}

/// Local date as YYYY-MM-DD
fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::GeneratorKind;
    use chrono::NaiveDate;

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings: Settings = toml::from_str(
            r#"
            [keys]
            rotate = "x"

            [gameplay.rules]
            mode = "relax"
            "#,
        )
        .unwrap();

        assert_eq!(settings.keys.rotate, vec!["x".to_string()]);
        assert_eq!(settings.keys.move_left, KeyBindings::default().move_left);
        assert_eq!(settings.gameplay.rules.mode, GameMode::Relax);
        assert_eq!(settings.gameplay.rules.base_drop_ms, 1000);
        assert_eq!(settings.gameplay.das_ms, 170);
        assert!(settings.audio.enabled);
        assert!(settings.high_scores.marathon.is_empty());
    }

    #[test]
    fn test_empty_file_is_default() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.keys, KeyBindings::default());
        assert_eq!(settings.gameplay.rules, Rules::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = std::env::temp_dir().join(format!("expertris-settings-{}", std::process::id()));
        let path = dir.join("settings.toml");

        let mut settings = Settings::default();
        settings.gameplay.rules.generator = GeneratorKind::SevenBag;
        settings.gameplay.rules.seed = Some(42);
        settings.add_score(GameMode::Marathon, 1200, 12, 2, 5000);
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path);
        assert_eq!(loaded.gameplay.rules, settings.gameplay.rules);
        assert_eq!(loaded.best(GameMode::Marathon), Some(1200));
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("expertris-does-not-exist/settings.toml");
        let settings = Settings::load_from(&path);
        assert_eq!(settings.gameplay.rules, Rules::default());
    }

    #[test]
    fn test_high_scores_sorted_and_capped() {
        let mut settings = Settings::default();
        for score in 0..15u64 {
            settings.add_score(GameMode::Relax, score * 100, 0, 1, 0);
        }
        let relax = settings.high_scores.for_mode(GameMode::Relax);
        assert_eq!(relax.len(), HIGH_SCORES_KEPT);
        assert_eq!(relax[0].score, 1400);
        assert_eq!(relax[9].score, 500);
        assert_eq!(settings.best(GameMode::Marathon), None);
    }

    #[test]
    fn test_score_entries_carry_calendar_date() {
        let mut settings = Settings::default();
        let before = Local::now().date_naive();
        settings.add_score(GameMode::Marathon, 1200, 12, 2, 900);
        let after = Local::now().date_naive();

        let entry = &settings.high_scores.for_mode(GameMode::Marathon)[0];
        let date = NaiveDate::parse_from_str(&entry.date, "%Y-%m-%d").unwrap();
        assert!(date == before || date == after);
    }
}
