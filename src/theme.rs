use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Storage key for the persisted theme, kept compatible with earlier builds.
const THEME_KEY: &str = "serenim-theme";

/// Visual theme for the whole application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Theme {
    Cosmic,
    Aurora,
    Midnight,
    Ember,
}

impl Default for Theme {
    fn default() -> Self {
        Self::Cosmic
    }
}

/// Settings for the theme particle field, one row per theme.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParticleSettings {
    pub(crate) count: usize,
    pub(crate) base_size: f32,
    pub(crate) base_speed: f32,
    pub(crate) hue_shift: bool,
    pub(crate) base_rgb: (u8, u8, u8),
}

impl Theme {
    pub(crate) fn cycle(self) -> Self {
        let mut themes = Theme::iter().cycle();
        themes.find(|theme| *theme == self);
        themes.next().unwrap_or_default()
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::Cosmic => "Cosmic",
            Self::Aurora => "Aurora",
            Self::Midnight => "Midnight",
            Self::Ember => "Ember",
        }
    }

    pub(crate) fn icon(self) -> &'static str {
        match self {
            Self::Cosmic => "✨",
            Self::Aurora => "🌌",
            Self::Midnight => "🌙",
            Self::Ember => "🔥",
        }
    }

    pub(crate) fn description(self) -> &'static str {
        match self {
            Self::Cosmic => "Deep purple galaxies and nebulae",
            Self::Aurora => "Northern lights with teal and blue",
            Self::Midnight => "Blue night sky with stars",
            Self::Ember => "Warm dark gradients with fire accents",
        }
    }

    pub(crate) fn particle_settings(self) -> ParticleSettings {
        match self {
            Self::Cosmic => ParticleSettings {
                count: 150,
                base_size: 1.5,
                base_speed: 0.4,
                hue_shift: false,
                base_rgb: (139, 92, 246),
            },
            Self::Aurora => ParticleSettings {
                count: 100,
                base_size: 2.0,
                base_speed: 0.2,
                hue_shift: true,
                base_rgb: (20, 184, 166),
            },
            Self::Midnight => ParticleSettings {
                count: 200,
                base_size: 1.0,
                base_speed: 0.3,
                hue_shift: false,
                base_rgb: (59, 130, 246),
            },
            Self::Ember => ParticleSettings {
                count: 80,
                base_size: 2.5,
                base_speed: 0.5,
                hue_shift: true,
                base_rgb: (245, 158, 11),
            },
        }
    }
}

/// Errors that can occur when touching durable theme storage.
#[derive(thiserror::Error, Debug)]
pub(crate) enum ThemeStoreError {
    #[error("no configuration directory available on this system")]
    Unavailable,

    #[error("failed to write theme file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to serialize theme preferences: {0}")]
    Serialize(#[from] serde_yaml::Error),
}

/// On-disk shape of the preference file. The theme is kept as a free-form
/// string so unknown values degrade to the default instead of failing the
/// whole file.
#[derive(Debug, Serialize, Deserialize)]
struct StoredPreferences {
    theme: String,
}

/// Durable single-value store for the selected theme.
pub(crate) struct ThemeStore {
    path: Option<PathBuf>,
}

impl ThemeStore {
    /// Store rooted at the platform configuration directory. A system with
    /// no usable home directory yields a store whose writes fail softly.
    pub(crate) fn open() -> Self {
        let path = ProjectDirs::from("", "", "serenim")
            .map(|dirs| dirs.config_dir().join(format!("{THEME_KEY}.yaml")));
        Self { path }
    }

    /// Store rooted at an explicit file path.
    pub(crate) fn at(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// Read the persisted theme. Missing file, unreadable storage, or an
    /// unrecognized value all fall back to the default theme.
    pub(crate) fn load(&self) -> Theme {
        let Some(path) = &self.path else {
            return Theme::default();
        };
        let Ok(contents) = fs::read_to_string(path) else {
            return Theme::default();
        };
        let Ok(preferences) = serde_yaml::from_str::<StoredPreferences>(&contents) else {
            return Theme::default();
        };
        Theme::from_str(&preferences.theme).unwrap_or_default()
    }

    /// Persist the theme, creating the parent directory if needed.
    pub(crate) fn save(&self, theme: Theme) -> Result<(), ThemeStoreError> {
        let path = self.path.as_ref().ok_or(ThemeStoreError::Unavailable)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let preferences = StoredPreferences { theme: theme.to_string() };
        fs::write(path, serde_yaml::to_string(&preferences)?)?;
        Ok(())
    }
}

/// The single owner of the selected theme.
///
/// Initialized once at startup from storage and mutated only through
/// [`ThemeContext::set`], which writes through to storage. Storage failures
/// are reported to the caller but never abort a theme change.
pub(crate) struct ThemeContext {
    theme: Theme,
    store: ThemeStore,
}

impl ThemeContext {
    pub(crate) fn load(store: ThemeStore) -> Self {
        let theme = store.load();
        Self { theme, store }
    }

    pub(crate) fn theme(&self) -> Theme {
        self.theme
    }

    pub(crate) fn set(&mut self, theme: Theme) -> Result<(), ThemeStoreError> {
        self.theme = theme;
        self.store.save(theme)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("cosmic", Theme::Cosmic)]
    #[case("aurora", Theme::Aurora)]
    #[case("midnight", Theme::Midnight)]
    #[case("ember", Theme::Ember)]
    fn test_theme_parse_round_trip(#[case] name: &str, #[case] theme: Theme) {
        assert_eq!(Theme::from_str(name).expect("failed to parse"), theme);
        assert_eq!(theme.to_string(), name);
    }

    #[test]
    fn test_cycle_visits_every_theme() {
        let mut theme = Theme::Cosmic;
        let mut seen = Vec::new();
        for _ in 0..4 {
            theme = theme.cycle();
            seen.push(theme);
        }
        assert_eq!(
            seen,
            vec![Theme::Aurora, Theme::Midnight, Theme::Ember, Theme::Cosmic]
        );
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = ThemeStore::at(dir.path().join("serenim-theme.yaml"));
        store.save(Theme::Aurora).expect("failed to save");

        // A fresh store over the same path simulates a restart.
        let reloaded = ThemeStore::at(dir.path().join("serenim-theme.yaml"));
        assert_eq!(reloaded.load(), Theme::Aurora);
    }

    #[test]
    fn test_unknown_stored_value_falls_back_to_cosmic() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("serenim-theme.yaml");
        fs::write(&path, "theme: bogus\n").expect("failed to write");
        assert_eq!(ThemeStore::at(path).load(), Theme::Cosmic);
    }

    #[test]
    fn test_missing_file_falls_back_to_cosmic() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let store = ThemeStore::at(dir.path().join("absent.yaml"));
        assert_eq!(store.load(), Theme::Cosmic);
    }

    #[test]
    fn test_context_set_writes_through() {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let path = dir.path().join("serenim-theme.yaml");
        let mut context = ThemeContext::load(ThemeStore::at(path.clone()));
        assert_eq!(context.theme(), Theme::Cosmic);
        context.set(Theme::Ember).expect("failed to persist");
        assert_eq!(context.theme(), Theme::Ember);
        assert_eq!(ThemeStore::at(path).load(), Theme::Ember);
    }
}
