use std::{
    fs, io,
    ops::RangeInclusive,
    path::{Path, PathBuf},
    time::Duration,
};

use expanduser::expanduser;
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;
use xcb::x;

use crate::{drawstring::DrawStringConfig, raster::Rgba};

pub static MOD_KEY: x::ModMask = x::ModMask::N1; // Alt
pub static MOD_KEY_BUT: x::KeyButMask = x::KeyButMask::MOD1;
pub static SHIFT_BUT: x::KeyButMask = x::KeyButMask::SHIFT;

pub static MOVE_BUTTON: x::ButtonIndex = x::ButtonIndex::N1; // Left Mouse Button
pub static MENU_BUTTON: x::ButtonIndex = x::ButtonIndex::N3; // Right Mouse Button

pub static BORDER_WIDTH: usize = 2;

pub static BORDER_COLOR: u32 = 0xcccccc;
pub static BORDER_COLOR_FOCUS: u32 = 0x00ccff;

pub const ICON_SIZE_RANGE: RangeInclusive<u32> = 16..=256;

/// Pixels kept free around an icon image so the tile bevel stays visible.
pub const ICON_BORDER: u32 = 3;
/// Pointer travel before a press on an icon turns into a drag.
pub const MOVE_THRESHOLD: i32 = 5;
pub const FIRST_CYCLE_DELAY: Duration = Duration::from_millis(10);
pub const COLOR_CYCLE_DELAY: Duration = Duration::from_millis(200);

/// Relative to the user root.
pub const CACHE_ICON_PATH: &str = "Library/WindowMaker/CachedPixmaps";
pub const SOCKET_PATH: &str = "/tmp/miniwm.socket";
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/miniwm/config.json";

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config file: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// User preferences, read from a JSON file.
///
/// Every field is optional in the file; missing ones take the defaults below.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Width and height of every icon.
    pub icon_size: u32,
    /// Directories searched for icon image files.
    pub icon_path: Vec<String>,
    /// Root of the per-user data directory, holds the icon cache.
    pub user_root: String,
    /// Image used when nothing better is known about a window.
    pub default_icon: Option<String>,
    /// Icon database: `instance.class`, `class`, `instance` or `*` to file.
    pub window_icons: IndexMap<String, String>,
    /// Windows, by `instance.class`, `class` or `instance`, that always use the
    /// icon database image even if they provide their own.
    pub always_user_icon: Vec<String>,
    pub dont_blink: bool,
    pub single_click: bool,
    pub auto_arrange_icons: bool,
    pub use_saveunders: bool,
    pub no_miniwindow_titles: bool,
    /// Milliseconds.
    pub double_click_delay: u32,
    /// X core font used for icon titles.
    pub title_font: String,
    /// Optional text drawing plugin for icon titles.
    pub title_drawer: Option<DrawStringConfig>,
    pub theme: Theme,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            icon_size: 64,
            icon_path: vec![
                "~/GNUstep/Library/Icons".to_owned(),
                "/usr/share/WindowMaker/Icons".to_owned(),
                "/usr/share/pixmaps".to_owned(),
            ],
            user_root: "~/GNUstep".to_owned(),
            default_icon: None,
            window_icons: IndexMap::new(),
            always_user_icon: Vec::new(),
            dont_blink: false,
            single_click: false,
            auto_arrange_icons: false,
            use_saveunders: false,
            no_miniwindow_titles: false,
            double_click_delay: 250,
            title_font: "fixed".to_owned(),
            title_drawer: None,
            theme: Theme::default(),
        }
    }
}

impl Preferences {
    /// Load the preferences from `path`.
    ///
    /// A missing file is not an error, the defaults are used instead.
    pub fn load(path: &Path) -> Result<Self, Error> {
        match fs::read_to_string(path) {
            Ok(data) => Self::from_json(&data),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::info!("no config file at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(err) => Err(err.into()),
        }
    }

    fn from_json(data: &str) -> Result<Self, Error> {
        let mut prefs: Self = serde_json::from_str(data)?;
        let icon_size = prefs.icon_size.clamp(*ICON_SIZE_RANGE.start(), *ICON_SIZE_RANGE.end());
        if icon_size != prefs.icon_size {
            tracing::warn!("icon size {} out of range, using {}", prefs.icon_size, icon_size);
            prefs.icon_size = icon_size;
        }
        Ok(prefs)
    }

    /// The user root with `~` expanded.
    pub fn user_root(&self) -> Option<PathBuf> {
        match expanduser(&self.user_root) {
            Ok(path) => Some(path),
            Err(err) => {
                tracing::warn!("cannot expand user root {:?}: {}", self.user_root, err);
                None
            }
        }
    }

    /// Whether `key` (an `instance.class`, `class` or `instance` name) is
    /// forced to the icon database image.
    pub fn forces_user_icon(&self, keys: &[&str]) -> bool {
        keys.iter()
            .any(|key| self.always_user_icon.iter().any(|forced| forced == key))
    }
}

/// Colors of the icon tiles and titles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub icon_back_from: Rgba,
    pub icon_back_to: Rgba,
    /// Light color of the icon texture, used to wash out shadowed icons.
    pub icon_back_light: Rgba,
    pub clip_back_from: Rgba,
    pub clip_back_to: Rgba,
    pub icon_title_back: Rgba,
    pub icon_title_light: Rgba,
    pub icon_title_dim: Rgba,
    pub icon_title_color: Rgba,
    pub select_color: Rgba,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            icon_back_from: Rgba::opaque(0x7f, 0x7f, 0x7f),
            icon_back_to: Rgba::opaque(0x4c, 0x4c, 0x4c),
            icon_back_light: Rgba::opaque(0xb0, 0xb0, 0xb0),
            clip_back_from: Rgba::opaque(0x61, 0x72, 0x8c),
            clip_back_to: Rgba::opaque(0x2f, 0x3c, 0x51),
            icon_title_back: Rgba::opaque(0x00, 0x00, 0x00),
            icon_title_light: Rgba::opaque(0x55, 0x55, 0x55),
            icon_title_dim: Rgba::opaque(0x22, 0x22, 0x22),
            icon_title_color: Rgba::WHITE,
            select_color: Rgba::WHITE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load(&dir.path().join("config.json")).unwrap();

        assert_eq!(prefs.icon_size, 64);
        assert!(!prefs.dont_blink);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r##"{
                "icon_size": 48,
                "dont_blink": true,
                "window_icons": { "xterm.XTerm": "xterm.png", "*": "default.png" },
                "theme": { "icon_back_light": "#ffffff" }
            }"##,
        )
        .unwrap();

        let prefs = Preferences::load(&path).unwrap();

        assert_eq!(prefs.icon_size, 48);
        assert!(prefs.dont_blink);
        assert_eq!(prefs.window_icons.get("*").unwrap(), "default.png");
        assert_eq!(prefs.theme.icon_back_light, Rgba::WHITE);
        assert_eq!(prefs.theme.select_color, Rgba::WHITE);
    }

    #[rstest]
    #[case(0, 16)]
    #[case(64, 64)]
    #[case(100000, 256)]
    fn test_load_clamps_icon_size(#[case] configured: u32, #[case] expected: u32) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, format!(r#"{{ "icon_size": {configured} }}"#)).unwrap();

        let prefs = Preferences::load(&path).unwrap();

        assert_eq!(prefs.icon_size, expected);
    }

    #[test]
    fn test_load_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "theme": { "icon_back_light": "not a color" } }"#).unwrap();

        assert!(matches!(Preferences::load(&path), Err(Error::Parse(_))));
    }

    #[test]
    fn test_forces_user_icon() {
        let prefs = Preferences {
            always_user_icon: vec!["XTerm".to_owned()],
            ..Default::default()
        };

        assert!(prefs.forces_user_icon(&["xterm.XTerm", "XTerm"]));
        assert!(!prefs.forces_user_icon(&["emacs.Emacs", "Emacs"]));
    }
}
