//! Finding icon image files.

use std::path::{Path, PathBuf};

use expanduser::expanduser;

use crate::{
    config::Preferences,
    raster::{self, Image},
};

use super::compose::validate_icon_size;

/// Resolve `file` against the icon search path.
///
/// Absolute and `~` paths are used as they are.
pub fn find_image(icon_path: &[String], file: &str) -> Option<PathBuf> {
    let expand = |path: &str| match expanduser(path) {
        Ok(path) => Some(path),
        Err(err) => {
            tracing::debug!("cannot expand {:?}: {}", path, err);
            None
        }
    };

    if file.starts_with('/') || file.starts_with('~') {
        return expand(file).filter(|path| path.is_file());
    }

    icon_path
        .iter()
        .filter_map(|dir| expand(dir))
        .map(|dir| dir.join(file))
        .find(|path| path.is_file())
}

/// Keys tried in the icon database, most specific first.
fn database_keys(
    instance: Option<&str>,
    class: Option<&str>,
    command: Option<&str>,
    allow_default: bool,
) -> Vec<String> {
    let mut keys = Vec::new();
    if let (Some(instance), Some(class)) = (instance, class) {
        keys.push(format!("{instance}.{class}"));
    }
    keys.extend(class.map(str::to_owned));
    keys.extend(instance.map(str::to_owned));
    let command_name = command
        .and_then(|command| command.split_whitespace().next())
        .and_then(|program| Path::new(program).file_name())
        .map(|name| name.to_string_lossy().into_owned());
    keys.extend(command_name);
    if allow_default {
        keys.push("*".to_owned());
    }
    keys
}

/// The configured icon file for a window, found on disk.
pub fn default_icon_filename(
    prefs: &Preferences,
    instance: Option<&str>,
    class: Option<&str>,
    command: Option<&str>,
    allow_default: bool,
) -> Option<PathBuf> {
    let file = database_keys(instance, class, command, allow_default)
        .iter()
        .find_map(|key| prefs.window_icons.get(key))?;
    let path = find_image(&prefs.icon_path, file);
    if path.is_none() {
        tracing::debug!("icon file {:?} not found in the icon path", file);
    }
    path
}

/// Load an icon file and fit it into an icon of `size` pixels.
pub fn load_icon_image(path: &Path, size: u32) -> Result<Image, raster::Error> {
    Image::load(path).map(|image| validate_icon_size(image, size))
}
