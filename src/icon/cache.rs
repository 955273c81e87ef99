//! On-disk cache of application supplied icons.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{config::CACHE_ICON_PATH, display::Display, raster::Image, state::Client};

use super::resolve::capture_hints_pixmap;

/// Cache file stem for a window: `instance.class`, `class` or `instance`.
pub fn name_for_instance_class(instance: Option<&str>, class: Option<&str>) -> Option<String> {
    match (instance, class) {
        (Some(instance), Some(class)) => Some(format!("{instance}.{class}")),
        (None, Some(class)) => Some(class.to_owned()),
        (Some(instance), None) => Some(instance.to_owned()),
        (None, None) => None,
    }
}

/// The cache directory under `user_root`, created if needed.
pub fn cache_dir(user_root: &Path) -> Option<PathBuf> {
    let dir = user_root.join(CACHE_ICON_PATH);
    if dir.is_dir() {
        return Some(dir);
    }
    match fs::create_dir_all(&dir) {
        Ok(()) => Some(dir),
        Err(err) => {
            tracing::warn!("cannot create icon cache {}: {}", dir.display(), err);
            None
        }
    }
}

/// Save the icon `owner` supplies itself and return where it went.
///
/// An icon already in the cache is never rewritten.
pub fn store(display: &mut dyn Display, user_root: &Path, owner: &Client) -> Option<PathBuf> {
    let dir = cache_dir(user_root)?;
    let name = name_for_instance_class(owner.wm_instance.as_deref(), owner.wm_class.as_deref())?;
    let path = dir.join(format!("{name}.xpm"));
    if path.exists() {
        return Some(path);
    }

    let captured;
    let image: &Image = match &owner.net_icon_image {
        Some(image) => image,
        None => {
            captured = capture_hints_pixmap(display, owner.wm_hints.as_ref()?)?;
            &captured
        }
    };

    match image.save_xpm(&path) {
        Ok(()) => {
            tracing::info!("stored icon of {:?} in {}", owner.window, path.display());
            Some(path)
        }
        Err(err) => {
            tracing::warn!("cannot store icon {}: {}", path.display(), err);
            None
        }
    }
}
