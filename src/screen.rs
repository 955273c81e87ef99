//! Per-screen resources shared by every icon.

use std::rc::Rc;

use xcb::x;

use crate::{
    config::{Preferences, Theme, ICON_BORDER},
    display::Display,
    drawstring::{self, StringDrawer},
    font::FontMetrics,
    icon::{lookup, TileType},
    raster::{Image, Rgba, SharedImage},
};

pub struct ScreenContext {
    root: x::Window,
    icon_size: u32,
    title_font: FontMetrics,
    theme: Theme,
    icon_tile: SharedImage,
    clip_tile: SharedImage,
    tile_pixmap: Option<x::Pixmap>,
    default_icon: Option<String>,
    icon_path: Vec<String>,
    default_image: Option<SharedImage>,
    title_drawer: Option<Box<dyn StringDrawer>>,
}

impl ScreenContext {
    pub fn new(root: x::Window, prefs: &Preferences, title_font: FontMetrics) -> Self {
        let title_drawer = prefs.title_drawer.as_ref().and_then(|config| {
            drawstring::init(config, &title_font)
                .map_err(|err| tracing::warn!("title drawer disabled: {}", err))
                .ok()
        });
        let default_icon = prefs
            .default_icon
            .clone()
            .or_else(|| prefs.window_icons.get("*").cloned());

        Self {
            root,
            icon_size: prefs.icon_size,
            title_font,
            icon_tile: Rc::new(make_tile(prefs.icon_size, TileType::Normal, &prefs.theme)),
            clip_tile: Rc::new(make_tile(prefs.icon_size, TileType::Clip, &prefs.theme)),
            theme: prefs.theme.clone(),
            tile_pixmap: None,
            default_icon,
            icon_path: prefs.icon_path.clone(),
            default_image: None,
            title_drawer,
        }
    }

    pub fn root(&self) -> x::Window {
        self.root
    }

    pub fn icon_size(&self) -> u32 {
        self.icon_size
    }

    pub fn title_font(&self) -> &FontMetrics {
        &self.title_font
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn tile(&self, tile_type: TileType) -> &SharedImage {
        match tile_type {
            TileType::Normal => &self.icon_tile,
            TileType::Clip => &self.clip_tile,
        }
    }

    /// Replace the theme and rebuild the tiles from it.
    pub fn set_theme(&mut self, display: &mut dyn Display, theme: Theme) {
        self.icon_tile = Rc::new(make_tile(self.icon_size, TileType::Normal, &theme));
        self.clip_tile = Rc::new(make_tile(self.icon_size, TileType::Clip, &theme));
        if let Some(pixmap) = self.tile_pixmap.take() {
            display.free_pixmap(pixmap);
        }
        self.theme = theme;
    }

    /// The plain normal tile as a pixmap, created on first use.
    pub fn tile_pixmap(&mut self, display: &mut dyn Display) -> Option<x::Pixmap> {
        if self.tile_pixmap.is_none() {
            match display.image_to_pixmap(&self.icon_tile) {
                Ok(pixmap) => self.tile_pixmap = Some(pixmap),
                Err(err) => tracing::warn!("error rendering icon tile: {}", err),
            }
        }
        self.tile_pixmap
    }

    /// The image of icons with nothing better, loaded once.
    pub fn default_image(&mut self) -> SharedImage {
        if let Some(image) = &self.default_image {
            return Rc::clone(image);
        }

        let loaded = self.default_icon.as_deref().and_then(|file| {
            let path = lookup::find_image(&self.icon_path, file)?;
            lookup::load_icon_image(&path, self.icon_size)
                .map_err(|err| tracing::warn!("cannot load default icon {}: {}", path.display(), err))
                .ok()
        });
        let image = Rc::new(loaded.unwrap_or_else(|| placeholder_image(self.icon_size)));
        self.default_image = Some(Rc::clone(&image));
        image
    }

    pub fn title_drawer(&mut self) -> Option<&mut (dyn StringDrawer + 'static)> {
        self.title_drawer.as_deref_mut()
    }

    pub fn release(&mut self, display: &mut dyn Display) {
        if let Some(pixmap) = self.tile_pixmap.take() {
            display.free_pixmap(pixmap);
        }
        if let Some(mut drawer) = self.title_drawer.take() {
            drawer.destroy();
        }
        self.default_image = None;
    }
}

/// Gradient tile with a one pixel bevel.
fn make_tile(size: u32, tile_type: TileType, theme: &Theme) -> Image {
    let (from, to) = match tile_type {
        TileType::Normal => (theme.icon_back_from, theme.icon_back_to),
        TileType::Clip => (theme.clip_back_from, theme.clip_back_to),
    };
    let mut tile = Image::vertical_gradient(size, size, from, to);
    if size < 2 {
        return tile;
    }

    let light = Image::filled(size, size, Rgba::WHITE.with_alpha(0x60));
    let dark = Image::filled(size, size, Rgba::BLACK.with_alpha(0x80));
    tile.combine_area(&light, 0, 0, size, 1, 0, 0);
    tile.combine_area(&light, 0, 0, 1, size - 1, 0, 1);
    tile.combine_area(&dark, 0, 0, size - 1, 1, 1, size as i32 - 1);
    tile.combine_area(&dark, 0, 0, 1, size - 2, size as i32 - 1, 1);
    tile
}

/// A small generic window drawn when no default icon file is available.
fn placeholder_image(icon_size: u32) -> Image {
    let side = icon_size.saturating_sub(ICON_BORDER * 4).max(8);
    let bar = (side / 5).max(2);
    let mut image = Image::filled(side, side, Rgba::BLACK);
    let title = Image::filled(side - 2, bar, Rgba::opaque(0x3c, 0x5a, 0x8c));
    let body = Image::filled(side - 2, side - bar - 3, Rgba::opaque(0xe6, 0xe6, 0xe6));
    image.combine_area(&title, 0, 0, side - 2, bar, 1, 1);
    image.combine_area(&body, 0, 0, side - 2, side - bar - 3, 1, bar as i32 + 2);
    image
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::testing::RecordingDisplay;

    #[test]
    fn test_tiles_follow_theme() {
        let prefs = Preferences::default();
        let screen = testing::screen(&prefs);

        let normal = screen.tile(TileType::Normal);
        let clip = screen.tile(TileType::Clip);
        assert_eq!((normal.width(), normal.height()), (64, 64));
        assert_ne!(normal.pixel(32, 32), clip.pixel(32, 32));
    }

    #[test]
    fn test_default_image_is_shared() {
        let prefs = Preferences::default();
        let mut screen = testing::screen(&prefs);

        let first = screen.default_image();
        let second = screen.default_image();

        assert!(Rc::ptr_eq(&first, &second));
        assert!(first.width() <= 64 - ICON_BORDER);
    }

    #[test]
    fn test_default_image_from_file() {
        let dir = tempfile::tempdir().unwrap();
        Image::filled(16, 8, Rgba::WHITE)
            .save_xpm(&dir.path().join("default.xpm"))
            .unwrap();
        let prefs = Preferences {
            icon_path: vec![dir.path().display().to_string()],
            default_icon: Some("default.xpm".to_owned()),
            ..Default::default()
        };
        let mut screen = testing::screen(&prefs);

        let image = screen.default_image();

        assert_eq!((image.width(), image.height()), (16, 8));
    }

    #[test]
    fn test_tile_pixmap_is_created_once() {
        let prefs = Preferences::default();
        let mut screen = testing::screen(&prefs);
        let mut display = RecordingDisplay::default();

        let first = screen.tile_pixmap(&mut display);
        let second = screen.tile_pixmap(&mut display);

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(display.pixmaps.len(), 1);
    }

    #[test]
    fn test_set_theme_frees_tile_pixmap() {
        let prefs = Preferences::default();
        let mut screen = testing::screen(&prefs);
        let mut display = RecordingDisplay::default();
        screen.tile_pixmap(&mut display);
        let before = screen.tile(TileType::Normal).pixel(32, 32);

        let theme = Theme {
            icon_back_from: Rgba::WHITE,
            icon_back_to: Rgba::WHITE,
            ..Theme::default()
        };
        screen.set_theme(&mut display, theme);

        assert!(display.pixmaps.is_empty());
        assert_ne!(screen.tile(TileType::Normal).pixel(32, 32), before);
    }
}
