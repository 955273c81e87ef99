//! Where an icon image comes from.
//!
//! Each resolver either produces a [`Resolved`] image for the icon or
//! [`Deferred`]s to the next one in line, leaving the icon untouched.

use std::{path::PathBuf, rc::Rc};

use xcb::x;

use crate::{
    display::{Display, Target},
    icccm::{WmHints, WmHintsFlags},
    raster::{Image, SharedImage},
    screen::ScreenContext,
    state::Client,
    vector::Vector2D,
};

use super::compose::validate_icon_size;

/// What the icon should show from now on.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub file: Option<PathBuf>,
    pub image: Option<SharedImage>,
}

/// The source had nothing to offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deferred;

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    /// The configured file, or the default image.
    UserIcon,
    /// A window the application draws the icon in itself.
    LiveWindow(x::Window),
    /// `_NET_WM_ICON` data.
    Protocol(SharedImage),
    /// The `WM_HINTS` icon pixmap, falling back to the user icon.
    LegacyHints,
}

/// Pick the source in order of preference.
pub fn select_source(icon_win: Option<x::Window>, owner: Option<&Client>) -> Source {
    if owner.is_some_and(|client| client.always_user_icon) {
        return Source::UserIcon;
    }
    if let Some(window) = icon_win {
        return Source::LiveWindow(window);
    }
    let Some(client) = owner else {
        return Source::UserIcon;
    };
    if let Some(image) = &client.net_icon_image {
        return Source::Protocol(Rc::clone(image));
    }
    let has_pixmap = client
        .wm_hints
        .as_ref()
        .is_some_and(|hints| hints.flags.contains(WmHintsFlags::ICON_PIXMAP));
    if has_pixmap {
        Source::LegacyHints
    } else {
        Source::UserIcon
    }
}

pub fn from_user_file(file: Option<&PathBuf>, image: Option<&SharedImage>) -> Result<Resolved, Deferred> {
    match image {
        Some(image) => Ok(Resolved {
            file: file.cloned(),
            image: Some(Rc::clone(image)),
        }),
        None => Err(Deferred),
    }
}

pub fn from_default(screen: &mut ScreenContext) -> Resolved {
    Resolved {
        file: None,
        image: Some(screen.default_image()),
    }
}

pub fn from_protocol_icon(image: &SharedImage) -> Resolved {
    Resolved {
        file: None,
        image: Some(Rc::clone(image)),
    }
}

/// Snapshot of a live icon window. Never defers: a window that cannot be
/// read just gives no image.
pub fn from_live_window(display: &mut dyn Display, window: x::Window) -> Resolved {
    let image = match display.capture(Target::Window(window), None) {
        Ok(image) => Some(Rc::new(image)),
        Err(err) => {
            tracing::debug!("cannot capture icon window {:?}: {}", window, err);
            None
        }
    };
    Resolved { file: None, image }
}

/// The `WM_HINTS` icon pixmap and mask.
///
/// A pixmap that no longer exists is forgotten by clearing its hint on the
/// owner, so that it is not asked for again.
pub fn from_legacy_hints(
    display: &mut dyn Display,
    owner: &mut Client,
    icon_size: u32,
) -> Result<Resolved, Deferred> {
    let hints = owner.wm_hints.as_mut().ok_or(Deferred)?;
    let gone = match hints.icon_pixmap {
        Some(pixmap) => display.geometry(Target::Pixmap(pixmap)).is_err(),
        None => true,
    };
    if gone {
        tracing::debug!("icon pixmap of {:?} is gone", owner.window);
        hints.flags.remove(WmHintsFlags::ICON_PIXMAP);
        return Err(Deferred);
    }

    let image = capture_hints_pixmap(display, hints).ok_or(Deferred)?;
    Ok(Resolved {
        file: None,
        image: Some(Rc::new(validate_icon_size(image, icon_size))),
    })
}

/// Read the hinted icon pixmap through its mask, if any.
pub fn capture_hints_pixmap(display: &mut dyn Display, hints: &WmHints) -> Option<Image> {
    if !hints.flags.contains(WmHintsFlags::ICON_PIXMAP) {
        return None;
    }
    let pixmap = hints.icon_pixmap?;
    let mask = hints
        .icon_mask
        .filter(|_| hints.flags.contains(WmHintsFlags::ICON_MASK));

    display
        .capture(Target::Pixmap(pixmap), mask)
        .map_err(|err| tracing::debug!("cannot capture icon pixmap: {}", err))
        .ok()
}

/// Reparent a live icon window into the icon frame, centered below the title
/// when there is room for both.
///
/// Returns whether the title strip stays visible.
pub fn embed_live_window(
    display: &mut dyn Display,
    screen: &mut ScreenContext,
    frame: x::Window,
    icon_win: x::Window,
    pixmap: Option<x::Pixmap>,
    show_title: bool,
) -> bool {
    let geometry = match display.geometry(Target::Window(icon_win)) {
        Ok(geometry) => geometry,
        Err(err) => {
            tracing::warn!("icon window {:?} vanished: {}", icon_win, err);
            return false;
        }
    };
    let icon_size = screen.icon_size();
    let title_height = screen.title_font().height();

    let titled = show_title && geometry.height + title_height < icon_size;
    let title_height = if titled { title_height } else { 0 };
    if !titled && pixmap.is_none() {
        if let Some(tile) = screen.tile_pixmap(display) {
            display.set_background(frame, tile);
        }
    }

    display.set_border_width(icon_win, 0);
    let pos = Vector2D::new(
        (icon_size as i32 - geometry.width as i32) / 2,
        title_height as i32 + (icon_size as i32 - geometry.height as i32 - title_height as i32) / 2,
    );
    display.reparent(icon_win, frame, pos);
    display.map(icon_win);
    display.add_to_save_set(icon_win);

    if display.selects_button_press(icon_win) {
        display.grab_move_button(frame);
    }
    titled
}

#[cfg(test)]
mod tests {
    use xcb::{Xid, XidNew};

    use super::*;
    use crate::{
        config::Preferences,
        display::testing::RecordingDisplay,
        raster::Rgba,
        screen::testing::screen,
    };

    fn client() -> Client {
        Client::new(unsafe { x::Window::new(123) })
    }

    fn hints_with_pixmap(pixmap: x::Pixmap, mask: Option<x::Pixmap>) -> WmHints {
        let mut flags = WmHintsFlags::ICON_PIXMAP;
        if mask.is_some() {
            flags |= WmHintsFlags::ICON_MASK;
        }
        WmHints {
            flags,
            icon_pixmap: Some(pixmap),
            icon_mask: mask,
            ..Default::default()
        }
    }

    #[test]
    fn test_select_source_order() {
        let live = unsafe { x::Window::new(77) };
        let image = Rc::new(Image::filled(4, 4, Rgba::WHITE));
        let mut owner = client();

        assert_eq!(select_source(None, None), Source::UserIcon);
        assert_eq!(select_source(Some(live), None), Source::LiveWindow(live));
        assert_eq!(select_source(None, Some(&owner)), Source::UserIcon);

        owner.wm_hints = Some(hints_with_pixmap(unsafe { x::Pixmap::new(5) }, None));
        assert_eq!(select_source(None, Some(&owner)), Source::LegacyHints);

        owner.net_icon_image = Some(Rc::clone(&image));
        assert_eq!(select_source(None, Some(&owner)), Source::Protocol(Rc::clone(&image)));
        assert_eq!(select_source(Some(live), Some(&owner)), Source::LiveWindow(live));

        owner.always_user_icon = true;
        assert_eq!(select_source(Some(live), Some(&owner)), Source::UserIcon);
    }

    #[test]
    fn test_from_user_file() {
        let image = Rc::new(Image::filled(4, 4, Rgba::WHITE));
        let file = PathBuf::from("/icons/xterm.png");

        assert_eq!(from_user_file(Some(&file), None), Err(Deferred));
        let resolved = from_user_file(Some(&file), Some(&image)).unwrap();
        assert_eq!(resolved.file, Some(file));
        assert!(Rc::ptr_eq(resolved.image.as_ref().unwrap(), &image));
    }

    #[test]
    fn test_from_legacy_hints_with_mask() {
        let mut display = RecordingDisplay::default();
        let pixmap = display.add_pixmap(Image::filled(2, 1, Rgba::WHITE));
        let mask = display.add_mask(vec![true, false]);
        let mut owner = client();
        owner.wm_hints = Some(hints_with_pixmap(pixmap, Some(mask)));

        let resolved = from_legacy_hints(&mut display, &mut owner, 64).unwrap();

        let image = resolved.image.unwrap();
        assert_eq!(resolved.file, None);
        assert_eq!(image.pixel(0, 0), Rgba::WHITE);
        assert_eq!(image.pixel(1, 0).a, 0);
    }

    #[test]
    fn test_from_legacy_hints_gone_pixmap_clears_hint() {
        let mut display = RecordingDisplay::default();
        let pixmap = display.add_pixmap(Image::filled(2, 2, Rgba::WHITE));
        display.bad_geometry.insert(pixmap.resource_id());
        let mut owner = client();
        owner.wm_hints = Some(hints_with_pixmap(pixmap, None));

        assert_eq!(from_legacy_hints(&mut display, &mut owner, 64), Err(Deferred));
        assert!(!owner
            .wm_hints
            .unwrap()
            .flags
            .contains(WmHintsFlags::ICON_PIXMAP));
    }

    #[test]
    fn test_from_legacy_hints_scales_down() {
        let mut display = RecordingDisplay::default();
        let pixmap = display.add_pixmap(Image::filled(128, 64, Rgba::WHITE));
        let mut owner = client();
        owner.wm_hints = Some(hints_with_pixmap(pixmap, None));

        let image = from_legacy_hints(&mut display, &mut owner, 64)
            .unwrap()
            .image
            .unwrap();

        assert_eq!((image.width(), image.height()), (61, 30));
    }

    #[test]
    fn test_from_live_window_capture_failure() {
        let mut display = RecordingDisplay::default();

        let resolved = from_live_window(&mut display, unsafe { x::Window::new(999) });

        assert_eq!(resolved, Resolved { file: None, image: None });
    }

    #[test]
    fn test_embed_live_window_below_title() {
        let prefs = Preferences::default();
        let mut screen = screen(&prefs);
        let mut display = RecordingDisplay::default();
        let frame = display.create_frame(Vector2D::default(), 64, false).unwrap();
        let live = display.add_window(Image::filled(32, 32, Rgba::WHITE));
        display.button_press_selectors.insert(live.resource_id());
        let pixmap = display.create_pixmap(64, 64).unwrap();

        let titled = embed_live_window(&mut display, &mut screen, frame, live, Some(pixmap), true);

        assert!(titled);
        let record = display.window(live);
        assert_eq!(record.parent, frame.resource_id());
        assert_eq!(record.pos, Vector2D::new(16, 13 + 9));
        assert_eq!(record.border_width, Some(0));
        assert!(record.mapped);
        assert_eq!(display.save_set, vec![live.resource_id()]);
        assert_eq!(display.move_button_grabs, vec![frame.resource_id()]);
    }

    #[test]
    fn test_embed_tall_live_window_without_pixmap_uses_tile() {
        let prefs = Preferences::default();
        let mut screen = screen(&prefs);
        let mut display = RecordingDisplay::default();
        let frame = display.create_frame(Vector2D::default(), 64, false).unwrap();
        let live = display.add_window(Image::filled(60, 60, Rgba::WHITE));

        let titled = embed_live_window(&mut display, &mut screen, frame, live, None, true);

        assert!(!titled);
        assert_eq!(display.window(live).pos, Vector2D::new(2, 2));
        assert!(display.window(frame).background.is_some());
        assert!(display.move_button_grabs.is_empty());
    }
}
