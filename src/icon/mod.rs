//! Miniwindow icons.
//!
//! An [`Icon`] is a small override-redirect frame showing the best image known
//! for a window. The image is resolved from several sources in order of
//! preference (see [`resolve`]), rendered on a tile (see [`compose`]) and kept
//! up to date as the owner's properties and the theme change.

pub mod cache;
pub mod compose;
pub mod interaction;
pub mod lookup;
pub mod resolve;

use std::{path::PathBuf, rc::Rc, time::Instant};

use thiserror::Error;
use xcb::x;

use crate::{
    config::{Preferences, COLOR_CYCLE_DELAY, FIRST_CYCLE_DELAY},
    display::{self, Display, Pen, Target},
    font,
    icccm::WmHintsFlags,
    notification::{AppearanceFlags, Notification, NotificationCenter, NotificationKind, SubscriptionId},
    raster::{self, SharedImage},
    screen::ScreenContext,
    state::Client,
    timer::{TimerHandle, Timers},
    vector::Vector2D,
};

use self::{
    compose::Style,
    resolve::{Resolved, Source},
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Icon image {0:?} not found in the icon path.")]
    ImageNotFound(String),
    #[error("Failed to load icon image {path}: {source}")]
    ImageLoad { path: PathBuf, source: raster::Error },
    #[error(transparent)]
    Display(#[from] display::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TileType {
    #[default]
    Normal,
    Clip,
}

/// What icon operations need from the outside world.
pub struct IconContext<'a> {
    pub display: &'a mut dyn Display,
    pub screen: &'a mut ScreenContext,
    pub prefs: &'a Preferences,
}

impl<'a> IconContext<'a> {
    pub fn new(display: &'a mut dyn Display, screen: &'a mut ScreenContext, prefs: &'a Preferences) -> Self {
        Self {
            display,
            screen,
            prefs,
        }
    }
}

#[derive(Debug)]
pub struct Icon {
    window: x::Window,
    pos: Vector2D,
    /// The client this icon stands for, looked up in the state on use.
    owner: Option<x::Window>,
    icon_win: Option<x::Window>,
    file: Option<PathBuf>,
    file_image: Option<SharedImage>,
    pixmap: Option<x::Pixmap>,
    tile_type: TileType,
    show_title: bool,
    icon_name: Option<String>,
    shadowed: bool,
    highlighted: bool,
    selected: bool,
    force_paint: bool,
    handler: Option<TimerHandle>,
    step: u16,
    subscriptions: Vec<SubscriptionId>,
}

impl Icon {
    fn create_core(ctx: &mut IconContext, pos: Vector2D) -> Result<Self, Error> {
        let window = ctx
            .display
            .create_frame(pos, ctx.screen.icon_size(), ctx.prefs.use_saveunders)?;

        Ok(Self {
            window,
            pos,
            owner: None,
            icon_win: None,
            file: None,
            file_image: None,
            pixmap: None,
            tile_type: TileType::Normal,
            show_title: false,
            icon_name: None,
            shadowed: false,
            highlighted: false,
            selected: false,
            force_paint: false,
            handler: None,
            step: 0,
            subscriptions: Vec::new(),
        })
    }

    fn subscribe(&mut self, notifications: &mut NotificationCenter<x::Window>) {
        self.subscriptions = vec![
            notifications.subscribe(NotificationKind::IconAppearanceChanged, self.window),
            notifications.subscribe(NotificationKind::IconTileChanged, self.window),
        ];
    }

    /// Load the configured file, keeping `file` and `file_image` in step.
    fn set_file(&mut self, path: Option<PathBuf>, icon_size: u32) {
        let Some(path) = path else {
            return;
        };
        match lookup::load_icon_image(&path, icon_size) {
            Ok(image) => {
                self.file = Some(path);
                self.file_image = Some(Rc::new(image));
            }
            Err(err) => tracing::warn!("cannot load icon {}: {}", path.display(), err),
        }
    }

    /// Miniwindow of an iconified client.
    pub fn create_for_window(
        ctx: &mut IconContext,
        notifications: &mut NotificationCenter<x::Window>,
        client: &mut Client,
    ) -> Result<Self, Error> {
        let mut icon = Self::create_core(ctx, client.icon_pos)?;
        icon.owner = Some(client.window);
        icon.icon_win = client
            .wm_hints
            .as_ref()
            .filter(|hints| hints.flags.contains(WmHintsFlags::ICON_WINDOW))
            .and_then(|hints| hints.icon_window);
        icon.show_title = !ctx.prefs.no_miniwindow_titles;

        icon.icon_name = match &client.net_wm_icon_name {
            Some(name) => {
                client.net_has_icon_title = true;
                Some(name.clone())
            }
            None => client.wm_icon_name.clone(),
        };

        let path = lookup::default_icon_filename(
            ctx.prefs,
            client.wm_instance.as_deref(),
            client.wm_class.as_deref(),
            None,
            true,
        );
        icon.set_file(path, ctx.screen.icon_size());
        icon.tile_type = TileType::Normal;

        icon.update(ctx, Some(client));
        icon.subscribe(notifications);
        tracing::debug!(icon = ?icon.window, owner = ?client.window, "created miniwindow");

        Ok(icon)
    }

    /// Icon of a docked application, which may not be running.
    pub fn create_for_dock(
        ctx: &mut IconContext,
        notifications: &mut NotificationCenter<x::Window>,
        command: Option<&str>,
        instance: Option<&str>,
        class: Option<&str>,
        tile_type: TileType,
    ) -> Result<Self, Error> {
        let mut icon = Self::create_core(ctx, Vector2D::default())?;

        let path = lookup::default_icon_filename(ctx.prefs, instance, class, command, false);
        icon.set_file(path, ctx.screen.icon_size());
        icon.tile_type = tile_type;

        icon.update(ctx, None);
        icon.subscribe(notifications);

        Ok(icon)
    }

    pub fn destroy(
        mut self,
        ctx: &mut IconContext,
        notifications: &mut NotificationCenter<x::Window>,
        timers: &mut Timers<x::Window>,
        owner: Option<&Client>,
    ) {
        for subscription in self.subscriptions.drain(..) {
            notifications.unsubscribe(subscription);
        }
        if let Some(handler) = self.handler.take() {
            timers.cancel(handler);
        }

        if let Some(icon_win) = self.icon_win {
            let pos = owner.map(|client| client.icon_pos).unwrap_or_default();
            ctx.display.unmap(icon_win);
            ctx.display.reparent(icon_win, ctx.screen.root(), pos);
        }
        if let Some(pixmap) = self.pixmap.take() {
            ctx.display.free_pixmap(pixmap);
        }

        ctx.display.destroy_window(self.window);
        tracing::debug!(icon = ?self.window, "destroyed icon");
    }

    fn style(&self) -> Style {
        Style {
            tile_type: self.tile_type,
            titled: self.show_title,
            shadowed: self.shadowed,
            highlighted: self.highlighted,
        }
    }

    fn commit(&mut self, resolved: Resolved) {
        self.file = resolved.file;
        self.file_image = resolved.image;
    }

    fn resolve_user_icon(&mut self, ctx: &mut IconContext) {
        let resolved = resolve::from_user_file(self.file.as_ref(), self.file_image.as_ref())
            .unwrap_or_else(|_| resolve::from_default(ctx.screen));
        self.commit(resolved);
    }

    /// Re-resolve the image, render it and repaint.
    pub fn update(&mut self, ctx: &mut IconContext, owner: Option<&mut Client>) {
        if let Some(pixmap) = self.pixmap.take() {
            ctx.display.free_pixmap(pixmap);
        }

        let source = resolve::select_source(self.icon_win, owner.as_deref());
        tracing::trace!(icon = ?self.window, ?source, "updating icon");
        match &source {
            Source::UserIcon => self.resolve_user_icon(ctx),
            Source::LiveWindow(window) => self.commit(resolve::from_live_window(ctx.display, *window)),
            Source::Protocol(image) => self.commit(resolve::from_protocol_icon(image)),
            Source::LegacyHints => {
                let resolved = owner
                    .ok_or(resolve::Deferred)
                    .and_then(|client| resolve::from_legacy_hints(ctx.display, client, ctx.screen.icon_size()));
                match resolved {
                    Ok(resolved) => self.commit(resolved),
                    Err(_) => self.resolve_user_icon(ctx),
                }
            }
        }

        self.pixmap = compose::compose(ctx, &self.style(), self.file_image.as_deref());

        if let Source::LiveWindow(icon_win) = source {
            resolve::embed_live_window(
                ctx.display,
                ctx.screen,
                self.window,
                icon_win,
                self.pixmap,
                self.show_title,
            );
        }

        if let Some(pixmap) = self.pixmap {
            ctx.display.set_background(self.window, pixmap);
        }
        ctx.display.clear_window(self.window);
        self.force_paint = false;
        self.redraw(ctx);
    }

    /// Repaint, re-resolving first if something asked for it.
    pub fn paint(&mut self, ctx: &mut IconContext, owner: Option<&mut Client>) {
        if self.force_paint {
            self.update(ctx, owner);
            return;
        }
        self.redraw(ctx);
    }

    /// Redraw the title and the selection on top of the background.
    fn redraw(&mut self, ctx: &mut IconContext) {
        ctx.display.clear_window(self.window);
        let size = ctx.screen.icon_size();

        if let (true, Some(name)) = (self.show_title, &self.icon_name) {
            let room = size.saturating_sub(4);
            let height = ctx.screen.title_font().height();
            let (title, width) = match ctx.screen.title_drawer() {
                Some(drawer) => {
                    let title = font::shrink_with(name, room, |text| drawer.text_width(text));
                    let width = drawer.text_width(&title);
                    (title, width)
                }
                None => {
                    let font = ctx.screen.title_font();
                    let title = font.shrink_string(name, room);
                    let width = font.text_width(&title);
                    (title, width)
                }
            };
            let x = if width > room {
                room as i32 - width as i32
            } else {
                (size as i32 - width as i32) / 2
            };

            let target = Target::Window(self.window);
            match ctx.screen.title_drawer() {
                Some(drawer) => {
                    if let Err(err) = drawer.draw(ctx.display, target, x, 1, size, height, &title) {
                        tracing::warn!("cannot draw icon title: {}", err);
                    }
                }
                None => ctx.display.draw_text(target, Pen::TitleText, x, 1, &title),
            }
        }

        if self.selected {
            self.draw_selection(ctx, size);
        }
    }

    fn draw_selection(&self, ctx: &mut IconContext, size: u32) {
        ctx.display.draw_rectangle(
            Target::Window(self.window),
            Pen::Select,
            0,
            0,
            size.saturating_sub(1),
            size.saturating_sub(1),
        );
    }

    pub fn change_title(&mut self, ctx: &mut IconContext, owner: Option<&mut Client>, title: Option<String>) {
        if title.is_some() != self.icon_name.is_some() {
            self.force_paint = true;
        }
        self.icon_name = title;
        self.paint(ctx, owner);
    }

    /// Show `file` from now on. `None` keeps the current image.
    ///
    /// On error the icon is left as it was.
    pub fn change_image_file(
        &mut self,
        ctx: &mut IconContext,
        owner: Option<&mut Client>,
        file: Option<&str>,
    ) -> Result<(), Error> {
        let Some(file) = file else {
            return Ok(());
        };

        let path = lookup::find_image(&ctx.prefs.icon_path, file)
            .ok_or_else(|| Error::ImageNotFound(file.to_owned()))?;
        let image = lookup::load_icon_image(&path, ctx.screen.icon_size()).map_err(|source| Error::ImageLoad {
            path: path.clone(),
            source,
        })?;

        self.file = Some(path);
        self.file_image = Some(Rc::new(image));
        self.update(ctx, owner);
        Ok(())
    }

    /// Toggle the selection, animating its outline unless blinking is off.
    pub fn select(&mut self, ctx: &mut IconContext, timers: &mut Timers<x::Window>, now: Instant) {
        self.selected = !self.selected;
        let size = ctx.screen.icon_size();

        if self.selected {
            self.step = 0;
            if let Some(handler) = self.handler.take() {
                timers.cancel(handler);
            }
            if ctx.prefs.dont_blink {
                self.draw_selection(ctx, size);
            } else {
                self.handler = Some(timers.schedule_periodic(now, FIRST_CYCLE_DELAY, COLOR_CYCLE_DELAY, self.window));
            }
        } else {
            if let Some(handler) = self.handler.take() {
                timers.cancel(handler);
            }
            ctx.display.clear_area(self.window, 0, 0, size, size, true);
        }
    }

    /// One step of the selection outline animation.
    pub fn cycle_selection(&mut self, ctx: &mut IconContext) {
        self.step = self.step.wrapping_sub(1);
        ctx.display.set_dash_offset(Pen::Select, self.step);
        let size = ctx.screen.icon_size();
        self.draw_selection(ctx, size);
    }

    pub fn set_highlighted(&mut self, ctx: &mut IconContext, owner: Option<&mut Client>, highlighted: bool) {
        if self.highlighted == highlighted {
            return;
        }
        self.highlighted = highlighted;
        self.force_paint = true;
        self.paint(ctx, owner);
    }

    pub fn set_shadowed(&mut self, ctx: &mut IconContext, owner: Option<&mut Client>, shadowed: bool) {
        if self.shadowed == shadowed {
            return;
        }
        self.shadowed = shadowed;
        self.force_paint = true;
        self.paint(ctx, owner);
    }

    pub fn on_notification(&mut self, ctx: &mut IconContext, owner: Option<&mut Client>, notification: &Notification) {
        match notification {
            Notification::IconAppearanceChanged(flags) => {
                if flags.intersects(AppearanceFlags::TEXTURE | AppearanceFlags::FONT) {
                    self.force_paint = true;
                }
            }
            Notification::IconTileChanged => self.force_paint = true,
        }
        self.paint(ctx, owner);

        let size = ctx.screen.icon_size();
        ctx.display.clear_area(self.window, 0, 0, size, size, true);
    }

    /// Save the owner's own icon image in the icon cache.
    pub fn store(&self, ctx: &mut IconContext, owner: Option<&Client>) -> Option<PathBuf> {
        let owner = owner?;
        let user_root = ctx.prefs.user_root()?;
        cache::store(ctx.display, &user_root, owner)
    }

    pub fn set_position(&mut self, display: &mut dyn Display, pos: Vector2D) {
        self.pos = pos;
        display.move_window(self.window, pos);
    }

    /// Forget the owner, which is going away.
    pub fn unlink_owner(&mut self) {
        self.owner = None;
    }

    pub fn window(&self) -> x::Window {
        self.window
    }

    pub fn pos(&self) -> Vector2D {
        self.pos
    }

    pub fn owner(&self) -> Option<x::Window> {
        self.owner
    }

    pub fn icon_win(&self) -> Option<x::Window> {
        self.icon_win
    }

    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    pub fn file_image(&self) -> Option<&SharedImage> {
        self.file_image.as_ref()
    }

    pub fn pixmap(&self) -> Option<x::Pixmap> {
        self.pixmap
    }

    pub fn icon_name(&self) -> Option<&str> {
        self.icon_name.as_deref()
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    pub fn needs_update(&self) -> bool {
        self.force_paint
    }

    pub fn selection_timer(&self) -> Option<TimerHandle> {
        self.handler
    }
}
