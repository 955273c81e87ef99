use anyhow::{anyhow, Context, Result};
use crossbeam::channel;
use std::{collections::VecDeque, path::PathBuf, rc::Rc, sync::Arc, thread, time::Instant};
use xcb::{x, Xid};

use crate::{
    atoms::Atoms,
    commands::{Command, WindowSelector},
    config::{Preferences, BORDER_COLOR, BORDER_COLOR_FOCUS, BORDER_WIDTH},
    display::{Cursor, Display, XcbDisplay},
    ewmh, icccm,
    icon::{
        compose::validate_icon_size,
        interaction::{
            self, ButtonPress, ClickTracker, DragEvent, DragStep, DragTracker, PressAction, Stacking,
        },
        Icon, IconContext, TileType,
    },
    layout::IconRowLayout,
    notification::{AppearanceFlags, Notification, NotificationCenter},
    screen::ScreenContext,
    state::{self, Client, State},
    timer::Timers,
    vector::Vector2D,
};

const WM_NAME: &str = "miniwm";
const ICON_GAP: i32 = 4;
// ICCCM WM_STATE values.
const ICONIC_STATE: u32 = 3;

/// An icon following the pointer.
struct ActiveDrag {
    icon: x::Window,
    tracker: DragTracker,
}

pub struct WindowManager {
    state: State,
    conn: Arc<xcb::Connection>,
    atoms: Atoms,
    display: XcbDisplay,
    screen: ScreenContext,
    prefs: Preferences,
    config_path: PathBuf,
    notifications: NotificationCenter<x::Window>,
    timers: Timers<x::Window>,
    clicks: ClickTracker,
    drag: Option<ActiveDrag>,
    /// Events that arrived during a drag, handled once it ends.
    deferred: VecDeque<x::Event>,
    client_receiver: channel::Receiver<Command>,
}

impl WindowManager {
    pub fn new(
        conn: xcb::Connection,
        screen_num: usize,
        client_receiver: channel::Receiver<Command>,
        prefs: Preferences,
        config_path: PathBuf,
    ) -> Result<WindowManager> {
        let conn = Arc::new(conn);
        let atoms = Atoms::intern_all(&conn)?;

        let monitor_size = {
            let setup = conn.get_setup();
            let screen = setup
                .roots()
                .nth(screen_num)
                .ok_or_else(|| anyhow!("Screen {} not found.", screen_num))?;
            Vector2D::new(screen.width_in_pixels().into(), screen.height_in_pixels().into())
        };

        let display = XcbDisplay::new(Arc::clone(&conn), screen_num, &prefs.theme, &prefs.title_font)
            .context("cannot set up the display")?;
        let screen = ScreenContext::new(display.root(), &prefs, display.font_metrics().clone());
        let mut state = State::default();
        state.root = display.root();
        state.monitor_size = monitor_size;

        Ok(WindowManager {
            state,
            conn,
            atoms,
            display,
            screen,
            prefs,
            config_path,
            notifications: NotificationCenter::default(),
            timers: Timers::default(),
            clicks: ClickTracker::default(),
            drag: None,
            deferred: VecDeque::new(),
            client_receiver,
        })
    }

    pub fn run(&mut self) -> Result<()> {
        if self.become_window_manager().is_err() {
            return Err(anyhow!("Another window manager is running."));
        }
        self.setup_ewmh()?;

        // Spawn XCB event thread
        let (sender, receiver) = channel::unbounded();
        let conn = Arc::clone(&self.conn);
        thread::spawn(move || loop {
            match conn.wait_for_event() {
                Ok(xcb::Event::X(event)) => {
                    if sender.send(event).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(xcb::Error::Protocol(err)) => tracing::debug!("protocol error: {:?}", err),
                Err(err) => {
                    tracing::error!("X connection lost: {}", err);
                    break;
                }
            }
        });

        let commands = self.client_receiver.clone();
        loop {
            let timer = match self.timers.time_until_next(Instant::now()) {
                Some(timeout) => channel::after(timeout),
                None => channel::never(),
            };

            channel::select! {
                recv(receiver) -> event => {
                    let event = event.context("X event thread stopped")?;
                    if let Err(err) = self.handle_event(event) {
                        tracing::warn!("error handling event: {:#}", err);
                    }
                },
                recv(commands) -> command => match command.context("control socket closed")? {
                    Command::Quit => {
                        tracing::info!("quitting");
                        break;
                    }
                    command => {
                        if let Err(err) = self.handle_command(command) {
                            tracing::warn!("command failed: {:#}", err);
                        }
                    }
                },
                recv(timer) -> _ => {},
            }

            self.run_timers();
            self.conn.flush()?;
        }

        self.shutdown();
        Ok(())
    }

    fn become_window_manager(&self) -> Result<()> {
        let cookie = self.conn.send_request_checked(&x::ChangeWindowAttributes {
            window: self.state.root,
            value_list: &[
                x::Cw::EventMask(
                    x::EventMask::SUBSTRUCTURE_NOTIFY
                        | x::EventMask::SUBSTRUCTURE_REDIRECT
                        | x::EventMask::BUTTON_PRESS
                        | x::EventMask::BUTTON_RELEASE,
                ),
                x::Cw::Cursor(self.display.arrow_cursor()),
            ],
        });

        self.conn.check_request(cookie)?;

        Ok(())
    }

    fn setup_ewmh(&mut self) -> Result<()> {
        let child = self.conn.generate_id();
        let cookie = self.conn.send_request_checked(&x::CreateWindow {
            depth: x::COPY_FROM_PARENT as u8,
            wid: child,
            parent: self.state.root,
            x: -1,
            y: -1,
            width: 1,
            height: 1,
            border_width: 0,
            class: x::WindowClass::InputOnly,
            visual: x::COPY_FROM_PARENT,
            value_list: &[],
        });
        self.conn.check_request(cookie)?;
        self.state.child = child;

        ewmh::set_supported(&self.conn, &self.atoms, self.state.root);
        ewmh::set_supporting_wm_check(&self.conn, &self.atoms, self.state.root, child);
        ewmh::set_wm_name(&self.conn, &self.atoms, child, WM_NAME);

        Ok(())
    }

    /// Give every icon window back to the root before leaving.
    fn shutdown(&mut self) {
        let icons: Vec<x::Window> = self.state.icons().keys().copied().collect();
        for icon in icons {
            self.destroy_icon(icon);
        }
        self.screen.release(&mut self.display);
        if let Err(err) = self.conn.flush() {
            tracing::warn!("cannot flush on shutdown: {}", err);
        }
    }

    fn handle_event(&mut self, event: x::Event) -> Result<()> {
        if self.drag.is_some() {
            if let Some(drag_event) = DragEvent::from_event(&event) {
                return self.step_drag(drag_event);
            }
            if let x::Event::Expose(ev) = &event {
                self.handle_expose_event(ev);
            } else {
                self.deferred.push_back(event);
            }
            return Ok(());
        }

        match event {
            x::Event::ButtonPress(ev) => self.handle_button_press_event(&ev)?,
            x::Event::ConfigureRequest(ev) => self.handle_configure_request_event(&ev)?,
            x::Event::MapRequest(ev) => self.handle_map_request_event(&ev)?,
            x::Event::DestroyNotify(ev) => self.handle_destroy_notify_event(&ev)?,
            x::Event::PropertyNotify(ev) => self.handle_property_notify_event(&ev)?,
            x::Event::ClientMessage(ev) => self.handle_client_message_event(&ev)?,
            x::Event::Expose(ev) => self.handle_expose_event(&ev),
            ev => tracing::trace!("unhandled event {:?}", ev),
        }
        Ok(())
    }

    fn handle_map_request_event(&mut self, ev: &x::MapRequestEvent) -> Result<()> {
        let window = ev.window();
        if let Some(client) = self.state.client(window) {
            if client.iconified {
                return self.deiconify(window);
            }
            self.conn.send_request(&x::MapWindow { window });
            return Ok(());
        }

        // Ask the X server for the window's geometry
        let cookie = self.conn.send_request(&x::GetGeometry {
            drawable: x::Drawable::Window(window),
        });
        let resp = self.conn.wait_for_reply(cookie)?;

        let mut client = Client::new(window);
        client.pos = Vector2D::new(resp.x().into(), resp.y().into());
        client.size = Vector2D::new(resp.width().into(), resp.height().into());
        self.read_icon_properties(&mut client)?;
        let keys = client.class_keys();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        client.always_user_icon = self.prefs.forces_user_icon(&keys);
        let iconic = client.wm_hints.as_ref().is_some_and(|hints| {
            hints.flags.contains(icccm::WmHintsFlags::STATE) && hints.initial_state == ICONIC_STATE
        });
        tracing::debug!(
            ?window,
            instance = ?client.wm_instance,
            class = ?client.wm_class,
            "managing window"
        );

        self.state.add_client(client)?;

        self.conn.send_request(&x::ChangeWindowAttributes {
            window,
            value_list: &[
                x::Cw::BorderPixel(BORDER_COLOR),
                x::Cw::EventMask(x::EventMask::PROPERTY_CHANGE | x::EventMask::STRUCTURE_NOTIFY),
            ],
        });
        self.conn.send_request(&x::ConfigureWindow {
            window,
            value_list: &[x::ConfigWindow::BorderWidth(BORDER_WIDTH as u32)],
        });
        self.conn.send_request(&x::ChangeSaveSet {
            mode: x::SetMode::Insert,
            window,
        });

        if iconic {
            return self.iconify(window);
        }
        self.conn.send_request(&x::MapWindow { window });
        self.focus_window(window)
    }

    fn read_icon_properties(&self, client: &mut Client) -> Result<()> {
        let window = client.window;
        let icon_size = self.screen.icon_size();

        client.wm_hints = icccm::get_wm_hints(&self.conn, window)?;
        (client.wm_instance, client.wm_class) = icccm::get_wm_class(&self.conn, window)?;
        client.wm_icon_name = icccm::get_wm_icon_name(&self.conn, window)?;
        client.net_wm_icon_name = ewmh::get_wm_icon_name(&self.conn, &self.atoms, window)?;
        client.net_icon_image = ewmh::get_wm_icon(&self.conn, &self.atoms, window, icon_size)?
            .map(|image| Rc::new(validate_icon_size(image, icon_size)));
        Ok(())
    }

    fn handle_destroy_notify_event(&mut self, ev: &x::DestroyNotifyEvent) -> Result<()> {
        let window = ev.window();
        if let Some(icon) = self.state.icon_of(window) {
            self.destroy_icon(icon);
        }
        let refocus = if self.state.focused() == Some(window) {
            self.state.last_focused()
        } else {
            None
        };
        match self.state.remove_client(window) {
            Ok(_) => tracing::debug!(?window, "forgot window"),
            Err(state::Error::ClientNotFound) => return Ok(()),
            Err(err) => tracing::warn!("cannot forget {:?}: {}", window, err),
        }

        match refocus {
            Some(last) if self.state.client(last).is_some_and(|client| !client.iconified) => {
                self.focus_window(last)
            }
            _ => Ok(()),
        }
    }

    fn handle_configure_request_event(&self, ev: &x::ConfigureRequestEvent) -> Result<()> {
        let cookie = self.conn.send_request_checked(&x::ConfigureWindow {
            window: ev.window(),
            value_list: &[
                x::ConfigWindow::X(ev.x() as i32),
                x::ConfigWindow::Y(ev.y() as i32),
                x::ConfigWindow::Width(ev.width() as u32),
                x::ConfigWindow::Height(ev.height() as u32),
                x::ConfigWindow::BorderWidth(BORDER_WIDTH as u32),
                x::ConfigWindow::StackMode(ev.stack_mode()),
            ],
        });
        self.conn.check_request(cookie)?;

        Ok(())
    }

    fn handle_property_notify_event(&mut self, ev: &x::PropertyNotifyEvent) -> Result<()> {
        let window = ev.window();
        let atom = ev.atom();
        let Some(client) = self.state.client_mut(window) else {
            return Ok(());
        };
        let icon_size = self.screen.icon_size();

        if atom == x::ATOM_WM_HINTS {
            client.wm_hints = icccm::get_wm_hints(&self.conn, window)?;
        } else if atom == self.atoms.net_wm_icon {
            client.net_icon_image = ewmh::get_wm_icon(&self.conn, &self.atoms, window, icon_size)?
                .map(|image| Rc::new(validate_icon_size(image, icon_size)));
        } else if atom == x::ATOM_WM_ICON_NAME {
            client.wm_icon_name = icccm::get_wm_icon_name(&self.conn, window)?;
            if client.net_has_icon_title {
                return Ok(());
            }
            let title = client.wm_icon_name.clone();
            return self.change_icon_title(window, title);
        } else if atom == self.atoms.net_wm_icon_name {
            client.net_wm_icon_name = ewmh::get_wm_icon_name(&self.conn, &self.atoms, window)?;
            client.net_has_icon_title = client.net_wm_icon_name.is_some();
            let title = client.net_wm_icon_name.clone().or_else(|| client.wm_icon_name.clone());
            return self.change_icon_title(window, title);
        } else {
            return Ok(());
        }

        if let Some(icon) = self.state.icon_of(window) {
            self.with_icon(icon, |icon, ctx, owner| icon.update(ctx, owner));
        }
        Ok(())
    }

    fn change_icon_title(&mut self, window: x::Window, title: Option<String>) -> Result<()> {
        if let Some(icon) = self.state.icon_of(window) {
            self.with_icon(icon, |icon, ctx, owner| icon.change_title(ctx, owner, title));
        }
        Ok(())
    }

    fn handle_client_message_event(&mut self, ev: &x::ClientMessageEvent) -> Result<()> {
        if ev.r#type() != self.atoms.wm_change_state {
            return Ok(());
        }
        if let x::ClientMessageData::Data32([ICONIC_STATE, ..]) = ev.data() {
            return self.iconify(ev.window());
        }
        Ok(())
    }

    fn handle_expose_event(&mut self, ev: &x::ExposeEvent) {
        if ev.count() != 0 {
            return;
        }
        self.with_icon(ev.window(), |icon, ctx, owner| icon.paint(ctx, owner));
    }

    fn handle_button_press_event(&mut self, ev: &x::ButtonPressEvent) -> Result<()> {
        // Presses grabbed on icon frames freeze the pointer.
        self.conn.send_request(&x::AllowEvents {
            mode: x::Allow::AsyncPointer,
            time: x::CURRENT_TIME,
        });

        let press = ButtonPress::from(ev);
        let Some(icon) = self.state.icon(press.window) else {
            if self.state.client(press.window).is_some() {
                self.focus_window(press.window)?;
            }
            return Ok(());
        };
        let owner = icon.owner();

        let action = interaction::on_button_press(
            &press,
            self.state.modal,
            &mut self.clicks,
            &self.prefs,
            icon.pos(),
        );
        match action {
            PressAction::Ignore => {}
            PressAction::Deiconify => {
                if let Some(owner) = owner {
                    self.deiconify(owner)?;
                }
            }
            PressAction::OpenMenu { root } => {
                tracing::debug!(?root, "no miniwindow menu to open");
            }
            PressAction::Begin {
                stacking,
                toggle_selection,
                drag,
            } => {
                match stacking {
                    Some(Stacking::Raise) => self.display.raise(press.window),
                    Some(Stacking::Lower) => self.display.lower(press.window),
                    None => {}
                }
                if toggle_selection {
                    self.toggle_icon_selection(press.window);
                }
                if !self.display.grab_pointer(press.window) {
                    tracing::warn!("cannot grab the pointer to drag {:?}", press.window);
                }
                self.state.modal = true;
                self.drag = Some(ActiveDrag {
                    icon: press.window,
                    tracker: drag,
                });
            }
        }
        Ok(())
    }

    fn step_drag(&mut self, event: DragEvent) -> Result<()> {
        let Some(active) = self.drag.as_mut() else {
            return Ok(());
        };
        let icon_window = active.icon;

        match active.tracker.step(event) {
            DragStep::Continue => {}
            DragStep::StartMove(pos) => {
                self.display.change_pointer_grab(Cursor::Move);
                self.display.move_window(icon_window, pos);
            }
            DragStep::Move(pos) => self.display.move_window(icon_window, pos),
            DragStep::Finish(end) => {
                self.end_drag();

                let mut owner_window = None;
                if let Some((icon, owner)) = self.state.icon_and_owner_mut(icon_window) {
                    icon.set_position(&mut self.display, end.pos);
                    if let Some(owner) = owner {
                        if end.moved {
                            owner.icon_moved = true;
                        }
                        owner.icon_pos = end.pos;
                        owner_window = Some(owner.window);
                    }
                }

                if self.prefs.auto_arrange_icons {
                    self.arrange_icons(true);
                }
                if self.prefs.single_click && !end.has_moved {
                    if let Some(owner) = owner_window {
                        self.deiconify(owner)?;
                    }
                }
                self.replay_deferred();
            }
        }
        Ok(())
    }

    fn end_drag(&mut self) {
        self.drag = None;
        self.state.modal = false;
        self.display.ungrab_pointer();
    }

    /// Handle what was held back during a drag, in order. A new drag started
    /// by one of these holds back the rest again.
    fn replay_deferred(&mut self) {
        for event in std::mem::take(&mut self.deferred) {
            if let Err(err) = self.handle_event(event) {
                tracing::warn!("error handling deferred event: {:#}", err);
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Quit => {}
            Command::Iconify { selector } => {
                let window = self.state.select_client(&selector)?.window;
                self.iconify(window)?;
            }
            Command::Deiconify { selector } => {
                let window = self.state.select_client(&selector)?.window;
                self.deiconify(window)?;
            }
            Command::SetIconFile { selector, file } => {
                let icon = self.selected_icon(&selector)?;
                self.with_icon(icon, |icon, ctx, owner| icon.change_image_file(ctx, owner, Some(file.as_str())))
                    .ok_or(state::Error::IconNotFound)??;
            }
            Command::StoreIcon { selector } => {
                let icon = self.selected_icon(&selector)?;
                let stored = self
                    .with_icon(icon, |icon, ctx, owner| icon.store(ctx, owner.as_deref()))
                    .flatten();
                match stored {
                    Some(path) => tracing::info!("icon stored in {}", path.display()),
                    None => tracing::warn!("no icon to store for {:?}", icon),
                }
            }
            Command::SelectIcon { selector } => {
                let icon = self.selected_icon(&selector)?;
                self.toggle_icon_selection(icon);
            }
            Command::HighlightIcon { selector, on } => {
                let icon = self.selected_icon(&selector)?;
                self.with_icon(icon, |icon, ctx, owner| icon.set_highlighted(ctx, owner, on));
            }
            Command::ShadowIcon { selector, on } => {
                let icon = self.selected_icon(&selector)?;
                self.with_icon(icon, |icon, ctx, owner| icon.set_shadowed(ctx, owner, on));
            }
            Command::DockIcon {
                instance,
                class,
                command,
                clip,
            } => {
                let tile = if clip { TileType::Clip } else { TileType::Normal };
                let mut ctx = IconContext::new(&mut self.display, &mut self.screen, &self.prefs);
                let icon = Icon::create_for_dock(
                    &mut ctx,
                    &mut self.notifications,
                    command.as_deref(),
                    instance.as_deref(),
                    class.as_deref(),
                    tile,
                )?;
                ctx.display.map(icon.window());
                tracing::debug!(icon = ?icon.window(), "docked application icon");
                self.state.add_icon(icon);
            }
            Command::ReloadTheme => self.reload_theme()?,
        }
        Ok(())
    }

    fn selected_icon(&self, selector: &WindowSelector) -> Result<x::Window> {
        let client = self.state.select_client(selector)?;
        Ok(client.icon.ok_or(state::Error::IconNotFound)?)
    }

    fn reload_theme(&mut self) -> Result<()> {
        let theme = Preferences::load(&self.config_path)?.theme;
        self.display.set_theme(&theme)?;
        self.screen.set_theme(&mut self.display, theme.clone());
        self.prefs.theme = theme;

        for notification in [
            Notification::IconTileChanged,
            Notification::IconAppearanceChanged(AppearanceFlags::COLOR),
        ] {
            for icon in self.notifications.post(&notification) {
                self.with_icon(icon, |icon, ctx, owner| icon.on_notification(ctx, owner, &notification));
            }
        }
        Ok(())
    }

    /// Toggle an icon's selection together with its owner's.
    fn toggle_icon_selection(&mut self, icon_window: x::Window) {
        let Some((icon, owner)) = self.state.icon_and_owner_mut(icon_window) else {
            return;
        };
        let mut ctx = IconContext::new(&mut self.display, &mut self.screen, &self.prefs);
        icon.select(&mut ctx, &mut self.timers, Instant::now());
        if let Some(owner) = owner {
            owner.selected = !owner.selected;
        }
    }

    fn iconify(&mut self, window: x::Window) -> Result<()> {
        let Some(client) = self.state.client_mut(window) else {
            return Err(state::Error::ClientNotFound.into());
        };
        if client.iconified {
            return Ok(());
        }
        client.iconified = true;
        if !client.icon_moved {
            if let Some(pos) = client.wm_hints.as_ref().and_then(|hints| hints.icon_pos) {
                client.icon_pos = pos;
            }
        }

        let mut ctx = IconContext::new(&mut self.display, &mut self.screen, &self.prefs);
        let icon = Icon::create_for_window(&mut ctx, &mut self.notifications, client)?;
        ctx.display.map(icon.window());
        self.state.add_icon(icon);
        self.conn.send_request(&x::UnmapWindow { window });
        tracing::debug!(?window, "iconified");

        if self.prefs.auto_arrange_icons {
            self.arrange_icons(false);
        }
        Ok(())
    }

    fn deiconify(&mut self, window: x::Window) -> Result<()> {
        let icon = {
            let client = self.state.client_mut(window).ok_or(state::Error::ClientNotFound)?;
            if !client.iconified {
                return Ok(());
            }
            client.iconified = false;
            client.icon
        };
        if let Some(icon) = icon {
            self.destroy_icon(icon);
        }

        self.conn.send_request(&x::MapWindow { window });
        tracing::debug!(?window, "deiconified");
        if self.prefs.auto_arrange_icons {
            self.arrange_icons(false);
        }
        self.focus_window(window)
    }

    fn destroy_icon(&mut self, icon_window: x::Window) {
        if self.drag.as_ref().is_some_and(|drag| drag.icon == icon_window) {
            self.end_drag();
        }
        let icon = match self.state.remove_icon(icon_window) {
            Ok(icon) => icon,
            Err(err) => {
                tracing::debug!("cannot destroy {:?}: {}", icon_window, err);
                return;
            }
        };
        let owner = icon.owner().and_then(|owner| self.state.client(owner));
        let mut ctx = IconContext::new(&mut self.display, &mut self.screen, &self.prefs);
        icon.destroy(&mut ctx, &mut self.notifications, &mut self.timers, owner);
    }

    fn arrange_icons(&mut self, force: bool) {
        let layout = IconRowLayout {
            monitor_size: self.state.monitor_size,
            icon_size: self.screen.icon_size() as i32,
            gap: ICON_GAP,
        };
        for (icon_window, pos) in layout.apply_layout(self.state.clients_mut(), force) {
            if let Some(icon) = self.state.icon_mut(icon_window) {
                icon.set_position(&mut self.display, pos);
            }
        }
    }

    /// Run `f` on an icon with its owner, if the icon exists.
    fn with_icon<R>(
        &mut self,
        icon_window: x::Window,
        f: impl FnOnce(&mut Icon, &mut IconContext<'_>, Option<&mut Client>) -> R,
    ) -> Option<R> {
        let (icon, owner) = self.state.icon_and_owner_mut(icon_window)?;
        let mut ctx = IconContext::new(&mut self.display, &mut self.screen, &self.prefs);
        Some(f(icon, &mut ctx, owner))
    }

    fn run_timers(&mut self) {
        let now = Instant::now();
        while let Some((_, icon)) = self.timers.pop_due(now) {
            self.with_icon(icon, |icon, ctx, _| icon.cycle_selection(ctx));
        }
    }

    fn focus_window(&mut self, window: x::Window) -> Result<()> {
        if let Some(focused) = self.state.focused() {
            self.conn.send_request(&x::ChangeWindowAttributes {
                window: focused,
                value_list: &[x::Cw::BorderPixel(BORDER_COLOR)],
            });
        }
        self.state.focus_client(&WindowSelector::Window(window.resource_id()))?;

        self.conn.send_request(&x::ChangeWindowAttributes {
            window,
            value_list: &[x::Cw::BorderPixel(BORDER_COLOR_FOCUS)],
        });

        let focus_cookie = self.conn.send_request_checked(&x::SetInputFocus {
            revert_to: x::InputFocus::PointerRoot,
            focus: window,
            time: x::CURRENT_TIME,
        });
        self.conn.check_request(focus_cookie)?;

        self.conn.send_request(&x::ConfigureWindow {
            window,
            value_list: &[x::ConfigWindow::StackMode(x::StackMode::Above)],
        });
        ewmh::set_active_window(&self.conn, &self.atoms, self.state.root, window);

        Ok(())
    }
}
