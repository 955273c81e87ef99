use indexmap::IndexMap;
use thiserror::Error;
use xcb::{x, Xid, XidNew};

use crate::{
    commands::WindowSelector, icccm::WmHints, icon::Icon, raster::SharedImage, vector::Vector2D,
};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Client not found.")]
    ClientNotFound,
    #[error("Client already exists.")]
    ClientAlreadyExists,
    #[error("Icon not found.")]
    IconNotFound,
}

/// A client is everything we know by a window
#[derive(Clone, Debug, PartialEq)]
pub struct Client {
    /// The window id
    pub window: x::Window,
    /// The position of the window
    pub pos: Vector2D,
    /// The size of the window
    pub size: Vector2D,
    pub wm_hints: Option<WmHints>,
    /// The `_NET_WM_ICON` image, if the client set one.
    pub net_icon_image: Option<SharedImage>,
    pub wm_instance: Option<String>,
    pub wm_class: Option<String>,
    pub net_wm_icon_name: Option<String>,
    pub wm_icon_name: Option<String>,
    /// The icon title came from `_NET_WM_ICON_NAME`.
    pub net_has_icon_title: bool,
    /// Where the miniwindow goes.
    pub icon_pos: Vector2D,
    /// The user moved the miniwindow.
    pub icon_moved: bool,
    pub selected: bool,
    /// Always show the icon database image.
    pub always_user_icon: bool,
    pub iconified: bool,
    /// The miniwindow frame while iconified.
    pub icon: Option<x::Window>,
}

impl Client {
    pub fn new(window: x::Window) -> Self {
        Self {
            window,
            pos: Vector2D::default(),
            size: Vector2D::default(),
            wm_hints: None,
            net_icon_image: None,
            wm_instance: None,
            wm_class: None,
            net_wm_icon_name: None,
            wm_icon_name: None,
            net_has_icon_title: false,
            icon_pos: Vector2D::default(),
            icon_moved: false,
            selected: false,
            always_user_icon: false,
            iconified: false,
            icon: None,
        }
    }

    /// Icon database keys for this window, most specific first.
    pub fn class_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if let (Some(instance), Some(class)) = (&self.wm_instance, &self.wm_class) {
            keys.push(format!("{instance}.{class}"));
        }
        keys.extend(self.wm_class.clone());
        keys.extend(self.wm_instance.clone());
        keys
    }
}

pub struct State {
    /// The root window.
    pub root: x::Window,
    /// The window manager window.
    pub child: x::Window,
    /// The list of clients managed by the window manager
    clients: IndexMap<x::Window, Client>,
    /// Miniwindows by frame window.
    icons: IndexMap<x::Window, Icon>,
    /// The currently focused window.
    focused: Option<x::Window>,
    /// The last focused window.
    last_focused: Option<x::Window>,
    /// An interaction holds the pointer, presses on icons are ignored.
    pub modal: bool,
    /// The size of the monitor.
    pub monitor_size: Vector2D,
}

impl Default for State {
    fn default() -> Self {
        Self {
            root: x::Window::none(),
            child: x::Window::none(),
            clients: Default::default(),
            icons: Default::default(),
            focused: Default::default(),
            last_focused: Default::default(),
            modal: false,
            monitor_size: Default::default(),
        }
    }
}

impl State {
    /// Add a client to the state.
    ///
    /// Return an error if the client already exists.
    pub fn add_client(&mut self, client: Client) -> Result<(), Error> {
        if self.clients.contains_key(&client.window) {
            Err(Error::ClientAlreadyExists)
        } else {
            self.clients.insert(client.window, client);

            Ok(())
        }
    }

    /// Remove a client from the state and return it.
    ///
    /// Its miniwindow, if still around, forgets it.
    /// Return an error if the client is not found.
    pub fn remove_client(&mut self, window: x::Window) -> Result<Client, Error> {
        let client = self.clients.shift_remove(&window).ok_or(Error::ClientNotFound)?;

        if let Some(icon) = client.icon.and_then(|icon| self.icons.get_mut(&icon)) {
            icon.unlink_owner();
        }
        if self.focused == Some(window) {
            self.focused = None;
        }
        if self.last_focused == Some(window) {
            self.last_focused = None;
        }
        Ok(client)
    }

    pub fn client(&self, window: x::Window) -> Option<&Client> {
        self.clients.get(&window)
    }

    pub fn client_mut(&mut self, window: x::Window) -> Option<&mut Client> {
        self.clients.get_mut(&window)
    }

    pub fn clients_mut(&mut self) -> &mut IndexMap<x::Window, Client> {
        &mut self.clients
    }

    /// Select a client using a selector.
    ///
    /// Return an error if no matching client has been found.
    pub fn select_client(&self, selector: &WindowSelector) -> Result<&Client, Error> {
        let window = self.selected_window(selector)?;
        self.clients.get(&window).ok_or(Error::ClientNotFound)
    }

    fn selected_window(&self, selector: &WindowSelector) -> Result<x::Window, Error> {
        match selector {
            WindowSelector::Focused => self.focused.ok_or(Error::ClientNotFound),
            WindowSelector::Window(window) => Ok(unsafe { x::Window::new(*window) }),
        }
    }

    /// Focus a client, saving the last focused client.
    ///
    /// Return an error if the client is not found.
    pub fn focus_client(&mut self, selector: &WindowSelector) -> Result<Option<x::Window>, Error> {
        // Root window focus is used to unfocus the current window.
        if let WindowSelector::Window(window) = selector {
            if self.root.resource_id() == *window {
                self.set_focused(None);
                return Ok(None);
            }
        }

        let window = self.select_client(selector)?.window;

        self.set_focused(Some(window));
        Ok(Some(window))
    }

    /// Set the focused window.
    /// Save the last focused window.
    fn set_focused(&mut self, window: Option<x::Window>) {
        self.last_focused = self.focused;
        self.focused = window;
    }

    /// Get the focused window.
    pub fn focused(&self) -> Option<x::Window> {
        self.focused
    }

    /// Get the last focused window.
    pub fn last_focused(&self) -> Option<x::Window> {
        self.last_focused
    }

    /// Add a miniwindow, linking it to its owner.
    pub fn add_icon(&mut self, icon: Icon) {
        if let Some(owner) = icon.owner().and_then(|owner| self.clients.get_mut(&owner)) {
            owner.icon = Some(icon.window());
        }
        self.icons.insert(icon.window(), icon);
    }

    /// Remove a miniwindow, unlinking it from its owner.
    pub fn remove_icon(&mut self, window: x::Window) -> Result<Icon, Error> {
        let icon = self.icons.shift_remove(&window).ok_or(Error::IconNotFound)?;
        if let Some(owner) = icon.owner().and_then(|owner| self.clients.get_mut(&owner)) {
            owner.icon = None;
        }
        Ok(icon)
    }

    pub fn icon(&self, window: x::Window) -> Option<&Icon> {
        self.icons.get(&window)
    }

    pub fn icon_mut(&mut self, window: x::Window) -> Option<&mut Icon> {
        self.icons.get_mut(&window)
    }

    pub fn icons(&self) -> &IndexMap<x::Window, Icon> {
        &self.icons
    }

    /// The miniwindow of a client.
    pub fn icon_of(&self, client: x::Window) -> Option<x::Window> {
        self.clients.get(&client).and_then(|client| client.icon)
    }

    /// A miniwindow together with its owner, if the owner is still around.
    pub fn icon_and_owner_mut(&mut self, window: x::Window) -> Option<(&mut Icon, Option<&mut Client>)> {
        let icon = self.icons.get_mut(&window)?;
        let owner = icon.owner().and_then(|owner| self.clients.get_mut(&owner));
        Some((icon, owner))
    }
}
