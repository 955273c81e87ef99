//! This module contains the commands which can be executed by the window manager.
//! A command represents the intent of the user to change the state of the wm.
//! From traits are implemented to convert from clap arguments to commands.

use serde::{Deserialize, Serialize};

use crate::args;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    Quit,
    Iconify {
        selector: WindowSelector,
    },
    Deiconify {
        selector: WindowSelector,
    },
    /// Show another image file in the window's miniwindow.
    SetIconFile {
        selector: WindowSelector,
        file: String,
    },
    /// Save the window's own icon in the icon cache.
    StoreIcon {
        selector: WindowSelector,
    },
    SelectIcon {
        selector: WindowSelector,
    },
    HighlightIcon {
        selector: WindowSelector,
        on: bool,
    },
    ShadowIcon {
        selector: WindowSelector,
        on: bool,
    },
    /// Put up an application icon that no window owns.
    DockIcon {
        instance: Option<String>,
        class: Option<String>,
        command: Option<String>,
        clip: bool,
    },
    /// Reload the theme from the config file.
    ReloadTheme,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub enum WindowSelector {
    Focused,
    Window(u32),
}

impl From<args::Command> for Command {
    fn from(command: args::Command) -> Self {
        match command {
            args::Command::Quit => Self::Quit,
            args::Command::Iconify { selector } => Self::Iconify {
                selector: selector.into(),
            },
            args::Command::Deiconify { selector } => Self::Deiconify {
                selector: selector.into(),
            },
            args::Command::SetIconFile { selector, file } => Self::SetIconFile {
                selector: selector.into(),
                file,
            },
            args::Command::StoreIcon { selector } => Self::StoreIcon {
                selector: selector.into(),
            },
            args::Command::SelectIcon { selector } => Self::SelectIcon {
                selector: selector.into(),
            },
            args::Command::HighlightIcon { selector, off } => Self::HighlightIcon {
                selector: selector.into(),
                on: !off,
            },
            args::Command::ShadowIcon { selector, off } => Self::ShadowIcon {
                selector: selector.into(),
                on: !off,
            },
            args::Command::DockIcon {
                instance,
                class,
                command,
                clip,
            } => Self::DockIcon {
                instance,
                class,
                command,
                clip,
            },
            args::Command::ReloadTheme => Self::ReloadTheme,
        }
    }
}

impl From<args::WindowSelector> for WindowSelector {
    fn from(selector: args::WindowSelector) -> Self {
        match selector.window {
            Some(window) => Self::Window(window),
            None => Self::Focused,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_json() {
        let command = Command::SetIconFile {
            selector: WindowSelector::Window(42),
            file: "xterm.png".to_owned(),
        };

        let json = serde_json::to_string(&command).unwrap();

        assert_eq!(
            json,
            r#"{"SetIconFile":{"selector":{"Window":42},"file":"xterm.png"}}"#
        );
        assert_eq!(serde_json::from_str::<Command>(&json).unwrap(), command);
    }

    #[test]
    fn test_from_args() {
        let command: Command = args::Command::HighlightIcon {
            selector: args::WindowSelector {
                focused: true,
                window: None,
            },
            off: true,
        }
        .into();

        assert_eq!(
            command,
            Command::HighlightIcon {
                selector: WindowSelector::Focused,
                on: false
            }
        );
    }

    #[test]
    fn test_dock_icon_from_args() {
        let command: Command = args::Command::DockIcon {
            instance: None,
            class: Some("XTerm".to_owned()),
            command: Some("/usr/bin/xterm".to_owned()),
            clip: true,
        }
        .into();

        assert_eq!(
            command,
            Command::DockIcon {
                instance: None,
                class: Some("XTerm".to_owned()),
                command: Some("/usr/bin/xterm".to_owned()),
                clip: true,
            }
        );
    }
}
