use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_PATH;

#[derive(Parser)]
#[command(author,
    version,
    about,
    long_about = None,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true,
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}


#[derive(Subcommand)]
pub enum Commands {
    /// Start the window manager
    Start{
        ///Sets the path of the config file
        #[clap(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: String,
    },
    /// Send a command to the window manager
    #[command(subcommand)]
    Client(Command),
}


#[derive(Subcommand)]
pub enum Command {
    Quit,
    /// Turn a window into a miniwindow
    Iconify {
        #[clap(flatten)]
        selector: WindowSelector,
    },
    /// Bring a window back from its miniwindow
    Deiconify {
        #[clap(flatten)]
        selector: WindowSelector,
    },
    /// Show an image file in a miniwindow
    SetIconFile {
        #[clap(flatten)]
        selector: WindowSelector,
        #[clap(value_name = "FILE")]
        file: String,
    },
    /// Save the icon supplied by a window in the icon cache
    StoreIcon {
        #[clap(flatten)]
        selector: WindowSelector,
    },
    /// Toggle the selection of a miniwindow
    SelectIcon {
        #[clap(flatten)]
        selector: WindowSelector,
    },
    /// Highlight a miniwindow
    HighlightIcon {
        #[clap(flatten)]
        selector: WindowSelector,
        #[clap(long)]
        off: bool,
    },
    /// Shade a miniwindow
    ShadowIcon {
        #[clap(flatten)]
        selector: WindowSelector,
        #[clap(long)]
        off: bool,
    },
    /// Show the icon of an application without a window
    DockIcon {
        #[clap(long, short)]
        instance: Option<String>,
        #[clap(long, short)]
        class: Option<String>,
        #[clap(long)]
        command: Option<String>,
        /// Use the clip tile
        #[clap(long)]
        clip: bool,
    },
    /// Reload the theme from the config file
    ReloadTheme,
}

#[derive(clap::Args, Clone)]
#[group(multiple = false)]
pub struct WindowSelector {
    #[clap(long, short, default_value = "true")]
    pub focused: bool,

    #[clap(long, short)]
    pub window: Option<u32>,
}
