use anyhow::Result;
use clap::Parser;
use crossbeam::channel;
use expanduser::expanduser;
use std::{path::PathBuf, thread};
use window_manager::WindowManager;

mod args;
mod atoms;
mod client;
mod commands;
mod config;
mod display;
mod drawstring;
mod ewmh;
mod font;
mod icccm;
mod icon;
mod layout;
mod notification;
mod raster;
mod screen;
mod state;
mod timer;
mod vector;
mod window_manager;

fn main() -> Result<()> {
    setup_logging();

    let cli = args::Args::parse();
    match cli.command {
        Some(args::Commands::Start { config }) => start(expanduser(config)?),
        Some(args::Commands::Client(command)) => client::dispatch_command(command.into()),
        _ => Ok(()),
    }
}

fn setup_logging() {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(filter)
        .init();
}

fn start(config_path: PathBuf) -> Result<()> {
    let prefs = config::Preferences::load(&config_path)?;

    // Initialize the XCB connection
    let (conn, screen_num) = xcb::Connection::connect(None)?;
    // Initialize the client channel
    let (client_sender, client_receiver) = channel::unbounded();

    // Spawn the IPC thread
    thread::spawn(move || {
        if let Err(err) = client::handle_ipc(client_sender) {
            tracing::error!("control socket unavailable: {:#}", err);
        }
    });

    tracing::info!("starting miniwm on screen {}", screen_num);
    let mut wm = WindowManager::new(conn, screen_num as usize, client_receiver, prefs, config_path)?;
    wm.run()
}
