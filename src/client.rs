use std::{
    fs,
    io::{BufReader, Read, Write},
    os::unix::net::{UnixListener, UnixStream},
    path::Path,
    thread,
};

use anyhow::{Context, Result};
use crossbeam::channel;

use crate::{
    commands::{self, Command},
    config::SOCKET_PATH,
};

/// Serve commands on the control socket, one connection per command.
pub fn handle_ipc(client_sender: channel::Sender<commands::Command>) -> Result<()> {
    if let Err(err) = fs::remove_file(SOCKET_PATH) {
        tracing::debug!("no stale socket removed: {}", err);
    }
    let listener = UnixListener::bind(SOCKET_PATH).with_context(|| format!("cannot bind {SOCKET_PATH}"))?;

    // accept connections and process them, spawning a new thread for each one
    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                let client_sender = client_sender.clone();
                thread::spawn(|| handle_client(stream, client_sender));
            }
            Err(err) => {
                tracing::error!("control socket failed: {}", err);
                break;
            }
        }
    }
    Ok(())
}

fn handle_client(stream: UnixStream, client_sender: channel::Sender<commands::Command>) {
    let mut buf = BufReader::new(stream);

    let mut data = String::new();
    if let Err(err) = buf.read_to_string(&mut data) {
        tracing::warn!("cannot read command: {}", err);
        return;
    }

    let command = match serde_json::from_str(&data) {
        Ok(command) => command,
        Err(err) => {
            tracing::warn!("invalid command {:?}: {}", data, err);
            return;
        }
    };
    if client_sender.send(command).is_err() {
        tracing::warn!("window manager is gone, dropping command");
    }
}

pub fn dispatch_command(command: Command) -> Result<()> {
    let socket = Path::new(SOCKET_PATH);
    let mut stream = UnixStream::connect(socket)
        .with_context(|| format!("cannot connect to {}, is miniwm running?", socket.display()))?;
    let serialized_command = serde_json::to_string(&command)?;

    stream.write_all(serialized_command.as_bytes())?;

    Ok(())
}
