//! Unix-socket listeners that accept newline-delimited JSON.
//!
//! * [`relay`] takes raw swipe events from a helper that can read the
//!   touchpad when swipegrd cannot (a libinput reader, a bus bridge, …).
//! * [`control`] takes live settings [`Command`](crate::command::Command)s
//!   from scripts and settings front-ends.
//!
//! Both accept one connection at a time and parse each line on its own.

pub mod control;
pub mod relay;

use log::{debug, error, info};
use serde::de::DeserializeOwned;
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixListener;
use std::path::Path;
use std::sync::mpsc;

/// Errors produced by the socket listeners.
#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Parse one line.  Blank lines yield `Ok(None)`.
pub fn parse_line<T: DeserializeOwned>(text: &str) -> Result<Option<T>, SocketError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(text)?))
}

/// Deletes the socket file when dropped.
struct SocketFile<'a>(&'a Path);

impl Drop for SocketFile<'_> {
    fn drop(&mut self) {
        if std::fs::remove_file(self.0).is_ok() {
            debug!("removed {}", self.0.display());
        }
    }
}

/// Bind `path` and forward every line that parses as `T` into `sink`.
///
/// Blocks until `sink` is closed.  Lines that fail to parse are logged and
/// skipped.  A stale socket file is replaced, and the socket file is
/// removed again however this returns.
fn serve<T>(path: &Path, sink: &mpsc::Sender<T>) -> Result<(), SocketError>
where
    T: DeserializeOwned + std::fmt::Debug,
{
    let _ = std::fs::remove_file(path);

    let listener = UnixListener::bind(path)?;
    let _socket = SocketFile(path);
    info!("listening on {}", path.display());

    for stream in listener.incoming() {
        match stream {
            Ok(stream) => {
                debug!("client connected to {}", path.display());
                let reader = BufReader::new(stream);
                for line in reader.lines() {
                    match line {
                        Ok(text) => match parse_line::<T>(&text) {
                            Ok(Some(item)) => {
                                debug!("received {:?}", item);
                                if sink.send(item).is_err() {
                                    info!("sink closed, shutting down {}", path.display());
                                    return Ok(());
                                }
                            }
                            Ok(None) => {}
                            Err(e) => {
                                error!("bad line: {}: {}", text, e);
                            }
                        },
                        Err(e) => {
                            error!("read error: {}", e);
                            break;
                        }
                    }
                }
                debug!("client disconnected");
            }
            Err(e) => {
                error!("accept error: {}", e);
            }
        }
    }
    Ok(())
}
