//! Unix-socket [`EventSource`] implementation.
//!
//! Binds a Unix stream socket and accepts one connection at a time.
//! Each line received is parsed as a JSON-encoded [`SwipeEvent`].
//!
//! # Wire format
//!
//! Every message is a single line of JSON followed by `\n`, either an
//! object or the `(phase, fingers, dx, dy, time)` tuple a bus signal
//! carries:
//!
//! ```json
//! {"phase":"Begin","fingers":3,"dx":0.0,"dy":0.0,"time":1000,"x":640,"y":400}
//! {"phase":"Update","fingers":3,"dx":4.5,"dy":-0.5,"time":1008}
//! ["Update",3,5.0,0.0,1016]
//! ["End",3,0.0,0.0,1024]
//! ```
//!
//! A relay disconnecting mid-swipe leaves the recognizers to be reset by
//! the next `Begin`; nothing is synthesized here.

use super::SocketError;
use crate::event::SwipeEvent;
use crate::traits::EventSource;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// An [`EventSource`] that listens on a Unix stream socket for
/// JSON-encoded swipe events.
///
/// Each accepted connection can send multiple newline-delimited events.
/// When the connection closes, the listener waits for the next one.
pub struct RelaySwipeSource {
    path: PathBuf,
}

impl RelaySwipeSource {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](EventSource::run) is called
    /// and removed when the source shuts down.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The filesystem path of the socket.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSource for RelaySwipeSource {
    type Error = SocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the sink is dropped.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<SwipeEvent>) -> Result<(), Self::Error> {
        super::serve(&self.path, &sink)
    }
}

//  Tests
