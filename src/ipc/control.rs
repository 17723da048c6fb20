//! Unix-socket [`CommandSource`] implementation.
//!
//! Settings front-ends and scripts connect here to patch the running
//! daemon.  Each line is one JSON-encoded [`Command`]:
//!
//! ```sh
//! echo '{"SetSpeedScale":1.25}' | socat - UNIX-CONNECT:$XDG_RUNTIME_DIR/swipegrd.sock
//! echo '"Reload"' | socat - UNIX-CONNECT:$XDG_RUNTIME_DIR/swipegrd.sock
//! ```

use super::SocketError;
use crate::command::Command;
use crate::traits::CommandSource;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// A [`CommandSource`] that listens on a Unix stream socket for
/// JSON-encoded commands.
pub struct ControlSocket {
    path: PathBuf,
}

impl ControlSocket {
    /// Create a new listener bound to `path`.
    ///
    /// The socket file is created when [`run`](CommandSource::run) is called
    /// and removed when the source shuts down.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CommandSource for ControlSocket {
    type Error = SocketError;

    /// Bind the socket and start accepting connections.
    ///
    /// This method **blocks** until the sink is dropped.  Run it on a
    /// dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error> {
        super::serve(&self.path, &sink)
    }
}
