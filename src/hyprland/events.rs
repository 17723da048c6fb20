//! Reads touchpad swipe events from Hyprland's event socket.
//!
//! Hyprland emits three event types for touchpad swipes over its IPC event
//! socket (`socket2`):
//!
//! | Event           | Payload               | Becomes                     |
//! |-----------------|-----------------------|-----------------------------|
//! | `swipebegin`    | `<fingers>`           | [`HardwarePhase::Begin`]    |
//! | `swipeupdate`   | `<fingers>,<dx>,<dy>` | [`HardwarePhase::Update`]   |
//! | `swipeend`      | anything              | [`HardwarePhase::End`]      |
//!
//! These events are sent in the `EVENT>>DATA\n` format on socket2 at
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`.
//!
//! Hyprland reports neither a timestamp nor the pointer position, so
//! [`HyprlandSwipeSource`] stamps each event with the milliseconds elapsed
//! since it connected and leaves the pointer at `(0, 0)`.  `swipeend` reuses
//! the finger count from its `swipebegin`.

use crate::event::{HardwarePhase, SwipeEvent};
use crate::traits::EventSource;
use log::{debug, error, info, warn};
use std::io::{BufRead, BufReader};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Instant;

/// An [`EventSource`] that listens to Hyprland swipe events via the raw
/// IPC event socket.
///
/// This struct connects directly to Hyprland's event socket (`socket2`),
/// bypassing higher-level event listeners that do not expose swipe events.
#[derive(Debug, Default)]
pub struct HyprlandSwipeSource {
    path: Option<PathBuf>,
}

impl HyprlandSwipeSource {
    /// Connect to the socket of the running Hyprland instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect to an explicit socket path instead.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }
}

/// Resolve the Hyprland event socket path.
///
/// Hyprland stores its sockets at
/// `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/.socket2.sock`.
fn socket2_path() -> Result<PathBuf, HyprlandSourceError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandSourceError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandSourceError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!(
        "{}/hypr/{}/.socket2.sock",
        runtime_dir, his
    )))
}

/// Parse a single event line from socket2.
///
/// Lines have the form `EVENT>>DATA\n`.  A namespace prefix on the event
/// name (`touchpad:swipebegin`) is stripped.
fn parse_event_line(line: &str) -> Option<(&str, &str)> {
    let sep = line.find(">>")?;
    let raw_event = &line[..sep];
    let event = raw_event
        .rsplit_once(':')
        .map(|(_, name)| name)
        .unwrap_or(raw_event);
    Some((event, &line[sep + 2..]))
}

/// Finger count of the swipe in progress.
#[derive(Debug, Default)]
struct Episode {
    fingers: Option<u32>,
}

/// Turn one socket2 event into a [`SwipeEvent`], if it is a swipe.
fn translate(event: &str, data: &str, episode: &mut Episode, time: u32) -> Option<SwipeEvent> {
    match event {
        "swipebegin" => {
            let fingers = data.trim().parse::<u32>().ok()?;
            episode.fingers = Some(fingers);
            Some(SwipeEvent::new(HardwarePhase::Begin, fingers, 0.0, 0.0, time))
        }
        "swipeupdate" => {
            // Format: "<fingers>,<dx>,<dy>"
            let parts: Vec<&str> = data.trim().split(',').collect();
            if parts.len() != 3 {
                return None;
            }
            let fingers = parts[0].trim().parse::<u32>().ok()?;
            let dx = parse_delta(parts[1])?;
            let dy = parse_delta(parts[2])?;
            episode.fingers = Some(fingers);
            Some(SwipeEvent::new(HardwarePhase::Update, fingers, dx, dy, time))
        }
        "swipeend" => {
            let fingers = episode
                .fingers
                .take()
                .or_else(|| data.trim().parse::<u32>().ok())?;
            Some(SwipeEvent::new(HardwarePhase::End, fingers, 0.0, 0.0, time))
        }
        _ => None,
    }
}

/// A finite motion delta.  `f64::from_str` also accepts `nan` and `inf`.
fn parse_delta(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Milliseconds since `start`, wrapping like a 32-bit event clock.
fn event_time(start: Instant) -> u32 {
    start.elapsed().as_millis() as u32
}

impl EventSource for HyprlandSwipeSource {
    type Error = HyprlandSourceError;

    /// Connect to Hyprland's event socket and start forwarding swipe events.
    ///
    /// This method **blocks** until the socket is closed or an error occurs.
    /// Run it on a dedicated thread.
    fn run(&mut self, sink: mpsc::Sender<SwipeEvent>) -> Result<(), Self::Error> {
        let path = match &self.path {
            Some(p) => p.clone(),
            None => socket2_path()?,
        };
        info!("connecting to socket2: {}", path.display());
        let stream = UnixStream::connect(&path)
            .map_err(|e| HyprlandSourceError(format!("connect to {}: {}", path.display(), e)))?;
        info!("swipe source connected to {}", path.display());

        let start = Instant::now();
        let reader = BufReader::new(stream);
        let mut episode = Episode::default();
        let mut first_swipe_logged = false;

        for line in reader.lines() {
            match line {
                Ok(line) if line.is_empty() => continue,
                Ok(line) => {
                    let Some((event, data)) = parse_event_line(&line) else {
                        continue;
                    };
                    if !first_swipe_logged && event.starts_with("swipe") {
                        info!("first swipe event received: {:?}", line);
                        first_swipe_logged = true;
                    }
                    if let Some(ev) = translate(event, data, &mut episode, event_time(start)) {
                        debug!("{:?}", ev);
                        if sink.send(ev).is_err() {
                            info!("sink closed, shutting down");
                            return Ok(());
                        }
                    }
                }
                Err(e) => {
                    error!("socket2 read error: {}", e);
                    return Err(HyprlandSourceError(format!("read error: {}", e)));
                }
            }
        }

        warn!("socket2 stream ended");
        Ok(())
    }
}

/// Error from the Hyprland swipe source.
#[derive(Debug, thiserror::Error)]
#[error("hyprland swipe source error: {0}")]
pub struct HyprlandSourceError(String);

//  Tests
