//! Entry point for the **swipegrd** daemon.
//!
//! Spawns the configured [`EventSource`](swipegrd::traits::EventSource) and
//! the control socket on background threads and feeds both, in arrival
//! order, into the [`GestureDaemon`] on the main thread.  Recognized
//! gestures are written to stdout as JSON lines.
//!
//! Flags:
//!
//! * `--config <path>`: read this file instead of
//!   `$XDG_CONFIG_HOME/swipegrd/config.json`.
//! * `--relay`: read events from the relay socket regardless of the
//!   configured source.

use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::mpsc;
use swipegrd::command::Command;
use swipegrd::config::{Config, SourceConfig, SourceKind};
use swipegrd::daemon::{BoxedListener, GestureDaemon};
use swipegrd::event::SwipeEvent;
use swipegrd::hyprland::events::HyprlandSwipeSource;
use swipegrd::ipc::control::ControlSocket;
use swipegrd::ipc::relay::RelaySwipeSource;
use swipegrd::output::JsonLinesListener;
use swipegrd::traits::{CommandSource, EventSource};

/// Everything the main loop reacts to.
enum Input {
    Swipe(SwipeEvent),
    Control(Command),
    SourceClosed,
}

fn runtime_dir() -> PathBuf {
    PathBuf::from(std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".into()))
}

/// Default socket path for the relay listener.
fn default_relay_path() -> PathBuf {
    runtime_dir().join("swipegrd-relay.sock")
}

/// Default socket path for live settings commands.
fn default_control_path() -> PathBuf {
    runtime_dir().join("swipegrd.sock")
}

/// Resolve the config directory (`$XDG_CONFIG_HOME/swipegrd`).
fn config_dir() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME").unwrap_or_else(|_| {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        format!("{}/.config", home)
    });
    PathBuf::from(base).join("swipegrd")
}

/// Try to load the config from `path`, falling back to compiled-in defaults.
fn load_config(path: &std::path::Path) -> Config {
    match Config::load(path) {
        Ok(cfg) => {
            info!("loaded config from {}", path.display());
            cfg
        }
        Err(e) => {
            info!("no usable config ({}), using defaults", e);
            Config::default()
        }
    }
}

/// Value following `flag` on the command line.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

//  Main

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = flag_value(&args, "--config")
        .map(PathBuf::from)
        .unwrap_or_else(|| config_dir().join("config.json"));
    let mut config = load_config(&config_path);
    if args.iter().any(|a| a == "--relay") {
        config.source.kind = SourceKind::Relay;
    }

    let (input_tx, input_rx) = mpsc::channel::<Input>();
    spawn_event_source(&config.source, input_tx.clone());
    let control_path = config
        .control
        .socket
        .clone()
        .unwrap_or_else(default_control_path);
    spawn_control_socket(control_path.clone(), input_tx);

    let mut daemon = GestureDaemon::new(
        config,
        Box::new(|name: &str| {
            Box::new(JsonLinesListener::new(name, std::io::stdout())) as BoxedListener
        }),
    )
    .with_config_path(&config_path);
    daemon.enable();

    info!("swipegrd running");
    for input in input_rx {
        match input {
            Input::Swipe(ev) => {
                daemon.handle(&ev);
            }
            Input::Control(cmd) => {
                if let Err(e) = daemon.apply(cmd) {
                    warn!("command failed: {}", e);
                }
            }
            Input::SourceClosed => break,
        }
    }
    info!("event source closed, exiting");
    daemon.disable();
    let _ = std::fs::remove_file(&control_path);
}

//  Helpers

fn spawn_event_source(source: &SourceConfig, tx: mpsc::Sender<Input>) {
    let (event_tx, event_rx) = mpsc::channel::<SwipeEvent>();
    match source.kind {
        SourceKind::Hyprland => {
            std::thread::spawn(move || {
                let mut source = HyprlandSwipeSource::new();
                if let Err(e) = source.run(event_tx) {
                    error!("hyprland source error: {}", e);
                }
            });
        }
        SourceKind::Relay => {
            let path = source.socket.clone().unwrap_or_else(default_relay_path);
            std::thread::spawn(move || {
                let mut source = RelaySwipeSource::new(&path);
                if let Err(e) = source.run(event_tx) {
                    error!("relay source error: {}", e);
                }
            });
        }
    }

    std::thread::spawn(move || {
        for ev in event_rx {
            if tx.send(Input::Swipe(ev)).is_err() {
                return;
            }
        }
        let _ = tx.send(Input::SourceClosed);
    });
}

fn spawn_control_socket(path: PathBuf, tx: mpsc::Sender<Input>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
    std::thread::spawn(move || {
        let mut source = ControlSocket::new(&path);
        if let Err(e) = source.run(cmd_tx) {
            error!("control socket error: {}", e);
        }
    });

    std::thread::spawn(move || {
        for cmd in cmd_rx {
            if tx.send(Input::Control(cmd)).is_err() {
                return;
            }
        }
    });
}
