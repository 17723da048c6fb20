//! The orchestrator that owns the event hub and every recognizer.
//!
//! [`GestureDaemon`] turns the configured [`GestureBinding`]s into attached
//! [`GestureRecognizer`]s on [`enable`](GestureDaemon::enable), tears them
//! down on [`disable`](GestureDaemon::disable), and patches live settings
//! (speed scale, natural scrolling, per-binding enablement) into them.
//! Recognizers exist only between those two calls; live settings outlive
//! them until the next [`reload`](GestureDaemon::reload).

use crate::command::Command;
use crate::config::{Config, ConfigError, GestureBinding};
use crate::event::{Propagation, SwipeEvent};
use crate::hub::EventHub;
use crate::recognizer::GestureRecognizer;
use crate::traits::GestureListener;
use log::{debug, info};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// Listener type every daemon-owned recognizer reports to.
pub type BoxedListener = Box<dyn GestureListener>;

/// Builds the listener for a binding, given its name.
pub type ListenerFactory = Box<dyn FnMut(&str) -> BoxedListener>;

/// Shared handle to a daemon-owned recognizer.
pub type RecognizerHandle = Rc<RefCell<GestureRecognizer<BoxedListener>>>;

/// Why a [`Command`] could not be applied.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no gesture named {0:?}")]
    UnknownBinding(String),
    #[error("gesture {0:?} is not in progress")]
    NotActive(String),
    #[error("speed scale must be positive, got {0}")]
    InvalidSpeedScale(f64),
    #[error("no config file to reload from")]
    NoConfigPath,
    #[error(transparent)]
    Config(#[from] ConfigError),
}

struct Installed {
    binding: GestureBinding,
    recognizer: RecognizerHandle,
}

/// Owns the recognizers for one session.
///
/// # Typical usage
///
/// ```ignore
/// let mut daemon = GestureDaemon::new(config, Box::new(|name: &str| {
///     Box::new(JsonLinesListener::new(name, std::io::stdout())) as BoxedListener
/// }));
/// daemon.enable();
/// for ev in events {
///     daemon.handle(&ev);
/// }
/// daemon.disable();
/// ```
pub struct GestureDaemon {
    config: Config,
    config_path: Option<PathBuf>,
    factory: ListenerFactory,
    hub: EventHub,
    natural_scroll: Rc<Cell<bool>>,
    speed_scale: f64,
    installed: Vec<Installed>,
    /// Per-binding `set_enabled` patches, by name.
    overrides: HashMap<String, bool>,
    enabled: bool,
}

impl GestureDaemon {
    /// Create a disabled daemon.
    pub fn new(config: Config, factory: ListenerFactory) -> Self {
        let natural_scroll = Rc::new(Cell::new(config.touchpad.natural_scroll));
        let speed_scale = config.touchpad.speed_scale;
        Self {
            config,
            config_path: None,
            factory,
            hub: EventHub::new(),
            natural_scroll,
            speed_scale,
            installed: Vec::new(),
            overrides: HashMap::new(),
            enabled: false,
        }
    }

    /// Remember where the config came from, for [`Command::Reload`].
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Build and attach one recognizer per binding.  No-op when enabled.
    pub fn enable(&mut self) {
        if self.enabled {
            return;
        }
        for mut binding in self.config.bindings() {
            if let Some(&enabled) = self.overrides.get(&binding.name) {
                binding.enabled = enabled;
            }
            let mut gesture = binding.gesture.clone();
            gesture.swipe_multiplier *= self.speed_scale;
            let listener = (self.factory)(&binding.name);
            let mut recognizer = GestureRecognizer::new(gesture, listener)
                .with_scroll_preference(self.natural_scroll.clone());
            recognizer.set_enabled(binding.enabled);
            debug!(
                "binding {:?}: {:?} fingers, {}",
                binding.name,
                binding.gesture.finger_counts,
                binding.gesture.orientation
            );
            let recognizer = recognizer.attach(&self.hub);
            self.installed.push(Installed {
                binding,
                recognizer,
            });
        }
        self.enabled = true;
        info!("enabled {} gesture(s)", self.installed.len());
    }

    /// Destroy every recognizer.  No-op when disabled.
    pub fn disable(&mut self) {
        if !self.enabled {
            return;
        }
        for installed in self.installed.drain(..) {
            installed.recognizer.borrow_mut().destroy();
        }
        self.enabled = false;
        info!("gestures disabled");
    }

    /// Replace the configuration, rebuilding recognizers if enabled.
    ///
    /// Drops every `set_enabled` patch; the new file is authoritative.
    pub fn reload(&mut self, config: Config) {
        let was_enabled = self.enabled;
        self.disable();
        self.overrides.clear();
        self.natural_scroll.set(config.touchpad.natural_scroll);
        self.speed_scale = config.touchpad.speed_scale;
        self.config = config;
        if was_enabled {
            self.enable();
        }
    }

    /// Process a single [`SwipeEvent`].
    pub fn handle(&self, event: &SwipeEvent) -> Propagation {
        self.hub.dispatch(event)
    }

    pub fn speed_scale(&self) -> f64 {
        self.speed_scale
    }

    /// Rescale every recognizer's multiplier from its binding's base value.
    pub fn set_speed_scale(&mut self, scale: f64) -> Result<(), CommandError> {
        if scale.is_nan() || scale <= 0.0 {
            return Err(CommandError::InvalidSpeedScale(scale));
        }
        self.speed_scale = scale;
        for installed in &self.installed {
            installed
                .recognizer
                .borrow_mut()
                .set_swipe_multiplier(installed.binding.gesture.swipe_multiplier * scale);
        }
        debug!("speed scale set to {}", scale);
        Ok(())
    }

    pub fn set_natural_scroll(&mut self, natural: bool) {
        self.natural_scroll.set(natural);
    }

    /// Enable or disable one binding, now and on every later
    /// [`enable`](Self::enable).  Returns `false` if no binding has that
    /// name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        if !self.config.bindings().iter().any(|b| b.name == name) {
            return false;
        }
        self.overrides.insert(name.to_string(), enabled);
        if let Some(installed) = self.installed.iter_mut().find(|i| i.binding.name == name) {
            installed.binding.enabled = enabled;
            installed.recognizer.borrow_mut().set_enabled(enabled);
        }
        true
    }

    /// Re-read the file given to [`with_config_path`](Self::with_config_path).
    ///
    /// On error the running configuration is kept.
    pub fn reload_from_disk(&mut self) -> Result<(), CommandError> {
        let path = self.config_path.clone().ok_or(CommandError::NoConfigPath)?;
        let config = Config::load(&path)?;
        info!("reloading config from {}", path.display());
        self.reload(config);
        Ok(())
    }

    /// Apply one live settings command.
    pub fn apply(&mut self, cmd: Command) -> Result<(), CommandError> {
        debug!("applying {:?}", cmd);
        match cmd {
            Command::SetSpeedScale(scale) => self.set_speed_scale(scale)?,
            Command::SetNaturalScroll(natural) => self.set_natural_scroll(natural),
            Command::SetEnabled { name, enabled } => {
                if !self.set_enabled(&name, enabled) {
                    return Err(CommandError::UnknownBinding(name));
                }
            }
            Command::ToggleAxis { name } => {
                let recognizer = self
                    .recognizer(&name)
                    .ok_or_else(|| CommandError::UnknownBinding(name.clone()))?;
                let toggled = recognizer.borrow_mut().toggle_axis();
                if !toggled {
                    return Err(CommandError::NotActive(name));
                }
            }
            Command::Enable => self.enable(),
            Command::Disable => self.disable(),
            Command::Reload => self.reload_from_disk()?,
        }
        Ok(())
    }

    /// The live recognizer for a binding, e.g. to toggle its axis.
    pub fn recognizer(&self, name: &str) -> Option<RecognizerHandle> {
        self.installed
            .iter()
            .find(|i| i.binding.name == name)
            .map(|i| i.recognizer.clone())
    }

    /// Names of the installed bindings, in dispatch order.
    pub fn binding_names(&self) -> Vec<&str> {
        self.installed.iter().map(|i| i.binding.name.as_str()).collect()
    }
}

impl Drop for GestureDaemon {
    fn drop(&mut self) {
        self.disable();
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{GestureSignal, HardwarePhase, Orientation};
    use crate::recognizer::{GestureConfig, Phase};

    type Log = Rc<RefCell<Vec<(String, GestureSignal)>>>;

    /// Records every signal tagged with its binding name.
    struct Recorder {
        name: String,
        log: Log,
    }

    impl GestureListener for Recorder {
        fn begin(&mut self, time: u32, x: f64, y: f64) {
            self.log
                .borrow_mut()
                .push((self.name.clone(), GestureSignal::Begin { time, x, y }));
        }

        fn update(&mut self, time: u32, delta: f64, distance: f64) {
            self.log.borrow_mut().push((
                self.name.clone(),
                GestureSignal::Update {
                    time,
                    delta,
                    distance,
                },
            ));
        }

        fn end(&mut self, time: u32, distance: f64) {
            self.log
                .borrow_mut()
                .push((self.name.clone(), GestureSignal::End { time, distance }));
        }
    }

    fn make_daemon(config: Config) -> (GestureDaemon, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let daemon = GestureDaemon::new(
            config,
            Box::new(move |name: &str| {
                Box::new(Recorder {
                    name: name.to_string(),
                    log: sink.clone(),
                }) as BoxedListener
            }),
        );
        (daemon, log)
    }

    fn ev(phase: HardwarePhase, fingers: u32, dx: f64, dy: f64) -> SwipeEvent {
        SwipeEvent::new(phase, fingers, dx, dy, 0)
    }

    fn swipe(daemon: &GestureDaemon, fingers: u32, dx: f64, dy: f64) {
        daemon.handle(&ev(HardwarePhase::Begin, fingers, 0.0, 0.0));
        daemon.handle(&ev(HardwarePhase::Update, fingers, dx, dy));
        daemon.handle(&ev(HardwarePhase::Update, fingers, dx, dy));
        daemon.handle(&ev(HardwarePhase::End, fingers, 0.0, 0.0));
    }

    fn names(log: &Log) -> Vec<String> {
        log.borrow().iter().map(|(n, _)| n.clone()).collect()
    }

    #[test]
    fn default_bindings_route_by_fingers_and_axis() {
        let (mut daemon, log) = make_daemon(Config::default());
        daemon.enable();
        assert_eq!(daemon.binding_names(), vec!["alt-tab", "workspace", "overview"]);

        swipe(&daemon, 3, 40.0, 0.0);
        assert!(names(&log).iter().all(|n| n == "alt-tab"));
        assert_eq!(log.borrow().len(), 3);

        log.borrow_mut().clear();
        swipe(&daemon, 4, 0.0, 40.0);
        assert!(names(&log).iter().all(|n| n == "overview"));
        assert_eq!(log.borrow().len(), 3);

        log.borrow_mut().clear();
        swipe(&daemon, 4, -40.0, 0.0);
        assert!(names(&log).iter().all(|n| n == "workspace"));
    }

    #[test]
    fn disabled_daemon_emits_nothing() {
        let (mut daemon, log) = make_daemon(Config::default());
        swipe(&daemon, 3, 40.0, 0.0);
        assert!(log.borrow().is_empty());

        daemon.enable();
        daemon.disable();
        daemon.disable();
        assert!(!daemon.is_enabled());
        swipe(&daemon, 3, 40.0, 0.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn enable_twice_does_not_duplicate() {
        let (mut daemon, _log) = make_daemon(Config::default());
        daemon.enable();
        daemon.enable();
        assert_eq!(daemon.binding_names().len(), 3);
    }

    #[test]
    fn speed_scale_patches_multipliers() {
        let mut config = Config::default();
        config.touchpad.speed_scale = 2.0;
        let (mut daemon, _log) = make_daemon(config);
        daemon.enable();

        let r = daemon.recognizer("alt-tab").unwrap();
        assert_eq!(r.borrow().swipe_multiplier(), 1.0);

        daemon.set_speed_scale(3.0).unwrap();
        assert_eq!(r.borrow().swipe_multiplier(), 1.5);

        assert!(matches!(
            daemon.set_speed_scale(-1.0),
            Err(CommandError::InvalidSpeedScale(_))
        ));
        assert!(daemon.set_speed_scale(f64::NAN).is_err());
        assert_eq!(daemon.speed_scale(), 3.0);

        daemon.disable();
        daemon.enable();
        let r = daemon.recognizer("alt-tab").unwrap();
        assert_eq!(r.borrow().swipe_multiplier(), 1.5);
    }

    #[test]
    fn natural_scroll_follows_setting() {
        let config = Config {
            gestures: vec![GestureBinding::new(
                "ws",
                GestureConfig {
                    swipe_multiplier: 1.0,
                    ..GestureConfig::new([4], Orientation::Horizontal)
                },
            )],
            ..Config::default()
        };
        let (mut daemon, log) = make_daemon(config);
        daemon.enable();

        daemon.handle(&ev(HardwarePhase::Update, 4, 20.0, 0.0));
        daemon.handle(&ev(HardwarePhase::Update, 4, 5.0, 0.0));
        daemon.set_natural_scroll(false);
        daemon.handle(&ev(HardwarePhase::Update, 4, 5.0, 0.0));

        let deltas: Vec<f64> = log
            .borrow()
            .iter()
            .filter_map(|(_, s)| match s {
                GestureSignal::Update { delta, .. } => Some(*delta),
                _ => None,
            })
            .collect();
        assert_eq!(deltas, vec![-5.0, 5.0]);
    }

    #[test]
    fn set_enabled_by_name() {
        let (mut daemon, log) = make_daemon(Config::default());
        daemon.enable();
        assert!(daemon.set_enabled("alt-tab", false));
        assert!(!daemon.set_enabled("missing", false));

        swipe(&daemon, 3, 40.0, 0.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn set_enabled_survives_disable_enable() {
        let (mut daemon, log) = make_daemon(Config::default());
        daemon.enable();
        assert!(daemon.set_enabled("alt-tab", false));
        daemon.disable();
        daemon.enable();

        assert!(!daemon.recognizer("alt-tab").unwrap().borrow().enabled());
        swipe(&daemon, 3, 40.0, 0.0);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn set_enabled_before_enable_applies() {
        let (mut daemon, _log) = make_daemon(Config::default());
        assert!(daemon.set_enabled("alt-tab", false));
        assert!(!daemon.set_enabled("missing", false));
        daemon.enable();

        assert!(!daemon.recognizer("alt-tab").unwrap().borrow().enabled());
        assert!(daemon.recognizer("workspace").unwrap().borrow().enabled());
    }

    #[test]
    fn binding_disabled_in_config_starts_disabled() {
        let mut binding = GestureBinding::new("off", GestureConfig::default());
        binding.enabled = false;
        let config = Config {
            gestures: vec![binding],
            ..Config::default()
        };
        let (mut daemon, _log) = make_daemon(config);
        daemon.enable();
        assert!(!daemon.recognizer("off").unwrap().borrow().enabled());
    }

    #[test]
    fn disable_closes_active_episode() {
        let (mut daemon, log) = make_daemon(Config::default());
        daemon.enable();
        daemon.handle(&ev(HardwarePhase::Update, 3, 40.0, 0.0));
        let r = daemon.recognizer("alt-tab").unwrap();
        assert_eq!(r.borrow().phase(), Phase::Active);

        daemon.disable();
        assert!(r.borrow().is_destroyed());
        assert!(matches!(
            log.borrow().last(),
            Some((_, GestureSignal::End { .. }))
        ));
    }

    #[test]
    fn reload_rebuilds_recognizers() {
        let (mut daemon, _log) = make_daemon(Config::default());
        daemon.enable();
        let old = daemon.recognizer("alt-tab").unwrap();

        let config = Config {
            gestures: vec![GestureBinding::new("only", GestureConfig::default())],
            ..Config::default()
        };
        daemon.set_enabled("alt-tab", false);
        daemon.reload(config);
        assert!(old.borrow().is_destroyed());
        assert_eq!(daemon.binding_names(), vec!["only"]);

        // A reload is authoritative over earlier patches.
        daemon.reload(Config::default());
        assert!(daemon.recognizer("alt-tab").unwrap().borrow().enabled());
    }

    #[test]
    fn apply_patches_live_settings() {
        let (mut daemon, log) = make_daemon(Config::default());
        daemon.apply(Command::Enable).unwrap();
        assert!(daemon.is_enabled());

        daemon.apply(Command::SetSpeedScale(2.0)).unwrap();
        let r = daemon.recognizer("workspace").unwrap();
        assert_eq!(r.borrow().swipe_multiplier(), 1.0);

        daemon
            .apply(Command::SetEnabled {
                name: "alt-tab".into(),
                enabled: false,
            })
            .unwrap();
        swipe(&daemon, 3, 40.0, 0.0);
        assert!(log.borrow().is_empty());

        assert!(matches!(
            daemon.apply(Command::SetEnabled {
                name: "nope".into(),
                enabled: true,
            }),
            Err(CommandError::UnknownBinding(_))
        ));

        daemon.apply(Command::Disable).unwrap();
        assert!(!daemon.is_enabled());
    }

    #[test]
    fn apply_toggle_axis_needs_active_gesture() {
        let (mut daemon, log) = make_daemon(Config::default());
        daemon.enable();
        let toggle = || Command::ToggleAxis {
            name: "overview".into(),
        };
        assert!(matches!(
            daemon.apply(toggle()),
            Err(CommandError::NotActive(_))
        ));

        daemon.handle(&ev(HardwarePhase::Begin, 4, 0.0, 0.0));
        daemon.handle(&ev(HardwarePhase::Update, 4, 0.0, 40.0));
        daemon.apply(toggle()).unwrap();
        daemon.handle(&ev(HardwarePhase::Update, 4, 6.0, 1.0));

        match log.borrow().last() {
            Some((name, GestureSignal::Update { delta, distance, .. })) => {
                assert_eq!(name, "overview");
                assert_eq!(*delta, -3.0);
                assert_eq!(*distance, 400.0);
            }
            other => panic!("expected an update, got {:?}", other),
        };
    }

    #[test]
    fn apply_reload_reads_config_file() {
        let path = std::env::temp_dir().join(format!(
            "swipegrd-daemon-reload-{}.json",
            std::process::id()
        ));
        std::fs::write(
            &path,
            r#"{ "gestures": [ { "name": "snap", "fingers": [4], "orientation": "vertical" } ] }"#,
        )
        .unwrap();

        let (daemon, _log) = make_daemon(Config::default());
        let mut daemon = daemon.with_config_path(&path);
        daemon.enable();
        daemon.apply(Command::Reload).unwrap();
        assert_eq!(daemon.binding_names(), vec!["snap"]);

        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            daemon.apply(Command::Reload),
            Err(CommandError::Config(_))
        ));
        assert_eq!(daemon.binding_names(), vec!["snap"]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reload_without_path_is_an_error() {
        let (mut daemon, _log) = make_daemon(Config::default());
        assert!(matches!(
            daemon.apply(Command::Reload),
            Err(CommandError::NoConfigPath)
        ));
    }
}
