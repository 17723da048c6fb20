//! Classifies raw touchpad swipe events into directional gestures.
//!
//! # From hardware events to `begin` / `update` / `end`
//!
//! A [`GestureRecognizer`] listens on one axis for one set of finger counts.
//! It walks through four phases:
//!
//! | Phase     | Meaning                                                     |
//! |-----------|-------------------------------------------------------------|
//! | `Idle`    | No gesture in progress                                      |
//! | `Pending` | Fingers are moving, not yet far enough to pick an axis      |
//! | `Active`  | Confirmed on our axis; every event becomes a signal         |
//! | `Ignored` | Wrong finger count, vetoed, or confirmed on the other axis  |
//!
//! 1. The first event with motion moves `Idle` → `Pending`.
//! 2. While pending, scaled deltas are summed.  Once the summed distance
//!    reaches [`GestureConfig::drag_threshold_distance`], the dominant axis
//!    decides: our axis → `Active` and `begin`; the other axis → `Ignored`.
//! 3. While active, each hardware `Begin`/`Update` emits `update` with the
//!    delta along our axis, and `End`/`Cancel` emits `end` and returns to
//!    `Idle`.
//!
//! A hardware `Begin` always resets the recognizer to `Idle`, so a stale
//! `Ignored` or a lost `End` never outlives the next touch.

use crate::event::{HardwarePhase, Orientation, Propagation, SwipeEvent};
use crate::hub::{EventHub, Subscription};
use crate::traits::{ActivationGuard, GestureListener, ScrollPreference};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

/// Raw hardware delta → logical pixels at a speed scale of `1.0`.
pub const DEFAULT_SWIPE_MULTIPLIER: f64 = 0.5;
/// Logical pixels of travel before a touch is classified.
pub const DRAG_THRESHOLD_DISTANCE: f64 = 16.0;
pub const TOUCHPAD_BASE_HEIGHT: f64 = 300.0;
pub const TOUCHPAD_BASE_WIDTH: f64 = 400.0;

/// Reference span used to turn pixel deltas into progress.
///
/// These do not match any physical touchpad; they only need to be the same
/// for every consumer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseDistance {
    pub height: f64,
    pub width: f64,
}

impl Default for BaseDistance {
    fn default() -> Self {
        Self {
            height: TOUCHPAD_BASE_HEIGHT,
            width: TOUCHPAD_BASE_WIDTH,
        }
    }
}

impl BaseDistance {
    /// Span along `axis`: height for vertical, width for horizontal.
    pub fn along(&self, axis: Orientation) -> f64 {
        match axis {
            Orientation::Vertical => self.height,
            Orientation::Horizontal => self.width,
        }
    }
}

/// Tuning knobs for one recognizer.
///
/// `swipe_multiplier` scales raw hardware deltas into logical pixels.  The
/// owner usually derives it from a user speed setting, see
/// [`GestureDaemon::set_speed_scale`](crate::daemon::GestureDaemon::set_speed_scale).
///
/// `follow_natural_scroll` inverts `update` deltas when the system's natural
/// scrolling preference is on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Finger counts that may start a gesture.  Default: `{3}`.
    #[serde(alias = "fingers")]
    pub finger_counts: BTreeSet<u32>,
    /// Axis to listen on.  Default: horizontal.
    pub orientation: Orientation,
    /// Default: `true`.
    pub follow_natural_scroll: bool,
    /// Default: `0.5`.
    pub swipe_multiplier: f64,
    /// Default: `16.0`.
    pub drag_threshold_distance: f64,
    /// Default: `300 × 400`.
    pub base_distance: BaseDistance,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            finger_counts: BTreeSet::from([3]),
            orientation: Orientation::Horizontal,
            follow_natural_scroll: true,
            swipe_multiplier: DEFAULT_SWIPE_MULTIPLIER,
            drag_threshold_distance: DRAG_THRESHOLD_DISTANCE,
            base_distance: BaseDistance::default(),
        }
    }
}

impl GestureConfig {
    /// Default configuration listening for `fingers` on `orientation`.
    pub fn new(fingers: impl IntoIterator<Item = u32>, orientation: Orientation) -> Self {
        Self {
            finger_counts: fingers.into_iter().collect(),
            orientation,
            ..Self::default()
        }
    }
}

/// Classification state of a recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Pending,
    Active,
    Ignored,
}

/// Mutable state of a recognizer.
///
/// The cumulative sums only carry meaning while [`Phase::Pending`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecognizerState {
    pub phase: Phase,
    pub cumulative_x: f64,
    pub cumulative_y: f64,
    /// Swaps the axis `update` reads from, for the rest of the episode.
    pub toggled_axis: bool,
    /// Timestamp of the last event seen, used to close an episode that is
    /// interrupted by disabling or destroying the recognizer.
    last_time: u32,
}

impl RecognizerState {
    fn reset(&mut self) {
        let last_time = self.last_time;
        *self = Self {
            last_time,
            ..Self::default()
        };
    }
}

/// Touchpad swipe recognizer.
///
/// Generic over the [`GestureListener`] that receives its signals.  The
/// recognizer holds no reference to UI state; everything it knows arrives
/// through [`handle_event`](Self::handle_event).
///
/// # Typical usage
///
/// ```ignore
/// let hub = EventHub::new();
/// let (tx, rx) = mpsc::channel();
/// let recognizer = GestureRecognizer::new(GestureConfig::default(), tx).attach(&hub);
/// hub.dispatch(&event);
/// recognizer.borrow_mut().destroy();
/// ```
pub struct GestureRecognizer<L: GestureListener> {
    config: GestureConfig,
    enabled: bool,
    state: RecognizerState,
    listener: L,
    guard: Option<Box<dyn ActivationGuard>>,
    scroll: Box<dyn ScrollPreference>,
    subscription: Option<Subscription>,
    destroyed: bool,
}

impl<L: GestureListener> GestureRecognizer<L> {
    /// Create an enabled, unattached recognizer.
    ///
    /// The natural-scroll preference reads as off until
    /// [`with_scroll_preference`](Self::with_scroll_preference) supplies one.
    pub fn new(config: GestureConfig, listener: L) -> Self {
        Self {
            config,
            enabled: true,
            state: RecognizerState::default(),
            listener,
            guard: None,
            scroll: Box::new(false),
            subscription: None,
            destroyed: false,
        }
    }

    /// Install a veto consulted before each episode starts.
    pub fn with_guard(mut self, guard: impl ActivationGuard + 'static) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    /// Install the source of the system natural-scroll preference.
    pub fn with_scroll_preference(mut self, pref: impl ScrollPreference + 'static) -> Self {
        self.scroll = Box::new(pref);
        self
    }

    //  Configuration surface

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable recognition.  Disabling mid-gesture closes the
    /// episode with an `end`.
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled && !enabled {
            self.interrupt();
        }
        self.enabled = enabled;
    }

    pub fn orientation(&self) -> Orientation {
        self.config.orientation
    }

    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.config.orientation = orientation;
    }

    pub fn swipe_multiplier(&self) -> f64 {
        self.config.swipe_multiplier
    }

    /// Takes effect from the next event, including mid-gesture.
    pub fn set_swipe_multiplier(&mut self, multiplier: f64) {
        self.config.swipe_multiplier = multiplier;
    }

    //  State

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn state(&self) -> &RecognizerState {
        &self.state
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    /// Axis `update` currently reads from.
    pub fn active_axis(&self) -> Orientation {
        if self.state.toggled_axis {
            self.config.orientation.flipped()
        } else {
            self.config.orientation
        }
    }

    /// Swap the axis for the rest of the current episode.
    ///
    /// Only honoured while [`Phase::Active`]; returns whether it applied.
    pub fn toggle_axis(&mut self) -> bool {
        if self.state.phase != Phase::Active {
            return false;
        }
        self.state.toggled_axis = !self.state.toggled_axis;
        debug!("axis toggled, now reading {}", self.active_axis());
        true
    }

    //  Event handling

    /// Feed one hardware event.
    ///
    /// Returns [`Propagation::Stop`] when the event produced a signal and
    /// should not reach anyone else.
    pub fn handle_event(&mut self, ev: &SwipeEvent) -> Propagation {
        if self.destroyed || !self.enabled {
            return Propagation::Propagate;
        }
        let ev = &ev.with_finite_motion();
        self.state.last_time = ev.time;

        if ev.phase == HardwarePhase::Begin {
            // A lost END leaves a stale episode behind; close it first.
            self.interrupt();
        }

        if self.state.phase == Phase::Ignored {
            return Propagation::Propagate;
        }

        if !self.config.finger_counts.contains(&ev.fingers) {
            trace!("{} fingers not in {:?}", ev.fingers, self.config.finger_counts);
            return self.ignore();
        }

        if self.state.phase == Phase::Idle {
            if let Some(guard) = &self.guard {
                if !guard.allows(ev) {
                    debug!("gesture vetoed by guard");
                    return self.ignore();
                }
            }
            if !ev.has_motion() {
                return Propagation::Propagate;
            }
            self.state.cumulative_x = 0.0;
            self.state.cumulative_y = 0.0;
            self.state.phase = Phase::Pending;
        }

        if self.state.phase == Phase::Pending {
            return self.classify(ev);
        }

        self.track(ev)
    }

    /// Accumulate motion until the threshold picks an axis.
    fn classify(&mut self, ev: &SwipeEvent) -> Propagation {
        if ev.phase.is_terminal() {
            self.state.reset();
            return Propagation::Propagate;
        }

        let m = self.config.swipe_multiplier;
        self.state.cumulative_x += ev.dx * m;
        self.state.cumulative_y += ev.dy * m;

        let cx = self.state.cumulative_x;
        let cy = self.state.cumulative_y;
        if cx.hypot(cy) < self.config.drag_threshold_distance {
            return Propagation::Propagate;
        }

        let dominant = if cx.abs() > cy.abs() {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        self.state.cumulative_x = 0.0;
        self.state.cumulative_y = 0.0;

        if dominant != self.config.orientation {
            debug!("swipe went {}, listening for {}", dominant, self.config.orientation);
            self.state.phase = Phase::Ignored;
            return Propagation::Propagate;
        }

        debug!("swipe confirmed {} with {} fingers", dominant, ev.fingers);
        self.state.phase = Phase::Active;
        self.listener.begin(ev.time, ev.x, ev.y);
        Propagation::Stop
    }

    /// Turn an event of a confirmed episode into `update` or `end`.
    fn track(&mut self, ev: &SwipeEvent) -> Propagation {
        let axis = self.active_axis();
        let distance = self.config.base_distance.along(axis);

        if ev.phase.is_terminal() {
            debug!("swipe {} at {}", ev.phase, ev.time);
            self.listener.end(ev.time, distance);
            self.state.reset();
            return Propagation::Stop;
        }

        let raw = match axis {
            Orientation::Vertical => ev.dy,
            Orientation::Horizontal => ev.dx,
        };
        let mut delta = raw * self.config.swipe_multiplier;
        if self.config.follow_natural_scroll && self.scroll.natural_scroll() {
            delta = -delta;
        }
        trace!("swipe update: delta={:.2} distance={}", delta, distance);
        self.listener.update(ev.time, delta, distance);
        Propagation::Stop
    }

    fn ignore(&mut self) -> Propagation {
        self.interrupt();
        self.state.phase = Phase::Ignored;
        Propagation::Propagate
    }

    /// Close an active episode without a hardware event.
    fn interrupt(&mut self) {
        if self.state.phase == Phase::Active {
            let distance = self.config.base_distance.along(self.active_axis());
            self.listener.end(self.state.last_time, distance);
        }
        self.state.reset();
    }

    //  Lifecycle

    /// Subscribe to `hub` and hand back a shared handle.
    ///
    /// The hub only holds a weak reference, so dropping every handle also
    /// stops delivery.
    pub fn attach(self, hub: &EventHub) -> Rc<RefCell<Self>>
    where
        L: 'static,
    {
        let shared = Rc::new(RefCell::new(self));
        let weak = Rc::downgrade(&shared);
        let subscription = hub.subscribe(move |ev| {
            let Some(shared) = weak.upgrade() else {
                return Propagation::Propagate;
            };
            let result = match shared.try_borrow_mut() {
                Ok(mut recognizer) => recognizer.handle_event(ev),
                Err(_) => Propagation::Propagate,
            };
            result
        });
        shared.borrow_mut().subscription = Some(subscription);
        shared
    }

    /// Detach from the event source.  Safe to call more than once; after the
    /// first call no further signal is emitted.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.interrupt();
        self.destroyed = true;
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
        }
        debug!("recognizer destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }
}

//  Tests
