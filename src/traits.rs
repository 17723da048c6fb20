//! Core traits that decouple swipegrd from any specific input backend or
//! gesture consumer.
//!
//! Every concrete backend (Hyprland's event socket, a relay socket, a test
//! harness, …) implements [`EventSource`], and anything that patches
//! settings at runtime implements [`CommandSource`].  Every consumer of
//! recognized gestures implements [`GestureListener`].  The
//! [`GestureRecognizer`](crate::recognizer::GestureRecognizer) only depends
//! on these abstractions.

use crate::command::Command;
use crate::event::{GestureSignal, SwipeEvent};
use std::sync::mpsc;

//  Event Source

/// A source of raw [`SwipeEvent`]s.
///
/// Implementations listen on some transport (Hyprland's IPC event stream,
/// a relay socket, an in-memory channel) and forward every touchpad
/// swipe event into the provided [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](EventSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Events are forwarded in the order the hardware delivered them, without
///   coalescing.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait EventSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`SwipeEvent`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<SwipeEvent>) -> Result<(), Self::Error>;
}

//  Command Source

/// A source of live settings [`Command`]s.
///
/// Same contract as [`EventSource`]: [`run`](CommandSource::run) blocks,
/// each received command is sent through `sink` once, in order.
pub trait CommandSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming [`Command`] into `sink`.
    fn run(&mut self, sink: mpsc::Sender<Command>) -> Result<(), Self::Error>;
}

//  Gesture Listener

/// Receiver of the three recognizer signals.
///
/// Exactly one `begin` opens an episode, zero or more `update`s follow, and
/// exactly one `end` closes it.
pub trait GestureListener {
    fn begin(&mut self, time: u32, x: f64, y: f64);

    /// `delta` is the motion along the recognizer's axis in logical pixels;
    /// `distance` is the reference span, so `delta / distance` is progress.
    fn update(&mut self, time: u32, delta: f64, distance: f64);

    fn end(&mut self, time: u32, distance: f64);
}

impl GestureListener for mpsc::Sender<GestureSignal> {
    fn begin(&mut self, time: u32, x: f64, y: f64) {
        let _ = self.send(GestureSignal::Begin { time, x, y });
    }

    fn update(&mut self, time: u32, delta: f64, distance: f64) {
        let _ = self.send(GestureSignal::Update {
            time,
            delta,
            distance,
        });
    }

    fn end(&mut self, time: u32, distance: f64) {
        let _ = self.send(GestureSignal::End { time, distance });
    }
}

impl GestureListener for Vec<GestureSignal> {
    fn begin(&mut self, time: u32, x: f64, y: f64) {
        self.push(GestureSignal::Begin { time, x, y });
    }

    fn update(&mut self, time: u32, delta: f64, distance: f64) {
        self.push(GestureSignal::Update {
            time,
            delta,
            distance,
        });
    }

    fn end(&mut self, time: u32, distance: f64) {
        self.push(GestureSignal::End { time, distance });
    }
}

impl<L: GestureListener + ?Sized> GestureListener for Box<L> {
    fn begin(&mut self, time: u32, x: f64, y: f64) {
        (**self).begin(time, x, y)
    }

    fn update(&mut self, time: u32, delta: f64, distance: f64) {
        (**self).update(time, delta, distance)
    }

    fn end(&mut self, time: u32, distance: f64) {
        (**self).end(time, distance)
    }
}

//  Gating hooks

/// Consumer-specific veto on starting a gesture, e.g. "no focused window"
/// or "not in the right UI mode".
///
/// Consulted for every event that arrives while the recognizer is idle.
/// Any closure `Fn(&SwipeEvent) -> bool` is a guard.
pub trait ActivationGuard {
    fn allows(&self, event: &SwipeEvent) -> bool;
}

impl<F: Fn(&SwipeEvent) -> bool> ActivationGuard for F {
    fn allows(&self, event: &SwipeEvent) -> bool {
        self(event)
    }
}

/// The system-wide "natural scrolling" touchpad preference.
///
/// Read at every update so the owner can change it live.
pub trait ScrollPreference {
    fn natural_scroll(&self) -> bool;
}

impl ScrollPreference for bool {
    fn natural_scroll(&self) -> bool {
        *self
    }
}

impl ScrollPreference for std::rc::Rc<std::cell::Cell<bool>> {
    fn natural_scroll(&self) -> bool {
        self.get()
    }
}
