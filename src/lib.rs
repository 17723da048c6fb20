//! **swipegrd** is a touchpad swipe-gesture recognizer.
//!
//! Raw multi-finger swipe events go in; a normalized `begin` / `update` /
//! `end` stream per configured gesture comes out.  Each recognizer listens
//! for a set of finger counts on one axis and only claims a swipe once it
//! has travelled far enough to tell which way it is going.
//!
//! # Architecture
//!
//! The crate is organised around two core traits:
//!
//! * [`traits::EventSource`] abstracts the transport that delivers raw
//!   swipe events (Hyprland's event socket, a relay socket, …) so the
//!   recognizers are not coupled to any specific input stack.
//! * [`traits::GestureListener`] abstracts whoever consumes recognized
//!   gestures (a window switcher, an overview animation, stdout, …).
//!
//! [`recognizer::GestureRecognizer`] sits between the two, attached to an
//! [`hub::EventHub`] that offers each event to recognizers in order.
//! [`daemon::GestureDaemon`] owns the hub and builds recognizers from
//! [`config::Config`] and applies live [`command::Command`]s.  Concrete
//! sources live in [`hyprland`] and [`ipc`].

pub mod command;
pub mod config;
pub mod daemon;
pub mod event;
pub mod hub;
pub mod hyprland;
pub mod ipc;
pub mod output;
pub mod recognizer;
pub mod traits;
