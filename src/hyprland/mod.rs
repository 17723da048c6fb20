//! Hyprland-specific implementations.
//!
//! This module provides the direct [`EventSource`](crate::traits::EventSource)
//! backend, reading touchpad swipes from Hyprland's IPC event socket.
//!
//! Nothing outside this module should reference Hyprland directly.

pub mod events;
