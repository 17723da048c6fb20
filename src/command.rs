//! Live settings commands.
//!
//! A [`Command`] patches a running [`GestureDaemon`](crate::daemon::GestureDaemon)
//! without restarting it: the touchpad speed, the natural scrolling
//! preference, which gestures are on, or a fresh read of the config file.
//!
//! On the wire commands are externally tagged JSON, one per line:
//!
//! ```json
//! {"SetSpeedScale":1.5}
//! {"SetNaturalScroll":false}
//! {"SetEnabled":{"name":"alt-tab","enabled":false}}
//! {"ToggleAxis":{"name":"overview"}}
//! "Reload"
//! ```

use serde::{Deserialize, Serialize};

/// Every change the daemon accepts while running.
///
/// Commands are produced by [`CommandSource`](crate::traits::CommandSource)
/// implementations and applied by
/// [`GestureDaemon::apply`](crate::daemon::GestureDaemon::apply).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Scale every gesture's swipe multiplier.  Must be positive.
    SetSpeedScale(f64),

    /// The desktop's natural scrolling preference changed.
    SetNaturalScroll(bool),

    /// Turn one named gesture on or off.  Survives disable/enable cycles
    /// until the next [`Reload`](Command::Reload).
    SetEnabled { name: String, enabled: bool },

    /// Swap the axis of a gesture that is in progress.
    ToggleAxis { name: String },

    /// Build recognizers for every configured gesture.
    Enable,

    /// Tear down every recognizer, closing any gesture in progress.
    Disable,

    /// Re-read the config file and rebuild the recognizers.
    Reload,
}
