//! Events and signals used throughout swipegrd.
//!
//! This module defines the vocabulary that all components share:
//! [`SwipeEvent`] is the raw hardware tuple an event source delivers,
//! [`GestureSignal`] is the normalized output of a recognizer, and
//! [`HardwarePhase`] / [`Orientation`] / [`Propagation`] provide the
//! supporting data types.
//!
//! Phase and orientation strings are parsed case-insensitively, so relayed
//! events may say `"Begin"`, `"begin"` or `"BEGIN"`.

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Stage of a touchpad gesture as reported by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HardwarePhase {
    Begin,
    Update,
    End,
    Cancel,
}

impl HardwarePhase {
    /// `true` for the phases that close a hardware gesture.
    pub fn is_terminal(self) -> bool {
        matches!(self, HardwarePhase::End | HardwarePhase::Cancel)
    }
}

impl fmt::Display for HardwarePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HardwarePhase::Begin => write!(f, "begin"),
            HardwarePhase::Update => write!(f, "update"),
            HardwarePhase::End => write!(f, "end"),
            HardwarePhase::Cancel => write!(f, "cancel"),
        }
    }
}

/// Parse a phase name.
///
/// Anything that is not `begin`, `update` or `cancel` is read as
/// [`HardwarePhase::End`]: a relay that reports an unknown stage has, as far
/// as we can tell, finished the gesture.
pub(crate) fn parse_phase(s: &str) -> HardwarePhase {
    match s.trim().to_lowercase().as_str() {
        "begin" => HardwarePhase::Begin,
        "update" => HardwarePhase::Update,
        "cancel" => HardwarePhase::Cancel,
        _ => HardwarePhase::End,
    }
}

impl<'de> Deserialize<'de> for HardwarePhase {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(parse_phase(&s))
    }
}

/// Axis a recognizer listens on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

impl Orientation {
    /// The other axis.
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Horizontal => Orientation::Vertical,
            Orientation::Vertical => Orientation::Horizontal,
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Orientation::Horizontal => write!(f, "horizontal"),
            Orientation::Vertical => write!(f, "vertical"),
        }
    }
}

fn parse_orientation(s: &str) -> Option<Orientation> {
    match s.trim().to_lowercase().as_str() {
        "horizontal" | "h" | "x" => Some(Orientation::Horizontal),
        "vertical" | "v" | "y" => Some(Orientation::Vertical),
        _ => None,
    }
}

impl<'de> Deserialize<'de> for Orientation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_orientation(&s)
            .ok_or_else(|| DeError::custom(format!("invalid orientation: {:?}", s)))
    }
}

/// One raw touchpad swipe event.
///
/// `dx`/`dy` are the unaccelerated motion since the previous event.
/// `x`/`y` are the pointer position, only meaningful at gesture begin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SwipeEvent {
    pub phase: HardwarePhase,
    pub fingers: u32,
    pub dx: f64,
    pub dy: f64,
    pub time: u32,
    pub x: f64,
    pub y: f64,
}

impl SwipeEvent {
    /// Build an event with the pointer at the origin.
    pub fn new(phase: HardwarePhase, fingers: u32, dx: f64, dy: f64, time: u32) -> Self {
        Self {
            phase,
            fingers,
            dx,
            dy,
            time,
            x: 0.0,
            y: 0.0,
        }
    }

    /// Set the pointer position.
    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    pub fn has_motion(&self) -> bool {
        self.dx != 0.0 || self.dy != 0.0
    }

    /// Copy with NaN or infinite deltas replaced by zero.
    pub fn with_finite_motion(mut self) -> Self {
        if !self.dx.is_finite() {
            self.dx = 0.0;
        }
        if !self.dy.is_finite() {
            self.dy = 0.0;
        }
        self
    }
}

/// Wire format for a relayed event: accepts an object
/// `{"phase":"Update","fingers":3,"dx":1.0,"dy":0.0,"time":10}` (with
/// optional `x`/`y`) or the bus-signal tuple `["Update",3,1.0,0.0,10]`.
impl<'de> Deserialize<'de> for SwipeEvent {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{IgnoredAny, MapAccess, SeqAccess, Visitor};
        struct V;
        impl<'de> Visitor<'de> for V {
            type Value = SwipeEvent;
            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a swipe event object or [phase, fingers, dx, dy, time]")
            }
            fn visit_map<A>(self, mut map: A) -> Result<SwipeEvent, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut phase = None;
                let mut fingers = None;
                let mut dx = None;
                let mut dy = None;
                let mut time = None;
                let mut x = 0.0;
                let mut y = 0.0;
                while let Some(k) = map.next_key::<String>()? {
                    match k.as_str() {
                        "phase" => phase = Some(map.next_value()?),
                        "fingers" => fingers = Some(map.next_value()?),
                        "dx" => dx = Some(map.next_value()?),
                        "dy" => dy = Some(map.next_value()?),
                        "time" => time = Some(map.next_value()?),
                        "x" => x = map.next_value()?,
                        "y" => y = map.next_value()?,
                        _ => {
                            let _: IgnoredAny = map.next_value()?;
                        }
                    }
                }
                Ok(SwipeEvent {
                    phase: phase.ok_or_else(|| A::Error::missing_field("phase"))?,
                    fingers: fingers.ok_or_else(|| A::Error::missing_field("fingers"))?,
                    dx: dx.unwrap_or(0.0),
                    dy: dy.unwrap_or(0.0),
                    time: time.unwrap_or(0),
                    x,
                    y,
                })
            }
            fn visit_seq<A>(self, mut seq: A) -> Result<SwipeEvent, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let phase = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(0, &self))?;
                let fingers = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(1, &self))?;
                let dx = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(2, &self))?;
                let dy = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(3, &self))?;
                let time = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(4, &self))?;
                Ok(SwipeEvent::new(phase, fingers, dx, dy, time))
            }
        }
        deserializer.deserialize_any(V)
    }
}

/// Normalized output of a recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureSignal {
    /// The gesture was confirmed on the recognizer's axis.
    Begin { time: u32, x: f64, y: f64 },
    /// Motion along the recognizer's axis, in logical pixels.
    /// `distance` is the reference span for converting to progress.
    Update {
        time: u32,
        delta: f64,
        distance: f64,
    },
    /// Fingers lifted or the gesture was cancelled.
    End { time: u32, distance: f64 },
}

/// Whether a handler swallowed an event or let it continue to the next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Stop,
    Propagate,
}

impl Propagation {
    pub fn is_stop(self) -> bool {
        self == Propagation::Stop
    }
}
