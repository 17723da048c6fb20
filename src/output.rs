//! Writes recognized gestures as newline-delimited JSON.
//!
//! Each line names the binding that produced it:
//!
//! ```json
//! {"gesture":"alt-tab","signal":{"Begin":{"time":1000,"x":0.0,"y":0.0}}}
//! {"gesture":"alt-tab","signal":{"Update":{"time":1008,"delta":2.25,"distance":400.0}}}
//! {"gesture":"alt-tab","signal":{"End":{"time":1030,"distance":400.0}}}
//! ```

use crate::event::GestureSignal;
use crate::traits::GestureListener;
use log::error;
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Serialize)]
struct Line<'a> {
    gesture: &'a str,
    signal: GestureSignal,
}

/// A [`GestureListener`] that serializes every signal to `out`.
pub struct JsonLinesListener<W: Write> {
    name: String,
    out: W,
}

impl<W: Write> JsonLinesListener<W> {
    pub fn new(name: impl Into<String>, out: W) -> Self {
        Self {
            name: name.into(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, signal: GestureSignal) {
        let line = Line {
            gesture: &self.name,
            signal,
        };
        let result = serde_json::to_writer(&mut self.out, &line)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.out))
            .and_then(|_| self.out.flush());
        if let Err(e) = result {
            error!("failed to write {} signal: {}", self.name, e);
        }
    }
}

impl<W: Write> GestureListener for JsonLinesListener<W> {
    fn begin(&mut self, time: u32, x: f64, y: f64) {
        self.emit(GestureSignal::Begin { time, x, y });
    }

    fn update(&mut self, time: u32, delta: f64, distance: f64) {
        self.emit(GestureSignal::Update {
            time,
            delta,
            distance,
        });
    }

    fn end(&mut self, time: u32, distance: f64) {
        self.emit(GestureSignal::End { time, distance });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_one_line_per_signal() {
        let mut l = JsonLinesListener::new("overview", Vec::new());
        l.begin(1, 0.0, 0.0);
        l.update(2, -1.5, 300.0);
        l.end(3, 300.0);

        let text = String::from_utf8(l.into_inner()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[1],
            r#"{"gesture":"overview","signal":{"Update":{"time":2,"delta":-1.5,"distance":300.0}}}"#
        );
    }

    #[test]
    fn lines_parse_back_into_signals() {
        let mut l = JsonLinesListener::new("alt-tab", Vec::new());
        l.end(9, 400.0);
        let text = String::from_utf8(l.into_inner()).unwrap();
        let v: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
        assert_eq!(v["gesture"], "alt-tab");
        let sig: GestureSignal = serde_json::from_value(v["signal"].clone()).unwrap();
        assert_eq!(
            sig,
            GestureSignal::End {
                time: 9,
                distance: 400.0,
            }
        );
    }
}
