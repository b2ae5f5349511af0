//! Host input notifications and their translation into guest events.
//!
//! A windowing layer reports what it observes as [`HostInput`]; the session
//! turns each notification into at most one [`Event`], one notification at a
//! time and in arrival order.

use prez_types::Event;
use serde::{Deserialize, Serialize};

/// An input notification observed by the host, before filtering.
///
/// Coordinates are surface pixels; they are truncated toward zero when they
/// cross into the guest's integer words.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostInput {
    PointerDown { x: f64, y: f64, button: u32 },
    PointerUp { x: f64, y: f64, button: u32 },
    PointerMove { x: f64, y: f64 },
    Wheel { x: f64, y: f64, delta_y: f64 },
    KeyDown {
        code: u32,
        #[serde(default)]
        composing: bool,
    },
    KeyUp {
        code: u32,
        #[serde(default)]
        composing: bool,
    },
    Resize { width: u32, height: u32 },
    ContextMenu,
}

/// How the host should treat a notification after the bridge has seen it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// An event was written to the guest's buffer.
    Forwarded,
    /// The buffer was full; the event was discarded.
    Dropped,
    /// The notification carries nothing the guest consumes.
    Filtered,
    /// The host must suppress the platform default action.
    PreventDefault,
    /// No Event Buffer is registered yet.
    Ignored,
}

/// Result of translating one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Translation {
    Deliver(Event),
    Filter,
    PreventDefault,
}

pub fn translate(input: &HostInput) -> Translation {
    match *input {
        HostInput::PointerDown { x, y, button } => Translation::Deliver(Event::PointerDown {
            x: x as i32,
            y: y as i32,
            button,
        }),
        HostInput::PointerUp { x, y, button } => Translation::Deliver(Event::PointerUp {
            x: x as i32,
            y: y as i32,
            button,
        }),
        HostInput::PointerMove { x, y } => Translation::Deliver(Event::PointerMove {
            x: x as i32,
            y: y as i32,
        }),
        HostInput::Wheel { x, y, delta_y } => match Event::wheel(x as i32, y as i32, delta_y) {
            Some(event) => Translation::Deliver(event),
            None => Translation::Filter,
        },
        // IME composition keystrokes belong to the input method, not the guest.
        HostInput::KeyDown { composing: true, .. } | HostInput::KeyUp { composing: true, .. } => {
            Translation::Filter
        }
        HostInput::KeyDown { code, .. } => Translation::Deliver(Event::KeyDown { code }),
        HostInput::KeyUp { code, .. } => Translation::Deliver(Event::KeyUp { code }),
        HostInput::Resize { width, height } => {
            Translation::Deliver(Event::Resize { width, height })
        }
        HostInput::ContextMenu => Translation::PreventDefault,
    }
}
