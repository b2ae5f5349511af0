//! Input and asset events delivered through the Event Buffer.
//!
//! An [`Event`] is the typed form; it only becomes a row of `u32` words at the
//! write boundary ([`Event::payload`]) and is rebuilt from words by
//! [`Event::decode`].

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, LayoutResult};
use crate::layout::*;

/// Largest payload any event kind carries.
pub const MAX_PAYLOAD_WORDS: usize = 3;

/// Scroll direction carried by wheel events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelDirection {
    Up,
    Down,
}

impl WheelDirection {
    /// Direction for a vertical wheel delta; `None` for a zero delta.
    pub fn from_delta(delta_y: f64) -> Option<Self> {
        if delta_y < 0.0 {
            Some(Self::Up)
        } else if delta_y > 0.0 {
            Some(Self::Down)
        } else {
            None
        }
    }

    pub fn word(self) -> u32 {
        match self {
            Self::Up => WHEEL_UP,
            Self::Down => WHEEL_DOWN,
        }
    }

    fn from_word(word: u32) -> Option<Self> {
        match word {
            WHEEL_UP => Some(Self::Up),
            WHEEL_DOWN => Some(Self::Down),
            _ => None,
        }
    }
}

/// One event as the guest observes it.
///
/// Coordinates are signed; they cross the boundary as their two's complement
/// bit pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    PointerDown { x: i32, y: i32, button: u32 },
    PointerUp { x: i32, y: i32, button: u32 },
    PointerMove { x: i32, y: i32 },
    KeyDown { code: u32 },
    KeyUp { code: u32 },
    Resize { width: u32, height: u32 },
    Wheel { x: i32, y: i32, direction: WheelDirection },
    ImageReady { handle: u32, width: u32, height: u32 },
    ImageFailed { handle: u32 },
}

/// Data words of an event, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Payload {
    words: [u32; MAX_PAYLOAD_WORDS],
    len: usize,
}

impl Payload {
    fn new(src: &[u32]) -> Self {
        let mut words = [0; MAX_PAYLOAD_WORDS];
        words[..src.len()].copy_from_slice(src);
        Self {
            words,
            len: src.len(),
        }
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.words[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Event {
    /// Build a wheel event; a zero vertical delta produces no event.
    pub fn wheel(x: i32, y: i32, delta_y: f64) -> Option<Self> {
        WheelDirection::from_delta(delta_y).map(|direction| Self::Wheel { x, y, direction })
    }

    /// The kind tag written to slot word 0.
    pub fn kind(&self) -> u32 {
        match self {
            Self::PointerDown { .. } => KIND_POINTER_DOWN,
            Self::PointerUp { .. } => KIND_POINTER_UP,
            Self::PointerMove { .. } => KIND_POINTER_MOVE,
            Self::KeyDown { .. } => KIND_KEY_DOWN,
            Self::KeyUp { .. } => KIND_KEY_UP,
            Self::Resize { .. } => KIND_RESIZE,
            Self::Wheel { .. } => KIND_WHEEL,
            Self::ImageReady { .. } => KIND_IMAGE_READY,
            Self::ImageFailed { .. } => KIND_IMAGE_FAILED,
        }
    }

    /// The data words written after kind and timestamp.
    pub fn payload(&self) -> Payload {
        match *self {
            Self::PointerDown { x, y, button } | Self::PointerUp { x, y, button } => {
                Payload::new(&[x as u32, y as u32, button])
            }
            Self::PointerMove { x, y } => Payload::new(&[x as u32, y as u32, MOVE_BUTTON_SENTINEL]),
            Self::KeyDown { code } | Self::KeyUp { code } => Payload::new(&[code]),
            Self::Resize { width, height } => Payload::new(&[width, height]),
            Self::Wheel { x, y, direction } => Payload::new(&[x as u32, y as u32, direction.word()]),
            Self::ImageReady {
                handle,
                width,
                height,
            } => Payload::new(&[handle, width, height]),
            Self::ImageFailed { handle } => Payload::new(&[handle]),
        }
    }

    /// Number of data words the given kind needs, or `None` for unknown kinds.
    pub fn payload_len(kind: u32) -> Option<usize> {
        match kind {
            KIND_POINTER_DOWN | KIND_POINTER_UP | KIND_POINTER_MOVE | KIND_WHEEL
            | KIND_IMAGE_READY => Some(3),
            KIND_RESIZE => Some(2),
            KIND_KEY_DOWN | KIND_KEY_UP | KIND_IMAGE_FAILED => Some(1),
            _ => None,
        }
    }

    /// Rebuild an event from its kind tag and the data words of its slot.
    ///
    /// `data` may be longer than the kind needs (unused trailing words are
    /// ignored) but not shorter.
    pub fn decode(kind: u32, data: &[u32]) -> LayoutResult<Self> {
        let needed = Self::payload_len(kind).ok_or(LayoutError::UnknownKind(kind))?;
        if data.len() < needed {
            return Err(LayoutError::Truncated {
                kind,
                needed,
                available: data.len(),
            });
        }
        let event = match kind {
            KIND_POINTER_DOWN => Self::PointerDown {
                x: data[0] as i32,
                y: data[1] as i32,
                button: data[2],
            },
            KIND_POINTER_UP => Self::PointerUp {
                x: data[0] as i32,
                y: data[1] as i32,
                button: data[2],
            },
            KIND_POINTER_MOVE => Self::PointerMove {
                x: data[0] as i32,
                y: data[1] as i32,
            },
            KIND_KEY_DOWN => Self::KeyDown { code: data[0] },
            KIND_KEY_UP => Self::KeyUp { code: data[0] },
            KIND_RESIZE => Self::Resize {
                width: data[0],
                height: data[1],
            },
            KIND_WHEEL => Self::Wheel {
                x: data[0] as i32,
                y: data[1] as i32,
                direction: WheelDirection::from_word(data[2]).ok_or(
                    LayoutError::InvalidWord {
                        kind,
                        index: 2,
                        value: data[2],
                    },
                )?,
            },
            KIND_IMAGE_READY => Self::ImageReady {
                handle: data[0],
                width: data[1],
                height: data[2],
            },
            KIND_IMAGE_FAILED => Self::ImageFailed { handle: data[0] },
            other => return Err(LayoutError::UnknownKind(other)),
        };
        Ok(event)
    }
}

/// A decoded slot: the event plus the host timestamp it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub timestamp: u32,
    pub event: Event,
}
