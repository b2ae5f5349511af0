//! Shared wire types for the PREZ host bridge.
//!
//! A PREZ guest is a WASM module with no access to a display, input devices
//! or the network.  It reaches them through host imports and a fixed-layout
//! Event Buffer inside its own linear memory.  This crate holds everything
//! both sides of that boundary must agree on:
//!
//! - [`layout`]: Event Buffer header/slot layout and ABI constants
//! - [`event`]: the typed [`Event`] vocabulary and its word encoding
//! - [`reader`]: the consumer half of the buffer protocol
//! - [`style`]: fill colours and text metrics

pub mod error;
pub mod event;
pub mod layout;
pub mod reader;
pub mod style;

pub use error::{LayoutError, LayoutResult};
pub use event::{Event, Payload, Record, WheelDirection};
pub use reader::EventReader;
pub use style::{Rgba, TextMetrics};
