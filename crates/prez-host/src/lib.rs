//! PREZ host bridge.
//!
//! Runs a sandboxed WASM guest under `wasmi` and gives it the capabilities it
//! cannot have on its own: a 2D drawing surface, an input event stream and
//! asynchronous image loading.  The guest passes addresses and lengths into
//! its own linear memory; every one of them is checked before use.
//!
//! ```no_run
//! use prez_host::{BridgeConfig, HeadlessPage, HostInput, Session};
//!
//! # fn main() -> prez_host::SessionResult<()> {
//! let wasm = std::fs::read("deck.wasm")?;
//! let config = BridgeConfig::default();
//! let mut page = HeadlessPage::new(config.viewport);
//! let log = page.add_placeholder("screen");
//!
//! let mut session = Session::builder(config).page(page).build(&wasm)?;
//! session.run_entry()?;
//! session.dispatch_input(HostInput::KeyDown { code: 39, composing: false })?;
//! session.tick()?;
//! println!("{} draw commands", log.len());
//! # Ok(())
//! # }
//! ```

pub mod canvas;
pub mod clock;
pub mod config;
pub mod error;
pub mod frame;
pub mod images;
pub mod imports;
pub mod input;
pub mod loader;
pub mod memory;
pub mod ring;
pub mod session;
pub mod state;
pub mod strings;
pub mod surface;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::BridgeConfig;
pub use error::{BridgeError, BridgeResult, SessionError, SessionResult};
pub use images::{DecodedImage, ImageState, ImageTable};
pub use input::{Disposition, HostInput};
pub use loader::{FsImageLoader, ImageLoader, LoadOutcome, ManualImageLoader, ManualLoads};
pub use ring::{EventRing, PushOutcome};
pub use session::{Session, SessionBuilder, TickOutcome};
pub use state::BridgeState;
pub use surface::{
    CommandLog, DrawCommand, DrawingSurface, HeadlessPage, Page, Rect, RecordingSurface, Viewport,
};
