//! The bridge context held by the wasmi store.
//!
//! Everything the imports touch lives here rather than in process-wide
//! statics, so independent sessions never share state.

use std::collections::VecDeque;

use prez_types::layout::HEADER_BYTES;
use prez_types::Event;

use crate::canvas::CanvasBridge;
use crate::clock::Clock;
use crate::error::BridgeResult;
use crate::frame::FrameDriver;
use crate::images::ImageTable;
use crate::loader::{ImageLoader, LoadOutcome};
use crate::memory::GuestMemory;
use crate::ring::{EventRing, PushOutcome};
use crate::surface::{Page, Viewport};

/// Guest output lines kept for inspection.
const PRINTED_LINES: usize = 256;

pub struct BridgeState {
    pub(crate) memory_export: String,
    pub(crate) canvas: CanvasBridge,
    pub(crate) ring: Option<EventRing>,
    pub(crate) images: ImageTable,
    pub(crate) loader: Box<dyn ImageLoader>,
    pub(crate) clock: Box<dyn Clock>,
    pub(crate) frames: FrameDriver,
    printed: VecDeque<String>,
    exit_status: Option<i32>,
}

impl BridgeState {
    pub fn new(
        memory_export: impl Into<String>,
        page: Box<dyn Page>,
        loader: Box<dyn ImageLoader>,
        clock: Box<dyn Clock>,
    ) -> Self {
        Self {
            memory_export: memory_export.into(),
            canvas: CanvasBridge::new(page),
            ring: None,
            images: ImageTable::new(),
            loader,
            clock,
            frames: FrameDriver::new(),
            printed: VecDeque::new(),
            exit_status: None,
        }
    }

    pub fn canvas(&self) -> &CanvasBridge {
        &self.canvas
    }

    pub fn images(&self) -> &ImageTable {
        &self.images
    }

    pub fn ring(&self) -> Option<&EventRing> {
        self.ring.as_ref()
    }

    pub fn frames(&self) -> &FrameDriver {
        &self.frames
    }

    /// The most recent lines the guest printed, oldest first.
    pub fn printed(&self) -> impl Iterator<Item = &str> {
        self.printed.iter().map(String::as_str)
    }

    /// The last status passed to `host.exit`, if any.
    pub fn exit_status(&self) -> Option<i32> {
        self.exit_status
    }

    pub(crate) fn print(&mut self, line: String) {
        tracing::info!(target: "prez::guest", "{line}");
        if self.printed.len() == PRINTED_LINES {
            self.printed.pop_front();
        }
        self.printed.push_back(line);
    }

    pub(crate) fn request_exit(&mut self, status: i32) {
        tracing::warn!(target: "prez::guest", status, "guest requested exit; ignoring");
        self.exit_status = Some(status);
    }

    /// Register the Event Buffer at `header_addr` and deliver the initial
    /// resize carrying the current viewport.
    ///
    /// Registering again replaces the previous buffer, but only once the new
    /// one has accepted its initial resize.
    pub(crate) fn register_ring(
        &mut self,
        memory: &mut GuestMemory<'_>,
        header_addr: u32,
        event_size: u32,
    ) -> BridgeResult<PushOutcome> {
        let mut ring = EventRing::new(header_addr, event_size)?;
        memory.range(header_addr, HEADER_BYTES)?;

        let Viewport { width, height } = self.canvas.viewport();
        let outcome = ring.push(memory, &Event::Resize { width, height }, self.clock.now_ms())?;

        if self.ring.is_some() {
            tracing::warn!(target: "prez::ring", header_addr, "event buffer registered again");
        }
        tracing::debug!(target: "prez::ring", header_addr, event_size, "event buffer registered");
        self.ring = Some(ring);
        Ok(outcome)
    }

    /// Push `event` if a buffer is registered; `None` means there is none.
    pub(crate) fn deliver(
        &mut self,
        memory: &mut GuestMemory<'_>,
        event: &Event,
    ) -> BridgeResult<Option<PushOutcome>> {
        let now = self.clock.now_ms();
        match self.ring.as_mut() {
            Some(ring) => ring.push(memory, event, now).map(Some),
            None => Ok(None),
        }
    }

    /// Allocate a handle for `source` and hand the load to the loader.
    pub(crate) fn begin_load(&mut self, source: String) -> u32 {
        let handle = self.images.allocate(source.clone());
        self.loader.begin(handle, &source);
        handle
    }

    /// Record a batch of finished loads, then announce them to the guest.
    ///
    /// Every outcome reaches the handle table before any event is pushed, and
    /// a failure on one outcome does not stop the rest.  The first error is
    /// returned once the whole batch has been handled.
    pub(crate) fn complete_loads(
        &mut self,
        memory: &mut GuestMemory<'_>,
        outcomes: Vec<LoadOutcome>,
    ) -> BridgeResult<()> {
        let mut first_error = None;
        let mut announcements = Vec::with_capacity(outcomes.len());
        for LoadOutcome { handle, result } in outcomes {
            match self.images.complete(handle, result) {
                Ok(Some(event)) => announcements.push(event),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(target: "prez::images", handle, error = %err, "load outcome not recorded");
                    first_error.get_or_insert(err);
                }
            }
        }
        for event in &announcements {
            if let Err(err) = self.deliver(memory, event) {
                tracing::warn!(target: "prez::images", kind = event.kind(), error = %err, "load announcement not delivered");
                first_error.get_or_insert(err);
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
