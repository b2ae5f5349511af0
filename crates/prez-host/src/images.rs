//! Image Handle Table.
//!
//! Handles are allocated synchronously when the guest asks for a load; the
//! decoded payload arrives later through [`ImageTable::complete`].  The table
//! only grows, so a handle stays valid for the life of the session.

use std::sync::Arc;

use prez_types::Event;

use crate::error::{BridgeError, BridgeResult};

/// Decoded RGBA8 pixels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<[u8]>,
}

/// Where a load stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    Pending,
    Ready(DecodedImage),
    Failed(String),
}

#[derive(Debug)]
struct ImageRecord {
    source: String,
    state: ImageState,
}

#[derive(Debug, Default)]
pub struct ImageTable {
    records: Vec<ImageRecord>,
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handles issued.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Issue the next handle for a pending load of `source`.
    pub fn allocate(&mut self, source: impl Into<String>) -> u32 {
        let handle = self.records.len() as u32;
        self.records.push(ImageRecord {
            source: source.into(),
            state: ImageState::Pending,
        });
        handle
    }

    pub fn source(&self, handle: i32) -> BridgeResult<&str> {
        Ok(&self.record(handle)?.source)
    }

    pub fn state(&self, handle: i32) -> BridgeResult<&ImageState> {
        Ok(&self.record(handle)?.state)
    }

    /// Record the outcome of a load and return the event announcing it.
    ///
    /// A handle completes once; later outcomes for it are ignored and return
    /// `None`.
    pub fn complete(
        &mut self,
        handle: u32,
        result: Result<DecodedImage, String>,
    ) -> BridgeResult<Option<Event>> {
        let record = self
            .records
            .get_mut(handle as usize)
            .ok_or(BridgeError::UnknownImage(handle as i32))?;
        if record.state != ImageState::Pending {
            tracing::warn!(target: "prez::images", handle, "duplicate load completion ignored");
            return Ok(None);
        }
        let event = match result {
            Ok(image) => {
                tracing::debug!(
                    target: "prez::images",
                    handle,
                    source = %record.source,
                    width = image.width,
                    height = image.height,
                    "image ready"
                );
                let event = Event::ImageReady {
                    handle,
                    width: image.width,
                    height: image.height,
                };
                record.state = ImageState::Ready(image);
                event
            }
            Err(reason) => {
                tracing::warn!(
                    target: "prez::images",
                    handle,
                    source = %record.source,
                    %reason,
                    "image failed to load"
                );
                record.state = ImageState::Failed(reason);
                Event::ImageFailed { handle }
            }
        };
        Ok(Some(event))
    }

    /// Width and height of a completed load; `(-1, -1)` if it failed.
    ///
    /// Reading a pending load is a caller error.
    pub fn dimensions(&self, handle: i32) -> BridgeResult<(i32, i32)> {
        match self.state(handle)? {
            ImageState::Pending => Err(BridgeError::ImagePending(handle)),
            ImageState::Ready(image) => Ok((image.width as i32, image.height as i32)),
            ImageState::Failed(_) => Ok((
                prez_types::layout::IMAGE_SIZE_FAILED,
                prez_types::layout::IMAGE_SIZE_FAILED,
            )),
        }
    }

    /// Decoded pixels of a successfully completed load.
    pub fn image(&self, handle: i32) -> BridgeResult<&DecodedImage> {
        match self.state(handle)? {
            ImageState::Pending => Err(BridgeError::ImagePending(handle)),
            ImageState::Ready(image) => Ok(image),
            ImageState::Failed(_) => Err(BridgeError::ImageFailed(handle)),
        }
    }

    fn record(&self, handle: i32) -> BridgeResult<&ImageRecord> {
        usize::try_from(handle)
            .ok()
            .and_then(|i| self.records.get(i))
            .ok_or(BridgeError::UnknownImage(handle))
    }
}
