//! Drawing surfaces and the page that hosts them.
//!
//! The bridge draws through [`DrawingSurface`] and finds surfaces through
//! [`Page`].  A windowing backend implements both; [`HeadlessPage`] and
//! [`RecordingSurface`] record every command instead of rasterising, which is
//! what the headless runner and the tests use.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use prez_types::style::font_pixel_size;
use prez_types::{Rgba, TextMetrics};
use serde::{Deserialize, Serialize};

use crate::images::DecodedImage;

/// Size of the embedding page in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// An axis-aligned rectangle in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// A 2D drawing target.  All calls take effect before they return.
pub trait DrawingSurface: Send {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn resize(&mut self, width: u32, height: u32);
    fn fill_rect(&mut self, rect: Rect, fill: Rgba);
    /// Draw `text` with its baseline at `y`; `max_width` squeezes it to fit.
    fn fill_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_width: Option<f32>,
        fill: Rgba,
        font: &str,
    );
    fn measure_text(&self, text: &str, font: &str) -> TextMetrics;
    fn draw_image(&mut self, image: &DecodedImage, dest: Rect);
}

/// The embedding page: placeholders the guest can bind a surface to.
pub trait Page: Send {
    fn viewport(&self) -> Viewport;
    fn set_viewport(&mut self, viewport: Viewport);
    /// Bind the placeholder called `name`, or `None` if there is none.
    fn bind(&mut self, name: &str) -> Option<Box<dyn DrawingSurface>>;
}

// ══════════════════════════════════════════════════════════════════════════════
// Recording implementation
// ══════════════════════════════════════════════════════════════════════════════

/// One drawing operation as recorded by a [`RecordingSurface`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum DrawCommand {
    Resize {
        width: u32,
        height: u32,
    },
    FillRect {
        rect: Rect,
        fill: String,
    },
    FillText {
        text: String,
        x: f32,
        y: f32,
        max_width: Option<f32>,
        fill: String,
        font: String,
    },
    DrawImage {
        width: u32,
        height: u32,
        dest: Rect,
    },
}

/// Shared handle to the commands a surface has recorded.
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    inner: Arc<Mutex<Vec<DrawCommand>>>,
}

impl CommandLog {
    fn lock(&self) -> MutexGuard<'_, Vec<DrawCommand>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, command: DrawCommand) {
        self.lock().push(command);
    }

    /// Copy of everything recorded so far.
    pub fn snapshot(&self) -> Vec<DrawCommand> {
        self.lock().clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<DrawCommand> {
        std::mem::take(&mut *self.lock())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Horizontal advance per character, as a fraction of the font size.
const ADVANCE_EM: f32 = 0.6;
const ASCENT_EM: f32 = 0.8;
const DESCENT_EM: f32 = 0.2;
/// Canvas default font size.
const DEFAULT_FONT_PX: f32 = 10.0;

/// A surface that records commands and measures text with fixed-advance
/// metrics derived from the font's pixel size.
pub struct RecordingSurface {
    width: u32,
    height: u32,
    log: CommandLog,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32, log: CommandLog) -> Self {
        Self { width, height, log }
    }
}

impl DrawingSurface for RecordingSurface {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.log.record(DrawCommand::Resize { width, height });
    }

    fn fill_rect(&mut self, rect: Rect, fill: Rgba) {
        self.log.record(DrawCommand::FillRect {
            rect,
            fill: fill.to_string(),
        });
    }

    fn fill_text(
        &mut self,
        text: &str,
        x: f32,
        y: f32,
        max_width: Option<f32>,
        fill: Rgba,
        font: &str,
    ) {
        self.log.record(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            max_width,
            fill: fill.to_string(),
            font: font.to_string(),
        });
    }

    fn measure_text(&self, text: &str, font: &str) -> TextMetrics {
        let px = font_pixel_size(font).unwrap_or(DEFAULT_FONT_PX);
        let width = text.chars().count() as f32 * px * ADVANCE_EM;
        TextMetrics {
            width,
            bbox_left: 0.0,
            bbox_right: width,
            bbox_top: px * ASCENT_EM,
            bbox_bottom: px * DESCENT_EM,
        }
    }

    fn draw_image(&mut self, image: &DecodedImage, dest: Rect) {
        self.log.record(DrawCommand::DrawImage {
            width: image.width,
            height: image.height,
            dest,
        });
    }
}

/// A page with no window: named placeholders backed by recording surfaces.
pub struct HeadlessPage {
    viewport: Viewport,
    placeholders: HashMap<String, CommandLog>,
}

impl HeadlessPage {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            placeholders: HashMap::new(),
        }
    }

    /// Add a placeholder the guest can bind by `name`; returns its log.
    pub fn add_placeholder(&mut self, name: impl Into<String>) -> CommandLog {
        self.placeholders.entry(name.into()).or_default().clone()
    }
}

impl Page for HeadlessPage {
    fn viewport(&self) -> Viewport {
        self.viewport
    }

    fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn bind(&mut self, name: &str) -> Option<Box<dyn DrawingSurface>> {
        let log = self.placeholders.get(name)?.clone();
        Some(Box::new(RecordingSurface::new(
            self.viewport.width,
            self.viewport.height,
            log,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headless_page_binds_known_placeholders_only() {
        let mut page = HeadlessPage::new(Viewport::default());
        page.add_placeholder("main");
        assert!(page.bind("main").is_some());
        assert!(page.bind("other").is_none());
    }

    #[test]
    fn recording_surface_logs_commands() {
        let log = CommandLog::default();
        let mut surface = RecordingSurface::new(10, 10, log.clone());
        surface.resize(20, 30);
        surface.fill_rect(
            Rect {
                x: 0.0,
                y: 0.0,
                w: 5.0,
                h: 5.0,
            },
            Rgba::from_unit(0.0, 0.0, 0.0, 1.0),
        );
        assert_eq!((surface.width(), surface.height()), (20, 30));
        let commands = log.take();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[1],
            DrawCommand::FillRect {
                rect: Rect {
                    x: 0.0,
                    y: 0.0,
                    w: 5.0,
                    h: 5.0,
                },
                fill: "rgba(0, 0, 0, 1)".to_string(),
            }
        );
        assert!(log.is_empty());
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn text_metrics_scale_with_font_size() {
        let surface = RecordingSurface::new(1, 1, CommandLog::default());
        let m = surface.measure_text("abcd", "20px mono");
        assert!(close(m.width, 48.0));
        assert!(close(m.bbox_right, 48.0));
        assert!(close(m.bbox_top, 16.0));
        assert!(close(m.bbox_bottom, 4.0));

        let default = surface.measure_text("ab", "serif");
        assert!(close(default.width, 12.0));
    }
}
