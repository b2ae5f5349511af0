//! Drawing Command Bridge.
//!
//! Holds the single bound surface and the persistent style (fill colour and
//! font).  The guest's surface token is ignored by every call; there is only
//! ever one surface.

use prez_types::layout::{SURFACE_MAGIC, SURFACE_NOT_FOUND};
use prez_types::{Rgba, TextMetrics};

use crate::error::{BridgeError, BridgeResult};
use crate::images::DecodedImage;
use crate::surface::{DrawingSurface, Page, Rect, Viewport};

/// Canvas default font.
pub const DEFAULT_FONT: &str = "10px sans-serif";

/// Style carried between drawing calls.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleState {
    pub fill: Rgba,
    pub font: String,
}

impl Default for StyleState {
    fn default() -> Self {
        Self {
            fill: Rgba::WHITE,
            font: DEFAULT_FONT.to_string(),
        }
    }
}

pub struct CanvasBridge {
    page: Box<dyn Page>,
    surface: Option<Box<dyn DrawingSurface>>,
    style: StyleState,
}

impl CanvasBridge {
    pub fn new(page: Box<dyn Page>) -> Self {
        Self {
            page,
            surface: None,
            style: StyleState::default(),
        }
    }

    pub fn style(&self) -> &StyleState {
        &self.style
    }

    pub fn is_bound(&self) -> bool {
        self.surface.is_some()
    }

    pub fn viewport(&self) -> Viewport {
        self.page.viewport()
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.page.set_viewport(viewport);
    }

    /// Bind the placeholder `name` and size it to the viewport.
    ///
    /// Returns the surface magic, or `-1` if the page has no such
    /// placeholder.  A failed bind leaves any earlier surface in place.
    pub fn init(&mut self, name: &str) -> i32 {
        match self.page.bind(name) {
            Some(mut surface) => {
                let Viewport { width, height } = self.page.viewport();
                surface.resize(width, height);
                self.surface = Some(surface);
                tracing::debug!(target: "prez::canvas", name, width, height, "surface bound");
                SURFACE_MAGIC
            }
            None => {
                tracing::warn!(target: "prez::canvas", name, "no placeholder with that name");
                SURFACE_NOT_FOUND
            }
        }
    }

    fn surface(&mut self) -> BridgeResult<&mut Box<dyn DrawingSurface>> {
        self.surface.as_mut().ok_or(BridgeError::SurfaceUnbound)
    }

    fn surface_ref(&self) -> BridgeResult<&dyn DrawingSurface> {
        self.surface.as_deref().ok_or(BridgeError::SurfaceUnbound)
    }

    /// Fill the whole surface with the given colour, which becomes the fill.
    pub fn clear(&mut self, r: f32, g: f32, b: f32, a: f32) -> BridgeResult<()> {
        let fill = Rgba::from_unit(r, g, b, a);
        let surface = self.surface()?;
        let rect = Rect {
            x: 0.0,
            y: 0.0,
            w: surface.width() as f32,
            h: surface.height() as f32,
        };
        surface.fill_rect(rect, fill);
        self.style.fill = fill;
        Ok(())
    }

    pub fn fill_rect(&mut self, rect: Rect, r: f32, g: f32, b: f32, a: f32) -> BridgeResult<()> {
        let fill = Rgba::from_unit(r, g, b, a);
        self.surface()?.fill_rect(rect, fill);
        self.style.fill = fill;
        Ok(())
    }

    pub fn set_font(&mut self, font: &str) {
        self.style.font = font.to_string();
    }

    pub fn set_color(&mut self, r: f32, g: f32, b: f32, a: f32) {
        self.style.fill = Rgba::from_unit(r, g, b, a);
    }

    pub fn measure_text(&self, text: &str) -> BridgeResult<TextMetrics> {
        Ok(self.surface_ref()?.measure_text(text, &self.style.font))
    }

    /// Draw `text` in the current fill and font.  A non-positive (or NaN)
    /// `max_width` leaves the text unconstrained.
    pub fn fill_text(&mut self, text: &str, x: f32, y: f32, max_width: f32) -> BridgeResult<()> {
        let max_width = (max_width > 0.0).then_some(max_width);
        let fill = self.style.fill;
        let font = self.style.font.clone();
        self.surface()?.fill_text(text, x, y, max_width, fill, &font);
        Ok(())
    }

    pub fn draw_image(&mut self, image: &DecodedImage, dest: Rect) -> BridgeResult<()> {
        self.surface()?.draw_image(image, dest);
        Ok(())
    }

    pub fn width(&self) -> BridgeResult<u32> {
        Ok(self.surface_ref()?.width())
    }

    pub fn height(&self) -> BridgeResult<u32> {
        Ok(self.surface_ref()?.height())
    }

    /// Force the surface to `width` x `height`; negative sizes become zero.
    pub fn set_size(&mut self, width: i32, height: i32) -> BridgeResult<()> {
        self.surface()?.resize(width.max(0) as u32, height.max(0) as u32);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{CommandLog, DrawCommand, HeadlessPage};

    fn bound(viewport: Viewport) -> (CanvasBridge, CommandLog) {
        let mut page = HeadlessPage::new(viewport);
        let log = page.add_placeholder("screen");
        let mut canvas = CanvasBridge::new(Box::new(page));
        assert_eq!(canvas.init("screen"), SURFACE_MAGIC);
        (canvas, log)
    }

    #[test]
    fn init_sizes_surface_to_viewport() {
        let (canvas, log) = bound(Viewport {
            width: 640,
            height: 480,
        });
        assert_eq!(canvas.width().unwrap(), 640);
        assert_eq!(canvas.height().unwrap(), 480);
        assert_eq!(
            log.take(),
            vec![DrawCommand::Resize {
                width: 640,
                height: 480,
            }]
        );
    }

    #[test]
    fn missing_placeholder_returns_sentinel() {
        let mut canvas = CanvasBridge::new(Box::new(HeadlessPage::new(Viewport::default())));
        assert_eq!(canvas.init("nope"), -1);
        assert!(!canvas.is_bound());
    }

    #[test]
    fn drawing_before_init_is_rejected() {
        let mut canvas = CanvasBridge::new(Box::new(HeadlessPage::new(Viewport::default())));
        assert_eq!(canvas.clear(0.0, 0.0, 0.0, 1.0), Err(BridgeError::SurfaceUnbound));
        assert_eq!(canvas.width(), Err(BridgeError::SurfaceUnbound));
        assert_eq!(
            canvas.measure_text("x").err(),
            Some(BridgeError::SurfaceUnbound)
        );
    }

    #[test]
    fn clear_scales_rgb_and_passes_alpha() {
        let (mut canvas, log) = bound(Viewport {
            width: 4,
            height: 3,
        });
        log.take();
        canvas.clear(1.0, 0.0, 0.0, 0.5).unwrap();
        assert_eq!(
            log.take(),
            vec![DrawCommand::FillRect {
                rect: Rect {
                    x: 0.0,
                    y: 0.0,
                    w: 4.0,
                    h: 3.0,
                },
                fill: "rgba(255, 0, 0, 0.5)".to_string(),
            }]
        );
        assert_eq!(canvas.style().fill, Rgba::from_unit(1.0, 0.0, 0.0, 0.5));
    }

    #[test]
    fn text_uses_persistent_style() {
        let (mut canvas, log) = bound(Viewport::default());
        log.take();
        canvas.set_font("24px serif");
        canvas.set_color(0.0, 0.0, 1.0, 1.0);
        canvas.fill_text("hi", 5.0, 6.0, 0.0).unwrap();
        canvas.fill_text("hi", 5.0, 6.0, 50.0).unwrap();

        let commands = log.take();
        assert_eq!(
            commands[0],
            DrawCommand::FillText {
                text: "hi".to_string(),
                x: 5.0,
                y: 6.0,
                max_width: None,
                fill: "rgba(0, 0, 255, 1)".to_string(),
                font: "24px serif".to_string(),
            }
        );
        assert!(matches!(
            commands[1],
            DrawCommand::FillText {
                max_width: Some(w),
                ..
            } if w == 50.0
        ));
    }

    #[test]
    fn set_size_clamps_negative() {
        let (mut canvas, _log) = bound(Viewport::default());
        canvas.set_size(-5, 200).unwrap();
        assert_eq!((canvas.width().unwrap(), canvas.height().unwrap()), (0, 200));
    }
}
