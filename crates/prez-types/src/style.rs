//! Fill colours and text metrics exchanged with the drawing surface.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A fill colour in surface space: red, green and blue in `0..=255`, alpha
/// in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Self = Self {
        r: 255.0,
        g: 255.0,
        b: 255.0,
        a: 1.0,
    };

    /// Compose a colour from guest channels, all in `[0, 1]`.
    ///
    /// Red, green and blue are scaled by 255; alpha is passed through.  Values
    /// outside the unit range are clamped and NaN reads as zero.
    pub fn from_unit(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            r: unit(r) * 255.0,
            g: unit(g) * 255.0,
            b: unit(b) * 255.0,
            a: unit(a),
        }
    }
}

fn unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Rgba {
    /// CSS functional notation, e.g. `rgba(255, 0, 0, 0.5)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
    }
}

/// Text measurement, written to guest memory as five little-endian `f32`s in
/// field order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub width: f32,
    pub bbox_left: f32,
    pub bbox_right: f32,
    pub bbox_top: f32,
    pub bbox_bottom: f32,
}

impl TextMetrics {
    pub fn to_array(self) -> [f32; 5] {
        [
            self.width,
            self.bbox_left,
            self.bbox_right,
            self.bbox_top,
            self.bbox_bottom,
        ]
    }
}

/// Pixel size named in a CSS font shorthand such as `"bold 24px serif"`.
///
/// Returns `None` when no `px` size is present.
pub fn font_pixel_size(font: &str) -> Option<f32> {
    font.split_whitespace()
        .filter_map(|part| part.strip_suffix("px"))
        .find_map(|n| n.parse::<f32>().ok())
        .filter(|px| px.is_finite() && *px > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_colour_scales_rgb_but_not_alpha() {
        let c = Rgba::from_unit(1.0, 0.0, 0.0, 0.5);
        assert_eq!(
            c,
            Rgba {
                r: 255.0,
                g: 0.0,
                b: 0.0,
                a: 0.5,
            }
        );
        assert_eq!(c.to_string(), "rgba(255, 0, 0, 0.5)");
    }

    #[test]
    fn unit_colour_clamps_out_of_range() {
        let c = Rgba::from_unit(2.0, -1.0, f32::NAN, 7.0);
        assert_eq!(c.to_string(), "rgba(255, 0, 0, 1)");
    }

    #[test]
    fn font_size_is_read_from_shorthand() {
        assert_eq!(font_pixel_size("16px sans-serif"), Some(16.0));
        assert_eq!(font_pixel_size("bold 24.5px serif"), Some(24.5));
        assert_eq!(font_pixel_size("serif"), None);
        assert_eq!(font_pixel_size("0px serif"), None);
    }

    #[test]
    fn metrics_array_keeps_field_order() {
        let m = TextMetrics {
            width: 1.0,
            bbox_left: 2.0,
            bbox_right: 3.0,
            bbox_top: 4.0,
            bbox_bottom: 5.0,
        };
        assert_eq!(m.to_array(), [1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
