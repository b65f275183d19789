use serde::{Deserialize, Serialize};

/// A keypoint or any other position on a media element, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nearest pixel centre, clamped to the `i32` range so offsets by a
    /// marker radius cannot overflow.
    pub fn to_pixel(self) -> (i64, i64) {
        let clamp = |v: f64| v.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i64;
        (clamp(self.x), clamp(self.y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_empty(self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Pixel size of a drawing surface covering these dimensions.
    pub fn to_pixels(self) -> (u32, u32) {
        let clamp = |v: f64| {
            if v.is_finite() && v > 0.0 {
                v.round().min(u32::MAX as f64) as u32
            } else {
                0
            }
        };
        (clamp(self.width), clamp(self.height))
    }

    /// Largest size with the same aspect ratio that fits into `width`.
    pub fn fit_width(self, width: f64) -> Dimensions {
        if self.is_empty() || width <= 0.0 {
            return Dimensions::default();
        }
        Dimensions::new(width, self.height * width / self.width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const RED: Color = Color::rgba(255, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Colour key shared by both surfaces so that marker `i` on the query image and
/// marker `i` on the matched frame use the same colour.
pub const KEY_PALETTE: [Color; 8] = [
    Color::rgba(255, 59, 48, 255),
    Color::rgba(52, 199, 89, 255),
    Color::rgba(10, 132, 255, 255),
    Color::rgba(255, 204, 0, 255),
    Color::rgba(175, 82, 222, 255),
    Color::rgba(90, 200, 250, 255),
    Color::rgba(255, 149, 0, 255),
    Color::rgba(255, 45, 85, 255),
];

/// Largest marker radius, in display pixels.
pub const MAX_MARKER_RADIUS: u32 = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerStyle {
    pub radius: u32,
    pub color: Color,
    pub color_key: bool,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            radius: 3,
            color: Color::RED,
            color_key: true,
        }
    }
}

impl MarkerStyle {
    pub fn color_for(&self, index: usize) -> Color {
        if self.color_key {
            KEY_PALETTE[index % KEY_PALETTE.len()]
        } else {
            self.color
        }
    }
}
