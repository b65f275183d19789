//! Maps keypoints from a media element's native resolution to the size it is
//! currently displayed at.

use crate::error::{Axis, ScaleError};
use crate::overlay::model::{Dimensions, Point};

/// Scales one coordinate: `value * (display / native)`.
pub fn scale(value: f64, native: f64, display: f64, axis: Axis) -> Result<f64, ScaleError> {
    Ok(value * ratio(native, display, axis)?)
}

/// Scales each axis with its own native/display pair.
pub fn scale_point(point: Point, native: Dimensions, display: Dimensions) -> Result<Point, ScaleError> {
    ScaleFactors::between(native, display).map(|factors| factors.apply(point))
}

fn ratio(native: f64, display: f64, axis: Axis) -> Result<f64, ScaleError> {
    if !(native.is_finite() && native > 0.0) {
        return Err(ScaleError::NonPositiveNative {
            axis,
            value: native,
        });
    }
    if !(display.is_finite() && display >= 0.0) {
        return Err(ScaleError::InvalidDisplay {
            axis,
            value: display,
        });
    }
    Ok(display / native)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    pub fn between(native: Dimensions, display: Dimensions) -> Result<Self, ScaleError> {
        Ok(Self {
            x: ratio(native.width, display.width, Axis::Width)?,
            y: ratio(native.height, display.height, Axis::Height)?,
        })
    }

    pub fn apply(&self, point: Point) -> Point {
        Point::new(point.x * self.x, point.y * self.y)
    }
}
