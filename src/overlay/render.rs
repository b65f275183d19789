use crate::error::RenderPreconditionError;
use crate::overlay::gate::MediaSlot;
use crate::overlay::model::{Color, Dimensions, MarkerStyle, Point, MAX_MARKER_RADIUS};
use crate::overlay::scale::ScaleFactors;

/// RGBA drawing surface laid over a media element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlaySurface {
    rgba: Vec<u8>,
    size: (u32, u32),
}

impl OverlaySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn rgba_pixels(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.size.0 || y >= self.size.1 {
            return None;
        }
        let idx = ((y as usize) * (self.size.0 as usize) + x as usize) * 4;
        let px = self.rgba.get(idx..idx + 4)?;
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }

    /// Number of pixels that are not fully transparent.
    pub fn painted_pixels(&self) -> usize {
        self.rgba.chunks_exact(4).filter(|px| px[3] != 0).count()
    }

    pub fn resize(&mut self, size: (u32, u32)) {
        let target_len = (size.0 as usize)
            .saturating_mul(size.1 as usize)
            .saturating_mul(4);
        if self.size != size || self.rgba.len() != target_len {
            self.rgba = vec![0; target_len];
            self.size = size;
        }
    }

    pub fn clear(&mut self) {
        self.rgba.fill(0);
    }

    /// Drop all pixels, e.g. when the result it belonged to is no longer shown.
    pub fn reset(&mut self) {
        self.rgba = Vec::new();
        self.size = (0, 0);
    }

    fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.size.0 || y >= self.size.1 {
            return;
        }
        let idx = ((y as usize) * (self.size.0 as usize) + x as usize) * 4;
        if let Some(px) = self.rgba.get_mut(idx..idx + 4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Paint the part of a disc that falls on the surface. Only the clipped
    /// bounding box is visited, so far-away centres cost nothing.
    fn fill_disc(&mut self, center: (i64, i64), radius: u32, color: Color) {
        let r = i64::from(radius.clamp(1, MAX_MARKER_RADIUS));
        let (w, h) = (i64::from(self.size.0), i64::from(self.size.1));
        if center.0 + r < 0 || center.1 + r < 0 || center.0 - r >= w || center.1 - r >= h {
            return;
        }
        let r_sq = r * r;
        for y in (center.1 - r).max(0)..=(center.1 + r).min(h - 1) {
            let dy = y - center.1;
            for x in (center.0 - r).max(0)..=(center.0 + r).min(w - 1) {
                let dx = x - center.0;
                if dx * dx + dy * dy <= r_sq {
                    self.set_pixel(x as u32, y as u32, color);
                }
            }
        }
    }
}

/// Native and currently displayed size of a media element.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MediaGeometry {
    pub native: Option<Dimensions>,
    pub display: Dimensions,
}

/// One side of a correspondence overlay: a surface, the media it covers and
/// the keypoints captured against that media's native resolution.
pub struct OverlayTarget<'a> {
    pub slot: MediaSlot,
    pub surface: &'a mut OverlaySurface,
    pub media: MediaGeometry,
    pub points: &'a [Point],
}

impl OverlayTarget<'_> {
    fn factors(&self) -> Result<ScaleFactors, RenderPreconditionError> {
        let native = self
            .media
            .native
            .filter(|native| !native.is_empty())
            .ok_or(RenderPreconditionError::MediaNotReady(self.slot))?;
        if self.media.display.to_pixels().0 == 0 || self.media.display.to_pixels().1 == 0 {
            return Err(RenderPreconditionError::NotLaidOut(self.slot));
        }
        ScaleFactors::between(native, self.media.display).map_err(|source| {
            RenderPreconditionError::Scale {
                slot: self.slot,
                source,
            }
        })
    }
}

/// Resize both surfaces to their media's displayed size, clear them and paint
/// one marker per keypoint. Preconditions for both sides are checked before
/// either surface is touched.
pub fn render_overlay(
    a: OverlayTarget<'_>,
    b: OverlayTarget<'_>,
    style: &MarkerStyle,
) -> Result<(), RenderPreconditionError> {
    let factors_a = a.factors()?;
    let factors_b = b.factors()?;
    paint_markers(a, factors_a, style);
    paint_markers(b, factors_b, style);
    Ok(())
}

fn paint_markers(target: OverlayTarget<'_>, factors: ScaleFactors, style: &MarkerStyle) {
    target.surface.resize(target.media.display.to_pixels());
    target.surface.clear();
    for (index, point) in target.points.iter().enumerate() {
        let center = factors.apply(*point).to_pixel();
        target
            .surface
            .fill_disc(center, style.radius, style.color_for(index));
    }
}
