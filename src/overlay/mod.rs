pub mod gate;
pub mod model;
pub mod render;
pub mod scale;

pub use gate::{GateSignal, MediaSlot, ReadinessGate};
pub use model::{Color, Dimensions, MarkerStyle, Point, MAX_MARKER_RADIUS};
pub use render::{render_overlay, MediaGeometry, OverlaySurface, OverlayTarget};
