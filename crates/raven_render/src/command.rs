//! Drawing commands: the hand-off format to a 2D vector backend.
//!
//! Geometry is plain `kurbo`: outlines are [`BezPath`]s in shape-local
//! coordinates and placement is an [`Affine`]. Any backend that consumes
//! kurbo paths (tiny-skia here, vello or a cairo binding elsewhere) can draw
//! them unchanged.

pub use kurbo::{Affine, BezPath, Point};
use kurbo::Shape;
use serde::{Deserialize, Serialize};

/// RGBA color, 8 bits per channel, not premultiplied.
pub type Rgba = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Rgba,
    /// Width in output pixels, unaffected by the shape transform.
    pub width: f64,
}

/// One filled and/or outlined shape placed by `transform`.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Outline centered on the origin, fitting the unit box `[-0.5, 0.5]^2`.
    pub path: BezPath,
    pub fill: Option<Rgba>,
    pub stroke: Option<Stroke>,
    pub transform: Affine,
}

impl DrawCommand {
    /// The outline in output coordinates, after `offset` follows `transform`.
    pub fn placed_path(&self, offset: Affine) -> BezPath {
        (offset * self.transform) * self.path.clone()
    }

    /// Bounds of the placed outline, ignoring stroke width.
    pub fn bounds(&self) -> kurbo::Rect {
        self.placed_path(Affine::IDENTITY).bounding_box()
    }
}
