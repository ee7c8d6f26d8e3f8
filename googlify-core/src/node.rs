//! Scene nodes
//!
//! An ImageNode is a positioned, uniformly scaled, optionally rotatable
//! raster element: either the main subject or a draggable overlay. The
//! decoded pixels are set once at creation and never mutated; all
//! display state lives in the transform fields.

use image::RgbaImage;
use kurbo::{Affine, Point, Size};
use std::sync::Arc;
use uuid::Uuid;

/// A raster element in the scene
#[derive(Clone, Debug)]
pub struct ImageNode {
    /// Unique identifier
    pub id: Uuid,

    /// Decoded source pixels, immutable after load
    pixels: Arc<RgbaImage>,

    /// Rotation in degrees, always a multiple of 90 in [0, 360).
    /// Only the main image rotates; overlays stay at 0.
    pub rotation_degrees: u16,

    /// Uniform scale factor. A single scalar, so X/Y scale can never
    /// diverge.
    pub scale: f64,

    /// Factor applied on top of the main image's fit scale when the
    /// scene refreshes overlay scales; 1.0 for the main image itself.
    pub relative_scale: f64,

    /// Center-anchored position on the stage
    pub position: Point,

    /// Whether the node can be dragged and can take the transform handle
    pub draggable: bool,
}

impl ImageNode {
    /// Create a node from decoded pixels.
    pub fn new(pixels: Arc<RgbaImage>, draggable: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            pixels,
            rotation_degrees: 0,
            scale: 1.0,
            relative_scale: 1.0,
            position: Point::ZERO,
            draggable,
        }
    }

    /// Intrinsic pixel dimensions of the source
    pub fn natural(&self) -> Size {
        Size::new(f64::from(self.pixels.width()), f64::from(self.pixels.height()))
    }

    /// Decoded source pixels
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    /// Shared handle to the source pixels
    pub fn pixels_arc(&self) -> Arc<RgbaImage> {
        Arc::clone(&self.pixels)
    }

    /// Anchor offset: half the natural size, so rotation pivots around
    /// the visual center.
    pub fn offset(&self) -> Point {
        let natural = self.natural();
        Point::new(natural.width / 2.0, natural.height / 2.0)
    }

    /// Map node-local pixel coordinates to stage coordinates.
    ///
    /// Composed as translate * rotate * scale * translate(-offset), the
    /// same order the renderer applies.
    pub fn to_affine(&self) -> Affine {
        let offset = self.offset();
        Affine::translate((self.position.x, self.position.y))
            * Affine::rotate(f64::from(self.rotation_degrees).to_radians())
            * Affine::scale(self.scale)
            * Affine::translate((-offset.x, -offset.y))
    }
}
