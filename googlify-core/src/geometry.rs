//! Contain-fit geometry for rotated, zoomed images
//!
//! Pure functions computing how a node of a given natural size fits the
//! viewport at a given quarter-turn rotation and zoom factor. This is
//! the single source of truth for the main image's scale; callers
//! recompute the fit from scratch on every change rather than adjusting
//! a previous value, so the scale can never drift.

use crate::error::EngineError;
use crate::viewport::Viewport;
use kurbo::Size;

/// Result of fitting a node into the viewport
///
/// `image_width`/`image_height` are the node's on-screen size before
/// rotation (the renderer rotates about the center); `canvas_width`/
/// `canvas_height` are the post-rotation visual footprint the stage
/// must adopt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FittedLayout {
    pub image_width: f64,
    pub image_height: f64,
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub scale: f64,
}

/// Whether a rotation exchanges the width/height roles of a node
pub fn axes_swapped(rotation_degrees: u16) -> bool {
    rotation_degrees % 180 != 0
}

/// Contain-fit a natural size into the viewport.
///
/// The fit maps the node's axes onto the viewport's according to the
/// rotation (axis swap at odd quarter turns), picks the uniform scale
/// that makes the rotated footprint touch the viewport on at least one
/// axis, and multiplies by the zoom factor. Zoom may push the footprint
/// past the viewport; that is intentional.
pub fn fit(
    natural: Size,
    rotation_degrees: u16,
    zoom: f64,
    viewport: Viewport,
) -> Result<FittedLayout, EngineError> {
    if !natural.width.is_finite() || !natural.height.is_finite()
        || natural.width <= 0.0 || natural.height <= 0.0
    {
        return Err(EngineError::DegenerateInput(format!(
            "natural size {}x{}",
            natural.width, natural.height
        )));
    }
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return Err(EngineError::DegenerateInput(format!(
            "viewport {}x{}",
            viewport.width, viewport.height
        )));
    }
    if !zoom.is_finite() || zoom <= 0.0 {
        return Err(EngineError::DegenerateInput(format!("zoom {zoom}")));
    }
    if rotation_degrees % 90 != 0 {
        return Err(EngineError::DegenerateInput(format!(
            "rotation {rotation_degrees} is not a quarter turn"
        )));
    }

    // Map the node's axes onto the viewport's axes for the fit test.
    let (fit_width, fit_height) = if axes_swapped(rotation_degrees) {
        (natural.height, natural.width)
    } else {
        (natural.width, natural.height)
    };

    let scale = (viewport.width / fit_width).min(viewport.height / fit_height) * zoom;

    let image_width = natural.width * scale;
    let image_height = natural.height * scale;

    // The stage tracks the post-rotation footprint.
    let (canvas_width, canvas_height) = if axes_swapped(rotation_degrees) {
        (image_height, image_width)
    } else {
        (image_width, image_height)
    };

    Ok(FittedLayout {
        image_width,
        image_height,
        canvas_width,
        canvas_height,
        scale,
    })
}
