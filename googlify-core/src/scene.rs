//! Scene graph
//!
//! Owns the main image node and the overlay nodes, applies the geometry
//! solver's output, and enforces the engine invariants: uniform scale
//! everywhere, at most one transform handle, contain-fit of the main
//! image, and overlay co-scaling. Paint order is insertion order with
//! the main image first.

use crate::error::EngineError;
use crate::geometry::{self, FittedLayout};
use crate::node::ImageNode;
use crate::viewport::Viewport;
use image::RgbaImage;
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Permitted zoom factors, in order
pub const DEFAULT_ZOOM_LEVELS: [f64; 7] = [0.1, 0.25, 0.5, 1.0, 1.5, 2.0, 3.0];

/// Default padding of the transform handle around its node
pub const DEFAULT_HANDLE_PADDING: f64 = 5.0;

/// The on-canvas resize/move affordance, attached to at most one node
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransformHandle {
    /// Id of the node the handle is attached to
    pub node: Uuid,
    /// Padding around the node's bounds
    pub padding: f64,
}

/// Default position and scale for a freshly spawned overlay
///
/// Presentation defaults, not invariants; hosts may supply their own.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlaySpawn {
    /// Center-anchored stage position
    pub position: Point,
    /// Scale factor relative to the main image's fit scale
    pub scale: f64,
}

impl OverlaySpawn {
    /// The two eye positions the reference layout uses.
    pub fn defaults() -> Vec<OverlaySpawn> {
        vec![
            OverlaySpawn {
                position: Point::new(50.0, 50.0),
                scale: 0.4,
            },
            OverlaySpawn {
                position: Point::new(200.0, 50.0),
                scale: 0.4,
            },
        ]
    }
}

/// The node collection and its derived stage state
#[derive(Clone, Debug)]
pub struct Scene {
    viewport: Viewport,
    zoom_levels: Vec<f64>,
    zoom_index: usize,
    handle_padding: f64,
    main: Option<ImageNode>,
    overlays: Vec<ImageNode>,
    /// Retained sources so `reset_overlays` can respawn from defaults
    overlay_sources: Vec<(Arc<RgbaImage>, OverlaySpawn)>,
    handle: Option<TransformHandle>,
    canvas: Size,
    render_requested: bool,
}

impl Scene {
    /// Create an empty scene over the given viewport.
    ///
    /// `zoom_levels` must be a non-empty, strictly increasing list of
    /// positive factors.
    pub fn new(
        viewport: Viewport,
        zoom_levels: Vec<f64>,
        handle_padding: f64,
    ) -> Result<Self, EngineError> {
        if zoom_levels.is_empty()
            || zoom_levels.iter().any(|z| !z.is_finite() || *z <= 0.0)
            || zoom_levels.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(EngineError::DegenerateInput(format!(
                "zoom levels {zoom_levels:?}"
            )));
        }
        let zoom_index = Self::nearest_level(&zoom_levels, 1.0);
        Ok(Self {
            canvas: Size::new(viewport.width, viewport.height),
            viewport,
            zoom_levels,
            zoom_index,
            handle_padding,
            main: None,
            overlays: Vec::new(),
            overlay_sources: Vec::new(),
            handle: None,
            render_requested: false,
        })
    }

    fn nearest_level(levels: &[f64], target: f64) -> usize {
        let mut best = 0;
        for (i, level) in levels.iter().enumerate() {
            if (level - target).abs() < (levels[best] - target).abs() {
                best = i;
            }
        }
        best
    }

    /// Current zoom factor
    pub fn zoom(&self) -> f64 {
        self.zoom_levels[self.zoom_index]
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Stage size: the main image's post-rotation footprint, or the
    /// viewport before any image is loaded.
    pub fn canvas_size(&self) -> Size {
        self.canvas
    }

    pub fn main(&self) -> Option<&ImageNode> {
        self.main.as_ref()
    }

    pub fn overlays(&self) -> &[ImageNode] {
        &self.overlays
    }

    pub fn handle(&self) -> Option<&TransformHandle> {
        self.handle.as_ref()
    }

    /// Main image's current fit scale, if an image is loaded
    pub fn main_scale(&self) -> Option<f64> {
        self.main.as_ref().map(|m| m.scale)
    }

    /// Look up any node by id.
    pub fn node(&self, id: Uuid) -> Option<&ImageNode> {
        self.nodes_back_to_front().find(|n| n.id == id)
    }

    /// Paint order: main image first, then overlays in insertion order.
    pub fn nodes_back_to_front(&self) -> impl Iterator<Item = &ImageNode> {
        self.main.iter().chain(self.overlays.iter())
    }

    /// Hit-test order: topmost node first.
    pub fn nodes_front_to_back(&self) -> impl Iterator<Item = &ImageNode> {
        self.overlays.iter().rev().chain(self.main.iter())
    }

    /// Whether a render has been requested since the last take.
    pub fn take_render_request(&mut self) -> bool {
        std::mem::take(&mut self.render_requested)
    }

    fn request_render(&mut self) {
        self.render_requested = true;
    }

    /// Replace the main image. Rotation returns to 0 and zoom to the
    /// level nearest 1.0; any attached handle is destroyed, since a
    /// selection cannot survive an image swap. On error the scene is
    /// left untouched.
    pub fn set_main_image(&mut self, pixels: Arc<RgbaImage>) -> Result<(), EngineError> {
        let mut node = ImageNode::new(pixels, false);
        let zoom_index = Self::nearest_level(&self.zoom_levels, 1.0);
        let layout = geometry::fit(
            node.natural(),
            0,
            self.zoom_levels[zoom_index],
            self.viewport,
        )?;
        Self::apply_layout(&mut node, &layout);
        log::info!(
            "main image set: natural {}x{}, scale {:.4}",
            node.natural().width,
            node.natural().height,
            layout.scale
        );
        self.handle = None;
        self.zoom_index = zoom_index;
        self.canvas = Size::new(layout.canvas_width, layout.canvas_height);
        self.main = Some(node);
        self.refresh_overlay_scales();
        self.request_render();
        Ok(())
    }

    fn apply_layout(node: &mut ImageNode, layout: &FittedLayout) {
        node.scale = layout.scale;
        node.position = Point::new(layout.canvas_width / 2.0, layout.canvas_height / 2.0);
    }

    /// Rotate the main image a quarter turn clockwise and re-fit.
    /// Overlay positions are untouched; their scales are refreshed.
    pub fn rotate(&mut self) -> Result<(), EngineError> {
        let main = self.main.as_mut().ok_or(EngineError::NoImageLoaded)?;
        let rotation = (main.rotation_degrees + 90) % 360;
        let layout = geometry::fit(
            main.natural(),
            rotation,
            self.zoom_levels[self.zoom_index],
            self.viewport,
        )?;
        main.rotation_degrees = rotation;
        Self::apply_layout(main, &layout);
        self.canvas = Size::new(layout.canvas_width, layout.canvas_height);
        log::debug!("rotated to {rotation} degrees");
        self.refresh_overlay_scales();
        self.request_render();
        Ok(())
    }

    /// Set the zoom factor, clamped to the nearest permitted level.
    pub fn set_zoom(&mut self, factor: f64) -> Result<(), EngineError> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(EngineError::DegenerateInput(format!("zoom {factor}")));
        }
        let index = Self::nearest_level(&self.zoom_levels, factor);
        self.apply_zoom_index(index)
    }

    /// Step one zoom level up. Saturating: a no-op at the top level.
    pub fn zoom_in(&mut self) -> Result<(), EngineError> {
        let index = (self.zoom_index + 1).min(self.zoom_levels.len() - 1);
        self.apply_zoom_index(index)
    }

    /// Step one zoom level down. Saturating: a no-op at the bottom level.
    pub fn zoom_out(&mut self) -> Result<(), EngineError> {
        let index = self.zoom_index.saturating_sub(1);
        self.apply_zoom_index(index)
    }

    fn apply_zoom_index(&mut self, index: usize) -> Result<(), EngineError> {
        if index == self.zoom_index {
            return Ok(());
        }
        let previous = self.zoom_index;
        self.zoom_index = index;
        if let Err(e) = self.refit_main() {
            self.zoom_index = previous;
            return Err(e);
        }
        log::debug!("zoom set to {}", self.zoom());
        self.request_render();
        Ok(())
    }

    /// Forward a host resize. Rotation and zoom are preserved; the fit
    /// is recomputed against the new bounds.
    pub fn set_viewport(&mut self, viewport: Viewport) -> Result<(), EngineError> {
        let previous = self.viewport;
        self.viewport = viewport;
        if let Err(e) = self.refit_main() {
            self.viewport = previous;
            return Err(e);
        }
        if self.main.is_none() {
            self.canvas = Size::new(viewport.width, viewport.height);
        }
        self.request_render();
        Ok(())
    }

    fn refit_main(&mut self) -> Result<(), EngineError> {
        if let Some(main) = self.main.as_mut() {
            let layout = geometry::fit(
                main.natural(),
                main.rotation_degrees,
                self.zoom_levels[self.zoom_index],
                self.viewport,
            )?;
            Self::apply_layout(main, &layout);
            self.canvas = Size::new(layout.canvas_width, layout.canvas_height);
        }
        self.refresh_overlay_scales();
        Ok(())
    }

    /// Overlays co-scale with the main image (their positions persist).
    fn refresh_overlay_scales(&mut self) {
        let base = self.main.as_ref().map_or(1.0, |m| m.scale);
        for overlay in &mut self.overlays {
            overlay.scale = overlay.relative_scale * base;
        }
    }

    /// Append a draggable overlay at its spawn position.
    pub fn add_overlay(
        &mut self,
        pixels: Arc<RgbaImage>,
        spawn: OverlaySpawn,
    ) -> Result<Uuid, EngineError> {
        if !spawn.scale.is_finite() || spawn.scale <= 0.0 {
            return Err(EngineError::DegenerateInput(format!(
                "overlay scale {}",
                spawn.scale
            )));
        }
        let mut node = ImageNode::new(Arc::clone(&pixels), true);
        node.relative_scale = spawn.scale;
        node.scale = spawn.scale * self.main.as_ref().map_or(1.0, |m| m.scale);
        node.position = spawn.position;
        let id = node.id;
        self.overlay_sources.push((pixels, spawn));
        self.overlays.push(node);
        self.request_render();
        Ok(id)
    }

    /// Destroy all overlays and respawn them at their defaults. The
    /// main image's rotation and zoom are untouched. Any handle is
    /// destroyed with the nodes it could have pointed at.
    pub fn reset_overlays(&mut self) {
        self.handle = None;
        self.overlays.clear();
        let base = self.main.as_ref().map_or(1.0, |m| m.scale);
        for (pixels, spawn) in &self.overlay_sources {
            let mut node = ImageNode::new(Arc::clone(pixels), true);
            node.relative_scale = spawn.scale;
            node.scale = spawn.scale * base;
            node.position = spawn.position;
            self.overlays.push(node);
        }
        log::debug!("overlays reset to {} defaults", self.overlays.len());
        self.request_render();
    }

    /// Attach the transform handle to a draggable node, or detach it.
    ///
    /// Any prior handle is replaced, so at most one handle exists at any
    /// instant. Selecting a non-draggable or unknown node clears the
    /// selection.
    pub fn select(&mut self, target: Option<Uuid>) {
        let next = target
            .and_then(|id| self.node(id))
            .filter(|n| n.draggable)
            .map(|n| TransformHandle {
                node: n.id,
                padding: self.handle_padding,
            });
        self.handle = next;
        self.request_render();
    }

    /// Move a draggable node. Ignored for the main image.
    pub fn move_node(&mut self, id: Uuid, position: Point) {
        if let Some(node) = self.overlays.iter_mut().find(|n| n.id == id && n.draggable) {
            node.position = position;
            self.request_render();
        }
    }

    /// Resize a draggable node by its factor relative to the main
    /// image's scale. Ignored for the main image.
    pub fn resize_node(&mut self, id: Uuid, relative_scale: f64) -> Result<(), EngineError> {
        if !relative_scale.is_finite() || relative_scale <= 0.0 {
            return Err(EngineError::DegenerateInput(format!(
                "relative scale {relative_scale}"
            )));
        }
        let base = self.main.as_ref().map_or(1.0, |m| m.scale);
        if let Some(node) = self.overlays.iter_mut().find(|n| n.id == id && n.draggable) {
            node.relative_scale = relative_scale;
            node.scale = relative_scale * base;
            self.request_render();
        }
        Ok(())
    }

    /// Detach the transform handle without touching any node.
    pub fn detach_handle(&mut self) {
        if self.handle.take().is_some() {
            self.request_render();
        }
    }
}
