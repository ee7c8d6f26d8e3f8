//! Editor command surface
//!
//! The host-facing API: one `Editor` owns the scene, the decode worker,
//! and the configuration, and exposes the command set (load, rotate,
//! zoom, reset, select, export, resize). Commands addressed to the main
//! image are rejected while a replacement load is in flight, so they
//! can never apply to an image about to be discarded.

use crate::compositor::{self, ExportedImage};
use crate::error::EngineError;
use crate::interaction::{self, PointerOutcome};
use crate::loader::{ImageLoader, LoadToken};
use crate::scene::{OverlaySpawn, Scene, DEFAULT_HANDLE_PADDING, DEFAULT_ZOOM_LEVELS};
use crate::viewport::{Viewport, DEFAULT_PADDING_RATIO};
use image::RgbaImage;
use kurbo::Point;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Tunable presentation defaults
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Fraction of the host container the canvas may occupy
    pub padding_ratio: f64,
    /// Permitted zoom factors, strictly increasing
    pub zoom_levels: Vec<f64>,
    /// Where freshly added/reset overlays appear
    pub overlay_spawns: Vec<OverlaySpawn>,
    /// Transform handle padding in stage pixels
    pub handle_padding: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            padding_ratio: DEFAULT_PADDING_RATIO,
            zoom_levels: DEFAULT_ZOOM_LEVELS.to_vec(),
            overlay_spawns: OverlaySpawn::defaults(),
            handle_padding: DEFAULT_HANDLE_PADDING,
        }
    }
}

impl EditorConfig {
    /// Parse a host-supplied configuration snapshot.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        serde_json::from_str(json).map_err(|e| EngineError::DegenerateInput(e.to_string()))
    }
}

/// The engine's host-facing entry point
pub struct Editor {
    config: EditorConfig,
    scene: Scene,
    loader: ImageLoader,
}

impl Editor {
    /// Create an editor sized to the host container, with defaults.
    pub fn new(host_width: f64, host_height: f64) -> Result<Self, EngineError> {
        Self::with_config(host_width, host_height, EditorConfig::default())
    }

    /// Create an editor with explicit configuration.
    pub fn with_config(
        host_width: f64,
        host_height: f64,
        config: EditorConfig,
    ) -> Result<Self, EngineError> {
        let viewport = Viewport::from_host(host_width, host_height, config.padding_ratio)?;
        let scene = Scene::new(viewport, config.zoom_levels.clone(), config.handle_padding)?;
        Ok(Self {
            config,
            scene,
            loader: ImageLoader::new(),
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Begin loading a new main image from encoded bytes.
    ///
    /// Decoding happens off-thread; the outcome is observed through
    /// `poll_loads`. Starting another load before the first resolves
    /// supersedes it.
    pub fn load_main_image(&mut self, bytes: Vec<u8>) -> LoadToken {
        self.loader.begin(bytes)
    }

    /// Drain decode completions and apply the current one to the scene.
    ///
    /// Returns None while nothing has resolved. A decode failure leaves
    /// the scene exactly as it was; superseded completions are dropped
    /// without effect.
    pub fn poll_loads(&mut self) -> Option<(LoadToken, Result<(), EngineError>)> {
        let (token, result) = self.loader.poll()?;
        let applied = result.and_then(|pixels| self.scene.set_main_image(pixels));
        Some((token, applied))
    }

    /// Whether a main-image load is still in flight
    pub fn load_in_flight(&self) -> bool {
        self.loader.load_in_flight()
    }

    fn guard_load(&self) -> Result<(), EngineError> {
        if self.loader.load_in_flight() {
            return Err(EngineError::LoadInFlight);
        }
        Ok(())
    }

    /// Rotate the main image a quarter turn clockwise.
    pub fn rotate(&mut self) -> Result<(), EngineError> {
        self.guard_load()?;
        self.scene.rotate()
    }

    /// Set the zoom factor, clamped to the nearest permitted level.
    pub fn set_zoom(&mut self, factor: f64) -> Result<(), EngineError> {
        self.guard_load()?;
        self.scene.set_zoom(factor)
    }

    /// Step one zoom level up (saturating).
    pub fn zoom_in(&mut self) -> Result<(), EngineError> {
        self.guard_load()?;
        self.scene.zoom_in()
    }

    /// Step one zoom level down (saturating).
    pub fn zoom_out(&mut self) -> Result<(), EngineError> {
        self.guard_load()?;
        self.scene.zoom_out()
    }

    /// Destroy all overlays and respawn them at their defaults.
    pub fn reset_overlays(&mut self) -> Result<(), EngineError> {
        self.guard_load()?;
        self.scene.reset_overlays();
        Ok(())
    }

    /// Append a draggable overlay from already-decoded pixels.
    pub fn add_overlay(
        &mut self,
        pixels: Arc<RgbaImage>,
        spawn: OverlaySpawn,
    ) -> Result<Uuid, EngineError> {
        self.scene.add_overlay(pixels, spawn)
    }

    /// Append one overlay per image at the configured default spawns,
    /// cycling through the spawn list if more images are given.
    pub fn add_default_overlays(
        &mut self,
        images: impl IntoIterator<Item = Arc<RgbaImage>>,
    ) -> Result<Vec<Uuid>, EngineError> {
        if self.config.overlay_spawns.is_empty() {
            return Err(EngineError::DegenerateInput(
                "no overlay spawns configured".into(),
            ));
        }
        let spawns = self.config.overlay_spawns.clone();
        images
            .into_iter()
            .zip(spawns.iter().cycle())
            .map(|(pixels, spawn)| self.scene.add_overlay(pixels, *spawn))
            .collect()
    }

    /// Route a pointer-down (tap, click, drag-start) at a stage point.
    pub fn pointer_down(&mut self, point: Point) -> PointerOutcome {
        interaction::pointer_down(&mut self.scene, point)
    }

    /// Select a node directly (or clear with None).
    pub fn select(&mut self, target: Option<Uuid>) {
        self.scene.select(target);
    }

    /// Drag a draggable node to a new stage position.
    pub fn move_node(&mut self, id: Uuid, position: Point) {
        self.scene.move_node(id, position);
    }

    /// Resize a draggable node relative to the main image's scale.
    pub fn resize_node(&mut self, id: Uuid, relative_scale: f64) -> Result<(), EngineError> {
        self.scene.resize_node(id, relative_scale)
    }

    /// Forward a host container resize. Rotation and zoom survive.
    pub fn viewport_changed(
        &mut self,
        host_width: f64,
        host_height: f64,
    ) -> Result<(), EngineError> {
        let viewport = Viewport::from_host(host_width, host_height, self.config.padding_ratio)?;
        self.scene.set_viewport(viewport)
    }

    /// Rasterize the live scene for on-screen display.
    pub fn render(&self, pixel_ratio: f64) -> Result<RgbaImage, EngineError> {
        compositor::render(&self.scene, pixel_ratio)
    }

    /// Composite and encode the scene at natural resolution.
    pub fn export(&mut self) -> Result<ExportedImage, EngineError> {
        self.guard_load()?;
        compositor::export(&mut self.scene)
    }

    /// Whether any operation since the last take requested a repaint
    pub fn take_render_request(&mut self) -> bool {
        self.scene.take_render_request()
    }
}
