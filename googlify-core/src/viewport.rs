//! Viewport computation
//!
//! The viewport is the drawing area available to the scene, derived from
//! the host container size and a fixed padding ratio. It carries no
//! state of its own and is recomputed whenever the host resizes.

use crate::error::EngineError;
use serde::{Deserialize, Serialize};

/// Fraction of the host container the canvas may occupy
pub const DEFAULT_PADDING_RATIO: f64 = 0.8;

/// Available drawing area in host pixels
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Derive a viewport from the host container size and a padding ratio.
    ///
    /// Fails with `DegenerateInput` on zero, negative, or non-finite
    /// dimensions so downstream fit math can never produce NaN.
    pub fn from_host(
        host_width: f64,
        host_height: f64,
        padding_ratio: f64,
    ) -> Result<Self, EngineError> {
        if !host_width.is_finite() || !host_height.is_finite() || host_width <= 0.0 || host_height <= 0.0 {
            return Err(EngineError::DegenerateInput(format!(
                "host size {host_width}x{host_height}"
            )));
        }
        if !padding_ratio.is_finite() || padding_ratio <= 0.0 {
            return Err(EngineError::DegenerateInput(format!(
                "padding ratio {padding_ratio}"
            )));
        }
        Ok(Self {
            width: host_width * padding_ratio,
            height: host_height * padding_ratio,
        })
    }
}
