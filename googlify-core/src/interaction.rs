//! Interaction controller
//!
//! Translates pointer input into selection changes. Tap, click, and
//! drag-start all route through the same handler, as the reference
//! stage behavior does: background clears the selection, a draggable
//! node takes the handle, a non-draggable node clears without attaching.

use crate::hit_test;
use crate::scene::Scene;
use kurbo::Point;
use uuid::Uuid;

/// What a pointer-down resolved to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerOutcome {
    /// The empty stage was hit; selection cleared
    Background,
    /// A draggable node was hit and now holds the handle
    Selected(Uuid),
    /// A non-draggable node was hit; selection cleared
    Cleared(Uuid),
}

/// Handle a pointer-down (tap, click, or drag-start) at a stage point.
///
/// Re-entrant by construction: the scene's `select` replaces any prior
/// handle and validates the target against live nodes, so rapid
/// alternating taps can never leave two handles attached or a handle on
/// a destroyed node.
pub fn pointer_down(scene: &mut Scene, point: Point) -> PointerOutcome {
    match hit_test::hit_test_scene(scene, point) {
        None => {
            scene.select(None);
            PointerOutcome::Background
        }
        Some(id) => {
            let draggable = scene.node(id).map_or(false, |n| n.draggable);
            if draggable {
                scene.select(Some(id));
                PointerOutcome::Selected(id)
            } else {
                scene.select(None);
                PointerOutcome::Cleared(id)
            }
        }
    }
}
