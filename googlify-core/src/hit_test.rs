//! Hit testing for selection
//!
//! Tests stage-space points against scene nodes, topmost first. The
//! point is mapped into node-local space through the inverse of the
//! node's affine and tested against the natural-size rectangle.

use crate::node::ImageNode;
use crate::scene::Scene;
use kurbo::{Point, Rect};
use uuid::Uuid;

/// Hit test a single node with a stage-space point.
pub fn hit_test_node(node: &ImageNode, point: Point) -> bool {
    let local = node.to_affine().inverse() * point;
    let natural = node.natural();
    Rect::new(0.0, 0.0, natural.width, natural.height).contains(local)
}

/// Hit test the whole scene, front to back.
///
/// Returns the topmost node under the point, or None when the point is
/// over the empty stage.
pub fn hit_test_scene(scene: &Scene, point: Point) -> Option<Uuid> {
    scene
        .nodes_front_to_back()
        .find(|node| hit_test_node(node, point))
        .map(|node| node.id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{OverlaySpawn, Scene, DEFAULT_HANDLE_PADDING, DEFAULT_ZOOM_LEVELS};
    use crate::viewport::Viewport;
    use image::RgbaImage;
    use std::sync::Arc;

    fn pixels(width: u32, height: u32) -> Arc<RgbaImage> {
        Arc::new(RgbaImage::new(width, height))
    }

    fn scene_with_main() -> Scene {
        let mut scene = Scene::new(
            Viewport {
                width: 800.0,
                height: 600.0,
            },
            DEFAULT_ZOOM_LEVELS.to_vec(),
            DEFAULT_HANDLE_PADDING,
        )
        .unwrap();
        scene.set_main_image(pixels(800, 600)).unwrap();
        scene
    }

    #[test]
    fn test_hit_main_image_center() {
        let scene = scene_with_main();
        let main_id = scene.main().unwrap().id;
        assert_eq!(
            hit_test_scene(&scene, Point::new(400.0, 300.0)),
            Some(main_id)
        );
    }

    #[test]
    fn test_miss_outside_canvas() {
        let scene = scene_with_main();
        assert_eq!(hit_test_scene(&scene, Point::new(-10.0, -10.0)), None);
        assert_eq!(hit_test_scene(&scene, Point::new(2000.0, 300.0)), None);
    }

    #[test]
    fn test_topmost_overlay_wins() {
        let mut scene = scene_with_main();
        let spawn = OverlaySpawn {
            position: Point::new(400.0, 300.0),
            scale: 1.0,
        };
        let below = scene.add_overlay(pixels(100, 100), spawn).unwrap();
        let above = scene.add_overlay(pixels(100, 100), spawn).unwrap();
        let _ = below;
        assert_eq!(
            hit_test_scene(&scene, Point::new(400.0, 300.0)),
            Some(above)
        );
    }

    #[test]
    fn test_hit_respects_node_transform() {
        let mut scene = scene_with_main();
        let spawn = OverlaySpawn {
            position: Point::new(100.0, 100.0),
            scale: 0.5,
        };
        let id = scene.add_overlay(pixels(100, 100), spawn).unwrap();
        // At scale 0.5 the overlay spans 50 stage pixels around (100, 100).
        assert_eq!(hit_test_scene(&scene, Point::new(110.0, 110.0)), Some(id));
        let main_id = scene.main().unwrap().id;
        assert_eq!(
            hit_test_scene(&scene, Point::new(160.0, 100.0)),
            Some(main_id)
        );
    }
}
