use googlify_core::editor::{Editor, EditorConfig};
use googlify_core::error::EngineError;
use googlify_core::interaction::PointerOutcome;
use googlify_core::loader::LoadToken;
use googlify_core::scene::OverlaySpawn;
use image::{Rgba, RgbaImage};
use kurbo::Point;
use std::io::Cursor;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn png_bytes(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    let img = RgbaImage::from_pixel(width, height, color);
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
        .unwrap();
    bytes
}

fn wait_for_load(editor: &mut Editor) -> (LoadToken, Result<(), EngineError>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(outcome) = editor.poll_loads() {
            return outcome;
        }
        assert!(Instant::now() < deadline, "load never resolved");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_full_editing_session() {
    // Host window 1000x750 with the default 0.8 padding gives an
    // 800x600 viewport.
    let mut editor = Editor::new(1000.0, 750.0).unwrap();

    // Load a 1200x800 photo and wait for the decode to land.
    let token = editor.load_main_image(png_bytes(1200, 800, Rgba([200, 180, 160, 255])));
    let (resolved, result) = wait_for_load(&mut editor);
    assert_eq!(resolved, token);
    result.unwrap();
    assert!(editor.take_render_request());

    let main = editor.scene().main().unwrap();
    assert!((main.scale - 2.0 / 3.0).abs() < 1e-9);

    // Drop in the two default eyes.
    let eye = Arc::new(RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255])));
    let ids = editor
        .add_default_overlays([Arc::clone(&eye), Arc::clone(&eye)])
        .unwrap();

    // Tap the first eye: it takes the transform handle.
    let outcome = editor.pointer_down(Point::new(50.0, 50.0));
    assert_eq!(outcome, PointerOutcome::Selected(ids[0]));

    // Drag it somewhere, rotate, zoom in; overlay position persists,
    // scale follows the main image.
    editor.move_node(ids[0], Point::new(300.0, 200.0));
    editor.rotate().unwrap();
    editor.zoom_in().unwrap();
    let overlay = editor.scene().node(ids[0]).unwrap();
    assert_eq!(overlay.position, Point::new(300.0, 200.0));
    let main_scale = editor.scene().main_scale().unwrap();
    assert!((overlay.scale - 0.4 * main_scale).abs() < 1e-9);

    // Export: natural resolution regardless of display scale, handle
    // stripped, rotated footprint swaps the axes.
    let exported = editor.export().unwrap();
    assert_eq!((exported.width, exported.height), (800, 1200));
    assert!(editor.scene().handle().is_none());
    assert!(exported.suggested_filename.ends_with(".png"));
    let decoded = image::load_from_memory(&exported.png_bytes).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (800, 1200));

    // Reset the eyes: back to their documented defaults, drag discarded.
    editor.reset_overlays().unwrap();
    let overlays = editor.scene().overlays();
    assert_eq!(overlays.len(), 2);
    assert_eq!(overlays[0].position, Point::new(50.0, 50.0));
    assert_eq!(overlays[1].position, Point::new(200.0, 50.0));
}

#[test]
fn test_rapid_reload_applies_only_second_image() {
    let mut editor = Editor::new(1000.0, 750.0).unwrap();

    let _first = editor.load_main_image(png_bytes(640, 480, Rgba([255, 0, 0, 255])));
    let second = editor.load_main_image(png_bytes(1200, 800, Rgba([0, 255, 0, 255])));

    let (resolved, result) = wait_for_load(&mut editor);
    assert_eq!(resolved, second);
    result.unwrap();

    let natural = editor.scene().main().unwrap().natural();
    assert_eq!((natural.width, natural.height), (1200.0, 800.0));

    // The first load's late completion must never surface.
    let deadline = Instant::now() + Duration::from_millis(200);
    while Instant::now() < deadline {
        assert!(editor.poll_loads().is_none());
        std::thread::sleep(Duration::from_millis(5));
    }
    let natural = editor.scene().main().unwrap().natural();
    assert_eq!((natural.width, natural.height), (1200.0, 800.0));
}

#[test]
fn test_failed_load_leaves_scene_untouched() {
    let mut editor = Editor::new(1000.0, 750.0).unwrap();
    editor.load_main_image(png_bytes(640, 480, Rgba([255, 0, 0, 255])));
    let (_, result) = wait_for_load(&mut editor);
    result.unwrap();

    let before = editor.scene().main().unwrap().id;
    editor.load_main_image(b"not an image".to_vec());
    let (_, result) = wait_for_load(&mut editor);
    assert!(matches!(result, Err(EngineError::ImageLoad(_))));
    assert_eq!(editor.scene().main().unwrap().id, before);
}

#[test]
fn test_mutations_during_pending_load_are_rejected() {
    let mut editor = Editor::new(1000.0, 750.0).unwrap();
    editor.load_main_image(png_bytes(640, 480, Rgba([255, 0, 0, 255])));
    let (_, result) = wait_for_load(&mut editor);
    result.unwrap();

    // Start a replacement load; the old image may not be mutated while
    // it is pending.
    editor.load_main_image(png_bytes(1200, 800, Rgba([0, 255, 0, 255])));
    assert!(matches!(editor.rotate(), Err(EngineError::LoadInFlight)));
    assert!(matches!(editor.set_zoom(2.0), Err(EngineError::LoadInFlight)));

    let (_, result) = wait_for_load(&mut editor);
    result.unwrap();
    editor.rotate().unwrap();
    assert_eq!(editor.scene().main().unwrap().rotation_degrees, 90);
}

#[test]
fn test_resize_handle_flow() {
    let mut editor = Editor::new(1000.0, 750.0).unwrap();
    editor.load_main_image(png_bytes(800, 600, Rgba([10, 10, 10, 255])));
    let (_, result) = wait_for_load(&mut editor);
    result.unwrap();

    let eye = Arc::new(RgbaImage::from_pixel(64, 64, Rgba([255, 255, 255, 255])));
    let id = editor
        .add_overlay(
            eye,
            OverlaySpawn {
                position: Point::new(100.0, 100.0),
                scale: 0.4,
            },
        )
        .unwrap();

    editor.select(Some(id));
    editor.resize_node(id, 0.8).unwrap();
    let main_scale = editor.scene().main_scale().unwrap();
    let overlay = editor.scene().node(id).unwrap();
    assert!((overlay.scale - 0.8 * main_scale).abs() < 1e-9);

    // Viewport shrink refits while keeping the user's relative size.
    editor.viewport_changed(500.0, 375.0).unwrap();
    let main_scale = editor.scene().main_scale().unwrap();
    let overlay = editor.scene().node(id).unwrap();
    assert!((overlay.scale - 0.8 * main_scale).abs() < 1e-9);
}

#[test]
fn test_custom_configuration() {
    let config = EditorConfig {
        padding_ratio: 0.5,
        zoom_levels: vec![0.5, 1.0, 2.0],
        overlay_spawns: vec![OverlaySpawn {
            position: Point::new(10.0, 10.0),
            scale: 0.25,
        }],
        handle_padding: 8.0,
    };
    let mut editor = Editor::with_config(800.0, 800.0, config).unwrap();
    assert_eq!(editor.scene().viewport().width, 400.0);

    editor.zoom_in().unwrap();
    assert_eq!(editor.scene().zoom(), 2.0);
    editor.zoom_in().unwrap();
    assert_eq!(editor.scene().zoom(), 2.0);

    let eye = Arc::new(RgbaImage::new(16, 16));
    let ids = editor.add_default_overlays([eye]).unwrap();
    assert_eq!(editor.scene().node(ids[0]).unwrap().position, Point::new(10.0, 10.0));

    editor.select(Some(ids[0]));
    assert_eq!(editor.scene().handle().unwrap().padding, 8.0);
}
