//! CPU compositor and exporter
//!
//! Renders the scene to an RGBA pixel buffer by inverse-mapping each
//! destination pixel through the node's affine and sampling the source
//! bilinearly, blending nodes in paint order with source-over. Export
//! renders at `1 / main scale` so the output is always at the image's
//! natural resolution, however far the on-screen canvas was scaled.

use crate::error::EngineError;
use crate::node::ImageNode;
use crate::scene::Scene;
use image::{Rgba, RgbaImage};
use kurbo::{Affine, Point, Rect};
use std::io::Cursor;

/// A composited scene ready for download
#[derive(Clone, Debug)]
pub struct ExportedImage {
    /// PNG-encoded pixels
    pub png_bytes: Vec<u8>,
    /// Output buffer width in pixels
    pub width: u32,
    /// Output buffer height in pixels
    pub height: u32,
    /// Filename the host should offer for the download
    pub suggested_filename: String,
}

/// Rasterize the scene at the given pixel ratio.
///
/// A ratio of 1 renders at stage resolution; export uses the inverse of
/// the main image's scale.
pub fn render(scene: &Scene, pixel_ratio: f64) -> Result<RgbaImage, EngineError> {
    if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
        return Err(EngineError::DegenerateInput(format!(
            "pixel ratio {pixel_ratio}"
        )));
    }
    let canvas = scene.canvas_size();
    let width = (canvas.width * pixel_ratio).round().max(1.0) as u32;
    let height = (canvas.height * pixel_ratio).round().max(1.0) as u32;
    let mut frame = RgbaImage::new(width, height);
    for node in scene.nodes_back_to_front() {
        draw_node(&mut frame, node, pixel_ratio);
    }
    Ok(frame)
}

/// Render the scene at natural resolution and encode it as PNG.
///
/// The transform handle never appears in exported output, so any
/// attached handle is detached first (which also queues the final
/// on-screen repaint for the host).
pub fn export(scene: &mut Scene) -> Result<ExportedImage, EngineError> {
    let scale = scene.main_scale().ok_or(EngineError::NoImageLoaded)?;
    scene.detach_handle();

    let pixel_ratio = 1.0 / scale;
    let frame = render(scene, pixel_ratio)?;
    let (width, height) = (frame.width(), frame.height());

    let mut png_bytes = Vec::new();
    image::DynamicImage::ImageRgba8(frame)
        .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
        .map_err(|e| EngineError::Export(e.to_string()))?;

    let suggested_filename = format!(
        "googlify-{}.png",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    );
    log::info!("exported {width}x{height} at pixel ratio {pixel_ratio:.4}");
    Ok(ExportedImage {
        png_bytes,
        width,
        height,
        suggested_filename,
    })
}

/// Draw one node into the frame.
fn draw_node(frame: &mut RgbaImage, node: &ImageNode, pixel_ratio: f64) {
    let natural = node.natural();
    if natural.width <= 0.0 || natural.height <= 0.0 {
        return;
    }
    let affine = Affine::scale(pixel_ratio) * node.to_affine();
    let inverse = affine.inverse();

    // Only visit destination pixels the node can reach.
    let bbox = affine.transform_rect_bbox(Rect::new(0.0, 0.0, natural.width, natural.height));
    let x_min = bbox.x0.floor().max(0.0) as u32;
    let y_min = bbox.y0.floor().max(0.0) as u32;
    let x_max = (bbox.x1.ceil().min(f64::from(frame.width()))).max(0.0) as u32;
    let y_max = (bbox.y1.ceil().min(f64::from(frame.height()))).max(0.0) as u32;

    let src = node.pixels();
    for y in y_min..y_max {
        for x in x_min..x_max {
            let local = inverse * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if local.x < 0.0
                || local.y < 0.0
                || local.x >= natural.width
                || local.y >= natural.height
            {
                continue;
            }
            // Pixel centers sit at integer + 0.5 in local space.
            let sample = bilinear_sample(src, local.x - 0.5, local.y - 0.5);
            if sample[3] == 0 {
                continue;
            }
            let dst = frame.get_pixel_mut(x, y);
            *dst = blend_over(sample, *dst);
        }
    }
}

/// Bilinear interpolation against a transparent border.
fn bilinear_sample(img: &RgbaImage, x: f64, y: f64) -> Rgba<u8> {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f64;
    let fy = y - y0 as f64;

    let sample = |sx: i64, sy: i64| -> [f64; 4] {
        if sx < 0 || sy < 0 || sx >= i64::from(img.width()) || sy >= i64::from(img.height()) {
            [0.0; 4]
        } else {
            let p = img.get_pixel(sx as u32, sy as u32);
            [
                f64::from(p[0]),
                f64::from(p[1]),
                f64::from(p[2]),
                f64::from(p[3]),
            ]
        }
    };

    let tl = sample(x0, y0);
    let tr = sample(x0 + 1, y0);
    let bl = sample(x0, y0 + 1);
    let br = sample(x0 + 1, y0 + 1);

    let lerp = |a: f64, b: f64, t: f64| a + (b - a) * t;
    let mut out = [0u8; 4];
    for (c, slot) in out.iter_mut().enumerate() {
        let top = lerp(tl[c], tr[c], fx);
        let bot = lerp(bl[c], br[c], fx);
        *slot = lerp(top, bot, fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgba(out)
}

/// Source-over blend of non-premultiplied RGBA.
fn blend_over(src: Rgba<u8>, dst: Rgba<u8>) -> Rgba<u8> {
    let sa = f64::from(src[3]) / 255.0;
    let da = f64::from(dst[3]) / 255.0;
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return Rgba([0, 0, 0, 0]);
    }
    let mut out = [0u8; 4];
    for c in 0..3 {
        let s = f64::from(src[c]);
        let d = f64::from(dst[c]);
        let blended = (s * sa + d * da * (1.0 - sa)) / out_a;
        out[c] = blended.round().clamp(0.0, 255.0) as u8;
    }
    out[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgba(out)
}
