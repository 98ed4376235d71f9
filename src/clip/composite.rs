use crate::clip::display::DisplayRegistry;
use crate::clip::geometry::{detect_area, Area2D, Point};
use crate::clip::model::{Color, DrawnAnnotation, ToolKind};
use crate::clip::screenshot::Screenshot;
use anyhow::{anyhow, bail, Result};
use image::{imageops, Rgba, RgbaImage};

/// Stitch the per-display screenshots into one desktop canvas, replay the
/// annotation log on top, and crop to the selection.
///
/// `clip_area` is in scaled-normalized space, the same space the canvas is
/// allocated in. The function is pure: composing the same inputs twice
/// yields byte-identical output.
pub fn compose(
    screenshots: &[Screenshot],
    clip_area: Area2D,
    annotations: &[DrawnAnnotation],
    scale_factor: f32,
) -> Result<RgbaImage> {
    let displays = screenshots.iter().map(Screenshot::to_display).collect();
    let registry = DisplayRegistry::new(displays);
    let bounds = registry
        .bounds()
        .ok_or_else(|| anyhow!("cannot compose without screenshots"))?;

    let canvas_w = scale_len(bounds.width, scale_factor);
    let canvas_h = scale_len(bounds.height, scale_factor);
    let mut canvas = RgbaImage::new(canvas_w, canvas_h);

    for shot in screenshots {
        let mut img = shot.decode()?;
        let expected = (scale_len(shot.width, scale_factor), scale_len(shot.height, scale_factor));
        if img.dimensions() != expected {
            img = imageops::resize(&img, expected.0, expected.1, imageops::FilterType::Triangle);
        }

        let origin = registry
            .global_to_normalized(Point::new(shot.x, shot.y))
            .ok_or_else(|| anyhow!("screenshot {} outside desktop bounds", shot.id))?
            .scaled(scale_factor);
        imageops::replace(&mut canvas, &img, origin.x as i64, origin.y as i64);
    }

    // Log order is layer order.
    for annotation in annotations {
        replay_annotation(&mut canvas, &registry, annotation, scale_factor);
    }

    crop(&canvas, clip_area)
}

fn replay_annotation(
    canvas: &mut RgbaImage,
    registry: &DisplayRegistry,
    annotation: &DrawnAnnotation,
    scale_factor: f32,
) {
    let data = annotation.data;
    let (Some(start), Some(end)) = (data.start_point, data.end_point) else {
        tracing::debug!(tool = ?annotation.tool, "annotation without both endpoints, skipping");
        return;
    };
    let (Some(start), Some(end)) = (
        registry.global_to_normalized(start),
        registry.global_to_normalized(end),
    ) else {
        return;
    };
    let start = start.scaled(scale_factor);
    let end = end.scaled(scale_factor);

    let thickness = ((data.line_width as f32 * scale_factor).round() as i32).max(1);
    let color = to_pixel(data.stroke);

    match annotation.tool {
        ToolKind::Line => draw_segment(canvas, start, end, thickness, color),
        ToolKind::Rect => {
            let Some(area) = detect_area(Some(start), Some(end)) else {
                tracing::debug!("degenerate rect annotation, skipping");
                return;
            };
            // Four edge bars of stroke thickness; corners are inclusive and
            // the interior stays untouched.
            fill_rect(canvas, area.x, area.y, area.width + 1, thickness, color);
            fill_rect(
                canvas,
                area.x,
                area.y + area.height - thickness + 1,
                area.width + 1,
                thickness,
                color,
            );
            fill_rect(canvas, area.x, area.y, thickness, area.height + 1, color);
            fill_rect(
                canvas,
                area.x + area.width - thickness + 1,
                area.y,
                thickness,
                area.height + 1,
                color,
            );
        }
    }
}

/// Stamp a thickness-wide square along every integer sample of the segment.
fn draw_segment(canvas: &mut RgbaImage, a: Point, b: Point, thickness: i32, color: Rgba<u8>) {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let steps = dx.abs().max(dy.abs());
    let half = thickness / 2;

    for step in 0..=steps {
        let t = if steps == 0 { 0.0 } else { step as f32 / steps as f32 };
        let x = a.x + (dx as f32 * t).round() as i32;
        let y = a.y + (dy as f32 * t).round() as i32;
        fill_rect(canvas, x - half, y - half, thickness, thickness, color);
    }
}

/// Clamped axis-aligned fill; regions outside the canvas are dropped.
fn fill_rect(canvas: &mut RgbaImage, x: i32, y: i32, width: i32, height: i32, color: Rgba<u8>) {
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    let x0 = x.max(0);
    let y0 = y.max(0);
    let x1 = (x + width).min(cw);
    let y1 = (y + height).min(ch);

    for py in y0..y1 {
        for px in x0..x1 {
            canvas.put_pixel(px as u32, py as u32, color);
        }
    }
}

fn crop(canvas: &RgbaImage, area: Area2D) -> Result<RgbaImage> {
    let (cw, ch) = (canvas.width() as i32, canvas.height() as i32);
    let x0 = area.x.clamp(0, cw);
    let y0 = area.y.clamp(0, ch);
    let x1 = (area.x + area.width).clamp(0, cw);
    let y1 = (area.y + area.height).clamp(0, ch);
    if x1 <= x0 || y1 <= y0 {
        bail!("clip area {area:?} lies outside the composed canvas");
    }

    Ok(imageops::crop_imm(canvas, x0 as u32, y0 as u32, (x1 - x0) as u32, (y1 - y0) as u32)
        .to_image())
}

fn scale_len(len: u32, scale_factor: f32) -> u32 {
    (len as f32 * scale_factor).round() as u32
}

fn to_pixel(color: Color) -> Rgba<u8> {
    Rgba([color.r, color.g, color.b, color.a])
}
