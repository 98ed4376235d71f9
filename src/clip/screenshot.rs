use crate::clip::display::Display;
use anyhow::{Context, Result};
use base64::{engine::general_purpose, Engine};
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShotFormat {
    Jpeg,
    Png,
}

/// One frozen frame per display, captured at session start.
///
/// `x`, `y`, `width` and `height` are global-space geometry; `image_data`
/// is the base64-encoded payload in `format`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Screenshot {
    pub id: u32,
    pub name: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub image_data: String,
    pub format: ShotFormat,
    pub scale_factor: f32,
}

impl Screenshot {
    /// Project the geometry fields into a `Display`-shaped record so the
    /// coordinate transforms can run over screenshots during composition.
    pub fn to_display(&self) -> Display {
        Display {
            id: self.id,
            name: self.name.clone(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
            scale_factor: self.scale_factor,
        }
    }

    pub fn decode(&self) -> Result<RgbaImage> {
        let bytes = general_purpose::STANDARD
            .decode(&self.image_data)
            .with_context(|| format!("decode base64 payload of screenshot {}", self.id))?;
        let format = match self.format {
            ShotFormat::Jpeg => image::ImageFormat::Jpeg,
            ShotFormat::Png => image::ImageFormat::Png,
        };
        let img = image::load_from_memory_with_format(&bytes, format)
            .with_context(|| format!("decode {:?} image of screenshot {}", self.format, self.id))?;
        Ok(img.to_rgba8())
    }
}

/// Encode a captured frame as the base64 payload carried by [`Screenshot`].
/// JPEG has no alpha channel, so RGBA input is flattened first.
pub fn encode_image(img: &RgbaImage, format: ShotFormat) -> Result<String> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        ShotFormat::Jpeg => {
            let rgb = image::DynamicImage::ImageRgba8(img.clone()).to_rgb8();
            rgb.write_to(&mut buf, image::ImageOutputFormat::Jpeg(90))
                .context("encode screenshot as jpeg")?;
        }
        ShotFormat::Png => {
            img.write_to(&mut buf, image::ImageOutputFormat::Png)
                .context("encode screenshot as png")?;
        }
    }
    Ok(general_purpose::STANDARD.encode(buf.into_inner()))
}

#[cfg(test)]
pub(crate) fn test_screenshot(id: u32, x: i32, y: i32, width: u32, height: u32) -> Screenshot {
    use image::Rgba;

    let img = RgbaImage::from_pixel(width, height, Rgba([id as u8 * 40, 0, 0, 255]));
    Screenshot {
        id,
        name: format!("display-{id}"),
        x,
        y,
        width,
        height,
        image_data: encode_image(&img, ShotFormat::Png).expect("png encode"),
        format: ShotFormat::Png,
        scale_factor: 1.0,
    }
}
