use anyhow::{Context, Result};
use image::RgbaImage;
use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Destination of a committed clip. The OS-backed implementation is
/// [`FileClipboardSink`]; tests substitute a recording sink.
pub trait OutputSink {
    fn save_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()>;
    fn write_clipboard_image(&self, img: &RgbaImage) -> Result<()>;
}

/// Exports are always PNG regardless of the capture format.
pub fn encode_png(img: &RgbaImage) -> Result<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageOutputFormat::Png)
        .context("encode clip as png")?;
    Ok(buf.into_inner())
}

pub fn timestamped_stem() -> String {
    format!("clip_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"))
}

pub fn default_output_path(dir: &Path) -> PathBuf {
    dir.join(format!("{}.png", timestamped_stem()))
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FileClipboardSink;

impl OutputSink for FileClipboardSink {
    fn save_bytes(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output directory {}", parent.display()))?;
            }
        }
        std::fs::write(path, bytes).with_context(|| format!("write clip to {}", path.display()))?;
        tracing::info!(path = %path.display(), size = bytes.len(), "clip saved");
        Ok(())
    }

    fn write_clipboard_image(&self, img: &RgbaImage) -> Result<()> {
        let mut clipboard = arboard::Clipboard::new().context("open system clipboard")?;
        clipboard
            .set_image(arboard::ImageData {
                width: img.width() as usize,
                height: img.height() as usize,
                bytes: Cow::Owned(img.clone().into_raw()),
            })
            .context("place clip image on clipboard")?;
        tracing::info!(width = img.width(), height = img.height(), "clip copied to clipboard");
        Ok(())
    }
}
