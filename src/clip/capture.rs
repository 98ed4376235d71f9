use crate::clip::display::Display;
use crate::clip::screenshot::{encode_image, Screenshot, ShotFormat};
use anyhow::{Context, Result};
use screenshots::Screen;

/// Where displays and their frozen frames come from. The OS-backed
/// implementation is [`SystemScreenSource`]; tests substitute their own.
pub trait ScreenSource {
    fn displays(&self) -> Result<Vec<Display>>;
    fn capture(&self, format: ShotFormat) -> Result<Vec<Screenshot>>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemScreenSource;

impl SystemScreenSource {
    fn screens() -> Result<Vec<Screen>> {
        Screen::all().context("enumerate attached screens")
    }
}

impl ScreenSource for SystemScreenSource {
    fn displays(&self) -> Result<Vec<Display>> {
        let displays = Self::screens()?
            .iter()
            .map(|screen| display_of(&screen.display_info))
            .collect();
        Ok(displays)
    }

    fn capture(&self, format: ShotFormat) -> Result<Vec<Screenshot>> {
        let screens = Self::screens()?;
        let mut shots = Vec::with_capacity(screens.len());

        for screen in screens {
            let info = screen.display_info;
            let img = screen
                .capture()
                .with_context(|| format!("capture screen {}", info.id))?;
            tracing::debug!(
                id = info.id,
                width = info.width,
                height = info.height,
                "captured screen frame"
            );
            shots.push(Screenshot {
                id: info.id,
                name: format!("display-{}", info.id),
                x: info.x,
                y: info.y,
                width: info.width,
                height: info.height,
                image_data: encode_image(&img, format)?,
                format,
                scale_factor: info.scale_factor,
            });
        }
        Ok(shots)
    }
}

fn display_of(info: &screenshots::display_info::DisplayInfo) -> Display {
    Display {
        id: info.id,
        name: format!("display-{}", info.id),
        x: info.x,
        y: info.y,
        width: info.width,
        height: info.height,
        scale_factor: info.scale_factor,
    }
}
