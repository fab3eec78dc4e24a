use std::{
    path::Path,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use arboard::Clipboard;
use image::{ImageFormat, RgbaImage};

use crate::error::SnipError;

/// How long the copy button stays highlighted after a successful copy.
const CONFIRMATION_DURATION: Duration = Duration::from_secs(1);

/// Emitted by [`copy_text`] when the text reached the clipboard.
#[derive(Debug, Clone, Copy)]
pub struct CopyConfirmation {
    copied_at: Instant,
}

impl CopyConfirmation {
    /// Whether the confirmation should still be shown to the user.
    pub fn is_fresh(&self) -> bool {
        self.copied_at.elapsed() < CONFIRMATION_DURATION
    }
}

/// Put `text` on the system clipboard.
pub fn copy_text(text: &str) -> Result<CopyConfirmation> {
    let mut clipboard = Clipboard::new().context("Could not access the system clipboard")?;
    clipboard
        .set_text(text.to_owned())
        .context("Could not write text to the system clipboard")?;

    log::debug!("Copied {} bytes of text to the clipboard", text.len());
    Ok(CopyConfirmation {
        copied_at: Instant::now(),
    })
}

/// Read an image from the system clipboard, failing if there is none.
pub fn read_image() -> Result<RgbaImage, SnipError> {
    find_image()?.ok_or_else(|| {
        log::info!("Clipboard contains no image");
        SnipError::ImageDecodeFailed
    })
}

/// Look for an image on the system clipboard.
///
/// Falls back to clipboard text naming an image file, which is what most file managers put on
/// the clipboard when a file is copied. `None` if the clipboard holds neither; an error only if
/// there is image data which cannot be decoded.
pub fn find_image() -> Result<Option<RgbaImage>, SnipError> {
    let mut clipboard = match Clipboard::new() {
        Ok(clipboard) => clipboard,
        Err(e) => {
            log::warn!("Could not access the system clipboard: {e}");
            return Ok(None);
        }
    };

    match clipboard.get_image() {
        Ok(data) => {
            let (width, height) = (data.width as u32, data.height as u32);
            return RgbaImage::from_raw(width, height, data.bytes.into_owned())
                .map(Some)
                .ok_or_else(|| {
                    log::warn!("Clipboard image data does not match its size ({width}x{height})");
                    SnipError::ImageDecodeFailed
                });
        }
        Err(e) => log::debug!("No raw image on the clipboard: {e}"),
    }

    match clipboard.get_text() {
        Ok(text) => open_image_path(Path::new(text.trim())),
        Err(e) => {
            log::debug!("No text on the clipboard: {e}");
            Ok(None)
        }
    }
}

/// Open `path` if it names an image file. Files without an image extension are not images.
fn open_image_path(path: &Path) -> Result<Option<RgbaImage>, SnipError> {
    if !path.is_file() || ImageFormat::from_path(path).is_err() {
        log::debug!("Clipboard text is not an image file path");
        return Ok(None);
    }

    image::open(path)
        .map(|image| Some(image.to_rgba8()))
        .map_err(|e| {
            log::warn!("Could not decode `{}` from the clipboard: {e}", path.display());
            SnipError::ImageDecodeFailed
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_expires() {
        let fresh = CopyConfirmation {
            copied_at: Instant::now(),
        };
        assert!(fresh.is_fresh());

        if let Some(copied_at) = Instant::now().checked_sub(CONFIRMATION_DURATION * 2) {
            assert!(!CopyConfirmation { copied_at }.is_fresh());
        }
    }

    #[test]
    fn text_is_not_an_image_path() {
        assert_eq!(open_image_path(Path::new("Hello World")), Ok(None));

        let dir = std::env::temp_dir().join(format!("ocrsnip-clipboard-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let notes = dir.join("notes.txt");
        std::fs::write(&notes, "not an image").unwrap();
        assert_eq!(open_image_path(&notes), Ok(None));

        let broken = dir.join("broken.png");
        std::fs::write(&broken, "not a png either").unwrap();
        assert_eq!(
            open_image_path(&broken),
            Err(SnipError::ImageDecodeFailed)
        );

        let picture = dir.join("picture.png");
        RgbaImage::new(3, 2).save(&picture).unwrap();
        let opened = open_image_path(&picture).unwrap().unwrap();
        assert_eq!(opened.dimensions(), (3, 2));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
