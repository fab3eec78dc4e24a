use std::{path::PathBuf, sync::Arc};

use image::RgbaImage;

use crate::{clipboard, error::SnipError, services::ServiceJob};

pub type SourceJob = ServiceJob<Result<SourceImage, SnipError>>;
/// `None` when the clipboard held no image.
pub type PasteJob = ServiceJob<Result<Option<SourceImage>, SnipError>>;

/// Where the current image came from.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ImageSource {
    #[default]
    Capture,
    Paste,
    Upload,
}

impl ImageSource {
    /// Heading shown above the image.
    pub fn title(&self) -> &'static str {
        match self {
            Self::Capture => "Screen Capture",
            Self::Paste => "Pasted Image",
            Self::Upload => "Uploaded Image",
        }
    }
}

/// A loaded image together with its provenance. Cheap to clone, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    pub image: Arc<RgbaImage>,
    pub source: ImageSource,
}

impl SourceImage {
    pub fn new(image: RgbaImage, source: ImageSource) -> Self {
        Self {
            image: Arc::new(image),
            source,
        }
    }
}

/// Raw payload of an uploaded file.
#[derive(Debug, Clone)]
pub enum Upload {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// Capture the monitor at `monitor_idx` on a background thread.
pub fn capture_screen(monitor_idx: usize) -> SourceJob {
    ServiceJob::new(move || {
        let monitors = xcap::Monitor::all().map_err(|e| {
            log::warn!("Could not enumerate monitors: {e}");
            SnipError::CapturePermissionDenied
        })?;

        let monitor = monitors.get(monitor_idx).ok_or_else(|| {
            log::warn!(
                "Monitor {monitor_idx} does not exist ({} available)",
                monitors.len()
            );
            SnipError::CapturePermissionDenied
        })?;

        let image = monitor.capture_image().map_err(|e| {
            log::warn!("Screen capture of monitor {monitor_idx} failed: {e}");
            SnipError::CapturePermissionDenied
        })?;

        log::info!(
            "Captured monitor {monitor_idx} ({}x{})",
            image.width(),
            image.height()
        );
        Ok(SourceImage::new(image, ImageSource::Capture))
    })
}

/// Read an image from the system clipboard on a background thread.
pub fn paste_from_clipboard() -> SourceJob {
    ServiceJob::new(|| {
        let image = clipboard::read_image()?;
        Ok(SourceImage::new(image, ImageSource::Paste))
    })
}

/// Look for an image on the system clipboard on a background thread, for keyboard paste.
pub fn peek_clipboard() -> PasteJob {
    ServiceJob::new(|| {
        let image = clipboard::find_image()?;
        Ok(image.map(|image| SourceImage::new(image, ImageSource::Paste)))
    })
}

/// Decode an uploaded file on a background thread.
pub fn upload(upload: Upload) -> SourceJob {
    ServiceJob::new(move || {
        let image = match &upload {
            Upload::Path(path) => image::open(path).map_err(|e| {
                log::warn!("Could not decode `{}`: {e}", path.display());
                SnipError::ImageDecodeFailed
            })?,
            Upload::Bytes(bytes) => decode(bytes)?,
        };
        Ok(SourceImage::new(image.to_rgba8(), ImageSource::Upload))
    })
}

/// Decode an encoded image (PNG, JPEG, ...) from memory.
pub fn decode(bytes: &[u8]) -> Result<image::DynamicImage, SnipError> {
    image::load_from_memory(bytes).map_err(|e| {
        log::warn!("Could not decode image of {} bytes: {e}", bytes.len());
        SnipError::ImageDecodeFailed
    })
}
