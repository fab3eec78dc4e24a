use thiserror::Error;

/// Errors which end the current user operation and are shown in the status banner.
///
/// The `Display` text of each variant is the message presented to the user, so it should never
/// contain engine or platform diagnostics. Those are logged where the error is created instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnipError {
    #[error("Failed to capture screen. Please ensure you grant permission.")]
    CapturePermissionDenied,

    #[error("Selection could not be mapped onto the image.")]
    InvalidGeometry,

    #[error("Selected area is too small ({width}px × {height}px).")]
    SelectionTooSmall { width: u32, height: u32 },

    #[error("Could not read the image. Please try a different file.")]
    ImageDecodeFailed,

    #[error("OCR failed. Try with a clearer image.")]
    OcrFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_small_message_reports_dimensions() {
        let e = SnipError::SelectionTooSmall {
            width: 5,
            height: 20,
        };
        assert_eq!(e.to_string(), "Selected area is too small (5px × 20px).");
    }
}
