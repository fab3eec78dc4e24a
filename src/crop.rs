use image::{imageops, RgbaImage};

use crate::{error::SnipError, selection::SelectionRect};

/// Smallest selection, in native pixels along either axis, that is accepted for cropping.
pub const MIN_SELECTION_SIZE: f32 = 10.0;

/// Copy the selected region out of `image` into a new image.
///
/// Works on native pixels: the selection is normalised, rounded to whole pixels and clipped to
/// the image bounds. Selections narrower or shorter than [`MIN_SELECTION_SIZE`] are rejected.
pub fn crop(image: &RgbaImage, selection: &SelectionRect) -> Result<RgbaImage, SnipError> {
    let (x, y, width, height) = selection.normalized();

    if width < MIN_SELECTION_SIZE || height < MIN_SELECTION_SIZE {
        return Err(SnipError::SelectionTooSmall {
            width: width.round() as u32,
            height: height.round() as u32,
        });
    }

    let x = (x.round() as u32).min(image.width());
    let y = (y.round() as u32).min(image.height());
    let width = (width.round() as u32).min(image.width() - x);
    let height = (height.round() as u32).min(image.height() - y);

    Ok(imageops::crop_imm(image, x, y, width, height).to_image())
}
