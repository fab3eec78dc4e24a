use eframe::egui;

use crate::error::SnipError;

/// Pixel dimensions of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeSize {
    pub width: u32,
    pub height: u32,
}

impl NativeSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn of(image: &image::RgbaImage) -> Self {
        Self::new(image.width(), image.height())
    }
}

/// The on-screen box an image is currently drawn into, in display points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl DisplayRect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite())
            || self.width <= 0.0
            || self.height <= 0.0
    }
}

impl From<egui::Rect> for DisplayRect {
    fn from(rect: egui::Rect) -> Self {
        Self::new(rect.left(), rect.top(), rect.width(), rect.height())
    }
}

impl From<DisplayRect> for egui::Rect {
    fn from(rect: DisplayRect) -> Self {
        egui::Rect::from_min_size(
            egui::pos2(rect.left, rect.top),
            egui::vec2(rect.width, rect.height),
        )
    }
}

/// Maps points between a displayed (possibly scaled) image and its native pixel grid.
///
/// Both directions are derived from the same pair of scale factors, so the overlay drawn from a
/// selection always lands where the pointer was when the selection was made.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageTransform {
    display: DisplayRect,
    native: NativeSize,
    scale_x: f32,
    scale_y: f32,
}

impl ImageTransform {
    /// Fails with [`SnipError::InvalidGeometry`] if either rectangle has no area.
    pub fn new(display: DisplayRect, native: NativeSize) -> Result<Self, SnipError> {
        if display.is_degenerate() || native.width == 0 || native.height == 0 {
            return Err(SnipError::InvalidGeometry);
        }

        Ok(Self {
            display,
            native,
            scale_x: native.width as f32 / display.width,
            scale_y: native.height as f32 / display.height,
        })
    }

    /// Display point to native pixel coordinates, without clamping.
    pub fn to_native(&self, x: f32, y: f32) -> (f32, f32) {
        (
            (x - self.display.left) * self.scale_x,
            (y - self.display.top) * self.scale_y,
        )
    }

    /// Same as [`Self::to_native`], but clamped into `[0, width] × [0, height]`.
    pub fn to_native_clamped(&self, x: f32, y: f32) -> (f32, f32) {
        let (nx, ny) = self.to_native(x, y);
        (
            nx.clamp(0.0, self.native.width as f32),
            ny.clamp(0.0, self.native.height as f32),
        )
    }

    /// Native pixel coordinates back to a display point.
    pub fn to_display(&self, x: f32, y: f32) -> (f32, f32) {
        (
            x / self.scale_x + self.display.left,
            y / self.scale_y + self.display.top,
        )
    }

    /// Native-space rectangle (`x, y, width, height`) to the display box it covers.
    pub fn rect_to_display(&self, x: f32, y: f32, width: f32, height: f32) -> DisplayRect {
        let (left, top) = self.to_display(x, y);
        DisplayRect::new(left, top, width / self.scale_x, height / self.scale_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() <= 1e-4 * a.abs().max(1.0), "{a} != {b}");
    }

    #[test]
    fn rejects_zero_area_display() {
        let native = NativeSize::new(100, 100);
        assert_eq!(
            ImageTransform::new(DisplayRect::new(0.0, 0.0, 0.0, 50.0), native),
            Err(SnipError::InvalidGeometry)
        );
        assert_eq!(
            ImageTransform::new(DisplayRect::new(0.0, 0.0, 50.0, 0.0), native),
            Err(SnipError::InvalidGeometry)
        );
        assert_eq!(
            ImageTransform::new(DisplayRect::new(0.0, 0.0, f32::NAN, 50.0), native),
            Err(SnipError::InvalidGeometry)
        );
    }

    #[test]
    fn rejects_empty_image() {
        assert_eq!(
            ImageTransform::new(
                DisplayRect::new(0.0, 0.0, 10.0, 10.0),
                NativeSize::new(0, 10)
            ),
            Err(SnipError::InvalidGeometry)
        );
    }

    #[test]
    fn scales_into_native_space() {
        // 1920x1080 screenshot shown at half size, offset by the panel margin
        let t = ImageTransform::new(
            DisplayRect::new(8.0, 40.0, 960.0, 540.0),
            NativeSize::new(1920, 1080),
        )
        .unwrap();

        let (x, y) = t.to_native(8.0 + 100.0, 40.0 + 50.0);
        assert_close(x, 200.0);
        assert_close(y, 100.0);
    }

    #[test]
    fn clamps_points_outside_the_image() {
        let t = ImageTransform::new(
            DisplayRect::new(10.0, 10.0, 50.0, 50.0),
            NativeSize::new(100, 200),
        )
        .unwrap();

        assert_eq!(t.to_native_clamped(0.0, 0.0), (0.0, 0.0));
        assert_eq!(t.to_native_clamped(500.0, 500.0), (100.0, 200.0));
    }

    #[test]
    fn round_trips_between_display_and_native() {
        let displays = [
            DisplayRect::new(0.0, 0.0, 640.0, 480.0),
            DisplayRect::new(12.5, 33.0, 317.0, 91.0),
            DisplayRect::new(-20.0, 4.0, 1.0, 3000.0),
        ];
        let natives = [
            NativeSize::new(640, 480),
            NativeSize::new(3840, 2160),
            NativeSize::new(7, 13),
        ];

        for display in displays {
            for native in natives {
                let t = ImageTransform::new(display, native).unwrap();
                for (fx, fy) in [(0.0, 0.0), (0.25, 0.75), (0.5, 0.5), (1.0, 1.0)] {
                    let px = display.left + display.width * fx;
                    let py = display.top + display.height * fy;
                    let (nx, ny) = t.to_native(px, py);
                    let (dx, dy) = t.to_display(nx, ny);
                    assert_close(dx, px);
                    assert_close(dy, py);
                }
            }
        }
    }

    #[test]
    fn rect_to_display_uses_reciprocal_scale() {
        let t = ImageTransform::new(
            DisplayRect::new(100.0, 0.0, 200.0, 100.0),
            NativeSize::new(400, 400),
        )
        .unwrap();

        let r = t.rect_to_display(40.0, 80.0, 100.0, 40.0);
        assert_close(r.left, 120.0);
        assert_close(r.top, 20.0);
        assert_close(r.width, 50.0);
        assert_close(r.height, 10.0);
    }
}
