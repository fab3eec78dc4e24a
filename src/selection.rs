use crate::{
    error::SnipError,
    geometry::{DisplayRect, ImageTransform, NativeSize},
};

/// A dragged rectangle in native image pixels.
///
/// The corners are stored as they were dragged; `start` is not necessarily the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub start_x: f32,
    pub start_y: f32,
    pub end_x: f32,
    pub end_y: f32,
}

impl SelectionRect {
    fn at(x: f32, y: f32) -> Self {
        Self {
            start_x: x,
            start_y: y,
            end_x: x,
            end_y: y,
        }
    }

    /// `(x, y, width, height)` with `x, y` at the top-left corner.
    pub fn normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.start_x.min(self.end_x),
            self.start_y.min(self.end_y),
            (self.end_x - self.start_x).abs(),
            (self.end_y - self.start_y).abs(),
        )
    }
}

/// Turns pointer drags over a displayed image into a [`SelectionRect`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SelectionTracker {
    selection: Option<SelectionRect>,
    dragging: bool,
}

impl SelectionTracker {
    /// Start a new selection at the pointer position, replacing any previous one.
    pub fn begin(
        &mut self,
        pointer: (f32, f32),
        display: DisplayRect,
        native: NativeSize,
    ) -> Result<(), SnipError> {
        let transform = ImageTransform::new(display, native)?;
        let (x, y) = transform.to_native_clamped(pointer.0, pointer.1);

        self.selection = Some(SelectionRect::at(x, y));
        self.dragging = true;
        Ok(())
    }

    /// Move the free corner of the selection. Does nothing when no drag is in progress.
    pub fn update(
        &mut self,
        pointer: (f32, f32),
        display: DisplayRect,
        native: NativeSize,
    ) -> Result<(), SnipError> {
        if !self.dragging {
            return Ok(());
        }
        let Some(selection) = &mut self.selection else {
            return Ok(());
        };

        let transform = ImageTransform::new(display, native)?;
        let (x, y) = transform.to_native_clamped(pointer.0, pointer.1);
        selection.end_x = x;
        selection.end_y = y;
        Ok(())
    }

    pub fn end(&mut self) {
        self.dragging = false;
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.dragging = false;
    }

    pub fn selection(&self) -> Option<&SelectionRect> {
        self.selection.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 200x100 image shown at half size at (10, 20)
    const DISPLAY: DisplayRect = DisplayRect {
        left: 10.0,
        top: 20.0,
        width: 100.0,
        height: 50.0,
    };
    const NATIVE: NativeSize = NativeSize {
        width: 200,
        height: 100,
    };

    #[test]
    fn begin_creates_zero_area_selection() {
        let mut tracker = SelectionTracker::default();
        tracker.begin((30.0, 30.0), DISPLAY, NATIVE).unwrap();

        assert!(tracker.is_dragging());
        assert_eq!(
            tracker.selection(),
            Some(&SelectionRect {
                start_x: 40.0,
                start_y: 20.0,
                end_x: 40.0,
                end_y: 20.0,
            })
        );
    }

    #[test]
    fn update_moves_end_corner_while_dragging() {
        let mut tracker = SelectionTracker::default();
        tracker.begin((30.0, 30.0), DISPLAY, NATIVE).unwrap();
        tracker.update((60.0, 45.0), DISPLAY, NATIVE).unwrap();

        let s = tracker.selection().unwrap();
        assert_eq!((s.start_x, s.start_y), (40.0, 20.0));
        assert_eq!((s.end_x, s.end_y), (100.0, 50.0));
    }

    #[test]
    fn update_after_end_is_ignored() {
        let mut tracker = SelectionTracker::default();
        tracker.begin((30.0, 30.0), DISPLAY, NATIVE).unwrap();
        tracker.update((60.0, 45.0), DISPLAY, NATIVE).unwrap();
        tracker.end();
        let frozen = *tracker.selection().unwrap();

        tracker.update((100.0, 60.0), DISPLAY, NATIVE).unwrap();

        assert!(!tracker.is_dragging());
        assert_eq!(tracker.selection(), Some(&frozen));
    }

    #[test]
    fn update_without_begin_is_noop() {
        let mut tracker = SelectionTracker::default();
        tracker.update((60.0, 45.0), DISPLAY, NATIVE).unwrap();
        assert_eq!(tracker, SelectionTracker::default());
    }

    #[test]
    fn pointer_outside_the_image_is_clamped() {
        let mut tracker = SelectionTracker::default();
        tracker.begin((0.0, 0.0), DISPLAY, NATIVE).unwrap();
        tracker.update((500.0, 500.0), DISPLAY, NATIVE).unwrap();

        let s = tracker.selection().unwrap();
        assert_eq!((s.start_x, s.start_y), (0.0, 0.0));
        assert_eq!((s.end_x, s.end_y), (200.0, 100.0));
    }

    #[test]
    fn degenerate_display_is_rejected() {
        let mut tracker = SelectionTracker::default();
        let flat = DisplayRect::new(10.0, 20.0, 100.0, 0.0);

        assert_eq!(
            tracker.begin((30.0, 30.0), flat, NATIVE),
            Err(SnipError::InvalidGeometry)
        );
        assert!(tracker.selection().is_none());
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn degenerate_display_mid_drag_keeps_rectangle() {
        let mut tracker = SelectionTracker::default();
        tracker.begin((30.0, 30.0), DISPLAY, NATIVE).unwrap();
        let before = *tracker.selection().unwrap();

        let flat = DisplayRect::new(10.0, 20.0, 0.0, 50.0);
        assert_eq!(
            tracker.update((60.0, 45.0), flat, NATIVE),
            Err(SnipError::InvalidGeometry)
        );
        assert_eq!(tracker.selection(), Some(&before));
    }

    #[test]
    fn end_keeps_selection_and_clear_discards_it() {
        let mut tracker = SelectionTracker::default();
        tracker.begin((30.0, 30.0), DISPLAY, NATIVE).unwrap();
        tracker.end();
        assert!(tracker.selection().is_some());

        tracker.clear();
        assert!(tracker.selection().is_none());
        assert!(!tracker.is_dragging());
    }

    #[test]
    fn clear_without_selection_is_noop() {
        let mut tracker = SelectionTracker::default();
        tracker.clear();
        tracker.clear();
        assert_eq!(tracker, SelectionTracker::default());
    }

    #[test]
    fn normalization_ignores_drag_direction() {
        let forward = SelectionRect {
            start_x: 30.0,
            start_y: 40.0,
            end_x: 50.0,
            end_y: 60.0,
        };
        let backward = SelectionRect {
            start_x: 50.0,
            start_y: 60.0,
            end_x: 30.0,
            end_y: 40.0,
        };
        let mixed = SelectionRect {
            start_x: 50.0,
            start_y: 40.0,
            end_x: 30.0,
            end_y: 60.0,
        };

        assert_eq!(forward.normalized(), (30.0, 40.0, 20.0, 20.0));
        assert_eq!(backward.normalized(), forward.normalized());
        assert_eq!(mixed.normalized(), forward.normalized());
    }
}
