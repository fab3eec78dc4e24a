use std::sync::Arc;

use eframe::egui::{self, Color32, CornerRadius, Pos2, Rect, Stroke, TextureHandle};
use image::RgbaImage;

use crate::{
    geometry::{DisplayRect, ImageTransform, NativeSize},
    session::{Session, SessionEvent},
};

/// Shows the session's image scaled to the available width and turns drags on it into
/// selection events.
#[derive(Default)]
pub struct ImageViewer {
    texture: Option<(Arc<RgbaImage>, TextureHandle)>,
}

impl ImageViewer {
    pub fn show(&mut self, ui: &mut egui::Ui, session: &mut Session, selection_colour: Color32) {
        let Some(source) = session.image() else {
            self.texture = None;
            return;
        };
        let image = source.image.clone();
        let native = NativeSize::of(&image);
        let texture = self.texture(ui.ctx(), &image);

        let scale = (ui.available_width() / native.width as f32).min(1.0);
        let size = egui::vec2(native.width as f32, native.height as f32) * scale;
        let (rect, response) = ui.allocate_exact_size(size, egui::Sense::drag());

        ui.painter().image(
            texture.id(),
            rect,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );

        let display = DisplayRect::from(rect);

        if response.drag_started() {
            let pointer = ui
                .input(|input| input.pointer.press_origin())
                .or(response.interact_pointer_pos());
            if let Some(pos) = pointer {
                let event = SessionEvent::SelectionBegin {
                    pointer: (pos.x, pos.y),
                    display,
                };
                if let Err(e) = session.try_apply(event) {
                    log::warn!("Could not start selection: {e}");
                }
            }
        }

        if session.is_selecting() {
            if let Some(pos) = response.interact_pointer_pos() {
                let event = SessionEvent::SelectionUpdate {
                    pointer: (pos.x, pos.y),
                    display,
                };
                if let Err(e) = session.try_apply(event) {
                    log::warn!("Could not update selection: {e}");
                }
            }

            // leaving the image ends the drag, like releasing the button
            if response.drag_stopped() || !response.contains_pointer() {
                session.apply(SessionEvent::SelectionEnd);
            }
        }

        if let Some(selection) = session.selection() {
            let Ok(transform) = ImageTransform::new(display, native) else {
                return;
            };
            let (x, y, width, height) = selection.normalized();
            let overlay = Rect::from(transform.rect_to_display(x, y, width, height));

            ui.painter().rect_filled(
                overlay,
                CornerRadius::ZERO,
                selection_colour.gamma_multiply(0.1),
            );
            ui.painter().rect_stroke(
                overlay,
                CornerRadius::ZERO,
                Stroke::new(2.0, selection_colour),
                egui::StrokeKind::Outside,
            );
        }

        response.on_hover_cursor(egui::CursorIcon::Crosshair);
    }

    /// The texture for `image`, uploading it if the image changed since the last frame.
    fn texture(&mut self, ctx: &egui::Context, image: &Arc<RgbaImage>) -> TextureHandle {
        if let Some((cached, texture)) = &self.texture {
            if Arc::ptr_eq(cached, image) {
                return texture.clone();
            }
        }

        let color_image = egui::ColorImage::from_rgba_unmultiplied(
            [image.width() as usize, image.height() as usize],
            image.as_flat_samples().as_slice(),
        );
        let texture = ctx.load_texture("source image", color_image, egui::TextureOptions::LINEAR);

        self.texture = Some((image.clone(), texture.clone()));
        texture
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        image_source::{ImageSource, SourceImage},
        selection::SelectionRect,
    };

    use super::*;

    /// A 100x100 image shown 1:1 in an otherwise empty window.
    struct Harness {
        ctx: egui::Context,
        viewer: ImageViewer,
        session: Session,
        origin: Pos2,
    }

    impl Harness {
        fn new() -> Self {
            let mut session = Session::default();
            let ticket = session.start_loading(ImageSource::Upload);
            let image = SourceImage::new(RgbaImage::new(100, 100), ImageSource::Upload);
            session.complete(ticket, SessionEvent::SourceLoaded(image));

            let mut harness = Self {
                ctx: egui::Context::default(),
                viewer: ImageViewer::default(),
                session,
                origin: Pos2::ZERO,
            };
            // interaction is hit tested against the previous frame's layout
            harness.frame(Vec::new());
            harness
        }

        fn frame(&mut self, events: Vec<egui::Event>) {
            let input = egui::RawInput {
                screen_rect: Some(Rect::from_min_size(Pos2::ZERO, egui::vec2(400.0, 400.0))),
                events,
                ..Default::default()
            };
            let Self {
                ctx,
                viewer,
                session,
                origin,
            } = self;
            let _ = ctx.run(input, |ctx| {
                egui::CentralPanel::default().show(ctx, |ui| {
                    *origin = ui.cursor().min;
                    viewer.show(ui, session, Color32::RED);
                });
            });
        }

        /// Screen position of image pixel `(x, y)`.
        fn at(&self, x: f32, y: f32) -> Pos2 {
            self.origin + egui::vec2(x, y)
        }
    }

    fn button(pos: Pos2, pressed: bool) -> egui::Event {
        egui::Event::PointerButton {
            pos,
            button: egui::PointerButton::Primary,
            pressed,
            modifiers: egui::Modifiers::NONE,
        }
    }

    #[test]
    fn drag_selects_from_press_to_release() {
        let mut harness = Harness::new();
        let (press, release) = (harness.at(70.0, 80.0), harness.at(10.0, 5.0));

        harness.frame(vec![egui::Event::PointerMoved(press), button(press, true)]);
        assert!(harness.session.is_selecting());

        harness.frame(vec![egui::Event::PointerMoved(release)]);
        harness.frame(vec![button(release, false)]);

        assert!(!harness.session.is_selecting());
        assert_eq!(
            harness.session.selection(),
            Some(&SelectionRect {
                start_x: 70.0,
                start_y: 80.0,
                end_x: 10.0,
                end_y: 5.0,
            })
        );
    }

    #[test]
    fn leaving_the_image_ends_the_drag_at_its_edge() {
        let mut harness = Harness::new();
        let press = harness.at(20.0, 30.0);
        let inside = harness.at(60.0, 50.0);
        let outside = harness.at(150.0, 70.0);
        let back_inside = harness.at(80.0, 80.0);

        harness.frame(vec![egui::Event::PointerMoved(press), button(press, true)]);
        harness.frame(vec![egui::Event::PointerMoved(inside)]);
        assert!(harness.session.is_selecting());

        harness.frame(vec![egui::Event::PointerMoved(outside)]);

        assert!(!harness.session.is_selecting());
        let frozen = SelectionRect {
            start_x: 20.0,
            start_y: 30.0,
            end_x: 100.0,
            end_y: 70.0,
        };
        assert_eq!(harness.session.selection(), Some(&frozen));

        // still holding the button, coming back does not resume the drag
        harness.frame(vec![egui::Event::PointerMoved(back_inside)]);
        assert_eq!(harness.session.selection(), Some(&frozen));
    }
}
