use anyhow::Result;
use eframe::egui::{self, Color32, RichText};

use crate::{
    clipboard::{self, CopyConfirmation},
    config::AppConfig,
    error::SnipError,
    image_source::{self, ImageSource, PasteJob, SourceJob, Upload},
    services::{ocr::OcrServiceJob, ServiceJob, Services},
    session::{ProcessState, Session, SessionEvent, Ticket},
};

use super::{image_viewer::ImageViewer, popups::Popups};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp", "tiff", "tif"];

const ERROR_COLOUR: Color32 = Color32::from_rgb(248, 113, 113);
const SUCCESS_COLOUR: Color32 = Color32::from_rgb(52, 211, 153);
const COPIED_COLOUR: Color32 = Color32::from_rgb(5, 150, 105);

/// The main window: controls, status, the image with its selection and the extracted text.
#[derive(Default)]
pub struct MainWindow {
    pending_source: Option<(Ticket, SourceJob)>,
    pending_keyboard_paste: Option<(Ticket, PasteJob)>,
    pending_ocr: Option<(Ticket, OcrServiceJob)>,
    viewer: ImageViewer,
    copy_confirmation: Option<CopyConfirmation>,
}

impl MainWindow {
    /// Whether anything is running in the background and needs the UI to keep polling.
    pub fn has_pending_jobs(&self) -> bool {
        self.pending_source.is_some()
            || self.pending_keyboard_paste.is_some()
            || self.pending_ocr.is_some()
            || self.copy_confirmation.is_some_and(|c| c.is_fresh())
    }

    pub fn start_capture(&mut self, session: &mut Session, config: &AppConfig) {
        let ticket = session.start_loading(ImageSource::Capture);
        let job = image_source::capture_screen(config.monitor);
        self.pending_source = Some((ticket, job));
    }

    pub fn start_paste(&mut self, session: &mut Session) {
        let ticket = session.start_loading(ImageSource::Paste);
        let job = image_source::paste_from_clipboard();
        self.pending_source = Some((ticket, job));
    }

    /// Ctrl/Cmd+V: like [`Self::start_paste`], but does nothing if the clipboard has no image.
    pub fn start_keyboard_paste(&mut self, session: &Session) {
        let job = image_source::peek_clipboard();
        self.pending_keyboard_paste = Some((session.ticket(), job));
    }

    pub fn start_upload(&mut self, session: &mut Session, upload: Upload) {
        log::debug!("Uploading {upload:?}");
        let ticket = session.start_loading(ImageSource::Upload);
        let job = image_source::upload(upload);
        self.pending_source = Some((ticket, job));
    }

    pub fn start_extraction(
        &mut self,
        session: &mut Session,
        services: &mut Services,
        config: &AppConfig,
    ) {
        if let Some((ticket, image)) = session.start_extraction() {
            log::info!(
                "Extracting text from {}x{} image",
                image.width(),
                image.height()
            );
            let job = services.ocr.ocr(image, &config.ocr_language);
            self.pending_ocr = Some((ticket, job));
        }
    }

    /// Hand finished background jobs over to the session.
    pub fn poll_jobs(&mut self, session: &mut Session) {
        if let Some((ticket, result)) = poll(&mut self.pending_source) {
            let event = match result {
                Ok(Ok(image)) => SessionEvent::SourceLoaded(image),
                Ok(Err(e)) => SessionEvent::SourceFailed(e),
                Err(e) => {
                    let kind = session.source();
                    log::error!("Loading {kind:?} image failed: {e:#}");
                    SessionEvent::SourceFailed(match kind {
                        ImageSource::Capture => SnipError::CapturePermissionDenied,
                        ImageSource::Paste | ImageSource::Upload => SnipError::ImageDecodeFailed,
                    })
                }
            };
            session.complete(ticket, event);
        }

        if let Some((started, result)) = poll(&mut self.pending_keyboard_paste) {
            let found = result.unwrap_or_else(|e| {
                log::error!("Reading the clipboard failed: {e:#}");
                Err(SnipError::ImageDecodeFailed)
            });
            session.complete_keyboard_paste(started, found);
        }

        if let Some((ticket, result)) = poll(&mut self.pending_ocr) {
            let event = match result.and_then(|text| text) {
                Ok(text) => SessionEvent::ExtractionSucceeded(text),
                Err(e) => {
                    log::warn!("OCR failed: {e:#}");
                    SessionEvent::ExtractionFailed(SnipError::OcrFailed)
                }
            };
            session.complete(ticket, event);
        }
    }

    /// Keyboard paste and files dropped onto the window.
    pub fn handle_input(&mut self, ctx: &egui::Context, session: &mut Session) {
        let (paste, dropped) = ctx.input(|input| {
            // egui-winit only emits `Event::Paste` for text and swallows the key press, but the
            // key release always arrives
            let paste = input.events.iter().any(|event| {
                matches!(
                    event,
                    egui::Event::Key {
                        key: egui::Key::V,
                        pressed: false,
                        modifiers,
                        ..
                    } if modifiers.command
                )
            });
            (paste, input.raw.dropped_files.first().cloned())
        });

        if paste {
            self.start_keyboard_paste(session);
        }

        if let Some(file) = dropped {
            match (file.path, file.bytes) {
                (Some(path), _) => self.start_upload(session, Upload::Path(path)),
                (None, Some(bytes)) => self.start_upload(session, Upload::Bytes(bytes)),
                (None, None) => log::warn!("Dropped file `{}` has no content", file.name),
            }
        }
    }

    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut Session,
        services: &mut Services,
        config: &AppConfig,
        popups: &mut Popups,
    ) {
        ui.vertical_centered(|ui| {
            ui.heading(RichText::new(crate::WINDOW_TITLE).size(32.0).strong());
            ui.label("Capture the screen, paste an image or upload a file to extract its text");
        });
        ui.add_space(12.0);

        self.control_panel_ui(ui, session, services, config);
        ui.add_space(8.0);
        status_ui(ui, session.state());
        ui.add_space(8.0);

        egui::ScrollArea::vertical()
            .auto_shrink(false)
            .show(ui, |ui| {
                if let Some(source) = session.image() {
                    ui.horizontal(|ui| {
                        ui.heading(source.source.title());
                        if session.selection().is_some() {
                            ui.label(
                                RichText::new("Selection Active")
                                    .color(Color32::from_rgb(96, 165, 250)),
                            );
                        }
                    });

                    let [r, g, b] = config.selection_colour;
                    self.viewer.show(ui, session, Color32::from_rgb(r, g, b));

                    ui.label(
                        "Tip: Click and drag to select a specific text area, or use \
                         \"Extract Text from Complete Image\" to process the entire image.",
                    );
                    ui.add_space(12.0);
                }

                if let Some(text) = session.state().extracted_text() {
                    if let Err(e) = self.extracted_text_ui(ui, text) {
                        popups.error(e);
                    }
                }
            });
    }

    fn control_panel_ui(
        &mut self,
        ui: &mut egui::Ui,
        session: &mut Session,
        services: &mut Services,
        config: &AppConfig,
    ) {
        let state = session.state().clone();
        let has_image = session.image().is_some();
        let has_selection = session.selection().is_some();

        ui.horizontal_wrapped(|ui| {
            let capturing = state == ProcessState::Capturing;
            let capture_label = if capturing {
                "Capturing..."
            } else {
                "Capture Screen"
            };
            if ui
                .add_enabled(!capturing, egui::Button::new(capture_label))
                .clicked()
            {
                self.start_capture(session, config);
            }

            if ui.button("Upload Image").clicked() {
                let file = rfd::FileDialog::new()
                    .add_filter("Images", IMAGE_EXTENSIONS)
                    .pick_file();
                if let Some(path) = file {
                    self.start_upload(session, Upload::Path(path));
                }
            }

            if ui.button("Paste Image").clicked() {
                self.start_paste(session);
            }

            if has_image {
                let processing = state == ProcessState::Processing;
                let extract_label = match (processing, has_selection) {
                    (true, _) => "Processing...",
                    (false, true) => "Extract Text from Selection",
                    (false, false) => "Extract Text from Complete Image",
                };
                if ui
                    .add_enabled(!processing, egui::Button::new(extract_label))
                    .clicked()
                {
                    self.start_extraction(session, services, config);
                }
            }

            if has_selection && ui.button("Clear Selection").clicked() {
                session.apply(SessionEvent::SelectionClear);
            }

            if has_image && ui.button("Clear All").clicked() {
                session.apply(SessionEvent::ClearAll);
                self.copy_confirmation = None;
            }

            if state.is_busy() {
                ui.add(egui::Spinner::new());
            }

            ui.weak("Or paste image (Ctrl+V)");
        });
    }

    fn extracted_text_ui(&mut self, ui: &mut egui::Ui, text: &str) -> Result<()> {
        ui.horizontal(|ui| {
            ui.heading("Extracted Text");

            let copied = self.copy_confirmation.is_some_and(|c| c.is_fresh());
            let mut button = egui::Button::new(if copied {
                "Copied!"
            } else {
                "Copy to Clipboard"
            });
            if copied {
                button = button.fill(COPIED_COLOUR);
            }

            if ui.add(button).clicked() {
                self.copy_confirmation = Some(clipboard::copy_text(text)?);
            }
            Ok::<(), anyhow::Error>(())
        })
        .inner?;

        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_min_height(120.0);
            egui::ScrollArea::vertical()
                .id_salt("extracted text")
                .max_height(400.0)
                .show(ui, |ui| {
                    ui.add(egui::Label::new(RichText::new(text).monospace()).selectable(true));
                });
        });

        Ok(())
    }
}

fn status_ui(ui: &mut egui::Ui, state: &ProcessState) {
    if let Some(message) = state.error_message() {
        ui.label(RichText::new(message).color(ERROR_COLOUR).strong());
    } else if state.extracted_text().is_some() {
        ui.label(
            RichText::new("Text extracted successfully!")
                .color(SUCCESS_COLOUR)
                .strong(),
        );
    }
}

/// Take the result out of `pending` if its job finished.
fn poll<T>(pending: &mut Option<(Ticket, ServiceJob<T>)>) -> Option<(Ticket, Result<T>)> {
    let (ticket, job) = pending.as_mut()?;
    let result = match job.try_wait() {
        Ok(None) => return None,
        Ok(Some(value)) => Ok(value),
        Err(e) => Err(e),
    };
    let ticket = *ticket;
    *pending = None;
    Some((ticket, result))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_v(pressed: bool, modifiers: egui::Modifiers) -> egui::Event {
        egui::Event::Key {
            key: egui::Key::V,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers,
        }
    }

    fn run_input(window: &mut MainWindow, session: &mut Session, events: Vec<egui::Event>) {
        let ctx = egui::Context::default();
        let input = egui::RawInput {
            events,
            ..Default::default()
        };
        let _ = ctx.run(input, |ctx| window.handle_input(ctx, session));
    }

    #[test]
    fn ctrl_v_release_pastes() {
        let mut window = MainWindow::default();
        let mut session = Session::default();
        let ticket = session.ticket();

        // all that reaches egui when the clipboard holds only an image
        run_input(
            &mut window,
            &mut session,
            vec![key_v(false, egui::Modifiers::COMMAND)],
        );

        assert!(window.pending_keyboard_paste.is_some());
        assert!(window.pending_source.is_none());
        assert_eq!(session.ticket(), ticket);
    }

    #[test]
    fn text_paste_and_plain_v_do_not_paste() {
        let mut window = MainWindow::default();
        let mut session = Session::default();

        run_input(
            &mut window,
            &mut session,
            vec![
                egui::Event::Paste("Hello".to_owned()),
                key_v(true, egui::Modifiers::NONE),
                key_v(false, egui::Modifiers::NONE),
            ],
        );

        assert!(window.pending_keyboard_paste.is_none());
        assert!(!window.has_pending_jobs());
    }
}
