use eframe::egui;

use crate::{
    config::Config,
    services::Services,
    EframeApp, WINDOW_TITLE,
};

pub fn show_config_window(app: &mut EframeApp, ctx: &egui::Context) {
    ctx.show_viewport_immediate(
        egui::ViewportId(egui::Id::new("config_viewport")),
        egui::ViewportBuilder {
            title: Some(format!("{WINDOW_TITLE} - Configuration")),
            inner_size: Some(egui::vec2(480.0, 420.0)),
            ..Default::default()
        },
        |ctx, _| {
            egui::CentralPanel::default().show(ctx, |ui| config_ui(app, ui));

            if ctx.input(|input| input.viewport().close_requested()) {
                app.show_config = false;
            }
        },
    );
}

fn config_ui(app: &mut EframeApp, ui: &mut egui::Ui) {
    egui_extras::StripBuilder::new(ui)
        .size(egui_extras::Size::remainder())
        .size(egui_extras::Size::exact(0.0))
        .size(egui_extras::Size::exact(22.0))
        .vertical(|mut strip| {
            strip.cell(|ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let header_size = 24.0;

                    ui.label(
                        egui::RichText::new(concat!(env!("CARGO_PKG_NAME"), " Configuration"))
                            .size(header_size)
                            .strong(),
                    );

                    app.config.show_ui(ui);

                    ui.separator();

                    egui::CollapsingHeader::new(
                        egui::RichText::new(format!("OCR: {}", app.config.ocr_service.name()))
                            .size(header_size),
                    )
                    .default_open(true)
                    .show_unindented(ui, |ui| {
                        app.services.ocr.show_config_ui(ui);
                    });
                });
            });

            strip.empty();

            strip.strip(|builder| {
                builder
                    .sizes(egui_extras::Size::remainder(), 2)
                    .horizontal(|mut strip| {
                        strip.cell(|ui| {
                            ui.centered_and_justified(|ui| {
                                if ui.button("Save").clicked() {
                                    save(app);
                                }
                            });
                        });

                        strip.cell(|ui| {
                            ui.centered_and_justified(|ui| {
                                if ui.button("Reload Services").clicked() {
                                    save(app);
                                    reload(app);
                                }
                            });
                        });
                    });
            });
        });
}

fn save(app: &mut EframeApp) {
    if let Err(e) = app.config.save() {
        app.popups.error(e);
    }
    if let Err(e) = app.services.ocr.terminate() {
        app.popups.error(e);
    }
}

/// Re-create the services and the capture hotkey from the current configuration.
fn reload(app: &mut EframeApp) {
    match Services::new(&app.config) {
        Ok(services) => app.services = services,
        Err(e) => app.popups.error(e),
    }

    if let Err(e) = app.register_capture_hotkey() {
        app.popups.error(e);
    }

    log::info!("Reloaded OCR Service `{}`", app.config.ocr_service.name());
}
