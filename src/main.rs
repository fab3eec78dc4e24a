use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use config::{AppConfig, Config};
use eframe::{egui, CreationContext};
use global_hotkey::{hotkey::HotKey, GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use gui::{config_window::show_config_window, main_window::MainWindow, popups::Popups};
use services::Services;
use session::Session;

pub mod clipboard;
pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod gui;
pub mod image_source;
pub mod selection;
pub mod services;
pub mod session;

pub const WINDOW_TITLE: &str = "OCR Snipping Tool";

fn main() -> Result<()> {
    pretty_env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size([1024.0, 768.0])
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        WINDOW_TITLE,
        options,
        Box::new(|cc| match EframeApp::new(cc) {
            Ok(app) => Ok(Box::new(app)),
            Err(e) => Err(e.into()),
        }),
    )
    .map_err(|e| anyhow!("{e}"))
}

pub struct EframeApp {
    pub config: AppConfig,
    pub services: Services,
    pub popups: Popups,
    pub session: Session,
    pub main_window: MainWindow,
    pub show_config: bool,

    hotkey_manager: Option<GlobalHotKeyManager>,
    capture_hotkey: Option<HotKey>,
}

impl EframeApp {
    pub fn new(_cc: &CreationContext) -> Result<Self> {
        let config = AppConfig::load().context("Could not load main configuration file")?;
        let services = Services::new(&config)?;

        let mut app = Self {
            config,
            services,
            popups: Popups::default(),
            session: Session::default(),
            main_window: MainWindow::default(),
            show_config: false,

            hotkey_manager: None,
            capture_hotkey: None,
        };

        // global hotkeys are not available everywhere (eg. on Wayland), the app works without one
        if let Err(e) = app.register_capture_hotkey() {
            app.popups.error(e);
        }

        Ok(app)
    }

    /// Register the capture hotkey from the configuration, replacing the previous one.
    pub fn register_capture_hotkey(&mut self) -> Result<()> {
        let manager = match self.hotkey_manager.take() {
            Some(manager) => manager,
            None => GlobalHotKeyManager::new().context("Failed to initialise GlobalHotKeyManager")?,
        };
        // NOTE: the manager needs to stay alive for as long as its hotkeys should work
        let manager = self.hotkey_manager.insert(manager);

        if let Some(hotkey) = self.capture_hotkey.take() {
            manager
                .unregister(hotkey)
                .context("Failed to unregister previous capture hotkey")?;
        }

        let hotkey = self.config.capture_hotkey()?;
        manager
            .register(hotkey)
            .context("Failed to register hotkey with GlobalHotKeyManager")?;
        self.capture_hotkey = Some(hotkey);

        log::info!("Registered capture hotkey `{}`", self.config.capture_hotkey);
        Ok(())
    }

    fn handle_hotkey(&mut self) {
        let Some(capture_hotkey_id) = self.capture_hotkey.as_ref().map(HotKey::id) else {
            return;
        };

        while let Ok(event) = GlobalHotKeyEvent::receiver().try_recv() {
            if event.id == capture_hotkey_id && event.state == HotKeyState::Pressed {
                log::info!("Capture hotkey was pressed");
                self.main_window.start_capture(&mut self.session, &self.config);
            }
        }
    }
}

impl eframe::App for EframeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_hotkey();
        self.main_window.poll_jobs(&mut self.session);
        self.main_window.handle_input(ctx, &mut self.session);

        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                if ui.button("Configuration").clicked() {
                    self.show_config = !self.show_config;
                }
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.main_window.show(
                ui,
                &mut self.session,
                &mut self.services,
                &self.config,
                &mut self.popups,
            );
        });

        if self.show_config {
            show_config_window(self, ctx);
        }

        self.popups.show(ctx);

        if self.main_window.has_pending_jobs() {
            ctx.request_repaint_after(Duration::from_millis(50));
        } else if self.capture_hotkey.is_some() {
            // hotkey events arrive outside of egui's event loop
            ctx.request_repaint_after(Duration::from_millis(250));
        }
    }
}
