use std::{
    fs::File,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use global_hotkey::hotkey::HotKey;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::services::ocr::{owocr::Owocr, tesseract::Tesseract, OcrService};

pub trait Config: Serialize + DeserializeOwned + Default {
    /// Path of the configuration file, relative to the application's configuration directory.
    fn path() -> &'static str;
    fn show_ui(&mut self, ui: &mut egui::Ui);

    /// Loads a configuration file, or creates a default configuration struct if the file does not exist.
    fn load() -> Result<Self> {
        Self::load_from(&config_path(Self::path())?)
    }

    fn save(&self) -> Result<()> {
        self.save_to(&config_path(Self::path())?)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            log::info!(
                "No configuration file at `{}`, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let file = File::open(config_path).with_context(|| {
            format!(
                "Could not open configuration file: `{}`",
                config_path.display()
            )
        })?;

        let config = serde_json::from_reader(file).with_context(|| {
            format!(
                "Could not read configuration file: `{}`",
                config_path.display(),
            )
        })?;

        Ok(config)
    }

    fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(config_dir) = config_path.parent() {
            std::fs::create_dir_all(config_dir).with_context(|| {
                format!(
                    "Could not create configuration directory: `{}`",
                    config_dir.display()
                )
            })?;
        }

        let file = File::create(config_path).with_context(|| {
            format!(
                "Could not write to configuration file: `{}`",
                config_path.display()
            )
        })?;

        serde_json::to_writer_pretty(file, self).with_context(|| {
            format!(
                "Could not serialise configuration file: `{}`",
                config_path.display()
            )
        })?;

        log::debug!("Saved configuration to `{}`", config_path.display());
        Ok(())
    }
}

fn config_path(relative: &str) -> Result<PathBuf> {
    let mut config_path =
        dirs::config_dir().ok_or_else(|| anyhow!("Could not find suitable config directory"))?;
    config_path.push(env!("CARGO_PKG_NAME"));
    config_path.push(relative);
    Ok(config_path)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Global hotkey starting a screen capture, eg. `alt+KeyS`.
    // https://w3c.github.io/uievents-code/
    pub capture_hotkey: String,
    pub ocr_service: OcrServiceList,
    /// Language hint passed to the OCR service.
    pub ocr_language: String,
    /// Index of the monitor to capture.
    pub monitor: usize,
    pub selection_colour: [u8; 3],
}

impl AppConfig {
    pub fn capture_hotkey(&self) -> Result<HotKey> {
        self.capture_hotkey
            .parse()
            .map_err(|e| anyhow!("{e}"))
            .with_context(|| format!("Invalid capture hotkey `{}`", self.capture_hotkey))
    }
}

impl Config for AppConfig {
    fn path() -> &'static str {
        "config.json"
    }

    fn show_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Capture hotkey:");
            ui.text_edit_singleline(&mut self.capture_hotkey);
        });
        ui.horizontal(|ui| {
            ui.label("Monitor:");
            ui.add(egui::DragValue::new(&mut self.monitor));
        });
        ui.horizontal(|ui| {
            ui.label("Selection colour:");
            ui.color_edit_button_srgb(&mut self.selection_colour);
        });
        ui.horizontal(|ui| {
            ui.label("OCR language:");
            ui.text_edit_singleline(&mut self.ocr_language);
        });
        egui::ComboBox::from_label("OCR Service")
            .selected_text(self.ocr_service.name())
            .show_ui(ui, |ui| {
                for service in OcrServiceList::ALL {
                    ui.selectable_value(&mut self.ocr_service, service, service.name());
                }
            });
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            capture_hotkey: "alt+KeyS".to_owned(),
            ocr_service: OcrServiceList::Tesseract,
            ocr_language: "eng".to_owned(),
            monitor: 0,
            selection_colour: [59, 130, 246],
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub enum OcrServiceList {
    Tesseract,
    Owocr,
}

impl OcrServiceList {
    pub const ALL: [Self; 2] = [Self::Tesseract, Self::Owocr];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Tesseract => "Tesseract",
            Self::Owocr => "owocr",
        }
    }

    pub fn create_service(&self) -> Box<dyn OcrService> {
        match self {
            Self::Tesseract => Box::new(Tesseract::default()),
            Self::Owocr => Box::new(Owocr::default()),
        }
    }
}
