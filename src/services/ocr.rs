use anyhow::Result;
use eframe::egui;
use image::RgbaImage;

use super::ServiceJob;

pub mod owocr;
pub mod tesseract;

pub type OcrServiceJob = ServiceJob<Result<String>>;

pub trait OcrService {
    /// Initialise the service (ie. load its configuration file, etc).
    fn init(&mut self) -> Result<()>;
    /// Terminate the service (ie. save its configuration file, etc).
    fn terminate(&mut self) -> Result<()>;

    /// Show the config UI for the service's configuration.
    fn show_config_ui(&mut self, ui: &mut egui::Ui);

    /// Extract the text of an image. `language` is a hint in the engine's own notation (eg. `eng`).
    fn ocr(&mut self, image: RgbaImage, language: &str) -> OcrServiceJob;
}
