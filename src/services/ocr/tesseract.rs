use std::{
    io::{Cursor, Write},
    process::{Command, Stdio},
};

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::{config::Config, services::ServiceJob};

use super::{OcrService, OcrServiceJob};

/// Runs the `tesseract` command line tool.
#[derive(Default)]
pub struct Tesseract {
    config: TesseractConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractConfig {
    /// Name or path of the tesseract executable.
    binary: String,
    /// Page segmentation mode (`--psm`), tesseract's default when unset.
    page_segmentation_mode: Option<u8>,
}

impl Default for TesseractConfig {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_owned(),
            page_segmentation_mode: None,
        }
    }
}

impl TesseractConfig {
    /// Reads a PNG from stdin and writes plain text to stdout.
    fn command(&self, language: &str) -> Command {
        let mut command = Command::new(&self.binary);
        command.args(["stdin", "stdout"]);
        if !language.is_empty() {
            command.args(["-l", language]);
        }
        if let Some(psm) = self.page_segmentation_mode {
            command.args(["--psm", &psm.to_string()]);
        }
        command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }
}

impl Config for TesseractConfig {
    fn path() -> &'static str {
        "ocr_services/tesseract.json"
    }

    fn show_ui(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Executable:");
            ui.text_edit_singleline(&mut self.binary);
        });

        let mut custom_psm = self.page_segmentation_mode.is_some();
        ui.checkbox(&mut custom_psm, "Custom page segmentation mode");
        if custom_psm {
            let psm = self.page_segmentation_mode.get_or_insert(3);
            ui.add(egui::DragValue::new(psm).range(0..=13));
        } else {
            self.page_segmentation_mode = None;
        }
    }
}

impl OcrService for Tesseract {
    fn init(&mut self) -> Result<()> {
        self.config =
            TesseractConfig::load().context("Tesseract: Failed to load configuration file")?;
        Ok(())
    }

    fn terminate(&mut self) -> Result<()> {
        self.config
            .save()
            .context("Tesseract: Failed to save configuration file")?;
        Ok(())
    }

    fn show_config_ui(&mut self, ui: &mut egui::Ui) {
        self.config.show_ui(ui);
    }

    fn ocr(&mut self, image: RgbaImage, language: &str) -> OcrServiceJob {
        let mut command = self.config.command(language);

        ServiceJob::new(move || {
            let mut buf = Cursor::new(Vec::new());
            image
                .write_to(&mut buf, ImageFormat::Png)
                .context("Tesseract: Failed to encode image as PNG")?;

            let mut child = command
                .spawn()
                .with_context(|| format!("Tesseract: Failed to run `{:?}`", command.get_program()))?;

            // stdin is dropped after writing so tesseract sees EOF
            let written = match child.stdin.take() {
                Some(mut stdin) => stdin
                    .write_all(buf.get_ref())
                    .context("Tesseract: Failed to write image to stdin"),
                None => Err(anyhow!("Tesseract: stdin was not captured")),
            };

            // reap the process even if writing failed, an early exit closes the pipe and its
            // stderr names the cause
            let output = child
                .wait_with_output()
                .context("Tesseract: Failed to wait for process")?;

            if !output.status.success() {
                return Err(anyhow!(
                    "Tesseract: exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ));
            }
            written?;

            String::from_utf8(output.stdout)
                .context("Tesseract: Output was not UTF-8 encoded text")
        })
    }
}
