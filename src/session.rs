use image::RgbaImage;

use crate::{
    crop::crop,
    error::SnipError,
    geometry::{DisplayRect, NativeSize},
    image_source::{ImageSource, SourceImage},
    selection::{SelectionRect, SelectionTracker},
};

/// Identifies the operation a background job was started for.
///
/// Every operation that replaces the session's state takes a new ticket, so results of jobs
/// which were superseded while running can be recognised and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// What the tool is currently doing, as shown to the user.
#[derive(Debug, Default, Clone, PartialEq)]
pub enum ProcessState {
    #[default]
    Idle,
    Capturing,
    Processing,
    Success { text: String },
    Error { message: String },
}

impl ProcessState {
    fn error(e: &SnipError) -> Self {
        Self::Error {
            message: e.to_string(),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Capturing | Self::Processing)
    }

    pub fn extracted_text(&self) -> Option<&str> {
        match self {
            Self::Success { text } => Some(text),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error { message } => Some(message),
            _ => None,
        }
    }
}

/// Everything that can happen to a [`Session`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    CaptureStarted,
    SourceLoaded(SourceImage),
    SourceFailed(SnipError),
    SelectionBegin {
        pointer: (f32, f32),
        display: DisplayRect,
    },
    SelectionUpdate {
        pointer: (f32, f32),
        display: DisplayRect,
    },
    SelectionEnd,
    SelectionClear,
    ExtractionStarted,
    ExtractionSucceeded(String),
    ExtractionFailed(SnipError),
    ClearAll,
}

/// The current image, selection and process state of the tool.
///
/// Image, selection and state only change through [`Session::apply`]; each event replaces the
/// affected values wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    image: Option<SourceImage>,
    source: ImageSource,
    tracker: SelectionTracker,
    state: ProcessState,
    generation: u64,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            image: None,
            source: ImageSource::Capture,
            tracker: SelectionTracker::default(),
            state: ProcessState::Idle,
            generation: 0,
        }
    }
}

impl Session {
    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    /// Provenance of the current (or most recently requested) image.
    pub fn source(&self) -> ImageSource {
        self.source
    }

    pub fn selection(&self) -> Option<&SelectionRect> {
        self.tracker.selection()
    }

    pub fn is_selecting(&self) -> bool {
        self.tracker.is_dragging()
    }

    pub fn state(&self) -> &ProcessState {
        &self.state
    }

    pub fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    fn next_ticket(&mut self) -> Ticket {
        self.generation += 1;
        self.ticket()
    }

    /// Start loading an image from `source` and return the ticket its job should carry.
    pub fn start_loading(&mut self, source: ImageSource) -> Ticket {
        self.source = source;
        if source == ImageSource::Capture {
            // capture results in errors of its own, so it is shown as a distinct state
            self.apply(SessionEvent::CaptureStarted);
        }
        self.next_ticket()
    }

    /// Start an extraction. Returns the image to run OCR on, which is the cropped selection if
    /// there is one, or `None` if there is nothing to extract (in which case the state explains
    /// why, when there is a reason to show).
    pub fn start_extraction(&mut self) -> Option<(Ticket, RgbaImage)> {
        let image = self.image.as_ref()?;

        let active = match self.tracker.selection() {
            Some(selection) => match crop(&image.image, selection) {
                Ok(cropped) => cropped,
                Err(e) => {
                    log::info!("Not extracting: {e}");
                    self.apply(SessionEvent::ExtractionFailed(e));
                    // an extraction still running must not replace the error
                    self.next_ticket();
                    return None;
                }
            },
            None => (*image.image).clone(),
        };

        self.apply(SessionEvent::ExtractionStarted);
        Some((self.next_ticket(), active))
    }

    /// Apply the result of a background job, unless the job was superseded.
    ///
    /// Returns whether the event was applied.
    pub fn complete(&mut self, ticket: Ticket, event: SessionEvent) -> bool {
        if ticket != self.ticket() {
            log::debug!(
                "Discarding result of superseded job {ticket:?} (current: {:?})",
                self.ticket()
            );
            return false;
        }
        self.apply(event);
        true
    }

    /// Apply the outcome of a keyboard paste started while `started` was the current ticket.
    ///
    /// Unlike the "Paste Image" button, a paste with no image on the clipboard changes nothing,
    /// so pasting text keeps the current image, result and running extraction.
    ///
    /// Returns whether the session changed.
    pub fn complete_keyboard_paste(
        &mut self,
        started: Ticket,
        found: Result<Option<SourceImage>, SnipError>,
    ) -> bool {
        let event = match found {
            Ok(Some(image)) => SessionEvent::SourceLoaded(image),
            Ok(None) => {
                log::debug!("Clipboard holds no image, ignoring paste");
                return false;
            }
            Err(e) => SessionEvent::SourceFailed(e),
        };

        if started != self.ticket() {
            log::debug!("Discarding paste superseded by {:?}", self.ticket());
            return false;
        }

        let ticket = self.start_loading(ImageSource::Paste);
        self.complete(ticket, event)
    }

    /// Apply a single event. Selection events on a missing or undrawable image are rejected with
    /// [`SnipError::InvalidGeometry`] and leave the session untouched.
    pub fn try_apply(&mut self, event: SessionEvent) -> Result<(), SnipError> {
        match event {
            SessionEvent::CaptureStarted => {
                self.tracker.clear();
                self.state = ProcessState::Capturing;
            }
            SessionEvent::SourceLoaded(image) => {
                log::info!(
                    "Loaded {} ({}x{})",
                    image.source.title(),
                    image.image.width(),
                    image.image.height()
                );
                self.source = image.source;
                self.image = Some(image);
                self.tracker.clear();
                self.state = ProcessState::Idle;
                self.generation += 1;
            }
            SessionEvent::SourceFailed(e) => {
                self.state = ProcessState::error(&e);
            }
            SessionEvent::SelectionBegin { pointer, display } => {
                let native = self.native_size()?;
                self.tracker.begin(pointer, display, native)?;
            }
            SessionEvent::SelectionUpdate { pointer, display } => {
                let native = self.native_size()?;
                self.tracker.update(pointer, display, native)?;
            }
            SessionEvent::SelectionEnd => self.tracker.end(),
            SessionEvent::SelectionClear => self.tracker.clear(),
            SessionEvent::ExtractionStarted => {
                self.state = ProcessState::Processing;
            }
            SessionEvent::ExtractionSucceeded(text) => {
                let text = text.trim();
                self.state = if text.is_empty() {
                    log::info!("OCR returned no text");
                    ProcessState::error(&SnipError::OcrFailed)
                } else {
                    ProcessState::Success {
                        text: text.to_owned(),
                    }
                };
            }
            SessionEvent::ExtractionFailed(e) => {
                self.state = ProcessState::error(&e);
            }
            SessionEvent::ClearAll => {
                *self = Self {
                    generation: self.generation + 1,
                    ..Self::default()
                };
            }
        }

        Ok(())
    }

    /// [`Self::try_apply`], logging rejected events instead of returning them.
    pub fn apply(&mut self, event: SessionEvent) {
        if let Err(e) = self.try_apply(event) {
            log::debug!("Ignoring event: {e:?}");
        }
    }

    fn native_size(&self) -> Result<NativeSize, SnipError> {
        self.image
            .as_ref()
            .map(|image| NativeSize::of(&image.image))
            .ok_or(SnipError::InvalidGeometry)
    }
}
