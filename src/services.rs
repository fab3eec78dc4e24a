use std::thread::JoinHandle;

use anyhow::{anyhow, Context, Result};
use ocr::OcrService;

use crate::config::AppConfig;

pub mod ocr;

/// Holds instanciated services.
pub struct Services {
    pub ocr: Box<dyn OcrService>,
}

impl Services {
    /// Create a new `Services` from the services specified in the given `AppConfig`.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let mut services = Self {
            ocr: config.ocr_service.create_service(),
        };

        services.ocr.init().with_context(|| {
            format!(
                "Failed to initialise OCR Service `{}`",
                config.ocr_service.name()
            )
        })?;

        Ok(services)
    }
}

impl Drop for Services {
    fn drop(&mut self) {
        if let Err(e) = self.ocr.terminate() {
            log::error!("Failed to terminate OCR Service: {e:#}");
        }
    }
}

/// A job running on a background thread. May or may not be finished.
pub struct ServiceJob<T> {
    handle: Option<JoinHandle<T>>,
}

impl<T: Send + 'static> ServiceJob<T> {
    pub fn new<F: FnOnce() -> T + Send + 'static>(f: F) -> Self {
        std::thread::spawn(f).into()
    }
}

impl<T> ServiceJob<T> {
    /// Get the return value of this `ServiceJob` if it was finished.
    ///
    /// - Returns `Err` if the job panicked, or if it has already finished and its return value was taken previously;
    /// - Returns `Ok(None)` if the job has not finished yet;
    /// - Returns `Ok(Some(T))` if the job has finished.
    pub fn try_wait(&mut self) -> Result<Option<T>> {
        match self.handle.take() {
            None => Err(anyhow!("job already finished")),
            Some(handle) if handle.is_finished() => join(handle).map(Some),
            Some(handle) => {
                self.handle = Some(handle);
                Ok(None)
            }
        }
    }

    /// Wait for the job to finish and return its return value.
    ///
    /// - Returns `Err` if the job panicked, or if it has already finished (eg. by calling `try_wait()`) and its return value was taken previously;
    /// - Returns `Ok(T)` if the job has finished.
    pub fn wait(self) -> Result<T> {
        match self.handle {
            None => Err(anyhow!("job already finished")),
            Some(handle) => join(handle),
        }
    }
}

fn join<T>(handle: JoinHandle<T>) -> Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("background job panicked"))
        .context("Failed to retrieve the result of a background job")
}

impl<T> From<JoinHandle<T>> for ServiceJob<T> {
    fn from(handle: JoinHandle<T>) -> Self {
        ServiceJob {
            handle: Some(handle),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::mpsc, time::Duration};

    use super::*;

    #[test]
    fn wait_returns_the_result() {
        let job = ServiceJob::new(|| 21 * 2);
        assert_eq!(job.wait().unwrap(), 42);
    }

    #[test]
    fn try_wait_reports_pending_then_result_then_error() {
        let (tx, rx) = mpsc::channel::<()>();
        let mut job = ServiceJob::new(move || {
            rx.recv().unwrap();
            "done"
        });

        assert!(job.try_wait().unwrap().is_none());

        tx.send(()).unwrap();
        let result = loop {
            if let Some(result) = job.try_wait().unwrap() {
                break result;
            }
            std::thread::sleep(Duration::from_millis(5));
        };

        assert_eq!(result, "done");
        assert!(job.try_wait().is_err());
    }

    #[test]
    fn panicking_job_is_an_error() {
        let job = ServiceJob::new(|| -> u8 { panic!("boom") });
        assert!(job.wait().is_err());
    }
}
