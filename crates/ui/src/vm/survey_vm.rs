use services::{SurveyError, SurveyPhase, SurveyProgressView, SurveyService, SurveySession};
use survey_core::model::{IdentityDraft, Rating};
use tracing::warn;

use super::image_vm::image_data_uri;
use crate::views::ViewError;

/// Outcome of submitting the intake form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntakeOutcome {
    Accepted,
    /// Shown next to the form; nothing else changes.
    Warning(String),
}

/// The image currently on screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShownImage {
    pub filename: String,
    pub src: String,
}

/// View model wrapping one `SurveySession`.
pub struct SurveyVm {
    session: SurveySession,
    shown: Option<ShownImage>,
}

fn view_error(err: &SurveyError) -> ViewError {
    match err {
        SurveyError::Storage(_) | SurveyError::ClientStoreNotReady => ViewError::Storage,
        _ => ViewError::Unknown,
    }
}

impl SurveyVm {
    fn new(service: &SurveyService, session: SurveySession) -> Result<Self, ViewError> {
        let mut vm = Self {
            session,
            shown: None,
        };
        vm.load_current(service)?;
        Ok(vm)
    }

    #[must_use]
    pub fn phase(&self) -> SurveyPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn progress(&self) -> SurveyProgressView {
        SurveyProgressView::from_session(&self.session)
    }

    /// `"i / N"` for the image on screen.
    #[must_use]
    pub fn caption(&self) -> Option<String> {
        let view = self.progress();
        view.position()
            .map(|position| format!("{position} / {}", view.total))
    }

    #[must_use]
    pub fn shown(&self) -> Option<&ShownImage> {
        self.shown.as_ref()
    }

    /// # Errors
    ///
    /// Returns `ViewError` when the identity cannot be saved or the ledger
    /// cannot be read.
    pub async fn submit_intake(
        &mut self,
        service: &SurveyService,
        draft: &IdentityDraft,
    ) -> Result<IntakeOutcome, ViewError> {
        match service.submit_intake(&mut self.session, draft).await {
            Ok(()) => {}
            Err(SurveyError::Identity(err)) => return Ok(IntakeOutcome::Warning(err.to_string())),
            Err(err) => {
                warn!(error = %err, "intake submission failed");
                return Err(view_error(&err));
            }
        }
        self.load_current(service)?;
        Ok(IntakeOutcome::Accepted)
    }

    /// Retry reading the ledger after a failed resumption.
    ///
    /// # Errors
    ///
    /// Returns `ViewError::Storage` if the ledger is still unreachable.
    pub async fn retry_resume(&mut self, service: &SurveyService) -> Result<(), ViewError> {
        service.resume(&mut self.session).await.map_err(|err| {
            warn!(error = %err, "resumption failed");
            view_error(&err)
        })?;
        self.load_current(service)
    }

    /// # Errors
    ///
    /// Returns `ViewError` if the rating cannot be recorded or the next image
    /// cannot be read.
    pub fn rate(&mut self, service: &SurveyService, rating: Rating) -> Result<(), ViewError> {
        service.rate(&mut self.session, rating).map_err(|err| {
            warn!(error = %err, "rating failed");
            view_error(&err)
        })?;
        self.load_current(service)
    }

    fn load_current(&mut self, service: &SurveyService) -> Result<(), ViewError> {
        let Some(filename) = self.session.current_image().map(str::to_string) else {
            self.shown = None;
            return Ok(());
        };
        if self.shown.as_ref().is_some_and(|shown| shown.filename == filename) {
            return Ok(());
        }
        let bytes = match service.load_image(&self.session, &filename) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, filename = %filename, "image load failed");
                self.shown = None;
                return Err(ViewError::Image);
            }
        };
        self.shown = Some(ShownImage {
            src: image_data_uri(&filename, &bytes),
            filename,
        });
        Ok(())
    }
}

/// Open the respondent's session and load the first image.
///
/// A ledger failure during resumption is reported as an error; the
/// caller retries by opening again.
///
/// # Errors
///
/// Returns `ViewError::Storage` for client store, image source or ledger
/// failures.
pub async fn open_survey(service: &SurveyService) -> Result<SurveyVm, ViewError> {
    let session = service.open_session().await.map_err(|err| {
        warn!(error = %err, "could not open survey session");
        view_error(&err)
    })?;
    SurveyVm::new(service, session)
}
