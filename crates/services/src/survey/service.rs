use std::sync::Arc;

use storage::repository::RatingLedger;
use survey_core::model::{IdentityDraft, ImageSet, Rating, RatingEvent, SetId};
use tracing::{debug, info};

use super::machine::{SurveyPhase, SurveySession};
use crate::Clock;
use crate::error::SurveyError;
use crate::identity_service::IdentityStore;
use crate::image_set_service::ImageSetService;
use crate::write_pipeline::{JobId, WritePipeline};

/// When rating events are handed to the write pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// One job per rating, submitted as soon as it is recorded.
    #[default]
    PerRating,
    /// All of a session's ratings in one batch when the session completes.
    OnCompletion,
}

impl WriteMode {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "per-rating" | "per_rating" | "rating" => Some(Self::PerRating),
            "on-completion" | "on_completion" | "completion" => Some(Self::OnCompletion),
            _ => None,
        }
    }
}

/// Result of rating the current image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatedImage {
    pub event: RatingEvent,
    /// The write job carrying this rating, once one was submitted.
    pub job_id: Option<JobId>,
    pub is_complete: bool,
}

/// Orchestrates identity, set assignment, resumption and writes around a
/// `SurveySession`.
#[derive(Clone)]
pub struct SurveyService {
    clock: Clock,
    ledger: Arc<dyn RatingLedger>,
    identities: IdentityStore,
    image_sets: ImageSetService,
    pipeline: Arc<WritePipeline>,
    write_mode: WriteMode,
}

impl SurveyService {
    #[must_use]
    pub fn new(
        clock: Clock,
        ledger: Arc<dyn RatingLedger>,
        identities: IdentityStore,
        image_sets: ImageSetService,
        pipeline: Arc<WritePipeline>,
    ) -> Self {
        Self {
            clock,
            ledger,
            identities,
            image_sets,
            pipeline,
            write_mode: WriteMode::default(),
        }
    }

    #[must_use]
    pub fn with_write_mode(mut self, write_mode: WriteMode) -> Self {
        self.write_mode = write_mode;
        self
    }

    #[must_use]
    pub fn write_mode(&self) -> WriteMode {
        self.write_mode
    }

    #[must_use]
    pub fn identities(&self) -> &IdentityStore {
        &self.identities
    }

    #[must_use]
    pub fn image_sets(&self) -> &ImageSetService {
        &self.image_sets
    }

    /// The respondent's set: the stored assignment when it is still valid,
    /// otherwise a fresh draw that is persisted immediately.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the client store fails.
    pub fn assigned_set(&self) -> Result<SetId, SurveyError> {
        if let Some(set_id) = self.identities.set_id()? {
            if self.image_sets.contains(set_id) {
                return Ok(set_id);
            }
            info!(set_id = %set_id, "stored set assignment is out of range, reassigning");
        }
        let set_id = self.image_sets.select_set();
        self.identities.set_set_id(set_id)?;
        info!(set_id = %set_id, "assigned image set");
        Ok(set_id)
    }

    /// Open a session: resolve the set, fix the image order, and resume
    /// from the ledger when the respondent is already known.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::ClientStoreNotReady` before the client store
    /// has loaded, or `SurveyError` if the client store, image source or
    /// ledger fails.
    pub async fn open_session(&self) -> Result<SurveySession, SurveyError> {
        if !self.identities.ready() {
            return Err(SurveyError::ClientStoreNotReady);
        }
        let set_id = self.assigned_set()?;
        let images: ImageSet = self.image_sets.list_images(set_id)?;
        let identity = self.identities.identity()?;

        let mut session = SurveySession::open(images, identity);
        info!(
            set_id = %set_id,
            images = session.total(),
            phase = %session.phase(),
            "survey session opened"
        );
        self.resume(&mut session).await?;
        Ok(session)
    }

    /// Validate and persist the intake form, then resume.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Identity` for an incomplete form (the session is
    /// unchanged), or storage errors from persisting and resuming.
    pub async fn submit_intake(
        &self,
        session: &mut SurveySession,
        draft: &IdentityDraft,
    ) -> Result<(), SurveyError> {
        let mut next = session.clone();
        let identity = next.submit_intake(draft)?.clone();
        self.identities.set_identity(&identity)?;
        *session = next;
        info!(set_id = %session.set_id(), "respondent registered");
        self.resume(session).await
    }

    /// Rebuild progress from the ledger if the session is waiting for it.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the ledger cannot be read; the
    /// session stays in `Resuming` so the call can be retried.
    pub async fn resume(&self, session: &mut SurveySession) -> Result<(), SurveyError> {
        if session.phase() != SurveyPhase::Resuming {
            return Ok(());
        }
        let rows = self.ledger.get_all_rows().await?;
        session.apply_resumption(&rows)?;
        info!(
            set_id = %session.set_id(),
            rated = session.progress().ratings().len(),
            position = session.progress().current_index(),
            phase = %session.phase(),
            "progress resumed from ledger"
        );
        Ok(())
    }

    /// Record a rating for the displayed image and hand it to the write
    /// pipeline without waiting for the ledger. The session only advances
    /// once the write was queued.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::WrongPhase` outside `Rating`, or
    /// `SurveyError::PipelineClosed` after shutdown. The session is
    /// unchanged on error.
    pub fn rate(&self, session: &mut SurveySession, rating: Rating) -> Result<RatedImage, SurveyError> {
        let mut next = session.clone();
        let event = next.rate(rating, self.clock.now())?;

        let job_id = match self.write_mode {
            WriteMode::PerRating => Some(self.pipeline.submit(vec![event.to_row()])?),
            WriteMode::OnCompletion => {
                next.defer(event.clone());
                if next.is_complete() {
                    let rows = next
                        .take_deferred()
                        .iter()
                        .map(RatingEvent::to_row)
                        .collect();
                    Some(self.pipeline.submit(rows)?)
                } else {
                    None
                }
            }
        };
        *session = next;
        debug!(filename = %event.filename, rating = %rating, "rating recorded");

        if session.is_complete() {
            info!(set_id = %session.set_id(), total = session.total(), "survey complete");
        }
        Ok(RatedImage {
            event,
            job_id,
            is_complete: session.is_complete(),
        })
    }

    /// Bytes of an image in the session's set.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the image cannot be read.
    pub fn load_image(&self, session: &SurveySession, filename: &str) -> Result<Vec<u8>, SurveyError> {
        self.image_sets.load_image(session.set_id(), filename)
    }
}
