use std::fmt;

use chrono::{DateTime, Utc};
use storage::repository::LedgerRow;
use survey_core::model::{
    IdentityDraft, ImageSet, Rating, RatingEvent, RespondentIdentity, SessionProgress, SetId,
};

use super::resume::ratings_from_ledger;
use crate::error::SurveyError;

//
// ─── PHASE ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurveyPhase {
    /// The assigned set has no images. Terminal.
    NoImages,
    /// Waiting for name, age group and gender.
    Intake,
    /// Identity known; progress not yet rebuilt from the ledger.
    Resuming,
    Rating,
    /// Every image rated. Terminal.
    Complete,
}

impl SurveyPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SurveyPhase::NoImages | SurveyPhase::Complete)
    }
}

impl fmt::Display for SurveyPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurveyPhase::NoImages => "no-images",
            SurveyPhase::Intake => "intake",
            SurveyPhase::Resuming => "resuming",
            SurveyPhase::Rating => "rating",
            SurveyPhase::Complete => "complete",
        };
        f.write_str(name)
    }
}

//
// ─── SESSION ──────────────────────────────────────────────────────────────────
//

/// One respondent's pass through their image set.
///
/// The image order is fixed when the session opens and reused for every
/// render. All transitions are synchronous; I/O lives in `SurveyService`.
#[derive(Debug, Clone)]
pub struct SurveySession {
    images: ImageSet,
    identity: Option<RespondentIdentity>,
    progress: SessionProgress,
    phase: SurveyPhase,
    pending: Vec<RatingEvent>,
}

impl SurveySession {
    /// Open a session over an ordered image set. An empty set is terminal
    /// whether or not the respondent is known.
    #[must_use]
    pub fn open(images: ImageSet, identity: Option<RespondentIdentity>) -> Self {
        let phase = if images.is_empty() {
            SurveyPhase::NoImages
        } else if identity.is_some() {
            SurveyPhase::Resuming
        } else {
            SurveyPhase::Intake
        };
        Self {
            images,
            identity,
            progress: SessionProgress::new(),
            phase,
            pending: Vec::new(),
        }
    }

    #[must_use]
    pub fn phase(&self) -> SurveyPhase {
        self.phase
    }

    #[must_use]
    pub fn set_id(&self) -> SetId {
        self.images.set_id()
    }

    #[must_use]
    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    #[must_use]
    pub fn identity(&self) -> Option<&RespondentIdentity> {
        self.identity.as_ref()
    }

    #[must_use]
    pub fn progress(&self) -> &SessionProgress {
        &self.progress
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.images.len()
    }

    /// Filename of the image awaiting a rating.
    #[must_use]
    pub fn current_image(&self) -> Option<&str> {
        if self.phase != SurveyPhase::Rating {
            return None;
        }
        self.images.get(self.progress.current_index())
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SurveyPhase::Complete
    }

    /// Validate the intake form and move to `Resuming`. On error nothing
    /// changes.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::WrongPhase` outside `Intake` and
    /// `SurveyError::Identity` for an incomplete form.
    pub fn submit_intake(&mut self, draft: &IdentityDraft) -> Result<&RespondentIdentity, SurveyError> {
        self.expect_phase(SurveyPhase::Intake, "submit intake")?;
        let identity = draft.validate()?;
        self.phase = SurveyPhase::Resuming;
        Ok(self.identity.insert(identity))
    }

    /// Rebuild progress from a full ledger scan and move to `Rating` or
    /// `Complete`. Runs at most once; later calls are no-ops.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::WrongPhase` before intake or for an empty set.
    pub fn apply_resumption(&mut self, rows: &[LedgerRow]) -> Result<(), SurveyError> {
        match self.phase {
            SurveyPhase::Rating | SurveyPhase::Complete => return Ok(()),
            SurveyPhase::Resuming => {}
            phase => {
                return Err(SurveyError::WrongPhase {
                    action: "resume",
                    phase,
                });
            }
        }
        let Some(identity) = self.identity.as_ref() else {
            return Err(SurveyError::WrongPhase {
                action: "resume",
                phase: self.phase,
            });
        };

        let ratings = ratings_from_ledger(rows, identity, self.images.set_id());
        self.progress = SessionProgress::resume(self.images.images(), ratings);
        self.phase = self.phase_after_progress();
        Ok(())
    }

    /// Rate the displayed image and advance by one.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::WrongPhase` unless the session is in `Rating`.
    pub fn rate(&mut self, rating: Rating, at: DateTime<Utc>) -> Result<RatingEvent, SurveyError> {
        self.expect_phase(SurveyPhase::Rating, "rate")?;
        let (Some(identity), Some(filename)) = (
            self.identity.clone(),
            self.images
                .get(self.progress.current_index())
                .map(str::to_string),
        ) else {
            return Err(SurveyError::WrongPhase {
                action: "rate",
                phase: self.phase,
            });
        };

        self.progress.record(&filename, rating);
        self.phase = self.phase_after_progress();
        Ok(RatingEvent::new(at, identity, self.images.set_id(), filename, rating))
    }

    /// Hold an event until the session completes.
    pub fn defer(&mut self, event: RatingEvent) {
        self.pending.push(event);
    }

    /// Take every deferred event.
    pub fn take_deferred(&mut self) -> Vec<RatingEvent> {
        std::mem::take(&mut self.pending)
    }

    fn phase_after_progress(&self) -> SurveyPhase {
        if self.progress.is_complete(self.images.len()) {
            SurveyPhase::Complete
        } else {
            SurveyPhase::Rating
        }
    }

    fn expect_phase(&self, expected: SurveyPhase, action: &'static str) -> Result<(), SurveyError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SurveyError::WrongPhase {
                action,
                phase: self.phase,
            })
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
