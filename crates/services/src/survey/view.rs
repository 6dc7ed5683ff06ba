use super::machine::{SurveyPhase, SurveySession};

/// Presentation-agnostic progress snapshot.
///
/// No pre-formatted strings; the UI builds captions from these numbers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyProgressView {
    pub phase: SurveyPhase,
    /// Images rated so far in presentation order (the current index).
    pub answered: usize,
    pub total: usize,
    /// `answered / total`, clamped to `0.0..=1.0`.
    pub fraction: f64,
}

impl SurveyProgressView {
    #[must_use]
    pub fn from_session(session: &SurveySession) -> Self {
        let total = session.total();
        let answered = session.progress().current_index().min(total);
        Self {
            phase: session.phase(),
            answered,
            total,
            fraction: session.progress().fraction(total),
        }
    }

    /// One-based position of the image on screen, if one is shown.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        (self.phase == SurveyPhase::Rating && self.answered < self.total).then_some(self.answered + 1)
    }
}
