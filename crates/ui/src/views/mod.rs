mod complete;
mod intake;
mod rating;
mod state;
mod survey;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use complete::{CompletePanel, NoImagesPanel};
pub use intake::IntakePanel;
pub use rating::{ProgressBar, RatingPanel};
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use survey::SurveyView;
