mod machine;
mod resume;
mod service;
mod view;

pub use machine::{SurveyPhase, SurveySession};
pub use resume::ratings_from_ledger;
pub use service::{RatedImage, SurveyService, WriteMode};
pub use view::SurveyProgressView;
