mod image_vm;
mod intake_vm;
mod survey_vm;

pub use image_vm::{image_data_uri, image_mime};
pub use intake_vm::{
    AGE_GROUP_PLACEHOLDER, GENDER_PLACEHOLDER, IntakeForm, UNSELECTED, age_group_options,
    gender_options,
};
pub use survey_vm::{IntakeOutcome, ShownImage, SurveyVm, open_survey};
