use survey_core::model::{AgeGroup, Gender, IdentityDraft};

/// Select value meaning "nothing chosen yet".
pub const UNSELECTED: &str = "";
pub const AGE_GROUP_PLACEHOLDER: &str = "Select your age group";
pub const GENDER_PLACEHOLDER: &str = "Select your gender";

/// Raw intake form fields as typed/selected.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntakeForm {
    pub name: String,
    pub age_group: String,
    pub gender: String,
}

impl IntakeForm {
    /// Map select values to the draft; the sentinel and unknown labels
    /// become `None`.
    #[must_use]
    pub fn to_draft(&self) -> IdentityDraft {
        IdentityDraft::new(
            self.name.clone(),
            AgeGroup::from_label(&self.age_group),
            Gender::from_label(&self.gender),
        )
    }
}

#[must_use]
pub fn age_group_options() -> Vec<&'static str> {
    AgeGroup::ALL.iter().map(|group| group.label()).collect()
}

#[must_use]
pub fn gender_options() -> Vec<&'static str> {
    Gender::ALL.iter().map(|gender| gender.label()).collect()
}
