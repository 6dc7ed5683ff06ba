use serde::{Deserialize, Serialize};
use thiserror::Error;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons an intake form submission is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IdentityError {
    #[error("please enter your name")]
    EmptyName,
    #[error("please select your age group")]
    MissingAgeGroup,
    #[error("please select your gender")]
    MissingGender,
}

//
// ─── DEMOGRAPHICS ─────────────────────────────────────────────────────────────
//

/// Fixed, ordered list of age bands offered on the intake form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "Under 20")]
    Under20,
    #[serde(rename = "20-29")]
    Twenties,
    #[serde(rename = "30-39")]
    Thirties,
    #[serde(rename = "40-49")]
    Forties,
    #[serde(rename = "50-59")]
    Fifties,
    #[serde(rename = "60+")]
    SixtiesPlus,
}

impl AgeGroup {
    pub const ALL: [AgeGroup; 6] = [
        AgeGroup::Under20,
        AgeGroup::Twenties,
        AgeGroup::Thirties,
        AgeGroup::Forties,
        AgeGroup::Fifties,
        AgeGroup::SixtiesPlus,
    ];

    /// Label shown on the form and written to the ledger.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::Under20 => "Under 20",
            AgeGroup::Twenties => "20-29",
            AgeGroup::Thirties => "30-39",
            AgeGroup::Forties => "40-49",
            AgeGroup::Fifties => "50-59",
            AgeGroup::SixtiesPlus => "60+",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|group| group.label() == label.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "Male")]
    Male,
    #[serde(rename = "Female")]
    Female,
    #[serde(rename = "Other")]
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|gender| gender.label() == label.trim())
    }
}

//
// ─── IDENTITY ─────────────────────────────────────────────────────────────────
//

/// Who is answering the survey.
///
/// There is no globally unique respondent id: ledger rows are matched on the
/// (name, age group, gender) triple, so two respondents giving identical
/// answers share progress.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "IdentityRecord", into = "IdentityRecord")]
pub struct RespondentIdentity {
    name: String,
    age_group: AgeGroup,
    gender: Gender,
}

impl RespondentIdentity {
    /// Build an identity, trimming the name.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmptyName` if the name is blank after trimming.
    pub fn new(
        name: impl Into<String>,
        age_group: AgeGroup,
        gender: Gender,
    ) -> Result<Self, IdentityError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(IdentityError::EmptyName);
        }
        Ok(Self {
            name: trimmed.to_string(),
            age_group,
            gender,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn age_group(&self) -> AgeGroup {
        self.age_group
    }

    #[must_use]
    pub fn gender(&self) -> Gender {
        self.gender
    }
}

#[derive(Clone, Serialize, Deserialize)]
struct IdentityRecord {
    name: String,
    age_group: AgeGroup,
    gender: Gender,
}

impl TryFrom<IdentityRecord> for RespondentIdentity {
    type Error = IdentityError;

    fn try_from(record: IdentityRecord) -> Result<Self, Self::Error> {
        Self::new(record.name, record.age_group, record.gender)
    }
}

impl From<RespondentIdentity> for IdentityRecord {
    fn from(identity: RespondentIdentity) -> Self {
        Self {
            name: identity.name,
            age_group: identity.age_group,
            gender: identity.gender,
        }
    }
}

//
// ─── INTAKE DRAFT ─────────────────────────────────────────────────────────────
//

/// Unvalidated intake form contents. `None` is the "not selected" sentinel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityDraft {
    pub name: String,
    pub age_group: Option<AgeGroup>,
    pub gender: Option<Gender>,
}

impl IdentityDraft {
    #[must_use]
    pub fn new(name: impl Into<String>, age_group: Option<AgeGroup>, gender: Option<Gender>) -> Self {
        Self {
            name: name.into(),
            age_group,
            gender,
        }
    }

    /// Validate the draft into an identity.
    ///
    /// # Errors
    ///
    /// Returns the first failing field: empty name, then age group, then gender.
    pub fn validate(&self) -> Result<RespondentIdentity, IdentityError> {
        if self.name.trim().is_empty() {
            return Err(IdentityError::EmptyName);
        }
        let age_group = self.age_group.ok_or(IdentityError::MissingAgeGroup)?;
        let gender = self.gender.ok_or(IdentityError::MissingGender)?;
        RespondentIdentity::new(self.name.as_str(), age_group, gender)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
