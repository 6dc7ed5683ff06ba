use std::sync::Arc;

use storage::client_store::ClientStore;
use survey_core::model::{RespondentIdentity, SetId};
use tracing::{debug, warn};

use crate::error::SurveyError;

/// Client-store key holding the respondent record as JSON.
pub const RESPONDENT_KEY: &str = "respondent";
/// Client-store key holding the respondent's set assignment.
pub const SET_ID_KEY: &str = "set_id";

/// Persists who the respondent is and which set they were assigned.
///
/// Records that cannot be parsed read as absent, so a corrupt cookie sends the
/// respondent back to intake instead of failing the session.
#[derive(Clone)]
pub struct IdentityStore {
    store: Arc<dyn ClientStore>,
}

impl IdentityStore {
    #[must_use]
    pub fn new(store: Arc<dyn ClientStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn ready(&self) -> bool {
        self.store.ready()
    }

    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the client store cannot be read.
    pub fn identity(&self) -> Result<Option<RespondentIdentity>, SurveyError> {
        let Some(raw) = self.store.get(RESPONDENT_KEY)? else {
            return Ok(None);
        };
        match serde_json::from_str::<RespondentIdentity>(&raw) {
            Ok(identity) => Ok(Some(identity)),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable respondent record");
                Ok(None)
            }
        }
    }

    /// Persist and commit the identity.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError` if encoding fails or the store cannot be saved.
    pub fn set_identity(&self, identity: &RespondentIdentity) -> Result<(), SurveyError> {
        let raw =
            serde_json::to_string(identity).map_err(|e| SurveyError::Record(e.to_string()))?;
        self.store.set(RESPONDENT_KEY, &raw)?;
        self.store.save()?;
        debug!("respondent record saved");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the client store cannot be read.
    pub fn set_id(&self) -> Result<Option<SetId>, SurveyError> {
        let Some(raw) = self.store.get(SET_ID_KEY)? else {
            return Ok(None);
        };
        match raw.parse::<SetId>() {
            Ok(id) => Ok(Some(id)),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable set assignment");
                Ok(None)
            }
        }
    }

    /// Persist and commit the set assignment.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the store cannot be saved.
    pub fn set_set_id(&self, set_id: SetId) -> Result<(), SurveyError> {
        self.store.set(SET_ID_KEY, &set_id.to_string())?;
        self.store.save()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::client_store::InMemoryClientStore;
    use survey_core::model::{AgeGroup, Gender};

    fn store() -> (Arc<InMemoryClientStore>, IdentityStore) {
        let raw = Arc::new(InMemoryClientStore::new());
        let ids = IdentityStore::new(raw.clone());
        (raw, ids)
    }

    #[test]
    fn identity_round_trips_and_is_committed() {
        let (raw, ids) = store();
        assert_eq!(ids.identity().unwrap(), None);

        let identity = RespondentIdentity::new("Aiko", AgeGroup::Twenties, Gender::Female).unwrap();
        ids.set_identity(&identity).unwrap();

        assert_eq!(ids.identity().unwrap(), Some(identity));
        assert!(raw.committed(RESPONDENT_KEY).unwrap().is_some());
    }

    #[test]
    fn corrupt_records_read_as_absent() {
        let (raw, ids) = store();
        raw.set(RESPONDENT_KEY, "{not json").unwrap();
        raw.set(SET_ID_KEY, "zero").unwrap();
        assert_eq!(ids.identity().unwrap(), None);
        assert_eq!(ids.set_id().unwrap(), None);
    }

    #[test]
    fn blank_name_in_record_is_rejected() {
        let (raw, ids) = store();
        raw.set(
            RESPONDENT_KEY,
            r#"{"name":"  ","age_group":"20-29","gender":"Male"}"#,
        )
        .unwrap();
        assert_eq!(ids.identity().unwrap(), None);
    }

    #[test]
    fn set_assignment_persists() {
        let (raw, ids) = store();
        ids.set_set_id(SetId::new(3)).unwrap();
        assert_eq!(ids.set_id().unwrap(), Some(SetId::new(3)));
        assert_eq!(raw.committed(SET_ID_KEY).unwrap().as_deref(), Some("3"));
    }
}
