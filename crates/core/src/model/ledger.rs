//! Row layout of the rating ledger.
//!
//! Each submitted rating becomes one row of seven cells:
//! `timestamp, name, age_group, gender, set_id, filename, rating`.

use crate::model::identity::RespondentIdentity;
use crate::model::ids::SetId;
use crate::model::rating::{Rating, RatingError, RatingEvent};
use crate::time::format_survey_timestamp;

/// Minimum number of cells a row needs before any column is read.
pub const LEDGER_COLUMNS: usize = 7;

const COL_TIMESTAMP: usize = 0;
const COL_NAME: usize = 1;
const COL_AGE_GROUP: usize = 2;
const COL_GENDER: usize = 3;
const COL_SET_ID: usize = 4;
const COL_FILENAME: usize = 5;
const COL_RATING: usize = 6;

/// Header written when a ledger is created empty.
#[must_use]
pub fn header_row() -> Vec<String> {
    ["timestamp", "name", "age_group", "gender", "set_id", "filename", "rating"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

impl RatingEvent {
    /// Encode the event as a ledger row.
    #[must_use]
    pub fn to_row(&self) -> Vec<String> {
        vec![
            format_survey_timestamp(self.recorded_at),
            self.identity.name().to_string(),
            self.identity.age_group().label().to_string(),
            self.identity.gender().label().to_string(),
            self.set_id.to_string(),
            self.filename.clone(),
            self.rating.to_string(),
        ]
    }
}

/// Borrowed, length-checked view over one ledger row.
#[derive(Debug, Clone, Copy)]
pub struct LedgerRowView<'a> {
    cells: &'a [String],
}

impl<'a> LedgerRowView<'a> {
    /// Returns `None` for rows shorter than [`LEDGER_COLUMNS`].
    #[must_use]
    pub fn new(cells: &'a [String]) -> Option<Self> {
        (cells.len() >= LEDGER_COLUMNS).then_some(Self { cells })
    }

    #[must_use]
    pub fn timestamp(&self) -> &'a str {
        self.cells[COL_TIMESTAMP].as_str()
    }

    #[must_use]
    pub fn filename(&self) -> &'a str {
        self.cells[COL_FILENAME].trim()
    }

    /// Whether the row was written by this respondent for this set.
    #[must_use]
    pub fn belongs_to(&self, identity: &RespondentIdentity, set_id: SetId) -> bool {
        self.cells[COL_NAME].trim() == identity.name()
            && self.cells[COL_AGE_GROUP].trim() == identity.age_group().label()
            && self.cells[COL_GENDER].trim() == identity.gender().label()
            && self.cells[COL_SET_ID]
                .parse::<SetId>()
                .is_ok_and(|id| id == set_id)
    }

    /// # Errors
    ///
    /// Returns `RatingError` when the rating cell is not an integer in 1..=5.
    pub fn rating(&self) -> Result<Rating, RatingError> {
        self.cells[COL_RATING].parse()
    }
}
