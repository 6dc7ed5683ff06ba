use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::identity::RespondentIdentity;
use crate::model::ids::SetId;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RatingError {
    #[error("rating must be between 1 and 5, got {0}")]
    OutOfRange(i64),
    #[error("rating is not a number: {0:?}")]
    Unparseable(String),
}

//
// ─── RATING ───────────────────────────────────────────────────────────────────
//

/// Desirability rating on a 1-5 scale.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Every representable rating, lowest first. Drives the rating buttons.
    pub const ALL: [Rating; 5] = [Rating(1), Rating(2), Rating(3), Rating(4), Rating(5)];

    /// # Errors
    ///
    /// Returns `RatingError::OutOfRange` unless `1 <= value <= 5`.
    pub fn new(value: u8) -> Result<Self, RatingError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(RatingError::OutOfRange(i64::from(value)))
        }
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rating({})", self.0)
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl FromStr for Rating {
    type Err = RatingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let value: i64 = trimmed
            .parse()
            .map_err(|_| RatingError::Unparseable(trimmed.to_string()))?;
        let small = u8::try_from(value).map_err(|_| RatingError::OutOfRange(value))?;
        Self::new(small)
    }
}

//
// ─── RATING EVENT ─────────────────────────────────────────────────────────────
//

/// One submitted rating, ready to be appended to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingEvent {
    pub recorded_at: DateTime<Utc>,
    pub identity: RespondentIdentity,
    pub set_id: SetId,
    pub filename: String,
    pub rating: Rating,
}

impl RatingEvent {
    #[must_use]
    pub fn new(
        recorded_at: DateTime<Utc>,
        identity: RespondentIdentity,
        set_id: SetId,
        filename: impl Into<String>,
        rating: Rating,
    ) -> Self {
        Self {
            recorded_at,
            identity,
            set_id,
            filename: filename.into(),
            rating,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_one_through_five_are_ratings() {
        assert!(Rating::new(0).is_err());
        assert_eq!(Rating::new(1).unwrap().value(), 1);
        assert_eq!(Rating::new(5).unwrap().value(), 5);
        assert!(matches!(Rating::new(6), Err(RatingError::OutOfRange(6))));
    }

    #[test]
    fn parses_ledger_cells() {
        assert_eq!(" 4 ".parse::<Rating>().unwrap(), Rating::new(4).unwrap());
        assert!(matches!("rating".parse::<Rating>(), Err(RatingError::Unparseable(_))));
        assert!(matches!("-1".parse::<Rating>(), Err(RatingError::OutOfRange(-1))));
        assert!(matches!("300".parse::<Rating>(), Err(RatingError::OutOfRange(300))));
    }

    #[test]
    fn all_is_ascending() {
        let values: Vec<u8> = Rating::ALL.iter().map(|r| r.value()).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5]);
    }
}
