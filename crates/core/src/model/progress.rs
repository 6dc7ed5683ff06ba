use std::collections::BTreeMap;

use crate::model::rating::Rating;

/// Progress of one respondent through their image set.
///
/// `current_index` only moves forward: it is reconstructed once from the
/// ledger and then advanced by exactly one per recorded rating.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionProgress {
    current_index: usize,
    ratings: BTreeMap<String, Rating>,
}

impl SessionProgress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild progress from previously recorded ratings.
    ///
    /// The index points at the first image in `order` without a rating, or
    /// at `order.len()` when every image is rated. Ratings need not form a
    /// prefix of `order`.
    #[must_use]
    pub fn resume(order: &[String], ratings: BTreeMap<String, Rating>) -> Self {
        let current_index = order
            .iter()
            .position(|filename| !ratings.contains_key(filename))
            .unwrap_or(order.len());
        Self {
            current_index,
            ratings,
        }
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub fn ratings(&self) -> &BTreeMap<String, Rating> {
        &self.ratings
    }

    #[must_use]
    pub fn rating_for(&self, filename: &str) -> Option<Rating> {
        self.ratings.get(filename).copied()
    }

    #[must_use]
    pub fn is_complete(&self, total: usize) -> bool {
        self.current_index >= total
    }

    /// Completed fraction in `0.0..=1.0`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fraction(&self, total: usize) -> f64 {
        if total == 0 {
            return 1.0;
        }
        (self.current_index.min(total) as f64) / (total as f64)
    }

    /// Record a rating for the image at the current index and advance.
    pub fn record(&mut self, filename: &str, rating: Rating) {
        self.ratings.insert(filename.to_string(), rating);
        self.current_index += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_string()).collect()
    }

    fn r(v: u8) -> Rating {
        Rating::new(v).unwrap()
    }

    #[test]
    fn resume_points_at_first_unrated() {
        let images = order(&["a.jpg", "b.jpg", "c.jpg"]);
        let ratings = BTreeMap::from([("a.jpg".to_string(), r(3)), ("b.jpg".to_string(), r(5))]);
        let progress = SessionProgress::resume(&images, ratings);
        assert_eq!(progress.current_index(), 2);
        assert_eq!(progress.rating_for("a.jpg"), Some(r(3)));
        assert_eq!(progress.rating_for("b.jpg"), Some(r(5)));
        assert_eq!(progress.ratings().len(), 2);
    }

    #[test]
    fn resume_with_gap_stops_at_gap() {
        let images = order(&["a.jpg", "b.jpg", "c.jpg"]);
        let ratings = BTreeMap::from([("a.jpg".to_string(), r(1)), ("c.jpg".to_string(), r(2))]);
        assert_eq!(SessionProgress::resume(&images, ratings).current_index(), 1);
    }

    #[test]
    fn resume_all_rated_is_complete() {
        let images = order(&["a.jpg"]);
        let ratings = BTreeMap::from([("a.jpg".to_string(), r(4))]);
        let progress = SessionProgress::resume(&images, ratings);
        assert!(progress.is_complete(images.len()));
        assert!((progress.fraction(1) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn record_advances_by_one() {
        let mut progress = SessionProgress::new();
        progress.record("a.jpg", r(2));
        assert_eq!(progress.current_index(), 1);
        progress.record("a.jpg", r(4));
        assert_eq!(progress.current_index(), 2);
        assert_eq!(progress.rating_for("a.jpg"), Some(r(4)));
    }
}
