use std::collections::BTreeMap;

use storage::repository::LedgerRow;
use survey_core::model::{LedgerRowView, Rating, RespondentIdentity, SetId};
use tracing::trace;

/// Collect this respondent's earlier ratings for `set_id` from a full ledger
/// scan. Later rows win, so re-rated images report their latest value.
///
/// Short rows and rows whose rating cell does not parse (including a header
/// row) are skipped.
#[must_use]
pub fn ratings_from_ledger(
    rows: &[LedgerRow],
    identity: &RespondentIdentity,
    set_id: SetId,
) -> BTreeMap<String, Rating> {
    let mut ratings = BTreeMap::new();
    for (line, cells) in rows.iter().enumerate() {
        let Some(view) = LedgerRowView::new(cells) else {
            trace!(line, cells = cells.len(), "skipping short ledger row");
            continue;
        };
        if !view.belongs_to(identity, set_id) {
            continue;
        }
        match view.rating() {
            Ok(rating) => {
                ratings.insert(view.filename().to_string(), rating);
            }
            Err(err) => trace!(line, error = %err, "skipping ledger row with bad rating"),
        }
    }
    ratings
}
