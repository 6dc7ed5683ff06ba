mod identity;
mod ids;
mod image_set;
pub mod ledger;
mod progress;
mod rating;

pub use ids::{ParseIdError, SetId};
pub use identity::{AgeGroup, Gender, IdentityDraft, IdentityError, RespondentIdentity};
pub use image_set::{ImageOrder, ImageSet, IMAGE_EXTENSIONS, is_image_file};
pub use ledger::{LEDGER_COLUMNS, LedgerRowView};
pub use progress::SessionProgress;
pub use rating::{Rating, RatingError, RatingEvent};
