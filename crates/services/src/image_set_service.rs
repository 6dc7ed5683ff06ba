use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;
use rand::rng;
use rand::seq::SliceRandom;
use storage::images::ImageSource;
use survey_core::model::{ImageOrder, ImageSet, SetId};
use tracing::debug;

use crate::error::SurveyError;

/// Resolves set assignments and the images that belong to each set.
///
/// With a single set, images sit directly in `root`. With several sets,
/// set `n` lives in `root/set<n>`.
#[derive(Clone)]
pub struct ImageSetService {
    images: Arc<dyn ImageSource>,
    root: PathBuf,
    set_count: u32,
    order: ImageOrder,
}

impl ImageSetService {
    /// `set_count` is clamped to at least one set.
    #[must_use]
    pub fn new(images: Arc<dyn ImageSource>, root: impl Into<PathBuf>, set_count: u32) -> Self {
        Self {
            images,
            root: root.into(),
            set_count: set_count.max(1),
            order: ImageOrder::default(),
        }
    }

    #[must_use]
    pub fn with_order(mut self, order: ImageOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub fn set_count(&self) -> u32 {
        self.set_count
    }

    #[must_use]
    pub fn order(&self) -> ImageOrder {
        self.order
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `set_id` names one of the configured sets.
    #[must_use]
    pub fn contains(&self, set_id: SetId) -> bool {
        (1..=self.set_count).contains(&set_id.value())
    }

    /// Draw a set uniformly from `1..=set_count`.
    #[must_use]
    pub fn select_set(&self) -> SetId {
        SetId::new(rng().random_range(1..=self.set_count))
    }

    #[must_use]
    pub fn set_dir(&self, set_id: SetId) -> PathBuf {
        if self.set_count == 1 {
            self.root.clone()
        } else {
            self.root.join(format!("set{}", set_id.value()))
        }
    }

    /// List the set's images in presentation order. Shuffled sets are
    /// permuted on every call; callers keep the result for the session.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the directory cannot be read.
    pub fn list_images(&self, set_id: SetId) -> Result<ImageSet, SurveyError> {
        let dir = self.set_dir(set_id);
        let files = self.images.list_files(&dir)?;
        let set = ImageSet::from_listing(set_id, files);
        debug!(set_id = %set_id, images = set.len(), dir = %dir.display(), "listed image set");

        match self.order {
            ImageOrder::Sorted => Ok(set),
            ImageOrder::Shuffled => {
                let mut images = set.images().to_vec();
                images.shuffle(&mut rng());
                Ok(ImageSet::new(set_id, images))
            }
        }
    }

    /// Raw bytes of one image.
    ///
    /// # Errors
    ///
    /// Returns `SurveyError::Storage` if the file cannot be read.
    pub fn load_image(&self, set_id: SetId, filename: &str) -> Result<Vec<u8>, SurveyError> {
        Ok(self.images.read(&self.set_dir(set_id).join(filename))?)
    }
}
