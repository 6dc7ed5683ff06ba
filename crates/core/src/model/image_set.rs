use std::path::Path;

use crate::model::ids::SetId;

/// File extensions (lowercase) recognised as images.
pub const IMAGE_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

/// Case-insensitive check against [`IMAGE_EXTENSIONS`].
#[must_use]
pub fn is_image_file(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// How images within a set are presented.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageOrder {
    /// Lexicographic filename order.
    Sorted,
    /// Random permutation drawn once per session.
    #[default]
    Shuffled,
}

impl ImageOrder {
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "sorted" => Some(Self::Sorted),
            "shuffled" | "shuffle" => Some(Self::Shuffled),
            _ => None,
        }
    }
}

/// The images assigned to a respondent, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSet {
    set_id: SetId,
    images: Vec<String>,
}

impl ImageSet {
    /// Build a set from an already ordered list of filenames.
    #[must_use]
    pub fn new(set_id: SetId, images: Vec<String>) -> Self {
        Self { set_id, images }
    }

    /// Build a set from a raw directory listing: non-images are dropped and
    /// the rest sorted lexicographically.
    #[must_use]
    pub fn from_listing(set_id: SetId, files: impl IntoIterator<Item = String>) -> Self {
        let mut images: Vec<String> = files.into_iter().filter(|f| is_image_file(f)).collect();
        images.sort();
        Self { set_id, images }
    }

    #[must_use]
    pub fn set_id(&self) -> SetId {
        self.set_id
    }

    #[must_use]
    pub fn images(&self) -> &[String] {
        &self.images
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.images.get(index).map(String::as_str)
    }
}
