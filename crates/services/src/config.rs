use std::path::PathBuf;

use survey_core::model::ImageOrder;

use crate::survey::WriteMode;
use crate::write_pipeline::PipelineConfig;

/// Survey behaviour that does not depend on which backends are used.
#[derive(Debug, Clone, PartialEq)]
pub struct SurveyConfig {
    pub images_root: PathBuf,
    pub set_count: u32,
    pub order: ImageOrder,
    pub write_mode: WriteMode,
    pub pipeline: PipelineConfig,
}

impl SurveyConfig {
    pub const DEFAULT_IMAGES_ROOT: &'static str = "images";
    pub const DEFAULT_SET_COUNT: u32 = 1;
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            images_root: PathBuf::from(Self::DEFAULT_IMAGES_ROOT),
            set_count: Self::DEFAULT_SET_COUNT,
            order: ImageOrder::default(),
            write_mode: WriteMode::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}
