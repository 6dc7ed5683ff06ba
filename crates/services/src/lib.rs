#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod identity_service;
pub mod image_set_service;
pub mod survey;
pub mod write_pipeline;

pub use survey_core::Clock;

pub use app_services::AppServices;
pub use config::SurveyConfig;
pub use error::{AppServicesError, SurveyError};
pub use identity_service::IdentityStore;
pub use image_set_service::ImageSetService;
pub use survey::{
    RatedImage, SurveyPhase, SurveyProgressView, SurveyService, SurveySession, WriteMode,
};
pub use write_pipeline::{
    JobId, PipelineConfig, RetryPolicy, ShutdownPolicy, WriteOutcome, WritePipeline, WriteReport,
    WriteReports,
};
