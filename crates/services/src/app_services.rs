use std::sync::Arc;

use storage::repository::Storage;
use tokio::sync::Mutex;

use crate::Clock;
use crate::config::SurveyConfig;
use crate::error::AppServicesError;
use crate::identity_service::IdentityStore;
use crate::image_set_service::ImageSetService;
use crate::survey::SurveyService;
use crate::write_pipeline::{ShutdownPolicy, WritePipeline, WriteReport, WriteReports};

/// Assembles app-facing services over a `Storage` aggregate.
#[derive(Clone)]
pub struct AppServices {
    survey: Arc<SurveyService>,
    pipeline: Arc<WritePipeline>,
    reports: Arc<Mutex<WriteReports>>,
}

impl AppServices {
    /// Wire services and start the write pipeline on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Settings` if the survey has no image sets
    /// or the pipeline allows no in-flight writes.
    pub fn from_storage(
        storage: &Storage,
        config: &SurveyConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        if config.set_count == 0 {
            return Err(AppServicesError::Settings("set count must be at least 1".into()));
        }
        if config.pipeline.max_in_flight == 0 {
            return Err(AppServicesError::Settings(
                "max in-flight writes must be at least 1".into(),
            ));
        }

        let (pipeline, reports) = WritePipeline::spawn(Arc::clone(&storage.ledger), config.pipeline);
        let pipeline = Arc::new(pipeline);
        let identities = IdentityStore::new(Arc::clone(&storage.client_store));
        let image_sets = ImageSetService::new(
            Arc::clone(&storage.images),
            config.images_root.clone(),
            config.set_count,
        )
        .with_order(config.order);

        let survey = Arc::new(
            SurveyService::new(
                clock,
                Arc::clone(&storage.ledger),
                identities,
                image_sets,
                Arc::clone(&pipeline),
            )
            .with_write_mode(config.write_mode),
        );

        Ok(Self {
            survey,
            pipeline,
            reports: Arc::new(Mutex::new(reports)),
        })
    }

    #[must_use]
    pub fn survey(&self) -> Arc<SurveyService> {
        Arc::clone(&self.survey)
    }

    /// Wait for the next finished write. Returns `None` once the pipeline
    /// has stopped and every report was delivered.
    pub async fn next_report(&self) -> Option<WriteReport> {
        self.reports.lock().await.recv().await
    }

    /// Stop the write pipeline.
    pub async fn shutdown(&self, policy: ShutdownPolicy) {
        self.pipeline.shutdown(policy).await;
    }
}
