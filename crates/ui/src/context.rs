use std::sync::Arc;

use services::{AppServices, SurveyService};

pub trait UiApp: Send + Sync {
    fn title(&self) -> String;
    fn services(&self) -> AppServices;
}

#[derive(Clone)]
pub struct AppContext {
    title: String,
    services: AppServices,
}

impl AppContext {
    #[must_use]
    pub fn new(app: &Arc<dyn UiApp>) -> Self {
        Self {
            title: app.title(),
            services: app.services(),
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn survey(&self) -> Arc<SurveyService> {
        self.services.survey()
    }

    #[must_use]
    pub fn services(&self) -> AppServices {
        self.services.clone()
    }
}

// This context is provided by the application composition root (e.g. `crates/app`).

/// Build an `AppContext` from a UI-facing app implementation.
#[must_use]
pub fn build_app_context(app: &Arc<dyn UiApp>) -> AppContext {
    AppContext::new(app)
}
