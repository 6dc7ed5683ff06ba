use std::path::Path;
use std::sync::Arc;

use dioxus::core::NoOpMutations;
use dioxus::prelude::*;
use dioxus_router::{Routable, Router};
use services::{AppServices, IdentityStore, SurveyConfig};
use storage::client_store::InMemoryClientStore;
use storage::images::InMemoryImageSource;
use storage::repository::{InMemoryLedger, LedgerRow, Storage};
use survey_core::model::{ImageOrder, RespondentIdentity};
use survey_core::time::fixed_clock;

use crate::context::{UiApp, build_app_context};
use crate::views::SurveyView;

#[derive(Clone)]
struct TestApp {
    services: AppServices,
}

impl UiApp for TestApp {
    fn title(&self) -> String {
        "Photo Survey".to_string()
    }

    fn services(&self) -> AppServices {
        self.services.clone()
    }
}

#[derive(Props, Clone)]
struct ViewHarnessProps {
    app: Arc<TestApp>,
}

impl PartialEq for ViewHarnessProps {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}

#[component]
fn ViewRouterHarness(props: ViewHarnessProps) -> Element {
    let app: Arc<dyn UiApp> = props.app.clone();
    use_context_provider(|| build_app_context(&app));
    rsx! { Router::<TestRoute> {} }
}

#[derive(Clone, Routable, PartialEq)]
#[rustfmt::skip]
enum TestRoute {
    #[route("/")]
    Root {},
}

#[component]
fn Root() -> Element {
    rsx! { SurveyView {} }
}

/// What the survey starts with.
#[derive(Default)]
pub struct Seed<'a> {
    pub images: &'a [&'a str],
    pub ledger: Vec<LedgerRow>,
    pub identity: Option<RespondentIdentity>,
    /// Present images in a random order instead of sorted.
    pub shuffled: bool,
}

pub struct ViewHarness {
    pub dom: VirtualDom,
    pub ledger: InMemoryLedger,
}

impl ViewHarness {
    pub fn rebuild(&mut self) {
        self.dom.rebuild_in_place();
        drive_dom(&mut self.dom);
    }

    pub async fn drive_async(&mut self) {
        let _ = tokio::time::timeout(
            std::time::Duration::from_millis(50),
            self.dom.wait_for_work(),
        )
        .await;
        self.dom.render_immediate(&mut NoOpMutations);
        self.dom.process_events();
    }

    /// Rebuild and let pending resources settle.
    pub async fn settle(&mut self) {
        self.rebuild();
        for _ in 0..4 {
            self.drive_async().await;
        }
    }

    pub fn render(&self) -> String {
        dioxus_ssr::render(&self.dom)
    }
}

pub fn drive_dom(dom: &mut VirtualDom) {
    dom.process_events();
    dom.render_immediate(&mut NoOpMutations);
    dom.process_events();
}

pub fn setup_view_harness(seed: Seed<'_>) -> ViewHarness {
    let ledger = InMemoryLedger::with_rows(seed.ledger);
    let images = InMemoryImageSource::new();
    for name in seed.images {
        images
            .insert(Path::new("images"), name, name.as_bytes().to_vec())
            .expect("insert image");
    }
    let client_store = Arc::new(InMemoryClientStore::new());
    if let Some(identity) = seed.identity.as_ref() {
        IdentityStore::new(client_store.clone())
            .set_identity(identity)
            .expect("store identity");
    }

    let storage = Storage::new(Arc::new(ledger.clone()), client_store, Arc::new(images));
    let config = SurveyConfig {
        order: if seed.shuffled {
            ImageOrder::Shuffled
        } else {
            ImageOrder::Sorted
        },
        ..SurveyConfig::default()
    };
    let services = AppServices::from_storage(&storage, &config, fixed_clock())
        .expect("services");

    let dom = VirtualDom::new_with_props(
        ViewRouterHarness,
        ViewHarnessProps {
            app: Arc::new(TestApp { services }),
        },
    );

    ViewHarness { dom, ledger }
}
