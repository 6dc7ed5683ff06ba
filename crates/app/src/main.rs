mod config;

use std::path::Path;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::tao::event::Event;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{AppServices, Clock, ShutdownPolicy};
use storage::client_store::{ClientStore, EncryptedCookieStore};
use storage::images::{DirectoryImageSource, ImageSource};
use storage::repository::Storage;
use storage::sheets::SheetsLedger;
use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ui::{App, UiApp, build_app_context};

use crate::config::{
    AppConfig, DEFAULT_SECRETS_PATH, LedgerBackend, Overrides, SecretsFile, prepare_sqlite_file,
};

const WINDOW_TITLE: &str = "Photo Survey";

struct DesktopApp {
    services: AppServices,
}

impl UiApp for DesktopApp {
    fn title(&self) -> String {
        WINDOW_TITLE.to_string()
    }

    fn services(&self) -> AppServices {
        self.services.clone()
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --secrets <path>          secrets file (default: secrets.toml)");
    eprintln!("  --spreadsheet-id <id>     ledger spreadsheet");
    eprintln!("  --worksheet <name>        ledger worksheet (default: Sheet1)");
    eprintln!("  --credentials <path>      service-account JSON key");
    eprintln!("  --cookie-password <pw>    secret for the encrypted cookie file");
    eprintln!("  --cookie-path <path>      cookie file (default: survey-cookies.json)");
    eprintln!("  --ledger <sheets|sqlite:path>");
    eprintln!("  --images <dir>            image root (default: images)");
    eprintln!("  --set-count <n>           number of image sets (default: 1)");
    eprintln!("  --order <sorted|shuffled>");
    eprintln!("  --write-mode <per-rating|on-completion>");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  SURVEY_SECRETS, SURVEY_SPREADSHEET_ID, SURVEY_WORKSHEET, SURVEY_CREDENTIALS,");
    eprintln!("  SURVEY_COOKIE_PASSWORD, SURVEY_COOKIE_PATH, SURVEY_LEDGER, SURVEY_IMAGES,");
    eprintln!("  SURVEY_SET_COUNT, SURVEY_ORDER, SURVEY_WRITE_MODE, RUST_LOG");
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "app=info,services=info,storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.iter().any(|arg| arg == "--help" || arg == "-h") {
        print_usage();
        std::process::exit(0);
    }

    let from_env = Overrides::from_env(|name| std::env::var(name).ok());
    let from_args = Overrides::from_args(argv).map_err(|e| {
        print_usage();
        e
    })?;
    let overrides = from_env.merge(from_args);

    let secrets = match overrides.secrets.as_deref() {
        Some(path) => SecretsFile::load(path, true)?,
        None => SecretsFile::load(Path::new(DEFAULT_SECRETS_PATH), false)?,
    };
    Ok(AppConfig::resolve(secrets, overrides)?)
}

async fn build_storage(config: &AppConfig) -> Result<Storage, Box<dyn std::error::Error>> {
    let client_store: Arc<dyn ClientStore> = Arc::new(EncryptedCookieStore::open(
        &config.cookie_path,
        &config.cookie_password,
    )?);
    let images: Arc<dyn ImageSource> = Arc::new(DirectoryImageSource::new());

    match &config.ledger {
        LedgerBackend::Sheets { config: sheets, key } => {
            info!(
                spreadsheet = %sheets.spreadsheet_id,
                worksheet = %sheets.worksheet,
                "using spreadsheet ledger"
            );
            let ledger = SheetsLedger::new(sheets.clone(), key.clone())?;
            Ok(Storage::new(Arc::new(ledger), client_store, images))
        }
        LedgerBackend::Sqlite { url } => {
            info!(url = %url, "using sqlite ledger");
            prepare_sqlite_file(url)?;
            Ok(Storage::sqlite(url, client_store, images).await?)
        }
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    let storage = build_storage(&config).await?;
    info!(
        images = %config.survey.images_root.display(),
        sets = config.survey.set_count,
        "starting survey"
    );

    let services = AppServices::from_storage(&storage, &config.survey, Clock::default_clock())?;
    let app: Arc<dyn UiApp> = Arc::new(DesktopApp {
        services: services.clone(),
    });
    let context = build_app_context(&app);

    // The event loop never returns, so queued ratings are flushed from the
    // loop's own teardown event.
    let handle = Handle::current();
    let mut drained = false;
    let desktop_cfg = DesktopConfig::new()
        .with_window(
            WindowBuilder::new()
                .with_title(WINDOW_TITLE)
                .with_always_on_top(false),
        )
        .with_custom_event_handler(move |event, _target| {
            if matches!(event, Event::LoopDestroyed) && !drained {
                drained = true;
                info!("window closed, flushing queued ratings");
                drain_blocking(&handle, &services);
            }
        });

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

/// Finish every queued and in-flight write, blocking the calling thread.
///
/// Must be called on a thread of a multi-thread runtime, or outside any
/// runtime.
fn drain_blocking(handle: &Handle, services: &AppServices) {
    tokio::task::block_in_place(|| handle.block_on(services.shutdown(ShutdownPolicy::Drain)));
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
