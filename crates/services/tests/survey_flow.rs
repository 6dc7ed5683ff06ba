use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use services::{
    AppServices, Clock, PipelineConfig, RetryPolicy, ShutdownPolicy, SurveyConfig, SurveyError,
    SurveyPhase, WriteMode, WriteOutcome,
};
use storage::client_store::{ClientStore, InMemoryClientStore};
use storage::images::InMemoryImageSource;
use storage::repository::{InMemoryLedger, LedgerRow, Storage, StorageError};
use survey_core::model::{AgeGroup, Gender, IdentityDraft, ImageOrder, Rating};
use survey_core::time::fixed_now;

struct Fixture {
    ledger: InMemoryLedger,
    storage: Storage,
}

fn fixture(files: &[(&str, &str)], ledger_rows: Vec<LedgerRow>) -> Fixture {
    let ledger = InMemoryLedger::with_rows(ledger_rows);
    let images = InMemoryImageSource::new();
    for (dir, name) in files {
        images.insert(Path::new(dir), name, vec![0xff, 0xd8]).unwrap();
    }
    let storage = Storage::new(
        Arc::new(ledger.clone()),
        Arc::new(InMemoryClientStore::new()),
        Arc::new(images),
    );
    Fixture { ledger, storage }
}

fn config(set_count: u32, write_mode: WriteMode) -> SurveyConfig {
    SurveyConfig {
        images_root: "images".into(),
        set_count,
        order: ImageOrder::Sorted,
        write_mode,
        pipeline: PipelineConfig {
            retry: RetryPolicy::new(5, Duration::from_millis(1)),
            max_in_flight: 4,
        },
    }
}

fn draft() -> IdentityDraft {
    IdentityDraft::new(" Aiko ", Some(AgeGroup::Thirties), Some(Gender::Female))
}

fn row(cells: &[&str]) -> LedgerRow {
    cells.iter().map(|c| (*c).to_string()).collect()
}

#[tokio::test]
async fn intake_then_rating_writes_one_row_per_image() {
    let fx = fixture(&[("images", "a.jpg"), ("images", "b.png")], Vec::new());
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    assert_eq!(session.phase(), SurveyPhase::Intake);

    survey.submit_intake(&mut session, &draft()).await.unwrap();
    assert_eq!(session.phase(), SurveyPhase::Rating);
    assert_eq!(session.current_image(), Some("a.jpg"));

    survey.rate(&mut session, Rating::new(4).unwrap()).unwrap();
    let last = survey.rate(&mut session, Rating::new(2).unwrap()).unwrap();
    assert!(last.is_complete);
    assert_eq!(session.phase(), SurveyPhase::Complete);

    app.shutdown(ShutdownPolicy::Drain).await;
    let rows = fx.ledger.rows().unwrap();
    assert_eq!(rows.len(), 2);
    let files: Vec<&str> = rows.iter().map(|r| r[5].as_str()).collect();
    assert!(files.contains(&"a.jpg") && files.contains(&"b.png"));
    assert!(rows.iter().all(|r| r[0] == "2023-11-15 07:13:20" && r[1] == "Aiko"));
}

#[tokio::test]
async fn returning_respondent_skips_intake_and_resumes() {
    let fx = fixture(
        &[("images", "a.jpg"), ("images", "b.jpg"), ("images", "c.jpg")],
        Vec::new(),
    );
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut first = survey.open_session().await.unwrap();
    survey.submit_intake(&mut first, &draft()).await.unwrap();
    survey.rate(&mut first, Rating::new(3).unwrap()).unwrap();
    let report = app.next_report().await.unwrap();
    assert_eq!(report.outcome, WriteOutcome::Written { attempts: 1 });

    let second = survey.open_session().await.unwrap();
    assert_eq!(second.phase(), SurveyPhase::Rating);
    assert_eq!(second.progress().current_index(), 1);
    assert_eq!(second.current_image(), Some("b.jpg"));
}

#[tokio::test]
async fn resumption_matches_identity_and_set() {
    let fx = fixture(
        &[("images", "a.jpg"), ("images", "b.jpg"), ("images", "c.jpg")],
        vec![
            row(&["timestamp", "name", "age_group", "gender", "set_id", "filename", "rating"]),
            row(&["t", "Aiko", "30-39", "Female", "1", "a.jpg", "3"]),
            row(&["t", "Aiko", "30-39", "Female", "1", "b.jpg", "5"]),
            row(&["t", "Aiko", "30-39", "Male", "1", "c.jpg", "5"]),
        ],
    );
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    survey.submit_intake(&mut session, &draft()).await.unwrap();

    assert_eq!(session.progress().current_index(), 2);
    assert_eq!(session.progress().ratings().len(), 2);
    assert_eq!(session.current_image(), Some("c.jpg"));
}

#[tokio::test]
async fn set_assignment_is_stable_across_sessions() {
    let fx = fixture(
        &[
            ("images/set1", "a.jpg"),
            ("images/set2", "b.jpg"),
            ("images/set3", "c.jpg"),
        ],
        Vec::new(),
    );
    let app = AppServices::from_storage(
        &fx.storage,
        &config(3, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let first = survey.open_session().await.unwrap();
    for _ in 0..5 {
        let again = survey.open_session().await.unwrap();
        assert_eq!(again.set_id(), first.set_id());
        assert_eq!(again.images(), first.images());
    }
}

#[tokio::test]
async fn empty_set_is_terminal_even_for_known_respondents() {
    let fx = fixture(&[("images", "readme.txt")], Vec::new());
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    assert_eq!(session.phase(), SurveyPhase::NoImages);
    assert!(survey.submit_intake(&mut session, &draft()).await.is_err());
    assert_eq!(session.phase(), SurveyPhase::NoImages);
}

#[tokio::test]
async fn on_completion_mode_writes_a_single_batch() {
    let fx = fixture(
        &[("images", "a.jpg"), ("images", "b.jpg"), ("images", "c.jpg")],
        Vec::new(),
    );
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::OnCompletion),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    survey.submit_intake(&mut session, &draft()).await.unwrap();

    let first = survey.rate(&mut session, Rating::new(1).unwrap()).unwrap();
    assert_eq!(first.job_id, None);
    survey.rate(&mut session, Rating::new(2).unwrap()).unwrap();
    let last = survey.rate(&mut session, Rating::new(3).unwrap()).unwrap();
    assert!(last.job_id.is_some());

    let report = app.next_report().await.unwrap();
    assert_eq!(report.rows, 3);
    assert_eq!(fx.ledger.rows().unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_intake_keeps_the_form() {
    let fx = fixture(&[("images", "a.jpg")], Vec::new());
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    let incomplete = IdentityDraft::new("Aiko", None, Some(Gender::Female));
    assert!(survey.submit_intake(&mut session, &incomplete).await.is_err());
    assert_eq!(session.phase(), SurveyPhase::Intake);
    assert_eq!(survey.identities().identity().unwrap(), None);
}

#[tokio::test]
async fn shuffled_order_is_fixed_for_the_session() {
    let names: Vec<String> = (0..12).map(|i| format!("photo{i:02}.jpg")).collect();
    let files: Vec<(&str, &str)> = names.iter().map(|n| ("images", n.as_str())).collect();
    let fx = fixture(&files, Vec::new());
    let shuffled = SurveyConfig {
        order: ImageOrder::Shuffled,
        ..config(1, WriteMode::PerRating)
    };
    let app = AppServices::from_storage(&fx.storage, &shuffled, Clock::fixed(fixed_now())).unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    survey.submit_intake(&mut session, &draft()).await.unwrap();
    let order = session.images().images().to_vec();
    assert_eq!(order.len(), 12);

    for expected in order.iter().take(6) {
        assert_eq!(session.current_image(), Some(expected.as_str()));
        assert_eq!(session.current_image(), Some(expected.as_str()));
        survey.rate(&mut session, Rating::new(4).unwrap()).unwrap();
        assert_eq!(session.images().images(), order.as_slice());
    }

    for _ in 0..6 {
        app.next_report().await.unwrap();
    }
    let mut written: Vec<String> = fx.ledger.rows().unwrap().iter().map(|r| r[5].clone()).collect();
    let mut expected: Vec<String> = order[..6].to_vec();
    written.sort();
    expected.sort();
    assert_eq!(written, expected);
}

#[tokio::test]
async fn rating_after_shutdown_keeps_the_session_and_deferred_ratings() {
    let fx = fixture(&[("images", "a.jpg"), ("images", "b.jpg")], Vec::new());
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::OnCompletion),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    survey.submit_intake(&mut session, &draft()).await.unwrap();
    survey.rate(&mut session, Rating::new(2).unwrap()).unwrap();
    app.shutdown(ShutdownPolicy::Drain).await;

    let result = survey.rate(&mut session, Rating::new(5).unwrap());
    assert!(matches!(result, Err(SurveyError::PipelineClosed)));
    assert_eq!(session.phase(), SurveyPhase::Rating);
    assert_eq!(session.current_image(), Some("b.jpg"));
    assert_eq!(session.progress().current_index(), 1);
    assert_eq!(session.take_deferred().len(), 1);
    assert!(fx.ledger.rows().unwrap().is_empty());
}

#[tokio::test]
async fn per_rating_failure_does_not_advance() {
    let fx = fixture(&[("images", "a.jpg"), ("images", "b.jpg")], Vec::new());
    let app = AppServices::from_storage(
        &fx.storage,
        &config(1, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();
    let survey = app.survey();

    let mut session = survey.open_session().await.unwrap();
    survey.submit_intake(&mut session, &draft()).await.unwrap();
    app.shutdown(ShutdownPolicy::Drain).await;

    assert!(survey.rate(&mut session, Rating::new(3).unwrap()).is_err());
    assert_eq!(session.current_image(), Some("a.jpg"));
    assert!(session.progress().ratings().is_empty());
}

/// Client store whose persisted values are still loading.
struct LoadingStore(InMemoryClientStore);

impl ClientStore for LoadingStore {
    fn ready(&self) -> bool {
        false
    }

    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.0.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.0.set(key, value)
    }

    fn save(&self) -> Result<(), StorageError> {
        self.0.save()
    }
}

#[tokio::test]
async fn session_waits_for_the_client_store() {
    let fx = fixture(&[("images", "a.jpg")], Vec::new());
    let storage = Storage::new(
        fx.storage.ledger.clone(),
        Arc::new(LoadingStore(InMemoryClientStore::new())),
        fx.storage.images.clone(),
    );
    let app = AppServices::from_storage(
        &storage,
        &config(1, WriteMode::PerRating),
        Clock::fixed(fixed_now()),
    )
    .unwrap();

    let result = app.survey().open_session().await;
    assert!(matches!(result, Err(SurveyError::ClientStoreNotReady)));
}
