use std::sync::Arc;

use storage::client_store::InMemoryClientStore;
use storage::images::InMemoryImageSource;
use storage::repository::{LedgerRow, RatingLedger, Storage};
use storage::sqlite::SqliteRepository;

fn row(cells: &[&str]) -> LedgerRow {
    cells.iter().map(|c| (*c).to_string()).collect()
}

#[tokio::test]
async fn sqlite_ledger_preserves_append_order() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_ledger_order?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.append_row(&row(&["ts", "Aiko", "30-39", "Female", "1", "a.jpg", "3"]))
        .await
        .unwrap();
    repo.append_rows(&[
        row(&["ts", "Aiko", "30-39", "Female", "1", "b.jpg", "5"]),
        row(&["ts", "Ken", "20-29", "Male", "2", "a.jpg", "1"]),
    ])
    .await
    .unwrap();

    let rows = repo.get_all_rows().await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0][5], "a.jpg");
    assert_eq!(rows[1][5], "b.jpg");
    assert_eq!(rows[2][1], "Ken");
}

#[tokio::test]
async fn sqlite_ledger_keeps_short_rows_verbatim() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_short_rows?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.append_row(&row(&["a.jpg", "4"])).await.unwrap();
    repo.append_rows(&[]).await.unwrap();

    let rows = repo.get_all_rows().await.unwrap();
    assert_eq!(rows, vec![row(&["a.jpg", "4"])]);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_migrate_twice?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("first migrate");
    repo.append_row(&row(&["x"])).await.unwrap();
    repo.migrate().await.expect("second migrate");

    assert_eq!(repo.get_all_rows().await.unwrap().len(), 1);
}

#[tokio::test]
async fn storage_sqlite_wires_the_ledger() {
    let storage = Storage::sqlite(
        "sqlite:file:memdb_storage_wiring?mode=memory&cache=shared",
        Arc::new(InMemoryClientStore::new()),
        Arc::new(InMemoryImageSource::new()),
    )
    .await
    .expect("storage");

    storage.ledger.append_row(&row(&["only"])).await.unwrap();
    assert_eq!(storage.ledger.get_all_rows().await.unwrap(), vec![row(&["only"])]);
}
