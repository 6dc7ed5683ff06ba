use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{LedgerRow, RatingLedger, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn encode_cells(row: &[String]) -> Result<String, StorageError> {
    serde_json::to_string(row).map_err(ser)
}

#[async_trait::async_trait]
impl RatingLedger for SqliteRepository {
    async fn get_all_rows(&self) -> Result<Vec<LedgerRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT cells
                FROM ledger_rows
                ORDER BY id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let cells: String = row.try_get("cells").map_err(ser)?;
            out.push(serde_json::from_str::<LedgerRow>(&cells).map_err(ser)?);
        }
        Ok(out)
    }

    async fn append_row(&self, row: &[String]) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO ledger_rows (cells, appended_at)
                VALUES (?1, ?2)
            ",
        )
        .bind(encode_cells(row)?)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    async fn append_rows(&self, rows: &[LedgerRow]) -> Result<(), StorageError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let appended_at = Utc::now();
        for row in rows {
            sqlx::query(
                r"
                    INSERT INTO ledger_rows (cells, appended_at)
                    VALUES (?1, ?2)
                ",
            )
            .bind(encode_cells(row)?)
            .bind(appended_at)
            .execute(&mut *tx)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }
}
