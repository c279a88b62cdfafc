use crate::models::{Purpose, QueryLogEntry, StoredQuery};
use crate::services::store::{SqliteStore, StoreError};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, Row};

/// Storage format of the `timestamp` column
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of appending to the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Row written with this id
    Inserted(i64),
    /// An identical row already exists for the same second; nothing written
    Duplicate,
}

/// Append-only log of prediction queries.
///
/// Rows are never updated or deleted (the schema rejects both). Writes that
/// repeat an existing row's values within the same second are dropped.
#[derive(Debug, Clone)]
pub struct QueryLog {
    store: SqliteStore,
}

impl QueryLog {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Record one prediction
    pub async fn append(&self, entry: &QueryLogEntry) -> Result<AppendOutcome, StoreError> {
        // Single statement, so the duplicate check and the write share one
        // write transaction
        let query = r#"
            INSERT INTO queries (sqft_living, no_of_bedrooms, no_of_bathrooms, sqft_lot,
                                 no_of_floors, house_age, zipcode, purpose,
                                 predicted_price, timestamp)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10
            WHERE NOT EXISTS (
                SELECT 1 FROM queries
                WHERE sqft_living = ?1
                  AND no_of_bedrooms = ?2
                  AND no_of_bathrooms = ?3
                  AND sqft_lot = ?4
                  AND no_of_floors = ?5
                  AND house_age = ?6
                  AND zipcode = ?7
                  AND purpose = ?8
                  AND predicted_price = ?9
                  AND timestamp = ?10
            )
        "#;

        let f = &entry.features;
        let mut conn = self.store.connect().await?;
        let result = sqlx::query(query)
            .bind(f.sqft_living)
            .bind(i64::from(f.bedrooms))
            .bind(f.bathrooms)
            .bind(f.sqft_lot)
            .bind(i64::from(f.floors))
            .bind(i64::from(f.house_age))
            .bind(&f.zipcode)
            .bind(f.purpose.as_str())
            .bind(entry.predicted_price)
            .bind(entry.timestamp.format(TIMESTAMP_FORMAT).to_string())
            .execute(&mut conn)
            .await?;
        conn.close().await?;

        if result.rows_affected() == 0 {
            tracing::debug!("Dropped duplicate query for zipcode {} at {}", f.zipcode, entry.timestamp);
            return Ok(AppendOutcome::Duplicate);
        }

        let id = result.last_insert_rowid();
        tracing::debug!("Logged query {} (zipcode {}, {})", id, f.zipcode, f.purpose);
        Ok(AppendOutcome::Inserted(id))
    }

    /// All logged queries, most recent first
    pub async fn list_all(&self) -> Result<Vec<StoredQuery>, StoreError> {
        let query = r#"
            SELECT id, sqft_living, no_of_bedrooms, no_of_bathrooms, sqft_lot,
                   no_of_floors, house_age, zipcode, purpose, predicted_price, timestamp
            FROM queries
            ORDER BY timestamp DESC, id DESC
        "#;

        let mut conn = self.store.connect().await?;
        let rows = sqlx::query(query).fetch_all(&mut conn).await?;
        conn.close().await?;

        rows.iter().map(stored_query_from_row).collect()
    }

    /// Number of logged queries
    pub async fn count(&self) -> Result<i64, StoreError> {
        let mut conn = self.store.connect().await?;
        let row = sqlx::query("SELECT COUNT(*) AS total FROM queries")
            .fetch_one(&mut conn)
            .await?;
        conn.close().await?;

        Ok(row.try_get("total")?)
    }
}

fn stored_query_from_row(row: &SqliteRow) -> Result<StoredQuery, StoreError> {
    let purpose: String = row.try_get("purpose")?;
    let timestamp: String = row.try_get("timestamp")?;

    Ok(StoredQuery {
        id: row.try_get("id")?,
        sqft_living: row.try_get("sqft_living")?,
        bedrooms: non_negative(row.try_get("no_of_bedrooms")?, "no_of_bedrooms")?,
        bathrooms: row.try_get("no_of_bathrooms")?,
        sqft_lot: row.try_get("sqft_lot")?,
        floors: non_negative(row.try_get("no_of_floors")?, "no_of_floors")?,
        house_age: non_negative(row.try_get("house_age")?, "house_age")?,
        zipcode: row.try_get("zipcode")?,
        purpose: purpose
            .parse::<Purpose>()
            .map_err(|e| StoreError::InvalidRow(e.to_string()))?,
        predicted_price: row.try_get("predicted_price")?,
        timestamp: parse_timestamp(&timestamp)?,
    })
}

fn non_negative(value: i64, column: &str) -> Result<u32, StoreError> {
    u32::try_from(value).map_err(|_| StoreError::InvalidRow(format!("{} out of range: {}", column, value)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    let naive = NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
        .map_err(|e| StoreError::InvalidRow(format!("bad timestamp '{}': {}", raw, e)))?;
    Ok(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FeatureRecord;
    use chrono::Duration;

    fn features(sqft_living: f64) -> FeatureRecord {
        FeatureRecord {
            sqft_living,
            bedrooms: 3,
            bathrooms: 2.0,
            sqft_lot: 5000.0,
            floors: 1,
            house_age: 20,
            zipcode: "98052".to_string(),
            purpose: Purpose::Buy,
        }
    }

    async fn log() -> (tempfile::TempDir, QueryLog) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_path(dir.path().join("housing.db")).await.unwrap();
        (dir, QueryLog::new(store))
    }

    #[tokio::test]
    async fn test_append_and_list() {
        let (_dir, log) = log().await;
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let entry = QueryLogEntry::at(features(1800.0), 412_345.67, ts);
        let outcome = log.append(&entry).await.unwrap();
        assert!(matches!(outcome, AppendOutcome::Inserted(_)));

        let rows = log.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].sqft_living, 1800.0);
        assert_eq!(rows[0].purpose, Purpose::Buy);
        assert_eq!(rows[0].predicted_price, 412_345.67);
        assert_eq!(rows[0].timestamp, ts);
    }

    #[tokio::test]
    async fn test_same_second_duplicate_dropped() {
        let (_dir, log) = log().await;
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let first = QueryLogEntry::at(features(1800.0), 400_000.0, ts);
        let second = QueryLogEntry::at(features(1800.0), 400_000.0, ts + Duration::milliseconds(400));

        assert!(matches!(log.append(&first).await.unwrap(), AppendOutcome::Inserted(_)));
        assert_eq!(log.append(&second).await.unwrap(), AppendOutcome::Duplicate);
        assert_eq!(log.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_distinct_entries_kept() {
        let (_dir, log) = log().await;
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        // Same values, next second
        log.append(&QueryLogEntry::at(features(1800.0), 400_000.0, ts)).await.unwrap();
        log.append(&QueryLogEntry::at(features(1800.0), 400_000.0, ts + Duration::seconds(1))).await.unwrap();
        // Same second, different values
        log.append(&QueryLogEntry::at(features(2000.0), 450_000.0, ts)).await.unwrap();

        assert_eq!(log.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_list_most_recent_first() {
        let (_dir, log) = log().await;
        let base = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        for (i, sqft) in [1000.0, 2000.0, 3000.0].into_iter().enumerate() {
            let ts = base + Duration::minutes(i as i64);
            log.append(&QueryLogEntry::at(features(sqft), sqft * 200.0, ts)).await.unwrap();
        }

        let rows = log.list_all().await.unwrap();
        let order: Vec<f64> = rows.iter().map(|r| r.sqft_living).collect();
        assert_eq!(order, vec![3000.0, 2000.0, 1000.0]);
    }

    #[tokio::test]
    async fn test_rows_cannot_be_deleted() {
        let (_dir, log) = log().await;
        log.append(&QueryLogEntry::now(features(1800.0), 400_000.0)).await.unwrap();

        let mut conn = log.store.connect().await.unwrap();
        let result = sqlx::query("DELETE FROM queries").execute(&mut conn).await;
        assert!(result.is_err());
        assert_eq!(log.count().await.unwrap(), 1);
    }
}
