use crate::models::{Purpose, RecommendationRule};
use crate::services::store::{SqliteStore, StoreError};
use sqlx::sqlite::SqliteRow;
use sqlx::{Connection, Row};

/// Read access to the recommendation rule table
#[derive(Debug, Clone)]
pub struct RuleStore {
    store: SqliteStore,
}

impl RuleStore {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }

    /// Rules for one purpose, in storage order
    pub async fn rules_for(&self, purpose: Purpose) -> Result<Vec<RecommendationRule>, StoreError> {
        let query = r#"
            SELECT id, purpose, feature, condition, suggestion
            FROM recommendation_rules
            WHERE purpose = ?
            ORDER BY id
        "#;

        let mut conn = self.store.connect().await?;
        let rows = sqlx::query(query)
            .bind(purpose.as_str())
            .fetch_all(&mut conn)
            .await?;
        conn.close().await?;

        let rules: Result<Vec<_>, _> = rows.iter().map(rule_from_row).collect();
        let rules = rules?;

        tracing::debug!("Loaded {} {} rules", rules.len(), purpose);
        Ok(rules)
    }
}

fn rule_from_row(row: &SqliteRow) -> Result<RecommendationRule, StoreError> {
    let purpose: String = row.try_get("purpose")?;

    Ok(RecommendationRule {
        id: row.try_get("id")?,
        purpose: purpose
            .parse()
            .map_err(|e: crate::models::ParsePurposeError| StoreError::InvalidRow(e.to_string()))?,
        feature: row.try_get("feature")?,
        condition: row.try_get("condition")?,
        suggestion: row.try_get("suggestion")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::recommend::Condition;

    async fn rules() -> (tempfile::TempDir, RuleStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::open_path(dir.path().join("housing.db")).await.unwrap();
        (dir, RuleStore::new(store))
    }

    #[tokio::test]
    async fn test_seeded_rules_filtered_by_purpose() {
        let (_dir, store) = rules().await;

        let buy = store.rules_for(Purpose::Buy).await.unwrap();
        assert!(!buy.is_empty());
        assert!(buy.iter().all(|r| r.purpose == Purpose::Buy));
        assert!(buy
            .iter()
            .any(|r| r.feature == "sqft_living" && r.condition == "< 1000"));

        let ids: Vec<i64> = buy.iter().map(|r| r.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[tokio::test]
    async fn test_seeded_conditions_parse() {
        let (_dir, store) = rules().await;

        for purpose in [Purpose::Buy, Purpose::Sell] {
            for rule in store.rules_for(purpose).await.unwrap() {
                assert!(
                    rule.condition.parse::<Condition>().is_ok(),
                    "rule {} has unparseable condition {:?}",
                    rule.id,
                    rule.condition
                );
            }
        }
    }
}
