use anyhow::{Context, Result};
use async_trait::async_trait;
use canis_core::{PetState, StateStore};
use chrono::Utc;
use sqlx::{sqlite::SqlitePoolOptions, Pool, Row, Sqlite};
use std::path::Path;

/// SQLite-backed store for the singleton pet state.
///
/// The whole state is one JSON document in a single row (`id = 1`).
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let path = db_path.as_ref();
        let in_memory = path.as_os_str() == ":memory:";
        let db_url = format!("sqlite://{}?mode=rwc", path.display());

        // Every pooled connection to :memory: would open its own database
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 4 })
            .connect(&db_url)
            .await
            .with_context(|| format!("Failed to open SQLite database at {}", path.display()))?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pet_state (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                state_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await
        .context("Failed to create pet_state table")?;

        Ok(())
    }

    /// Load the pet state, or `None` on first run.
    pub async fn load_pet_state(&self) -> Result<Option<PetState>> {
        let row = sqlx::query("SELECT state_json FROM pet_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query pet_state")?;

        match row {
            Some(row) => {
                let json: String = row.get("state_json");
                let state: PetState =
                    serde_json::from_str(&json).context("Failed to deserialize pet state")?;
                Ok(Some(state))
            }
            None => Ok(None),
        }
    }

    /// Upsert the pet state.
    pub async fn save_pet_state(&self, state: &PetState) -> Result<()> {
        let json = serde_json::to_string(state).context("Failed to serialize pet state")?;
        let now = Utc::now().timestamp();

        sqlx::query(
            "INSERT INTO pet_state (id, state_json, updated_at) VALUES (1, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 state_json = excluded.state_json,
                 updated_at = excluded.updated_at",
        )
        .bind(&json)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to save pet state")?;

        tracing::trace!("Pet state saved");
        Ok(())
    }

    /// Unix timestamp of the last save, if any.
    pub async fn last_saved_at(&self) -> Result<Option<i64>> {
        let row = sqlx::query("SELECT updated_at FROM pet_state WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .context("Failed to query pet_state")?;
        Ok(row.map(|r| r.get("updated_at")))
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    #[cfg(test)]
    pub(crate) fn pool_for_tests(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl StateStore for SqliteStore {
    async fn load_state(&self) -> Result<Option<PetState>> {
        self.load_pet_state().await
    }

    async fn save_state(&self, state: &PetState) -> Result<()> {
        self.save_pet_state(state).await
    }
}
