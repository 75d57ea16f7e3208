use agent::SnapshotStore;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredModel {
    pub agent_id: String,
    pub snapshot: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn save_snapshot(&self, agent_id: &str, snapshot: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO agent_models (agent_id, snapshot, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(agent_id) DO UPDATE SET snapshot = excluded.snapshot, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(agent_id)
        .bind(snapshot)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to save model snapshot for agent '{agent_id}'"))?;
        debug!(agent_id, bytes = snapshot.len(), "saved model snapshot");
        Ok(())
    }

    pub async fn load_snapshot(&self, agent_id: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT snapshot FROM agent_models WHERE agent_id = ?")
            .bind(agent_id)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to load model snapshot for agent '{agent_id}'"))?;
        Ok(row.map(|r| r.get::<String, _>(0)))
    }

    pub async fn load_stored_model(&self, agent_id: &str) -> Result<Option<StoredModel>> {
        let row = sqlx::query(
            "SELECT agent_id, snapshot, created_at, updated_at FROM agent_models WHERE agent_id = ?",
        )
        .bind(agent_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| StoredModel {
            agent_id: r.get::<String, _>(0),
            snapshot: r.get::<String, _>(1),
            created_at: r.get::<DateTime<Utc>, _>(2),
            updated_at: r.get::<DateTime<Utc>, _>(3),
        }))
    }

    pub async fn delete_snapshot(&self, agent_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM agent_models WHERE agent_id = ?")
            .bind(agent_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn list_agents(&self) -> Result<Vec<String>> {
        let rows = sqlx::query("SELECT agent_id FROM agent_models ORDER BY agent_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|r| r.get::<String, _>(0)).collect())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[async_trait]
impl SnapshotStore for Storage {
    async fn load_snapshot(&self, agent_id: &str) -> Result<Option<String>> {
        Storage::load_snapshot(self, agent_id).await
    }

    async fn save_snapshot(&self, agent_id: &str, snapshot: &str) -> Result<()> {
        Storage::save_snapshot(self, agent_id, snapshot).await
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
