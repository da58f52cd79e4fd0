use anyhow::{Context, Result};
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
use uuid::Uuid;

use shared::domain::{ResponseId, ResponseKind, StatusCheckId};

/// Append-only store for confession responses. `Clone` shares the pool, so a
/// handle can be passed to the service layer and to tests without globals.
#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub id: ResponseId,
    pub kind: ResponseKind,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredStatusCheck {
    pub id: StatusCheckId,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Appends one response. The id and timestamp are assigned here, never
    /// taken from the caller. Only a typed kind can reach this point, so an
    /// invalid value is unrepresentable; the schema CHECK backstops that.
    pub async fn insert_response(
        &self,
        kind: ResponseKind,
        user_agent: Option<&str>,
        ip_address: Option<&str>,
    ) -> Result<StoredResponse> {
        let id = ResponseId(Uuid::new_v4());
        let created_at = Utc::now();
        sqlx::query(
            "INSERT INTO responses (id, response, user_agent, ip_address, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id.0.to_string())
        .bind(kind.as_str())
        .bind(user_agent)
        .bind(ip_address)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(StoredResponse {
            id,
            kind,
            user_agent: user_agent.map(str::to_string),
            ip_address: ip_address.map(str::to_string),
            created_at,
        })
    }

    /// Full scan, oldest-first (insertion order). The dataset is human-scale,
    /// so there is no pagination.
    pub async fn list_responses(&self) -> Result<Vec<StoredResponse>> {
        let rows = sqlx::query(
            "SELECT id, response, user_agent, ip_address, created_at
             FROM responses
             ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(response_from_row).collect()
    }

    pub async fn count_responses(&self, kind: ResponseKind) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE response = ?")
            .bind(kind.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn count_all_responses(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM responses")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn latest_response(&self) -> Result<Option<StoredResponse>> {
        let row = sqlx::query(
            "SELECT id, response, user_agent, ip_address, created_at
             FROM responses
             ORDER BY rowid DESC
             LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(response_from_row).transpose()
    }

    pub async fn insert_status_check(&self, client_name: &str) -> Result<StoredStatusCheck> {
        let id = StatusCheckId(Uuid::new_v4());
        let created_at = Utc::now();
        sqlx::query("INSERT INTO status_checks (id, client_name, created_at) VALUES (?, ?, ?)")
            .bind(id.0.to_string())
            .bind(client_name)
            .bind(created_at)
            .execute(&self.pool)
            .await?;

        Ok(StoredStatusCheck {
            id,
            client_name: client_name.to_string(),
            created_at,
        })
    }

    pub async fn list_status_checks(&self) -> Result<Vec<StoredStatusCheck>> {
        let rows = sqlx::query(
            "SELECT id, client_name, created_at FROM status_checks ORDER BY rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|r| {
                Ok(StoredStatusCheck {
                    id: StatusCheckId(parse_uuid(&r.get::<String, _>(0))?),
                    client_name: r.get::<String, _>(1),
                    created_at: r.get::<DateTime<Utc>, _>(2),
                })
            })
            .collect()
    }
}

fn response_from_row(row: sqlx::sqlite::SqliteRow) -> Result<StoredResponse> {
    let raw_kind = row.get::<String, _>(1);
    let kind = raw_kind
        .parse::<ResponseKind>()
        .with_context(|| format!("malformed stored response kind '{raw_kind}'"))?;
    Ok(StoredResponse {
        id: ResponseId(parse_uuid(&row.get::<String, _>(0))?),
        kind,
        user_agent: row.get::<Option<String>, _>(2),
        ip_address: row.get::<Option<String>, _>(3),
        created_at: row.get::<DateTime<Utc>, _>(4),
    })
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("malformed stored id '{raw}'"))
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

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
