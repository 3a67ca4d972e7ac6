use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::datetime::{format_timestamp, timestamp_now};

/// Pending multi-step interaction of a user, persisted in the user row.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UserMode {
    #[default]
    Idle,
    /// `/menu` → "Add record" was pressed; the next text is the record name.
    AwaitingRecordName,
    /// The name is known; the next text is the value.
    AwaitingRecordValue { name: String },
}

impl UserMode {
    /// Column values (`mode`, `mode_arg`) for this state.
    pub fn to_columns(&self) -> (&'static str, Option<&str>) {
        match self {
            UserMode::Idle => ("idle", None),
            UserMode::AwaitingRecordName => ("awaiting_name", None),
            UserMode::AwaitingRecordValue { name } => ("awaiting_value", Some(name.as_str())),
        }
    }

    /// Rebuilds the state from its columns; `None` for unknown or incomplete rows.
    pub fn from_columns(mode: &str, arg: Option<&str>) -> Option<Self> {
        match (mode, arg) {
            ("idle", _) => Some(UserMode::Idle),
            ("awaiting_name", _) => Some(UserMode::AwaitingRecordName),
            ("awaiting_value", Some(name)) if !name.is_empty() => {
                Some(UserMode::AwaitingRecordValue { name: name.to_string() })
            }
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        !matches!(self, UserMode::Idle)
    }
}

/// Display attributes of the person behind an update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
}

impl Sender {
    /// `@username` when known, the first name otherwise.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub mode: String,
    pub mode_arg: Option<String>,
    pub mode_updated_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

const USER_COLUMNS: &str =
    "id, username, first_name, mode, mode_arg, mode_updated_at, created_at, updated_at";

impl User {
    /// Current pending interaction. Rows with an unknown mode read as idle.
    pub fn current_mode(&self) -> UserMode {
        UserMode::from_columns(&self.mode, self.mode_arg.as_deref()).unwrap_or_else(|| {
            tracing::warn!("User {} has unknown mode '{}', treating as idle", self.id, self.mode);
            UserMode::Idle
        })
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        user_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Creates the user on first interaction or refreshes display attributes.
    pub async fn touch(pool: &sqlx::SqlitePool, sender: &Sender) -> Result<Self, sqlx::Error> {
        let now = timestamp_now();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, first_name, mode, created_at, updated_at)
            VALUES (?, ?, ?, 'idle', ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                username = excluded.username,
                first_name = excluded.first_name,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(sender.id)
        .bind(&sender.username)
        .bind(&sender.first_name)
        .bind(&now)
        .bind(&now)
        .execute(pool)
        .await?;

        Self::find_by_id(pool, sender.id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Replaces the pending interaction. Returns false when the user does not exist.
    pub async fn set_mode(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        mode: &UserMode,
    ) -> Result<bool, sqlx::Error> {
        let (mode, arg) = mode.to_columns();
        let now = timestamp_now();

        let result = sqlx::query(
            "UPDATE users SET mode = ?, mode_arg = ?, mode_updated_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(mode)
        .bind(arg)
        .bind(&now)
        .bind(&now)
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user together with all of their records.
    ///
    /// Returns `None` when the user is unknown, otherwise the number of
    /// records removed.
    pub async fn forget(pool: &sqlx::SqlitePool, user_id: i64) -> Result<Option<u64>, sqlx::Error> {
        // Rolled back on drop if any statement fails.
        let mut tx = pool.begin().await?;

        let records = sqlx::query("DELETE FROM records WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut tx)
            .await?
            .rows_affected();

        let users = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut tx)
            .await?
            .rows_affected();

        if users == 0 {
            tx.rollback().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(records))
    }

    /// Resets pending interactions last changed before `cutoff`.
    ///
    /// Returns the ids of the users that were reset.
    pub async fn expire_pending(
        pool: &sqlx::SqlitePool,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<i64>, sqlx::Error> {
        let cutoff = format_timestamp(&cutoff);
        let now = timestamp_now();
        let mut tx = pool.begin().await?;

        let stale = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE mode != 'idle' AND (mode_updated_at IS NULL OR mode_updated_at < ?) ORDER BY id",
        )
        .bind(&cutoff)
        .fetch_all(&mut tx)
        .await?;

        for user_id in &stale {
            sqlx::query(
                "UPDATE users SET mode = 'idle', mode_arg = NULL, mode_updated_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(&now)
            .bind(&now)
            .bind(user_id)
            .execute(&mut tx)
            .await?;
        }

        tx.commit().await?;
        Ok(stale)
    }

    pub async fn count(pool: &sqlx::SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }
}
