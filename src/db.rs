use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{AttendanceSummary, LeaderboardEntry, UserSnapshot};

/// Per-user snapshots backing the leaderboard.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn load_snapshot(&self, user_id: &str) -> Result<Option<UserSnapshot>>;

    async fn save_school(&self, user_id: &str, school: &str) -> Result<()>;

    async fn save_average(&self, user_id: &str, average: f64, at: DateTime<Utc>) -> Result<()>;

    async fn save_attendance(
        &self,
        user_id: &str,
        summary: AttendanceSummary,
        at: DateTime<Utc>,
    ) -> Result<()>;

    /// Opted-in users that have both a display name and an average.
    async fn leaderboard_entries(&self) -> Result<Vec<LeaderboardEntry>>;
}

pub struct PgSnapshotStore {
    pool: PgPool,
}

impl PgSnapshotStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn init_db(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(sqlx::Error::from)?;
        Ok(())
    }

    /// Creates the user on first login and opts them into the social layer.
    pub async fn register_user(&self, user_id: &str, name: &str) -> Result<Uuid> {
        let internal_id: Uuid = sqlx::query(
            r#"
            INSERT INTO portal.users (id, internal_id, name, accepted_social_terms)
            VALUES ($1, $2, $3, TRUE)
            ON CONFLICT (id) DO UPDATE
            SET name = EXCLUDED.name, accepted_social_terms = TRUE
            RETURNING internal_id
            "#,
        )
        .bind(user_id)
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await?
        .get("internal_id");

        Ok(internal_id)
    }
}

#[async_trait]
impl SnapshotStore for PgSnapshotStore {
    async fn load_snapshot(&self, user_id: &str) -> Result<Option<UserSnapshot>> {
        let row = sqlx::query(
            r#"
            SELECT id, internal_id, name, school, average, absence_hours, delays,
                   accepted_social_terms, last_update
            FROM portal.users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserSnapshot {
            user_id: row.get("id"),
            internal_id: row.get("internal_id"),
            name: row.get("name"),
            school: row.get("school"),
            average: row.get("average"),
            absence_hours: row.get("absence_hours"),
            tardy_count: row.get("delays"),
            accepted_social_terms: row.get("accepted_social_terms"),
            last_update: row.get("last_update"),
        }))
    }

    async fn save_school(&self, user_id: &str, school: &str) -> Result<()> {
        sqlx::query("UPDATE portal.users SET school = $2 WHERE id = $1")
            .bind(user_id)
            .bind(school)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_average(&self, user_id: &str, average: f64, at: DateTime<Utc>) -> Result<()> {
        sqlx::query("UPDATE portal.users SET average = $2, last_update = $3 WHERE id = $1")
            .bind(user_id)
            .bind(average)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_attendance(
        &self,
        user_id: &str,
        summary: AttendanceSummary,
        at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE portal.users
            SET absence_hours = $2, delays = $3, last_update = $4
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(summary.absence_hours)
        .bind(summary.tardy_count)
        .bind(at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn leaderboard_entries(&self) -> Result<Vec<LeaderboardEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT u.internal_id, u.name, u.average,
                   COALESCE(u.absence_hours, 0) AS absence_hours,
                   COALESCE(u.delays, 0) AS tardy_count,
                   u.last_update,
                   (SELECT COUNT(*) FROM portal.follows f
                    WHERE f.followed_id = u.internal_id) AS follower_count
            FROM portal.users u
            WHERE u.average IS NOT NULL
              AND u.name IS NOT NULL
              AND u.accepted_social_terms
            ORDER BY u.name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            entries.push(LeaderboardEntry {
                internal_id: row.get("internal_id"),
                name: row.get("name"),
                average: row.get("average"),
                absence_hours: row.get("absence_hours"),
                tardy_count: row.get("tardy_count"),
                follower_count: row.get("follower_count"),
                last_update: row.get("last_update"),
            });
        }

        Ok(entries)
    }
}
