use chrono::Utc;
use sqlx::Row;

use shopguide_core::domain::profile::{UserId, UserProfile};

use super::{ProfileRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProfileRepository {
    pool: DbPool,
}

impl SqlProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileRepository for SqlProfileRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query("SELECT tags FROM user_profiles WHERE user_id = ?")
            .bind(&user_id.0)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let raw_tags: String = row.try_get("tags")?;
        let tags: Vec<String> = serde_json::from_str(&raw_tags).map_err(|error| {
            RepositoryError::Decode(format!(
                "invalid tags payload for user `{user_id}`: {error}"
            ))
        })?;

        Ok(Some(UserProfile { user_id: user_id.clone(), tags }))
    }

    async fn upsert_tags(
        &self,
        user_id: &UserId,
        tags: &[String],
    ) -> Result<(), RepositoryError> {
        let payload = serde_json::to_string(tags).map_err(|error| {
            RepositoryError::Decode(format!("unserializable tag set: {error}"))
        })?;

        sqlx::query(
            "INSERT INTO user_profiles (user_id, tags, updated_at) \
             VALUES (?, ?, ?) \
             ON CONFLICT(user_id) DO UPDATE SET \
                tags = excluded.tags, \
                updated_at = excluded.updated_at",
        )
        .bind(&user_id.0)
        .bind(&payload)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
