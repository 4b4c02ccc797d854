use crate::client::{DbClient, Result, u64_from_count};
use sqlx::{query, query_as, query_scalar};
use tracing::debug;
use yatube_common::model::{Id, follow::FollowCounts, user::UserMarker};

impl DbClient {
    /// Makes `user` follow `author`. Returns whether a new edge was created.
    pub async fn follow(&self, user: Id<UserMarker>, author: Id<UserMarker>) -> Result<bool> {
        let result = query(
            "
            INSERT INTO follows (user_snowflake, author_snowflake)
            VALUES (?, ?)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(user.snowflake().get().cast_signed())
        .bind(author.snowflake().get().cast_signed())
        .execute(&self.pool)
        .await?;

        let created = result.rows_affected() > 0;
        debug!(%user, %author, created, "Follow");
        Ok(created)
    }

    /// Returns whether an edge was removed.
    pub async fn unfollow(&self, user: Id<UserMarker>, author: Id<UserMarker>) -> Result<bool> {
        let result = query(
            "
            DELETE FROM follows
            WHERE user_snowflake = ? AND author_snowflake = ?
            ",
        )
        .bind(user.snowflake().get().cast_signed())
        .bind(author.snowflake().get().cast_signed())
        .execute(&self.pool)
        .await?;

        let removed = result.rows_affected() > 0;
        debug!(%user, %author, removed, "Unfollow");
        Ok(removed)
    }

    pub async fn is_following(&self, user: Id<UserMarker>, author: Id<UserMarker>) -> Result<bool> {
        let exists = query_scalar::<_, bool>(
            "
            SELECT EXISTS (
                SELECT 1 FROM follows
                WHERE user_snowflake = ? AND author_snowflake = ?
            )
            ",
        )
        .bind(user.snowflake().get().cast_signed())
        .bind(author.snowflake().get().cast_signed())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    pub async fn follow_counts(&self, user: Id<UserMarker>) -> Result<FollowCounts> {
        let (followers, following) = query_as::<_, (i64, i64)>(
            "
            SELECT
                (SELECT COUNT(*) FROM follows WHERE author_snowflake = ?1),
                (SELECT COUNT(*) FROM follows WHERE user_snowflake = ?1)
            ",
        )
        .bind(user.snowflake().get().cast_signed())
        .fetch_one(&self.pool)
        .await?;

        Ok(FollowCounts {
            followers: u64_from_count(followers),
            following: u64_from_count(following),
        })
    }
}
