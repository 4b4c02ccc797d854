use crate::{
    client::{DbClient, Result},
    record::AuthenticationRecord,
};
use sqlx::{query, query_as};
use time::UtcDateTime;
use yatube_common::model::{
    Id,
    auth::{Authentication, SessionTokenHash},
    user::UserMarker,
};

impl DbClient {
    pub async fn create_session(&self, authentication: &Authentication) -> Result<()> {
        let expires_after_seconds = authentication
            .expires_after
            .map(|duration| duration.get().whole_seconds());

        query(
            "
            INSERT INTO sessions (user_snowflake, token_hash, created_at, expires_after_seconds)
            VALUES (?, ?, ?, ?)
            ",
        )
        .bind(authentication.user.snowflake().get().cast_signed())
        .bind(authentication.token_hash.0.as_slice())
        .bind(authentication.created_at.unix_timestamp())
        .bind(expires_after_seconds)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn fetch_session(
        &self,
        user_id: Id<UserMarker>,
        token_hash: &SessionTokenHash,
    ) -> Result<Option<Authentication>> {
        let record = query_as::<_, AuthenticationRecord>(
            "
            SELECT
                sessions.user_snowflake,
                sessions.token_hash,
                sessions.created_at,
                sessions.expires_after_seconds
            FROM
                sessions
            WHERE
                sessions.user_snowflake = ? AND sessions.token_hash = ?
            ",
        )
        .bind(user_id.snowflake().get().cast_signed())
        .bind(token_hash.0.as_slice())
        .fetch_optional(&self.pool)
        .await?;

        let authentication = record.map(Authentication::try_from).transpose()?;
        Ok(authentication)
    }

    /// Returns whether a session was removed.
    pub async fn delete_session(
        &self,
        user_id: Id<UserMarker>,
        token_hash: &SessionTokenHash,
    ) -> Result<bool> {
        let result = query(
            "
            DELETE FROM sessions
            WHERE user_snowflake = ? AND token_hash = ?
            ",
        )
        .bind(user_id.snowflake().get().cast_signed())
        .bind(token_hash.0.as_slice())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Drops the user's sessions that expired at or before `now`. Returns how many were removed.
    pub async fn delete_expired_sessions(
        &self,
        user_id: Id<UserMarker>,
        now: UtcDateTime,
    ) -> Result<u64> {
        let result = query(
            "
            DELETE FROM sessions
            WHERE
                user_snowflake = ?
                AND expires_after_seconds IS NOT NULL
                AND created_at + expires_after_seconds <= ?
            ",
        )
        .bind(user_id.snowflake().get().cast_signed())
        .bind(now.unix_timestamp())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
