use crate::{
    client::{DbClient, Result},
    record::CommentRecord,
};
use sqlx::{query, query_as, query_scalar};
use tracing::info;
use yatube_common::model::{
    Id,
    comment::{Comment, CommentMarker, CreateComment},
    post::PostMarker,
};

impl DbClient {
    pub async fn create_comment(&self, comment: &CreateComment) -> Result<Id<CommentMarker>> {
        let comment_snowflake = self.next_snowflake_i64()?;

        let returned_snowflake = query_scalar::<_, i64>(
            "
            INSERT INTO comments (comment_snowflake, text, user_snowflake, post_snowflake)
            VALUES (?, ?, ?, ?)
            RETURNING comment_snowflake
            ",
        )
        .bind(comment_snowflake)
        .bind(&comment.text)
        .bind(comment.author.snowflake().get().cast_signed())
        .bind(comment.post.snowflake().get().cast_signed())
        .fetch_one(&self.pool)
        .await?;

        let comment_id = Id::from(returned_snowflake.cast_unsigned());
        info!(comment = %comment_id, post = %comment.post, "Created comment");
        Ok(comment_id)
    }

    pub async fn fetch_comment(&self, comment_id: Id<CommentMarker>) -> Result<Option<Comment>> {
        let record = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_snowflake,
                comments.text,
                comments.post_snowflake,
                users.user_snowflake,
                users.handle,
                users.first_name,
                users.last_name
            FROM
                comments
                JOIN users ON users.user_snowflake = comments.user_snowflake
            WHERE
                comments.comment_snowflake = ?
            ",
        )
        .bind(comment_id.snowflake().get().cast_signed())
        .fetch_optional(&self.pool)
        .await?;

        let comment = record.map(Comment::try_from).transpose()?;
        Ok(comment)
    }

    /// Oldest first.
    pub async fn fetch_post_comments(&self, post_id: Id<PostMarker>) -> Result<Vec<Comment>> {
        let records = query_as::<_, CommentRecord>(
            "
            SELECT
                comments.comment_snowflake,
                comments.text,
                comments.post_snowflake,
                users.user_snowflake,
                users.handle,
                users.first_name,
                users.last_name
            FROM
                comments
                JOIN users ON users.user_snowflake = comments.user_snowflake
            WHERE
                comments.post_snowflake = ?
            ORDER BY
                comments.comment_snowflake
            ",
        )
        .bind(post_id.snowflake().get().cast_signed())
        .fetch_all(&self.pool)
        .await?;

        let comments = records
            .into_iter()
            .map(Comment::try_from)
            .collect::<Result<_, _>>()?;
        Ok(comments)
    }

    pub async fn delete_comment(&self, comment_id: Id<CommentMarker>) -> Result<bool> {
        let result = query(
            "
            DELETE FROM comments
            WHERE comment_snowflake = ?
            ",
        )
        .bind(comment_id.snowflake().get().cast_signed())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
