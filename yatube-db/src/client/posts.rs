use crate::{
    client::{DbClient, Result, i64_from_u64, u64_from_count},
    record::PostRecord,
};
use sqlx::{query, query_as, query_scalar};
use tracing::{debug, info};
use yatube_common::{
    model::{
        Id,
        group::GroupMarker,
        post::{CreatePost, Post, PostMarker, UpdatePost},
        user::UserMarker,
    },
    pagination::{Page, PageRequest},
};

const POST_COLUMNS: &str = "
    SELECT
        posts.post_snowflake,
        posts.text,
        posts.theme,
        posts.image,
        users.user_snowflake,
        users.handle,
        users.first_name,
        users.last_name,
        post_groups.group_snowflake,
        post_groups.title AS group_title,
        post_groups.slug AS group_slug
    FROM
        posts
        JOIN users ON users.user_snowflake = posts.user_snowflake
        LEFT JOIN post_groups ON post_groups.group_snowflake = posts.group_snowflake
";

/// Which posts a listing shows. Listings are always newest first.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub enum PostFilter {
    All,
    Group(Id<GroupMarker>),
    Author(Id<UserMarker>),
    /// Posts by authors the given user follows.
    FollowedBy(Id<UserMarker>),
}

impl PostFilter {
    fn condition(self) -> Option<(&'static str, i64)> {
        match self {
            Self::All => None,
            Self::Group(group_id) => Some((
                "posts.group_snowflake = ?",
                group_id.snowflake().get().cast_signed(),
            )),
            Self::Author(user_id) => Some((
                "posts.user_snowflake = ?",
                user_id.snowflake().get().cast_signed(),
            )),
            Self::FollowedBy(user_id) => Some((
                "posts.user_snowflake IN (
                    SELECT follows.author_snowflake FROM follows WHERE follows.user_snowflake = ?
                )",
                user_id.snowflake().get().cast_signed(),
            )),
        }
    }
}

impl DbClient {
    pub async fn create_post(&self, post: &CreatePost) -> Result<Id<PostMarker>> {
        let post_snowflake = self.next_snowflake_i64()?;

        let returned_snowflake = query_scalar::<_, i64>(
            "
            INSERT INTO posts (post_snowflake, text, theme, user_snowflake, group_snowflake, image)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING post_snowflake
            ",
        )
        .bind(post_snowflake)
        .bind(&post.content.text)
        .bind(&post.content.theme)
        .bind(post.author.snowflake().get().cast_signed())
        .bind(post.group.map(|group| group.snowflake().get().cast_signed()))
        .bind(post.image.as_ref().map(|image| image.get()))
        .fetch_one(&self.pool)
        .await?;

        let post_id = Id::from(returned_snowflake.cast_unsigned());
        info!(%post_id, author = %post.author, "Created post");
        Ok(post_id)
    }

    /// Returns whether the post existed.
    pub async fn update_post(&self, post_id: Id<PostMarker>, post: &UpdatePost) -> Result<bool> {
        let result = query(
            "
            UPDATE posts
            SET text = ?, theme = ?, group_snowflake = ?, image = ?
            WHERE post_snowflake = ?
            ",
        )
        .bind(&post.content.text)
        .bind(&post.content.theme)
        .bind(post.group.map(|group| group.snowflake().get().cast_signed()))
        .bind(post.image.as_ref().map(|image| image.get()))
        .bind(post_id.snowflake().get().cast_signed())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn fetch_post(&self, post_id: Id<PostMarker>) -> Result<Option<Post>> {
        let sql = format!("{POST_COLUMNS} WHERE posts.post_snowflake = ?");
        let record = query_as::<_, PostRecord>(&sql)
            .bind(post_id.snowflake().get().cast_signed())
            .fetch_optional(&self.pool)
            .await?;

        let post = record.map(Post::try_from).transpose()?;
        Ok(post)
    }

    /// Also removes the post's comments.
    pub async fn delete_post(&self, post_id: Id<PostMarker>) -> Result<bool> {
        let result = query(
            "
            DELETE FROM posts
            WHERE post_snowflake = ?
            ",
        )
        .bind(post_id.snowflake().get().cast_signed())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count_posts(&self, filter: PostFilter) -> Result<u64> {
        let count = match filter.condition() {
            Some((condition, value)) => {
                let sql = format!("SELECT COUNT(*) FROM posts WHERE {condition}");
                query_scalar::<_, i64>(&sql)
                    .bind(value)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                query_scalar::<_, i64>("SELECT COUNT(*) FROM posts")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(u64_from_count(count))
    }

    /// One page of posts, newest first.
    pub async fn fetch_posts(&self, filter: PostFilter, page: PageRequest) -> Result<Page<Post>> {
        let window = page.locate(self.count_posts(filter).await?);
        let limit = i64_from_u64(window.limit());
        let offset = i64_from_u64(window.offset());

        let records = match filter.condition() {
            Some((condition, value)) => {
                let sql = format!(
                    "{POST_COLUMNS} WHERE {condition} ORDER BY posts.post_snowflake DESC LIMIT ? OFFSET ?"
                );
                query_as::<_, PostRecord>(&sql)
                    .bind(value)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let sql =
                    format!("{POST_COLUMNS} ORDER BY posts.post_snowflake DESC LIMIT ? OFFSET ?");
                query_as::<_, PostRecord>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let posts = records
            .into_iter()
            .map(Post::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let page = Page::new(window, posts);
        debug!(?filter, page = window.number(), len = page.len(), "Fetched posts");

        Ok(page)
    }
}
